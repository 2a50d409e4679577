#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("Unsupported file extension: {0}")]
    UnknownExtension(String),
    #[error("Invalid GPX: {0}")]
    InvalidGpx(String),
    #[error("Invalid FIT: {0}")]
    InvalidFit(String),
    #[error("Unsupported FIT file kind: {0}")]
    UnsupportedFitKind(String),
    #[error("Failed to read {path}: {reason}")]
    Io { path: String, reason: String },
}

/// Per-file outcomes; the import run prefixes the offending filename
/// when it folds one of these into an [`crate::types::result::ImportResult`].
#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error("activity already exists")]
    DuplicateActivity,
    #[error("storage insert returned no id")]
    PersistenceFailure,
    #[error("unsupported record variant: {0}")]
    UnsupportedRecordVariant(&'static str),
    #[error("Not a file or directory: {0}")]
    InvalidPath(String),
}
