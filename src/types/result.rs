use serde::{Deserialize, Serialize};

/// Progress accumulator for one import run. A single instance grows
/// monotonically across the run; importers yield a snapshot of it after
/// every file so callers can drive a progress indicator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportResult {
    /// File or folder the run was started on.
    pub path: String,
    /// Files expected, known up front.
    pub total: usize,
    /// Files imported successfully so far.
    pub imported: usize,
    /// One human-readable message per failed file, in file order.
    pub errors: Vec<String>,
}

impl ImportResult {
    pub fn new(path: String, total: usize) -> Self {
        Self {
            path,
            total,
            imported: 0,
            errors: Vec::new(),
        }
    }

    pub fn total_imported(&self) -> usize {
        self.imported + self.errors.len()
    }

    pub fn is_done(&self) -> bool {
        self.total_imported() == self.total
    }

    pub fn is_ok(&self) -> bool {
        self.imported == self.total
    }
}
