pub mod fit;
pub mod gpx;
pub mod segment;

use std::path::Path;

use crate::config::Config;
use crate::error::ParseError;
use crate::types::record::Record;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Gpx,
    Fit,
}

impl FileFormat {
    pub fn from_filename(filename: &str) -> Option<Self> {
        let ext = filename.rsplit('.').next()?.to_lowercase();
        match ext.as_str() {
            "gpx" => Some(FileFormat::Gpx),
            "fit" => Some(FileFormat::Fit),
            _ => None,
        }
    }
}

/// Extension dispatch into the format pipelines. Each pipeline pre-parses
/// and then refines with the strategy its content calls for.
pub fn parse_bytes(bytes: &[u8], format: FileFormat, config: &Config) -> Result<Record, ParseError> {
    match format {
        FileFormat::Gpx => gpx::parse(bytes, config),
        FileFormat::Fit => fit::parse(bytes, config),
    }
}

pub fn parse_file(path: &Path, config: &Config) -> Result<Record, ParseError> {
    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    let format = FileFormat::from_filename(&filename)
        .ok_or_else(|| ParseError::UnknownExtension(filename.clone()))?;

    let bytes = std::fs::read(path).map_err(|e| ParseError::Io {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;

    tracing::info!(file = %filename, ?format, "parsing activity file");
    parse_bytes(&bytes, format, config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_dispatch() {
        assert_eq!(FileFormat::from_filename("ride.gpx"), Some(FileFormat::Gpx));
        assert_eq!(FileFormat::from_filename("RUN.FIT"), Some(FileFormat::Fit));
        assert_eq!(FileFormat::from_filename("x.kml"), None);
        assert_eq!(FileFormat::from_filename("noext"), None);
    }

    #[test]
    fn unknown_extension_fails_parse_file() {
        let err = parse_file(Path::new("x.kml"), &Config::default()).unwrap_err();
        assert!(matches!(err, ParseError::UnknownExtension(name) if name == "x.kml"));
    }
}
