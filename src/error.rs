//! Error types for the file upload service.

use std::path::PathBuf;

use thiserror::Error;

/// Common error type for the file upload service.
#[derive(Error, Debug)]
pub enum FileUploadError {
    /// Directory creation or file write failed while storing an upload.
    ///
    /// Partially written staging artifacts are removed on a best-effort basis
    /// before this error is returned.
    #[error("storage error at {}: {source}", path.display())]
    Storage {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A metadata record could not be opened or parsed during a query.
    #[error("failed to read metadata {}: {reason}", path.display())]
    MetadataRead { path: PathBuf, reason: String },

    /// The logical file name cannot be used as a path segment.
    #[error("invalid file name: {0:?}")]
    InvalidFileName(String),

    /// The operating system entropy source is unavailable.
    #[error("entropy source unavailable: {0}")]
    Entropy(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl FileUploadError {
    /// Wrap an I/O error raised while writing `path`.
    pub fn storage(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        FileUploadError::Storage {
            path: path.into(),
            source,
        }
    }

    /// Build a metadata read failure for `path`.
    pub fn metadata_read(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        FileUploadError::MetadataRead {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}

/// Result type alias for file upload operations.
pub type Result<T> = std::result::Result<T, FileUploadError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_error_display() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err = FileUploadError::storage("/data/abc", io_err);
        assert_eq!(err.to_string(), "storage error at /data/abc: denied");
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_metadata_read_error_display() {
        let err = FileUploadError::metadata_read("/data/abc/a.txt.properties", "malformed escape");
        assert_eq!(
            err.to_string(),
            "failed to read metadata /data/abc/a.txt.properties: malformed escape"
        );
    }

    #[test]
    fn test_invalid_file_name_display() {
        let err = FileUploadError::InvalidFileName("../etc".to_string());
        assert_eq!(err.to_string(), "invalid file name: \"../etc\"");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: FileUploadError = io_err.into();
        assert!(matches!(err, FileUploadError::Io(_)));
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_result_alias() {
        fn sample_ok() -> Result<i32> {
            Ok(42)
        }

        fn sample_err() -> Result<i32> {
            Err(FileUploadError::Config("test".to_string()))
        }

        assert_eq!(sample_ok().unwrap(), 42);
        assert!(sample_err().is_err());
    }
}
