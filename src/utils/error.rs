//! Error types for dataset preparation.
//!
//! Uses thiserror for ergonomic error definitions.

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for dataset preparation operations.
#[derive(Error, Debug)]
pub enum Error {
    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Error decoding or processing an image
    #[error("failed to load image at '{0}': {1}")]
    Image(PathBuf, String),

    /// Error with dataset operations
    #[error("dataset error: {0}")]
    Dataset(String),

    /// Path not found
    #[error("not found: {0}")]
    NotFound(String),

    /// Invalid argument error
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

/// Specialized Result type for dataset preparation operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::Dataset("test error".to_string());
        assert_eq!(err.to_string(), "dataset error: test error");
    }

    #[test]
    fn test_image_error_includes_path() {
        let err = Error::Image(PathBuf::from("/path/to/image.jpg"), "bad header".to_string());
        assert!(err.to_string().contains("image.jpg"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }
}
