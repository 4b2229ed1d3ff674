//! Error types for filesystem, resolution and watcher operations
//!
//! All library operations return [`Result`], whose error type [`FsError`]
//! carries enough context (paths, offending names) to be reported directly.
//! Not-found outcomes of version resolution are *not* errors; they are
//! expressed through [`crate::version::Resolution::NotFound`].

use std::path::PathBuf;
use thiserror::Error;

/// Error type for all `fskit` operations
#[derive(Debug, Error)]
pub enum FsError {
    /// Filesystem operation failed; the message includes the path and cause
    #[error("Filesystem error: {0}")]
    FileSystem(String),

    /// Raw I/O error without additional context
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A listed entry does not follow the expected version naming scheme
    #[error("Malformed version name: '{name}'")]
    MalformedVersionName {
        /// The offending entry name
        name: String,
    },

    /// Target file exists and overwriting was not requested
    #[error("File already exists: {}", .0.display())]
    FileAlreadyExists(PathBuf),

    /// Target file does not exist
    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    /// Target directory does not exist
    #[error("Directory not found: {}", .0.display())]
    DirectoryNotFound(PathBuf),

    /// JSON (de)serialization failed
    #[error("Invalid JSON: {0}")]
    InvalidJson(String),

    /// Watcher could not be started or driven
    #[error("Watcher error: {0}")]
    Watcher(String),
}

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, FsError>;

impl FsError {
    /// Wrap an I/O error with a description of what was being attempted
    ///
    /// Produces messages in the form `"{action} {path}: {err}"`.
    #[must_use]
    pub fn io_context(action: &str, path: &std::path::Path, err: &std::io::Error) -> Self {
        Self::FileSystem(format!("{action} {}: {err}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_io_context_message() {
        let err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let fs_err = FsError::io_context("Failed to read directory", Path::new("/tmp/x"), &err);
        assert_eq!(
            fs_err.to_string(),
            "Filesystem error: Failed to read directory /tmp/x: denied"
        );
    }

    #[test]
    fn test_malformed_version_display() {
        let err = FsError::MalformedVersionName {
            name: "beta".to_string(),
        };
        assert_eq!(err.to_string(), "Malformed version name: 'beta'");
    }
}
