//! Link Error Types
//!
//! Structured errors using `exn` for automatic location tracking and error
//! tree construction. The underlying `std::io::Error`, when there is one, is
//! kept as a child frame of the raised kind rather than flattened into it.

use derive_more::{Display, Error};
use std::path::PathBuf;

/// A materialization error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for materialization operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// Source is missing, not a regular file, or cannot be read.
    #[display("source unavailable: {}", _0.display())]
    SourceUnavailable(#[error(not(source))] PathBuf),
    /// Source and destination live on different devices and copying was
    /// disabled or failed.
    #[display("cannot link across devices: {} -> {}", from.display(), to.display())]
    CrossDevice { from: PathBuf, to: PathBuf },
    /// A different file already occupies the destination.
    #[display("destination already exists: {}", _0.display())]
    DestinationConflict(#[error(not(source))] PathBuf),
    /// Any other filesystem failure at the given path.
    #[display("filesystem error: {}", _0.display())]
    Filesystem(#[error(not(source))] PathBuf),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    ///
    /// Materialization is never retried: every kind needs a change on disk or
    /// in configuration first.
    pub fn is_retryable(&self) -> bool {
        false
    }

    /// The path the error is about (the destination for cross-device errors).
    pub fn path(&self) -> &PathBuf {
        match self {
            Self::SourceUnavailable(path) | Self::DestinationConflict(path) | Self::Filesystem(path) => path,
            Self::CrossDevice { to, .. } => to,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_kind_display() {
        let kind = ErrorKind::CrossDevice {
            from: PathBuf::from("/mnt/disk1/a.m4b"),
            to: PathBuf::from("/mnt/user/b.m4b"),
        };
        assert_eq!(kind.to_string(), "cannot link across devices: /mnt/disk1/a.m4b -> /mnt/user/b.m4b");
        assert_eq!(kind.path(), &PathBuf::from("/mnt/user/b.m4b"));
        assert_eq!(
            ErrorKind::DestinationConflict(PathBuf::from("/x")).to_string(),
            "destination already exists: /x"
        );
    }

    #[test]
    fn error_kind_never_retryable() {
        assert!(!ErrorKind::Filesystem(PathBuf::new()).is_retryable());
        assert!(!ErrorKind::SourceUnavailable(PathBuf::new()).is_retryable());
    }
}
