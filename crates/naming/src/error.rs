//! Naming Error Types
//!
//! Structured errors using `exn` for automatic location tracking and error
//! tree construction. Everything in this crate is a pure string computation,
//! so none of these are retryable: the same input always fails the same way.

use derive_more::{Display, Error};

/// A naming error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for naming operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The input name carries no `{PREFIX.CODE}` identifier. Fix the source
    /// name; nothing downstream can run without one.
    #[display("no identifier found in name: {_0}")]
    MissingIdentifier(#[error(not(source))] String),
    /// Even the minimum-viable form (title, volume and identifier only) is
    /// longer than the cap. The title itself is too long for the tracker.
    #[display("minimum-viable name is {length} long, exceeding the cap of {cap}: {folder}/{file}")]
    Unshortenable {
        /// Minimum-viable folder name.
        folder: String,
        /// Minimum-viable file name.
        file: String,
        /// Torrent-internal length of the pair.
        length: usize,
        /// The cap that could not be met.
        cap: usize,
    },
    /// A rendered name lost its identifier. This is a bug in the builder or
    /// shortener, never a user error.
    #[display("identifier {identifier} missing from rendered name (folder: {in_folder}, file: {in_file})")]
    IdentifierPolicyViolation {
        /// The braced identifier token that was expected.
        identifier: String,
        /// Whether the folder name contained it.
        in_folder: bool,
        /// Whether the file name contained it.
        in_file: bool,
    },
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_kind_display() {
        assert_eq!(
            ErrorKind::MissingIdentifier("Title vol_01".to_string()).to_string(),
            "no identifier found in name: Title vol_01"
        );
        let kind = ErrorKind::IdentifierPolicyViolation {
            identifier: "{ID.ABC}".to_string(),
            in_folder: true,
            in_file: false,
        };
        assert_eq!(kind.to_string(), "identifier {ID.ABC} missing from rendered name (folder: true, file: false)");
    }

    #[test]
    fn error_kind_never_retryable() {
        assert!(!ErrorKind::MissingIdentifier(String::new()).is_retryable());
        let kind = ErrorKind::Unshortenable {
            folder: String::new(),
            file: String::new(),
            length: 200,
            cap: 180,
        };
        assert!(!kind.is_retryable());
    }
}
