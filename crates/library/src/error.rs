//! Library Error Types
//!
//! Structured errors using `exn` for automatic location tracking and error
//! tree construction. Errors from the naming and link crates are wrapped with
//! their original `Exn` frame kept as a child.

use derive_more::{Display, Error};
use hardbound_link::error::{Error as LinkError, ErrorKind as LinkErrorKind};
use hardbound_naming::error::{Error as NamingError, ErrorKind as NamingErrorKind};
use std::path::PathBuf;

/// A library error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for library operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The name could not be parsed, shortened or verified.
    #[display("naming error: {_0}")]
    Naming(NamingErrorKind),
    /// The destination could not be materialized.
    #[display("link error: {_0}")]
    Link(LinkErrorKind),
    /// A batch manifest could not be read.
    #[display("could not read manifest: {}", _0.display())]
    Manifest(#[error(not(source))] PathBuf),
}
impl ErrorKind {
    /// Convert a naming error into a library error, preserving the naming
    /// crate's `Exn` frame as a child in its own error tree.
    #[track_caller]
    pub fn naming(err: NamingError) -> Error {
        let inner = (*err).clone();
        err.raise(ErrorKind::Naming(inner))
    }

    /// Convert a link error into a library error, preserving the link crate's
    /// `Exn` frame as a child in its own error tree.
    #[track_caller]
    pub fn link(err: LinkError) -> Error {
        let inner = (*err).clone();
        err.raise(ErrorKind::Link(inner))
    }

    /// A short, stable name for reports and audit records.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Naming(NamingErrorKind::MissingIdentifier(_)) => "missing-identifier",
            Self::Naming(NamingErrorKind::Unshortenable { .. }) => "unshortenable",
            Self::Naming(NamingErrorKind::IdentifierPolicyViolation { .. }) => "identifier-policy-violation",
            Self::Link(LinkErrorKind::SourceUnavailable(_)) => "source-unavailable",
            Self::Link(LinkErrorKind::CrossDevice { .. }) => "cross-device",
            Self::Link(LinkErrorKind::DestinationConflict(_)) => "destination-conflict",
            Self::Link(LinkErrorKind::Filesystem(_)) => "filesystem",
            Self::Manifest(_) => "manifest",
        }
    }

    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Naming(kind) => kind.is_retryable(),
            Self::Link(kind) => kind.is_retryable(),
            Self::Manifest(_) => false,
        }
    }
}
