use std::fmt::{Display, Formatter, Result as FmtResult};
use std::path::{Path, PathBuf};

/// How the destination was materialized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize), serde(rename_all = "lowercase"))]
pub enum Method {
    Hardlink,
    Copy,
}
impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hardlink => "hardlink",
            Self::Copy => "copy",
        }
    }
}
impl Display for Method {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

/// The outcome of (successfully) materializing a single destination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkAction {
    /// Nothing existed at the destination; it now does.
    Created { path: PathBuf, method: Method },
    /// A different file existed at the destination and was replaced.
    Replaced { path: PathBuf, method: Method },
    /// The destination already was the same inode as the source; no work
    /// performed.
    AlreadyLinked(PathBuf),
}
impl LinkAction {
    pub fn path(&self) -> &Path {
        match self {
            Self::Created { path, .. } | Self::Replaced { path, .. } | Self::AlreadyLinked(path) => path,
        }
    }

    pub fn method(&self) -> Option<Method> {
        match self {
            Self::Created { method, .. } | Self::Replaced { method, .. } => Some(*method),
            Self::AlreadyLinked(_) => None,
        }
    }
}
