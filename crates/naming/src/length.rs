use crate::consts::{DEFAULT_PATH_CAP, TORRENT_PATH_SEPARATOR};

/// What a tracker counts when it measures a path.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize), serde(rename_all = "lowercase"))]
pub enum LengthUnit {
    /// Unicode scalar values.
    #[default]
    Chars,
    /// UTF-8 encoded bytes.
    Bytes,
}
impl LengthUnit {
    pub fn measure(&self, s: &str) -> usize {
        match self {
            Self::Chars => s.chars().count(),
            Self::Bytes => s.len(),
        }
    }
}

/// The length budget for a torrent-internal path (`folder/file`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PathBudget {
    pub cap: usize,
    pub unit: LengthUnit,
}
impl PathBudget {
    pub fn new(cap: usize, unit: LengthUnit) -> Self {
        Self { cap, unit }
    }

    /// Length of `folder/file`, in this budget's unit.
    pub fn length(&self, folder: &str, file: &str) -> usize {
        self.unit.measure(folder) + self.unit.measure(TORRENT_PATH_SEPARATOR) + self.unit.measure(file)
    }

    pub fn fits(&self, folder: &str, file: &str) -> bool {
        self.length(folder, file) <= self.cap
    }
}
impl Default for PathBudget {
    fn default() -> Self {
        Self::new(DEFAULT_PATH_CAP, LengthUnit::Chars)
    }
}

/// Character length of `folder/file`.
pub fn torrent_path_length(folder: &str, file: &str) -> usize {
    LengthUnit::Chars.measure(folder) + 1 + LengthUnit::Chars.measure(file)
}

/// Whether `folder/file` fits within `cap` characters.
pub fn fits_cap(folder: &str, file: &str, cap: usize) -> bool {
    torrent_path_length(folder, file) <= cap
}
