use std::fmt::{Display, Formatter, Result as FmtResult};

/// An optional token group that the builder may render or omit.
///
/// Identifier, title and volume have no variant here: they can never be
/// switched off, so no mask can ever drop them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize), serde(rename_all = "lowercase"))]
pub enum Feature {
    Subtitle,
    Year,
    Author,
    Tag,
}
impl Feature {
    pub const ALL: [Feature; 4] = [Feature::Subtitle, Feature::Year, Feature::Author, Feature::Tag];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Subtitle => "subtitle",
            Self::Year => "year",
            Self::Author => "author",
            Self::Tag => "tag",
        }
    }
}
impl Display for Feature {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

/// Enable/disable state for the optional token groups.
///
/// The folder renderer never emits a tag regardless of [`tag`](Self::tag);
/// tags only belong in file names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize), serde(default))]
pub struct FeatureMask {
    pub subtitle: bool,
    pub year: bool,
    pub author: bool,
    pub tag: bool,
}
impl FeatureMask {
    pub const ALL: Self = Self {
        subtitle: true,
        year: true,
        author: true,
        tag: true,
    };
    pub const MINIMAL: Self = Self {
        subtitle: false,
        year: false,
        author: false,
        tag: false,
    };

    pub fn enabled(&self, feature: Feature) -> bool {
        match feature {
            Feature::Subtitle => self.subtitle,
            Feature::Year => self.year,
            Feature::Author => self.author,
            Feature::Tag => self.tag,
        }
    }

    #[must_use]
    pub fn without(mut self, feature: Feature) -> Self {
        match feature {
            Feature::Subtitle => self.subtitle = false,
            Feature::Year => self.year = false,
            Feature::Author => self.author = false,
            Feature::Tag => self.tag = false,
        }
        self
    }

    /// The same mask as it applies to a folder name (tag cleared).
    #[must_use]
    pub fn for_folder(self) -> Self {
        self.without(Feature::Tag)
    }

    /// Every feature this mask still enables, in declaration order.
    pub fn features(&self) -> impl Iterator<Item = Feature> + '_ {
        Feature::ALL.into_iter().filter(|feature| self.enabled(*feature))
    }
}
impl Default for FeatureMask {
    fn default() -> Self {
        Self::ALL
    }
}
