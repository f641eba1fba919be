use super::{Identifier, collapse_whitespace, normalize_extension};

/// The parsed fields of a media item name.
///
/// Created once per source item (normally by [`parse`](crate::parse)) and
/// never mutated afterwards: the builder and shortener only ever read it,
/// switching optional groups on and off through a
/// [`FeatureMask`](crate::FeatureMask) instead.
///
/// Optional groups are stored without their delimiters; the builder adds the
/// parentheses/brackets back when rendering.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Tokens {
    pub(crate) identifier: Identifier,
    pub(crate) title: String,
    pub(crate) volume: String,
    pub(crate) subtitle: Option<String>,
    pub(crate) year: Option<String>,
    pub(crate) author: Option<String>,
    pub(crate) tag: Option<String>,
    pub(crate) extension: String,
}
impl Tokens {
    /// Construct tokens from the required fields. Whitespace is collapsed and
    /// the extension gets a leading dot.
    pub fn new(
        identifier: Identifier,
        title: impl AsRef<str>,
        volume: impl AsRef<str>,
        extension: impl AsRef<str>,
    ) -> Self {
        Self {
            identifier,
            title: collapse_whitespace(title),
            volume: collapse_whitespace(volume),
            subtitle: None,
            year: None,
            author: None,
            tag: None,
            extension: normalize_extension(extension),
        }
    }

    pub fn with_subtitle(mut self, subtitle: impl AsRef<str>) -> Self {
        self.subtitle = non_empty(subtitle);
        self
    }

    pub fn with_year(mut self, year: impl AsRef<str>) -> Self {
        self.year = non_empty(year);
        self
    }

    pub fn with_author(mut self, author: impl AsRef<str>) -> Self {
        self.author = non_empty(author);
        self
    }

    pub fn with_tag(mut self, tag: impl AsRef<str>) -> Self {
        self.tag = non_empty(tag);
        self
    }

    pub fn identifier(&self) -> &Identifier {
        &self.identifier
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn volume(&self) -> &str {
        &self.volume
    }

    pub fn subtitle(&self) -> Option<&str> {
        self.subtitle.as_deref()
    }

    pub fn year(&self) -> Option<&str> {
        self.year.as_deref()
    }

    pub fn author(&self) -> Option<&str> {
        self.author.as_deref()
    }

    pub fn tag(&self) -> Option<&str> {
        self.tag.as_deref()
    }

    /// The extension with its original case, e.g. `.M4B`.
    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// Lower-cased extension for comparisons.
    pub fn extension_lower(&self) -> String {
        self.extension.to_lowercase()
    }
}

fn non_empty(value: impl AsRef<str>) -> Option<String> {
    Some(collapse_whitespace(value)).filter(|v| !v.is_empty())
}
