use crate::models::{FeatureMask, Tokens, collapse_whitespace};

/// How the title, volume and subtitle are joined in the series part.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize), serde(rename_all = "lowercase"))]
pub enum SeriesJoiner {
    /// `Title vol_13 Subtitle`
    #[default]
    Space,
    /// `Title - vol_13 - Subtitle`
    Hyphen,
}

/// Renders folder and file names from [`Tokens`] under a [`FeatureMask`].
///
/// Rendering is total and deterministic: the same tokens, mask and joiner
/// always produce the same string. The identifier, title and volume are
/// always present in the output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NameBuilder {
    pub joiner: SeriesJoiner,
}
impl NameBuilder {
    pub fn new(joiner: SeriesJoiner) -> Self {
        Self { joiner }
    }

    /// The series part: title, volume and (if enabled) subtitle.
    pub fn series(&self, tokens: &Tokens, mask: FeatureMask) -> String {
        let subtitle = tokens.subtitle().filter(|_| mask.subtitle);
        let series = match (self.joiner, subtitle) {
            (SeriesJoiner::Space, Some(subtitle)) => format!("{} {} {subtitle}", tokens.title(), tokens.volume()),
            (SeriesJoiner::Space, None) => format!("{} {}", tokens.title(), tokens.volume()),
            (SeriesJoiner::Hyphen, Some(subtitle)) => {
                format!("{} - {} - {subtitle}", tokens.title(), tokens.volume())
            },
            (SeriesJoiner::Hyphen, None) => format!("{} - {}", tokens.title(), tokens.volume()),
        };
        collapse_whitespace(series)
    }

    /// Folder name. Tags are never rendered into folders.
    pub fn folder_name(&self, tokens: &Tokens, mask: FeatureMask) -> String {
        self.render(tokens, mask.for_folder())
    }

    /// File name including the extension.
    pub fn file_name(&self, tokens: &Tokens, mask: FeatureMask) -> String {
        format!("{}{}", self.render(tokens, mask), tokens.extension())
    }

    fn render(&self, tokens: &Tokens, mask: FeatureMask) -> String {
        let mut parts = vec![self.series(tokens, mask)];
        if mask.year
            && let Some(year) = tokens.year()
        {
            parts.push(format!("({year})"));
        }
        if mask.author
            && let Some(author) = tokens.author()
        {
            parts.push(format!("({author})"));
        }
        parts.push(tokens.identifier().token());
        if mask.tag
            && let Some(tag) = tokens.tag()
        {
            parts.push(format!("[{tag}]"));
        }
        collapse_whitespace(parts.join(" "))
    }
}
