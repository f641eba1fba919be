mod identifier;
mod mask;
mod tokens;

pub use self::identifier::Identifier;
pub use self::mask::{Feature, FeatureMask};
pub use self::tokens::Tokens;

/// Collapse every whitespace run to a single space and trim the ends.
pub(crate) fn collapse_whitespace(s: impl AsRef<str>) -> String {
    s.as_ref().split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Trim the extension and give it exactly one leading dot. Case is kept.
pub(crate) fn normalize_extension(ext: impl AsRef<str>) -> String {
    let ext = ext.as_ref().trim().trim_start_matches('.');
    match ext.is_empty() {
        true => String::new(),
        false => format!(".{ext}"),
    }
}
