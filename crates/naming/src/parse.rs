//! Right-to-left extraction of [`Tokens`] from a raw media item name.
//!
//! Trailing groups are classified purely by position: the rightmost bracket
//! group is the tag, the rightmost parenthesized group is the author, and a
//! parenthesized group before that is the year if it looks like one. A name
//! with a single trailing parenthesized group always yields an author, even
//! when the group is a valid year.

use crate::consts::{
    DEFAULT_EXTENSION, DEFAULT_VOLUME, IDENTIFIER_REGEX, TRAILING_GROUP_REGEX, TRAILING_TAG_REGEX, TRAILING_YEAR_REGEX,
    VOLUME_TOKEN_REGEX,
};
use crate::error::{ErrorKind, Result};
use crate::models::{Identifier, Tokens, collapse_whitespace, normalize_extension};
use crate::volume::normalize_volume;
use regex::Regex;
use tracing::instrument;

const LEGACY_SEPARATOR: &str = " - ";

/// Parse a raw name into its tokens.
///
/// `extension_hint` defaults to `.m4b`. If the name ends with the hint
/// (compared case-insensitively) it is stripped and the name's own spelling
/// becomes the extension; otherwise the hint itself is used.
///
/// Fails only when the name carries no identifier.
///
/// ```rust
/// use hardbound_naming::parse;
/// let tokens = parse("Title vol_13 Subtitle (2024) (Author) {ID.ABC123} [tag].m4b", None).unwrap();
/// assert_eq!(tokens.title(), "Title");
/// assert_eq!(tokens.volume(), "vol_13");
/// assert_eq!(tokens.subtitle(), Some("Subtitle"));
/// assert_eq!(tokens.year(), Some("2024"));
/// assert_eq!(tokens.author(), Some("Author"));
/// assert_eq!(tokens.identifier().as_str(), "ID.ABC123");
/// assert_eq!(tokens.tag(), Some("tag"));
/// ```
#[instrument(level = "debug", skip(extension_hint))]
pub fn parse(name: &str, extension_hint: Option<&str>) -> Result<Tokens> {
    let (stem, extension) = split_extension(name, extension_hint);

    let candidates: Vec<&str> = IDENTIFIER_REGEX
        .captures_iter(stem)
        .filter_map(|captures| captures.get(1))
        .map(|m| m.as_str())
        .collect();
    let Some(first) = candidates.first() else {
        exn::bail!(ErrorKind::MissingIdentifier(name.to_string()));
    };
    if candidates.len() > 1 {
        tracing::warn!(candidates = ?candidates, chosen = *first, "Multiple identifiers found in name; using the first");
    }
    let identifier = Identifier::from_match(first);
    let mut working = collapse_whitespace(IDENTIFIER_REGEX.replace_all(stem, " "));

    let tag = take_trailing(&mut working, &TRAILING_TAG_REGEX);
    let (year, author) = take_year_and_author(&mut working);

    let (title, volume, subtitle) = split_series(&working);
    let mut tokens = Tokens::new(identifier, title, volume, extension);
    if let Some(subtitle) = subtitle {
        tokens = tokens.with_subtitle(subtitle);
    }
    if let Some(year) = year {
        tokens = tokens.with_year(year);
    }
    if let Some(author) = author {
        tokens = tokens.with_author(author);
    }
    if let Some(tag) = tag {
        tokens = tokens.with_tag(tag);
    }
    Ok(tokens)
}

fn split_extension<'a>(name: &'a str, hint: Option<&str>) -> (&'a str, String) {
    let hint = hint
        .map(normalize_extension)
        .filter(|ext| !ext.is_empty())
        .unwrap_or_else(|| DEFAULT_EXTENSION.to_string());
    let name = name.trim();
    if let Some(split) = name.len().checked_sub(hint.len())
        && name.is_char_boundary(split)
        && name[split..].eq_ignore_ascii_case(&hint)
    {
        return (&name[..split], name[split..].to_string());
    }
    (name, hint)
}

/// Remove the trailing group matched by `regex` from `working`, returning its
/// inner text.
fn take_trailing(working: &mut String, regex: &Regex) -> Option<String> {
    let captures = regex.captures(working)?;
    let inner = collapse_whitespace(&captures[1]);
    let start = captures.get(0)?.start();
    working.truncate(start);
    Some(inner).filter(|inner| !inner.is_empty())
}

/// The rightmost parenthesized group is the author, and a year group directly
/// before it is the year. A lone group is the year when it is a valid year,
/// otherwise the author.
fn take_year_and_author(working: &mut String) -> (Option<String>, Option<String>) {
    let year_only = TRAILING_YEAR_REGEX.is_match(working);
    let Some(last) = take_trailing(working, &TRAILING_GROUP_REGEX) else {
        return (None, None);
    };
    if let Some(year) = take_trailing(working, &TRAILING_YEAR_REGEX) {
        return (Some(year), Some(last));
    }
    match year_only && !TRAILING_GROUP_REGEX.is_match(working) {
        true => {
            tracing::debug!(year = %last, "Lone trailing group is a year");
            (Some(last), None)
        },
        false => (None, Some(last)),
    }
}

/// Split the series part into title, volume and subtitle.
fn split_series(series: &str) -> (String, String, Option<String>) {
    let series = series.trim();
    if let Some(m) = VOLUME_TOKEN_REGEX.find(series) {
        let title = series[..m.start()].trim_end();
        let title = title.strip_suffix('-').unwrap_or(title).trim_end();
        let subtitle = series[m.end()..].trim_start();
        let subtitle = subtitle.strip_prefix('-').unwrap_or(subtitle).trim();
        let subtitle = Some(subtitle.to_string()).filter(|s| !s.is_empty());
        return (title.to_string(), normalize_volume(m.as_str()), subtitle);
    }

    let segments: Vec<&str> = series.split(LEGACY_SEPARATOR).collect();
    match segments.as_slice() {
        [title, volume, rest @ ..] => {
            let subtitle = Some(rest.join(LEGACY_SEPARATOR)).filter(|s| !s.trim().is_empty());
            (title.to_string(), normalize_volume(volume), subtitle)
        },
        _ => (series.to_string(), DEFAULT_VOLUME.to_string(), None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(
        "Title vol_13 Subtitle (2024) (Author) {ID.ABC123} [tag].m4b",
        "Title", "vol_13", Some("Subtitle"), Some("2024"), Some("Author"), Some("tag")
    )]
    #[case("Title vol_01 {ID.ABC123}.m4b", "Title", "vol_01", None, None, None, None)]
    #[case("Title vol_01 {ID.ABC123}", "Title", "vol_01", None, None, None, None)]
    #[case("Title vol.7 (Author) {ID.ABC123}", "Title", "vol_07", None, None, Some("Author"), None)]
    #[case("Title (2024) {ID.ABC123}", "Title", "vol_01", None, Some("2024"), None, None)]
    #[case("Title vol_01 Sub (2024) {ID.X1} [tag]", "Title", "vol_01", Some("Sub"), Some("2024"), None, Some("tag"))]
    #[case("Title vol_01 (1850) {ID.X1}", "Title", "vol_01", None, None, Some("1850"), None)]
    #[case("Title vol_01 (Pub) (2024) {ID.X1}", "Title", "vol_01", Some("(Pub)"), None, Some("2024"), None)]
    #[case("Title vol_2 (Kugane Maruyama) {ID.X1}", "Title", "vol_02", None, None, Some("Kugane Maruyama"), None)]
    #[case("Title (Part 2) vol_3 {ID.X1}", "Title (Part 2)", "vol_03", None, None, None, None)]
    #[case("Title - vol_13 - Sub Title {ID.X1}", "Title", "vol_13", Some("Sub Title"), None, None, None)]
    #[case("Title - 5 - Sub - Title {ID.X1}", "Title", "vol_05", Some("Sub - Title"), None, None, None)]
    #[case("Title - Special {ID.X1}", "Title", "Special", None, None, None, None)]
    #[case("Re:Zero volume 4.5 Side (2019) (Tappei) {ID.X1} [Yen Press]", "Re:Zero", "vol_04.5", Some("Side"), Some("2019"), Some("Tappei"), Some("Yen Press"))]
    #[case("Title vol_01 (Pub) (Author) {ID.X1}", "Title", "vol_01", Some("(Pub)"), None, Some("Author"), None)]
    fn test_parse(
        #[case] name: &str,
        #[case] title: &str,
        #[case] volume: &str,
        #[case] subtitle: Option<&str>,
        #[case] year: Option<&str>,
        #[case] author: Option<&str>,
        #[case] tag: Option<&str>,
    ) {
        let tokens = parse(name, None).unwrap();
        assert_eq!(tokens.title(), title);
        assert_eq!(tokens.volume(), volume);
        assert_eq!(tokens.subtitle(), subtitle);
        assert_eq!(tokens.year(), year);
        assert_eq!(tokens.author(), author);
        assert_eq!(tokens.tag(), tag);
    }

    #[test]
    fn test_parse_non_year_group_is_not_a_year() {
        let tokens = parse("Title vol_01 Sub (Publisher) (Author) {ID.X1}", None).unwrap();
        assert_eq!(tokens.author(), Some("Author"));
        assert_eq!(tokens.year(), None);
        assert_eq!(tokens.subtitle(), Some("Sub (Publisher)"));
    }

    #[rstest]
    #[case("Title vol_01 {ID.X1}.M4B", None, ".M4B")]
    #[case("Title vol_01 {ID.X1}.mp3", Some("mp3"), ".mp3")]
    #[case("Title vol_01 {ID.X1}", Some(".flac"), ".flac")]
    #[case("Title vol_01 {ID.X1}.mp3", None, ".m4b")]
    fn test_parse_extension(#[case] name: &str, #[case] hint: Option<&str>, #[case] expected: &str) {
        assert_eq!(parse(name, hint).unwrap().extension(), expected);
    }

    #[test]
    fn test_parse_missing_identifier() {
        let err = parse("Title vol_01 (Author).m4b", None).unwrap_err();
        assert!(matches!(&*err, ErrorKind::MissingIdentifier(name) if name == "Title vol_01 (Author).m4b"));
    }

    #[test]
    fn test_parse_multiple_identifiers_first_wins() {
        let tokens = parse("Title vol_01 {ID.FIRST} (Author) {ID.SECOND}", None).unwrap();
        assert_eq!(tokens.identifier().as_str(), "ID.FIRST");
        assert_eq!(tokens.author(), Some("Author"));
        assert_eq!(tokens.title(), "Title");
    }

    #[test]
    fn test_parse_collapses_whitespace() {
        let tokens = parse("  Title   Two   vol_01    Sub   Title  (  Author  )  {ID.X1} ", None).unwrap();
        assert_eq!(tokens.title(), "Title Two");
        assert_eq!(tokens.subtitle(), Some("Sub Title"));
        assert_eq!(tokens.author(), Some("Author"));
    }
}
