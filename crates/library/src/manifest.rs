//! Batch manifests: one `SOURCE_DIR|DESTINATION_ROOT` pair per line.

use crate::batch::BatchItem;
use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use std::fs;
use std::path::Path;

const SEPARATOR: char = '|';

/// Parse manifest text. Blank lines and `#` comments are ignored; malformed
/// lines are logged and skipped.
pub fn parse_manifest(text: &str) -> Vec<BatchItem> {
    text.lines()
        .enumerate()
        .filter_map(|(index, line)| {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                return None;
            }
            match line.split_once(SEPARATOR) {
                Some((source, destination)) if !source.trim().is_empty() && !destination.trim().is_empty() => {
                    Some(BatchItem::new(source.trim(), destination.trim()))
                },
                _ => {
                    tracing::warn!(line = index + 1, content = %line, "Skipping malformed manifest line");
                    None
                },
            }
        })
        .collect()
}

pub fn read_manifest(path: &Path) -> Result<Vec<BatchItem>> {
    let text = fs::read_to_string(path).or_raise(|| ErrorKind::Manifest(path.to_path_buf()))?;
    let items = parse_manifest(&text);
    tracing::debug!(path = %path.display(), items = items.len(), "Read manifest");
    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_parse_manifest() {
        let text = "\
# audiobooks
/media/A vol_01 {ID.A}|/torrents

  /media/B vol_02 {ID.B} | /other
not a pair
|/torrents
/media/C|
";
        assert_eq!(
            parse_manifest(text),
            vec![
                BatchItem::new("/media/A vol_01 {ID.A}", "/torrents"),
                BatchItem::new("/media/B vol_02 {ID.B}", "/other"),
            ]
        );
    }

    #[rstest]
    #[case("")]
    #[case("# only a comment\n\n")]
    fn test_parse_manifest_empty(#[case] text: &str) {
        assert!(parse_manifest(text).is_empty());
    }

    #[test]
    fn test_read_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("batch.txt");
        fs::write(&path, "/media/A {ID.A}|/t\n").unwrap();
        assert_eq!(read_manifest(&path).unwrap(), vec![BatchItem::new("/media/A {ID.A}", "/t")]);

        let err = read_manifest(&dir.path().join("missing.txt")).unwrap_err();
        assert_eq!(err.code(), "manifest");
    }
}
