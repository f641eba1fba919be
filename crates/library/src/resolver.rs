use crate::error::{ErrorKind, Result};
use hardbound_config::NamingConfig;
use hardbound_naming::error::ErrorKind as NamingErrorKind;
use hardbound_naming::{FeatureMask, NameBuilder, PathBudget, Shortener, Tokens, TrimStep, enforce_identifier, parse};
use serde::Serialize;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::instrument;

/// Where a media item ends up: `root/folder/file`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedDestination {
    pub root: PathBuf,
    pub folder: String,
    pub file: String,
}
impl ResolvedDestination {
    pub fn folder_path(&self) -> PathBuf {
        self.root.join(&self.folder)
    }

    pub fn file_path(&self) -> PathBuf {
        self.folder_path().join(&self.file)
    }
}

/// Everything decided about one source directory before touching the
/// destination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub tokens: Tokens,
    pub destination: ResolvedDestination,
    /// The extension the file name ends with, e.g. `.m4b`.
    pub extension: String,
    /// Torrent-internal length of `folder/file`.
    pub length: usize,
    pub steps: Vec<TrimStep>,
}
impl Resolution {
    /// The destination file name without its extension.
    pub fn file_stem(&self) -> &str {
        self.destination.file.strip_suffix(&self.extension).unwrap_or(&self.destination.file)
    }
}

/// Turns a source directory into a tracker-compliant destination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolver {
    pub shortener: Shortener,
    /// Optional groups rendered before any shortening.
    pub initial_mask: FeatureMask,
    /// Extensions looked for in the source directory, best first.
    pub ext_priority: Vec<String>,
    pub fallback_ext: String,
}
impl Resolver {
    pub fn from_config(config: &NamingConfig) -> Self {
        Self {
            shortener: Shortener::new(
                NameBuilder::new(config.joiner),
                PathBudget::new(config.path_cap, config.length_unit),
            ),
            initial_mask: config.features,
            ext_priority: config.ext_priority.clone(),
            fallback_ext: config.fallback_ext.clone(),
        }
    }

    pub fn budget(&self) -> &PathBudget {
        &self.shortener.budget
    }

    /// Resolve the destination for `source_dir` under `destination_root`.
    ///
    /// The directory's own name is parsed. Without an explicit `extension`
    /// the directory listing picks one from `ext_priority`.
    #[instrument(skip_all, fields(source = %source_dir.display()))]
    pub fn resolve(&self, source_dir: &Path, destination_root: &Path, extension: Option<&str>) -> Result<Resolution> {
        let Some(name) = source_dir.file_name().map(|name| name.to_string_lossy().into_owned()) else {
            let kind = NamingErrorKind::MissingIdentifier(source_dir.display().to_string());
            return Err(ErrorKind::naming(kind.into()));
        };
        let extension = match extension {
            Some(extension) => dotted(extension),
            None => self.detect_extension(source_dir),
        };
        self.resolve_name(&name, destination_root, &extension)
    }

    /// Resolve a bare name, without looking at the filesystem.
    pub fn resolve_name(&self, name: &str, destination_root: &Path, extension: &str) -> Result<Resolution> {
        let tokens = parse(name, Some(extension)).map_err(ErrorKind::naming)?;
        let shortened = self.shortener.shorten(&tokens, self.initial_mask).map_err(ErrorKind::naming)?;
        enforce_identifier(&shortened.folder, &shortened.file, tokens.identifier()).map_err(ErrorKind::naming)?;
        tracing::debug!(
            folder = %shortened.folder,
            file = %shortened.file,
            length = shortened.length,
            "Resolved destination"
        );
        Ok(Resolution {
            extension: tokens.extension().to_string(),
            destination: ResolvedDestination {
                root: destination_root.to_path_buf(),
                folder: shortened.folder,
                file: shortened.file,
            },
            length: shortened.length,
            steps: shortened.steps,
            tokens,
        })
    }

    /// The first extension of `ext_priority` present among the directory's
    /// files, or `fallback_ext`.
    pub fn detect_extension(&self, source_dir: &Path) -> String {
        let entries = match fs::read_dir(source_dir) {
            Ok(entries) => entries,
            Err(err) => {
                tracing::warn!(
                    path = %source_dir.display(),
                    error = %err,
                    fallback = %self.fallback_ext,
                    "Could not list source directory; using fallback extension"
                );
                return self.fallback_ext.clone();
            },
        };
        let present: HashSet<String> = entries
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_ok_and(|kind| kind.is_file()))
            .filter_map(|entry| lower_extension(&entry.path()))
            .collect();
        self.ext_priority
            .iter()
            .find(|ext| present.contains(&ext.to_lowercase()))
            .cloned()
            .unwrap_or_else(|| self.fallback_ext.clone())
    }
}
impl Default for Resolver {
    fn default() -> Self {
        Self::from_config(&NamingConfig::default())
    }
}

/// `.ext`, lower-cased, of a path.
pub(crate) fn lower_extension(path: &Path) -> Option<String> {
    path.extension().and_then(|ext| ext.to_str()).map(|ext| format!(".{}", ext.to_lowercase()))
}

fn dotted(extension: &str) -> String {
    format!(".{}", extension.trim().trim_start_matches('.'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use hardbound_naming::{Feature, LengthUnit, Stage};
    use rstest::rstest;

    const NAME: &str = "Title vol_13 Subtitle (2024) (Author) {ID.ABC123} [tag]";

    fn source_dir(files: &[&str]) -> (tempfile::TempDir, PathBuf) {
        let root = tempfile::tempdir().unwrap();
        let dir = root.path().join(NAME);
        fs::create_dir_all(&dir).unwrap();
        for file in files {
            fs::write(dir.join(file), b"").unwrap();
        }
        (root, dir)
    }

    #[rstest]
    #[case(&["a.mp3", "b.m4b", "cover.jpg"], ".m4b")]
    #[case(&["a.mp3", "b.flac"], ".mp3")]
    #[case(&["a.FLAC"], ".flac")]
    #[case(&["a.M4A", "b.mp3"], ".m4a")]
    #[case(&["cover.jpg"], ".m4b")]
    #[case(&[], ".m4b")]
    fn test_detect_extension(#[case] files: &[&str], #[case] expected: &str) {
        let (_root, dir) = source_dir(files);
        assert_eq!(Resolver::default().detect_extension(&dir), expected);
    }

    #[test]
    fn test_detect_extension_unreadable_uses_fallback() {
        let resolver = Resolver {
            fallback_ext: ".mp3".to_string(),
            ..Default::default()
        };
        assert_eq!(resolver.detect_extension(Path::new("/nonexistent/hardbound")), ".mp3");
    }

    #[test]
    fn test_resolve_from_directory() {
        let (_root, dir) = source_dir(&["01.mp3"]);
        let resolution = Resolver::default().resolve(&dir, Path::new("/torrents"), None).unwrap();
        assert_eq!(resolution.extension, ".mp3");
        assert_eq!(resolution.destination.folder, "Title vol_13 Subtitle (2024) (Author) {ID.ABC123}");
        assert_eq!(resolution.destination.file, format!("{NAME}.mp3"));
        assert_eq!(resolution.file_stem(), NAME);
        assert_eq!(
            resolution.destination.file_path(),
            Path::new("/torrents").join(&resolution.destination.folder).join(&resolution.destination.file)
        );
        assert!(resolution.steps.is_empty());
    }

    #[test]
    fn test_resolve_explicit_extension() {
        let (_root, dir) = source_dir(&["01.mp3"]);
        let resolution = Resolver::default().resolve(&dir, Path::new("/t"), Some("flac")).unwrap();
        assert_eq!(resolution.extension, ".flac");
        assert!(resolution.destination.file.ends_with("[tag].flac"));
    }

    #[test]
    fn test_resolve_shortens_to_cap() {
        let resolver = Resolver {
            shortener: Shortener::new(NameBuilder::default(), PathBudget::new(100, LengthUnit::Chars)),
            ..Default::default()
        };
        let resolution = resolver.resolve_name(NAME, Path::new("/t"), ".m4b").unwrap();
        assert!(resolution.length <= 100);
        assert_eq!(resolution.steps[0].stage, Stage::File);
        assert_eq!(resolution.steps[0].feature, Feature::Year);
        assert!(resolution.destination.file.contains("{ID.ABC123}"));
    }

    #[test]
    fn test_resolve_missing_identifier() {
        let err = Resolver::default().resolve(Path::new("/media/Title vol_01"), Path::new("/t"), None).unwrap_err();
        assert_eq!(err.code(), "missing-identifier");
    }

    #[test]
    fn test_resolve_unshortenable() {
        let resolver = Resolver {
            shortener: Shortener::new(NameBuilder::default(), PathBudget::new(20, LengthUnit::Chars)),
            ..Default::default()
        };
        let err = resolver.resolve_name(NAME, Path::new("/t"), ".m4b").unwrap_err();
        assert_eq!(err.code(), "unshortenable");
    }
}
