//! Sidecar files (cue sheets, cover art, documents) linked next to the
//! primary audio file under the destination file's stem.

use crate::error::{ErrorKind, Result};
use crate::resolver::{Resolution, lower_extension};
use hardbound_config::LinkConfig;
use hardbound_link::error::ErrorKind as LinkErrorKind;
use hardbound_naming::PathBudget;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Double suffixes some rippers produce, and what they really are.
const WEIRD_SUFFIXES: [(&str, &str); 5] = [
    (".cue.jpg", ".jpg"),
    (".cue.jpeg", ".jpeg"),
    (".cue.png", ".png"),
    (".cue.m4b", ".m4b"),
    (".cue.mp3", ".mp3"),
];
const CUE_EXT: &str = ".cue";
const IMAGE_EXTS: [&str; 4] = [".jpg", ".jpeg", ".png", ".webp"];
/// Every image is linked under this extension.
const IMAGE_TARGET_EXT: &str = ".jpg";
const DOCUMENT_EXTS: [&str; 3] = [".pdf", ".txt", ".nfo"];
const AUDIO_EXTS: [&str; 8] = [".m4b", ".m4a", ".mp3", ".flac", ".ogg", ".opus", ".aac", ".wav"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompanionPolicy {
    pub enabled: bool,
    /// Destination file names never written (compared case-insensitively).
    pub exclude_names: Vec<String>,
    /// Destination extensions never written.
    pub exclude_exts: Vec<String>,
}
impl CompanionPolicy {
    pub fn from_config(config: &LinkConfig) -> Self {
        Self {
            enabled: config.companions,
            exclude_names: config.exclude_names.iter().map(|name| name.to_lowercase()).collect(),
            exclude_exts: config.exclude_exts.iter().map(|ext| ext.to_lowercase()).collect(),
        }
    }

    fn is_excluded(&self, destination_name: &str) -> bool {
        let name = destination_name.to_lowercase();
        self.exclude_names.contains(&name) || self.exclude_exts.iter().any(|ext| name.ends_with(ext.as_str()))
    }
}
impl Default for CompanionPolicy {
    fn default() -> Self {
        Self::from_config(&LinkConfig::default())
    }
}

/// One sidecar to link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Companion {
    pub source: PathBuf,
    pub destination: PathBuf,
}

/// The lexicographically first regular file in `source_dir` whose extension
/// matches `extension` (case-insensitively).
pub fn primary_source(source_dir: &Path, extension: &str) -> Result<PathBuf> {
    let unavailable = || ErrorKind::link(LinkErrorKind::SourceUnavailable(source_dir.to_path_buf()).into());
    let extension = extension.to_lowercase();
    let entries = fs::read_dir(source_dir).map_err(|err| {
        tracing::warn!(path = %source_dir.display(), error = %err, "Could not list source directory");
        unavailable()
    })?;
    let mut candidates: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_ok_and(|kind| kind.is_file()))
        .map(|entry| entry.path())
        .filter(|path| lower_extension(path).as_deref() == Some(extension.as_str()))
        .collect();
    candidates.sort();
    match candidates.into_iter().next() {
        Some(primary) => Ok(primary),
        None => Err(unavailable()),
    }
}

/// Plan the sidecars of `source_dir` for a resolved destination.
///
/// Other audio files are left behind with a warning and unknown types are
/// ignored. Only the first image is
/// used, and a later file never claims a destination name an earlier one
/// already has. Companions whose path would break the budget are skipped.
pub fn plan_companions(
    source_dir: &Path,
    primary: Option<&Path>,
    resolution: &Resolution,
    policy: &CompanionPolicy,
    budget: &PathBudget,
) -> Vec<Companion> {
    let entries = match fs::read_dir(source_dir) {
        Ok(entries) => entries,
        Err(err) => {
            tracing::warn!(
                path = %source_dir.display(),
                error = %err,
                "Could not list source directory for companions"
            );
            return Vec::new();
        },
    };
    let mut files: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_ok_and(|kind| kind.is_file()))
        .map(|entry| entry.path())
        .filter(|path| Some(path.as_path()) != primary)
        .collect();
    files.sort();

    let stem = resolution.file_stem();
    let folder = &resolution.destination.folder;
    let mut claimed = HashSet::new();
    let mut companions = Vec::new();
    for source in files {
        let file_name = source.file_name().and_then(|name| name.to_str()).unwrap_or_default();
        let Some(target_ext) = companion_extension(file_name) else {
            if is_audio(file_name) {
                tracing::warn!(source = %source.display(), "Audio file is not the primary file; not linked");
            }
            continue;
        };
        let name = format!("{stem}{target_ext}");
        if policy.is_excluded(&name) {
            tracing::debug!(source = %source.display(), name = %name, "Companion excluded");
            continue;
        }
        if !budget.fits(folder, &name) {
            tracing::warn!(
                source = %source.display(),
                length = budget.length(folder, &name),
                cap = budget.cap,
                "Companion would exceed the path cap; skipping"
            );
            continue;
        }
        if !claimed.insert(name.clone()) {
            tracing::debug!(source = %source.display(), name = %name, "Companion destination already claimed");
            continue;
        }
        companions.push(Companion {
            destination: resolution.destination.folder_path().join(&name),
            source,
        });
    }
    companions
}

/// The extension a file is linked under, or `None` if it is not a companion.
fn companion_extension(file_name: &str) -> Option<&'static str> {
    let lower = file_name.to_lowercase();
    let ext = WEIRD_SUFFIXES
        .iter()
        .find(|(weird, _)| lower.ends_with(weird))
        .map(|(_, fixed)| fixed.to_string())
        .or_else(|| lower_extension(Path::new(&lower)))?;
    match ext.as_str() {
        CUE_EXT => Some(CUE_EXT),
        ext if IMAGE_EXTS.contains(&ext) => Some(IMAGE_TARGET_EXT),
        ext => DOCUMENT_EXTS.iter().find(|doc| **doc == ext).copied(),
    }
}

/// Whether a file that is not a companion is audio, weird suffixes included.
fn is_audio(file_name: &str) -> bool {
    let lower = file_name.to_lowercase();
    AUDIO_EXTS.iter().any(|ext| lower.ends_with(ext))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::Resolver;
    use hardbound_naming::LengthUnit;
    use rstest::rstest;

    const NAME: &str = "Title vol_01 {ID.X1}";

    #[rstest]
    #[case("disc.cue", Some(".cue"))]
    #[case("cover.PNG", Some(".jpg"))]
    #[case("folder.webp", Some(".jpg"))]
    #[case("art.cue.jpg", Some(".jpg"))]
    #[case("book.cue.m4b", None)]
    #[case("notes.TXT", Some(".txt"))]
    #[case("info.nfo", Some(".nfo"))]
    #[case("book.pdf", Some(".pdf"))]
    #[case("book.epub", None)]
    #[case("part2.mp3", None)]
    #[case("README", None)]
    fn test_companion_extension(#[case] name: &str, #[case] expected: Option<&str>) {
        assert_eq!(companion_extension(name), expected);
    }

    #[rstest]
    #[case("part2.mp3", true)]
    #[case("Book.M4B", true)]
    #[case("book.cue.m4b", true)]
    #[case("track.flac", true)]
    #[case("disc.cue", false)]
    #[case("book.epub", false)]
    #[case("README", false)]
    fn test_is_audio(#[case] name: &str, #[case] expected: bool) {
        assert_eq!(is_audio(name), expected);
    }

    #[test]
    fn test_plan_companions_leaves_other_audio_behind() {
        let (_root, dir, resolution) = setup(&["01.m4b", "02.m4b", "book.cue.mp3", "book.cue"]);
        let primary = dir.join("01.m4b");
        let companions =
            plan_companions(&dir, Some(&primary), &resolution, &CompanionPolicy::default(), &PathBudget::default());
        assert_eq!(names(&companions), vec![format!("{NAME}.cue")]);
        assert!(companions.iter().all(|c| !is_audio(&c.source.to_string_lossy())));
    }

    fn setup(files: &[&str]) -> (tempfile::TempDir, PathBuf, Resolution) {
        let root = tempfile::tempdir().unwrap();
        let dir = root.path().join("media").join(NAME);
        fs::create_dir_all(&dir).unwrap();
        for file in files {
            fs::write(dir.join(file), b"").unwrap();
        }
        let resolution = Resolver::default().resolve(&dir, &root.path().join("torrents"), None).unwrap();
        (root, dir, resolution)
    }

    fn names(companions: &[Companion]) -> Vec<String> {
        companions
            .iter()
            .map(|c| c.destination.file_name().unwrap().to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn test_primary_source_is_first_match() {
        let (_root, dir, _) = setup(&["02.m4b", "01.M4B", "00.mp3"]);
        assert_eq!(primary_source(&dir, ".m4b").unwrap(), dir.join("01.M4B"));
        let err = primary_source(&dir, ".flac").unwrap_err();
        assert_eq!(err.code(), "source-unavailable");
    }

    #[test]
    fn test_plan_companions() {
        let (_root, dir, resolution) =
            setup(&["book.m4b", "book.cue", "cover.png", "back.jpg", "notes.txt", "extra.epub", "other.mp3"]);
        let primary = dir.join("book.m4b");
        let companions =
            plan_companions(&dir, Some(&primary), &resolution, &CompanionPolicy::default(), &PathBudget::default());
        assert_eq!(names(&companions), vec![format!("{NAME}.jpg"), format!("{NAME}.cue"), format!("{NAME}.txt")]);
        // `back.jpg` sorts before `cover.png`, so it is the image used.
        assert_eq!(companions[0].source, dir.join("back.jpg"));
        let folder = resolution.destination.folder_path();
        assert!(companions.iter().all(|c| c.destination.parent() == Some(folder.as_path())));
    }

    #[test]
    fn test_plan_companions_respects_exclusions() {
        let (_root, dir, resolution) = setup(&["book.m4b", "notes.txt", "book.cue"]);
        let policy = CompanionPolicy {
            exclude_exts: vec![".txt".to_string()],
            ..Default::default()
        };
        let companions = plan_companions(&dir, None, &resolution, &policy, &PathBudget::default());
        assert_eq!(names(&companions), vec![format!("{NAME}.cue")]);
    }

    #[test]
    fn test_plan_companions_skips_over_cap() {
        let (_root, dir, resolution) = setup(&["book.m4b", "book.cue", "notes.nfo"]);
        // Exactly fits the four-character audio extension; `.cue`/`.nfo` fit too.
        let budget = PathBudget::new(resolution.length, LengthUnit::Chars);
        assert_eq!(plan_companions(&dir, None, &resolution, &CompanionPolicy::default(), &budget).len(), 2);
        let budget = PathBudget::new(resolution.length - 1, LengthUnit::Chars);
        assert!(plan_companions(&dir, None, &resolution, &CompanionPolicy::default(), &budget).is_empty());
    }
}
