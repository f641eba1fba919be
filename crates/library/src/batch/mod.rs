//! Batch materialization of many source directories.
//!
//! Every item is processed in isolation: a failing item is recorded in the
//! [`BatchReport`] and the batch carries on. [`run`] works through items one
//! at a time on the calling thread; [`stream`] spreads them over tokio's
//! blocking pool and reports progress as [`BatchEvent`]s.

mod report;
mod stream;

pub use self::report::{BatchReport, Failure, ItemReport};
pub use self::stream::{BatchEvent, collect, stream};

use crate::companions::{CompanionPolicy, plan_companions, primary_source};
use crate::error::{ErrorKind, Result};
use crate::resolver::{Resolution, Resolver};
use hardbound_config::Config;
use hardbound_link::{LinkAction, LinkOptions, Linker, Permissions};
use std::path::PathBuf;
use tracing::instrument;

/// One source directory and the root its destination goes under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchItem {
    pub source: PathBuf,
    pub destination_root: PathBuf,
}
impl BatchItem {
    pub fn new(source: impl Into<PathBuf>, destination_root: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            destination_root: destination_root.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Mode {
    /// Resolve and verify names only; never touch the destination.
    #[default]
    DryRun,
    Commit,
}

/// Everything needed to process items, shared by every worker.
#[derive(Debug, Clone)]
pub struct Context {
    pub resolver: Resolver,
    pub linker: Linker,
    pub mode: Mode,
    /// Forces the audio extension instead of detecting it per directory.
    pub extension: Option<String>,
    pub companions: CompanionPolicy,
}
impl Context {
    pub fn from_config(config: &Config, mode: Mode, overwrite: bool) -> Self {
        let options = LinkOptions {
            copy_fallback: config.link.copy_fallback,
            overwrite,
            permissions: Permissions {
                file_mode: config.link.file_mode,
                dir_mode: config.link.dir_mode,
                uid: config.link.owner_uid,
                gid: config.link.owner_gid,
            },
        };
        Self {
            resolver: Resolver::from_config(&config.naming),
            linker: Linker::new(options),
            mode,
            extension: None,
            companions: CompanionPolicy::from_config(&config.link),
        }
    }

    #[must_use]
    pub fn with_extension(mut self, extension: Option<String>) -> Self {
        self.extension = extension;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Dry-run: the destination was resolved but not materialized.
    Planned,
    Linked(LinkAction),
}

/// A sidecar next to the primary file. `action` is `None` in dry-run mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompanionOutcome {
    pub source: PathBuf,
    pub destination: PathBuf,
    pub action: Option<LinkAction>,
}

/// The outcome of (successfully) processing a single item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemOutcome {
    pub resolution: Resolution,
    /// The audio file linked (or to be linked). In dry-run mode this is `None`
    /// when the directory has no matching file.
    pub source_file: Option<PathBuf>,
    pub outcome: Outcome,
    pub companions: Vec<CompanionOutcome>,
    /// Companion failures never fail the item.
    pub companion_errors: Vec<String>,
}
impl ItemOutcome {
    pub fn is_already_linked(&self) -> bool {
        matches!(self.outcome, Outcome::Linked(LinkAction::AlreadyLinked(_)))
    }
}

/// Resolve, verify and (in [`Mode::Commit`]) materialize one item.
#[instrument(skip_all, fields(source = %item.source.display()))]
pub fn process(ctx: &Context, item: &BatchItem) -> Result<ItemOutcome> {
    let resolution = ctx.resolver.resolve(&item.source, &item.destination_root, ctx.extension.as_deref())?;

    if ctx.mode == Mode::DryRun {
        let source_file = primary_source(&item.source, &resolution.extension).ok();
        let companions = planned_companions(ctx, item, source_file.as_deref(), &resolution)
            .into_iter()
            .map(|companion| CompanionOutcome {
                source: companion.source,
                destination: companion.destination,
                action: None,
            })
            .collect();
        return Ok(ItemOutcome {
            resolution,
            source_file,
            outcome: Outcome::Planned,
            companions,
            companion_errors: Vec::new(),
        });
    }

    let source_file = primary_source(&item.source, &resolution.extension)?;
    let action = ctx
        .linker
        .materialize(&source_file, &resolution.destination.file_path())
        .map_err(ErrorKind::link)?;

    let mut companions = Vec::new();
    let mut companion_errors = Vec::new();
    for companion in planned_companions(ctx, item, Some(&source_file), &resolution) {
        match ctx.linker.materialize(&companion.source, &companion.destination) {
            Ok(action) => companions.push(CompanionOutcome {
                source: companion.source,
                destination: companion.destination,
                action: Some(action),
            }),
            Err(err) => {
                tracing::warn!(companion = %companion.source.display(), error = %*err, "Could not link companion");
                companion_errors.push(format!("{}: {}", companion.source.display(), *err));
            },
        }
    }

    Ok(ItemOutcome {
        resolution,
        source_file: Some(source_file),
        outcome: Outcome::Linked(action),
        companions,
        companion_errors,
    })
}

fn planned_companions(
    ctx: &Context,
    item: &BatchItem,
    primary: Option<&std::path::Path>,
    resolution: &Resolution,
) -> Vec<crate::companions::Companion> {
    match ctx.companions.enabled {
        true => plan_companions(&item.source, primary, resolution, &ctx.companions, ctx.resolver.budget()),
        false => Vec::new(),
    }
}

/// Process one item, turning an error into a recorded [`Failure`].
pub(crate) fn process_item(ctx: &Context, item: BatchItem) -> ItemReport {
    let result = process(ctx, &item).map_err(|err| {
        tracing::error!(source = %item.source.display(), error = %*err, "Item failed");
        Failure::new(&item.source, &err)
    });
    ItemReport { item, result }
}

/// Process items sequentially. Never fails as a whole.
pub fn run(ctx: &Context, items: impl IntoIterator<Item = BatchItem>) -> BatchReport {
    let mut report = BatchReport::default();
    for item in items {
        report.push(process_item(ctx, item));
    }
    tracing::info!(
        succeeded = report.succeeded,
        skipped = report.skipped,
        failed = report.failed,
        "Batch complete"
    );
    report
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use hardbound_link::Method;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    pub(crate) const GOOD: &str = "Title vol_01 Sub (2020) (Author) {ID.GOOD1}";
    pub(crate) const OTHER: &str = "Other vol_02 {ID.GOOD2}";
    pub(crate) const BAD: &str = "No Identifier vol_01";

    /// A media tree with one directory per name, each holding `book.m4b` and
    /// `book.cue`.
    pub(crate) fn library(names: &[&str]) -> (TempDir, Vec<BatchItem>) {
        let root = tempfile::tempdir().unwrap();
        let items = names
            .iter()
            .map(|name| {
                let dir = root.path().join("media").join(name);
                fs::create_dir_all(&dir).unwrap();
                fs::write(dir.join("book.m4b"), b"audio").unwrap();
                fs::write(dir.join("book.cue"), b"cue").unwrap();
                BatchItem::new(dir, root.path().join("torrents"))
            })
            .collect();
        (root, items)
    }

    pub(crate) fn context(mode: Mode) -> Context {
        Context::from_config(&Config::default(), mode, false)
    }

    #[test]
    fn test_process_commit_links_primary_and_companions() {
        let (_root, items) = library(&[GOOD]);
        let outcome = process(&context(Mode::Commit), &items[0]).unwrap();
        let destination = outcome.resolution.destination.file_path();
        assert_eq!(
            outcome.outcome,
            Outcome::Linked(LinkAction::Created {
                path: destination.clone(),
                method: Method::Hardlink
            })
        );
        assert_eq!(fs::read(&destination).unwrap(), b"audio");
        assert_eq!(outcome.companions.len(), 1);
        let cue = &outcome.companions[0];
        assert_eq!(cue.destination, destination.with_extension("cue"));
        assert!(cue.action.is_some());
        assert!(outcome.companion_errors.is_empty());
    }

    #[test]
    fn test_process_dry_run_touches_nothing() {
        let (root, items) = library(&[GOOD]);
        let outcome = process(&context(Mode::DryRun), &items[0]).unwrap();
        assert_eq!(outcome.outcome, Outcome::Planned);
        assert_eq!(outcome.source_file, Some(items[0].source.join("book.m4b")));
        assert_eq!(outcome.companions.len(), 1);
        assert!(outcome.companions[0].action.is_none());
        assert!(!root.path().join("torrents").exists());
    }

    #[test]
    fn test_process_twice_is_already_linked() {
        let (_root, items) = library(&[GOOD]);
        let ctx = context(Mode::Commit);
        process(&ctx, &items[0]).unwrap();
        let outcome = process(&ctx, &items[0]).unwrap();
        assert!(outcome.is_already_linked());
        assert!(matches!(outcome.companions[0].action, Some(LinkAction::AlreadyLinked(_))));
    }

    #[test]
    fn test_companion_conflict_does_not_fail_item() {
        let (_root, items) = library(&[GOOD]);
        let ctx = context(Mode::Commit);
        let resolution = ctx.resolver.resolve(&items[0].source, &items[0].destination_root, None).unwrap();
        let cue = resolution.destination.file_path().with_extension("cue");
        fs::create_dir_all(cue.parent().unwrap()).unwrap();
        fs::write(&cue, b"someone else's cue").unwrap();

        let outcome = process(&ctx, &items[0]).unwrap();
        assert!(matches!(outcome.outcome, Outcome::Linked(LinkAction::Created { .. })));
        assert!(outcome.companions.is_empty());
        assert_eq!(outcome.companion_errors.len(), 1);
    }

    #[test]
    fn test_process_without_audio_file() {
        let (_root, items) = library(&[GOOD]);
        fs::remove_file(items[0].source.join("book.m4b")).unwrap();
        let ctx = context(Mode::Commit).with_extension(Some(".m4b".to_string()));
        let err = process(&ctx, &items[0]).unwrap_err();
        assert_eq!(err.code(), "source-unavailable");
    }

    #[test]
    fn test_run_isolates_failures() {
        let (_root, items) = library(&[GOOD, BAD, OTHER]);
        let report = run(&context(Mode::Commit), items.clone());
        assert_eq!((report.succeeded, report.skipped, report.failed), (2, 0, 1));
        assert_eq!(report.total(), 3);
        assert!(report.has_failures());
        assert_eq!(report.failures[0].source, items[1].source);
        assert_eq!(report.failures[0].kind, "missing-identifier");

        let again = run(&context(Mode::Commit), items);
        assert_eq!((again.succeeded, again.skipped, again.failed), (0, 2, 1));
    }

    #[test]
    fn test_conflict_without_overwrite() {
        let (_root, items) = library(&[OTHER]);
        let ctx = context(Mode::Commit);
        let destination = ctx.resolver.resolve(&items[0].source, Path::new(&items[0].destination_root), None).unwrap();
        let file = destination.destination.file_path();
        fs::create_dir_all(file.parent().unwrap()).unwrap();
        fs::write(&file, b"different").unwrap();

        let report = run(&ctx, items.clone());
        assert_eq!(report.failures[0].kind, "destination-conflict");

        let overwrite = Context::from_config(&Config::default(), Mode::Commit, true);
        let report = run(&overwrite, items);
        assert_eq!(report.succeeded, 1);
        assert_eq!(fs::read(&file).unwrap(), b"audio");
    }
}
