use crate::batch::{BatchItem, ItemOutcome};
use crate::error::Error;
use std::path::{Path, PathBuf};

/// A per-item failure, flattened for reporting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    pub source: PathBuf,
    /// Stable error code, e.g. `destination-conflict`.
    pub kind: String,
    pub message: String,
}
impl Failure {
    pub fn new(source: &Path, err: &Error) -> Self {
        Self {
            source: source.to_path_buf(),
            kind: err.code().to_string(),
            message: (**err).to_string(),
        }
    }
}

/// What happened to one [`BatchItem`].
#[derive(Debug, Clone)]
pub struct ItemReport {
    pub item: BatchItem,
    pub result: Result<ItemOutcome, Failure>,
}
impl ItemReport {
    pub fn is_skipped(&self) -> bool {
        self.result.as_ref().is_ok_and(ItemOutcome::is_already_linked)
    }
}

/// Totals and per-item details of a batch run.
#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    pub succeeded: usize,
    /// Items whose destination was already linked.
    pub skipped: usize,
    pub failed: usize,
    pub items: Vec<ItemReport>,
    pub failures: Vec<Failure>,
}
impl BatchReport {
    pub fn push(&mut self, report: ItemReport) {
        match &report.result {
            Ok(_) if report.is_skipped() => self.skipped += 1,
            Ok(_) => self.succeeded += 1,
            Err(failure) => {
                self.failed += 1;
                self.failures.push(failure.clone());
            },
        }
        self.items.push(report);
    }

    pub fn total(&self) -> usize {
        self.items.len()
    }

    pub fn has_failures(&self) -> bool {
        self.failed > 0
    }
}
