//! Length-bounded shortening by whole-token removal.
//!
//! The shortener never slices strings. It walks a fixed, strictly decreasing
//! sequence of feature masks (first on the file, then on the folder) and
//! re-renders after each step, stopping at the first pair that fits the
//! budget.

use crate::build::NameBuilder;
use crate::error::{ErrorKind, Result};
use crate::length::PathBudget;
use crate::models::{Feature, FeatureMask, Tokens};
use std::fmt::{Display, Formatter, Result as FmtResult};

/// Stage A: features removed from the file name, in order.
pub const FILE_TRIM_ORDER: [Feature; 4] = [Feature::Year, Feature::Author, Feature::Tag, Feature::Subtitle];
/// Stage B: features removed from the folder name, in order.
pub const FOLDER_TRIM_ORDER: [Feature; 3] = [Feature::Year, Feature::Author, Feature::Subtitle];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize), serde(rename_all = "lowercase"))]
pub enum Stage {
    File,
    Folder,
}
impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::File => "file",
            Self::Folder => "folder",
        }
    }
}

/// One token removal that changed a rendered name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct TrimStep {
    pub stage: Stage,
    pub feature: Feature,
}
impl Display for TrimStep {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}:{}", self.stage.as_str(), self.feature)
    }
}

/// A folder/file pair that fits the budget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shortened {
    pub folder: String,
    pub file: String,
    pub folder_mask: FeatureMask,
    pub file_mask: FeatureMask,
    pub length: usize,
    pub steps: Vec<TrimStep>,
}
impl Shortened {
    pub fn was_shortened(&self) -> bool {
        !self.steps.is_empty()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Shortener {
    pub builder: NameBuilder,
    pub budget: PathBudget,
}
impl Shortener {
    pub fn new(builder: NameBuilder, budget: PathBudget) -> Self {
        Self { builder, budget }
    }

    /// Find the least-trimmed folder/file pair, starting from `initial`, that
    /// fits the budget.
    ///
    /// Fails with [`ErrorKind::Unshortenable`] carrying the minimum-viable
    /// pair when even that does not fit.
    pub fn shorten(&self, tokens: &Tokens, initial: FeatureMask) -> Result<Shortened> {
        let mut state = State {
            folder_mask: initial,
            file_mask: initial,
            folder: self.builder.folder_name(tokens, initial),
            file: self.builder.file_name(tokens, initial),
            steps: Vec::new(),
        };
        if let Some(done) = self.finish(&state) {
            return Ok(done);
        }

        for feature in FILE_TRIM_ORDER {
            state.file_mask = state.file_mask.without(feature);
            let file = self.builder.file_name(tokens, state.file_mask);
            self.record(&mut state.file, file, Stage::File, feature, &mut state.steps);
            if let Some(done) = self.finish(&state) {
                return Ok(done);
            }
        }

        for feature in FOLDER_TRIM_ORDER {
            state.folder_mask = state.folder_mask.without(feature);
            let folder = self.builder.folder_name(tokens, state.folder_mask);
            self.record(&mut state.folder, folder, Stage::Folder, feature, &mut state.steps);
            if let Some(done) = self.finish(&state) {
                return Ok(done);
            }
        }

        exn::bail!(ErrorKind::Unshortenable {
            length: self.budget.length(&state.folder, &state.file),
            cap: self.budget.cap,
            folder: state.folder,
            file: state.file,
        })
    }

    fn record(&self, current: &mut String, next: String, stage: Stage, feature: Feature, steps: &mut Vec<TrimStep>) {
        if *current == next {
            tracing::trace!(stage = stage.as_str(), %feature, "Trim step left name unchanged");
            return;
        }
        tracing::debug!(stage = stage.as_str(), %feature, name = %next, "Removed token");
        steps.push(TrimStep { stage, feature });
        *current = next;
    }

    fn finish(&self, state: &State) -> Option<Shortened> {
        let length = self.budget.length(&state.folder, &state.file);
        if length > self.budget.cap {
            return None;
        }
        if !state.steps.is_empty() {
            tracing::info!(length, cap = self.budget.cap, steps = state.steps.len(), "Shortened name to fit cap");
        }
        Some(Shortened {
            folder: state.folder.clone(),
            file: state.file.clone(),
            folder_mask: state.folder_mask,
            file_mask: state.file_mask,
            length,
            steps: state.steps.clone(),
        })
    }
}

struct State {
    folder_mask: FeatureMask,
    file_mask: FeatureMask,
    folder: String,
    file: String,
    steps: Vec<TrimStep>,
}
