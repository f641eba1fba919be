//! Parsing, rendering and shortening of tracker-safe media item names.
//!
//! Everything in this crate is pure: no I/O, no global state. The usual flow
//! is [`parse`] a raw name into [`Tokens`], then hand those to a
//! [`Shortener`] to obtain a folder/file pair that fits a [`PathBudget`],
//! and finally [`enforce_identifier`] on the result.

mod build;
mod consts;
pub mod error;
mod length;
pub mod models;
mod parse;
mod policy;
mod shorten;
mod volume;

pub use crate::build::{NameBuilder, SeriesJoiner};
pub use crate::consts::{DEFAULT_EXTENSION, DEFAULT_PATH_CAP, DEFAULT_VOLUME, TORRENT_PATH_SEPARATOR};
pub use crate::length::{LengthUnit, PathBudget, fits_cap, torrent_path_length};
pub use crate::models::{Feature, FeatureMask, Identifier, Tokens};
pub use crate::parse::parse;
pub use crate::policy::enforce_identifier;
pub use crate::shorten::{FILE_TRIM_ORDER, FOLDER_TRIM_ORDER, Shortened, Shortener, Stage, TrimStep};
pub use crate::volume::normalize_volume;
