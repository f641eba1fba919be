//! Materialization of computed destinations as hardlinks (or copies) against
//! a read-only source tree.

mod device;
pub mod error;
mod materialize;
mod models;
mod perms;

pub use crate::device::{DeviceProbe, FsDeviceProbe, is_unraid_share_mix};
pub use crate::materialize::{LinkOptions, Linker};
pub use crate::models::{LinkAction, Method};
pub use crate::perms::Permissions;
