pub mod audit;
pub mod batch;
mod companions;
pub mod error;
mod manifest;
mod resolver;

pub use crate::companions::{Companion, CompanionPolicy, plan_companions, primary_source};
pub use crate::manifest::{parse_manifest, read_manifest};
pub use crate::resolver::{Resolution, ResolvedDestination, Resolver};
