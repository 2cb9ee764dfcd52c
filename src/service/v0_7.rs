//! Boss API v0.7.

mod metadata;
mod project;
mod volume;

pub use metadata::MetadataServiceV0_7;
pub use project::ProjectServiceV0_7;
pub use volume::VolumeServiceV0_7;

pub const VERSION: &str = "v0.7";
