//! Client SDK for the Boss neuroscience data API.
//!
//! Start from [`BossRemote`], configured from `~/.intern/intern.cfg` or an
//! in-memory map, and use it to manage resources, groups, permissions,
//! users and metadata, or to move voxel cutouts in and out of the Boss.
//! [`m2g`] talks to the separate m2g graph services.

pub mod auth;
pub mod config;
pub mod error;
pub mod http;
pub mod m2g;
pub mod remote;
pub mod resource;
pub mod service;

pub use config::{ConfigSource, Endpoint, RemoteConfig};
pub use error::{Error, Result};
pub use remote::{BossRemote, Remote};
pub use resource::{
    ChannelResource, CollectionResource, CoordinateFrameResource, Datatype, ExperimentResource, Resource,
};
