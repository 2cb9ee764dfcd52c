//! Metadata service: string key/value pairs attached to resources.

use super::{unsupported, v0_7, BossSession};
use crate::error::Result;
use crate::resource::Resource;
use std::collections::BTreeMap;

/// One API version's implementation of the metadata service.
pub trait MetadataApi: Send + Sync {
    fn list(&self, session: &BossSession, resource: &Resource) -> Result<Vec<String>>;
    fn create(&self, session: &BossSession, resource: &Resource, keys_vals: &BTreeMap<String, String>) -> Result<()>;
    fn get(&self, session: &BossSession, resource: &Resource, keys: &[&str]) -> Result<BTreeMap<String, String>>;
    fn update(&self, session: &BossSession, resource: &Resource, keys_vals: &BTreeMap<String, String>) -> Result<()>;
    fn delete(&self, session: &BossSession, resource: &Resource, keys: &[&str]) -> Result<()>;
}

fn metadata_api(version: &str) -> Option<Box<dyn MetadataApi>> {
    match version {
        v0_7::VERSION => Some(Box::new(v0_7::MetadataServiceV0_7)),
        _ => None,
    }
}

/// Routes metadata calls to the implementation for one API version.
pub struct MetadataService {
    session: BossSession,
    version: String,
    service: Box<dyn MetadataApi>,
}

impl MetadataService {
    pub fn new(session: BossSession, version: &str) -> Result<MetadataService> {
        let service = metadata_api(version).ok_or_else(|| unsupported(version))?;
        Ok(MetadataService {
            session,
            version: version.to_string(),
            service,
        })
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn session(&self) -> &BossSession {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut BossSession {
        &mut self.session
    }

    /// Keys attached to `resource`.
    pub fn list(&self, resource: &Resource) -> Result<Vec<String>> {
        self.service.list(&self.session, resource)
    }

    /// Attach new keys; fails if a key already exists.
    pub fn create(&self, resource: &Resource, keys_vals: &BTreeMap<String, String>) -> Result<()> {
        self.service.create(&self.session, resource, keys_vals)
    }

    pub fn get(&self, resource: &Resource, keys: &[&str]) -> Result<BTreeMap<String, String>> {
        self.service.get(&self.session, resource, keys)
    }

    /// Replace values of existing keys.
    pub fn update(&self, resource: &Resource, keys_vals: &BTreeMap<String, String>) -> Result<()> {
        self.service.update(&self.session, resource, keys_vals)
    }

    pub fn delete(&self, resource: &Resource, keys: &[&str]) -> Result<()> {
        self.service.delete(&self.session, resource, keys)
    }
}
