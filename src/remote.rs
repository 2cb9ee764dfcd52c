//! Remotes: the entry point of the SDK.
//!
//! A remote owns the service clients for one data store and dispatches the
//! generic operations (listing, cutouts) to them.  [`BossRemote`] is the
//! remote for the Boss.

use crate::config::{ConfigSource, RemoteConfig, METADATA_SECTION, PROJECT_SECTION, VOLUME_SECTION};
use crate::error::{Error, Result};
use crate::http::{HttpBackend, ReqwestBackend, SendOptions};
use crate::resource::{ChannelResource, Resource};
use crate::service::project::NewUser;
use crate::service::{
    BossSession, CutoutRanges, MetadataService, ProjectService, User, VolumeService, Voxel,
    DEFAULT_API_VERSION,
};
use ndarray::{ArrayD, ArrayViewD};
use std::collections::BTreeMap;
use std::ops::Range;
use std::path::Path;
use std::sync::Arc;


fn missing_service(name: &str) -> Error {
    Error::Config(format!("remote has no {} service", name))
}

fn volume_channel(resource: &Resource) -> Result<&ChannelResource> {
    match resource.as_channel() {
        Some(channel) if resource.valid_volume() => Ok(channel),
        _ => Err(Error::InvalidResource(
            "Resource incompatible with the volume service.".to_string(),
        )),
    }
}

/// A remote data store.
///
/// Implementors expose whichever services they have; the provided methods
/// dispatch to them.
pub trait Remote {
    fn project_service(&self) -> Option<&ProjectService>;
    fn volume_service(&self) -> Option<&VolumeService>;
    fn metadata_service(&self) -> Option<&MetadataService>;

    /// List resources of the same type as `resource`, or all collections.
    fn list_project(&self, resource: Option<&Resource>) -> Result<Vec<String>> {
        self.project_service()
            .ok_or_else(|| missing_service("project"))?
            .list(resource)
    }

    /// Download the voxels of `resource` in the given half-open ranges at
    /// `resolution` (0 is native).
    fn get_cutout<T: Voxel>(
        &self,
        resource: &Resource,
        resolution: u32,
        x_range: Range<u64>,
        y_range: Range<u64>,
        z_range: Range<u64>,
        time_range: Option<Range<u64>>,
    ) -> Result<ArrayD<T>>
    where
        Self: Sized,
    {
        let channel = volume_channel(resource)?;
        let ranges = CutoutRanges::new(x_range, y_range, z_range, time_range);
        self.volume_service()
            .ok_or_else(|| missing_service("volume"))?
            .get_cutout(channel, resolution, &ranges)
    }

    /// Upload `data` into the given half-open ranges of `resource`.
    #[allow(clippy::too_many_arguments)]
    fn create_cutout<T: Voxel>(
        &self,
        resource: &Resource,
        resolution: u32,
        x_range: Range<u64>,
        y_range: Range<u64>,
        z_range: Range<u64>,
        data: ArrayViewD<'_, T>,
        time_range: Option<Range<u64>>,
    ) -> Result<()>
    where
        Self: Sized,
    {
        let channel = volume_channel(resource)?;
        let ranges = CutoutRanges::new(x_range, y_range, z_range, time_range);
        self.volume_service()
            .ok_or_else(|| missing_service("volume"))?
            .create_cutout(channel, resolution, &ranges, data)
    }
}

/// Remote for the Boss.
pub struct BossRemote {
    config: RemoteConfig,
    version: String,
    project: ProjectService,
    volume: VolumeService,
    metadata: MetadataService,
}

impl BossRemote {
    pub fn new(source: &ConfigSource, version: &str) -> Result<BossRemote> {
        BossRemote::from_config(RemoteConfig::load(source)?, version)
    }

    /// Remote configured from `~/.intern/intern.cfg` at the default API
    /// version.
    pub fn from_default_file() -> Result<BossRemote> {
        BossRemote::new(&ConfigSource::DefaultFile, DEFAULT_API_VERSION)
    }

    pub fn from_file<P: AsRef<Path>>(path: P, version: &str) -> Result<BossRemote> {
        BossRemote::from_config(RemoteConfig::from_file(path)?, version)
    }

    /// `map` supplies the `[Default]` section, e.g. `protocol`, `host`
    /// and `token`.
    pub fn from_map<K: AsRef<str>, V: AsRef<str>>(map: &BTreeMap<K, V>, version: &str) -> Result<BossRemote> {
        BossRemote::from_config(RemoteConfig::from_map(map), version)
    }

    pub fn from_config(config: RemoteConfig, version: &str) -> Result<BossRemote> {
        BossRemote::with_send_options(config, version, SendOptions::default())
    }

    pub fn with_send_options(config: RemoteConfig, version: &str, options: SendOptions) -> Result<BossRemote> {
        let backend: Arc<dyn HttpBackend> = Arc::new(ReqwestBackend::new(options)?);
        BossRemote::with_backend(config, version, backend)
    }

    /// All three services share `backend`.
    pub fn with_backend(config: RemoteConfig, version: &str, backend: Arc<dyn HttpBackend>) -> Result<BossRemote> {
        let session = |section: &str| -> Result<BossSession> {
            Ok(BossSession::new(config.endpoint(section)?, Arc::clone(&backend)))
        };
        let project = ProjectService::new(session(PROJECT_SECTION)?, version)?;
        let volume = VolumeService::new(session(VOLUME_SECTION)?, version)?;
        let metadata = MetadataService::new(session(METADATA_SECTION)?, version)?;
        tracing::debug!(
            version,
            project = %project.session().url_prefix(),
            volume = %volume.session().url_prefix(),
            "created Boss remote"
        );
        Ok(BossRemote {
            config,
            version: version.to_string(),
            project,
            volume,
            metadata,
        })
    }

    /// Rebuild every service's backend, e.g. to turn off certificate
    /// verification for a developer instance.
    pub fn set_send_options(&mut self, options: SendOptions) -> Result<()> {
        let backend: Arc<dyn HttpBackend> = Arc::new(ReqwestBackend::new(options)?);
        self.project.session_mut().set_backend(Arc::clone(&backend));
        self.volume.session_mut().set_backend(Arc::clone(&backend));
        self.metadata.session_mut().set_backend(backend);
        Ok(())
    }

    pub fn config(&self) -> &RemoteConfig {
        &self.config
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn get_group(&self, name: &str, user_name: Option<&str>) -> Result<bool> {
        self.project.get_group(name, user_name)
    }

    pub fn create_group(&self, name: &str) -> Result<()> {
        self.project.create_group(name)
    }

    pub fn delete_group(&self, name: &str, user_name: Option<&str>) -> Result<()> {
        self.project.delete_group(name, user_name)
    }

    pub fn add_user_to_group(&self, name: &str, user_name: &str) -> Result<()> {
        self.project.add_user_to_group(name, user_name)
    }

    pub fn get_permissions(&self, group: &str, resource: &Resource) -> Result<Vec<String>> {
        self.project.get_permissions(group, resource)
    }

    pub fn add_permissions(&self, group: &str, resource: &Resource, permissions: &[&str]) -> Result<()> {
        self.project.add_permissions(group, resource, permissions)
    }

    pub fn delete_permissions(&self, group: &str, resource: &Resource, permissions: &[&str]) -> Result<()> {
        self.project.delete_permissions(group, resource, permissions)
    }

    pub fn add_user_role(&self, user: &str, role: &str) -> Result<()> {
        self.project.add_user_role(user, role)
    }

    pub fn delete_user_role(&self, user: &str, role: &str) -> Result<()> {
        self.project.delete_user_role(user, role)
    }

    pub fn get_user_roles(&self, user: &str) -> Result<Vec<String>> {
        self.project.get_user_roles(user)
    }

    pub fn add_user(
        &self,
        user: &str,
        first_name: Option<&str>,
        last_name: Option<&str>,
        email: Option<&str>,
        password: Option<&str>,
    ) -> Result<()> {
        let details = NewUser {
            first_name,
            last_name,
            email,
            password,
        };
        self.project.add_user(user, &details)
    }

    pub fn get_user(&self, user: &str) -> Result<User> {
        self.project.get_user(user)
    }

    pub fn get_user_groups(&self, user: &str) -> Result<Vec<String>> {
        self.project.get_user_groups(user)
    }

    pub fn delete_user(&self, user: &str) -> Result<()> {
        self.project.delete_user(user)
    }

    pub fn create_project(&self, resource: &Resource) -> Result<Resource> {
        self.project.create(resource)
    }

    pub fn get_project(&self, resource: &Resource) -> Result<Resource> {
        self.project.get(resource)
    }

    pub fn update_project(&self, resource_name: &str, resource: &Resource) -> Result<Resource> {
        self.project.update(resource_name, resource)
    }

    pub fn delete_project(&self, resource: &Resource) -> Result<()> {
        self.project.delete(resource)
    }

    pub fn list_metadata(&self, resource: &Resource) -> Result<Vec<String>> {
        self.metadata.list(resource)
    }

    pub fn create_metadata(&self, resource: &Resource, keys_vals: &BTreeMap<String, String>) -> Result<()> {
        self.metadata.create(resource, keys_vals)
    }

    pub fn get_metadata(&self, resource: &Resource, keys: &[&str]) -> Result<BTreeMap<String, String>> {
        self.metadata.get(resource, keys)
    }

    pub fn update_metadata(&self, resource: &Resource, keys_vals: &BTreeMap<String, String>) -> Result<()> {
        self.metadata.update(resource, keys_vals)
    }

    pub fn delete_metadata(&self, resource: &Resource, keys: &[&str]) -> Result<()> {
        self.metadata.delete(resource, keys)
    }
}

impl Remote for BossRemote {
    fn project_service(&self) -> Option<&ProjectService> {
        Some(&self.project)
    }

    fn volume_service(&self) -> Option<&VolumeService> {
        Some(&self.volume)
    }

    fn metadata_service(&self) -> Option<&MetadataService> {
        Some(&self.metadata)
    }
}
