//! Project service: groups, users, roles, permissions and the data-model
//! objects (collections, experiments, coordinate frames, channels).

use super::{unsupported, v0_7, BossSession};
use crate::error::Result;
use crate::resource::Resource;
use serde::{Deserialize, Serialize};

/// A Boss user as reported by the project service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub username: String,
    #[serde(rename = "firstName", default)]
    pub first_name: Option<String>,
    #[serde(rename = "lastName", default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    /// Any other attributes the server reports.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Details for a user being created.  Only `Some` fields are sent.
#[derive(Debug, Clone, Default, Serialize)]
pub struct NewUser<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<&'a str>,
}

/// One API version's implementation of the project service.
pub trait ProjectApi: Send + Sync {
    /// Whether the group exists, or, given a user, whether the user is a
    /// member of it.
    fn get_group(&self, session: &BossSession, name: &str, user_name: Option<&str>) -> Result<bool>;
    fn create_group(&self, session: &BossSession, name: &str) -> Result<()>;
    /// Delete the group, or, given a user, remove the user from it.
    fn delete_group(&self, session: &BossSession, name: &str, user_name: Option<&str>) -> Result<()>;
    fn add_user_to_group(&self, session: &BossSession, name: &str, user_name: &str) -> Result<()>;

    fn get_permissions(&self, session: &BossSession, group: &str, resource: &Resource) -> Result<Vec<String>>;
    fn add_permissions(
        &self,
        session: &BossSession,
        group: &str,
        resource: &Resource,
        permissions: &[&str],
    ) -> Result<()>;
    fn delete_permissions(
        &self,
        session: &BossSession,
        group: &str,
        resource: &Resource,
        permissions: &[&str],
    ) -> Result<()>;

    fn add_user_role(&self, session: &BossSession, user: &str, role: &str) -> Result<()>;
    fn delete_user_role(&self, session: &BossSession, user: &str, role: &str) -> Result<()>;
    fn get_user_roles(&self, session: &BossSession, user: &str) -> Result<Vec<String>>;

    fn add_user(&self, session: &BossSession, user: &str, details: &NewUser<'_>) -> Result<()>;
    fn get_user(&self, session: &BossSession, user: &str) -> Result<User>;
    fn get_user_groups(&self, session: &BossSession, user: &str) -> Result<Vec<String>>;
    fn delete_user(&self, session: &BossSession, user: &str) -> Result<()>;

    /// Names of every object of the same kind as `resource`, or of every
    /// collection when no resource is given.
    fn list(&self, session: &BossSession, resource: Option<&Resource>) -> Result<Vec<String>>;
    fn create(&self, session: &BossSession, resource: &Resource) -> Result<Resource>;
    fn get(&self, session: &BossSession, resource: &Resource) -> Result<Resource>;
    fn update(&self, session: &BossSession, resource_name: &str, resource: &Resource) -> Result<Resource>;
    fn delete(&self, session: &BossSession, resource: &Resource) -> Result<()>;
}

fn project_api(version: &str) -> Option<Box<dyn ProjectApi>> {
    match version {
        v0_7::VERSION => Some(Box::new(v0_7::ProjectServiceV0_7)),
        _ => None,
    }
}

/// Routes project calls to the implementation for one API version.
pub struct ProjectService {
    session: BossSession,
    version: String,
    service: Box<dyn ProjectApi>,
}

impl ProjectService {
    /// Fails with `UnsupportedVersion` for an unknown `version`.
    pub fn new(session: BossSession, version: &str) -> Result<ProjectService> {
        let service = project_api(version).ok_or_else(|| unsupported(version))?;
        Ok(ProjectService {
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

    pub fn get_group(&self, name: &str, user_name: Option<&str>) -> Result<bool> {
        self.service.get_group(&self.session, name, user_name)
    }

    pub fn create_group(&self, name: &str) -> Result<()> {
        self.service.create_group(&self.session, name)
    }

    pub fn delete_group(&self, name: &str, user_name: Option<&str>) -> Result<()> {
        self.service.delete_group(&self.session, name, user_name)
    }

    /// Both group and user must already exist.
    pub fn add_user_to_group(&self, name: &str, user_name: &str) -> Result<()> {
        self.service.add_user_to_group(&self.session, name, user_name)
    }

    pub fn get_permissions(&self, group: &str, resource: &Resource) -> Result<Vec<String>> {
        self.service.get_permissions(&self.session, group, resource)
    }

    pub fn add_permissions(&self, group: &str, resource: &Resource, permissions: &[&str]) -> Result<()> {
        self.service.add_permissions(&self.session, group, resource, permissions)
    }

    pub fn delete_permissions(&self, group: &str, resource: &Resource, permissions: &[&str]) -> Result<()> {
        self.service.delete_permissions(&self.session, group, resource, permissions)
    }

    pub fn add_user_role(&self, user: &str, role: &str) -> Result<()> {
        self.service.add_user_role(&self.session, user, role)
    }

    pub fn delete_user_role(&self, user: &str, role: &str) -> Result<()> {
        self.service.delete_user_role(&self.session, user, role)
    }

    pub fn get_user_roles(&self, user: &str) -> Result<Vec<String>> {
        self.service.get_user_roles(&self.session, user)
    }

    pub fn add_user(&self, user: &str, details: &NewUser<'_>) -> Result<()> {
        self.service.add_user(&self.session, user, details)
    }

    pub fn get_user(&self, user: &str) -> Result<User> {
        self.service.get_user(&self.session, user)
    }

    pub fn get_user_groups(&self, user: &str) -> Result<Vec<String>> {
        self.service.get_user_groups(&self.session, user)
    }

    pub fn delete_user(&self, user: &str) -> Result<()> {
        self.service.delete_user(&self.session, user)
    }

    pub fn list(&self, resource: Option<&Resource>) -> Result<Vec<String>> {
        self.service.list(&self.session, resource)
    }

    pub fn create(&self, resource: &Resource) -> Result<Resource> {
        self.service.create(&self.session, resource)
    }

    pub fn get(&self, resource: &Resource) -> Result<Resource> {
        self.service.get(&self.session, resource)
    }

    /// `resource_name` is the current name, in case `resource` renames it.
    pub fn update(&self, resource_name: &str, resource: &Resource) -> Result<Resource> {
        self.service.update(&self.session, resource_name, resource)
    }

    pub fn delete(&self, resource: &Resource) -> Result<()> {
        self.service.delete(&self.session, resource)
    }
}
