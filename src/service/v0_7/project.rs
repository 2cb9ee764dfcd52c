use super::VERSION;
use crate::error::{Error, Result};
use crate::http::Method;
use crate::resource::Resource;
use crate::service::project::{NewUser, ProjectApi, User};
use crate::service::{expect_status, string_list, BossSession};
use serde_json::{json, Value};

pub struct ProjectServiceV0_7;

impl ProjectServiceV0_7 {
    fn url(session: &BossSession, path: &str) -> String {
        session.url(VERSION, path)
    }

    fn resource_url(session: &BossSession, route: &str) -> String {
        Self::url(session, &format!("resource/{}", route))
    }

    fn permission_url(session: &BossSession, group: &str, resource: &Resource) -> String {
        Self::url(session, &format!("permission/{}/{}", group, resource.route()))
    }
}

impl ProjectApi for ProjectServiceV0_7 {
    fn get_group(&self, session: &BossSession, name: &str, user_name: Option<&str>) -> Result<bool> {
        match user_name {
            None => {
                let url = Self::url(session, &format!("group/{}/", name));
                let resp = session.send(session.request(Method::GET, &url))?;
                match resp.status {
                    200 => Ok(true),
                    404 => Ok(false),
                    _ => expect_status(resp, &url, 200, "get group").map(|_| false),
                }
            }
            Some(user) => {
                let url = Self::url(session, &format!("group-member/{}/{}/", name, user));
                let resp = session.send_expecting(session.request(Method::GET, &url), 200, "get group membership")?;
                let body: Value = resp.json()?;
                body.get("result")
                    .and_then(Value::as_bool)
                    .ok_or_else(|| Error::InvalidResponse(format!("no boolean 'result' in {}", body)))
            }
        }
    }

    fn create_group(&self, session: &BossSession, name: &str) -> Result<()> {
        let url = Self::url(session, &format!("group/{}/", name));
        session.send_expecting(session.request(Method::POST, &url), 201, "create group")?;
        Ok(())
    }

    fn delete_group(&self, session: &BossSession, name: &str, user_name: Option<&str>) -> Result<()> {
        let (url, action) = match user_name {
            None => (Self::url(session, &format!("group/{}/", name)), "delete group"),
            Some(user) => (
                Self::url(session, &format!("group-member/{}/{}/", name, user)),
                "remove user from group",
            ),
        };
        session.send_expecting(session.request(Method::DELETE, &url), 204, action)?;
        Ok(())
    }

    fn add_user_to_group(&self, session: &BossSession, name: &str, user_name: &str) -> Result<()> {
        let url = Self::url(session, &format!("group-member/{}/{}/", name, user_name));
        session.send_expecting(session.request(Method::POST, &url), 201, "add user to group")?;
        Ok(())
    }

    fn get_permissions(&self, session: &BossSession, group: &str, resource: &Resource) -> Result<Vec<String>> {
        let url = Self::permission_url(session, group, resource);
        let resp = session.send_expecting(session.request(Method::GET, &url), 200, "get permissions")?;
        string_list(resp.json()?, "permissions")
    }

    fn add_permissions(
        &self,
        session: &BossSession,
        group: &str,
        resource: &Resource,
        permissions: &[&str],
    ) -> Result<()> {
        let url = Self::permission_url(session, group, resource);
        let req = session
            .request(Method::POST, &url)
            .json(&json!({ "permissions": permissions }))?;
        session.send_expecting(req, 201, "add permissions")?;
        Ok(())
    }

    fn delete_permissions(
        &self,
        session: &BossSession,
        group: &str,
        resource: &Resource,
        permissions: &[&str],
    ) -> Result<()> {
        let url = Self::permission_url(session, group, resource);
        let req = session
            .request(Method::DELETE, &url)
            .json(&json!({ "permissions": permissions }))?;
        session.send_expecting(req, 204, "delete permissions")?;
        Ok(())
    }

    fn add_user_role(&self, session: &BossSession, user: &str, role: &str) -> Result<()> {
        let url = Self::url(session, &format!("user-role/{}/{}", user, role));
        session.send_expecting(session.request(Method::POST, &url), 201, "add user role")?;
        Ok(())
    }

    fn delete_user_role(&self, session: &BossSession, user: &str, role: &str) -> Result<()> {
        let url = Self::url(session, &format!("user-role/{}/{}", user, role));
        session.send_expecting(session.request(Method::DELETE, &url), 204, "delete user role")?;
        Ok(())
    }

    fn get_user_roles(&self, session: &BossSession, user: &str) -> Result<Vec<String>> {
        let url = Self::url(session, &format!("user-role/{}", user));
        let resp = session.send_expecting(session.request(Method::GET, &url), 200, "get user roles")?;
        string_list(resp.json()?, "roles")
    }

    fn add_user(&self, session: &BossSession, user: &str, details: &NewUser<'_>) -> Result<()> {
        let url = Self::url(session, &format!("user/{}", user));
        let req = session.request(Method::POST, &url).json(details)?;
        session.send_expecting(req, 201, "add user")?;
        Ok(())
    }

    fn get_user(&self, session: &BossSession, user: &str) -> Result<User> {
        let url = Self::url(session, &format!("user/{}", user));
        let resp = session.send_expecting(session.request(Method::GET, &url), 200, "get user")?;
        resp.json()
    }

    fn get_user_groups(&self, session: &BossSession, user: &str) -> Result<Vec<String>> {
        let url = Self::url(session, &format!("user/{}/groups", user));
        let resp = session.send_expecting(session.request(Method::GET, &url), 200, "get user groups")?;
        string_list(resp.json()?, "groups")
    }

    fn delete_user(&self, session: &BossSession, user: &str) -> Result<()> {
        let url = Self::url(session, &format!("user/{}", user));
        session.send_expecting(session.request(Method::DELETE, &url), 204, "delete user")?;
        Ok(())
    }

    fn list(&self, session: &BossSession, resource: Option<&Resource>) -> Result<Vec<String>> {
        let (route, key) = match resource {
            Some(r) => (r.list_route(), r.list_key()),
            None => (String::new(), "collections"),
        };
        let url = Self::resource_url(session, &route);
        let resp = session.send_expecting(session.request(Method::GET, &url), 200, "list resources")?;
        string_list(resp.json()?, key)
    }

    fn create(&self, session: &BossSession, resource: &Resource) -> Result<Resource> {
        let url = Self::resource_url(session, &resource.route());
        let req = session.request(Method::POST, &url).json(&resource.to_json()?)?;
        let resp = session.send_expecting(req, 201, "create resource")?;
        resource.from_json(resp.json()?)
    }

    fn get(&self, session: &BossSession, resource: &Resource) -> Result<Resource> {
        let url = Self::resource_url(session, &resource.route());
        let resp = session.send_expecting(session.request(Method::GET, &url), 200, "get resource")?;
        resource.from_json(resp.json()?)
    }

    fn update(&self, session: &BossSession, resource_name: &str, resource: &Resource) -> Result<Resource> {
        let url = Self::resource_url(session, &resource.route_named(resource_name));
        let req = session.request(Method::PUT, &url).json(&resource.to_json()?)?;
        let resp = session.send_expecting(req, 200, "update resource")?;
        resource.from_json(resp.json()?)
    }

    fn delete(&self, session: &BossSession, resource: &Resource) -> Result<()> {
        let url = Self::resource_url(session, &resource.route());
        session.send_expecting(session.request(Method::DELETE, &url), 204, "delete resource")?;
        Ok(())
    }
}
