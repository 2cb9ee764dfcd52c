use super::VERSION;
use crate::error::{Error, Result};
use crate::http::Method;
use crate::resource::Resource;
use crate::service::metadata::MetadataApi;
use crate::service::{string_list, BossSession};
use serde::Deserialize;
use std::collections::BTreeMap;
use url::Url;

pub struct MetadataServiceV0_7;

#[derive(Deserialize)]
struct KeyValue {
    key: String,
    value: String,
}

impl MetadataServiceV0_7 {
    fn meta_url(session: &BossSession, resource: &Resource, key: Option<&str>, value: Option<&str>) -> Result<String> {
        if let Resource::CoordinateFrame(_) = resource {
            return Err(Error::InvalidResource(
                "Coordinate frames do not carry metadata.".to_string(),
            ));
        }
        let mut url = Url::parse(&session.url(VERSION, &format!("meta/{}", resource.route())))?;
        // Listing keys takes no query at all.
        if let Some(key) = key {
            let mut query = url.query_pairs_mut();
            query.append_pair("key", key);
            if let Some(value) = value {
                query.append_pair("value", value);
            }
        }
        Ok(url.to_string())
    }
}

impl MetadataApi for MetadataServiceV0_7 {
    fn list(&self, session: &BossSession, resource: &Resource) -> Result<Vec<String>> {
        let url = Self::meta_url(session, resource, None, None)?;
        let resp = session.send_expecting(session.request(Method::GET, &url), 200, "list metadata")?;
        string_list(resp.json()?, "keys")
    }

    fn create(&self, session: &BossSession, resource: &Resource, keys_vals: &BTreeMap<String, String>) -> Result<()> {
        for (key, value) in keys_vals {
            let url = Self::meta_url(session, resource, Some(key), Some(value))?;
            session.send_expecting(session.request(Method::POST, &url), 201, "create metadata")?;
        }
        Ok(())
    }

    fn get(&self, session: &BossSession, resource: &Resource, keys: &[&str]) -> Result<BTreeMap<String, String>> {
        let mut found = BTreeMap::new();
        for key in keys {
            let url = Self::meta_url(session, resource, Some(key), None)?;
            let resp = session.send_expecting(session.request(Method::GET, &url), 200, "get metadata")?;
            let kv: KeyValue = resp.json()?;
            found.insert(kv.key, kv.value);
        }
        Ok(found)
    }

    fn update(&self, session: &BossSession, resource: &Resource, keys_vals: &BTreeMap<String, String>) -> Result<()> {
        for (key, value) in keys_vals {
            let url = Self::meta_url(session, resource, Some(key), Some(value))?;
            session.send_expecting(session.request(Method::PUT, &url), 200, "update metadata")?;
        }
        Ok(())
    }

    fn delete(&self, session: &BossSession, resource: &Resource, keys: &[&str]) -> Result<()> {
        for key in keys {
            let url = Self::meta_url(session, resource, Some(key), None)?;
            session.send_expecting(session.request(Method::DELETE, &url), 204, "delete metadata")?;
        }
        Ok(())
    }
}
