//! Boss service clients.
//!
//! Each service (project, volume, metadata) is a thin router: it holds a
//! [`BossSession`] and hands every call to the implementation registered
//! for the requested API version.

pub mod metadata;
pub mod project;
pub mod v0_7;
pub mod volume;

pub use metadata::{MetadataApi, MetadataService};
pub use project::{ProjectApi, ProjectService, User};
pub use volume::{CutoutRanges, VolumeApi, VolumeService, Voxel};

use crate::config::Endpoint;
use crate::error::{Error, Result};
use crate::http::{HttpBackend, HttpRequest, HttpResponse, Method, ReqwestBackend, SendOptions};
use std::sync::Arc;

pub const DEFAULT_API_VERSION: &str = v0_7::VERSION;

/// API versions every service understands.
pub const SUPPORTED_VERSIONS: &[&str] = &[v0_7::VERSION];

/// Connection details shared by every call a service makes: where the
/// service lives, the token to authenticate with, and the backend that
/// carries the requests.
#[derive(Clone)]
pub struct BossSession {
    endpoint: Endpoint,
    backend: Arc<dyn HttpBackend>,
}

impl BossSession {
    pub fn new(endpoint: Endpoint, backend: Arc<dyn HttpBackend>) -> BossSession {
        BossSession { endpoint, backend }
    }

    /// A session on a reqwest backend built from `options`.
    pub fn connect(endpoint: Endpoint, options: SendOptions) -> Result<BossSession> {
        let backend = ReqwestBackend::new(options)?;
        Ok(BossSession::new(endpoint, Arc::new(backend)))
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    pub fn url_prefix(&self) -> String {
        self.endpoint.url_prefix()
    }

    pub fn set_backend(&mut self, backend: Arc<dyn HttpBackend>) {
        self.backend = backend;
    }

    /// `protocol://host/<version>/<path>`.
    pub fn url(&self, version: &str, path: &str) -> String {
        format!("{}/{}/{}", self.url_prefix(), version, path)
    }

    /// A request carrying the token header.
    pub fn request(&self, method: Method, url: &str) -> HttpRequest {
        HttpRequest::new(method, url).header("Authorization", format!("Token {}", self.endpoint.token))
    }

    pub fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        self.backend.send(request)
    }

    /// Send and require exactly `expected` back.
    pub fn send_expecting(&self, request: HttpRequest, expected: u16, action: &str) -> Result<HttpResponse> {
        let url = request.url.clone();
        let response = self.send(request)?;
        expect_status(response, &url, expected, action)
    }
}

/// Turn any status other than `expected` into [`Error::Http`].
pub fn expect_status(response: HttpResponse, url: &str, expected: u16, action: &str) -> Result<HttpResponse> {
    if response.status == expected {
        return Ok(response);
    }
    Err(Error::Http {
        status: response.status,
        url: url.to_string(),
        message: format!("{} failed: {}", action, response.text()),
    })
}

pub(crate) fn unsupported(version: &str) -> Error {
    Error::UnsupportedVersion {
        version: version.to_string(),
        supported: SUPPORTED_VERSIONS.join(", "),
    }
}

/// Pull a list of strings out of a response that is either a bare JSON
/// array or an object holding one under `key`.
pub(crate) fn string_list(value: serde_json::Value, key: &str) -> Result<Vec<String>> {
    let list = match value {
        serde_json::Value::Array(_) => value,
        serde_json::Value::Object(mut map) => map
            .remove(key)
            .ok_or_else(|| Error::InvalidResponse(format!("missing '{}' in response", key)))?,
        other => {
            return Err(Error::InvalidResponse(format!(
                "expected a list of {}, got {}",
                key, other
            )))
        }
    };
    Ok(serde_json::from_value(list)?)
}
