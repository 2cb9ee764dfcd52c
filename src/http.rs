//! HTTP backend abstraction.
//!
//! Every client in the crate talks to the network through [`HttpBackend`],
//! so tests can swap in a fake backend with canned responses. The production
//! backend is a blocking reqwest client.

use crate::error::Result;
use std::time::Duration;

pub use reqwest::Method;

/// A fully assembled request.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<Vec<u8>>,
}

impl HttpRequest {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        HttpRequest {
            method,
            url: url.into(),
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.push((name.to_string(), value.into()));
        self
    }

    pub fn body(mut self, body: Vec<u8>) -> Self {
        self.body = Some(body);
        self
    }

    /// Serialize `value` as the JSON body.
    pub fn json<T: serde::Serialize>(self, value: &T) -> Result<Self> {
        let body = serde_json::to_vec(value)?;
        Ok(self.header("Content-Type", "application/json").body(body))
    }

    /// Look up a header by case-insensitive name.
    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// A response with its body fully read.
#[derive(Debug, Clone, Default)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn json<T: serde::de::DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_slice(&self.body)?)
    }
}

/// Anything that can execute an [`HttpRequest`].
pub trait HttpBackend: Send + Sync {
    fn send(&self, request: HttpRequest) -> Result<HttpResponse>;
}

/// Options applied when sending requests.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SendOptions {
    /// Verify the server's TLS certificate.
    pub verify: bool,
    pub timeout: Duration,
}

impl Default for SendOptions {
    fn default() -> Self {
        SendOptions {
            verify: true,
            timeout: Duration::from_secs(300),
        }
    }
}

/// Production backend on top of `reqwest::blocking`.
pub struct ReqwestBackend {
    client: reqwest::blocking::Client,
}

impl ReqwestBackend {
    pub fn new(options: SendOptions) -> Result<ReqwestBackend> {
        if !options.verify {
            tracing::warn!("TLS certificate verification is disabled");
        }
        let client = reqwest::blocking::Client::builder()
            .timeout(options.timeout)
            .danger_accept_invalid_certs(!options.verify)
            .build()?;
        Ok(ReqwestBackend { client })
    }
}

impl HttpBackend for ReqwestBackend {
    fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        tracing::debug!(method = %request.method, url = %request.url, "sending request");
        let mut builder = self.client.request(request.method, &request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }
        let response = builder.send()?;
        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(k, v)| v.to_str().ok().map(|v| (k.to_string(), v.to_string())))
            .collect();
        let body = response.bytes()?.to_vec();
        tracing::debug!(status, bytes = body.len(), "received response");
        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

#[cfg(test)]
pub mod testing {
    use super::*;
    use std::sync::Mutex;

    /// A fake HTTP backend that returns canned responses and records
    /// every request it sees.  Unregistered routes get a 404 response.
    #[derive(Default)]
    pub struct FakeBackend {
        routes: Mutex<Vec<(Method, String, HttpResponse)>>,
        requests: Mutex<Vec<HttpRequest>>,
    }

    impl FakeBackend {
        pub fn new() -> Self {
            Self::default()
        }

        /// Answer `method` requests whose URL contains `url_contains`.
        /// Later registrations take precedence.
        pub fn with_response(self, method: Method, url_contains: &str, status: u16, body: &[u8]) -> Self {
            self.routes.lock().unwrap().push((
                method,
                url_contains.to_string(),
                HttpResponse {
                    status,
                    headers: Vec::new(),
                    body: body.to_vec(),
                },
            ));
            self
        }

        pub fn with_json(self, method: Method, url_contains: &str, status: u16, json: serde_json::Value) -> Self {
            let body = serde_json::to_vec(&json).unwrap();
            self.with_response(method, url_contains, status, &body)
        }

        pub fn requests(&self) -> Vec<HttpRequest> {
            self.requests.lock().unwrap().clone()
        }

        pub fn last_request(&self) -> HttpRequest {
            self.requests.lock().unwrap().last().cloned().expect("no requests sent")
        }
    }

    impl HttpBackend for FakeBackend {
        fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
            let found = self
                .routes
                .lock()
                .unwrap()
                .iter()
                .rev()
                .find(|(m, pattern, _)| *m == request.method && request.url.contains(pattern.as_str()))
                .map(|(_, _, r)| r.clone());
            self.requests.lock().unwrap().push(request);
            // Unknown routes answer like a real server would.
            Ok(found.unwrap_or_else(|| HttpResponse {
                status: 404,
                headers: Vec::new(),
                body: b"no canned response".to_vec(),
            }))
        }
    }
}
