//! OpenID Connect helpers for the Boss's auth server.
//!
//! The auth server sits beside the API host: `api.boss.io` authenticates
//! through `auth.boss.io`.  A freshly created user must log in once, with a
//! bearer token, before the Boss will let them join groups.

use crate::config::Endpoint;
use crate::error::{Error, Result};
use crate::http::{HttpBackend, HttpRequest, Method};
use serde::Deserialize;

const TOKEN_PATH: &str = "auth/realms/BOSS/protocol/openid-connect/token";
const CLIENT_ID: &str = "endpoint";

#[derive(Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
}

/// Host of the auth server paired with `api_host`.
pub fn auth_host(api_host: &str) -> Result<String> {
    let mut parts = api_host.splitn(2, '.');
    match (parts.next(), parts.next()) {
        (Some(first), Some(domain)) => Ok(format!("{}.{}", first.replacen("api", "auth", 1), domain)),
        _ => Err(Error::InvalidArgument(format!(
            "cannot derive auth host from '{}'",
            api_host
        ))),
    }
}

/// Exchange a user name and password for a bearer token.
pub fn get_access_token(
    endpoint: &Endpoint,
    user_name: &str,
    password: &str,
    backend: &dyn HttpBackend,
) -> Result<String> {
    let url = format!("{}://{}/{}", endpoint.protocol, auth_host(&endpoint.host)?, TOKEN_PATH);
    let form = url::form_urlencoded::Serializer::new(String::new())
        .append_pair("grant_type", "password")
        .append_pair("client_id", CLIENT_ID)
        .append_pair("username", user_name)
        .append_pair("password", password)
        .finish();
    let req = HttpRequest::new(Method::POST, url.clone())
        .header("Content-Type", "application/x-www-form-urlencoded")
        .body(form.into_bytes());
    let resp = backend.send(req)?;
    if !resp.is_success() {
        return Err(Error::Http {
            status: resp.status,
            url,
            message: resp.text(),
        });
    }
    let token: TokenResponse = resp.json()?;
    token
        .access_token
        .ok_or_else(|| Error::InvalidResponse("no access_token in token response".to_string()))
}

/// Touch the API once with a bearer token so the Boss registers the user.
/// Returns the status the API answered with.
pub fn login_user(endpoint: &Endpoint, version: &str, token: &str, backend: &dyn HttpBackend) -> Result<u16> {
    let url = format!("{}/{}/collection/", endpoint.url_prefix(), version);
    let req = HttpRequest::new(Method::GET, url)
        .header("Content-Type", "application/x-www-form-urlencoded")
        .header("Authorization", format!("Bearer {}", token));
    let resp = backend.send(req)?;
    tracing::debug!(status = resp.status, "login request answered");
    Ok(resp.status)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::testing::FakeBackend;
    use serde_json::json;

    fn endpoint() -> Endpoint {
        Endpoint {
            protocol: "https".to_string(),
            host: "api.theboss.io".to_string(),
            token: "unused".to_string(),
        }
    }

    #[test]
    fn derives_auth_host() {
        assert_eq!(auth_host("api.theboss.io").unwrap(), "auth.theboss.io");
        assert_eq!(auth_host("api-test.boss.io").unwrap(), "auth-test.boss.io");
        assert_eq!(auth_host("myapi.api.io").unwrap(), "myauth.api.io");
        assert!(auth_host("localhost").is_err());
    }

    #[test]
    fn fetches_token_with_password_grant() {
        let fake = FakeBackend::new().with_json(
            Method::POST,
            "auth.theboss.io/auth/realms/BOSS",
            200,
            json!({"access_token": "tok", "expires_in": 300}),
        );
        let token = get_access_token(&endpoint(), "jdoe", "p@ss word", &fake).unwrap();
        assert_eq!(token, "tok");

        let req = fake.last_request();
        assert_eq!(
            req.url,
            "https://auth.theboss.io/auth/realms/BOSS/protocol/openid-connect/token"
        );
        let body = String::from_utf8(req.body.unwrap()).unwrap();
        assert_eq!(
            body,
            "grant_type=password&client_id=endpoint&username=jdoe&password=p%40ss+word"
        );
    }

    #[test]
    fn missing_token_is_invalid_response() {
        let fake = FakeBackend::new().with_json(Method::POST, "openid-connect", 200, json!({"error": "nope"}));
        let err = get_access_token(&endpoint(), "jdoe", "x", &fake).unwrap_err();
        assert!(matches!(err, Error::InvalidResponse(_)));
    }

    #[test]
    fn rejected_credentials_are_http_errors() {
        let fake = FakeBackend::new().with_response(Method::POST, "openid-connect", 401, b"invalid_grant");
        let err = get_access_token(&endpoint(), "jdoe", "x", &fake).unwrap_err();
        assert_eq!(err.status(), Some(401));
    }

    #[test]
    fn login_uses_bearer_token() {
        let fake = FakeBackend::new().with_response(Method::GET, "/v0.7/collection/", 200, b"{}");
        assert_eq!(login_user(&endpoint(), "v0.7", "tok", &fake).unwrap(), 200);
        let req = fake.last_request();
        assert_eq!(req.url, "https://api.theboss.io/v0.7/collection/");
        assert_eq!(req.header_value("Authorization"), Some("Bearer tok"));
    }
}
