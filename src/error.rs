//! Error types shared by every client in the crate.

use thiserror::Error;

/// Result type alias for intern operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned by the Boss and m2g clients.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration could not be loaded or is missing a value.
    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// The server answered with a status the operation does not accept.
    #[error("HTTP {status} from {url}: {message}")]
    Http {
        status: u16,
        url: String,
        message: String,
    },

    /// The request never produced a response.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unsupported API version {version} (supported: {supported})")]
    UnsupportedVersion { version: String, supported: String },

    #[error("{0}")]
    InvalidResource(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("unexpected response: {0}")]
    InvalidResponse(String),

    /// Blosc compression or decompression failed.
    #[error("blosc codec error: {0}")]
    Codec(String),

    #[error(transparent)]
    Zip(#[from] zip::result::ZipError),

    /// An m2g upload failed.
    #[error("upload failed: {0}")]
    Upload(String),
}

impl Error {
    /// HTTP status carried by the error, if the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Http { status, .. } => Some(*status),
            Error::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }
}

impl From<url::ParseError> for Error {
    fn from(e: url::ParseError) -> Self {
        Error::InvalidArgument(format!("bad URL: {}", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_error_exposes_status() {
        let err = Error::Http {
            status: 404,
            url: "https://api.boss.io/v0.7/group/foo/".to_string(),
            message: "not found".to_string(),
        };
        assert_eq!(err.status(), Some(404));
        assert!(err.is_not_found());
        assert!(err.to_string().contains("HTTP 404"));
    }

    #[test]
    fn non_http_errors_have_no_status() {
        let err = Error::InvalidArgument("x".to_string());
        assert_eq!(err.status(), None);
        assert!(!err.is_not_found());
    }
}
