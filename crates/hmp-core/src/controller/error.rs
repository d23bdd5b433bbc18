use thiserror::Error;

/// Errors raised while talking to the O-RU controller.
#[derive(Debug, Error)]
pub enum ControllerError {
    #[error("Request to {url} timed out after {seconds} seconds")]
    Timeout { url: String, seconds: u64 },

    #[error("HTTP error when querying {url}: {status}")]
    Http { url: String, status: u16 },

    #[error("Request to {url} failed: {message}")]
    Request { url: String, message: String },

    #[error("Failed to parse controller response: {0}")]
    Parse(String),

    #[error("Failed to build HTTP client: {0}")]
    Client(String),
}

impl ControllerError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, ControllerError::Timeout { .. })
    }

    /// Classify a transport error for `url`.
    pub(crate) fn from_reqwest(url: &str, timeout_seconds: u64, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ControllerError::Timeout {
                url: url.to_string(),
                seconds: timeout_seconds,
            }
        } else if let Some(status) = err.status() {
            ControllerError::Http {
                url: url.to_string(),
                status: status.as_u16(),
            }
        } else {
            ControllerError::Request {
                url: url.to_string(),
                message: err.to_string(),
            }
        }
    }
}

impl From<serde_json::Error> for ControllerError {
    fn from(err: serde_json::Error) -> Self {
        ControllerError::Parse(err.to_string())
    }
}
