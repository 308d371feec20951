//! Tagged failure type for HTTP requests and the message normalizer used in diagnostics.

use reqwest::StatusCode;
use reqwest::header::{HeaderMap, LOCATION};

/// A request that did not produce a 2xx response.
#[derive(Debug)]
pub enum HttpError {
    /// The server answered, but with a non-2xx status.
    /// Redirects land here too, since the client never follows them.
    Status {
        status: StatusCode,
        url: String,
        headers: HeaderMap,
    },
    /// No response was received at all (connection, DNS, timeout, ...).
    Network(anyhow::Error),
}

impl HttpError {
    /// The response status, if a response was received.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            HttpError::Status { status, .. } => Some(*status),
            HttpError::Network(_) => None,
        }
    }

    /// Looks up a response header as text.
    pub fn header(&self, name: &str) -> Option<&str> {
        match self {
            HttpError::Status { headers, .. } => {
                headers.get(name).and_then(|value| value.to_str().ok())
            }
            HttpError::Network(_) => None,
        }
    }

    /// The `location` header of a redirect response.
    pub fn location(&self) -> Option<&str> {
        self.header(LOCATION.as_str())
    }
}

impl std::fmt::Display for HttpError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HttpError::Status { status, url, .. } => write!(f, "HTTP {} from {}", status, url),
            HttpError::Network(cause) => write!(f, "Network error: {}", cause),
        }
    }
}

impl std::error::Error for HttpError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            HttpError::Status { .. } => None,
            HttpError::Network(cause) => Some(&**cause),
        }
    }
}

/// Normalizes any request failure into a single human-readable line.
///
/// Status failures name the code and the URL; network failures include
/// the whole cause chain.
pub fn describe(error: &HttpError) -> String {
    match error {
        HttpError::Status { status, url, .. } => format!("HTTP {} from {}", status, url),
        HttpError::Network(cause) => format!("{:#}", cause),
    }
}
