//! Error types for data portal operations.
//!
//! HTTP failures keep the full response context ([`ResponseDiagnostics`]) so
//! the interactive loop can show the operator exactly what the server said.
//! The bearer token is sent in a request header and never appears here.

use std::fmt;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result type for data portal operations.
pub type PortalResult<T> = Result<T, PortalError>;

/// Status, headers and body of a failed HTTP response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseDiagnostics {
    /// Requested URL.
    pub url: String,
    /// HTTP status code.
    pub status: u16,
    /// Response headers in server order.
    pub headers: Vec<(String, String)>,
    /// Response body, decoded lossily as UTF-8.
    pub body: String,
}

impl ResponseDiagnostics {
    /// Captures the diagnostics of a response, consuming its body.
    pub async fn capture(url: &str, response: reqwest::Response) -> Self {
        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect();
        let body = match response.bytes().await {
            Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
            Err(e) => format!("<failed to read response body: {e}>"),
        };

        Self {
            url: url.to_string(),
            status,
            headers,
            body,
        }
    }
}

impl fmt::Display for ResponseDiagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "URL: {}", self.url)?;
        writeln!(f, "Status code: {}", self.status)?;
        writeln!(f, "Headers:")?;
        for (name, value) in &self.headers {
            writeln!(f, "  {name}: {value}")?;
        }
        write!(f, "Body: {}", self.body)
    }
}

/// Errors that can occur while talking to the data portal.
#[derive(Debug, Error)]
pub enum PortalError {
    /// HTTP 401: the personal access token is invalid or expired.
    #[error("unauthorized (HTTP 401) for {}: check your personal access token", .diagnostics.url)]
    Unauthorized {
        /// Response details.
        diagnostics: ResponseDiagnostics,
    },

    /// HTTP 404: unknown part, macro or variant.
    #[error("not found (HTTP 404): {}", .diagnostics.url)]
    NotFound {
        /// Response details.
        diagnostics: ResponseDiagnostics,
    },

    /// Any other non-success HTTP status.
    #[error("request failed with HTTP {}: {}", .diagnostics.status, .diagnostics.url)]
    Request {
        /// Response details.
        diagnostics: ResponseDiagnostics,
    },

    /// The request never produced a response (connect, timeout, body read).
    #[error("network error for {url}")]
    Network {
        /// Requested URL.
        url: String,
        /// Underlying transport error.
        #[source]
        source: reqwest::Error,
    },

    /// A successful response did not contain the expected JSON.
    #[error("unexpected response from {url}: {message}")]
    InvalidResponse {
        /// Requested URL.
        url: String,
        /// Description of what's wrong.
        message: String,
    },

    /// A downloaded artifact could not be written to disk.
    #[error("failed to write file: {path}")]
    FileWrite {
        /// Destination path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// The HTTP client could not be constructed.
    #[error("failed to create HTTP client")]
    ClientBuild {
        /// Underlying builder error.
        #[source]
        source: reqwest::Error,
    },

    /// Operator input rejected before any request was made.
    #[error("invalid input: {message}")]
    InvalidInput {
        /// Description of what's wrong.
        message: String,
    },
}

impl PortalError {
    /// Maps a non-success response to the matching error variant.
    #[must_use]
    pub fn from_status(diagnostics: ResponseDiagnostics) -> Self {
        match diagnostics.status {
            401 => Self::Unauthorized { diagnostics },
            404 => Self::NotFound { diagnostics },
            _ => Self::Request { diagnostics },
        }
    }

    /// Creates a network error.
    pub fn network(url: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Network {
            url: url.into(),
            source,
        }
    }

    /// Creates an invalid response error.
    pub fn invalid_response(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidResponse {
            url: url.into(),
            message: message.into(),
        }
    }

    /// Creates a file write error.
    pub fn file_write(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::FileWrite {
            path: path.into(),
            source,
        }
    }

    /// Creates an invalid input error.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// Returns the response details for HTTP status errors.
    #[must_use]
    pub const fn diagnostics(&self) -> Option<&ResponseDiagnostics> {
        match self {
            Self::Unauthorized { diagnostics }
            | Self::NotFound { diagnostics }
            | Self::Request { diagnostics } => Some(diagnostics),
            _ => None,
        }
    }

    /// Returns the HTTP status code for HTTP status errors.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        self.diagnostics().map(|d| d.status)
    }

    /// Returns `true` for 401 responses.
    #[must_use]
    pub const fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized { .. })
    }
}
