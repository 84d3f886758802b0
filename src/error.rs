// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Error types for gather
//!
//! Every fetch either returns a fully read body or one of these errors.
//! Nothing is retried automatically; callers decide using the helpers
//! on [`Error`].

use thiserror::Error;

/// Result type alias for gather operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for gather
#[derive(Error, Debug)]
pub enum Error {
    /// Transport failure (DNS, connection refused, TLS, timeout)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// URL parsing failed
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// Server answered with something other than 200 or 202
    #[error("HTTP status {code} from {url}")]
    Status { code: u16, url: String },

    /// Redirect chain longer than the configured limit
    #[error("stopped after {limit} redirects at {url}")]
    TooManyRedirects { limit: usize, url: String },

    /// Header name or value rejected when building the transport request
    #[error("Invalid header '{name}': {reason}")]
    InvalidHeader { name: String, reason: String },

    /// No pool slot became free within the wait budget
    #[error("timed out after {waited_ms}ms, no free client found")]
    PoolExhausted { waited_ms: u64 },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Create a status error
    pub fn status(code: u16, url: impl Into<String>) -> Self {
        Error::Status {
            code,
            url: url.into(),
        }
    }

    /// Create an invalid header error
    pub fn invalid_header(name: impl Into<String>, reason: impl ToString) -> Self {
        Error::InvalidHeader {
            name: name.into(),
            reason: reason.to_string(),
        }
    }

    /// Create a configuration error
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Error::Config(msg.into())
    }

    /// Check if this is a transport timeout
    pub fn is_timeout(&self) -> bool {
        matches!(self, Error::Http(e) if e.is_timeout())
    }

    /// Check if the pool had no free client
    pub fn is_pool_exhausted(&self) -> bool {
        matches!(self, Error::PoolExhausted { .. })
    }

    /// Check if this is recoverable (can retry)
    pub fn is_recoverable(&self) -> bool {
        match self {
            Error::Http(e) => e.is_timeout() || e.is_connect(),
            Error::PoolExhausted { .. } => true,
            Error::Status { code, .. } => *code == 429 || (500..600).contains(code),
            _ => false,
        }
    }

    /// Check if this is a client error (4xx)
    pub fn is_client_error(&self) -> bool {
        matches!(self.status_code(), Some(s) if (400..500).contains(&s))
    }

    /// Check if this is a server error (5xx)
    pub fn is_server_error(&self) -> bool {
        matches!(self.status_code(), Some(s) if (500..600).contains(&s))
    }

    /// Get HTTP status code if available
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Error::Status { code, .. } => Some(*code),
            Error::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Get URL if available
    pub fn url(&self) -> Option<&str> {
        match self {
            Error::Status { url, .. } => Some(url),
            Error::TooManyRedirects { url, .. } => Some(url),
            Error::Http(e) => e.url().map(|u| u.as_str()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_error() {
        let err = Error::status(403, "https://example.com");

        assert!(err.is_client_error());
        assert!(!err.is_recoverable());
        assert_eq!(err.status_code(), Some(403));
        assert_eq!(err.url(), Some("https://example.com"));
        assert_eq!(err.to_string(), "HTTP status 403 from https://example.com");
    }

    #[test]
    fn test_server_error_is_recoverable() {
        let err = Error::status(503, "https://example.com");

        assert!(err.is_server_error());
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_pool_exhausted() {
        let err = Error::PoolExhausted { waited_ms: 60_000 };

        assert!(err.is_pool_exhausted());
        assert!(err.is_recoverable());
        assert_eq!(err.status_code(), None);
    }

    #[test]
    fn test_url_error_conversion() {
        let err: Error = url::Url::parse("not a url").unwrap_err().into();
        assert!(matches!(err, Error::Url(_)));
    }
}
