//! Error types for serpforge.
//!
//! Library crates use [`SerpforgeError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.
//!
//! Fetch failures are split into explicit kinds (`Network`, `Timeout`,
//! `BadResponse`) so that fallback selection — e.g. substituting a synthetic
//! page artifact — is a deliberate branch on the error kind, never a
//! catch-all.

use std::path::PathBuf;

/// Top-level error type for all serpforge operations.
#[derive(Debug, thiserror::Error)]
pub enum SerpforgeError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Connection-level network failure (DNS, refused, reset).
    #[error("network error: {0}")]
    Network(String),

    /// Request exceeded its per-call timeout.
    #[error("timeout: {0}")]
    Timeout(String),

    /// The server answered, but with a non-success status.
    #[error("bad response from {url}: HTTP {status}")]
    BadResponse { url: String, status: u16 },

    /// HTML/JSON parsing or content extraction error.
    #[error("parse error: {message}")]
    Parse { message: String },

    /// Database or storage layer error.
    #[error("storage error: {0}")]
    Storage(String),

    /// AI assistant gateway unavailable or misbehaving.
    #[error("gateway error: {0}")]
    Gateway(String),

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Data validation error (schema mismatch, invalid format, etc.).
    #[error("validation error: {message}")]
    Validation { message: String },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, SerpforgeError>;

impl SerpforgeError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a parse error from any displayable message.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse {
            message: msg.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Classify a `reqwest` error into `Timeout` or `Network`.
    pub fn from_reqwest(url: &str, err: &reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout(format!("{url}: {err}"))
        } else {
            Self::Network(format!("{url}: {err}"))
        }
    }

    /// Whether this error is a recoverable fetch failure, i.e. one the page
    /// extractor degrades into a synthetic artifact.
    pub fn is_fetch_failure(&self) -> bool {
        matches!(
            self,
            Self::Network(_) | Self::Timeout(_) | Self::BadResponse { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_formatting() {
        let err = SerpforgeError::config("missing standard instruction");
        assert_eq!(
            err.to_string(),
            "config error: missing standard instruction"
        );

        let err = SerpforgeError::BadResponse {
            url: "https://example.com/page".into(),
            status: 503,
        };
        assert!(err.to_string().contains("HTTP 503"));
    }

    #[test]
    fn fetch_failure_classification() {
        assert!(SerpforgeError::Network("down".into()).is_fetch_failure());
        assert!(SerpforgeError::Timeout("slow".into()).is_fetch_failure());
        assert!(
            SerpforgeError::BadResponse {
                url: "https://example.com".into(),
                status: 404
            }
            .is_fetch_failure()
        );
        assert!(!SerpforgeError::parse("broken").is_fetch_failure());
        assert!(!SerpforgeError::Storage("locked".into()).is_fetch_failure());
    }
}
