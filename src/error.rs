//! Error types.
//!
//! Two layers: [`SourceError`] describes why a single request failed and is
//! only ever seen by the fetcher, which classifies it.  [`FetchError`] is the
//! terminal outcome the UI shows.  [`ConfigError`] rejects bad endpoint
//! settings before any request is made.

use std::time::Duration;

use thiserror::Error;

/// HTTP status the endpoint uses to signal an exhausted quota.
pub const RATE_LIMIT_STATUS: u16 = 429;

/// Why one request to the endpoint failed.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("rate limited (HTTP 429)")]
    RateLimited,

    #[error("HTTP {0}")]
    Status(u16),

    #[error("network error: {0}")]
    Network(String),

    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("malformed response: {0}")]
    Decode(String),
}

impl SourceError {
    /// Rate limiting is the only failure that must not be retried.
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Self::RateLimited)
    }

    /// Map a non-success status to the matching variant.
    pub fn from_status(status: u16) -> Self {
        if status == RATE_LIMIT_STATUS {
            Self::RateLimited
        } else {
            Self::Status(status)
        }
    }
}

/// Terminal failure of the primary fetch.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("Rate Limit Exceeded (HTTP 429). You may need to wait 24 hours or check your API key validity.")]
    RateLimited,

    #[error("Failed to load image after {attempts} attempts. The service may be temporarily unavailable.")]
    Exhausted { attempts: u32 },
}

impl FetchError {
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Self::RateLimited)
    }
}

/// Rejected endpoint settings.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("base_delay_ms must be a positive integer")]
    ZeroBaseDelay,

    #[error("history_days must be a positive integer")]
    ZeroHistoryDays,

    #[error("history_days must be at most {max}, got {got}")]
    TooManyHistoryDays { got: u32, max: u32 },

    #[error("request_timeout_secs must be a positive integer")]
    ZeroTimeout,

    #[error("invalid base_url {url:?}: {reason}")]
    BadUrl { url: String, reason: String },

    #[error("api_key must not be empty")]
    EmptyApiKey,

    #[error("building HTTP client: {0}")]
    HttpClient(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_429_is_rate_limited() {
        assert!(SourceError::from_status(429).is_rate_limited());
        assert!(!SourceError::from_status(500).is_rate_limited());
        assert!(!SourceError::Network("reset".into()).is_rate_limited());
    }

    #[test]
    fn exhausted_message_names_attempts() {
        let msg = FetchError::Exhausted { attempts: 6 }.to_string();
        assert!(msg.contains("6 attempts"), "{msg}");
        assert!(msg.contains("temporarily unavailable"));
    }

    #[test]
    fn rate_limited_message_advises_waiting() {
        let msg = FetchError::RateLimited.to_string();
        assert!(msg.contains("429"));
        assert!(msg.contains("wait"));
        assert!(msg.contains("API key"));
    }

    #[test]
    fn client_build_failure_is_not_a_url_error() {
        let err = ConfigError::HttpClient("no TLS backend".into());
        assert_eq!(err.to_string(), "building HTTP client: no TLS backend");
        assert!(!matches!(err, ConfigError::BadUrl { .. }));
    }
}
