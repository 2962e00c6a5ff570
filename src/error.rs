use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::api::ApiError;

/// Shown instead of the raw failure text whenever the remote side throttles us.
pub const RATE_LIMIT_MESSAGE: &str = "Too many attempts. Please wait a moment and try again.";

static RATE_LIMIT_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b429\b|throttl|rate[\s_-]?limit").expect("rate limit pattern is valid")
});

#[derive(Debug, Error)]
pub enum KioskError {
    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Local precondition failures. They abort the current attempt only.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Please enter your PIN")]
    EmptyPin,

    #[error("No assignment found for {staff_name} at this event")]
    MissingAssignment { staff_name: String },

    #[error("Event not found: {0}")]
    UnknownEvent(String),

    #[error("Session belongs to event {actual}, expected {expected}")]
    EventMismatch { expected: String, actual: String },
}

/// A remote failure as the controller sees it: cloneable, comparable and
/// already classified for rate limiting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceFailure {
    pub message: String,
    pub rate_limited: bool,
}

impl ServiceFailure {
    pub fn new(message: impl Into<String>) -> Self {
        let message = message.into();
        let rate_limited = is_rate_limit_text(&message);
        Self {
            message,
            rate_limited,
        }
    }

    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            rate_limited: true,
        }
    }

    /// Text fit for the kiosk screen.
    pub fn user_message(&self) -> String {
        if self.rate_limited {
            RATE_LIMIT_MESSAGE.to_string()
        } else {
            self.message.clone()
        }
    }
}

impl std::fmt::Display for ServiceFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl From<&ApiError> for ServiceFailure {
    fn from(err: &ApiError) -> Self {
        match err {
            ApiError::RateLimited { .. } => Self::rate_limited(err.to_string()),
            // The server's own wording is what the operator should read.
            ApiError::Api { message, .. } => Self::new(message.clone()),
            other => Self::new(other.to_string()),
        }
    }
}

impl From<ApiError> for ServiceFailure {
    fn from(err: ApiError) -> Self {
        Self::from(&err)
    }
}

/// Matches the throttling signatures returned by the signing/verification
/// backend: HTTP 429, "throttled", "Rate limit".
pub fn is_rate_limit_text(text: &str) -> bool {
    RATE_LIMIT_PATTERN.is_match(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_limit_text_detection() {
        assert!(is_rate_limit_text("request failed with status 429"));
        assert!(is_rate_limit_text("ThrottlingException: Rate exceeded"));
        assert!(is_rate_limit_text("Request was throttled"));
        assert!(is_rate_limit_text("Rate limit exceeded"));
        assert!(is_rate_limit_text("rate_limit"));
        assert!(!is_rate_limit_text("connection refused"));
        assert!(!is_rate_limit_text("status 4290"));
    }

    #[test]
    fn service_failure_user_message() {
        let plain = ServiceFailure::new("staff not found");
        assert!(!plain.rate_limited);
        assert_eq!(plain.user_message(), "staff not found");

        let throttled = ServiceFailure::new("HTTP 429 Too Many Requests");
        assert!(throttled.rate_limited);
        assert_eq!(throttled.user_message(), RATE_LIMIT_MESSAGE);
    }

    #[test]
    fn service_failure_from_api_error() {
        let err = ApiError::RateLimited {
            retry_after_ms: 2000,
        };
        let failure = ServiceFailure::from(&err);
        assert!(failure.rate_limited);

        let err = ApiError::Api {
            status: 404,
            message: "Staff member not found".into(),
        };
        let failure = ServiceFailure::from(err);
        assert!(!failure.rate_limited);
        assert_eq!(failure.message, "Staff member not found");

        let failure = ServiceFailure::from(ApiError::Timeout);
        assert_eq!(failure.user_message(), "request timed out");
    }

    #[test]
    fn validation_error_display() {
        let err = ValidationError::MissingAssignment {
            staff_name: "Dana Reyes".into(),
        };
        assert_eq!(err.to_string(), "No assignment found for Dana Reyes at this event");
        assert_eq!(ValidationError::EmptyPin.to_string(), "Please enter your PIN");
    }
}
