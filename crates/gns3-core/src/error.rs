//! Error types for GNS3 operations.
//!
//! This module provides the error hierarchy shared by every GNS3 client call,
//! including HTTP status code mapping and conversions from the underlying crates.

use thiserror::Error;

/// Main error type for GNS3 operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// GNS3 server is unreachable or temporarily failing
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    HttpError(String),

    /// Operation timed out
    #[error("Timeout waiting for server: {0}")]
    Timeout(String),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid request (rejected credentials, forbidden resource)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Bad request with details
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Validation error
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Conflict error
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Failed to parse a server response
    #[error("Failed to parse response: {0}")]
    ParseError(String),

    /// Invalid UUID format
    #[error("Invalid UUID: {0}")]
    InvalidUuid(String),

    /// Invalid endpoint
    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(String),

    /// An entity is missing an attribute required for the requested call
    #[error("Missing required attribute: {0}")]
    MissingAttribute(String),
}

/// Specialized result type for GNS3 operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Returns the error code for this error type.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::ServiceUnavailable(_) => "SERVICE_UNAVAILABLE",
            Self::ConfigError(_) => "CONFIG_ERROR",
            Self::HttpError(_) => "HTTP_ERROR",
            Self::Timeout(_) => "TIMEOUT",
            Self::NotFound(_) => "NOT_FOUND",
            Self::InvalidRequest(_) => "INVALID_REQUEST",
            Self::BadRequest(_) => "BAD_REQUEST",
            Self::ValidationError(_) => "VALIDATION_ERROR",
            Self::Conflict(_) => "CONFLICT",
            Self::ParseError(_) => "PARSE_ERROR",
            Self::InvalidUuid(_) => "INVALID_UUID",
            Self::InvalidEndpoint(_) => "INVALID_ENDPOINT",
            Self::MissingAttribute(_) => "MISSING_ATTRIBUTE",
        }
    }

    /// Returns true when the failure is transient and the request may be retried.
    ///
    /// Only timeouts and an unavailable server qualify; `HttpError` also covers
    /// request building and body failures that fail the same way every time.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Timeout(_) | Self::ServiceUnavailable(_))
    }
}

// Conversions from external error types
impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout(err.to_string())
        } else if err.is_connect() {
            Self::ServiceUnavailable(err.to_string())
        } else if err.is_decode() {
            Self::ParseError(err.to_string())
        } else {
            Self::HttpError(err.to_string())
        }
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Self::InvalidEndpoint(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::ParseError(err.to_string())
    }
}

impl From<validator::ValidationErrors> for Error {
    fn from(err: validator::ValidationErrors) -> Self {
        Self::ValidationError(err.to_string())
    }
}

impl From<uuid::Error> for Error {
    fn from(err: uuid::Error) -> Self {
        Self::InvalidUuid(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(
            Error::ServiceUnavailable("test".to_string()).error_code(),
            "SERVICE_UNAVAILABLE"
        );
        assert_eq!(
            Error::ConfigError("test".to_string()).error_code(),
            "CONFIG_ERROR"
        );
        assert_eq!(
            Error::HttpError("test".to_string()).error_code(),
            "HTTP_ERROR"
        );
        assert_eq!(Error::Timeout("test".to_string()).error_code(), "TIMEOUT");
        assert_eq!(
            Error::NotFound("test".to_string()).error_code(),
            "NOT_FOUND"
        );
        assert_eq!(
            Error::InvalidRequest("test".to_string()).error_code(),
            "INVALID_REQUEST"
        );
        assert_eq!(
            Error::BadRequest("test".to_string()).error_code(),
            "BAD_REQUEST"
        );
        assert_eq!(
            Error::ValidationError("test".to_string()).error_code(),
            "VALIDATION_ERROR"
        );
        assert_eq!(Error::Conflict("test".to_string()).error_code(), "CONFLICT");
        assert_eq!(
            Error::ParseError("test".to_string()).error_code(),
            "PARSE_ERROR"
        );
        assert_eq!(
            Error::InvalidUuid("test".to_string()).error_code(),
            "INVALID_UUID"
        );
        assert_eq!(
            Error::InvalidEndpoint("test".to_string()).error_code(),
            "INVALID_ENDPOINT"
        );
        assert_eq!(
            Error::MissingAttribute("test".to_string()).error_code(),
            "MISSING_ATTRIBUTE"
        );
    }

    #[test]
    fn test_error_display() {
        let err = Error::Conflict("[409] Project 'DUPLICATE' already exists".to_string());
        assert_eq!(
            err.to_string(),
            "Conflict: [409] Project 'DUPLICATE' already exists"
        );

        let err = Error::MissingAttribute("project_id".to_string());
        assert_eq!(err.to_string(), "Missing required attribute: project_id");
    }

    #[test]
    fn test_is_retryable() {
        assert!(Error::Timeout("test".to_string()).is_retryable());
        assert!(Error::ServiceUnavailable("test".to_string()).is_retryable());

        assert!(!Error::HttpError("test".to_string()).is_retryable());
        assert!(!Error::NotFound("test".to_string()).is_retryable());
        assert!(!Error::Conflict("test".to_string()).is_retryable());
        assert!(!Error::ParseError("test".to_string()).is_retryable());
    }

    // reqwest::Error conversion is covered by the connector tests against a mock server

    #[test]
    fn test_from_url_parse_error() {
        let err = url::Url::parse("WRONG URL").unwrap_err();
        let gns3_err: Error = err.into();
        assert!(matches!(gns3_err, Error::InvalidEndpoint(_)));
    }

    #[test]
    fn test_from_uuid_error() {
        let err = uuid::Uuid::parse_str("7777-4444-0000").unwrap_err();
        let gns3_err: Error = err.into();
        assert!(matches!(gns3_err, Error::InvalidUuid(_)));
        assert_eq!(gns3_err.error_code(), "INVALID_UUID");
    }

    #[test]
    fn test_from_serde_json_error() {
        let err = serde_json::from_str::<serde_json::Value>("{invalid json}").unwrap_err();
        let gns3_err: Error = err.into();
        assert!(matches!(gns3_err, Error::ParseError(_)));
    }

    #[test]
    fn test_error_partial_eq() {
        let err1 = Error::NotFound("test".to_string());
        let err2 = err1.clone();
        let err3 = Error::NotFound("other".to_string());

        assert_eq!(err1, err2);
        assert_ne!(err1, err3);
    }
}
