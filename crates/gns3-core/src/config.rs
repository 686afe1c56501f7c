//! Configuration structures for GNS3 clients.
//!
//! This module provides the configuration type used to connect to a GNS3 server,
//! including credentials, TLS settings, and validation.

use crate::client::{DEFAULT_API_VERSION, DEFAULT_MAX_RETRIES, GNS3_DEFAULT_TIMEOUT};
use crate::Error;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use url::Url;
use validator::Validate;

/// Configuration for a GNS3 connector instance.
///
/// Controls which server the connector talks to, which REST API version it targets,
/// and how requests are authenticated and timed out.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct Gns3ClientConfig {
    /// GNS3 server URL (e.g. `http://gns3server:3080`)
    #[validate(url)]
    pub server_url: String,

    /// Optional user for HTTP basic authentication
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,

    /// Optional password for HTTP basic authentication
    #[serde(default, skip_serializing)]
    pub password: Option<SecretString>,

    /// REST API version (the server exposes `/v{api_version}`)
    #[validate(range(min = 1, max = 3))]
    #[serde(default = "default_api_version")]
    pub api_version: u8,

    /// Whether to verify TLS certificates
    #[serde(default = "default_tls_verify")]
    pub tls_verify: bool,

    /// Optional path to custom CA certificate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tls_ca_cert: Option<PathBuf>,

    /// Request timeout in seconds
    #[validate(range(min = 1, max = 300))]
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Maximum number of retry attempts
    #[validate(range(min = 0, max = 10))]
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

const fn default_api_version() -> u8 {
    DEFAULT_API_VERSION
}

const fn default_tls_verify() -> bool {
    true
}

const fn default_request_timeout_secs() -> u64 {
    GNS3_DEFAULT_TIMEOUT
}

const fn default_max_retries() -> u32 {
    DEFAULT_MAX_RETRIES
}

impl Gns3ClientConfig {
    /// Create a new client configuration for the given server URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid or validation fails.
    pub fn new(server_url: impl Into<String>) -> Result<Self, Error> {
        let config = Self {
            server_url: server_url.into(),
            ..Self::default()
        };

        config.ensure_valid()?;
        Ok(config)
    }

    /// Set the credentials used for HTTP basic authentication.
    #[must_use]
    pub fn with_credentials(mut self, user: impl Into<String>, password: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self.password = Some(SecretString::from(password.into()));
        self
    }

    /// Set the REST API version.
    #[must_use]
    pub const fn with_api_version(mut self, version: u8) -> Self {
        self.api_version = version;
        self
    }

    /// Set whether to verify TLS certificates.
    #[must_use]
    pub const fn with_tls_verify(mut self, verify: bool) -> Self {
        self.tls_verify = verify;
        self
    }

    /// Set custom CA certificate path.
    #[must_use]
    pub fn with_ca_cert(mut self, path: PathBuf) -> Self {
        self.tls_ca_cert = Some(path);
        self
    }

    /// Set request timeout in seconds.
    #[must_use]
    pub const fn with_timeout(mut self, seconds: u64) -> Self {
        self.request_timeout_secs = seconds;
        self
    }

    /// Set maximum retry attempts.
    #[must_use]
    pub const fn with_max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    /// Check the configuration against its validation rules.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigError`] describing every rule that failed.
    pub fn ensure_valid(&self) -> Result<(), Error> {
        self.validate()
            .map_err(|e| Error::ConfigError(format!("Invalid configuration: {e}")))
    }

    /// Get the request timeout as a Duration.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Parse the server URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL cannot be parsed.
    pub fn parse_server_url(&self) -> Result<Url, Error> {
        Url::parse(&self.server_url)
            .map_err(|e| Error::InvalidEndpoint(format!("Invalid server URL `{}`: {e}", self.server_url)))
    }

    /// Build the versioned API base URL, e.g. `http://gns3server:3080/v2/`.
    ///
    /// The returned URL always ends with a slash so relative resource paths can be joined
    /// onto it.
    ///
    /// # Errors
    ///
    /// Returns an error if the server URL cannot be parsed or cannot act as a base URL.
    pub fn base_url(&self) -> Result<Url, Error> {
        let mut server = self.parse_server_url()?;
        if server.cannot_be_a_base() {
            return Err(Error::InvalidEndpoint(format!(
                "Server URL `{}` cannot be used as a base URL",
                self.server_url
            )));
        }

        if !server.path().ends_with('/') {
            let path = format!("{}/", server.path());
            server.set_path(&path);
        }

        Ok(server.join(&format!("v{}/", self.api_version))?)
    }
}

impl Default for Gns3ClientConfig {
    fn default() -> Self {
        Self {
            server_url: "http://localhost:3080".to_string(),
            user: None,
            password: None,
            api_version: default_api_version(),
            tls_verify: default_tls_verify(),
            tls_ca_cert: None,
            request_timeout_secs: default_request_timeout_secs(),
            max_retries: default_max_retries(),
        }
    }
}
