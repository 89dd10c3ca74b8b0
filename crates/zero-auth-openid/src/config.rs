//! Relying-party configuration.

use crate::constants::{DEFAULT_DISCOVERY_URL, DEFAULT_NONCE_CAPACITY};
use crate::errors::*;
use std::time::Duration;
use url::Url;

/// Configuration for an `OpenIdClient`
#[derive(Debug, Clone)]
pub struct OpenIdConfig {
    /// Location of the provider's XRDS discovery document
    pub discovery_url: Url,
    /// Scheme of the relying-party callback URL
    pub return_scheme: String,
    /// Path of the relying-party callback URL
    pub return_path: String,
    /// Number of response nonces remembered for replay detection
    pub nonce_capacity: usize,
    /// Timeout applied to discovery and direct-verification requests
    pub request_timeout: Option<Duration>,
}

impl OpenIdConfig {
    /// Configuration for the given discovery document, other values default
    pub fn new(discovery_url: Url) -> Self {
        Self {
            discovery_url,
            return_scheme: "http".to_string(),
            return_path: "/openid".to_string(),
            nonce_capacity: DEFAULT_NONCE_CAPACITY,
            request_timeout: None,
        }
    }

    /// Check values that would otherwise only fail at request time
    pub fn validate(&self) -> Result<()> {
        if !matches!(self.discovery_url.scheme(), "http" | "https") {
            return Err(OpenIdError::Config(format!(
                "Discovery URL must be http(s): {}",
                self.discovery_url
            )));
        }

        if !matches!(self.return_scheme.as_str(), "http" | "https") {
            return Err(OpenIdError::Config(format!(
                "Return scheme must be http or https, got {:?}",
                self.return_scheme
            )));
        }

        if !self.return_path.starts_with('/') {
            return Err(OpenIdError::Config(format!(
                "Return path must start with '/', got {:?}",
                self.return_path
            )));
        }

        if self.nonce_capacity == 0 {
            return Err(OpenIdError::Config(
                "Nonce capacity must be at least 1".to_string(),
            ));
        }

        Ok(())
    }
}

impl Default for OpenIdConfig {
    fn default() -> Self {
        let discovery_url =
            Url::parse(DEFAULT_DISCOVERY_URL).expect("default discovery URL is valid");
        Self::new(discovery_url)
    }
}
