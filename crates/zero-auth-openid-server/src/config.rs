use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::time::Duration;
use url::Url;
use zero_auth_openid::OpenIdConfig;

/// Server configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Address to bind the server to
    pub bind_address: SocketAddr,

    /// Relying-party settings handed to the OpenID client
    pub openid: OpenIdConfig,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through `lookup`, falling back to defaults
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let bind_address = lookup("BIND_ADDRESS")
            .unwrap_or_else(|| "127.0.0.1:8080".to_string())
            .parse()
            .context("BIND_ADDRESS must be a socket address")?;

        let mut openid = OpenIdConfig::default();

        if let Some(discovery_url) = lookup("OPENID_DISCOVERY_URL") {
            openid.discovery_url =
                Url::parse(&discovery_url).context("OPENID_DISCOVERY_URL must be a URL")?;
        }

        if let Some(scheme) = lookup("OPENID_RETURN_SCHEME") {
            openid.return_scheme = scheme;
        }

        if let Some(path) = lookup("OPENID_RETURN_PATH") {
            openid.return_path = path;
        }

        if let Some(capacity) = lookup("OPENID_NONCE_CAPACITY") {
            openid.nonce_capacity = capacity
                .parse()
                .context("OPENID_NONCE_CAPACITY must be a positive integer")?;
        }

        if let Some(seconds) = lookup("OPENID_REQUEST_TIMEOUT_SECONDS") {
            let seconds: u64 = seconds
                .parse()
                .context("OPENID_REQUEST_TIMEOUT_SECONDS must be an integer")?;
            openid.request_timeout = Some(Duration::from_secs(seconds));
        }

        openid.validate()?;

        Ok(Config {
            bind_address,
            openid,
        })
    }
}
