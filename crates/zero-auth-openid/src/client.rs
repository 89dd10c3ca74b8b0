//! OpenID relying-party client.

use crate::callback::CallbackRequest;
use crate::config::OpenIdConfig;
use crate::discovery::EndpointResolver;
use crate::errors::*;
use crate::nonce::NonceCache;
use crate::request::AuthRequestBuilder;
use crate::verify::{CallbackVerifier, Verification};
use reqwest::Client;
use std::sync::Arc;
use url::Url;

/// Relying-party client shared by every request of the process.
///
/// Construct it once and hand it out behind an `Arc`; the endpoint cache and
/// the nonce cache are only meaningful when shared.
pub struct OpenIdClient {
    resolver: Arc<EndpointResolver>,
    nonces: Arc<NonceCache>,
    builder: AuthRequestBuilder,
    verifier: CallbackVerifier,
}

impl OpenIdClient {
    /// Create a client from validated configuration
    pub fn new(config: OpenIdConfig) -> Result<Self> {
        config.validate()?;

        let mut http = Client::builder();
        if let Some(timeout) = config.request_timeout {
            http = http.timeout(timeout);
        }
        let http = http
            .build()
            .map_err(|e| OpenIdError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self::with_http_client(config, http))
    }

    /// Create a client around an existing `reqwest::Client`
    pub fn with_http_client(config: OpenIdConfig, http: Client) -> Self {
        let resolver = Arc::new(EndpointResolver::new(http.clone(), config.discovery_url));
        let nonces = Arc::new(NonceCache::with_capacity(config.nonce_capacity));
        let builder =
            AuthRequestBuilder::new(Arc::clone(&resolver), config.return_scheme, config.return_path);
        let verifier = CallbackVerifier::new(Arc::clone(&resolver), Arc::clone(&nonces), http);

        Self {
            resolver,
            nonces,
            builder,
            verifier,
        }
    }

    /// Build the URL to redirect the end user to
    pub async fn auth_url(&self, request_host: &str, return_to: &Url) -> Result<Url> {
        self.builder.build_auth_url(request_host, return_to).await
    }

    /// Verify the provider's callback
    pub async fn verify_callback(&self, request: &CallbackRequest) -> Result<Verification> {
        self.verifier.verify_callback(request).await
    }

    /// Number of response nonces currently remembered
    pub fn nonce_count(&self) -> usize {
        self.nonces.len()
    }

    pub fn nonce_capacity(&self) -> usize {
        self.nonces.capacity()
    }

    /// The resolved endpoint, if discovery has already succeeded
    pub async fn endpoint(&self) -> Option<Url> {
        self.resolver.cached().await
    }

    /// Shared nonce cache
    pub fn nonces(&self) -> &Arc<NonceCache> {
        &self.nonces
    }
}
