//! Direct verification of the provider's callback.
//!
//! The assertion is never checked locally: every parameter is sent back to
//! the provider with `openid.mode=check_authentication` and the provider's
//! answer decides. The response nonce is recorded only once the provider has
//! confirmed the assertion, so a replayed callback is rejected.

use crate::callback::CallbackRequest;
use crate::compose::compose;
use crate::constants::*;
use crate::discovery::EndpointResolver;
use crate::errors::*;
use crate::nonce::NonceCache;
use reqwest::Client;
use std::sync::Arc;
use tracing::{debug, info, warn};
use url::Url;

/// Outcome of a verification that ran to completion.
///
/// `ok == false` means the login is not accepted (invalid assertion or
/// replay); it is not a malfunction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Verification {
    /// Original destination carried as `openid.secondary_return_to`
    pub return_to: Option<Url>,
    /// Email address released through attribute exchange
    pub identity: Option<String>,
    pub ok: bool,
}

/// Parsed `key:value` body of a direct-verification response
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VerificationResponse {
    pub ns: Option<String>,
    pub is_valid: bool,
}

impl VerificationResponse {
    /// Parse a newline-separated `key:value` document.
    ///
    /// Each line is split on its first colon. An `ns` other than the OpenID
    /// 2.0 namespace fails the whole response. `is_valid` is true only for
    /// the literal value `true`.
    pub fn parse(body: &str) -> Result<Self> {
        let mut response = Self::default();

        for line in body.split('\n') {
            let line = line.strip_suffix('\r').unwrap_or(line);
            let Some((key, value)) = line.split_once(':') else {
                continue;
            };

            match key {
                "ns" => {
                    if value != OPENID_NS {
                        return Err(OpenIdError::Protocol(format!(
                            "Unknown namespace: {}",
                            value
                        )));
                    }
                    response.ns = Some(value.to_string());
                }
                "is_valid" => response.is_valid = value == "true",
                _ => {}
            }
        }

        Ok(response)
    }
}

/// Validates callbacks by re-submitting them to the provider.
pub struct CallbackVerifier {
    resolver: Arc<EndpointResolver>,
    nonces: Arc<NonceCache>,
    http: Client,
}

impl CallbackVerifier {
    pub fn new(resolver: Arc<EndpointResolver>, nonces: Arc<NonceCache>, http: Client) -> Self {
        Self {
            resolver,
            nonces,
            http,
        }
    }

    /// Verify an inbound callback.
    ///
    /// # Returns
    ///
    /// `Ok` with `ok == true` only when the provider confirmed the assertion
    /// and its response nonce has never been accepted before. Errors are
    /// reserved for discovery, URL, form, transport and protocol failures.
    pub async fn verify_callback(&self, request: &CallbackRequest) -> Result<Verification> {
        let endpoint = self.resolver.resolve().await?;
        let form = request.form_pairs()?;

        let mut verification = Verification::default();
        let mut nonce = None;
        let mut forward = Vec::with_capacity(form.len() + 1);

        for (key, value) in form {
            match key.as_str() {
                PARAM_AX_VALUE_EMAIL => verification.identity = Some(value.clone()),
                PARAM_SECONDARY_RETURN_TO => {
                    let return_to = Url::parse(&value).map_err(|e| {
                        OpenIdError::Url(format!("Invalid {}: {}", PARAM_SECONDARY_RETURN_TO, e))
                    })?;
                    verification.return_to = Some(return_to);
                }
                PARAM_RESPONSE_NONCE => nonce = Some(value.clone()),
                _ => {}
            }

            if key != PARAM_MODE {
                forward.push((key, value));
            }
        }
        forward.push((PARAM_MODE.to_string(), MODE_CHECK_AUTHENTICATION.to_string()));

        let check_url = compose(&endpoint, &forward)?;
        let response = self.check_authentication(check_url).await?;

        verification.ok = response.is_valid && self.accept_nonce(nonce.as_deref());

        if verification.ok {
            info!(
                identity = ?verification.identity,
                "OpenID login verified"
            );
        } else {
            debug!(
                is_valid = response.is_valid,
                "OpenID login not accepted"
            );
        }

        Ok(verification)
    }

    async fn check_authentication(&self, check_url: Url) -> Result<VerificationResponse> {
        let response = self
            .http
            .get(check_url)
            .send()
            .await
            .map_err(|e| OpenIdError::Transport(format!("Direct verification failed: {}", e)))?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            OpenIdError::Transport(format!("Failed to read verification response: {}", e))
        })?;
        debug!(status = %status, "Received direct verification response");

        VerificationResponse::parse(&body).map_err(|e| {
            warn!(error = %e, "Rejected direct verification response");
            e
        })
    }

    fn accept_nonce(&self, nonce: Option<&str>) -> bool {
        let Some(nonce) = nonce else {
            warn!("Valid assertion without response nonce, rejecting");
            return false;
        };

        if self.nonces.add(nonce) {
            true
        } else {
            warn!(
                nonce_hash = %nonce_hash_for_log(nonce),
                "Replayed OpenID response nonce"
            );
            false
        }
    }
}

fn nonce_hash_for_log(nonce: &str) -> String {
    let hash = blake3::hash(nonce.as_bytes());
    hex::encode(&hash.as_bytes()[..8])
}
