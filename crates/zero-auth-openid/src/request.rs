//! Authentication request (checkid_setup) construction.

use crate::compose::compose;
use crate::constants::*;
use crate::discovery::EndpointResolver;
use crate::errors::*;
use std::sync::Arc;
use tracing::debug;
use url::Url;

/// Builds the URL the end user is redirected to for login.
pub struct AuthRequestBuilder {
    resolver: Arc<EndpointResolver>,
    return_scheme: String,
    return_path: String,
}

impl AuthRequestBuilder {
    /// Create a builder whose callback is `<return_scheme>://<host><return_path>`
    pub fn new(
        resolver: Arc<EndpointResolver>,
        return_scheme: impl Into<String>,
        return_path: impl Into<String>,
    ) -> Self {
        Self {
            resolver,
            return_scheme: return_scheme.into(),
            return_path: return_path.into(),
        }
    }

    /// Build the provider authentication URL.
    ///
    /// # Arguments
    ///
    /// * `request_host` - Host (and optional port) the end user reached us on
    /// * `return_to` - Where to send the user after a successful login; it is
    ///   carried through the provider as `openid.secondary_return_to`
    pub async fn build_auth_url(&self, request_host: &str, return_to: &Url) -> Result<Url> {
        let endpoint = self.resolver.resolve().await?;
        let callback = self.callback_url(request_host, return_to)?;
        let params = auth_request_params(&callback);

        let auth_url = compose(&endpoint, &params)?;
        debug!(
            request_host = %request_host,
            callback = %callback,
            "Built OpenID authentication request"
        );

        Ok(auth_url)
    }

    /// The relying-party callback URL embedding the caller's `return_to`
    pub fn callback_url(&self, request_host: &str, return_to: &Url) -> Result<Url> {
        if request_host.is_empty() {
            return Err(OpenIdError::Url("Request host is empty".to_string()));
        }

        let mut callback = Url::parse(&format!(
            "{}://{}{}",
            self.return_scheme, request_host, self.return_path
        ))
        .map_err(|e| {
            OpenIdError::Url(format!("Invalid callback URL for host {:?}: {}", request_host, e))
        })?;

        // A host smuggling user info, path or query would change the callback
        if !callback.username().is_empty()
            || callback.path() != self.return_path
            || callback.query().is_some()
            || callback.fragment().is_some()
        {
            return Err(OpenIdError::Url(format!(
                "Request host {:?} is not a plain host",
                request_host
            )));
        }

        callback
            .query_pairs_mut()
            .append_pair(PARAM_SECONDARY_RETURN_TO, return_to.as_str());

        Ok(callback)
    }
}

/// Fixed checkid_setup parameter set requesting the user's email address
fn auth_request_params(callback: &Url) -> Vec<(&'static str, String)> {
    vec![
        (PARAM_MODE, MODE_CHECKID_SETUP.to_string()),
        (PARAM_NS, OPENID_NS.to_string()),
        (PARAM_RETURN_TO, callback.to_string()),
        (PARAM_CLAIMED_ID, IDENTIFIER_SELECT.to_string()),
        (PARAM_IDENTITY, IDENTIFIER_SELECT.to_string()),
        (PARAM_NS_AX, AX_NS.to_string()),
        (PARAM_AX_MODE, "fetch_request".to_string()),
        (PARAM_AX_REQUIRED, "email".to_string()),
        (PARAM_AX_TYPE_EMAIL, AX_TYPE_EMAIL.to_string()),
    ]
}
