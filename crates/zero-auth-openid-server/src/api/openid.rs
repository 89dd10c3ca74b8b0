use axum::{
    body::Bytes,
    extract::{Query, RawQuery, State},
    http::{header, HeaderMap, Method},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;
use url::Url;
use zero_auth_openid::CallbackRequest;

use crate::{
    error::{map_openid_error, ApiError},
    state::AppState,
};

// ============================================================================
// Request Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct LoginQuery {
    /// Where to send the user once the login is verified
    pub return_to: String,
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /login
///
/// Redirects the user to the identity provider.
pub async fn login(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<LoginQuery>,
) -> Result<Redirect, ApiError> {
    let host = request_host(&headers)?;
    let return_to = Url::parse(&query.return_to)
        .map_err(|e| ApiError::InvalidRequest(format!("Invalid return_to: {}", e)))?;

    let auth_url = state
        .openid
        .auth_url(host, &return_to)
        .await
        .map_err(map_openid_error)?;

    Ok(Redirect::to(auth_url.as_str()))
}

/// GET|POST /openid
///
/// Verifies the provider's callback and sends the user on to the original
/// destination.
pub async fn callback(
    State(state): State<Arc<AppState>>,
    method: Method,
    headers: HeaderMap,
    RawQuery(query): RawQuery,
    body: Bytes,
) -> Result<Response, ApiError> {
    let request = CallbackRequest {
        method,
        query,
        content_type: headers
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string),
        body: body.to_vec(),
    };

    let verification = state
        .openid
        .verify_callback(&request)
        .await
        .map_err(map_openid_error)?;

    if !verification.ok {
        return Err(ApiError::Forbidden(
            "OpenID login was not accepted".to_string(),
        ));
    }

    info!(identity = ?verification.identity, "User logged in via OpenID");

    let destination = verification
        .return_to
        .map(|url| url.to_string())
        .unwrap_or_else(|| "/".to_string());

    Ok(Redirect::to(&destination).into_response())
}

fn request_host(headers: &HeaderMap) -> Result<&str, ApiError> {
    headers
        .get(header::HOST)
        .and_then(|value| value.to_str().ok())
        .filter(|host| !host.is_empty())
        .ok_or_else(|| ApiError::InvalidRequest("Missing Host header".to_string()))
}
