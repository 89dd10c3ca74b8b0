//! Query composition that keeps every component of the base URL.

use crate::errors::*;
use std::fmt::Write;
use url::form_urlencoded;
use url::Url;

/// Append `params` to `base` without discarding anything already on it.
///
/// User info, host, port, path, fragment and the existing raw query string
/// all survive. The base query comes first, followed by `params` encoded as
/// `application/x-www-form-urlencoded` in the order given. The discovered
/// endpoint may carry provider-specific query parameters, so they must never
/// be replaced.
pub fn compose<K, V>(base: &Url, params: &[(K, V)]) -> Result<Url>
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    let host = base
        .host_str()
        .ok_or_else(|| OpenIdError::Url(format!("Base URL has no host: {}", base)))?;

    let mut buf = format!("{}://", base.scheme());

    if !base.username().is_empty() {
        buf.push_str(base.username());
        if let Some(password) = base.password() {
            let _ = write!(buf, ":{}", password);
        }
        buf.push('@');
    }

    buf.push_str(host);
    if let Some(port) = base.port() {
        let _ = write!(buf, ":{}", port);
    }

    buf.push_str(base.path());

    let encoded = encode_params(params);
    let existing = base.query().filter(|q| !q.is_empty());
    match (existing, encoded.is_empty()) {
        (Some(query), false) => {
            let _ = write!(buf, "?{}&{}", query, encoded);
        }
        (Some(query), true) => {
            let _ = write!(buf, "?{}", query);
        }
        (None, false) => {
            let _ = write!(buf, "?{}", encoded);
        }
        (None, true) => {}
    }

    if let Some(fragment) = base.fragment() {
        let _ = write!(buf, "#{}", fragment);
    }

    Url::parse(&buf)
        .map_err(|e| OpenIdError::Url(format!("Composed URL {:?} is invalid: {}", buf, e)))
}

/// Encode ordered pairs as a form-urlencoded query string
pub fn encode_params<K, V>(params: &[(K, V)]) -> String
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    form_urlencoded::Serializer::new(String::new())
        .extend_pairs(params.iter().map(|(k, v)| (k.as_ref(), v.as_ref())))
        .finish()
}
