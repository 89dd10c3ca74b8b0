//! Transport-neutral view of the provider's callback request.

use crate::errors::*;
use percent_encoding::percent_decode;
use reqwest::Method;

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// An inbound HTTP request carrying the provider's assertion.
///
/// The server layer fills this from whatever HTTP stack it runs on; the
/// verifier only needs the method, raw query, content type and body.
#[derive(Debug, Clone, Default)]
pub struct CallbackRequest {
    pub method: Method,
    /// Raw query string without the leading `?`
    pub query: Option<String>,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

impl CallbackRequest {
    /// A GET callback carrying its assertion in the query string
    pub fn from_query(query: impl Into<String>) -> Self {
        Self {
            method: Method::GET,
            query: Some(query.into()),
            ..Default::default()
        }
    }

    /// A POST callback carrying its assertion as a form body
    pub fn from_form_body(body: impl Into<Vec<u8>>) -> Self {
        Self {
            method: Method::POST,
            query: None,
            content_type: Some(FORM_CONTENT_TYPE.to_string()),
            body: body.into(),
        }
    }

    /// All form pairs in the request: body pairs first, then query pairs.
    ///
    /// The body is read only for POST, PUT and PATCH requests with a
    /// form-urlencoded content type.
    pub fn form_pairs(&self) -> Result<Vec<(String, String)>> {
        let mut pairs = Vec::new();

        if self.has_form_body() {
            let body = std::str::from_utf8(&self.body)
                .map_err(|e| OpenIdError::FormParse(format!("Body is not UTF-8: {}", e)))?;
            pairs.extend(parse_form(body)?);
        }

        if let Some(query) = self.query.as_deref() {
            pairs.extend(parse_form(query)?);
        }

        Ok(pairs)
    }

    fn has_form_body(&self) -> bool {
        let body_method =
            self.method == Method::POST || self.method == Method::PUT || self.method == Method::PATCH;

        body_method
            && self.content_type.as_deref().is_some_and(|content_type| {
                content_type
                    .split(';')
                    .next()
                    .unwrap_or_default()
                    .trim()
                    .eq_ignore_ascii_case(FORM_CONTENT_TYPE)
            })
    }
}

/// Strictly decode an `application/x-www-form-urlencoded` string.
///
/// Unlike lenient decoders, a malformed percent escape or a non-UTF-8
/// decoded value is an error.
pub fn parse_form(input: &str) -> Result<Vec<(String, String)>> {
    input
        .split('&')
        .filter(|segment| !segment.is_empty())
        .map(|segment| {
            let (key, value) = segment.split_once('=').unwrap_or((segment, ""));
            Ok((decode_component(key)?, decode_component(value)?))
        })
        .collect()
}

fn decode_component(raw: &str) -> Result<String> {
    let bytes = raw.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let valid = bytes.len() > i + 2
                && bytes[i + 1].is_ascii_hexdigit()
                && bytes[i + 2].is_ascii_hexdigit();
            if !valid {
                return Err(OpenIdError::FormParse(format!(
                    "Invalid percent escape in {:?}",
                    raw
                )));
            }
            i += 3;
        } else {
            i += 1;
        }
    }

    let spaced = raw.replace('+', " ");
    percent_decode(spaced.as_bytes())
        .decode_utf8()
        .map(|decoded| decoded.into_owned())
        .map_err(|e| OpenIdError::FormParse(format!("Decoded value is not UTF-8: {}", e)))
}
