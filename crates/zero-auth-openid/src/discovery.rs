//! OpenID 2.0 endpoint discovery via an XRDS document.

use crate::errors::*;
use quick_xml::events::Event;
use quick_xml::Reader;
use reqwest::header::ACCEPT;
use reqwest::Client;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use url::Url;

const XRDS_CONTENT_TYPE: &str = "application/xrds+xml";

/// Element path of the service URI below the document root
const SERVICE_URI_PATH: [&str; 3] = ["XRD", "Service", "URI"];

/// Resolves the provider's authentication endpoint once and remembers it.
///
/// Only a successful resolution is cached; after a failure the next call
/// fetches the discovery document again. The cached endpoint is never
/// refreshed for the lifetime of the resolver.
pub struct EndpointResolver {
    http: Client,
    discovery_url: Url,
    endpoint: RwLock<Option<Url>>,
}

impl EndpointResolver {
    /// Create a resolver that fetches `discovery_url` on first use
    pub fn new(http: Client, discovery_url: Url) -> Self {
        Self {
            http,
            discovery_url,
            endpoint: RwLock::new(None),
        }
    }

    /// Location of the discovery document
    pub fn discovery_url(&self) -> &Url {
        &self.discovery_url
    }

    /// Return the authentication endpoint, fetching it on first use.
    ///
    /// Two callers racing on an empty cache may both fetch; the first
    /// successful result is kept and returned to both.
    pub async fn resolve(&self) -> Result<Url> {
        {
            let cached = self.endpoint.read().await;
            if let Some(endpoint) = cached.as_ref() {
                debug!(endpoint = %endpoint, "Using cached OpenID endpoint");
                return Ok(endpoint.clone());
            }
        }

        let fetched = self.fetch().await.map_err(|e| {
            warn!(discovery_url = %self.discovery_url, error = %e, "OpenID discovery failed");
            e
        })?;

        let mut cached = self.endpoint.write().await;
        let endpoint = cached.get_or_insert(fetched).clone();

        info!(
            discovery_url = %self.discovery_url,
            endpoint = %endpoint,
            "Resolved OpenID endpoint"
        );

        Ok(endpoint)
    }

    /// The cached endpoint, without triggering discovery
    pub async fn cached(&self) -> Option<Url> {
        self.endpoint.read().await.clone()
    }

    async fn fetch(&self) -> Result<Url> {
        let response = self
            .http
            .get(self.discovery_url.clone())
            .header(ACCEPT, XRDS_CONTENT_TYPE)
            .send()
            .await
            .map_err(|e| OpenIdError::Discovery(format!("HTTP error: {}", e)))?;

        if !response.status().is_success() {
            return Err(OpenIdError::Discovery(format!(
                "Discovery request failed with status {}",
                response.status()
            )));
        }

        let document = response
            .text()
            .await
            .map_err(|e| OpenIdError::Discovery(format!("Failed to read document: {}", e)))?;

        parse_xrds(&document)
    }
}

impl std::fmt::Debug for EndpointResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EndpointResolver")
            .field("discovery_url", &self.discovery_url.as_str())
            .finish_non_exhaustive()
    }
}

/// Extract the service URI (`XRD > Service > URI`) from an XRDS document.
///
/// The first matching element wins.
pub fn parse_xrds(document: &str) -> Result<Url> {
    let mut reader = Reader::from_str(document);
    reader.config_mut().trim_text(true);

    let mut path: Vec<String> = Vec::new();
    let mut uri = String::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                path.push(String::from_utf8_lossy(e.local_name().as_ref()).into_owned());
            }
            Ok(Event::End(_)) => {
                if at_service_uri(&path) && !uri.trim().is_empty() {
                    break;
                }
                path.pop();
            }
            Ok(Event::Text(e)) if at_service_uri(&path) => {
                let text = e.unescape().map_err(|e| {
                    OpenIdError::Discovery(format!("Malformed XRDS document: {}", e))
                })?;
                uri.push_str(&text);
            }
            Ok(Event::CData(e)) if at_service_uri(&path) => {
                uri.push_str(&String::from_utf8_lossy(&e));
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(OpenIdError::Discovery(format!(
                    "Malformed XRDS document at position {}: {}",
                    reader.buffer_position(),
                    e
                )))
            }
            _ => {}
        }
    }

    let uri = uri.trim();
    if uri.is_empty() {
        return Err(OpenIdError::Discovery(
            "XRDS document has no XRD/Service/URI element".to_string(),
        ));
    }

    Url::parse(uri)
        .map_err(|e| OpenIdError::Discovery(format!("Invalid service URI {:?}: {}", uri, e)))
}

// The root element is the XRDS wrapper; the service URI sits directly below it.
fn at_service_uri(path: &[String]) -> bool {
    path.len() == SERVICE_URI_PATH.len() + 1
        && path[1..]
            .iter()
            .zip(SERVICE_URI_PATH.iter())
            .all(|(actual, expected)| actual == expected)
}
