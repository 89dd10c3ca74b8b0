//! Mock OpenID provider helpers shared by the integration tests.

#![allow(dead_code)]

use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};
use zero_auth_openid::{CallbackRequest, OpenIdClient, OpenIdConfig};

pub const DISCOVERY_PATH: &str = "/accounts/o8/id";

pub const VALID_BODY: &str = "ns:http://specs.openid.net/auth/2.0\nis_valid:true\n";

/// XRDS document advertising `endpoint` as the service URI
pub fn xrds_document(endpoint: &str) -> String {
    let escaped = endpoint.replace('&', "&amp;");
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<xrds:XRDS xmlns:xrds="xri://$xrds" xmlns="xri://$xrd*($v*2.0)">
  <XRD>
    <Service priority="0">
      <Type>http://specs.openid.net/auth/2.0/server</Type>
      <Type>http://openid.net/srv/ax/1.0</Type>
      <URI>{}</URI>
    </Service>
  </XRD>
</xrds:XRDS>"#,
        escaped
    )
}

pub fn xrds_response(endpoint: &str) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .insert_header("content-type", "application/xrds+xml")
        .set_body_string(xrds_document(endpoint))
}

/// Serve the discovery document advertising `endpoint`
pub async fn mount_discovery(server: &MockServer, endpoint: &str) {
    Mock::given(method("GET"))
        .and(path(DISCOVERY_PATH))
        .respond_with(xrds_response(endpoint))
        .mount(server)
        .await;
}

/// Answer every direct-verification request at `/o8/ud` with `body`
pub async fn mount_verification(server: &MockServer, body: &str) {
    Mock::given(method("GET"))
        .and(path("/o8/ud"))
        .respond_with(ResponseTemplate::new(200).set_body_string(body.to_string()))
        .mount(server)
        .await;
}

/// Client whose discovery document lives on the mock server
pub fn client_for(server: &MockServer) -> OpenIdClient {
    let discovery_url = Url::parse(&format!("{}{}", server.uri(), DISCOVERY_PATH)).unwrap();
    OpenIdClient::new(OpenIdConfig::new(discovery_url)).unwrap()
}

/// A positive assertion callback carrying `nonce`
pub fn callback(nonce: &str) -> CallbackRequest {
    let query = url::form_urlencoded::Serializer::new(String::new())
        .append_pair("openid.ns", "http://specs.openid.net/auth/2.0")
        .append_pair("openid.mode", "id_res")
        .append_pair("openid.response_nonce", nonce)
        .append_pair("openid.assoc_handle", "handle-1")
        .append_pair("openid.signed", "op_endpoint,claimed_id,identity,return_to,response_nonce")
        .append_pair("openid.sig", "c2lnbmF0dXJl")
        .append_pair("openid.ext1.value.email", "alice@example.com")
        .append_pair("openid.secondary_return_to", "https://app.example.com/after")
        .finish();
    CallbackRequest::from_query(query)
}

pub fn query_pairs(url: &Url) -> Vec<(String, String)> {
    url.query_pairs().into_owned().collect()
}

pub fn value_of<'a>(pairs: &'a [(String, String)], key: &str) -> Option<&'a str> {
    pairs
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
}
