use anyhow::Result;
use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, TraceLayer},
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod api;
mod config;
mod error;
mod state;

use config::Config;
use state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "zero_auth_openid=debug,zero_auth_openid_server=debug,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env()?;
    let bind_address = config.bind_address;
    let return_path = config.openid.return_path.clone();
    tracing::info!(
        discovery_url = %config.openid.discovery_url,
        "Starting zero-auth OpenID relying party on {}",
        bind_address
    );

    let state = Arc::new(AppState::new(config)?);
    let app = create_router(state, &return_path);

    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    tracing::info!("Server listening on {}", bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

fn create_router(state: Arc<AppState>, return_path: &str) -> Router {
    Router::new()
        // Health checks
        .route("/health", get(api::health::health_check))
        .route("/debug/nonces", get(api::health::nonce_stats))
        // OpenID login
        .route("/login", get(api::openid::login))
        .route(
            return_path,
            get(api::openid::callback).post(api::openid::callback),
        )
        .layer(TraceLayer::new_for_http().make_span_with(DefaultMakeSpan::default()))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
    };
    use tower::ServiceExt;
    use url::Url;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};
    use zero_auth_openid::OpenIdConfig;

    const XRDS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<xrds:XRDS xmlns:xrds="xri://$xrds" xmlns="xri://$xrd*($v*2.0)">
  <XRD>
    <Service priority="0">
      <Type>http://specs.openid.net/auth/2.0/server</Type>
      <URI>{endpoint}</URI>
    </Service>
  </XRD>
</xrds:XRDS>"#;

    const CALLBACK_QUERY: &str = "openid.ns=http%3A%2F%2Fspecs.openid.net%2Fauth%2F2.0\
        &openid.mode=id_res&openid.response_nonce=2024-05-01T10%3A00%3A00Zabc\
        &openid.ext1.value.email=alice%40example.com\
        &openid.secondary_return_to=https%3A%2F%2Fapp.example.com%2Fafter";

    async fn provider(is_valid: bool) -> MockServer {
        let server = MockServer::start().await;
        let endpoint = format!("{}/o8/ud", server.uri());

        Mock::given(method("GET"))
            .and(path("/accounts/o8/id"))
            .respond_with(
                ResponseTemplate::new(200).set_body_string(XRDS.replace("{endpoint}", &endpoint)),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/o8/ud"))
            .respond_with(ResponseTemplate::new(200).set_body_string(format!(
                "ns:http://specs.openid.net/auth/2.0\nis_valid:{}\n",
                is_valid
            )))
            .mount(&server)
            .await;

        server
    }

    fn app(discovery_url: &str) -> Router {
        let config = Config {
            bind_address: "127.0.0.1:0".parse().unwrap(),
            openid: OpenIdConfig::new(Url::parse(discovery_url).unwrap()),
        };
        let return_path = config.openid.return_path.clone();
        let state = Arc::new(AppState::new(config).unwrap());
        create_router(state, &return_path)
    }

    fn app_for(server: &MockServer) -> Router {
        app(&format!("{}/accounts/o8/id", server.uri()))
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder()
            .uri(uri)
            .header(header::HOST, "rp.example.com")
            .body(Body::empty())
            .unwrap()
    }

    fn location(response: &axum::response::Response) -> &str {
        response
            .headers()
            .get(header::LOCATION)
            .unwrap()
            .to_str()
            .unwrap()
    }

    async fn json_body(response: axum::response::Response) -> serde_json::Value {
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn test_health_check() {
        let response = app("http://127.0.0.1:1/")
            .oneshot(get("/health"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_login_redirects_to_provider() {
        let server = provider(true).await;

        let response = app_for(&server)
            .oneshot(get("/login?return_to=https%3A%2F%2Fapp.example.com%2F"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        let target = Url::parse(location(&response)).unwrap();
        assert_eq!(target.path(), "/o8/ud");

        let return_to = target
            .query_pairs()
            .find(|(k, _)| k == "openid.return_to")
            .map(|(_, v)| v.into_owned())
            .unwrap();
        assert!(return_to.starts_with("http://rp.example.com/openid?"));
    }

    #[tokio::test]
    async fn test_login_without_host_is_bad_request() {
        let server = provider(true).await;
        let request = Request::builder()
            .uri("/login?return_to=https%3A%2F%2Fapp.example.com%2F")
            .body(Body::empty())
            .unwrap();

        let response = app_for(&server).oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert_eq!(body["error"]["code"], "INVALID_REQUEST");
    }

    #[tokio::test]
    async fn test_callback_accepts_then_forbids_replay() {
        let server = provider(true).await;
        let app = app_for(&server);
        let uri = format!("/openid?{}", CALLBACK_QUERY);

        let response = app.clone().oneshot(get(&uri)).await.unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "https://app.example.com/after");

        let replay = app.clone().oneshot(get(&uri)).await.unwrap();
        assert_eq!(replay.status(), StatusCode::FORBIDDEN);

        let stats = app.oneshot(get("/debug/nonces")).await.unwrap();
        let body = json_body(stats).await;
        assert_eq!(body["count"], 1);
        assert_eq!(body["endpoint"], format!("{}/o8/ud", server.uri()));
    }

    #[tokio::test]
    async fn test_callback_form_post() {
        let server = provider(true).await;
        let request = Request::builder()
            .method("POST")
            .uri("/openid")
            .header(header::HOST, "rp.example.com")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(CALLBACK_QUERY))
            .unwrap();

        let response = app_for(&server).oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "https://app.example.com/after");
    }

    #[tokio::test]
    async fn test_callback_rejected_assertion_is_forbidden() {
        let server = provider(false).await;

        let response = app_for(&server)
            .oneshot(get(&format!("/openid?{}", CALLBACK_QUERY)))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_callback_unreachable_provider_is_bad_gateway() {
        let response = app("http://127.0.0.1:1/accounts/o8/id")
            .oneshot(get(&format!("/openid?{}", CALLBACK_QUERY)))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        let body = json_body(response).await;
        assert_eq!(body["error"]["code"], "UPSTREAM_ERROR");
    }

    #[tokio::test]
    async fn test_nonce_stats_before_discovery() {
        let response = app("http://127.0.0.1:1/")
            .oneshot(get("/debug/nonces"))
            .await
            .unwrap();

        let body = json_body(response).await;
        assert_eq!(body["count"], 0);
        assert_eq!(body["capacity"], 100_000);
        assert!(body["endpoint"].is_null());
    }
}
