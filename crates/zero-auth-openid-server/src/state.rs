use anyhow::Result;
use std::sync::Arc;
use zero_auth_openid::OpenIdClient;

use crate::config::Config;

/// Application state shared across all handlers
pub struct AppState {
    pub openid: Arc<OpenIdClient>,
}

impl AppState {
    pub fn new(config: Config) -> Result<Self> {
        let openid = Arc::new(OpenIdClient::new(config.openid)?);
        Ok(Self { openid })
    }
}
