use std::sync::Arc;

use crate::clients::JikanClient;
use crate::config::Config;
use crate::db::Store;
use crate::services::TokenService;

/// Build a shared HTTP client with reasonable defaults for API calls.
/// Reused across all outbound requests to enable connection pooling.
fn build_shared_http_client(timeout_seconds: u64) -> anyhow::Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_seconds))
        .user_agent("AniParadise/1.0")
        .pool_max_idle_per_host(10)
        .build()
        .map_err(|e| anyhow::anyhow!("Failed to build shared HTTP client: {e}"))
}

#[derive(Clone)]
pub struct AppState {
    pub config: Config,

    pub store: Store,

    pub jikan: Arc<JikanClient>,

    pub tokens: TokenService,
}

impl AppState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let store = Store::with_pool_options(
            &config.database.connection_url(),
            config.database.max_connections,
            config.database.min_connections,
        )
        .await?;

        Self::with_store(config, store)
    }

    /// Wires the state around an already-connected store. Used directly by
    /// integration tests that run against in-memory sqlite.
    pub fn with_store(config: Config, store: Store) -> anyhow::Result<Self> {
        let http_client = build_shared_http_client(config.http.request_timeout_seconds)?;
        let jikan = Arc::new(JikanClient::with_shared_client(http_client));
        let tokens = TokenService::new(&config.auth);

        Ok(Self {
            config,
            store,
            jikan,
            tokens,
        })
    }
}
