use anyhow::Result;
use reqwest::Client;
use serde_json::Value;

const JIKAN_API: &str = "https://api.jikan.moe/v4";

/// Thin proxy over the Jikan REST API. Responses are passed through as
/// raw JSON so the frontend sees Jikan's own envelope (`data`,
/// `pagination`) unchanged.
#[derive(Clone)]
pub struct JikanClient {
    client: Client,
}

impl Default for JikanClient {
    fn default() -> Self {
        Self::new()
    }
}

impl JikanClient {
    #[must_use]
    pub fn new() -> Self {
        Self::with_shared_client(Client::new())
    }

    /// Reuses an existing connection pool rather than opening a new one.
    #[must_use]
    pub const fn with_shared_client(client: Client) -> Self {
        Self { client }
    }

    pub async fn search(&self, query: &str, page: u32, limit: u32) -> Result<Value> {
        let url = format!(
            "{}/anime?q={}&page={}&limit={}",
            JIKAN_API,
            urlencoding::encode(query),
            page,
            limit
        );
        self.get_json(&url).await
    }

    pub async fn top(&self, page: u32, limit: u32) -> Result<Value> {
        let url = format!("{}/top/anime?page={}&limit={}", JIKAN_API, page, limit);
        self.get_json(&url).await
    }

    /// Full detail record for one anime, or `None` when Jikan does not
    /// know the id.
    pub async fn get_full(&self, anime_id: i64) -> Result<Option<Value>> {
        let url = format!("{}/anime/{}/full", JIKAN_API, anime_id);
        let response = self.client.get(&url).send().await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow::anyhow!("Jikan API error: {} - {}", status, body));
        }

        let body: Value = response.json().await?;
        Ok(Some(body))
    }

    async fn get_json(&self, url: &str) -> Result<Value> {
        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow::anyhow!("Jikan API error: {} - {}", status, body));
        }

        let body: Value = response.json().await?;
        Ok(body)
    }
}
