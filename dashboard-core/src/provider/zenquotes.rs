use reqwest::Client;
use serde::Deserialize;

use crate::{DashboardError, model::Quote, provider::truncate_body};

pub const DEFAULT_BASE: &str = "https://zenquotes.io/api";

#[derive(Debug, Clone)]
pub struct ZenQuotesClient {
    base: String,
    http: Client,
}

impl ZenQuotesClient {
    pub fn new(http: Client) -> Self {
        Self { base: DEFAULT_BASE.to_string(), http }
    }

    pub fn with_base(mut self, base: &str) -> Self {
        self.base = base.trim_end_matches('/').to_string();
        self
    }

    pub async fn fetch_quote(&self) -> Result<Quote, DashboardError> {
        let url = format!("{}/random", self.base);

        let res = self.http.get(&url).send().await.map_err(|e| {
            DashboardError::Transport(format!("Failed to send request to ZenQuotes: {e}"))
        })?;

        let status = res.status();
        let body = res.text().await.map_err(|e| {
            DashboardError::Transport(format!("Failed to read ZenQuotes response body: {e}"))
        })?;

        if !status.is_success() {
            return Err(DashboardError::Transport(format!(
                "ZenQuotes request failed with status {status}: {}",
                truncate_body(&body),
            )));
        }

        parse_quote(&body)
    }
}

#[derive(Debug, Deserialize)]
struct ZqQuote {
    q: String,
    a: String,
}

/// The endpoint answers with a one-element list.
fn parse_quote(body: &str) -> Result<Quote, DashboardError> {
    let parsed: Vec<ZqQuote> = serde_json::from_str(body)
        .map_err(|e| DashboardError::Parse(format!("ZenQuotes response: {e}")))?;

    parsed
        .into_iter()
        .next()
        .map(|zq| Quote { text: zq.q, author: zq.a })
        .ok_or_else(|| DashboardError::Parse("ZenQuotes returned no quote".into()))
}
