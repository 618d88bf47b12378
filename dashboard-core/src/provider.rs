use crate::{
    Config, DashboardError,
    model::{CurrentConditions, ForecastPoint, Location, Quote},
    provider::{openweather::OpenWeatherClient, zenquotes::ZenQuotesClient},
};
use async_trait::async_trait;
use reqwest::Client;
use std::{fmt::Debug, time::Duration};

pub mod openweather;
pub mod zenquotes;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderId {
    OpenWeather,
    ZenQuotes,
}

impl ProviderId {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderId::OpenWeather => "openweather",
            ProviderId::ZenQuotes => "zenquotes",
        }
    }
}

impl std::fmt::Display for ProviderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The four remote resources a refresh cycle needs.
///
/// Implementations only fetch and parse; they never retry. Retrying is the
/// scheduler's next cycle.
#[async_trait]
pub trait DataClient: Send + Sync + Debug {
    async fn fetch_current(&self, location: &Location) -> Result<CurrentConditions, DashboardError>;

    /// Chronological 3-hourly samples. An empty feed is not an error.
    async fn fetch_forecast(&self, location: &Location)
    -> Result<Vec<ForecastPoint>, DashboardError>;

    async fn fetch_quote(&self) -> Result<Quote, DashboardError>;

    /// Raw image bytes for a provider icon code.
    async fn fetch_icon(&self, icon: &str) -> Result<Vec<u8>, DashboardError>;
}

/// [`DataClient`] backed by OpenWeather and ZenQuotes over HTTP.
#[derive(Debug, Clone)]
pub struct HttpDataClient {
    weather: OpenWeatherClient,
    quotes: ZenQuotesClient,
}

impl HttpDataClient {
    pub fn new(weather: OpenWeatherClient, quotes: ZenQuotesClient) -> Self {
        Self { weather, quotes }
    }
}

#[async_trait]
impl DataClient for HttpDataClient {
    async fn fetch_current(&self, location: &Location) -> Result<CurrentConditions, DashboardError> {
        self.weather.fetch_current(location).await
    }

    async fn fetch_forecast(
        &self,
        location: &Location,
    ) -> Result<Vec<ForecastPoint>, DashboardError> {
        self.weather.fetch_forecast(location).await
    }

    async fn fetch_quote(&self) -> Result<Quote, DashboardError> {
        self.quotes.fetch_quote().await
    }

    async fn fetch_icon(&self, icon: &str) -> Result<Vec<u8>, DashboardError> {
        self.weather.fetch_icon(icon).await
    }
}

/// Shared HTTP client; every request is bounded by `timeout`.
pub fn build_http_client(timeout: Duration) -> anyhow::Result<Client> {
    Client::builder()
        .timeout(timeout)
        .user_agent(concat!("weather-dashboard/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| anyhow::anyhow!("Failed to create HTTP client: {e}"))
}

/// Construct the HTTP data client from config.
pub fn data_client_from_config(config: &Config) -> anyhow::Result<HttpDataClient> {
    let api_key = config.openweather_api_key().ok_or_else(|| {
        anyhow::anyhow!(
            "No API key configured for provider '{}'.\n\
                 Hint: run `dashboard configure` or set {}.",
            ProviderId::OpenWeather,
            crate::config::API_KEY_ENV,
        )
    })?;

    let http = build_http_client(config.request_timeout())?;

    let mut weather = OpenWeatherClient::new(http.clone(), api_key);
    if let Some(base) = config.base_url(ProviderId::OpenWeather) {
        weather = weather.with_api_base(base);
    }
    if let Some(base) = config.icon_base_url() {
        weather = weather.with_icon_base(base);
    }

    let mut quotes = ZenQuotesClient::new(http);
    if let Some(base) = config.base_url(ProviderId::ZenQuotes) {
        quotes = quotes.with_base(base);
    }

    Ok(HttpDataClient::new(weather, quotes))
}

/// Trim an error body for inclusion in a message.
pub(crate) fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}
