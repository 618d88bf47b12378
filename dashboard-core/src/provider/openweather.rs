use chrono::{DateTime, NaiveDateTime, Utc};
use reqwest::{Client, StatusCode};
use serde::Deserialize;

use crate::{
    DashboardError,
    model::{CurrentConditions, ForecastPoint, Location},
    provider::truncate_body,
};

pub const DEFAULT_API_BASE: &str = "https://api.openweathermap.org/data/2.5";
pub const DEFAULT_ICON_BASE: &str = "https://openweathermap.org/img/wn";

/// Format of `dt_txt` in the forecast feed.
const FORECAST_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone)]
pub struct OpenWeatherClient {
    api_key: String,
    api_base: String,
    icon_base: String,
    http: Client,
}

impl OpenWeatherClient {
    pub fn new(http: Client, api_key: String) -> Self {
        Self {
            api_key,
            api_base: DEFAULT_API_BASE.to_string(),
            icon_base: DEFAULT_ICON_BASE.to_string(),
            http,
        }
    }

    pub fn with_api_base(mut self, base: &str) -> Self {
        self.api_base = base.trim_end_matches('/').to_string();
        self
    }

    pub fn with_icon_base(mut self, base: &str) -> Self {
        self.icon_base = base.trim_end_matches('/').to_string();
        self
    }

    pub async fn fetch_current(
        &self,
        location: &Location,
    ) -> Result<CurrentConditions, DashboardError> {
        let body = self.get_json_body("weather", location).await?;

        let parsed: OwCurrentResponse = serde_json::from_str(&body).map_err(|e| {
            DashboardError::Parse(format!("OpenWeather current response: {e}"))
        })?;

        let weather = parsed.weather.into_iter().next().ok_or_else(|| {
            DashboardError::Parse("OpenWeather current response has no weather entry".into())
        })?;

        Ok(CurrentConditions {
            location_name: parsed.name,
            temperature: parsed.main.temp,
            feels_like: parsed.main.feels_like,
            description: weather.description,
            icon: weather.icon,
            wind_speed: parsed.wind.speed,
            humidity_pct: parsed.main.humidity,
            sunrise: unix_to_utc(parsed.sys.sunrise)?,
            sunset: unix_to_utc(parsed.sys.sunset)?,
        })
    }

    pub async fn fetch_forecast(
        &self,
        location: &Location,
    ) -> Result<Vec<ForecastPoint>, DashboardError> {
        let body = self.get_json_body("forecast", location).await?;

        let parsed: OwForecastResponse = serde_json::from_str(&body).map_err(|e| {
            DashboardError::Parse(format!("OpenWeather forecast response: {e}"))
        })?;

        // Feed order is time order; keep it.
        parsed.list.into_iter().map(ForecastPoint::try_from).collect()
    }

    pub async fn fetch_icon(&self, icon: &str) -> Result<Vec<u8>, DashboardError> {
        let url = format!("{}/{}@2x.png", self.icon_base, icon);

        let res = self.http.get(&url).send().await.map_err(|e| {
            DashboardError::Transport(format!("Failed to fetch icon '{icon}': {e}"))
        })?;

        let status = res.status();
        if !status.is_success() {
            return Err(DashboardError::Transport(format!(
                "Icon '{icon}' request failed with status {status}"
            )));
        }

        let content_type = res
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);

        if let Some(ct) = content_type.as_deref().filter(|ct| !ct.starts_with("image/")) {
            return Err(DashboardError::Parse(format!(
                "Icon '{icon}' response is '{ct}', not an image"
            )));
        }

        let bytes = res.bytes().await.map_err(|e| {
            DashboardError::Transport(format!("Failed to read icon '{icon}' body: {e}"))
        })?;

        if bytes.is_empty() {
            return Err(DashboardError::Parse(format!("Icon '{icon}' response was empty")));
        }

        Ok(bytes.to_vec())
    }

    /// GET `{api_base}/{endpoint}` for a location and return the success body.
    async fn get_json_body(
        &self,
        endpoint: &str,
        location: &Location,
    ) -> Result<String, DashboardError> {
        let url = format!("{}/{}", self.api_base, endpoint);

        let res = self
            .http
            .get(&url)
            .query(&[
                ("q", location.city.as_str()),
                ("appid", self.api_key.as_str()),
                ("units", location.units.as_query()),
            ])
            .send()
            .await
            .map_err(|e| {
                DashboardError::Transport(format!(
                    "Failed to send request to OpenWeather ({endpoint}): {e}"
                ))
            })?;

        let status = res.status();
        let body = res.text().await.map_err(|e| {
            DashboardError::Transport(format!(
                "Failed to read OpenWeather {endpoint} response body: {e}"
            ))
        })?;

        if status == StatusCode::NOT_FOUND {
            return Err(DashboardError::NotFound(location.city.clone()));
        }

        if !status.is_success() {
            return Err(DashboardError::Transport(format!(
                "OpenWeather {endpoint} request failed with status {status}: {}",
                truncate_body(&body),
            )));
        }

        Ok(body)
    }
}

#[derive(Debug, Deserialize)]
struct OwMain {
    temp: f64,
    feels_like: f64,
    humidity: u8,
}

#[derive(Debug, Deserialize)]
struct OwWeather {
    description: String,
    icon: String,
}

#[derive(Debug, Deserialize)]
struct OwWind {
    speed: f64,
}

#[derive(Debug, Deserialize)]
struct OwSys {
    sunrise: i64,
    sunset: i64,
}

#[derive(Debug, Deserialize)]
struct OwCurrentResponse {
    name: String,
    main: OwMain,
    weather: Vec<OwWeather>,
    wind: OwWind,
    sys: OwSys,
}

#[derive(Debug, Deserialize)]
struct OwForecastMain {
    temp: f64,
    temp_min: f64,
    temp_max: f64,
}

#[derive(Debug, Deserialize)]
struct OwForecastWeather {
    icon: String,
}

#[derive(Debug, Deserialize)]
struct OwForecastEntry {
    dt_txt: String,
    main: OwForecastMain,
    weather: Vec<OwForecastWeather>,
}

#[derive(Debug, Deserialize)]
struct OwForecastResponse {
    #[serde(default)]
    list: Vec<OwForecastEntry>,
}

impl TryFrom<OwForecastEntry> for ForecastPoint {
    type Error = DashboardError;

    fn try_from(entry: OwForecastEntry) -> Result<Self, Self::Error> {
        let at = NaiveDateTime::parse_from_str(&entry.dt_txt, FORECAST_TIME_FORMAT).map_err(
            |e| DashboardError::Parse(format!("Bad forecast timestamp '{}': {e}", entry.dt_txt)),
        )?;

        let icon = entry.weather.into_iter().next().map(|w| w.icon).ok_or_else(|| {
            DashboardError::Parse(format!("Forecast entry {} has no weather entry", entry.dt_txt))
        })?;

        Ok(ForecastPoint {
            at,
            temperature: entry.main.temp,
            temp_min: entry.main.temp_min,
            temp_max: entry.main.temp_max,
            icon,
        })
    }
}

fn unix_to_utc(ts: i64) -> Result<DateTime<Utc>, DashboardError> {
    DateTime::<Utc>::from_timestamp(ts, 0)
        .ok_or_else(|| DashboardError::Parse(format!("Timestamp {ts} is out of range")))
}
