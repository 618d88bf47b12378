use std::{collections::BTreeMap, fmt, str::FromStr};

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::DashboardError;

/// Measurement system requested from the weather provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Units {
    #[default]
    Metric,
    Imperial,
}

impl Units {
    /// Value of the `units` query parameter.
    pub fn as_query(&self) -> &'static str {
        match self {
            Units::Metric => "metric",
            Units::Imperial => "imperial",
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Units::Metric => "°C",
            Units::Imperial => "°F",
        }
    }

    pub fn speed_unit(&self) -> &'static str {
        match self {
            Units::Metric => "m/s",
            Units::Imperial => "mph",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Units::Metric => "Celsius",
            Units::Imperial => "Fahrenheit",
        }
    }

    pub fn toggled(&self) -> Units {
        match self {
            Units::Metric => Units::Imperial,
            Units::Imperial => Units::Metric,
        }
    }
}

impl fmt::Display for Units {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Units {
    type Err = DashboardError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "metric" | "celsius" | "c" => Ok(Units::Metric),
            "imperial" | "fahrenheit" | "f" => Ok(Units::Imperial),
            _ => Err(DashboardError::Input(format!(
                "Unknown units '{value}'. Use celsius/metric or fahrenheit/imperial."
            ))),
        }
    }
}

/// What the user asked for: a city name and the units to show it in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub city: String,
    pub units: Units,
}

impl Location {
    pub fn new(city: impl AsRef<str>, units: Units) -> Self {
        Self { city: city.as_ref().trim().to_string(), units }
    }

    /// Blank cities count as empty; fields are public, so `new` is not the only way in.
    pub fn is_empty(&self) -> bool {
        self.city.trim().is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentConditions {
    pub location_name: String,
    pub temperature: f64,
    pub feels_like: f64,
    pub description: String,
    pub icon: String,
    pub wind_speed: f64,
    pub humidity_pct: u8,
    pub sunrise: DateTime<Utc>,
    pub sunset: DateTime<Utc>,
}

/// One raw sample of the 3-hourly forecast feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    pub at: NaiveDateTime,
    pub temperature: f64,
    pub temp_min: f64,
    pub temp_max: f64,
    pub icon: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DailySummary {
    pub date: NaiveDate,
    /// Short weekday name, e.g. `Mon`.
    pub weekday: String,
    pub icon: String,
    pub temp_min: f64,
    pub temp_max: f64,
    /// e.g. `14/20°C`
    pub range_label: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HourlyPoint {
    pub at: NaiveDateTime,
    /// `HH:MM`
    pub time_label: String,
    pub temperature: f64,
    pub temperature_label: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
    pub text: String,
    pub author: String,
}

impl Quote {
    const PLACEHOLDER_TEXT: &'static str = "No quote available right now.";

    /// Shown when the quote provider could not be reached.
    pub fn placeholder() -> Self {
        Self { text: Self::PLACEHOLDER_TEXT.to_string(), author: String::new() }
    }

    pub fn is_placeholder(&self) -> bool {
        *self == Self::placeholder()
    }
}

impl fmt::Display for Quote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.author.is_empty() {
            write!(f, "\"{}\"", self.text)
        } else {
            write!(f, "\"{}\" - {}", self.text, self.author)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum IconImage {
    Image(Vec<u8>),
    #[default]
    Placeholder,
}

impl IconImage {
    pub fn is_placeholder(&self) -> bool {
        matches!(self, IconImage::Placeholder)
    }
}

/// Icon images fetched during one cycle, keyed by provider icon code.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct IconSet {
    images: BTreeMap<String, IconImage>,
}

impl IconSet {
    pub fn insert(&mut self, code: impl Into<String>, image: IconImage) {
        self.images.insert(code.into(), image);
    }

    /// Unknown codes resolve to the placeholder.
    pub fn get(&self, code: &str) -> &IconImage {
        static PLACEHOLDER: IconImage = IconImage::Placeholder;
        self.images.get(code).unwrap_or(&PLACEHOLDER)
    }
}

impl FromIterator<(String, IconImage)> for IconSet {
    fn from_iter<T: IntoIterator<Item = (String, IconImage)>>(iter: T) -> Self {
        Self { images: iter.into_iter().collect() }
    }
}

/// Everything a renderer needs for one refresh cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardSnapshot {
    pub location: Location,
    pub units: Units,
    pub current: CurrentConditions,
    pub daily: Vec<DailySummary>,
    pub hourly: Vec<HourlyPoint>,
    pub quote: Quote,
    pub icons: IconSet,
    pub fetched_at: DateTime<Utc>,
}

impl DashboardSnapshot {
    pub fn current_icon(&self) -> &IconImage {
        self.icons.get(&self.current.icon)
    }
}
