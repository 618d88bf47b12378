//! Reduction of the raw 3-hourly forecast feed into display-ready aggregates.
//!
//! Pure and deterministic: no I/O, no clock. Input order is time order and is
//! preserved in both outputs.

use std::collections::HashSet;

use chrono::Timelike;

use crate::model::{DailySummary, ForecastPoint, HourlyPoint, Units};

/// Hour of day whose sample represents the whole day.
pub const REPRESENTATIVE_HOUR: u32 = 12;
pub const MAX_DAILY_SUMMARIES: usize = 5;
/// Four samples on the feed's 3-hour cadence cover roughly the next 12 hours.
pub const HOURLY_POINTS: usize = 4;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ReducedForecast {
    pub daily: Vec<DailySummary>,
    pub hourly: Vec<HourlyPoint>,
}

pub fn reduce(points: &[ForecastPoint], units: Units) -> ReducedForecast {
    ReducedForecast { daily: daily_summaries(points, units), hourly: hourly_points(points, units) }
}

/// First midday sample of each date, at most [`MAX_DAILY_SUMMARIES`].
///
/// A date without a midday sample is skipped, not backfilled.
pub fn daily_summaries(points: &[ForecastPoint], units: Units) -> Vec<DailySummary> {
    let mut seen = HashSet::new();
    let mut daily = Vec::with_capacity(MAX_DAILY_SUMMARIES);

    for point in points {
        if daily.len() == MAX_DAILY_SUMMARIES {
            break;
        }

        let date = point.at.date();
        if point.at.hour() != REPRESENTATIVE_HOUR || !seen.insert(date) {
            continue;
        }

        daily.push(DailySummary {
            date,
            weekday: date.format("%a").to_string(),
            icon: point.icon.clone(),
            temp_min: point.temp_min,
            temp_max: point.temp_max,
            range_label: format!("{:.0}/{:.0}{}", point.temp_min, point.temp_max, units.symbol()),
        });
    }

    daily
}

/// The first [`HOURLY_POINTS`] samples verbatim, across date boundaries.
pub fn hourly_points(points: &[ForecastPoint], units: Units) -> Vec<HourlyPoint> {
    points
        .iter()
        .take(HOURLY_POINTS)
        .map(|point| HourlyPoint {
            at: point.at,
            time_label: point.at.format("%H:%M").to_string(),
            temperature: point.temperature,
            temperature_label: format!("{:.1}{}", point.temperature, units.symbol()),
        })
        .collect()
}
