//! Test doubles shared by the integration tests.

#![allow(dead_code)]

use std::{
    sync::atomic::{AtomicUsize, Ordering},
    time::Duration,
};

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime, TimeZone, Utc};
use dashboard_core::{
    CurrentConditions, DashboardError, DashboardSnapshot, DataClient, ForecastPoint, Location,
    PresentationSink, Quote,
};
use tokio::sync::mpsc;

pub fn at(date: &str, hour: u32) -> NaiveDateTime {
    NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap().and_hms_opt(hour, 0, 0).unwrap()
}

/// Mon 2024-01-01 / Tue 2024-01-02, one midday sample each.
pub fn sample_forecast() -> Vec<ForecastPoint> {
    let p = |date: &str, hour: u32, temp: f64, min: f64, max: f64, icon: &str| ForecastPoint {
        at: at(date, hour),
        temperature: temp,
        temp_min: min,
        temp_max: max,
        icon: icon.to_string(),
    };

    vec![
        p("2024-01-01", 0, 10.0, 9.0, 11.0, "01n"),
        p("2024-01-01", 3, 12.0, 11.0, 13.0, "01n"),
        p("2024-01-01", 12, 18.0, 14.0, 20.0, "02d"),
        p("2024-01-02", 0, 9.0, 8.0, 10.0, "01n"),
        p("2024-01-02", 12, 16.0, 11.0, 19.0, "10d"),
    ]
}

#[derive(Debug, Default)]
pub struct Calls {
    pub current: AtomicUsize,
    pub forecast: AtomicUsize,
    pub quote: AtomicUsize,
    pub icon: AtomicUsize,
}

impl Calls {
    pub fn total(&self) -> usize {
        self.current.load(Ordering::SeqCst)
            + self.forecast.load(Ordering::SeqCst)
            + self.quote.load(Ordering::SeqCst)
            + self.icon.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, Copy)]
pub enum Failure {
    NotFound,
    Transport,
}

/// Scriptable in-memory provider.
#[derive(Debug, Default)]
pub struct MockClient {
    pub fail_current: Option<Failure>,
    pub fail_forecast: bool,
    pub fail_quote: bool,
    pub failing_icons: Vec<String>,
    /// Every call sleeps this long first.
    pub delay: Duration,
    pub forecast: Vec<ForecastPoint>,
    pub calls: Calls,
    pub in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
}

impl MockClient {
    pub fn healthy() -> Self {
        Self { forecast: sample_forecast(), ..Self::default() }
    }

    pub fn current_calls(&self) -> usize {
        self.calls.current.load(Ordering::SeqCst)
    }

    pub fn icon_calls(&self) -> usize {
        self.calls.icon.load(Ordering::SeqCst)
    }

    /// Highest number of concurrently running current-conditions fetches.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    async fn pause(&self) {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
    }
}

#[async_trait]
impl DataClient for MockClient {
    async fn fetch_current(&self, location: &Location) -> Result<CurrentConditions, DashboardError> {
        self.calls.current.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        self.pause().await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        match self.fail_current {
            Some(Failure::NotFound) => return Err(DashboardError::NotFound(location.city.clone())),
            Some(Failure::Transport) => {
                return Err(DashboardError::Transport("connection reset".into()));
            }
            None => {}
        }

        Ok(CurrentConditions {
            location_name: location.city.clone(),
            temperature: 21.5,
            feels_like: 20.0,
            description: "scattered clouds".into(),
            icon: "03d".into(),
            wind_speed: 3.6,
            humidity_pct: 64,
            sunrise: Utc.with_ymd_and_hms(2024, 1, 1, 6, 12, 0).unwrap(),
            sunset: Utc.with_ymd_and_hms(2024, 1, 1, 17, 48, 0).unwrap(),
        })
    }

    async fn fetch_forecast(
        &self,
        _location: &Location,
    ) -> Result<Vec<ForecastPoint>, DashboardError> {
        self.calls.forecast.fetch_add(1, Ordering::SeqCst);
        self.pause().await;

        if self.fail_forecast {
            return Err(DashboardError::Parse("forecast list missing".into()));
        }
        Ok(self.forecast.clone())
    }

    async fn fetch_quote(&self) -> Result<Quote, DashboardError> {
        self.calls.quote.fetch_add(1, Ordering::SeqCst);
        self.pause().await;

        if self.fail_quote {
            return Err(DashboardError::Transport("quote service unavailable".into()));
        }
        Ok(Quote { text: "Keep going.".into(), author: "Someone".into() })
    }

    async fn fetch_icon(&self, icon: &str) -> Result<Vec<u8>, DashboardError> {
        self.calls.icon.fetch_add(1, Ordering::SeqCst);
        self.pause().await;

        if self.failing_icons.iter().any(|f| f == icon) {
            return Err(DashboardError::Transport(format!("icon {icon} unavailable")));
        }
        Ok(icon.as_bytes().to_vec())
    }
}

#[derive(Debug)]
pub enum SinkEvent {
    Rendered(Box<DashboardSnapshot>),
    Error(String),
    Closed,
}

/// Forwards everything it is given to the test.
pub struct RecordingSink {
    events: mpsc::UnboundedSender<SinkEvent>,
}

impl RecordingSink {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<SinkEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { events: tx }, rx)
    }
}

#[async_trait]
impl PresentationSink for RecordingSink {
    async fn render(&mut self, snapshot: DashboardSnapshot) {
        let _ = self.events.send(SinkEvent::Rendered(Box::new(snapshot)));
    }

    async fn render_error(&mut self, message: String) {
        let _ = self.events.send(SinkEvent::Error(message));
    }

    async fn close(&mut self) {
        let _ = self.events.send(SinkEvent::Closed);
    }
}

pub async fn next_snapshot(events: &mut mpsc::UnboundedReceiver<SinkEvent>) -> DashboardSnapshot {
    match events.recv().await {
        Some(SinkEvent::Rendered(snapshot)) => *snapshot,
        other => panic!("expected a rendered snapshot, got {other:?}"),
    }
}

pub async fn next_error(events: &mut mpsc::UnboundedReceiver<SinkEvent>) -> String {
    match events.recv().await {
        Some(SinkEvent::Error(message)) => message,
        other => panic!("expected an error report, got {other:?}"),
    }
}
