//! Core library for the live weather dashboard.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - The data client abstraction and its HTTP providers
//! - The forecast reducer and the refresh cycle
//! - The refresh scheduler and the presentation sink contract
//!
//! It is used by `dashboard-cli`, but any front-end that implements
//! [`PresentationSink`] can drive it.

pub mod config;
pub mod cycle;
pub mod error;
pub mod model;
pub mod provider;
pub mod reducer;
pub mod reveal;
pub mod scheduler;
pub mod sink;

pub use config::{Config, DashboardConfig, ProviderConfig};
pub use cycle::refresh_snapshot;
pub use error::DashboardError;
pub use model::{
    CurrentConditions, DailySummary, DashboardSnapshot, ForecastPoint, HourlyPoint, IconImage,
    IconSet, Location, Quote, Units,
};
pub use provider::{DataClient, HttpDataClient, ProviderId, data_client_from_config};
pub use reducer::{ReducedForecast, reduce};
pub use reveal::{RevealFrame, RevealHandle, RevealPlan, spawn_reveal};
pub use scheduler::{RefreshScheduler, SchedulerHandle, SchedulerSettings, SchedulerState};
pub use sink::PresentationSink;
