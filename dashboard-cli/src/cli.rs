use std::{io::BufRead, sync::Arc, thread};

use anyhow::{Context, anyhow};
use clap::{Parser, Subcommand};
use dashboard_core::{
    Config, Location, ProviderId, RefreshScheduler, RevealFrame, RevealPlan, SchedulerHandle,
    SchedulerSettings, Units, data_client_from_config, refresh_snapshot,
};
use inquire::{Password, Select, Text};
use tokio::sync::mpsc;

use crate::terminal::{TerminalSink, draw_frame};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "dashboard", version, about = "Live weather dashboard")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Set the API key, default city and units.
    Configure,

    /// Fetch once and print the dashboard.
    Show {
        /// City name; defaults to the configured city.
        city: Option<String>,

        /// celsius/metric or fahrenheit/imperial.
        #[arg(long, short)]
        units: Option<Units>,
    },

    /// Live dashboard, refreshed on an interval.
    Watch {
        /// City name; defaults to the configured city.
        city: Option<String>,

        /// celsius/metric or fahrenheit/imperial.
        #[arg(long, short)]
        units: Option<Units>,

        /// Seconds between refreshes.
        #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
        interval: Option<u64>,
    },
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Configure => configure(),
            Command::Show { city, units } => {
                let config = Config::load()?;
                show(&config, resolve_location(&config, city, units)).await
            }
            Command::Watch { city, units, interval } => {
                let mut config = Config::load()?;
                if let Some(secs) = interval {
                    config.dashboard.refresh_interval_secs = secs;
                }
                watch(&config, resolve_location(&config, city, units)).await
            }
        }
    }
}

fn resolve_location(config: &Config, city: Option<String>, units: Option<Units>) -> Location {
    let city = city.unwrap_or_else(|| config.default_city().to_string());
    Location::new(city, units.unwrap_or(config.dashboard.units))
}

fn configure() -> anyhow::Result<()> {
    let mut config = Config::load()?;

    let api_key = Password::new("OpenWeather API key:")
        .without_confirmation()
        .with_help_message("Get one at https://openweathermap.org/api")
        .prompt()
        .context("Failed to read API key")?;
    if api_key.trim().is_empty() {
        return Err(anyhow!("API key must not be empty"));
    }
    config.upsert_provider_api_key(ProviderId::OpenWeather, api_key.trim().to_string());

    let city = Text::new("Default city:")
        .with_default(config.default_city())
        .prompt()
        .context("Failed to read default city")?;
    config.dashboard.default_city = Some(city.trim().to_string());

    let start = match config.dashboard.units {
        Units::Metric => 0,
        Units::Imperial => 1,
    };
    let units = Select::new("Units:", vec![Units::Metric, Units::Imperial])
        .with_starting_cursor(start)
        .prompt()
        .context("Failed to read units")?;
    config.dashboard.units = units;

    let path = config.save()?;
    println!("Saved configuration to {}", path.display());
    Ok(())
}

async fn show(config: &Config, location: Location) -> anyhow::Result<()> {
    let client = data_client_from_config(config)?;

    let snapshot = refresh_snapshot(&client, &location, config.request_timeout())
        .await
        .map_err(|e| anyhow!(e.user_message()))?;

    print!("{}", draw_frame(&snapshot, RevealFrame::complete(snapshot.hourly.len())));
    Ok(())
}

async fn watch(config: &Config, location: Location) -> anyhow::Result<()> {
    let client = Arc::new(data_client_from_config(config)?);
    let sink = TerminalSink::new(RevealPlan::default());

    let (scheduler, handle) = RefreshScheduler::new(
        client,
        Box::new(sink),
        location,
        SchedulerSettings::from(config),
    );
    let scheduler = tokio::spawn(scheduler.run());

    let input = tokio::spawn(read_commands(handle.clone(), stdin_lines()));

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Interrupted, shutting down");
            handle.stop();
        }
        _ = handle.stopped() => {}
    }

    input.abort();
    scheduler.await.context("Refresh scheduler panicked")?;
    Ok(())
}

/// Lines typed on stdin, read on a plain thread the runtime does not wait for
/// on shutdown.
fn stdin_lines() -> mpsc::UnboundedReceiver<String> {
    let (tx, rx) = mpsc::unbounded_channel();

    thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            match line {
                Ok(line) => {
                    if tx.send(line).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    tracing::warn!("Failed to read input: {}", e);
                    break;
                }
            }
        }
    });

    rx
}

/// A line from the user while watching.
#[derive(Debug, PartialEq, Eq)]
enum Input {
    Search(String),
    Units(Units),
    ToggleUnits,
    Refresh,
    Quit,
    Nothing,
}

fn parse_input(line: &str) -> Input {
    match line.trim() {
        "" => Input::Nothing,
        ":q" | ":quit" => Input::Quit,
        ":r" | ":refresh" => Input::Refresh,
        ":u" => Input::ToggleUnits,
        ":c" => Input::Units(Units::Metric),
        ":f" => Input::Units(Units::Imperial),
        city => Input::Search(city.to_string()),
    }
}

async fn read_commands(handle: SchedulerHandle, mut lines: mpsc::UnboundedReceiver<String>) {
    loop {
        let line = tokio::select! {
            _ = handle.stopped() => break,
            line = lines.recv() => match line {
                Some(line) => line,
                None => break,
            },
        };

        match parse_input(&line) {
            Input::Search(city) => handle.search(&city),
            Input::Units(units) => handle.set_units(units),
            Input::ToggleUnits => handle.set_units(handle.location().units.toggled()),
            Input::Refresh => handle.refresh(),
            Input::Quit => {
                handle.stop();
                break;
            }
            Input::Nothing => {}
        }
    }
}
