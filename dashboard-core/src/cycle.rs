//! One refresh cycle: fan out to the providers, fan in, reduce, assemble.

use std::{future::Future, time::Duration};

use chrono::Utc;
use futures::future::join_all;

use crate::{
    DashboardError,
    model::{DashboardSnapshot, IconImage, IconSet, Location, Quote},
    provider::DataClient,
    reducer,
};

/// Build a fresh snapshot for `location`.
///
/// Current conditions and forecast are required; any failure there fails the
/// cycle. The quote and icons are optional and fall back to placeholders.
pub async fn refresh_snapshot(
    client: &dyn DataClient,
    location: &Location,
    call_timeout: Duration,
) -> Result<DashboardSnapshot, DashboardError> {
    if location.is_empty() {
        return Err(DashboardError::empty_city());
    }

    let (current, forecast, quote) = tokio::join!(
        bounded(call_timeout, client.fetch_current(location)),
        bounded(call_timeout, client.fetch_forecast(location)),
        bounded(call_timeout, client.fetch_quote()),
    );

    let current = current?;
    let forecast = forecast?;
    let quote = quote.unwrap_or_else(|e| {
        tracing::warn!("Quote unavailable, using placeholder: {}", e);
        Quote::placeholder()
    });

    let reduced = reducer::reduce(&forecast, location.units);

    let mut codes = vec![current.icon.clone()];
    for day in &reduced.daily {
        if !codes.contains(&day.icon) {
            codes.push(day.icon.clone());
        }
    }
    let icons = fetch_icons(client, codes, call_timeout).await;

    Ok(DashboardSnapshot {
        location: location.clone(),
        units: location.units,
        current,
        daily: reduced.daily,
        hourly: reduced.hourly,
        quote,
        icons,
        fetched_at: Utc::now(),
    })
}

/// Fetch each icon concurrently; a failed icon becomes a placeholder.
async fn fetch_icons(
    client: &dyn DataClient,
    codes: Vec<String>,
    call_timeout: Duration,
) -> IconSet {
    let fetches = codes.into_iter().map(move |code| async move {
        let image = match bounded(call_timeout, client.fetch_icon(&code)).await {
            Ok(bytes) => IconImage::Image(bytes),
            Err(e) => {
                tracing::warn!("Icon '{}' unavailable, using placeholder: {}", code, e);
                IconImage::Placeholder
            }
        };
        (code, image)
    });

    join_all(fetches).await.into_iter().collect()
}

async fn bounded<T>(
    limit: Duration,
    call: impl Future<Output = Result<T, DashboardError>>,
) -> Result<T, DashboardError> {
    tokio::time::timeout(limit, call).await.unwrap_or_else(|_| {
        Err(DashboardError::Transport(format!("request timed out after {limit:?}")))
    })
}
