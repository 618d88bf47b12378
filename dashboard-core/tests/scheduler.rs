//! Refresh loop behaviour, driven on tokio's paused clock.

mod common;

use std::{sync::Arc, time::Duration};

use common::{Failure, MockClient, RecordingSink, SinkEvent, next_error, next_snapshot};
use dashboard_core::{
    Location, RefreshScheduler, SchedulerHandle, SchedulerSettings, SchedulerState, Units,
};
use tokio::{sync::mpsc, task::JoinHandle, time::Instant};

const INTERVAL: Duration = Duration::from_secs(60);

fn start(
    client: Arc<MockClient>,
    city: &str,
) -> (SchedulerHandle, mpsc::UnboundedReceiver<SinkEvent>, JoinHandle<()>) {
    let (sink, events) = RecordingSink::new();
    let settings = SchedulerSettings {
        interval: INTERVAL,
        call_timeout: Duration::from_secs(10),
        refresh_on_start: true,
    };
    let (scheduler, handle) =
        RefreshScheduler::new(client, Box::new(sink), Location::new(city, Units::Metric), settings);

    (handle, events, tokio::spawn(scheduler.run()))
}

async fn wait_for_state(handle: &SchedulerHandle, state: SchedulerState) {
    while handle.state() != state {
        tokio::task::yield_now().await;
    }
}

#[tokio::test(start_paused = true)]
async fn renders_snapshot_then_refreshes_every_interval() {
    let client = Arc::new(MockClient::healthy());
    let (handle, mut events, task) = start(client.clone(), "Poipet");

    let first = next_snapshot(&mut events).await;
    assert_eq!(first.current.location_name, "Poipet");
    assert_eq!(first.daily.len(), 2);
    assert_eq!(first.hourly.len(), 4);
    assert_eq!(handle.state(), SchedulerState::Idle);

    let armed_at = Instant::now();
    let second = next_snapshot(&mut events).await;
    assert!(armed_at.elapsed() >= INTERVAL);
    assert!(second.fetched_at >= first.fetched_at);
    assert_eq!(client.current_calls(), 2);

    handle.stop();
    task.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn failing_quote_still_renders_with_placeholder() {
    let client = Arc::new(MockClient { fail_quote: true, ..MockClient::healthy() });
    let (handle, mut events, task) = start(client, "Poipet");

    let snapshot = next_snapshot(&mut events).await;
    assert!(snapshot.quote.is_placeholder());
    assert_eq!(snapshot.daily.len(), 2);

    handle.stop();
    task.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn failing_icon_only_affects_its_own_slot() {
    let client =
        Arc::new(MockClient { failing_icons: vec!["10d".into()], ..MockClient::healthy() });
    let (handle, mut events, task) = start(client.clone(), "Poipet");

    let snapshot = next_snapshot(&mut events).await;
    assert!(snapshot.icons.get("10d").is_placeholder());
    assert!(!snapshot.icons.get("02d").is_placeholder());
    assert!(!snapshot.current_icon().is_placeholder());
    // current + two distinct daily icons
    assert_eq!(client.icon_calls(), 3);

    handle.stop();
    task.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn failing_current_reports_error_and_rearms() {
    let client =
        Arc::new(MockClient { fail_current: Some(Failure::Transport), ..MockClient::healthy() });
    let (handle, mut events, task) = start(client.clone(), "Poipet");

    let message = next_error(&mut events).await;
    assert!(message.starts_with("Failed to retrieve data"));
    // Nothing past the required fetches ran: no reduction, no icons.
    assert_eq!(client.icon_calls(), 0);

    let armed_at = Instant::now();
    next_error(&mut events).await;
    assert!(armed_at.elapsed() >= INTERVAL);
    assert_eq!(client.current_calls(), 2);

    handle.stop();
    task.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn unknown_city_is_reported() {
    let client =
        Arc::new(MockClient { fail_current: Some(Failure::NotFound), ..MockClient::healthy() });
    let (handle, mut events, task) = start(client, "Atlantis");

    let message = next_error(&mut events).await;
    assert!(message.contains("Atlantis"));

    handle.stop();
    task.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn failing_forecast_aborts_cycle() {
    let client = Arc::new(MockClient { fail_forecast: true, ..MockClient::healthy() });
    let (handle, mut events, task) = start(client.clone(), "Poipet");

    let message = next_error(&mut events).await;
    assert!(message.contains("Unexpected response"));
    assert_eq!(client.icon_calls(), 0);

    handle.stop();
    task.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn empty_city_makes_no_calls_and_rearms() {
    let client = Arc::new(MockClient::healthy());
    let (handle, mut events, task) = start(client.clone(), "   ");

    assert_eq!(next_error(&mut events).await, "Please enter a city name.");
    assert_eq!(client.calls.total(), 0);

    next_error(&mut events).await;
    assert_eq!(client.calls.total(), 0);

    handle.stop();
    task.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn triggers_during_a_cycle_collapse_into_one() {
    let client = Arc::new(MockClient { delay: Duration::from_secs(5), ..MockClient::healthy() });
    let (handle, mut events, task) = start(client.clone(), "Poipet");

    wait_for_state(&handle, SchedulerState::Refreshing).await;
    handle.refresh();
    handle.refresh();
    handle.search("Paris");

    let first = next_snapshot(&mut events).await;
    assert_eq!(first.location.city, "Poipet");

    let started = Instant::now();
    let second = next_snapshot(&mut events).await;
    assert_eq!(second.location.city, "Paris");
    // The queued cycle ran straight away, not after a full interval.
    assert!(started.elapsed() < INTERVAL);

    assert_eq!(client.current_calls(), 2);
    assert_eq!(client.max_in_flight(), 1);

    handle.stop();
    task.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn unit_change_triggers_refresh() {
    let client = Arc::new(MockClient::healthy());
    let (handle, mut events, task) = start(client, "Poipet");

    let first = next_snapshot(&mut events).await;
    assert_eq!(first.units, Units::Metric);

    let started = Instant::now();
    handle.set_units(Units::Imperial);
    let second = next_snapshot(&mut events).await;

    assert!(started.elapsed() < INTERVAL);
    assert_eq!(second.units, Units::Imperial);
    assert!(second.daily.iter().all(|d| d.range_label.ends_with("°F")));
    assert_eq!(handle.location().units, Units::Imperial);

    handle.stop();
    task.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn stop_while_idle_ends_loop_and_closes_sink() {
    let client = Arc::new(MockClient::healthy());
    let (handle, mut events, task) = start(client.clone(), "Poipet");

    next_snapshot(&mut events).await;
    handle.stop();
    task.await.unwrap();

    assert!(handle.is_stopped());
    assert!(matches!(events.recv().await, Some(SinkEvent::Closed)));
    assert!(events.recv().await.is_none());
    assert_eq!(client.current_calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn stop_mid_cycle_renders_nothing() {
    let client = Arc::new(MockClient { delay: Duration::from_secs(5), ..MockClient::healthy() });
    let (handle, mut events, task) = start(client, "Poipet");

    wait_for_state(&handle, SchedulerState::Refreshing).await;
    handle.stop();
    task.await.unwrap();

    assert!(matches!(events.recv().await, Some(SinkEvent::Closed)));
    assert!(events.recv().await.is_none());
    assert_eq!(handle.state(), SchedulerState::Idle);
}

#[tokio::test(start_paused = true)]
async fn waits_one_interval_when_not_refreshing_on_start() {
    let client = Arc::new(MockClient::healthy());
    let (sink, mut events) = RecordingSink::new();
    let settings = SchedulerSettings { refresh_on_start: false, ..SchedulerSettings::default() };
    let (scheduler, handle) = RefreshScheduler::new(
        client,
        Box::new(sink),
        Location::new("Poipet", Units::Metric),
        settings.clone(),
    );
    let task = tokio::spawn(scheduler.run());

    let started = Instant::now();
    next_snapshot(&mut events).await;
    assert!(started.elapsed() >= settings.interval);

    handle.stop();
    task.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn stopped_resolves_for_every_handle_clone() {
    let client = Arc::new(MockClient::healthy());
    let (handle, mut events, task) = start(client, "Poipet");
    next_snapshot(&mut events).await;

    let watcher = handle.clone();
    let waiting = tokio::spawn(async move { watcher.stopped().await });
    tokio::task::yield_now().await;
    assert!(!waiting.is_finished());

    handle.stop();
    waiting.await.unwrap();
    task.await.unwrap();
    assert!(handle.is_stopped());
}
