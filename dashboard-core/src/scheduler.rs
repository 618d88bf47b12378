//! The self-rescheduling refresh loop.
//!
//! ```text
//!   Idle --(interval elapsed | manual trigger)--> Refreshing
//!   Refreshing --(cycle done, ok or not)--> Idle   (next tick re-armed)
//! ```
//!
//! Only one cycle is ever in flight. Triggers that arrive while refreshing
//! collapse into a single queued refresh that starts as soon as the current
//! cycle ends.

use std::{sync::Arc, time::Duration};

use tokio::sync::{Notify, watch};
use tokio_util::sync::CancellationToken;

use crate::{
    Config,
    cycle::refresh_snapshot,
    model::{Location, Units},
    provider::DataClient,
    sink::PresentationSink,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    Refreshing,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchedulerSettings {
    /// Measured from the end of one cycle to the start of the next.
    pub interval: Duration,
    /// Bound on each provider call.
    pub call_timeout: Duration,
    /// Run the first cycle immediately instead of after one interval.
    pub refresh_on_start: bool,
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(60),
            call_timeout: Duration::from_secs(10),
            refresh_on_start: true,
        }
    }
}

impl From<&Config> for SchedulerSettings {
    fn from(config: &Config) -> Self {
        Self {
            interval: config.refresh_interval(),
            call_timeout: config.request_timeout(),
            refresh_on_start: true,
        }
    }
}

/// Control surface of a running [`RefreshScheduler`]. Cheap to clone.
#[derive(Debug, Clone)]
pub struct SchedulerHandle {
    location: Arc<watch::Sender<Location>>,
    trigger: Arc<Notify>,
    stop: CancellationToken,
    state: watch::Receiver<SchedulerState>,
}

impl SchedulerHandle {
    /// Look up a new city and refresh.
    pub fn search(&self, city: &str) {
        let city = city.trim().to_string();
        self.location.send_modify(|loc| loc.city = city);
        self.refresh();
    }

    /// Switch units; same as a manual refresh.
    pub fn set_units(&self, units: Units) {
        self.location.send_modify(|loc| loc.units = units);
        self.refresh();
    }

    /// Request a refresh now, or right after the cycle in progress.
    pub fn refresh(&self) {
        self.trigger.notify_one();
    }

    /// Stop the loop; nothing is rendered or rescheduled afterwards.
    pub fn stop(&self) {
        self.stop.cancel();
    }

    pub fn is_stopped(&self) -> bool {
        self.stop.is_cancelled()
    }

    /// Resolves once [`stop`](Self::stop) has been called from any handle.
    pub async fn stopped(&self) {
        self.stop.cancelled().await;
    }

    pub fn state(&self) -> SchedulerState {
        *self.state.borrow()
    }

    /// Location the next cycle will use.
    pub fn location(&self) -> Location {
        self.location.borrow().clone()
    }
}

pub struct RefreshScheduler {
    client: Arc<dyn DataClient>,
    sink: Box<dyn PresentationSink>,
    settings: SchedulerSettings,
    location: watch::Receiver<Location>,
    trigger: Arc<Notify>,
    stop: CancellationToken,
    state: watch::Sender<SchedulerState>,
}

impl RefreshScheduler {
    pub fn new(
        client: Arc<dyn DataClient>,
        sink: Box<dyn PresentationSink>,
        initial: Location,
        settings: SchedulerSettings,
    ) -> (Self, SchedulerHandle) {
        let (location_tx, location_rx) = watch::channel(initial);
        let (state_tx, state_rx) = watch::channel(SchedulerState::Idle);
        let trigger = Arc::new(Notify::new());
        let stop = CancellationToken::new();

        let handle = SchedulerHandle {
            location: Arc::new(location_tx),
            trigger: trigger.clone(),
            stop: stop.clone(),
            state: state_rx,
        };

        let scheduler = Self {
            client,
            sink,
            settings,
            location: location_rx,
            trigger,
            stop,
            state: state_tx,
        };

        (scheduler, handle)
    }

    /// Run until [`SchedulerHandle::stop`] is called.
    ///
    /// Errors never end the loop; they are reported to the sink and the next
    /// tick is armed as usual.
    pub async fn run(mut self) {
        let mut due_now = self.settings.refresh_on_start;

        loop {
            if !due_now {
                tokio::select! {
                    biased;
                    _ = self.stop.cancelled() => break,
                    _ = self.trigger.notified() => {
                        tracing::debug!("Manual refresh requested");
                    }
                    _ = tokio::time::sleep(self.settings.interval) => {
                        tracing::debug!("Refresh interval elapsed");
                    }
                }
            }
            due_now = false;

            if !self.cycle().await {
                break;
            }
        }

        self.state.send_replace(SchedulerState::Idle);
        self.sink.close().await;
        tracing::info!("Refresh scheduler stopped");
    }

    /// One Idle -> Refreshing -> Idle pass. Returns `false` once stopped.
    async fn cycle(&mut self) -> bool {
        self.state.send_replace(SchedulerState::Refreshing);
        let location = self.location.borrow_and_update().clone();
        tracing::info!("Refreshing dashboard for '{}' ({})", location.city, location.units);

        // Dropping the cycle future on stop abandons its in-flight requests.
        let outcome = tokio::select! {
            biased;
            _ = self.stop.cancelled() => return false,
            outcome = refresh_snapshot(
                self.client.as_ref(),
                &location,
                self.settings.call_timeout,
            ) => outcome,
        };

        if self.stop.is_cancelled() {
            return false;
        }

        match outcome {
            Ok(snapshot) => {
                tracing::info!(
                    "Refreshed '{}': {} day(s), {} hourly point(s)",
                    snapshot.current.location_name,
                    snapshot.daily.len(),
                    snapshot.hourly.len(),
                );
                self.sink.render(snapshot).await;
            }
            Err(e) => {
                tracing::error!("Refresh for '{}' failed: {}", location.city, e);
                self.sink.render_error(e.user_message()).await;
            }
        }

        self.state.send_replace(SchedulerState::Idle);
        true
    }
}
