use async_trait::async_trait;

use crate::model::DashboardSnapshot;

/// Consumer of refresh results.
///
/// `render` takes ownership of a complete snapshot and must return without
/// waiting on visual pacing; animated reveal runs on its own task (see
/// [`crate::reveal`]) and is superseded by the next `render`.
#[async_trait]
pub trait PresentationSink: Send {
    async fn render(&mut self, snapshot: DashboardSnapshot);

    /// A failed cycle, as a single human-readable message.
    async fn render_error(&mut self, message: String);

    /// The dashboard is shutting down; stop any running reveal.
    async fn close(&mut self) {}
}
