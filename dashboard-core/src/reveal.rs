//! Incremental reveal of a rendered snapshot.
//!
//! A [`RevealPlan`] turns a snapshot into a sequence of frames going from
//! "nothing shown" to "fully shown": icons fade in first, then the trend line
//! gains one point per step. [`spawn_reveal`] plays the frames on a tokio task
//! so the caller never blocks on animation pacing.

use std::{sync::Arc, time::Duration};

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::model::DashboardSnapshot;

/// What is visible at one point of the reveal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RevealFrame {
    /// 0.0 = hidden, 1.0 = fully drawn.
    pub icon_opacity: f32,
    /// How many hourly points of the trend line are drawn.
    pub trend_points: usize,
}

impl RevealFrame {
    pub const HIDDEN: RevealFrame = RevealFrame { icon_opacity: 0.0, trend_points: 0 };

    pub fn complete(trend_len: usize) -> Self {
        Self { icon_opacity: 1.0, trend_points: trend_len }
    }

    pub fn is_complete(&self, trend_len: usize) -> bool {
        self.icon_opacity >= 1.0 && self.trend_points >= trend_len
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RevealStep {
    /// Wait before drawing this frame.
    pub delay: Duration,
    pub frame: RevealFrame,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevealPlan {
    pub fade_steps: u32,
    pub fade_step: Duration,
    pub trend_step: Duration,
}

impl Default for RevealPlan {
    fn default() -> Self {
        Self {
            fade_steps: 10,
            fade_step: Duration::from_millis(30),
            trend_step: Duration::from_millis(100),
        }
    }
}

impl RevealPlan {
    /// Draws everything at once.
    pub fn instant() -> Self {
        Self { fade_steps: 0, fade_step: Duration::ZERO, trend_step: Duration::ZERO }
    }

    /// Frames for a trend of `trend_len` points. Both fields are
    /// non-decreasing and the last frame is complete.
    pub fn frames(&self, trend_len: usize) -> Vec<RevealStep> {
        let mut steps = Vec::with_capacity(self.fade_steps as usize + trend_len + 1);

        for i in 1..=self.fade_steps {
            steps.push(RevealStep {
                delay: if i == 1 { Duration::ZERO } else { self.fade_step },
                frame: RevealFrame {
                    icon_opacity: i as f32 / self.fade_steps as f32,
                    trend_points: 0,
                },
            });
        }

        if self.fade_steps == 0 {
            steps.push(RevealStep { delay: Duration::ZERO, frame: RevealFrame::complete(0) });
        }

        for n in 1..=trend_len {
            steps.push(RevealStep { delay: self.trend_step, frame: RevealFrame::complete(n) });
        }

        steps
    }
}

/// A reveal in progress. Dropping the handle cancels it.
#[derive(Debug)]
pub struct RevealHandle {
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl RevealHandle {
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Wait until the reveal has drawn its last frame or was cancelled.
    pub async fn finished(mut self) {
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                tracing::warn!("Reveal task ended abnormally: {}", e);
            }
        }
    }
}

impl Drop for RevealHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Play `plan` for `snapshot`, calling `draw` once per frame.
///
/// Must be called from within a tokio runtime.
pub fn spawn_reveal<F>(plan: &RevealPlan, snapshot: Arc<DashboardSnapshot>, mut draw: F) -> RevealHandle
where
    F: FnMut(&DashboardSnapshot, RevealFrame) + Send + 'static,
{
    let steps = plan.frames(snapshot.hourly.len());
    let cancel = CancellationToken::new();
    let token = cancel.clone();

    let task = tokio::spawn(async move {
        for step in steps {
            if !step.delay.is_zero() {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => return,
                    _ = tokio::time::sleep(step.delay) => {}
                }
            }
            if token.is_cancelled() {
                return;
            }
            draw(&snapshot, step.frame);
        }
    });

    RevealHandle { cancel, task: Some(task) }
}
