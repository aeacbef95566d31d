//! Debounce scheduler — trailing-edge quiescence timer with one slot.
//!
//! DESIGN
//! ======
//! The scheduler is a single optional deadline owned by the engine task.
//! Arming it again overwrites the deadline, which is how a burst of edits
//! collapses into one evaluation. `wait` is polled from the engine's
//! `select!` loop, so there is no timer task to cancel.

use std::time::Duration;

use tokio::time::Instant;

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(500);

#[derive(Debug)]
pub struct Debouncer {
    window: Duration,
    deadline: Option<Instant>,
}

impl Debouncer {
    #[must_use]
    pub fn new(window: Duration) -> Self {
        Self { window, deadline: None }
    }

    #[must_use]
    pub fn window(&self) -> Duration {
        self.window
    }

    /// Restart the quiescence window from now.
    pub fn arm(&mut self) {
        self.arm_at(Instant::now());
    }

    /// Restart the window from `now`.
    fn arm_at(&mut self, now: Instant) {
        self.deadline = Some(now + self.window);
    }

    pub fn disarm(&mut self) {
        self.deadline = None;
    }

    #[must_use]
    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    #[must_use]
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Resolve when the armed deadline passes. Never resolves while disarmed.
    pub async fn wait(&self) {
        match self.deadline {
            Some(deadline) => tokio::time::sleep_until(deadline).await,
            None => std::future::pending().await,
        }
    }
}

impl Default for Debouncer {
    fn default() -> Self {
        Self::new(DEFAULT_DEBOUNCE)
    }
}

#[cfg(test)]
#[path = "debounce_test.rs"]
mod tests;
