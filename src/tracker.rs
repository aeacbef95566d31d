//! Request cancellation manager — one outstanding preview request, tagged
//! with a generation token.
//!
//! DESIGN
//! ======
//! `begin` aborts whatever is outstanding and hands out the next generation.
//! The caller spawns the request and attaches its `AbortHandle`. Aborting the
//! task drops the in-flight HTTP future, so a cancelled request never reports
//! back. A completion is accepted by `settle` only if its generation is the
//! one still outstanding; anything else is stale and ignored.

use tokio::task::AbortHandle;
use tracing::debug;

#[derive(Debug)]
struct Outstanding {
    generation: u64,
    abort: Option<AbortHandle>,
}

#[derive(Debug, Default)]
pub struct RequestTracker {
    last_generation: u64,
    outstanding: Option<Outstanding>,
}

impl RequestTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancel the outstanding request, if any, and issue the next generation.
    pub fn begin(&mut self) -> u64 {
        self.cancel();
        self.last_generation += 1;
        self.outstanding = Some(Outstanding { generation: self.last_generation, abort: None });
        self.last_generation
    }

    /// Attach the task running `generation` so it can be aborted later.
    ///
    /// A handle for a generation that is no longer outstanding is aborted at once.
    pub fn attach(&mut self, generation: u64, abort: AbortHandle) {
        match &mut self.outstanding {
            Some(outstanding) if outstanding.generation == generation => outstanding.abort = Some(abort),
            _ => abort.abort(),
        }
    }

    /// Abort the outstanding request. Returns its generation.
    pub fn cancel(&mut self) -> Option<u64> {
        let outstanding = self.outstanding.take()?;
        if let Some(abort) = outstanding.abort {
            abort.abort();
        }
        debug!(generation = outstanding.generation, "preview request cancelled");
        Some(outstanding.generation)
    }

    /// Accept a completion if it belongs to the outstanding request.
    pub fn settle(&mut self, generation: u64) -> bool {
        if self.current() == Some(generation) {
            self.outstanding = None;
            return true;
        }
        debug!(generation, current = ?self.current(), "discarding stale preview response");
        false
    }

    #[must_use]
    pub fn is_in_flight(&self) -> bool {
        self.outstanding.is_some()
    }

    /// Generation of the outstanding request.
    #[must_use]
    pub fn current(&self) -> Option<u64> {
        self.outstanding.as_ref().map(|o| o.generation)
    }

    #[must_use]
    pub fn last_generation(&self) -> u64 {
        self.last_generation
    }
}

impl Drop for RequestTracker {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
#[path = "tracker_test.rs"]
mod tests;
