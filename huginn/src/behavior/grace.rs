//! Grace window during which the agent lets its body settle.
use std::time::Duration;

/// A window of time that started at `start` and lasts `duration`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingDelay {
    pub start: Duration,
    pub duration: Duration,
}

impl PendingDelay {
    #[must_use]
    pub fn end(&self) -> Duration {
        self.start + self.duration
    }

    #[must_use]
    pub fn is_active(&self, now: Duration) -> bool {
        now < self.end()
    }
}

/// While the window is open, fall detection and state reports are suppressed.
#[derive(Debug, Clone, Default)]
pub struct GraceWindow {
    pending: Option<PendingDelay>,
}

impl GraceWindow {
    /// Opens a window of `duration`, or extends the open one by `duration`.
    ///
    /// Extending adds to the remaining time instead of restarting the window.
    pub fn extend(&mut self, now: Duration, duration: Duration) {
        match &mut self.pending {
            Some(pending) if pending.is_active(now) => pending.duration += duration,
            _ => {
                self.pending = Some(PendingDelay {
                    start: now,
                    duration,
                });
            }
        }

        tracing::debug!(end = ?self.end(), "grace window extended");
    }

    #[must_use]
    pub fn is_active(&self, now: Duration) -> bool {
        self.pending.is_some_and(|pending| pending.is_active(now))
    }

    /// End of the last window that was opened.
    #[must_use]
    pub fn end(&self) -> Option<Duration> {
        self.pending.as_ref().map(PendingDelay::end)
    }
}
