use std::time::Duration;

use tokio::time::Instant;

/// The instant after which workers stop starting new cycles. Computed once
/// per run and copied into every worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deadline {
    at: Instant,
}

impl Deadline {
    /// `None` when `start + duration` does not fit in an [`Instant`].
    #[must_use]
    pub fn after(start: Instant, duration: Duration) -> Option<Self> {
        start.checked_add(duration).map(|at| Self { at })
    }

    #[must_use]
    pub fn has_elapsed(&self) -> bool {
        Instant::now() >= self.at
    }

    #[must_use]
    pub const fn instant(&self) -> Instant {
        self.at
    }
}
