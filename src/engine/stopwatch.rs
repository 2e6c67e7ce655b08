use std::time::{Duration, Instant};

/// Wall-clock span from the first child/sandbox start to a terminal outcome
#[derive(Debug, Clone, Copy, Default)]
pub struct Stopwatch {
    started: Option<Instant>,
}

impl Stopwatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the start; later calls keep the first instant
    pub fn start(&mut self) {
        self.started.get_or_insert_with(Instant::now);
    }

    /// Elapsed time up to `end`, zero if never started
    pub fn until(&self, end: Instant) -> Duration {
        self.started
            .map(|started| end.saturating_duration_since(started))
            .unwrap_or(Duration::ZERO)
    }

    pub fn elapsed(&self) -> Duration {
        self.until(Instant::now())
    }
}
