use std::time::{Duration, Instant};

/// Measures how long a stage of the run took.
pub struct Timer {
    start: Instant,
}

impl Timer {
    /// Start a new `Timer`.
    pub fn now() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Restart the timer from now.
    pub fn reset(&mut self) {
        self.start = Instant::now();
    }

    /// Time since the timer was last reset.
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Print the elapsed time for `stage` to stderr.
    pub fn print_elapsed(&self, stage: &str) {
        eprintln!("{} took {:?}", stage, self.elapsed());
    }
}
