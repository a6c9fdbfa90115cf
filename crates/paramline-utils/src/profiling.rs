//! Lightweight profiling and timing utilities.

use std::time::{Duration, Instant};

/// Measures a span of work and reports it through [`tracing`] once, either
/// when [`SpanTimer::finish`] is called or when the timer is dropped.
#[derive(Debug)]
pub struct SpanTimer {
    label: &'static str,
    start: Instant,
    reported: bool,
}

impl SpanTimer {
    pub fn new(label: &'static str) -> Self {
        Self {
            label,
            start: Instant::now(),
            reported: false,
        }
    }

    pub fn label(&self) -> &'static str {
        self.label
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Finishes the span and returns its duration.
    pub fn finish(mut self) -> Duration {
        self.report()
    }

    fn report(&mut self) -> Duration {
        let duration = self.start.elapsed();
        if !self.reported {
            self.reported = true;
            tracing::trace!(
                target: "profiling",
                label = self.label,
                elapsed = ?duration,
                "span completed"
            );
        }
        duration
    }
}

impl Drop for SpanTimer {
    fn drop(&mut self) {
        self.report();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finish_reports_elapsed_time() {
        let timer = SpanTimer::new("test-span");
        assert_eq!(timer.label(), "test-span");
        let elapsed = timer.finish();
        assert!(elapsed >= Duration::ZERO);
    }
}
