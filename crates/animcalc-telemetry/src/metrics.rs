//! Counters for calculation traffic.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use animcalc_core::Operator;

/// Lock-free counters for served calculations.
///
/// Owned by whoever serves requests; the calculation core never reads it.
#[derive(Debug, Default)]
pub struct CalculationMetrics {
    total_calculations: AtomicU64,
    total_errors: AtomicU64,
    by_operator: [AtomicU64; Operator::ALL.len()],
}

impl CalculationMetrics {
    /// Creates zeroed counters.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a successful calculation.
    pub fn record_success(&self, operator: Operator) {
        self.total_calculations.fetch_add(1, Ordering::Relaxed);
        self.by_operator[slot(operator)].fetch_add(1, Ordering::Relaxed);
    }

    /// Records a failed calculation.
    pub fn record_error(&self) {
        self.total_errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Returns the number of successful calculations.
    #[must_use]
    pub fn calculations(&self) -> u64 {
        self.total_calculations.load(Ordering::Relaxed)
    }

    /// Returns the number of failed calculations.
    #[must_use]
    pub fn errors(&self) -> u64 {
        self.total_errors.load(Ordering::Relaxed)
    }

    /// Returns the number of successful calculations for one operator.
    #[must_use]
    pub fn by_operator(&self, operator: Operator) -> u64 {
        self.by_operator[slot(operator)].load(Ordering::Relaxed)
    }
}

fn slot(operator: Operator) -> usize {
    match operator {
        Operator::Add => 0,
        Operator::Subtract => 1,
        Operator::Multiply => 2,
        Operator::Divide => 3,
        Operator::Power => 4,
    }
}

/// Timer for measuring operation duration.
pub struct Timer {
    start: Instant,
    label: &'static str,
}

impl Timer {
    /// Starts a new timer.
    #[must_use]
    pub fn start(label: &'static str) -> Self {
        Self {
            start: Instant::now(),
            label,
        }
    }

    /// Returns the elapsed duration.
    #[must_use]
    pub fn elapsed_ms(&self) -> f64 {
        self.start.elapsed().as_secs_f64() * 1000.0
    }

    /// Stops the timer, logs and returns the elapsed milliseconds.
    pub fn stop(self) -> f64 {
        let elapsed = self.elapsed_ms();
        tracing::trace!(label = self.label, elapsed_ms = elapsed, "Timer stopped");
        elapsed
    }
}
