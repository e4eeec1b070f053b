use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use clap::ValueEnum;
use serde::Deserialize;

/// Default number of timed repetitions averaged by `BenchMarker`.
pub const DEFAULT_REPETITIONS: usize = 10;

/// Something that can be benchmarked by calling it repeatedly.
///
/// Implementors may fail; a failure aborts the measurement session.
pub trait Benchmarkable {
    fn benchmark(&mut self) -> anyhow::Result<()>;
}

/// The unit of work being timed. Exactly one kind is active at a time.
pub enum Workload {
    Benchmarkable(Box<dyn Benchmarkable>),
    Runnable(Box<dyn FnMut()>),
}

impl Workload {
    pub fn benchmarkable(b: impl Benchmarkable + 'static) -> Self {
        Workload::Benchmarkable(Box::new(b))
    }

    pub fn runnable(f: impl FnMut() + 'static) -> Self {
        Workload::Runnable(Box::new(f))
    }

    /// Executes the workload once.
    pub fn execute(&mut self) -> anyhow::Result<()> {
        match self {
            Workload::Benchmarkable(b) => b.benchmark(),
            Workload::Runnable(f) => {
                f();
                Ok(())
            }
        }
    }
}

impl fmt::Debug for Workload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Workload::Benchmarkable(_) => f.write_str("Workload::Benchmarkable(..)"),
            Workload::Runnable(_) => f.write_str("Workload::Runnable(..)"),
        }
    }
}

/// Result of one measurement session
#[derive(Debug, Clone)]
pub struct Measurement {
    /// Elapsed time of each timed repetition, in execution order.
    pub samples: Vec<Duration>,
    pub started_at: DateTime<Utc>,
    /// True for `measure_once` runs, which skip the warm-up.
    pub single_shot: bool,
}

impl Measurement {
    pub fn repetitions(&self) -> usize {
        self.samples.len()
    }

    /// Arithmetic mean of all samples in nanoseconds. Zero for an empty session.
    pub fn mean_nanos(&self) -> f64 {
        if self.samples.is_empty() {
            return 0.0;
        }
        let sum: f64 = self.samples.iter().map(|d| d.as_nanos() as f64).sum();
        sum / self.samples.len() as f64
    }

    pub fn mean_millis(&self) -> f64 {
        self.mean_nanos() * 1e-6
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Default,
    Detailed,
    Json,
}
