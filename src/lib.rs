//! Simple benchmarker for small running-time measurements.
//!
//! Give a [`BenchMarker`](timer::BenchMarker) a closure or a
//! [`Benchmarkable`](types::Benchmarkable) and call `measure()`: the workload
//! runs once untimed as a warm-up, then `repetitions` more times, and the mean
//! running time is reported in milliseconds.
//!
//! ```
//! use benchmarker::timer::BenchMarker;
//!
//! let mut marker = BenchMarker::new(5).unwrap();
//! marker.set_runnable(|| {
//!     let _v: Vec<u64> = (0..1_000).collect();
//! });
//! let m = marker.measure().unwrap();
//! assert_eq!(m.repetitions(), 5);
//! ```

pub mod command;
pub mod config;
pub mod display;
pub mod errors;
pub mod timer;
pub mod types;
