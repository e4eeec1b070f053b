use std::io::{self, Write};
use std::time::{Duration, Instant};

use chrono::Utc;

use crate::display::format_result;
use crate::errors::BenchmarkError;
use crate::types::{Benchmarkable, DEFAULT_REPETITIONS, Measurement, Workload};

/// Upper bound on samples reserved up front; larger sessions grow on push.
const MAX_PREALLOCATED_SAMPLES: usize = 4096;

/// Runs a workload `repetitions + 1` times and reports the average running time.
///
/// The first execution is a warm-up whose timing is discarded, so one-time
/// costs like lazy initialization do not pollute the mean.
#[derive(Debug)]
pub struct BenchMarker {
    workload: Option<Workload>,
    repetitions: usize,
}

impl Default for BenchMarker {
    fn default() -> Self {
        BenchMarker {
            workload: None,
            repetitions: DEFAULT_REPETITIONS,
        }
    }
}

impl BenchMarker {
    pub fn new(repetitions: usize) -> Result<Self, BenchmarkError> {
        let mut marker = BenchMarker::default();
        marker.set_repetitions(repetitions)?;
        Ok(marker)
    }

    pub fn with_workload(mut self, workload: Workload) -> Self {
        self.workload = Some(workload);
        self
    }

    /// Replaces the active workload, whichever kind it was.
    pub fn set_workload(&mut self, workload: Workload) {
        self.workload = Some(workload);
    }

    pub fn set_benchmarkable(&mut self, b: impl Benchmarkable + 'static) {
        self.set_workload(Workload::benchmarkable(b));
    }

    pub fn set_runnable(&mut self, f: impl FnMut() + 'static) {
        self.set_workload(Workload::runnable(f));
    }

    pub fn set_repetitions(&mut self, repetitions: usize) -> Result<(), BenchmarkError> {
        if repetitions == 0 {
            return Err(BenchmarkError::InvalidRepetitions { value: repetitions });
        }
        self.repetitions = repetitions;
        Ok(())
    }

    pub fn repetitions(&self) -> usize {
        self.repetitions
    }

    pub fn has_workload(&self) -> bool {
        self.workload.is_some()
    }

    /// Runs the full warm-up + averaged protocol and prints the result to stdout.
    pub fn measure(&mut self) -> Result<Measurement, BenchmarkError> {
        self.measure_to(&mut io::stdout().lock())
    }

    /// Like [`measure`](Self::measure), writing the report line to `out`.
    ///
    /// A failure to write the report is logged and does not discard the measurement.
    pub fn measure_to<W: Write>(&mut self, out: &mut W) -> Result<Measurement, BenchmarkError> {
        let measurement = self.run_session()?;
        report(out, &measurement);
        Ok(measurement)
    }

    /// Runs the protocol without reporting anything.
    pub fn run_session(&mut self) -> Result<Measurement, BenchmarkError> {
        let repetitions = self.repetitions;
        let workload = self.workload.as_mut().ok_or_else(|| {
            tracing::error!("measurement requested without a workload");
            BenchmarkError::MissingWorkload
        })?;

        let started_at = Utc::now();

        // Warm-up: absorbs first-call costs, timing is discarded.
        workload.execute().map_err(|source| {
            tracing::error!(error = %source, "warm-up failed");
            BenchmarkError::WarmUpFailed { source }
        })?;

        let mut samples = Vec::with_capacity(repetitions.min(MAX_PREALLOCATED_SAMPLES));
        for repetition in 0..repetitions {
            let elapsed = time_execution(workload).map_err(|source| {
                tracing::error!(repetition, error = %source, "workload failed");
                BenchmarkError::WorkloadFailed { repetition, source }
            })?;
            tracing::debug!(repetition, elapsed_ns = elapsed.as_nanos() as u64, "repetition done");
            samples.push(elapsed);
        }

        let measurement = Measurement {
            samples,
            started_at,
            single_shot: false,
        };
        tracing::info!(
            repetitions,
            mean_ms = measurement.mean_millis(),
            "measurement finished"
        );
        Ok(measurement)
    }
}

/// Single-shot measurement: executes `workload` exactly once, no warm-up,
/// and prints the elapsed time to stdout. Faster but less accurate than
/// [`BenchMarker::measure`].
pub fn measure_once(workload: &mut Workload) -> Result<Measurement, BenchmarkError> {
    let measurement = time_once(workload)?;
    report(&mut io::stdout().lock(), &measurement);
    Ok(measurement)
}

/// Silent variant of [`measure_once`].
pub fn time_once(workload: &mut Workload) -> Result<Measurement, BenchmarkError> {
    let started_at = Utc::now();
    let elapsed = time_execution(workload).map_err(|source| {
        tracing::error!(error = %source, "single-shot workload failed");
        BenchmarkError::WorkloadFailed {
            repetition: 0,
            source,
        }
    })?;
    tracing::debug!(elapsed_ns = elapsed.as_nanos() as u64, "single-shot done");

    Ok(Measurement {
        samples: vec![elapsed],
        started_at,
        single_shot: true,
    })
}

fn time_execution(workload: &mut Workload) -> anyhow::Result<Duration> {
    let start = Instant::now();
    workload.execute()?;
    Ok(start.elapsed())
}

fn report<W: Write>(out: &mut W, measurement: &Measurement) {
    if let Err(err) = writeln!(out, "{}", format_result(measurement.mean_nanos())) {
        tracing::warn!(error = %err, "failed to write measurement report");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;
    use std::thread;

    fn counting_runnable() -> (Rc<Cell<usize>>, Workload) {
        let calls = Rc::new(Cell::new(0));
        let counter = Rc::clone(&calls);
        let workload = Workload::runnable(move || counter.set(counter.get() + 1));
        (calls, workload)
    }

    struct FailsOnCall {
        calls: usize,
        fail_on: usize,
    }

    impl Benchmarkable for FailsOnCall {
        fn benchmark(&mut self) -> anyhow::Result<()> {
            self.calls += 1;
            if self.calls == self.fail_on {
                anyhow::bail!("call {} failed", self.calls);
            }
            Ok(())
        }
    }

    #[test]
    fn test_default_repetitions() {
        assert_eq!(BenchMarker::default().repetitions(), DEFAULT_REPETITIONS);
        assert_eq!(DEFAULT_REPETITIONS, 10);
    }

    #[test]
    fn test_zero_repetitions_rejected() {
        assert!(matches!(
            BenchMarker::new(0),
            Err(BenchmarkError::InvalidRepetitions { value: 0 })
        ));

        let mut marker = BenchMarker::new(3).unwrap();
        assert!(marker.set_repetitions(0).is_err());
        assert_eq!(marker.repetitions(), 3);
    }

    #[test]
    fn test_single_repetition_runs_warm_up_plus_one() {
        let (calls, workload) = counting_runnable();
        let mut marker = BenchMarker::new(1).unwrap().with_workload(workload);
        let m = marker.run_session().unwrap();
        assert_eq!(calls.get(), 2);
        assert_eq!(m.repetitions(), 1);
    }

    #[test]
    fn test_noop_five_repetitions_prints_template() {
        let (calls, workload) = counting_runnable();
        let mut marker = BenchMarker::new(5).unwrap().with_workload(workload);
        let mut out = Vec::new();
        let m = marker.measure_to(&mut out).unwrap();

        assert_eq!(calls.get(), 6);
        assert_eq!(m.samples.len(), 5);
        assert!(!m.single_shot);
        assert!(m.mean_millis() >= 0.0);

        let line = String::from_utf8(out).unwrap();
        let value = line
            .strip_prefix("The method took ")
            .and_then(|rest| rest.strip_suffix(" ms to execute\n"))
            .unwrap_or_else(|| panic!("unexpected report line: {line:?}"));
        let parsed: f64 = value.parse().unwrap();
        assert_eq!(parsed, m.mean_millis());
    }

    #[test]
    fn test_stores_n_samples_and_reports_their_mean() {
        let mut marker = BenchMarker::new(4).unwrap();
        marker.set_runnable(|| thread::sleep(Duration::from_millis(2)));
        let m = marker.run_session().unwrap();

        assert_eq!(m.samples.len(), 4);
        assert!(m.samples.iter().all(|d| *d >= Duration::from_millis(2)));
        let expected: f64 = m.samples.iter().map(|d| d.as_nanos() as f64).sum::<f64>() / 4.0;
        assert_eq!(m.mean_nanos(), expected);
    }

    #[test]
    fn test_warm_up_excluded_from_mean() {
        let first = Rc::new(Cell::new(true));
        let flag = Rc::clone(&first);
        let mut marker = BenchMarker::new(3).unwrap();
        marker.set_runnable(move || {
            if flag.replace(false) {
                thread::sleep(Duration::from_millis(200));
            } else {
                thread::sleep(Duration::from_millis(1));
            }
        });

        let m = marker.run_session().unwrap();
        assert!(!first.get());
        // A leaked 200ms warm-up would push the mean of 3 samples above 66ms.
        assert!(m.mean_millis() < 50.0, "mean too high: {}", m.mean_millis());
        assert!(m.samples.iter().all(|d| *d < Duration::from_millis(150)));
    }

    #[test]
    fn test_measure_prints_to_stdout_and_returns_measurement() {
        let (calls, workload) = counting_runnable();
        let mut marker = BenchMarker::new(3).unwrap().with_workload(workload);
        let m = marker.measure().unwrap();
        assert_eq!(calls.get(), 4);
        assert_eq!(m.repetitions(), 3);
        assert!(!m.single_shot);
        assert!(m.mean_millis() >= 0.0);
    }

    #[test]
    fn test_huge_repetition_count_does_not_reserve_upfront() {
        let mut marker = BenchMarker::new(usize::MAX).unwrap();
        // Call 1 is the warm-up, call 3 is the second timed repetition.
        marker.set_benchmarkable(FailsOnCall {
            calls: 0,
            fail_on: 3,
        });
        match marker.run_session() {
            Err(BenchmarkError::WorkloadFailed { repetition, .. }) => assert_eq!(repetition, 1),
            other => panic!("expected WorkloadFailed, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_workload_fails_fast() {
        let mut marker = BenchMarker::new(5).unwrap();
        assert!(!marker.has_workload());
        let mut out = Vec::new();
        let err = marker.measure_to(&mut out).unwrap_err();
        assert!(matches!(err, BenchmarkError::MissingWorkload));
        assert!(out.is_empty());
    }

    #[test]
    fn test_setting_benchmarkable_replaces_runnable() {
        let (calls, workload) = counting_runnable();
        let mut marker = BenchMarker::new(2).unwrap().with_workload(workload);
        marker.set_benchmarkable(FailsOnCall {
            calls: 0,
            fail_on: usize::MAX,
        });
        marker.run_session().unwrap();
        assert_eq!(calls.get(), 0);
    }

    #[test]
    fn test_workload_error_aborts_with_repetition_index() {
        let mut marker = BenchMarker::new(5).unwrap();
        // Call 1 is the warm-up, call 3 is repetition index 1.
        marker.set_benchmarkable(FailsOnCall {
            calls: 0,
            fail_on: 3,
        });
        match marker.run_session() {
            Err(BenchmarkError::WorkloadFailed { repetition, source }) => {
                assert_eq!(repetition, 1);
                assert_eq!(source.to_string(), "call 3 failed");
            }
            other => panic!("expected WorkloadFailed, got {other:?}"),
        }
    }

    #[test]
    fn test_warm_up_error_aborts_session() {
        let mut marker = BenchMarker::new(5).unwrap();
        marker.set_benchmarkable(FailsOnCall {
            calls: 0,
            fail_on: 1,
        });
        assert!(matches!(
            marker.run_session(),
            Err(BenchmarkError::WarmUpFailed { .. })
        ));
    }

    #[test]
    fn test_repeated_measurements_are_independent() {
        let mut marker = BenchMarker::new(5).unwrap();
        marker.set_runnable(|| thread::sleep(Duration::from_millis(2)));

        let first = marker.run_session().unwrap();
        let second = marker.run_session().unwrap();

        assert_eq!(first.samples.len(), 5);
        assert_eq!(second.samples.len(), 5);
        for m in [&first, &second] {
            assert!(m.mean_millis() >= 2.0);
            assert!(m.mean_millis() < 200.0, "mean out of bounds: {}", m.mean_millis());
        }
    }

    #[test]
    fn test_measure_once_runs_exactly_once() {
        let (calls, mut workload) = counting_runnable();
        let m = time_once(&mut workload).unwrap();
        assert_eq!(calls.get(), 1);
        assert_eq!(m.repetitions(), 1);
        assert!(m.single_shot);
    }

    #[test]
    fn test_measure_once_prints_and_runs_once() {
        let (calls, mut workload) = counting_runnable();
        measure_once(&mut workload).unwrap();
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_measure_once_reports_failure() {
        let mut workload = Workload::benchmarkable(FailsOnCall {
            calls: 0,
            fail_on: 1,
        });
        assert!(matches!(
            time_once(&mut workload),
            Err(BenchmarkError::WorkloadFailed { repetition: 0, .. })
        ));
    }
}
