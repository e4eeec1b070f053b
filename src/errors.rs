use std::path::PathBuf;
use std::process::ExitStatus;

#[derive(thiserror::Error, Debug)]
pub enum BenchmarkError {
    #[error("No workload configured. Set a runnable or benchmarkable before measuring")]
    MissingWorkload,

    #[error("Repetitions must be at least 1 (got {value})")]
    InvalidRepetitions { value: usize },

    #[error("Workload failed during warm-up: {source}")]
    WarmUpFailed {
        #[source]
        source: anyhow::Error,
    },

    #[error("Workload failed on repetition {repetition}: {source}")]
    WorkloadFailed {
        repetition: usize,
        #[source]
        source: anyhow::Error,
    },

    #[error("Failed to read config file {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {detail}")]
    ConfigParse { path: PathBuf, detail: String },

    #[error("Failed to start '{program}': {source}")]
    CommandSpawn {
        program: String,
        source: std::io::Error,
    },

    #[error("'{program}' exited with {status}")]
    CommandFailed { program: String, status: ExitStatus },
}
