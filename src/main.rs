use std::path::PathBuf;
use std::process;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use benchmarker::command::CommandWorkload;
use benchmarker::config::Config;
use benchmarker::display;
use benchmarker::timer::{self, BenchMarker};
use benchmarker::types::{OutputFormat, Workload};

#[derive(Parser)]
#[command(
    name = "benchmarker",
    version,
    about = "Time a command: one warm-up run, then the average of N runs"
)]
struct Cli {
    /// Number of timed repetitions (default 10)
    #[arg(short = 'n', long)]
    repetitions: Option<usize>,

    /// Run once without warm-up (fast, less precise)
    #[arg(long)]
    once: bool,

    #[arg(long)]
    format: Option<OutputFormat>,

    #[arg(long, conflicts_with = "format")]
    json: bool,

    /// Config file (default: <config dir>/benchmarker/config.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Command to benchmark followed by its arguments
    #[arg(
        required = true,
        trailing_var_arg = true,
        allow_hyphen_values = true,
        num_args = 1..
    )]
    command: Vec<String>,
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::load_default()?,
    };

    let format = if cli.json {
        OutputFormat::Json
    } else {
        config.resolve_format(cli.format)
    };

    let mut argv = cli.command.into_iter();
    let program = argv
        .next()
        .ok_or_else(|| anyhow::anyhow!("Usage: benchmarker [OPTIONS] <COMMAND> [ARGS]..."))?;
    let command = CommandWorkload::new(program, argv.collect());
    tracing::debug!(program = command.program(), "benchmarking command");

    let measurement = if cli.once {
        let mut workload = Workload::benchmarkable(command);
        timer::time_once(&mut workload)?
    } else {
        let repetitions = config.resolve_repetitions(cli.repetitions);
        let mut marker =
            BenchMarker::new(repetitions)?.with_workload(Workload::benchmarkable(command));
        marker.run_session()?
    };

    let output = match format {
        OutputFormat::Default => {
            format!("{}\n", display::format_result(measurement.mean_nanos()))
        }
        OutputFormat::Detailed => display::format_detailed(&measurement),
        OutputFormat::Json => format!("{}\n", display::format_json(&measurement)),
    };
    print!("{}", output);

    Ok(())
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = run() {
        eprintln!("{}", display::format_error(&err));
        process::exit(1);
    }
}
