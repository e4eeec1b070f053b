use owo_colors::{OwoColorize, Stream, Style};
use serde::Serialize;

use crate::types::Measurement;

/// The report line: mean nanoseconds converted to milliseconds, default float formatting.
pub fn format_result(mean_nanos: f64) -> String {
    format!("The method took {} ms to execute", mean_nanos * 1e-6)
}

/// Error block printed when a session fails: a marker line, then the error
/// and its cause chain.
pub fn format_error(err: &anyhow::Error) -> String {
    format!("ERROR : \n{:?}", err)
}

fn style_header() -> Style {
    Style::new().cyan().bold()
}

/// Detailed format: header, one line per repetition, then the report line.
pub fn format_detailed(measurement: &Measurement) -> String {
    let mut out = String::new();

    let header = if measurement.single_shot {
        "Single-shot run (no warm-up)".to_string()
    } else {
        let n = measurement.repetitions();
        format!(
            "{} {} after 1 warm-up run",
            n,
            if n == 1 { "repetition" } else { "repetitions" }
        )
    };
    let header_style = style_header();
    out.push_str(
        &header
            .if_supports_color(Stream::Stdout, |s| s.style(header_style))
            .to_string(),
    );
    out.push('\n');

    let index_width = measurement.repetitions().saturating_sub(1).to_string().len();
    for (i, sample) in measurement.samples.iter().enumerate() {
        let idx_str = format!("{:>width$}", i, width = index_width);
        let ms = format!("{} ms", sample.as_nanos() as f64 * 1e-6);
        out.push_str(&format!(
            "  {}  {}\n",
            idx_str.if_supports_color(Stream::Stdout, |s| s.dimmed()),
            ms.if_supports_color(Stream::Stdout, |s| s.yellow())
        ));
    }

    out.push_str(&format_result(measurement.mean_nanos()));
    out.push('\n');
    out
}

#[derive(Serialize)]
struct JsonMeasurement {
    repetitions: usize,
    single_shot: bool,
    started_at: String,
    mean_ns: f64,
    mean_ms: f64,
    samples_ns: Vec<u64>,
}

pub fn format_json(measurement: &Measurement) -> String {
    let json = JsonMeasurement {
        repetitions: measurement.repetitions(),
        single_shot: measurement.single_shot,
        started_at: measurement
            .started_at
            .format("%Y-%m-%dT%H:%M:%SZ")
            .to_string(),
        mean_ns: measurement.mean_nanos(),
        mean_ms: measurement.mean_millis(),
        samples_ns: measurement
            .samples
            .iter()
            .map(|d| d.as_nanos() as u64)
            .collect(),
    };

    serde_json::to_string_pretty(&json).unwrap_or_else(|_| "{}".to_string())
}
