use std::io::Write;
use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use owo_colors::{OwoColorize, Stream, Style};
use serde::Serialize;

use crate::capability::Capabilities;
use crate::errors::BenchError;
use crate::runner::{RunSummary, Sink};
use crate::types::{Backend, ElementKind, ExecutionMode, Measurement, Operation};

/// Milliseconds with six decimals, e.g. `"12.345678ms"`.
pub fn format_millis(elapsed: Duration) -> String {
    format!("{:.6}ms", millis(elapsed))
}

fn millis(elapsed: Duration) -> f64 {
    elapsed.as_nanos() as f64 / 1e6
}

fn style_tag() -> Style {
    Style::new().cyan().bold()
}

/// One report line for one trial:
/// `"{tag}: size = {n}  Result: {r}  Lowest: {lo}  Highest: {hi}  Time: {t}"`.
pub fn format_trial_line(measurement: &Measurement) -> String {
    let tag = measurement.tag();
    let tag_colored = tag
        .if_supports_color(Stream::Stdout, |s| s.style(style_tag()))
        .to_string();

    let time = format_millis(measurement.elapsed);
    let time_colored = time
        .if_supports_color(Stream::Stdout, |s| s.yellow())
        .to_string();

    let result = match measurement.sample.render() {
        Some(r) => format!("  Result: {}", r),
        None => String::new(),
    };

    format!(
        "{}: size = {}{}  Lowest: {}  Highest: {}  Time: {}",
        tag_colored,
        measurement.boundaries.size,
        result,
        measurement.boundaries.lowest,
        measurement.boundaries.highest,
        time_colored
    )
}

pub fn format_section_header(operation: Operation, element: ElementKind, size: usize) -> String {
    let header = format!("{} ({}, {} elements)", operation, element, size);
    header
        .if_supports_color(Stream::Stdout, |s| s.dimmed())
        .to_string()
}

pub fn format_summary(summary: &RunSummary) -> String {
    let line = format!(
        "{} trials across {} operations, {} skipped modes, {:.3}s timed",
        summary.trials,
        summary.operations,
        summary.skipped_modes,
        summary.timed.as_secs_f64()
    );
    line.if_supports_color(Stream::Stdout, |s| s.dimmed())
        .to_string()
}

/// Matrix of which modes each backend offers per operation.
pub fn format_capabilities(
    capabilities: &Capabilities,
    threads: usize,
    operations: &[Operation],
) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "vector width: {} bits{}, threads: {}\n\n",
        capabilities.vector_bits,
        if capabilities.simd_disabled { " (disabled)" } else { "" },
        threads
    ));

    let name_width = operations
        .iter()
        .map(|op| op.name().len())
        .max()
        .unwrap_or(0)
        .max("operation".len());

    out.push_str(&format!("{:<width$}", "operation", width = name_width));
    for backend in Backend::ALL {
        for mode in ExecutionMode::ALL {
            out.push_str(&format!("  {:<19}", format!("{} {}", backend, short_mode(mode))));
        }
    }
    out.push('\n');

    for &op in operations {
        out.push_str(&format!("{:<width$}", op.name(), width = name_width));
        for backend in Backend::ALL {
            for mode in ExecutionMode::ALL {
                let mark = if capabilities.supports(backend, op, mode) {
                    "yes"
                } else {
                    "-"
                };
                out.push_str(&format!("  {:<19}", mark));
            }
        }
        out.push('\n');
    }

    out
}

fn short_mode(mode: ExecutionMode) -> &'static str {
    match mode {
        ExecutionMode::Serial => "seq",
        ExecutionMode::SerialSimd => "unseq",
        ExecutionMode::Parallel => "par",
        ExecutionMode::ParallelSimd => "par_unseq",
    }
}

/// Human-readable report, one line per trial, flushed as it goes.
pub struct TextSink<W: Write> {
    out: W,
}

impl<W: Write> TextSink<W> {
    pub fn new(out: W) -> Self {
        TextSink { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Sink for TextSink<W> {
    fn begin(&mut self, operation: Operation, element: ElementKind, size: usize) -> Result<(), BenchError> {
        writeln!(self.out, "\n{}", format_section_header(operation, element, size))?;
        Ok(())
    }

    fn record(&mut self, measurement: &Measurement) -> Result<(), BenchError> {
        writeln!(self.out, "{}", format_trial_line(measurement))?;
        self.out.flush()?;
        Ok(())
    }

    fn finish(&mut self, summary: &RunSummary) -> Result<(), BenchError> {
        writeln!(self.out, "\n{}", format_summary(summary))?;
        self.out.flush()?;
        Ok(())
    }
}

/// JSON lines output: one object per trial.
#[derive(Serialize)]
struct JsonMeasurement<'a> {
    tag: String,
    operation: Operation,
    element: ElementKind,
    backend: Backend,
    mode: ExecutionMode,
    trial: usize,
    size: usize,
    result: Option<String>,
    index: Option<usize>,
    lowest: &'a str,
    highest: &'a str,
    elapsed_ms: f64,
    recorded_at: String,
}

pub fn format_json_line(measurement: &Measurement, now: DateTime<Utc>) -> String {
    let record = JsonMeasurement {
        tag: measurement.tag(),
        operation: measurement.operation,
        element: measurement.operation.element(),
        backend: measurement.backend,
        mode: measurement.mode,
        trial: measurement.trial,
        size: measurement.boundaries.size,
        result: measurement.sample.render(),
        index: measurement.sample.index(),
        lowest: &measurement.boundaries.lowest,
        highest: &measurement.boundaries.highest,
        elapsed_ms: millis(measurement.elapsed),
        recorded_at: now.to_rfc3339_opts(SecondsFormat::Micros, true),
    };
    // Every field is a plain scalar or string, serialization cannot fail.
    serde_json::to_string(&record).unwrap_or_default()
}

pub struct JsonLinesSink<W: Write> {
    out: W,
}

impl<W: Write> JsonLinesSink<W> {
    pub fn new(out: W) -> Self {
        JsonLinesSink { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Sink for JsonLinesSink<W> {
    fn record(&mut self, measurement: &Measurement) -> Result<(), BenchError> {
        writeln!(self.out, "{}", format_json_line(measurement, Utc::now()))?;
        self.out.flush()?;
        Ok(())
    }
}
