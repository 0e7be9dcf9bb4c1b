use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::process;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use parbench::algorithms::Engine;
use parbench::capability::Capabilities;
use parbench::config::{self, BenchConfig};
use parbench::dataset::Seed;
use parbench::display::{self, JsonLinesSink, TextSink};
use parbench::runner::{RunSummary, Sink};
use parbench::types::{Backend, ExecutionMode, Operation, OutputFormat};
use parbench::workloads;

#[derive(Parser)]
#[command(
    name = "parbench",
    version,
    about = "Time standard algorithms across execution modes and backends"
)]
struct Cli {
    /// Elements per dataset
    #[arg(short, long, default_value_t = config::DEFAULT_SIZE)]
    size: usize,

    /// Trials per backend and mode
    #[arg(short, long, default_value_t = config::DEFAULT_REPEATS)]
    repeats: usize,

    #[arg(long, default_value_t = config::DEFAULT_SEED, conflicts_with = "random_seed")]
    seed: u64,

    /// Seed the generators from OS entropy
    #[arg(long)]
    random_seed: bool,

    /// Worker threads for the parallel modes (default: all cores)
    #[arg(short, long)]
    threads: Option<usize>,

    #[arg(long, value_enum)]
    backend: Vec<Backend>,

    #[arg(long, value_enum)]
    mode: Vec<ExecutionMode>,

    /// Run only these operations, in the given order
    #[arg(long, value_enum)]
    only: Vec<Operation>,

    /// Regenerate sort<f64> input into a new buffer every trial
    #[arg(long)]
    fresh_buffers: bool,

    /// Skip the vectorized modes
    #[arg(long)]
    no_simd: bool,

    #[arg(long, default_value = "default")]
    format: OutputFormat,

    #[arg(long)]
    json: bool,

    /// Write the report to a file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Print the capability matrix and exit
    #[arg(long)]
    list: bool,

    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn to_config(&self) -> BenchConfig {
        let defaults = BenchConfig::default();
        BenchConfig {
            size: self.size,
            repeats: self.repeats,
            seed: if self.random_seed {
                Seed::Entropy
            } else {
                Seed::Fixed(self.seed)
            },
            threads: self.threads,
            backends: or_default(&self.backend, defaults.backends),
            modes: or_default(&self.mode, defaults.modes),
            operations: or_default(&self.only, defaults.operations),
            simd: !self.no_simd,
            fresh_buffers: self.fresh_buffers,
        }
    }
}

fn or_default<T: PartialEq + Copy>(picked: &[T], default: Vec<T>) -> Vec<T> {
    if picked.is_empty() {
        default
    } else {
        config::dedup_in_order(picked)
    }
}

fn init_logging(verbose: bool) {
    let filter = if verbose { "parbench=debug" } else { "parbench=info" };
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(EnvFilter::new(filter))
        .with_target(false)
        .init();
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = cli.to_config();
    config.validate()?;

    let mut capabilities = Capabilities::detect();
    if !config.simd {
        capabilities = capabilities.without_simd();
    }
    let engine = Engine::new(capabilities, config.threads)?;

    let mut out: Box<dyn Write> = match &cli.output {
        Some(path) => Box::new(BufWriter::new(
            File::create(path).with_context(|| format!("cannot create {}", path.display()))?,
        )),
        None => Box::new(io::stdout().lock()),
    };

    if cli.list {
        let operations = if cli.only.is_empty() {
            Operation::ALL.to_vec()
        } else {
            config.operations.clone()
        };
        write!(
            out,
            "{}",
            display::format_capabilities(engine.capabilities(), engine.threads(), &operations)
        )?;
        out.flush()?;
        return Ok(());
    }

    info!(
        size = config.size,
        repeats = config.repeats,
        threads = engine.threads(),
        vector_bits = capabilities.vector_bits,
        "starting run"
    );

    let summary = if cli.json || cli.format == OutputFormat::Json {
        run_with(&engine, &config, JsonLinesSink::new(out))?
    } else {
        run_with(&engine, &config, TextSink::new(out))?
    };
    info!(trials = summary.trials, skipped = summary.skipped_modes, "done");

    Ok(())
}

fn run_with<S: Sink>(
    engine: &Engine,
    config: &BenchConfig,
    mut sink: S,
) -> Result<RunSummary> {
    Ok(workloads::run_suite(engine, config, &mut sink)?)
}

fn main() {
    if let Err(err) = run() {
        eprintln!("{}", err);
        process::exit(1);
    }
}
