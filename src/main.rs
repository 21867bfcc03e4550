//! prism-stream - Command line driver
//!
//! Reads CSV rows from a file or stdin, runs one aggregate over a length
//! window and prints the result after every event.

use anyhow::{Context, Result};
use clap::Parser;
use std::fs::File;
use std::io::{self, BufWriter, Read, Write};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use prism_stream::checkpoint::{decode, encode};
use prism_stream::{
    create_aggregator, AggregateKind, ColumnRefExpression, LengthWindow, LogicalType,
    SnapshotFormat, StreamConfig, Value, WindowSnapshot,
};

#[derive(Parser)]
#[command(name = "prism-stream")]
#[command(about = "Incremental window aggregation over CSV event streams")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    /// Aggregate function (sum, stdDev, avg, count, min, max)
    #[arg(short, long)]
    function: AggregateKind,

    /// Zero-based index of the aggregated column
    #[arg(short, long, default_value_t = 0)]
    column: usize,

    /// Declared type of the aggregated column (int, long, float, double, ...)
    #[arg(short = 't', long = "type", default_value = "double")]
    input_type: LogicalType,

    /// Window length in events (overrides the config file)
    #[arg(short, long)]
    window: Option<usize>,

    /// CSV input file (stdin if not specified)
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Treat the first CSV record as a header
    #[arg(long)]
    has_headers: bool,

    /// JSON configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write a checkpoint of the window after the input is consumed
    #[arg(long)]
    checkpoint_out: Option<PathBuf>,

    /// Restore the window from a checkpoint before reading input
    #[arg(long)]
    restore: Option<PathBuf>,

    /// Checkpoint format (overrides the config file)
    #[arg(long)]
    format: Option<SnapshotFormat>,
}

fn load_config(cli: &Cli) -> Result<StreamConfig> {
    let mut config = match &cli.config {
        Some(path) => StreamConfig::from_json_file(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => StreamConfig::default(),
    };
    if let Some(window) = cli.window {
        config.window_length = window;
    }
    if let Some(format) = cli.format {
        config.snapshot_format = format;
    }
    config.validate()?;
    Ok(config)
}

fn parse_row(record: &csv::StringRecord, column: usize, input_type: &LogicalType) -> Result<Vec<Value>> {
    if column >= record.len() {
        anyhow::bail!(
            "record {:?} has {} columns, column {} requested",
            record,
            record.len(),
            column
        );
    }
    record
        .iter()
        .enumerate()
        .map(|(index, field)| {
            if index == column {
                Ok(Value::parse_as(field.trim(), input_type)?)
            } else {
                Ok(Value::varchar(field))
            }
        })
        .collect()
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level)))
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let input = ColumnRefExpression::new(cli.column, format!("column{}", cli.column), cli.input_type.clone())
        .into_ref();
    let aggregator = create_aggregator(cli.function, &[input.clone()])?;
    let mut window = LengthWindow::new(config.window_length, input, vec![aggregator])?;

    if let Some(path) = &cli.restore {
        let bytes = std::fs::read(path)
            .with_context(|| format!("failed to read checkpoint {}", path.display()))?;
        let snapshot: WindowSnapshot = decode(&bytes, config.snapshot_format)?;
        window.restore(&snapshot)?;
        info!(
            path = %path.display(),
            events = window.len(),
            length = window.length(),
            "restored checkpoint"
        );
    }

    let source: Box<dyn Read> = match &cli.input {
        Some(path) => Box::new(
            File::open(path).with_context(|| format!("failed to open {}", path.display()))?,
        ),
        None => Box::new(io::stdin()),
    };
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(cli.has_headers)
        .from_reader(source);

    window.start();
    let mut out = BufWriter::new(io::stdout().lock());
    let mut events = 0usize;
    for record in reader.records() {
        let record = record.context("failed to read CSV record")?;
        let row = parse_row(&record, cli.column, &cli.input_type)?;
        for result in window.process(&row)? {
            writeln!(out, "{}", result)?;
        }
        events += 1;
    }
    out.flush()?;
    window.stop();
    info!(events, function = %cli.function, "input consumed");

    if let Some(path) = &cli.checkpoint_out {
        let bytes = encode(&window.snapshot(), config.snapshot_format)?;
        std::fs::write(path, bytes)
            .with_context(|| format!("failed to write checkpoint {}", path.display()))?;
        info!(path = %path.display(), format = %config.snapshot_format, "wrote checkpoint");
    }

    Ok(())
}
