use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use env_logger::Env;
use log::info;
use serde::Serialize;
use std::path::{Path, PathBuf};

use reciprocal_space::config::CodecConfig;
use reciprocal_space::ReflectionTable;

#[derive(Parser)]
#[command(name = "reciprocal-space")]
#[command(about = "Inspect and transform crystallographic reflection files")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Number of threads to use (default: all available cores)
    #[arg(short, long)]
    threads: Option<usize>,

    /// Coerce unknown column types on read and skip untagged columns on write
    #[arg(long)]
    skip_problem_types: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Summarize an MTZ file
    Info {
        input: PathBuf,

        /// Print the summary as JSON
        #[arg(long)]
        json: bool,
    },
    /// Map every reflection into the reciprocal asymmetric unit
    Asu {
        input: PathBuf,
        output: PathBuf,

        /// Keep Friedel mates in the minus half
        #[arg(long)]
        anomalous: bool,
    },
    /// Add a dHKL resolution column
    Dhkl { input: PathBuf, output: PathBuf },
    /// Export two columns as a SHELX HKL file
    Hkl {
        input: PathBuf,
        output: PathBuf,

        #[arg(long, default_value = "IMEAN")]
        value: String,

        #[arg(long, default_value = "SIGIMEAN")]
        sigma: String,

        /// Optional batch column
        #[arg(long)]
        batch: Option<String>,
    },
    /// Split Friedel-pair columns into one row per observation
    Unmerge {
        input: PathBuf,
        output: PathBuf,

        /// Plus columns, e.g. "I(+)"
        #[arg(long, num_args = 1.., required = true)]
        plus: Vec<String>,

        /// Minus columns, paired with --plus in order
        #[arg(long, num_args = 1.., required = true)]
        minus: Vec<String>,
    },
}

#[derive(Serialize)]
struct ColumnSummary {
    label: String,
    dtype: String,
    min: Option<f64>,
    max: Option<f64>,
}

#[derive(Serialize)]
struct Summary {
    path: String,
    reflections: usize,
    merged: bool,
    cell: Option<[f64; 6]>,
    spacegroup: Option<String>,
    columns: Vec<ColumnSummary>,
    batches: usize,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(log_level)).init();

    // Set thread pool size if specified
    if let Some(threads) = cli.threads {
        #[cfg(feature = "parallel")]
        {
            rayon::ThreadPoolBuilder::new()
                .num_threads(threads)
                .build_global()
                .context("Failed to set thread pool size")?;
            info!("Using {} threads", threads);
        }
        #[cfg(not(feature = "parallel"))]
        {
            log::warn!("Thread count {} specified but parallel feature not enabled. Ignoring.", threads);
        }
    }

    info!("Starting reciprocal-space v{}", reciprocal_space::VERSION);
    let config = CodecConfig::default().with_skip_problem_types(cli.skip_problem_types);

    match cli.command {
        Commands::Info { input, json } => info_command(&input, json, &config),
        Commands::Asu {
            input,
            output,
            anomalous,
        } => {
            let mut table = read(&input, &config)?;
            table.hkl_to_asu(anomalous)?;
            write(&table, &output, &config)
        }
        Commands::Dhkl { input, output } => {
            let mut table = read(&input, &config)?;
            table.compute_dhkl()?;
            write(&table, &output, &config)
        }
        Commands::Hkl {
            input,
            output,
            value,
            sigma,
            batch,
        } => {
            let table = read(&input, &config)?;
            let written = match batch {
                Some(batch) => table.write_hkl_with_batch(&output, &value, &sigma, &batch),
                None => table.write_hkl(&output, &value, &sigma),
            };
            written.with_context(|| format!("Failed to write {}", output.display()))
        }
        Commands::Unmerge {
            input,
            output,
            plus,
            minus,
        } => {
            let mut table = read(&input, &config)?;
            let plus: Vec<&str> = plus.iter().map(String::as_str).collect();
            let minus: Vec<&str> = minus.iter().map(String::as_str).collect();
            table.unmerge_anomalous(&plus, &minus)?;
            write(&table, &output, &config)
        }
    }
}

fn read(path: &Path, config: &CodecConfig) -> Result<ReflectionTable> {
    ReflectionTable::read_mtz_with(path, config)
        .with_context(|| format!("Failed to read {}", path.display()))
}

fn write(table: &ReflectionTable, path: &Path, config: &CodecConfig) -> Result<()> {
    table
        .write_mtz_with(path, config)
        .with_context(|| format!("Failed to write {}", path.display()))
}

fn info_command(input: &Path, json: bool, config: &CodecConfig) -> Result<()> {
    let table = read(input, config)?;
    let summary = Summary {
        path: input.display().to_string(),
        reflections: table.len(),
        merged: table.merged(),
        cell: table.cell().map(|c| c.parameters()),
        spacegroup: table.spacegroup().map(|sg| sg.to_string()),
        columns: table
            .columns()
            .map(|(label, dtype, values)| {
                let range = values.min_max();
                ColumnSummary {
                    label: label.to_string(),
                    dtype: dtype.name().to_string(),
                    min: range.map(|r| r.0),
                    max: range.map(|r| r.1),
                }
            })
            .collect(),
        batches: table.attrs.batches.len(),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    println!("{}", summary.path);
    println!("  reflections: {}", summary.reflections);
    println!("  merged:      {}", summary.merged);
    match table.cell() {
        Some(cell) => println!("  cell:        {}", cell),
        None => println!("  cell:        (none)"),
    }
    println!(
        "  space group: {}",
        summary.spacegroup.as_deref().unwrap_or("(none)")
    );
    if summary.batches > 0 {
        println!("  batches:     {}", summary.batches);
    }
    for column in &summary.columns {
        match (column.min, column.max) {
            (Some(min), Some(max)) => println!(
                "  {:<20} {:<28} {:>12.4} {:>12.4}",
                column.label, column.dtype, min, max
            ),
            _ => println!("  {:<20} {:<28}", column.label, column.dtype),
        }
    }
    Ok(())
}
