//! Command-line front end for the selection pipeline.

use clap::{Args, Parser, Subcommand};
use sarima_select::core::ExogMatrix;
use sarima_select::error::Result;
use sarima_select::pipeline::{
    decompose, load_series_csv, CsvSchema, DecompositionMode, DriverConfig, EtlPipeline,
    LocalBucket, ModelStore, SelectionDriver,
};
use sarima_select::search::{EvalMode, SearchConfig, SeasonalGrid, TracingObserver, Tuner};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::error;

#[derive(Parser)]
#[command(name = "sarima-select", version, about = "Batch SARIMA model selection")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Args)]
struct SchemaArgs {
    /// Name of the date column.
    #[arg(long, default_value = "Date")]
    date_column: String,
    /// Name of the value column.
    #[arg(long, default_value = "Views")]
    value_column: String,
}

impl SchemaArgs {
    fn schema(&self) -> CsvSchema {
        CsvSchema {
            date_column: self.date_column.clone(),
            value_column: self.value_column.clone(),
        }
    }
}

#[derive(Subcommand)]
enum Command {
    /// Clean a raw CSV and write the processed series.
    Etl {
        /// Directory holding the raw file.
        #[arg(long)]
        raw_dir: PathBuf,
        /// File name within the raw directory.
        key: String,
        /// Output path for the processed CSV.
        #[arg(long, default_value = "processed.csv")]
        output: PathBuf,
        #[command(flatten)]
        schema: SchemaArgs,
    },
    /// Print the seasonal decomposition of a processed series.
    Decompose {
        input: PathBuf,
        #[arg(long, default_value_t = 7)]
        period: usize,
        /// Use a multiplicative rather than additive model.
        #[arg(long)]
        multiplicative: bool,
        #[command(flatten)]
        schema: SchemaArgs,
    },
    /// Grid search seasonal orders and print the winner.
    Tune {
        input: PathBuf,
        #[arg(long, default_value_t = 7)]
        period: usize,
        /// Largest candidate value for every order component.
        #[arg(long, default_value_t = 1)]
        max_order: usize,
        /// Score candidates on a held-out tail instead of in-sample.
        #[arg(long)]
        holdout: bool,
        /// Evaluate candidates across threads.
        #[arg(long)]
        parallel: bool,
        #[command(flatten)]
        schema: SchemaArgs,
    },
    /// Tune, refit, evaluate, and persist all model families.
    Train {
        input: PathBuf,
        /// Directory for persisted models.
        #[arg(long, default_value = "models")]
        models_dir: PathBuf,
        /// Optional CSV of exogenous regressors, one row per observation.
        #[arg(long)]
        exog: Option<PathBuf>,
        #[arg(long, default_value_t = 7)]
        period: usize,
        #[arg(long, default_value_t = 0.2)]
        test_fraction: f64,
        #[command(flatten)]
        schema: SchemaArgs,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %err, "command failed");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Etl {
            raw_dir,
            key,
            output,
            schema,
        } => {
            let pipeline = EtlPipeline::new(LocalBucket::new(raw_dir), schema.schema());
            let series = pipeline.run(&key, &output)?;
            println!("{} rows -> {}", series.len(), output.display());
            Ok(())
        }
        Command::Decompose {
            input,
            period,
            multiplicative,
            schema,
        } => {
            let series = load_series_csv(&input, &schema.schema())?;
            let mode = if multiplicative {
                DecompositionMode::Multiplicative
            } else {
                DecompositionMode::Additive
            };
            let dec = decompose(&series, period, mode)?;
            println!("date,trend,seasonal,residual");
            for (i, ts) in series.timestamps().iter().enumerate() {
                println!(
                    "{},{},{},{}",
                    ts.format("%Y-%m-%d"),
                    dec.trend[i],
                    dec.seasonal[i],
                    dec.residual[i]
                );
            }
            Ok(())
        }
        Command::Tune {
            input,
            period,
            max_order,
            holdout,
            parallel,
            schema,
        } => {
            let series = load_series_csv(&input, &schema.schema())?;
            let config = SearchConfig {
                mode: if holdout {
                    EvalMode::HoldOut
                } else {
                    EvalMode::InSample
                },
                parallel,
                ..SearchConfig::default()
            };
            let observer = TracingObserver;
            let tuner = Tuner::new(&series)
                .with_config(config)
                .with_observer(&observer);
            let grid = SeasonalGrid::uniform((0..=max_order).collect());
            let (order, score) = tuner.tune_sarima(&grid, period)?;
            println!("best order {order} with score {score:.4}");
            Ok(())
        }
        Command::Train {
            input,
            models_dir,
            exog,
            period,
            test_fraction,
            schema,
        } => {
            let series = load_series_csv(&input, &schema.schema())?;
            let exog = match exog {
                Some(path) => Some(load_exog_csv(&path, &schema.schema())?),
                None => None,
            };
            let store = ModelStore::open(models_dir)?;
            let config = DriverConfig {
                period,
                test_fraction,
                ..DriverConfig::default()
            };
            let driver = SelectionDriver::new(config).with_store(&store);
            let report = driver.run(&series, exog.as_ref())?;

            for (family, outcome) in [
                ("ARIMA", report.arima.map(|f| (f.holdout_mse, f.holdout_mae))),
                (
                    "SARIMA",
                    report.sarima.map(|f| (f.holdout_mse, f.holdout_mae)),
                ),
                (
                    "SARIMAX",
                    report.sarimax.map(|f| (f.holdout_mse, f.holdout_mae)),
                ),
            ] {
                match outcome {
                    Ok((mse, mae)) => println!("{family}: mse {mse:.4}, mae {mae:.4}"),
                    Err(err) => println!("{family}: failed ({err})"),
                }
            }
            Ok(())
        }
    }
}

/// Read a regressor matrix from a CSV, taking the value column.
fn load_exog_csv(path: &PathBuf, schema: &CsvSchema) -> Result<ExogMatrix> {
    let series = load_series_csv(path, schema)?;
    ExogMatrix::from_column(series.values().to_vec())
}
