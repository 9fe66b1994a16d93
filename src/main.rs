use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

use fairhire::config::{LoggingSettings, Settings};
use fairhire::core::{render_metric, render_table, summarize, Cleaner, FairnessExperiment, FeatureEngineer};
use fairhire::models::{Dataset, Technique};
use fairhire::services::{load_dataset, load_results, save_dataset, save_results, save_summary};
use fairhire::synthetic;

/// Fairhire - hiring data cleaning, feature engineering and fairness evaluation
#[derive(Parser)]
#[command(name = "fairhire")]
#[command(about = "Hiring data pipeline with bias-mitigation evaluation", long_about = None)]
struct Cli {
    /// Configuration file (defaults to config/default.toml and config/local.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a synthetic raw hiring dataset
    Generate {
        #[arg(short, long, default_value_t = 1000)]
        rows: usize,
        #[arg(short, long, default_value_t = 42)]
        seed: u64,
        #[arg(short, long, default_value = "data/hiring.csv")]
        output: PathBuf,
    },
    /// Normalize, deduplicate and split ambiguous candidate IDs
    Clean {
        #[arg(short, long)]
        input: Option<PathBuf>,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Add match features to a cleaned dataset
    Features {
        #[arg(short, long)]
        input: Option<PathBuf>,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Cross-validate a mitigation technique over the repair levels
    Evaluate {
        #[arg(short, long)]
        input: Option<PathBuf>,
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// none, reweighing, disparate_impact_remover or prejudice_remover
        #[arg(short, long)]
        technique: Option<Technique>,
    },
    /// Summarize experiment results
    Report {
        #[arg(short, long)]
        input: Option<PathBuf>,
        /// Summary CSV destination
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Show a single metric across attributes instead of the full table
        #[arg(short, long)]
        metric: Option<String>,
    },
    /// Run clean, features, evaluate and report in sequence
    Pipeline {
        #[arg(short, long)]
        input: Option<PathBuf>,
        #[arg(long)]
        out_dir: Option<PathBuf>,
        #[arg(short, long)]
        technique: Option<Technique>,
    },
}

fn init_logging(settings: &LoggingSettings) {
    // Environment overrides the configuration file
    let log_level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| settings.level.clone());
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| settings.format.clone());

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log_level));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(true);

    match log_format.as_str() {
        "pretty" => subscriber.pretty().init(),
        "json" => subscriber.json().init(),
        _ => subscriber.compact().init(),
    }
}

fn main() -> Result<()> {
    // Load .env file if present
    dotenv::dotenv().ok();

    let cli = Cli::parse();

    let settings = match &cli.config {
        Some(path) => Settings::load_from(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => Settings::load().context("Failed to load configuration")?,
    };

    init_logging(&settings.logging);
    info!("Configuration loaded successfully");

    let out_dir = PathBuf::from(&settings.data.output_dir);
    let default_input = PathBuf::from(&settings.data.input_path);

    match cli.command {
        Commands::Generate { rows, seed, output } => {
            let dataset = synthetic::generate(rows, seed)?;
            save_dataset(&dataset, &output)?;
            info!("Wrote {} rows to {}", dataset.len(), output.display());
        }
        Commands::Clean { input, output } => {
            let input = input.unwrap_or(default_input);
            let output = output.unwrap_or_else(|| out_dir.join("cleaned.csv"));
            let mut dataset = load(&input)?;
            clean(&settings, &mut dataset)?;
            save_dataset(&dataset, &output)?;
        }
        Commands::Features { input, output } => {
            let input = input.unwrap_or_else(|| out_dir.join("cleaned.csv"));
            let output = output.unwrap_or_else(|| out_dir.join("features.csv"));
            let mut dataset = load(&input)?;
            engineer(&settings, &mut dataset)?;
            save_dataset(&dataset, &output)?;
        }
        Commands::Evaluate {
            input,
            output,
            technique,
        } => {
            let input = input.unwrap_or_else(|| out_dir.join("features.csv"));
            let output = output.unwrap_or_else(|| out_dir.join("results.json"));
            let dataset = load(&input)?;
            evaluate(&settings, &dataset, technique, &output)?;
        }
        Commands::Report {
            input,
            output,
            metric,
        } => {
            let input = input.unwrap_or_else(|| out_dir.join("results.json"));
            report(&input, output.as_deref(), metric.as_deref())?;
        }
        Commands::Pipeline {
            input,
            out_dir: dir,
            technique,
        } => {
            let input = input.unwrap_or(default_input);
            let dir = dir.unwrap_or(out_dir);

            let mut dataset = load(&input)?;
            clean(&settings, &mut dataset)?;
            save_dataset(&dataset, dir.join("cleaned.csv"))?;

            engineer(&settings, &mut dataset)?;
            save_dataset(&dataset, dir.join("features.csv"))?;

            let results_path = dir.join("results.json");
            let summary_path = dir.join("summary.csv");
            evaluate(&settings, &dataset, technique, &results_path)?;
            report(&results_path, Some(summary_path.as_path()), None)?;
        }
    }

    Ok(())
}

fn load(path: &Path) -> Result<Dataset> {
    load_dataset(path).with_context(|| format!("Failed to read dataset {}", path.display()))
}

fn clean(settings: &Settings, dataset: &mut Dataset) -> Result<()> {
    let report = Cleaner::new(&settings.cleaning).run(dataset)?;
    info!(
        "Cleaned dataset: {} rows, {} new IDs from split, {} initial-stage candidates removed",
        report.rows_after,
        report.id_split.new_ids(),
        report.initial_stage_candidates
    );
    Ok(())
}

fn engineer(settings: &Settings, dataset: &mut Dataset) -> Result<()> {
    let engineer = FeatureEngineer::from_settings(&settings.features, &settings.geo)
        .context("Failed to load gazetteer")?;
    let report = engineer.run(dataset)?;
    for (column, share) in &report.coverage {
        info!("{:<32} {:>6.1}% populated", column, share * 100.0);
    }
    Ok(())
}

fn evaluate(
    settings: &Settings,
    dataset: &Dataset,
    technique: Option<Technique>,
    output: &Path,
) -> Result<()> {
    let mut experiment = FairnessExperiment::new(settings.experiment.clone());
    if let Some(technique) = technique {
        experiment = experiment.with_technique(technique);
    }
    info!("Evaluating {}", experiment.technique());

    let results = experiment.run(dataset)?;
    save_results(&results, output)?;
    info!("Results {} written to {}", results.run_id, output.display());
    Ok(())
}

fn report(input: &Path, output: Option<&Path>, metric: Option<&str>) -> Result<()> {
    let results = load_results(input)
        .with_context(|| format!("Failed to read results {}", input.display()))?;

    match metric {
        Some(metric) => {
            let table = render_metric(&results, metric)
                .with_context(|| format!("Unknown metric '{}'", metric))?;
            println!("{}", table);
        }
        None => println!("{}", render_table(&results)),
    }

    if let Some(output) = output {
        save_summary(&summarize(&results), output)?;
        info!("Summary written to {}", output.display());
    }
    Ok(())
}
