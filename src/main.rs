//! CohortLens: claims-driven cohort risk pipeline
//!
//! Command-line driver. Reads a claims CSV, runs the pipeline and prints the
//! report as JSON on stdout.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use cohortlens::adapters::sanitize::SanitizingMakeWriter;
use cohortlens::adapters::ConfiguredEngine;
use cohortlens::{CohortConfig, CohortLensError, Pipeline};

const USAGE: &str = "usage: cohortlens <claims.csv> [--query TEXT] [--ask QUESTION] [--seed N] [--config FILE]";

#[derive(Debug, Default)]
struct Args {
    claims: PathBuf,
    query: String,
    ask: Option<String>,
    seed: Option<u64>,
    config: Option<PathBuf>,
}

fn parse_args() -> Result<Args> {
    let mut args = Args::default();
    let mut claims = None;
    let mut it = std::env::args().skip(1);

    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--query" => args.query = it.next().context("--query needs a value")?,
            "--ask" => args.ask = Some(it.next().context("--ask needs a value")?),
            "--seed" => {
                let raw = it.next().context("--seed needs a value")?;
                args.seed = Some(raw.parse().with_context(|| format!("Invalid seed: {raw}"))?);
            }
            "--config" => args.config = Some(it.next().context("--config needs a value")?.into()),
            "-h" | "--help" => {
                println!("{USAGE}");
                std::process::exit(0);
            }
            other if other.starts_with("--") => bail!("Unknown option {other}\n{USAGE}"),
            other => claims = Some(PathBuf::from(other)),
        }
    }

    args.claims = claims.with_context(|| USAGE.to_string())?;
    if args.seed.is_none() {
        args.seed = std::env::var("COHORTLENS_SEED")
            .ok()
            .and_then(|v| v.trim().parse().ok());
    }
    Ok(args)
}

/// Load a cohort config from a JSON file, falling back to the environment.
fn load_config(path: Option<&Path>) -> cohortlens::Result<CohortConfig> {
    let Some(path) = path else {
        return Ok(CohortConfig::from_env_or_default());
    };

    let text = std::fs::read_to_string(path)?;
    let config: CohortConfig = serde_json::from_str(&text)?;
    config
        .validate()
        .map_err(|errors| CohortLensError::Config(errors.join("; ")))?;
    Ok(config)
}

fn main() -> Result<()> {
    // Logs go to stderr (or a file) so stdout carries only the report.
    let log_mode = std::env::var("COHORTLENS_LOG_MODE").unwrap_or_else(|_| "stderr".to_string());

    let (writer, _guard) = if log_mode == "file" {
        let log_file =
            std::env::var("COHORTLENS_LOG_FILE").unwrap_or_else(|_| "cohortlens.log".to_string());

        if let Some(parent) = Path::new(&log_file).parent() {
            let _ = std::fs::create_dir_all(parent);
        }

        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_file)?;
        tracing_appender::non_blocking(file)
    } else {
        tracing_appender::non_blocking(std::io::stderr())
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(SanitizingMakeWriter::new(writer)))
        .init();

    let args = parse_args()?;
    tracing::info!("Starting CohortLens...");

    let config = load_config(args.config.as_deref()).context("Failed to load cohort config")?;
    let claims = std::fs::read_to_string(&args.claims)
        .with_context(|| format!("Failed to read {}", args.claims.display()))?;

    let mut rng = match args.seed {
        Some(seed) => {
            tracing::info!("Using seed {seed}");
            ChaCha20Rng::seed_from_u64(seed)
        }
        None => ChaCha20Rng::from_entropy(),
    };

    let engine = ConfiguredEngine::from_env()?;
    let timeout = engine.timeout();
    let pipeline = Pipeline::new(Arc::new(engine), timeout);

    let report = pipeline.run(&claims, &args.query, &config, &mut rng)?;
    println!("{}", serde_json::to_string_pretty(&report)?);

    if let Some(question) = args.ask {
        println!("{}", pipeline.ask(&question, &report));
    }

    tracing::info!("CohortLens run complete.");
    Ok(())
}
