//! `afc` - evaluate AP availability requests from the command line
//!
//! ```text
//! afc evaluate --dataset data.json --request req.json [--config afc.yaml]
//! afc dataset --dataset data.json
//! afc config show | example | validate
//! ```

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};

use afc_core::config::AfcConfig;
use afc_core::observe::init_logging;
use afc_engine::dataset::Dataset;
use afc_engine::{AfcEngine, ApRequest, EvaluateOptions};

#[derive(Parser, Debug)]
#[command(name = "afc", version, about = "6 GHz automated frequency coordination")]
struct Cli {
    /// Configuration file; falls back to AFC_CONFIG and the default search path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log filter, e.g. `debug` or `afc_engine=trace`
    #[arg(long, global = true)]
    log: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Evaluate one request and print the response as JSON
    Evaluate {
        #[arg(long)]
        dataset: PathBuf,
        #[arg(long)]
        request: PathBuf,
        /// Give up after this many milliseconds
        #[arg(long)]
        deadline_ms: Option<u64>,
        /// Include per-incumbent diagnostics
        #[arg(long, default_value_t = false)]
        diagnostics: bool,
        #[arg(long, default_value_t = false)]
        compact: bool,
    },
    /// Load and validate a dataset
    Dataset {
        #[arg(long)]
        dataset: PathBuf,
    },
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommands {
    /// Print the effective configuration
    Show,
    /// Print an annotated example configuration
    Example,
    /// Validate the configuration and exit
    Validate,
}

fn load_config(path: Option<&Path>) -> Result<AfcConfig> {
    let config = match path {
        Some(p) => AfcConfig::load_from(p).with_context(|| format!("loading {}", p.display()))?,
        None => AfcConfig::load().context("loading configuration")?,
    };
    Ok(config)
}

fn load_request(path: &Path) -> Result<ApRequest> {
    let text = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing request {}", path.display()))
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = load_config(cli.config.as_deref())?;
    if cli.log.is_some() {
        config.logging.filter = cli.log.clone();
    }
    init_logging(&config.logging);

    match cli.command {
        Commands::Evaluate {
            dataset,
            request,
            deadline_ms,
            diagnostics,
            compact,
        } => {
            if diagnostics {
                config.assembly.include_diagnostics = true;
            }
            let snapshot = Dataset::load(&dataset)
                .and_then(Dataset::into_snapshot)
                .with_context(|| format!("loading dataset {}", dataset.display()))?;
            let request = load_request(&request)?;

            let engine = AfcEngine::with_config(config)?;
            let options = match deadline_ms {
                Some(ms) => EvaluateOptions::with_deadline(Instant::now() + Duration::from_millis(ms)),
                None => EvaluateOptions::default(),
            };
            let response = engine.evaluate_with(&request, &snapshot, &options)?;

            let json = if compact {
                serde_json::to_string(&response)?
            } else {
                serde_json::to_string_pretty(&response)?
            };
            println!("{}", json);
        }
        Commands::Dataset { dataset } => {
            let snapshot = Dataset::load(&dataset)
                .and_then(Dataset::into_snapshot)
                .with_context(|| format!("loading dataset {}", dataset.display()))?;
            println!("terrain:          {}", snapshot.terrain.name());
            println!("links:            {}", snapshot.incumbents.len());
            println!("repeaters:        {}", snapshot.incumbents.links().iter().map(|l| l.repeaters.len()).sum::<usize>());
            println!("exclusion zones:  {}", snapshot.incumbents.zones().len());
            println!("antenna patterns: {}", snapshot.antennas.len());
        }
        Commands::Config { command } => match command {
            ConfigCommands::Show => print!("{}", config.to_yaml()?),
            ConfigCommands::Validate => {
                if let Err(e) = config.validate() {
                    bail!("configuration invalid: {}", e);
                }
                tracing::info!(ruleset = %config.ruleset_id, "configuration valid");
                println!("ok");
            }
            ConfigCommands::Example => print!("{}", AfcConfig::example_yaml()),
        },
    }

    Ok(())
}
