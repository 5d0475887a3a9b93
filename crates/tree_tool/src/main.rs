//! Activity tree model tool
//!
//! Builds, inspects, exports and verifies decision-tree activity models.

use activity_tree_core::EngineConfig;
use activity_tree_tool::{commands, deploy, InputFormat};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::{info, Level};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser, Debug)]
#[command(name = "activity-tree")]
#[command(author = "Activity Tree Contributors")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Build and manage data-driven activity decision trees", long_about = None)]
struct Args {
    /// Verbose logging (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Build a trained tree into model.bin and model.hash
    Build {
        /// Trained tree JSON
        #[arg(short, long)]
        input: PathBuf,

        /// Input document shape
        #[arg(long, value_enum, default_value = "nested")]
        format: InputFormat,

        /// Output directory for model and hash
        #[arg(short, long, default_value = "models/activity")]
        output: PathBuf,

        /// Engine configuration (limits, codec)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Leave class and feature names out of the artifact
        #[arg(long)]
        no_names: bool,
    },

    /// Print descriptor, size, depth and hash of a model
    Inspect {
        /// Binary or JSON model
        model: PathBuf,

        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Classify one feature vector
    Classify {
        /// Binary or JSON model
        model: PathBuf,

        /// Comma separated feature values
        #[arg(short, long, allow_hyphen_values = true)]
        features: String,

        /// Print the decision path
        #[arg(long)]
        trace: bool,

        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Write the canonical JSON form of a model
    ExportJson {
        /// Binary or JSON model
        model: PathBuf,

        #[arg(short, long)]
        output: PathBuf,

        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Check a deployed model against its pinned hash
    Verify {
        /// Deployment config with [model] path and expected_hash
        #[arg(long, default_value = deploy::DEFAULT_DEPLOY_CONFIG)]
        config: PathBuf,

        /// Engine configuration (limits)
        #[arg(long)]
        engine: Option<PathBuf>,
    },
}

fn engine_config(path: Option<&Path>) -> Result<EngineConfig> {
    match path {
        Some(path) => EngineConfig::load_from_file(path)
            .with_context(|| format!("Failed to load engine config {}", path.display())),
        None => Ok(EngineConfig::default()),
    }
}

fn init_logging(verbose: bool) -> Result<()> {
    let log_level = if verbose { Level::DEBUG } else { Level::INFO };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level.as_str().to_ascii_lowercase()));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose)?;

    match args.command {
        Command::Build {
            input,
            format,
            output,
            config,
            no_names,
        } => {
            let mut engine = engine_config(config.as_deref())?;
            if no_names {
                engine.codec.include_names = false;
            }

            info!("Building {} ({:?})", input.display(), format);
            let report = commands::build(&input, format, &output, &engine)?;

            println!("Model: {}", report.model_path.display());
            println!("Nodes: {} ({} leaves), depth {}", report.nodes, report.leaves, report.depth);
            println!("Size:  {} bytes", report.bytes);
            println!("Hash:  {}", report.hash);
        }
        Command::Inspect { model, config } => {
            let engine = engine_config(config.as_deref())?;
            println!("{}", commands::inspect(&model, &engine)?);
        }
        Command::Classify {
            model,
            features,
            trace,
            config,
        } => {
            let engine = engine_config(config.as_deref())?;
            let features = commands::parse_features(&features)?;
            println!("{}", commands::classify(&model, &features, trace, &engine)?);
        }
        Command::ExportJson {
            model,
            output,
            config,
        } => {
            let engine = engine_config(config.as_deref())?;
            commands::export_json(&model, &output, &engine)?;
            println!("Wrote {}", output.display());
        }
        Command::Verify { config, engine } => {
            let engine = engine_config(engine.as_deref())?;
            let verification = deploy::verify(&config, &engine)?;
            println!(
                "✓ {} matches {} ({} nodes)",
                verification.model_path.display(),
                verification.hash,
                verification.nodes
            );
        }
    }

    Ok(())
}
