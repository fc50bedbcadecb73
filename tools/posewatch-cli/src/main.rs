//! Posewatch CLI: assemble skeleton datasets, train, and watch live streams.
//!
//! Usage:
//!   posewatch check                       Check external tools and config
//!   posewatch assemble <DIR> -o <FILE>    Build a dataset from labeled videos
//!   posewatch info <FILE>                 Show dataset information
//!   posewatch train <FILE> -m <MODEL>     Train the baseline classifier
//!   posewatch evaluate <FILE> -m <MODEL>  Evaluate a saved model
//!   posewatch watch <DIR> -m <MODEL>      Run live inference on a frame directory

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use posewatch_common::logging::init_logging;
use posewatch_common::AppConfig;

mod commands;

#[derive(Parser)]
#[command(
    name = "posewatch",
    about = "Skeleton-sequence anomaly detection for video",
    version,
    author
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file (defaults to the standard location)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check external tools and configuration
    Check,

    /// Assemble a dataset from a labeled video collection
    Assemble {
        /// Root directory with one sub-directory per label bucket
        videos: PathBuf,

        /// Dataset output file
        #[arg(short, long, default_value = "dataset.json")]
        output: PathBuf,

        /// Pose estimator command line (overrides the config)
        #[arg(long)]
        estimator: Option<String>,

        /// Frames per window
        #[arg(long)]
        window_len: Option<usize>,

        /// Frames per second to sample
        #[arg(long)]
        sample_rate: Option<u32>,

        /// Train/validation/test ratios, e.g. "0.8,0.1,0.1"
        #[arg(long)]
        split: Option<String>,

        /// Shuffle seed
        #[arg(long)]
        seed: Option<u64>,

        /// Keypoint cache directory
        #[arg(long)]
        cache: Option<PathBuf>,

        /// Skip horizontal mirror augmentation
        #[arg(long)]
        no_mirror: bool,
    },

    /// Show dataset information
    Info {
        /// Dataset file
        dataset: PathBuf,
    },

    /// Train the baseline classifier
    Train {
        /// Dataset file
        dataset: PathBuf,

        /// Model output file
        #[arg(short, long, default_value = "model.json")]
        model: PathBuf,

        /// Maximum number of epochs
        #[arg(long)]
        epochs: Option<usize>,

        /// Mini-batch size
        #[arg(long)]
        batch_size: Option<usize>,

        /// Learning rate
        #[arg(long)]
        learning_rate: Option<f32>,

        /// Epochs without validation improvement before stopping (0 disables)
        #[arg(long)]
        patience: Option<usize>,
    },

    /// Evaluate a saved model on the dataset's test split
    Evaluate {
        /// Dataset file
        dataset: PathBuf,

        /// Model file
        #[arg(short, long, default_value = "model.json")]
        model: PathBuf,
    },

    /// Run live inference on frames written by an external capture process
    Watch {
        /// Directory the capture process keeps writing its latest frame to
        frames: PathBuf,

        /// Model file
        #[arg(short, long, default_value = "model.json")]
        model: PathBuf,

        /// Pose estimator command line (overrides the config)
        #[arg(long)]
        estimator: Option<String>,

        /// Polling interval in milliseconds
        #[arg(long)]
        tick_ms: Option<u64>,

        /// Rolling window length (defaults to the model's)
        #[arg(long)]
        window_len: Option<usize>,

        /// Anomalous-class probability that raises an alert
        #[arg(long)]
        threshold: Option<f32>,

        /// Stop after this many seconds instead of waiting for Ctrl+C
        #[arg(long)]
        duration_secs: Option<u64>,

        /// Print alerts as JSON lines
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => AppConfig::load_from(path)?,
        None => AppConfig::load(),
    };
    if cli.verbose {
        config.logging.level = "debug".to_string();
    }
    init_logging(&config.logging);

    match cli.command {
        Commands::Check => commands::check::run(&config, cli.config.as_deref()),
        Commands::Assemble {
            videos,
            output,
            estimator,
            window_len,
            sample_rate,
            split,
            seed,
            cache,
            no_mirror,
        } => {
            commands::assemble::run(
                &config,
                commands::assemble::AssembleArgs {
                    videos,
                    output,
                    estimator,
                    window_len,
                    sample_rate,
                    split,
                    seed,
                    cache,
                    mirror: !no_mirror,
                },
            )
            .await
        }
        Commands::Info { dataset } => commands::info::run(dataset),
        Commands::Train {
            dataset,
            model,
            epochs,
            batch_size,
            learning_rate,
            patience,
        } => commands::train::run(dataset, model, epochs, batch_size, learning_rate, patience),
        Commands::Evaluate { dataset, model } => commands::evaluate::run(dataset, model),
        Commands::Watch {
            frames,
            model,
            estimator,
            tick_ms,
            window_len,
            threshold,
            duration_secs,
            json,
        } => {
            commands::watch::run(
                &config,
                commands::watch::WatchArgs {
                    frames,
                    model,
                    estimator,
                    tick_ms,
                    window_len,
                    threshold,
                    duration_secs,
                    json,
                },
            )
            .await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_assemble() {
        let cli = Cli::parse_from([
            "posewatch", "assemble", "videos", "-o", "out.json", "--split", "0.6,0.2,0.2",
            "--seed", "7", "--no-mirror",
        ]);
        match cli.command {
            Commands::Assemble {
                videos,
                output,
                split,
                seed,
                no_mirror,
                ..
            } => {
                assert_eq!(videos, PathBuf::from("videos"));
                assert_eq!(output, PathBuf::from("out.json"));
                assert_eq!(split.as_deref(), Some("0.6,0.2,0.2"));
                assert_eq!(seed, Some(7));
                assert!(no_mirror);
            }
            _ => panic!("expected assemble"),
        }
    }
}
