//! Assemble a dataset from labeled videos.

use std::path::PathBuf;
use std::sync::Arc;

use posewatch_capture::FfmpegFrameExtractor;
use posewatch_common::AppConfig;
use posewatch_dataset::{AssemblerConfig, DatasetAssembler};
use posewatch_processing_core::SplitRatios;

pub struct AssembleArgs {
    pub videos: PathBuf,
    pub output: PathBuf,
    pub estimator: Option<String>,
    pub window_len: Option<usize>,
    pub sample_rate: Option<u32>,
    pub split: Option<String>,
    pub seed: Option<u64>,
    pub cache: Option<PathBuf>,
    pub mirror: bool,
}

pub async fn run(config: &AppConfig, args: AssembleArgs) -> anyhow::Result<()> {
    let mut assembler_config = AssemblerConfig::from_app_config(config)?;
    if let Some(window_len) = args.window_len {
        assembler_config.window_len = window_len;
    }
    if let Some(rate) = args.sample_rate {
        assembler_config.sample_rate_hz = rate;
    }
    if let Some(split) = &args.split {
        assembler_config.ratios = split.parse::<SplitRatios>()?;
    }
    if args.seed.is_some() {
        assembler_config.seed = args.seed;
    }
    if args.cache.is_some() {
        assembler_config.cache_dir = args.cache;
    }
    assembler_config.mirror = args.mirror;

    let estimator = super::resolve_estimator(args.estimator.as_deref(), config)?;

    println!("Assembling dataset from {}", args.videos.display());
    println!(
        "  Window: {} frames @ {} fps",
        assembler_config.window_len, assembler_config.sample_rate_hz
    );
    println!("  Split: {}", assembler_config.ratios);
    println!();

    let assembler = DatasetAssembler::new(
        assembler_config,
        Arc::new(FfmpegFrameExtractor::new()),
        Arc::new(estimator),
    );
    let assembled = assembler.assemble(&args.videos).await?;
    assembled.dataset.save(&args.output)?;

    println!("{}", assembled.report);
    println!();
    println!("Dataset saved to: {}", args.output.display());

    Ok(())
}
