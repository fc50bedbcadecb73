//! Run the live inference loop.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use posewatch_capture::LatestFrameFile;
use posewatch_classifier::{CentroidClassifier, SequenceClassifier};
use posewatch_common::AppConfig;
use posewatch_live::{LiveConfig, LiveInferenceLoop};

const STATUS_INTERVAL: Duration = Duration::from_secs(10);

pub struct WatchArgs {
    pub frames: PathBuf,
    pub model: PathBuf,
    pub estimator: Option<String>,
    pub tick_ms: Option<u64>,
    pub window_len: Option<usize>,
    pub threshold: Option<f32>,
    pub duration_secs: Option<u64>,
    pub json: bool,
}

pub async fn run(config: &AppConfig, args: WatchArgs) -> anyhow::Result<()> {
    let classifier = CentroidClassifier::load(&args.model)?;
    let estimator = super::resolve_estimator(args.estimator.as_deref(), config)?;

    let mut live_config = LiveConfig::from(&config.live);
    live_config.window_len = args.window_len.unwrap_or(classifier.window_len());
    if let Some(tick_ms) = args.tick_ms {
        live_config.tick_interval = Duration::from_millis(tick_ms);
    }
    if let Some(threshold) = args.threshold {
        live_config.alert_threshold = threshold;
    }

    println!("Watching {}", args.frames.display());
    println!(
        "  Tick: {} ms, window: {} frames, alert at p({}) >= {}",
        live_config.tick_interval.as_millis(),
        live_config.window_len,
        live_config.alert_label,
        live_config.alert_threshold
    );
    match args.duration_secs {
        Some(secs) => println!("Running for {secs}s..."),
        None => println!("Press Ctrl+C to stop..."),
    }
    println!();

    let mut handle = LiveInferenceLoop::new(
        live_config,
        Arc::new(LatestFrameFile::new(&args.frames)),
        Arc::new(estimator),
        Arc::new(classifier),
    )
    .start()
    .await?;

    let deadline = async {
        match args.duration_secs {
            Some(secs) => tokio::time::sleep(Duration::from_secs(secs)).await,
            None => std::future::pending().await,
        }
    };
    tokio::pin!(deadline);
    let mut status = tokio::time::interval(STATUS_INTERVAL);
    status.tick().await;

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            _ = &mut deadline => break,
            alert = handle.alerts().recv() => match alert {
                Some(alert) if args.json => println!("{}", serde_json::to_string(&alert)?),
                Some(alert) => println!("ALERT {alert}"),
                None => break,
            },
            _ = status.tick() => {
                tracing::info!(state = %handle.state(), metrics = ?handle.metrics(), "Live status");
            }
        }
    }

    handle.stop().await?;
    let metrics = handle.metrics();
    println!();
    println!("Stopped.");
    println!(
        "  Ticks: {} ({} dropped while inferring)",
        metrics.ticks, metrics.dropped_ticks
    );
    println!(
        "  Frames: {} ({} not ready)",
        metrics.frames, metrics.not_ready_frames
    );
    println!("  Predictions: {}", metrics.predictions);
    println!("  Alerts: {}", metrics.alerts);
    println!("  Failed cycles: {}", metrics.failed_cycles);
    Ok(())
}
