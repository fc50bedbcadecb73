//! Check external tools and configuration.

use std::path::Path;

use posewatch_capture::tools::command_exists;
use posewatch_common::{config_file_path, AppConfig};

pub fn run(config: &AppConfig, explicit: Option<&Path>) -> anyhow::Result<()> {
    println!("Posewatch System Check");
    println!("{}", "=".repeat(50));

    let mut ready = true;
    for binary in ["ffmpeg", "ffprobe"] {
        if command_exists(binary) {
            println!("[OK] {binary} found");
        } else {
            println!("[MISSING] {binary} not found in PATH");
            ready = false;
        }
    }

    match &config.estimator {
        Some(command) if command_exists(&command.program) => {
            println!("[OK] Pose estimator: {} {}", command.program, command.args.join(" "));
        }
        Some(command) => {
            println!("[MISSING] Pose estimator program not found: {}", command.program);
            ready = false;
        }
        None => println!("[WARN] No pose estimator configured (pass --estimator per command)"),
    }

    println!();
    let path = explicit.map(Path::to_path_buf).unwrap_or_else(config_file_path);
    if path.exists() {
        println!("Config: {}", path.display());
    } else {
        println!("Config: {} (not found, using defaults)", path.display());
    }
    println!("  Work dir: {}", config.work_dir.display());
    println!(
        "  Window: {} frames @ {} fps",
        config.pipeline.window_len, config.pipeline.sample_rate_hz
    );
    println!(
        "  Live: {} ms tick, alert at p >= {}",
        config.live.tick_ms, config.live.alert_threshold
    );

    println!();
    if ready {
        println!("All required tools are available.");
    } else {
        println!("Some required tools are missing. See above.");
    }

    Ok(())
}
