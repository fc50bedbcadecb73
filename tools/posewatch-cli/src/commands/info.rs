//! Show dataset information.

use std::path::PathBuf;

use posewatch_skeleton_model::{ClassBalance, Dataset, LabeledExample};

pub fn run(path: PathBuf) -> anyhow::Result<()> {
    let dataset = Dataset::load(&path)?;

    println!("Dataset: {}", path.display());
    println!("  Version: {}", dataset.version);
    println!("  Created: {}", dataset.created_at);
    println!(
        "  Window: {} frames @ {} fps",
        dataset.window_len, dataset.sample_rate_hz
    );
    println!(
        "  Ratios: {:.2}/{:.2}/{:.2}",
        dataset.ratios[0], dataset.ratios[1], dataset.ratios[2]
    );
    println!();

    println!("Partitions:");
    print_partition("Train", &dataset.split.train);
    print_partition("Validation", &dataset.split.validation);
    print_partition("Test", &dataset.split.test);
    println!();

    println!("Class balance: {}", dataset.balance);
    Ok(())
}

fn print_partition(name: &str, examples: &[LabeledExample]) {
    let balance = ClassBalance::from_labels(examples.iter().map(|e| e.label));
    println!("  {name}: {} windows ({balance})", examples.len());
}
