//! Evaluate a saved model.

use std::path::PathBuf;

use posewatch_classifier::{CentroidClassifier, SequenceClassifier};
use posewatch_skeleton_model::Dataset;

pub fn run(dataset: PathBuf, model: PathBuf) -> anyhow::Result<()> {
    let dataset = Dataset::load(&dataset)?;
    let classifier = CentroidClassifier::load(&model)?;

    if classifier.window_len() != dataset.window_len {
        anyhow::bail!(
            "Model expects {}-frame windows but the dataset has {}-frame windows",
            classifier.window_len(),
            dataset.window_len
        );
    }
    if dataset.split.test.is_empty() {
        anyhow::bail!("Dataset has no test split to evaluate on");
    }

    let evaluation = classifier.evaluate(&dataset.split.test)?;
    println!("Model: {}", model.display());
    println!("  Test windows: {}", evaluation.samples);
    println!("  Loss: {:.4}", evaluation.loss);
    println!("  Accuracy: {:.3}", evaluation.accuracy);
    Ok(())
}
