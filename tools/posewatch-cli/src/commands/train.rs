//! Train the baseline classifier.

use std::path::PathBuf;

use posewatch_classifier::{CentroidClassifier, SequenceClassifier, TrainingConfig};
use posewatch_skeleton_model::Dataset;

pub fn run(
    dataset: PathBuf,
    model: PathBuf,
    epochs: Option<usize>,
    batch_size: Option<usize>,
    learning_rate: Option<f32>,
    patience: Option<usize>,
) -> anyhow::Result<()> {
    let dataset = Dataset::load(&dataset)?;

    let mut config = TrainingConfig::default();
    if let Some(epochs) = epochs {
        config.epochs = epochs;
    }
    if let Some(batch_size) = batch_size {
        config.batch_size = batch_size;
    }
    if let Some(learning_rate) = learning_rate {
        config.learning_rate = learning_rate;
    }
    if let Some(patience) = patience {
        config.early_stopping_patience = (patience > 0).then_some(patience);
    }

    println!(
        "Training on {} windows ({} validation)",
        dataset.split.train.len(),
        dataset.split.validation.len()
    );

    let mut classifier = CentroidClassifier::new(dataset.window_len)?;
    let history = classifier.fit(&dataset.split.train, &dataset.split.validation, &config)?;

    println!();
    println!("{:>5}  {:>8}  {:>8}  {:>8}  {:>8}", "epoch", "loss", "acc", "val_loss", "val_acc");
    for m in &history.epochs {
        println!(
            "{:>5}  {:>8.4}  {:>8.3}  {:>8}  {:>8}",
            m.epoch,
            m.loss,
            m.accuracy,
            m.val_loss.map(|v| format!("{v:.4}")).unwrap_or_else(|| "-".into()),
            m.val_accuracy.map(|v| format!("{v:.3}")).unwrap_or_else(|| "-".into()),
        );
    }
    if history.stopped_early {
        println!("Stopped early; kept epoch {}", history.best_epoch);
    }

    if !dataset.split.test.is_empty() {
        let evaluation = classifier.evaluate(&dataset.split.test)?;
        println!();
        println!(
            "Test: loss {:.4}, accuracy {:.3} over {} windows",
            evaluation.loss, evaluation.accuracy, evaluation.samples
        );
    }

    classifier.save(&model)?;
    println!();
    println!("Model saved to: {}", model.display());
    Ok(())
}
