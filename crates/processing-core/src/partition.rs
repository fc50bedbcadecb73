//! Shuffling and train/validation/test partitioning.

use std::fmt;
use std::str::FromStr;

use posewatch_common::{PosewatchError, PosewatchResult, SplitDefaults};
use posewatch_skeleton_model::{DatasetSplit, LabeledExample};
use rand::Rng;

const RATIO_TOLERANCE: f64 = 1e-6;

/// Partition ratios. Non-negative and summing to 1.0.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SplitRatios {
    train: f64,
    validation: f64,
    test: f64,
}

impl SplitRatios {
    pub fn new(train: f64, validation: f64, test: f64) -> PosewatchResult<Self> {
        for (name, value) in [("train", train), ("validation", validation), ("test", test)] {
            if !value.is_finite() || value < 0.0 {
                return Err(PosewatchError::config(format!(
                    "{name} ratio must be a non-negative number, got {value}"
                )));
            }
        }
        let sum = train + validation + test;
        if (sum - 1.0).abs() > RATIO_TOLERANCE {
            return Err(PosewatchError::config(format!(
                "split ratios must sum to 1.0, got {sum}"
            )));
        }
        Ok(Self {
            train,
            validation,
            test,
        })
    }

    pub fn train(&self) -> f64 {
        self.train
    }

    pub fn validation(&self) -> f64 {
        self.validation
    }

    pub fn test(&self) -> f64 {
        self.test
    }

    pub fn as_array(&self) -> [f64; 3] {
        [self.train, self.validation, self.test]
    }

    /// Partition sizes for a pool of `n` examples.
    ///
    /// Train and validation are rounded; test takes the remainder, so the
    /// sizes always sum to `n`.
    pub fn sizes(&self, n: usize) -> (usize, usize, usize) {
        let train = ((n as f64 * self.train).round() as usize).min(n);
        let validation = ((n as f64 * self.validation).round() as usize).min(n - train);
        (train, validation, n - train - validation)
    }
}

impl Default for SplitRatios {
    fn default() -> Self {
        Self {
            train: 0.8,
            validation: 0.1,
            test: 0.1,
        }
    }
}

impl TryFrom<&SplitDefaults> for SplitRatios {
    type Error = PosewatchError;

    fn try_from(split: &SplitDefaults) -> PosewatchResult<Self> {
        Self::new(split.train, split.validation, split.test)
    }
}

impl FromStr for SplitRatios {
    type Err = PosewatchError;

    /// Parse `"train,validation,test"`, e.g. `"0.6,0.2,0.2"`.
    fn from_str(s: &str) -> PosewatchResult<Self> {
        let values = s
            .split(',')
            .map(|part| part.trim().parse::<f64>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| PosewatchError::config(format!("invalid split ratio '{s}': {e}")))?;
        match values.as_slice() {
            [train, validation, test] => Self::new(*train, *validation, *test),
            _ => Err(PosewatchError::config(format!(
                "split must have three comma-separated ratios, got '{s}'"
            ))),
        }
    }
}

impl fmt::Display for SplitRatios {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.train, self.validation, self.test)
    }
}

/// Uniform in-place Fisher–Yates shuffle.
pub fn fisher_yates_shuffle<T, R: Rng + ?Sized>(items: &mut [T], rng: &mut R) {
    for i in (1..items.len()).rev() {
        let j = rng.gen_range(0..=i);
        items.swap(i, j);
    }
}

/// Three disjoint contiguous slices of a pool.
#[derive(Debug, Clone, PartialEq)]
pub struct Partition<T> {
    pub train: Vec<T>,
    pub validation: Vec<T>,
    pub test: Vec<T>,
}

impl<T> Partition<T> {
    pub fn len(&self) -> usize {
        self.train.len() + self.validation.len() + self.test.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Partition<LabeledExample> {
    pub fn into_split(self) -> DatasetSplit {
        DatasetSplit {
            train: self.train,
            validation: self.validation,
            test: self.test,
        }
    }
}

/// Split an (already shuffled) pool into contiguous train/validation/test
/// slices, in that order.
pub fn partition<T>(mut pool: Vec<T>, ratios: &SplitRatios) -> Partition<T> {
    let (train_len, validation_len, _) = ratios.sizes(pool.len());
    let mut rest = pool.split_off(train_len);
    let test = rest.split_off(validation_len);
    Partition {
        train: pool,
        validation: rest,
        test,
    }
}
