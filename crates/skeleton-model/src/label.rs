//! Class labels and class-balance diagnostics.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Binary motion class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Label {
    Normal,
    Anomalous,
}

impl Label {
    pub const ALL: [Label; 2] = [Label::Normal, Label::Anomalous];

    /// Number of classes.
    pub const COUNT: usize = 2;

    /// Numeric class index: normal is 0, anomalous is 1.
    pub fn index(self) -> usize {
        match self {
            Label::Normal => 0,
            Label::Anomalous => 1,
        }
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Interpret a label-bucket directory name, if it names a class.
    pub fn from_bucket_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "normal" => Some(Label::Normal),
            "abnormal" | "anomalous" | "violent" => Some(Label::Anomalous),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Label::Normal => "normal",
            Label::Anomalous => "anomalous",
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Example counts per class.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassBalance {
    counts: BTreeMap<Label, usize>,
}

impl ClassBalance {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_labels(labels: impl IntoIterator<Item = Label>) -> Self {
        let mut balance = Self::new();
        for label in labels {
            balance.add(label);
        }
        balance
    }

    pub fn add(&mut self, label: Label) {
        *self.counts.entry(label).or_insert(0) += 1;
    }

    pub fn count(&self, label: Label) -> usize {
        self.counts.get(&label).copied().unwrap_or(0)
    }

    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }

    /// Share of the pool held by `label`, or 0 for an empty pool.
    pub fn fraction(&self, label: Label) -> f64 {
        match self.total() {
            0 => 0.0,
            total => self.count(label) as f64 / total as f64,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Label, usize)> + '_ {
        Label::ALL.into_iter().map(|label| (label, self.count(label)))
    }
}

impl fmt::Display for ClassBalance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .iter()
            .map(|(label, count)| format!("{label}={count}"))
            .collect();
        f.write_str(&parts.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_index() {
        assert_eq!(Label::Normal.index(), 0);
        assert_eq!(Label::Anomalous.index(), 1);
        assert_eq!(Label::from_index(1), Some(Label::Anomalous));
        assert_eq!(Label::from_index(2), None);
    }

    #[test]
    fn test_bucket_names() {
        assert_eq!(Label::from_bucket_name("Normal"), Some(Label::Normal));
        assert_eq!(Label::from_bucket_name("violent"), Some(Label::Anomalous));
        assert_eq!(Label::from_bucket_name("misc"), None);
    }

    #[test]
    fn test_balance_counts() {
        let balance = ClassBalance::from_labels([Label::Normal, Label::Anomalous, Label::Normal]);
        assert_eq!(balance.count(Label::Normal), 2);
        assert_eq!(balance.count(Label::Anomalous), 1);
        assert_eq!(balance.total(), 3);
        assert_eq!(balance.to_string(), "normal=2, anomalous=1");
        assert!((balance.fraction(Label::Normal) - 2.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_balance_serializes_by_name() {
        let balance = ClassBalance::from_labels([Label::Anomalous]);
        let json = serde_json::to_string(&balance).unwrap();
        assert_eq!(json, r#"{"counts":{"anomalous":1}}"#);
    }

    proptest::proptest! {
        #[test]
        fn prop_balance_sums_to_total(indices in proptest::collection::vec(0usize..Label::COUNT, 0..200)) {
            let labels: Vec<Label> = indices.iter().filter_map(|&i| Label::from_index(i)).collect();
            let balance = ClassBalance::from_labels(labels.iter().copied());
            let summed: usize = Label::ALL.iter().map(|&l| balance.count(l)).sum();
            proptest::prop_assert_eq!(summed, labels.len());
            proptest::prop_assert_eq!(balance.total(), labels.len());
        }
    }
}
