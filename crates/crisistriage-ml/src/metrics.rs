//! Per-category evaluation metrics.
//!
//! Every category is scored as its own binary problem: confusion counts,
//! then precision, recall and F1 with zero denominators reported as 0.0
//! rather than NaN. [`ClassificationReport`] aggregates the per-category
//! rows plus macro and support-weighted averages and renders the familiar
//! fixed-width table.

use crisistriage_core::{CategoryVector, Result, TriageError, CATEGORY_COUNT, CATEGORY_NAMES};
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Confusion counts
// ---------------------------------------------------------------------------

/// Binary confusion counts for one category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfusionCounts {
    pub tp: usize,
    pub fp: usize,
    pub tn: usize,
    pub fn_count: usize,
}

impl ConfusionCounts {
    pub fn record(&mut self, predicted: bool, actual: bool) {
        match (predicted, actual) {
            (true, true) => self.tp += 1,
            (true, false) => self.fp += 1,
            (false, true) => self.fn_count += 1,
            (false, false) => self.tn += 1,
        }
    }

    /// TP / (TP + FP); 0.0 when nothing was predicted positive.
    pub fn precision(&self) -> f64 {
        ratio(self.tp, self.tp + self.fp)
    }

    /// TP / (TP + FN); 0.0 when no positives exist.
    pub fn recall(&self) -> f64 {
        ratio(self.tp, self.tp + self.fn_count)
    }

    /// Harmonic mean of precision and recall; 0.0 when both are 0.
    pub fn f1(&self) -> f64 {
        let p = self.precision();
        let r = self.recall();
        if p + r == 0.0 {
            0.0
        } else {
            2.0 * p * r / (p + r)
        }
    }

    /// Number of actual positives.
    pub fn support(&self) -> usize {
        self.tp + self.fn_count
    }

    pub fn total(&self) -> usize {
        self.tp + self.fp + self.tn + self.fn_count
    }
}

fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

// ---------------------------------------------------------------------------
// Classification report
// ---------------------------------------------------------------------------

/// One category's row in the report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelReport {
    pub name: String,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub support: usize,
}

/// Evaluation over the full category registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationReport {
    pub labels: Vec<LabelReport>,
    pub samples: usize,
}

impl ClassificationReport {
    /// Scores `predictions` against `truth` row by row.
    pub fn compute(predictions: &[CategoryVector], truth: &[CategoryVector]) -> Result<Self> {
        if predictions.len() != truth.len() {
            return Err(TriageError::Training(format!(
                "{} predictions against {} truth rows",
                predictions.len(),
                truth.len()
            )));
        }
        if predictions.is_empty() {
            return Err(TriageError::Training(
                "cannot evaluate zero rows".to_string(),
            ));
        }

        let mut counts = [ConfusionCounts::default(); CATEGORY_COUNT];
        for (predicted, actual) in predictions.iter().zip(truth.iter()) {
            for k in 0..CATEGORY_COUNT {
                counts[k].record(predicted.get(k) == 1, actual.get(k) == 1);
            }
        }

        let labels = CATEGORY_NAMES
            .iter()
            .zip(counts.iter())
            .map(|(&name, c)| LabelReport {
                name: name.to_string(),
                precision: c.precision(),
                recall: c.recall(),
                f1: c.f1(),
                support: c.support(),
            })
            .collect();
        Ok(ClassificationReport {
            labels,
            samples: predictions.len(),
        })
    }

    /// Unweighted mean F1 across categories.
    pub fn macro_f1(&self) -> f64 {
        mean(self.labels.iter().map(|l| l.f1))
    }

    pub fn macro_precision(&self) -> f64 {
        mean(self.labels.iter().map(|l| l.precision))
    }

    pub fn macro_recall(&self) -> f64 {
        mean(self.labels.iter().map(|l| l.recall))
    }

    /// Support-weighted mean F1; 0.0 when no category has any positives.
    pub fn weighted_f1(&self) -> f64 {
        let total: usize = self.labels.iter().map(|l| l.support).sum();
        if total == 0 {
            return 0.0;
        }
        self.labels
            .iter()
            .map(|l| l.f1 * l.support as f64)
            .sum::<f64>()
            / total as f64
    }
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let mut sum = 0.0;
    let mut count = 0usize;
    for v in values {
        sum += v;
        count += 1;
    }
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

impl fmt::Display for ClassificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{:<24} {:>9} {:>9} {:>9} {:>9}",
            "", "precision", "recall", "f1-score", "support"
        )?;
        writeln!(f)?;
        for label in &self.labels {
            writeln!(
                f,
                "{:<24} {:>9.3} {:>9.3} {:>9.3} {:>9}",
                label.name, label.precision, label.recall, label.f1, label.support
            )?;
        }
        writeln!(f)?;
        writeln!(
            f,
            "{:<24} {:>9.3} {:>9.3} {:>9.3} {:>9}",
            "macro avg",
            self.macro_precision(),
            self.macro_recall(),
            self.macro_f1(),
            self.samples
        )?;
        write!(
            f,
            "{:<24} {:>29.3} {:>9}",
            "weighted avg f1",
            self.weighted_f1(),
            self.samples
        )
    }
}

/// Convenience for the grid search: macro F1 straight from predictions.
pub fn macro_f1(predictions: &[CategoryVector], truth: &[CategoryVector]) -> Result<f64> {
    Ok(ClassificationReport::compute(predictions, truth)?.macro_f1())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn vector(active: &[usize]) -> CategoryVector {
        let mut v = CategoryVector::zeros();
        for &k in active {
            v.set(k, 1);
        }
        v
    }

    #[test]
    fn test_confusion_counts() {
        let mut counts = ConfusionCounts::default();
        // 3 TP, 1 FP, 2 FN, 4 TN.
        for _ in 0..3 {
            counts.record(true, true);
        }
        counts.record(true, false);
        for _ in 0..2 {
            counts.record(false, true);
        }
        for _ in 0..4 {
            counts.record(false, false);
        }

        assert_eq!(counts.total(), 10);
        assert_eq!(counts.support(), 5);
        assert!((counts.precision() - 0.75).abs() < 1e-9);
        assert!((counts.recall() - 0.6).abs() < 1e-9);
        // F1 = 2 * 0.75 * 0.6 / 1.35 = 2/3.
        assert!((counts.f1() - 2.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_zero_denominators() {
        let counts = ConfusionCounts {
            tp: 0,
            fp: 0,
            tn: 5,
            fn_count: 0,
        };
        assert_eq!(counts.precision(), 0.0);
        assert_eq!(counts.recall(), 0.0);
        assert_eq!(counts.f1(), 0.0);
    }

    #[test]
    fn test_report_per_label() {
        let truth = vec![vector(&[0, 10]), vector(&[0]), vector(&[10]), vector(&[])];
        let predictions = vec![vector(&[0, 10]), vector(&[0, 10]), vector(&[]), vector(&[])];
        let report = ClassificationReport::compute(&predictions, &truth).unwrap();

        assert_eq!(report.samples, 4);
        assert_eq!(report.labels.len(), CATEGORY_COUNT);

        // Category 0: TP=2, FP=0, FN=0 -> perfect.
        let related = &report.labels[0];
        assert_eq!(related.support, 2);
        assert!((related.precision - 1.0).abs() < 1e-9);
        assert!((related.recall - 1.0).abs() < 1e-9);

        // Category 10: TP=1, FP=1, FN=1 -> precision 0.5, recall 0.5.
        let water = &report.labels[10];
        assert_eq!(water.name, "water");
        assert_eq!(water.support, 2);
        assert!((water.precision - 0.5).abs() < 1e-9);
        assert!((water.recall - 0.5).abs() < 1e-9);
        assert!((water.f1 - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_macro_and_weighted_averages() {
        let truth = vec![vector(&[0]), vector(&[0]), vector(&[10])];
        let predictions = vec![vector(&[0]), vector(&[0]), vector(&[])];
        let report = ClassificationReport::compute(&predictions, &truth).unwrap();

        // Label 0 has F1 1.0 (support 2); label 10 has F1 0.0 (support 1);
        // the other 34 labels have no positives and score 0.
        let expected_macro = 1.0 / CATEGORY_COUNT as f64;
        assert!((report.macro_f1() - expected_macro).abs() < 1e-9);
        assert!((report.weighted_f1() - 2.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_perfect_predictions() {
        let truth = vec![vector(&[0, 5, 10]), vector(&[1])];
        let report = ClassificationReport::compute(&truth, &truth).unwrap();
        assert!((report.weighted_f1() - 1.0).abs() < 1e-9);
        // Categories with no positives drag the macro average below 1.
        assert!(report.macro_f1() < 1.0);
    }

    #[test]
    fn test_display_lists_categories() {
        let truth = vec![vector(&[0]), vector(&[10])];
        let report = ClassificationReport::compute(&truth, &truth).unwrap();
        let rendered = report.to_string();
        assert!(rendered.contains("related"));
        assert!(rendered.contains("direct_report"));
        assert!(rendered.contains("macro avg"));
        assert!(rendered.contains("support"));
    }

    #[test]
    fn test_length_mismatch_is_rejected() {
        let a = vec![vector(&[0])];
        assert!(ClassificationReport::compute(&a, &[]).is_err());
        assert!(ClassificationReport::compute(&[], &[]).is_err());
    }

    #[test]
    fn test_macro_f1_helper() {
        let truth = vec![vector(&[0]), vector(&[0])];
        let score = macro_f1(&truth, &truth).unwrap();
        assert!((score - 1.0 / CATEGORY_COUNT as f64).abs() < 1e-9);
    }
}
