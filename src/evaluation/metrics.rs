//! Classification metrics with support-weighted averaging

use ndarray::Array1;
use serde::Serialize;
use std::collections::BTreeMap;

/// Accuracy plus support-weighted precision/recall/F1.
#[derive(Debug, Clone, Serialize)]
pub struct ClassificationReport {
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1_score: f64,
}

/// Compare predicted labels against true labels.
///
/// Weighted metrics average the per-class values weighted by each class's
/// support (row count) in the true labels; classes that appear only in the
/// predictions contribute no weight.
pub fn classification_report(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> ClassificationReport {
    let n = y_true.len();
    if n == 0 {
        return ClassificationReport {
            accuracy: 0.0,
            precision: 0.0,
            recall: 0.0,
            f1_score: 0.0,
        };
    }

    let true_keys: Vec<i64> = y_true.iter().map(|&v| label_key(v)).collect();
    let pred_keys: Vec<i64> = y_pred.iter().map(|&v| label_key(v)).collect();

    let correct = true_keys
        .iter()
        .zip(pred_keys.iter())
        .filter(|(t, p)| t == p)
        .count();
    let accuracy = correct as f64 / n as f64;

    // tp / fp / fn per class over the union of observed labels
    let mut counts: BTreeMap<i64, ClassCounts> = BTreeMap::new();
    for (&t, &p) in true_keys.iter().zip(pred_keys.iter()) {
        counts.entry(t).or_default().support += 1;
        counts.entry(p).or_default();
        if t == p {
            counts.entry(t).or_default().tp += 1;
        } else {
            counts.entry(p).or_default().fp += 1;
            counts.entry(t).or_default().fn_ += 1;
        }
    }

    let total_support: usize = counts.values().map(|c| c.support).sum();
    let mut precision = 0.0;
    let mut recall = 0.0;
    let mut f1 = 0.0;

    for class in counts.values() {
        if class.support == 0 {
            continue;
        }
        let weight = class.support as f64 / total_support as f64;
        let p = ratio(class.tp, class.tp + class.fp);
        let r = ratio(class.tp, class.tp + class.fn_);
        let f = if p + r > 0.0 {
            2.0 * p * r / (p + r)
        } else {
            0.0
        };
        precision += weight * p;
        recall += weight * r;
        f1 += weight * f;
    }

    ClassificationReport {
        accuracy,
        precision,
        recall,
        f1_score: f1,
    }
}

#[derive(Default)]
struct ClassCounts {
    tp: usize,
    fp: usize,
    fn_: usize,
    support: usize,
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

/// Labels are integer-coded floats; compare by rounded value.
fn label_key(value: f64) -> i64 {
    value.round() as i64
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_perfect_predictions() {
        let y = array![0.0, 1.0, 2.0, 1.0];
        let report = classification_report(&y, &y);

        assert_eq!(report.accuracy, 1.0);
        assert_eq!(report.precision, 1.0);
        assert_eq!(report.recall, 1.0);
        assert_eq!(report.f1_score, 1.0);
    }

    #[test]
    fn test_accuracy_is_exact_match_fraction() {
        let y_true = array![0.0, 0.0, 0.0, 1.0, 1.0];
        let y_pred = array![0.0, 0.0, 1.0, 1.0, 0.0];

        let report = classification_report(&y_true, &y_pred);
        assert!((report.accuracy - 0.6).abs() < 1e-12);
    }

    #[test]
    fn test_weighted_metrics_binary() {
        // y_true: class 0 support 3, class 1 support 1
        let y_true = array![0.0, 0.0, 0.0, 1.0];
        let y_pred = array![0.0, 0.0, 1.0, 1.0];

        // class 0: p = 2/2, r = 2/3, f1 = 0.8
        // class 1: p = 1/2, r = 1/1, f1 = 2/3
        let report = classification_report(&y_true, &y_pred);
        let expected_p = 0.75 * 1.0 + 0.25 * 0.5;
        let expected_r = 0.75 * (2.0 / 3.0) + 0.25 * 1.0;
        let expected_f = 0.75 * 0.8 + 0.25 * (2.0 / 3.0);

        assert!((report.precision - expected_p).abs() < 1e-12);
        assert!((report.recall - expected_r).abs() < 1e-12);
        assert!((report.f1_score - expected_f).abs() < 1e-12);
    }

    #[test]
    fn test_predicted_only_class_has_no_weight() {
        // Class 2 never appears in y_true, so it must not dilute the
        // weighted averages.
        let y_true = array![0.0, 0.0];
        let y_pred = array![0.0, 2.0];

        let report = classification_report(&y_true, &y_pred);
        assert!((report.accuracy - 0.5).abs() < 1e-12);
        // class 0: p = 1/1, r = 1/2; weight 1.0
        assert!((report.precision - 1.0).abs() < 1e-12);
        assert!((report.recall - 0.5).abs() < 1e-12);
    }
}
