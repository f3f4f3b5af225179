//! Corpus-level scoring of extracted addresses against ground truth.
//!
//! Both sides are pooled across the whole corpus and reduced to sets before
//! comparison. Scores are global rather than averaged per document, so a
//! corpus of many one-address deeds does not outweigh a few long ones.

use std::collections::BTreeSet;
use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

use crate::corpus::csv_field;
use crate::pipeline::CorpusExtraction;

/// Outcome of one evaluation run. Lists are sorted for stable output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsReport {
    pub true_positives_count: usize,
    pub false_positives_count: usize,
    pub false_negatives_count: usize,
    /// Always zero: address extraction has no enumerable negative class.
    pub true_negatives_count: usize,
    pub precision: f64,
    pub recall: f64,
    pub f1_score: f64,
    pub true_positives: Vec<String>,
    pub false_positives: Vec<String>,
    pub false_negatives: Vec<String>,
}

impl MetricsReport {
    /// `metric,value` table: numeric metrics first, then one
    /// `<list>_value` row per listed address.
    #[must_use]
    pub fn to_csv(&self) -> String {
        let mut out = String::from("metric,value\n");

        let numeric: [(&str, String); 7] = [
            ("true_positives_count", self.true_positives_count.to_string()),
            ("false_positives_count", self.false_positives_count.to_string()),
            ("false_negatives_count", self.false_negatives_count.to_string()),
            ("true_negatives_count", self.true_negatives_count.to_string()),
            ("precision", self.precision.to_string()),
            ("recall", self.recall.to_string()),
            ("f1_score", self.f1_score.to_string()),
        ];
        for (metric, value) in numeric {
            let _ = writeln!(out, "{metric},{value}");
        }

        let lists = [
            ("true_positives", &self.true_positives),
            ("false_positives", &self.false_positives),
            ("false_negatives", &self.false_negatives),
        ];
        for (metric, items) in lists {
            for item in items {
                let _ = writeln!(out, "{metric}_value,{}", csv_field(item));
            }
        }

        out
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Set-based precision, recall and F1 of `predicted` against `actual`.
///
/// Duplicates on either side are collapsed first. Every ratio with a zero
/// denominator is reported as 0, so empty inputs still yield a report.
pub fn evaluate<P, A, S, T>(predicted: P, actual: A) -> MetricsReport
where
    P: IntoIterator<Item = S>,
    A: IntoIterator<Item = T>,
    S: Into<String>,
    T: Into<String>,
{
    let predicted: BTreeSet<String> = predicted.into_iter().map(Into::into).collect();
    let actual: BTreeSet<String> = actual.into_iter().map(Into::into).collect();

    let true_positives: Vec<String> = predicted.intersection(&actual).cloned().collect();
    let false_positives: Vec<String> = predicted.difference(&actual).cloned().collect();
    let false_negatives: Vec<String> = actual.difference(&predicted).cloned().collect();

    let tp = true_positives.len();
    let fp = false_positives.len();
    let fn_ = false_negatives.len();

    let precision = ratio(tp, tp + fp);
    let recall = ratio(tp, tp + fn_);
    let f1_score = if precision + recall > 0.0 {
        2.0 * precision * recall / (precision + recall)
    } else {
        0.0
    };

    MetricsReport {
        true_positives_count: tp,
        false_positives_count: fp,
        false_negatives_count: fn_,
        true_negatives_count: 0,
        precision,
        recall,
        f1_score,
        true_positives,
        false_positives,
        false_negatives,
    }
}

/// Pipeline output for the whole corpus against externally supplied
/// ground truth.
pub fn evaluate_corpus<T, S>(extraction: &CorpusExtraction, ground_truth: T) -> MetricsReport
where
    T: IntoIterator<Item = S>,
    S: Into<String>,
{
    evaluate(extraction.address_pool(), ground_truth)
}

/// Raw recognizer hits against the validated, normalized pipeline output.
///
/// Measures how much the shape check and normalization change what the
/// recognizer emits, without needing labelled data.
#[must_use]
pub fn evaluate_self_consistency(extraction: &CorpusExtraction) -> MetricsReport {
    evaluate(extraction.raw_pool.iter().cloned(), extraction.address_pool())
}

#[allow(clippy::cast_precision_loss)]
fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}
