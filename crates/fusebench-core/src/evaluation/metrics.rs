//! Standard Information Retrieval metrics over fused rankings.
//!
//! - NDCG@k (Normalized Discounted Cumulative Gain, linear gain)
//! - MAP@k (Average Precision truncated at k)
//! - MRR (Reciprocal Rank over the full ranking)
//! - Precision@k, Recall@k, F1@k
//!
//! Every metric is a pure function of one query's ranking and judgment and
//! lies in [0, 1]. Cases with a zero denominator score 0.
//!
//! A document repeated in a ranking only counts at its first position, so the
//! bounds hold for any input, not just fusion output.
//!
//! # References
//!
//! - Järvelin & Kekäläinen (2002). "Cumulated gain-based evaluation of IR techniques"
//! - Voorhees & Harman (2005). "TREC: Experiment and Evaluation in Information Retrieval"

use super::judgments::RelevanceJudgment;
use crate::error::ConfigError;
use crate::search::types::{DocId, FusedEntry};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Evaluation metrics for one (query, method) pair at a fixed cutoff k.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricRecord {
    /// Fraction of relevant documents found in the top k
    pub recall_at_k: f64,
    /// Fraction of the top k that is relevant
    pub precision_at_k: f64,
    /// Harmonic mean of precision@k and recall@k
    pub f1_at_k: f64,
    /// Reciprocal rank of the first relevant result
    pub mrr: f64,
    /// Normalized discounted cumulative gain at k
    pub ndcg_at_k: f64,
    /// Average precision truncated at k
    pub map_at_k: f64,
}

/// Computes every metric for one query's fused ranking.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidCutoff`] when `k == 0`.
///
/// # Example
///
/// ```
/// use fusebench_core::evaluation::{evaluate, RelevanceJudgment};
/// use fusebench_core::search::{fuse, FusionConfig, RankedList};
/// use std::collections::BTreeMap;
///
/// let mut lists = BTreeMap::new();
/// lists.insert("dense".to_string(), RankedList::from_scored([("B", 0.9), ("C", 0.8), ("D", 0.2)]).unwrap());
/// let fused = fuse(&lists, &FusionConfig::default(), 3).unwrap();
///
/// let record = evaluate(&fused, &RelevanceJudgment::binary(["B", "C"]), 3).unwrap();
/// assert_eq!(record.recall_at_k, 1.0);
/// assert_eq!(record.map_at_k, 1.0);
/// ```
pub fn evaluate(
    results: &[FusedEntry],
    judgment: &RelevanceJudgment,
    k: usize,
) -> Result<MetricRecord, ConfigError> {
    if k == 0 {
        return Err(ConfigError::InvalidCutoff(k));
    }

    let precision = precision_at_k(results, judgment, k);
    let recall = recall_at_k(results, judgment, k);

    Ok(MetricRecord {
        recall_at_k: recall,
        precision_at_k: precision,
        f1_at_k: harmonic_mean(precision, recall),
        mrr: reciprocal_rank(results, judgment),
        ndcg_at_k: ndcg_at_k(results, judgment, k),
        map_at_k: average_precision_at_k(results, judgment, k),
    })
}

/// Relevance grade of each of the first `limit` results, in rank order.
///
/// Repeated documents get grade 0 after their first occurrence.
fn grades(results: &[FusedEntry], judgment: &RelevanceJudgment, limit: usize) -> Vec<u32> {
    let mut seen: HashSet<&DocId> = HashSet::new();
    results
        .iter()
        .take(limit)
        .map(|entry| {
            if seen.insert(&entry.doc_id) {
                judgment.grade(&entry.doc_id)
            } else {
                0
            }
        })
        .collect()
}

fn relevant_in_top_k(results: &[FusedEntry], judgment: &RelevanceJudgment, k: usize) -> usize {
    grades(results, judgment, k)
        .into_iter()
        .filter(|&g| g > 0)
        .count()
}

// ============================================================================
// NDCG (Normalized Discounted Cumulative Gain)
// ============================================================================

/// Computes NDCG@k with linear gain.
///
/// # Formula
///
/// ```text
/// DCG@k  = Σ rel_i / log₂(i + 1)  for i in 1..=k
/// IDCG@k = DCG@k of the ideal ordering (grades descending, padded with zeros)
/// NDCG@k = DCG@k / IDCG@k, or 0 when IDCG@k = 0
/// ```
///
/// Binary judgments use grade 1 for relevant documents.
pub fn ndcg_at_k(results: &[FusedEntry], judgment: &RelevanceJudgment, k: usize) -> f64 {
    let actual = dcg(&grades(results, judgment, k));
    let ideal: Vec<u32> = judgment.ideal_grades().into_iter().take(k).collect();
    let idcg = dcg(&ideal);

    if idcg == 0.0 {
        0.0
    } else {
        (actual / idcg).min(1.0)
    }
}

fn dcg(grades: &[u32]) -> f64 {
    grades
        .iter()
        .enumerate()
        .map(|(i, &grade)| grade as f64 / discount(i + 1))
        .sum()
}

/// Logarithmic discount for a 1-based position: log₂(position + 1).
#[inline]
fn discount(position: usize) -> f64 {
    (position as f64 + 1.0).log2()
}

// ============================================================================
// MAP (Average Precision at k)
// ============================================================================

/// Computes Average Precision truncated at k.
///
/// # Formula
///
/// ```text
/// AP@k = Σ P@i · rel(i) / min(|relevant|, k)   for i in 1..=k
/// ```
///
/// The `min(|relevant|, k)` denominator means a ranking that fills all k
/// slots with relevant documents scores 1 even when more relevant documents
/// exist.
pub fn average_precision_at_k(
    results: &[FusedEntry],
    judgment: &RelevanceJudgment,
    k: usize,
) -> f64 {
    let denominator = judgment.total_relevant().min(k);
    if denominator == 0 {
        return 0.0;
    }

    let mut precision_sum = 0.0;
    let mut relevant_found = 0usize;

    for (i, grade) in grades(results, judgment, k).into_iter().enumerate() {
        if grade > 0 {
            relevant_found += 1;
            precision_sum += relevant_found as f64 / (i + 1) as f64;
        }
    }

    precision_sum / denominator as f64
}

// ============================================================================
// MRR (Reciprocal Rank)
// ============================================================================

/// Computes Reciprocal Rank over the full (untruncated) ranking.
///
/// ```text
/// RR = 1 / rank_of_first_relevant_result, or 0 if none is relevant
/// ```
pub fn reciprocal_rank(results: &[FusedEntry], judgment: &RelevanceJudgment) -> f64 {
    results
        .iter()
        .position(|entry| judgment.is_relevant(&entry.doc_id))
        .map_or(0.0, |i| 1.0 / (i + 1) as f64)
}

// ============================================================================
// Set-Based Metrics: Precision, Recall, F1
// ============================================================================

/// Computes Precision@k: `|relevant ∩ top_k| / k`.
///
/// The denominator is always k, so a ranking shorter than k is penalized.
pub fn precision_at_k(results: &[FusedEntry], judgment: &RelevanceJudgment, k: usize) -> f64 {
    if k == 0 {
        return 0.0;
    }
    relevant_in_top_k(results, judgment, k) as f64 / k as f64
}

/// Computes Recall@k: `|relevant ∩ top_k| / |relevant|`, or 0 without
/// relevant documents.
pub fn recall_at_k(results: &[FusedEntry], judgment: &RelevanceJudgment, k: usize) -> f64 {
    let total_relevant = judgment.total_relevant();
    if total_relevant == 0 {
        return 0.0;
    }
    relevant_in_top_k(results, judgment, k) as f64 / total_relevant as f64
}

/// Computes F1@k, the harmonic mean of Precision@k and Recall@k.
pub fn f1_at_k(results: &[FusedEntry], judgment: &RelevanceJudgment, k: usize) -> f64 {
    harmonic_mean(
        precision_at_k(results, judgment, k),
        recall_at_k(results, judgment, k),
    )
}

fn harmonic_mean(precision: f64, recall: f64) -> f64 {
    if precision + recall == 0.0 {
        0.0
    } else {
        2.0 * precision * recall / (precision + recall)
    }
}

// ============================================================================
// Tests
// ============================================================================
