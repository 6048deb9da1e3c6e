//! Paired significance tests between methods.
//!
//! Each query is one paired observation: the primary metric of method A and of
//! method B on that query. Only queries scored by both methods are paired.

use anyhow::{anyhow, Result};
use elinor::statistical_tests::{pairs_from_maps, StudentTTest};
use fusebench_core::config::SIGNIFICANCE_ALPHA;
use fusebench_core::evaluation::{ComparisonReport, MethodSummary, PrimaryMetric};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::warn;

/// Result of a paired Student t-test between two methods.
#[derive(Debug, Clone, Serialize)]
pub struct Comparison {
    /// Method whose scores come first in each pair
    pub system_a: String,
    /// Method it is tested against
    pub system_b: String,
    /// Metric label, e.g. `NDCG@10`
    pub metric: String,
    /// Cutoff the metric was computed at
    pub k: usize,
    /// Queries scored by both methods
    pub num_pairs: usize,
    /// Two-sided p-value of the paired t-test
    pub p_value: f64,
    /// Standardized mean difference of the pairs
    pub effect_size: f64,
    /// Whether `p_value` is below [`SIGNIFICANCE_ALPHA`]
    pub significant: bool,
}

/// Per-query values of one metric, keyed by query id.
fn metric_scores(summary: &MethodSummary, metric: PrimaryMetric) -> BTreeMap<String, f64> {
    summary
        .per_query
        .iter()
        .map(|(query_id, record)| (query_id.clone(), metric.value(record)))
        .collect()
}

/// Restricts both maps to the queries they share.
fn shared_queries(
    a: &BTreeMap<String, f64>,
    b: &BTreeMap<String, f64>,
) -> (BTreeMap<String, f64>, BTreeMap<String, f64>) {
    let a_shared: BTreeMap<String, f64> = a
        .iter()
        .filter(|(q, _)| b.contains_key(*q))
        .map(|(q, v)| (q.clone(), *v))
        .collect();
    let b_shared = b
        .iter()
        .filter(|(q, _)| a.contains_key(*q))
        .map(|(q, v)| (q.clone(), *v))
        .collect();
    (a_shared, b_shared)
}

/// Paired t-test of `a` against `b` on per-query scores.
pub fn compare_systems(
    a: &str,
    scores_a: &BTreeMap<String, f64>,
    b: &str,
    scores_b: &BTreeMap<String, f64>,
    metric: &str,
    k: usize,
) -> Result<Comparison> {
    let (scores_a, scores_b) = shared_queries(scores_a, scores_b);
    let pairs = pairs_from_maps(&scores_a, &scores_b).map_err(|e| anyhow!("{}", e))?;
    let stat = StudentTTest::from_paired_samples(pairs.iter().copied())
        .map_err(|e| anyhow!("t-test {} vs {}: {}", a, b, e))?;

    Ok(Comparison {
        system_a: a.to_string(),
        system_b: b.to_string(),
        metric: metric.to_string(),
        k,
        num_pairs: pairs.len(),
        p_value: stat.p_value(),
        effect_size: stat.effect_size(),
        significant: stat.p_value() < SIGNIFICANCE_ALPHA,
    })
}

/// Tests the top-ranked method against every other method.
///
/// Pairs that cannot be tested (fewer than two shared queries, zero variance)
/// are skipped with a warning.
pub fn best_vs_rest(report: &ComparisonReport) -> Vec<Comparison> {
    let Some((best, best_summary)) = report.best() else {
        return Vec::new();
    };
    let metric = report.primary_metric;
    let label = metric.label(report.k);
    let best_scores = metric_scores(best_summary, metric);

    report
        .ranked()
        .skip(1)
        .filter_map(|(_, other, summary)| {
            let other_scores = metric_scores(summary, metric);
            match compare_systems(best, &best_scores, other, &other_scores, &label, report.k) {
                Ok(comparison) => Some(comparison),
                Err(e) => {
                    warn!("Skipping significance test {} vs {}: {:#}", best, other, e);
                    None
                }
            }
        })
        .collect()
}
