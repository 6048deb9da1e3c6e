//! Aggregation of per-query metrics and side-by-side method comparison.

use super::judgments::JudgmentStore;
use super::metrics::{evaluate, MetricRecord};
use crate::error::ConfigError;
use crate::search::types::FusedEntry;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;
use tracing::{debug, info, warn};

/// Metric used to rank methods in a [`ComparisonReport`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrimaryMetric {
    /// Recall@k
    Recall,
    /// Precision@k
    Precision,
    /// F1@k
    F1,
    /// Mean reciprocal rank
    Mrr,
    /// NDCG@k
    #[default]
    Ndcg,
    /// MAP@k
    Map,
}

impl PrimaryMetric {
    /// All metrics in report column order.
    pub const ALL: [PrimaryMetric; 6] = [
        PrimaryMetric::Recall,
        PrimaryMetric::Precision,
        PrimaryMetric::F1,
        PrimaryMetric::Mrr,
        PrimaryMetric::Ndcg,
        PrimaryMetric::Map,
    ];

    /// Reads this metric's value from a record.
    pub fn value(self, record: &MetricRecord) -> f64 {
        match self {
            PrimaryMetric::Recall => record.recall_at_k,
            PrimaryMetric::Precision => record.precision_at_k,
            PrimaryMetric::F1 => record.f1_at_k,
            PrimaryMetric::Mrr => record.mrr,
            PrimaryMetric::Ndcg => record.ndcg_at_k,
            PrimaryMetric::Map => record.map_at_k,
        }
    }

    /// Column label at cutoff `k`, e.g. `NDCG@10`. MRR has no cutoff.
    pub fn label(self, k: usize) -> String {
        match self {
            PrimaryMetric::Mrr => "MRR".to_string(),
            other => format!("{}@{}", other, k),
        }
    }
}

impl fmt::Display for PrimaryMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PrimaryMetric::Recall => "Recall",
            PrimaryMetric::Precision => "Precision",
            PrimaryMetric::F1 => "F1",
            PrimaryMetric::Mrr => "MRR",
            PrimaryMetric::Ndcg => "NDCG",
            PrimaryMetric::Map => "MAP",
        };
        f.write_str(name)
    }
}

impl FromStr for PrimaryMetric {
    type Err = ConfigError;

    /// Parses a metric name, case-insensitively, with an optional `@k` suffix.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.split('@').next().unwrap_or(s).trim().to_ascii_lowercase();
        match name.as_str() {
            "recall" => Ok(PrimaryMetric::Recall),
            "precision" => Ok(PrimaryMetric::Precision),
            "f1" => Ok(PrimaryMetric::F1),
            "mrr" => Ok(PrimaryMetric::Mrr),
            "ndcg" => Ok(PrimaryMetric::Ndcg),
            "map" => Ok(PrimaryMetric::Map),
            _ => Err(ConfigError::UnknownMetric(s.to_string())),
        }
    }
}

/// Aggregated results of one method.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MethodSummary {
    /// Arithmetic mean of every metric over scored queries
    pub metrics: MetricRecord,
    /// Queries that had a judgment and were scored
    pub scored_queries: usize,
    /// Queries with results but no judgment
    pub skipped_queries: usize,
    /// Per-query records, keyed by query id
    pub per_query: BTreeMap<String, MetricRecord>,
}

/// Non-fatal conditions found while comparing methods.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ComparisonWarning {
    /// A method returned results for queries that have no judgment.
    MissingJudgments {
        /// Method with unjudged queries
        method: String,
        /// Number of skipped queries
        count: usize,
    },
    /// Methods were scored on different numbers of queries, so their means
    /// are not directly comparable.
    ScoredCountMismatch {
        /// Scored queries per method
        counts: BTreeMap<String, usize>,
    },
}

impl fmt::Display for ComparisonWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ComparisonWarning::MissingJudgments { method, count } => write!(
                f,
                "method '{}' has results for {} quer{} without judgments (skipped)",
                method,
                count,
                if *count == 1 { "y" } else { "ies" }
            ),
            ComparisonWarning::ScoredCountMismatch { counts } => {
                let detail: Vec<String> = counts
                    .iter()
                    .map(|(method, count)| format!("{}={}", method, count))
                    .collect();
                write!(f, "methods scored different query counts: {}", detail.join(", "))
            }
        }
    }
}

/// Side-by-side comparison of retrieval methods at one cutoff.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonReport {
    /// Metric cutoff
    pub k: usize,
    /// Metric used for ranking
    pub primary_metric: PrimaryMetric,
    /// Distinct query ids seen across all methods
    pub total_queries: usize,
    /// Per-method summaries
    pub methods: BTreeMap<String, MethodSummary>,
    /// Method names, best first
    pub ranking: Vec<String>,
    /// Non-fatal conditions, in detection order
    pub warnings: Vec<ComparisonWarning>,
}

impl ComparisonReport {
    /// Methods in ranking order with their 1-based position.
    pub fn ranked(&self) -> impl Iterator<Item = (usize, &str, &MethodSummary)> + '_ {
        self.ranking
            .iter()
            .enumerate()
            .filter_map(move |(i, name)| {
                self.methods
                    .get(name)
                    .map(|summary| (i + 1, name.as_str(), summary))
            })
    }

    /// The top-ranked method, if any method was compared.
    pub fn best(&self) -> Option<(&str, &MethodSummary)> {
        self.ranked().next().map(|(_, name, summary)| (name, summary))
    }

    /// Primary metric value of a method.
    pub fn primary_value(&self, method: &str) -> Option<f64> {
        self.methods
            .get(method)
            .map(|summary| self.primary_metric.value(&summary.metrics))
    }
}

/// Arithmetic mean of every field over the given records.
///
/// Records are summed in key order so the result does not depend on how the
/// map was built. No records yields the all-zero record.
pub fn aggregate(records: &BTreeMap<String, MetricRecord>) -> MetricRecord {
    if records.is_empty() {
        return MetricRecord::default();
    }

    let mut sum = MetricRecord::default();
    for record in records.values() {
        sum.recall_at_k += record.recall_at_k;
        sum.precision_at_k += record.precision_at_k;
        sum.f1_at_k += record.f1_at_k;
        sum.mrr += record.mrr;
        sum.ndcg_at_k += record.ndcg_at_k;
        sum.map_at_k += record.map_at_k;
    }

    let n = records.len() as f64;
    MetricRecord {
        recall_at_k: sum.recall_at_k / n,
        precision_at_k: sum.precision_at_k / n,
        f1_at_k: sum.f1_at_k / n,
        mrr: sum.mrr / n,
        ndcg_at_k: sum.ndcg_at_k / n,
        map_at_k: sum.map_at_k / n,
    }
}

/// Scores one method's results against the judgments.
///
/// Queries without a judgment entry are skipped and counted. Judged queries
/// the method returned nothing for are not scored here; pass an empty list to
/// score them as misses.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidCutoff`] when `k == 0`.
pub fn evaluate_method(
    results: &BTreeMap<String, Vec<FusedEntry>>,
    judgments: &JudgmentStore,
    k: usize,
) -> Result<MethodSummary, ConfigError> {
    if k == 0 {
        return Err(ConfigError::InvalidCutoff(k));
    }

    let mut per_query = BTreeMap::new();
    let mut skipped_queries = 0;

    for (query_id, fused) in results {
        match judgments.get(query_id) {
            Some(judgment) => {
                per_query.insert(query_id.clone(), evaluate(fused, judgment, k)?);
            }
            None => skipped_queries += 1,
        }
    }

    Ok(MethodSummary {
        metrics: aggregate(&per_query),
        scored_queries: per_query.len(),
        skipped_queries,
        per_query,
    })
}

/// Evaluates every method and ranks them by the primary metric.
///
/// Methods are evaluated in parallel. Ranking is by the primary metric's mean
/// descending, with ties broken by method name ascending.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidCutoff`] when `k == 0`.
///
/// # Example
///
/// ```
/// use fusebench_core::evaluation::{compare, JudgmentStore, PrimaryMetric, RelevanceJudgment};
/// use fusebench_core::search::RankedList;
/// use std::collections::BTreeMap;
///
/// let judgments: JudgmentStore = [("q1", RelevanceJudgment::binary(["a"]))].into_iter().collect();
///
/// let good = RankedList::from_scored([("a", 1.0), ("b", 0.5)]).unwrap();
/// let bad = RankedList::from_scored([("b", 1.0), ("a", 0.5)]).unwrap();
///
/// let good = BTreeMap::from([("q1".to_string(), good.to_fused("s", 10).unwrap())]);
/// let bad = BTreeMap::from([("q1".to_string(), bad.to_fused("s", 10).unwrap())]);
/// let methods = BTreeMap::from([("good".to_string(), good), ("bad".to_string(), bad)]);
///
/// let report = compare(&methods, &judgments, 10, PrimaryMetric::Mrr).unwrap();
/// assert_eq!(report.ranking, vec!["good", "bad"]);
/// assert_eq!(report.total_queries, 1);
/// ```
pub fn compare(
    per_method: &BTreeMap<String, BTreeMap<String, Vec<FusedEntry>>>,
    judgments: &JudgmentStore,
    k: usize,
    primary_metric: PrimaryMetric,
) -> Result<ComparisonReport, ConfigError> {
    let report = build_report(per_method, judgments, k, primary_metric)?;
    for warning in &report.warnings {
        warn!("{}", warning);
    }
    Ok(report)
}

/// Runs [`compare`] at every cutoff.
///
/// Which queries are scored does not depend on the cutoff, so every report
/// carries the same warnings. Each distinct warning is logged once.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidCutoff`] when a cutoff is 0.
pub fn compare_cutoffs(
    per_method: &BTreeMap<String, BTreeMap<String, Vec<FusedEntry>>>,
    judgments: &JudgmentStore,
    cutoffs: &[usize],
    primary_metric: PrimaryMetric,
) -> Result<BTreeMap<usize, ComparisonReport>, ConfigError> {
    let reports = cutoffs
        .iter()
        .map(|&k| {
            build_report(per_method, judgments, k, primary_metric).map(|report| (k, report))
        })
        .collect::<Result<BTreeMap<_, _>, ConfigError>>()?;

    for warning in distinct_warnings(&reports) {
        warn!("{}", warning);
    }
    Ok(reports)
}

/// Warnings of all reports, each once, in cutoff order.
pub fn distinct_warnings(
    reports: &BTreeMap<usize, ComparisonReport>,
) -> Vec<&ComparisonWarning> {
    let mut distinct: Vec<&ComparisonWarning> = Vec::new();
    for warning in reports.values().flat_map(|r| &r.warnings) {
        if !distinct.contains(&warning) {
            distinct.push(warning);
        }
    }
    distinct
}

fn build_report(
    per_method: &BTreeMap<String, BTreeMap<String, Vec<FusedEntry>>>,
    judgments: &JudgmentStore,
    k: usize,
    primary_metric: PrimaryMetric,
) -> Result<ComparisonReport, ConfigError> {
    if k == 0 {
        return Err(ConfigError::InvalidCutoff(k));
    }

    let summaries: Vec<(String, MethodSummary)> = per_method
        .par_iter()
        .map(|(method, results)| -> Result<(String, MethodSummary), ConfigError> {
            let summary = evaluate_method(results, judgments, k)?;
            info!(
                method = %method,
                scored = summary.scored_queries,
                skipped = summary.skipped_queries,
                "evaluated method"
            );
            Ok((method.clone(), summary))
        })
        .collect::<Result<_, ConfigError>>()?;
    let methods: BTreeMap<String, MethodSummary> = summaries.into_iter().collect();

    let total_queries = per_method
        .values()
        .flat_map(|results| results.keys())
        .collect::<BTreeSet<_>>()
        .len();

    let mut warnings = Vec::new();
    for (method, summary) in &methods {
        if summary.skipped_queries > 0 {
            warnings.push(ComparisonWarning::MissingJudgments {
                method: method.clone(),
                count: summary.skipped_queries,
            });
        }
    }

    let counts: BTreeMap<String, usize> = methods
        .iter()
        .map(|(method, summary)| (method.clone(), summary.scored_queries))
        .collect();
    if counts.values().collect::<BTreeSet<_>>().len() > 1 {
        warnings.push(ComparisonWarning::ScoredCountMismatch { counts });
    }

    let mut ranking: Vec<&String> = methods.keys().collect();
    ranking.sort_by(|a, b| {
        let value_a = primary_metric.value(&methods[*a].metrics);
        let value_b = primary_metric.value(&methods[*b].metrics);
        value_b.total_cmp(&value_a).then_with(|| a.cmp(b))
    });
    let ranking: Vec<String> = ranking.into_iter().cloned().collect();

    debug!(
        methods = methods.len(),
        total_queries,
        primary = %primary_metric,
        best = ranking.first().map(String::as_str).unwrap_or("-"),
        "compared methods"
    );

    Ok(ComparisonReport {
        k,
        primary_metric,
        total_queries,
        methods,
        ranking,
        warnings,
    })
}
