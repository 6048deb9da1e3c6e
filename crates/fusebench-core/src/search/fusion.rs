//! Result fusion: merges independently ranked lists into one ranking.
//!
//! Two strategies are supported, selected by [`FusionConfig`]:
//!
//! - **Reciprocal Rank Fusion**: `score(d) = Σ_source 1 / (rrf_k + rank_source(d))`
//! - **Weighted score fusion**: `score(d) = Σ_source weight_source × norm_source(d)`
//!   where `norm` min-max scales each source's own list onto [0, 1]
//!
//! Sources where a document is absent contribute 0. Equal fused scores are
//! ordered by ascending [`DocId`], and sources are visited in name order, so the
//! output is identical for identical inputs regardless of map iteration order.

use super::types::{DocId, FusedEntry, RankedList};
use crate::config::DEFAULT_RRF_K;
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// Name-level fusion strategy, as written in configs and on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FusionMethod {
    /// Reciprocal Rank Fusion
    ReciprocalRank,
    /// Weighted sum of normalized scores
    WeightedScore,
}

impl FromStr for FusionMethod {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "rrf" | "reciprocal_rank" | "reciprocal-rank" => Ok(FusionMethod::ReciprocalRank),
            "weighted" | "weighted_score" | "weighted-score" => Ok(FusionMethod::WeightedScore),
            _ => Err(ConfigError::UnknownMethod(s.to_string())),
        }
    }
}

impl fmt::Display for FusionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FusionMethod::ReciprocalRank => f.write_str("rrf"),
            FusionMethod::WeightedScore => f.write_str("weighted"),
        }
    }
}

/// Lower and upper raw-score bounds of a source.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreBounds {
    /// Score mapped to 0
    pub min: f64,
    /// Score mapped to 1
    pub max: f64,
}

/// How raw scores are mapped onto [0, 1] before weighted fusion.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "scope", content = "bounds", rename_all = "snake_case")]
pub enum Normalization {
    /// Min-max over each source's own result window for this query.
    #[default]
    PerList,
    /// Min-max over caller-supplied bounds (e.g. computed over the whole
    /// corpus), clamped to [0, 1]. Sources without bounds fall back to
    /// per-list scaling.
    Fixed(BTreeMap<String, ScoreBounds>),
}

/// Fusion strategy together with its parameters.
///
/// # Examples
///
/// ```
/// use fusebench_core::search::FusionConfig;
///
/// let rrf: FusionConfig = serde_json::from_str(r#"{"method": "rrf", "rrf_k": 30}"#).unwrap();
/// assert_eq!(rrf, FusionConfig::reciprocal_rank(30));
///
/// let weighted: FusionConfig = serde_json::from_str(
///     r#"{"method": "weighted", "weights": {"dense": 0.7, "sparse": 0.3}}"#,
/// ).unwrap();
/// assert!(weighted.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum FusionConfig {
    /// Reciprocal Rank Fusion
    #[serde(alias = "rrf")]
    ReciprocalRank {
        /// Smoothing constant, must be >= 1
        #[serde(default = "default_rrf_k")]
        rrf_k: u32,
    },
    /// Weighted sum of normalized scores
    #[serde(alias = "weighted")]
    WeightedScore {
        /// Weight per source name; must be non-negative and sum to > 0
        weights: BTreeMap<String, f64>,
        /// Score normalization scope
        #[serde(default)]
        normalization: Normalization,
    },
}

fn default_rrf_k() -> u32 {
    DEFAULT_RRF_K
}

impl Default for FusionConfig {
    fn default() -> Self {
        FusionConfig::reciprocal_rank(DEFAULT_RRF_K)
    }
}

impl FusionConfig {
    /// RRF with the given smoothing constant.
    pub fn reciprocal_rank(rrf_k: u32) -> Self {
        FusionConfig::ReciprocalRank { rrf_k }
    }

    /// Weighted fusion with per-list min-max normalization.
    pub fn weighted<I, S>(weights: I) -> Self
    where
        I: IntoIterator<Item = (S, f64)>,
        S: Into<String>,
    {
        FusionConfig::WeightedScore {
            weights: weights.into_iter().map(|(s, w)| (s.into(), w)).collect(),
            normalization: Normalization::PerList,
        }
    }

    /// Strategy name of this configuration.
    pub fn method(&self) -> FusionMethod {
        match self {
            FusionConfig::ReciprocalRank { .. } => FusionMethod::ReciprocalRank,
            FusionConfig::WeightedScore { .. } => FusionMethod::WeightedScore,
        }
    }

    /// Checks the parameters of the selected strategy.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::InvalidRrfK`] when `rrf_k < 1`
    /// - [`ConfigError::InvalidWeight`] for negative or non-finite weights
    /// - [`ConfigError::ZeroWeightSum`] when the weights sum to zero
    /// - [`ConfigError::InvalidBounds`] for unusable fixed bounds
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self {
            FusionConfig::ReciprocalRank { rrf_k } => {
                if *rrf_k < 1 {
                    return Err(ConfigError::InvalidRrfK(*rrf_k));
                }
            }
            FusionConfig::WeightedScore {
                weights,
                normalization,
            } => {
                for (source, &weight) in weights {
                    if !weight.is_finite() || weight < 0.0 {
                        return Err(ConfigError::InvalidWeight {
                            source_name: source.clone(),
                            weight,
                        });
                    }
                }
                if weights.values().sum::<f64>() <= 0.0 {
                    return Err(ConfigError::ZeroWeightSum);
                }
                if let Normalization::Fixed(bounds) = normalization {
                    for (source, b) in bounds {
                        if !b.min.is_finite() || !b.max.is_finite() || b.max < b.min {
                            return Err(ConfigError::InvalidBounds {
                                source_name: source.clone(),
                                min: b.min,
                                max: b.max,
                            });
                        }
                    }
                }
            }
        }
        Ok(())
    }
}

impl fmt::Display for FusionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FusionConfig::ReciprocalRank { rrf_k } => write!(f, "rrf(k={})", rrf_k),
            FusionConfig::WeightedScore { weights, .. } => {
                let parts: Vec<String> = weights
                    .iter()
                    .map(|(s, w)| format!("{}={}", s, w))
                    .collect();
                write!(f, "weighted({})", parts.join(", "))
            }
        }
    }
}

/// Accumulated score of one document across sources.
#[derive(Debug, Default)]
struct Candidate {
    score: f64,
    source_ranks: BTreeMap<String, u32>,
}

/// Fuses one query's source lists into a single ranking.
///
/// # Arguments
///
/// * `lists` - Source name → that source's ranked list for the query
/// * `config` - Fusion strategy and parameters
/// * `top_k` - Maximum number of fused entries to return
///
/// # Errors
///
/// Returns [`ConfigError`] when `top_k == 0` or the config is invalid. No
/// other failure is possible; empty input yields an empty result.
///
/// # Example
///
/// ```
/// use fusebench_core::search::{fuse, DocId, FusionConfig, RankedList};
/// use std::collections::BTreeMap;
///
/// let lists = BTreeMap::from([
///     ("dense".to_string(), RankedList::from_scored([("A", 0.9), ("B", 0.8), ("C", 0.7)]).unwrap()),
///     ("sparse".to_string(), RankedList::from_scored([("B", 12.0), ("C", 9.0), ("D", 4.0)]).unwrap()),
/// ]);
/// let fused = fuse(&lists, &FusionConfig::reciprocal_rank(60), 3).unwrap();
/// assert_eq!(fused[0].doc_id, DocId::from("B"));
/// ```
pub fn fuse(
    lists: &BTreeMap<String, RankedList>,
    config: &FusionConfig,
    top_k: usize,
) -> Result<Vec<FusedEntry>, ConfigError> {
    fuse_sources(lists.iter().map(|(s, l)| (s.as_str(), l)), config, top_k)
}

/// Same as [`fuse`] for borrowed `(source, list)` pairs.
///
/// Sources are visited in name order whatever the iteration order of the
/// input. If a source name repeats, the last list wins.
pub fn fuse_sources<'a, I>(
    lists: I,
    config: &FusionConfig,
    top_k: usize,
) -> Result<Vec<FusedEntry>, ConfigError>
where
    I: IntoIterator<Item = (&'a str, &'a RankedList)>,
{
    if top_k == 0 {
        return Err(ConfigError::InvalidCutoff(top_k));
    }
    config.validate()?;

    let lists: BTreeMap<&str, &RankedList> = lists.into_iter().collect();

    let candidates = match config {
        FusionConfig::ReciprocalRank { rrf_k } => reciprocal_rank_scores(&lists, *rrf_k),
        FusionConfig::WeightedScore {
            weights,
            normalization,
        } => weighted_scores(&lists, weights, normalization),
    };

    let num_candidates = candidates.len();
    let fused = rank_candidates(candidates, top_k);

    debug!(
        "Fused {} sources with {}: {} candidates, kept {}",
        lists.len(),
        config,
        num_candidates,
        fused.len()
    );

    Ok(fused)
}

/// Fuses every query of a run.
///
/// `per_source` maps source name → query id → ranked list. Every query id seen
/// in any source is fused; a source without a list for that query counts as
/// having retrieved nothing.
pub fn fuse_queries(
    per_source: &BTreeMap<String, BTreeMap<String, RankedList>>,
    config: &FusionConfig,
    top_k: usize,
) -> Result<BTreeMap<String, Vec<FusedEntry>>, ConfigError> {
    let query_ids: BTreeSet<&String> = per_source.values().flat_map(|q| q.keys()).collect();

    query_ids
        .into_iter()
        .map(|query_id| {
            let lists = per_source.iter().filter_map(|(source, queries)| {
                queries.get(query_id).map(|list| (source.as_str(), list))
            });
            fuse_sources(lists, config, top_k).map(|fused| (query_id.clone(), fused))
        })
        .collect()
}

/// RRF contribution of every document: `Σ 1 / (rrf_k + rank)`.
fn reciprocal_rank_scores(
    lists: &BTreeMap<&str, &RankedList>,
    rrf_k: u32,
) -> BTreeMap<DocId, Candidate> {
    let k = rrf_k as f64;
    let mut candidates: BTreeMap<DocId, Candidate> = BTreeMap::new();

    for (&source, list) in lists {
        for entry in list.iter() {
            let candidate = candidates.entry(entry.doc_id.clone()).or_default();
            candidate.score += 1.0 / (k + entry.rank as f64);
            candidate.source_ranks.insert(source.to_string(), entry.rank);
        }
    }

    candidates
}

/// Weighted contribution of every document: `Σ weight × normalized score`.
///
/// Sources missing from `weights` keep their documents as candidates with a
/// weight of 0.
fn weighted_scores(
    lists: &BTreeMap<&str, &RankedList>,
    weights: &BTreeMap<String, f64>,
    normalization: &Normalization,
) -> BTreeMap<DocId, Candidate> {
    let mut candidates: BTreeMap<DocId, Candidate> = BTreeMap::new();

    for (&source, list) in lists {
        let weight = weights.get(source).copied().unwrap_or(0.0);
        let bounds = match normalization {
            Normalization::Fixed(bounds) => bounds.get(source).copied(),
            Normalization::PerList => None,
        };

        let normalized = match bounds {
            Some(b) => list
                .iter()
                .map(|e| normalize_fixed(e.score, b))
                .collect::<Vec<_>>(),
            None => min_max_normalized(list),
        };

        for (entry, norm) in list.iter().zip(normalized) {
            let candidate = candidates.entry(entry.doc_id.clone()).or_default();
            candidate.score += weight * norm;
            candidate.source_ranks.insert(source.to_string(), entry.rank);
        }
    }

    candidates
}

/// Min-max scales a list's scores onto [0, 1] using its own bounds.
///
/// Returned values are aligned with [`RankedList::entries`]. When every score
/// is equal the whole list maps to 1.
///
/// # Example
///
/// ```
/// use fusebench_core::search::{min_max_normalized, RankedList};
///
/// let list = RankedList::from_scored([("a", 12.0), ("b", 8.0), ("c", 4.0)]).unwrap();
/// assert_eq!(min_max_normalized(&list), vec![1.0, 0.5, 0.0]);
/// ```
pub fn min_max_normalized(list: &RankedList) -> Vec<f64> {
    let Some((min, max)) = list.score_range() else {
        return Vec::new();
    };
    let range = max - min;

    list.iter()
        .map(|e| {
            if range > 0.0 {
                (e.score - min) / range
            } else {
                1.0
            }
        })
        .collect()
}

fn normalize_fixed(score: f64, bounds: ScoreBounds) -> f64 {
    let range = bounds.max - bounds.min;
    if range > 0.0 {
        ((score - bounds.min) / range).clamp(0.0, 1.0)
    } else if score >= bounds.max {
        1.0
    } else {
        0.0
    }
}

/// Sorts by fused score descending, then document id ascending, and assigns
/// ranks 1..=top_k.
fn rank_candidates(candidates: BTreeMap<DocId, Candidate>, top_k: usize) -> Vec<FusedEntry> {
    let mut scored: Vec<(DocId, Candidate)> = candidates.into_iter().collect();
    scored.sort_by(|(id_a, a), (id_b, b)| b.score.total_cmp(&a.score).then_with(|| id_a.cmp(id_b)));

    scored
        .into_iter()
        .take(top_k)
        .enumerate()
        .map(|(i, (doc_id, candidate))| FusedEntry {
            doc_id,
            fused_score: candidate.score,
            rank: (i + 1) as u32,
            source_ranks: candidate.source_ranks,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list(hits: &[(&str, f64)]) -> RankedList {
        RankedList::from_scored(hits.iter().map(|&(id, s)| (id, s))).unwrap()
    }

    fn sources(pairs: &[(&str, RankedList)]) -> BTreeMap<String, RankedList> {
        pairs
            .iter()
            .map(|(name, l)| (name.to_string(), l.clone()))
            .collect()
    }

    fn ids(fused: &[FusedEntry]) -> Vec<String> {
        fused.iter().map(|e| e.doc_id.to_string()).collect()
    }

    #[test]
    fn test_rrf_two_sources() {
        let lists = sources(&[
            ("dense", list(&[("A", 0.9), ("B", 0.8), ("C", 0.7)])),
            ("sparse", list(&[("B", 9.0), ("C", 7.0), ("D", 5.0)])),
        ]);

        let fused = fuse(&lists, &FusionConfig::reciprocal_rank(60), 10).unwrap();

        assert_eq!(ids(&fused), vec!["B", "C", "A", "D"]);
        let expected_b = 1.0 / 61.0 + 1.0 / 62.0;
        assert!((fused[0].fused_score - expected_b).abs() < 1e-12);
        assert!((fused[0].fused_score - 0.0325).abs() < 1e-4);
        assert_eq!(fused[0].source_ranks.get("dense"), Some(&2));
        assert_eq!(fused[0].source_ranks.get("sparse"), Some(&1));
        // Single-source documents trail every document found twice
        assert!(fused[1].fused_score > fused[2].fused_score);
        assert!((fused[2].fused_score - 1.0 / 61.0).abs() < 1e-12);
        assert!((fused[3].fused_score - 1.0 / 63.0).abs() < 1e-12);
        let ranks: Vec<u32> = fused.iter().map(|e| e.rank).collect();
        assert_eq!(ranks, vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_rrf_ignores_raw_scores() {
        let lists = sources(&[
            ("a", list(&[("1", 100.0), ("2", 0.01)])),
            ("b", list(&[("2", 0.99), ("1", 0.98)])),
        ]);
        let fused = fuse(&lists, &FusionConfig::reciprocal_rank(60), 10).unwrap();
        // Symmetric ranks, so equal scores and id order decides
        assert_eq!(fused[0].fused_score, fused[1].fused_score);
        assert_eq!(ids(&fused), vec!["1", "2"]);
    }

    #[test]
    fn test_rrf_uses_given_ranks() {
        let gapped = RankedList::new(vec![
            crate::search::RankedEntry::new("x", 1.0, 1),
            crate::search::RankedEntry::new("y", 0.5, 5),
        ])
        .unwrap();
        let lists = sources(&[("only", gapped)]);
        let fused = fuse(&lists, &FusionConfig::reciprocal_rank(10), 10).unwrap();
        assert!((fused[1].fused_score - 1.0 / 15.0).abs() < 1e-12);
        assert_eq!(fused[1].rank, 2);
    }

    #[test]
    fn test_truncates_to_top_k() {
        let lists = sources(&[("dense", list(&[("a", 3.0), ("b", 2.0), ("c", 1.0)]))]);
        let fused = fuse(&lists, &FusionConfig::reciprocal_rank(60), 2).unwrap();
        assert_eq!(ids(&fused), vec!["a", "b"]);
    }

    #[test]
    fn test_empty_inputs() {
        let none: BTreeMap<String, RankedList> = BTreeMap::new();
        assert!(fuse(&none, &FusionConfig::default(), 5).unwrap().is_empty());

        let empties = sources(&[("dense", RankedList::empty()), ("sparse", RankedList::empty())]);
        assert!(fuse(&empties, &FusionConfig::default(), 5)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_empty_source_is_neutral() {
        let dense = list(&[("a", 0.9), ("b", 0.5)]);
        let with_empty = sources(&[("dense", dense.clone()), ("sparse", RankedList::empty())]);
        let alone = sources(&[("dense", dense)]);

        for config in [
            FusionConfig::reciprocal_rank(60),
            FusionConfig::weighted([("dense", 0.5), ("sparse", 0.5)]),
        ] {
            assert_eq!(
                fuse(&with_empty, &config, 10).unwrap(),
                fuse(&alone, &config, 10).unwrap()
            );
        }
    }

    #[test]
    fn test_weighted_min_max() {
        let lists = sources(&[
            ("dense", list(&[("a", 0.9), ("b", 0.5), ("c", 0.1)])),
            ("sparse", list(&[("c", 20.0), ("d", 10.0)])),
        ]);
        let config = FusionConfig::weighted([("dense", 0.5), ("sparse", 0.5)]);
        let fused = fuse(&lists, &config, 10).unwrap();

        // a: 0.5*1.0, c: 0.5*0.0 + 0.5*1.0, b: 0.5*0.5, d: 0.5*0.0
        assert_eq!(ids(&fused), vec!["a", "c", "b", "d"]);
        assert!((fused[0].fused_score - 0.5).abs() < 1e-12);
        assert!((fused[1].fused_score - 0.5).abs() < 1e-12);
        assert!((fused[2].fused_score - 0.25).abs() < 1e-12);
        assert_eq!(fused[3].fused_score, 0.0);
    }

    #[test]
    fn test_weighted_constant_list_normalizes_to_one() {
        let flat = list(&[("a", 3.0), ("b", 3.0)]);
        assert_eq!(min_max_normalized(&flat), vec![1.0, 1.0]);
        assert!(min_max_normalized(&RankedList::empty()).is_empty());
    }

    #[test]
    fn test_weighted_missing_source_contributes_zero() {
        let lists = sources(&[("dense", list(&[("a", 0.9), ("b", 0.1)]))]);
        let config = FusionConfig::weighted([("dense", 1.0), ("es", 2.0)]);
        let fused = fuse(&lists, &config, 10).unwrap();
        assert_eq!(ids(&fused), vec!["a", "b"]);
        assert_eq!(fused[0].fused_score, 1.0);
    }

    #[test]
    fn test_weighted_unweighted_source_keeps_candidates() {
        let lists = sources(&[
            ("dense", list(&[("b", 0.9), ("c", 0.1)])),
            ("sparse", list(&[("a", 5.0)])),
        ]);
        let config = FusionConfig::weighted([("dense", 1.0)]);
        let fused = fuse(&lists, &config, 10).unwrap();
        // a and c both score 0; id order breaks the tie
        assert_eq!(ids(&fused), vec!["b", "a", "c"]);
    }

    #[test]
    fn test_fixed_bounds_normalization() {
        let lists = sources(&[
            ("dense", list(&[("a", 0.8), ("b", 0.6)])),
            ("sparse", list(&[("b", 30.0), ("c", 10.0)])),
        ]);
        let bounds = BTreeMap::from([
            ("dense".to_string(), ScoreBounds { min: 0.0, max: 1.0 }),
            ("sparse".to_string(), ScoreBounds { min: 0.0, max: 20.0 }),
        ]);
        let config = FusionConfig::WeightedScore {
            weights: BTreeMap::from([("dense".to_string(), 1.0), ("sparse".to_string(), 1.0)]),
            normalization: Normalization::Fixed(bounds),
        };
        let fused = fuse(&lists, &config, 10).unwrap();

        // b: 0.6 + clamp(1.5) = 1.6, a: 0.8, c: 0.5
        assert_eq!(ids(&fused), vec!["b", "a", "c"]);
        assert!((fused[0].fused_score - 1.6).abs() < 1e-12);
        assert!((fused[2].fused_score - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_config_errors() {
        let lists = sources(&[("dense", list(&[("a", 1.0)]))]);

        assert_eq!(
            fuse(&lists, &FusionConfig::reciprocal_rank(0), 5),
            Err(ConfigError::InvalidRrfK(0))
        );
        assert_eq!(
            fuse(&lists, &FusionConfig::weighted([("dense", 0.0)]), 5),
            Err(ConfigError::ZeroWeightSum)
        );
        assert_eq!(
            fuse(&lists, &FusionConfig::weighted(Vec::<(String, f64)>::new()), 5),
            Err(ConfigError::ZeroWeightSum)
        );
        assert!(matches!(
            fuse(&lists, &FusionConfig::weighted([("dense", -1.0), ("x", 2.0)]), 5),
            Err(ConfigError::InvalidWeight { .. })
        ));
        assert_eq!(
            fuse(&lists, &FusionConfig::default(), 0),
            Err(ConfigError::InvalidCutoff(0))
        );
    }

    #[test]
    fn test_invalid_bounds_rejected() {
        let config = FusionConfig::WeightedScore {
            weights: BTreeMap::from([("dense".to_string(), 1.0)]),
            normalization: Normalization::Fixed(BTreeMap::from([(
                "dense".to_string(),
                ScoreBounds { min: 1.0, max: 0.0 },
            )])),
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidBounds { .. })
        ));
    }

    #[test]
    fn test_method_parsing() {
        assert_eq!("rrf".parse::<FusionMethod>(), Ok(FusionMethod::ReciprocalRank));
        assert_eq!(
            "Weighted".parse::<FusionMethod>(),
            Ok(FusionMethod::WeightedScore)
        );
        assert_eq!(
            "borda".parse::<FusionMethod>(),
            Err(ConfigError::UnknownMethod("borda".to_string()))
        );
        assert_eq!(
            FusionConfig::weighted([("d", 1.0)]).method(),
            FusionMethod::WeightedScore
        );
    }

    #[test]
    fn test_config_serde() {
        let rrf: FusionConfig = serde_json::from_str(r#"{"method": "reciprocal_rank"}"#).unwrap();
        assert_eq!(rrf, FusionConfig::reciprocal_rank(DEFAULT_RRF_K));

        let weighted: FusionConfig = serde_json::from_str(
            r#"{"method": "weighted_score", "weights": {"dense": 1.0},
                "normalization": {"scope": "fixed", "bounds": {"dense": {"min": 0.0, "max": 2.0}}}}"#,
        )
        .unwrap();
        match weighted {
            FusionConfig::WeightedScore { normalization, .. } => {
                assert!(matches!(normalization, Normalization::Fixed(_)))
            }
            other => panic!("unexpected config {:?}", other),
        }

        let unknown: Result<FusionConfig, _> = serde_json::from_str(r#"{"method": "borda"}"#);
        assert!(unknown.is_err());
    }

    #[test]
    fn test_fuse_queries() {
        let mut per_source: BTreeMap<String, BTreeMap<String, RankedList>> = BTreeMap::new();
        per_source.insert(
            "dense".into(),
            BTreeMap::from([
                ("q1".to_string(), list(&[("a", 0.9), ("b", 0.5)])),
                ("q2".to_string(), list(&[("c", 0.9)])),
            ]),
        );
        per_source.insert(
            "sparse".into(),
            BTreeMap::from([("q1".to_string(), list(&[("b", 3.0)]))]),
        );

        let fused = fuse_queries(&per_source, &FusionConfig::default(), 10).unwrap();
        assert_eq!(fused.len(), 2);
        assert_eq!(ids(&fused["q1"]), vec!["b", "a"]);
        assert_eq!(ids(&fused["q2"]), vec!["c"]);
    }

    #[test]
    fn test_deterministic_across_calls() {
        let lists = sources(&[
            ("dense", list(&[("x", 0.5), ("y", 0.5), ("z", 0.5)])),
            ("sparse", list(&[("z", 1.0), ("y", 1.0), ("x", 1.0)])),
        ]);
        let config = FusionConfig::weighted([("dense", 0.3), ("sparse", 0.7)]);
        let first = fuse(&lists, &config, 10).unwrap();
        for _ in 0..10 {
            assert_eq!(fuse(&lists, &config, 10).unwrap(), first);
        }
        assert_eq!(ids(&first), vec!["x", "y", "z"]);
    }
}
