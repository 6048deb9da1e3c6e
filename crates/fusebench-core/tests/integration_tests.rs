//! End-to-end tests for the fusion and evaluation pipeline.
//!
//! These tests exercise the full workflow:
//! 1. Fusion: per-source ranked lists → RRF / weighted fusion → fused ranking
//! 2. Evaluation: fused ranking + judgments → per-query metrics → comparison
//!
//! Run with: `cargo test -p fusebench-core --test integration_tests`

use fusebench_core::config::{DEFAULT_RRF_K, DEFAULT_TOP_K};
use fusebench_core::evaluation::{
    aggregate, compare, evaluate, ComparisonWarning, JudgmentStore, MetricRecord, PrimaryMetric,
    RelevanceJudgment,
};
use fusebench_core::search::{
    collapse_by_document, fuse, fuse_queries, ChunkHit, DocId, FusedEntry, FusionConfig,
    Normalization, RankedList, ScoreBounds,
};
use fusebench_core::{ConfigError, DataError, EvalError};
use std::collections::BTreeMap;

// ============================================================================
// Fixtures
// ============================================================================

fn list(hits: &[(&str, f64)]) -> RankedList {
    RankedList::from_scored(hits.iter().copied()).unwrap()
}

fn sources(pairs: Vec<(&str, RankedList)>) -> BTreeMap<String, RankedList> {
    pairs
        .into_iter()
        .map(|(name, list)| (name.to_string(), list))
        .collect()
}

fn doc_order(fused: &[FusedEntry]) -> Vec<String> {
    fused.iter().map(|e| e.doc_id.to_string()).collect()
}

/// Dense `[A, B, C]`, sparse `[B, C, D]`.
fn dense_and_sparse() -> BTreeMap<String, RankedList> {
    sources(vec![
        ("dense", list(&[("A", 0.92), ("B", 0.88), ("C", 0.61)])),
        ("sparse", list(&[("B", 17.5), ("C", 11.2), ("D", 3.4)])),
    ])
}

// ============================================================================
// Fusion
// ============================================================================

#[test]
fn test_rrf_worked_example() {
    let fused = fuse(&dense_and_sparse(), &FusionConfig::reciprocal_rank(60), 10).unwrap();

    assert_eq!(doc_order(&fused), vec!["B", "C", "A", "D"]);
    assert!((fused[0].fused_score - (1.0 / 61.0 + 1.0 / 62.0)).abs() < 1e-12);
    assert!((fused[2].fused_score - 1.0 / 61.0).abs() < 1e-12);
    assert!((fused[3].fused_score - 1.0 / 63.0).abs() < 1e-12);

    let ranks: Vec<u32> = fused.iter().map(|e| e.rank).collect();
    assert_eq!(ranks, vec![1, 2, 3, 4]);
    assert_eq!(fused[0].source_ranks.get("dense"), Some(&2));
    assert_eq!(fused[0].source_ranks.get("sparse"), Some(&1));
    assert_eq!(fused[3].source_ranks.get("dense"), None);
}

#[test]
fn test_weighted_worked_example() {
    // dense normalized: A=1, B=(0.88-0.61)/0.31, C=0
    // sparse normalized: B=1, C=(11.2-3.4)/14.1, D=0
    let config = FusionConfig::weighted([("dense", 0.5), ("sparse", 0.5)]);
    let fused = fuse(&dense_and_sparse(), &config, 10).unwrap();

    assert_eq!(fused[0].doc_id, DocId::from("B"));
    let b = 0.5 * (0.27 / 0.31) + 0.5;
    assert!((fused[0].fused_score - b).abs() < 1e-9);
    assert_eq!(fused.last().map(|e| e.doc_id.clone()), Some(DocId::from("D")));
}

#[test]
fn test_fusion_with_fixed_bounds() {
    let bounds = BTreeMap::from([
        ("dense".to_string(), ScoreBounds { min: 0.0, max: 1.0 }),
        ("sparse".to_string(), ScoreBounds { min: 0.0, max: 20.0 }),
    ]);
    let config = FusionConfig::WeightedScore {
        weights: BTreeMap::from([("dense".to_string(), 1.0), ("sparse".to_string(), 1.0)]),
        normalization: Normalization::Fixed(bounds),
    };
    let fused = fuse(&dense_and_sparse(), &config, 10).unwrap();

    // B = 0.88 + 17.5/20
    assert_eq!(fused[0].doc_id, DocId::from("B"));
    assert!((fused[0].fused_score - (0.88 + 0.875)).abs() < 1e-9);
    // A = 0.92 only; C = 0.61 + 0.56
    assert_eq!(doc_order(&fused), vec!["B", "C", "A", "D"]);
}

#[test]
fn test_fusion_truncates_to_top_k() {
    let fused = fuse(&dense_and_sparse(), &FusionConfig::default(), 2).unwrap();
    assert_eq!(doc_order(&fused), vec!["B", "C"]);
}

#[test]
fn test_fusion_of_empty_lists() {
    let lists = sources(vec![("dense", RankedList::empty()), ("sparse", RankedList::empty())]);
    assert!(fuse(&lists, &FusionConfig::default(), DEFAULT_TOP_K)
        .unwrap()
        .is_empty());
    assert!(fuse(&BTreeMap::new(), &FusionConfig::default(), DEFAULT_TOP_K)
        .unwrap()
        .is_empty());
}

#[test]
fn test_fusion_config_errors() {
    let lists = dense_and_sparse();
    assert_eq!(
        fuse(&lists, &FusionConfig::reciprocal_rank(0), 10),
        Err(ConfigError::InvalidRrfK(0))
    );
    assert_eq!(
        fuse(&lists, &FusionConfig::weighted([("dense", 0.0), ("sparse", 0.0)]), 10),
        Err(ConfigError::ZeroWeightSum)
    );
    assert_eq!(
        fuse(&lists, &FusionConfig::default(), 0),
        Err(ConfigError::InvalidCutoff(0))
    );
}

#[test]
fn test_fuse_queries_batch() {
    let per_source = BTreeMap::from([
        (
            "dense".to_string(),
            BTreeMap::from([
                ("q1".to_string(), list(&[("A", 0.9), ("B", 0.5)])),
                ("q2".to_string(), list(&[("C", 0.7)])),
            ]),
        ),
        (
            "sparse".to_string(),
            BTreeMap::from([("q1".to_string(), list(&[("B", 4.0)]))]),
        ),
    ]);

    let config = FusionConfig::reciprocal_rank(DEFAULT_RRF_K);
    let fused = fuse_queries(&per_source, &config, 10).unwrap();
    assert_eq!(fused.len(), 2);
    assert_eq!(doc_order(&fused["q1"]), vec!["B", "A"]);
    assert_eq!(doc_order(&fused["q2"]), vec!["C"]);
}

// ============================================================================
// Ranked-list validation
// ============================================================================

#[test]
fn test_malformed_lists_are_rejected_not_repaired() {
    let duplicate = RankedList::from_scored([("A", 0.9), ("A", 0.5)]);
    assert!(matches!(duplicate, Err(DataError::DuplicateDocument { .. })));

    let unsorted = RankedList::from_scored([("A", 0.1), ("B", 0.5)]);
    assert!(matches!(unsorted, Err(DataError::NonMonotonicScore { .. })));

    // Opt-in collapsing handles chunk-level duplicates instead.
    let collapsed = collapse_by_document(vec![
        ChunkHit::new("A", 0.9),
        ChunkHit::new("A", 0.5),
        ChunkHit::new("B", 0.7),
    ])
    .unwrap();
    assert_eq!(collapsed.len(), 2);
}

#[test]
fn test_errors_convert_to_eval_error() {
    let err: EvalError = ConfigError::ZeroWeightSum.into();
    assert_eq!(err.to_string(), ConfigError::ZeroWeightSum.to_string());

    let err: EvalError = DataError::ZeroRank(DocId::from("A")).into();
    assert!(matches!(err, EvalError::Data(_)));
}

// ============================================================================
// Evaluation
// ============================================================================

#[test]
fn test_perfect_top_three_scores_one() {
    let ranking = list(&[("B", 0.9), ("C", 0.8), ("D", 0.7)])
        .to_fused("dense", 3)
        .unwrap();
    let record = evaluate(&ranking, &RelevanceJudgment::binary(["B", "C"]), 3).unwrap();

    assert_eq!(record.recall_at_k, 1.0);
    assert_eq!(record.mrr, 1.0);
    assert!((record.ndcg_at_k - 1.0).abs() < 1e-12);
    assert_eq!(record.map_at_k, 1.0);
}

#[test]
fn test_query_without_relevant_documents_scores_zero() {
    let ranking = list(&[("A", 0.9)]).to_fused("dense", 10).unwrap();
    let record = evaluate(&ranking, &RelevanceJudgment::binary(Vec::<DocId>::new()), 10).unwrap();
    assert_eq!(record, MetricRecord::default());
}

#[test]
fn test_evaluate_rejects_zero_k() {
    let ranking = list(&[("A", 0.9)]).to_fused("dense", 10).unwrap();
    assert_eq!(
        evaluate(&ranking, &RelevanceJudgment::binary(["A"]), 0),
        Err(ConfigError::InvalidCutoff(0))
    );
}

// ============================================================================
// Comparison
// ============================================================================

#[test]
fn test_hybrid_beats_single_sources_end_to_end() {
    // q1 favours dense, q2 favours sparse; fusion gets both right.
    let dense = BTreeMap::from([
        ("q1".to_string(), list(&[("A", 0.9), ("X", 0.8), ("Y", 0.7)])),
        ("q2".to_string(), list(&[("X", 0.9), ("Y", 0.8), ("B", 0.3)])),
    ]);
    let sparse = BTreeMap::from([
        ("q1".to_string(), list(&[("Z", 9.0), ("W", 8.0), ("A", 1.0)])),
        ("q2".to_string(), list(&[("B", 12.0), ("Z", 2.0)])),
    ]);
    let judgments: JudgmentStore = [
        ("q1", RelevanceJudgment::binary(["A"])),
        ("q2", RelevanceJudgment::binary(["B"])),
    ]
    .into_iter()
    .collect();

    type PerQuery = BTreeMap<String, Vec<FusedEntry>>;
    let single = |runs: &BTreeMap<String, RankedList>, name: &str| -> PerQuery {
        runs.iter()
            .map(|(q, l)| (q.clone(), l.to_fused(name, 10).unwrap()))
            .collect()
    };
    let per_source = BTreeMap::from([
        ("dense".to_string(), dense.clone()),
        ("sparse".to_string(), sparse.clone()),
    ]);

    let mut per_method = BTreeMap::new();
    per_method.insert("dense".to_string(), single(&dense, "dense"));
    per_method.insert("sparse".to_string(), single(&sparse, "sparse"));
    per_method.insert(
        "hybrid_rrf".to_string(),
        fuse_queries(&per_source, &FusionConfig::default(), 10).unwrap(),
    );

    let report = compare(&per_method, &judgments, 10, PrimaryMetric::Mrr).unwrap();

    assert_eq!(report.ranking[0], "hybrid_rrf");
    assert_eq!(report.total_queries, 2);
    assert!(report.warnings.is_empty());
    for summary in report.methods.values() {
        assert_eq!(summary.scored_queries, 2);
        assert_eq!(summary.metrics, aggregate(&summary.per_query));
    }
}

#[test]
fn test_skipped_queries_and_mismatch_are_warnings() {
    let judgments: JudgmentStore = [("q1", RelevanceJudgment::binary(["A"]))]
        .into_iter()
        .collect();
    let ranking = list(&[("A", 0.9)]).to_fused("s", 10).unwrap();

    let per_method = BTreeMap::from([
        (
            "full".to_string(),
            BTreeMap::from([
                ("q1".to_string(), ranking.clone()),
                ("unjudged".to_string(), ranking.clone()),
            ]),
        ),
        ("empty".to_string(), BTreeMap::new()),
    ]);

    let report = compare(&per_method, &judgments, 5, PrimaryMetric::Ndcg).unwrap();
    assert_eq!(report.methods["full"].skipped_queries, 1);
    assert_eq!(report.methods["full"].metrics.ndcg_at_k, 1.0);
    assert_eq!(report.methods["empty"].metrics, MetricRecord::default());
    assert_eq!(report.ranking, vec!["full", "empty"]);
    assert!(report.warnings.contains(&ComparisonWarning::MissingJudgments {
        method: "full".to_string(),
        count: 1,
    }));
    assert!(report
        .warnings
        .iter()
        .any(|w| matches!(w, ComparisonWarning::ScoredCountMismatch { .. })));
}

#[test]
fn test_report_serializes() {
    let judgments: JudgmentStore = [("q1", RelevanceJudgment::binary(["A"]))]
        .into_iter()
        .collect();
    let per_method = BTreeMap::from([(
        "dense".to_string(),
        BTreeMap::from([("q1".to_string(), list(&[("A", 0.9)]).to_fused("dense", 10).unwrap())]),
    )]);
    let report = compare(&per_method, &judgments, 10, PrimaryMetric::default()).unwrap();

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["primary_metric"], "ndcg");
    assert_eq!(json["ranking"][0], "dense");
    assert_eq!(json["methods"]["dense"]["metrics"]["mrr"], 1.0);
}
