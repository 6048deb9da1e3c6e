//! Retrieval-quality evaluation of fused rankings.
//!
//! Scores each method's per-query ranking against ground-truth relevance
//! judgments and compares methods side by side.
//!
//! # Overview
//!
//! - **Binary or graded relevance**: a judgment is a set of relevant documents
//!   or a document → grade map (0 = not relevant)
//! - **Position-aware metrics**: NDCG and MAP reward relevant results near the top
//! - **Deterministic comparison**: means are reduced in query-id order and ties
//!   in the ranking break by method name
//!
//! # Example
//!
//! ```
//! use fusebench_core::evaluation::{evaluate, RelevanceJudgment};
//! use fusebench_core::search::RankedList;
//!
//! let fused = RankedList::from_scored([("doc_1", 0.95), ("doc_2", 0.82), ("doc_3", 0.71)])
//!     .unwrap()
//!     .to_fused("dense", 10)
//!     .unwrap();
//!
//! let judgment = RelevanceJudgment::graded([("doc_1", 2), ("doc_3", 1)]);
//! let record = evaluate(&fused, &judgment, 10).unwrap();
//! assert_eq!(record.mrr, 1.0);
//! assert_eq!(record.recall_at_k, 1.0);
//! ```
//!
//! # Metrics Reference
//!
//! | Metric | Description | Use Case |
//! |--------|-------------|----------|
//! | NDCG@k | Normalized Discounted Cumulative Gain | Graded relevance, position-aware |
//! | MAP@k | Average Precision truncated at k | Overall precision-recall tradeoff |
//! | MRR | Reciprocal Rank of first relevant hit | Finding the first good result |
//! | P@k | Precision at k | Fraction of top-k that are relevant |
//! | R@k | Recall at k | Fraction of relevant found in top-k |
//! | F1@k | F1 score at k | Harmonic mean of P@k and R@k |

pub mod compare;
pub mod judgments;
pub mod metrics;

pub use compare::{
    aggregate, compare, compare_cutoffs, distinct_warnings, evaluate_method, ComparisonReport,
    ComparisonWarning, MethodSummary, PrimaryMetric,
};
pub use judgments::{JudgmentStore, RelevanceJudgment};
pub use metrics::{
    average_precision_at_k, evaluate, f1_at_k, ndcg_at_k, precision_at_k, recall_at_k,
    reciprocal_rank, MetricRecord,
};
