//! Error types for fusebench-core.
//!
//! Configuration and structural-data errors are fatal for a single evaluation
//! run and propagate to the caller unmodified. Degenerate numeric cases (no
//! relevant documents, zero IDCG) are never errors; the metric functions
//! absorb them into 0-valued results. Missing judgments are reported as
//! [`ComparisonWarning`](crate::evaluation::ComparisonWarning) values.

use crate::search::types::DocId;
use thiserror::Error;

/// Invalid fusion or evaluation configuration.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// RRF smoothing constant must be at least 1
    #[error("Invalid rrf_k: {0} (must be >= 1)")]
    InvalidRrfK(u32),
    /// Weighted fusion weights sum to zero
    #[error("Fusion weights sum to zero")]
    ZeroWeightSum,
    /// A weight is negative, NaN or infinite
    #[error("Invalid weight {weight} for source '{source_name}'")]
    InvalidWeight {
        /// Source the weight belongs to
        source_name: String,
        /// Offending value
        weight: f64,
    },
    /// Fusion method name could not be parsed
    #[error("Unknown fusion method: {0}")]
    UnknownMethod(String),
    /// Primary metric name could not be parsed
    #[error("Unknown metric: {0}")]
    UnknownMetric(String),
    /// Cutoff `k` or `top_k` must be positive
    #[error("Invalid cutoff: {0} (must be >= 1)")]
    InvalidCutoff(usize),
    /// Fixed normalization bounds with max < min or non-finite values
    #[error("Invalid normalization bounds for source '{source_name}': [{min}, {max}]")]
    InvalidBounds {
        /// Source the bounds belong to
        source_name: String,
        /// Lower bound
        min: f64,
        /// Upper bound
        max: f64,
    },
}

/// Malformed ranked list handed in by a retriever.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DataError {
    /// The same document appears twice in one list
    #[error("Duplicate document {doc_id} at rank {rank}")]
    DuplicateDocument {
        /// Repeated document
        doc_id: DocId,
        /// Rank of the second occurrence
        rank: u32,
    },
    /// Rank is zero (ranks are 1-based)
    #[error("Rank must be >= 1 for document {0}")]
    ZeroRank(DocId),
    /// Ranks are not strictly increasing along the list
    #[error("Non-monotonic rank: {current} follows {previous}")]
    NonMonotonicRank {
        /// Rank of the preceding entry
        previous: u32,
        /// Rank of the offending entry
        current: u32,
    },
    /// A later rank carries a higher score than an earlier one
    #[error("Score {current} at rank {rank} exceeds preceding score {previous}")]
    NonMonotonicScore {
        /// Rank of the offending entry
        rank: u32,
        /// Score of the preceding entry
        previous: f64,
        /// Score of the offending entry
        current: f64,
    },
    /// Score is NaN or infinite
    #[error("Non-finite score for document {0}")]
    NonFiniteScore(DocId),
}

/// Any fatal error raised by the fusion and evaluation core.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    /// Invalid configuration
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// Malformed input data
    #[error(transparent)]
    Data(#[from] DataError),
}

impl From<ConfigError> for String {
    fn from(err: ConfigError) -> String {
        err.to_string()
    }
}

impl From<DataError> for String {
    fn from(err: DataError) -> String {
        err.to_string()
    }
}
