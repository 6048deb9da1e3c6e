//! Default evaluation configuration constants.
//!
//! These values are used by the fusion engine, the evaluation binary and the
//! benchmarks so that every entry point agrees on the same defaults.
//!
//! # Usage
//!
//! ```
//! use fusebench_core::config::{DEFAULT_RRF_K, DEFAULT_TOP_K};
//! use fusebench_core::search::FusionConfig;
//!
//! let config = FusionConfig::reciprocal_rank(DEFAULT_RRF_K);
//! assert!(config.validate().is_ok());
//! assert_eq!(DEFAULT_TOP_K, 10);
//! ```

// =============================================================================
// Fusion
// =============================================================================

/// Standard RRF smoothing constant.
///
/// Recommended value from Cormack, Clarke & Buettcher (SIGIR 2009),
/// "Reciprocal Rank Fusion outperforms Condorcet and individual Rank Learning
/// Methods". Smaller values emphasise top ranks, larger values flatten the
/// contribution curve.
pub const DEFAULT_RRF_K: u32 = 60;

/// Number of fused entries kept per query.
pub const DEFAULT_TOP_K: usize = 10;

/// How many candidates each source contributes relative to `top_k`.
///
/// Fusing over a deeper window lets documents ranked moderately by both
/// sources surface above documents ranked highly by only one.
pub const CANDIDATE_DEPTH_FACTOR: usize = 2;

/// RRF k values swept by the ablation study.
pub const DEFAULT_RRF_K_SWEEP: &[u32] = &[10, 30, 60, 100, 200];

// =============================================================================
// Evaluation
// =============================================================================

/// Cutoffs evaluated by default.
pub const DEFAULT_K_VALUES: &[usize] = &[1, 3, 5, 10];

/// Cutoff used for the method ranking and significance tests when the
/// requested cutoffs include it.
pub const DEFAULT_COMPARISON_K: usize = 10;

/// Significance level for paired comparisons.
pub const SIGNIFICANCE_ALPHA: f64 = 0.05;
