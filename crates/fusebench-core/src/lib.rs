//! # Fusebench Core
//!
//! Result fusion and retrieval-quality evaluation for hybrid search.
//!
//! Several retrievers (dense vectors, sparse lexical scoring, an external
//! full-text engine) each return a ranked list per query. This crate merges
//! those lists into one ranking and measures how good each ranking is against
//! relevance judgments, so fusion strategies can be compared on equal terms.
//!
//! ## Modules
//!
//! - [`search`] - Ranked-list model, RRF and weighted score fusion, hit collapsing
//! - [`evaluation`] - Relevance judgments, IR metrics, method comparison
//! - [`config`] - Default constants (RRF k, cutoffs, sweep values)
//! - [`error`] - Configuration and data error types
//!
//! Everything here is a pure computation over in-memory data. Loading runs and
//! judgments, and rendering reports, live in the `fusebench-eval` binary.

pub mod config;
pub mod error;
pub mod evaluation;
pub mod search;

pub use error::{ConfigError, DataError, EvalError};
