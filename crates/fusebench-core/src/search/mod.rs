//! Ranked-list model and result fusion.
//!
//! This module turns the independent outputs of several retrievers (dense
//! vector search, sparse lexical search, an external full-text engine) into
//! one ranking per query.
//!
//! # Architecture
//!
//! - `types`: Core types (DocId, RankedEntry, RankedList, FusedEntry)
//! - `fusion`: Reciprocal Rank Fusion and weighted score fusion
//! - `collapse`: Chunk-level hits to document-level lists (max aggregation)
//!
//! # Usage
//!
//! ```
//! use fusebench_core::search::{fuse, FusionConfig, RankedList};
//! use std::collections::BTreeMap;
//!
//! let mut lists = BTreeMap::new();
//! lists.insert("dense".to_string(), RankedList::from_scored([("a", 0.92), ("b", 0.85)]).unwrap());
//! lists.insert("sparse".to_string(), RankedList::from_scored([("b", 14.2), ("c", 9.1)]).unwrap());
//!
//! let rrf = fuse(&lists, &FusionConfig::reciprocal_rank(60), 10).unwrap();
//! let weighted = fuse(&lists, &FusionConfig::weighted([("dense", 0.7), ("sparse", 0.3)]), 10).unwrap();
//! assert_eq!(rrf.len(), 3);
//! assert_eq!(weighted.len(), 3);
//! ```
//!
//! # Algorithm Details
//!
//! **Reciprocal Rank Fusion (RRF)**:
//! - Formula: `score = Σ 1 / (k + rank)` where k defaults to 60
//! - Uses ranks only, so it is robust to scale differences between retrievers
//!
//! **Weighted score fusion**:
//! - Dense cosine scores and sparse term-frequency scores are not comparable,
//!   so each source's list is min-max scaled to [0, 1] first
//! - Optional fixed (corpus-level) bounds replace the per-query window
//!
//! Both strategies break score ties by ascending document id.

pub mod collapse;
pub mod fusion;
pub mod types;

pub use collapse::{collapse_by_document, ChunkHit};
pub use fusion::{
    fuse, fuse_queries, fuse_sources, min_max_normalized, FusionConfig, FusionMethod,
    Normalization, ScoreBounds,
};
pub use types::{DocId, FusedEntry, RankedEntry, RankedList};
