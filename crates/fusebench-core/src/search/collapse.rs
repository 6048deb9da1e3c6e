//! Document-level collapsing of chunk-level retriever hits.
//!
//! Retrievers over chunked corpora return several hits for the same document.
//! A [`RankedList`] rejects repeated documents, so callers that want
//! document-level evaluation collapse explicitly with
//! [`collapse_by_document`] before building the list.

use super::types::{DocId, RankedList};
use crate::error::DataError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A single chunk-level hit from a retriever.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkHit {
    /// Document the chunk belongs to
    pub doc_id: DocId,
    /// Chunk identifier, if the retriever reports one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chunk_id: Option<String>,
    /// Raw retriever score
    pub score: f64,
}

impl ChunkHit {
    /// Creates a hit without a chunk identifier.
    pub fn new(doc_id: impl Into<DocId>, score: f64) -> Self {
        Self {
            doc_id: doc_id.into(),
            chunk_id: None,
            score,
        }
    }
}

/// Collapses chunk hits into a document-level ranked list.
///
/// # Scoring Strategy (Max Aggregation)
///
/// A document is as relevant as its best passage, so each document takes the
/// score of its highest-scoring chunk. Documents are ordered by that score
/// descending; equal scores keep the order in which the retriever first
/// returned the document. Ranks are reassigned 1..N.
///
/// # Errors
///
/// Returns [`DataError::NonFiniteScore`] if any hit has a NaN or infinite score.
///
/// # Example
///
/// ```
/// use fusebench_core::search::{collapse_by_document, ChunkHit, DocId};
///
/// let hits = vec![
///     ChunkHit::new("doc_1", 0.9),
///     ChunkHit::new("doc_2", 0.8),
///     ChunkHit::new("doc_1", 0.7),
/// ];
/// let list = collapse_by_document(hits).unwrap();
/// assert_eq!(list.len(), 2);
/// assert_eq!(list.entries()[1].doc_id, DocId::from("doc_2"));
/// ```
pub fn collapse_by_document(hits: Vec<ChunkHit>) -> Result<RankedList, DataError> {
    // doc -> (first position, best score)
    let mut best: HashMap<DocId, (usize, f64)> = HashMap::new();

    for (position, hit) in hits.into_iter().enumerate() {
        if !hit.score.is_finite() {
            return Err(DataError::NonFiniteScore(hit.doc_id));
        }
        best.entry(hit.doc_id)
            .and_modify(|(_, score)| *score = score.max(hit.score))
            .or_insert((position, hit.score));
    }

    let mut documents: Vec<(DocId, usize, f64)> = best
        .into_iter()
        .map(|(doc_id, (position, score))| (doc_id, position, score))
        .collect();
    documents.sort_by(|a, b| b.2.total_cmp(&a.2).then_with(|| a.1.cmp(&b.1)));

    RankedList::from_scored(
        documents
            .into_iter()
            .map(|(doc_id, _, score)| (doc_id, score)),
    )
}
