//! Retriever run parsing.
//!
//! The file maps source name → query id → hits in retrieval order:
//!
//! ```json
//! {
//!   "dense":  {"q1": [{"doc_id": "a", "score": 0.91, "chunk_id": "a#2"}, ...]},
//!   "sparse": {"q1": ["b", "a", "c"]}
//! }
//! ```
//!
//! A bare id gets score `1 / rank`. A list with any `chunk_id` is chunk-level
//! and is collapsed to the best-scoring chunk per document. Any other list
//! must already be a valid document-level list: repeated documents or rising
//! scores are rejected.

use anyhow::{Context, Result};
use fusebench_core::search::{collapse_by_document, ChunkHit, DocId, RankedList};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::info;

/// Source name → query id → document-level ranked list.
pub type SourceRuns = BTreeMap<String, BTreeMap<String, RankedList>>;

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RunHit {
    Scored(ChunkHit),
    Bare(DocId),
}

/// Reads and parses a runs file.
pub fn load_runs(path: &Path) -> Result<SourceRuns> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read runs: {}", path.display()))?;
    parse_runs(&text).with_context(|| format!("Invalid runs file: {}", path.display()))
}

/// Parses runs JSON, collapsing each hit list to a document-level list.
pub fn parse_runs(text: &str) -> Result<SourceRuns> {
    let raw: BTreeMap<String, BTreeMap<String, Vec<RunHit>>> = serde_json::from_str(text)?;

    let mut runs = SourceRuns::new();
    for (source, queries) in raw {
        let mut lists = BTreeMap::new();
        let mut num_hits = 0;

        for (query_id, hits) in queries {
            num_hits += hits.len();
            let list = to_ranked_list(hits).with_context(|| {
                format!("Bad hits for source '{}', query '{}'", source, query_id)
            })?;
            lists.insert(query_id, list);
        }

        info!(
            "Loaded source '{}': {} queries, {} hits",
            source,
            lists.len(),
            num_hits
        );
        runs.insert(source, lists);
    }

    Ok(runs)
}

fn to_ranked_list(hits: Vec<RunHit>) -> Result<RankedList> {
    let chunk_level = hits
        .iter()
        .any(|hit| matches!(hit, RunHit::Scored(chunk) if chunk.chunk_id.is_some()));

    let scored = hits.into_iter().enumerate().map(|(i, hit)| match hit {
        RunHit::Scored(chunk) => chunk,
        RunHit::Bare(doc_id) => ChunkHit::new(doc_id, 1.0 / (i + 1) as f64),
    });

    let list = if chunk_level {
        collapse_by_document(scored.collect())?
    } else {
        RankedList::from_scored(scored.map(|hit| (hit.doc_id, hit.score)))?
    };
    Ok(list)
}
