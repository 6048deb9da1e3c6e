//! Dataset loading for evaluation.
//!
//! A dataset is a directory with two JSON files:
//! - `queries.json`: queries with their relevance judgments
//! - `runs.json`: precomputed retriever output, source → query → hits

mod judgments;
mod runs;

pub use judgments::{load_judgments, QueryJudgments};
pub use runs::{load_runs, SourceRuns};

#[cfg(test)]
pub use runs::parse_runs;

use crate::config::{QUERIES_FILENAME, RUNS_FILENAME};
use anyhow::Result;
use fusebench_core::evaluation::JudgmentStore;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

/// A loaded evaluation dataset ready for use.
#[derive(Debug)]
pub struct EvalDataset {
    /// Dataset name for reporting
    pub name: String,
    /// Query texts by query id (queries without text are absent)
    pub query_texts: BTreeMap<String, String>,
    /// Relevance judgments by query id
    pub judgments: JudgmentStore,
    /// Retriever output: source → query id → document-level ranked list
    pub runs: SourceRuns,
}

/// Dataset summary for reports.
#[derive(Debug, Clone, Serialize)]
pub struct DatasetInfo {
    /// Dataset name (data directory name)
    pub name: String,
    /// Number of judged queries
    pub num_queries: usize,
    /// Number of relevant (query, document) pairs
    pub num_qrels: usize,
    /// Source names in sorted order
    pub sources: Vec<String>,
    /// Query texts by query id
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub queries: BTreeMap<String, String>,
}

impl EvalDataset {
    /// Loads `queries.json` and `runs.json` from `data_dir`.
    pub fn load(data_dir: &Path) -> Result<Self> {
        let name = data_dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "dataset".to_string());
        let judged = load_judgments(&data_dir.join(QUERIES_FILENAME))?;
        let runs = load_runs(&data_dir.join(RUNS_FILENAME))?;
        Ok(Self::new(name, judged, runs))
    }

    /// Assembles a dataset from already parsed parts.
    pub fn new(name: String, judged: QueryJudgments, runs: SourceRuns) -> Self {
        Self {
            name,
            query_texts: judged.texts,
            judgments: judged.judgments,
            runs,
        }
    }

    /// Source names in sorted order.
    pub fn sources(&self) -> Vec<String> {
        self.runs.keys().cloned().collect()
    }

    /// Number of judged queries
    pub fn num_queries(&self) -> usize {
        self.judgments.len()
    }

    /// Total number of relevant (query, document) pairs
    pub fn num_qrels(&self) -> usize {
        self.judgments.num_relevant()
    }

    /// Judged queries no source returned anything for.
    pub fn unretrieved_queries(&self) -> Vec<&str> {
        let retrieved: BTreeSet<&str> = self
            .runs
            .values()
            .flat_map(|queries| queries.keys().map(String::as_str))
            .collect();
        self.judgments
            .query_ids()
            .filter(|q| !retrieved.contains(q))
            .collect()
    }

    pub fn info(&self) -> DatasetInfo {
        DatasetInfo {
            name: self.name.clone(),
            num_queries: self.num_queries(),
            num_qrels: self.num_qrels(),
            sources: self.sources(),
            queries: self.query_texts.clone(),
        }
    }
}
