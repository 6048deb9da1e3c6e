//! Judgment file parsing.
//!
//! The file is a JSON array with one record per query:
//!
//! ```json
//! [
//!   {"query_id": "q1", "query": "text", "relevant_docs": ["doc_1", "doc_7"]},
//!   {"query_id": "q2", "relevance": {"doc_3": 2, "doc_4": 1}},
//!   {"query_id": "q3", "relevance": [{"doc_id": 17, "grade": 2}]}
//! ]
//! ```
//!
//! `relevance` (graded) wins over `relevant_docs` (binary) when both are set.
//! Object keys are strings, so a key that is a canonical unsigned integer
//! (`"17"`, not `"017"`) is read as a numeric document id. Use the list form
//! to judge a textual id made of digits.

use anyhow::{bail, Context, Result};
use fusebench_core::evaluation::{JudgmentStore, RelevanceJudgment};
use fusebench_core::search::DocId;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::debug;

#[derive(Debug, Deserialize)]
struct JudgmentRecord {
    query_id: String,
    #[serde(default)]
    query: Option<String>,
    #[serde(default)]
    relevant_docs: Option<Vec<DocId>>,
    #[serde(default)]
    relevance: Option<GradedRelevance>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum GradedRelevance {
    Map(BTreeMap<String, u32>),
    List(Vec<GradedDoc>),
}

#[derive(Debug, Deserialize)]
struct GradedDoc {
    doc_id: DocId,
    grade: u32,
}

/// Parsed judgment file.
#[derive(Debug, Default)]
pub struct QueryJudgments {
    pub judgments: JudgmentStore,
    pub texts: BTreeMap<String, String>,
}

/// Reads and parses a judgment file.
pub fn load_judgments(path: &Path) -> Result<QueryJudgments> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read judgments: {}", path.display()))?;
    parse_judgments(&text).with_context(|| format!("Invalid judgments file: {}", path.display()))
}

/// Parses judgment JSON. Repeated query ids are an error.
pub fn parse_judgments(text: &str) -> Result<QueryJudgments> {
    let records: Vec<JudgmentRecord> = serde_json::from_str(text)?;

    let mut judgments = BTreeMap::new();
    let mut texts = BTreeMap::new();

    for record in records {
        let judgment = match (record.relevance, record.relevant_docs) {
            (Some(GradedRelevance::Map(grades)), _) => RelevanceJudgment::graded(
                grades.into_iter().map(|(key, grade)| (doc_id_from_key(&key), grade)),
            ),
            (Some(GradedRelevance::List(grades)), _) => {
                RelevanceJudgment::graded(grades.into_iter().map(|g| (g.doc_id, g.grade)))
            }
            (None, Some(docs)) => RelevanceJudgment::binary(docs),
            (None, None) => {
                debug!("query {} has no relevant documents", record.query_id);
                RelevanceJudgment::binary(Vec::<DocId>::new())
            }
        };

        if judgments.insert(record.query_id.clone(), judgment).is_some() {
            bail!("Duplicate query id: {}", record.query_id);
        }
        if let Some(query) = record.query {
            texts.insert(record.query_id, query);
        }
    }

    Ok(QueryJudgments {
        judgments: JudgmentStore::new(judgments),
        texts,
    })
}

fn doc_id_from_key(key: &str) -> DocId {
    match key.parse::<u64>() {
        Ok(n) if n.to_string() == key => DocId::Num(n),
        _ => DocId::Text(key.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_binary_judgments() {
        let parsed = parse_judgments(
            r#"[{"query_id": "q1", "query": "what is rrf", "relevant_docs": ["a", 7]}]"#,
        )
        .unwrap();
        let judgment = parsed.judgments.get("q1").unwrap();
        assert!(judgment.is_relevant(&DocId::from("a")));
        assert!(judgment.is_relevant(&DocId::from(7u64)));
        assert_eq!(parsed.texts["q1"], "what is rrf");
    }

    #[test]
    fn test_graded_map_wins_over_binary() {
        let parsed = parse_judgments(
            r#"[{"query_id": "q1", "relevant_docs": ["x"], "relevance": {"a": 2, "17": 1, "017": 1}}]"#,
        )
        .unwrap();
        let judgment = parsed.judgments.get("q1").unwrap();
        assert_eq!(judgment.grade(&DocId::from("a")), 2);
        assert_eq!(judgment.grade(&DocId::from(17u64)), 1);
        assert_eq!(judgment.grade(&DocId::from("017")), 1);
        assert_eq!(judgment.grade(&DocId::from("x")), 0);
        assert!(parsed.texts.is_empty());
    }

    #[test]
    fn test_graded_list() {
        let parsed = parse_judgments(
            r#"[{"query_id": "q1", "relevance": [{"doc_id": "42", "grade": 3}]}]"#,
        )
        .unwrap();
        let judgment = parsed.judgments.get("q1").unwrap();
        assert_eq!(judgment.grade(&DocId::from("42")), 3);
        assert_eq!(judgment.grade(&DocId::from(42u64)), 0);
    }

    #[test]
    fn test_query_without_relevant_docs_is_kept() {
        let parsed = parse_judgments(r#"[{"query_id": "q1"}]"#).unwrap();
        assert_eq!(parsed.judgments.len(), 1);
        assert_eq!(parsed.judgments.get("q1").unwrap().total_relevant(), 0);
    }

    #[test]
    fn test_duplicate_query_id_is_error() {
        let err = parse_judgments(
            r#"[{"query_id": "q1", "relevant_docs": []}, {"query_id": "q1", "relevant_docs": []}]"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("Duplicate query id: q1"));
    }

    #[test]
    fn test_doc_id_from_key() {
        assert_eq!(doc_id_from_key("12"), DocId::Num(12));
        assert_eq!(doc_id_from_key("0"), DocId::Num(0));
        assert_eq!(doc_id_from_key("012"), DocId::Text("012".to_string()));
        assert_eq!(doc_id_from_key("+1"), DocId::Text("+1".to_string()));
        assert_eq!(doc_id_from_key("doc"), DocId::Text("doc".to_string()));
    }
}
