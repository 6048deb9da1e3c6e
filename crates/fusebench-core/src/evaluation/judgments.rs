//! Ground-truth relevance judgments.

use crate::search::types::DocId;
use std::collections::{BTreeMap, BTreeSet};

/// Ground truth for one query.
///
/// Either a plain set of relevant documents (binary relevance) or a graded
/// mapping where 0 means not relevant and higher grades mean more relevant.
/// Binary judgments behave as grade 1 for members and 0 otherwise.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelevanceJudgment {
    /// Set of relevant documents
    Binary(BTreeSet<DocId>),
    /// Document → relevance grade
    Graded(BTreeMap<DocId, u32>),
}

impl RelevanceJudgment {
    /// Creates a binary judgment from the relevant documents.
    pub fn binary<I, D>(docs: I) -> Self
    where
        I: IntoIterator<Item = D>,
        D: Into<DocId>,
    {
        RelevanceJudgment::Binary(docs.into_iter().map(Into::into).collect())
    }

    /// Creates a graded judgment from `(doc, grade)` pairs.
    pub fn graded<I, D>(grades: I) -> Self
    where
        I: IntoIterator<Item = (D, u32)>,
        D: Into<DocId>,
    {
        RelevanceJudgment::Graded(grades.into_iter().map(|(d, g)| (d.into(), g)).collect())
    }

    /// Relevance grade of a document (0 when not judged relevant).
    pub fn grade(&self, doc_id: &DocId) -> u32 {
        match self {
            RelevanceJudgment::Binary(docs) => u32::from(docs.contains(doc_id)),
            RelevanceJudgment::Graded(grades) => grades.get(doc_id).copied().unwrap_or(0),
        }
    }

    /// Whether a document has any relevance (grade > 0).
    pub fn is_relevant(&self, doc_id: &DocId) -> bool {
        self.grade(doc_id) > 0
    }

    /// Number of documents with grade > 0.
    pub fn total_relevant(&self) -> usize {
        match self {
            RelevanceJudgment::Binary(docs) => docs.len(),
            RelevanceJudgment::Graded(grades) => grades.values().filter(|&&g| g > 0).count(),
        }
    }

    /// Positive grades sorted descending: the ideal ranking's gains.
    pub fn ideal_grades(&self) -> Vec<u32> {
        let mut grades: Vec<u32> = match self {
            RelevanceJudgment::Binary(docs) => vec![1; docs.len()],
            RelevanceJudgment::Graded(grades) => {
                grades.values().copied().filter(|&g| g > 0).collect()
            }
        };
        grades.sort_unstable_by(|a, b| b.cmp(a));
        grades
    }
}

/// Read-only map from query id to its judgment.
///
/// Loaded once per evaluation run and shared by reference across all method
/// evaluations, including parallel ones.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JudgmentStore {
    judgments: BTreeMap<String, RelevanceJudgment>,
}

impl JudgmentStore {
    /// Creates a store from a query id → judgment map.
    pub fn new(judgments: BTreeMap<String, RelevanceJudgment>) -> Self {
        Self { judgments }
    }

    /// Judgment for a query, if the query has ground truth.
    pub fn get(&self, query_id: &str) -> Option<&RelevanceJudgment> {
        self.judgments.get(query_id)
    }

    /// Whether the query has ground truth.
    pub fn contains(&self, query_id: &str) -> bool {
        self.judgments.contains_key(query_id)
    }

    /// Judged query ids in sorted order.
    pub fn query_ids(&self) -> impl Iterator<Item = &str> {
        self.judgments.keys().map(String::as_str)
    }

    /// Number of judged queries.
    pub fn len(&self) -> usize {
        self.judgments.len()
    }

    /// Whether the store has no judgments.
    pub fn is_empty(&self) -> bool {
        self.judgments.is_empty()
    }

    /// Total number of relevant (query, document) pairs.
    pub fn num_relevant(&self) -> usize {
        self.judgments.values().map(|j| j.total_relevant()).sum()
    }
}

impl<S: Into<String>> FromIterator<(S, RelevanceJudgment)> for JudgmentStore {
    fn from_iter<T: IntoIterator<Item = (S, RelevanceJudgment)>>(iter: T) -> Self {
        Self::new(iter.into_iter().map(|(q, j)| (q.into(), j)).collect())
    }
}
