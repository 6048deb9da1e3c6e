use crate::error::{ConfigError, DataError};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;

/// Opaque document identifier, stable across all retrievers of a corpus.
///
/// Numeric identifiers compare numerically and textual identifiers compare
/// lexicographically; every numeric id sorts before every textual id. This
/// total order is what the fusion tie-break relies on.
///
/// # Examples
///
/// ```
/// use fusebench_core::search::DocId;
///
/// assert!(DocId::from(9u64) < DocId::from(10u64));
/// assert!(DocId::from("doc_009") < DocId::from("doc_010"));
/// assert!(DocId::from(999u64) < DocId::from("a"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DocId {
    /// Integer identifier
    Num(u64),
    /// String identifier
    Text(String),
}

impl fmt::Display for DocId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocId::Num(n) => write!(f, "{}", n),
            DocId::Text(s) => f.write_str(s),
        }
    }
}

impl From<u64> for DocId {
    fn from(id: u64) -> Self {
        DocId::Num(id)
    }
}

impl From<&str> for DocId {
    fn from(id: &str) -> Self {
        DocId::Text(id.to_string())
    }
}

impl From<String> for DocId {
    fn from(id: String) -> Self {
        DocId::Text(id)
    }
}

/// One retriever hit: a document with its raw score and 1-based rank.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedEntry {
    /// Document identifier
    pub doc_id: DocId,
    /// Raw retriever score (higher is better, scale is source-specific)
    pub score: f64,
    /// 1-based position in the source's ranking
    pub rank: u32,
}

impl RankedEntry {
    /// Creates a new ranked entry.
    pub fn new(doc_id: impl Into<DocId>, score: f64, rank: u32) -> Self {
        Self {
            doc_id: doc_id.into(),
            score,
            rank,
        }
    }
}

/// A single retriever's output for one query.
///
/// Lists can only be built through the validating constructors, and expose
/// no mutable access afterwards, so every `RankedList` the fusion engine sees
/// satisfies:
///
/// - ranks are >= 1 and strictly increasing along the list
/// - scores are finite and non-increasing along the list
/// - no document appears twice
///
/// Deserialization goes through the same validation.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(try_from = "Vec<RankedEntry>", into = "Vec<RankedEntry>")]
pub struct RankedList {
    entries: Vec<RankedEntry>,
}

impl RankedList {
    /// Validates and wraps a list of entries.
    ///
    /// # Errors
    ///
    /// Returns [`DataError`] on duplicate documents, zero or non-increasing
    /// ranks, increasing scores, or non-finite scores. Offending entries are
    /// rejected, never silently dropped.
    pub fn new(entries: Vec<RankedEntry>) -> Result<Self, DataError> {
        validate_entries(&entries)?;
        Ok(Self { entries })
    }

    /// Builds a list from `(doc_id, score)` pairs in rank order, assigning
    /// ranks 1..N.
    ///
    /// The pairs must already be sorted by score descending.
    ///
    /// # Example
    ///
    /// ```
    /// use fusebench_core::search::RankedList;
    ///
    /// let list = RankedList::from_scored([("a", 0.9), ("b", 0.7)]).unwrap();
    /// assert_eq!(list.len(), 2);
    /// assert_eq!(list.entries()[1].rank, 2);
    /// assert!(RankedList::from_scored([("a", 0.1), ("b", 0.7)]).is_err());
    /// ```
    pub fn from_scored<I, D>(hits: I) -> Result<Self, DataError>
    where
        I: IntoIterator<Item = (D, f64)>,
        D: Into<DocId>,
    {
        let entries = hits
            .into_iter()
            .enumerate()
            .map(|(i, (doc_id, score))| RankedEntry::new(doc_id, score, (i + 1) as u32))
            .collect();
        Self::new(entries)
    }

    /// An empty list (a source that retrieved nothing).
    pub fn empty() -> Self {
        Self::default()
    }

    /// Entries in rank order.
    pub fn entries(&self) -> &[RankedEntry] {
        &self.entries
    }

    /// Iterates entries in rank order.
    pub fn iter(&self) -> std::slice::Iter<'_, RankedEntry> {
        self.entries.iter()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the source retrieved nothing.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns `(min, max)` score of the list, or `None` when empty.
    ///
    /// Scores are non-increasing, so the bounds are the last and first entry.
    pub fn score_range(&self) -> Option<(f64, f64)> {
        match (self.entries.last(), self.entries.first()) {
            (Some(last), Some(first)) => Some((last.score, first.score)),
            _ => None,
        }
    }

    /// The first `n` entries as a new list.
    ///
    /// A prefix of a valid list is valid, so this cannot fail.
    pub fn head(&self, n: usize) -> RankedList {
        RankedList {
            entries: self.entries.iter().take(n).cloned().collect(),
        }
    }

    /// Evaluates a single source as a method of its own.
    ///
    /// Keeps the source's ranks and raw scores, truncated to `top_k`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidCutoff`] when `top_k == 0`.
    pub fn to_fused(&self, source: &str, top_k: usize) -> Result<Vec<FusedEntry>, ConfigError> {
        if top_k == 0 {
            return Err(ConfigError::InvalidCutoff(top_k));
        }
        Ok(self
            .entries
            .iter()
            .take(top_k)
            .enumerate()
            .map(|(i, entry)| FusedEntry {
                doc_id: entry.doc_id.clone(),
                fused_score: entry.score,
                rank: (i + 1) as u32,
                source_ranks: BTreeMap::from([(source.to_string(), entry.rank)]),
            })
            .collect())
    }
}

impl TryFrom<Vec<RankedEntry>> for RankedList {
    type Error = DataError;

    fn try_from(entries: Vec<RankedEntry>) -> Result<Self, Self::Error> {
        Self::new(entries)
    }
}

impl From<RankedList> for Vec<RankedEntry> {
    fn from(list: RankedList) -> Self {
        list.entries
    }
}

impl<'a> IntoIterator for &'a RankedList {
    type Item = &'a RankedEntry;
    type IntoIter = std::slice::Iter<'a, RankedEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

fn validate_entries(entries: &[RankedEntry]) -> Result<(), DataError> {
    let mut seen: HashSet<&DocId> = HashSet::with_capacity(entries.len());
    let mut previous: Option<&RankedEntry> = None;

    for entry in entries {
        if !entry.score.is_finite() {
            return Err(DataError::NonFiniteScore(entry.doc_id.clone()));
        }
        if entry.rank == 0 {
            return Err(DataError::ZeroRank(entry.doc_id.clone()));
        }
        if let Some(prev) = previous {
            if entry.rank <= prev.rank {
                return Err(DataError::NonMonotonicRank {
                    previous: prev.rank,
                    current: entry.rank,
                });
            }
            if entry.score > prev.score {
                return Err(DataError::NonMonotonicScore {
                    rank: entry.rank,
                    previous: prev.score,
                    current: entry.score,
                });
            }
        }
        if !seen.insert(&entry.doc_id) {
            return Err(DataError::DuplicateDocument {
                doc_id: entry.doc_id.clone(),
                rank: entry.rank,
            });
        }
        previous = Some(entry);
    }

    Ok(())
}

/// One entry of a fused ranking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FusedEntry {
    /// Document identifier
    pub doc_id: DocId,
    /// Combined score (RRF sum or weighted normalized sum)
    pub fused_score: f64,
    /// 1-based rank assigned after fusion
    pub rank: u32,
    /// Rank of the document in each source that retrieved it
    pub source_ranks: BTreeMap<String, u32>,
}
