use std::collections::BTreeMap;
use std::fmt;

use thiserror::Error;

/// Opaque document identifier, unique within a topic.
///
/// Lexicographic order is used only to canonicalize pairs, never to rank.
pub type DocId = String;

/// Absolute relevance grades for one topic, keyed by document.
pub type Grades = BTreeMap<DocId, f64>;

/// An unordered comparison between two distinct documents.
///
/// Always stored as (lower id, higher id), so two tasks over the same
/// documents compare equal regardless of the order they were built in.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Task {
    first: DocId,
    second: DocId,
}

impl Task {
    /// Canonicalize a pair. Returns `None` for a self-pair.
    pub fn new(a: impl Into<DocId>, b: impl Into<DocId>) -> Option<Self> {
        let a = a.into();
        let b = b.into();
        match a.cmp(&b) {
            std::cmp::Ordering::Less => Some(Task { first: a, second: b }),
            std::cmp::Ordering::Greater => Some(Task { first: b, second: a }),
            std::cmp::Ordering::Equal => None,
        }
    }

    /// The lexicographically lower document.
    pub fn first(&self) -> &str {
        &self.first
    }

    /// The lexicographically higher document.
    pub fn second(&self) -> &str {
        &self.second
    }

    pub fn contains(&self, doc: &str) -> bool {
        self.first == doc || self.second == doc
    }
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.first, self.second)
    }
}

/// Why a judgment record could not be built.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum JudgmentError {
    #[error("document {0} compared with itself")]
    SelfPair(DocId),

    #[error("winner {winner} is neither {a} nor {b}")]
    WinnerNotInPair { a: DocId, b: DocId, winner: DocId },
}

/// A resolved comparison: the canonical pair plus the preferred document.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Judgment {
    pub task: Task,
    pub winner: DocId,
}

impl Judgment {
    pub fn new(
        a: impl Into<DocId>,
        b: impl Into<DocId>,
        winner: impl Into<DocId>,
    ) -> Result<Self, JudgmentError> {
        let a = a.into();
        let b = b.into();
        let winner = winner.into();
        if winner != a && winner != b {
            return Err(JudgmentError::WinnerNotInPair { a, b, winner });
        }
        let task = Task::new(a.clone(), b).ok_or(JudgmentError::SelfPair(a))?;
        Ok(Judgment { task, winner })
    }

    /// Shorthand for a judgment where `a` is preferred over `b`.
    pub fn prefer(a: impl Into<DocId>, b: impl Into<DocId>) -> Result<Self, JudgmentError> {
        let a = a.into();
        Judgment::new(a.clone(), b, a)
    }
}

impl fmt::Display for Judgment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.task, self.winner)
    }
}

/// Result of feeding a batch of judgments into a topic.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AddOutcome {
    /// Judgments that matched an outstanding request and were logged.
    pub accepted: usize,
    /// Judgments for pairs that were not outstanding. They had no effect.
    pub rejected: Vec<Judgment>,
}
