/// Line-oriented qrels and judgment files.
///
/// Qrels:     `topic docno grade` or `topic 0 docno grade`
/// Judgments: `topic a b` (a wins) or `topic a b winner`
///
/// Malformed lines are reported and skipped; they never abort a load.
use std::collections::{BTreeMap, BTreeSet};

use prefjudge_core::{DocId, Grades, Judgment, JudgmentError, Task};
use thiserror::Error;
use tracing::warn;

/// Why a single input line was rejected.
#[derive(Debug, Error, PartialEq)]
pub enum RecordError {
    #[error("expected {expected} fields, found {found}")]
    FieldCount { expected: &'static str, found: usize },

    #[error("invalid grade \"{0}\"")]
    Grade(String),

    #[error(transparent)]
    Judgment(#[from] JudgmentError),
}

/// One parsed qrels line.
#[derive(Debug, PartialEq)]
pub struct QrelRecord {
    pub topic: String,
    pub doc: DocId,
    pub grade: f64,
}

/// One parsed judgment line.
#[derive(Debug, PartialEq)]
pub struct JudgmentRecord {
    pub topic: String,
    pub judgment: Judgment,
}

/// Parse a grade, dropping a single leading non-numeric marker (e.g. `L2`).
fn parse_grade(raw: &str) -> Result<f64, RecordError> {
    let numeric = match raw.chars().next() {
        Some(c) if !(c.is_ascii_digit() || matches!(c, '-' | '+' | '.')) => &raw[c.len_utf8()..],
        _ => raw,
    };
    numeric
        .parse::<f64>()
        .ok()
        .filter(|g| g.is_finite())
        .ok_or_else(|| RecordError::Grade(raw.to_string()))
}

/// Parse one qrels line. Blank lines yield `Ok(None)`.
pub fn parse_qrel_line(line: &str) -> Result<Option<QrelRecord>, RecordError> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    let (topic, doc, grade) = match fields.as_slice() {
        [] => return Ok(None),
        [topic, doc, grade] => (topic, doc, grade),
        [topic, _iteration, doc, grade] => (topic, doc, grade),
        other => {
            return Err(RecordError::FieldCount { expected: "3 or 4", found: other.len() });
        }
    };
    Ok(Some(QrelRecord {
        topic: topic.to_string(),
        doc: doc.to_string(),
        grade: parse_grade(grade)?,
    }))
}

/// Parse one judgment line. Blank lines yield `Ok(None)`.
pub fn parse_judgment_line(line: &str) -> Result<Option<JudgmentRecord>, RecordError> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    let (topic, a, b, winner) = match fields.as_slice() {
        [] => return Ok(None),
        [topic, a, b] => (topic, a, b, a),
        [topic, a, b, winner] => (topic, a, b, winner),
        other => {
            return Err(RecordError::FieldCount { expected: "3 or 4", found: other.len() });
        }
    };
    Ok(Some(JudgmentRecord {
        topic: topic.to_string(),
        judgment: Judgment::new(*a, *b, *winner)?,
    }))
}

/// Load grades per topic. Later lines for the same document overwrite earlier ones.
pub fn load_qrels(content: &str, source: &str) -> BTreeMap<String, Grades> {
    let mut qrels: BTreeMap<String, Grades> = BTreeMap::new();
    for (lineno, line) in content.lines().enumerate() {
        match parse_qrel_line(line) {
            Ok(Some(rec)) => {
                qrels.entry(rec.topic).or_default().insert(rec.doc, rec.grade);
            }
            Ok(None) => {}
            Err(e) => warn!("{source}:{}: bad qrel \"{}\": {e}", lineno + 1, line.trim()),
        }
    }
    qrels
}

/// Load judgments per topic, in file order. Exact repeats are collapsed.
pub fn load_judgments(content: &str, source: &str) -> BTreeMap<String, Vec<Judgment>> {
    let mut judgments: BTreeMap<String, Vec<Judgment>> = BTreeMap::new();
    let mut seen: BTreeSet<(String, Judgment)> = BTreeSet::new();
    for (lineno, line) in content.lines().enumerate() {
        match parse_judgment_line(line) {
            Ok(Some(rec)) => {
                if seen.insert((rec.topic.clone(), rec.judgment.clone())) {
                    judgments.entry(rec.topic).or_default().push(rec.judgment);
                }
            }
            Ok(None) => {}
            Err(e) => warn!("{source}:{}: bad judgment \"{}\": {e}", lineno + 1, line.trim()),
        }
    }
    judgments
}

/// Recorded winners per pair, per topic. Repeats are kept: each one is a vote.
pub type PreferenceVotes = BTreeMap<String, BTreeMap<Task, Vec<DocId>>>;

/// Load judgments as votes for the simulator.
pub fn load_votes(content: &str, source: &str) -> PreferenceVotes {
    let mut votes = PreferenceVotes::new();
    for (lineno, line) in content.lines().enumerate() {
        match parse_judgment_line(line) {
            Ok(Some(rec)) => {
                votes
                    .entry(rec.topic)
                    .or_default()
                    .entry(rec.judgment.task)
                    .or_default()
                    .push(rec.judgment.winner);
            }
            Ok(None) => {}
            Err(e) => warn!("{source}:{}: bad judgment \"{}\": {e}", lineno + 1, line.trim()),
        }
    }
    votes
}
