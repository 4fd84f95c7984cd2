/// prefjudge-core: top-k preference judging over pooled documents.
///
/// Pairwise "which is better" requests → per-round win counts → a fixed
/// top-k set, folded back into the original relevance grades.
/// No IO, no persistence. Bring your own assessors.
///
/// Each topic owns one [`TopicJudge`]. Large pools are thinned with
/// balanced sampling until they fit under the first-stage threshold, then
/// compared exhaustively. All randomness comes from a caller-supplied RNG.
///
/// # Quick start
///
/// ```rust
/// use prefjudge_core::{synthesize, Grades, Judgment, TopicJudge, TopicParams};
/// use rand::rngs::StdRng;
/// use rand::SeedableRng;
///
/// let grades: Grades = [("A", 3.0), ("B", 3.0), ("C", 2.0)]
///     .iter()
///     .map(|(d, g)| (d.to_string(), *g))
///     .collect();
///
/// let mut rng = StdRng::seed_from_u64(42);
/// let mut judge = TopicJudge::new("401", grades, TopicParams::new(1, 2, 3));
///
/// while !judge.requests(&mut rng).is_empty() {
///     let judgments: Vec<Judgment> = judge
///         .outstanding()
///         .iter()
///         .map(|t| Judgment::prefer(t.first(), t.second()).unwrap())
///         .collect();
///     judge.add(judgments, &mut rng);
/// }
///
/// let prefs = synthesize(&judge).unwrap();
/// assert_eq!(prefs["A"], 104.0);
/// ```

pub mod candidates;
pub mod constants;
pub mod engine;
pub mod pairing;
pub mod synthesis;
pub mod types;

// Re-export primary public API at crate root.
pub use candidates::select_candidates;
pub use engine::{Stage, TopicJudge, TopicParams};
pub use pairing::{
    comparison_counts, generate_balanced_tasks, generate_exhaustive_tasks, generate_tasks,
    strategy_for_pool, Strategy,
};
pub use synthesis::{combine_scores, synthesize};
pub use types::{AddOutcome, DocId, Grades, Judgment, JudgmentError, Task};
