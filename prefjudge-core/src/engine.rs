/// Per-topic judging state machine.
///
/// Pure computation, no IO. The caller asks for outstanding comparisons,
/// resolves them externally (human assessors or a simulator), and feeds
/// the judgments back. Rounds of balanced sampling shrink a large pool
/// until it fits under the first-stage threshold, then one exhaustive round
/// fixes the top-k set.
///
/// Stages:
///   Pending:    pool ready, no requests generated yet.
///   Requesting: requests outstanding, waiting for judgments.
///   Reducing:   every request resolved, round not yet tallied.
///   Converged:  top-k set fixed, pool empty. Terminal.
use std::collections::{BTreeMap, BTreeSet};

use rand::Rng;
use tracing::{debug, info, warn};

use crate::candidates::{select_candidates, sort_descending, tie_inclusive_cut};
use crate::constants::{
    DEFAULT_DEPTH, DEFAULT_FIRST_STAGE, DEFAULT_PAIRINGS, MAX_STALLED_ROUNDS, UNCONTESTED_SCORE,
};
use crate::pairing::{generate_tasks, strategy_for_pool, Strategy};
use crate::types::{AddOutcome, DocId, Grades, Judgment, Task};

/// Depth, pairing budget, and first-stage threshold for one topic.
///
/// Always satisfies `depth >= 1` and `depth < pairings < first_stage`
/// once built through [`TopicParams::new`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TopicParams {
    pub depth: usize,
    pub pairings: usize,
    pub first_stage: usize,
}

impl TopicParams {
    /// Build parameters, clamping each value to the smallest valid one.
    pub fn new(depth: usize, pairings: usize, first_stage: usize) -> Self {
        let mut clamped = depth.max(1);
        if clamped != depth {
            warn!(depth, clamped, "depth must be at least 1");
        }
        let depth = clamped;

        clamped = pairings.max(depth + 1);
        if clamped != pairings {
            warn!(pairings, depth, clamped, "pairings must exceed depth");
        }
        let pairings = clamped;

        clamped = first_stage.max(pairings + 1);
        if clamped != first_stage {
            warn!(first_stage, pairings, clamped, "first-stage threshold must exceed pairings");
        }

        TopicParams { depth, pairings, first_stage: clamped }
    }

    /// Win count a document must exceed to survive a balanced round.
    pub fn reduction_threshold(&self) -> usize {
        self.pairings / 2
    }
}

impl Default for TopicParams {
    fn default() -> Self {
        TopicParams {
            depth: DEFAULT_DEPTH,
            pairings: DEFAULT_PAIRINGS,
            first_stage: DEFAULT_FIRST_STAGE,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Stage {
    Pending,
    Requesting,
    Reducing,
    Converged,
}

/// Judging state for a single topic.
///
/// Every field is plain data so the whole machine can be snapshotted and
/// restored between invocations.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TopicJudge {
    topic: String,
    params: TopicParams,
    grades: Grades,
    candidates: Vec<DocId>,
    pool: Vec<DocId>,
    outstanding: BTreeSet<Task>,
    /// Wins per pool document in the current round.
    round_wins: BTreeMap<DocId, usize>,
    log: Vec<Judgment>,
    top_k: BTreeMap<DocId, f64>,
    stage: Stage,
    round: usize,
    stalled_rounds: usize,
    force_exhaustive: bool,
}

impl TopicJudge {
    pub fn new(topic: impl Into<String>, grades: Grades, params: TopicParams) -> Self {
        let topic = topic.into();
        let candidates = select_candidates(&grades, params.depth);

        let mut judge = TopicJudge {
            topic,
            params,
            grades,
            pool: candidates.clone(),
            candidates,
            outstanding: BTreeSet::new(),
            round_wins: BTreeMap::new(),
            log: Vec::new(),
            top_k: BTreeMap::new(),
            stage: Stage::Pending,
            round: 0,
            stalled_rounds: 0,
            force_exhaustive: false,
        };

        if judge.candidates.len() == 1 {
            let doc = judge.candidates[0].clone();
            info!(topic = %judge.topic, %doc, "single candidate, converged without comparisons");
            judge.top_k.insert(doc, UNCONTESTED_SCORE);
            judge.pool.clear();
            judge.stage = Stage::Converged;
        }

        judge
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn params(&self) -> TopicParams {
        self.params
    }

    pub fn grades(&self) -> &Grades {
        &self.grades
    }

    /// Initial pool, in selection order.
    pub fn candidates(&self) -> &[DocId] {
        &self.candidates
    }

    pub fn pool(&self) -> &[DocId] {
        &self.pool
    }

    pub fn outstanding(&self) -> &BTreeSet<Task> {
        &self.outstanding
    }

    pub fn log(&self) -> &[Judgment] {
        &self.log
    }

    pub fn top_k(&self) -> &BTreeMap<DocId, f64> {
        &self.top_k
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// Number of rounds closed so far.
    pub fn round(&self) -> usize {
        self.round
    }

    pub fn is_converged(&self) -> bool {
        self.stage == Stage::Converged
    }

    /// Current outstanding requests, generating a new round if none are open.
    ///
    /// Calling this again without an intervening [`add`](Self::add) returns
    /// the same set. An empty set means the topic has converged.
    pub fn requests(&mut self, rng: &mut impl Rng) -> &BTreeSet<Task> {
        self.settle(rng);
        &self.outstanding
    }

    /// Record judgments for outstanding requests.
    ///
    /// Judgments for pairs that are not outstanding (never requested, or
    /// already resolved) are returned as rejected and change nothing. Once
    /// the last outstanding request is resolved, the round is tallied and
    /// the next round's requests are generated, or the topic converges.
    pub fn add<I>(&mut self, judgments: I, rng: &mut impl Rng) -> AddOutcome
    where
        I: IntoIterator<Item = Judgment>,
    {
        let mut outcome = AddOutcome::default();

        for judgment in judgments {
            if self.outstanding.remove(&judgment.task) {
                *self.round_wins.entry(judgment.winner.clone()).or_insert(0) += 1;
                self.log.push(judgment);
                outcome.accepted += 1;
            } else {
                warn!(topic = %self.topic, pair = %judgment.task, "judgment not requested");
                outcome.rejected.push(judgment);
            }
        }

        if outcome.accepted > 0 && self.outstanding.is_empty() && self.stage == Stage::Requesting {
            self.stage = Stage::Reducing;
            self.settle(rng);
        }

        outcome
    }

    /// Advance until the topic is waiting on judgments or has converged.
    fn settle(&mut self, rng: &mut impl Rng) {
        while matches!(self.stage, Stage::Pending | Stage::Reducing) {
            self.step(rng);
        }
    }

    /// Perform exactly one stage transition and return the new stage.
    ///
    /// `Requesting` and `Converged` only move on external input, so stepping
    /// them is a no-op.
    pub fn step(&mut self, rng: &mut impl Rng) -> Stage {
        let current = self.stage;
        self.stage = match current {
            Stage::Pending => self.open_round(rng),
            Stage::Reducing => self.close_round(),
            Stage::Requesting | Stage::Converged => current,
        };
        self.stage
    }

    fn current_strategy(&self) -> Strategy {
        strategy_for_pool(self.pool.len(), self.params.first_stage, self.force_exhaustive)
    }

    fn open_round(&mut self, rng: &mut impl Rng) -> Stage {
        let strategy = self.current_strategy();
        let tasks = generate_tasks(strategy, &self.pool, self.params.pairings, rng);

        if tasks.is_empty() {
            // Nothing left to compare: zero or one document remains.
            if let Some(doc) = self.pool.first().cloned() {
                self.top_k.insert(doc, UNCONTESTED_SCORE);
            }
            self.pool.clear();
            info!(topic = %self.topic, top_k = self.top_k.len(), "converged without further comparisons");
            return Stage::Converged;
        }

        debug!(
            topic = %self.topic,
            round = self.round + 1,
            ?strategy,
            pool = self.pool.len(),
            requests = tasks.len(),
            "opened round"
        );
        self.round_wins = self.pool.iter().map(|doc| (doc.clone(), 0)).collect();
        self.outstanding = tasks;
        Stage::Requesting
    }

    fn close_round(&mut self) -> Stage {
        self.round += 1;
        let wins = std::mem::take(&mut self.round_wins);
        let score = |doc: &DocId| wins.get(doc).copied().unwrap_or(0);

        match self.current_strategy() {
            Strategy::Balanced => {
                self.reduce_pool(score);
                Stage::Pending
            }
            Strategy::Exhaustive => {
                self.fix_top_k(score);
                Stage::Converged
            }
        }
    }

    /// Keep documents that won a majority of their balanced comparisons.
    fn reduce_pool(&mut self, score: impl Fn(&DocId) -> usize) {
        let threshold = self.params.reduction_threshold();
        let survivors: Vec<DocId> = self
            .pool
            .iter()
            .filter(|&doc| score(doc) > threshold)
            .cloned()
            .collect();

        if survivors.is_empty() || survivors.len() >= self.pool.len() {
            self.stalled_rounds += 1;
            warn!(
                topic = %self.topic,
                round = self.round,
                pool = self.pool.len(),
                survivors = survivors.len(),
                stalled = self.stalled_rounds,
                "reduction did not shrink the pool"
            );
            if self.stalled_rounds >= MAX_STALLED_ROUNDS {
                info!(topic = %self.topic, pool = self.pool.len(), "forcing exhaustive stage");
                self.force_exhaustive = true;
            }
            return;
        }

        info!(
            topic = %self.topic,
            round = self.round,
            from = self.pool.len(),
            to = survivors.len(),
            threshold,
            "reduced pool"
        );
        self.stalled_rounds = 0;
        self.pool = survivors;
    }

    /// Cut the pool at the configured depth by win count, ties included.
    fn fix_top_k(&mut self, score: impl Fn(&DocId) -> usize) {
        let ranked: Vec<(DocId, f64)> = self
            .pool
            .drain(..)
            .map(|doc| {
                let s = score(&doc) as f64;
                (doc, s)
            })
            .collect();
        let ranked = sort_descending(ranked);
        let bottom = tie_inclusive_cut(&ranked, self.params.depth);

        self.top_k = ranked
            .into_iter()
            .take(bottom)
            .filter(|(_, s)| *s > 0.0)
            .collect();
        info!(topic = %self.topic, rounds = self.round, top_k = self.top_k.len(), "converged");
    }
}
