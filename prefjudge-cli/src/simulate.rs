/// Simulated judging: drives a topic to convergence with synthetic judgments.
///
/// A request is answered by drawing one of the winners recorded for that
/// pair in a preference file, or a coin flip when the pair was never judged.
use std::collections::BTreeMap;

use prefjudge_core::{DocId, Grades, Judgment, Task, TopicJudge, TopicParams};
use rand::seq::IndexedRandom;
use rand::Rng;
use tracing::debug;

/// Pick a winner for one request.
pub fn synthetic_judgment(
    task: &Task,
    votes: Option<&BTreeMap<Task, Vec<DocId>>>,
    rng: &mut impl Rng,
) -> Judgment {
    let recorded = votes.and_then(|v| v.get(task)).and_then(|winners| winners.choose(rng));
    let winner = match recorded {
        Some(winner) => winner.clone(),
        None if rng.random_bool(0.5) => task.first().to_string(),
        None => task.second().to_string(),
    };
    Judgment {
        task: task.clone(),
        winner,
    }
}

/// Run one topic from fresh state until no requests remain.
pub fn simulate_topic(
    topic: &str,
    grades: Grades,
    votes: Option<&BTreeMap<Task, Vec<DocId>>>,
    params: TopicParams,
    rng: &mut impl Rng,
) -> TopicJudge {
    let mut judge = TopicJudge::new(topic, grades, params);
    loop {
        let requests: Vec<Task> = judge.requests(rng).iter().cloned().collect();
        if requests.is_empty() {
            break;
        }
        let judgments: Vec<Judgment> = requests
            .iter()
            .map(|task| synthetic_judgment(task, votes, rng))
            .collect();
        debug!(topic, judgments = judgments.len(), "simulated round");
        judge.add(judgments, rng);
    }
    judge
}
