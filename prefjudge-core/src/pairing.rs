/// Comparison schedules for a pool of documents.
///
/// Two strategies: balanced sampling, which guarantees every document a
/// minimum number of comparisons without asking for every pair, and
/// exhaustive pairing for pools small enough to compare completely.
/// Both return canonical, deduplicated task sets.
use std::collections::{BTreeMap, BTreeSet};

use rand::seq::SliceRandom;
use rand::Rng;

use crate::types::{DocId, Task};

/// Pairing strategy for one round of requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Strategy {
    Balanced,
    Exhaustive,
}

/// Pick the strategy for a pool: balanced sampling while the pool is larger
/// than the first-stage threshold, exhaustive once it fits under it.
pub fn strategy_for_pool(pool_size: usize, first_stage: usize, force_exhaustive: bool) -> Strategy {
    if !force_exhaustive && pool_size > first_stage {
        Strategy::Balanced
    } else {
        Strategy::Exhaustive
    }
}

/// Generate tasks so that every document appears in at least
/// `min(requested, docs.len() - 1)` of them.
///
/// Each step shuffles the documents, stably sorts them by how often they
/// have been paired so far, and takes the first pair in that order not yet
/// chosen. Under-compared documents are served first; the shuffle breaks
/// ties between equal counts so no document is favoured by position.
pub fn generate_balanced_tasks(
    docs: &[DocId],
    requested: usize,
    rng: &mut impl Rng,
) -> BTreeSet<Task> {
    let mut tasks = BTreeSet::new();
    let needed = requested.min(docs.len().saturating_sub(1));
    if needed < 1 {
        return tasks;
    }

    let mut counts = vec![0usize; docs.len()];
    let mut order: Vec<usize> = (0..docs.len()).collect();

    while counts.iter().any(|&c| c < needed) {
        order.shuffle(rng);
        order.sort_by_key(|&idx| counts[idx]);

        match first_unchosen_pair(docs, &order, &tasks) {
            Some((a, b, task)) => {
                tasks.insert(task);
                counts[a] += 1;
                counts[b] += 1;
            }
            // Every pair is taken, so every count is already docs.len() - 1.
            None => break,
        }
    }

    tasks
}

/// Scan ordered pairs (i, j), i < j, for the first task not yet in `tasks`.
fn first_unchosen_pair(
    docs: &[DocId],
    order: &[usize],
    tasks: &BTreeSet<Task>,
) -> Option<(usize, usize, Task)> {
    for (i, &a) in order.iter().enumerate() {
        for &b in &order[i + 1..] {
            if let Some(task) = Task::new(docs[a].as_str(), docs[b].as_str()) {
                if !tasks.contains(&task) {
                    return Some((a, b, task));
                }
            }
        }
    }
    None
}

/// Every unordered pair of distinct documents, exactly once.
pub fn generate_exhaustive_tasks(docs: &[DocId]) -> BTreeSet<Task> {
    let mut tasks = BTreeSet::new();
    for (i, a) in docs.iter().enumerate() {
        for b in &docs[i + 1..] {
            if let Some(task) = Task::new(a.as_str(), b.as_str()) {
                tasks.insert(task);
            }
        }
    }
    tasks
}

/// Generate one round of tasks with the given strategy.
pub fn generate_tasks(
    strategy: Strategy,
    docs: &[DocId],
    requested: usize,
    rng: &mut impl Rng,
) -> BTreeSet<Task> {
    match strategy {
        Strategy::Balanced => generate_balanced_tasks(docs, requested, rng),
        Strategy::Exhaustive => generate_exhaustive_tasks(docs),
    }
}

/// Per-document appearance counts within a task set.
pub fn comparison_counts(tasks: &BTreeSet<Task>) -> BTreeMap<&str, usize> {
    let mut counts = BTreeMap::new();
    for task in tasks {
        *counts.entry(task.first()).or_insert(0) += 1;
        *counts.entry(task.second()).or_insert(0) += 1;
    }
    counts
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    proptest! {
        /// Balanced tasks are canonical, self-pair free, and meet the budget.
        #[test]
        fn balanced_covers_every_document(
            m in 0usize..30,
            requested in 0usize..12,
            seed in any::<u64>(),
        ) {
            let pool: Vec<DocId> = (0..m).map(|i| format!("d{i}")).collect();
            let mut rng = StdRng::seed_from_u64(seed);
            let tasks = generate_balanced_tasks(&pool, requested, &mut rng);
            let needed = requested.min(m.saturating_sub(1));

            for task in &tasks {
                prop_assert!(task.first() < task.second());
                prop_assert!(pool.iter().any(|d| d == task.first()));
                prop_assert!(pool.iter().any(|d| d == task.second()));
            }
            let counts = comparison_counts(&tasks);
            if needed > 0 {
                for doc in &pool {
                    prop_assert!(counts.get(doc.as_str()).copied().unwrap_or(0) >= needed);
                }
            } else {
                prop_assert!(tasks.is_empty());
            }
        }
    }
}
