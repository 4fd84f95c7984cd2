//! End-to-end judging scenarios driven through the public API.

use std::collections::BTreeSet;

use prefjudge_core::{synthesize, Grades, Judgment, Stage, Task, TopicJudge, TopicParams};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn grades(entries: &[(&str, f64)]) -> Grades {
    entries.iter().map(|(d, g)| (d.to_string(), *g)).collect()
}

/// Resolve every request with a coin flip.
fn coin_flips(tasks: &BTreeSet<Task>, rng: &mut impl Rng) -> Vec<Judgment> {
    tasks
        .iter()
        .map(|t| {
            let winner = if rng.random_bool(0.5) { t.first() } else { t.second() };
            Judgment::new(t.first(), t.second(), winner).unwrap()
        })
        .collect()
}

#[test]
fn tied_candidates_settled_by_one_judgment() {
    let mut rng = StdRng::seed_from_u64(1);
    let g = grades(&[("A", 3.0), ("B", 3.0), ("C", 2.0), ("D", 1.0)]);
    let mut judge = TopicJudge::new("401", g, TopicParams::new(1, 2, 3));
    assert_eq!(judge.candidates(), &["A".to_string(), "B".to_string()]);

    let requests = judge.requests(&mut rng).clone();
    assert_eq!(requests.len(), 1);
    assert!(requests.contains(&Task::new("A", "B").unwrap()));

    let outcome = judge.add(vec![Judgment::new("A", "B", "A").unwrap()], &mut rng);
    assert_eq!(outcome.accepted, 1);
    assert!(judge.is_converged());
    assert_eq!(judge.top_k().len(), 1);
    assert_eq!(judge.top_k()["A"], 1.0);

    let prefs = synthesize(&judge).unwrap();
    assert_eq!(prefs["A"], 104.0);
    assert_eq!(prefs["B"], 3.0);
    assert_eq!(prefs["C"], 2.0);
    assert_eq!(prefs["D"], 1.0);
}

#[test]
fn single_relevant_document_needs_no_requests() {
    let mut rng = StdRng::seed_from_u64(1);
    let g = grades(&[("A", 1.0), ("B", 0.0), ("C", 0.0)]);
    let mut judge = TopicJudge::new("402", g, TopicParams::default());

    assert!(judge.requests(&mut rng).is_empty());
    assert_eq!(judge.stage(), Stage::Converged);
    let prefs = synthesize(&judge).unwrap();
    assert_eq!(prefs["A"], 1.0 + 1.0 + 100.0);
    assert_eq!(prefs["B"], 0.0);
}

#[test]
fn synthesis_waits_for_convergence() {
    let mut rng = StdRng::seed_from_u64(1);
    let g = grades(&[("A", 2.0), ("B", 1.0), ("C", 1.0)]);
    let mut judge = TopicJudge::new("403", g, TopicParams::default());
    judge.requests(&mut rng);
    assert!(synthesize(&judge).is_none());
}

#[test]
fn unrequested_judgment_leaves_state_alone() {
    let mut rng = StdRng::seed_from_u64(2);
    let g = grades(&[("A", 2.0), ("B", 2.0), ("C", 2.0)]);
    let mut judge = TopicJudge::new("404", g, TopicParams::default());
    let before = judge.requests(&mut rng).clone();

    let outcome = judge.add(vec![Judgment::new("A", "Z", "Z").unwrap()], &mut rng);
    assert_eq!(outcome.accepted, 0);
    assert_eq!(outcome.rejected.len(), 1);
    assert_eq!(judge.outstanding(), &before);
    assert!(judge.log().is_empty());
}

#[test]
fn log_keeps_submission_order() {
    let mut rng = StdRng::seed_from_u64(9);
    let g: Grades = (0..6).map(|i| (format!("d{i}"), 1.0)).collect();
    let mut judge = TopicJudge::new("405", g, TopicParams::default());

    let mut submitted = Vec::new();
    let requests = judge.requests(&mut rng).clone();
    let mut batch = coin_flips(&requests, &mut rng);
    batch.reverse();
    for chunk in batch.chunks(4) {
        submitted.extend_from_slice(chunk);
        judge.add(chunk.to_vec(), &mut rng);
    }

    assert_eq!(judge.log(), submitted.as_slice());
    assert!(judge.is_converged());
}

#[test]
fn random_judging_always_converges() {
    for seed in 0..20u64 {
        let mut rng = StdRng::seed_from_u64(seed);
        let n = 5 + (seed as usize * 7) % 60;
        let g: Grades = (0..n)
            .map(|i| (format!("doc{i:03}"), (1 + i % 2) as f64))
            .collect();
        let params = TopicParams::new(1 + seed as usize % 5, 7, 9 + seed as usize % 4);
        let mut judge = TopicJudge::new(format!("t{seed}"), g, params);

        let mut rounds = 0;
        loop {
            let requests = judge.requests(&mut rng).clone();
            if requests.is_empty() {
                break;
            }
            let judgments = coin_flips(&requests, &mut rng);
            let outcome = judge.add(judgments, &mut rng);
            assert!(outcome.rejected.is_empty());
            rounds += 1;
            assert!(rounds <= 50, "seed {seed} did not converge");
        }

        assert!(judge.is_converged());
        assert!(judge.pool().is_empty());
        assert!(!judge.top_k().is_empty(), "seed {seed} converged without a top-k set");
        assert!(synthesize(&judge).is_some());
    }
}
