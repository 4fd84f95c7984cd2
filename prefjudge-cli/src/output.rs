/// Output formatting: qrels-style views of judging state.
///
/// Every document view prints `topic Q0 docno value`; the log prints
/// `topic a b winner`.
use std::io::{self, Write};

use prefjudge_core::{synthesize, Stage, Task, TopicJudge};
use rand::Rng;

/// Format a score the way qrels files usually carry it: integral values
/// keep one decimal (`3.0`), everything else prints in full.
pub fn format_score(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{value:.1}")
    } else {
        format!("{value}")
    }
}

fn write_doc_line(out: &mut impl Write, topic: &str, doc: &str, value: f64) -> io::Result<()> {
    writeln!(out, "{topic} Q0 {doc} {}", format_score(value))
}

/// Synthesized preference scores. Topics still being judged are skipped.
pub fn write_prefs(out: &mut impl Write, judge: &TopicJudge) -> io::Result<()> {
    if let Some(prefs) = synthesize(judge) {
        for (doc, value) in &prefs {
            write_doc_line(out, judge.topic(), doc, *value)?;
        }
    }
    Ok(())
}

/// Original grades as loaded.
pub fn write_qrels(out: &mut impl Write, judge: &TopicJudge) -> io::Result<()> {
    for (doc, grade) in judge.grades() {
        write_doc_line(out, judge.topic(), doc, *grade)?;
    }
    Ok(())
}

/// Initial candidate pool with original grades.
pub fn write_candidates(out: &mut impl Write, judge: &TopicJudge) -> io::Result<()> {
    write_docs_with_grades(out, judge, judge.candidates())
}

/// Current pool with original grades.
pub fn write_pool(out: &mut impl Write, judge: &TopicJudge) -> io::Result<()> {
    write_docs_with_grades(out, judge, judge.pool())
}

fn write_docs_with_grades(out: &mut impl Write, judge: &TopicJudge, docs: &[String]) -> io::Result<()> {
    for doc in docs {
        let grade = judge.grades().get(doc).copied().unwrap_or(0.0);
        write_doc_line(out, judge.topic(), doc, grade)?;
    }
    Ok(())
}

/// Every accepted judgment, in submission order.
pub fn write_log(out: &mut impl Write, judge: &TopicJudge) -> io::Result<()> {
    for judgment in judge.log() {
        writeln!(out, "{} {judgment}", judge.topic())?;
    }
    Ok(())
}

/// Outstanding requests, each printed with a random left/right order so
/// assessors cannot learn a positional pattern.
pub fn write_requests<'a>(
    out: &mut impl Write,
    topic: &str,
    requests: impl IntoIterator<Item = &'a Task>,
    rng: &mut impl Rng,
) -> io::Result<()> {
    for task in requests {
        let (left, right) = if rng.random_bool(0.5) {
            (task.first(), task.second())
        } else {
            (task.second(), task.first())
        };
        writeln!(out, "{topic} {left} {right}")?;
    }
    Ok(())
}

/// Open the current round of every topic, then print all outstanding
/// requests. Every topic is opened before the first write, so a reader that
/// hangs up early still leaves each topic with a stable request set.
pub fn write_all_requests<'a>(
    out: &mut impl Write,
    judges: impl IntoIterator<Item = &'a mut TopicJudge>,
    rng: &mut impl Rng,
) -> io::Result<()> {
    let opened: Vec<(String, Vec<Task>)> = judges
        .into_iter()
        .map(|judge| {
            let requests = judge.requests(rng).iter().cloned().collect();
            (judge.topic().to_string(), requests)
        })
        .collect();
    for (topic, requests) in &opened {
        write_requests(out, topic, requests, rng)?;
    }
    out.flush()
}

fn stage_name(stage: Stage) -> &'static str {
    match stage {
        Stage::Pending => "pending",
        Stage::Requesting => "requesting",
        Stage::Reducing => "reducing",
        Stage::Converged => "converged",
    }
}

/// One summary line per topic.
pub fn write_status(out: &mut impl Write, judge: &TopicJudge) -> io::Result<()> {
    writeln!(
        out,
        "{} {} round={} pool={} outstanding={} judged={} top_k={}",
        judge.topic(),
        stage_name(judge.stage()),
        judge.round(),
        judge.pool().len(),
        judge.outstanding().len(),
        judge.log().len(),
        judge.top_k().len(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use prefjudge_core::{Grades, Judgment, TopicParams};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn render(f: impl FnOnce(&mut Vec<u8>) -> io::Result<()>) -> String {
        let mut buf = Vec::new();
        f(&mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    fn converged_judge() -> TopicJudge {
        let mut rng = StdRng::seed_from_u64(1);
        let grades: Grades = [("A", 3.0), ("B", 3.0), ("C", 2.0), ("D", 1.0)]
            .iter()
            .map(|(d, g)| (d.to_string(), *g))
            .collect();
        let mut judge = TopicJudge::new("401", grades, TopicParams::new(1, 2, 3));
        judge.requests(&mut rng);
        judge.add(vec![Judgment::new("A", "B", "A").unwrap()], &mut rng);
        judge
    }

    #[test]
    fn test_format_score() {
        assert_eq!(format_score(3.0), "3.0");
        assert_eq!(format_score(104.0), "104.0");
        assert_eq!(format_score(0.25), "0.25");
        assert_eq!(format_score(-1.0), "-1.0");
    }

    #[test]
    fn test_prefs_view() {
        let judge = converged_judge();
        let text = render(|out| write_prefs(out, &judge));
        assert_eq!(text, "401 Q0 A 104.0\n401 Q0 B 3.0\n401 Q0 C 2.0\n401 Q0 D 1.0\n");
    }

    #[test]
    fn test_prefs_skips_open_topics() {
        let grades: Grades = [("A", 1.0), ("B", 1.0)].iter().map(|(d, g)| (d.to_string(), *g)).collect();
        let judge = TopicJudge::new("402", grades, TopicParams::default());
        assert_eq!(render(|out| write_prefs(out, &judge)), "");
    }

    #[test]
    fn test_candidates_and_log_views() {
        let judge = converged_judge();
        assert_eq!(render(|out| write_candidates(out, &judge)), "401 Q0 A 3.0\n401 Q0 B 3.0\n");
        assert_eq!(render(|out| write_pool(out, &judge)), "");
        assert_eq!(render(|out| write_log(out, &judge)), "401 A B A\n");
    }

    #[test]
    fn test_requests_cover_both_orders() {
        let task = Task::new("x", "y").unwrap();
        let tasks = vec![task; 64];
        let mut rng = StdRng::seed_from_u64(2);
        let text = render(|out| write_requests(out, "9", &tasks, &mut rng));
        assert!(text.lines().any(|l| l == "9 x y"));
        assert!(text.lines().any(|l| l == "9 y x"));
        assert_eq!(text.lines().count(), 64);
    }

    /// A reader that has already gone away.
    struct ClosedPipe;

    impl Write for ClosedPipe {
        fn write(&mut self, _: &[u8]) -> io::Result<usize> {
            Err(io::ErrorKind::BrokenPipe.into())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_closed_output_still_opens_every_topic() {
        let mut rng = StdRng::seed_from_u64(6);
        let mut judges: Vec<TopicJudge> = ["11", "12"]
            .iter()
            .map(|topic| {
                let grades: Grades = (0..4).map(|i| (format!("d{i}"), 1.0)).collect();
                TopicJudge::new(*topic, grades, TopicParams::default())
            })
            .collect();

        let err = write_all_requests(&mut ClosedPipe, judges.iter_mut(), &mut rng).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
        for judge in &judges {
            assert_eq!(judge.stage(), Stage::Requesting);
            assert_eq!(judge.outstanding().len(), 6);
        }

        // The next listing repeats the same requests.
        let before: Vec<_> = judges.iter().map(|j| j.outstanding().clone()).collect();
        let text = render(|out| write_all_requests(out, judges.iter_mut(), &mut rng));
        assert_eq!(text.lines().count(), 12);
        let after: Vec<_> = judges.iter().map(|j| j.outstanding().clone()).collect();
        assert_eq!(before, after);
    }

    #[test]
    fn test_status_line() {
        let judge = converged_judge();
        assert_eq!(
            render(|out| write_status(out, &judge)),
            "401 converged round=1 pool=0 outstanding=0 judged=1 top_k=1\n"
        );
    }
}
