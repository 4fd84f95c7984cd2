/// Preference score synthesis.
///
/// Folds a converged topic's top-k win counts into the original grading
/// scale: top-k documents are lifted above every original grade, everything
/// else keeps its grade.
use std::collections::BTreeMap;

use crate::constants::PREFERENCE_OFFSET;
use crate::engine::TopicJudge;
use crate::types::{DocId, Grades};

/// Combine top-k win counts with original grades.
///
/// Each top-k document scores `wins + max_grade + PREFERENCE_OFFSET`, which
/// keeps their relative order and puts them strictly above every graded
/// document. All other documents keep their original grade.
pub fn combine_scores(grades: &Grades, top_k: &BTreeMap<DocId, f64>) -> BTreeMap<DocId, f64> {
    let max_grade = grades.values().copied().fold(0.0_f64, f64::max);

    let mut prefs: BTreeMap<DocId, f64> = grades
        .iter()
        .filter(|(doc, _)| !top_k.contains_key(*doc))
        .map(|(doc, &grade)| (doc.clone(), grade))
        .collect();
    for (doc, &wins) in top_k {
        prefs.insert(doc.clone(), wins + max_grade + PREFERENCE_OFFSET);
    }
    prefs
}

/// Preference scores for a topic, or `None` until it has converged.
pub fn synthesize(judge: &TopicJudge) -> Option<BTreeMap<DocId, f64>> {
    if !judge.is_converged() {
        return None;
    }
    Some(combine_scores(judge.grades(), judge.top_k()))
}
