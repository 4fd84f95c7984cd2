/// Tie-inclusive top-k selection over per-document scores.
///
/// Used to seed a topic's pool from relevance grades and to cut the final
/// top-k set from win counts.
use std::cmp::Ordering;

use crate::types::DocId;

/// Select the `depth` best documents with a strictly positive score.
///
/// Documents are ordered by score descending. The cut at `depth` extends
/// through every following document tied with the one at rank `depth`, so
/// no equally scored document is dropped by an arbitrary tie-break.
/// Ties keep their input order.
pub fn select_candidates<'a, I>(scores: I, depth: usize) -> Vec<DocId>
where
    I: IntoIterator<Item = (&'a DocId, &'a f64)>,
{
    let ranked: Vec<(&DocId, f64)> = scores
        .into_iter()
        .filter(|&(_, &score)| score > 0.0)
        .map(|(doc, &score)| (doc, score))
        .collect();
    let ranked = sort_descending(ranked);
    let bottom = tie_inclusive_cut(&ranked, depth);
    ranked[..bottom].iter().map(|(doc, _)| (*doc).clone()).collect()
}

/// Stable sort by score, highest first.
pub(crate) fn sort_descending<T>(mut ranked: Vec<(T, f64)>) -> Vec<(T, f64)> {
    ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
    ranked
}

/// Number of leading entries kept when cutting a descending list at `depth`.
pub(crate) fn tie_inclusive_cut<T>(ranked: &[(T, f64)], depth: usize) -> usize {
    if depth == 0 {
        return 0;
    }
    if depth >= ranked.len() {
        return ranked.len();
    }
    let boundary = ranked[depth - 1].1;
    let mut bottom = depth;
    while bottom < ranked.len() && ranked[bottom].1 == boundary {
        bottom += 1;
    }
    bottom
}
