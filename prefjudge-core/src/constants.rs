/// Default number of top documents a topic must settle on.
pub const DEFAULT_DEPTH: usize = 5;

/// Default comparisons requested per document while the pool is large.
/// Must stay above `DEFAULT_DEPTH`.
pub const DEFAULT_PAIRINGS: usize = 7;

/// Default pool size above which balanced sampling is used instead of
/// exhaustive pairing. Must stay above `DEFAULT_PAIRINGS`.
pub const DEFAULT_FIRST_STAGE: usize = 9;

/// Offset added on top of the highest original grade when synthesizing
/// preference scores, so every top-k document lands above every graded one.
pub const PREFERENCE_OFFSET: f64 = 100.0;

/// Score fixed for a document that wins its topic without any comparison.
pub const UNCONTESTED_SCORE: f64 = 1.0;

/// Reductions in a row that may fail to shrink the pool before the topic
/// is pushed into exhaustive pairing.
pub const MAX_STALLED_ROUNDS: usize = 2;
