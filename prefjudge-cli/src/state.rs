/// Persisted judging state: one topic state machine per topic, stored as JSON.
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use prefjudge_core::TopicJudge;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StateError {
    #[error("failed to access state file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("state file {path} is corrupt: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct JudgingState {
    pub topics: BTreeMap<String, TopicJudge>,
}

impl JudgingState {
    pub fn load(path: &Path) -> Result<Self, StateError> {
        let content = std::fs::read_to_string(path).map_err(|source| StateError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| StateError::Json {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Write the state next to its destination, then rename over it, so an
    /// interrupted save never leaves a truncated file behind.
    pub fn save(&self, path: &Path) -> Result<(), StateError> {
        let io_err = |source| StateError::Io { path: path.to_path_buf(), source };
        let json = serde_json::to_string_pretty(self).map_err(|source| StateError::Json {
            path: path.to_path_buf(),
            source,
        })?;

        let mut tmp = path.as_os_str().to_owned();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);
        std::fs::write(&tmp, json).map_err(io_err)?;
        std::fs::rename(&tmp, path).map_err(io_err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prefjudge_core::{Grades, Judgment, TopicParams};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_mid_round_state_survives_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        let mut rng = StdRng::seed_from_u64(4);

        let grades: Grades = (0..5).map(|i| (format!("d{i}"), 1.0)).collect();
        let mut judge = TopicJudge::new("7", grades, TopicParams::default());
        let first = judge.requests(&mut rng).iter().next().cloned().unwrap();
        judge.add(vec![Judgment::prefer(first.first(), first.second()).unwrap()], &mut rng);

        let mut state = JudgingState::default();
        state.topics.insert("7".to_string(), judge.clone());
        state.save(&path).unwrap();

        let restored = JudgingState::load(&path).unwrap();
        assert_eq!(restored.topics["7"], judge);
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[test]
    fn test_missing_and_corrupt_files() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.json");
        assert!(matches!(JudgingState::load(&missing), Err(StateError::Io { .. })));

        let corrupt = dir.path().join("bad.json");
        std::fs::write(&corrupt, "{not json").unwrap();
        assert!(matches!(JudgingState::load(&corrupt), Err(StateError::Json { .. })));
    }
}
