/// Config file loading and creation for the prefjudge CLI.
///
/// Config lives at ~/.config/prefjudge/config.toml.
/// All fields are optional. CLI args override config values.
use serde::Deserialize;
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Deserialize, Default, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct PrefjudgeConfig {
    /// Depth of top documents required.
    pub k: Option<usize>,
    /// Comparisons per document while the pool is large.
    pub p: Option<usize>,
    /// Pool size above which balanced sampling is used.
    pub f: Option<usize>,
    /// RNG seed for request generation and simulation.
    pub seed: Option<u64>,
}

const DEFAULT_CONFIG_TEMPLATE: &str = "\
# prefjudge configuration
# All values here can be overridden by CLI flags.

# Depth of top documents required
# k = 5

# Comparisons per document during balanced sampling (must exceed k)
# p = 7

# Pool size above which balanced sampling is used (must exceed p)
# f = 9

# Fixed RNG seed for reproducible request order and simulation
# seed = 42
";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config at {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid config at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("config file already exists at {0}")]
    Exists(PathBuf),

    #[error("failed to write config to {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// `~/.config/prefjudge/config.toml`, or `None` without a home directory.
pub fn config_path() -> Option<PathBuf> {
    let home = std::env::var_os("HOME")?;
    Some(PathBuf::from(home).join(".config/prefjudge/config.toml"))
}

/// A missing file is an empty config.
pub fn load_config(path: &Path) -> Result<PrefjudgeConfig, ConfigError> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(PrefjudgeConfig::default()),
        Err(source) => return Err(ConfigError::Read { path: path.to_path_buf(), source }),
    };
    toml::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Write the commented template to `path`, never replacing an existing file.
pub fn create_default_config(path: &Path) -> Result<(), ConfigError> {
    let write_err = |source| ConfigError::Write { path: path.to_path_buf(), source };
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(write_err)?;
    }
    let mut file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .map_err(|e| match e.kind() {
            io::ErrorKind::AlreadyExists => ConfigError::Exists(path.to_path_buf()),
            _ => write_err(e),
        })?;
    file.write_all(DEFAULT_CONFIG_TEMPLATE.as_bytes()).map_err(write_err)
}
