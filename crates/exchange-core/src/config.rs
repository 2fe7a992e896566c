use crate::error::{ExchangeError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const DEFAULT_DATA_DIR: &str = "data";
const DEFAULT_CONTACTS_FILE: &str = "phones.txt";
const DEFAULT_CALLS_FILE: &str = "calls.txt";
const DEFAULT_BLOCKLIST_FILE: &str = "blocked.txt";
const DEFAULT_SNAPSHOT_FILE: &str = "exchange_data.bin";

/// Where the exchange reads its input files and keeps its snapshot.
///
/// File names are relative to `data_dir` unless absolute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExchangeConfig {
    pub data_dir: PathBuf,
    pub contacts_file: PathBuf,
    pub calls_file: PathBuf,
    pub blocklist_file: PathBuf,
    pub snapshot_file: PathBuf,
    /// Stop after this many calls when importing.
    pub max_calls: Option<usize>,
}

impl Default for ExchangeConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            contacts_file: PathBuf::from(DEFAULT_CONTACTS_FILE),
            calls_file: PathBuf::from(DEFAULT_CALLS_FILE),
            blocklist_file: PathBuf::from(DEFAULT_BLOCKLIST_FILE),
            snapshot_file: PathBuf::from(DEFAULT_SNAPSHOT_FILE),
            max_calls: None,
        }
    }
}

impl ExchangeConfig {
    /// Reads a JSON config file; missing keys keep their defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| ExchangeError::io(path, e))?;
        serde_json::from_str(&content)
            .map_err(|e| ExchangeError::Config(format!("{}: {}", path.display(), e)))
    }

    /// Defaults, then the file named by `EXCHANGE_CONFIG` (if set), then
    /// `EXCHANGE_DATA_DIR`, `EXCHANGE_SNAPSHOT` and `EXCHANGE_MAX_CALLS`.
    pub fn from_env() -> Result<Self> {
        let config = match std::env::var("EXCHANGE_CONFIG") {
            Ok(path) => Self::from_file(Path::new(&path))?,
            Err(_) => Self::default(),
        };
        config.with_overrides(|key| std::env::var(key).ok())
    }

    fn with_overrides(mut self, var: impl Fn(&str) -> Option<String>) -> Result<Self> {
        if let Some(dir) = var("EXCHANGE_DATA_DIR") {
            self.data_dir = PathBuf::from(dir);
        }
        if let Some(snapshot) = var("EXCHANGE_SNAPSHOT") {
            self.snapshot_file = PathBuf::from(snapshot);
        }
        if let Some(max) = var("EXCHANGE_MAX_CALLS") {
            let max = max
                .parse()
                .map_err(|_| ExchangeError::Config(format!("EXCHANGE_MAX_CALLS={max} is not a count")))?;
            self.max_calls = Some(max);
        }
        Ok(self)
    }

    fn resolve(&self, file: &Path) -> PathBuf {
        if file.is_absolute() {
            file.to_path_buf()
        } else {
            self.data_dir.join(file)
        }
    }

    pub fn contacts_path(&self) -> PathBuf {
        self.resolve(&self.contacts_file)
    }

    pub fn calls_path(&self) -> PathBuf {
        self.resolve(&self.calls_file)
    }

    pub fn blocklist_path(&self) -> PathBuf {
        self.resolve(&self.blocklist_file)
    }

    pub fn snapshot_path(&self) -> PathBuf {
        self.resolve(&self.snapshot_file)
    }
}
