//! Logging configuration from TOML (`[logging]` section)

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Raw logging configuration from TOML
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct FileLoggingConfig {
    /// Directory for per-run JSONL message journals; journaling is off when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub journal_dir: Option<PathBuf>,
}

impl FileLoggingConfig {
    /// `journal_dir` with a leading `~` expanded to the home directory
    pub fn resolved_journal_dir(&self) -> Option<PathBuf> {
        let dir = self.journal_dir.as_ref()?;
        match dir.strip_prefix("~") {
            Ok(rest) => dirs::home_dir().map(|home| home.join(rest)),
            Err(_) => Some(dir.clone()),
        }
    }
}
