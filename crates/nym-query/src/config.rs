use std::path::{Path, PathBuf};

use nym_ledger::{SyncMode, WalConfig};
use serde::{Deserialize, Serialize};

use crate::error::QueryError;

/// Node-level configuration, loadable from TOML.
///
/// ```toml
/// log_path = "data/nym.wal"
/// sync_mode = "every_write"
/// checkpoint_interval = 32
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    /// WAL file. `None` keeps the ledger in memory.
    pub log_path: Option<PathBuf>,
    /// When WAL writes are fsynced.
    pub sync_mode: SyncMode,
    /// Materialize a checkpoint every this many updates of an identity.
    /// Zero disables compaction.
    pub checkpoint_interval: usize,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            log_path: None,
            sync_mode: SyncMode::EveryWrite,
            checkpoint_interval: 32,
        }
    }
}

impl NodeConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, QueryError> {
        toml::from_str(s).map_err(|e| QueryError::Config(e.to_string()))
    }

    pub fn load(path: &Path) -> Result<Self, QueryError> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| QueryError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&text)
    }

    pub fn wal_config(&self) -> WalConfig {
        WalConfig {
            sync_mode: self.sync_mode,
        }
    }
}
