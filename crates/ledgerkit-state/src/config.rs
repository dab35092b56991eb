//! ledger.toml configuration for the redb backend.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::store::RedbLedger;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Database file. Absent means an in-memory database.
    pub path: Option<PathBuf>,
}

impl StoreConfig {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> anyhow::Result<Self> {
        let config: StoreConfig = toml::from_str(content)?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> anyhow::Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Open the ledger this config describes.
    pub fn open(&self) -> anyhow::Result<RedbLedger> {
        let ledger = match &self.path {
            Some(path) => {
                info!(path = %path.display(), "opening ledger database");
                RedbLedger::open(path)?
            }
            None => RedbLedger::open_in_memory()?,
        };
        Ok(ledger)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledgerkit_core::{LedgerBackend, WriteBatch};

    #[test]
    fn test_parse_path() {
        let config = StoreConfig::from_toml_str(r#"path = "/var/lib/ledgerkit/ledger.redb""#).unwrap();
        assert_eq!(
            config.path.as_deref(),
            Some(Path::new("/var/lib/ledgerkit/ledger.redb"))
        );
    }

    #[test]
    fn test_empty_config_is_in_memory() {
        let config = StoreConfig::from_toml_str("").unwrap();
        assert_eq!(config, StoreConfig::default());

        let ledger = config.open().unwrap();
        ledger
            .apply(WriteBatch::new().put("A1", b"one".to_vec()))
            .unwrap();
        assert!(ledger.get("A1").unwrap().is_some());
    }

    #[test]
    fn test_unknown_field_type_is_rejected() {
        assert!(StoreConfig::from_toml_str("path = 42").is_err());
    }

    #[test]
    fn test_from_file_opens_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let config = StoreConfig {
            path: Some(dir.path().join("ledger.redb")),
        };
        let config_path = dir.path().join("ledger.toml");
        std::fs::write(&config_path, config.to_toml_string().unwrap()).unwrap();

        let loaded = StoreConfig::from_file(&config_path).unwrap();
        assert_eq!(loaded, config);
        loaded.open().unwrap();
        assert!(dir.path().join("ledger.redb").exists());
    }
}
