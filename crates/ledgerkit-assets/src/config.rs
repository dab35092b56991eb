//! Registry configuration, typically the `[registry]` part of ledger.toml.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::registry::OwnerChangePolicy;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryConfig {
    #[serde(default)]
    pub owner_change: OwnerChangePolicy,
}

impl RegistryConfig {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> anyhow::Result<Self> {
        let config: RegistryConfig = toml::from_str(content)?;
        Ok(config)
    }
}
