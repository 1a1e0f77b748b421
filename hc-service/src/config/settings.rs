//! ServiceConfig: defaults every new chain inherits

use crate::error::{ServiceError, ServiceResult};
use crate::layout::SYS_FILE_NAME;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_BOOTSTRAP_SERVER: &str = "bootstrap.holochain.net:10000";

/// Settings persisted in `system.conf` at the Service root
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceConfig {
    #[serde(default)]
    pub default_peer_mode_dht_node: bool,
    #[serde(default)]
    pub default_peer_mode_author: bool,
    #[serde(default)]
    pub default_bootstrap_server: String,
    #[serde(default)]
    pub default_enable_mdns: bool,
}

impl ServiceConfig {
    /// Values written by `Service::init`
    pub fn initial() -> Self {
        Self {
            default_peer_mode_dht_node: true,
            default_peer_mode_author: true,
            default_bootstrap_server: DEFAULT_BOOTSTRAP_SERVER.to_string(),
            default_enable_mdns: false,
        }
    }

    /// At least one peer mode must be on
    pub fn validate(&self) -> ServiceResult<()> {
        if !self.default_peer_mode_author && !self.default_peer_mode_dht_node {
            return Err(ServiceError::ConfigInvalid {
                file: SYS_FILE_NAME.to_string(),
                message: "At least one peer mode must be set to true.".to_string(),
            });
        }
        Ok(())
    }

    pub fn save(&self, root: &Path) -> ServiceResult<()> {
        let path = root.join(SYS_FILE_NAME);
        let text = toml::to_string_pretty(self).map_err(|e| ServiceError::Encode(e.to_string()))?;
        std::fs::write(&path, text).map_err(|e| ServiceError::io(&path, e))
    }

    /// Read and validate `system.conf`
    pub fn load(root: &Path) -> ServiceResult<Self> {
        let path = root.join(SYS_FILE_NAME);
        let text = std::fs::read_to_string(&path).map_err(|e| ServiceError::io(&path, e))?;
        let config: ServiceConfig = toml::from_str(&text).map_err(|e| ServiceError::decode(&path, e))?;
        config.validate()?;
        Ok(config)
    }
}
