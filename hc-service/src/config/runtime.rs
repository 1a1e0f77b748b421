//! RuntimeConfig: what a running chain needs from its config file

use super::settings::ServiceConfig;
use crate::encoding::EncodingFormat;
use crate::error::ServiceResult;
use crate::layout::CONFIG_FILE_STEM;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_PORT: u16 = 6283;

/// One log channel of a running chain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggerConfig {
    pub enabled: bool,
    pub format: String,
    #[serde(default)]
    pub prefix: String,
}

impl LoggerConfig {
    fn enabled(format: &str) -> Self {
        Self {
            enabled: true,
            format: format.to_string(),
            prefix: String::new(),
        }
    }

    fn disabled(format: &str) -> Self {
        Self {
            enabled: false,
            ..Self::enabled(format)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Loggers {
    pub app: LoggerConfig,
    pub dht: LoggerConfig,
    pub gossip: LoggerConfig,
    pub test_passed: LoggerConfig,
    pub test_failed: LoggerConfig,
    pub test_info: LoggerConfig,
}

impl Default for Loggers {
    fn default() -> Self {
        Self {
            app: LoggerConfig::enabled("%{color:cyan}%{message}"),
            dht: LoggerConfig::disabled("%{color:yellow}%{time} DHT: %{message}"),
            gossip: LoggerConfig::disabled("%{color:blue}%{time} Gossip: %{message}"),
            test_passed: LoggerConfig::enabled("%{color:green}%{message}"),
            test_failed: LoggerConfig::enabled("%{color:red}%{message}"),
            test_info: LoggerConfig::enabled("%{message}"),
        }
    }
}

impl Loggers {
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut LoggerConfig> {
        [
            &mut self.app,
            &mut self.dht,
            &mut self.gossip,
            &mut self.test_passed,
            &mut self.test_failed,
            &mut self.test_info,
        ]
        .into_iter()
    }

    pub fn set_prefix(&mut self, prefix: &str) {
        for logger in self.iter_mut() {
            logger.prefix = prefix.to_string();
        }
    }
}

/// Runtime settings of one chain instance, stored as `config.<ext>`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeConfig {
    pub port: u16,
    pub peer_mode_author: bool,
    pub peer_mode_dht_node: bool,
    pub bootstrap_server: String,
    pub enable_mdns: bool,
    pub loggers: Loggers,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            peer_mode_author: true,
            peer_mode_dht_node: true,
            bootstrap_server: String::new(),
            enable_mdns: false,
            loggers: Loggers::default(),
        }
    }
}

impl RuntimeConfig {
    /// Hard defaults with the service's persisted settings layered on top
    pub fn from_settings(settings: &ServiceConfig) -> Self {
        Self {
            peer_mode_author: settings.default_peer_mode_author,
            peer_mode_dht_node: settings.default_peer_mode_dht_node,
            bootstrap_server: settings.default_bootstrap_server.clone(),
            enable_mdns: settings.default_enable_mdns,
            ..Self::default()
        }
    }

    pub fn load(root: &Path, format: EncodingFormat) -> ServiceResult<Self> {
        format.read(root, CONFIG_FILE_STEM)
    }

    pub fn save(&self, root: &Path, format: EncodingFormat) -> ServiceResult<()> {
        format.write(root, CONFIG_FILE_STEM, self).map(|_| ())
    }
}
