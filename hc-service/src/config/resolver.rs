//! ConfigResolver: hard defaults, then persisted settings, then overrides
//!
//! Overrides are an explicit value rather than ambient process state, so
//! resolution is a pure function of its inputs. Only the CLI reads the
//! process environment, through `ConfigOverrides::from_env`.

use super::runtime::RuntimeConfig;
use super::settings::ServiceConfig;
use crate::error::{ServiceError, ServiceResult};
use log::debug;
use std::collections::BTreeMap;

/// Prefix of the environment variables recognized as overrides
pub const ENV_PREFIX: &str = "HOLOCHAINCONFIG_";

const PORT: &str = "PORT";
const ENABLE_MDNS: &str = "ENABLEMDNS";
const LOG_PREFIX: &str = "LOGPREFIX";
const BOOTSTRAP: &str = "BOOTSTRAP";

/// Bootstrap value meaning "no bootstrap server"
const BOOTSTRAP_DISABLED: &str = "_";

/// Override values keyed by their unprefixed, upper-case name
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigOverrides {
    values: BTreeMap<String, String>,
}

impl ConfigOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    /// Collect `HOLOCHAINCONFIG_*` variables from the process environment
    pub fn from_env() -> Self {
        Self::from_vars(std::env::vars())
    }

    /// Collect overrides from `(name, value)` pairs, keeping only prefixed names.
    ///
    /// An empty value counts as unset.
    pub fn from_vars(vars: impl IntoIterator<Item = (String, String)>) -> Self {
        let values = vars
            .into_iter()
            .filter(|(_, value)| !value.is_empty())
            .filter_map(|(name, value)| {
                name.strip_prefix(ENV_PREFIX)
                    .map(|key| (key.to_ascii_uppercase(), value))
            })
            .collect();
        Self { values }
    }

    /// Builder-style insert; `key` is given without the prefix
    pub fn with(mut self, key: &str, value: impl Into<String>) -> Self {
        self.values.insert(key.to_ascii_uppercase(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Resolve a fresh runtime config for a chain of this service
pub fn make_config(settings: &ServiceConfig, overrides: &ConfigOverrides) -> ServiceResult<RuntimeConfig> {
    let mut config = RuntimeConfig::from_settings(settings);
    apply_overrides(&mut config, overrides)?;
    Ok(config)
}

/// Apply recognized overrides on top of `config`.
///
/// Only a non-numeric `PORT` can fail; every other key is pass-through.
/// Empty values are skipped.
pub fn apply_overrides(config: &mut RuntimeConfig, overrides: &ConfigOverrides) -> ServiceResult<()> {
    for (key, value) in overrides.values.iter().filter(|(_, v)| !v.is_empty()) {
        match key.as_str() {
            PORT => {
                config.port = value.trim().parse().map_err(|e: std::num::ParseIntError| {
                    ServiceError::EnvOverrideParse {
                        key: format!("{}{}", ENV_PREFIX, PORT),
                        value: value.clone(),
                        reason: e.to_string(),
                    }
                })?;
            }
            ENABLE_MDNS => config.enable_mdns = value == "true",
            LOG_PREFIX => config.loggers.set_prefix(value),
            BOOTSTRAP => {
                config.bootstrap_server = if value == BOOTSTRAP_DISABLED {
                    String::new()
                } else {
                    value.clone()
                };
            }
            other => debug!("Ignoring unrecognized override {}{}", ENV_PREFIX, other),
        }
    }
    Ok(())
}
