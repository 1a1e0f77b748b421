//! Configuration: persisted service defaults, per-chain runtime config,
//! and the resolver that layers them with explicit overrides.

mod resolver;
mod runtime;
mod settings;

pub use resolver::{apply_overrides, make_config, ConfigOverrides, ENV_PREFIX};
pub use runtime::{LoggerConfig, Loggers, RuntimeConfig, DEFAULT_PORT};
pub use settings::{ServiceConfig, DEFAULT_BOOTSTRAP_SERVER};
