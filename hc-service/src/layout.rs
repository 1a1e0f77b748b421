//! On-disk layout of a Service root and of each chain instance

/// Directory created under the user's home when no root is given
pub const DEFAULT_DIRECTORY_NAME: &str = ".holochain";

/// Persisted `ServiceConfig` (always TOML)
pub const SYS_FILE_NAME: &str = "system.conf";
/// Agent display identity
pub const AGENT_FILE_NAME: &str = "agent.txt";
/// Protobuf-encoded agent private key
pub const PRIV_KEY_FILE_NAME: &str = "priv.key";

pub const CHAIN_DNA_DIR: &str = "dna";
pub const CHAIN_UI_DIR: &str = "ui";
pub const CHAIN_TEST_DIR: &str = "test";
pub const CHAIN_DATA_DIR: &str = "db";

/// Stem of the DNA descriptor; the extension follows the encoding format
pub const DNA_FILE_STEM: &str = "dna";
/// Stem of the per-instance runtime config
pub const CONFIG_FILE_STEM: &str = "config";
pub const PROPERTIES_SCHEMA_FILE: &str = "properties_schema.json";
pub const STORE_FILE_NAME: &str = "chain.db";
/// Written once the chain has been started
pub const DNA_HASH_FILE_NAME: &str = "dna.hash";
pub const SCENARIO_CONFIG_FILE: &str = "_config.json";
