//! hc-service: the instance-management layer for agent-centric chains
//!
//! A `Service` owns one directory of installed chains. It bootstraps the
//! local agent's identity, generates new chains from the built-in sample or
//! from versioned scaffolds, forks and joins DNA lineages by cloning, and
//! resolves each chain's runtime configuration.

pub mod agent;
pub mod chain;
pub mod config;
pub mod dna;
pub mod encoding;
pub mod error;
pub mod layout;
pub mod scaffold;
pub mod service;
pub mod staging;
pub mod storage;

pub use agent::{load_agent, AgentIdentity};
pub use chain::ChainInstance;
pub use config::{make_config, ConfigOverrides, RuntimeConfig, ServiceConfig, DEFAULT_PORT};
pub use dna::{Dna, LineagePolicy, Progenitor};
pub use encoding::EncodingFormat;
pub use error::{ServiceError, ServiceResult};
pub use scaffold::{ScaffoldTemplate, BASIC_TEMPLATE_SCAFFOLD, SCAFFOLD_VERSION};
pub use service::{is_initialized, load_service, ChainDiagnostic, Service};
pub use storage::{ChainStore, DbInitPolicy};
