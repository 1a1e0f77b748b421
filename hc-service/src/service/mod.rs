//! Service: owner of one directory of installed chains
//!
//! The Service root holds the persisted `ServiceConfig` (`system.conf`) and
//! the default agent (`agent.txt`, `priv.key`). Each immediate subdirectory
//! is one chain instance, named after the directory.
//!
//! Operations are split by concern:
//! - bootstrap and loading live here
//! - enumeration in [`enumerate`]
//! - generation from the sample or a scaffold in [`generate`]
//! - fork/join cloning in [`clone`]

pub mod clone;
pub mod enumerate;
pub mod generate;

pub use enumerate::ChainDiagnostic;

use crate::agent::AgentIdentity;
use crate::chain::{detect_format, ChainInstance};
use crate::config::{make_config, ConfigOverrides, RuntimeConfig, ServiceConfig};
use crate::encoding::EncodingFormat;
use crate::error::{ServiceError, ServiceResult};
use crate::layout::{AGENT_FILE_NAME, SYS_FILE_NAME};
use log::{debug, info};
use std::path::{Path, PathBuf};

/// True when `root` holds the Service marker structure.
///
/// Existence only; nothing is parsed.
pub fn is_initialized(root: &Path) -> bool {
    root.is_dir() && root.join(SYS_FILE_NAME).is_file() && root.join(AGENT_FILE_NAME).is_file()
}

/// Load the Service rooted at `root`
pub fn load_service(root: &Path) -> ServiceResult<Service> {
    Service::load(root)
}

/// A Service root and the defaults it hands to its chains
#[derive(Debug, Clone)]
pub struct Service {
    pub root_path: PathBuf,
    pub settings: ServiceConfig,
    pub default_agent: AgentIdentity,
    /// Applied to every runtime config this Service resolves
    pub overrides: ConfigOverrides,
}

impl Service {
    /// Create the Service structure at `root` for the agent `identity`.
    ///
    /// Key material already present at `root` is kept; otherwise a fresh
    /// keypair is generated.
    pub fn init(root: &Path, identity: &str) -> ServiceResult<Self> {
        if is_initialized(root) {
            return Err(ServiceError::AlreadyInitialized(root.to_path_buf()));
        }
        std::fs::create_dir_all(root).map_err(|e| ServiceError::io(root, e))?;

        let default_agent = if AgentIdentity::exists_in(root) {
            let existing = AgentIdentity::load(root)?;
            debug!("Reusing key material in {}", root.display());
            AgentIdentity::from_keypair(identity, existing.keypair().clone())
        } else {
            AgentIdentity::generate(identity)
        };
        default_agent.save(root)?;

        let settings = ServiceConfig::initial();
        settings.save(root)?;

        info!(
            "Initialized service at {} for {} ({})",
            root.display(),
            identity,
            default_agent.peer_id()
        );
        Ok(Self {
            root_path: root.to_path_buf(),
            settings,
            default_agent,
            overrides: ConfigOverrides::new(),
        })
    }

    /// Read `system.conf` and the default agent from `root`
    pub fn load(root: &Path) -> ServiceResult<Self> {
        if !is_initialized(root) {
            return Err(ServiceError::NotInitialized(root.to_path_buf()));
        }
        let settings = ServiceConfig::load(root)?;
        let default_agent = AgentIdentity::load(root)?;
        debug!("Loaded service at {} for {}", root.display(), default_agent.identity());
        Ok(Self {
            root_path: root.to_path_buf(),
            settings,
            default_agent,
            overrides: ConfigOverrides::new(),
        })
    }

    pub fn with_overrides(mut self, overrides: ConfigOverrides) -> Self {
        self.overrides = overrides;
        self
    }

    /// Runtime config for a new instance of this Service
    pub fn make_config(&self) -> ServiceResult<RuntimeConfig> {
        make_config(&self.settings, &self.overrides)
    }

    /// Directory of the instance `name`
    pub fn instance_root(&self, name: &str) -> PathBuf {
        self.root_path.join(name)
    }

    /// Load the instance `name` in whatever format it was written
    pub fn load_chain(&self, name: &str) -> ServiceResult<ChainInstance> {
        let root = self.instance_root(name);
        let format = detect_format(&root)?;
        self.load_chain_at(&root, format)
    }

    /// Load the instance `name` assuming `format`
    pub fn load_chain_with_format(&self, name: &str, format: EncodingFormat) -> ServiceResult<ChainInstance> {
        self.load_chain_at(&self.instance_root(name), format)
    }

    pub(crate) fn load_chain_at(&self, root: &Path, format: EncodingFormat) -> ServiceResult<ChainInstance> {
        ChainInstance::load(root, format, &self.default_agent, &self.overrides)
    }
}
