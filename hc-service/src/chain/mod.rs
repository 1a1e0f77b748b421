//! ChainInstance: in-memory view of one installed chain
//!
//! The directory is the source of truth; a `ChainInstance` is a cache of it
//! populated by `ChainInstance::load`. The node ID is derived from the
//! operating agent's key, so reloading the same tree yields the same identity.

use crate::agent::AgentIdentity;
use crate::config::{apply_overrides, ConfigOverrides, RuntimeConfig};
use crate::dna::Dna;
use crate::encoding::EncodingFormat;
use crate::error::{ServiceError, ServiceResult};
use crate::layout::{
    CHAIN_DATA_DIR, CHAIN_DNA_DIR, CHAIN_TEST_DIR, CHAIN_UI_DIR, CONFIG_FILE_STEM,
    DNA_FILE_STEM, DNA_HASH_FILE_NAME,
};
use libp2p::PeerId;
use log::debug;
use std::path::{Path, PathBuf};

/// One installed chain
#[derive(Debug, Clone)]
pub struct ChainInstance {
    root_path: PathBuf,
    encoding_format: EncodingFormat,
    dna: Dna,
    config: RuntimeConfig,
    agent: AgentIdentity,
    node_id: PeerId,
    node_id_str: String,
    dna_hash: Option<String>,
}

impl ChainInstance {
    pub(crate) fn new(
        root_path: PathBuf,
        encoding_format: EncodingFormat,
        dna: Dna,
        config: RuntimeConfig,
        agent: AgentIdentity,
    ) -> Self {
        let node_id = agent.peer_id();
        let node_id_str = node_id.to_base58();
        Self {
            root_path,
            encoding_format,
            dna,
            config,
            agent,
            node_id,
            node_id_str,
            dna_hash: None,
        }
    }

    /// Read an instance tree.
    ///
    /// The operating agent is the one persisted in the instance root if there
    /// is one, otherwise `default_agent`. Overrides are applied on top of the
    /// stored config file.
    pub fn load(
        root: &Path,
        format: EncodingFormat,
        default_agent: &AgentIdentity,
        overrides: &ConfigOverrides,
    ) -> ServiceResult<Self> {
        let dna = Dna::load(&root.join(CHAIN_DNA_DIR), format)?;
        let mut config = RuntimeConfig::load(root, format)?;
        apply_overrides(&mut config, overrides)?;

        let agent = if AgentIdentity::exists_in(root) {
            debug!("Using instance agent of {}", root.display());
            AgentIdentity::load(root)?
        } else {
            default_agent.clone()
        };

        let mut instance = Self::new(root.to_path_buf(), format, dna, config, agent);
        instance.dna_hash = read_dna_hash(root)?;
        Ok(instance)
    }

    /// Directory name of the instance
    pub fn name(&self) -> String {
        self.root_path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default()
    }

    pub fn root_path(&self) -> &Path {
        &self.root_path
    }

    pub fn encoding_format(&self) -> EncodingFormat {
        self.encoding_format
    }

    pub fn dna(&self) -> &Dna {
        &self.dna
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    pub fn agent(&self) -> &AgentIdentity {
        &self.agent
    }

    pub fn node_id(&self) -> &PeerId {
        &self.node_id
    }

    pub fn node_id_str(&self) -> &str {
        &self.node_id_str
    }

    /// Recorded DNA hash; `None` until the chain has been started
    pub fn dna_hash(&self) -> Option<&str> {
        self.dna_hash.as_deref()
    }

    pub fn is_started(&self) -> bool {
        self.dna_hash.is_some()
    }

    pub fn dna_path(&self) -> PathBuf {
        self.root_path.join(CHAIN_DNA_DIR)
    }

    pub fn ui_path(&self) -> PathBuf {
        self.root_path.join(CHAIN_UI_DIR)
    }

    pub fn test_path(&self) -> PathBuf {
        self.root_path.join(CHAIN_TEST_DIR)
    }

    pub fn db_path(&self) -> PathBuf {
        self.root_path.join(CHAIN_DATA_DIR)
    }

    pub fn config_path(&self) -> PathBuf {
        self.encoding_format.path_in(&self.root_path, CONFIG_FILE_STEM)
    }

    pub fn dna_file_path(&self) -> PathBuf {
        self.encoding_format.path_in(&self.dna_path(), DNA_FILE_STEM)
    }

    /// Hash of the DNA as it currently is on disk
    pub fn compute_dna_hash(&self) -> ServiceResult<String> {
        self.dna.content_hash(&self.dna_path())
    }

    pub(crate) fn record_dna_hash(&mut self, hash: String) -> ServiceResult<()> {
        let path = self.root_path.join(DNA_HASH_FILE_NAME);
        std::fs::write(&path, &hash).map_err(|e| ServiceError::io(&path, e))?;
        self.dna_hash = Some(hash);
        Ok(())
    }
}

/// Format of the DNA descriptor under `root`, or `NoDnaFile`
pub fn detect_format(root: &Path) -> ServiceResult<EncodingFormat> {
    let dna_dir = root.join(CHAIN_DNA_DIR);
    EncodingFormat::detect(&dna_dir, DNA_FILE_STEM).ok_or(ServiceError::NoDnaFile(dna_dir))
}

fn read_dna_hash(root: &Path) -> ServiceResult<Option<String>> {
    let path = root.join(DNA_HASH_FILE_NAME);
    if !path.is_file() {
        return Ok(None);
    }
    let text = std::fs::read_to_string(&path).map_err(|e| ServiceError::io(&path, e))?;
    let hash = text.trim();
    Ok((!hash.is_empty()).then(|| hash.to_string()))
}
