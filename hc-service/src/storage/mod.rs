//! Local chain store footprint
//!
//! The content-addressable store itself belongs to the execution engine;
//! this layer only creates its file, stamps it with the DNA it serves, and
//! records the genesis of a started chain.

use crate::agent::AgentIdentity;
use crate::error::{ServiceError, ServiceResult};
use crate::layout::STORE_FILE_NAME;
use chrono::{DateTime, Utc};
use log::info;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Whether generation and cloning create the store for the new instance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DbInitPolicy {
    InitializeDb,
    SkipInitializeDb,
}

impl DbInitPolicy {
    pub fn should_initialize(&self) -> bool {
        matches!(self, DbInitPolicy::InitializeDb)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreMetadata {
    pub dna_uuid: String,
    pub created_at: DateTime<Utc>,
}

/// First record of a started chain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenesisRecord {
    pub dna_hash: String,
    pub agent: String,
    pub agent_pub_key: String,
    pub started_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
struct StoreFile {
    metadata: StoreMetadata,
    #[serde(default)]
    genesis: Option<GenesisRecord>,
}

/// Handle on `db/chain.db`
#[derive(Debug)]
pub struct ChainStore {
    path: PathBuf,
    file: StoreFile,
}

impl ChainStore {
    /// Create the store in `db_dir` for a chain of lineage `dna_uuid`
    pub fn initialize(db_dir: &Path, dna_uuid: &str) -> ServiceResult<Self> {
        std::fs::create_dir_all(db_dir).map_err(|e| ServiceError::io(db_dir, e))?;
        let store = Self {
            path: db_dir.join(STORE_FILE_NAME),
            file: StoreFile {
                metadata: StoreMetadata {
                    dna_uuid: dna_uuid.to_string(),
                    created_at: Utc::now(),
                },
                genesis: None,
            },
        };
        store.save()?;
        info!("Initialized chain store at {}", store.path.display());
        Ok(store)
    }

    pub fn open(db_dir: &Path) -> ServiceResult<Self> {
        let path = db_dir.join(STORE_FILE_NAME);
        let text = std::fs::read_to_string(&path).map_err(|e| ServiceError::io(&path, e))?;
        let file = serde_json::from_str(&text).map_err(|e| ServiceError::decode(&path, e))?;
        Ok(Self { path, file })
    }

    pub fn open_or_initialize(db_dir: &Path, dna_uuid: &str) -> ServiceResult<Self> {
        if Self::exists_in(db_dir) {
            Self::open(db_dir)
        } else {
            Self::initialize(db_dir, dna_uuid)
        }
    }

    pub fn exists_in(db_dir: &Path) -> bool {
        db_dir.join(STORE_FILE_NAME).is_file()
    }

    pub fn save(&self) -> ServiceResult<()> {
        let json = serde_json::to_string_pretty(&self.file).map_err(|e| ServiceError::Encode(e.to_string()))?;
        std::fs::write(&self.path, json).map_err(|e| ServiceError::io(&self.path, e))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn metadata(&self) -> &StoreMetadata {
        &self.file.metadata
    }

    pub fn genesis(&self) -> Option<&GenesisRecord> {
        self.file.genesis.as_ref()
    }

    /// Record genesis once; later calls return the first record
    pub fn record_genesis(&mut self, dna_hash: &str, agent: &AgentIdentity) -> ServiceResult<GenesisRecord> {
        if let Some(genesis) = &self.file.genesis {
            return Ok(genesis.clone());
        }
        let genesis = GenesisRecord {
            dna_hash: dna_hash.to_string(),
            agent: agent.identity().to_string(),
            agent_pub_key: hex::encode(agent.public_key_bytes()),
            started_at: Utc::now(),
        };
        self.file.genesis = Some(genesis.clone());
        self.save()?;
        Ok(genesis)
    }
}
