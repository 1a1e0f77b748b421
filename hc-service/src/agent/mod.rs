//! AgentIdentity: the local operator's persisted cryptographic identity
//!
//! An agent is a display identity ("Name <email>") plus an Ed25519 keypair.
//! Both live in the Service root: the identity as plain text, the private
//! key as libp2p protobuf bytes. The node ID of every chain the agent runs
//! is the libp2p `PeerId` of its public key.

use crate::error::{ServiceError, ServiceResult};
use crate::layout::{AGENT_FILE_NAME, PRIV_KEY_FILE_NAME};
use libp2p::identity::{Keypair, PublicKey};
use libp2p::PeerId;
use log::info;
use std::fmt;
use std::path::Path;

/// Display identity + signing keypair of a local agent
#[derive(Clone)]
pub struct AgentIdentity {
    identity: String,
    keypair: Keypair,
}

impl AgentIdentity {
    /// Create an agent with a freshly generated Ed25519 keypair
    pub fn generate(identity: impl Into<String>) -> Self {
        Self {
            identity: identity.into(),
            keypair: Keypair::generate_ed25519(),
        }
    }

    pub fn from_keypair(identity: impl Into<String>, keypair: Keypair) -> Self {
        Self {
            identity: identity.into(),
            keypair,
        }
    }

    pub fn identity(&self) -> &str {
        &self.identity
    }

    pub fn keypair(&self) -> &Keypair {
        &self.keypair
    }

    pub fn public_key(&self) -> PublicKey {
        self.keypair.public()
    }

    /// Public key in its protobuf encoding, as recorded in a DNA progenitor
    pub fn public_key_bytes(&self) -> Vec<u8> {
        self.keypair.public().encode_protobuf()
    }

    pub fn peer_id(&self) -> PeerId {
        self.keypair.public().to_peer_id()
    }

    /// True when both agents hold the same keypair
    pub fn same_keys(&self, other: &AgentIdentity) -> bool {
        match (
            self.keypair.to_protobuf_encoding(),
            other.keypair.to_protobuf_encoding(),
        ) {
            (Ok(a), Ok(b)) => a == b,
            _ => false,
        }
    }

    /// Whether `dir` holds agent files
    pub fn exists_in(dir: &Path) -> bool {
        dir.join(AGENT_FILE_NAME).is_file() && dir.join(PRIV_KEY_FILE_NAME).is_file()
    }

    /// Persist identity and private key into `dir`
    pub fn save(&self, dir: &Path) -> ServiceResult<()> {
        std::fs::create_dir_all(dir).map_err(|e| ServiceError::io(dir, e))?;

        let identity_path = dir.join(AGENT_FILE_NAME);
        std::fs::write(&identity_path, self.identity.as_bytes())
            .map_err(|e| ServiceError::io(&identity_path, e))?;

        let key = self
            .keypair
            .to_protobuf_encoding()
            .map_err(|e| ServiceError::Encode(format!("agent key: {}", e)))?;
        write_private(&dir.join(PRIV_KEY_FILE_NAME), &key)?;

        info!("Saved agent '{}' to {}", self.identity, dir.display());
        Ok(())
    }

    /// Load the agent persisted in `dir`
    pub fn load(dir: &Path) -> ServiceResult<Self> {
        let failure = |reason: String| ServiceError::AgentLoadFailure {
            path: dir.to_path_buf(),
            reason,
        };

        let identity = std::fs::read_to_string(dir.join(AGENT_FILE_NAME))
            .map_err(|e| failure(format!("{}: {}", AGENT_FILE_NAME, e)))?;
        let key = std::fs::read(dir.join(PRIV_KEY_FILE_NAME))
            .map_err(|e| failure(format!("{}: {}", PRIV_KEY_FILE_NAME, e)))?;
        let keypair = Keypair::from_protobuf_encoding(&key)
            .map_err(|e| failure(format!("{}: {}", PRIV_KEY_FILE_NAME, e)))?;

        Ok(Self { identity, keypair })
    }
}

impl fmt::Debug for AgentIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AgentIdentity")
            .field("identity", &self.identity)
            .field("peer_id", &self.peer_id())
            .finish()
    }
}

/// Load the default agent of the Service rooted at `root`
pub fn load_agent(root: &Path) -> ServiceResult<AgentIdentity> {
    AgentIdentity::load(root)
}

#[cfg(unix)]
fn write_private(path: &Path, bytes: &[u8]) -> ServiceResult<()> {
    use std::io::Write;
    use std::os::unix::fs::OpenOptionsExt;

    let mut file = std::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)
        .map_err(|e| ServiceError::io(path, e))?;
    file.write_all(bytes).map_err(|e| ServiceError::io(path, e))
}

#[cfg(not(unix))]
fn write_private(path: &Path, bytes: &[u8]) -> ServiceResult<()> {
    std::fs::write(path, bytes).map_err(|e| ServiceError::io(path, e))
}
