//! DNA descriptor types and their on-disk form
//!
//! The descriptor is `dna/dna.<ext>`; zome code and entry schemas are
//! separate files it refers to by name, relative to the zome directory.

use crate::agent::AgentIdentity;
use crate::encoding::EncodingFormat;
use crate::error::{ServiceError, ServiceResult};
use crate::layout::DNA_FILE_STEM;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::path::Path;
use uuid::Uuid;

/// Who originated a DNA lineage
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progenitor {
    pub identity: String,
    /// Protobuf-encoded public key, hex on disk
    #[serde(with = "hex_bytes", default)]
    pub pub_key: Vec<u8>,
}

impl From<&AgentIdentity> for Progenitor {
    fn from(agent: &AgentIdentity) -> Self {
        Self {
            identity: agent.identity().to_string(),
            pub_key: agent.public_key_bytes(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DhtConfig {
    pub hash_type: String,
}

impl Default for DhtConfig {
    fn default() -> Self {
        Self {
            hash_type: "sha2-256".to_string(),
        }
    }
}

/// An entry type a zome may commit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryDef {
    pub name: String,
    pub data_format: String,
    #[serde(default = "default_sharing")]
    pub sharing: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema_file: Option<String>,
}

fn default_sharing() -> String {
    "public".to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionDef {
    pub name: String,
    pub calling_type: String,
    #[serde(default)]
    pub exposure: String,
}

/// A code/schema unit of a DNA
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Zome {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub ribosome_type: String,
    pub code_file: String,
    #[serde(default)]
    pub entries: Vec<EntryDef>,
    #[serde(default)]
    pub functions: Vec<FunctionDef>,
}

/// The DNA descriptor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dna {
    pub version: u32,
    pub uuid: String,
    pub name: String,
    #[serde(default)]
    pub requires_version: u32,
    /// Content hash of the DNA this one was forked from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub based_on: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties_schema_file: Option<String>,
    #[serde(default)]
    pub properties: BTreeMap<String, String>,
    #[serde(default)]
    pub dht_config: DhtConfig,
    #[serde(default)]
    pub progenitor: Progenitor,
    #[serde(default)]
    pub zomes: Vec<Zome>,
}

impl Dna {
    /// An empty DNA starting a new lineage
    pub fn new(name: impl Into<String>, progenitor: Progenitor) -> Self {
        Self {
            version: 1,
            uuid: Uuid::new_v4().to_string(),
            name: name.into(),
            requires_version: 1,
            based_on: None,
            properties_schema_file: None,
            properties: BTreeMap::new(),
            dht_config: DhtConfig::default(),
            progenitor,
            zomes: Vec::new(),
        }
    }

    /// Replace the lineage identifier with a fresh one
    pub fn new_uuid(&mut self) {
        self.uuid = Uuid::new_v4().to_string();
    }

    pub fn zome(&self, name: &str) -> Option<&Zome> {
        self.zomes.iter().find(|z| z.name == name)
    }

    /// Read `<dna_dir>/dna.<ext>`
    pub fn load(dna_dir: &Path, format: EncodingFormat) -> ServiceResult<Self> {
        format.read(dna_dir, DNA_FILE_STEM)
    }

    /// Write `<dna_dir>/dna.<ext>`
    pub fn save(&self, dna_dir: &Path, format: EncodingFormat) -> ServiceResult<()> {
        format.write(dna_dir, DNA_FILE_STEM, self).map(|_| ())
    }

    /// Hex SHA-256 over the descriptor and every file it references.
    ///
    /// The descriptor is hashed in its JSON form so the result does not depend
    /// on the chain's encoding format.
    pub fn content_hash(&self, dna_dir: &Path) -> ServiceResult<String> {
        let mut hasher = Sha256::new();
        let canonical = serde_json::to_vec(self).map_err(|e| ServiceError::Encode(e.to_string()))?;
        hasher.update(&canonical);

        let mut feed = |path: &Path| -> ServiceResult<()> {
            let bytes = std::fs::read(path).map_err(|e| ServiceError::io(path, e))?;
            hasher.update((bytes.len() as u64).to_le_bytes());
            hasher.update(&bytes);
            Ok(())
        };

        if let Some(schema) = &self.properties_schema_file {
            feed(&dna_dir.join(schema))?;
        }
        for zome in &self.zomes {
            let zome_dir = dna_dir.join(&zome.name);
            feed(&zome_dir.join(&zome.code_file))?;
            for entry in &zome.entries {
                if let Some(schema) = &entry.schema_file {
                    feed(&zome_dir.join(schema))?;
                }
            }
        }

        Ok(hex::encode(hasher.finalize()))
    }
}

mod hex_bytes {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let text = String::deserialize(deserializer)?;
        hex::decode(text).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn test_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("hc-dna-test-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn sample_dna() -> Dna {
        let mut dna = Dna::new(
            "test",
            Progenitor {
                identity: "Progenitor Agent <progenitore@example.com>".into(),
                pub_key: vec![8, 1, 18, 32, 193, 43, 31, 148],
            },
        );
        dna.properties.insert("description".into(), "a test chain".into());
        dna.zomes.push(Zome {
            name: "z".into(),
            description: String::new(),
            ribosome_type: "zygo".into(),
            code_file: "z.zy".into(),
            entries: vec![EntryDef {
                name: "profile".into(),
                data_format: "json".into(),
                sharing: "public".into(),
                schema_file: Some("profile.json".into()),
            }],
            functions: vec![FunctionDef {
                name: "get".into(),
                calling_type: "string".into(),
                exposure: "public".into(),
            }],
        });
        dna
    }

    fn write_zome_files(dna_dir: &Path) {
        std::fs::create_dir_all(dna_dir.join("z")).unwrap();
        std::fs::write(dna_dir.join("z").join("z.zy"), "(defn get [x] x)").unwrap();
        std::fs::write(dna_dir.join("z").join("profile.json"), "{}").unwrap();
    }

    #[test]
    fn test_new_uuid_changes_lineage() {
        let mut dna = sample_dna();
        let before = dna.uuid.clone();
        dna.new_uuid();
        assert_ne!(dna.uuid, before);
    }

    #[test]
    fn test_save_load_both_formats() {
        let dir = test_dir();
        let dna = sample_dna();
        for format in EncodingFormat::ALL {
            dna.save(&dir, format).unwrap();
            assert_eq!(Dna::load(&dir, format).unwrap(), dna);
        }
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_progenitor_key_is_hex_on_disk() {
        let dir = test_dir();
        sample_dna().save(&dir, EncodingFormat::Json).unwrap();
        let text = std::fs::read_to_string(dir.join("dna.json")).unwrap();
        assert!(text.contains("\"08011220c12b1f94\""));
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_content_hash_tracks_code() {
        let dir = test_dir();
        write_zome_files(&dir);
        let dna = sample_dna();

        let h1 = dna.content_hash(&dir).unwrap();
        assert_eq!(h1, dna.content_hash(&dir).unwrap());
        assert_eq!(h1.len(), 64);

        std::fs::write(dir.join("z").join("z.zy"), "(defn get [x] nil)").unwrap();
        assert_ne!(h1, dna.content_hash(&dir).unwrap());

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_content_hash_missing_file() {
        let dir = test_dir();
        let err = sample_dna().content_hash(&dir).unwrap_err();
        assert!(matches!(err, ServiceError::Io { .. }));
        let _ = std::fs::remove_dir_all(&dir);
    }
}
