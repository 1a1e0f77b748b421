//! ScaffoldTemplate: versioned bundle from which new chains are generated
//!
//! A scaffold carries a DNA skeleton with its zome code and entry schemas
//! inline, plus UI files, test sets, and multi-role test scenarios. It is
//! always exchanged as JSON. Only templates whose `scaffold_version` equals
//! [`SCAFFOLD_VERSION`] are accepted.

use crate::dna::{DhtConfig, Dna, EntryDef, FunctionDef, Progenitor, Zome};
use crate::error::{ServiceError, ServiceResult};
use crate::layout::{CHAIN_DNA_DIR, CHAIN_TEST_DIR, CHAIN_UI_DIR, PROPERTIES_SCHEMA_FILE, SCENARIO_CONFIG_FILE};
use crate::staging::write_file;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::Read;
use std::path::{Component, Path};

/// The only scaffold version this crate reads
pub const SCAFFOLD_VERSION: &str = "0.0.4";

/// Built-in scaffold used when none is supplied
pub const BASIC_TEMPLATE_SCAFFOLD: &str = include_str!("../../templates/basic_scaffold.json");

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScaffoldTemplate {
    pub scaffold_version: String,
    #[serde(default)]
    pub generator: String,
    pub dna: ScaffoldDna,
    #[serde(default)]
    pub test_sets: Vec<TestSet>,
    #[serde(default)]
    pub ui: Vec<UiFile>,
    #[serde(default)]
    pub scenarios: Vec<Scenario>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScaffoldDna {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub properties: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties_schema: Option<serde_json::Value>,
    #[serde(default)]
    pub dht_config: DhtConfig,
    #[serde(default)]
    pub zomes: Vec<ScaffoldZome>,
}

fn default_version() -> u32 {
    1
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScaffoldZome {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub ribosome_type: String,
    pub code_file: String,
    /// Source of `code_file`
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub entries: Vec<ScaffoldEntry>,
    #[serde(default)]
    pub functions: Vec<FunctionDef>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScaffoldEntry {
    pub name: String,
    pub data_format: String,
    #[serde(default)]
    pub sharing: Option<String>,
    /// Written to `<entry name>.json` next to the zome code
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<serde_json::Value>,
}

/// Tests written to `test/<name>.json`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestSet {
    pub name: String,
    pub tests: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UiFile {
    pub file_name: String,
    pub contents: String,
}

/// A multi-node test: one directory, one file per role
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub name: String,
    pub roles: Vec<Role>,
    #[serde(default)]
    pub config: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Role {
    pub name: String,
    #[serde(default)]
    pub test_set: serde_json::Value,
}

impl ScaffoldTemplate {
    /// Decode a JSON scaffold; the version is not checked here
    pub fn from_reader(reader: impl Read) -> ServiceResult<Self> {
        serde_json::from_reader(reader).map_err(|e| ServiceError::decode("<scaffold>", e))
    }

    pub fn basic() -> ServiceResult<Self> {
        Self::from_reader(BASIC_TEMPLATE_SCAFFOLD.as_bytes())
    }

    /// Version gate plus file-name checks; nothing is written by either
    pub fn validate(&self) -> ServiceResult<()> {
        self.check_version()?;
        self.check_names()
    }

    pub fn check_version(&self) -> ServiceResult<()> {
        if self.scaffold_version != SCAFFOLD_VERSION {
            return Err(ServiceError::ScaffoldVersionMismatch {
                expected: SCAFFOLD_VERSION.to_string(),
                found: self.scaffold_version.clone(),
            });
        }
        Ok(())
    }

    /// Every name that becomes a path must stay below the instance root
    pub fn check_names(&self) -> ServiceResult<()> {
        for zome in &self.dna.zomes {
            check_name("zome name", &zome.name)?;
            check_name("code file", &zome.code_file)?;
            for entry in &zome.entries {
                check_name("entry name", &entry.name)?;
            }
        }
        for set in &self.test_sets {
            check_name("test set name", &set.name)?;
        }
        for file in &self.ui {
            check_name("ui file name", &file.file_name)?;
        }
        for scenario in &self.scenarios {
            check_name("scenario name", &scenario.name)?;
            for role in &scenario.roles {
                check_name("role name", &role.name)?;
            }
        }
        Ok(())
    }

    /// The DNA descriptor this scaffold describes
    pub fn to_dna(&self, progenitor: Progenitor) -> Dna {
        let mut dna = Dna::new(self.dna.name.clone(), progenitor);
        dna.version = self.dna.version;
        dna.properties = self.dna.properties.clone();
        dna.dht_config = self.dna.dht_config.clone();
        if self.dna.properties_schema.is_some() {
            dna.properties_schema_file = Some(PROPERTIES_SCHEMA_FILE.to_string());
        }
        dna.zomes = self
            .dna
            .zomes
            .iter()
            .map(|zome| Zome {
                name: zome.name.clone(),
                description: zome.description.clone(),
                ribosome_type: zome.ribosome_type.clone(),
                code_file: zome.code_file.clone(),
                entries: zome
                    .entries
                    .iter()
                    .map(|entry| EntryDef {
                        name: entry.name.clone(),
                        data_format: entry.data_format.clone(),
                        sharing: entry.sharing.clone().unwrap_or_else(|| "public".to_string()),
                        schema_file: entry.schema.as_ref().map(|_| format!("{}.json", entry.name)),
                    })
                    .collect(),
                functions: zome.functions.clone(),
            })
            .collect();
        dna
    }

    /// Write every auxiliary file under `root`.
    ///
    /// The DNA descriptor itself is left to the caller. Everything written
    /// here is JSON or raw text.
    pub fn write_assets(&self, root: &Path) -> ServiceResult<()> {
        let dna_dir = root.join(CHAIN_DNA_DIR);
        if let Some(schema) = &self.dna.properties_schema {
            write_json(&dna_dir.join(PROPERTIES_SCHEMA_FILE), schema)?;
        }
        for zome in &self.dna.zomes {
            let zome_dir = dna_dir.join(&zome.name);
            write_file(&zome_dir.join(&zome.code_file), &zome.code)?;
            for entry in &zome.entries {
                if let Some(schema) = &entry.schema {
                    write_json(&zome_dir.join(format!("{}.json", entry.name)), schema)?;
                }
            }
        }

        let ui_dir = root.join(CHAIN_UI_DIR);
        std::fs::create_dir_all(&ui_dir).map_err(|e| ServiceError::io(&ui_dir, e))?;
        for file in &self.ui {
            write_file(&ui_dir.join(&file.file_name), &file.contents)?;
        }

        let test_dir = root.join(CHAIN_TEST_DIR);
        std::fs::create_dir_all(&test_dir).map_err(|e| ServiceError::io(&test_dir, e))?;
        for set in &self.test_sets {
            write_json(&test_dir.join(format!("{}.json", set.name)), &set.tests)?;
        }
        for scenario in &self.scenarios {
            let scenario_dir = test_dir.join(&scenario.name);
            for role in &scenario.roles {
                write_json(&scenario_dir.join(format!("{}.json", role.name)), &role.test_set)?;
            }
            write_json(&scenario_dir.join(SCENARIO_CONFIG_FILE), &scenario.config)?;
        }
        Ok(())
    }
}

/// Accept only relative paths made of plain components
fn check_name(field: &str, name: &str) -> ServiceResult<()> {
    let path = Path::new(name);
    let plain = path.components().next().is_some()
        && path.components().all(|c| matches!(c, Component::Normal(_)));
    if !plain {
        return Err(ServiceError::decode(
            "<scaffold>",
            format!("{} {:?} is not a plain relative name", field, name),
        ));
    }
    Ok(())
}

fn write_json(path: &Path, value: &serde_json::Value) -> ServiceResult<()> {
    let text = serde_json::to_string_pretty(value).map_err(|e| ServiceError::Encode(e.to_string()))?;
    write_file(path, text)
}
