//! Fork and join: cloning one instance into a new one

use super::generate::chain_name;
use super::Service;
use crate::agent::AgentIdentity;
use crate::chain::{detect_format, ChainInstance};
use crate::config::{apply_overrides, RuntimeConfig};
use crate::dna::{Dna, LineagePolicy};
use crate::encoding::EncodingFormat;
use crate::error::{ServiceError, ServiceResult};
use crate::layout::{CHAIN_DATA_DIR, CHAIN_DNA_DIR, CHAIN_TEST_DIR, CHAIN_UI_DIR, CONFIG_FILE_STEM, DNA_FILE_STEM};
use crate::staging::{copy_dir, copy_file, StagedTree};
use crate::storage::{ChainStore, DbInitPolicy};
use log::{debug, info};
use std::path::Path;

impl Service {
    /// Copy the instance at `orig` to `root`, operated by `agent`.
    ///
    /// Only `dna/`, `ui/`, `test/` and the config file are copied. The store,
    /// any recorded DNA hash, and instance agent files stay behind. `policy`
    /// decides whether the copy starts a new lineage or joins the source's.
    pub fn clone_chain(
        &self,
        orig: &Path,
        root: &Path,
        agent: &AgentIdentity,
        policy: LineagePolicy,
        db_init: DbInitPolicy,
    ) -> ServiceResult<ChainInstance> {
        let format = detect_format(orig)?;
        let source_dna_dir = orig.join(CHAIN_DNA_DIR);
        let mut dna = Dna::load(&source_dna_dir, format)?;
        let source_hash = match policy {
            LineagePolicy::Fork { .. } => Some(dna.content_hash(&source_dna_dir)?),
            LineagePolicy::Join => None,
        };

        let staged = StagedTree::begin(root)?;
        let work = staged.path();
        let name = chain_name(root)?;

        copy_dna_assets(&source_dna_dir, &work.join(CHAIN_DNA_DIR))?;
        for dir in [CHAIN_UI_DIR, CHAIN_TEST_DIR] {
            let from = orig.join(dir);
            if from.is_dir() {
                copy_dir(&from, &work.join(dir))?;
            }
        }
        let config_file = format.file_name(CONFIG_FILE_STEM);
        copy_file(&orig.join(&config_file), &work.join(&config_file))?;

        policy.apply(&mut dna, &name, source_hash);

        if !self.is_default_agent(agent) {
            agent.save(work)?;
        }
        if db_init.should_initialize() {
            ChainStore::initialize(&work.join(CHAIN_DATA_DIR), &dna.uuid)?;
        }
        dna.save(&work.join(CHAIN_DNA_DIR), format)?;

        let root = staged.publish()?;
        info!(
            "Cloned {} to {} ({}, uuid {})",
            orig.display(),
            root.display(),
            policy.label(),
            dna.uuid
        );

        let mut config = RuntimeConfig::load(&root, format)?;
        apply_overrides(&mut config, &self.overrides)?;
        Ok(ChainInstance::new(root, format, dna, config, agent.clone()))
    }

    fn is_default_agent(&self, agent: &AgentIdentity) -> bool {
        agent.identity() == self.default_agent.identity() && agent.same_keys(&self.default_agent)
    }
}

/// Copy a DNA directory without its descriptor
fn copy_dna_assets(from: &Path, to: &Path) -> ServiceResult<()> {
    let descriptors: Vec<String> = EncodingFormat::ALL
        .iter()
        .map(|format| format.file_name(DNA_FILE_STEM))
        .collect();

    std::fs::create_dir_all(to).map_err(|source| ServiceError::CopyFailure {
        from: from.to_path_buf(),
        to: to.to_path_buf(),
        source,
    })?;
    let entries = std::fs::read_dir(from).map_err(|source| ServiceError::CopyFailure {
        from: from.to_path_buf(),
        to: to.to_path_buf(),
        source,
    })?;
    for entry in entries {
        let entry = entry.map_err(|source| ServiceError::CopyFailure {
            from: from.to_path_buf(),
            to: to.to_path_buf(),
            source,
        })?;
        let src = entry.path();
        let file_name = entry.file_name().to_string_lossy().to_string();
        let file_type = entry.file_type().map_err(|source| ServiceError::CopyFailure {
            from: src.clone(),
            to: to.join(&file_name),
            source,
        })?;
        if file_type.is_dir() {
            copy_dir(&src, &to.join(&file_name))?;
        } else if !file_type.is_file() {
            debug!("Skipping non-regular entry {}", src.display());
        } else if descriptors.contains(&file_name) {
            debug!("Leaving descriptor {} for last", src.display());
        } else {
            copy_file(&src, &to.join(&file_name))?;
        }
    }
    Ok(())
}
