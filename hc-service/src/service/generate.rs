//! Generation of new chains and starting of existing ones

use super::Service;
use crate::chain::ChainInstance;
use crate::config::RuntimeConfig;
use crate::dna::sample::{dev_dna, write_dev_assets};
use crate::dna::Progenitor;
use crate::encoding::EncodingFormat;
use crate::error::{ServiceError, ServiceResult};
use crate::layout::{CHAIN_DATA_DIR, CHAIN_DNA_DIR};
use crate::scaffold::ScaffoldTemplate;
use crate::staging::StagedTree;
use crate::storage::{ChainStore, DbInitPolicy};
use log::info;
use std::io::Read;
use std::path::Path;

impl Service {
    /// Create the built-in development chain at `root`
    pub fn gen_dev(&self, root: &Path, format: EncodingFormat, db_init: DbInitPolicy) -> ServiceResult<ChainInstance> {
        let staged = StagedTree::begin(root)?;
        let work = staged.path();
        let name = chain_name(root)?;

        write_dev_assets(work)?;
        RuntimeConfig::from_settings(&self.settings).save(work, format)?;

        let dna = dev_dna(&name, Progenitor::from(&self.default_agent));
        if db_init.should_initialize() {
            ChainStore::initialize(&work.join(CHAIN_DATA_DIR), &dna.uuid)?;
        }
        dna.save(&work.join(CHAIN_DNA_DIR), format)?;

        let root = staged.publish()?;
        info!("Generated dev chain {} ({}) at {}", name, dna.uuid, root.display());

        let config = self.make_config()?;
        Ok(ChainInstance::new(root, format, dna, config, self.default_agent.clone()))
    }

    /// Start the instance `name`.
    ///
    /// Opens (or creates) its store, records genesis, and stores the DNA hash.
    /// A chain that was already started must still have the DNA it started
    /// with.
    pub fn gen_chain(&self, name: &str) -> ServiceResult<ChainInstance> {
        let mut chain = self.load_chain(name)?;
        let hash = chain.compute_dna_hash()?;
        if let Some(recorded) = chain.dna_hash() {
            if recorded != hash {
                return Err(ServiceError::DnaHashMismatch {
                    recorded: recorded.to_string(),
                    current: hash,
                });
            }
        }

        let mut store = ChainStore::open_or_initialize(&chain.db_path(), &chain.dna().uuid)?;
        let genesis = store.record_genesis(&hash, chain.agent())?;
        if genesis.dna_hash != hash {
            return Err(ServiceError::DnaHashMismatch {
                recorded: genesis.dna_hash,
                current: hash,
            });
        }

        if !chain.is_started() {
            chain.record_dna_hash(hash)?;
        }
        info!(
            "Started chain {} as {} with DNA {}",
            name,
            chain.node_id_str(),
            chain.dna_hash().unwrap_or_default()
        );
        Ok(chain)
    }

    /// Materialize a scaffold as a new chain named `app_name` at `root`.
    ///
    /// The template's version and file names are checked before anything is
    /// written. With `overwrite`, an existing tree at `root` is replaced
    /// whole, including its store and recorded DNA hash.
    pub fn save_scaffold(
        &self,
        reader: impl Read,
        root: &Path,
        app_name: &str,
        format: EncodingFormat,
        overwrite: bool,
    ) -> ServiceResult<ScaffoldTemplate> {
        let mut scaffold = ScaffoldTemplate::from_reader(reader)?;
        scaffold.validate()?;
        scaffold.dna.name = app_name.to_string();

        let staged = if overwrite {
            StagedTree::overwrite(root)?
        } else {
            StagedTree::begin(root)?
        };
        let work = staged.path();

        scaffold.write_assets(work)?;
        RuntimeConfig::from_settings(&self.settings).save(work, format)?;
        let dna = scaffold.to_dna(Progenitor::from(&self.default_agent));
        dna.save(&work.join(CHAIN_DNA_DIR), format)?;

        let root = staged.publish()?;
        info!(
            "Saved scaffold {} ({}) as {} at {}",
            scaffold.generator,
            scaffold.scaffold_version,
            app_name,
            root.display()
        );
        Ok(scaffold)
    }
}

/// Directory name of an instance root
pub(crate) fn chain_name(root: &Path) -> ServiceResult<String> {
    root.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .ok_or_else(|| ServiceError::InvalidPath(root.to_path_buf()))
}

#[cfg(test)]
mod tests {
    use super::super::tests::setup_service;
    use super::*;
    use crate::config::DEFAULT_PORT;
    use crate::scaffold::{BASIC_TEMPLATE_SCAFFOLD, SCAFFOLD_VERSION};

    fn sibling_entries(dir: &Path) -> Vec<String> {
        std::fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect()
    }

    #[test]
    fn test_gen_dev() {
        let (dir, service) = setup_service();
        let root = service.instance_root("test");

        let chain = service.gen_dev(&root, EncodingFormat::Json, DbInitPolicy::InitializeDb).unwrap();
        assert_eq!(chain.root_path(), root.as_path());
        assert_eq!(chain.dna().name, "test");
        assert_eq!(chain.dna().progenitor.identity, "Herbert <h@bert.com>");
        assert_eq!(chain.dna().progenitor.pub_key, service.default_agent.public_key_bytes());
        assert_eq!(service.is_configured("test").unwrap(), EncodingFormat::Json);

        assert!(root.join("dna/dna.json").is_file());
        assert!(root.join("dna/zySampleZome/profile.json").is_file());
        assert!(root.join("dna/zySampleZome/zySampleZome.zy").is_file());
        assert!(root.join("dna/properties_schema.json").is_file());
        assert!(root.join("test/sampleScenario/listener.json").is_file());
        assert!(root.join("test/testSet1.json").is_file());
        assert!(root.join("ui/index.html").is_file());
        assert!(root.join("ui/hc.js").is_file());
        assert!(root.join("config.json").is_file());
        assert!(root.join("db/chain.db").is_file());

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_gen_dev_config_follows_settings() {
        let (dir, service) = setup_service();
        service
            .gen_dev(&service.instance_root("test"), EncodingFormat::Json, DbInitPolicy::SkipInitializeDb)
            .unwrap();

        let chain = service.load_chain("test").unwrap();
        let config = chain.config();
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.peer_mode_dht_node, service.settings.default_peer_mode_dht_node);
        assert_eq!(config.peer_mode_author, service.settings.default_peer_mode_author);
        assert_eq!(config.bootstrap_server, service.settings.default_bootstrap_server);
        assert_eq!(config.enable_mdns, service.settings.default_enable_mdns);
        assert!(!chain.db_path().exists());

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_reload_is_stable() {
        let (dir, service) = setup_service();
        let generated = service
            .gen_dev(&service.instance_root("test"), EncodingFormat::Toml, DbInitPolicy::InitializeDb)
            .unwrap();

        let first = service.load_chain("test").unwrap();
        let second = service.load_chain_with_format("test", EncodingFormat::Toml).unwrap();
        assert_eq!(first.node_id(), second.node_id());
        assert_eq!(first.node_id_str(), second.node_id_str());
        assert_eq!(first.dna_hash(), second.dna_hash());
        assert_eq!(first.config(), second.config());
        assert_eq!(first.dna(), second.dna());
        assert_eq!(first.node_id(), generated.node_id());
        assert_eq!(first.config(), generated.config());

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_gen_dev_existing_root() {
        let (dir, service) = setup_service();
        let root = service.instance_root("test");
        service.gen_dev(&root, EncodingFormat::Json, DbInitPolicy::InitializeDb).unwrap();
        let dna_before = std::fs::read(root.join("dna/dna.json")).unwrap();
        let config_before = std::fs::read(root.join("config.json")).unwrap();

        let err = service
            .gen_dev(&root, EncodingFormat::Json, DbInitPolicy::SkipInitializeDb)
            .unwrap_err();
        assert_eq!(err.to_string(), format!("holochain: {} already exists", root.display()));
        assert_eq!(std::fs::read(root.join("dna/dna.json")).unwrap(), dna_before);
        assert_eq!(std::fs::read(root.join("config.json")).unwrap(), config_before);
        assert!(!root.join("dna/dna.toml").exists());

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_gen_chain() {
        let (dir, service) = setup_service();
        let generated = service
            .gen_dev(&service.instance_root("test"), EncodingFormat::Json, DbInitPolicy::InitializeDb)
            .unwrap();
        assert!(!generated.is_started());

        let started = service.gen_chain("test").unwrap();
        assert!(started.is_started());
        assert_eq!(started.dna().uuid, generated.dna().uuid);
        assert_eq!(started.dna_hash().unwrap(), started.compute_dna_hash().unwrap());

        let store = ChainStore::open(&started.db_path()).unwrap();
        let genesis = store.genesis().unwrap();
        assert_eq!(genesis.dna_hash, started.dna_hash().unwrap());
        assert_eq!(genesis.agent, "Herbert <h@bert.com>");

        let again = service.gen_chain("test").unwrap();
        assert_eq!(again.dna_hash(), started.dna_hash());

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_gen_chain_without_store() {
        let (dir, service) = setup_service();
        service
            .gen_dev(&service.instance_root("test"), EncodingFormat::Toml, DbInitPolicy::SkipInitializeDb)
            .unwrap();

        let started = service.gen_chain("test").unwrap();
        assert!(ChainStore::exists_in(&started.db_path()));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_gen_chain_detects_changed_dna() {
        let (dir, service) = setup_service();
        let root = service.instance_root("test");
        service.gen_dev(&root, EncodingFormat::Json, DbInitPolicy::InitializeDb).unwrap();
        service.gen_chain("test").unwrap();

        std::fs::write(root.join("dna/zySampleZome/zySampleZome.zy"), "(defn changed [] 1)").unwrap();
        let err = service.gen_chain("test").unwrap_err();
        assert!(matches!(err, ServiceError::DnaHashMismatch { .. }));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_gen_chain_unconfigured() {
        let (dir, service) = setup_service();
        let err = service.gen_chain("missing").unwrap_err();
        assert!(matches!(err, ServiceError::NoDnaFile(_)));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_save_scaffold_json() {
        let (dir, service) = setup_service();
        let root = service.instance_root("test");

        let scaffold = service
            .save_scaffold(BASIC_TEMPLATE_SCAFFOLD.as_bytes(), &root, "appName", EncodingFormat::Json, false)
            .unwrap();
        assert_eq!(scaffold.scaffold_version, SCAFFOLD_VERSION);
        assert_eq!(scaffold.dna.name, "appName");

        let scenario = &scaffold.scenarios[0];
        let scenario_dir = root.join("test").join(&scenario.name);
        assert!(scenario_dir.is_dir());
        assert!(scenario_dir.join(format!("{}.json", scenario.roles[0].name)).is_file());
        assert!(scenario_dir.join(format!("{}.json", scenario.roles[1].name)).is_file());
        assert!(scenario_dir.join("_config.json").is_file());

        assert!(root.join("dna/sampleZome/sampleEntry.json").is_file());
        assert!(root.join("dna/sampleZome/sampleZome.js").is_file());
        assert!(root.join("dna/dna.json").is_file());
        assert!(root.join("dna/properties_schema.json").is_file());
        assert!(root.join("test/sample.json").is_file());
        assert!(root.join("ui/index.html").is_file());
        assert!(root.join("ui/hc.js").is_file());
        assert!(root.join("config.json").is_file());

        let chain = service.load_chain("test").unwrap();
        assert_eq!(chain.dna().name, "appName");
        assert_eq!(chain.dna().progenitor.identity, "Herbert <h@bert.com>");

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_save_scaffold_toml() {
        let (dir, service) = setup_service();
        let root = service.instance_root("test2");

        service
            .save_scaffold(BASIC_TEMPLATE_SCAFFOLD.as_bytes(), &root, "appName", EncodingFormat::Toml, false)
            .unwrap();
        assert!(root.join("dna/dna.toml").is_file());
        assert!(!root.join("dna/dna.json").exists());
        assert!(root.join("config.toml").is_file());
        assert!(root.join("dna/sampleZome/sampleEntry.json").is_file());
        assert!(root.join("test/sample.json").is_file());
        assert!(root.join("test/sampleScenario/_config.json").is_file());
        assert_eq!(service.is_configured("test2").unwrap(), EncodingFormat::Toml);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_save_scaffold_version_mismatch() {
        let (dir, service) = setup_service();
        let root = service.instance_root("test");
        let blob = BASIC_TEMPLATE_SCAFFOLD.replace(SCAFFOLD_VERSION, "0.0.1");

        let err = service
            .save_scaffold(blob.as_bytes(), &root, "appName", EncodingFormat::Json, false)
            .unwrap_err();
        assert!(matches!(err, ServiceError::ScaffoldVersionMismatch { .. }));
        assert!(!root.exists());
        assert!(sibling_entries(&service.root_path).iter().all(|n| !n.contains("staging")));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_save_scaffold_existing_root() {
        let (dir, service) = setup_service();
        let root = service.instance_root("test");
        service
            .save_scaffold(BASIC_TEMPLATE_SCAFFOLD.as_bytes(), &root, "appName", EncodingFormat::Json, false)
            .unwrap();

        let err = service
            .save_scaffold(BASIC_TEMPLATE_SCAFFOLD.as_bytes(), &root, "other", EncodingFormat::Json, false)
            .unwrap_err();
        assert!(matches!(err, ServiceError::AlreadyExists(_)));

        service
            .save_scaffold(BASIC_TEMPLATE_SCAFFOLD.as_bytes(), &root, "other", EncodingFormat::Json, true)
            .unwrap();
        assert_eq!(service.load_chain("test").unwrap().dna().name, "other");

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_overwrite_resets_started_chain() {
        let (dir, service) = setup_service();
        let root = service.instance_root("test");
        service
            .save_scaffold(BASIC_TEMPLATE_SCAFFOLD.as_bytes(), &root, "appName", EncodingFormat::Json, false)
            .unwrap();
        let first = service.gen_chain("test").unwrap();
        assert!(first.is_started());

        service
            .save_scaffold(BASIC_TEMPLATE_SCAFFOLD.as_bytes(), &root, "renamed", EncodingFormat::Toml, true)
            .unwrap();
        let replaced = service.load_chain("test").unwrap();
        assert!(!replaced.is_started());
        assert_eq!(replaced.encoding_format(), EncodingFormat::Toml);
        assert!(!root.join("dna.hash").exists());
        assert!(!root.join("db").exists());
        assert!(!root.join("dna/dna.json").exists());
        assert!(!root.join("config.json").exists());
        assert_eq!(service.list_chains().unwrap(), "installed holochains:     test <not-started>\n");

        let started = service.gen_chain("test").unwrap();
        assert!(started.is_started());
        assert_ne!(started.dna_hash(), first.dna_hash());
        assert!(sibling_entries(&service.root_path)
            .iter()
            .all(|n| !n.contains("staging") && !n.contains("replaced")));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_save_scaffold_rejects_escaping_names() {
        let (dir, service) = setup_service();
        let root = service.instance_root("test");
        let mut scaffold = ScaffoldTemplate::basic().unwrap();
        scaffold.scenarios[0].name = "../../escaped".to_string();
        let blob = serde_json::to_string(&scaffold).unwrap();

        let err = service
            .save_scaffold(blob.as_bytes(), &root, "appName", EncodingFormat::Json, false)
            .unwrap_err();
        assert!(matches!(err, ServiceError::Decode { .. }));
        assert!(!root.exists());
        assert!(!service.root_path.join("escaped").exists());
        assert!(!dir.join("escaped").exists());
        assert!(sibling_entries(&service.root_path).iter().all(|n| !n.contains("staging")));

        let _ = std::fs::remove_dir_all(&dir);
    }
}
