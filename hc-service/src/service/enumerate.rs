//! Enumeration of the instances under a Service root

use super::Service;
use crate::chain::{detect_format, ChainInstance};
use crate::encoding::EncodingFormat;
use crate::error::{ServiceError, ServiceResult};
use log::warn;
use std::collections::BTreeMap;

/// An instance that is configured but could not be loaded
#[derive(Debug)]
pub struct ChainDiagnostic {
    pub name: String,
    pub error: ServiceError,
}

impl Service {
    /// Format of the DNA descriptor of instance `name`
    pub fn is_configured(&self, name: &str) -> ServiceResult<EncodingFormat> {
        detect_format(&self.instance_root(name))
    }

    /// Every loadable instance, keyed by directory name
    pub fn configured_chains(&self) -> ServiceResult<BTreeMap<String, ChainInstance>> {
        self.configured_chains_with_diagnostics().map(|(chains, _)| chains)
    }

    /// Like [`Service::configured_chains`], also returning the load failures
    pub fn configured_chains_with_diagnostics(
        &self,
    ) -> ServiceResult<(BTreeMap<String, ChainInstance>, Vec<ChainDiagnostic>)> {
        let mut chains = BTreeMap::new();
        let mut diagnostics = Vec::new();

        let entries = std::fs::read_dir(&self.root_path).map_err(|e| ServiceError::io(&self.root_path, e))?;
        for entry in entries {
            let entry = entry.map_err(|e| ServiceError::io(&self.root_path, e))?;
            let path = entry.path();
            if !path.is_dir() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().to_string();
            if name.starts_with('.') {
                continue;
            }
            let Ok(format) = self.is_configured(&name) else {
                continue;
            };
            match self.load_chain_at(&path, format) {
                Ok(chain) => {
                    chains.insert(name, chain);
                }
                Err(error) => {
                    warn!("Skipping chain {}: {}", name, error);
                    diagnostics.push(ChainDiagnostic { name, error });
                }
            }
        }
        Ok((chains, diagnostics))
    }

    /// Human-readable listing of the installed chains
    pub fn list_chains(&self) -> ServiceResult<String> {
        let chains = self.configured_chains()?;
        if chains.is_empty() {
            return Ok("no installed chains".to_string());
        }
        let mut listing = String::from("installed holochains:");
        for (name, chain) in &chains {
            let hash = chain.dna_hash().unwrap_or("<not-started>");
            listing.push_str(&format!("     {} {}\n", name, hash));
        }
        Ok(listing)
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::setup_service;
    use crate::encoding::EncodingFormat;
    use crate::error::ServiceError;
    use crate::storage::DbInitPolicy;

    #[test]
    fn test_empty_listing() {
        let (dir, service) = setup_service();
        assert!(service.configured_chains().unwrap().is_empty());
        assert_eq!(service.list_chains().unwrap(), "no installed chains");

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_is_configured() {
        let (dir, service) = setup_service();
        let root = service.instance_root("test");

        let err = service.is_configured("test").unwrap_err();
        assert!(matches!(err, ServiceError::NoDnaFile(_)));
        assert_eq!(
            err.to_string(),
            format!("No DNA file in {}/", root.join("dna").display())
        );

        service.gen_dev(&root, EncodingFormat::Toml, DbInitPolicy::SkipInitializeDb).unwrap();
        assert_eq!(service.is_configured("test").unwrap(), EncodingFormat::Toml);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_configured_chains() {
        let (dir, service) = setup_service();
        let first = service
            .gen_dev(&service.instance_root("test"), EncodingFormat::Json, DbInitPolicy::InitializeDb)
            .unwrap();
        let second = service
            .gen_dev(&service.instance_root("other"), EncodingFormat::Toml, DbInitPolicy::SkipInitializeDb)
            .unwrap();
        std::fs::create_dir_all(service.instance_root("empty")).unwrap();
        std::fs::create_dir_all(service.instance_root(".test.staging-abc/dna")).unwrap();

        let chains = service.configured_chains().unwrap();
        assert_eq!(chains.keys().collect::<Vec<_>>(), vec!["other", "test"]);
        assert_eq!(chains["test"].dna().uuid, first.dna().uuid);
        assert_eq!(chains["other"].dna().uuid, second.dna().uuid);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_broken_chain_is_diagnosed() {
        let (dir, service) = setup_service();
        service
            .gen_dev(&service.instance_root("good"), EncodingFormat::Json, DbInitPolicy::SkipInitializeDb)
            .unwrap();
        let broken = service.instance_root("broken");
        std::fs::create_dir_all(broken.join("dna")).unwrap();
        std::fs::write(broken.join("dna").join("dna.json"), "{ not json").unwrap();

        let (chains, diagnostics) = service.configured_chains_with_diagnostics().unwrap();
        assert_eq!(chains.len(), 1);
        assert!(chains.contains_key("good"));
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].name, "broken");

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_list_chains() {
        let (dir, service) = setup_service();
        service
            .gen_dev(&service.instance_root("test"), EncodingFormat::Json, DbInitPolicy::InitializeDb)
            .unwrap();
        assert_eq!(
            service.list_chains().unwrap(),
            "installed holochains:     test <not-started>\n"
        );

        let started = service.gen_chain("test").unwrap();
        assert_eq!(
            service.list_chains().unwrap(),
            format!("installed holochains:     test {}\n", started.dna_hash().unwrap())
        );

        let _ = std::fs::remove_dir_all(&dir);
    }
}
