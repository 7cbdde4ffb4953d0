use anyhow::{anyhow, Result};
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::debug;

use super::{validate, ContractDeployment, NetworkCache};

/// Read-side access to generated registries.
///
/// Loads `<root>/{prod,dev}/<network>.json`, validates on first load, and
/// keeps a memory cache keyed by network name so repeated lookups don't
/// re-read files.
#[derive(Debug)]
pub struct RegistryStore {
    root: PathBuf,
    memory_cache: HashMap<String, NetworkCache>,
}

impl RegistryStore {
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self {
            root: root.into(),
            memory_cache: HashMap::new(),
        }
    }

    /// Get the registry for a network, loading it from disk on first use.
    pub async fn network(&mut self, name: &str) -> Result<NetworkCache> {
        if let Some(cache) = self.memory_cache.get(name) {
            debug!("Registry cache hit for {}", name);
            return Ok(cache.clone());
        }

        let path = self.registry_path(name).ok_or_else(|| {
            anyhow!(
                "No registry file for network '{}' under {:?}",
                name,
                self.root
            )
        })?;

        let cache = NetworkCache::load(&path).await?;
        validate::validate_cache(&cache)
            .map_err(|e| anyhow!("Registry {:?} failed validation: {}", path, e))?;

        debug!("Loaded registry for {} from {:?}", name, path);
        self.memory_cache.insert(name.to_string(), cache.clone());
        Ok(cache)
    }

    /// Look up a contract's deployment on a network.
    pub async fn lookup(&mut self, network: &str, contract: &str) -> Result<ContractDeployment> {
        let cache = self.network(network).await?;
        Ok(cache.deployment(contract, network)?.clone())
    }

    /// Register a registry directly (custom networks, tests).
    pub fn add_manual(&mut self, name: &str, cache: NetworkCache) {
        self.memory_cache.insert(name.to_string(), cache);
        debug!("Added manual registry for {}", name);
    }

    /// Whether a registry is available without loading it.
    pub fn has_network(&self, name: &str) -> bool {
        self.memory_cache.contains_key(name) || self.registry_path(name).is_some()
    }

    pub fn clear(&mut self) {
        self.memory_cache.clear();
    }

    fn registry_path(&self, name: &str) -> Option<PathBuf> {
        for kind in ["prod", "dev"] {
            let path = self.root.join(kind).join(format!("{}.json", name));
            if path.exists() {
                return Some(path);
            }
        }
        None
    }
}
