pub mod github;

use anyhow::{anyhow, Result};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

use crate::config::{mapped_contract_name, Settings, CONTRACT_NAME_MAP};
use crate::registry::{
    signatures, validate, AbiEntry, ContractDeployment, ContractGroup, NetworkCache, NetworkConfig,
};
use github::GitHubClient;

// Source layout of the two ABI repositories. Production networks keep raw
// ABI arrays in `<network-dir>/abis/*.abi`; the development branch keeps
// compiler output with the ABI nested under an `abi` key.
const PROD_ABI_DIR: &str = "abis";
const PROD_ABI_EXT: &str = ".abi";
const DEV_ABI_DIR: &str = "rust/lit-core/lit-blockchain/abis";
const DEV_ABI_EXT: &str = ".json";

/// A contract ABI fetched from a source repository.
#[derive(Debug, Clone)]
struct NamedAbi {
    name: String,
    entries: Vec<AbiEntry>,
}

/// Sources used and errors hit for one network during a sync run.
#[derive(Debug, Clone, Default)]
pub struct NetworkReport {
    pub abi_source: Option<String>,
    pub deployed_contracts: Option<String>,
    pub error: Option<String>,
}

/// Per-network bookkeeping for a sync run. A failing network is recorded
/// here instead of aborting the others.
#[derive(Debug, Default)]
pub struct SyncReport {
    networks: BTreeMap<String, NetworkReport>,
}

impl SyncReport {
    fn entry(&mut self, network: &str) -> &mut NetworkReport {
        self.networks.entry(network.to_string()).or_default()
    }

    pub fn track_abi_source(&mut self, network: &str, url: &str) {
        self.entry(network).abi_source = Some(url.to_string());
    }

    pub fn track_deployed_contracts(&mut self, network: &str, url: &str) {
        self.entry(network).deployed_contracts = Some(url.to_string());
    }

    pub fn track_error(&mut self, network: &str, message: &str) {
        self.entry(network).error = Some(message.to_string());
    }

    pub fn networks(&self) -> &BTreeMap<String, NetworkReport> {
        &self.networks
    }

    pub fn failed_networks(&self) -> Vec<&str> {
        self.networks
            .iter()
            .filter(|(_, report)| report.error.is_some())
            .map(|(network, _)| network.as_str())
            .collect()
    }

    /// Log the end-of-run summary: sources per successful network, errors
    /// per failed one, and the totals.
    pub fn log_summary(&self) {
        let failed = self.failed_networks();

        for (network, report) in &self.networks {
            match &report.error {
                None => {
                    info!("Network {}: ok", network);
                    if let Some(abis) = &report.abi_source {
                        info!("  ABIs source: {}", abis);
                    }
                    if let Some(deployed) = &report.deployed_contracts {
                        info!("  Deployed contracts: {}", deployed);
                    }
                }
                Some(message) => {
                    error!("Network {}: {}", network, message);
                }
            }
        }

        info!(
            "Sync finished: {} succeeded, {} failed",
            self.networks.len() - failed.len(),
            failed.len()
        );
    }
}

/// Fetches contract ABIs and deployed addresses, builds per-network
/// registries, and writes them with their signature extracts.
pub struct SyncService {
    github: GitHubClient,
    settings: Settings,
    report: SyncReport,
}

impl SyncService {
    pub fn new(settings: Settings) -> Self {
        let github = GitHubClient::new(&settings.github);
        Self {
            github,
            settings,
            report: SyncReport::default(),
        }
    }

    pub fn report(&self) -> &SyncReport {
        &self.report
    }

    /// Run a full sync, or only the named network when `only` is given.
    pub async fn run(&mut self, only: Option<&str>) -> Result<()> {
        let prod_networks: Vec<String> = self
            .settings
            .networks
            .prod
            .keys()
            .filter(|name| only.map_or(true, |wanted| wanted == name.as_str()))
            .cloned()
            .collect();
        let dev_networks: Vec<String> = self
            .settings
            .networks
            .dev
            .keys()
            .filter(|name| only.map_or(true, |wanted| wanted == name.as_str()))
            .cloned()
            .collect();

        if prod_networks.is_empty() && dev_networks.is_empty() {
            let known: Vec<&String> = self
                .settings
                .networks
                .prod
                .keys()
                .chain(self.settings.networks.dev.keys())
                .collect();
            return Err(anyhow!(
                "Unknown network '{}'. Configured networks: {}",
                only.unwrap_or_default(),
                known
                    .iter()
                    .map(|s| s.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            ));
        }

        let out_dir = PathBuf::from(&self.settings.output_dir);

        if !prod_networks.is_empty() {
            info!(
                "Processing production networks: {}",
                prod_networks.join(", ")
            );
        }
        for network in &prod_networks {
            if let Err(e) = self.update_prod(network, &out_dir).await {
                error!("[{}] Production cache update failed: {}", network, e);
                self.report.track_error(network, &e.to_string());
            }
        }

        if !dev_networks.is_empty() {
            info!("Processing development networks: {}", dev_networks.join(", "));
        }
        for network in &dev_networks {
            if let Err(e) = self.update_dev(network, &out_dir).await {
                error!("[{}] Development cache update failed: {}", network, e);
                self.report.track_error(network, &e.to_string());
            }
        }

        self.report.log_summary();
        Ok(())
    }

    /// Build and write the registry for one production network.
    async fn update_prod(&mut self, network: &str, out_dir: &Path) -> Result<()> {
        let net = self
            .settings
            .networks
            .prod
            .get(network)
            .cloned()
            .ok_or_else(|| anyhow!("Network '{}' is not in the production catalog", network))?;

        info!("[{}] Starting production cache update", network);
        self.report
            .track_deployed_contracts(network, &net.deployed_contracts);

        let abi_dir = format!("{}/{}", net.path, PROD_ABI_DIR);
        let repo = self.settings.github.networks_repo.clone();
        self.report.track_abi_source(
            network,
            &self.github.contents_url(&repo, &abi_dir, "main"),
        );

        let abis = self
            .fetch_abis(network, &repo, &abi_dir, "main", PROD_ABI_EXT, false)
            .await?;

        let deployed = self.fetch_deployed_contracts(&net.deployed_contracts).await?;
        let inserted_at = self
            .deployed_contracts_date(&repo, &net.deployed_contracts)
            .await?;

        let cache = build_cache(network, &deployed, &abis, &inserted_at);
        validate::validate_cache(&cache)
            .map_err(|e| anyhow!("Generated registry failed validation: {}", e))?;

        self.write_outputs(out_dir, "prod", network, &cache).await?;
        info!("[{}] Successfully updated production cache", network);
        Ok(())
    }

    /// Build and write the registry for one development network.
    async fn update_dev(&mut self, network: &str, out_dir: &Path) -> Result<()> {
        let net = self
            .settings
            .networks
            .dev
            .get(network)
            .cloned()
            .ok_or_else(|| anyhow!("Network '{}' is not in the development catalog", network))?;

        let branch = self.settings.github.dev_branch.clone();
        info!(
            "[{}] Starting development cache update from branch {}",
            network, branch
        );
        self.report
            .track_deployed_contracts(network, &net.deployed_contracts);

        let assets_repo = self.settings.github.assets_repo.clone();
        self.report.track_abi_source(
            network,
            &self.github.contents_url(&assets_repo, DEV_ABI_DIR, &branch),
        );

        let abis = self
            .fetch_abis(network, &assets_repo, DEV_ABI_DIR, &branch, DEV_ABI_EXT, true)
            .await?;

        let deployed = self.fetch_deployed_contracts(&net.deployed_contracts).await?;
        let networks_repo = self.settings.github.networks_repo.clone();
        let inserted_at = self
            .deployed_contracts_date(&networks_repo, &net.deployed_contracts)
            .await?;

        let cache = build_cache(network, &deployed, &abis, &inserted_at);
        validate::validate_cache(&cache)
            .map_err(|e| anyhow!("Generated registry failed validation: {}", e))?;

        self.write_outputs(out_dir, "dev", network, &cache).await?;
        info!("[{}] Successfully updated development cache", network);
        Ok(())
    }

    /// List an ABI directory and download every file that maps to a known
    /// contract name. `nested` selects the development layout, where the
    /// ABI array sits under an `abi` key of the compiler output.
    async fn fetch_abis(
        &self,
        network: &str,
        repo: &str,
        dir: &str,
        branch: &str,
        extension: &str,
        nested: bool,
    ) -> Result<Vec<NamedAbi>> {
        let files = self.github.list_dir(repo, dir, branch).await?;
        if files.is_empty() {
            return Err(anyhow!("No contract files found for network: {}", network));
        }
        info!("[{}] Found {} contract files", network, files.len());

        let mut abis = Vec::new();
        for file in files {
            let Some(name) = file.name.strip_suffix(extension) else {
                continue;
            };
            if !is_known_contract(name) {
                continue;
            }

            let download_url = file.download_url.as_deref().ok_or_else(|| {
                anyhow!("Contract file {} has no download URL", file.name)
            })?;
            debug!("[{}] Processing contract: {}", network, name);

            let document = self.github.fetch_json(download_url).await?;
            let abi_value = if nested {
                document
                    .get("abi")
                    .cloned()
                    .ok_or_else(|| anyhow!("No 'abi' key in contract file {}", file.name))?
            } else {
                document
            };

            let entries: Vec<AbiEntry> = serde_json::from_value(abi_value).map_err(|e| {
                anyhow!(
                    "Invalid ABI for contract {} in network {}: {}",
                    name,
                    network,
                    e
                )
            })?;

            if entries.is_empty() {
                return Err(anyhow!(
                    "Empty ABI found for contract: {} in network: {}",
                    name,
                    network
                ));
            }

            abis.push(NamedAbi {
                name: name.to_string(),
                entries,
            });
        }

        if abis.is_empty() {
            return Err(anyhow!("No valid contracts found for network: {}", network));
        }

        info!(
            "[{}] Successfully processed {} contracts",
            network,
            abis.len()
        );
        Ok(abis)
    }

    async fn fetch_deployed_contracts(&self, url: &str) -> Result<Map<String, Value>> {
        let document = self.github.fetch_json(url).await?;
        match document {
            Value::Object(map) => Ok(map),
            other => Err(anyhow!(
                "Deployed contracts file at {} is not a JSON object (got {})",
                url,
                json_type_name(&other)
            )),
        }
    }

    /// Capture timestamp for a build: the last commit touching the
    /// deployed-contracts file.
    async fn deployed_contracts_date(&self, repo: &str, url: &str) -> Result<String> {
        let file_path = path_after_main(url)?;
        self.github
            .last_commit_date(repo, &file_path)
            .await
            .map_err(|e| anyhow!("Failed to get last modified date: {}", e))
    }

    async fn write_outputs(
        &self,
        out_dir: &Path,
        kind: &str,
        network: &str,
        cache: &NetworkCache,
    ) -> Result<()> {
        let registry_path = out_dir.join(kind).join(format!("{}.json", network));
        cache.save(&registry_path).await?;
        info!("[{}] Wrote registry to {:?}", network, registry_path);

        let extracted = signatures::extract_signatures(cache, &self.settings.extraction_methods)?;
        if extracted.is_empty() {
            debug!("[{}] No signatures extracted, skipping signature file", network);
            return Ok(());
        }

        let signatures_path = out_dir.join("signatures").join(format!("{}.json", network));
        if let Some(parent) = signatures_path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| anyhow!("Failed to create signatures directory: {}", e))?;
        }
        let content = serde_json::to_string_pretty(&extracted)
            .map_err(|e| anyhow!("Failed to serialize signatures: {}", e))?;
        tokio::fs::write(&signatures_path, content)
            .await
            .map_err(|e| anyhow!("Failed to write signatures file {:?}: {}", signatures_path, e))?;
        info!("[{}] Wrote signatures to {:?}", network, signatures_path);

        Ok(())
    }
}

/// Whether a fetched ABI file name is one of the canonical contracts.
fn is_known_contract(name: &str) -> bool {
    CONTRACT_NAME_MAP
        .iter()
        .any(|(_, contract)| *contract == name)
}

/// Join the deployed addresses with their ABIs into a registry.
///
/// Address keys outside the contract name map are skipped; mapped contracts
/// without a fetched ABI are skipped with a warning, matching what the
/// upstream sources actually contain over time.
fn build_cache(
    network: &str,
    deployed: &Map<String, Value>,
    abis: &[NamedAbi],
    inserted_at: &str,
) -> NetworkCache {
    let config = extract_network_config(deployed);
    let mut data = Vec::new();

    for (key, value) in deployed {
        let Some(contract_name) = mapped_contract_name(key) else {
            if key.contains("Address") {
                debug!("Skipping unmapped contract: {}", key);
            }
            continue;
        };

        let Some(address) = value.as_str() else {
            warn!(
                "[{}] Address entry {} is not a string, skipping",
                network, key
            );
            continue;
        };

        let Some(abi) = abis.iter().find(|abi| abi.name == contract_name) else {
            warn!("[{}] No ABI found for contract: {}", network, contract_name);
            continue;
        };

        data.push(ContractGroup {
            name: contract_name.to_string(),
            contracts: vec![ContractDeployment {
                network: network.to_string(),
                address_hash: address.to_string(),
                inserted_at: inserted_at.to_string(),
                abi: abi.entries.clone(),
            }],
        });
    }

    NetworkCache { data, config }
}

/// Pull the connection parameters out of a deployed-contracts file.
///
/// Only attached when at least one value is present. `chainId` is carried
/// as a string in the registry; upstream files have shipped it both ways.
fn extract_network_config(deployed: &Map<String, Value>) -> Option<NetworkConfig> {
    let config = NetworkConfig {
        chain_id: deployed.get("chainId").and_then(string_or_number),
        rpc_url: deployed
            .get("rpcUrl")
            .and_then(Value::as_str)
            .map(str::to_string),
        chain_name: deployed
            .get("chainName")
            .and_then(Value::as_str)
            .map(str::to_string),
        lit_node_domain_name: deployed
            .get("litNodeDomainName")
            .and_then(Value::as_str)
            .map(str::to_string),
        lit_node_port: deployed.get("litNodePort").and_then(port_value),
        rocket_port: deployed.get("rocketPort").and_then(port_value),
    };

    if config == NetworkConfig::default() {
        None
    } else {
        Some(config)
    }
}

fn string_or_number(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn port_value(value: &Value) -> Option<u16> {
    value.as_u64().and_then(|port| u16::try_from(port).ok())
}

/// Repo-relative path of a raw.githubusercontent URL: everything after the
/// `main` branch segment.
fn path_after_main(url: &str) -> Result<String> {
    let parsed = url
        .parse::<reqwest::Url>()
        .map_err(|e| anyhow!("Invalid deployed contracts URL '{}': {}", url, e))?;

    let segments: Vec<&str> = parsed
        .path_segments()
        .map(|segments| segments.collect())
        .unwrap_or_default();

    let main_index = segments
        .iter()
        .position(|segment| *segment == "main")
        .ok_or_else(|| anyhow!("No 'main' segment in URL '{}'", url))?;

    Ok(segments[main_index + 1..].join("/"))
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
