use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tokio::fs;

use crate::registry::signatures::DEFAULT_METHODS;

/// Deployed-contracts JSON address keys mapped to canonical contract names.
///
/// Keys not in this table are ignored by the cache builder.
pub const CONTRACT_NAME_MAP: &[(&str, &str)] = &[
    ("litTokenContractAddress", "LITToken"),
    ("pkpNftContractAddress", "PKPNFT"),
    ("pkpHelperContractAddress", "PKPHelper"),
    ("pkpPermissionsContractAddress", "PKPPermissions"),
    ("pkpNftMetadataContractAddress", "PKPNFTMetadata"),
    ("pubkeyRouterContractAddress", "PubkeyRouter"),
    ("rateLimitNftContractAddress", "RateLimitNFT"),
    ("stakingBalancesContractAddress", "StakingBalances"),
    ("stakingContractAddress", "Staking"),
    ("multisenderContractAddress", "Multisender"),
    ("allowlistContractAddress", "Allowlist"),
    ("paymentDelegationContractAddress", "PaymentDelegation"),
    ("priceFeedContractAddress", "PriceFeed"),
    ("cloneNetContractAddress", "CloneNet"),
    ("ledgerContractAddress", "Ledger"),
];

/// Canonical contract name for a deployed-contracts address key.
pub fn mapped_contract_name(address_key: &str) -> Option<&'static str> {
    CONTRACT_NAME_MAP
        .iter()
        .find(|(key, _)| *key == address_key)
        .map(|(_, name)| *name)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub output_dir: String,
    pub extraction_methods: Vec<String>,
    pub github: GitHubSettings,
    pub networks: NetworkCatalog,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitHubSettings {
    pub api_base: String,
    pub owner: String,
    pub networks_repo: String,
    pub assets_repo: String,
    pub dev_branch: String,
    // Only ever sourced from the environment, never from the settings file.
    #[serde(skip)]
    pub token: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkCatalog {
    pub prod: BTreeMap<String, ProdNetwork>,
    pub dev: BTreeMap<String, DevNetwork>,
}

/// A production network: a directory in the networks repo plus the raw URL
/// of its deployed-contracts file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProdNetwork {
    pub path: String,
    pub deployed_contracts: String,
}

/// A development network served from the lit-assets repo on a branch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DevNetwork {
    pub deployed_contracts: String,
}

fn deployed_contracts_url(network_dir: &str) -> String {
    format!(
        "https://raw.githubusercontent.com/LIT-Protocol/networks/main/{}/deployed-lit-node-contracts-temp.json",
        network_dir
    )
}

impl Default for Settings {
    fn default() -> Self {
        let mut prod = BTreeMap::new();
        for (network, dir) in [
            ("datil", "datil-prod"),
            ("datil-dev", "datil-dev"),
            ("datil-test", "datil-test"),
            ("naga-dev", "naga-dev"),
            ("naga-test", "naga-test"),
            ("naga-staging", "naga-staging"),
            ("naga-proto", "naga-proto"),
            ("naga", "naga-prod"),
        ] {
            prod.insert(
                network.to_string(),
                ProdNetwork {
                    path: dir.to_string(),
                    deployed_contracts: deployed_contracts_url(dir),
                },
            );
        }

        let mut dev = BTreeMap::new();
        dev.insert(
            "develop".to_string(),
            DevNetwork {
                // The develop branch deploys against the naga-dev chain.
                deployed_contracts: deployed_contracts_url("naga-dev"),
            },
        );

        Self {
            output_dir: "./dist".to_string(),
            extraction_methods: DEFAULT_METHODS.iter().map(|m| m.to_string()).collect(),
            github: GitHubSettings {
                api_base: "https://api.github.com/repos".to_string(),
                owner: "LIT-Protocol".to_string(),
                networks_repo: "networks".to_string(),
                assets_repo: "lit-assets".to_string(),
                dev_branch: "develop".to_string(),
                token: None,
            },
            networks: NetworkCatalog { prod, dev },
        }
    }
}

impl Settings {
    /// Load settings from a TOML file
    pub async fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| anyhow!("Failed to read settings file {:?}: {}", path, e))?;

        let settings: Settings = toml::from_str(&content)
            .map_err(|e| anyhow!("Failed to parse settings file {:?}: {}", path, e))?;

        Ok(settings)
    }

    /// Save settings to a TOML file
    pub async fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let content = toml::to_string_pretty(self)
            .map_err(|e| anyhow!("Failed to serialize settings: {}", e))?;

        if let Some(parent) = path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent).await.map_err(|e| {
                    anyhow!("Failed to create settings directory {:?}: {}", parent, e)
                })?;
            }
        }

        fs::write(path, content)
            .await
            .map_err(|e| anyhow!("Failed to write settings file {:?}: {}", path, e))?;

        Ok(())
    }

    /// Load settings with fallback to the built-in network catalog
    pub async fn load_or_default<P: AsRef<Path>>(path: Option<P>) -> Self {
        let mut settings = match path {
            Some(path) => match Self::load_from_file(path).await {
                Ok(settings) => {
                    tracing::info!("Loaded settings from file");
                    settings
                }
                Err(e) => {
                    tracing::warn!("Failed to load settings file, using defaults: {}", e);
                    Self::default()
                }
            },
            None => Self::default(),
        };

        settings.apply_env_vars();
        settings
    }

    /// Apply environment variable overrides
    fn apply_env_vars(&mut self) {
        if let Ok(token) = std::env::var("GH_API_KEY") {
            tracing::info!("Using GH_API_KEY environment variable for GitHub API requests");
            self.github.token = Some(token);
        } else {
            tracing::warn!(
                "GH_API_KEY not set, GitHub API requests will be unauthenticated and rate-limited"
            );
        }

        if let Ok(branch) = std::env::var("DEV_BRANCH") {
            tracing::info!("Using DEV_BRANCH environment variable: {}", branch);
            self.github.dev_branch = branch;
        }
    }

    /// Get default settings file path
    pub fn default_config_path() -> Result<std::path::PathBuf> {
        let config_dir =
            dirs::config_dir().ok_or_else(|| anyhow!("Could not determine config directory"))?;
        Ok(config_dir.join("lit-contract-registry").join("config.toml"))
    }

    /// Generate a sample settings file
    pub fn generate_sample() -> String {
        let sample = r#"# Lit contract registry settings
# Configures where ABIs and deployed addresses are fetched from and where
# the generated registries are written.

# Directory the generated registries and signatures are written to
output_dir = "./dist"

# Contract.method entries extracted into the per-network signature files.
extraction_methods = [
  "Staking.getActiveUnkickedValidatorStructsAndCounts",
  "PubkeyRouter.getPubkey",
  "PKPNFT.mintNext",
]

[github]
api_base = "https://api.github.com/repos"
owner = "LIT-Protocol"
networks_repo = "networks"
assets_repo = "lit-assets"
dev_branch = "develop"

# Production networks: ABI directory in the networks repo + the raw URL of
# the deployed-contracts file
[networks.prod.naga-dev]
path = "naga-dev"
deployed_contracts = "https://raw.githubusercontent.com/LIT-Protocol/networks/main/naga-dev/deployed-lit-node-contracts-temp.json"

[networks.prod.datil]
path = "datil-prod"
deployed_contracts = "https://raw.githubusercontent.com/LIT-Protocol/networks/main/datil-prod/deployed-lit-node-contracts-temp.json"

# Development networks are served from the lit-assets repo on dev_branch
[networks.dev.develop]
deployed_contracts = "https://raw.githubusercontent.com/LIT-Protocol/networks/main/naga-dev/deployed-lit-node-contracts-temp.json"

# Environment variables:
# GH_API_KEY - GitHub token for API requests (strongly recommended, the
#              anonymous rate limit is easy to exhaust in one sync)
# DEV_BRANCH - lit-assets branch for development ABIs (overrides dev_branch)
"#;
        sample.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_catalog() {
        let settings = Settings::default();

        assert_eq!(settings.networks.prod.len(), 8);
        assert_eq!(settings.networks.prod["datil"].path, "datil-prod");
        assert_eq!(settings.networks.prod["naga"].path, "naga-prod");
        assert_eq!(settings.networks.prod["naga-dev"].path, "naga-dev");
        assert!(settings.networks.prod["naga-dev"]
            .deployed_contracts
            .ends_with("naga-dev/deployed-lit-node-contracts-temp.json"));

        assert_eq!(settings.networks.dev.len(), 1);
        assert!(settings.networks.dev.contains_key("develop"));

        assert_eq!(settings.github.owner, "LIT-Protocol");
        assert!(!settings.extraction_methods.is_empty());
    }

    #[test]
    fn test_contract_name_map() {
        assert_eq!(
            mapped_contract_name("litTokenContractAddress"),
            Some("LITToken")
        );
        assert_eq!(
            mapped_contract_name("stakingContractAddress"),
            Some("Staking")
        );
        assert_eq!(mapped_contract_name("chainId"), None);
        assert_eq!(mapped_contract_name("wrappedKeysContractAddress"), None);
    }

    #[test]
    fn test_sample_settings_parse() {
        let sample = Settings::generate_sample();
        let settings: Settings = toml::from_str(&sample).unwrap();

        assert_eq!(settings.output_dir, "./dist");
        assert_eq!(settings.extraction_methods.len(), 3);
        assert!(settings.networks.prod.contains_key("naga-dev"));
        assert!(settings.networks.dev.contains_key("develop"));
    }

    #[tokio::test]
    async fn test_settings_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let settings = Settings::default();
        settings.save_to_file(&path).await.unwrap();

        let loaded = Settings::load_from_file(&path).await.unwrap();
        assert_eq!(loaded.output_dir, settings.output_dir);
        assert_eq!(loaded.networks.prod.len(), settings.networks.prod.len());
        assert_eq!(loaded.extraction_methods, settings.extraction_methods);
    }
}
