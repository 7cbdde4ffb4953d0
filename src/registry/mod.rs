pub mod abi;
pub mod signatures;
pub mod store;
pub mod validate;

use alloy::{json_abi::JsonAbi, primitives::Address};
use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::fs;

pub use abi::{AbiEntry, AbiParam, StateMutability};

/// One generated registry: every contract deployed on a network, plus the
/// connection parameters clients need to reach that network.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct NetworkCache {
    pub data: Vec<ContractGroup>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<NetworkConfig>,
}

/// A logical contract with its deployments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContractGroup {
    pub name: String,
    pub contracts: Vec<ContractDeployment>,
}

/// One deployment record of a contract group on a specific network.
///
/// `inserted_at` records when the registry captured the record, not when
/// the contract landed on-chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContractDeployment {
    pub network: String,
    pub address_hash: String,
    pub inserted_at: String,
    #[serde(rename = "ABI")]
    pub abi: Vec<AbiEntry>,
}

/// Connection parameters for the network a registry was generated for.
///
/// The generator only attaches this block when the deployed-contracts file
/// carried at least one of the values, so every field is optional.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chain_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rpc_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chain_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lit_node_domain_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lit_node_port: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rocket_port: Option<u16>,
}

impl NetworkCache {
    /// Parse a registry from its JSON form.
    pub fn parse(content: &str) -> Result<Self> {
        serde_json::from_str(content).map_err(|e| anyhow!("Failed to parse registry JSON: {}", e))
    }

    /// Load a registry from a JSON file.
    pub async fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| anyhow!("Failed to read registry file {:?}: {}", path, e))?;
        Self::parse(&content).map_err(|e| anyhow!("{:?}: {}", path, e))
    }

    /// Write the registry as pretty-printed JSON.
    pub async fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent).await.map_err(|e| {
                    anyhow!("Failed to create output directory {:?}: {}", parent, e)
                })?;
            }
        }

        let content = serde_json::to_string_pretty(self)
            .map_err(|e| anyhow!("Failed to serialize registry: {}", e))?;
        fs::write(path, content)
            .await
            .map_err(|e| anyhow!("Failed to write registry file {:?}: {}", path, e))?;
        Ok(())
    }

    /// Look up a contract group by name.
    pub fn group(&self, name: &str) -> Option<&ContractGroup> {
        self.data.iter().find(|group| group.name == name)
    }

    /// Names of every contract group in the registry.
    pub fn contract_names(&self) -> Vec<&str> {
        self.data.iter().map(|group| group.name.as_str()).collect()
    }

    /// Look up the deployment of a contract on a specific network.
    pub fn deployment(&self, name: &str, network: &str) -> Result<&ContractDeployment> {
        let group = self.group(name).ok_or_else(|| {
            anyhow!(
                "Unknown contract group '{}'. Available groups: {}",
                name,
                self.contract_names().join(", ")
            )
        })?;

        group
            .contracts
            .iter()
            .find(|deployment| deployment.network == network)
            .ok_or_else(|| {
                let networks: Vec<&str> = group
                    .contracts
                    .iter()
                    .map(|deployment| deployment.network.as_str())
                    .collect();
                anyhow!(
                    "Contract '{}' has no deployment on network '{}'. Deployed on: {}",
                    name,
                    network,
                    networks.join(", ")
                )
            })
    }
}

impl ContractDeployment {
    /// Parse the deployment address into a checksummed address.
    pub fn address(&self) -> Result<Address> {
        validate::parse_address(&self.address_hash)
    }

    /// Convert the raw ABI entries into the ecosystem-standard parsed form.
    pub fn json_abi(&self) -> Result<JsonAbi> {
        let value = serde_json::to_value(&self.abi)
            .map_err(|e| anyhow!("Failed to serialize ABI entries: {}", e))?;
        serde_json::from_value(value).map_err(|e| {
            anyhow!(
                "ABI of deployment at {} is not a valid contract ABI: {}",
                self.address_hash,
                e
            )
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Trimmed-down naga-dev registry in the exact shape the generator
    /// writes.
    pub(crate) const NAGA_DEV_SAMPLE: &str = r#"{
  "data": [
    {
      "name": "LITToken",
      "contracts": [
        {
          "network": "naga-dev",
          "address_hash": "0x5E8db2E7af793f4095c4843C8cBD87C5D8604838",
          "inserted_at": "2025-05-08T19:07:21.000Z",
          "ABI": [
            {
              "inputs": [
                { "internalType": "uint256", "name": "cap", "type": "uint256" }
              ],
              "stateMutability": "nonpayable",
              "type": "constructor"
            },
            {
              "inputs": [],
              "name": "InvalidShortString",
              "type": "error"
            },
            {
              "anonymous": false,
              "inputs": [
                { "indexed": true, "internalType": "address", "name": "from", "type": "address" },
                { "indexed": true, "internalType": "address", "name": "to", "type": "address" },
                { "indexed": false, "internalType": "uint256", "name": "value", "type": "uint256" }
              ],
              "name": "Transfer",
              "type": "event"
            },
            {
              "inputs": [
                { "internalType": "address", "name": "account", "type": "address" }
              ],
              "name": "balanceOf",
              "outputs": [
                { "internalType": "uint256", "name": "", "type": "uint256" }
              ],
              "stateMutability": "view",
              "type": "function"
            }
          ]
        }
      ]
    },
    {
      "name": "Staking",
      "contracts": [
        {
          "network": "naga-dev",
          "address_hash": "0xDE610A4fb43a570204bE37a6A38d1CD5A4F2B2BA",
          "inserted_at": "2025-05-08T19:07:21.000Z",
          "ABI": [
            {
              "inputs": [],
              "name": "currentValidatorCountForConsensus",
              "outputs": [
                { "internalType": "uint256", "name": "", "type": "uint256" }
              ],
              "stateMutability": "view",
              "type": "function"
            }
          ]
        }
      ]
    }
  ],
  "config": {
    "chainId": "175188",
    "rpcUrl": "https://yellowstone-rpc.litprotocol.com",
    "chainName": "yellowstone",
    "litNodeDomainName": "127.0.0.1",
    "litNodePort": 7470,
    "rocketPort": 7470
  }
}"#;

    #[test]
    fn test_lookup_littoken_on_naga_dev() {
        let cache = NetworkCache::parse(NAGA_DEV_SAMPLE).unwrap();

        let group = cache.group("LITToken").unwrap();
        assert_eq!(group.contracts.len(), 1);

        let deployment = cache.deployment("LITToken", "naga-dev").unwrap();
        assert_eq!(
            deployment.address_hash,
            "0x5E8db2E7af793f4095c4843C8cBD87C5D8604838"
        );
    }

    #[test]
    fn test_lookup_unknown_group() {
        let cache = NetworkCache::parse(NAGA_DEV_SAMPLE).unwrap();

        let err = cache.deployment("PKPNFT", "naga-dev").unwrap_err();
        assert!(err.to_string().contains("Unknown contract group 'PKPNFT'"));
        assert!(err.to_string().contains("LITToken"));
    }

    #[test]
    fn test_lookup_unknown_network() {
        let cache = NetworkCache::parse(NAGA_DEV_SAMPLE).unwrap();

        let err = cache.deployment("LITToken", "datil").unwrap_err();
        assert!(err.to_string().contains("no deployment on network 'datil'"));
        assert!(err.to_string().contains("naga-dev"));
    }

    #[test]
    fn test_round_trip_is_deep_equal() {
        let cache = NetworkCache::parse(NAGA_DEV_SAMPLE).unwrap();

        let original: serde_json::Value = serde_json::from_str(NAGA_DEV_SAMPLE).unwrap();
        let reserialized = serde_json::to_value(&cache).unwrap();
        assert_eq!(original, reserialized);
    }

    #[test]
    fn test_config_block_round_trip() {
        let cache = NetworkCache::parse(NAGA_DEV_SAMPLE).unwrap();
        let config = cache.config.as_ref().unwrap();

        assert_eq!(config.chain_id.as_deref(), Some("175188"));
        assert_eq!(
            config.rpc_url.as_deref(),
            Some("https://yellowstone-rpc.litprotocol.com")
        );
        assert_eq!(config.lit_node_port, Some(7470));
    }

    #[test]
    fn test_missing_config_block_is_omitted() {
        let cache = NetworkCache::parse(r#"{ "data": [] }"#).unwrap();
        assert!(cache.config.is_none());

        let reserialized = serde_json::to_value(&cache).unwrap();
        assert_eq!(reserialized, serde_json::json!({ "data": [] }));
    }

    #[test]
    fn test_deployment_address_parses() {
        let cache = NetworkCache::parse(NAGA_DEV_SAMPLE).unwrap();
        let deployment = cache.deployment("LITToken", "naga-dev").unwrap();

        let address = deployment.address().unwrap();
        assert_eq!(
            address.to_string(),
            "0x5E8db2E7af793f4095c4843C8cBD87C5D8604838"
        );
    }

    #[test]
    fn test_json_abi_conversion() {
        let cache = NetworkCache::parse(NAGA_DEV_SAMPLE).unwrap();
        let deployment = cache.deployment("LITToken", "naga-dev").unwrap();

        let abi = deployment.json_abi().unwrap();
        assert!(abi.functions().any(|f| f.name == "balanceOf"));
        assert!(abi.events().any(|e| e.name == "Transfer"));
    }

    #[tokio::test]
    async fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prod").join("naga-dev.json");

        let cache = NetworkCache::parse(NAGA_DEV_SAMPLE).unwrap();
        cache.save(&path).await.unwrap();

        let loaded = NetworkCache::load(&path).await.unwrap();
        assert_eq!(loaded, cache);
    }
}
