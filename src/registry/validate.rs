use alloy::primitives::Address;
use anyhow::{anyhow, Result};
use std::collections::HashSet;
use std::str::FromStr;

use super::{NetworkCache, NetworkConfig};

/// Validates and parses a deployment address.
///
/// Accepts exactly the artifact form: 0x followed by 40 hex characters.
pub fn parse_address(address: &str) -> Result<Address> {
    let address = address.trim();

    if address.is_empty() {
        return Err(anyhow!("Address cannot be empty"));
    }

    if !address.starts_with("0x") && !address.starts_with("0X") {
        return Err(anyhow!(
            "Invalid address format: '{}'. Addresses must start with '0x'",
            address
        ));
    }

    if address.len() != 42 {
        return Err(anyhow!(
            "Invalid address length: '{}'. Addresses must be exactly 42 characters (0x + 40 hex characters)",
            address
        ));
    }

    let hex_part = &address[2..];
    if !hex_part.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(anyhow!(
            "Invalid address format: '{}'. Contains non-hexadecimal characters",
            address
        ));
    }

    Address::from_str(address).map_err(|e| anyhow!("Invalid address: '{}'. Error: {}", address, e))
}

/// Validates a full registry, failing fast on the first malformed record.
///
/// Checks the invariants consumers rely on: well-formed addresses, unique
/// group names, parseable capture timestamps, ABIs loadable by standard
/// tooling, and a sane config block.
pub fn validate_cache(cache: &NetworkCache) -> Result<()> {
    let mut seen_names = HashSet::new();

    for group in &cache.data {
        if group.name.is_empty() {
            return Err(anyhow!("Contract group with empty name"));
        }

        if !seen_names.insert(group.name.as_str()) {
            return Err(anyhow!("Duplicate contract group name: '{}'", group.name));
        }

        if group.contracts.is_empty() {
            return Err(anyhow!(
                "Contract group '{}' has no deployments",
                group.name
            ));
        }

        for deployment in &group.contracts {
            parse_address(&deployment.address_hash)
                .map_err(|e| anyhow!("Contract '{}': {}", group.name, e))?;

            if deployment.network.is_empty() {
                return Err(anyhow!(
                    "Contract '{}' has a deployment with an empty network name",
                    group.name
                ));
            }

            chrono::DateTime::parse_from_rfc3339(&deployment.inserted_at).map_err(|e| {
                anyhow!(
                    "Contract '{}' on '{}': invalid inserted_at timestamp '{}': {}",
                    group.name,
                    deployment.network,
                    deployment.inserted_at,
                    e
                )
            })?;

            deployment.json_abi().map_err(|e| {
                anyhow!(
                    "Contract '{}' on '{}': {}",
                    group.name,
                    deployment.network,
                    e
                )
            })?;
        }
    }

    if let Some(config) = &cache.config {
        validate_config(config)?;
    }

    Ok(())
}

/// Validates a registry config block.
pub fn validate_config(config: &NetworkConfig) -> Result<()> {
    if let Some(chain_id) = &config.chain_id {
        if chain_id.is_empty() || !chain_id.chars().all(|c| c.is_ascii_digit()) {
            return Err(anyhow!(
                "Invalid chainId '{}': expected a non-negative integer string",
                chain_id
            ));
        }
    }

    if let Some(rpc_url) = &config.rpc_url {
        rpc_url
            .parse::<reqwest::Url>()
            .map_err(|e| anyhow!("Invalid rpcUrl '{}': {}", rpc_url, e))?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::tests::NAGA_DEV_SAMPLE;

    #[test]
    fn test_parse_address() {
        // Valid addresses
        assert!(parse_address("0x5E8db2E7af793f4095c4843C8cBD87C5D8604838").is_ok());
        assert!(parse_address("0x0000000000000000000000000000000000000000").is_ok());

        // Invalid addresses
        assert!(parse_address("").is_err());
        assert!(parse_address("not_an_address").is_err());
        assert!(parse_address("0x123").is_err()); // Too short
        assert!(parse_address("5E8db2E7af793f4095c4843C8cBD87C5D8604838").is_err()); // Missing 0x
        assert!(parse_address("0xgg8db2E7af793f4095c4843C8cBD87C5D8604838").is_err());
        // Invalid hex
    }

    #[test]
    fn test_validate_sample_registry() {
        let cache = NetworkCache::parse(NAGA_DEV_SAMPLE).unwrap();
        assert!(validate_cache(&cache).is_ok());
    }

    #[test]
    fn test_duplicate_group_name_rejected() {
        let mut cache = NetworkCache::parse(NAGA_DEV_SAMPLE).unwrap();
        let duplicate = cache.data[0].clone();
        cache.data.push(duplicate);

        let err = validate_cache(&cache).unwrap_err();
        assert!(err
            .to_string()
            .contains("Duplicate contract group name: 'LITToken'"));
    }

    #[test]
    fn test_empty_group_rejected() {
        let mut cache = NetworkCache::parse(NAGA_DEV_SAMPLE).unwrap();
        cache.data[1].contracts.clear();

        let err = validate_cache(&cache).unwrap_err();
        assert!(err.to_string().contains("'Staking' has no deployments"));
    }

    #[test]
    fn test_malformed_address_rejected() {
        let mut cache = NetworkCache::parse(NAGA_DEV_SAMPLE).unwrap();
        cache.data[0].contracts[0].address_hash = "0x1234".to_string();

        let err = validate_cache(&cache).unwrap_err();
        assert!(err.to_string().contains("Invalid address length"));
    }

    #[test]
    fn test_malformed_timestamp_rejected() {
        let mut cache = NetworkCache::parse(NAGA_DEV_SAMPLE).unwrap();
        cache.data[0].contracts[0].inserted_at = "May 8th 2025".to_string();

        let err = validate_cache(&cache).unwrap_err();
        assert!(err.to_string().contains("invalid inserted_at timestamp"));
    }

    #[test]
    fn test_validate_config() {
        let config = NetworkConfig {
            chain_id: Some("175188".to_string()),
            rpc_url: Some("https://yellowstone-rpc.litprotocol.com".to_string()),
            ..Default::default()
        };
        assert!(validate_config(&config).is_ok());

        let bad_chain = NetworkConfig {
            chain_id: Some("-1".to_string()),
            ..Default::default()
        };
        assert!(validate_config(&bad_chain).is_err());

        let bad_url = NetworkConfig {
            rpc_url: Some("not a url".to_string()),
            ..Default::default()
        };
        assert!(validate_config(&bad_url).is_err());
    }
}
