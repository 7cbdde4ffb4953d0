use alloy::{
    providers::{Provider, ProviderBuilder, RootProvider},
    transports::http::{Client, Http},
};
use anyhow::{anyhow, Result};
use tracing::info;

use crate::registry::NetworkConfig;

pub fn build_provider(rpc_url: &str) -> Result<RootProvider<Http<Client>>> {
    let provider = ProviderBuilder::new().on_http(
        rpc_url
            .parse()
            .map_err(|e| anyhow!("Invalid RPC URL '{}': {}", rpc_url, e))?,
    );

    Ok(provider)
}

/// Probe an RPC endpoint without failing the caller.
pub async fn check_connection(rpc_url: &str) -> Result<bool> {
    let provider = build_provider(rpc_url)?;

    match provider.get_block_number().await {
        Ok(_) => Ok(true),
        Err(e) => {
            tracing::debug!("Connection check failed for {}: {}", rpc_url, e);
            Ok(false)
        }
    }
}

/// Verify a registry config block against the live chain: the node behind
/// `rpcUrl` must report the registry's `chainId`.
pub async fn verify_config(config: &NetworkConfig) -> Result<()> {
    let rpc_url = config
        .rpc_url
        .as_deref()
        .ok_or_else(|| anyhow!("Registry config has no rpcUrl to verify"))?;

    let expected: u64 = config
        .chain_id
        .as_deref()
        .ok_or_else(|| anyhow!("Registry config has no chainId to verify"))?
        .parse()
        .map_err(|e| anyhow!("Registry chainId is not a valid integer: {}", e))?;

    let provider = build_provider(rpc_url)?;
    let actual = provider.get_chain_id().await.map_err(|e| {
        anyhow!(
            "Cannot connect to '{}': {}. Check the registry's rpcUrl and network connectivity.",
            rpc_url,
            e
        )
    })?;

    if actual != expected {
        return Err(anyhow!(
            "Chain id mismatch for {}: registry says {}, node reports {}",
            rpc_url,
            expected,
            actual
        ));
    }

    info!("Verified chain id {} at {}", expected, rpc_url);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_provider_rejects_bad_url() {
        assert!(build_provider("not a url").is_err());
        assert!(build_provider("https://yellowstone-rpc.litprotocol.com").is_ok());
    }

    #[tokio::test]
    async fn test_verify_config_requires_fields() {
        let missing_url = NetworkConfig {
            chain_id: Some("175188".to_string()),
            ..Default::default()
        };
        let err = verify_config(&missing_url).await.unwrap_err();
        assert!(err.to_string().contains("no rpcUrl"));

        let missing_chain = NetworkConfig {
            rpc_url: Some("https://yellowstone-rpc.litprotocol.com".to_string()),
            ..Default::default()
        };
        let err = verify_config(&missing_chain).await.unwrap_err();
        assert!(err.to_string().contains("no chainId"));
    }
}
