use anyhow::{anyhow, Result};
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::{AbiEntry, ContractDeployment, ContractGroup, NetworkCache};

/// Default `Contract.method` extraction list.
///
/// These are the entry points node clients drive directly: epoch/validator
/// state reads, PKP minting and permission management, payment delegation,
/// the payment ledger, and node price feeds.
pub const DEFAULT_METHODS: &[&str] = &[
    "Staking.getActiveUnkickedValidatorStructsAndCounts",
    "PubkeyRouter.deriveEthAddressFromPubkey",
    "PubkeyRouter.ethAddressToPkpId",
    "PubkeyRouter.getEthAddress",
    "PubkeyRouter.getPubkey",
    "PKPNFT.claimAndMint",
    "PKPNFT.mintCost",
    "PKPNFT.mintNext",
    "PKPNFT.safeTransferFrom",
    "PKPNFT.tokenOfOwnerByIndex",
    "PKPHelper.claimAndMintNextAndAddAuthMethodsWithTypes",
    "PKPHelper.mintNextAndAddAuthMethods",
    "PKPPermissions.addPermittedAction",
    "PKPPermissions.addPermittedAddress",
    "PKPPermissions.addPermittedAuthMethod",
    "PKPPermissions.addPermittedAuthMethodScope",
    "PKPPermissions.getPermittedActions",
    "PKPPermissions.getPermittedAddresses",
    "PKPPermissions.getPermittedAuthMethodScopes",
    "PKPPermissions.getPermittedAuthMethods",
    "PKPPermissions.getTokenIdsForAuthMethod",
    "PKPPermissions.isPermittedAction",
    "PKPPermissions.isPermittedAddress",
    "PKPPermissions.removePermittedAction",
    "PKPPermissions.removePermittedAddress",
    "PKPPermissions.removePermittedAuthMethod",
    "PKPPermissions.removePermittedAuthMethodScope",
    "PaymentDelegation.delegatePayments",
    "PaymentDelegation.delegatePaymentsBatch",
    "PaymentDelegation.getPayers",
    "PaymentDelegation.getPayersAndRestrictions",
    "PaymentDelegation.getRestriction",
    "PaymentDelegation.getUsers",
    "PaymentDelegation.setRestriction",
    "PaymentDelegation.undelegatePayments",
    "PaymentDelegation.undelegatePaymentsBatch",
    "Ledger.withdraw",
    "Ledger.balance",
    "Ledger.deposit",
    "Ledger.depositForUser",
    "Ledger.latestWithdrawRequest",
    "Ledger.requestWithdraw",
    "Ledger.stableBalance",
    "Ledger.userWithdrawDelay",
    "PriceFeed.getNodesForRequest",
];

/// Per-contract signature bundle: address, the selected function entries,
/// and every event the contract declares.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContractSignatures {
    pub address: String,
    pub methods: BTreeMap<String, AbiEntry>,
    pub events: Vec<AbiEntry>,
}

pub type SignatureSet = BTreeMap<String, ContractSignatures>;

/// A contract entry of a custom network context file, keyed by contract
/// name in the surrounding JSON object.
#[derive(Debug, Clone, Deserialize)]
pub struct ContractContext {
    pub address: String,
    pub abi: Vec<AbiEntry>,
    #[serde(default)]
    pub name: Option<String>,
}

/// Extracts signature bundles from a built registry.
///
/// `methods` entries are `Contract.method` strings. A contract only appears
/// in the output when at least one of its requested methods is present in
/// its ABI. Duplicate event names get a `_Duplicate_<n>` suffix so the
/// output keys stay unique.
pub fn extract_signatures(cache: &NetworkCache, methods: &[String]) -> Result<SignatureSet> {
    let mut methods_by_contract: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    for entry in methods {
        let (contract, method) = entry.split_once('.').ok_or_else(|| {
            anyhow!(
                "Invalid method selector '{}': expected 'Contract.method'",
                entry
            )
        })?;
        methods_by_contract.entry(contract).or_default().push(method);
    }

    let mut signatures = SignatureSet::new();

    for group in &cache.data {
        let Some(wanted) = methods_by_contract.get(group.name.as_str()) else {
            continue;
        };

        let deployment = first_deployment(group)?;
        let selected = select_methods(deployment, wanted);
        if selected.is_empty() {
            tracing::debug!(
                "No requested methods found in ABI of '{}', skipping",
                group.name
            );
            continue;
        }

        signatures.insert(
            group.name.clone(),
            ContractSignatures {
                address: deployment.address_hash.clone(),
                methods: selected,
                events: dedup_events(&deployment.abi),
            },
        );
    }

    Ok(signatures)
}

/// Converts a custom network context mapping (`{ name: { address, abi } }`)
/// into a single-network registry, stamping records with the current time.
pub fn cache_from_context(
    contracts: &BTreeMap<String, ContractContext>,
    network: &str,
) -> NetworkCache {
    let inserted_at = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);

    let data = contracts
        .iter()
        .map(|(name, info)| ContractGroup {
            name: name.clone(),
            contracts: vec![ContractDeployment {
                network: network.to_string(),
                address_hash: info.address.clone(),
                inserted_at: inserted_at.clone(),
                abi: info.abi.clone(),
            }],
        })
        .collect();

    NetworkCache { data, config: None }
}

fn first_deployment(group: &ContractGroup) -> Result<&ContractDeployment> {
    group
        .contracts
        .first()
        .ok_or_else(|| anyhow!("Contract group '{}' has no deployments", group.name))
}

fn select_methods(
    deployment: &ContractDeployment,
    wanted: &[&str],
) -> BTreeMap<String, AbiEntry> {
    let mut selected = BTreeMap::new();
    for entry in &deployment.abi {
        if !entry.is_function() {
            continue;
        }
        if let Some(name) = entry.name() {
            if wanted.contains(&name) && !selected.contains_key(name) {
                selected.insert(name.to_string(), entry.clone());
            }
        }
    }
    selected
}

/// Clones every event entry, suffixing repeated names with `_Duplicate_<n>`.
fn dedup_events(abi: &[AbiEntry]) -> Vec<AbiEntry> {
    let mut name_count: BTreeMap<String, usize> = BTreeMap::new();
    let mut events = Vec::new();

    for entry in abi {
        if !entry.is_event() {
            continue;
        }

        let mut event = entry.clone();
        if let AbiEntry::Event {
            name: Some(name), ..
        } = &mut event
        {
            let count = name_count.entry(name.clone()).or_insert(0);
            if *count > 0 {
                *name = format!("{}_Duplicate_{}", name, count);
            }
            *count += 1;
        }
        events.push(event);
    }

    events
}
