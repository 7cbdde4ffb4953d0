//! Typed access to the Lit network contract registries.
//!
//! The generated per-network registry files bind contract names to their
//! deployed addresses and ABIs, plus the connection parameters for the
//! chain they live on. This crate models that schema, validates it on
//! load, answers name/network lookups, extracts method and event
//! signatures, and carries the sync pipeline that regenerates the
//! registries from their upstream sources.

pub mod config;
pub mod registry;
pub mod rpc;
pub mod sync;

pub use config::Settings;
pub use registry::store::RegistryStore;
pub use registry::{
    AbiEntry, AbiParam, ContractDeployment, ContractGroup, NetworkCache, NetworkConfig,
    StateMutability,
};
pub use sync::SyncService;
