use anyhow::{anyhow, Result};
use clap::{Arg, Command};
use lit_contract_registry::config::Settings;
use lit_contract_registry::registry::{signatures, validate, NetworkCache};
use lit_contract_registry::rpc;
use lit_contract_registry::sync::SyncService;
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    // Log to stderr so generated JSON can be piped from stdout
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    let matches = Command::new("lit-contract-registry")
        .version("0.1.0")
        .about("Generates and validates Lit network contract registries")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Path to settings file"),
        )
        .arg(
            Arg::new("network")
                .short('n')
                .long("network")
                .value_name("NETWORK")
                .help("Sync only this network (e.g. naga-dev, datil, develop)"),
        )
        .arg(
            Arg::new("output-dir")
                .short('o')
                .long("output-dir")
                .value_name("DIR")
                .help("Directory the generated registries are written to"),
        )
        .arg(
            Arg::new("dev-branch")
                .long("dev-branch")
                .value_name("BRANCH")
                .help("lit-assets branch for development ABIs"),
        )
        .arg(
            Arg::new("validate")
                .long("validate")
                .value_name("FILE")
                .help("Validate a registry JSON file and exit"),
        )
        .arg(
            Arg::new("verify-rpc")
                .long("verify-rpc")
                .help("With --validate, also verify chainId against the live RPC endpoint")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("signatures-from")
                .long("signatures-from")
                .value_name("FILE")
                .help("Convert a custom networkContext.json to a signatures file and exit"),
        )
        .arg(
            Arg::new("network-name")
                .long("network-name")
                .value_name("NAME")
                .help("Network name used with --signatures-from"),
        )
        .arg(
            Arg::new("generate-config")
                .long("generate-config")
                .help("Generate a sample settings file and exit")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("config-path")
                .long("config-path")
                .help("Print the default settings file path and exit")
                .action(clap::ArgAction::SetTrue),
        )
        .get_matches();

    // Handle special commands first
    if matches.get_flag("generate-config") {
        println!("{}", Settings::generate_sample());
        return Ok(());
    }

    if matches.get_flag("config-path") {
        match Settings::default_config_path() {
            Ok(path) => {
                println!("{}", path.display());
                return Ok(());
            }
            Err(e) => {
                error!("Could not determine default settings path: {}", e);
                return Err(e);
            }
        }
    }

    // Load settings
    let config_path = matches.get_one::<String>("config").map(|s| s.as_str());
    let mut settings = Settings::load_or_default(config_path).await;

    // Override with command line arguments
    if let Some(dir) = matches.get_one::<String>("output-dir") {
        settings.output_dir = dir.clone();
    }

    if let Some(branch) = matches.get_one::<String>("dev-branch") {
        settings.github.dev_branch = branch.clone();
    }

    if let Some(path) = matches.get_one::<String>("validate") {
        return validate_registry(path, matches.get_flag("verify-rpc")).await;
    }

    if let Some(path) = matches.get_one::<String>("signatures-from") {
        let network_name = matches
            .get_one::<String>("network-name")
            .map(|s| s.as_str())
            .unwrap_or("custom-network");
        return signatures_from_context(path, network_name, &settings).await;
    }

    info!("Starting registry sync");
    info!("Output directory: {}", settings.output_dir);

    let mut service = SyncService::new(settings);
    let only = matches.get_one::<String>("network").map(|s| s.as_str());

    if let Err(e) = service.run(only).await {
        error!("Sync failed: {}", e);
        return Err(e);
    }

    Ok(())
}

/// Validate a registry file, optionally probing its RPC endpoint.
async fn validate_registry(path: &str, verify_rpc: bool) -> Result<()> {
    let cache = NetworkCache::load(path).await?;
    validate::validate_cache(&cache).map_err(|e| anyhow!("{}: {}", path, e))?;

    info!(
        "{} is valid: {} contract groups{}",
        path,
        cache.data.len(),
        if cache.config.is_some() {
            ", config block present"
        } else {
            ""
        }
    );

    if verify_rpc {
        match &cache.config {
            Some(config) => rpc::verify_config(config).await?,
            None => warn!("{} has no config block, nothing to verify over RPC", path),
        }
    }

    Ok(())
}

/// Convert a custom network context file into a signatures file.
async fn signatures_from_context(path: &str, network_name: &str, settings: &Settings) -> Result<()> {
    info!("Processing custom network context: {}", path);

    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| anyhow!("Failed to read network context file {}: {}", path, e))?;
    let context: BTreeMap<String, signatures::ContractContext> = serde_json::from_str(&content)
        .map_err(|e| anyhow!("Failed to parse network context file {}: {}", path, e))?;

    let cache = signatures::cache_from_context(&context, network_name);
    let extracted = signatures::extract_signatures(&cache, &settings.extraction_methods)?;

    if extracted.is_empty() {
        warn!(
            "No signatures extracted from {}: none of the configured methods matched",
            path
        );
    }

    let out_path = PathBuf::from(&settings.output_dir)
        .join("signatures")
        .join(format!("{}.json", network_name));
    if let Some(parent) = out_path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| anyhow!("Failed to create signatures directory: {}", e))?;
    }

    let serialized = serde_json::to_string_pretty(&extracted)
        .map_err(|e| anyhow!("Failed to serialize signatures: {}", e))?;
    tokio::fs::write(&out_path, serialized)
        .await
        .map_err(|e| anyhow!("Failed to write signatures file {:?}: {}", out_path, e))?;

    info!("Wrote signatures for {} to {:?}", network_name, out_path);
    Ok(())
}
