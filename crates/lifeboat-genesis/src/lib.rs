//! lifeboat-genesis
//!
//! Deploys a ledger into an empty `StateDb`: validates the deployment
//! parameters, derives the ledger's address from the deployer the way a
//! contract creation at nonce 0 would, and credits the entire supply to the
//! deployer. This is the one and only place tokens are created.

pub mod params;

pub use params::GenesisParams;

use std::path::Path;

use lifeboat_core::error::LedgerError;
use lifeboat_core::meta::LedgerMeta;
use lifeboat_crypto::hash::{contract_address, to_checksum};
use lifeboat_state::StateEngine;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum GenesisError {
    #[error("token name must not be empty")]
    EmptyName,

    #[error("token symbol must not be empty")]
    EmptySymbol,

    #[error("total supply must be positive")]
    ZeroSupply,

    #[error("deployer must not be the zero address")]
    ZeroDeployer,

    #[error("cannot read genesis params: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid genesis params: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

/// Read `GenesisParams` from a JSON file.
pub fn load_params(path: &Path) -> Result<GenesisParams, GenesisError> {
    let raw = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}

/// Check the parameters and turn them into the ledger's persisted identity.
pub fn build_meta(params: &GenesisParams) -> Result<LedgerMeta, GenesisError> {
    if params.name.trim().is_empty() {
        return Err(GenesisError::EmptyName);
    }
    if params.symbol.trim().is_empty() {
        return Err(GenesisError::EmptySymbol);
    }
    if params.total_supply == 0 {
        return Err(GenesisError::ZeroSupply);
    }
    if params.deployer.is_zero() {
        return Err(GenesisError::ZeroDeployer);
    }
    Ok(LedgerMeta {
        name: params.name.clone(),
        symbol: params.symbol.clone(),
        decimals: params.decimals,
        total_supply: params.total_supply,
        chain_id: params.chain_id,
        contract: contract_address(&params.deployer, 0),
        deployer: params.deployer,
        blacklist_redirect: params.blacklist_redirect,
    })
}

/// Apply the genesis state through `engine`.
///
/// Fails with `LedgerError::AlreadyInitialized` if the database already holds
/// a ledger.
pub fn apply_genesis(engine: &StateEngine, params: &GenesisParams) -> Result<LedgerMeta, GenesisError> {
    info!("applying ledger genesis");
    let meta = build_meta(params)?;
    engine.initialize(meta.clone())?;
    info!(
        contract = %to_checksum(&meta.contract),
        deployer = %to_checksum(&meta.deployer),
        chain_id = meta.chain_id,
        blacklist_redirect = meta.blacklist_redirect,
        "genesis: ledger deployed"
    );
    Ok(meta)
}
