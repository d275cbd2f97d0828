use lifeboat_core::constants::{
    DEFAULT_CHAIN_ID, DEFAULT_DECIMALS, DEFAULT_TOKEN_NAME, DEFAULT_TOKEN_SYMBOL,
    DEFAULT_TOTAL_SUPPLY,
};
use lifeboat_core::types::{Address, Balance, ChainId};
use serde::{Deserialize, Serialize};

fn default_decimals() -> u8 {
    DEFAULT_DECIMALS
}

fn default_chain_id() -> ChainId {
    DEFAULT_CHAIN_ID
}

fn default_redirect() -> bool {
    true
}

/// Deployment parameters for a new ledger.
///
/// Read from a JSON file by the node on first start; the wallet's
/// `genesis-params` command writes a template.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct GenesisParams {
    pub name: String,
    pub symbol: String,
    #[serde(default = "default_decimals")]
    pub decimals: u8,
    /// Entire supply in base units, as a decimal string.
    #[serde(with = "lifeboat_core::serde_helpers::dec_u128")]
    pub total_supply: Balance,
    /// Receives the whole supply. The ledger address is derived from it.
    pub deployer: Address,
    #[serde(default = "default_chain_id")]
    pub chain_id: ChainId,
    /// Route credits for blacklisted accounts on to their latest backup.
    #[serde(default = "default_redirect")]
    pub blacklist_redirect: bool,
}

impl GenesisParams {
    /// Default token parameters with `deployer` as the initial holder.
    pub fn new(deployer: Address) -> Self {
        Self {
            name: DEFAULT_TOKEN_NAME.to_string(),
            symbol: DEFAULT_TOKEN_SYMBOL.to_string(),
            decimals: DEFAULT_DECIMALS,
            total_supply: DEFAULT_TOTAL_SUPPLY,
            deployer,
            chain_id: DEFAULT_CHAIN_ID,
            blacklist_redirect: true,
        }
    }
}
