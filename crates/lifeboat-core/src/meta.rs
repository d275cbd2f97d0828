use serde::{Deserialize, Serialize};

use crate::types::{Address, Balance, ChainId};

/// Ledger identity and token parameters, fixed at initialization and stored
/// under the `meta` tree.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct LedgerMeta {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
    pub total_supply: Balance,
    /// Network the ledger runs on. Bound into every recovery signature.
    pub chain_id: ChainId,
    /// The ledger's own address. Bound into every recovery signature.
    pub contract: Address,
    /// Account that received the initial supply.
    pub deployer: Address,
    /// When true, credits addressed to a blacklisted account continue on to
    /// its latest backup; when false they stay at the blacklisted account.
    pub blacklist_redirect: bool,
}
