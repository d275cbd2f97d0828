use jsonrpsee::core::RpcResult;
use jsonrpsee::proc_macros::rpc;

use crate::types::{RpcAccount, RpcEvent, RpcTokenInfo};

/// Lifeboat JSON-RPC 2.0 API definition.
///
/// All method names are prefixed with "lifeboat_" via `namespace = "lifeboat"`.
/// Addresses are 0x-prefixed hex; amounts are decimal strings.
#[rpc(server, namespace = "lifeboat")]
pub trait LifeboatApi {
    /// Token parameters, chain id, ledger address and recovery domain.
    #[method(name = "getTokenInfo")]
    async fn get_token_info(&self) -> RpcResult<RpcTokenInfo>;

    /// Balance in base units; "0" for unknown accounts.
    #[method(name = "getBalance")]
    async fn get_balance(&self, address: String) -> RpcResult<String>;

    #[method(name = "getAccount")]
    async fn get_account(&self, address: String) -> RpcResult<RpcAccount>;

    #[method(name = "getBackupAddress")]
    async fn get_backup_address(&self, address: String) -> RpcResult<Option<String>>;

    #[method(name = "isBlacklisted")]
    async fn is_blacklisted(&self, address: String) -> RpcResult<bool>;

    #[method(name = "getAllowance")]
    async fn get_allowance(&self, owner: String, spender: String) -> RpcResult<String>;

    /// Nonce the next transaction from `address` must carry.
    #[method(name = "getNonce")]
    async fn get_nonce(&self, address: String) -> RpcResult<u64>;

    /// The EIP-712 digest `holder` signs to authorize an emergency transfer
    /// on this ledger, as 0x-prefixed hex.
    #[method(name = "getRecoveryDigest")]
    async fn get_recovery_digest(&self, holder: String) -> RpcResult<String>;

    /// Up to `limit` (max 500) logged events starting at `from_seq`.
    #[method(name = "getEvents")]
    async fn get_events(&self, from_seq: u64, limit: u32) -> RpcResult<Vec<RpcEvent>>;

    /// Submit a signed transaction. `tx_hex` is hex-encoded bincode(Transaction).
    /// Returns the transaction hash on acceptance into the apply queue.
    #[method(name = "sendTransaction")]
    async fn send_transaction(&self, tx_hex: String) -> RpcResult<String>;
}
