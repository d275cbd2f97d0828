use std::net::SocketAddr;
use std::sync::Arc;

use jsonrpsee::core::{async_trait, RpcResult};
use jsonrpsee::server::{Server, ServerHandle};
use jsonrpsee::types::ErrorObject;
use tracing::{debug, info, warn};

use lifeboat_core::error::LedgerError;
use lifeboat_core::meta::LedgerMeta;
use lifeboat_core::transaction::Transaction;
use lifeboat_core::types::Address;
use lifeboat_crypto::hash::tx_hash;
use lifeboat_crypto::{emergency_transfer_digest, recover_signer, RecoveryDomain};
use lifeboat_recovery::RecoveryQuery;
use lifeboat_state::StateDb;

use crate::api::LifeboatApiServer;
use crate::types::{RpcAccount, RpcEvent, RpcTokenInfo};

/// Largest page `lifeboat_getEvents` returns.
pub const MAX_EVENTS_PAGE: u32 = 500;

fn rpc_err(code: i32, msg: impl Into<String>) -> ErrorObject<'static> {
    ErrorObject::owned(code, msg.into(), None::<()>)
}

fn internal(e: LedgerError) -> ErrorObject<'static> {
    rpc_err(-32603, e.to_string())
}

fn parse_address(s: &str) -> RpcResult<Address> {
    s.parse::<Address>()
        .map_err(|e| rpc_err(-32602, format!("invalid address: {e}")))
}

/// Shared state passed to the RPC server.
pub struct RpcServerState {
    pub db: Arc<StateDb>,
    /// Optional sender to forward incoming transactions to the node's apply loop.
    pub tx_sender: Option<tokio::sync::mpsc::Sender<Transaction>>,
}

impl RpcServerState {
    fn meta(&self) -> RpcResult<LedgerMeta> {
        self.db.require_meta().map_err(internal)
    }
}

/// The RPC server implementation.
pub struct RpcServer {
    state: Arc<RpcServerState>,
}

impl RpcServer {
    pub fn new(state: Arc<RpcServerState>) -> Self {
        Self { state }
    }

    /// Start the JSON-RPC server on `addr`. Returns a handle to stop it.
    pub async fn start(self, addr: SocketAddr) -> anyhow::Result<ServerHandle> {
        let server = Server::builder().build(addr).await?;
        let module = self.into_rpc();
        let handle = server.start(module);
        info!(%addr, "RPC server started");
        Ok(handle)
    }
}

#[async_trait]
impl LifeboatApiServer for RpcServer {
    async fn get_token_info(&self) -> RpcResult<RpcTokenInfo> {
        Ok(RpcTokenInfo::from_meta(&self.state.meta()?))
    }

    async fn get_balance(&self, address: String) -> RpcResult<String> {
        let addr = parse_address(&address)?;
        let acc = self.state.db.get_account(&addr).map_err(internal)?;
        Ok(acc.balance.to_string())
    }

    async fn get_account(&self, address: String) -> RpcResult<RpcAccount> {
        let addr = parse_address(&address)?;
        let acc = self.state.db.get_account(&addr).map_err(internal)?;
        Ok(RpcAccount::from(&acc))
    }

    async fn get_backup_address(&self, address: String) -> RpcResult<Option<String>> {
        let addr = parse_address(&address)?;
        let backup = RecoveryQuery::new(&self.state.db)
            .backup_of(&addr)
            .map_err(internal)?;
        Ok(backup.map(|b| lifeboat_crypto::to_checksum(&b)))
    }

    async fn is_blacklisted(&self, address: String) -> RpcResult<bool> {
        let addr = parse_address(&address)?;
        let acc = self.state.db.get_account(&addr).map_err(internal)?;
        Ok(acc.blacklisted)
    }

    async fn get_allowance(&self, owner: String, spender: String) -> RpcResult<String> {
        let owner = parse_address(&owner)?;
        let spender = parse_address(&spender)?;
        let allowance = self.state.db.get_allowance(&owner, &spender).map_err(internal)?;
        Ok(allowance.to_string())
    }

    async fn get_nonce(&self, address: String) -> RpcResult<u64> {
        let addr = parse_address(&address)?;
        Ok(self.state.db.get_account(&addr).map_err(internal)?.nonce)
    }

    async fn get_recovery_digest(&self, holder: String) -> RpcResult<String> {
        let holder = parse_address(&holder)?;
        let meta = self.state.meta()?;
        let domain = RecoveryDomain::new(meta.chain_id, meta.contract);
        Ok(emergency_transfer_digest(&domain, &holder).to_hex())
    }

    async fn get_events(&self, from_seq: u64, limit: u32) -> RpcResult<Vec<RpcEvent>> {
        let limit = limit.min(MAX_EVENTS_PAGE) as usize;
        let records = self.state.db.iter_events(from_seq, limit).map_err(internal)?;
        Ok(records.iter().map(RpcEvent::from).collect())
    }

    async fn send_transaction(&self, tx_hex: String) -> RpcResult<String> {
        let tx_bytes = hex::decode(tx_hex.trim_start_matches("0x"))
            .map_err(|e| rpc_err(-32602, format!("invalid hex: {e}")))?;

        let tx: Transaction = bincode::deserialize(&tx_bytes)
            .map_err(|e| rpc_err(-32602, format!("invalid transaction encoding: {e}")))?;

        // Reject envelopes that can never apply before they occupy the queue.
        let meta = self.state.meta()?;
        let hash = tx_hash(meta.chain_id, &meta.contract, &tx.body_bytes());
        match recover_signer(&hash, &tx.signature) {
            Ok(signer) if signer == tx.from => {}
            Ok(_) | Err(_) => {
                debug!(tx_hash = %hash, from = %tx.from, "RPC: rejected transaction with bad signature");
                return Err(rpc_err(-32602, "invalid signature"));
            }
        }

        if let Some(sender) = &self.state.tx_sender {
            sender
                .send(tx)
                .await
                .map_err(|_| rpc_err(-32603, "transaction queue closed"))?;
        } else {
            warn!("RPC: sendTransaction called but no tx pipeline configured");
            return Err(rpc_err(-32603, "node tx pipeline not connected"));
        }

        Ok(hash.to_hex())
    }
}
