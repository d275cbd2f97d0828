//! lifeboat-rpc
//!
//! JSON-RPC 2.0 server for Lifeboat ledger nodes.
//!
//! Namespace: "lifeboat"
//! Methods:
//!   lifeboat_getTokenInfo       token parameters and ledger identity
//!   lifeboat_getBalance         balance in base units
//!   lifeboat_getAccount         balance, nonce, backup and blacklist state
//!   lifeboat_getBackupAddress   registered backup, if any
//!   lifeboat_isBlacklisted      blacklist flag
//!   lifeboat_getAllowance       ERC-20 allowance
//!   lifeboat_getNonce           next transaction nonce
//!   lifeboat_getRecoveryDigest  typed-data digest a holder signs for recovery
//!   lifeboat_getEvents          page through the event log
//!   lifeboat_sendTransaction    submit a signed transaction (hex-encoded bincode)

pub mod api;
pub mod server;
pub mod types;

pub use server::RpcServer;
pub use server::RpcServerState;
pub use types::{RpcAccount, RpcEvent, RpcTokenInfo};
