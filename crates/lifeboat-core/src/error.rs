use thiserror::Error;

use crate::types::Address;

#[derive(Debug, Error)]
pub enum LedgerError {
    // ── Balance ledger ───────────────────────────────────────────────────────
    #[error("insufficient balance: need {need}, have {have}")]
    InsufficientBalance { need: u128, have: u128 },

    #[error("sender {0} is blacklisted")]
    SenderBlacklisted(Address),

    #[error("insufficient allowance: need {need}, have {have}")]
    InsufficientAllowance { need: u128, have: u128 },

    #[error("zero address not allowed")]
    ZeroAddress,

    #[error("arithmetic overflow")]
    Overflow,

    // ── Backup registry ──────────────────────────────────────────────────────
    #[error("not token holder: {0}")]
    NotTokenHolder(Address),

    // ── Recovery protocol ────────────────────────────────────────────────────
    #[error("invalid signature")]
    InvalidSignature,

    #[error("no backup address registered for {0}")]
    NoBackupRegistered(Address),

    // ── Transaction envelope ─────────────────────────────────────────────────
    #[error("invalid nonce: expected {expected}, got {got}")]
    InvalidNonce { expected: u64, got: u64 },

    // ── Initialization ───────────────────────────────────────────────────────
    #[error("ledger already initialized")]
    AlreadyInitialized,

    #[error("ledger not initialized")]
    NotInitialized,

    // ── Serialization / storage ──────────────────────────────────────────────
    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("storage error: {0}")]
    Storage(String),
}
