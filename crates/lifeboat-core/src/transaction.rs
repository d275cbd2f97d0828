use serde::{Deserialize, Serialize};

use crate::types::{Address, Balance, Nonce, SignatureParts, TxHash};

// ── Call ──────────────────────────────────────────────────────────────────────

/// Every state-changing entry point of the ledger is one of these variants.
/// The caller is always the transaction's `from`.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum Call {
    // ── Balance ledger ───────────────────────────────────────────────────────

    /// Move `amount` from the caller to `to`.
    Transfer {
        to: Address,
        amount: Balance,
    },

    /// Set the caller's allowance for `spender` to exactly `amount`.
    Approve {
        spender: Address,
        amount: Balance,
    },

    /// Spend the caller's allowance over `owner`'s balance.
    TransferFrom {
        owner: Address,
        to: Address,
        amount: Balance,
    },

    // ── Backup registry ──────────────────────────────────────────────────────

    /// Register (or overwrite) the caller's backup address.
    RegisterBackupAddress {
        backup: Address,
    },

    // ── Recovery protocol ────────────────────────────────────────────────────

    /// Relay `holder`'s signed recovery intent. The caller is the relayer and
    /// is not constrained in any way.
    EmergencyTransfer {
        holder: Address,
        signature: SignatureParts,
    },
}

impl Call {
    /// Short stable name used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            Call::Transfer { .. } => "transfer",
            Call::Approve { .. } => "approve",
            Call::TransferFrom { .. } => "transferFrom",
            Call::RegisterBackupAddress { .. } => "registerBackupAddress",
            Call::EmergencyTransfer { .. } => "emergencyTransfer",
        }
    }
}

// ── Transaction ───────────────────────────────────────────────────────────────

/// A signed call submitted to the ledger.
///
/// The envelope signature covers keccak256(tag || chain id || ledger address
/// || body bytes), so a transaction can only ever be applied to the ledger
/// instance it was signed for.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Transaction {
    /// The account authorizing this call.
    pub from: Address,
    /// Must equal the account's current nonce.
    pub nonce: Nonce,
    pub call: Call,
    /// Recoverable signature by `from` over the transaction hash.
    pub signature: SignatureParts,
}

/// The fields covered by the envelope signature.
#[derive(Serialize)]
pub struct TransactionBody<'a> {
    pub from: &'a Address,
    pub nonce: Nonce,
    pub call: &'a Call,
}

impl Transaction {
    /// Serialize the body to canonical bytes (bincode).
    pub fn body_bytes(&self) -> Vec<u8> {
        body_bytes(&self.from, self.nonce, &self.call)
    }
}

/// Canonical body bytes for a not-yet-signed transaction.
pub fn body_bytes(from: &Address, nonce: Nonce, call: &Call) -> Vec<u8> {
    bincode::serialize(&TransactionBody { from, nonce, call })
        .expect("body serialization is infallible")
}

/// Result of a successfully applied call: the events it emitted, in order.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Receipt {
    /// Hash of the enclosing transaction, if the call arrived as one.
    pub tx_hash: Option<TxHash>,
    pub events: Vec<crate::event::Event>,
}
