use serde::{Deserialize, Serialize};

use crate::types::{Address, Balance, Nonce};

// ── RecoveryStatus ────────────────────────────────────────────────────────────

/// Recovery state of a single account.
///
/// `Active → Blacklisted` is the only transition, taken by a successful
/// emergency transfer. `Blacklisted` is terminal.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum RecoveryStatus {
    Active,
    Blacklisted,
}

// ── Account ───────────────────────────────────────────────────────────────────

/// Full account state as stored in the state DB.
///
/// Accounts are never created explicitly: a lookup of an unknown address
/// yields `Account::new(address)`, and the record is persisted the first time
/// any field changes.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Account {
    pub address: Address,
    pub balance: Balance,
    /// Next expected transaction nonce.
    pub nonce: Nonce,
    /// Where recovered funds go. Only the account itself may set it.
    pub backup_address: Option<Address>,
    /// Set once by a successful emergency transfer; never cleared.
    pub blacklisted: bool,
}

impl Account {
    pub fn new(address: Address) -> Self {
        Self {
            address,
            balance: 0,
            nonce: 0,
            backup_address: None,
            blacklisted: false,
        }
    }

    pub fn recovery_status(&self) -> RecoveryStatus {
        if self.blacklisted {
            RecoveryStatus::Blacklisted
        } else {
            RecoveryStatus::Active
        }
    }

    /// True if the record carries nothing beyond the implicit defaults.
    pub fn is_empty(&self) -> bool {
        self.balance == 0 && self.nonce == 0 && self.backup_address.is_none() && !self.blacklisted
    }
}
