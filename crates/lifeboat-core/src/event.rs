use serde::{Deserialize, Serialize};

use crate::types::{Address, Balance, Timestamp, TxHash};

/// Observable notification emitted by a call.
///
/// Events are accumulated while a call is staged and only become visible
/// (persisted, returned, broadcast) after all of the call's state mutations
/// have been committed.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum Event {
    /// Any balance movement. The initial supply is a transfer from
    /// `Address::ZERO`; a redirected credit names the final recipient.
    Transfer {
        from: Address,
        to: Address,
        amount: Balance,
    },

    Approval {
        owner: Address,
        spender: Address,
        amount: Balance,
    },

    BackupAddressRegistered {
        holder: Address,
        backup: Address,
    },

    /// A relayed recovery executed: `amount` left `holder` for `backup` and
    /// `holder` is now blacklisted.
    EmergencyTransfer {
        relayer: Address,
        holder: Address,
        backup: Address,
        amount: Balance,
    },
}

impl Event {
    pub fn name(&self) -> &'static str {
        match self {
            Event::Transfer { .. } => "Transfer",
            Event::Approval { .. } => "Approval",
            Event::BackupAddressRegistered { .. } => "BackupAddressRegistered",
            Event::EmergencyTransfer { .. } => "EmergencyTransfer",
        }
    }
}

/// An event as stored in the append-only audit log.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct EventRecord {
    /// Position in the log, starting at 0.
    pub seq: u64,
    /// Transaction that emitted the event; `None` for genesis and direct calls.
    pub tx_hash: Option<TxHash>,
    pub applied_at: Timestamp,
    pub event: Event,
}
