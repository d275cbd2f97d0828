//! EIP-712 typed-data hashing for recovery intents.
//!
//! digest = keccak256(0x19 0x01 || domainSeparator || hashStruct(EmergencyTransfer{from}))
//!
//! The domain binds the application name, a version tag, the chain id and the
//! ledger's own address, so a signature made for one deployment or network
//! never verifies against another.

use lifeboat_core::constants::{
    EIP712_DOMAIN_TYPE, EMERGENCY_TRANSFER_TYPE, RECOVERY_DOMAIN_NAME, RECOVERY_DOMAIN_VERSION,
};
use lifeboat_core::types::{Address, ChainId, H256};
use serde::{Deserialize, Serialize};

use crate::hash::keccak256;

/// The signing domain of one ledger instance.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecoveryDomain {
    pub name: String,
    pub version: String,
    pub chain_id: ChainId,
    pub verifying_contract: Address,
}

impl RecoveryDomain {
    /// The standard recovery domain for a ledger at `contract` on `chain_id`.
    pub fn new(chain_id: ChainId, contract: Address) -> Self {
        Self {
            name: RECOVERY_DOMAIN_NAME.to_string(),
            version: RECOVERY_DOMAIN_VERSION.to_string(),
            chain_id,
            verifying_contract: contract,
        }
    }

    pub fn separator(&self) -> [u8; 32] {
        let mut enc = Vec::with_capacity(32 * 5);
        enc.extend_from_slice(&keccak256(EIP712_DOMAIN_TYPE.as_bytes()));
        enc.extend_from_slice(&keccak256(self.name.as_bytes()));
        enc.extend_from_slice(&keccak256(self.version.as_bytes()));
        enc.extend_from_slice(&encode_uint(self.chain_id));
        enc.extend_from_slice(&encode_address(&self.verifying_contract));
        keccak256(&enc)
    }
}

/// hashStruct(EmergencyTransfer { from })
pub fn emergency_transfer_struct_hash(from: &Address) -> [u8; 32] {
    let mut enc = Vec::with_capacity(64);
    enc.extend_from_slice(&keccak256(EMERGENCY_TRANSFER_TYPE.as_bytes()));
    enc.extend_from_slice(&encode_address(from));
    keccak256(&enc)
}

/// The digest a holder signs to authorize recovery of their balance.
pub fn emergency_transfer_digest(domain: &RecoveryDomain, from: &Address) -> H256 {
    let mut msg = Vec::with_capacity(2 + 64);
    msg.extend_from_slice(&[0x19, 0x01]);
    msg.extend_from_slice(&domain.separator());
    msg.extend_from_slice(&emergency_transfer_struct_hash(from));
    H256::from_bytes(keccak256(&msg))
}

// ── ABI word encoding ─────────────────────────────────────────────────────────

fn encode_address(addr: &Address) -> [u8; 32] {
    let mut word = [0u8; 32];
    word[12..].copy_from_slice(addr.as_bytes());
    word
}

fn encode_uint(value: u64) -> [u8; 32] {
    let mut word = [0u8; 32];
    word[24..].copy_from_slice(&value.to_be_bytes());
    word
}
