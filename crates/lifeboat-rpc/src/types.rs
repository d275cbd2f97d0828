use std::collections::BTreeMap;

use lifeboat_core::account::{Account, RecoveryStatus};
use lifeboat_core::event::{Event, EventRecord};
use lifeboat_core::meta::LedgerMeta;
use lifeboat_crypto::hash::to_checksum;
use lifeboat_crypto::RecoveryDomain;
use serde::{Deserialize, Serialize};

/// Token parameters and ledger identity returned by `lifeboat_getTokenInfo`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RpcTokenInfo {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
    /// u128 as decimal string.
    pub total_supply: String,
    pub chain_id: u64,
    /// EIP-55 checksummed ledger address.
    pub contract: String,
    pub deployer: String,
    pub blacklist_redirect: bool,
    /// Recovery signing domain name and version.
    pub domain_name: String,
    pub domain_version: String,
    /// 0x-prefixed EIP-712 domain separator.
    pub domain_separator: String,
}

impl RpcTokenInfo {
    pub fn from_meta(meta: &LedgerMeta) -> Self {
        let domain = RecoveryDomain::new(meta.chain_id, meta.contract);
        Self {
            name: meta.name.clone(),
            symbol: meta.symbol.clone(),
            decimals: meta.decimals,
            total_supply: meta.total_supply.to_string(),
            chain_id: meta.chain_id,
            contract: to_checksum(&meta.contract),
            deployer: to_checksum(&meta.deployer),
            blacklist_redirect: meta.blacklist_redirect,
            domain_separator: format!("0x{}", hex::encode(domain.separator())),
            domain_name: domain.name,
            domain_version: domain.version,
        }
    }
}

/// JSON-serializable account summary returned by `lifeboat_getAccount`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RpcAccount {
    pub address: String,
    /// u128 as decimal string.
    pub balance: String,
    pub nonce: u64,
    pub backup_address: Option<String>,
    pub blacklisted: bool,
    /// "Active" or "Blacklisted".
    pub status: String,
}

impl From<&Account> for RpcAccount {
    fn from(acc: &Account) -> Self {
        let status = match acc.recovery_status() {
            RecoveryStatus::Active => "Active",
            RecoveryStatus::Blacklisted => "Blacklisted",
        };
        Self {
            address: to_checksum(&acc.address),
            balance: acc.balance.to_string(),
            nonce: acc.nonce,
            backup_address: acc.backup_address.as_ref().map(to_checksum),
            blacklisted: acc.blacklisted,
            status: status.to_string(),
        }
    }
}

/// One logged event. `fields` holds the event's parties and amount, all as
/// strings (checksummed addresses, decimal amounts).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RpcEvent {
    pub seq: u64,
    pub tx_hash: Option<String>,
    pub applied_at: i64,
    pub name: String,
    pub fields: BTreeMap<String, String>,
}

impl From<&EventRecord> for RpcEvent {
    fn from(record: &EventRecord) -> Self {
        let mut fields = BTreeMap::new();
        let mut put = |k: &str, v: String| {
            fields.insert(k.to_string(), v);
        };
        match &record.event {
            Event::Transfer { from, to, amount } => {
                put("from", to_checksum(from));
                put("to", to_checksum(to));
                put("amount", amount.to_string());
            }
            Event::Approval { owner, spender, amount } => {
                put("owner", to_checksum(owner));
                put("spender", to_checksum(spender));
                put("amount", amount.to_string());
            }
            Event::BackupAddressRegistered { holder, backup } => {
                put("holder", to_checksum(holder));
                put("backup", to_checksum(backup));
            }
            Event::EmergencyTransfer { relayer, holder, backup, amount } => {
                put("relayer", to_checksum(relayer));
                put("holder", to_checksum(holder));
                put("backup", to_checksum(backup));
                put("amount", amount.to_string());
            }
        }
        Self {
            seq: record.seq,
            tx_hash: record.tx_hash.map(|h| h.to_hex()),
            applied_at: record.applied_at,
            name: record.event.name().to_string(),
            fields,
        }
    }
}
