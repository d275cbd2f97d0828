use std::path::Path;

use lifeboat_core::account::Account;
use lifeboat_core::error::LedgerError;
use lifeboat_core::event::EventRecord;
use lifeboat_core::meta::LedgerMeta;
use lifeboat_core::types::{Address, Balance};
use sled::transaction::{ConflictableTransactionResult, TransactionError};
use sled::Transactional;

use crate::staged::StagedMutations;

const META_KEY: &[u8] = b"ledger";
const NEXT_EVENT_SEQ_KEY: &[u8] = b"next_event_seq";

fn storage(e: sled::Error) -> LedgerError {
    LedgerError::Storage(e.to_string())
}

fn encode<T: serde::Serialize>(value: &T) -> Result<Vec<u8>, LedgerError> {
    bincode::serialize(value).map_err(|e| LedgerError::Serialization(e.to_string()))
}

fn decode<T: serde::de::DeserializeOwned>(bytes: &[u8]) -> Result<T, LedgerError> {
    bincode::deserialize(bytes).map_err(|e| LedgerError::Serialization(e.to_string()))
}

fn allowance_key(owner: &Address, spender: &Address) -> [u8; 40] {
    let mut key = [0u8; 40];
    key[..20].copy_from_slice(owner.as_bytes());
    key[20..].copy_from_slice(spender.as_bytes());
    key
}

/// Persistent ledger database backed by sled.
///
/// Named trees:
///   accounts    Address bytes            → bincode(Account)
///   allowances  owner ‖ spender bytes    → u128 big-endian (absent when zero)
///   events      seq (u64 big-endian)     → bincode(EventRecord)
///   meta        "ledger"                 → bincode(LedgerMeta)
///               "next_event_seq"         → u64 big-endian
pub struct StateDb {
    db: sled::Db,
    accounts: sled::Tree,
    allowances: sled::Tree,
    events: sled::Tree,
    meta: sled::Tree,
}

impl StateDb {
    /// Open or create the ledger database at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, LedgerError> {
        let db = sled::open(path).map_err(storage)?;
        let accounts = db.open_tree("accounts").map_err(storage)?;
        let allowances = db.open_tree("allowances").map_err(storage)?;
        let events = db.open_tree("events").map_err(storage)?;
        let meta = db.open_tree("meta").map_err(storage)?;
        Ok(Self { db, accounts, allowances, events, meta })
    }

    // ── Accounts ─────────────────────────────────────────────────────────────

    /// Account state for `address`; unknown addresses yield the empty account.
    pub fn get_account(&self, address: &Address) -> Result<Account, LedgerError> {
        match self.accounts.get(address.as_bytes()).map_err(storage)? {
            Some(bytes) => decode(&bytes),
            None => Ok(Account::new(*address)),
        }
    }

    pub fn account_exists(&self, address: &Address) -> Result<bool, LedgerError> {
        self.accounts.contains_key(address.as_bytes()).map_err(storage)
    }

    /// All persisted accounts, in address order.
    pub fn iter_accounts(&self) -> Result<Vec<Account>, LedgerError> {
        let mut out = Vec::new();
        for item in self.accounts.iter() {
            let (_, bytes) = item.map_err(storage)?;
            out.push(decode(&bytes)?);
        }
        Ok(out)
    }

    /// Sum of every persisted balance.
    pub fn total_balance(&self) -> Result<Balance, LedgerError> {
        self.iter_accounts()?
            .iter()
            .try_fold(0u128, |acc, a| acc.checked_add(a.balance).ok_or(LedgerError::Overflow))
    }

    // ── Allowances ───────────────────────────────────────────────────────────

    pub fn get_allowance(&self, owner: &Address, spender: &Address) -> Result<Balance, LedgerError> {
        match self.allowances.get(allowance_key(owner, spender)).map_err(storage)? {
            Some(bytes) => {
                let arr: [u8; 16] = bytes[..]
                    .try_into()
                    .map_err(|_| LedgerError::Serialization("allowance is not 16 bytes".into()))?;
                Ok(u128::from_be_bytes(arr))
            }
            None => Ok(0),
        }
    }

    // ── Meta ─────────────────────────────────────────────────────────────────

    pub fn get_meta(&self) -> Result<Option<LedgerMeta>, LedgerError> {
        match self.meta.get(META_KEY).map_err(storage)? {
            Some(bytes) => Ok(Some(decode(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Ledger parameters, or `NotInitialized` before genesis.
    pub fn require_meta(&self) -> Result<LedgerMeta, LedgerError> {
        self.get_meta()?.ok_or(LedgerError::NotInitialized)
    }

    // ── Events ───────────────────────────────────────────────────────────────

    /// Sequence number the next appended event will receive.
    pub fn next_event_seq(&self) -> Result<u64, LedgerError> {
        match self.meta.get(NEXT_EVENT_SEQ_KEY).map_err(storage)? {
            Some(bytes) => {
                let arr: [u8; 8] = bytes[..]
                    .try_into()
                    .map_err(|_| LedgerError::Serialization("event seq is not 8 bytes".into()))?;
                Ok(u64::from_be_bytes(arr))
            }
            None => Ok(0),
        }
    }

    pub fn get_event(&self, seq: u64) -> Result<Option<EventRecord>, LedgerError> {
        match self.events.get(seq.to_be_bytes()).map_err(storage)? {
            Some(bytes) => Ok(Some(decode(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Up to `limit` events starting at sequence number `from_seq`.
    pub fn iter_events(&self, from_seq: u64, limit: usize) -> Result<Vec<EventRecord>, LedgerError> {
        let mut out = Vec::new();
        for item in self.events.range(from_seq.to_be_bytes()..).take(limit) {
            let (_, bytes) = item.map_err(storage)?;
            out.push(decode(&bytes)?);
        }
        Ok(out)
    }

    // ── Commit ───────────────────────────────────────────────────────────────

    /// Write every staged mutation in one sled transaction across all trees.
    /// Either all of them become visible or none do.
    pub(crate) fn commit(&self, staged: &StagedMutations, records: &[EventRecord]) -> Result<(), LedgerError> {
        let mut account_writes: Vec<([u8; 20], Option<Vec<u8>>)> = Vec::new();
        for (address, account) in &staged.accounts {
            let value = if account.is_empty() { None } else { Some(encode(account)?) };
            account_writes.push((*address.as_bytes(), value));
        }
        let allowance_writes: Vec<([u8; 40], Option<[u8; 16]>)> = staged
            .allowances
            .iter()
            .map(|((owner, spender), amount)| {
                let value = (*amount != 0).then(|| amount.to_be_bytes());
                (allowance_key(owner, spender), value)
            })
            .collect();
        let mut event_writes: Vec<([u8; 8], Vec<u8>)> = Vec::with_capacity(records.len());
        for record in records {
            event_writes.push((record.seq.to_be_bytes(), encode(record)?));
        }
        let next_seq = records.last().map(|r| r.seq + 1);
        let meta_write = match &staged.meta {
            Some(meta) => Some(encode(meta)?),
            None => None,
        };

        (&self.accounts, &self.allowances, &self.events, &self.meta)
            .transaction(
                |(accounts, allowances, events, meta)| -> ConflictableTransactionResult<(), LedgerError> {
                    for (key, value) in &account_writes {
                        match value {
                            Some(bytes) => {
                                accounts.insert(&key[..], bytes.as_slice())?;
                            }
                            None => {
                                accounts.remove(&key[..])?;
                            }
                        }
                    }
                    for (key, value) in &allowance_writes {
                        match value {
                            Some(bytes) => {
                                allowances.insert(&key[..], &bytes[..])?;
                            }
                            None => {
                                allowances.remove(&key[..])?;
                            }
                        }
                    }
                    for (key, bytes) in &event_writes {
                        events.insert(&key[..], bytes.as_slice())?;
                    }
                    if let Some(seq) = next_seq {
                        meta.insert(NEXT_EVENT_SEQ_KEY, &seq.to_be_bytes()[..])?;
                    }
                    if let Some(bytes) = &meta_write {
                        meta.insert(META_KEY, bytes.as_slice())?;
                    }
                    Ok(())
                },
            )
            .map_err(|e| match e {
                TransactionError::Abort(err) => err,
                TransactionError::Storage(err) => storage(err),
            })
    }

    /// Flush all pending writes to disk.
    pub fn flush(&self) -> Result<(), LedgerError> {
        self.db.flush().map_err(storage)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lifeboat_core::event::Event;

    fn temp_db(name: &str) -> StateDb {
        let dir = std::env::temp_dir().join(format!("lifeboat_db_test_{}", name));
        let _ = std::fs::remove_dir_all(&dir);
        StateDb::open(&dir).expect("open temp db")
    }

    fn addr(b: u8) -> Address {
        Address([b; 20])
    }

    #[test]
    fn unknown_account_is_empty_default() {
        let db = temp_db("unknown_account");
        let acc = db.get_account(&addr(1)).unwrap();
        assert_eq!(acc, Account::new(addr(1)));
        assert!(!db.account_exists(&addr(1)).unwrap());
    }

    #[test]
    fn commit_writes_all_trees() {
        let db = temp_db("commit_all");
        let mut staged = StagedMutations::default();
        let mut acc = Account::new(addr(1));
        acc.balance = 500;
        staged.accounts.insert(addr(1), acc.clone());
        staged.allowances.insert((addr(1), addr(2)), 42);
        let record = EventRecord {
            seq: 0,
            tx_hash: None,
            applied_at: 0,
            event: Event::Transfer { from: Address::ZERO, to: addr(1), amount: 500 },
        };
        db.commit(&staged, std::slice::from_ref(&record)).unwrap();

        assert_eq!(db.get_account(&addr(1)).unwrap(), acc);
        assert_eq!(db.get_allowance(&addr(1), &addr(2)).unwrap(), 42);
        assert_eq!(db.get_allowance(&addr(2), &addr(1)).unwrap(), 0);
        assert_eq!(db.get_event(0).unwrap(), Some(record));
        assert_eq!(db.next_event_seq().unwrap(), 1);
        assert_eq!(db.total_balance().unwrap(), 500);
    }

    #[test]
    fn empty_accounts_are_not_persisted() {
        let db = temp_db("empty_accounts");
        let mut staged = StagedMutations::default();
        staged.accounts.insert(addr(3), Account::new(addr(3)));
        db.commit(&staged, &[]).unwrap();
        assert!(!db.account_exists(&addr(3)).unwrap());
        assert!(db.iter_accounts().unwrap().is_empty());
    }

    #[test]
    fn zero_allowance_removes_key() {
        let db = temp_db("zero_allowance");
        let mut staged = StagedMutations::default();
        staged.allowances.insert((addr(1), addr(2)), 42);
        db.commit(&staged, &[]).unwrap();
        assert_eq!(db.allowances.len(), 1);

        let mut staged = StagedMutations::default();
        staged.allowances.insert((addr(1), addr(2)), 0);
        db.commit(&staged, &[]).unwrap();
        assert_eq!(db.get_allowance(&addr(1), &addr(2)).unwrap(), 0);
        assert!(!db.allowances.contains_key(allowance_key(&addr(1), &addr(2))).unwrap());
        assert!(db.allowances.is_empty());
    }

    #[test]
    fn iter_events_pages_in_order() {
        let db = temp_db("iter_events");
        let records: Vec<EventRecord> = (0..5)
            .map(|seq| EventRecord {
                seq,
                tx_hash: None,
                applied_at: 0,
                event: Event::Approval { owner: addr(1), spender: addr(2), amount: seq as u128 },
            })
            .collect();
        db.commit(&StagedMutations::default(), &records).unwrap();

        let page = db.iter_events(1, 2).unwrap();
        assert_eq!(page.iter().map(|r| r.seq).collect::<Vec<_>>(), vec![1, 2]);
        assert_eq!(db.iter_events(4, 10).unwrap().len(), 1);
        assert!(db.iter_events(5, 10).unwrap().is_empty());
        assert_eq!(db.next_event_seq().unwrap(), 5);
    }

    #[test]
    fn meta_absent_until_committed() {
        let db = temp_db("meta_absent");
        assert!(db.get_meta().unwrap().is_none());
        assert!(matches!(db.require_meta(), Err(LedgerError::NotInitialized)));
    }
}
