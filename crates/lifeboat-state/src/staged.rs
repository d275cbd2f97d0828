use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

use lifeboat_core::account::Account;
use lifeboat_core::error::LedgerError;
use lifeboat_core::event::Event;
use lifeboat_core::meta::LedgerMeta;
use lifeboat_core::types::{Address, Balance};

use crate::db::StateDb;

/// All state changes staged by one call before atomic commit.
///
/// Reads go through the overlay first and fall back to the database, so a
/// call always observes its own earlier writes. Dropping the overlay discards
/// every change.
#[derive(Default)]
pub(crate) struct StagedMutations {
    pub accounts: BTreeMap<Address, Account>,
    pub allowances: BTreeMap<(Address, Address), Balance>,
    pub meta: Option<LedgerMeta>,
    pub events: Vec<Event>,
}

impl StagedMutations {
    /// Mutable view of `address`, loaded from `db` on first touch.
    pub fn account(&mut self, db: &StateDb, address: &Address) -> Result<&mut Account, LedgerError> {
        match self.accounts.entry(*address) {
            Entry::Occupied(e) => Ok(e.into_mut()),
            Entry::Vacant(e) => Ok(e.insert(db.get_account(address)?)),
        }
    }

    /// Current (possibly staged) state of `address` without staging it.
    pub fn peek_account(&self, db: &StateDb, address: &Address) -> Result<Account, LedgerError> {
        match self.accounts.get(address) {
            Some(acc) => Ok(acc.clone()),
            None => db.get_account(address),
        }
    }

    pub fn allowance(&self, db: &StateDb, owner: &Address, spender: &Address) -> Result<Balance, LedgerError> {
        match self.allowances.get(&(*owner, *spender)) {
            Some(amount) => Ok(*amount),
            None => db.get_allowance(owner, spender),
        }
    }

    pub fn set_allowance(&mut self, owner: Address, spender: Address, amount: Balance) {
        self.allowances.insert((owner, spender), amount);
    }

    pub fn emit(&mut self, event: Event) {
        self.events.push(event);
    }
}
