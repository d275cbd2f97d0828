//! Balance ledger: debit/credit primitives, ERC-20 transfers and allowances,
//! and the blacklist conduit that decides where a credit finally lands.

use std::collections::BTreeSet;

use lifeboat_core::constants::MAX_REDIRECT_HOPS;
use lifeboat_core::error::LedgerError;
use lifeboat_core::event::Event;
use lifeboat_core::types::{Address, Balance};

use crate::engine::CallContext;

impl CallContext<'_> {
    // ── Primitives ───────────────────────────────────────────────────────────

    pub(crate) fn ensure_not_blacklisted(&self, sender: &Address) -> Result<(), LedgerError> {
        if self.staged.peek_account(self.db, sender)?.blacklisted {
            return Err(LedgerError::SenderBlacklisted(*sender));
        }
        Ok(())
    }

    /// Remove `amount` from `from` without consulting the blacklist.
    pub(crate) fn debit(&mut self, from: &Address, amount: Balance) -> Result<(), LedgerError> {
        let account = self.staged.account(self.db, from)?;
        if account.balance < amount {
            return Err(LedgerError::InsufficientBalance {
                need: amount,
                have: account.balance,
            });
        }
        account.balance -= amount;
        Ok(())
    }

    /// Add `amount` to the account a credit for `to` resolves to, returning
    /// that account.
    pub(crate) fn credit(&mut self, to: &Address, amount: Balance) -> Result<Address, LedgerError> {
        let recipient = self.resolve_recipient(to)?;
        let account = self.staged.account(self.db, &recipient)?;
        account.balance = account.balance.checked_add(amount).ok_or(LedgerError::Overflow)?;
        Ok(recipient)
    }

    /// Where a credit addressed to `to` lands.
    ///
    /// With redirection enabled, a blacklisted recipient passes the credit on
    /// to its latest backup, repeatedly, until a non-blacklisted account, a
    /// missing backup, a cycle or `MAX_REDIRECT_HOPS` stops the walk.
    pub(crate) fn resolve_recipient(&self, to: &Address) -> Result<Address, LedgerError> {
        if !self.meta.blacklist_redirect {
            return Ok(*to);
        }
        let mut current = *to;
        let mut visited = BTreeSet::new();
        for _ in 0..MAX_REDIRECT_HOPS {
            let account = self.staged.peek_account(self.db, &current)?;
            if !account.blacklisted {
                break;
            }
            visited.insert(current);
            match account.backup_address {
                Some(next) if !visited.contains(&next) => current = next,
                _ => break,
            }
        }
        Ok(current)
    }

    // ── Initial issuance ─────────────────────────────────────────────────────

    pub(crate) fn credit_initial_supply(&mut self) -> Result<(), LedgerError> {
        let deployer = self.meta.deployer;
        let supply = self.meta.total_supply;
        if deployer.is_zero() {
            return Err(LedgerError::ZeroAddress);
        }
        let to = self.credit(&deployer, supply)?;
        self.staged.emit(Event::Transfer { from: Address::ZERO, to, amount: supply });
        Ok(())
    }

    // ── ERC-20 surface ───────────────────────────────────────────────────────

    pub(crate) fn transfer(&mut self, from: &Address, to: &Address, amount: Balance) -> Result<(), LedgerError> {
        self.ensure_not_blacklisted(from)?;
        if to.is_zero() {
            return Err(LedgerError::ZeroAddress);
        }
        self.debit(from, amount)?;
        let recipient = self.credit(to, amount)?;
        self.staged.emit(Event::Transfer { from: *from, to: recipient, amount });
        Ok(())
    }

    pub(crate) fn approve(&mut self, owner: &Address, spender: &Address, amount: Balance) -> Result<(), LedgerError> {
        if spender.is_zero() {
            return Err(LedgerError::ZeroAddress);
        }
        self.staged.set_allowance(*owner, *spender, amount);
        self.staged.emit(Event::Approval { owner: *owner, spender: *spender, amount });
        Ok(())
    }

    /// Move `owner`'s funds using `spender`'s allowance. An allowance of
    /// `Balance::MAX` is never decremented.
    pub(crate) fn transfer_from(
        &mut self,
        spender: &Address,
        owner: &Address,
        to: &Address,
        amount: Balance,
    ) -> Result<(), LedgerError> {
        self.ensure_not_blacklisted(owner)?;
        if to.is_zero() {
            return Err(LedgerError::ZeroAddress);
        }
        let allowed = self.staged.allowance(self.db, owner, spender)?;
        if allowed < amount {
            return Err(LedgerError::InsufficientAllowance { need: amount, have: allowed });
        }
        self.debit(owner, amount)?;
        let recipient = self.credit(to, amount)?;
        if allowed != Balance::MAX {
            self.staged.set_allowance(*owner, *spender, allowed - amount);
        }
        self.staged.emit(Event::Transfer { from: *owner, to: recipient, amount });
        Ok(())
    }
}
