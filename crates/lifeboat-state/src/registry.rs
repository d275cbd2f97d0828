//! Backup registry: each account names at most one backup, set only by itself.

use lifeboat_core::error::LedgerError;
use lifeboat_core::event::Event;
use lifeboat_core::types::Address;

use crate::engine::CallContext;

impl CallContext<'_> {
    /// Overwrite `caller`'s backup address. Only current holders may
    /// register; blacklisted holders with a balance may register again so a
    /// repeated recovery can reach the new backup.
    pub(crate) fn register_backup_address(&mut self, caller: &Address, backup: &Address) -> Result<(), LedgerError> {
        let account = self.staged.account(self.db, caller)?;
        if account.balance == 0 {
            return Err(LedgerError::NotTokenHolder(*caller));
        }
        if backup.is_zero() {
            return Err(LedgerError::ZeroAddress);
        }
        account.backup_address = Some(*backup);
        self.staged.emit(Event::BackupAddressRegistered { holder: *caller, backup: *backup });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::testutil::*;
    use lifeboat_core::error::LedgerError;
    use lifeboat_core::event::Event;
    use lifeboat_core::types::Address;

    #[test]
    fn zero_balance_account_cannot_register() {
        let (engine, _) = ledger("registry_not_holder", true);
        let empty = key(2);
        assert!(matches!(
            engine.register_backup_address(&empty.address, &key(3).address),
            Err(LedgerError::NotTokenHolder(a)) if a == empty.address
        ));
        assert_eq!(engine.backup_address_of(&empty.address).unwrap(), None);
        assert!(!engine.db.account_exists(&empty.address).unwrap());
    }

    #[test]
    fn holder_registers_and_reads_back() {
        let (engine, deployer) = ledger("registry_register", true);
        let holder = key(2);
        let backup = key(3);
        engine.transfer(&deployer.address, &holder.address, 1).unwrap();

        let receipt = engine.register_backup_address(&holder.address, &backup.address).unwrap();
        assert_eq!(
            receipt.events,
            vec![Event::BackupAddressRegistered { holder: holder.address, backup: backup.address }]
        );
        assert_eq!(engine.backup_address_of(&holder.address).unwrap(), Some(backup.address));
    }

    #[test]
    fn last_registration_wins() {
        let (engine, deployer) = ledger("registry_overwrite", true);
        engine.register_backup_address(&deployer.address, &key(2).address).unwrap();
        engine.register_backup_address(&deployer.address, &key(3).address).unwrap();
        engine.register_backup_address(&deployer.address, &key(3).address).unwrap();
        assert_eq!(engine.backup_address_of(&deployer.address).unwrap(), Some(key(3).address));
    }

    #[test]
    fn accounts_may_share_a_backup() {
        let (engine, deployer) = ledger("registry_shared", true);
        let a = key(2);
        let b = key(3);
        let shared = key(4);
        engine.transfer(&deployer.address, &a.address, 1).unwrap();
        engine.transfer(&deployer.address, &b.address, 1).unwrap();
        engine.register_backup_address(&a.address, &shared.address).unwrap();
        engine.register_backup_address(&b.address, &shared.address).unwrap();
        assert_eq!(engine.backup_address_of(&a.address).unwrap(), Some(shared.address));
        assert_eq!(engine.backup_address_of(&b.address).unwrap(), Some(shared.address));
    }

    #[test]
    fn zero_backup_rejected() {
        let (engine, deployer) = ledger("registry_zero_backup", true);
        assert!(matches!(
            engine.register_backup_address(&deployer.address, &Address::ZERO),
            Err(LedgerError::ZeroAddress)
        ));
        assert_eq!(engine.backup_address_of(&deployer.address).unwrap(), None);
    }
}
