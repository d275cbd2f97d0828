//! Recovery protocol: a relayed, holder-signed evacuation of the whole
//! balance to the registered backup, followed by permanent blacklisting.

use lifeboat_core::error::LedgerError;
use lifeboat_core::event::Event;
use lifeboat_core::types::{Address, SignatureParts};
use lifeboat_crypto::{emergency_transfer_digest, recover_signer, RecoveryDomain};
use tracing::debug;

use crate::engine::CallContext;

impl CallContext<'_> {
    /// Execute `holder`'s recovery on behalf of any `relayer`.
    ///
    /// Authentication, the backup lookup, the fund move and the blacklist flag
    /// are staged together. Repeating a recovery for an already blacklisted
    /// holder moves whatever balance is left, which may be zero.
    pub(crate) fn emergency_transfer(
        &mut self,
        relayer: &Address,
        holder: &Address,
        signature: &SignatureParts,
    ) -> Result<(), LedgerError> {
        let domain = RecoveryDomain::new(self.meta.chain_id, self.meta.contract);
        let digest = emergency_transfer_digest(&domain, holder);
        let signer = recover_signer(&digest, signature).map_err(|e| {
            debug!(holder = %holder, error = %e, "recovery signature rejected");
            LedgerError::InvalidSignature
        })?;
        if signer != *holder {
            debug!(holder = %holder, signer = %signer, "recovery signed by another key");
            return Err(LedgerError::InvalidSignature);
        }

        let account = self.staged.peek_account(self.db, holder)?;
        let backup = account
            .backup_address
            .ok_or(LedgerError::NoBackupRegistered(*holder))?;
        let amount = account.balance;

        // Bypasses the blacklist gate: this move is what sets the flag.
        self.debit(holder, amount)?;
        let recipient = self.credit(&backup, amount)?;
        self.staged.account(self.db, holder)?.blacklisted = true;

        self.staged.emit(Event::Transfer { from: *holder, to: recipient, amount });
        self.staged.emit(Event::EmergencyTransfer {
            relayer: *relayer,
            holder: *holder,
            backup,
            amount,
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::testutil::*;
    use lifeboat_core::account::RecoveryStatus;
    use lifeboat_core::error::LedgerError;
    use lifeboat_core::event::Event;
    use lifeboat_core::types::Address;
    use lifeboat_crypto::{emergency_transfer_digest, RecoveryDomain};

    #[test]
    fn recovery_moves_full_balance_and_blacklists() {
        let (engine, deployer) = ledger("recovery_correct", true);
        let holder = key(2);
        let backup = key(3);
        let relayer = key(4);
        engine.transfer(&deployer.address, &holder.address, 10_000).unwrap();
        engine.transfer(&deployer.address, &backup.address, 5).unwrap();
        engine.register_backup_address(&holder.address, &backup.address).unwrap();

        let sig = sign_recovery(&engine, &holder);
        let receipt = engine.emergency_transfer(&relayer.address, &holder.address, &sig).unwrap();

        let recoveries: Vec<_> = receipt
            .events
            .iter()
            .filter(|e| matches!(e, Event::EmergencyTransfer { .. }))
            .collect();
        assert_eq!(
            recoveries,
            vec![&Event::EmergencyTransfer {
                relayer: relayer.address,
                holder: holder.address,
                backup: backup.address,
                amount: 10_000,
            }]
        );
        assert_eq!(engine.balance_of(&holder.address).unwrap(), 0);
        assert_eq!(engine.balance_of(&backup.address).unwrap(), 10_005);
        assert!(engine.is_blacklisted(&holder.address).unwrap());
        assert_eq!(
            engine.account(&holder.address).unwrap().recovery_status(),
            RecoveryStatus::Blacklisted
        );
        assert_conserved(&engine);
    }

    #[test]
    fn signature_made_before_registration_still_valid() {
        let (engine, deployer) = ledger("recovery_presigned", true);
        let holder = key(2);
        let backup = key(3);
        engine.transfer(&deployer.address, &holder.address, 77).unwrap();
        let sig = sign_recovery(&engine, &holder);
        engine.register_backup_address(&holder.address, &backup.address).unwrap();

        engine.emergency_transfer(&key(4).address, &holder.address, &sig).unwrap();
        assert_eq!(engine.balance_of(&backup.address).unwrap(), 77);
    }

    #[test]
    fn signature_by_other_signer_rejected() {
        let (engine, deployer) = ledger("recovery_wrong_signer", true);
        let holder = key(2);
        let other = key(3);
        engine.transfer(&deployer.address, &holder.address, 100).unwrap();
        engine.register_backup_address(&holder.address, &key(4).address).unwrap();

        // `other` signs its own intent; presented as the holder's it must fail.
        let sig = sign_recovery(&engine, &other);
        assert!(matches!(
            engine.emergency_transfer(&other.address, &holder.address, &sig),
            Err(LedgerError::InvalidSignature)
        ));
        assert_eq!(engine.balance_of(&holder.address).unwrap(), 100);
        assert!(!engine.is_blacklisted(&holder.address).unwrap());
    }

    #[test]
    fn signature_for_other_ledger_rejected() {
        let (engine, deployer) = ledger("recovery_other_ledger", true);
        let holder = key(2);
        engine.transfer(&deployer.address, &holder.address, 100).unwrap();
        engine.register_backup_address(&holder.address, &key(3).address).unwrap();
        let meta = engine.meta().unwrap();

        let other_contract = RecoveryDomain::new(meta.chain_id, Address([0x42; 20]));
        let other_chain = RecoveryDomain::new(meta.chain_id + 1, meta.contract);
        for domain in [other_contract, other_chain] {
            let digest = emergency_transfer_digest(&domain, &holder.address);
            let sig = holder.sign_digest(&digest).unwrap();
            assert!(matches!(
                engine.emergency_transfer(&key(4).address, &holder.address, &sig),
                Err(LedgerError::InvalidSignature)
            ));
        }
        assert_eq!(engine.balance_of(&holder.address).unwrap(), 100);
    }

    #[test]
    fn malformed_signature_rejected() {
        let (engine, deployer) = ledger("recovery_malformed", true);
        let holder = key(2);
        engine.transfer(&deployer.address, &holder.address, 100).unwrap();
        engine.register_backup_address(&holder.address, &key(3).address).unwrap();

        let mut sig = sign_recovery(&engine, &holder);
        sig.v = 5;
        assert!(matches!(
            engine.emergency_transfer(&key(4).address, &holder.address, &sig),
            Err(LedgerError::InvalidSignature)
        ));
    }

    #[test]
    fn recovery_without_backup_fails() {
        let (engine, deployer) = ledger("recovery_no_backup", true);
        let holder = key(2);
        engine.transfer(&deployer.address, &holder.address, 100).unwrap();
        let seq_before = engine.db.next_event_seq().unwrap();

        let sig = sign_recovery(&engine, &holder);
        assert!(matches!(
            engine.emergency_transfer(&key(4).address, &holder.address, &sig),
            Err(LedgerError::NoBackupRegistered(a)) if a == holder.address
        ));
        assert_eq!(engine.balance_of(&holder.address).unwrap(), 100);
        assert!(!engine.is_blacklisted(&holder.address).unwrap());
        assert_eq!(engine.db.next_event_seq().unwrap(), seq_before);
    }

    #[test]
    fn blacklisted_sender_rejected_regardless_of_amount() {
        let (engine, deployer) = ledger("recovery_post_blacklist", true);
        let holder = key(2);
        let backup = key(3);
        engine.transfer(&deployer.address, &holder.address, 100).unwrap();
        recover(&engine, &holder, &backup, &key(4));

        for amount in [0u128, 1, 100] {
            assert!(matches!(
                engine.transfer(&holder.address, &deployer.address, amount),
                Err(LedgerError::SenderBlacklisted(a)) if a == holder.address
            ));
        }
    }

    #[test]
    fn stranded_credit_to_blacklisted_holder() {
        let (engine, deployer) = ledger("recovery_stranded", false);
        let holder = key(2);
        let backup = key(3);
        let fresh_backup = key(5);
        engine.transfer(&deployer.address, &holder.address, 1_000).unwrap();
        recover(&engine, &holder, &backup, &key(4));

        engine.transfer(&deployer.address, &holder.address, 100).unwrap();
        assert_eq!(engine.balance_of(&holder.address).unwrap(), 100);
        assert!(matches!(
            engine.transfer(&holder.address, &key(6).address, 100),
            Err(LedgerError::SenderBlacklisted(_))
        ));
        assert_eq!(engine.balance_of(&holder.address).unwrap(), 100);

        // A fresh backup plus a repeated recovery releases the stranded funds.
        engine.register_backup_address(&holder.address, &fresh_backup.address).unwrap();
        let sig = sign_recovery(&engine, &holder);
        engine.emergency_transfer(&key(4).address, &holder.address, &sig).unwrap();
        assert_eq!(engine.balance_of(&holder.address).unwrap(), 0);
        assert_eq!(engine.balance_of(&fresh_backup.address).unwrap(), 100);
        assert_eq!(engine.balance_of(&backup.address).unwrap(), 1_000);
        assert_conserved(&engine);
    }

    #[test]
    fn repeated_recovery_moves_zero() {
        let (engine, deployer) = ledger("recovery_idempotent", true);
        let holder = key(2);
        let backup = key(3);
        let relayer = key(4);
        engine.transfer(&deployer.address, &holder.address, 300).unwrap();
        engine.register_backup_address(&holder.address, &backup.address).unwrap();
        let sig = sign_recovery(&engine, &holder);
        engine.emergency_transfer(&relayer.address, &holder.address, &sig).unwrap();

        let again = engine.emergency_transfer(&relayer.address, &holder.address, &sig).unwrap();
        assert_eq!(
            again.events,
            vec![
                Event::Transfer { from: holder.address, to: backup.address, amount: 0 },
                Event::EmergencyTransfer {
                    relayer: relayer.address,
                    holder: holder.address,
                    backup: backup.address,
                    amount: 0,
                },
            ]
        );
        assert_eq!(engine.balance_of(&backup.address).unwrap(), 300);
        assert!(engine.is_blacklisted(&holder.address).unwrap());
        assert_conserved(&engine);
    }

    #[test]
    fn recovery_into_blacklisted_backup_follows_conduit() {
        let (engine, deployer) = ledger("recovery_conduit", true);
        let holder = key(2);
        let backup = key(3);
        let final_backup = key(4);
        let relayer = key(5);
        engine.transfer(&deployer.address, &backup.address, 1).unwrap();
        recover(&engine, &backup, &final_backup, &relayer);

        engine.transfer(&deployer.address, &holder.address, 60).unwrap();
        engine.register_backup_address(&holder.address, &backup.address).unwrap();
        let receipt = engine
            .emergency_transfer(&relayer.address, &holder.address, &sign_recovery(&engine, &holder))
            .unwrap();

        assert_eq!(
            receipt.events[0],
            Event::Transfer { from: holder.address, to: final_backup.address, amount: 60 }
        );
        assert_eq!(
            receipt.events[1],
            Event::EmergencyTransfer {
                relayer: relayer.address,
                holder: holder.address,
                backup: backup.address,
                amount: 60,
            }
        );
        assert_eq!(engine.balance_of(&final_backup.address).unwrap(), 61);
        assert_conserved(&engine);
    }
}
