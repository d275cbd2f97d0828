use lifeboat_core::account::RecoveryStatus;
use lifeboat_core::error::LedgerError;
use lifeboat_core::types::Address;
use lifeboat_state::StateDb;

/// Query helpers for the recovery state machine.
pub struct RecoveryQuery<'a> {
    db: &'a StateDb,
}

impl<'a> RecoveryQuery<'a> {
    pub fn new(db: &'a StateDb) -> Self {
        Self { db }
    }

    pub fn status(&self, account: &Address) -> Result<RecoveryStatus, LedgerError> {
        Ok(self.db.get_account(account)?.recovery_status())
    }

    pub fn backup_of(&self, account: &Address) -> Result<Option<Address>, LedgerError> {
        Ok(self.db.get_account(account)?.backup_address)
    }

    /// Returns true if a validly signed emergency transfer for `account`
    /// would execute now, i.e. a backup is on file.
    pub fn can_recover(&self, account: &Address) -> Result<bool, LedgerError> {
        Ok(self.db.get_account(account)?.backup_address.is_some())
    }

    /// Returns a human-readable summary of an account's recovery state.
    pub fn describe(&self, account: &Address) -> Result<String, LedgerError> {
        let acc = self.db.get_account(account)?;
        let backup = match acc.backup_address {
            Some(b) => b.to_hex(),
            None => "none".to_string(),
        };
        let status = match acc.recovery_status() {
            RecoveryStatus::Active => "active",
            RecoveryStatus::Blacklisted => "BLACKLISTED",
        };
        Ok(format!(
            "Account {}: {} | backup {} | balance {}",
            account, status, backup, acc.balance
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use lifeboat_core::meta::LedgerMeta;
    use lifeboat_crypto::{contract_address, KeyPair};
    use lifeboat_state::StateEngine;

    use crate::signer::sign_emergency_transfer;

    fn temp_engine(name: &str) -> (StateEngine, KeyPair) {
        let dir = std::env::temp_dir().join(format!("lifeboat_recovery_test_{}", name));
        let _ = std::fs::remove_dir_all(&dir);
        let engine = StateEngine::new(Arc::new(StateDb::open(&dir).expect("open temp db")));
        let deployer = KeyPair::generate();
        engine
            .initialize(LedgerMeta {
                name: "Token".into(),
                symbol: "TOKEN".into(),
                decimals: 18,
                total_supply: 1_000_000,
                chain_id: 31_337,
                contract: contract_address(&deployer.address, 0),
                deployer: deployer.address,
                blacklist_redirect: true,
            })
            .unwrap();
        (engine, deployer)
    }

    #[test]
    fn status_follows_recovery_lifecycle() {
        let (engine, deployer) = temp_engine("lifecycle");
        let holder = KeyPair::generate();
        let backup = KeyPair::generate();
        let query = RecoveryQuery::new(&engine.db);

        engine.transfer(&deployer.address, &holder.address, 500).unwrap();
        assert_eq!(query.status(&holder.address).unwrap(), RecoveryStatus::Active);
        assert!(!query.can_recover(&holder.address).unwrap());
        assert!(query.describe(&holder.address).unwrap().contains("backup none"));

        engine.register_backup_address(&holder.address, &backup.address).unwrap();
        assert!(query.can_recover(&holder.address).unwrap());
        assert_eq!(query.backup_of(&holder.address).unwrap(), Some(backup.address));

        let sig = sign_emergency_transfer(&holder, &engine.domain().unwrap()).unwrap();
        engine.emergency_transfer(&deployer.address, &holder.address, &sig).unwrap();
        assert_eq!(query.status(&holder.address).unwrap(), RecoveryStatus::Blacklisted);

        let summary = query.describe(&holder.address).unwrap();
        assert!(summary.contains("BLACKLISTED"));
        assert!(summary.contains(&backup.address.to_hex()));
        assert!(summary.ends_with("balance 0"));
    }

    #[test]
    fn unknown_account_is_active_without_backup() {
        let (engine, _) = temp_engine("unknown");
        let query = RecoveryQuery::new(&engine.db);
        let nobody = KeyPair::generate().address;
        assert_eq!(query.status(&nobody).unwrap(), RecoveryStatus::Active);
        assert_eq!(query.backup_of(&nobody).unwrap(), None);
        assert!(!query.can_recover(&nobody).unwrap());
    }
}
