use std::sync::Arc;

use lifeboat_core::account::Account;
use lifeboat_core::error::LedgerError;
use lifeboat_core::event::{Event, EventRecord};
use lifeboat_core::meta::LedgerMeta;
use lifeboat_core::transaction::{Call, Receipt, Transaction};
use lifeboat_core::types::{Address, Balance, Nonce, SignatureParts, TxHash, H256};
use lifeboat_crypto::hash::tx_hash;
use lifeboat_crypto::{emergency_transfer_digest, recover_signer, RecoveryDomain};
use tracing::{debug, info};

use crate::db::StateDb;
use crate::staged::StagedMutations;

// ── Call context ──────────────────────────────────────────────────────────────

/// Everything one call may read or stage. Ledger, registry and recovery
/// operations are implemented on this type in their own modules.
pub(crate) struct CallContext<'a> {
    pub db: &'a StateDb,
    pub meta: &'a LedgerMeta,
    pub staged: StagedMutations,
}

impl CallContext<'_> {
    fn dispatch(&mut self, caller: &Address, call: &Call) -> Result<(), LedgerError> {
        match call {
            Call::Transfer { to, amount } => self.transfer(caller, to, *amount),
            Call::Approve { spender, amount } => self.approve(caller, spender, *amount),
            Call::TransferFrom { owner, to, amount } => {
                self.transfer_from(caller, owner, to, *amount)
            }
            Call::RegisterBackupAddress { backup } => self.register_backup_address(caller, backup),
            Call::EmergencyTransfer { holder, signature } => {
                self.emergency_transfer(caller, holder, signature)
            }
        }
    }
}

// ── StateEngine ───────────────────────────────────────────────────────────────

/// The state transition engine.
///
/// Every mutating entry point stages its changes, commits them in one sled
/// transaction and only then hands the emitted events back in a `Receipt`.
/// A failed call leaves accounts, allowances and the event log untouched.
///
/// The engine expects a single writer; the node feeds it from one apply loop.
pub struct StateEngine {
    pub db: Arc<StateDb>,
}

impl StateEngine {
    pub fn new(db: Arc<StateDb>) -> Self {
        Self { db }
    }

    pub fn meta(&self) -> Result<LedgerMeta, LedgerError> {
        self.db.require_meta()
    }

    /// Signing domain of this ledger instance.
    pub fn domain(&self) -> Result<RecoveryDomain, LedgerError> {
        let meta = self.meta()?;
        Ok(RecoveryDomain::new(meta.chain_id, meta.contract))
    }

    /// The typed-data digest `holder` must sign to authorize recovery.
    pub fn recovery_digest(&self, holder: &Address) -> Result<H256, LedgerError> {
        Ok(emergency_transfer_digest(&self.domain()?, holder))
    }

    // ── Initialization ────────────────────────────────────────────────────────

    /// Store the ledger parameters and credit the entire supply to the
    /// deployer. Can only ever succeed once per database.
    pub fn initialize(&self, meta: LedgerMeta) -> Result<Receipt, LedgerError> {
        if self.db.get_meta()?.is_some() {
            return Err(LedgerError::AlreadyInitialized);
        }
        let receipt = self.run(&meta, None, |ctx| {
            ctx.staged.meta = Some(ctx.meta.clone());
            ctx.credit_initial_supply()
        })?;
        info!(
            name = %meta.name,
            symbol = %meta.symbol,
            contract = %meta.contract,
            deployer = %meta.deployer,
            total_supply = meta.total_supply,
            "ledger initialized"
        );
        Ok(receipt)
    }

    // ── Transactions ──────────────────────────────────────────────────────────

    /// Verify and apply a signed transaction.
    ///
    /// The envelope signature must recover to `tx.from` over the hash bound to
    /// this ledger's chain id and address, and `tx.nonce` must equal the
    /// sender's current nonce. The nonce bump commits together with the call.
    pub fn apply(&self, tx: &Transaction) -> Result<Receipt, LedgerError> {
        let meta = self.meta()?;
        let hash = tx_hash(meta.chain_id, &meta.contract, &tx.body_bytes());

        let signer = recover_signer(&hash, &tx.signature).map_err(|e| {
            debug!(tx_hash = %hash, error = %e, "envelope signature rejected");
            LedgerError::InvalidSignature
        })?;
        if signer != tx.from {
            return Err(LedgerError::InvalidSignature);
        }

        let receipt = self.run(&meta, Some(hash), |ctx| {
            let sender = ctx.staged.account(ctx.db, &tx.from)?;
            if tx.nonce != sender.nonce {
                return Err(LedgerError::InvalidNonce {
                    expected: sender.nonce,
                    got: tx.nonce,
                });
            }
            sender.nonce = sender.nonce.checked_add(1).ok_or(LedgerError::Overflow)?;
            ctx.dispatch(&tx.from, &tx.call)
        })?;

        info!(tx_hash = %hash, from = %tx.from, call = tx.call.name(), "applied transaction");
        Ok(receipt)
    }

    /// Execute `call` on behalf of `caller` without an envelope or nonce.
    pub fn execute(&self, caller: &Address, call: &Call) -> Result<Receipt, LedgerError> {
        let meta = self.meta()?;
        self.run(&meta, None, |ctx| ctx.dispatch(caller, call))
    }

    // ── Direct entry points ──────────────────────────────────────────────────

    pub fn transfer(&self, from: &Address, to: &Address, amount: Balance) -> Result<Receipt, LedgerError> {
        self.execute(from, &Call::Transfer { to: *to, amount })
    }

    pub fn approve(&self, owner: &Address, spender: &Address, amount: Balance) -> Result<Receipt, LedgerError> {
        self.execute(owner, &Call::Approve { spender: *spender, amount })
    }

    pub fn transfer_from(
        &self,
        spender: &Address,
        owner: &Address,
        to: &Address,
        amount: Balance,
    ) -> Result<Receipt, LedgerError> {
        self.execute(spender, &Call::TransferFrom { owner: *owner, to: *to, amount })
    }

    pub fn register_backup_address(&self, caller: &Address, backup: &Address) -> Result<Receipt, LedgerError> {
        self.execute(caller, &Call::RegisterBackupAddress { backup: *backup })
    }

    pub fn emergency_transfer(
        &self,
        relayer: &Address,
        holder: &Address,
        signature: &SignatureParts,
    ) -> Result<Receipt, LedgerError> {
        self.execute(relayer, &Call::EmergencyTransfer { holder: *holder, signature: *signature })
    }

    // ── Reads ────────────────────────────────────────────────────────────────

    pub fn account(&self, address: &Address) -> Result<Account, LedgerError> {
        self.db.get_account(address)
    }

    /// Current balance; 0 for unknown accounts.
    pub fn balance_of(&self, address: &Address) -> Result<Balance, LedgerError> {
        Ok(self.db.get_account(address)?.balance)
    }

    pub fn backup_address_of(&self, address: &Address) -> Result<Option<Address>, LedgerError> {
        Ok(self.db.get_account(address)?.backup_address)
    }

    pub fn is_blacklisted(&self, address: &Address) -> Result<bool, LedgerError> {
        Ok(self.db.get_account(address)?.blacklisted)
    }

    pub fn nonce_of(&self, address: &Address) -> Result<Nonce, LedgerError> {
        Ok(self.db.get_account(address)?.nonce)
    }

    pub fn allowance(&self, owner: &Address, spender: &Address) -> Result<Balance, LedgerError> {
        self.db.get_allowance(owner, spender)
    }

    pub fn total_supply(&self) -> Result<Balance, LedgerError> {
        Ok(self.meta()?.total_supply)
    }

    // ── Commit ───────────────────────────────────────────────────────────────

    /// Stage `f`, then commit its mutations and events atomically.
    fn run<F>(&self, meta: &LedgerMeta, hash: Option<TxHash>, f: F) -> Result<Receipt, LedgerError>
    where
        F: FnOnce(&mut CallContext<'_>) -> Result<(), LedgerError>,
    {
        let mut ctx = CallContext {
            db: self.db.as_ref(),
            meta,
            staged: StagedMutations::default(),
        };
        f(&mut ctx)?;
        let staged = ctx.staged;

        let applied_at = chrono::Utc::now().timestamp();
        let first_seq = self.db.next_event_seq()?;
        let records: Vec<EventRecord> = staged
            .events
            .iter()
            .enumerate()
            .map(|(i, event)| EventRecord {
                seq: first_seq + i as u64,
                tx_hash: hash,
                applied_at,
                event: event.clone(),
            })
            .collect();
        self.db.commit(&staged, &records)?;

        for event in &staged.events {
            if let Event::EmergencyTransfer { relayer, holder, backup, amount } = event {
                info!(
                    relayer = %relayer,
                    holder = %holder,
                    backup = %backup,
                    amount = *amount,
                    "emergency transfer executed; holder blacklisted"
                );
            }
        }

        Ok(Receipt {
            tx_hash: hash,
            events: staged.events,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::*;
    use lifeboat_core::transaction::body_bytes;

    #[test]
    fn initialize_credits_deployer_once() {
        let db = temp_db("init_once");
        let engine = StateEngine::new(db.clone());
        let deployer = key(1);
        let meta = test_meta(&deployer.address, true);

        let receipt = engine.initialize(meta.clone()).unwrap();
        assert_eq!(
            receipt.events,
            vec![Event::Transfer {
                from: Address::ZERO,
                to: deployer.address,
                amount: meta.total_supply,
            }]
        );
        assert_eq!(engine.balance_of(&deployer.address).unwrap(), meta.total_supply);
        assert_eq!(engine.total_supply().unwrap(), meta.total_supply);
        assert_eq!(engine.meta().unwrap(), meta);

        assert!(matches!(engine.initialize(meta), Err(LedgerError::AlreadyInitialized)));
        assert_conserved(&engine);
    }

    #[test]
    fn calls_before_initialization_fail() {
        let engine = StateEngine::new(temp_db("uninitialized"));
        let a = key(1);
        assert!(matches!(
            engine.transfer(&a.address, &key(2).address, 1),
            Err(LedgerError::NotInitialized)
        ));
        let tx = Transaction {
            from: a.address,
            nonce: 0,
            call: Call::Transfer { to: key(2).address, amount: 1 },
            signature: SignatureParts { v: 27, r: H256::default(), s: H256::default() },
        };
        assert!(matches!(engine.apply(&tx), Err(LedgerError::NotInitialized)));
    }

    #[test]
    fn apply_signed_transfer_bumps_nonce() {
        let (engine, deployer) = ledger("apply_transfer", true);
        let bob = key(2);

        let tx = signed_tx(&engine, &deployer, 0, Call::Transfer { to: bob.address, amount: 250 });
        let receipt = engine.apply(&tx).unwrap();

        let meta = engine.meta().unwrap();
        let expected_hash = tx_hash(meta.chain_id, &meta.contract, &tx.body_bytes());
        assert_eq!(receipt.tx_hash, Some(expected_hash));
        assert_eq!(
            receipt.events,
            vec![Event::Transfer { from: deployer.address, to: bob.address, amount: 250 }]
        );
        assert_eq!(engine.balance_of(&bob.address).unwrap(), 250);
        assert_eq!(engine.nonce_of(&deployer.address).unwrap(), 1);
        assert_conserved(&engine);
    }

    #[test]
    fn apply_rejects_wrong_nonce() {
        let (engine, deployer) = ledger("apply_nonce", true);
        let tx = signed_tx(&engine, &deployer, 5, Call::Transfer { to: key(2).address, amount: 1 });
        assert!(matches!(
            engine.apply(&tx),
            Err(LedgerError::InvalidNonce { expected: 0, got: 5 })
        ));

        let ok = signed_tx(&engine, &deployer, 0, Call::Transfer { to: key(2).address, amount: 1 });
        engine.apply(&ok).unwrap();
        assert!(matches!(engine.apply(&ok), Err(LedgerError::InvalidNonce { expected: 1, got: 0 })));
    }

    #[test]
    fn apply_rejects_envelope_signed_by_someone_else() {
        let (engine, deployer) = ledger("apply_forged", true);
        let mallory = key(9);
        let mut tx = signed_tx(&engine, &mallory, 0, Call::Transfer { to: mallory.address, amount: 10 });
        tx.from = deployer.address;
        assert!(matches!(engine.apply(&tx), Err(LedgerError::InvalidSignature)));
        assert_eq!(engine.balance_of(&mallory.address).unwrap(), 0);
    }

    #[test]
    fn apply_rejects_transaction_signed_for_another_ledger() {
        let (engine, deployer) = ledger("apply_foreign", true);
        let call = Call::Transfer { to: key(2).address, amount: 10 };
        let foreign_hash = tx_hash(1, &Address([0xAB; 20]), &body_bytes(&deployer.address, 0, &call));
        let tx = Transaction {
            from: deployer.address,
            nonce: 0,
            call,
            signature: deployer.sign_digest(&foreign_hash).unwrap(),
        };
        assert!(matches!(engine.apply(&tx), Err(LedgerError::InvalidSignature)));
    }

    #[test]
    fn failed_call_keeps_nonce_and_log() {
        let (engine, deployer) = ledger("apply_failed", true);
        let poor = key(3);
        let seq_before = engine.db.next_event_seq().unwrap();

        let tx = signed_tx(&engine, &poor, 0, Call::Transfer { to: deployer.address, amount: 1 });
        assert!(matches!(
            engine.apply(&tx),
            Err(LedgerError::InsufficientBalance { need: 1, have: 0 })
        ));
        assert_eq!(engine.nonce_of(&poor.address).unwrap(), 0);
        assert!(!engine.db.account_exists(&poor.address).unwrap());
        assert_eq!(engine.db.next_event_seq().unwrap(), seq_before);
    }

    #[test]
    fn committed_events_are_logged_with_tx_hash() {
        let (engine, deployer) = ledger("event_log", true);
        let bob = key(2);
        let tx = signed_tx(&engine, &deployer, 0, Call::Approve { spender: bob.address, amount: 7 });
        let receipt = engine.apply(&tx).unwrap();

        // seq 0 is the genesis transfer.
        let log = engine.db.iter_events(0, 10).unwrap();
        assert_eq!(log.len(), 2);
        assert_eq!(log[0].tx_hash, None);
        assert_eq!(log[1].seq, 1);
        assert_eq!(log[1].tx_hash, receipt.tx_hash);
        assert_eq!(
            log[1].event,
            Event::Approval { owner: deployer.address, spender: bob.address, amount: 7 }
        );
    }

    #[test]
    fn relayed_recovery_through_transaction() {
        let (engine, deployer) = ledger("apply_recovery", true);
        let holder = key(2);
        let backup = key(3);
        let relayer = key(4);
        engine.transfer(&deployer.address, &holder.address, 1_000).unwrap();
        engine.register_backup_address(&holder.address, &backup.address).unwrap();

        let signature = sign_recovery(&engine, &holder);
        let tx = signed_tx(
            &engine,
            &relayer,
            0,
            Call::EmergencyTransfer { holder: holder.address, signature },
        );
        let receipt = engine.apply(&tx).unwrap();

        assert!(receipt.events.contains(&Event::EmergencyTransfer {
            relayer: relayer.address,
            holder: holder.address,
            backup: backup.address,
            amount: 1_000,
        }));
        assert_eq!(engine.balance_of(&backup.address).unwrap(), 1_000);
        assert!(engine.is_blacklisted(&holder.address).unwrap());
        assert_eq!(engine.nonce_of(&relayer.address).unwrap(), 1);
        assert_conserved(&engine);
    }
}
