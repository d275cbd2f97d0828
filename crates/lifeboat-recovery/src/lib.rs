//! lifeboat-recovery
//!
//! Off-chain side of the recovery protocol and read helpers over recovery
//! state. The state machine itself lives in lifeboat-state's StateEngine.
//! This crate produces holder signatures in the exact typed-data form the
//! engine verifies, and answers "can this account still be recovered?".

pub mod query;
pub mod signer;

pub use query::RecoveryQuery;
pub use signer::{sign_emergency_transfer, EmergencySigner, SignedRecovery};
