//! lifeboat-state
//!
//! Persistent ledger state (sled) and the state transition engine that
//! applies transfers, backup registrations and emergency recoveries.

pub mod db;
pub mod engine;
mod ledger;
mod recovery;
mod registry;
mod staged;

pub use db::StateDb;
pub use engine::StateEngine;
