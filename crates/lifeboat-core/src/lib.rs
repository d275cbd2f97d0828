pub mod constants;
pub mod error;
pub mod types;
pub mod transaction;
pub mod account;
pub mod event;
pub mod meta;
pub mod serde_helpers;

pub use constants::*;
pub use error::LedgerError;
pub use types::*;
pub use transaction::*;
pub use account::*;
pub use event::*;
pub use meta::LedgerMeta;
