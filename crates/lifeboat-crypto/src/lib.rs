pub mod ecdsa;
pub mod hash;
pub mod keypair;
pub mod typed_data;

pub use ecdsa::{recover_signer, SignatureError};
pub use hash::{contract_address, keccak256, to_checksum, tx_hash};
pub use keypair::KeyPair;
pub use typed_data::{emergency_transfer_digest, RecoveryDomain};
