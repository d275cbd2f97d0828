use k256::ecdsa::SigningKey;
use lifeboat_core::types::{Address, SignatureParts, H256};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use zeroize::Zeroizing;

use crate::ecdsa::{address_of, sign_digest, SignatureError};

/// A secp256k1 keypair with its derived address.
///
/// `SigningKey` wipes its scalar on drop; the serialized keyfile form holds
/// the secret only transiently in a `Zeroizing` buffer.
#[derive(Clone)]
pub struct KeyPair {
    pub address: Address,
    signing_key: SigningKey,
}

impl KeyPair {
    /// Generate a fresh keypair from the OS RNG.
    pub fn generate() -> Self {
        let signing_key = SigningKey::random(&mut rand::rngs::OsRng);
        Self::from_signing_key(signing_key)
    }

    /// Restore a keypair from a 32-byte secret scalar.
    pub fn from_secret_bytes(secret: &[u8]) -> Result<Self, SignatureError> {
        let signing_key =
            SigningKey::from_slice(secret).map_err(|_| SignatureError::InvalidSecretKey)?;
        Ok(Self::from_signing_key(signing_key))
    }

    fn from_signing_key(signing_key: SigningKey) -> Self {
        let address = address_of(signing_key.verifying_key());
        Self { address, signing_key }
    }

    /// Sign a 32-byte digest.
    pub fn sign_digest(&self, digest: &H256) -> Result<SignatureParts, SignatureError> {
        sign_digest(&self.signing_key, digest)
    }

    /// Secret scalar bytes, wiped when the returned buffer is dropped.
    pub fn secret_bytes(&self) -> Zeroizing<Vec<u8>> {
        Zeroizing::new(self.signing_key.to_bytes().to_vec())
    }
}

impl std::fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "KeyPair {{ address: {} }}", self.address)
    }
}

// ── Keyfile encoding ──────────────────────────────────────────────────────────

#[derive(Serialize, Deserialize)]
struct KeyFile {
    address: Address,
    #[serde(with = "hex::serde")]
    secret_key: Vec<u8>,
}

impl Drop for KeyFile {
    fn drop(&mut self) {
        use zeroize::Zeroize;
        self.secret_key.zeroize();
    }
}

impl Serialize for KeyPair {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let file = KeyFile {
            address: self.address,
            secret_key: self.secret_bytes().to_vec(),
        };
        file.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for KeyPair {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let file = KeyFile::deserialize(deserializer)?;
        let kp = KeyPair::from_secret_bytes(&file.secret_key).map_err(serde::de::Error::custom)?;
        if kp.address != file.address {
            return Err(serde::de::Error::custom(format!(
                "keyfile address {} does not match secret key (derives {})",
                file.address, kp.address
            )));
        }
        Ok(kp)
    }
}
