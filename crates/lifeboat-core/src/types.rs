use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Token amount in base units. u128 comfortably holds any 18-decimal supply.
pub type Balance = u128;

/// Network identifier bound into recovery signatures.
pub type ChainId = u64;

/// Per-account transaction sequence number.
pub type Nonce = u64;

/// Unix timestamp (seconds, UTC).
pub type Timestamp = i64;

#[derive(Debug, Error, PartialEq)]
pub enum ParseHexError {
    #[error("invalid hex: {0}")]
    InvalidHex(#[from] hex::FromHexError),
    #[error("invalid length: expected {expected} bytes, got {got}")]
    InvalidLength { expected: usize, got: usize },
}

fn decode_fixed<const N: usize>(s: &str) -> Result<[u8; N], ParseHexError> {
    let s = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")).unwrap_or(s);
    let bytes = hex::decode(s)?;
    if bytes.len() != N {
        return Err(ParseHexError::InvalidLength { expected: N, got: bytes.len() });
    }
    let mut arr = [0u8; N];
    arr.copy_from_slice(&bytes);
    Ok(arr)
}

// ── Address ──────────────────────────────────────────────────────────────────

/// 20-byte account identifier: the last 20 bytes of keccak256 of an
/// uncompressed secp256k1 public key (or of a contract creation payload).
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address(pub [u8; 20]);

impl Address {
    /// The all-zero address. Never a valid recipient or backup.
    pub const ZERO: Address = Address([0u8; 20]);

    pub fn from_bytes(b: [u8; 20]) -> Self {
        Self(b)
    }

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        *self == Self::ZERO
    }

    /// Lower-case, `0x`-prefixed hex.
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }

    /// Parse hex with or without `0x`; any letter case is accepted.
    pub fn from_hex(s: &str) -> Result<Self, ParseHexError> {
        decode_fixed::<20>(s).map(Self)
    }
}

impl FromStr for Address {
    type Err = ParseHexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({}…)", &self.to_hex()[..10])
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if serializer.is_human_readable() {
            serializer.serialize_str(&self.to_hex())
        } else {
            self.0.serialize(serializer)
        }
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        if deserializer.is_human_readable() {
            let s = String::deserialize(deserializer)?;
            Address::from_hex(&s).map_err(serde::de::Error::custom)
        } else {
            <[u8; 20]>::deserialize(deserializer).map(Address)
        }
    }
}

// ── H256 ─────────────────────────────────────────────────────────────────────

/// 32-byte hash: transaction hashes, typed-data digests, signature scalars.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct H256(pub [u8; 32]);

/// Transaction identifier: keccak256 of the canonical envelope body.
pub type TxHash = H256;

impl H256 {
    pub fn from_bytes(b: [u8; 32]) -> Self {
        Self(b)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }

    pub fn from_hex(s: &str) -> Result<Self, ParseHexError> {
        decode_fixed::<32>(s).map(Self)
    }
}

impl FromStr for H256 {
    type Err = ParseHexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl fmt::Display for H256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for H256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "H256({}…)", &self.to_hex()[..18])
    }
}

impl Serialize for H256 {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if serializer.is_human_readable() {
            serializer.serialize_str(&self.to_hex())
        } else {
            self.0.serialize(serializer)
        }
    }
}

impl<'de> Deserialize<'de> for H256 {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        if deserializer.is_human_readable() {
            let s = String::deserialize(deserializer)?;
            H256::from_hex(&s).map_err(serde::de::Error::custom)
        } else {
            <[u8; 32]>::deserialize(deserializer).map(H256)
        }
    }
}

// ── SignatureParts ───────────────────────────────────────────────────────────

/// A recoverable secp256k1 signature split into its three standard
/// components. `v` is the recovery id, either 0/1 or 27/28.
#[derive(Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureParts {
    pub v: u8,
    pub r: H256,
    pub s: H256,
}

impl SignatureParts {
    /// 65-byte `r || s || v` encoding.
    pub fn to_bytes(&self) -> [u8; 65] {
        let mut out = [0u8; 65];
        out[..32].copy_from_slice(&self.r.0);
        out[32..64].copy_from_slice(&self.s.0);
        out[64] = self.v;
        out
    }

    /// Split a 65-byte `r || s || v` signature.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ParseHexError> {
        if bytes.len() != 65 {
            return Err(ParseHexError::InvalidLength { expected: 65, got: bytes.len() });
        }
        let mut r = [0u8; 32];
        let mut s = [0u8; 32];
        r.copy_from_slice(&bytes[..32]);
        s.copy_from_slice(&bytes[32..64]);
        Ok(Self { v: bytes[64], r: H256(r), s: H256(s) })
    }
}

impl fmt::Debug for SignatureParts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SignatureParts(v={}, r={:?})", self.v, self.r)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn address_hex_accepts_prefix_and_case() {
        let a = Address::from_hex("0x7E5F4552091A69125d5DfCb7b8C2659029395Bdf").unwrap();
        let b = Address::from_hex("7e5f4552091a69125d5dfcb7b8c2659029395bdf").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.to_string(), "0x7e5f4552091a69125d5dfcb7b8c2659029395bdf");
    }

    #[test]
    fn address_wrong_length_rejected() {
        assert_eq!(
            Address::from_hex("0x1234"),
            Err(ParseHexError::InvalidLength { expected: 20, got: 2 })
        );
    }

    #[test]
    fn address_bad_hex_rejected() {
        assert!(matches!(
            Address::from_hex("0xzz5f4552091a69125d5dfcb7b8c2659029395bdf"),
            Err(ParseHexError::InvalidHex(_))
        ));
        assert!("not an address".parse::<Address>().is_err());
        assert!(matches!(H256::from_hex("0x123"), Err(ParseHexError::InvalidHex(_))));
    }

    #[test]
    fn address_json_is_hex_string() {
        let a = Address([0xab; 20]);
        let json = serde_json::to_string(&a).unwrap();
        assert_eq!(json, format!("\"0x{}\"", "ab".repeat(20)));
        let back: Address = serde_json::from_str(&json).unwrap();
        assert_eq!(back, a);
    }

    #[test]
    fn signature_parts_bytes_layout() {
        let sig = SignatureParts { v: 28, r: H256([1; 32]), s: H256([2; 32]) };
        let bytes = sig.to_bytes();
        assert_eq!(bytes[0], 1);
        assert_eq!(bytes[63], 2);
        assert_eq!(bytes[64], 28);
        assert_eq!(SignatureParts::from_bytes(&bytes).unwrap(), sig);
        assert!(SignatureParts::from_bytes(&bytes[..64]).is_err());
    }
}
