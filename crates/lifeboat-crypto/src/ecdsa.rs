use k256::ecdsa::{RecoveryId, Signature, SigningKey, VerifyingKey};
use k256::elliptic_curve::sec1::ToEncodedPoint;
use lifeboat_core::types::{Address, SignatureParts, H256};
use thiserror::Error;

use crate::hash::keccak256;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SignatureError {
    #[error("invalid recovery id: {0}")]
    InvalidRecoveryId(u8),
    #[error("malformed signature scalars")]
    Malformed,
    #[error("non-canonical signature (high s)")]
    NonCanonicalS,
    #[error("public key recovery failed")]
    RecoveryFailed,
    #[error("invalid secret key")]
    InvalidSecretKey,
    #[error("signing failed")]
    SigningFailed,
}

/// Recover the address that produced `sig` over the 32-byte `digest`.
///
/// Accepts `v` as 0/1 or 27/28. Rejects zero or out-of-range scalars and
/// high-`s` signatures, so every (digest, signer) pair has exactly one valid
/// encoding.
pub fn recover_signer(digest: &H256, sig: &SignatureParts) -> Result<Address, SignatureError> {
    let recid_byte = match sig.v {
        0 | 1 => sig.v,
        27 | 28 => sig.v - 27,
        other => return Err(SignatureError::InvalidRecoveryId(other)),
    };
    let recid =
        RecoveryId::from_byte(recid_byte).ok_or(SignatureError::InvalidRecoveryId(sig.v))?;

    let mut rs = [0u8; 64];
    rs[..32].copy_from_slice(sig.r.as_bytes());
    rs[32..].copy_from_slice(sig.s.as_bytes());
    let signature = Signature::from_slice(&rs).map_err(|_| SignatureError::Malformed)?;
    if signature.normalize_s().is_some() {
        return Err(SignatureError::NonCanonicalS);
    }

    let key = VerifyingKey::recover_from_prehash(digest.as_bytes(), &signature, recid)
        .map_err(|_| SignatureError::RecoveryFailed)?;
    Ok(address_of(&key))
}

/// Sign a 32-byte digest, returning the `{v, r, s}` components with
/// `v` in 27/28 form.
pub fn sign_digest(key: &SigningKey, digest: &H256) -> Result<SignatureParts, SignatureError> {
    let (signature, recid) = key
        .sign_prehash_recoverable(digest.as_bytes())
        .map_err(|_| SignatureError::SigningFailed)?;
    let bytes = signature.to_bytes();
    let mut r = [0u8; 32];
    let mut s = [0u8; 32];
    r.copy_from_slice(&bytes[..32]);
    s.copy_from_slice(&bytes[32..]);
    Ok(SignatureParts {
        v: 27 + recid.to_byte(),
        r: H256::from_bytes(r),
        s: H256::from_bytes(s),
    })
}

/// Address of a secp256k1 public key: keccak256(x || y)[12..].
pub fn address_of(key: &VerifyingKey) -> Address {
    let point = key.as_affine().to_encoded_point(false);
    let hash = keccak256(&point.as_bytes()[1..]);
    let mut out = [0u8; 20];
    out.copy_from_slice(&hash[12..]);
    Address::from_bytes(out)
}
