use lifeboat_core::constants::TX_DOMAIN_TAG;
use lifeboat_core::types::{Address, ChainId, Nonce, TxHash};
use sha3::{Digest, Keccak256};

/// Compute keccak-256 (the pre-standard SHA-3 padding) of arbitrary bytes.
pub fn keccak256(data: &[u8]) -> [u8; 32] {
    let mut out = [0u8; 32];
    out.copy_from_slice(&Keccak256::digest(data));
    out
}

/// Hash of a transaction envelope, bound to one ledger instance.
pub fn tx_hash(chain_id: ChainId, contract: &Address, body_bytes: &[u8]) -> TxHash {
    let mut hasher = Keccak256::new();
    hasher.update(TX_DOMAIN_TAG);
    hasher.update(chain_id.to_be_bytes());
    hasher.update(contract.as_bytes());
    hasher.update(body_bytes);
    let mut out = [0u8; 32];
    out.copy_from_slice(&hasher.finalize());
    TxHash::from_bytes(out)
}

/// Address of a ledger deployed by `deployer` at account nonce `nonce`:
/// keccak256(rlp([deployer, nonce]))[12..], the same derivation a contract
/// creation uses, so ledger addresses look and behave like contract addresses.
pub fn contract_address(deployer: &Address, nonce: Nonce) -> Address {
    let nonce_rlp = rlp_u64(nonce);
    let payload_len = 1 + 20 + nonce_rlp.len();

    let mut encoded = Vec::with_capacity(1 + payload_len);
    // Payload never exceeds 55 bytes, so the short list form always applies.
    encoded.push(0xc0 + payload_len as u8);
    encoded.push(0x80 + 20);
    encoded.extend_from_slice(deployer.as_bytes());
    encoded.extend_from_slice(&nonce_rlp);

    let hash = keccak256(&encoded);
    let mut out = [0u8; 20];
    out.copy_from_slice(&hash[12..]);
    Address::from_bytes(out)
}

fn rlp_u64(value: u64) -> Vec<u8> {
    match value {
        0 => vec![0x80],
        1..=0x7f => vec![value as u8],
        _ => {
            let be = value.to_be_bytes();
            let first = be.iter().position(|b| *b != 0).unwrap_or(be.len() - 1);
            let mut out = Vec::with_capacity(1 + be.len() - first);
            out.push(0x80 + (be.len() - first) as u8);
            out.extend_from_slice(&be[first..]);
            out
        }
    }
}

/// EIP-55 mixed-case checksum encoding of an address.
pub fn to_checksum(address: &Address) -> String {
    let lower = hex::encode(address.as_bytes());
    let hash = keccak256(lower.as_bytes());

    let mut out = String::with_capacity(42);
    out.push_str("0x");
    for (i, c) in lower.chars().enumerate() {
        let nibble = (hash[i / 2] >> if i % 2 == 0 { 4 } else { 0 }) & 0x0f;
        if c.is_ascii_alphabetic() && nibble >= 8 {
            out.push(c.to_ascii_uppercase());
        } else {
            out.push(c);
        }
    }
    out
}
