use lifeboat_core::types::{Address, ChainId, SignatureParts, H256};
use lifeboat_crypto::{emergency_transfer_digest, recover_signer, KeyPair, RecoveryDomain, SignatureError};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Sign `keypair`'s own recovery intent for `domain`.
///
/// Any conforming client produces the same digest, so the resulting
/// `{v, r, s}` can be handed to an arbitrary relayer.
pub fn sign_emergency_transfer(
    keypair: &KeyPair,
    domain: &RecoveryDomain,
) -> Result<SignatureParts, SignatureError> {
    let digest = emergency_transfer_digest(domain, &keypair.address);
    keypair.sign_digest(&digest)
}

/// A holder's signed recovery intent in the portable form the wallet writes
/// to disk and relayers submit.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct SignedRecovery {
    pub holder: Address,
    pub chain_id: ChainId,
    pub contract: Address,
    pub v: u8,
    pub r: H256,
    pub s: H256,
}

impl SignedRecovery {
    pub fn signature(&self) -> SignatureParts {
        SignatureParts { v: self.v, r: self.r, s: self.s }
    }

    pub fn domain(&self) -> RecoveryDomain {
        RecoveryDomain::new(self.chain_id, self.contract)
    }

    /// True if the signature recovers to `holder` under the embedded domain.
    pub fn verify(&self) -> bool {
        let digest = emergency_transfer_digest(&self.domain(), &self.holder);
        match recover_signer(&digest, &self.signature()) {
            Ok(signer) => signer == self.holder,
            Err(e) => {
                debug!(holder = %self.holder, error = %e, "signed recovery does not verify");
                false
            }
        }
    }
}

/// Produces signed recovery intents for one holder key.
pub struct EmergencySigner<'a> {
    keypair: &'a KeyPair,
}

impl<'a> EmergencySigner<'a> {
    pub fn new(keypair: &'a KeyPair) -> Self {
        Self { keypair }
    }

    pub fn sign(&self, chain_id: ChainId, contract: Address) -> Result<SignedRecovery, SignatureError> {
        let domain = RecoveryDomain::new(chain_id, contract);
        let sig = sign_emergency_transfer(self.keypair, &domain)?;
        Ok(SignedRecovery {
            holder: self.keypair.address,
            chain_id,
            contract,
            v: sig.v,
            r: sig.r,
            s: sig.s,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(n: u8) -> KeyPair {
        let mut secret = [0u8; 32];
        secret[31] = n;
        KeyPair::from_secret_bytes(&secret).unwrap()
    }

    fn ledger() -> Address {
        Address::from_hex("0x5FbDB2315678afecb367f032d93F642f64180aa3").unwrap()
    }

    #[test]
    fn signature_recovers_to_holder() {
        let kp = key(1);
        let domain = RecoveryDomain::new(31_337, ledger());
        let sig = sign_emergency_transfer(&kp, &domain).unwrap();
        let digest = emergency_transfer_digest(&domain, &kp.address);
        assert_eq!(recover_signer(&digest, &sig).unwrap(), kp.address);
    }

    #[test]
    fn signed_recovery_verifies_and_round_trips() {
        let kp = key(1);
        let signed = EmergencySigner::new(&kp).sign(31_337, ledger()).unwrap();
        assert!(signed.verify());
        assert_eq!(signed.holder.to_hex(), "0x7e5f4552091a69125d5dfcb7b8c2659029395bdf");

        let json = serde_json::to_string(&signed).unwrap();
        let back: SignedRecovery = serde_json::from_str(&json).unwrap();
        assert_eq!(back, signed);
        assert!(json.contains("\"holder\":\"0x7e5f4552091a69125d5dfcb7b8c2659029395bdf\""));
    }

    #[test]
    fn tampered_domain_or_holder_fails_verification() {
        let kp = key(1);
        let signed = EmergencySigner::new(&kp).sign(31_337, ledger()).unwrap();

        let mut other_chain = signed.clone();
        other_chain.chain_id = 1;
        assert!(!other_chain.verify());

        let mut other_holder = signed.clone();
        other_holder.holder = key(2).address;
        assert!(!other_holder.verify());

        let mut bad_v = signed;
        bad_v.v = 3;
        assert!(!bad_v.verify());
    }
}
