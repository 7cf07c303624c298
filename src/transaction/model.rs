use chrono::Utc;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::SYSTEM_SENDER;
use crate::error::ValidationError;
use crate::wallet;

/// An immutable transfer intent. Addresses are hex-encoded compressed
/// secp256k1 public keys, except the distinguished system sender used for
/// mining rewards.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TransactionRecord {
    pub sender: String,
    pub recipient: String,
    pub amount: u64,
    pub timestamp: i64, // Unix timestamp (UTC)
    /// Hex-encoded DER ECDSA signature; attached once via `sign`.
    pub signature: Option<String>,
}

impl TransactionRecord {
    pub fn new(sender: impl Into<String>, recipient: impl Into<String>, amount: u64) -> Self {
        Self::new_with_timestamp(sender, recipient, amount, Utc::now().timestamp())
    }

    /// Build with an explicit timestamp (deterministic construction for
    /// replays and tests).
    pub fn new_with_timestamp(
        sender: impl Into<String>,
        recipient: impl Into<String>,
        amount: u64,
        timestamp: i64,
    ) -> Self {
        Self {
            sender: sender.into(),
            recipient: recipient.into(),
            amount,
            timestamp,
            signature: None,
        }
    }

    /// Mining reward paid by the system sender.
    pub fn reward(miner_address: &str, amount: u64) -> Self {
        Self::new(SYSTEM_SENDER, miner_address, amount)
    }

    pub fn is_reward(&self) -> bool {
        self.sender == SYSTEM_SENDER
    }

    /// Canonical signing payload (JSON, sorted keys) that excludes the
    /// signature, so signing covers only pre-signature content. This byte
    /// layout is load-bearing: it must stay stable across versions.
    pub fn canonical_bytes(&self) -> Vec<u8> {
        let payload = serde_json::json!({
            "sender": self.sender,
            "recipient": self.recipient,
            "amount": self.amount,
            "timestamp": self.timestamp,
        });
        serde_json::to_vec(&payload).expect("serialize signing payload")
    }

    /// SHA-256 of the canonical payload.
    pub fn sighash(&self) -> [u8; 32] {
        let mut hasher = Sha256::new();
        hasher.update(self.canonical_bytes());
        let digest = hasher.finalize();
        let mut out = [0u8; 32];
        out.copy_from_slice(&digest[..]);
        out
    }

    /// Structural checks that need no cryptography.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.sender.is_empty() || self.recipient.is_empty() {
            return Err(ValidationError::MissingEndpoint);
        }
        if self.amount == 0 && !self.is_reward() {
            return Err(ValidationError::NonPositiveAmount);
        }
        Ok(())
    }

    /// Attach a signature over the canonical payload. Set once.
    pub fn sign(&mut self, secret_hex: &str) -> Result<(), &'static str> {
        if self.signature.is_some() {
            return Err("transaction is already signed");
        }
        let sig = wallet::sign_hash_hex(secret_hex, self.sighash())?;
        self.signature = Some(sig);
        Ok(())
    }

    /// Signature check. Reward transactions pass unconditionally; everything
    /// else needs a signature that verifies against the key encoded in the
    /// sender address. Fails closed on malformed keys or signatures.
    pub fn verify(&self) -> bool {
        if self.is_reward() {
            return true;
        }
        match &self.signature {
            Some(sig) if !sig.is_empty() => {
                wallet::verify_signature_hex(&self.sender, sig, self.sighash()).unwrap_or(false)
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::TransactionRecord;
    use crate::error::ValidationError;
    use crate::wallet::generate_keypair_hex;

    #[test]
    fn signed_transaction_verifies() {
        let (sk, sender) = generate_keypair_hex();
        let (_, recipient) = generate_keypair_hex();
        let mut tx = TransactionRecord::new(sender, recipient, 5);
        assert!(!tx.verify(), "unsigned tx must not verify");
        tx.sign(&sk).expect("sign");
        assert!(tx.verify());
    }

    #[test]
    fn tampered_amount_breaks_signature() {
        let (sk, sender) = generate_keypair_hex();
        let mut tx = TransactionRecord::new(sender, "recipient", 5);
        tx.sign(&sk).expect("sign");
        tx.amount = 500;
        assert!(!tx.verify());
    }

    #[test]
    fn signature_is_set_once() {
        let (sk, sender) = generate_keypair_hex();
        let mut tx = TransactionRecord::new(sender, "recipient", 5);
        tx.sign(&sk).expect("sign");
        assert_eq!(tx.sign(&sk), Err("transaction is already signed"));
    }

    #[test]
    fn reward_bypasses_signature_check() {
        let tx = TransactionRecord::reward("miner", 10);
        assert!(tx.is_reward());
        assert!(tx.verify());
        assert!(tx.validate().is_ok());
    }

    #[test]
    fn canonical_bytes_exclude_signature() {
        let (sk, sender) = generate_keypair_hex();
        let mut tx = TransactionRecord::new_with_timestamp(sender, "recipient", 5, 1_700_000_000);
        let before = tx.canonical_bytes();
        tx.sign(&sk).expect("sign");
        assert_eq!(before, tx.canonical_bytes());
    }

    #[test]
    fn validate_rejects_malformed_fields() {
        let tx = TransactionRecord::new("", "recipient", 5);
        assert_eq!(tx.validate(), Err(ValidationError::MissingEndpoint));

        let tx = TransactionRecord::new("sender", "recipient", 0);
        assert_eq!(tx.validate(), Err(ValidationError::NonPositiveAmount));
    }
}
