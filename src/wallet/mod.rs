use rand::rngs::OsRng;
use secp256k1::{Message, PublicKey, Secp256k1, SecretKey, ecdsa::Signature};

/// Generate a new secp256k1 keypair and return (priv_hex, address_hex).
/// An address is simply the hex of the compressed public key, so signature
/// verification can recover the key straight from the sender field.
pub fn generate_keypair_hex() -> (String, String) {
    let secp = Secp256k1::new();
    let (sk, pk) = secp.generate_keypair(&mut OsRng);
    let sk_hex = hex::encode(sk.secret_bytes());
    let address = hex::encode(pk.serialize()); // compressed (33 bytes)
    (sk_hex, address)
}

/// Sign a 32-byte message hash with a hex-encoded secret key.
/// Returns the signature as hex DER.
pub fn sign_hash_hex(secret_hex: &str, msg32: [u8; 32]) -> Result<String, &'static str> {
    let secp = Secp256k1::new();

    let sk_bytes = hex::decode(secret_hex).map_err(|_| "invalid secret key hex")?;
    let sk = SecretKey::from_slice(&sk_bytes).map_err(|_| "invalid secret key bytes")?;

    let msg = Message::from_digest_slice(&msg32).map_err(|_| "invalid message length")?;
    let sig = secp.sign_ecdsa(&msg, &sk);
    Ok(hex::encode(sig.serialize_der()))
}

/// Verify a signature (hex DER) against the given pubkey (hex, compressed) and message hash (32 bytes).
pub fn verify_signature_hex(
    pubkey_hex: &str,
    sig_hex: &str,
    msg32: [u8; 32],
) -> Result<bool, &'static str> {
    // Verification-only context is enough here
    let secp = Secp256k1::verification_only();

    let sig_bytes = hex::decode(sig_hex).map_err(|_| "invalid signature hex")?;
    let sig = Signature::from_der(&sig_bytes).map_err(|_| "invalid DER signature")?;

    let pk_bytes = hex::decode(pubkey_hex).map_err(|_| "invalid pubkey hex")?;
    let pk = PublicKey::from_slice(&pk_bytes).map_err(|_| "invalid pubkey bytes")?;

    let msg = Message::from_digest_slice(&msg32).map_err(|_| "invalid message length")?;
    Ok(secp.verify_ecdsa(&msg, &sig, &pk).is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_then_verify_roundtrip() {
        let (sk_hex, address) = generate_keypair_hex();
        let msg = [7u8; 32];
        let sig = sign_hash_hex(&sk_hex, msg).expect("sign");
        assert_eq!(verify_signature_hex(&address, &sig, msg), Ok(true));
    }

    #[test]
    fn verify_fails_closed_on_garbage() {
        let (_, address) = generate_keypair_hex();
        assert!(verify_signature_hex(&address, "not-hex", [0u8; 32]).is_err());
        assert!(verify_signature_hex("zz", "00", [0u8; 32]).is_err());
    }

    #[test]
    fn wrong_message_does_not_verify() {
        let (sk_hex, address) = generate_keypair_hex();
        let sig = sign_hash_hex(&sk_hex, [1u8; 32]).expect("sign");
        assert_eq!(verify_signature_hex(&address, &sig, [2u8; 32]), Ok(false));
    }
}
