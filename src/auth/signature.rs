//! Multi-algorithm signature verification.
//!
//! One verification routine per supported algorithm, selected by a single
//! match on [`Algorithm`]. The server only ever sees public keys; private
//! keys never leave the client. Each routine fails closed: any decode or
//! parse problem is a [`VerifyError::Malformed`], never a partial verify.

use ed25519_dalek::Verifier;
use k256::ecdsa::signature::hazmat::PrehashVerifier;
use rsa::Pkcs1v15Sign;
use rsa::pkcs1::DecodeRsaPublicKey;
use rsa::pkcs8::DecodePublicKey;
use rsa::pss::Pss;
use rsa::traits::PublicKeyParts;
use rsa::RsaPublicKey;
use sha2::{Digest, Sha256};
use sha3::Keccak256;

use super::codec::{decode_base64_or_hex, decode_hex};
use super::error::VerifyError;
use crate::models::Algorithm;

/// Verify `signature` over `message` under `public_key`.
///
/// The message is the exact byte string the caller was told to sign; the
/// core never trims, re-encodes, or otherwise mutates it. Key and signature
/// encodings are algorithm-specific, see each routine.
pub fn verify_signature(
    alg: Algorithm,
    public_key: &str,
    message: &str,
    signature: &str,
) -> Result<(), VerifyError> {
    match alg {
        Algorithm::Ed25519 => verify_ed25519(public_key, message, signature),
        Algorithm::Secp256k1 => verify_secp256k1(public_key, message, signature),
        Algorithm::RsaPss | Algorithm::RsaSha256 => verify_rsa(alg, public_key, message, signature),
    }
}

/// Ed25519 over the raw message bytes, no prefixing.
///
/// Key and signature each decode from base64 (padded or raw) or hex; the
/// key must be exactly 32 bytes and the signature exactly 64.
fn verify_ed25519(public_key: &str, message: &str, signature: &str) -> Result<(), VerifyError> {
    let pub_bytes = decode_base64_or_hex(public_key)?;
    let sig_bytes = decode_base64_or_hex(signature)?;

    let pub_bytes: [u8; 32] = pub_bytes
        .try_into()
        .map_err(|_| VerifyError::Malformed("invalid ed25519 public key length".into()))?;
    let sig_bytes: [u8; 64] = sig_bytes
        .try_into()
        .map_err(|_| VerifyError::Malformed("invalid ed25519 signature length".into()))?;

    let verifying_key = ed25519_dalek::VerifyingKey::from_bytes(&pub_bytes)
        .map_err(|e| VerifyError::Malformed(format!("invalid ed25519 public key: {e}")))?;
    let sig = ed25519_dalek::Signature::from_bytes(&sig_bytes);

    verifying_key
        .verify(message.as_bytes(), &sig)
        .map_err(|_| VerifyError::InvalidSignature("ed25519"))
}

/// Ethereum-style secp256k1 ECDSA (`personal_sign` / EIP-191 semantics).
///
/// Key and signature are hex (optional `0x`); the key is any SEC1 point
/// encoding. The signature is `r || s` in its first 64 bytes; a trailing
/// recovery byte is ignored. The message is prefixed and Keccak-256 hashed
/// before verification, so a signature over the raw message never passes.
fn verify_secp256k1(public_key: &str, message: &str, signature: &str) -> Result<(), VerifyError> {
    let pub_bytes = decode_hex(public_key)?;
    let sig_bytes = decode_hex(signature)?;

    let verifying_key = k256::ecdsa::VerifyingKey::from_sec1_bytes(&pub_bytes)
        .map_err(|e| VerifyError::Malformed(format!("invalid secp256k1 public key: {e}")))?;

    if sig_bytes.len() < 64 {
        return Err(VerifyError::Malformed(
            "invalid secp256k1 signature length".into(),
        ));
    }
    let sig = k256::ecdsa::Signature::from_slice(&sig_bytes[..64])
        .map_err(|e| VerifyError::Malformed(format!("invalid secp256k1 signature: {e}")))?;
    // Wallets emit high-s signatures; normalize so verification matches
    // plain ECDSA semantics rather than rejecting on malleability grounds.
    let sig = sig.normalize_s().unwrap_or(sig);

    let hash = ethereum_personal_hash(message.as_bytes());
    verifying_key
        .verify_prehash(&hash, &sig)
        .map_err(|_| VerifyError::InvalidSignature("secp256k1"))
}

/// RSA over SHA-256, PSS or PKCS#1 v1.5 depending on the claimed algorithm.
///
/// The key is a PEM block (PKIX `PUBLIC KEY` first, then PKCS#1
/// `RSA PUBLIC KEY`) or base64/hex DER parsed in the same order. Padding is
/// selected by the caller's algorithm tag, never auto-detected.
fn verify_rsa(
    alg: Algorithm,
    public_key: &str,
    message: &str,
    signature: &str,
) -> Result<(), VerifyError> {
    let pub_key = decode_rsa_public_key(public_key)?;
    let sig_bytes = decode_base64_or_hex(signature)?;
    let hashed = Sha256::digest(message.as_bytes());

    match alg {
        Algorithm::RsaPss => {
            if verify_pss_any_salt(&pub_key, &hashed, &sig_bytes) {
                Ok(())
            } else {
                Err(VerifyError::InvalidSignature("rsa-pss"))
            }
        }
        _ => pub_key
            .verify(Pkcs1v15Sign::new::<Sha256>(), &hashed, &sig_bytes)
            .map_err(|_| VerifyError::InvalidSignature("rsa")),
    }
}

/// PSS verification with the salt length recovered rather than pinned.
///
/// The salt length is not encoded in the signature, and signers disagree on
/// a default (digest-sized vs. the maximum the modulus holds). A valid
/// signature verifies under exactly one length, so try every length the
/// modulus can hold, common ones first.
fn verify_pss_any_salt(pub_key: &RsaPublicKey, hashed: &[u8], sig: &[u8]) -> bool {
    let digest_len = Sha256::output_size();
    let max_salt = pub_key.size().saturating_sub(digest_len + 2);
    std::iter::once(digest_len)
        .chain(std::iter::once(max_salt))
        .chain(0..max_salt)
        .any(|salt_len| {
            salt_len <= max_salt
                && pub_key
                    .verify(Pss::new_with_salt::<Sha256>(salt_len), hashed, sig)
                    .is_ok()
        })
}

fn decode_rsa_public_key(public_key: &str) -> Result<RsaPublicKey, VerifyError> {
    let trimmed = public_key.trim();
    if trimmed.starts_with("-----BEGIN") {
        return RsaPublicKey::from_public_key_pem(trimmed)
            .or_else(|_| RsaPublicKey::from_pkcs1_pem(trimmed))
            .map_err(|_| VerifyError::Malformed("unsupported rsa public key".into()));
    }
    let der = decode_base64_or_hex(trimmed)?;
    RsaPublicKey::from_public_key_der(&der)
        .or_else(|_| RsaPublicKey::from_pkcs1_der(&der))
        .map_err(|_| VerifyError::Malformed("unsupported rsa public key".into()))
}

/// EIP-191 `personal_sign` digest: prefix with
/// `"\x19Ethereum Signed Message:\n" + decimal length`, then Keccak-256
/// (legacy Keccak, not SHA3-256).
fn ethereum_personal_hash(msg: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    hasher.update(format!("\x19Ethereum Signed Message:\n{}", msg.len()));
    hasher.update(msg);
    hasher.finalize().into()
}


#[cfg(test)]
mod tests {
    use super::testkit::*;
    use super::*;
    use base64::Engine;
    use base64::engine::general_purpose::{STANDARD, STANDARD_NO_PAD};
    use rsa::pkcs1::EncodeRsaPublicKey;
    use rsa::pkcs8::EncodePublicKey;

    #[test]
    fn test_ed25519_valid_signature() {
        let (key, public_b64) = ed25519_keypair();
        let sig = ed25519_sign_b64(&key, "challenge-value");
        assert!(verify_signature(Algorithm::Ed25519, &public_b64, "challenge-value", &sig).is_ok());
    }

    #[test]
    fn test_ed25519_wrong_message_rejected() {
        let (key, public_b64) = ed25519_keypair();
        let sig = ed25519_sign_b64(&key, "challenge-value");
        let err =
            verify_signature(Algorithm::Ed25519, &public_b64, "other-value", &sig).unwrap_err();
        assert!(matches!(err, VerifyError::InvalidSignature(_)));
    }

    #[test]
    fn test_ed25519_wrong_key_rejected() {
        let (key, _) = ed25519_keypair();
        let (_, other_public) = ed25519_keypair();
        let sig = ed25519_sign_b64(&key, "challenge-value");
        assert!(verify_signature(Algorithm::Ed25519, &other_public, "challenge-value", &sig).is_err());
    }

    #[test]
    fn test_ed25519_case_sensitive_message() {
        let (key, public_b64) = ed25519_keypair();
        let sig = ed25519_sign_b64(&key, "Challenge");
        assert!(verify_signature(Algorithm::Ed25519, &public_b64, "challenge", &sig).is_err());
    }

    #[test]
    fn test_ed25519_accepts_raw_base64_and_hex() {
        let (key, public_b64) = ed25519_keypair();
        let pub_bytes = STANDARD.decode(&public_b64).unwrap();
        let sig_b64 = ed25519_sign_b64(&key, "msg");
        let sig_bytes = STANDARD.decode(&sig_b64).unwrap();

        let public_raw = STANDARD_NO_PAD.encode(&pub_bytes);
        let sig_raw = STANDARD_NO_PAD.encode(&sig_bytes);
        assert!(verify_signature(Algorithm::Ed25519, &public_raw, "msg", &sig_raw).is_ok());

        let public_hex = hex::encode(&pub_bytes);
        let sig_hex = hex::encode(&sig_bytes);
        assert!(verify_signature(Algorithm::Ed25519, &public_hex, "msg", &sig_hex).is_ok());
    }

    #[test]
    fn test_ed25519_length_mismatch_is_malformed() {
        let (key, _) = ed25519_keypair();
        let sig = ed25519_sign_b64(&key, "msg");

        let short_key = STANDARD.encode([0u8; 16]);
        let err = verify_signature(Algorithm::Ed25519, &short_key, "msg", &sig).unwrap_err();
        assert!(matches!(err, VerifyError::Malformed(_)));

        let (_, public_b64) = ed25519_keypair();
        let long_sig = STANDARD.encode([0u8; 96]);
        let err = verify_signature(Algorithm::Ed25519, &public_b64, "msg", &long_sig).unwrap_err();
        assert!(matches!(err, VerifyError::Malformed(_)));
    }

    #[test]
    fn test_ed25519_undecodable_input_is_malformed() {
        let err =
            verify_signature(Algorithm::Ed25519, "!!!", "msg", "also not encoded!").unwrap_err();
        assert!(matches!(err, VerifyError::Malformed(_)));
    }

    #[test]
    fn test_secp256k1_personal_sign_verifies() {
        let private = [0x42u8; 32];
        let (key, public_hex) = secp256k1_keypair(&private);
        let sig_hex = secp256k1_sign_prehash_hex(&key, &personal_hash("challenge-value"));
        assert!(
            verify_signature(Algorithm::Secp256k1, &public_hex, "challenge-value", &sig_hex)
                .is_ok()
        );
    }

    #[test]
    fn test_secp256k1_raw_hash_rejected() {
        // Signing the unprefixed Keccak digest must not verify: the
        // personal_sign prefix is part of the contract.
        let private = [0x42u8; 32];
        let (key, public_hex) = secp256k1_keypair(&private);
        let raw_hash: [u8; 32] = sha3::Keccak256::digest(b"challenge-value").into();
        let sig_hex = secp256k1_sign_prehash_hex(&key, &raw_hash);
        assert!(
            verify_signature(Algorithm::Secp256k1, &public_hex, "challenge-value", &sig_hex)
                .is_err()
        );
    }

    #[test]
    fn test_secp256k1_recovery_byte_ignored() {
        let private = [0x07u8; 32];
        let (key, public_hex) = secp256k1_keypair(&private);
        let sig_hex = secp256k1_sign_prehash_hex(&key, &personal_hash("msg"));
        let with_recovery = format!("{sig_hex}1b");
        assert!(verify_signature(Algorithm::Secp256k1, &public_hex, "msg", &with_recovery).is_ok());
    }

    #[test]
    fn test_secp256k1_0x_prefix_and_compressed_key() {
        let private = [0x11u8; 32];
        let (key, _) = secp256k1_keypair(&private);
        let compressed = key.verifying_key().to_encoded_point(true);
        let public_hex = format!("0x{}", hex::encode(compressed.as_bytes()));
        let sig_hex = format!("0x{}", secp256k1_sign_prehash_hex(&key, &personal_hash("msg")));
        assert!(verify_signature(Algorithm::Secp256k1, &public_hex, "msg", &sig_hex).is_ok());
    }

    #[test]
    fn test_secp256k1_short_signature_is_malformed() {
        let private = [0x11u8; 32];
        let (_, public_hex) = secp256k1_keypair(&private);
        let err = verify_signature(Algorithm::Secp256k1, &public_hex, "msg", "00ff").unwrap_err();
        assert!(matches!(err, VerifyError::Malformed(_)));
    }

    #[test]
    fn test_secp256k1_base64_key_rejected() {
        // secp256k1 inputs are hex-only; base64 is not in its decode list.
        let private = [0x11u8; 32];
        let (key, public_hex) = secp256k1_keypair(&private);
        let sig_hex = secp256k1_sign_prehash_hex(&key, &personal_hash("msg"));
        let public_b64 = STANDARD.encode(hex::decode(&public_hex).unwrap());
        assert!(verify_signature(Algorithm::Secp256k1, &public_b64, "msg", &sig_hex).is_err());
    }

    #[test]
    fn test_rsa_pss_pem_verifies() {
        let key = rsa_keypair();
        let public_pem = key
            .to_public_key()
            .to_public_key_pem(rsa::pkcs8::LineEnding::LF)
            .unwrap();
        let sig = rsa_sign_pss_b64(&key, "challenge-value");
        assert!(verify_signature(Algorithm::RsaPss, &public_pem, "challenge-value", &sig).is_ok());
    }

    #[test]
    fn test_rsa_pkcs1v15_der_verifies() {
        let key = rsa_keypair();
        let der = key.to_public_key().to_public_key_der().unwrap();
        let public_b64 = STANDARD.encode(der.as_bytes());
        let sig = rsa_sign_pkcs1v15_b64(&key, "challenge-value");
        assert!(
            verify_signature(Algorithm::RsaSha256, &public_b64, "challenge-value", &sig).is_ok()
        );
    }

    #[test]
    fn test_rsa_pkcs1_der_key_accepted() {
        let key = rsa_keypair();
        let der = key.to_public_key().to_pkcs1_der().unwrap();
        let public_hex = hex::encode(der.as_bytes());
        let sig = rsa_sign_pkcs1v15_b64(&key, "msg");
        assert!(verify_signature(Algorithm::RsaSha256, &public_hex, "msg", &sig).is_ok());
    }

    #[test]
    fn test_rsa_pss_accepts_any_salt_length() {
        // Signers disagree on the salt default: some use the digest size,
        // some the maximum the modulus can hold. Verification must accept
        // all of them. For a 2048-bit key the maximum is 256 - 32 - 2 = 222.
        let key = rsa_keypair();
        let public_pem = key
            .to_public_key()
            .to_public_key_pem(rsa::pkcs8::LineEnding::LF)
            .unwrap();
        let hashed = sha2::Sha256::digest(b"challenge-value");

        for salt_len in [0usize, 48, 222] {
            let sig = key
                .sign_with_rng(
                    &mut rand::rngs::OsRng,
                    rsa::pss::Pss::new_with_salt::<sha2::Sha256>(salt_len),
                    &hashed,
                )
                .unwrap();
            let sig_b64 = STANDARD.encode(sig);
            assert!(
                verify_signature(Algorithm::RsaPss, &public_pem, "challenge-value", &sig_b64)
                    .is_ok(),
                "salt length {salt_len} rejected"
            );
        }
    }

    #[test]
    fn test_rsa_paddings_not_interchangeable() {
        // The claimed algorithm selects the padding; a PSS signature must
        // not verify under the PKCS#1 v1.5 path or vice versa.
        let key = rsa_keypair();
        let public_pem = key
            .to_public_key()
            .to_public_key_pem(rsa::pkcs8::LineEnding::LF)
            .unwrap();
        let pss_sig = rsa_sign_pss_b64(&key, "msg");
        let v15_sig = rsa_sign_pkcs1v15_b64(&key, "msg");
        assert!(verify_signature(Algorithm::RsaSha256, &public_pem, "msg", &pss_sig).is_err());
        assert!(verify_signature(Algorithm::RsaPss, &public_pem, "msg", &v15_sig).is_err());
    }

    #[test]
    fn test_rsa_garbage_pem_is_malformed() {
        let err = verify_signature(
            Algorithm::RsaPss,
            "-----BEGIN PUBLIC KEY-----\nnot a key\n-----END PUBLIC KEY-----",
            "msg",
            "c2ln",
        )
        .unwrap_err();
        assert!(matches!(err, VerifyError::Malformed(_)));
    }
}
