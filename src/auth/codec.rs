//! Key and signature decoding.
//!
//! Clients supply key material in whatever encoding their tooling emits, so
//! decoding is an explicit ordered attempt list per input, early-exit on the
//! first encoding that parses. Keeps the failure modes enumerable instead of
//! guessing formats all over the verifier.

use base64::Engine;
use base64::engine::general_purpose::{STANDARD, STANDARD_NO_PAD, URL_SAFE_NO_PAD};
use rand::RngCore;
use rand::rngs::OsRng;

use super::error::VerifyError;

/// Decode base64 (standard, then unpadded standard), falling back to hex.
///
/// Order matters: padded base64 is tried first so inputs that happen to be
/// valid under several encodings decode deterministically.
pub fn decode_base64_or_hex(input: &str) -> Result<Vec<u8>, VerifyError> {
    if let Ok(b) = STANDARD.decode(input) {
        return Ok(b);
    }
    if let Ok(b) = STANDARD_NO_PAD.decode(input) {
        return Ok(b);
    }
    decode_hex(input)
}

/// Decode hex, tolerating surrounding whitespace and a single `0x` prefix.
pub fn decode_hex(input: &str) -> Result<Vec<u8>, VerifyError> {
    let clean = input.trim();
    let clean = clean.strip_prefix("0x").unwrap_or(clean);
    hex::decode(clean).map_err(|e| VerifyError::Malformed(format!("bad hex: {e}")))
}

/// Generate an opaque random value: `size` bytes of OS entropy, URL-safe
/// base64 without padding. Used for both challenges and bearer tokens.
pub fn random_token(size: usize) -> String {
    let mut buf = vec![0u8; size];
    OsRng.fill_bytes(&mut buf);
    URL_SAFE_NO_PAD.encode(buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_standard_base64() {
        assert_eq!(decode_base64_or_hex("aGVsbG8=").unwrap(), b"hello");
    }

    #[test]
    fn test_decode_unpadded_base64() {
        assert_eq!(decode_base64_or_hex("aGVsbG8").unwrap(), b"hello");
    }

    #[test]
    fn test_decode_hex_fallback() {
        assert_eq!(decode_base64_or_hex("68656c6c6f21").unwrap(), b"hello!");
    }

    #[test]
    fn test_decode_hex_strips_0x_prefix() {
        assert_eq!(decode_hex("0xdeadbeef").unwrap(), vec![0xde, 0xad, 0xbe, 0xef]);
        assert_eq!(decode_hex("  deadbeef  ").unwrap(), vec![0xde, 0xad, 0xbe, 0xef]);
    }

    #[test]
    fn test_decode_hex_strips_0x_at_most_once() {
        // A doubled prefix is not valid hex once the first `0x` is gone.
        assert!(decode_hex("0x0xdeadbeef").is_err());
    }

    #[test]
    fn test_decode_garbage_rejected() {
        assert!(decode_base64_or_hex("!!not an encoding!!").is_err());
        assert!(decode_hex("xyz").is_err());
    }

    #[test]
    fn test_random_token_entropy() {
        let a = random_token(32);
        let b = random_token(32);
        assert_ne!(a, b);
        // 32 bytes -> 43 base64 chars unpadded
        assert_eq!(a.len(), 43);
        assert!(!a.contains('+') && !a.contains('/') && !a.contains('='));
    }
}
