//! User identifier codec
//!
//! Turns a `u32` user ID into the short middle segment of an API key and back.
//! The ID is XORed with the first 4 bytes of `SHA-256(secret)` and written in
//! base-62, most significant digit first, without padding:
//!
//! ```text
//! 42 -> be bytes 00 00 00 2a -> xor first 4 digest bytes -> u32 -> base62
//! ```
//!
//! # Security
//!
//! This is obfuscation, not encryption. Anyone holding two keys with known
//! user IDs can recover the mask. It only keeps raw IDs out of public key
//! material; authentication relies on the password hash of the whole key.

use sha2::{Digest, Sha256};

use crate::error::{AuthError, Result};

/// Base-62 alphabet: digits, uppercase, lowercase
pub const BASE62_ALPHABET: &[u8; 62] =
    b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";

/// Secret-keyed reversible identifier codec
///
/// Holds the derived mask so the digest is computed once per secret.
///
/// # Example
///
/// ```
/// use sublink_auth::IdentifierCodec;
///
/// let codec = IdentifierCodec::new(b"s3cret");
/// let encoded = codec.encode(42);
/// assert_eq!(codec.decode(&encoded).unwrap(), 42);
/// ```
#[derive(Clone)]
pub struct IdentifierCodec {
    mask: [u8; 4],
}

impl std::fmt::Debug for IdentifierCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentifierCodec").finish_non_exhaustive()
    }
}

impl IdentifierCodec {
    /// Create a codec for `secret`
    pub fn new(secret: &[u8]) -> Self {
        let digest = Sha256::digest(secret);
        let mut mask = [0u8; 4];
        mask.copy_from_slice(&digest[..4]);
        Self { mask }
    }

    /// Encode a user ID
    pub fn encode(&self, user_id: u32) -> String {
        let masked = self.apply_mask(user_id.to_be_bytes());
        to_base62(u32::from_be_bytes(masked))
    }

    /// Decode a user ID
    ///
    /// # Errors
    ///
    /// - [`AuthError::InvalidEncoding`] on a character outside the alphabet
    /// - [`AuthError::IdentifierOverflow`] if the value needs more than 4 bytes
    pub fn decode(&self, encoded: &str) -> Result<u32> {
        let value = from_base62(encoded)?;
        let unmasked = self.apply_mask(value.to_be_bytes());
        Ok(u32::from_be_bytes(unmasked))
    }

    #[inline]
    fn apply_mask(&self, bytes: [u8; 4]) -> [u8; 4] {
        let mut out = [0u8; 4];
        for (i, b) in bytes.iter().enumerate() {
            out[i] = b ^ self.mask[i];
        }
        out
    }
}

/// Encode `user_id` with a one-off codec
pub fn encode_user_id(user_id: u32, secret: &[u8]) -> String {
    IdentifierCodec::new(secret).encode(user_id)
}

/// Decode `encoded` with a one-off codec
pub fn decode_user_id(encoded: &str, secret: &[u8]) -> Result<u32> {
    IdentifierCodec::new(secret).decode(encoded)
}

fn to_base62(mut value: u32) -> String {
    if value == 0 {
        return "0".to_string();
    }

    // u32::MAX needs 6 digits
    let mut digits = Vec::with_capacity(6);
    while value > 0 {
        digits.push(BASE62_ALPHABET[(value % 62) as usize]);
        value /= 62;
    }
    digits.reverse();

    digits.into_iter().map(char::from).collect()
}

/// Parse base-62 text. Values wider than 32 bits are an overflow, which
/// matches left-padding the decoded bytes to 4 and rejecting anything longer.
fn from_base62(s: &str) -> Result<u32> {
    let mut value: u64 = 0;
    let mut overflow = false;

    for c in s.chars() {
        let digit = base62_digit(c).ok_or(AuthError::InvalidEncoding(c))?;
        // Keep scanning after overflow so bad characters still report as format errors
        if !overflow {
            value = value * 62 + u64::from(digit);
            overflow = value > u64::from(u32::MAX);
        }
    }

    if overflow {
        return Err(AuthError::IdentifierOverflow);
    }

    Ok(value as u32)
}

#[inline]
fn base62_digit(c: char) -> Option<u8> {
    match c {
        '0'..='9' => Some(c as u8 - b'0'),
        'A'..='Z' => Some(c as u8 - b'A' + 10),
        'a'..='z' => Some(c as u8 - b'a' + 36),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &[u8] = b"s3cret";

    #[test]
    fn test_base62_zero() {
        assert_eq!(to_base62(0), "0");
        assert_eq!(from_base62("0").unwrap(), 0);
    }

    #[test]
    fn test_base62_known_values() {
        assert_eq!(to_base62(61), "z");
        assert_eq!(to_base62(62), "10");
        assert_eq!(to_base62(3843), "zz");
        assert_eq!(from_base62("10").unwrap(), 62);
        assert_eq!(from_base62("A").unwrap(), 10);
        assert_eq!(from_base62("a").unwrap(), 36);
    }

    #[test]
    fn test_base62_max() {
        let encoded = to_base62(u32::MAX);
        assert_eq!(encoded.len(), 6);
        assert_eq!(from_base62(&encoded).unwrap(), u32::MAX);
    }

    #[test]
    fn test_base62_leading_zeros_ignored() {
        assert_eq!(from_base62("0000z").unwrap(), 61);
    }

    #[test]
    fn test_encode_zero_mask_value() {
        // The ID whose masked form is zero encodes as "0"
        let codec = IdentifierCodec::new(SECRET);
        let id = u32::from_be_bytes(codec.mask);
        assert_eq!(codec.encode(id), "0");
        assert_eq!(codec.decode("0").unwrap(), id);
    }

    #[test]
    fn test_roundtrip_edges() {
        let codec = IdentifierCodec::new(SECRET);
        for id in [0, 1, 42, 61, 62, 65_535, 1 << 24, u32::MAX - 1, u32::MAX] {
            assert_eq!(codec.decode(&codec.encode(id)).unwrap(), id, "id {}", id);
        }
    }

    #[test]
    fn test_roundtrip_sampled() {
        let codec = IdentifierCodec::new(SECRET);
        let mut id: u32 = 7;
        for _ in 0..10_000 {
            assert_eq!(codec.decode(&codec.encode(id)).unwrap(), id);
            id = id.wrapping_mul(2_654_435_761).wrapping_add(12_345);
        }
    }

    #[test]
    fn test_encoded_is_alphabet_only() {
        let codec = IdentifierCodec::new(SECRET);
        let encoded = codec.encode(42);
        assert!(!encoded.is_empty() && encoded.len() <= 6);
        assert!(encoded.bytes().all(|b| BASE62_ALPHABET.contains(&b)));
    }

    #[test]
    fn test_secret_changes_encoding() {
        let a = encode_user_id(42, b"secret-a");
        let b = encode_user_id(42, b"secret-b");
        assert_ne!(a, b);
        // Wrong secret decodes to a different ID, not an error
        assert_ne!(decode_user_id(&a, b"secret-b").unwrap(), 42);
    }

    #[test]
    fn test_invalid_character() {
        let codec = IdentifierCodec::new(SECRET);
        assert!(matches!(
            codec.decode("ab-c"),
            Err(AuthError::InvalidEncoding('-'))
        ));
        assert!(matches!(
            codec.decode("é"),
            Err(AuthError::InvalidEncoding('é'))
        ));
    }

    #[test]
    fn test_overflow() {
        let codec = IdentifierCodec::new(SECRET);
        // 62^6 > u32::MAX
        assert!(matches!(
            codec.decode("1000000"),
            Err(AuthError::IdentifierOverflow)
        ));
        assert!(matches!(
            codec.decode("zzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzz"),
            Err(AuthError::IdentifierOverflow)
        ));
    }

    #[test]
    fn test_invalid_character_after_overflow_is_format_error() {
        let codec = IdentifierCodec::new(SECRET);
        assert!(matches!(
            codec.decode("zzzzzzzzzz!"),
            Err(AuthError::InvalidEncoding('!'))
        ));
    }

    #[test]
    fn test_empty_decodes_to_mask() {
        // No digits is the value zero, same as "0"
        let codec = IdentifierCodec::new(SECRET);
        assert_eq!(codec.decode("").unwrap(), codec.decode("0").unwrap());
    }
}
