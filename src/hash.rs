/// SHA-256 helpers
///
/// Hex digests are the identity of an image: extraction appends one to every
/// keyword row, and the viewer uses them to drop duplicate files.
use sha2::{Digest, Sha256};

/// Lowercase hex SHA-256 of an in-memory buffer
pub fn sha256_hex(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}

/// True for a 64-character hex token, the shape of a SHA-256 digest
pub fn is_sha256_hex(token: &str) -> bool {
    token.len() == 64 && token.bytes().all(|b| b.is_ascii_hexdigit())
}

#[cfg(test)]
mod tests {
    use super::*;

    const ABC_DIGEST: &str = "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad";

    #[test]
    fn test_known_digest() {
        assert_eq!(sha256_hex(b"abc"), ABC_DIGEST);
    }

    #[test]
    fn test_hex_token_shape() {
        assert!(is_sha256_hex(ABC_DIGEST));
        assert!(is_sha256_hex(&ABC_DIGEST.to_uppercase()));
        assert!(!is_sha256_hex(&ABC_DIGEST[..63]));
        assert!(!is_sha256_hex(&format!("{}g", &ABC_DIGEST[..63])));
    }
}
