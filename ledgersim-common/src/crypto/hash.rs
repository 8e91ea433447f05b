use sha2::{Sha256, Digest};

/// Computes the SHA-256 digest of the given data and returns it as a hex string.
pub fn digest(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    let result = hasher.finalize();
    hex::encode(result)
}

/// Computes the hash of a block header.
///
/// The hash covers, in this fixed order and with no separators:
/// - index (decimal)
/// - data
/// - previous_hash
///
/// Flags (verdict, tamper marker, author) are NOT part of the digest, so a
/// vote never changes a block's identity.
pub fn block_hash(index: u64, data: &str, previous_hash: &str) -> String {
    let material = format!("{}{}{}", index, data, previous_hash);
    digest(material.as_bytes())
}
