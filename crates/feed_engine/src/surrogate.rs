use std::fmt::Write;

use sha2::{Digest, Sha256};

/// Surrogate id for a card without a native one: first 8 bytes of
/// `sha256(content ++ timestamp)` as lowercase hex.
pub fn surrogate_id(content: &str, now_millis: i64) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    hasher.update(now_millis.to_string().as_bytes());
    let digest = hasher.finalize();
    let mut hex = String::with_capacity(16);
    for byte in digest.iter().take(8) {
        let _ = write!(&mut hex, "{byte:02x}");
    }
    hex
}

#[cfg(test)]
mod tests {
    use super::surrogate_id;

    #[test]
    fn same_content_and_timestamp_hash_identically() {
        let first = surrogate_id("hello", 1_700_000_000_000);
        let second = surrogate_id("hello", 1_700_000_000_000);
        assert_eq!(first, second);
        assert_eq!(first.len(), 16);
        assert!(first.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn timestamp_and_content_both_feed_the_hash() {
        let base = surrogate_id("hello", 1);
        assert_ne!(base, surrogate_id("hello", 2));
        assert_ne!(base, surrogate_id("hellO", 1));
    }
}
