//! Workspace fingerprinting (§3 `WorkspaceRoot::fingerprint`, §8 "Cache
//! determinism"): a stable hash over the ordered set of included files,
//! used as a cache key so a rebuild of an unchanged workspace hits the
//! persisted cache rather than re-parsing.

use crate::model::SourceFile;

/// Hash the ordered `(path, size, content_hash)` tuples of `files` into a
/// single 32-hex-char string. `files` must already be sorted by path (as
/// `resolve` guarantees) so the fingerprint is order-independent of
/// filesystem walk order.
pub fn fingerprint_files(files: &[SourceFile]) -> String {
    let mut hasher = blake3::Hasher::new();
    for file in files {
        hasher.update(file.path.to_string_lossy().as_bytes());
        hasher.update(&[0]);
        hasher.update(&file.size.to_le_bytes());
        hasher.update(file.content_hash.as_bytes());
        hasher.update(&[0]);
    }
    hasher.finalize().to_hex()[..32].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn file(path: &str, hash: &str) -> SourceFile {
        SourceFile {
            path: PathBuf::from(path),
            content: String::new(),
            content_hash: hash.to_string(),
            size: 10,
        }
    }

    #[test]
    fn fingerprint_is_deterministic() {
        let files = vec![file("a.rs", "h1"), file("b.rs", "h2")];
        assert_eq!(fingerprint_files(&files), fingerprint_files(&files));
    }

    #[test]
    fn fingerprint_changes_when_content_hash_changes() {
        let a = vec![file("a.rs", "h1")];
        let b = vec![file("a.rs", "h2")];
        assert_ne!(fingerprint_files(&a), fingerprint_files(&b));
    }

    #[test]
    fn fingerprint_is_sensitive_to_order() {
        let a = vec![file("a.rs", "h1"), file("b.rs", "h2")];
        let b = vec![file("b.rs", "h2"), file("a.rs", "h1")];
        assert_ne!(fingerprint_files(&a), fingerprint_files(&b));
    }

    #[test]
    fn fingerprint_is_32_hex_chars() {
        let files = vec![file("a.rs", "h1")];
        let fp = fingerprint_files(&files);
        assert_eq!(fp.len(), 32);
        assert!(fp.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
