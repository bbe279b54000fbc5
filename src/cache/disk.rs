//! Tier 2: a content-addressed on-disk store at `<root>/<hh>/<hash>.bin`,
//! `hh` being the first two hex characters of the key so a single directory
//! never accumulates more than ~1/256th of the total entry count.
//!
//! Each blob is a fixed header (magic, format version, Unix-epoch write
//! time, TTL) followed by a `zstd`-compressed `bincode` payload. Writes go
//! through a temp file in the same directory, `fsync`'d and renamed into
//! place, so a crash mid-write never leaves a corrupt blob at the real
//! path — the same discipline the original on-disk store used for its
//! SQLite WAL checkpoints, generalized here to flat files since there is no
//! database in this cache's design.

use serde::{de::DeserializeOwned, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DiskCacheError {
    #[error("cache io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("cache entry corrupt: {0}")]
    Corrupt(String),
}

const MAGIC: [u8; 4] = *b"TIC1";
const FORMAT_VERSION: u16 = 1;
/// zstd is the only compression this store writes; kept as an explicit
/// field (rather than implied) so a future codec change can coexist with
/// old entries during a cache-root upgrade.
const COMPRESSION_ZSTD: u8 = 1;
/// Fixed serialized size of `Header` under `bincode` 1.x's fixed-width
/// integer encoding: 4 magic + 2 version + 8 created + 8 expires + 8
/// uncompressed_size + 1 compression_id.
const HEADER_LEN: usize = 31;

/// §4.8's on-disk entry header: `{ magic, version, created_unix,
/// expires_unix, uncompressed_size, compression_id }`. An entry is valid
/// iff `now < expires_unix` and magic/version match.
#[derive(Debug, Serialize, serde::Deserialize)]
struct Header {
    magic: [u8; 4],
    version: u16,
    created_unix: u64,
    expires_unix: u64,
    uncompressed_size: u64,
    compression_id: u8,
}

pub struct DiskCache {
    root: PathBuf,
    ttl_secs: u64,
    hits: AtomicU64,
    misses: AtomicU64,
    puts: AtomicU64,
    raw_bytes: AtomicU64,
    compressed_bytes: AtomicU64,
}

impl DiskCache {
    pub fn new(root: &Path, ttl_secs: u64) -> Self {
        DiskCache {
            root: root.to_path_buf(),
            ttl_secs,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            puts: AtomicU64::new(0),
            raw_bytes: AtomicU64::new(0),
            compressed_bytes: AtomicU64::new(0),
        }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        let hash = blake3::hash(key.as_bytes()).to_hex();
        let hh = &hash.as_str()[..2];
        self.root.join(hh).join(format!("{hash}.bin"))
    }

    pub fn get<V: DeserializeOwned>(&self, key: &str) -> Result<Option<V>, DiskCacheError> {
        let path = self.path_for(key);
        let bytes = match std::fs::read(&path) {
            Ok(b) => b,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                return Ok(None);
            }
            Err(e) => return Err(DiskCacheError::Io(e)),
        };

        if bytes.len() < HEADER_LEN {
            return Err(DiskCacheError::Corrupt(format!("{key}: truncated header")));
        }
        let (header_bytes, payload) = bytes.split_at(HEADER_LEN);
        let header: Header = bincode::deserialize(header_bytes)
            .map_err(|e| DiskCacheError::Corrupt(format!("{key}: {e}")))?;
        if header.magic != MAGIC || header.version != FORMAT_VERSION {
            return Err(DiskCacheError::Corrupt(format!("{key}: bad magic or version")));
        }

        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        if now >= header.expires_unix {
            let _ = std::fs::remove_file(&path);
            self.misses.fetch_add(1, Ordering::Relaxed);
            return Ok(None);
        }

        let decompressed = zstd::stream::decode_all(payload)
            .map_err(|e| DiskCacheError::Corrupt(format!("{key}: {e}")))?;
        let value: V = bincode::deserialize(&decompressed)
            .map_err(|e| DiskCacheError::Corrupt(format!("{key}: {e}")))?;

        self.hits.fetch_add(1, Ordering::Relaxed);
        Ok(Some(value))
    }

    /// Writes under the TTL fixed at construction. A thin wrapper over
    /// [`DiskCache::set`] for callers that don't need a per-entry override.
    pub fn put<V: Serialize>(&self, key: &str, value: &V) -> Result<(), DiskCacheError> {
        self.set(key, value, self.ttl_secs)
    }

    /// §4.8's `set(ttl)`: write `value` under `key` with an entry-specific
    /// TTL instead of the cache-wide default `put` uses.
    pub fn set<V: Serialize>(&self, key: &str, value: &V, ttl_secs: u64) -> Result<(), DiskCacheError> {
        let path = self.path_for(key);
        let dir = path.parent().expect("path_for always has a parent");
        std::fs::create_dir_all(dir)?;

        let created_unix = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        let raw = bincode::serialize(value).map_err(|e| DiskCacheError::Corrupt(e.to_string()))?;
        let compressed = zstd::stream::encode_all(raw.as_slice(), 3)?;

        let header = Header {
            magic: MAGIC,
            version: FORMAT_VERSION,
            created_unix,
            expires_unix: created_unix.saturating_add(ttl_secs),
            uncompressed_size: raw.len() as u64,
            compression_id: COMPRESSION_ZSTD,
        };
        let header_bytes =
            bincode::serialize(&header).map_err(|e| DiskCacheError::Corrupt(e.to_string()))?;
        debug_assert_eq!(header_bytes.len(), HEADER_LEN);

        self.raw_bytes.fetch_add(raw.len() as u64, Ordering::Relaxed);
        self.compressed_bytes
            .fetch_add(compressed.len() as u64, Ordering::Relaxed);
        self.puts.fetch_add(1, Ordering::Relaxed);

        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        tmp.write_all(&header_bytes)?;
        tmp.write_all(&compressed)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&path)
            .map_err(|e| DiskCacheError::Io(e.error))?;
        Ok(())
    }

    /// §4.8's `remove`: delete the entry for `key` if present. A missing
    /// entry is not an error.
    pub fn remove(&self, key: &str) -> Result<(), DiskCacheError> {
        match std::fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(DiskCacheError::Io(e)),
        }
    }

    /// §4.8's `exists`: whether `key` has a live (unexpired, well-formed)
    /// entry, without paying for a full payload decompress/deserialize.
    pub fn exists(&self, key: &str) -> bool {
        let path = self.path_for(key);
        let bytes = match std::fs::read(&path) {
            Ok(b) => b,
            Err(_) => return false,
        };
        if bytes.len() < HEADER_LEN {
            return false;
        }
        let header: Header = match bincode::deserialize(&bytes[..HEADER_LEN]) {
            Ok(h) => h,
            Err(_) => return false,
        };
        if header.magic != MAGIC || header.version != FORMAT_VERSION {
            return false;
        }
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        now < header.expires_unix
    }

    /// §4.8's `clear`: drop every entry under this cache's root.
    pub fn clear(&self) -> Result<(), DiskCacheError> {
        match std::fs::remove_dir_all(&self.root) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(DiskCacheError::Io(e)),
        }
    }

    /// `(hits, misses, entry_count, total_bytes_on_disk, avg_compression_ratio)`.
    pub fn stats(&self) -> (u64, u64, u64, u64, f64) {
        let raw = self.raw_bytes.load(Ordering::Relaxed);
        let compressed = self.compressed_bytes.load(Ordering::Relaxed);
        let ratio = if compressed > 0 {
            raw as f64 / compressed as f64
        } else {
            0.0
        };
        (
            self.hits.load(Ordering::Relaxed),
            self.misses.load(Ordering::Relaxed),
            self.puts.load(Ordering::Relaxed),
            compressed,
            ratio,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn put_then_get_round_trips() {
        let dir = TempDir::new().unwrap();
        let cache = DiskCache::new(dir.path(), 3600);
        cache.put("k", &vec![1u32, 2, 3]).unwrap();
        let got: Option<Vec<u32>> = cache.get("k").unwrap();
        assert_eq!(got, Some(vec![1, 2, 3]));
    }

    #[test]
    fn missing_key_is_a_clean_miss() {
        let dir = TempDir::new().unwrap();
        let cache = DiskCache::new(dir.path(), 3600);
        let got: Option<Vec<u32>> = cache.get("missing").unwrap();
        assert_eq!(got, None);
    }

    #[test]
    fn expired_entry_is_treated_as_a_miss_and_removed() {
        let dir = TempDir::new().unwrap();
        let cache = DiskCache::new(dir.path(), 0);
        cache.put("k", &42u32).unwrap();
        std::thread::sleep(std::time::Duration::from_millis(1100));
        let got: Option<u32> = cache.get("k").unwrap();
        assert_eq!(got, None);
    }

    #[test]
    fn set_overrides_the_cache_wide_ttl_per_entry() {
        let dir = TempDir::new().unwrap();
        let cache = DiskCache::new(dir.path(), 3600);
        cache.set("k", &42u32, 0).unwrap();
        std::thread::sleep(std::time::Duration::from_millis(1100));
        assert!(!cache.exists("k"));
    }

    #[test]
    fn exists_reflects_live_entries_only() {
        let dir = TempDir::new().unwrap();
        let cache = DiskCache::new(dir.path(), 3600);
        assert!(!cache.exists("k"));
        cache.put("k", &42u32).unwrap();
        assert!(cache.exists("k"));
    }

    #[test]
    fn remove_deletes_an_entry_and_is_a_no_op_when_absent() {
        let dir = TempDir::new().unwrap();
        let cache = DiskCache::new(dir.path(), 3600);
        cache.put("k", &42u32).unwrap();
        cache.remove("k").unwrap();
        assert!(!cache.exists("k"));
        cache.remove("k").unwrap();
    }

    #[test]
    fn clear_drops_every_entry() {
        let dir = TempDir::new().unwrap();
        let cache = DiskCache::new(dir.path(), 3600);
        cache.put("a", &1u32).unwrap();
        cache.put("b", &2u32).unwrap();
        cache.clear().unwrap();
        assert!(!cache.exists("a"));
        assert!(!cache.exists("b"));
    }
}
