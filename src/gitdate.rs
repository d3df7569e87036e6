//! Git first-introduction dates, memoized in a persistent cache.
//!
//! Resolving the date a file was first committed requires one `git log`
//! invocation per file, which takes hours across the full upstream trees.
//! Results are therefore cached in a flat file per provider, optionally
//! AES-256-GCM-encrypted with an out-of-band key. A missing key disables
//! persistence but not in-memory caching; any load, decrypt or deserialize
//! error degrades to an empty cache and is reported, never raised.

use aes_gcm::aead::{Aead, AeadCore, KeyInit, OsRng};
use aes_gcm::{Aes256Gcm, Nonce};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::path::Path;
use std::process::Command;
use std::sync::{PoisonError, RwLock};
use tracing::{debug, info, warn};

/// Mapping of repo-relative path to first-introduction timestamp.
///
/// Safe for concurrent reads and writes from multiple harvest workers; only
/// the final checkpoint save is single-threaded.
#[derive(Debug, Default)]
pub struct DateCache {
    entries: RwLock<HashMap<String, DateTime<Utc>>>,
}

impl DateCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the cache from `path`, decrypting with `key`.
    ///
    /// Every failure mode (missing file, wrong key, corrupt payload) returns
    /// an empty, usable cache.
    pub fn load(path: &Path, key: Option<&[u8]>) -> Self {
        let cache = Self::new();
        let Some(key) = key else {
            debug!(path = %path.display(), "no cache key, starting with an empty cache");
            return cache;
        };

        let ciphertext = match std::fs::read(path) {
            Ok(bytes) => bytes,
            Err(err) => {
                info!(path = %path.display(), error = %err, "no date cache yet");
                return cache;
            }
        };

        let Some(plaintext) = decipher(key, &ciphertext) else {
            warn!(path = %path.display(), "could not decrypt date cache, starting empty");
            return cache;
        };

        match serde_json::from_slice::<HashMap<String, DateTime<Utc>>>(&plaintext) {
            Ok(map) => {
                info!(path = %path.display(), entries = map.len(), "loaded date cache");
                *cache.entries.write().unwrap_or_else(PoisonError::into_inner) = map;
            }
            Err(err) => {
                warn!(path = %path.display(), error = %err, "could not parse date cache, starting empty");
            }
        }
        cache
    }

    /// Checkpoint the cache to `path`, encrypted with `key`.
    ///
    /// Without a key the cache is simply not persisted. Errors are logged
    /// and swallowed: a lost cache only costs recomputation time.
    pub fn save(&self, path: &Path, key: Option<&[u8]>) {
        let Some(key) = key else {
            return;
        };

        let map = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        let plaintext = match serde_json::to_vec(&*map) {
            Ok(bytes) => bytes,
            Err(err) => {
                warn!(path = %path.display(), error = %err, "could not serialize date cache");
                return;
            }
        };
        drop(map);

        let Some(ciphertext) = encipher(key, &plaintext) else {
            warn!(path = %path.display(), "could not encrypt date cache");
            return;
        };
        if let Err(err) = std::fs::write(path, ciphertext) {
            warn!(path = %path.display(), error = %err, "could not write date cache");
        }
    }

    pub fn get(&self, rel_path: &str) -> Option<DateTime<Utc>> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(rel_path)
            .copied()
    }

    pub fn insert(&self, rel_path: &str, date: DateTime<Utc>) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(rel_path.to_string(), date);
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(PoisonError::into_inner).len()
    }
}

/// Resolve the author date of the oldest commit that added `rel_path`.
///
/// On cache hit, the cached value is returned. On miss, `git log` is queried
/// and the result cached. If the query fails in any way, `default` is
/// returned without caching; this never fails the caller.
pub fn date_from_git(
    repo_root: &Path,
    rel_path: &str,
    cache: &DateCache,
    default: DateTime<Utc>,
) -> DateTime<Utc> {
    let rel_path = rel_path.replace('\\', "/");

    if let Some(cached) = cache.get(&rel_path) {
        return cached;
    }

    let output = Command::new("git")
        .args(["log", "--diff-filter=A", "--format=%ad", "--date=iso", "--"])
        .arg(&rel_path)
        .current_dir(repo_root)
        .output();

    let raw = match output {
        Ok(out) if out.status.success() => out.stdout,
        _ => return default,
    };

    // The oldest commit that added the file is the last line of the log.
    let text = String::from_utf8_lossy(&raw);
    let Some(line) = text.lines().rev().find(|l| !l.trim().is_empty()) else {
        return default;
    };

    match DateTime::parse_from_str(line.trim(), "%Y-%m-%d %H:%M:%S %z") {
        Ok(parsed) => {
            let parsed = parsed.with_timezone(&Utc);
            cache.insert(&rel_path, parsed);
            parsed
        }
        Err(_) => default,
    }
}

fn encipher(key: &[u8], plaintext: &[u8]) -> Option<Vec<u8>> {
    let cipher = match Aes256Gcm::new_from_slice(key) {
        Ok(cipher) => cipher,
        Err(err) => {
            warn!(error = %err, "invalid date cache key (expected 32 bytes)");
            return None;
        }
    };
    let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
    let sealed = cipher.encrypt(&nonce, plaintext).ok()?;
    // Random nonce prefix, then the sealed payload.
    let mut out = nonce.to_vec();
    out.extend(sealed);
    Some(out)
}

fn decipher(key: &[u8], ciphertext: &[u8]) -> Option<Vec<u8>> {
    let cipher = match Aes256Gcm::new_from_slice(key) {
        Ok(cipher) => cipher,
        Err(err) => {
            warn!(error = %err, "invalid date cache key (expected 32 bytes)");
            return None;
        }
    };
    const NONCE_SIZE: usize = 12;
    if ciphertext.len() < NONCE_SIZE {
        return None;
    }
    let (nonce, sealed) = ciphertext.split_at(NONCE_SIZE);
    cipher.decrypt(Nonce::from_slice(nonce), sealed).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::default_date;
    use chrono::TimeZone;

    const KEY: &[u8] = b"0123456789abcdef0123456789abcdef";

    #[test]
    fn encrypt_decrypt_round_trip() {
        let sealed = encipher(KEY, b"payload").unwrap();
        assert_ne!(&sealed[12..], b"payload");
        assert_eq!(decipher(KEY, &sealed).unwrap(), b"payload");
    }

    #[test]
    fn wrong_key_fails_closed() {
        let sealed = encipher(KEY, b"payload").unwrap();
        let other = b"ffffffffffffffffffffffffffffffff";
        assert_eq!(decipher(other, &sealed), None);
    }

    #[test]
    fn save_and_load_with_key() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dates.cache");

        let cache = DateCache::new();
        let date = Utc.with_ymd_and_hms(2020, 5, 4, 10, 30, 0).unwrap();
        cache.insert("exploits/linux/local/x.rb", date);
        cache.save(&path, Some(KEY));

        let loaded = DateCache::load(&path, Some(KEY));
        assert_eq!(loaded.get("exploits/linux/local/x.rb"), Some(date));
    }

    #[test]
    fn load_without_key_is_empty_but_usable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dates.cache");
        let cache = DateCache::load(&path, None);
        assert_eq!(cache.len(), 0);
        cache.insert("a", default_date());
        assert!(cache.get("a").is_some());
    }

    #[test]
    fn corrupt_cache_degrades_to_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dates.cache");
        std::fs::write(&path, b"not a cache at all").unwrap();
        let cache = DateCache::load(&path, Some(KEY));
        assert_eq!(cache.len(), 0);
    }

    #[test]
    fn save_without_key_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dates.cache");
        let cache = DateCache::new();
        cache.insert("a", default_date());
        cache.save(&path, None);
        assert!(!path.exists());
    }

    #[test]
    fn git_query_failure_returns_default() {
        let dir = tempfile::tempdir().unwrap(); // not a git repository
        let cache = DateCache::new();
        let resolved = date_from_git(dir.path(), "some/file.md", &cache, default_date());
        assert_eq!(resolved, default_date());
        assert_eq!(cache.len(), 0); // failures are never cached
    }

    #[test]
    fn cache_hit_skips_git() {
        let dir = tempfile::tempdir().unwrap();
        let cache = DateCache::new();
        let date = Utc.with_ymd_and_hms(2019, 1, 2, 3, 4, 5).unwrap();
        cache.insert("some/file.md", date);
        let resolved = date_from_git(dir.path(), "some\\file.md", &cache, default_date());
        assert_eq!(resolved, date);
    }
}
