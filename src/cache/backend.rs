//! Cache Backend Contract
//!
//! Operations shared by every cache implementation. List, stream and lock
//! operations only make sense on a network-backed store; in-memory caches keep
//! the provided defaults, which report [`CacheError::Unsupported`].

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;
use std::time::Duration;

use tempfile::NamedTempFile;

use crate::cache::Expiration;
use crate::error::{CacheError, Result};
use crate::models::Value;

/// One entry of a stream read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamEntry {
    pub id: String,
    pub fields: Vec<String>,
}

/// Uniform key-value cache contract.
pub trait KeyValueCache: Send + Sync {
    /// Returns the value under `key` if present and not expired.
    fn get(&self, key: &str) -> Option<Value>;

    /// Returns a string value; `Ok(None)` if absent, an error if not a string.
    fn get_string(&self, key: &str) -> Result<Option<String>>;

    /// Stores `value`, replacing any existing entry.
    fn set(&self, key: &str, value: Value, expiration: Expiration);

    fn exists(&self, key: &str) -> bool;

    /// Removes `key`, returning the number of entries removed.
    fn delete(&self, key: &str) -> Result<u64>;

    /// Adds `delta` to an integer value, wrapping at its width.
    fn increment(&self, key: &str, delta: i64) -> Result<i64>;

    /// Adds `delta` to a floating point value.
    fn increment_float(&self, key: &str, delta: f64) -> Result<f64>;

    /// Subtracts `delta` from an integer value, stopping at zero.
    fn decrement(&self, key: &str, delta: i64) -> Result<i64>;

    /// Removes every expired entry, returning how many were removed.
    fn delete_expired(&self) -> usize;

    fn flush(&self);

    /// Writes every entry to `writer` in the snapshot format.
    fn save(&self, writer: &mut dyn Write) -> Result<()>;

    /// Adds entries from a snapshot, keeping any live entry already present.
    /// Returns the number of entries added.
    fn load(&self, reader: &mut dyn Read) -> Result<usize>;

    /// Saves to `path`, atomically replacing any existing file.
    fn save_file(&self, path: &Path) -> Result<()> {
        let dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let tmp = NamedTempFile::new_in(dir)?;
        {
            let mut writer = BufWriter::new(tmp.as_file());
            self.save(&mut writer)?;
            writer.flush()?;
        }
        tmp.persist(path).map_err(|err| CacheError::Io(err.error))?;
        Ok(())
    }

    /// Loads entries from the snapshot at `path`.
    fn load_file(&self, path: &Path) -> Result<usize> {
        let mut reader = BufReader::new(File::open(path)?);
        self.load(&mut reader)
    }

    // == Network-Only Operations ==
    fn lpush(&self, _key: &str, _value: Value) -> Result<u64> {
        Err(CacheError::Unsupported("LPUSH"))
    }

    fn rpop(&self, _key: &str) -> Result<Option<Value>> {
        Err(CacheError::Unsupported("RPOP"))
    }

    fn xread(&self, _key: &str, _count: u64) -> Result<Vec<StreamEntry>> {
        Err(CacheError::Unsupported("XREAD"))
    }

    fn xadd(&self, _key: &str, _id: &str, _fields: &[String]) -> Result<String> {
        Err(CacheError::Unsupported("XADD"))
    }

    fn xdel(&self, _key: &str, _id: &str) -> Result<u64> {
        Err(CacheError::Unsupported("XDEL"))
    }

    /// Acquires a named lock, returning the token needed to release it.
    fn get_lock(
        &self,
        _name: &str,
        _acquire_timeout: Duration,
        _lock_timeout: Duration,
    ) -> Result<String> {
        Err(CacheError::Unsupported("GET_LOCK"))
    }

    fn release_lock(&self, _name: &str, _token: &str) -> Result<bool> {
        Err(CacheError::Unsupported("RELEASE_LOCK"))
    }
}
