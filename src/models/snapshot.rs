//! Snapshot Format
//!
//! Persisted form of a cache: a small versioned header followed by the
//! key → item map, both bincode-encoded.

use std::collections::HashMap;
use std::io::{Read, Write};

use serde::{Deserialize, Serialize};

use crate::cache::Item;
use crate::error::{CacheError, Result};

/// Leading bytes of every snapshot
pub const SNAPSHOT_MAGIC: [u8; 4] = *b"MTTC";

/// Current snapshot layout version
pub const SNAPSHOT_VERSION: u16 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct SnapshotHeader {
    magic: [u8; 4],
    version: u16,
}

// == Encode ==
/// Writes `items` to `writer`.
///
/// Values that cannot be persisted are detected before any byte is written.
pub fn encode<W: Write + ?Sized>(writer: &mut W, items: &HashMap<String, Item>) -> Result<()> {
    if let Some((key, type_name)) = items
        .iter()
        .find_map(|(key, item)| item.value.unencodable_type().map(|t| (key, t)))
    {
        return Err(CacheError::Unencodable {
            key: key.clone(),
            type_name: type_name.to_string(),
        });
    }

    let header = SnapshotHeader {
        magic: SNAPSHOT_MAGIC,
        version: SNAPSHOT_VERSION,
    };
    bincode::serialize_into(&mut *writer, &header)?;
    bincode::serialize_into(&mut *writer, items)?;
    writer.flush()?;
    Ok(())
}

// == Decode ==
/// Reads a snapshot written by [`encode`].
///
/// The whole input is buffered first so every length prefix in the body is
/// checked against the bytes actually present.
pub fn decode<R: Read + ?Sized>(reader: &mut R) -> Result<HashMap<String, Item>> {
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes)?;
    let mut input = bytes.as_slice();

    let header: SnapshotHeader = bincode::deserialize_from(&mut input)
        .map_err(|_| CacheError::InvalidSnapshot("missing or truncated header".to_string()))?;

    if header.magic != SNAPSHOT_MAGIC {
        return Err(CacheError::InvalidSnapshot(format!(
            "unexpected magic bytes {:?}",
            header.magic
        )));
    }
    if header.version != SNAPSHOT_VERSION {
        return Err(CacheError::InvalidSnapshot(format!(
            "unsupported version {} (expected {})",
            header.version, SNAPSHOT_VERSION
        )));
    }

    bincode::deserialize(input).map_err(|err| match *err {
        bincode::ErrorKind::Io(_) => {
            CacheError::InvalidSnapshot("truncated or corrupted body".to_string())
        }
        other => CacheError::Codec(other.to_string()),
    })
}
