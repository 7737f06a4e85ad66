//! Directory payload layout: a packed array of fixed-size name-to-inode
//! records, with no holes.
//!
//! Mutations never rewrite a payload in place. Callers decode the current
//! payload, build a new in-memory list of entries, and re-encode the
//! whole thing as a single replacement payload for the appender.

use wfs_types::{DEntry, DENTRY_SIZE, MAX_NAME};

use crate::error::{FsError, Result};

/// Decode a directory payload into an ordered list of `(name, inode_number)`
/// pairs, in the order they were inserted.
pub fn decode(payload: &[u8]) -> Result<Vec<(String, u64)>> {
    let entry_size = *DENTRY_SIZE as usize;
    if entry_size == 0 || payload.len() % entry_size != 0 {
        return Err(FsError::Image(wfs_types::WfsError::OutOfRange(
            "directory payload is not a multiple of the dentry size",
        )));
    }
    let mut entries = Vec::with_capacity(payload.len() / entry_size);
    for chunk in payload.chunks_exact(entry_size) {
        let dentry: DEntry = bincode::deserialize(chunk)?;
        entries.push((dentry.name_str(), dentry.inode_number));
    }
    Ok(entries)
}

/// Encode an ordered list of `(name, inode_number)` pairs into a packed
/// directory payload.
pub fn encode(entries: &[(String, u64)]) -> Result<Vec<u8>> {
    let mut payload = Vec::with_capacity(entries.len() * *DENTRY_SIZE as usize);
    for (name, inode_number) in entries {
        let dentry = DEntry::new(name, *inode_number).ok_or(FsError::NameTooLong)?;
        payload.extend_from_slice(&bincode::serialize(&dentry)?);
    }
    Ok(payload)
}

/// Decode `payload`, append a new `(name, inode_number)` entry, and
/// re-encode. Fails if `name` already exists, or is too long.
pub fn insert(payload: &[u8], name: &str, inode_number: u64) -> Result<Vec<u8>> {
    let mut entries = decode(payload)?;
    if entries.iter().any(|(n, _)| n == name) {
        return Err(FsError::AlreadyExists);
    }
    if name.is_empty() || name.len() > MAX_NAME {
        return Err(FsError::NameTooLong);
    }
    entries.push((name.to_string(), inode_number));
    encode(&entries)
}

/// Decode `payload`, drop the entry named `name`, and re-encode. Fails if
/// no entry has that name.
pub fn remove(payload: &[u8], name: &str) -> Result<Vec<u8>> {
    let mut entries = decode(payload)?;
    let before = entries.len();
    entries.retain(|(n, _)| n != name);
    if entries.len() == before {
        return Err(FsError::NotFound);
    }
    encode(&entries)
}

/// Find the inode number for `name` inside a decoded directory listing.
pub fn lookup(entries: &[(String, u64)], name: &str) -> Option<u64> {
    entries.iter().find(|(n, _)| n == name).map(|(_, i)| *i)
}
