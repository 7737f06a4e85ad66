//! Log scanner: maps a path, or a bare inode number, to the most recent
//! live log entry.
//!
//! Every lookup is a linear scan of the log from the first byte after the
//! superblock. There is no cache of resolved entries (out of scope, per
//! the core's own design) and no indexing structure on disk — the newest
//! matching entry wins, and the scan always runs to the end-of-log
//! sentinel before committing to an answer, so a tombstone that appears
//! before a (never-written, by design) later live entry for the same
//! inode number is still handled correctly.

use wfs_types::{Image, InodeHeader, INODE_HEADER_SIZE, SUPERBLOCK_SIZE};

use crate::dir;
use crate::error::{FsError, Result};
use crate::path;

/// A resolved log entry: its inode header plus the payload bytes that
/// followed it in the log.
#[derive(Debug, Clone)]
pub struct Entry {
    /// The inode header as written.
    pub header: InodeHeader,
    /// The `header.size` bytes of payload that followed the header.
    pub payload: Vec<u8>,
}

/// Scan the whole log for the most recent entry with inode number
/// `target`. A tombstone is terminal: once the newest occurrence of
/// `target` carries `deleted = 1`, this returns [`FsError::NotFound`].
pub fn resolve_by_inode(image: &Image, target: u64) -> Result<Entry> {
    log::debug!("resolver: scanning for inode {target}");
    let header_size = *INODE_HEADER_SIZE;
    let mut offset = *SUPERBLOCK_SIZE;
    let mut latest: Option<Entry> = None;

    while offset + header_size <= image.capacity() {
        let header_bytes = image.read_at(offset, header_size)?;
        let header: InodeHeader = bincode::deserialize(&header_bytes)?;
        if header.is_sentinel() {
            break;
        }
        offset += header_size;

        if header.inode_number == target {
            if header.deleted == 1 {
                latest = None;
            } else {
                let payload = image.read_at(offset, header.size)?;
                latest = Some(Entry { header, payload });
            }
        }
        offset += header.size;
    }

    latest.ok_or(FsError::NotFound)
}

/// Walk `path` component by component from the root, resolving each
/// directory by inode number and looking up the next name inside its
/// decoded payload, exactly as a single log scan per path component.
pub fn resolve(image: &Image, path: &str) -> Result<Entry> {
    let components = path::split(path)?;
    let mut entry = resolve_by_inode(image, wfs_types::ROOT_INODE)?;

    for component in &components {
        if !entry.header.is_dir() {
            return Err(FsError::NotADirectory);
        }
        let listing = dir::decode(&entry.payload)?;
        let target = dir::lookup(&listing, component).ok_or(FsError::NotFound)?;
        entry = resolve_by_inode(image, target)?;
    }

    Ok(entry)
}

/// Scan the whole log (live and tombstoned entries alike) for the
/// largest inode number ever assigned. Returns `None` if the log holds
/// only the root entry.
///
/// Tombstoned inode numbers must never be reused, so this intentionally
/// does not filter by liveness — only [`resolve_by_inode`] does that.
pub fn max_inode_number(image: &Image) -> Result<Option<u64>> {
    let header_size = *INODE_HEADER_SIZE;
    let mut offset = *SUPERBLOCK_SIZE;
    let mut max_seen: Option<u64> = None;

    while offset + header_size <= image.capacity() {
        let header_bytes = image.read_at(offset, header_size)?;
        let header: InodeHeader = bincode::deserialize(&header_bytes)?;
        if header.is_sentinel() {
            break;
        }
        offset += header_size;
        if header.inode_number != wfs_types::ROOT_INODE {
            max_seen = Some(max_seen.map_or(header.inode_number, |m| m.max(header.inode_number)));
        }
        offset += header.size;
    }

    Ok(max_seen)
}
