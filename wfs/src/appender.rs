//! Log appender: writes one full replacement inode plus its payload at
//! the current write head, then advances the head.
//!
//! Every mutation in this filesystem is exactly one or two calls to
//! [`append_entry`] — a replacement inode, a fresh inode, or a tombstone.
//! There is no in-place rewrite anywhere else in the codebase.

use wfs_types::{Image, InodeHeader, INODE_HEADER_SIZE};

use crate::error::{FsError, Result};

/// Append `header` followed by `payload` at the image's current write
/// head, then advance the head and flush the superblock.
///
/// Fails with [`FsError::NoSpace`] without mutating `head` if the entry
/// would overflow the image's capacity. The header is always written
/// before the payload, and `head` is only advanced after both writes
/// succeed.
pub fn append_entry(image: &mut Image, header: InodeHeader, payload: &[u8]) -> Result<()> {
    let mut sb = image.superblock();
    let header_size = *INODE_HEADER_SIZE;
    let total = header_size
        .checked_add(payload.len() as u64)
        .ok_or(FsError::NoSpace)?;
    let end = sb
        .head
        .checked_add(total)
        .ok_or(FsError::NoSpace)?;
    if end > image.capacity() {
        log::warn!(
            "appender: rejecting append of {total} bytes at head {} (capacity {})",
            sb.head,
            image.capacity()
        );
        return Err(FsError::NoSpace);
    }

    let header_bytes = bincode::serialize(&header)?;
    image.write_at(sb.head, &header_bytes)?;
    image.write_at(sb.head + header_size, payload)?;

    sb.head = end;
    image.set_superblock(sb);
    image.flush_superblock()?;
    log::debug!(
        "appender: wrote inode {} ({total} bytes), head now {}",
        header.inode_number,
        sb.head
    );
    Ok(())
}
