//! On-disk layout: superblock, inode header, directory entry.
//!
//! Every structure here derives `Serialize`/`Deserialize` so it can be
//! pushed through `bincode` the same way it is pushed to and from the
//! backing image. None of these types carry policy: they only describe
//! byte layout and the fixed sizes that `mkfs` and `mount` must agree on.

use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};

/// Format tag stored in the superblock and checked at mount.
pub const WFS_MAGIC: u32 = 0x5746_5331; // "WFS1"

/// Default capacity of a freshly formatted image, in bytes.
pub const DISK_SIZE: u64 = 1024 * 1024;

/// Fixed length of the name field inside a [`DEntry`].
pub const MAX_NAME: usize = 28;

/// Inode number of the root directory. Reserved, never reused, never
/// deleted.
pub const ROOT_INODE: u64 = 0;

/// Superblock: fixed header stored at offset 0 of the image.
#[derive(Serialize, Deserialize, Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Superblock {
    /// Format tag, validated on mount.
    pub magic: u32,
    /// Absolute byte offset of the next free byte in the log region.
    pub head: u64,
}

lazy_static! {
    /// Size of a serialized [`Superblock`], in bytes. Computed once at
    /// runtime since `bincode`'s encoding width is not a compile-time
    /// constant we want to hand-derive and keep in sync by hand.
    pub static ref SUPERBLOCK_SIZE: u64 =
        bincode::serialize(&Superblock::default()).unwrap().len() as u64;
}

/// Inode header: fixed-size metadata record immediately preceding a log
/// entry's payload.
#[derive(Serialize, Deserialize, Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct InodeHeader {
    /// Stable identity across rewrites. `ROOT_INODE` is reserved for root.
    pub inode_number: u64,
    /// Tombstone flag: 0 live, 1 deleted. Terminal once set.
    pub deleted: u8,
    /// POSIX mode bits; type is extracted via the `S_IFDIR`/`S_IFREG` masks.
    pub mode: u32,
    /// Owning user ID.
    pub uid: u32,
    /// Owning group ID.
    pub gid: u32,
    /// Reserved for future use; always 0.
    pub flags: u32,
    /// Payload length in bytes, following this header in the log.
    pub size: u64,
    /// `atime == 0` marks this byte position as past the end of the log.
    pub atime: i64,
    /// Last content modification time, unix seconds.
    pub mtime: i64,
    /// Last metadata change time, unix seconds.
    pub ctime: i64,
    /// Number of directory entries that currently reference this inode.
    /// Hard links are not supported; this never exceeds 1.
    pub links: u16,
}

lazy_static! {
    /// Size of a serialized [`InodeHeader`], in bytes.
    pub static ref INODE_HEADER_SIZE: u64 =
        bincode::serialize(&InodeHeader::default()).unwrap().len() as u64;
}

impl InodeHeader {
    /// Whether this header marks the past-end-of-log sentinel position.
    pub fn is_sentinel(&self) -> bool {
        self.atime == 0
    }

    /// Whether the type bits mark a directory.
    pub fn is_dir(&self) -> bool {
        self.mode & libc_mode::S_IFDIR == libc_mode::S_IFDIR
    }

    /// Whether the type bits mark a regular file.
    pub fn is_file(&self) -> bool {
        self.mode & libc_mode::S_IFMT == libc_mode::S_IFREG
    }
}

/// Fixed-length name-to-inode record inside a directory's payload.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct DEntry {
    /// Null-padded name. Not necessarily null-terminated if the name
    /// exactly fills the field.
    pub name: [u8; MAX_NAME],
    /// Inode number this entry points to.
    pub inode_number: u64,
}

impl Default for DEntry {
    fn default() -> Self {
        DEntry {
            name: [0u8; MAX_NAME],
            inode_number: 0,
        }
    }
}

lazy_static! {
    /// Size of a serialized [`DEntry`], in bytes.
    pub static ref DENTRY_SIZE: u64 =
        bincode::serialize(&DEntry::default()).unwrap().len() as u64;
}

impl DEntry {
    /// Build a dentry for `name` pointing at `inode_number`.
    ///
    /// Returns `None` if `name`'s UTF-8 byte length does not fit the fixed
    /// field (leaving room for a trailing NUL unless the name exactly
    /// fills it).
    pub fn new(name: &str, inode_number: u64) -> Option<DEntry> {
        let bytes = name.as_bytes();
        if bytes.is_empty() || bytes.len() > MAX_NAME {
            return None;
        }
        let mut packed = [0u8; MAX_NAME];
        packed[..bytes.len()].copy_from_slice(bytes);
        Some(DEntry {
            name: packed,
            inode_number,
        })
    }

    /// Decode this entry's name, stopping at the first NUL byte.
    pub fn name_str(&self) -> String {
        let end = self
            .name
            .iter()
            .position(|&b| b == 0)
            .unwrap_or(self.name.len());
        String::from_utf8_lossy(&self.name[..end]).into_owned()
    }
}

/// POSIX mode bit masks this crate cares about, lifted from `libc` so the
/// type layer does not depend on the `libc` crate directly.
pub mod libc_mode {
    /// File type mask.
    pub const S_IFMT: u32 = 0o170000;
    /// Directory type bits.
    pub const S_IFDIR: u32 = 0o040000;
    /// Regular file type bits.
    pub const S_IFREG: u32 = 0o100000;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_sentinel() {
        let h = InodeHeader::default();
        assert!(h.is_sentinel());
        let h = InodeHeader {
            atime: 1,
            ..Default::default()
        };
        assert!(!h.is_sentinel());
    }

    #[test]
    fn header_type_bits() {
        let dir = InodeHeader {
            mode: libc_mode::S_IFDIR | 0o755,
            ..Default::default()
        };
        assert!(dir.is_dir());
        assert!(!dir.is_file());

        let file = InodeHeader {
            mode: libc_mode::S_IFREG | 0o644,
            ..Default::default()
        };
        assert!(file.is_file());
        assert!(!file.is_dir());
    }

    #[test]
    fn dentry_roundtrip_name() {
        let d = DEntry::new("hello", 7).unwrap();
        assert_eq!(d.name_str(), "hello");
        assert_eq!(d.inode_number, 7);
    }

    #[test]
    fn dentry_rejects_oversized_name() {
        let too_long: String = "a".repeat(MAX_NAME + 1);
        assert!(DEntry::new(&too_long, 1).is_none());
    }

    #[test]
    fn dentry_exact_fit_name_has_no_terminator() {
        let exact: String = "a".repeat(MAX_NAME);
        let d = DEntry::new(&exact, 1).unwrap();
        assert_eq!(d.name_str(), exact);
    }

    #[test]
    fn fixed_sizes_are_consistent() {
        let a = bincode::serialize(&DEntry::default()).unwrap().len() as u64;
        let b = bincode::serialize(&DEntry::new("x", 99).unwrap())
            .unwrap()
            .len() as u64;
        assert_eq!(a, b);
        assert_eq!(a, *DENTRY_SIZE);
    }
}
