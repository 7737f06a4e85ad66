//! Vnode-operation surface: `getattr`, `readdir`, `mknod`, `mkdir`,
//! `write`, `read`, `unlink`, each taking an absolute POSIX path.
//!
//! [`Filesystem`] bundles the open image and the persisted next-inode
//! counter into one context (Design Note: no process-wide globals), and
//! every method here maps directly onto `spec.md` §4.6's table, including
//! the child-first ordering rule for the two-entry mutations.

use wfs_types::{types::libc_mode, Image, InodeHeader, WFS_MAGIC};

use crate::appender;
use crate::dir;
use crate::error::{FsError, Result};
use crate::now_secs;
use crate::path;
use crate::resolver;

/// Stat-like view of a resolved inode, returned by [`Filesystem::getattr`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Attr {
    /// Stable inode identity.
    pub inode_number: u64,
    /// POSIX mode bits, including the file-type bits.
    pub mode: u32,
    /// Number of directory entries referencing this inode (never > 1).
    pub nlink: u16,
    /// Owning user ID.
    pub uid: u32,
    /// Owning group ID.
    pub gid: u32,
    /// Payload size in bytes.
    pub size: u64,
    /// Last access time, unix seconds.
    pub atime: i64,
    /// Last content modification time, unix seconds.
    pub mtime: i64,
    /// Last metadata change time, unix seconds.
    pub ctime: i64,
}

impl From<&InodeHeader> for Attr {
    fn from(header: &InodeHeader) -> Self {
        Attr {
            inode_number: header.inode_number,
            mode: header.mode,
            nlink: header.links,
            uid: header.uid,
            gid: header.gid,
            size: header.size,
            atime: header.atime,
            mtime: header.mtime,
            ctime: header.ctime,
        }
    }
}

/// Mutable filesystem context: the open image plus the next inode number
/// to assign. Constructed once per mount.
pub struct Filesystem {
    image: Image,
    next_inode: u64,
}

impl Filesystem {
    /// Open a filesystem over an already-loaded [`Image`], validating the
    /// superblock magic and deriving the next-inode counter by scanning
    /// the whole log for the largest inode number ever assigned.
    pub fn open(image: Image) -> Result<Filesystem> {
        if image.superblock().magic != WFS_MAGIC {
            return Err(FsError::Image(wfs_types::WfsError::InvalidFormat));
        }
        let next_inode = match resolver::max_inode_number(&image)? {
            Some(max) => max + 1,
            None => wfs_types::ROOT_INODE + 1,
        };
        log::debug!("filesystem: mounted, next inode number {next_inode}");
        Ok(Filesystem { image, next_inode })
    }

    /// Fill a stat-like record for the resolved path.
    pub fn getattr(&self, path: &str) -> Result<Attr> {
        let entry = resolver::resolve(&self.image, path)?;
        Ok(Attr::from(&entry.header))
    }

    /// Invoke `sink` once per directory entry in `path`'s payload, in
    /// insertion order. Stops and returns [`FsError::BufferFull`] the
    /// first time `sink` returns `false`.
    pub fn readdir(&self, path: &str, sink: &mut dyn FnMut(&str, u64) -> bool) -> Result<()> {
        let entry = resolver::resolve(&self.image, path)?;
        if !entry.header.is_dir() {
            return Err(FsError::NotADirectory);
        }
        for (name, inode_number) in dir::decode(&entry.payload)? {
            if !sink(&name, inode_number) {
                return Err(FsError::BufferFull);
            }
        }
        Ok(())
    }

    /// Create a regular file at `path`. Returns the new inode number.
    pub fn mknod(&mut self, path: &str, mode: u32) -> Result<u64> {
        self.create(path, (mode & !libc_mode::S_IFMT) | libc_mode::S_IFREG)
    }

    /// Create a directory at `path`. Returns the new inode number.
    pub fn mkdir(&mut self, path: &str, mode: u32) -> Result<u64> {
        self.create(path, (mode & !libc_mode::S_IFMT) | libc_mode::S_IFDIR)
    }

    fn create(&mut self, target_path: &str, mode: u32) -> Result<u64> {
        match resolver::resolve(&self.image, target_path) {
            Ok(_) => return Err(FsError::AlreadyExists),
            Err(FsError::NotFound) => {}
            Err(e) => return Err(e),
        }

        let name = path::basename(target_path)?;
        if name.is_empty() {
            return Err(FsError::InvalidPath);
        }
        let parent_path = path::parent(target_path)?;
        let parent_entry = resolver::resolve(&self.image, &parent_path)?;
        if !parent_entry.header.is_dir() {
            return Err(FsError::NotADirectory);
        }

        let new_inode_number = self.next_inode;
        let now = now_secs();
        // SAFETY: getuid/getgid take no arguments and cannot fail.
        let (uid, gid) = unsafe { (libc::getuid(), libc::getgid()) };
        let child = InodeHeader {
            inode_number: new_inode_number,
            deleted: 0,
            mode,
            uid,
            gid,
            flags: 0,
            size: 0,
            atime: now,
            mtime: now,
            ctime: now,
            links: 1,
        };
        // Child first: if a crash truncates the log here, the child is
        // orphaned garbage but the parent directory stays consistent.
        appender::append_entry(&mut self.image, child, &[])?;

        let new_payload = dir::insert(&parent_entry.payload, &name, new_inode_number)?;
        let parent_header = InodeHeader {
            size: new_payload.len() as u64,
            mtime: now,
            ctime: now,
            ..parent_entry.header
        };
        appender::append_entry(&mut self.image, parent_header, &new_payload)?;

        self.next_inode += 1;
        Ok(new_inode_number)
    }

    /// Write `buf` into the regular file at `path` starting at `offset`.
    /// Returns the number of bytes written (always `buf.len()`).
    pub fn write(&mut self, target_path: &str, buf: &[u8], offset: u64) -> Result<u64> {
        let entry = resolver::resolve(&self.image, target_path)?;
        if entry.header.is_dir() {
            return Err(FsError::IsADirectory);
        }

        let end = offset
            .checked_add(buf.len() as u64)
            .ok_or(FsError::Image(wfs_types::WfsError::OutOfRange(
                "write range overflows u64",
            )))?;
        let new_size = entry.header.size.max(end);

        let mut new_payload = vec![0u8; new_size as usize];
        new_payload[..entry.payload.len()].copy_from_slice(&entry.payload);
        new_payload[offset as usize..end as usize].copy_from_slice(buf);

        let now = now_secs();
        let header = InodeHeader {
            size: new_size,
            mtime: now,
            ctime: now,
            ..entry.header
        };
        appender::append_entry(&mut self.image, header, &new_payload)?;
        Ok(buf.len() as u64)
    }

    /// Copy up to `size` bytes of the regular file at `path`, starting at
    /// `offset`, into a freshly allocated buffer.
    pub fn read(&self, target_path: &str, size: u64, offset: u64) -> Result<Vec<u8>> {
        let entry = resolver::resolve(&self.image, target_path)?;
        if entry.header.is_dir() {
            return Err(FsError::IsADirectory);
        }
        if offset >= entry.header.size {
            return Ok(Vec::new());
        }
        let available = entry.header.size - offset;
        let n = size.min(available) as usize;
        let start = offset as usize;
        Ok(entry.payload[start..start + n].to_vec())
    }

    /// Remove the non-directory entry at `path`: tombstones the inode and
    /// rewrites the parent directory without the dentry.
    pub fn unlink(&mut self, target_path: &str) -> Result<()> {
        let entry = resolver::resolve(&self.image, target_path)?;
        if entry.header.is_dir() {
            return Err(FsError::IsADirectory);
        }

        let name = path::basename(target_path)?;
        let parent_path = path::parent(target_path)?;
        let parent_entry = resolver::resolve(&self.image, &parent_path)?;

        let now = now_secs();
        // Child first, matching the create-path ordering rule.
        let tombstone = InodeHeader {
            deleted: 1,
            size: 0,
            mtime: now,
            ctime: now,
            ..entry.header
        };
        appender::append_entry(&mut self.image, tombstone, &[])?;

        let new_payload = dir::remove(&parent_entry.payload, &name)?;
        let parent_header = InodeHeader {
            size: new_payload.len() as u64,
            mtime: now,
            ctime: now,
            ..parent_entry.header
        };
        appender::append_entry(&mut self.image, parent_header, &new_payload)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::remove_file;
    use std::path::PathBuf;

    fn fresh_fs(name: &str) -> (PathBuf, Filesystem) {
        let mut p = std::env::temp_dir();
        p.push(format!("wfs-ops-test-{name}"));
        if p.exists() {
            remove_file(&p).unwrap();
        }
        crate::mkfs::format(&p, wfs_types::DISK_SIZE).unwrap();
        let image = Image::open_existing(&p).unwrap();
        (p, Filesystem::open(image).unwrap())
    }

    #[test]
    fn mkdir_then_readdir_lists_child_exactly_once() {
        let (p, mut fs) = fresh_fs("mkdir-readdir");
        fs.mkdir("/a", 0o755).unwrap();
        fs.mkdir("/a/b", 0o755).unwrap();

        let mut names = Vec::new();
        fs.readdir("/a", &mut |name, _ino| {
            names.push(name.to_string());
            true
        })
        .unwrap();
        assert_eq!(names, vec!["b"]);
        remove_file(&p).unwrap();
    }

    #[test]
    fn mknod_then_getattr_reports_regular_empty_file() {
        let (p, mut fs) = fresh_fs("mknod-getattr");
        fs.mknod("/f", 0o644).unwrap();
        let attr = fs.getattr("/f").unwrap();
        assert_eq!(attr.mode & libc_mode::S_IFREG, libc_mode::S_IFREG);
        assert_eq!(attr.size, 0);
        assert_eq!(attr.nlink, 1);
        remove_file(&p).unwrap();
    }

    #[test]
    fn write_then_read_roundtrips() {
        let (p, mut fs) = fresh_fs("write-read");
        fs.mknod("/f", 0o644).unwrap();
        fs.write("/f", b"hello", 0).unwrap();
        assert_eq!(fs.getattr("/f").unwrap().size, 5);
        assert_eq!(fs.read("/f", 5, 0).unwrap(), b"hello");
        remove_file(&p).unwrap();
    }

    #[test]
    fn write_past_end_extends_and_appends() {
        let (p, mut fs) = fresh_fs("write-extend");
        fs.mknod("/f", 0o644).unwrap();
        fs.write("/f", b"hello", 0).unwrap();
        fs.write("/f", b"WORLD", 5).unwrap();
        assert_eq!(fs.getattr("/f").unwrap().size, 10);
        assert_eq!(fs.read("/f", 10, 0).unwrap(), b"helloWORLD");
        remove_file(&p).unwrap();
    }

    #[test]
    fn write_in_place_overwrite_honors_offset() {
        let (p, mut fs) = fresh_fs("write-overwrite");
        fs.mknod("/f", 0o644).unwrap();
        fs.write("/f", b"hello", 0).unwrap();
        fs.write("/f", b"WORLD", 5).unwrap();
        fs.write("/f", b"zzz", 2).unwrap();
        assert_eq!(fs.read("/f", 10, 0).unwrap(), b"hezzzWORLD");
        remove_file(&p).unwrap();
    }

    #[test]
    fn write_beyond_disk_size_returns_no_space_and_head_unchanged() {
        let mut p = std::env::temp_dir();
        p.push("wfs-ops-test-no-space");
        if p.exists() {
            remove_file(&p).unwrap();
        }
        crate::mkfs::format(&p, 2048).unwrap();
        let image = Image::open_existing(&p).unwrap();
        let mut fs = Filesystem::open(image).unwrap();
        fs.mknod("/g", 0o644).unwrap();

        let mut last_good = Vec::new();
        loop {
            let before_head = fs.image.superblock().head;
            match fs.write("/g", b"x", last_good.len() as u64) {
                Ok(_) => last_good.push(b'x'),
                Err(FsError::NoSpace) => {
                    assert_eq!(fs.image.superblock().head, before_head);
                    break;
                }
                Err(e) => panic!("unexpected error: {e:?}"),
            }
        }
        let contents = fs.read("/g", last_good.len() as u64, 0).unwrap();
        assert_eq!(contents, last_good);
        remove_file(&p).unwrap();
    }

    #[test]
    fn unlink_removes_entry_and_allocates_fresh_inode_on_recreate() {
        let (p, mut fs) = fresh_fs("unlink");
        let first = fs.mknod("/t", 0o644).unwrap();
        fs.unlink("/t").unwrap();
        assert!(matches!(fs.getattr("/t"), Err(FsError::NotFound)));

        let mut names = Vec::new();
        fs.readdir("/", &mut |name, _ino| {
            names.push(name.to_string());
            true
        })
        .unwrap();
        assert!(!names.contains(&"t".to_string()));

        let second = fs.mknod("/t", 0o644).unwrap();
        assert!(second > first);
        remove_file(&p).unwrap();
    }

    #[test]
    fn mknod_existing_path_is_rejected() {
        let (p, mut fs) = fresh_fs("exists");
        fs.mknod("/f", 0o644).unwrap();
        assert!(matches!(fs.mknod("/f", 0o644), Err(FsError::AlreadyExists)));
        remove_file(&p).unwrap();
    }

    #[test]
    fn mknod_missing_parent_is_rejected() {
        let (p, mut fs) = fresh_fs("missing-parent");
        assert!(matches!(
            fs.mknod("/nope/f", 0o644),
            Err(FsError::NotFound)
        ));
        remove_file(&p).unwrap();
    }

    #[test]
    fn trailing_slash_resolves_same_entity() {
        let (p, mut fs) = fresh_fs("trailing-slash");
        fs.mkdir("/a", 0o755).unwrap();
        assert_eq!(fs.getattr("/a").unwrap(), fs.getattr("/a/").unwrap());
        remove_file(&p).unwrap();
    }

    #[test]
    fn readdir_on_file_is_not_a_directory() {
        let (p, mut fs) = fresh_fs("readdir-on-file");
        fs.mknod("/f", 0o644).unwrap();
        assert!(matches!(
            fs.readdir("/f", &mut |_, _| true),
            Err(FsError::NotADirectory)
        ));
        remove_file(&p).unwrap();
    }

    #[test]
    fn readdir_buffer_full_stops_the_scan() {
        let (p, mut fs) = fresh_fs("readdir-buffer-full");
        fs.mknod("/a", 0o644).unwrap();
        fs.mknod("/b", 0o644).unwrap();
        let mut seen = 0;
        let result = fs.readdir("/", &mut |_, _| {
            seen += 1;
            false
        });
        assert!(matches!(result, Err(FsError::BufferFull)));
        assert_eq!(seen, 1);
        remove_file(&p).unwrap();
    }
}
