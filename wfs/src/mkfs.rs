//! Image initializer: writes a fresh superblock and the root directory's
//! first log entry.
//!
//! Shared by the `mkfs.wfs` binary and the integration tests, matching
//! the original `mkfs.wfs.c`'s behavior of stamping the root inode's
//! `uid`/`gid` from the running process.

use std::path::Path;

use wfs_types::{types::libc_mode, Image, InodeHeader, Superblock, ROOT_INODE, SUPERBLOCK_SIZE, WFS_MAGIC};

use crate::appender;
use crate::error::Result;
use crate::now_secs;

/// Create or truncate the image at `path` to `size` bytes, and write an
/// empty root directory.
///
/// `head` is initialized to `sizeof(superblock) + sizeof(root log entry)`
/// exactly as the format specifies, since the root directory starts with
/// a zero-byte payload.
pub fn format<P: AsRef<Path>>(path: P, size: u64) -> Result<()> {
    let mut image = Image::create(path, size)?;
    image.set_superblock(Superblock {
        magic: WFS_MAGIC,
        head: *SUPERBLOCK_SIZE,
    });
    image.flush_superblock()?;

    let now = now_secs();
    // SAFETY: getuid/getgid take no arguments and cannot fail.
    let (uid, gid) = unsafe { (libc::getuid(), libc::getgid()) };
    let root = InodeHeader {
        inode_number: ROOT_INODE,
        deleted: 0,
        mode: libc_mode::S_IFDIR | 0o755,
        uid,
        gid,
        flags: 0,
        size: 0,
        atime: now,
        mtime: now,
        ctime: now,
        links: 1,
    };
    appender::append_entry(&mut image, root, &[])?;
    log::debug!("mkfs: formatted {} bytes at {:?}", size, image.path());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::remove_file;
    use std::path::PathBuf;

    fn image_path(name: &str) -> PathBuf {
        let mut p = std::env::temp_dir();
        p.push(format!("wfs-mkfs-test-{name}"));
        if p.exists() {
            remove_file(&p).unwrap();
        }
        p
    }

    #[test]
    fn format_initializes_head_and_root() {
        let p = image_path("basic");
        format(&p, wfs_types::DISK_SIZE).unwrap();

        let image = Image::open_existing(&p).unwrap();
        assert_eq!(image.superblock().magic, WFS_MAGIC);
        assert_eq!(
            image.superblock().head,
            *SUPERBLOCK_SIZE + *wfs_types::INODE_HEADER_SIZE
        );

        let entry = crate::resolver::resolve(&image, "/").unwrap();
        assert_eq!(entry.header.inode_number, ROOT_INODE);
        assert!(entry.header.is_dir());
        assert_eq!(entry.header.size, 0);

        remove_file(&p).unwrap();
    }

    #[test]
    fn reformatting_is_idempotent_in_effect() {
        let p = image_path("idempotent");
        format(&p, wfs_types::DISK_SIZE).unwrap();
        remove_file(&p).unwrap();
        format(&p, wfs_types::DISK_SIZE).unwrap();

        let image = Image::open_existing(&p).unwrap();
        let mut names = Vec::new();
        crate::ops::Filesystem::open(image)
            .unwrap()
            .readdir("/", &mut |name, _ino| {
                names.push(name.to_string());
                true
            })
            .unwrap();
        assert!(names.is_empty());

        remove_file(&p).unwrap();
    }
}
