//! FUSE dispatcher glue: bridges `fuser`'s inode-number callback shape onto
//! the path-based [`crate::Filesystem`] core.
//!
//! `fuser`, unlike the original legacy path-based `fuse_operations` table,
//! addresses everything by inode number and asks callers to `lookup` a
//! child's number before acting on it. This module owns the one piece of
//! mutable state the path-based core does not need on its own: a bijective
//! table between FUSE inode numbers and absolute paths, seeded with
//! `FUSE_ROOT_ID` mapped to `/`.

use std::collections::HashMap;
use std::ffi::OsStr;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use fuser::{
    FileAttr, FileType, Filesystem as FuseFilesystem, ReplyAttr, ReplyDirectory, ReplyEntry,
    ReplyWrite, Request,
};
use wfs_types::types::libc_mode;

use crate::ops::{Attr, Filesystem};

/// FUSE entries are cached for this long before the kernel re-validates
/// them. Short enough that writes from outside this mount are noticed
/// promptly, long enough to avoid a `getattr` storm.
const TTL: Duration = Duration::from_secs(1);

fn system_time_from_secs(secs: i64) -> SystemTime {
    if secs >= 0 {
        UNIX_EPOCH + Duration::from_secs(secs as u64)
    } else {
        UNIX_EPOCH - Duration::from_secs((-secs) as u64)
    }
}

fn file_attr(attr: &Attr) -> FileAttr {
    let kind = if attr.mode & libc_mode::S_IFDIR == libc_mode::S_IFDIR {
        FileType::Directory
    } else {
        FileType::RegularFile
    };
    FileAttr {
        ino: attr.inode_number,
        size: attr.size,
        blocks: (attr.size + 511) / 512,
        atime: system_time_from_secs(attr.atime),
        mtime: system_time_from_secs(attr.mtime),
        ctime: system_time_from_secs(attr.ctime),
        crtime: system_time_from_secs(attr.ctime),
        kind,
        perm: (attr.mode & 0o7777) as u16,
        nlink: attr.nlink as u32,
        uid: attr.uid,
        gid: attr.gid,
        rdev: 0,
        blksize: 512,
        flags: 0,
    }
}

/// Adapts [`Filesystem`] to `fuser::Filesystem`, maintaining the inode
/// number to path table that every callback needs to recover an absolute
/// path from the numbers the kernel hands back.
pub struct WfsDispatcher {
    fs: Filesystem,
    paths: HashMap<u64, String>,
}

impl WfsDispatcher {
    /// Wrap `fs`, seeding the inode table with the FUSE root inode mapped
    /// to the filesystem's root path.
    pub fn new(fs: Filesystem) -> WfsDispatcher {
        let mut paths = HashMap::new();
        paths.insert(fuser::FUSE_ROOT_ID, "/".to_string());
        WfsDispatcher { fs, paths }
    }

    fn path_for(&self, ino: u64) -> Option<&str> {
        self.paths.get(&ino).map(String::as_str)
    }

    fn child_path(parent_path: &str, name: &OsStr) -> Option<String> {
        let name = name.to_str()?;
        if parent_path == "/" {
            Some(format!("/{name}"))
        } else {
            Some(format!("{parent_path}/{name}"))
        }
    }

    fn remember(&mut self, ino: u64, path: String) {
        self.paths.insert(ino, path);
    }
}

impl FuseFilesystem for WfsDispatcher {
    fn lookup(&mut self, _req: &Request, parent: u64, name: &OsStr, reply: ReplyEntry) {
        let Some(parent_path) = self.path_for(parent).map(str::to_string) else {
            reply.error(libc::ENOENT);
            return;
        };
        let Some(child_path) = Self::child_path(&parent_path, name) else {
            reply.error(libc::EINVAL);
            return;
        };
        match self.fs.getattr(&child_path) {
            Ok(attr) => {
                self.remember(attr.inode_number, child_path);
                reply.entry(&TTL, &file_attr(&attr), 0);
            }
            Err(e) => reply.error(e.to_errno()),
        }
    }

    fn getattr(&mut self, _req: &Request, ino: u64, reply: ReplyAttr) {
        let Some(path) = self.path_for(ino).map(str::to_string) else {
            reply.error(libc::ENOENT);
            return;
        };
        match self.fs.getattr(&path) {
            Ok(attr) => reply.attr(&TTL, &file_attr(&attr)),
            Err(e) => reply.error(e.to_errno()),
        }
    }

    fn readdir(
        &mut self,
        _req: &Request,
        ino: u64,
        _fh: u64,
        offset: i64,
        mut reply: ReplyDirectory,
    ) {
        let Some(path) = self.path_for(ino).map(str::to_string) else {
            reply.error(libc::ENOENT);
            return;
        };

        let mut rows: Vec<(u64, FileType, String)> = vec![
            (ino, FileType::Directory, ".".to_string()),
            (ino, FileType::Directory, "..".to_string()),
        ];

        let mut children = Vec::new();
        let result = self.fs.readdir(&path, &mut |name, child_ino| {
            children.push((child_ino, name.to_string()));
            true
        });
        if let Err(e) = result {
            reply.error(e.to_errno());
            return;
        }
        for (child_ino, name) in &children {
            let child_path = Self::child_path(&path, OsStr::new(name)).unwrap();
            let kind = match self.fs.getattr(&child_path) {
                Ok(attr) => {
                    self.remember(*child_ino, child_path);
                    if attr.mode & libc_mode::S_IFDIR == libc_mode::S_IFDIR {
                        FileType::Directory
                    } else {
                        FileType::RegularFile
                    }
                }
                Err(_) => FileType::RegularFile,
            };
            rows.push((*child_ino, kind, name.clone()));
        }

        for (i, (row_ino, kind, name)) in rows.into_iter().enumerate().skip(offset as usize) {
            if reply.add(row_ino, (i + 1) as i64, kind, name) {
                break;
            }
        }
        reply.ok();
    }

    fn mknod(
        &mut self,
        _req: &Request,
        parent: u64,
        name: &OsStr,
        mode: u32,
        _umask: u32,
        _rdev: u32,
        reply: ReplyEntry,
    ) {
        let Some(parent_path) = self.path_for(parent).map(str::to_string) else {
            reply.error(libc::ENOENT);
            return;
        };
        let Some(child_path) = Self::child_path(&parent_path, name) else {
            reply.error(libc::EINVAL);
            return;
        };
        match self.fs.mknod(&child_path, mode) {
            Ok(inode_number) => {
                self.remember(inode_number, child_path.clone());
                match self.fs.getattr(&child_path) {
                    Ok(attr) => reply.entry(&TTL, &file_attr(&attr), 0),
                    Err(e) => reply.error(e.to_errno()),
                }
            }
            Err(e) => reply.error(e.to_errno()),
        }
    }

    fn mkdir(
        &mut self,
        _req: &Request,
        parent: u64,
        name: &OsStr,
        mode: u32,
        _umask: u32,
        reply: ReplyEntry,
    ) {
        let Some(parent_path) = self.path_for(parent).map(str::to_string) else {
            reply.error(libc::ENOENT);
            return;
        };
        let Some(child_path) = Self::child_path(&parent_path, name) else {
            reply.error(libc::EINVAL);
            return;
        };
        match self.fs.mkdir(&child_path, mode) {
            Ok(inode_number) => {
                self.remember(inode_number, child_path.clone());
                match self.fs.getattr(&child_path) {
                    Ok(attr) => reply.entry(&TTL, &file_attr(&attr), 0),
                    Err(e) => reply.error(e.to_errno()),
                }
            }
            Err(e) => reply.error(e.to_errno()),
        }
    }

    fn write(
        &mut self,
        _req: &Request,
        ino: u64,
        _fh: u64,
        offset: i64,
        data: &[u8],
        _write_flags: u32,
        _flags: i32,
        _lock_owner: Option<u64>,
        reply: ReplyWrite,
    ) {
        let Some(path) = self.path_for(ino).map(str::to_string) else {
            reply.error(libc::ENOENT);
            return;
        };
        if offset < 0 {
            reply.error(libc::EINVAL);
            return;
        }
        match self.fs.write(&path, data, offset as u64) {
            Ok(written) => reply.written(written as u32),
            Err(e) => reply.error(e.to_errno()),
        }
    }

    fn read(
        &mut self,
        _req: &Request,
        ino: u64,
        _fh: u64,
        offset: i64,
        size: u32,
        _flags: i32,
        _lock_owner: Option<u64>,
        reply: fuser::ReplyData,
    ) {
        let Some(path) = self.path_for(ino).map(str::to_string) else {
            reply.error(libc::ENOENT);
            return;
        };
        if offset < 0 {
            reply.error(libc::EINVAL);
            return;
        }
        match self.fs.read(&path, size as u64, offset as u64) {
            Ok(buf) => reply.data(&buf),
            Err(e) => reply.error(e.to_errno()),
        }
    }

    fn unlink(&mut self, _req: &Request, parent: u64, name: &OsStr, reply: fuser::ReplyEmpty) {
        let Some(parent_path) = self.path_for(parent).map(str::to_string) else {
            reply.error(libc::ENOENT);
            return;
        };
        let Some(child_path) = Self::child_path(&parent_path, name) else {
            reply.error(libc::EINVAL);
            return;
        };
        match self.fs.unlink(&child_path) {
            Ok(()) => {
                self.paths.retain(|_, p| p != &child_path);
                reply.ok();
            }
            Err(e) => reply.error(e.to_errno()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn child_path_joins_under_root_without_double_slash() {
        assert_eq!(
            WfsDispatcher::child_path("/", OsStr::new("a")).unwrap(),
            "/a"
        );
        assert_eq!(
            WfsDispatcher::child_path("/a", OsStr::new("b")).unwrap(),
            "/a/b"
        );
    }

    #[test]
    fn system_time_handles_pre_epoch_and_post_epoch() {
        assert_eq!(system_time_from_secs(0), UNIX_EPOCH);
        assert!(system_time_from_secs(10) > UNIX_EPOCH);
        assert!(system_time_from_secs(-10) < UNIX_EPOCH);
    }
}
