//! On-disk layout and backing-image primitives shared by `mkfs` and
//! `mount`.
//!
//! This crate carries no filesystem policy: it describes the superblock,
//! inode header, and directory entry byte layouts, and the `Image` type
//! that reads and writes them at an absolute offset. The log scanner,
//! appender, and vnode operations built on top live in the `wfs` crate.

#![deny(missing_docs)]

pub mod error;
pub mod image;
pub mod types;

pub use error::{Result, WfsError};
pub use image::Image;
pub use types::{
    DEntry, InodeHeader, Superblock, DENTRY_SIZE, DISK_SIZE, INODE_HEADER_SIZE, MAX_NAME,
    ROOT_INODE, SUPERBLOCK_SIZE, WFS_MAGIC,
};
