//! Log-structured filesystem core: path resolution, the append engine,
//! the directory payload format, and the vnode-operation surface that the
//! `mount` binary wires to a FUSE dispatcher.
//!
//! Every operation here is addressed by absolute POSIX path, matching the
//! vnode callbacks a FUSE dispatcher delivers. The `fuse_adapter` module
//! is the only piece of this crate that is inode-number-oriented; it
//! exists purely to bridge `fuser`'s callback shape onto this path-based
//! core.

#![deny(missing_docs)]

pub mod appender;
pub mod dir;
pub mod error;
pub mod fuse_adapter;
pub mod mkfs;
pub mod ops;
pub mod path;
pub mod resolver;

pub use error::{FsError, Result};
pub use ops::Filesystem;

/// Current wall-clock time in whole seconds, the granularity every
/// on-disk timestamp field uses.
pub(crate) fn now_secs() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}
