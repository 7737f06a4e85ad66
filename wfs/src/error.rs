//! Error type for the filesystem core, and its mapping to POSIX errno
//! values for the FUSE adapter.

use thiserror::Error;
use wfs_types::WfsError;

/// Error type returned by the resolver, appender, directory engine, and
/// vnode operations.
#[derive(Error, Debug)]
pub enum FsError {
    /// Error from the image or type layer.
    #[error("image error")]
    Image(#[from] WfsError),
    /// The resolver found no live entry for the path.
    #[error("no such entry")]
    NotFound,
    /// `mknod`/`mkdir` target already resolves to a live entry.
    #[error("already exists")]
    AlreadyExists,
    /// A non-terminal path component resolved to a non-directory, or
    /// `readdir` was called on a file.
    #[error("not a directory")]
    NotADirectory,
    /// An operation that requires a regular file was given a directory.
    #[error("is a directory")]
    IsADirectory,
    /// Appending the new entry would overflow the image's capacity.
    #[error("no space left on device")]
    NoSpace,
    /// A name exceeds the fixed dentry name field.
    #[error("name too long")]
    NameTooLong,
    /// `readdir`'s sink refused a name.
    #[error("buffer full")]
    BufferFull,
    /// A path was malformed (no leading `/`, or an empty component).
    #[error("invalid path")]
    InvalidPath,
}

/// Shorthand for a `Result` with this crate's error type.
pub type Result<T> = std::result::Result<T, FsError>;

impl From<bincode::Error> for FsError {
    fn from(e: bincode::Error) -> Self {
        FsError::Image(WfsError::Serialize(e))
    }
}

impl FsError {
    /// Map this error to a negative-POSIX errno value, the shape every
    /// vnode operation ultimately returns to its dispatcher.
    pub fn to_errno(&self) -> i32 {
        match self {
            FsError::Image(WfsError::Io(_)) => libc::EIO,
            FsError::Image(WfsError::Serialize(_)) => libc::EIO,
            FsError::Image(WfsError::OutOfRange(_)) => libc::ENOSPC,
            FsError::Image(WfsError::InvalidFormat) => libc::EINVAL,
            FsError::NotFound => libc::ENOENT,
            FsError::AlreadyExists => libc::EEXIST,
            FsError::NotADirectory => libc::ENOTDIR,
            FsError::IsADirectory => libc::EISDIR,
            FsError::NoSpace => libc::ENOSPC,
            FsError::NameTooLong => libc::ENAMETOOLONG,
            FsError::BufferFull => libc::ENOBUFS,
            FsError::InvalidPath => libc::EINVAL,
        }
    }
}
