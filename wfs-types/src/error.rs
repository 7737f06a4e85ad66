//! Error type for the image and on-disk type layer.

use std::io;
use thiserror::Error;

/// Error type returned by [`crate::image::Image`] and the (de)serialization
/// helpers on the structures in [`crate::types`].
#[derive(Error, Debug)]
pub enum WfsError {
    /// Underlying file operation failed.
    #[error("I/O error")]
    Io(#[from] io::Error),
    /// Encoding or decoding a fixed-size record failed.
    #[error("serialization error")]
    Serialize(#[from] bincode::Error),
    /// A positioned read or write fell outside the image's capacity.
    #[error("out of range: {0}")]
    OutOfRange(&'static str),
    /// Superblock magic did not match [`crate::types::WFS_MAGIC`].
    #[error("invalid filesystem format")]
    InvalidFormat,
}

/// Shorthand for a `Result` with this crate's error type.
pub type Result<T> = std::result::Result<T, WfsError>;
