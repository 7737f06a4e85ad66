//! Absolute POSIX path utilities: splitting into components, and
//! deriving a path's parent and basename.
//!
//! A leading `/` is mandatory; a trailing `/` is ignored; an empty
//! interior component (from `//`) is an error.

use crate::error::{FsError, Result};

/// Split an absolute path into its ordered, non-empty components.
///
/// `/` yields an empty sequence; `/a/b` yields `["a", "b"]`; a trailing
/// slash is ignored. Returns [`FsError::InvalidPath`] if `path` does not
/// start with `/`, or contains an empty component (`//`).
pub fn split(path: &str) -> Result<Vec<String>> {
    if !path.starts_with('/') {
        return Err(FsError::InvalidPath);
    }
    let trimmed = path.strip_suffix('/').unwrap_or(path);
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }
    let mut components = Vec::new();
    for part in trimmed[1..].split('/') {
        if part.is_empty() {
            return Err(FsError::InvalidPath);
        }
        components.push(part.to_string());
    }
    Ok(components)
}

/// The substring up to (and excluding) the final `/`. Empty for root.
///
/// A trailing `/` on `path` is ignored before locating the final
/// separator.
pub fn parent(path: &str) -> Result<String> {
    if !path.starts_with('/') {
        return Err(FsError::InvalidPath);
    }
    let trimmed = path.strip_suffix('/').unwrap_or(path);
    match trimmed.rfind('/') {
        Some(0) => Ok("/".to_string()),
        Some(idx) => Ok(trimmed[..idx].to_string()),
        None => Ok("/".to_string()),
    }
}

/// The substring after the final `/`.
pub fn basename(path: &str) -> Result<String> {
    if !path.starts_with('/') {
        return Err(FsError::InvalidPath);
    }
    let trimmed = path.strip_suffix('/').unwrap_or(path);
    match trimmed.rfind('/') {
        Some(idx) => Ok(trimmed[idx + 1..].to_string()),
        None => Ok(String::new()),
    }
}
