//! Backing-file abstraction for the log region.
//!
//! The image is a single fixed-capacity file, memory-mapped the same way
//! the teacher's `Device` maps its block storage. Unlike a block device,
//! nothing here is aware of the log format above it: `Image` only offers
//! positioned reads and writes plus a persisted superblock.

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

use memmap2::MmapMut;

use crate::error::{Result, WfsError};
use crate::types::{Superblock, SUPERBLOCK_SIZE};

/// A memory-mapped, fixed-capacity backing file holding the superblock and
/// the log region that follows it.
pub struct Image {
    path: PathBuf,
    contents: MmapMut,
    superblock: Superblock,
}

impl Image {
    /// Create a new image at `path`, sized to `capacity` bytes, all zeroed.
    /// Fails if `path` already exists.
    pub fn create<P: AsRef<Path>>(path: P, capacity: u64) -> Result<Image> {
        let path = path.as_ref().to_path_buf();
        if path.exists() {
            return Err(WfsError::OutOfRange("image path already exists"));
        }
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(&path)?;
        file.set_len(capacity)?;
        let contents = unsafe { MmapMut::map_mut(&file)? };
        Ok(Image {
            path,
            contents,
            superblock: Superblock::default(),
        })
    }

    /// Open an existing image at `path` and load its superblock.
    /// Fails if `path` does not exist.
    pub fn open_existing<P: AsRef<Path>>(path: P) -> Result<Image> {
        let path = path.as_ref().to_path_buf();
        if !path.exists() {
            return Err(WfsError::OutOfRange("image path does not exist"));
        }
        let file = OpenOptions::new().read(true).write(true).open(&path)?;
        let contents = unsafe { MmapMut::map_mut(&file)? };
        let mut image = Image {
            path,
            contents,
            superblock: Superblock::default(),
        };
        image.superblock = image.read_superblock()?;
        Ok(image)
    }

    /// Total capacity of the backing image, in bytes.
    pub fn capacity(&self) -> u64 {
        self.contents.len() as u64
    }

    /// Path of the file backing this image.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Currently cached superblock.
    pub fn superblock(&self) -> Superblock {
        self.superblock
    }

    /// Replace the cached superblock without writing it to disk.
    /// Callers must follow up with [`Image::flush_superblock`].
    pub fn set_superblock(&mut self, sb: Superblock) {
        self.superblock = sb;
    }

    /// Read `len` bytes starting at absolute offset `offset`.
    pub fn read_at(&self, offset: u64, len: u64) -> Result<Vec<u8>> {
        let start = offset;
        let end = offset
            .checked_add(len)
            .ok_or(WfsError::OutOfRange("read range overflows u64"))?;
        if end > self.capacity() {
            return Err(WfsError::OutOfRange("read past the end of the image"));
        }
        Ok(self.contents[start as usize..end as usize].to_vec())
    }

    /// Write `data` starting at absolute offset `offset`.
    pub fn write_at(&mut self, offset: u64, data: &[u8]) -> Result<()> {
        let start = offset;
        let end = offset
            .checked_add(data.len() as u64)
            .ok_or(WfsError::OutOfRange("write range overflows u64"))?;
        if end > self.capacity() {
            return Err(WfsError::OutOfRange("write past the end of the image"));
        }
        self.contents[start as usize..end as usize].copy_from_slice(data);
        Ok(())
    }

    /// Seek to offset 0 and write the current in-memory superblock, then
    /// flush the mapping to disk.
    pub fn flush_superblock(&mut self) -> Result<()> {
        let bytes = bincode::serialize(&self.superblock)?;
        self.write_at(0, &bytes)?;
        self.contents.flush()?;
        Ok(())
    }

    fn read_superblock(&self) -> Result<Superblock> {
        let bytes = self.read_at(0, *SUPERBLOCK_SIZE)?;
        Ok(bincode::deserialize(&bytes)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::remove_file;

    fn image_path(name: &str) -> PathBuf {
        let mut path = std::env::temp_dir();
        path.push(format!("wfs-image-test-{name}"));
        if path.exists() {
            remove_file(&path).unwrap();
        }
        path
    }

    #[test]
    fn create_zeroes_and_bounds_check() {
        let path = image_path("create");
        let mut img = Image::create(&path, 64).unwrap();
        assert_eq!(img.capacity(), 64);
        assert_eq!(img.read_at(0, 64).unwrap(), vec![0u8; 64]);

        img.write_at(10, &[1, 2, 3]).unwrap();
        assert_eq!(img.read_at(10, 3).unwrap(), vec![1, 2, 3]);

        assert!(img.write_at(62, &[1, 2, 3]).is_err());
        assert!(img.read_at(62, 3).is_err());

        remove_file(&path).unwrap();
    }

    #[test]
    fn superblock_roundtrips_across_reopen() {
        let path = image_path("superblock");
        {
            let mut img = Image::create(&path, 4096).unwrap();
            img.set_superblock(Superblock {
                magic: crate::types::WFS_MAGIC,
                head: 123,
            });
            img.flush_superblock().unwrap();
        }
        let img = Image::open_existing(&path).unwrap();
        assert_eq!(img.superblock().magic, crate::types::WFS_MAGIC);
        assert_eq!(img.superblock().head, 123);

        remove_file(&path).unwrap();
    }

    #[test]
    fn create_rejects_existing_path() {
        let path = image_path("exists");
        let _img = Image::create(&path, 64).unwrap();
        assert!(Image::create(&path, 64).is_err());
        remove_file(&path).unwrap();
    }
}
