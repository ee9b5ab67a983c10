// Raw disk image access
//
// The image is one contiguous byte store. Mapped images write through to the
// file; loaded images are private copies.

use log::{debug, info};
use memmap2::MmapMut;
use scandisk_core::ScanDiskError;
use std::fs::OpenOptions;
use std::ops::{Deref, DerefMut};
use std::path::Path;

pub struct DiskImage<B = Vec<u8>> {
    bytes: B,
}

impl DiskImage<Vec<u8>> {
    /// Read the whole file into memory. Changes are never written back.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ScanDiskError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;
        info!("Loaded {} ({} bytes) into memory", path.display(), bytes.len());
        Ok(Self { bytes })
    }
}

impl DiskImage<MmapMut> {
    /// Map the file read-write; every mutation lands in the file.
    pub fn map<P: AsRef<Path>>(path: P) -> Result<Self, ScanDiskError> {
        let path = path.as_ref();
        let file = OpenOptions::new().read(true).write(true).open(path)?;
        let bytes = unsafe { MmapMut::map_mut(&file)? };
        info!("Mapped {} ({} bytes) read-write", path.display(), bytes.len());
        Ok(Self { bytes })
    }

    pub fn flush(&self) -> Result<(), ScanDiskError> {
        debug!("Flushing mapped image");
        self.bytes.flush()?;
        Ok(())
    }
}

impl<B> DiskImage<B>
where
    B: Deref<Target = [u8]> + DerefMut,
{
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.bytes
    }

    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_mapped_writes_reach_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(&[0u8; 1024]).unwrap();
        file.flush().unwrap();

        {
            let mut image = DiskImage::map(file.path()).unwrap();
            image.as_mut_slice()[100] = 0xAB;
            image.flush().unwrap();
        }

        let bytes = std::fs::read(file.path()).unwrap();
        assert_eq!(bytes[100], 0xAB);
    }

    #[test]
    fn test_loaded_copy_is_private() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(&[0u8; 64]).unwrap();
        file.flush().unwrap();

        let mut image = DiskImage::load(file.path()).unwrap();
        assert_eq!(image.len(), 64);
        image.as_mut_slice()[0] = 0xFF;
        drop(image);

        let bytes = std::fs::read(file.path()).unwrap();
        assert_eq!(bytes[0], 0);
    }

    #[test]
    fn test_missing_file() {
        let err = DiskImage::load("/nonexistent/scandisk/image.img").err().unwrap();
        assert!(matches!(err, ScanDiskError::IoError(_)));
    }
}
