// Root directory appender

use log::debug;
use scandisk_core::ScanDiskError;

use super::constants::*;
use super::directory::{classify, DirEntry, Slot};
use super::geometry::Geometry;

/// Writes new entries into the fixed root directory region. Slots are
/// addressed by index and every offset is recomputed from the geometry.
pub struct DirectoryAppender {
    geometry: Geometry,
}

impl DirectoryAppender {
    pub fn new(geometry: Geometry) -> Self {
        Self { geometry }
    }

    fn slot_count(&self) -> usize {
        self.geometry.root_entries as usize
    }

    fn slot_offset(&self, index: usize) -> usize {
        self.geometry.root_dir_offset() + index * DIR_ENTRY_SIZE
    }

    fn first_byte(&self, image: &[u8], index: usize) -> u8 {
        image[self.slot_offset(index)]
    }

    /// How many entries can still be appended: deleted slots before the
    /// terminator plus every slot from the terminator on.
    pub fn free_slots(&self, image: &[u8]) -> usize {
        let mut free = 0;
        for index in 0..self.slot_count() {
            match self.first_byte(image, index) {
                SLOT_EMPTY => return free + self.slot_count() - index,
                SLOT_DELETED => free += 1,
                _ => {}
            }
        }
        free
    }

    /// `NAME.EXT` of every live file entry in the root.
    pub fn existing_names(&self, image: &[u8]) -> Vec<String> {
        let mut names = Vec::new();
        for index in 0..self.slot_count() {
            let offset = self.slot_offset(index);
            match classify(&image[offset..offset + DIR_ENTRY_SIZE]) {
                Slot::End => break,
                Slot::File(entry) => names.push(entry.display_name()),
                _ => {}
            }
        }
        names
    }

    /// Fail before any write when `needed` entries do not fit.
    pub fn ensure_capacity(&self, image: &[u8], needed: usize) -> Result<(), ScanDiskError> {
        let capacity = self.free_slots(image);
        if needed > capacity {
            return Err(ScanDiskError::RootDirectoryFull { capacity, needed });
        }
        Ok(())
    }

    /// Store `entry` in the first terminator or deleted slot. Returns the slot index.
    pub fn append(&self, image: &mut [u8], entry: &DirEntry) -> Result<usize, ScanDiskError> {
        let found = (0..self.slot_count())
            .find(|&index| matches!(self.first_byte(image, index), SLOT_EMPTY | SLOT_DELETED));

        let Some(index) = found else {
            return Err(ScanDiskError::RootDirectoryFull {
                capacity: 0,
                needed: 1,
            });
        };

        let was_terminator = self.first_byte(image, index) == SLOT_EMPTY;
        let offset = self.slot_offset(index);
        image[offset..offset + DIR_ENTRY_SIZE].copy_from_slice(&entry.encode());

        // Keep the directory terminated after the new last entry
        if was_terminator && index + 1 < self.slot_count() {
            let next = self.slot_offset(index + 1);
            image[next] = SLOT_EMPTY;
        }

        debug!("Appended {} to root slot {}", entry.display_name(), index);
        Ok(index)
    }
}
