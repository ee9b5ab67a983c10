// 12-bit FAT accessor
//
// Entries are packed two per three bytes: an even cluster owns the low 12 bits
// of its 16-bit word, an odd cluster the high 12 bits.

use byteorder::{ByteOrder, LittleEndian};
use log::trace;
use scandisk_core::ScanDiskError;

use super::constants::*;
use super::geometry::Geometry;

/// Decoded meaning of a FAT12 entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FatEntry {
    Free,
    /// Value 1, never a legal link.
    ReservedIndex,
    Next(u16),
    /// 0xFF0..=0xFF6
    Reserved(u16),
    Bad,
    EndOfChain(u16),
}

impl FatEntry {
    pub fn decode(value: u16) -> Self {
        match value & FAT12_MASK {
            FAT12_FREE => FatEntry::Free,
            FAT12_RESERVED_INDEX => FatEntry::ReservedIndex,
            v @ FIRST_DATA_CLUSTER..=FAT12_MAX_LINK => FatEntry::Next(v),
            FAT12_BAD => FatEntry::Bad,
            v if v >= FAT12_EOC_MIN => FatEntry::EndOfChain(v),
            v => FatEntry::Reserved(v),
        }
    }

    /// Allocated in the sense the checker cares about: part of some chain.
    pub fn is_allocated(&self) -> bool {
        matches!(self, FatEntry::Next(_) | FatEntry::EndOfChain(_))
    }
}

pub fn is_end_of_chain(value: u16) -> bool {
    matches!(FatEntry::decode(value), FatEntry::EndOfChain(_))
}

#[derive(Debug, Clone, Copy)]
pub struct Fat12 {
    geometry: Geometry,
}

impl Fat12 {
    pub fn new(geometry: Geometry) -> Self {
        Self { geometry }
    }

    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    fn entry_offset(&self, cluster: u16) -> Result<usize, ScanDiskError> {
        // Entries 0 and 1 exist in the table even though they are not data clusters
        if cluster > self.geometry.max_cluster() {
            return Err(ScanDiskError::ClusterOutOfRange {
                cluster,
                max_cluster: self.geometry.max_cluster(),
            });
        }
        Ok(self.geometry.fat_offset() + cluster as usize * 3 / 2)
    }

    /// Raw 12-bit chain-next value for `cluster`.
    pub fn read_entry(&self, image: &[u8], cluster: u16) -> Result<u16, ScanDiskError> {
        let offset = self.entry_offset(cluster)?;
        let word = LittleEndian::read_u16(&image[offset..offset + 2]);
        let value = if cluster % 2 == 0 {
            word & FAT12_MASK
        } else {
            word >> 4
        };
        Ok(value)
    }

    pub fn entry(&self, image: &[u8], cluster: u16) -> Result<FatEntry, ScanDiskError> {
        Ok(FatEntry::decode(self.read_entry(image, cluster)?))
    }

    pub fn write_entry(
        &self,
        image: &mut [u8],
        cluster: u16,
        value: u16,
    ) -> Result<(), ScanDiskError> {
        let offset = self.entry_offset(cluster)?;
        let value = value & FAT12_MASK;
        let word = LittleEndian::read_u16(&image[offset..offset + 2]);
        let word = if cluster % 2 == 0 {
            (word & 0xF000) | value
        } else {
            (word & 0x000F) | (value << 4)
        };
        trace!("FAT[{}] <- {:#05x}", cluster, value);
        LittleEndian::write_u16(&mut image[offset..offset + 2], word);
        Ok(())
    }

    pub fn mark_end_of_chain(&self, image: &mut [u8], cluster: u16) -> Result<(), ScanDiskError> {
        self.write_entry(image, cluster, FAT12_EOC)
    }

    pub fn mark_free(&self, image: &mut [u8], cluster: u16) -> Result<(), ScanDiskError> {
        self.write_entry(image, cluster, FAT12_FREE)
    }

    /// Count of data clusters currently part of some chain.
    pub fn allocated_count(&self, image: &[u8]) -> Result<usize, ScanDiskError> {
        let mut count = 0;
        for cluster in FIRST_DATA_CLUSTER..=self.geometry.max_cluster() {
            if self.entry(image, cluster)?.is_allocated() {
                count += 1;
            }
        }
        Ok(count)
    }
}
