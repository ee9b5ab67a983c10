// FAT12 boot sector parsing and volume layout

use byteorder::{ByteOrder, LittleEndian};
use log::{debug, info};
use scandisk_core::ScanDiskError;
use serde::Serialize;
use std::ops::Range;

use super::constants::*;

/// Volume layout derived once from the BPB. Immutable for the whole run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Geometry {
    pub bytes_per_sector: u16,
    pub sectors_per_cluster: u8,
    pub reserved_sectors: u16,
    pub num_fats: u8,
    pub root_entries: u16,
    pub total_sectors: u32,
    pub sectors_per_fat: u16,
    pub media_descriptor: u8,
}

impl Geometry {
    /// Parse and validate the boot sector at the start of `image`.
    ///
    /// Rejects anything that is not a plausible FAT12 volume, and any image
    /// shorter than the layout its BPB describes.
    pub fn parse(image: &[u8]) -> Result<Self, ScanDiskError> {
        if image.len() < BOOT_SECTOR_SIZE {
            return Err(ScanDiskError::InvalidBootSector(format!(
                "image is {} bytes, smaller than a boot sector",
                image.len()
            )));
        }

        match image[BS_JMP_BOOT] {
            0xE9 => {}
            0xEB if image[BS_JMP_BOOT + 2] == 0x90 => {}
            other => {
                return Err(ScanDiskError::InvalidBootSector(format!(
                    "invalid jump instruction: 0x{:02X}",
                    other
                )))
            }
        }

        if image[BOOT_SIGNATURE_OFFSET..BOOT_SIGNATURE_OFFSET + 2] != BOOT_SIGNATURE {
            return Err(ScanDiskError::InvalidBootSector(format!(
                "invalid boot signature: 0x{:02X}{:02X}",
                image[BOOT_SIGNATURE_OFFSET],
                image[BOOT_SIGNATURE_OFFSET + 1]
            )));
        }

        let total_sectors_16 = LittleEndian::read_u16(&image[BPB_TOT_SEC16..]);
        let total_sectors = if total_sectors_16 != 0 {
            total_sectors_16 as u32
        } else {
            LittleEndian::read_u32(&image[BPB_TOT_SEC32..])
        };

        let geometry = Self {
            bytes_per_sector: LittleEndian::read_u16(&image[BPB_BYTES_PER_SEC..]),
            sectors_per_cluster: image[BPB_SEC_PER_CLUS],
            reserved_sectors: LittleEndian::read_u16(&image[BPB_RSVD_SEC_CNT..]),
            num_fats: image[BPB_NUM_FATS],
            root_entries: LittleEndian::read_u16(&image[BPB_ROOT_ENT_CNT..]),
            total_sectors,
            sectors_per_fat: LittleEndian::read_u16(&image[BPB_FAT_SZ16..]),
            media_descriptor: image[BPB_MEDIA],
        };

        geometry.validate()?;

        let required = geometry.volume_bytes();
        if (image.len() as u64) < required {
            return Err(ScanDiskError::ImageTooSmall {
                required,
                actual: image.len() as u64,
            });
        }

        info!("FAT12 volume details:");
        info!("  Bytes per sector: {}", geometry.bytes_per_sector);
        info!("  Sectors per cluster: {}", geometry.sectors_per_cluster);
        info!("  Root entries: {}", geometry.root_entries);
        info!("  First data sector: {}", geometry.first_data_sector());
        info!("  Data clusters: {}", geometry.cluster_count());
        debug!("OEM name: {}", String::from_utf8_lossy(&image[BS_OEM_NAME..BS_OEM_NAME + 8]));

        Ok(geometry)
    }

    fn validate(&self) -> Result<(), ScanDiskError> {
        let invalid = |msg: String| Err(ScanDiskError::InvalidBootSector(msg));

        if ![512, 1024, 2048, 4096].contains(&self.bytes_per_sector) {
            return invalid(format!("invalid bytes per sector: {}", self.bytes_per_sector));
        }
        if self.sectors_per_cluster == 0 || !self.sectors_per_cluster.is_power_of_two() {
            return invalid(format!(
                "sectors per cluster not a power of 2: {}",
                self.sectors_per_cluster
            ));
        }
        if self.reserved_sectors == 0 {
            return invalid("reserved sector count cannot be 0".to_string());
        }
        if self.num_fats == 0 {
            return invalid("number of FATs cannot be 0".to_string());
        }
        if self.root_entries == 0 {
            return invalid("root entry count is 0 (FAT32 volume?)".to_string());
        }
        if self.sectors_per_fat == 0 {
            return invalid("sectors per FAT is 0 (FAT32 volume?)".to_string());
        }
        if self.first_data_sector() >= self.total_sectors {
            return invalid(format!(
                "no data region: first data sector {} >= total sectors {}",
                self.first_data_sector(),
                self.total_sectors
            ));
        }

        let clusters = self.cluster_count();
        if clusters > FAT12_MAX_CLUSTERS {
            return invalid(format!(
                "{} clusters is too many for FAT12 (max {})",
                clusters, FAT12_MAX_CLUSTERS
            ));
        }

        // Every data cluster needs a 12-bit slot in the table
        let fat_slots = self.fat_bytes() * 2 / 3;
        if fat_slots < clusters as usize + 2 {
            return invalid(format!(
                "FAT holds {} entries but the volume has {} clusters",
                fat_slots, clusters
            ));
        }

        Ok(())
    }

    pub fn cluster_size(&self) -> u32 {
        self.bytes_per_sector as u32 * self.sectors_per_cluster as u32
    }

    pub fn root_dir_sectors(&self) -> u32 {
        let bps = self.bytes_per_sector as u32;
        (self.root_entries as u32 * DIR_ENTRY_SIZE as u32 + bps - 1) / bps
    }

    pub fn first_data_sector(&self) -> u32 {
        self.reserved_sectors as u32
            + self.num_fats as u32 * self.sectors_per_fat as u32
            + self.root_dir_sectors()
    }

    /// Number of data clusters on the volume.
    pub fn cluster_count(&self) -> u32 {
        (self.total_sectors - self.first_data_sector()) / self.sectors_per_cluster as u32
    }

    /// Highest addressable cluster number.
    pub fn max_cluster(&self) -> u16 {
        (self.cluster_count() + 1) as u16
    }

    pub fn is_valid_cluster(&self, cluster: u16) -> bool {
        cluster >= FIRST_DATA_CLUSTER && cluster <= self.max_cluster()
    }

    /// Byte offset of the first (and only consulted) FAT.
    pub fn fat_offset(&self) -> usize {
        self.reserved_sectors as usize * self.bytes_per_sector as usize
    }

    pub fn fat_bytes(&self) -> usize {
        self.sectors_per_fat as usize * self.bytes_per_sector as usize
    }

    pub fn root_dir_offset(&self) -> usize {
        (self.reserved_sectors as usize + self.num_fats as usize * self.sectors_per_fat as usize)
            * self.bytes_per_sector as usize
    }

    pub fn root_dir_bytes(&self) -> usize {
        self.root_entries as usize * DIR_ENTRY_SIZE
    }

    /// Byte range of the fixed root directory region.
    pub fn root_dir_range(&self) -> Range<usize> {
        let start = self.root_dir_offset();
        start..start + self.root_dir_bytes()
    }

    pub fn data_offset(&self) -> usize {
        self.first_data_sector() as usize * self.bytes_per_sector as usize
    }

    /// Translate a data cluster to its byte range in the image.
    pub fn cluster_range(&self, cluster: u16) -> Result<Range<usize>, ScanDiskError> {
        if !self.is_valid_cluster(cluster) {
            return Err(ScanDiskError::ClusterOutOfRange {
                cluster,
                max_cluster: self.max_cluster(),
            });
        }
        let size = self.cluster_size() as usize;
        let start = self.data_offset() + (cluster - FIRST_DATA_CLUSTER) as usize * size;
        Ok(start..start + size)
    }

    /// Bytes spanned by the whole volume as declared in the BPB.
    pub fn volume_bytes(&self) -> u64 {
        self.total_sectors as u64 * self.bytes_per_sector as u64
    }
}
