// Test helpers for building synthetic FAT12 images
//
// Compiled into the library (not just cfg(test)) so the integration tests
// under tests/ can share them.

use std::collections::HashMap;

use crate::fat12::constants::*;
use crate::fat12::directory::attributes::*;
use crate::fat12::fat_table::Fat12;
use crate::fat12::geometry::Geometry;

struct DirState {
    clusters: Vec<u16>,
    next_slot: usize,
}

/// Builds an in-memory FAT12 volume: boot sector, FAT, root directory,
/// subdirectories and cluster chains. Directories are addressed by path
/// handles: "/" is the root, `directory()` returns the handle of a new one.
pub struct ImageBuilder {
    image: Vec<u8>,
    fat: Fat12,
    dirs: HashMap<String, DirState>,
}

impl ImageBuilder {
    /// 1.44 MB floppy: 512-byte sectors, 1 sector per cluster, 224 root entries.
    pub fn floppy() -> Self {
        Self::new(512, 1, 2880, 224, 9)
    }

    /// 360 KB volume with a one-sector root directory (16 entries) and
    /// 1 KB clusters.
    pub fn small() -> Self {
        Self::new(512, 2, 720, 16, 2)
    }

    pub fn new(
        bytes_per_sector: u16,
        sectors_per_cluster: u8,
        total_sectors: u32,
        root_entries: u16,
        sectors_per_fat: u16,
    ) -> Self {
        let boot = boot_sector(
            bytes_per_sector,
            sectors_per_cluster,
            total_sectors,
            root_entries,
            sectors_per_fat,
        );
        let mut image = vec![0u8; total_sectors as usize * bytes_per_sector as usize];
        image[..BOOT_SECTOR_SIZE].copy_from_slice(&boot);

        let geometry = match Geometry::parse(&image) {
            Ok(geometry) => geometry,
            Err(_) => {
                // Deliberately invalid geometry; only the boot sector is usable
                return Self {
                    image: boot.to_vec(),
                    fat: Fat12::new(unchecked_geometry(&boot)),
                    dirs: HashMap::new(),
                };
            }
        };
        let fat = Fat12::new(geometry);

        // Reserved entries: media descriptor and end-of-chain
        fat.write_entry(&mut image, 0, 0xF00 | 0xF0).expect("FAT entry 0");
        fat.write_entry(&mut image, 1, FAT12_EOC).expect("FAT entry 1");

        let mut dirs = HashMap::new();
        dirs.insert("/".to_string(), DirState { clusters: Vec::new(), next_slot: 0 });

        Self { image, fat, dirs }
    }

    pub fn geometry(&self) -> Geometry {
        *self.fat.geometry()
    }

    pub fn build(self) -> Vec<u8> {
        self.image
    }

    pub fn build_boot_sector_only(self) -> Vec<u8> {
        self.image[..BOOT_SECTOR_SIZE].to_vec()
    }

    /// Link `clusters` into one chain terminated by end-of-chain.
    pub fn chain(&mut self, clusters: &[u16]) -> &mut Self {
        for pair in clusters.windows(2) {
            self.fat_entry(pair[0], pair[1]);
        }
        if let Some(&last) = clusters.last() {
            self.fat_entry(last, FAT12_EOC);
        }
        self
    }

    pub fn fat_entry(&mut self, cluster: u16, value: u16) -> &mut Self {
        self.fat.write_entry(&mut self.image, cluster, value).expect("FAT entry in range");
        self
    }

    /// Fill a cluster's bytes, e.g. to check contents survive repairs.
    pub fn fill_cluster(&mut self, cluster: u16, byte: u8) -> &mut Self {
        let range = self.fat.geometry().cluster_range(cluster).expect("valid cluster");
        self.image[range].fill(byte);
        self
    }

    pub fn volume_label(&mut self, label: &str) -> &mut Self {
        let mut raw = [0u8; DIR_ENTRY_SIZE];
        raw[..11].copy_from_slice(&pad::<11>(label));
        raw[DIR_ATTR] = ATTR_VOLUME_ID;
        self.push_raw("/", raw)
    }

    /// A file entry whose chain is exactly `clusters` (empty for no allocation).
    pub fn file(
        &mut self,
        dir: &str,
        name: &str,
        ext: &str,
        size: u32,
        clusters: &[u16],
    ) -> &mut Self {
        self.chain(clusters);
        let start = clusters.first().copied().unwrap_or(0);
        let raw = raw_entry(name, ext, ATTR_ARCHIVE, start, size);
        self.push_raw(dir, raw)
    }

    /// A file entry pointing at `start` without touching the FAT.
    pub fn file_entry(
        &mut self,
        dir: &str,
        name: &str,
        ext: &str,
        size: u32,
        start: u16,
    ) -> &mut Self {
        let raw = raw_entry(name, ext, ATTR_ARCHIVE, start, size);
        self.push_raw(dir, raw)
    }

    pub fn deleted(&mut self, dir: &str, name: &str, ext: &str) -> &mut Self {
        let mut raw = raw_entry(name, ext, ATTR_ARCHIVE, 0, 0);
        raw[0] = SLOT_DELETED;
        self.push_raw(dir, raw)
    }

    /// A subdirectory stored in `clusters`, with `.` and `..` entries.
    /// Returns the handle used to add entries to it.
    pub fn directory(&mut self, parent: &str, name: &str, clusters: &[u16]) -> String {
        self.chain(clusters);
        let start = clusters[0];
        self.push_raw(parent, raw_entry(name, "", ATTR_DIRECTORY, start, 0));

        let parent_start = self.dirs[parent].clusters.first().copied().unwrap_or(ROOT_DIR_CLUSTER);
        let handle = format!("{}{}/", parent, name);
        self.dirs.insert(handle.clone(), DirState { clusters: clusters.to_vec(), next_slot: 0 });
        self.push_raw(&handle, raw_dot_entry(".", start));
        self.push_raw(&handle, raw_dot_entry("..", parent_start));
        handle
    }

    /// A directory entry pointing at `cluster` with no chain or contents of its own.
    pub fn directory_link(&mut self, parent: &str, name: &str, cluster: u16) -> &mut Self {
        self.push_raw(parent, raw_entry(name, "", ATTR_DIRECTORY, cluster, 0))
    }

    fn push_raw(&mut self, dir: &str, raw: [u8; DIR_ENTRY_SIZE]) -> &mut Self {
        let geometry = *self.fat.geometry();
        let state = self.dirs.get_mut(dir).expect("unknown directory handle");
        let slot = state.next_slot;
        state.next_slot += 1;

        let offset = if dir == "/" {
            assert!(slot < geometry.root_entries as usize, "root directory full");
            geometry.root_dir_offset() + slot * DIR_ENTRY_SIZE
        } else {
            let per_cluster = geometry.cluster_size() as usize / DIR_ENTRY_SIZE;
            let cluster = state.clusters[slot / per_cluster];
            let base = geometry.cluster_range(cluster).expect("valid cluster").start;
            base + (slot % per_cluster) * DIR_ENTRY_SIZE
        };
        self.image[offset..offset + DIR_ENTRY_SIZE].copy_from_slice(&raw);
        self
    }
}

fn boot_sector(
    bytes_per_sector: u16,
    sectors_per_cluster: u8,
    total_sectors: u32,
    root_entries: u16,
    sectors_per_fat: u16,
) -> [u8; BOOT_SECTOR_SIZE] {
    let mut boot = [0u8; BOOT_SECTOR_SIZE];
    boot[BS_JMP_BOOT..BS_JMP_BOOT + 3].copy_from_slice(&[0xEB, 0x3C, 0x90]);
    boot[BS_OEM_NAME..BS_OEM_NAME + 8].copy_from_slice(b"MSDOS5.0");
    boot[BPB_BYTES_PER_SEC..BPB_BYTES_PER_SEC + 2].copy_from_slice(&bytes_per_sector.to_le_bytes());
    boot[BPB_SEC_PER_CLUS] = sectors_per_cluster;
    boot[BPB_RSVD_SEC_CNT..BPB_RSVD_SEC_CNT + 2].copy_from_slice(&1u16.to_le_bytes());
    boot[BPB_NUM_FATS] = 2;
    boot[BPB_ROOT_ENT_CNT..BPB_ROOT_ENT_CNT + 2].copy_from_slice(&root_entries.to_le_bytes());
    if total_sectors < 0x10000 {
        let sectors = (total_sectors as u16).to_le_bytes();
        boot[BPB_TOT_SEC16..BPB_TOT_SEC16 + 2].copy_from_slice(&sectors);
    } else {
        boot[BPB_TOT_SEC32..BPB_TOT_SEC32 + 4].copy_from_slice(&total_sectors.to_le_bytes());
    }
    boot[BPB_MEDIA] = 0xF0;
    boot[BPB_FAT_SZ16..BPB_FAT_SZ16 + 2].copy_from_slice(&sectors_per_fat.to_le_bytes());
    boot[BOOT_SIGNATURE_OFFSET..BOOT_SIGNATURE_OFFSET + 2].copy_from_slice(&BOOT_SIGNATURE);
    boot
}

fn unchecked_geometry(boot: &[u8]) -> Geometry {
    Geometry {
        bytes_per_sector: u16::from_le_bytes([
            boot[BPB_BYTES_PER_SEC],
            boot[BPB_BYTES_PER_SEC + 1],
        ]),
        sectors_per_cluster: boot[BPB_SEC_PER_CLUS],
        reserved_sectors: 1,
        num_fats: boot[BPB_NUM_FATS],
        root_entries: u16::from_le_bytes([boot[BPB_ROOT_ENT_CNT], boot[BPB_ROOT_ENT_CNT + 1]]),
        total_sectors: 0,
        sectors_per_fat: u16::from_le_bytes([boot[BPB_FAT_SZ16], boot[BPB_FAT_SZ16 + 1]]),
        media_descriptor: boot[BPB_MEDIA],
    }
}

fn pad<const N: usize>(value: &str) -> [u8; N] {
    let mut field = [b' '; N];
    let len = value.len().min(N);
    field[..len].copy_from_slice(&value.as_bytes()[..len]);
    field
}

fn raw_entry(name: &str, ext: &str, attributes: u8, start: u16, size: u32) -> [u8; DIR_ENTRY_SIZE] {
    let mut raw = [0u8; DIR_ENTRY_SIZE];
    raw[..DIR_NAME_LEN].copy_from_slice(&pad::<DIR_NAME_LEN>(name));
    raw[DIR_NAME_LEN..DIR_NAME_LEN + DIR_EXT_LEN].copy_from_slice(&pad::<DIR_EXT_LEN>(ext));
    raw[DIR_ATTR] = attributes;
    raw[DIR_FST_CLUS_LO..DIR_FST_CLUS_LO + 2].copy_from_slice(&start.to_le_bytes());
    raw[DIR_FILE_SIZE..DIR_FILE_SIZE + 4].copy_from_slice(&size.to_le_bytes());
    raw
}

fn raw_dot_entry(dots: &str, cluster: u16) -> [u8; DIR_ENTRY_SIZE] {
    raw_entry(dots, "", ATTR_DIRECTORY, cluster, 0)
}
