// FAT12 on-disk constants

// Boot sector offsets
pub const BS_JMP_BOOT: usize = 0x00;
pub const BS_OEM_NAME: usize = 0x03;
pub const BPB_BYTES_PER_SEC: usize = 0x0B;
pub const BPB_SEC_PER_CLUS: usize = 0x0D;
pub const BPB_RSVD_SEC_CNT: usize = 0x0E;
pub const BPB_NUM_FATS: usize = 0x10;
pub const BPB_ROOT_ENT_CNT: usize = 0x11;
pub const BPB_TOT_SEC16: usize = 0x13;
pub const BPB_MEDIA: usize = 0x15;
pub const BPB_FAT_SZ16: usize = 0x16;
pub const BPB_TOT_SEC32: usize = 0x20;

// Boot sector signature
pub const BOOT_SIGNATURE: [u8; 2] = [0x55, 0xAA];
pub const BOOT_SIGNATURE_OFFSET: usize = 0x1FE;
pub const BOOT_SECTOR_SIZE: usize = 512;

// FAT12 entry values
pub const FAT12_FREE: u16 = 0x000;
pub const FAT12_RESERVED_INDEX: u16 = 0x001;
pub const FAT12_MAX_LINK: u16 = 0xFEF;
pub const FAT12_BAD: u16 = 0xFF7;
pub const FAT12_EOC_MIN: u16 = 0xFF8;
pub const FAT12_EOC: u16 = 0xFFF;  // Value written when terminating a chain
pub const FAT12_MASK: u16 = 0x0FFF;

// Cluster numbering
pub const FIRST_DATA_CLUSTER: u16 = 2;
pub const ROOT_DIR_CLUSTER: u16 = 0;  // Fixed root region, never chained
pub const FAT12_MAX_CLUSTERS: u32 = 4084;

// Directory entries
pub const DIR_ENTRY_SIZE: usize = 32;
pub const DIR_NAME_LEN: usize = 8;
pub const DIR_EXT_LEN: usize = 3;
pub const DIR_ATTR: usize = 0x0B;
pub const DIR_FST_CLUS_LO: usize = 0x1A;
pub const DIR_FILE_SIZE: usize = 0x1C;
pub const SLOT_EMPTY: u8 = 0x00;
pub const SLOT_DELETED: u8 = 0xE5;
pub const SLOT_E5_ESCAPE: u8 = 0x05;  // First byte 0xE5 stored as 0x05

// Lost-and-found naming
pub const FOUND_PREFIX: &str = "FOUND";
pub const FOUND_EXTENSION: &str = "DAT";
pub const FOUND_MAX_INDEX: u32 = 999;  // FOUND999 fills the 8-byte name field
