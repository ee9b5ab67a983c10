// FAT12 short-name directory entries

use byteorder::{ByteOrder, LittleEndian};
use scandisk_core::ScanDiskError;

use super::constants::*;

/// Directory entry attribute bits
pub mod attributes {
    pub const ATTR_READ_ONLY: u8 = 0x01;
    pub const ATTR_HIDDEN: u8 = 0x02;
    pub const ATTR_SYSTEM: u8 = 0x04;
    pub const ATTR_VOLUME_ID: u8 = 0x08;
    pub const ATTR_DIRECTORY: u8 = 0x10;
    pub const ATTR_ARCHIVE: u8 = 0x20;
}

use attributes::*;

/// A decoded 32-byte directory entry. Timestamps are carried through untouched
/// as part of the raw bytes and never interpreted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    pub name: [u8; DIR_NAME_LEN],
    pub extension: [u8; DIR_EXT_LEN],
    pub attributes: u8,
    pub start_cluster: u16,
    pub file_size: u32,
}

/// What a directory slot holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Slot {
    /// First byte 0x00: no more entries in this directory.
    End,
    Deleted,
    VolumeLabel(DirEntry),
    Directory(DirEntry),
    File(DirEntry),
}

impl DirEntry {
    pub fn decode(raw: &[u8]) -> Self {
        let mut name = [0u8; DIR_NAME_LEN];
        let mut extension = [0u8; DIR_EXT_LEN];
        name.copy_from_slice(&raw[..DIR_NAME_LEN]);
        extension.copy_from_slice(&raw[DIR_NAME_LEN..DIR_NAME_LEN + DIR_EXT_LEN]);

        Self {
            name,
            extension,
            attributes: raw[DIR_ATTR],
            start_cluster: LittleEndian::read_u16(&raw[DIR_FST_CLUS_LO..]),
            file_size: LittleEndian::read_u32(&raw[DIR_FILE_SIZE..]),
        }
    }

    /// Plain file entry as the lost-and-found pass creates them.
    pub fn new_file(
        name: &str,
        extension: &str,
        start_cluster: u16,
        file_size: u32,
    ) -> Result<Self, ScanDiskError> {
        Ok(Self {
            name: pad_field::<DIR_NAME_LEN>(name)?,
            extension: pad_field::<DIR_EXT_LEN>(extension)?,
            attributes: ATTR_ARCHIVE,
            start_cluster,
            file_size,
        })
    }

    pub fn encode(&self) -> [u8; DIR_ENTRY_SIZE] {
        let mut raw = [0u8; DIR_ENTRY_SIZE];
        raw[..DIR_NAME_LEN].copy_from_slice(&self.name);
        raw[DIR_NAME_LEN..DIR_NAME_LEN + DIR_EXT_LEN].copy_from_slice(&self.extension);
        raw[DIR_ATTR] = self.attributes;
        LittleEndian::write_u16(&mut raw[DIR_FST_CLUS_LO..], self.start_cluster);
        LittleEndian::write_u32(&mut raw[DIR_FILE_SIZE..], self.file_size);
        raw
    }

    pub fn is_volume_label(&self) -> bool {
        self.attributes & ATTR_VOLUME_ID != 0
    }

    pub fn is_directory(&self) -> bool {
        self.attributes & ATTR_DIRECTORY != 0
    }

    /// `.` and `..` links inside a subdirectory.
    pub fn is_dot_entry(&self) -> bool {
        let name = self.base_name();
        name == "." || name == ".."
    }

    /// Name with trailing padding removed; a leading 0x05 is shown as 0xE5.
    pub fn base_name(&self) -> String {
        let mut name = trim_field(&self.name);
        if self.name[0] == SLOT_E5_ESCAPE {
            name.replace_range(..1, "\u{E5}");
        }
        name
    }

    pub fn extension(&self) -> String {
        trim_field(&self.extension)
    }

    /// `NAME.EXT`, keeping the dot even for an empty extension the way
    /// DOS listings print plain files.
    pub fn display_name(&self) -> String {
        format!("{}.{}", self.base_name(), self.extension())
    }
}

/// Classify one raw 32-byte slot.
pub fn classify(raw: &[u8]) -> Slot {
    match raw[0] {
        SLOT_EMPTY => Slot::End,
        SLOT_DELETED => Slot::Deleted,
        _ => {
            let entry = DirEntry::decode(raw);
            if entry.is_volume_label() {
                Slot::VolumeLabel(entry)
            } else if entry.is_directory() {
                Slot::Directory(entry)
            } else {
                Slot::File(entry)
            }
        }
    }
}

/// Decode a directory block slot by slot, stopping at the end sentinel.
/// Returns the decoded slots and whether the sentinel was seen.
pub fn parse_block(block: &[u8]) -> (Vec<Slot>, bool) {
    let mut slots = Vec::new();
    for raw in block.chunks_exact(DIR_ENTRY_SIZE) {
        match classify(raw) {
            Slot::End => return (slots, true),
            slot => slots.push(slot),
        }
    }
    (slots, false)
}

fn trim_field(field: &[u8]) -> String {
    let end = field
        .iter()
        .rposition(|&b| b != b' ' && b != 0)
        .map_or(0, |pos| pos + 1);
    String::from_utf8_lossy(&field[..end]).into_owned()
}

fn pad_field<const N: usize>(value: &str) -> Result<[u8; N], ScanDiskError> {
    if value.is_empty() || value.len() > N {
        return Err(ScanDiskError::InvalidName(format!(
            "'{}' must be 1 to {} characters",
            value, N
        )));
    }
    if !value.bytes().all(is_valid_83_char) {
        return Err(ScanDiskError::InvalidName(format!("invalid character in '{}'", value)));
    }

    let mut field = [b' '; N];
    field[..value.len()].copy_from_slice(value.as_bytes());
    Ok(field)
}

fn is_valid_83_char(c: u8) -> bool {
    matches!(c,
        b'A'..=b'Z' | b'0'..=b'9' | b'!' | b'#' | b'$' | b'%' | b'&' |
        b'\'' | b'(' | b')' | b'-' | b'@' | b'^' | b'_' | b'`' |
        b'{' | b'}' | b'~')
}
