// FAT12 filesystem checking and repair
pub mod fat12;

#[doc(hidden)]
pub mod test_helpers;

pub use fat12::{list_path, list_tree, DiskImage, Fat12, Geometry, ScanDisk};
