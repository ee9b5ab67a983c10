// Read-only directory listing

use scandisk_core::ScanDiskError;
use std::path::Path;

use super::directory::DirEntry;
use super::fat_table::Fat12;
use super::geometry::Geometry;
use super::image::DiskImage;
use super::tree::{walk_tree, DirectoryVisitor};

const INDENT_STEP: usize = 2;

#[derive(Default)]
struct Lister {
    lines: Vec<String>,
}

impl DirectoryVisitor for Lister {
    fn volume_label(&mut self, entry: &DirEntry, _depth: usize) -> Result<(), ScanDiskError> {
        // Labels may spill into the extension field
        let label = format!("{}{}", entry.base_name(), entry.extension());
        self.lines.push(format!("Volume: {}", label));
        Ok(())
    }

    fn directory(&mut self, entry: &DirEntry, depth: usize) -> Result<(), ScanDiskError> {
        self.lines.push(format!(
            "{:indent$}{} (directory)",
            "",
            entry.base_name(),
            indent = depth * INDENT_STEP
        ));
        Ok(())
    }

    fn file(&mut self, entry: &DirEntry, depth: usize) -> Result<(), ScanDiskError> {
        self.lines.push(format!(
            "{:indent$}{} ({} bytes)",
            "",
            entry.display_name(),
            entry.file_size,
            indent = depth * INDENT_STEP
        ));
        Ok(())
    }
}

/// One line per volume label, directory and file, depth first.
pub fn list_tree(image: &[u8]) -> Result<Vec<String>, ScanDiskError> {
    let fat = Fat12::new(Geometry::parse(image)?);
    let mut lister = Lister::default();
    walk_tree(&fat, image, &mut lister)?;
    Ok(lister.lines)
}

pub fn list_path<P: AsRef<Path>>(path: P) -> Result<Vec<String>, ScanDiskError> {
    let image = DiskImage::load(path)?;
    list_tree(image.as_slice())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::ImageBuilder;

    #[test]
    fn test_listing_format() {
        let mut builder = ImageBuilder::floppy();
        builder.volume_label("MYDISK");
        builder.file("/", "AUTOEXEC", "BAT", 128, &[2]);
        let dos = builder.directory("/", "DOS", &[3]);
        builder.file(&dos, "EDIT", "COM", 413, &[4]);
        let help = builder.directory(&dos, "HELP", &[5]);
        builder.file(&help, "INDEX", "HLP", 0, &[]);
        let image = builder.build();

        assert_eq!(
            list_tree(&image).unwrap(),
            vec![
                "Volume: MYDISK",
                "AUTOEXEC.BAT (128 bytes)",
                "DOS (directory)",
                "  EDIT.COM (413 bytes)",
                "  HELP (directory)",
                "    INDEX.HLP (0 bytes)",
            ]
        );
    }

    #[test]
    fn test_listing_guards_cycles() {
        let mut builder = ImageBuilder::floppy();
        let a = builder.directory("/", "A", &[3]);
        builder.directory_link(&a, "BACK", 3);
        let image = builder.build();

        assert!(matches!(list_tree(&image), Err(ScanDiskError::DirectoryCycle { cluster: 3 })));
    }
}
