// Directory tree traversal shared by the ownership walk and the lister

use log::{debug, warn};
use scandisk_core::ScanDiskError;
use std::collections::HashSet;

use super::cluster_chain::read_cluster_chain;
use super::constants::*;
use super::directory::{parse_block, DirEntry, Slot};
use super::fat_table::Fat12;

/// Callbacks for a depth-first walk of the directory tree.
///
/// `depth` is the nesting level of the directory holding the entry, root = 0.
pub trait DirectoryVisitor {
    fn volume_label(&mut self, _entry: &DirEntry, _depth: usize) -> Result<(), ScanDiskError> {
        Ok(())
    }

    /// Called before the subdirectory's own entries are visited.
    fn directory(&mut self, _entry: &DirEntry, _depth: usize) -> Result<(), ScanDiskError> {
        Ok(())
    }

    /// Every cluster holding a subdirectory's entries.
    fn directory_cluster(&mut self, _cluster: u16) {}

    fn file(&mut self, entry: &DirEntry, depth: usize) -> Result<(), ScanDiskError>;
}

/// Walk every directory reachable from the root.
///
/// A directory that contains one of its own ancestors is a cycle and fails
/// the walk. A directory reached a second time through an unrelated entry is
/// reported to the visitor but its contents are walked only once.
pub fn walk_tree<V: DirectoryVisitor>(
    fat: &Fat12,
    image: &[u8],
    visitor: &mut V,
) -> Result<(), ScanDiskError> {
    let mut walker = TreeWalker {
        fat,
        image,
        ancestors: HashSet::from([ROOT_DIR_CLUSTER]),
        walked: HashSet::new(),
    };
    walker.walk_root(visitor)
}

struct TreeWalker<'a> {
    fat: &'a Fat12,
    image: &'a [u8],
    /// Start clusters of the directories on the current path
    ancestors: HashSet<u16>,
    walked: HashSet<u16>,
}

impl<'a> TreeWalker<'a> {
    fn walk_root<V: DirectoryVisitor>(&mut self, visitor: &mut V) -> Result<(), ScanDiskError> {
        let range = self.fat.geometry().root_dir_range();
        debug!(
            "Walking root directory at offset {:#x}, size: {}",
            range.start,
            range.len()
        );

        let (slots, _) = parse_block(&self.image[range]);
        self.visit_slots(slots, 0, visitor)
    }

    fn walk_subdirectory<V: DirectoryVisitor>(
        &mut self,
        entry: &DirEntry,
        depth: usize,
        visitor: &mut V,
    ) -> Result<(), ScanDiskError> {
        let start = entry.start_cluster;
        if self.ancestors.contains(&start) {
            return Err(ScanDiskError::DirectoryCycle { cluster: start });
        }
        if !self.walked.insert(start) {
            warn!(
                "Directory {} shares cluster {} with a directory already walked",
                entry.base_name(),
                start
            );
            return Ok(());
        }

        self.ancestors.insert(start);
        self.walk_chain(entry, start, depth, visitor)?;
        self.ancestors.remove(&start);
        Ok(())
    }

    fn walk_chain<V: DirectoryVisitor>(
        &mut self,
        entry: &DirEntry,
        start: u16,
        depth: usize,
        visitor: &mut V,
    ) -> Result<(), ScanDiskError> {
        let chain = read_cluster_chain(self.fat, self.image, start)?;
        debug!(
            "Walking directory {} at cluster {} ({} clusters)",
            entry.base_name(),
            start,
            chain.len()
        );

        for &cluster in &chain {
            visitor.directory_cluster(cluster);
        }

        for &cluster in &chain {
            let range = self.fat.geometry().cluster_range(cluster)?;
            let (slots, terminated) = parse_block(&self.image[range]);
            self.visit_slots(slots, depth, visitor)?;
            if terminated {
                break;
            }
        }
        Ok(())
    }

    fn visit_slots<V: DirectoryVisitor>(
        &mut self,
        slots: Vec<Slot>,
        depth: usize,
        visitor: &mut V,
    ) -> Result<(), ScanDiskError> {
        for slot in slots {
            match slot {
                Slot::End | Slot::Deleted => {}
                Slot::VolumeLabel(entry) => visitor.volume_label(&entry, depth)?,
                Slot::Directory(entry) => {
                    if entry.is_dot_entry() {
                        continue;
                    }
                    visitor.directory(&entry, depth)?;
                    self.walk_subdirectory(&entry, depth + 1, visitor)?;
                }
                Slot::File(entry) => {
                    if entry.is_dot_entry() {
                        continue;
                    }
                    visitor.file(&entry, depth)?;
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fat12::geometry::Geometry;
    use crate::test_helpers::ImageBuilder;

    #[derive(Default)]
    struct Recorder {
        events: Vec<String>,
    }

    impl DirectoryVisitor for Recorder {
        fn volume_label(&mut self, entry: &DirEntry, depth: usize) -> Result<(), ScanDiskError> {
            self.events.push(format!("{}volume {}", depth, entry.base_name()));
            Ok(())
        }

        fn directory(&mut self, entry: &DirEntry, depth: usize) -> Result<(), ScanDiskError> {
            self.events.push(format!("{}dir {}", depth, entry.base_name()));
            Ok(())
        }

        fn directory_cluster(&mut self, cluster: u16) {
            self.events.push(format!("cluster {}", cluster));
        }

        fn file(&mut self, entry: &DirEntry, depth: usize) -> Result<(), ScanDiskError> {
            self.events.push(format!("{}file {}", depth, entry.display_name()));
            Ok(())
        }
    }

    fn walk(image: &[u8]) -> Result<Vec<String>, ScanDiskError> {
        let fat = Fat12::new(Geometry::parse(image).unwrap());
        let mut recorder = Recorder::default();
        walk_tree(&fat, image, &mut recorder)?;
        Ok(recorder.events)
    }

    #[test]
    fn test_depth_first_order() {
        let mut builder = ImageBuilder::floppy();
        builder.volume_label("TESTDISK");
        builder.file("/", "A", "TXT", 100, &[2]);
        let docs = builder.directory("/", "DOCS", &[3]);
        builder.file(&docs, "B", "TXT", 100, &[4]);
        builder.deleted("/", "GONE", "TXT");
        builder.file("/", "C", "TXT", 100, &[5]);
        let image = builder.build();

        assert_eq!(
            walk(&image).unwrap(),
            vec![
                "0volume TESTDISK",
                "0file A.TXT",
                "0dir DOCS",
                "cluster 3",
                "1file B.TXT",
                "0file C.TXT",
            ]
        );
    }

    #[test]
    fn test_multi_cluster_directory() {
        let mut builder = ImageBuilder::floppy();
        let big = builder.directory("/", "BIG", &[10, 11]);
        // 512-byte clusters hold 16 entries; `.` and `..` take two
        for i in 0..20 {
            builder.file(&big, &format!("F{}", i), "TXT", 1, &[100 + i]);
        }
        let image = builder.build();

        let events = walk(&image).unwrap();
        assert!(events.contains(&"cluster 11".to_string()));
        assert_eq!(events.iter().filter(|e| e.starts_with("1file")).count(), 20);
    }

    #[test]
    fn test_directory_cycle_detected() {
        let mut builder = ImageBuilder::floppy();
        let outer = builder.directory("/", "OUTER", &[3]);
        builder.directory_link(&outer, "LOOP", 3);
        let image = builder.build();

        assert!(matches!(walk(&image), Err(ScanDiskError::DirectoryCycle { cluster: 3 })));
    }

    #[test]
    fn test_directory_pointing_at_root_detected() {
        let mut builder = ImageBuilder::floppy();
        builder.directory_link("/", "ROOTLNK", 0);
        let image = builder.build();

        assert!(matches!(walk(&image), Err(ScanDiskError::DirectoryCycle { cluster: 0 })));
    }

    #[test]
    fn test_shared_directory_walked_once() {
        let mut builder = ImageBuilder::floppy();
        let dir = builder.directory("/", "DIR", &[5]);
        builder.file(&dir, "INNER", "TXT", 10, &[6]);
        builder.directory_link("/", "ALIAS", 5);
        let image = builder.build();

        assert_eq!(
            walk(&image).unwrap(),
            vec!["0dir DIR", "cluster 5", "1file INNER.TXT", "0dir ALIAS"]
        );
    }

    #[test]
    fn test_sibling_paths_into_same_directory() {
        // A/X and B/Y both lead to one directory; neither is its own ancestor
        let mut builder = ImageBuilder::floppy();
        let a = builder.directory("/", "A", &[3]);
        let b = builder.directory("/", "B", &[4]);
        builder.directory(&a, "X", &[7]);
        builder.directory_link(&b, "Y", 7);
        let image = builder.build();

        let events = walk(&image).unwrap();
        assert_eq!(events.iter().filter(|e| *e == "cluster 7").count(), 1);
        assert!(events.contains(&"1dir Y".to_string()));
    }
}
