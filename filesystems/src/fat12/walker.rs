// Ownership walk: which clusters the directory tree accounts for

use log::{debug, info};
use scandisk_core::{ScanDiskError, WalkSummary};

use super::cluster_chain::read_cluster_chain;
use super::directory::DirEntry;
use super::fat_table::Fat12;
use super::tracker::ClusterTracker;
use super::tree::{walk_tree, DirectoryVisitor};

/// A file found during the walk, with the chain its FAT entries describe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    pub name: String,
    pub extension: String,
    pub size: u32,
    pub start_cluster: u16,
    pub chain: Vec<u16>,
}

impl FileRecord {
    pub fn chain_length(&self) -> usize {
        self.chain.len()
    }

    pub fn display_name(&self) -> String {
        format!("{}.{}", self.name, self.extension)
    }
}

#[derive(Debug)]
pub struct WalkResult {
    pub tracker: ClusterTracker,
    pub files: Vec<FileRecord>,
    pub directories: usize,
}

impl WalkResult {
    pub fn summary(&self) -> WalkSummary {
        WalkSummary {
            files: self.files.len(),
            directories: self.directories,
            owned_clusters: self.tracker.len(),
        }
    }
}

struct OwnershipWalker<'a> {
    fat: &'a Fat12,
    image: &'a [u8],
    tracker: ClusterTracker,
    files: Vec<FileRecord>,
    directories: usize,
}

impl DirectoryVisitor for OwnershipWalker<'_> {
    fn directory(&mut self, _entry: &DirEntry, _depth: usize) -> Result<(), ScanDiskError> {
        self.directories += 1;
        Ok(())
    }

    fn directory_cluster(&mut self, cluster: u16) {
        self.tracker.mark(cluster);
    }

    fn file(&mut self, entry: &DirEntry, _depth: usize) -> Result<(), ScanDiskError> {
        let chain = read_cluster_chain(self.fat, self.image, entry.start_cluster)?;
        for &cluster in &chain {
            // Cross-linked clusters collect one owner per file
            self.tracker.mark(cluster);
        }

        debug!(
            "File {} size {} start {} chain length {}",
            entry.display_name(),
            entry.file_size,
            entry.start_cluster,
            chain.len()
        );

        self.files.push(FileRecord {
            name: entry.base_name(),
            extension: entry.extension(),
            size: entry.file_size,
            start_cluster: entry.start_cluster,
            chain,
        });
        Ok(())
    }
}

/// Walk the tree from the root, recording every subdirectory and file
/// cluster in a fresh tracker and inventorying every file.
pub fn walk_ownership(fat: &Fat12, image: &[u8]) -> Result<WalkResult, ScanDiskError> {
    let mut walker = OwnershipWalker {
        fat,
        image,
        tracker: ClusterTracker::new(fat.geometry().max_cluster()),
        files: Vec::new(),
        directories: 0,
    };
    walk_tree(fat, image, &mut walker)?;

    info!(
        "Ownership walk: {} files, {} directories, {} clusters owned",
        walker.files.len(),
        walker.directories,
        walker.tracker.len()
    );

    Ok(WalkResult {
        tracker: walker.tracker,
        files: walker.files,
        directories: walker.directories,
    })
}
