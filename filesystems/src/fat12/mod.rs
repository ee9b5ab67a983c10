// FAT12 volume checking
//
// Leaves first: geometry and the 12-bit FAT accessor, the directory decoder
// and the cluster tracker; then the tree traversal both the checker and the
// lister are built on.

pub mod appender;
pub mod checker;
pub mod cluster_chain;
pub mod constants;
pub mod directory;
pub mod fat_table;
pub mod geometry;
pub mod image;
pub mod lister;
pub mod reclaim;
pub mod reconcile;
pub mod tracker;
pub mod tree;
pub mod walker;

pub use appender::DirectoryAppender;
pub use checker::ScanDisk;
pub use cluster_chain::{read_cluster_chain, truncate_cluster_chain};
pub use directory::{DirEntry, Slot};
pub use fat_table::{Fat12, FatEntry};
pub use geometry::Geometry;
pub use image::DiskImage;
pub use lister::{list_path, list_tree};
pub use tracker::ClusterTracker;
pub use tree::{walk_tree, DirectoryVisitor};
pub use walker::{walk_ownership, FileRecord, WalkResult};
