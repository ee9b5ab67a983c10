// FAT12 consistency checker and repairer

use log::{info, warn};
use scandisk_core::{CheckOptions, CheckReport, ScanDiskError};
use std::path::Path;

use super::appender::DirectoryAppender;
use super::directory::DirEntry;
use super::fat_table::Fat12;
use super::geometry::Geometry;
use super::image::DiskImage;
use super::reclaim::{reclaim_lost_chains, FoundNamer};
use super::reconcile::{apply_size_corrections, plan_size_corrections};
use super::walker::walk_ownership;

/// Runs the check over one image: walk, reclaim lost chains, reconcile sizes.
///
/// Every fatal condition is detected while planning, so a failing run leaves
/// the image untouched.
pub struct ScanDisk {
    options: CheckOptions,
}

impl ScanDisk {
    pub fn new(options: CheckOptions) -> Self {
        Self { options }
    }

    /// Check and repair the image at `path`. A dry run works on an in-memory
    /// copy; otherwise the file is mapped and repaired in place.
    pub fn check_path<P: AsRef<Path>>(&self, path: P) -> Result<CheckReport, ScanDiskError> {
        if self.options.dry_run {
            let mut image = DiskImage::load(path)?;
            return self.check(image.as_mut_slice());
        }

        let mut image = DiskImage::map(path)?;
        let report = self.check(image.as_mut_slice())?;
        image.flush()?;
        Ok(report)
    }

    pub fn check(&self, image: &mut [u8]) -> Result<CheckReport, ScanDiskError> {
        let geometry = Geometry::parse(image)?;
        let fat = Fat12::new(geometry);
        let cluster_size = geometry.cluster_size();
        let allocated_before = fat.allocated_count(image)?;

        // Plan
        let walk = walk_ownership(&fat, image)?;
        let summary = walk.summary();
        let mut tracker = walk.tracker;

        let appender = DirectoryAppender::new(geometry);
        let mut namer = FoundNamer::new(appender.existing_names(image));
        let reclaimed = reclaim_lost_chains(&fat, image, &mut tracker, &mut namer)?;

        let policy = self.options.cluster_policy;
        let truncations = plan_size_corrections(&walk.files, &tracker, cluster_size, policy);

        let entries = reclaimed
            .lost_chains
            .iter()
            .map(|chain| {
                DirEntry::new_file(&chain.name, &chain.extension, chain.start_cluster, chain.size)
            })
            .collect::<Result<Vec<_>, _>>()?;
        appender.ensure_capacity(image, entries.len())?;

        // Apply
        for &cluster in &reclaimed.cut_points {
            fat.mark_end_of_chain(image, cluster)?;
        }
        for entry in &entries {
            appender.append(image, entry)?;
        }
        apply_size_corrections(&fat, image, &truncations)?;

        let report = CheckReport {
            cluster_size,
            allocated_before,
            summary,
            lost_chains: reclaimed.lost_chains,
            size_corrections: truncations.into_iter().map(|plan| plan.correction).collect(),
            dry_run: self.options.dry_run,
        };

        if report.is_clean() {
            info!("Image is consistent");
        } else {
            warn!(
                "Recovered {} lost chains ({} clusters), corrected {} file sizes{}",
                report.lost_chains.len(),
                report.lost_cluster_count(),
                report.size_corrections.len(),
                if report.dry_run { " (dry run, nothing written)" } else { "" }
            );
        }
        Ok(report)
    }
}

impl Default for ScanDisk {
    fn default() -> Self {
        Self::new(CheckOptions::default())
    }
}
