// Declared size vs chain length

use log::{debug, info, warn};
use scandisk_core::{ClusterCountPolicy, ScanDiskError, SizeCorrection};

use super::cluster_chain::truncate_cluster_chain;
use super::fat_table::Fat12;
use super::tracker::ClusterTracker;
use super::walker::FileRecord;

/// A planned truncation. `chain` ends with the last cluster to free, so
/// clusters another owner still uses stay out of it.
#[derive(Debug, Clone)]
pub struct PlannedTruncation {
    pub chain: Vec<u16>,
    pub correction: SizeCorrection,
}

/// Find every file whose chain is longer than its declared size allows.
///
/// Surplus clusters are freed only up to the first one that another file or
/// directory also owns: from there on the chain belongs to that owner too.
/// When the very first surplus cluster is shared the file is left alone,
/// since ending its chain early would also cut the other owner's chain.
pub fn plan_size_corrections(
    files: &[FileRecord],
    tracker: &ClusterTracker,
    cluster_size: u32,
    policy: ClusterCountPolicy,
) -> Vec<PlannedTruncation> {
    files
        .iter()
        .filter(|file| !file.chain.is_empty())
        .filter_map(|file| plan_file(file, tracker, cluster_size, policy))
        .collect()
}

fn plan_file(
    file: &FileRecord,
    tracker: &ClusterTracker,
    cluster_size: u32,
    policy: ClusterCountPolicy,
) -> Option<PlannedTruncation> {
    let expected = policy.expected_clusters(file.size, cluster_size) as usize;
    if file.chain_length() <= expected {
        return None;
    }

    debug!(
        "{} declares {} bytes ({} clusters) but chains {} clusters",
        file.display_name(),
        file.size,
        expected,
        file.chain_length()
    );

    let surplus = &file.chain[expected..];
    let unshared = surplus
        .iter()
        .position(|&cluster| tracker.is_shared(cluster))
        .unwrap_or(surplus.len());
    if unshared == 0 {
        warn!(
            "{} is cross-linked at cluster {}, leaving its chain as it is",
            file.display_name(),
            surplus[0]
        );
        return None;
    }

    Some(PlannedTruncation {
        chain: file.chain[..expected + unshared].to_vec(),
        correction: SizeCorrection {
            name: file.name.clone(),
            extension: file.extension.clone(),
            start_cluster: file.start_cluster,
            declared_size: file.size,
            previous_extent: file.chain_length() as u64 * cluster_size as u64,
            kept_clusters: expected as u32,
            freed_clusters: surplus[..unshared].to_vec(),
        },
    })
}

/// Cut each planned chain at its kept length and free the remainder.
pub fn apply_size_corrections(
    fat: &Fat12,
    image: &mut [u8],
    plans: &[PlannedTruncation],
) -> Result<(), ScanDiskError> {
    for plan in plans {
        let correction = &plan.correction;
        let kept = correction.kept_clusters as usize;
        let freed = truncate_cluster_chain(fat, image, &plan.chain, kept)?;
        info!(
            "Truncated {} to {} clusters, freed {}",
            correction.display_name(),
            correction.kept_clusters,
            freed.len()
        );
    }
    Ok(())
}
