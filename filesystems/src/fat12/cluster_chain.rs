// FAT12 cluster chain following and truncation

use log::trace;
use scandisk_core::ScanDiskError;
use std::collections::HashSet;

use super::fat_table::{Fat12, FatEntry};

/// Where the chain goes after `cluster`: `None` at an end-of-chain marker.
///
/// Anything else that is not a link to a valid data cluster (free, reserved,
/// bad, out of range) means the chain is broken.
pub fn next_link(fat: &Fat12, image: &[u8], cluster: u16) -> Result<Option<u16>, ScanDiskError> {
    let value = fat.read_entry(image, cluster)?;
    match FatEntry::decode(value) {
        FatEntry::EndOfChain(_) => Ok(None),
        FatEntry::Next(next) if fat.geometry().is_valid_cluster(next) => Ok(Some(next)),
        _ => Err(ScanDiskError::InvalidChainLink { cluster, value }),
    }
}

/// Read a complete cluster chain. A start cluster of 0 is an empty file.
pub fn read_cluster_chain(
    fat: &Fat12,
    image: &[u8],
    start: u16,
) -> Result<Vec<u16>, ScanDiskError> {
    let mut chain = Vec::new();
    if start == 0 {
        return Ok(chain);
    }
    if !fat.geometry().is_valid_cluster(start) {
        return Err(ScanDiskError::ClusterOutOfRange {
            cluster: start,
            max_cluster: fat.geometry().max_cluster(),
        });
    }

    // Prevent infinite loops
    let mut visited = HashSet::new();
    let mut current = start;

    loop {
        if !visited.insert(current) {
            return Err(ScanDiskError::ChainCycle { start, cluster: current });
        }
        chain.push(current);

        match next_link(fat, image, current)? {
            Some(next) => current = next,
            None => break,
        }
    }

    trace!("Chain from {}: {} clusters", start, chain.len());
    Ok(chain)
}

/// Keep the first `keep` clusters of `chain`: the last kept cluster becomes
/// end-of-chain and every later member is freed. Returns the freed clusters.
pub fn truncate_cluster_chain(
    fat: &Fat12,
    image: &mut [u8],
    chain: &[u16],
    keep: usize,
) -> Result<Vec<u16>, ScanDiskError> {
    if keep == 0 || keep >= chain.len() {
        return Ok(Vec::new());
    }

    fat.mark_end_of_chain(image, chain[keep - 1])?;
    let freed = chain[keep..].to_vec();
    for &cluster in &freed {
        fat.mark_free(image, cluster)?;
    }
    Ok(freed)
}
