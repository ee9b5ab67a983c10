// Lost chain reclamation

use log::{debug, info};
use scandisk_core::{LostChain, ScanDiskError};
use std::collections::HashSet;

use super::cluster_chain::next_link;
use super::constants::*;
use super::fat_table::Fat12;
use super::tracker::ClusterTracker;

/// Hands out `FOUND<n>` names in emission order, skipping names the root
/// directory already holds from an earlier run. Numbers stop at
/// `FOUND_MAX_INDEX`, the largest that fits an 8.3 base name.
#[derive(Debug)]
pub struct FoundNamer {
    next: u32,
    taken: HashSet<String>,
}

impl FoundNamer {
    pub fn new<I: IntoIterator<Item = String>>(taken: I) -> Self {
        Self {
            next: 1,
            taken: taken.into_iter().collect(),
        }
    }

    pub fn next_name(&mut self) -> Result<String, ScanDiskError> {
        while self.next <= FOUND_MAX_INDEX {
            let name = format!("{}{}", FOUND_PREFIX, self.next);
            self.next += 1;
            if !self.taken.contains(&format!("{}.{}", name, FOUND_EXTENSION)) {
                return Ok(name);
            }
        }
        Err(ScanDiskError::FoundNamesExhausted { limit: FOUND_MAX_INDEX })
    }
}

/// Result of the scan: the chains to materialise, and the clusters whose FAT
/// entry must become end-of-chain because their chain ran into owned space.
#[derive(Debug, Default)]
pub struct Reclaimed {
    pub lost_chains: Vec<LostChain>,
    pub cut_points: Vec<u16>,
}

/// Scan clusters 2..=max in ascending order for allocated clusters nobody
/// owns, following each into a lost chain. Every member is marked in
/// `tracker` so a cluster is reported once. Nothing is written to the image.
pub fn reclaim_lost_chains(
    fat: &Fat12,
    image: &[u8],
    tracker: &mut ClusterTracker,
    namer: &mut FoundNamer,
) -> Result<Reclaimed, ScanDiskError> {
    let cluster_size = fat.geometry().cluster_size();
    let mut reclaimed = Reclaimed::default();

    for head in FIRST_DATA_CLUSTER..=fat.geometry().max_cluster() {
        if tracker.is_visited(head) || !fat.entry(image, head)?.is_allocated() {
            continue;
        }

        let (clusters, cut) = follow_lost_chain(fat, image, tracker, head)?;
        if let Some(cluster) = cut {
            debug!("Lost chain at {} runs into owned space, cutting after {}", head, cluster);
            reclaimed.cut_points.push(cluster);
        }

        let name = namer.next_name()?;
        debug!("Lost chain {} at {}: {} clusters", name, head, clusters.len());
        reclaimed.lost_chains.push(LostChain {
            name,
            extension: FOUND_EXTENSION.to_string(),
            start_cluster: head,
            size: clusters.len() as u32 * cluster_size,
            clusters,
        });
    }

    if !reclaimed.lost_chains.is_empty() {
        info!(
            "Found {} lost chains ({} clusters)",
            reclaimed.lost_chains.len(),
            reclaimed.lost_chains.iter().map(LostChain::length).sum::<usize>()
        );
    }
    Ok(reclaimed)
}

/// Follow one unowned chain from `head`. Returns its members and, if it
/// links into an already-owned cluster, the member that has to be cut.
fn follow_lost_chain(
    fat: &Fat12,
    image: &[u8],
    tracker: &mut ClusterTracker,
    head: u16,
) -> Result<(Vec<u16>, Option<u16>), ScanDiskError> {
    let mut members = Vec::new();
    let mut seen = HashSet::new();
    let mut current = head;

    loop {
        if !seen.insert(current) {
            return Err(ScanDiskError::ChainCycle { start: head, cluster: current });
        }
        tracker.mark(current);
        members.push(current);

        match next_link(fat, image, current)? {
            None => return Ok((members, None)),
            // Seen locally means a cycle, caught on the next iteration
            Some(next) if tracker.is_visited(next) && !seen.contains(&next) => {
                return Ok((members, Some(current)));
            }
            Some(next) => current = next,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fat12::geometry::Geometry;
    use crate::fat12::walker::walk_ownership;
    use crate::test_helpers::ImageBuilder;

    fn reclaim(image: &[u8]) -> Result<(Reclaimed, ClusterTracker), ScanDiskError> {
        let fat = Fat12::new(Geometry::parse(image).unwrap());
        let mut tracker = walk_ownership(&fat, image)?.tracker;
        let mut namer = FoundNamer::new([]);
        let reclaimed = reclaim_lost_chains(&fat, image, &mut tracker, &mut namer)?;
        Ok((reclaimed, tracker))
    }

    #[test]
    fn test_no_lost_chains() {
        let mut builder = ImageBuilder::floppy();
        builder.file("/", "A", "TXT", 1000, &[2, 3]);
        let (reclaimed, _) = reclaim(&builder.build()).unwrap();
        assert!(reclaimed.lost_chains.is_empty());
        assert!(reclaimed.cut_points.is_empty());
    }

    #[test]
    fn test_lost_chains_named_in_ascending_order() {
        let mut builder = ImageBuilder::floppy();
        builder.file("/", "A", "TXT", 100, &[2]);
        builder.chain(&[20, 21, 22]);
        builder.chain(&[9, 30]);
        let (reclaimed, tracker) = reclaim(&builder.build()).unwrap();

        let chains = &reclaimed.lost_chains;
        assert_eq!(chains.len(), 2);
        assert_eq!(chains[0].display_name(), "FOUND1.DAT");
        assert_eq!(chains[0].clusters, vec![9, 30]);
        assert_eq!(chains[0].size, 1024);
        assert_eq!(chains[1].display_name(), "FOUND2.DAT");
        assert_eq!(chains[1].start_cluster, 20);
        assert_eq!(chains[1].clusters, vec![20, 21, 22]);
        assert!(tracker.is_visited(30));
    }

    #[test]
    fn test_bad_and_free_clusters_are_not_heads() {
        let mut builder = ImageBuilder::floppy();
        builder.fat_entry(5, FAT12_BAD);
        builder.fat_entry(6, 0xFF3);
        let (reclaimed, _) = reclaim(&builder.build()).unwrap();
        assert!(reclaimed.lost_chains.is_empty());
    }

    #[test]
    fn test_chain_into_owned_cluster_is_cut() {
        let mut builder = ImageBuilder::floppy();
        builder.file("/", "A", "TXT", 1000, &[2, 3]);
        builder.fat_entry(10, 11);
        builder.fat_entry(11, 3);
        let (reclaimed, _) = reclaim(&builder.build()).unwrap();

        assert_eq!(reclaimed.lost_chains[0].clusters, vec![10, 11]);
        assert_eq!(reclaimed.cut_points, vec![11]);
    }

    #[test]
    fn test_tail_claimed_by_earlier_lost_chain() {
        // 12 -> 8 -> EOC: the ascending scan reaches 8 first
        let mut builder = ImageBuilder::floppy();
        builder.chain(&[12, 8]);
        let (reclaimed, _) = reclaim(&builder.build()).unwrap();

        assert_eq!(reclaimed.lost_chains.len(), 2);
        assert_eq!(reclaimed.lost_chains[0].clusters, vec![8]);
        assert_eq!(reclaimed.lost_chains[1].clusters, vec![12]);
        assert_eq!(reclaimed.cut_points, vec![12]);
    }

    #[test]
    fn test_lost_cycle_is_fatal() {
        let mut builder = ImageBuilder::floppy();
        builder.fat_entry(40, 41);
        builder.fat_entry(41, 40);
        assert!(matches!(
            reclaim(&builder.build()),
            Err(ScanDiskError::ChainCycle { start: 40, cluster: 40 })
        ));
    }

    #[test]
    fn test_namer_skips_existing_names() {
        let mut namer = FoundNamer::new(["FOUND1.DAT".to_string(), "FOUND3.DAT".to_string()]);
        assert_eq!(namer.next_name().unwrap(), "FOUND2");
        assert_eq!(namer.next_name().unwrap(), "FOUND4");
    }

    #[test]
    fn test_namer_stops_at_eight_characters() {
        let taken = (1..FOUND_MAX_INDEX).map(|n| format!("FOUND{}.DAT", n));
        let mut namer = FoundNamer::new(taken);

        let last = namer.next_name().unwrap();
        assert_eq!(last, "FOUND999");
        assert_eq!(last.len(), 8);
        assert!(matches!(
            namer.next_name(),
            Err(ScanDiskError::FoundNamesExhausted { limit: 999 })
        ));
    }
}
