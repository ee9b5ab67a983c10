// Cluster ownership set

/// Which clusters have been claimed by the ownership walk or the lost-chain
/// scan, and by how many owners. Indexed directly by cluster number.
#[derive(Debug, Clone)]
pub struct ClusterTracker {
    owners: Vec<u16>,
    count: usize,
}

impl ClusterTracker {
    pub fn new(max_cluster: u16) -> Self {
        Self {
            owners: vec![0; max_cluster as usize + 1],
            count: 0,
        }
    }

    /// Record one more owner of `cluster`; returns false if it already had one.
    pub fn mark(&mut self, cluster: u16) -> bool {
        match self.owners.get_mut(cluster as usize) {
            Some(owners) => {
                *owners = owners.saturating_add(1);
                if *owners == 1 {
                    self.count += 1;
                }
                *owners == 1
            }
            None => false,
        }
    }

    pub fn owners(&self, cluster: u16) -> u16 {
        self.owners.get(cluster as usize).copied().unwrap_or(0)
    }

    pub fn is_visited(&self, cluster: u16) -> bool {
        self.owners(cluster) > 0
    }

    /// Claimed by more than one file or directory (a cross-link).
    pub fn is_shared(&self, cluster: u16) -> bool {
        self.owners(cluster) > 1
    }

    /// Number of distinct clusters owned.
    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = u16> + '_ {
        self.owners
            .iter()
            .enumerate()
            .filter(|(_, &owners)| owners > 0)
            .map(|(i, _)| i as u16)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mark_once() {
        let mut tracker = ClusterTracker::new(10);
        assert!(tracker.mark(3));
        assert!(!tracker.mark(3));
        assert!(tracker.is_visited(3));
        assert!(!tracker.is_visited(4));
        assert_eq!(tracker.len(), 1);
    }

    #[test]
    fn test_shared_clusters_counted() {
        let mut tracker = ClusterTracker::new(10);
        tracker.mark(4);
        assert!(!tracker.is_shared(4));
        tracker.mark(4);
        assert!(tracker.is_shared(4));
        assert_eq!(tracker.owners(4), 2);
        assert_eq!(tracker.owners(5), 0);
        assert_eq!(tracker.len(), 1);
    }

    #[test]
    fn test_out_of_range_is_ignored() {
        let mut tracker = ClusterTracker::new(10);
        assert!(!tracker.mark(11));
        assert!(!tracker.is_visited(11));
        assert!(tracker.is_empty());
    }

    #[test]
    fn test_iter_ascending() {
        let mut tracker = ClusterTracker::new(10);
        tracker.mark(7);
        tracker.mark(2);
        tracker.mark(10);
        assert_eq!(tracker.iter().collect::<Vec<_>>(), vec![2, 7, 10]);
    }
}
