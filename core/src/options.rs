use serde::{Deserialize, Serialize};

/// How many clusters a file of a given size is expected to occupy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClusterCountPolicy {
    /// `size / cluster_size + 1`, even when the size is an exact multiple.
    /// Files carrying exactly one surplus cluster are therefore left alone.
    Historical,
    /// `ceil(size / cluster_size)`, at least one cluster for an allocated file.
    Exact,
}

impl ClusterCountPolicy {
    /// Expected chain length for a file with a starting cluster assigned.
    pub fn expected_clusters(&self, size: u32, cluster_size: u32) -> u32 {
        match self {
            ClusterCountPolicy::Historical => size / cluster_size + 1,
            ClusterCountPolicy::Exact => size.div_ceil(cluster_size).max(1),
        }
    }
}

impl Default for ClusterCountPolicy {
    fn default() -> Self {
        ClusterCountPolicy::Historical
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckOptions {
    /// Work on a private in-memory copy; the image file is never written.
    pub dry_run: bool,
    pub cluster_policy: ClusterCountPolicy,
}

impl Default for CheckOptions {
    fn default() -> Self {
        Self {
            dry_run: false,
            cluster_policy: ClusterCountPolicy::Historical,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_historical_policy_overcounts_exact_multiples() {
        let policy = ClusterCountPolicy::Historical;
        assert_eq!(policy.expected_clusters(0, 512), 1);
        assert_eq!(policy.expected_clusters(1, 512), 1);
        assert_eq!(policy.expected_clusters(513, 512), 2);
        // Exact multiple: one more than strictly needed
        assert_eq!(policy.expected_clusters(1024, 512), 3);
    }

    #[test]
    fn test_exact_policy() {
        let policy = ClusterCountPolicy::Exact;
        assert_eq!(policy.expected_clusters(0, 512), 1);
        assert_eq!(policy.expected_clusters(1, 512), 1);
        assert_eq!(policy.expected_clusters(512, 512), 1);
        assert_eq!(policy.expected_clusters(1024, 512), 2);
        assert_eq!(policy.expected_clusters(1025, 512), 3);
    }
}
