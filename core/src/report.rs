use serde::{Deserialize, Serialize};

/// An allocated chain no directory entry referred to, now materialised in the
/// root directory as `FOUND<n>.DAT`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LostChain {
    pub name: String,
    pub extension: String,
    pub start_cluster: u16,
    pub clusters: Vec<u16>,
    pub size: u32,
}

impl LostChain {
    pub fn display_name(&self) -> String {
        format!("{}.{}", self.name, self.extension)
    }

    pub fn length(&self) -> usize {
        self.clusters.len()
    }
}

/// A file whose chain was longer than its declared size allowed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SizeCorrection {
    pub name: String,
    pub extension: String,
    pub start_cluster: u16,
    pub declared_size: u32,
    /// Bytes covered by the chain before truncation.
    pub previous_extent: u64,
    pub kept_clusters: u32,
    pub freed_clusters: Vec<u16>,
}

impl SizeCorrection {
    pub fn display_name(&self) -> String {
        format!("{}.{}", self.name, self.extension)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalkSummary {
    pub files: usize,
    pub directories: usize,
    pub owned_clusters: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CheckReport {
    pub cluster_size: u32,
    /// Non-free, non-bad FAT entries before anything was changed.
    pub allocated_before: usize,
    pub summary: WalkSummary,
    pub lost_chains: Vec<LostChain>,
    pub size_corrections: Vec<SizeCorrection>,
    pub dry_run: bool,
}

impl CheckReport {
    /// Nothing was lost and nothing needed truncating.
    pub fn is_clean(&self) -> bool {
        self.lost_chains.is_empty() && self.size_corrections.is_empty()
    }

    pub fn lost_cluster_count(&self) -> usize {
        self.lost_chains.iter().map(LostChain::length).sum()
    }

    pub fn to_json(&self) -> Result<String, crate::ScanDiskError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
