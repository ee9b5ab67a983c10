use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScanDiskError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Invalid boot sector: {0}")]
    InvalidBootSector(String),

    #[error("Image too small: geometry needs {required} bytes, image has {actual}")]
    ImageTooSmall { required: u64, actual: u64 },

    #[error("Cluster {cluster} out of range (valid clusters are 2..={max_cluster})")]
    ClusterOutOfRange { cluster: u16, max_cluster: u16 },

    #[error("Invalid chain link: cluster {cluster} points to {value:#05x}")]
    InvalidChainLink { cluster: u16, value: u16 },

    #[error("Circular cluster chain starting at {start}: cluster {cluster} revisited")]
    ChainCycle { start: u16, cluster: u16 },

    #[error("Directory cycle detected at cluster {cluster}")]
    DirectoryCycle { cluster: u16 },

    #[error("Root directory full: {capacity} free entries, {needed} needed")]
    RootDirectoryFull { capacity: usize, needed: usize },

    #[error("Invalid 8.3 name: {0}")]
    InvalidName(String),

    #[error("Lost file names exhausted: FOUND1 to FOUND{limit} are all taken")]
    FoundNamesExhausted { limit: u32 },
}

impl ScanDiskError {
    /// True for the structural-corruption class: the image could not be
    /// repaired because its FAT or directory structure cannot be trusted.
    pub fn is_corruption(&self) -> bool {
        matches!(
            self,
            ScanDiskError::ClusterOutOfRange { .. }
                | ScanDiskError::InvalidChainLink { .. }
                | ScanDiskError::ChainCycle { .. }
                | ScanDiskError::DirectoryCycle { .. }
                | ScanDiskError::RootDirectoryFull { .. }
                | ScanDiskError::FoundNamesExhausted { .. }
        )
    }
}
