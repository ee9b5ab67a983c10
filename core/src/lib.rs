pub mod error;
pub mod options;
pub mod report;

pub use error::ScanDiskError;
pub use options::{CheckOptions, ClusterCountPolicy};
pub use report::{CheckReport, LostChain, SizeCorrection, WalkSummary};
