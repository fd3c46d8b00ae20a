// aigcheck Core Services
// Migrated from the Python prototype

pub mod config_store;
pub mod detection;
pub mod extract;
pub mod oracle;
pub mod segmenter;

pub use config_store::*;
pub use extract::*;
pub use oracle::*;
pub use segmenter::*;

// Re-export detection module functions
pub use detection::{reconcile, run_detection, summarize, DetectError, ReconcileOutcome};
