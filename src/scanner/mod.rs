pub mod orchestrator;
pub mod pool;
pub mod state;

pub use orchestrator::Scanner;
pub use pool::{scan_many, ScanJob, ScanOutcome};
pub use state::ScanState;
