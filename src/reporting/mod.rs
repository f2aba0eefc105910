pub mod formatter;
pub mod writer;

pub use formatter::{format_exploit_summary, format_scan_summary};
pub use writer::{ResultRecord, ResultWriter};
