pub mod executor;
pub mod join;

pub use executor::{HttpSettings, RequestExecutor, ResponseView, DEFAULT_TIMEOUT_SECS};
pub use join::{join_url, parse_target};
