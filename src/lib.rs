pub mod cli;
pub mod config;
pub mod errors;
pub mod exploits;
pub mod http;
pub mod matchers;
pub mod models;
pub mod reporting;
pub mod scanner;
pub mod scripting;
pub mod templates;
pub mod utils;
