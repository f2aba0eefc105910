use clap::{Args, Parser, Subcommand};

const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("GIT_HASH"),
    ", built ",
    env!("BUILD_TIMESTAMP"),
    ")"
);

#[derive(Parser)]
#[command(
    name = "pentoscan",
    version,
    long_version = LONG_VERSION,
    about = "Template-driven web vulnerability scanner"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase log verbosity (repeat for more)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run templates against one or more targets
    Scan(ScanArgs),
    /// List the templates in a directory
    List(ListArgs),
    /// Validate a template (or configuration) file
    Validate(ValidateArgs),
}

#[derive(Args, Clone)]
pub struct ScanArgs {
    /// Target base URL (repeat for several targets)
    #[arg(short, long, required = true)]
    pub target: Vec<String>,

    /// Template file, or a directory of templates
    #[arg(long)]
    pub template: String,

    /// Output directory for result files
    #[arg(short, long)]
    pub output: Option<String>,

    /// Per-request timeout in seconds
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Maximum number of scans in flight
    #[arg(long)]
    pub concurrency: Option<usize>,

    /// Do not run exploit handlers for vulnerable results
    #[arg(long)]
    pub no_exploit: bool,

    /// YAML configuration file (defaults to ./pentoscan.yaml if present)
    #[arg(short, long)]
    pub config: Option<String>,
}

#[derive(Args, Clone)]
pub struct ListArgs {
    /// Template directory
    #[arg(long)]
    pub dir: Option<String>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// YAML configuration file
    #[arg(short, long)]
    pub config: Option<String>,
}

#[derive(Args, Clone)]
pub struct ValidateArgs {
    /// File to validate
    pub file: String,

    /// Treat the file as a configuration file instead of a template
    #[arg(long)]
    pub config: bool,
}
