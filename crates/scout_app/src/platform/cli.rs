use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use scout_core::Platform;

use super::logging::LogDestination;

#[derive(Debug, Parser)]
#[command(name = "listing-scout")]
#[command(about = "Collects product listings from Taobao and JD result pages", long_about = None)]
pub struct Cli {
    /// Directory holding the job store and exported CSV files
    #[arg(long, default_value = "scout_data", global = true)]
    pub data_dir: PathBuf,

    /// RON configuration file (defaults to ./scout.ron when present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Where log output goes
    #[arg(long, value_enum, default_value_t = LogDestination::Terminal, global = true)]
    pub log: LogDestination,

    /// Log at debug level
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Start a new job, discarding any previous one
    Start(StartArgs),
    /// Continue a job that was handed off to a later page
    Resume {
        /// URL of the result page the job stopped on
        #[arg(long)]
        url: String,
    },
    /// Write the accumulated items of the stored job to CSV
    Export {
        /// Platform whose items to export (defaults to the stored job's)
        #[arg(long, value_enum)]
        platform: Option<PlatformArg>,
    },
    /// Write the built-in configuration as a RON file
    InitConfig {
        /// Destination file
        #[arg(default_value = "scout.ron")]
        path: PathBuf,
    },
}

#[derive(Debug, Args)]
pub struct StartArgs {
    #[arg(long, value_enum)]
    pub platform: PlatformArg,

    #[command(flatten)]
    pub target: StartTarget,

    /// Number of result pages to visit
    #[arg(long, default_value_t = 1)]
    pub pages: u32,

    /// Lower bound of the wait between pages, in seconds
    #[arg(long, default_value_t = 3)]
    pub min_delay: u32,

    /// Upper bound of the wait between pages, in seconds
    #[arg(long, default_value_t = 5)]
    pub max_delay: u32,
}

#[derive(Debug, Args)]
#[group(required = true, multiple = false)]
pub struct StartTarget {
    /// Search keyword; the platform's search URL is built from it
    #[arg(long)]
    pub keyword: Option<String>,

    /// Result page URL to start from
    #[arg(long)]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PlatformArg {
    Taobao,
    Jd,
}

impl From<PlatformArg> for Platform {
    fn from(value: PlatformArg) -> Self {
        match value {
            PlatformArg::Taobao => Platform::Taobao,
            PlatformArg::Jd => Platform::Jd,
        }
    }
}
