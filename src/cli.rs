use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "slack-collector")]
#[command(about = "Collect Slack messages into thread-grouped JSON archives")]
pub struct Cli {
    /// Settings file (defaults to ./settings.toml when present)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Slack API token, overrides SLACK_API_TOKEN
    #[arg(long, global = true)]
    pub token: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Get a message or thread from a Slack URL
    Get {
        /// Message permalink
        url: String,

        /// Get the entire thread
        #[arg(long)]
        thread: bool,
    },

    /// Collect messages for a date range and save one file per day
    List(ListArgs),

    /// Merge collected JSON files and deduplicate threads and messages
    Merge {
        /// Target directory
        directory: Option<PathBuf>,

        /// Target directory, used when no positional directory is given
        #[arg(short, long)]
        dir: Option<PathBuf>,

        /// File name glob pattern
        #[arg(short, long, default_value = "*.json")]
        pattern: String,

        /// Search subdirectories recursively
        #[arg(short, long)]
        recursive: bool,
    },

    /// Print version information
    Version,
}

#[derive(Args, Debug, Default)]
#[command(group = clap::ArgGroup::new("range").required(true).args(["day", "month", "from"]))]
pub struct ListArgs {
    /// Day to collect (YYYY-MM-DD)
    #[arg(short, long)]
    pub day: Option<String>,

    /// Month to collect (YYYY-MM)
    #[arg(short, long)]
    pub month: Option<String>,

    /// Start date (YYYY-MM-DD)
    #[arg(long, requires = "to")]
    pub from: Option<String>,

    /// End date (YYYY-MM-DD)
    #[arg(long, requires = "from")]
    pub to: Option<String>,

    /// Get entire threads
    #[arg(long)]
    pub thread: bool,

    /// Filter by author
    #[arg(long)]
    pub author: Option<String>,

    /// Filter by mention (user IDs or @group-names)
    #[arg(long, value_delimiter = ',')]
    pub mention: Vec<String>,

    /// Filter by channel name
    #[arg(long, value_delimiter = ',')]
    pub channel: Vec<String>,

    /// Exclude channel name
    #[arg(long, value_delimiter = ',')]
    pub exclude_channel: Vec<String>,

    /// Number of parallel workers
    #[arg(short, long)]
    pub parallel: Option<usize>,

    /// Output directory
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,
}
