pub mod assemble;
pub mod cli;
pub mod collector;
pub mod commands;
pub mod daterange;
pub mod error;
pub mod fetch;
pub mod merge;
pub mod model;
pub mod orchestrator;
pub mod output;
pub mod permalink;
pub mod reader;
pub mod scanner;
pub mod settings;
pub mod slack;
pub mod timestamp;
pub mod version;

pub use error::{AppError, Result};
pub use model::{Message, Thread};
pub use version::BuildInfo;

use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

/// Log to stderr at `info` unless `RUST_LOG` says otherwise.
pub fn init_tracing() {
    let env_filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy();

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();
}
