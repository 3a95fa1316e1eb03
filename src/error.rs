use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("slack API token is required (set SLACK_API_TOKEN or use --token)")]
    MissingToken,

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("invalid date format: {0}")]
    InvalidDate(String),

    #[error("invalid date range: {0}")]
    InvalidDateRange(String),

    #[error("invalid Slack URL format: {0}")]
    InvalidUrl(String),

    #[error("Slack API error: {0}")]
    SlackApi(String),

    /// `retry_after_secs` is 0 when the server did not send a hint.
    #[error("Slack rate limit error: retry after {retry_after_secs}s")]
    SlackRateLimit { retry_after_secs: u64 },

    #[error("Slack {operation} still rate limited after {attempts} attempts")]
    FetchExhausted { operation: String, attempts: u32 },

    #[error("message not found")]
    MessageNotFound,

    #[error("{failed} of {total} day(s) failed")]
    PartialDayFailure { failed: usize, total: usize },

    #[error("failed to read file at {path}: {source}")]
    ReadFile {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to write file at {path}: {source}")]
    WriteFile {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("JSON serialization error: {0}")]
    JsonSerialize(String),

    #[error("JSON parse error: {0}")]
    JsonParse(String),

    #[error("TOML parse error: {0}")]
    TomlParse(String),

    #[error("invalid file pattern: {0}")]
    InvalidPattern(String),

    #[error("directory required: specify as argument or use --dir flag")]
    MissingDirectory,

    #[error("directory not found: {0}")]
    DirectoryNotFound(String),

    #[error("not a directory: {0}")]
    NotADirectory(String),

    #[error("no matching files found in {0}")]
    NoFilesFound(String),

    #[error("all {0} file(s) failed to read")]
    AllFilesFailed(usize),

    #[error("worker task failed: {0}")]
    Worker(String),
}

pub type Result<T> = std::result::Result<T, AppError>;
