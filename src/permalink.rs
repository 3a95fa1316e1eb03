use std::sync::LazyLock;

use regex::Regex;

use crate::timestamp::normalize_ts;
use crate::{AppError, Result};

#[allow(clippy::expect_used)]
static ARCHIVE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/archives/([^/]+)/p(\d{13,16})").expect("valid regex"));

#[allow(clippy::expect_used)]
static THREAD_TS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"thread_ts=([0-9.]+)").expect("valid regex"));

/// Location of a message parsed from a Slack permalink
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermalinkInfo {
    pub channel_id: String,
    pub message_ts: String,
    /// Empty when the link does not point into a thread
    pub thread_ts: String,
}

/// Parse a permalink such as
/// `https://x.slack.com/archives/C123/p1716192523567890?thread_ts=1716192500.123456`
pub fn parse_url(url: &str) -> Result<PermalinkInfo> {
    let caps = ARCHIVE_RE
        .captures(url)
        .ok_or_else(|| AppError::InvalidUrl(url.to_string()))?;

    let channel_id = caps
        .get(1)
        .map(|m| m.as_str().to_string())
        .ok_or_else(|| AppError::InvalidUrl(url.to_string()))?;
    let message_ts = caps
        .get(2)
        .map(|m| normalize_ts(m.as_str()))
        .ok_or_else(|| AppError::InvalidUrl(url.to_string()))?;

    Ok(PermalinkInfo {
        channel_id,
        message_ts,
        thread_ts: extract_thread_ts(url).unwrap_or_default(),
    })
}

/// The normalized `thread_ts` query parameter of a link, if present.
pub fn extract_thread_ts(url: &str) -> Option<String> {
    THREAD_TS_RE
        .captures(url)
        .and_then(|caps| caps.get(1))
        .map(|m| normalize_ts(m.as_str()))
}
