//! Paginated fetching on top of [`SlackApi`] with rate-limit retries.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{Days, NaiveDate};
use tracing::{debug, warn};

use crate::assemble::dedupe_messages;
use crate::model::{Message, SLACK_MESSAGE_TYPE};
use crate::permalink::extract_thread_ts;
use crate::scanner::{extract_links, extract_mentions};
use crate::slack::{Attachment, ReplyMessage, SearchMatch, SlackApi};
use crate::timestamp::ts_to_datetime;
use crate::{AppError, Result};

/// Pause between two successful page requests.
pub const PAGE_DELAY: Duration = Duration::from_secs(1);

/// Something that can wait. Production code sleeps on the tokio timer.
#[async_trait]
pub trait Delay: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TokioDelay;

#[async_trait]
impl Delay for TokioDelay {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { max_attempts: 5 }
    }
}

impl RetryPolicy {
    /// Wait before retrying after the rate-limited `attempt` (counted from 0).
    ///
    /// A server hint wins; otherwise the wait doubles each attempt from 1s.
    pub fn backoff(&self, attempt: u32, retry_after_secs: u64) -> Duration {
        if retry_after_secs > 0 {
            return Duration::from_secs(retry_after_secs);
        }
        Duration::from_secs(1_u64 << attempt.min(16))
    }
}

/// Filters of a `search.messages` query
#[derive(Debug, Clone, Default)]
pub struct SearchOptions {
    pub author: Option<String>,
    pub mentions: Vec<String>,
    pub channels: Vec<String>,
    pub exclude_channels: Vec<String>,
    pub after: Option<NaiveDate>,
    pub before: Option<NaiveDate>,
}

impl SearchOptions {
    /// Window of `[day - 1, day + 1]`, exclusive on both ends, around `day`.
    pub fn with_day_window(mut self, day: NaiveDate) -> Self {
        self.after = day.checked_sub_days(Days::new(1));
        self.before = day.checked_add_days(Days::new(1));
        self
    }

    pub fn query(&self) -> String {
        let mut parts = Vec::new();

        if let Some(author) = self.author.as_deref().filter(|a| !a.is_empty()) {
            parts.push(format!("from:{}", author));
        }

        for mention in &self.mentions {
            if mention.starts_with('@') || mention.starts_with('U') {
                parts.push(format!("to:{}", mention));
            } else {
                parts.push(format!("@{}", mention));
            }
        }

        for channel in &self.channels {
            parts.push(format!("in:{}", channel.trim_start_matches('#')));
        }
        for channel in &self.exclude_channels {
            parts.push(format!("-in:{}", channel.trim_start_matches('#')));
        }

        if let Some(after) = self.after {
            parts.push(format!("after:{}", after.format("%Y-%m-%d")));
        }
        if let Some(before) = self.before {
            parts.push(format!("before:{}", before.format("%Y-%m-%d")));
        }

        parts.push("-is:dm".to_string());
        parts.push("-is:mpdm".to_string());

        parts.join(" ")
    }
}

/// Result of resolving a channel id to its display name
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelName {
    Resolved(String),
    /// Lookup failed; carries the channel id
    Fallback(String),
}

impl ChannelName {
    pub fn into_name(self) -> String {
        match self {
            ChannelName::Resolved(name) | ChannelName::Fallback(name) => name,
        }
    }
}

/// Shared, read-only handle used by every collection worker.
#[derive(Clone)]
pub struct Fetcher {
    api: Arc<dyn SlackApi>,
    delay: Arc<dyn Delay>,
    policy: RetryPolicy,
    page_delay: Duration,
}

impl Fetcher {
    pub fn new(api: Arc<dyn SlackApi>) -> Self {
        Self::with_delay(api, Arc::new(TokioDelay))
    }

    pub fn with_delay(api: Arc<dyn SlackApi>, delay: Arc<dyn Delay>) -> Self {
        Self {
            api,
            delay,
            policy: RetryPolicy::default(),
            page_delay: PAGE_DELAY,
        }
    }

    /// Run one page request, retrying while the API reports rate limiting.
    async fn with_retry<T, F, Fut>(&self, operation: &str, mut request: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let attempts = self.policy.max_attempts.max(1);
        for attempt in 0..attempts {
            match request().await {
                Ok(value) => return Ok(value),
                Err(AppError::SlackRateLimit { retry_after_secs }) => {
                    if attempt + 1 == attempts {
                        break;
                    }
                    let wait = self.policy.backoff(attempt, retry_after_secs);
                    warn!(
                        "{} rate limited, retrying in {}s (attempt {}/{})",
                        operation,
                        wait.as_secs(),
                        attempt + 1,
                        attempts
                    );
                    self.delay.sleep(wait).await;
                }
                Err(e) => return Err(e),
            }
        }

        Err(AppError::FetchExhausted {
            operation: operation.to_string(),
            attempts,
        })
    }

    /// All search hits for the given filters, in API order, without
    /// repeated ids when pages overlap.
    pub async fn search(&self, options: &SearchOptions) -> Result<Vec<Message>> {
        let query = options.query();
        debug!("search query: {}", query);

        let mut messages = Vec::new();
        let mut page = 1;

        loop {
            let result = self
                .with_retry("search.messages", || self.api.search_messages(&query, page))
                .await?;

            if result.matches.is_empty() {
                break;
            }
            messages.extend(result.matches.iter().map(convert_search_match));

            if result.paging.pages <= result.paging.page {
                break;
            }
            page = result.paging.page + 1;

            self.delay.sleep(self.page_delay).await;
        }

        Ok(dedupe_messages(messages))
    }

    /// Every message of a thread, root first, following reply cursors.
    pub async fn thread_replies(&self, channel_id: &str, thread_ts: &str) -> Result<Vec<Message>> {
        let mut messages = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            let result = self
                .with_retry("conversations.replies", || {
                    self.api
                        .conversation_replies(channel_id, thread_ts, cursor.as_deref())
                })
                .await?;

            messages.extend(
                result
                    .messages
                    .iter()
                    .map(|reply| convert_reply(reply, channel_id)),
            );

            match result.next_cursor {
                Some(next) if result.has_more => cursor = Some(next),
                _ => break,
            }

            self.delay.sleep(self.page_delay).await;
        }

        Ok(messages)
    }

    pub async fn channel_name(&self, channel_id: &str) -> ChannelName {
        match self.api.conversation_info(channel_id).await {
            Ok(info) if !info.name.is_empty() => ChannelName::Resolved(info.name),
            Ok(_) => ChannelName::Fallback(channel_id.to_string()),
            Err(e) => {
                warn!("could not get channel info for {}: {}", channel_id, e);
                ChannelName::Fallback(channel_id.to_string())
            }
        }
    }

    /// Permalink of a message, empty when Slack refuses to produce one.
    pub async fn permalink(&self, channel_id: &str, ts: &str) -> String {
        self.api.permalink(channel_id, ts).await.unwrap_or_default()
    }
}

fn attachment_links(attachments: &[Attachment]) -> impl Iterator<Item = &str> {
    attachments
        .iter()
        .filter_map(|att| att.title_link.as_deref())
}

fn convert_search_match(hit: &SearchMatch) -> Message {
    let permalink = hit.permalink.clone().unwrap_or_default();
    let thread_ts = extract_thread_ts(&permalink).unwrap_or_else(|| hit.ts.clone());

    Message {
        id: hit.ts.clone(),
        kind: SLACK_MESSAGE_TYPE.to_string(),
        content: hit.text.clone(),
        author: hit.user.clone().unwrap_or_default(),
        timestamp: ts_to_datetime(&hit.ts),
        channel: hit.channel.name.clone(),
        channel_id: hit.channel.id.clone(),
        mentions: extract_mentions(&hit.text),
        attached_links: extract_links(&hit.text, attachment_links(&hit.attachments)),
        is_thread_parent: thread_ts == hit.ts,
        thread_ts,
        permalink,
    }
}

/// Replies carry no channel name; callers fill it in.
fn convert_reply(reply: &ReplyMessage, channel_id: &str) -> Message {
    let thread_ts = reply
        .thread_ts
        .clone()
        .filter(|ts| !ts.is_empty())
        .unwrap_or_else(|| reply.ts.clone());

    Message {
        id: reply.ts.clone(),
        kind: SLACK_MESSAGE_TYPE.to_string(),
        content: reply.text.clone(),
        author: reply.user.clone().unwrap_or_default(),
        timestamp: ts_to_datetime(&reply.ts),
        channel: String::new(),
        channel_id: channel_id.to_string(),
        permalink: String::new(),
        mentions: extract_mentions(&reply.text),
        attached_links: extract_links(&reply.text, attachment_links(&reply.attachments)),
        is_thread_parent: thread_ts == reply.ts,
        thread_ts,
    }
}
