//! Collection pipelines: a single permalink, or one calendar day of search hits.

use chrono::NaiveDate;
use tracing::debug;

use crate::assemble::{expand_threads, group_by_thread};
use crate::fetch::{Fetcher, SearchOptions};
use crate::model::Thread;
use crate::permalink::parse_url;
use crate::{AppError, Result};

#[derive(Debug, Clone, Default)]
pub struct GetOptions {
    pub url: String,
    pub with_thread: bool,
}

/// Fetch the message (or its whole thread) a permalink points to.
///
/// The whole thread is returned when `with_thread` is set or when the link
/// itself carries a `thread_ts`.
pub async fn get(fetcher: &Fetcher, options: &GetOptions) -> Result<Thread> {
    let info = parse_url(&options.url)?;

    if options.with_thread || !info.thread_ts.is_empty() {
        let thread_ts = if info.thread_ts.is_empty() {
            &info.message_ts
        } else {
            &info.thread_ts
        };
        return get_thread(fetcher, &info.channel_id, thread_ts).await;
    }

    let messages = fetcher
        .thread_replies(&info.channel_id, &info.message_ts)
        .await?;
    let mut target = messages
        .iter()
        .find(|msg| msg.id == info.message_ts)
        .or_else(|| messages.first())
        .cloned()
        .ok_or(AppError::MessageNotFound)?;

    let channel = fetcher.channel_name(&info.channel_id).await.into_name();
    target.channel = channel.clone();
    target.channel_id = info.channel_id.clone();

    Ok(Thread {
        thread_id: target.thread_key().to_string(),
        thread_permalink: String::new(),
        channel,
        channel_id: info.channel_id,
        messages: vec![target],
        message_count: 1,
        thread_count: 0,
    })
}

/// A complete thread with its channel name and permalink.
pub async fn get_thread(fetcher: &Fetcher, channel_id: &str, thread_ts: &str) -> Result<Thread> {
    let channel = fetcher.channel_name(channel_id).await.into_name();
    let permalink = fetcher.permalink(channel_id, thread_ts).await;

    let mut messages = fetcher.thread_replies(channel_id, thread_ts).await?;
    for msg in &mut messages {
        msg.channel = channel.clone();
        msg.channel_id = channel_id.to_string();
    }

    Ok(Thread {
        thread_id: thread_ts.to_string(),
        thread_permalink: permalink,
        channel,
        channel_id: channel_id.to_string(),
        message_count: messages.len(),
        thread_count: 0,
        messages,
    })
}

/// Filters applied to every day of a `list` run
#[derive(Debug, Clone, Default)]
pub struct ListOptions {
    pub search: SearchOptions,
    pub with_thread: bool,
}

/// Outcome of collecting a single day
#[derive(Debug)]
pub struct DayResult {
    pub date: NaiveDate,
    pub outcome: Result<Vec<Thread>>,
}

impl DayResult {
    pub fn is_ok(&self) -> bool {
        self.outcome.is_ok()
    }
}

/// Search the day window around `day` and assemble the hits into threads.
pub async fn collect_day(fetcher: &Fetcher, options: &ListOptions, day: NaiveDate) -> Result<Vec<Thread>> {
    let search = options.search.clone().with_day_window(day);
    let mut messages = fetcher.search(&search).await?;
    debug!("{}: {} search hits", day, messages.len());

    if options.with_thread {
        messages = expand_threads(fetcher, messages).await;
    }

    Ok(group_by_thread(messages))
}
