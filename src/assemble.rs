//! Grouping flat message lists into threads.

use std::collections::{HashMap, HashSet};

use tracing::warn;

use crate::fetch::Fetcher;
use crate::model::{Message, Thread};

/// Drop repeated ids, keeping the first occurrence.
pub fn dedupe_messages(messages: Vec<Message>) -> Vec<Message> {
    let mut seen = HashSet::new();
    messages
        .into_iter()
        .filter(|msg| seen.insert(msg.id.clone()))
        .collect()
}

/// Group messages by thread, oldest message first in each thread and
/// threads ordered by their first message. Empty threads sort last.
pub fn group_by_thread(messages: Vec<Message>) -> Vec<Thread> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut threads: Vec<Thread> = Vec::new();

    for msg in messages {
        let key = msg.thread_key().to_string();
        match index.get(&key) {
            Some(&i) => {
                if let Some(thread) = threads.get_mut(i) {
                    thread.messages.push(msg);
                    thread.thread_count = thread.messages.len();
                }
            }
            None => {
                index.insert(key.clone(), threads.len());
                threads.push(Thread {
                    thread_id: key,
                    thread_permalink: String::new(),
                    channel: msg.channel.clone(),
                    channel_id: msg.channel_id.clone(),
                    messages: vec![msg],
                    message_count: 0,
                    thread_count: 1,
                });
            }
        }
    }

    for thread in &mut threads {
        thread.messages.sort_by_key(|m| m.timestamp);
    }
    threads.sort_by(|a, b| match (a.first_timestamp(), b.first_timestamp()) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => std::cmp::Ordering::Equal,
    });

    threads
}

/// Replace each stub by the full reply set of its thread.
///
/// Each thread is fetched once. A thread whose fetch fails keeps only its
/// stub. The result is deduplicated by id.
pub async fn expand_threads(fetcher: &Fetcher, messages: Vec<Message>) -> Vec<Message> {
    let mut expanded_threads = HashSet::new();
    let mut expanded = Vec::new();

    for msg in messages {
        let thread_ts = msg.thread_key().to_string();
        if expanded_threads.contains(&thread_ts) {
            continue;
        }

        match fetcher.thread_replies(&msg.channel_id, &thread_ts).await {
            Ok(replies) => {
                expanded.extend(replies.into_iter().map(|mut reply| {
                    if reply.channel.is_empty() {
                        reply.channel = msg.channel.clone();
                    }
                    if reply.channel_id.is_empty() {
                        reply.channel_id = msg.channel_id.clone();
                    }
                    reply
                }));
                expanded_threads.insert(thread_ts);
            }
            Err(e) => {
                warn!("failed to get thread {}: {}", thread_ts, e);
                expanded.push(msg);
            }
        }
    }

    dedupe_messages(expanded)
}
