//! Offline consolidation of previously collected thread files.

use std::cmp::Ordering;
use std::collections::HashMap;

use crate::model::{Message, Thread};

/// Merged threads plus informational counts
#[derive(Debug, Clone, Default)]
pub struct MergeResult {
    pub threads: Vec<Thread>,
    pub original_thread_count: usize,
    pub merged_thread_count: usize,
    pub original_message_count: usize,
    pub merged_message_count: usize,
    pub duplicate_threads: usize,
    pub duplicate_messages: usize,
}

/// Merge threads sharing a `thread_id`, then messages sharing an `id`.
///
/// The first-seen thread keeps its metadata. For repeated message ids the
/// copy with the latest timestamp survives.
pub fn merge(threads: Vec<Thread>) -> MergeResult {
    let original_thread_count = threads.len();
    let original_message_count = threads.iter().map(|t| t.messages.len()).sum();

    let mut merged = merge_threads(threads);
    for thread in &mut merged {
        thread.messages = dedupe_keep_latest(std::mem::take(&mut thread.messages));
        thread.message_count = thread.messages.len();
    }

    merged.sort_by(|a, b| match (a.first_timestamp(), b.first_timestamp()) {
        (None, None) => a.thread_id.cmp(&b.thread_id),
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(x), Some(y)) => x.cmp(&y).then_with(|| a.thread_id.cmp(&b.thread_id)),
    });

    let merged_thread_count = merged.len();
    let merged_message_count = merged.iter().map(|t| t.messages.len()).sum();

    MergeResult {
        threads: merged,
        original_thread_count,
        merged_thread_count,
        original_message_count,
        merged_message_count,
        duplicate_threads: original_thread_count - merged_thread_count,
        duplicate_messages: original_message_count - merged_message_count,
    }
}

fn merge_threads(threads: Vec<Thread>) -> Vec<Thread> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut merged: Vec<Thread> = Vec::new();

    for thread in threads {
        match index.get(&thread.thread_id).and_then(|&i| merged.get_mut(i)) {
            Some(existing) => {
                existing.messages.extend(thread.messages);
                existing.thread_count = existing.thread_count.max(thread.thread_count);
            }
            None => {
                index.insert(thread.thread_id.clone(), merged.len());
                merged.push(thread);
            }
        }
    }

    merged
}

fn dedupe_keep_latest(messages: Vec<Message>) -> Vec<Message> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut kept: Vec<Message> = Vec::new();

    for msg in messages {
        match index.get(&msg.id).and_then(|&i| kept.get_mut(i)) {
            Some(existing) => {
                if msg.timestamp > existing.timestamp {
                    *existing = msg;
                }
            }
            None => {
                index.insert(msg.id.clone(), kept.len());
                kept.push(msg);
            }
        }
    }

    kept.sort_by(|a, b| a.timestamp.cmp(&b.timestamp).then_with(|| a.id.cmp(&b.id)));
    kept
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SLACK_MESSAGE_TYPE;
    use crate::timestamp::ts_to_datetime;

    fn msg(id: &str, ts: &str, content: &str) -> Message {
        Message {
            id: id.to_string(),
            kind: SLACK_MESSAGE_TYPE.to_string(),
            content: content.to_string(),
            author: "U1".to_string(),
            timestamp: ts_to_datetime(ts),
            channel: "general".to_string(),
            channel_id: "C1".to_string(),
            permalink: String::new(),
            mentions: Vec::new(),
            attached_links: Vec::new(),
            thread_ts: String::new(),
            is_thread_parent: false,
        }
    }

    fn thread(id: &str, messages: Vec<Message>) -> Thread {
        Thread {
            thread_id: id.to_string(),
            thread_permalink: String::new(),
            channel: "general".to_string(),
            channel_id: "C1".to_string(),
            thread_count: messages.len(),
            message_count: messages.len(),
            messages,
        }
    }

    fn sorted(mut threads: Vec<Thread>) -> Vec<Thread> {
        threads.sort_by(|a, b| a.thread_id.cmp(&b.thread_id));
        threads
    }

    #[test]
    fn test_merge_combines_threads_and_messages() {
        let a = thread("100", vec![msg("100", "100", "root"), msg("110", "110", "reply")]);
        let b = thread("100", vec![msg("110", "110", "reply"), msg("120", "120", "late")]);
        let c = thread("200", vec![msg("200", "200", "other")]);

        let result = merge(vec![a, b, c]);

        assert_eq!(result.original_thread_count, 3);
        assert_eq!(result.merged_thread_count, 2);
        assert_eq!(result.duplicate_threads, 1);
        assert_eq!(result.original_message_count, 5);
        assert_eq!(result.merged_message_count, 4);
        assert_eq!(result.duplicate_messages, 1);

        let first = &result.threads[0];
        assert_eq!(first.thread_id, "100");
        assert_eq!(first.message_count, 3);
        let ids: Vec<&str> = first.messages.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["100", "110", "120"]);
    }

    #[test]
    fn test_merge_keeps_latest_timestamp_regardless_of_order() {
        let old = thread("100", vec![msg("100", "100", "original")]);
        let new = thread("100", vec![msg("100", "150", "edited")]);

        let forward = merge(vec![old.clone(), new.clone()]);
        let backward = merge(vec![new, old]);

        assert_eq!(forward.threads[0].messages.len(), 1);
        assert_eq!(forward.threads[0].messages[0].content, "edited");
        assert_eq!(backward.threads[0].messages[0].content, "edited");
    }

    #[test]
    fn test_merge_first_seen_metadata_wins() {
        let mut first = thread("100", vec![msg("100", "100", "root")]);
        first.thread_permalink = "https://x.slack.com/first".to_string();
        first.thread_count = 1;
        let mut second = thread("100", vec![msg("110", "110", "reply")]);
        second.thread_permalink = "https://x.slack.com/second".to_string();
        second.channel = "renamed".to_string();
        second.thread_count = 4;

        let result = merge(vec![first, second]);

        let merged = &result.threads[0];
        assert_eq!(merged.thread_permalink, "https://x.slack.com/first");
        assert_eq!(merged.channel, "general");
        assert_eq!(merged.thread_count, 4);
        assert_eq!(merged.message_count, 2);
    }

    #[test]
    fn test_merge_empty_threads_sort_first() {
        let result = merge(vec![
            thread("300", vec![msg("300", "300", "late")]),
            thread("999", Vec::new()),
            thread("100", vec![msg("100", "100", "early")]),
        ]);

        let order: Vec<&str> = result.threads.iter().map(|t| t.thread_id.as_str()).collect();
        assert_eq!(order, vec!["999", "100", "300"]);
    }

    #[test]
    fn test_merge_is_order_insensitive() {
        let a = thread("100", vec![msg("100", "100", "root"), msg("110", "110", "v1")]);
        let b = thread("100", vec![msg("110", "115", "v2"), msg("120", "120", "more")]);
        let c = thread("200", vec![msg("200", "200", "other")]);

        let ab_then_c = {
            let ab = merge(vec![a.clone(), b.clone()]).threads;
            merge(ab.into_iter().chain([c.clone()]).collect()).threads
        };
        let cab = merge(vec![c.clone(), a.clone(), b.clone()]).threads;
        let pairwise = {
            let ab = merge(vec![a, b]).threads;
            let abc = merge(ab.into_iter().chain([c]).collect()).threads;
            merge(abc).threads
        };

        assert_eq!(sorted(ab_then_c.clone()), sorted(cab));
        assert_eq!(sorted(ab_then_c), sorted(pairwise));
    }

    #[test]
    fn test_merge_empty_input() {
        let result = merge(Vec::new());
        assert!(result.threads.is_empty());
        assert_eq!(result.duplicate_threads, 0);
        assert_eq!(result.duplicate_messages, 0);
    }
}
