//! Mention and link extraction from raw message text.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

#[allow(clippy::expect_used)]
static MENTION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<@([^|>]+)\|([^>]+)>").expect("valid regex"));

#[allow(clippy::expect_used)]
static LINK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"https?://[^\s>]+").expect("valid regex"));

/// Display names of every `<@id|name>` mention, first-seen order, no repeats.
pub fn extract_mentions(text: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    MENTION_RE
        .captures_iter(text)
        .filter_map(|caps| caps.get(2))
        .map(|m| m.as_str().to_string())
        .filter(|name| seen.insert(name.clone()))
        .collect()
}

/// Bare links in the body followed by attachment title links not already seen.
pub fn extract_links<'a, I>(text: &'a str, attachment_links: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut seen = HashSet::new();
    LINK_RE
        .find_iter(text)
        .map(|m| m.as_str())
        .chain(
            attachment_links
                .into_iter()
                .filter(|link| !link.is_empty()),
        )
        .filter(|link| seen.insert(link.to_string()))
        .map(str::to_string)
        .collect()
}
