//! Slack Web API boundary.
//!
//! [`SlackApi`] issues exactly one HTTP request per call; pagination and
//! rate-limit retries live in [`crate::fetch`].

use async_trait::async_trait;
use reqwest::header::{HeaderMap, RETRY_AFTER};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::{AppError, Result};

pub const DEFAULT_API_BASE: &str = "https://slack.com/api";

const SEARCH_PAGE_SIZE: u32 = 100;
const REPLIES_PAGE_SIZE: u32 = 200;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChannelInfo {
    pub id: String,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Attachment {
    #[serde(default)]
    pub title_link: Option<String>,
}

/// One hit of `search.messages`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchMatch {
    pub ts: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub channel: ChannelInfo,
    #[serde(default)]
    pub permalink: Option<String>,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Paging {
    #[serde(default)]
    pub page: u32,
    #[serde(default)]
    pub pages: u32,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchPage {
    #[serde(default)]
    pub matches: Vec<SearchMatch>,
    #[serde(default)]
    pub paging: Paging,
}

/// One message of `conversations.replies`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReplyMessage {
    pub ts: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub thread_ts: Option<String>,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
}

#[derive(Debug, Clone, Default)]
pub struct RepliesPage {
    pub messages: Vec<ReplyMessage>,
    pub has_more: bool,
    pub next_cursor: Option<String>,
}

/// The Slack methods the collector consumes.
///
/// Implementations report rate limiting as [`AppError::SlackRateLimit`] and
/// every other failure as [`AppError::SlackApi`].
#[async_trait]
pub trait SlackApi: Send + Sync {
    async fn search_messages(&self, query: &str, page: u32) -> Result<SearchPage>;

    async fn conversation_replies(
        &self,
        channel_id: &str,
        thread_ts: &str,
        cursor: Option<&str>,
    ) -> Result<RepliesPage>;

    async fn conversation_info(&self, channel_id: &str) -> Result<ChannelInfo>;

    async fn permalink(&self, channel_id: &str, ts: &str) -> Result<String>;
}

/// The `ok`/`error` envelope every Web API response carries
#[derive(Debug, Deserialize)]
struct ApiStatus {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchBody {
    messages: SearchPage,
}

#[derive(Debug, Deserialize)]
struct ResponseMetadata {
    #[serde(default)]
    next_cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RepliesBody {
    #[serde(default)]
    messages: Vec<ReplyMessage>,
    #[serde(default)]
    has_more: bool,
    #[serde(default)]
    response_metadata: Option<ResponseMetadata>,
}

#[derive(Debug, Deserialize)]
struct InfoBody {
    channel: ChannelInfo,
}

#[derive(Debug, Deserialize)]
struct PermalinkBody {
    permalink: String,
}

/// [`SlackApi`] over the HTTP Web API with a bearer token.
#[derive(Clone)]
pub struct SlackWebClient {
    http: reqwest::Client,
    api_base: String,
    token: String,
}

impl SlackWebClient {
    pub fn new(token: &str) -> Result<Self> {
        Self::with_api_base(token, DEFAULT_API_BASE)
    }

    pub fn with_api_base(token: &str, api_base: &str) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("slack-collector/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| AppError::SlackApi(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http,
            api_base: api_base.trim_end_matches('/').to_string(),
            token: token.trim().to_string(),
        })
    }

    async fn call<T: DeserializeOwned>(&self, method: &str, params: &[(&str, &str)]) -> Result<T> {
        let url = Url::parse_with_params(&format!("{}/{}", self.api_base, method), params)
            .map_err(|e| AppError::SlackApi(format!("{}: invalid request URL: {}", method, e)))?;

        let response = self
            .http
            .get(url)
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| AppError::SlackApi(format!("{} request failed: {}", method, e)))?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(AppError::SlackRateLimit {
                retry_after_secs: parse_retry_after(response.headers()),
            });
        }
        if !status.is_success() {
            return Err(AppError::SlackApi(format!(
                "{} failed with status {}",
                method,
                status.as_u16()
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| AppError::SlackApi(format!("{} response unreadable: {}", method, e)))?;
        decode_response(method, &body)
    }
}

#[async_trait]
impl SlackApi for SlackWebClient {
    async fn search_messages(&self, query: &str, page: u32) -> Result<SearchPage> {
        let count = SEARCH_PAGE_SIZE.to_string();
        let page = page.to_string();
        let body: SearchBody = self
            .call(
                "search.messages",
                &[
                    ("query", query),
                    ("count", count.as_str()),
                    ("sort", "timestamp"),
                    ("page", page.as_str()),
                ],
            )
            .await?;
        Ok(body.messages)
    }

    async fn conversation_replies(
        &self,
        channel_id: &str,
        thread_ts: &str,
        cursor: Option<&str>,
    ) -> Result<RepliesPage> {
        let limit = REPLIES_PAGE_SIZE.to_string();
        let mut params = vec![
            ("channel", channel_id),
            ("ts", thread_ts),
            ("limit", limit.as_str()),
        ];
        if let Some(cursor) = cursor {
            params.push(("cursor", cursor));
        }

        let body: RepliesBody = self.call("conversations.replies", &params).await?;
        Ok(RepliesPage {
            messages: body.messages,
            has_more: body.has_more,
            next_cursor: body
                .response_metadata
                .and_then(|meta| meta.next_cursor)
                .filter(|cursor| !cursor.is_empty()),
        })
    }

    async fn conversation_info(&self, channel_id: &str) -> Result<ChannelInfo> {
        let body: InfoBody = self
            .call("conversations.info", &[("channel", channel_id)])
            .await?;
        Ok(body.channel)
    }

    async fn permalink(&self, channel_id: &str, ts: &str) -> Result<String> {
        let body: PermalinkBody = self
            .call(
                "chat.getPermalink",
                &[("channel", channel_id), ("message_ts", ts)],
            )
            .await?;
        Ok(body.permalink)
    }
}

/// Seconds from a `Retry-After` header, 0 when absent or unparsable.
fn parse_retry_after(headers: &HeaderMap) -> u64 {
    headers
        .get(RETRY_AFTER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse().ok())
        .unwrap_or(0)
}

fn decode_response<T: DeserializeOwned>(method: &str, body: &str) -> Result<T> {
    let status: ApiStatus = serde_json::from_str(body)
        .map_err(|e| AppError::SlackApi(format!("failed to decode {}: {}", method, e)))?;

    if !status.ok {
        let error = status.error.unwrap_or_else(|| "unknown error".to_string());
        if error == "ratelimited" {
            return Err(AppError::SlackRateLimit {
                retry_after_secs: 0,
            });
        }
        return Err(AppError::SlackApi(format!("{} failed: {}", method, error)));
    }

    serde_json::from_str(body)
        .map_err(|e| AppError::SlackApi(format!("failed to decode {} body: {}", method, e)))
}
