//! Discussion threads for Hacker News items.

use std::sync::LazyLock;

use async_trait::async_trait;
use curator_core::FeedItem;
use regex::Regex;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::plugin::{Plugin, PluginError};

const TOP_LEVEL_LIMIT: usize = 10;
const REPLY_LIMIT: usize = 2;
const MAX_DEPTH: u32 = 2;

static ITEM_ID: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"id=(\d+)").expect("valid regex"));

/// One comment, flattened out of the thread.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Comment {
    pub author: String,
    pub text: String,
    pub points: i64,
    pub depth: u32,
}

#[derive(Debug, Default, Deserialize)]
struct ApiItem {
    #[serde(default)]
    children: Vec<ApiComment>,
}

#[derive(Debug, Default, Deserialize)]
struct ApiComment {
    author: Option<String>,
    text: Option<String>,
    points: Option<i64>,
    #[serde(default)]
    children: Vec<ApiComment>,
}

pub struct HnFetchComments {
    client: Client,
    api_base: String,
}

impl HnFetchComments {
    pub fn new(client: Client, api_base: impl Into<String>) -> Self {
        Self {
            client,
            api_base: api_base.into().trim_end_matches('/').to_string(),
        }
    }

    async fn fetch_thread(&self, item_id: &str) -> Result<Vec<Comment>, PluginError> {
        let url = format!("{}/items/{item_id}", self.api_base);
        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(PluginError::Status(status.as_u16()));
        }

        let item: ApiItem = response
            .json()
            .await
            .map_err(|e| PluginError::Parse(e.to_string()))?;
        Ok(flatten_thread(&item.children))
    }
}

#[async_trait]
impl Plugin for HnFetchComments {
    fn name(&self) -> &str {
        "hn_fetch_comments"
    }

    async fn process_item(&self, mut item: FeedItem) -> Result<FeedItem, PluginError> {
        if !item.guid.contains("news.ycombinator.com") {
            return Ok(item);
        }
        let Some(item_id) = hn_item_id(&item.guid) else {
            return Ok(item);
        };

        let comments = match self.fetch_thread(&item_id).await {
            Ok(comments) => comments,
            Err(e) => {
                warn!(item_id = %item_id, error = %e, "Comment fetch failed");
                Vec::new()
            }
        };

        let comments =
            serde_json::to_value(comments).map_err(|e| PluginError::Other(e.to_string()))?;
        item.extra.insert("comments", comments);
        Ok(item)
    }
}

/// Extracts the numeric `id=` parameter of a Hacker News URL.
pub fn hn_item_id(url: &str) -> Option<String> {
    ITEM_ID.captures(url).map(|caps| caps[1].to_string())
}

/// Depth-first flattening: up to ten top-level comments, two replies per
/// comment below that, three levels in total. Empty comments are dropped
/// but their replies are still visited.
fn flatten_thread(children: &[ApiComment]) -> Vec<Comment> {
    let mut out = Vec::new();
    collect(children, 0, &mut out);
    out
}

fn collect(children: &[ApiComment], depth: u32, out: &mut Vec<Comment>) {
    let limit = if depth == 0 { TOP_LEVEL_LIMIT } else { REPLY_LIMIT };

    for child in children.iter().take(limit) {
        let text = child.text.as_deref().map(str::trim).unwrap_or_default();
        if !text.is_empty() {
            out.push(Comment {
                author: child.author.clone().unwrap_or_default(),
                text: text.to_string(),
                points: child.points.unwrap_or_default(),
                depth,
            });
        }

        if depth < MAX_DEPTH {
            collect(&child.children, depth + 1, out);
        }
    }
}
