//! Full article body for cnBeta items.
//!
//! The cnBeta feed only carries a teaser; the article page splits the body
//! into a summary block and a content block, which are concatenated into
//! the item description.

use async_trait::async_trait;
use curator_core::FeedItem;
use reqwest::Client;
use scraper::{ElementRef, Html};

use super::http::fetch_text;
use super::selector;
use crate::plugin::{Plugin, PluginError};

pub struct CnbetaFetchContent {
    client: Client,
}

impl CnbetaFetchContent {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Plugin for CnbetaFetchContent {
    fn name(&self) -> &str {
        "cnbeta_fetch_content"
    }

    async fn process_item(&self, mut item: FeedItem) -> Result<FeedItem, PluginError> {
        if item.link.is_empty() {
            return Ok(item);
        }

        let html = fetch_text(&self.client, &item.link).await?;
        if let Some(body) = article_html(&html)? {
            item.description = body;
        }
        Ok(item)
    }
}

/// Inner HTML of `.article-summary` (without its `.topic` badge) followed by
/// `.article-content`; `None` when the page has neither.
pub fn article_html(html: &str) -> Result<Option<String>, PluginError> {
    let mut document = Html::parse_document(html);
    let summary_sel = selector(".article-summary")?;
    let topic_sel = selector(".topic")?;
    let content_sel = selector(".article-content")?;

    let summary_id = document.select(&summary_sel).next().map(|el| el.id());
    if let Some(summary_id) = summary_id {
        let topic_id = document
            .tree
            .get(summary_id)
            .and_then(ElementRef::wrap)
            .and_then(|summary| summary.select(&topic_sel).next())
            .map(|topic| topic.id());
        if let Some(mut topic) = topic_id.and_then(|id| document.tree.get_mut(id)) {
            topic.detach();
        }
    }

    let mut parts = Vec::new();
    if let Some(summary) = summary_id
        .and_then(|id| document.tree.get(id))
        .and_then(ElementRef::wrap)
    {
        parts.push(summary.inner_html());
    }
    if let Some(content) = document.select(&content_sel).next() {
        parts.push(content.inner_html());
    }

    Ok(if parts.is_empty() {
        None
    } else {
        Some(parts.concat())
    })
}
