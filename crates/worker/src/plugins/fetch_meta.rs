//! Page summary from `<meta>` description tags.

use async_trait::async_trait;
use curator_core::FeedItem;
use reqwest::Client;
use scraper::Html;
use tracing::warn;

use super::http::fetch_text;
use super::selector;
use crate::plugin::{Plugin, PluginError};

pub struct FetchMeta {
    client: Client,
}

impl FetchMeta {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Plugin for FetchMeta {
    fn name(&self) -> &str {
        "fetch_meta"
    }

    async fn process_item(&self, mut item: FeedItem) -> Result<FeedItem, PluginError> {
        if item.link.is_empty() {
            return Ok(item);
        }

        let meta = match fetch_text(&self.client, &item.link).await {
            Ok(html) => meta_description(&html)?,
            Err(e) => {
                warn!(link = %item.link, error = %e, "Meta fetch failed");
                String::new()
            }
        };

        item.extra.insert("meta", meta);
        Ok(item)
    }
}

/// `meta[name=description]`, else `og:description`, else empty.
pub fn meta_description(html: &str) -> Result<String, PluginError> {
    let document = Html::parse_document(html);

    for css in [
        r#"meta[name="description"]"#,
        r#"meta[property="og:description"]"#,
    ] {
        let content = document
            .select(&selector(css)?)
            .next()
            .and_then(|meta| meta.value().attr("content"))
            .filter(|content| !content.is_empty());
        if let Some(content) = content {
            return Ok(content.to_string());
        }
    }

    Ok(String::new())
}
