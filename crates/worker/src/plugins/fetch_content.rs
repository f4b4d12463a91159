//! Article body extraction.
//!
//! Fetches the item's link and stores the readable text of the page in
//! `extra.content`, with each inline image replaced by an `[IMAGE_n]`
//! placeholder pointing into `extra.images`.

use async_trait::async_trait;
use curator_core::FeedItem;
use reqwest::Client;
use scraper::node::Element;
use scraper::{ElementRef, Html, Node};
use serde::Serialize;
use tracing::warn;

use super::http::fetch_text;
use super::selector;
use crate::plugin::{Plugin, PluginError};

/// Image sources that usually decorate a post rather than belong to it.
const DECORATIVE_IMAGE_KEYWORDS: [&str; 6] =
    ["category", "categories", "tag", "topic", "icon", "avatar"];

/// An image found in the article body.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageRef {
    pub src: String,
    pub alt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

/// Text and images extracted from a page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Extraction {
    pub content: String,
    pub images: Vec<ImageRef>,
}

pub struct FetchContent {
    client: Client,
    max_content_chars: usize,
}

impl FetchContent {
    pub fn new(client: Client, max_content_chars: usize) -> Self {
        Self {
            client,
            max_content_chars,
        }
    }
}

#[async_trait]
impl Plugin for FetchContent {
    fn name(&self) -> &str {
        "fetch_content"
    }

    async fn process_item(&self, mut item: FeedItem) -> Result<FeedItem, PluginError> {
        if item.link.is_empty() {
            return Ok(item);
        }

        let extraction = match fetch_text(&self.client, &item.link).await {
            Ok(html) => extract_content(&html, self.max_content_chars)?,
            Err(e) => {
                warn!(link = %item.link, error = %e, "Content fetch failed");
                Extraction::default()
            }
        };

        let images = serde_json::to_value(&extraction.images)
            .map_err(|e| PluginError::Other(e.to_string()))?;
        item.extra.insert("content", extraction.content);
        item.extra.insert("images", images);
        Ok(item)
    }
}

/// Extracts the main text of `html`.
///
/// Boilerplate containers are dropped first, then the first `article`,
/// `main` or `body` element is flattened to text.
pub fn extract_content(html: &str, max_chars: usize) -> Result<Extraction, PluginError> {
    let mut document = Html::parse_document(html);

    let boilerplate = selector("script, style, nav, header, footer, aside")?;
    let doomed: Vec<_> = document.select(&boilerplate).map(|el| el.id()).collect();
    for id in doomed {
        if let Some(mut node) = document.tree.get_mut(id) {
            node.detach();
        }
    }

    let mut root = None;
    for css in ["article", "main", "body"] {
        if let Some(el) = document.select(&selector(css)?).next() {
            root = Some(el);
            break;
        }
    }
    let Some(root) = root else {
        return Ok(Extraction::default());
    };

    let mut flattener = Flattener::default();
    flattener.walk(root);

    let content = flattener
        .text
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .chars()
        .take(max_chars)
        .collect();

    Ok(Extraction {
        content,
        images: flattener.images,
    })
}

#[derive(Default)]
struct Flattener {
    text: String,
    images: Vec<ImageRef>,
    images_seen: usize,
}

impl Flattener {
    fn walk(&mut self, element: ElementRef<'_>) {
        for child in element.children() {
            match child.value() {
                Node::Text(text) => self.text.push_str(text),
                Node::Element(el) if el.name() == "img" => self.image(el),
                Node::Element(_) => {
                    if let Some(child) = ElementRef::wrap(child) {
                        self.walk(child);
                    }
                }
                _ => {}
            }
        }
    }

    fn image(&mut self, img: &Element) {
        let position = self.images_seen;
        self.images_seen += 1;

        let src = img.attr("src").unwrap_or_default();
        let lower = src.to_lowercase();
        if position == 0 && DECORATIVE_IMAGE_KEYWORDS.iter().any(|k| lower.contains(k)) {
            return;
        }
        if src.starts_with("data:") {
            return;
        }

        let attr = |name: &str| {
            img.attr(name)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };

        self.text.push_str(&format!("[IMAGE_{}]", self.images.len()));
        self.images.push(ImageRef {
            src: src.to_string(),
            alt: img.attr("alt").unwrap_or_default().to_string(),
            width: attr("width"),
            height: attr("height"),
            title: attr("title"),
        });
    }
}
