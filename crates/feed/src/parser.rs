//! RSS 2.0 parsing.
//!
//! Only the channel title and the five item fields the curator needs are
//! read; everything else in the document is ignored.

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use curator_core::{Error, FeedItem, Result};
use quick_xml::de::from_str;
use serde::Deserialize;
use tracing::{debug, warn};

#[derive(Debug, Deserialize)]
struct Rss {
    channel: Channel,
}

#[derive(Debug, Deserialize)]
struct Channel {
    title: Option<String>,
    #[serde(rename = "item", default)]
    items: Vec<Item>,
}

#[derive(Debug, Deserialize)]
struct Item {
    title: Option<String>,
    link: Option<String>,
    #[serde(rename = "pubDate")]
    pub_date: Option<String>,
    description: Option<String>,
    guid: Option<Guid>,
}

#[derive(Debug, Deserialize)]
struct Guid {
    #[serde(rename = "$text", default)]
    value: String,
}

/// A parsed feed document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedFeed {
    pub title: Option<String>,
    pub items: Vec<FeedItem>,
}

/// Parses an RSS 2.0 document into normalized items, in document order.
pub fn parse_rss(xml: &str) -> Result<ParsedFeed> {
    let xml = scrub_html_entities_for_xml(xml);
    let rss: Rss = from_str(&xml).map_err(|e| Error::feed(format!("parsing rss xml: {e}")))?;

    let items: Vec<FeedItem> = rss
        .channel
        .items
        .into_iter()
        .map(|it| {
            let link = it.link.unwrap_or_default().trim().to_string();
            let guid = it.guid.map(|g| g.value.trim().to_string()).unwrap_or_default();

            FeedItem::new(clean_text(it.title.as_deref()), link)
                .with_guid(guid)
                .with_pub_date(it.pub_date.unwrap_or_default().trim())
                .with_description(clean_text(it.description.as_deref()))
        })
        .collect();

    debug!(items = items.len(), "Parsed rss document");
    Ok(ParsedFeed {
        title: rss.channel.title.map(|t| clean_text(Some(&t))),
        items,
    })
}

/// Items of a previously published feed.
///
/// A missing or unparsable file yields no items; the merge then starts a
/// fresh window.
pub fn load_existing_items(path: &Path) -> Vec<FeedItem> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!(path = %path.display(), "No existing feed");
            return Vec::new();
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Cannot read existing feed, starting empty");
            return Vec::new();
        }
    };

    match parse_rss(&content) {
        Ok(feed) => feed.items,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Cannot parse existing feed, starting empty");
            Vec::new()
        }
    }
}

/// Trims whitespace and zero-width spaces some sources pad fields with.
fn clean_text(text: Option<&str>) -> String {
    text.unwrap_or_default()
        .trim_matches(|c: char| c == '\u{200b}' || c.is_whitespace())
        .to_string()
}

/// Replaces HTML named entities that XML parsers reject.
///
/// CDATA sections are copied through untouched; their content is never
/// entity-decoded.
fn scrub_html_entities_for_xml(s: &str) -> String {
    const CDATA_OPEN: &str = "<![CDATA[";
    const CDATA_CLOSE: &str = "]]>";

    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(start) = rest.find(CDATA_OPEN) {
        out.push_str(&replace_entities(&rest[..start]));
        let section = &rest[start..];
        let end = section
            .find(CDATA_CLOSE)
            .map_or(section.len(), |i| i + CDATA_CLOSE.len());
        out.push_str(&section[..end]);
        rest = &section[end..];
    }
    out.push_str(&replace_entities(rest));
    out
}

fn replace_entities(s: &str) -> String {
    s.replace("&nbsp;", " ")
        .replace("&ndash;", "-")
        .replace("&mdash;", "-")
        .replace("&ldquo;", "\"")
        .replace("&rdquo;", "\"")
        .replace("&lsquo;", "'")
        .replace("&rsquo;", "'")
        .replace("&hellip;", "...")
        .replace("&middot;", "·")
        .replace("&copy;", "©")
}
