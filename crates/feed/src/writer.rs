//! RSS 2.0 rendering of the curated feed.

use std::fs;
use std::io::Cursor;
use std::path::Path;

use chrono::{DateTime, Utc};
use curator_core::{Error, FeedItem, Result};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use tracing::info;

/// The curated feed to publish.
#[derive(Debug, Clone)]
pub struct OutputFeed {
    pub title: String,
    pub link: String,
    pub description: String,
    pub last_build_date: DateTime<Utc>,
    pub items: Vec<FeedItem>,
}

type XmlWriter = Writer<Cursor<Vec<u8>>>;

/// Renders `feed` as an RSS 2.0 document.
pub fn render_rss(feed: &OutputFeed) -> Result<String> {
    let mut writer = Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 2);

    emit(&mut writer, Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
    emit(
        &mut writer,
        Event::Start(BytesStart::new("rss").with_attributes([("version", "2.0")])),
    )?;
    emit(&mut writer, Event::Start(BytesStart::new("channel")))?;

    text_element(&mut writer, "title", &feed.title)?;
    text_element(&mut writer, "link", &feed.link)?;
    text_element(&mut writer, "description", &feed.description)?;
    text_element(&mut writer, "lastBuildDate", &feed.last_build_date.to_rfc2822())?;

    for item in &feed.items {
        write_item(&mut writer, item)?;
    }

    emit(&mut writer, Event::End(BytesEnd::new("channel")))?;
    emit(&mut writer, Event::End(BytesEnd::new("rss")))?;

    String::from_utf8(writer.into_inner().into_inner())
        .map_err(|e| Error::feed(format!("rendered feed is not utf-8: {e}")))
}

/// Renders `feed` and writes it to `path`, creating parent directories.
pub fn write_rss(path: &Path, feed: &OutputFeed) -> Result<()> {
    let rendered = render_rss(feed)?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, rendered)?;

    info!(path = %path.display(), items = feed.items.len(), "Wrote feed");
    Ok(())
}

fn write_item(writer: &mut XmlWriter, item: &FeedItem) -> Result<()> {
    emit(writer, Event::Start(BytesStart::new("item")))?;

    text_element(writer, "title", &item.title)?;
    text_element(writer, "link", &item.link)?;
    if !item.pub_date.is_empty() {
        text_element(writer, "pubDate", &item.pub_date)?;
    }

    let guid = if item.guid.is_empty() { &item.link } else { &item.guid };
    emit(
        writer,
        Event::Start(BytesStart::new("guid").with_attributes([("isPermaLink", "false")])),
    )?;
    emit(writer, Event::Text(BytesText::new(guid)))?;
    emit(writer, Event::End(BytesEnd::new("guid")))?;

    text_element(writer, "description", &item.description)?;

    emit(writer, Event::End(BytesEnd::new("item")))
}

fn text_element(writer: &mut XmlWriter, name: &str, text: &str) -> Result<()> {
    emit(writer, Event::Start(BytesStart::new(name)))?;
    emit(writer, Event::Text(BytesText::new(text)))?;
    emit(writer, Event::End(BytesEnd::new(name)))
}

fn emit(writer: &mut XmlWriter, event: Event<'_>) -> Result<()> {
    writer
        .write_event(event)
        .map_err(|e| Error::feed(format!("writing rss: {e}")))
}
