//! Footer cleanup for the zaihuapd Telegram channel.
//!
//! Every post ends with a `🍀` span linking back to the channel, followed by
//! line breaks and sometimes a trailing image. Those are removed from the
//! description.

use async_trait::async_trait;
use curator_core::FeedItem;
use scraper::{ElementRef, Html, Node};

use super::selector;
use crate::plugin::{Plugin, PluginError};

const CHANNEL_LINK: &str = "t.me/zaihuanews";
const FOOTER_MARKER: &str = "🍀";

#[derive(Debug, Default)]
pub struct ZaihuapdCleanDescription;

#[async_trait]
impl Plugin for ZaihuapdCleanDescription {
    fn name(&self) -> &str {
        "zaihuapd_clean_description"
    }

    async fn process_item(&self, mut item: FeedItem) -> Result<FeedItem, PluginError> {
        if !item.description.is_empty() {
            item.description = clean_description(&item.description)?;
        }
        Ok(item)
    }
}

/// Strips the channel footer, trailing breaks and trailing images.
pub fn clean_description(description: &str) -> Result<String, PluginError> {
    let mut fragment = Html::parse_fragment(description);

    // Detaches the last child of `parent_id` while `removable` holds for it.
    let trim_trailing = |fragment: &mut Html, parent_id, removable: fn(&Node) -> bool| loop {
        let last = fragment
            .tree
            .get(parent_id)
            .and_then(|parent| parent.last_child())
            .filter(|last| removable(last.value()))
            .map(|last| last.id());

        match last.and_then(|id| fragment.tree.get_mut(id)) {
            Some(mut node) => node.detach(),
            None => break,
        }
    };
    let channel_links = selector(&format!(r#"a[href*="{CHANNEL_LINK}"]"#))?;

    let links: Vec<_> = fragment.select(&channel_links).map(|a| a.id()).collect();
    for link_id in links {
        // Footer marker and everything after it, link included.
        let (parent_id, doomed) = {
            let Some(link) = fragment.tree.get(link_id) else {
                continue;
            };
            let Some(parent) = link.parent() else {
                continue;
            };

            let marker = link.prev_sibling().filter(|prev| {
                ElementRef::wrap(*prev).is_some_and(|span| {
                    span.value().name() == "span" && span.text().collect::<String>() == FOOTER_MARKER
                })
            });

            let mut doomed = Vec::new();
            let mut current = marker;
            while let Some(node) = current {
                doomed.push(node.id());
                current = node.next_sibling();
            }
            (parent.id(), doomed)
        };

        for id in doomed {
            if let Some(mut node) = fragment.tree.get_mut(id) {
                node.detach();
            }
        }
        trim_trailing(&mut fragment, parent_id, |node| match node {
            Node::Element(el) => el.name() == "br",
            Node::Text(text) => text.trim().is_empty(),
            _ => false,
        });
    }

    let root_id = fragment.root_element().id();
    trim_trailing(&mut fragment, root_id, |node| match node {
        Node::Element(el) => el.name() == "img",
        Node::Text(text) => text.trim().is_empty(),
        _ => false,
    });

    Ok(fragment.root_element().inner_html())
}
