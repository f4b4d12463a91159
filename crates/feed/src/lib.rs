//! Feed I/O for the feed curator.
//!
//! - Provider (poll a source URL, normalize its items)
//! - Parser (RSS 2.0 documents into `FeedItem`s)
//! - Writer (render the curated RSS artifact)

pub mod config;
pub mod parser;
pub mod provider;
pub mod writer;

pub use config::FeedConfig;
pub use parser::{load_existing_items, parse_rss, ParsedFeed};
pub use provider::{FeedProvider, HttpFeedProvider};
pub use writer::{render_rss, write_rss, OutputFeed};
