//! Core types, dedup history, selection, and merge logic for the feed curator.

pub mod classification;
pub mod error;
pub mod history;
pub mod item;
pub mod limits;
pub mod merge;
pub mod selection;

pub use classification::*;
pub use error::{Error, Result};
pub use history::*;
pub use item::*;
pub use merge::*;
pub use selection::*;
