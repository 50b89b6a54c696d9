//! Core data model: the immutable book and its contiguous part groups.
//!
//! A [`Book`] is loaded once (usually from JSON) and only read afterwards.
//! Every exporter walks the same chapter order and the same grouping.

mod book;
mod parts;

pub use book::{Book, BookInfo, Chapter};
pub use parts::{NumberedChapter, PartGroup, group_parts, starts_part};
