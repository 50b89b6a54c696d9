//! Canonical content model and the markup normalizer.
//!
//! Every exporter reads chapter content through this module, so stripping,
//! list prefixing and whitespace handling are decided in exactly one place.

mod node;
mod normalize;

pub use node::{BULLET, Node, TextRun, leaf_blocks, list_lines, strip_nodes};
pub use normalize::{NormalizedChapter, normalize, normalize_book, strip};
