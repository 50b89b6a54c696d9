//! Markup parsing.
//!
//! Chapter content is an HTML fragment. It is parsed with html5ever into a
//! small arena DOM that the normalizer walks; nothing outside the content
//! layer sees markup.

mod dom;
mod sink;

use html5ever::driver::ParseOpts;
use html5ever::parse_document;
use html5ever::tendril::TendrilSink;

pub use dom::{Children, Dom, DomNode, DomNodeId, NodeData};
pub use sink::{DomSink, SinkHandle};

/// Parse an HTML fragment. Never fails; malformed markup is repaired the
/// way a browser would repair it.
pub fn parse_markup(html: &str) -> Dom {
    let sink = DomSink::new();
    parse_document(sink, ParseOpts::default())
        .from_utf8()
        .one(html.as_bytes())
        .into_dom()
}

/// The `<body>` element of a parsed fragment, or the document node when
/// the parser produced none.
pub fn body(dom: &Dom) -> DomNodeId {
    dom.find_by_tag("body").unwrap_or_else(|| dom.document())
}
