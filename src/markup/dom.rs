//! Arena DOM for chapter markup.
//!
//! Nodes live in one vector and link to each other by index. Only what the
//! normalizer needs is kept: element names, attributes and text.

use html5ever::{LocalName, QualName};

/// Index of a node in the arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DomNodeId(pub u32);

impl DomNodeId {
    /// Sentinel for "no node".
    pub const NONE: DomNodeId = DomNodeId(u32::MAX);

    pub fn is_some(&self) -> bool {
        self.0 != u32::MAX
    }

    pub fn is_none(&self) -> bool {
        self.0 == u32::MAX
    }
}

#[derive(Debug, Clone)]
pub enum NodeData {
    Document,
    Element {
        name: QualName,
        attrs: Vec<(LocalName, String)>,
    },
    Text(String),
    /// Comments, doctypes and processing instructions. Never rendered.
    Ignored,
}

#[derive(Debug)]
pub struct DomNode {
    pub data: NodeData,
    pub parent: DomNodeId,
    pub first_child: DomNodeId,
    pub last_child: DomNodeId,
    pub prev_sibling: DomNodeId,
    pub next_sibling: DomNodeId,
}

impl DomNode {
    fn new(data: NodeData) -> Self {
        Self {
            data,
            parent: DomNodeId::NONE,
            first_child: DomNodeId::NONE,
            last_child: DomNodeId::NONE,
            prev_sibling: DomNodeId::NONE,
            next_sibling: DomNodeId::NONE,
        }
    }
}

/// Arena-allocated markup tree.
#[derive(Debug)]
pub struct Dom {
    nodes: Vec<DomNode>,
    document: DomNodeId,
}

impl Default for Dom {
    fn default() -> Self {
        Self::new()
    }
}

impl Dom {
    /// Create an empty tree holding only the document node.
    pub fn new() -> Self {
        let mut dom = Self {
            nodes: Vec::new(),
            document: DomNodeId::NONE,
        };
        dom.document = dom.alloc(NodeData::Document);
        dom
    }

    fn alloc(&mut self, data: NodeData) -> DomNodeId {
        let id = DomNodeId(self.nodes.len() as u32);
        self.nodes.push(DomNode::new(data));
        id
    }

    pub fn document(&self) -> DomNodeId {
        self.document
    }

    pub fn get(&self, id: DomNodeId) -> Option<&DomNode> {
        if id.is_none() {
            return None;
        }
        self.nodes.get(id.0 as usize)
    }

    pub fn get_mut(&mut self, id: DomNodeId) -> Option<&mut DomNode> {
        if id.is_none() {
            return None;
        }
        self.nodes.get_mut(id.0 as usize)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    pub fn create_element(&mut self, name: QualName, attrs: Vec<(LocalName, String)>) -> DomNodeId {
        self.alloc(NodeData::Element { name, attrs })
    }

    pub fn create_text(&mut self, text: String) -> DomNodeId {
        self.alloc(NodeData::Text(text))
    }

    pub fn create_ignored(&mut self) -> DomNodeId {
        self.alloc(NodeData::Ignored)
    }

    /// Append `child` as the last child of `parent`.
    pub fn append(&mut self, parent: DomNodeId, child: DomNodeId) {
        let last_child = self
            .get(parent)
            .map(|n| n.last_child)
            .unwrap_or(DomNodeId::NONE);

        if let Some(node) = self.get_mut(child) {
            node.parent = parent;
            node.prev_sibling = last_child;
            node.next_sibling = DomNodeId::NONE;
        }

        if let Some(last) = self.get_mut(last_child) {
            last.next_sibling = child;
        }

        if let Some(parent_node) = self.get_mut(parent) {
            if parent_node.first_child.is_none() {
                parent_node.first_child = child;
            }
            parent_node.last_child = child;
        }
    }

    /// Insert `new_node` immediately before `sibling`.
    pub fn insert_before(&mut self, sibling: DomNodeId, new_node: DomNodeId) {
        let (parent, prev) = match self.get(sibling) {
            Some(n) => (n.parent, n.prev_sibling),
            None => return,
        };

        if let Some(node) = self.get_mut(new_node) {
            node.parent = parent;
            node.prev_sibling = prev;
            node.next_sibling = sibling;
        }

        if let Some(sib) = self.get_mut(sibling) {
            sib.prev_sibling = new_node;
        }

        if prev.is_some() {
            if let Some(p) = self.get_mut(prev) {
                p.next_sibling = new_node;
            }
        } else if let Some(par) = self.get_mut(parent) {
            par.first_child = new_node;
        }
    }

    /// Append text, merging with a trailing text node when there is one.
    pub fn append_text(&mut self, parent: DomNodeId, text: &str) {
        let last_child = self
            .get(parent)
            .map(|n| n.last_child)
            .unwrap_or(DomNodeId::NONE);

        if let Some(last) = self.get_mut(last_child)
            && let NodeData::Text(existing) = &mut last.data
        {
            existing.push_str(text);
            return;
        }

        let node = self.create_text(text.to_string());
        self.append(parent, node);
    }

    /// Unlink a node from its parent and siblings.
    pub fn detach(&mut self, id: DomNodeId) {
        let (parent, prev, next) = match self.get(id) {
            Some(n) => (n.parent, n.prev_sibling, n.next_sibling),
            None => return,
        };

        if prev.is_some() {
            if let Some(p) = self.get_mut(prev) {
                p.next_sibling = next;
            }
        } else if let Some(p) = self.get_mut(parent) {
            p.first_child = next;
        }

        if next.is_some() {
            if let Some(n) = self.get_mut(next) {
                n.prev_sibling = prev;
            }
        } else if let Some(p) = self.get_mut(parent) {
            p.last_child = prev;
        }

        if let Some(node) = self.get_mut(id) {
            node.parent = DomNodeId::NONE;
            node.prev_sibling = DomNodeId::NONE;
            node.next_sibling = DomNodeId::NONE;
        }
    }

    pub fn children(&self, parent: DomNodeId) -> Children<'_> {
        let first = self
            .get(parent)
            .map(|n| n.first_child)
            .unwrap_or(DomNodeId::NONE);
        Children {
            dom: self,
            current: first,
        }
    }

    /// Local tag name of an element (`"p"`, `"strong"`, ...).
    pub fn tag(&self, id: DomNodeId) -> Option<&str> {
        self.get(id).and_then(|n| match &n.data {
            NodeData::Element { name, .. } => Some(name.local.as_ref()),
            _ => None,
        })
    }

    pub fn attr(&self, id: DomNodeId, attr: &str) -> Option<&str> {
        self.get(id).and_then(|n| match &n.data {
            NodeData::Element { attrs, .. } => attrs
                .iter()
                .find(|(name, _)| name.as_ref() == attr)
                .map(|(_, value)| value.as_str()),
            _ => None,
        })
    }

    pub fn text(&self, id: DomNodeId) -> Option<&str> {
        self.get(id).and_then(|n| match &n.data {
            NodeData::Text(s) => Some(s.as_str()),
            _ => None,
        })
    }

    /// Concatenated text of a node and all its descendants.
    pub fn text_content(&self, id: DomNodeId) -> String {
        let mut out = String::new();
        self.collect_text(id, &mut out);
        out
    }

    fn collect_text(&self, id: DomNodeId, out: &mut String) {
        match self.get(id).map(|n| &n.data) {
            Some(NodeData::Text(s)) => out.push_str(s),
            Some(NodeData::Element { .. }) | Some(NodeData::Document) => {
                for child in self.children(id) {
                    self.collect_text(child, out);
                }
            }
            _ => {}
        }
    }

    /// First element with the given tag, depth-first in document order.
    pub fn find_by_tag(&self, tag: &str) -> Option<DomNodeId> {
        let mut stack = vec![self.document];
        while let Some(id) = stack.pop() {
            if self.tag(id) == Some(tag) {
                return Some(id);
            }
            let mut children: Vec<_> = self.children(id).collect();
            children.reverse();
            stack.extend(children);
        }
        None
    }
}

pub struct Children<'a> {
    dom: &'a Dom,
    current: DomNodeId,
}

impl Iterator for Children<'_> {
    type Item = DomNodeId;

    fn next(&mut self) -> Option<Self::Item> {
        if self.current.is_none() {
            return None;
        }
        let id = self.current;
        self.current = self
            .dom
            .get(id)
            .map(|n| n.next_sibling)
            .unwrap_or(DomNodeId::NONE);
        Some(id)
    }
}
