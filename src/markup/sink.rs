//! html5ever `TreeSink` that builds a [`Dom`].

use std::borrow::Cow;
use std::cell::RefCell;
use std::rc::Rc;

use html5ever::tendril::StrTendril;
use html5ever::tree_builder::{ElementFlags, NodeOrText, QuirksMode, TreeSink};
use html5ever::{Attribute, QualName, local_name, ns};

use super::dom::{Dom, DomNodeId, NodeData};

/// Handle given to the tree builder.
///
/// Carries the element name alongside the arena index so `elem_name` can
/// lend it out without borrowing through the `RefCell`.
#[derive(Debug, Clone)]
pub struct SinkHandle {
    id: DomNodeId,
    name: Rc<QualName>,
}

/// Tree builder target. Parse errors are ignored, as browsers do.
pub struct DomSink {
    dom: RefCell<Dom>,
    unnamed: Rc<QualName>,
}

impl Default for DomSink {
    fn default() -> Self {
        Self::new()
    }
}

impl DomSink {
    pub fn new() -> Self {
        Self {
            dom: RefCell::new(Dom::new()),
            unnamed: Rc::new(QualName::new(None, ns!(), local_name!(""))),
        }
    }

    pub fn into_dom(self) -> Dom {
        self.dom.into_inner()
    }

    fn unnamed_handle(&self, id: DomNodeId) -> SinkHandle {
        SinkHandle {
            id,
            name: Rc::clone(&self.unnamed),
        }
    }

    fn insert(&self, parent: DomNodeId, child: NodeOrText<SinkHandle>) {
        let mut dom = self.dom.borrow_mut();
        match child {
            NodeOrText::AppendNode(node) => dom.append(parent, node.id),
            NodeOrText::AppendText(text) => dom.append_text(parent, &text),
        }
    }
}

impl TreeSink for DomSink {
    type Handle = SinkHandle;
    type Output = Self;
    type ElemName<'a>
        = &'a QualName
    where
        Self: 'a;

    fn finish(self) -> Self::Output {
        self
    }

    fn parse_error(&self, _msg: Cow<'static, str>) {}

    fn get_document(&self) -> Self::Handle {
        let id = self.dom.borrow().document();
        self.unnamed_handle(id)
    }

    fn elem_name<'a>(&'a self, target: &'a Self::Handle) -> Self::ElemName<'a> {
        &target.name
    }

    fn create_element(
        &self,
        name: QualName,
        attrs: Vec<Attribute>,
        _flags: ElementFlags,
    ) -> Self::Handle {
        let attrs = attrs
            .into_iter()
            .map(|a| (a.name.local, a.value.to_string()))
            .collect();
        let id = self.dom.borrow_mut().create_element(name.clone(), attrs);
        SinkHandle {
            id,
            name: Rc::new(name),
        }
    }

    fn create_comment(&self, _text: StrTendril) -> Self::Handle {
        let id = self.dom.borrow_mut().create_ignored();
        self.unnamed_handle(id)
    }

    fn create_pi(&self, _target: StrTendril, _data: StrTendril) -> Self::Handle {
        let id = self.dom.borrow_mut().create_ignored();
        self.unnamed_handle(id)
    }

    fn append(&self, parent: &Self::Handle, child: NodeOrText<Self::Handle>) {
        self.insert(parent.id, child);
    }

    fn append_based_on_parent_node(
        &self,
        element: &Self::Handle,
        prev_element: &Self::Handle,
        child: NodeOrText<Self::Handle>,
    ) {
        let parent = self
            .dom
            .borrow()
            .get(element.id)
            .map(|n| n.parent)
            .unwrap_or(DomNodeId::NONE);
        if parent.is_some() {
            self.insert(parent, child);
        } else {
            self.insert(prev_element.id, child);
        }
    }

    fn append_doctype_to_document(
        &self,
        _name: StrTendril,
        _public_id: StrTendril,
        _system_id: StrTendril,
    ) {
        let mut dom = self.dom.borrow_mut();
        let doctype = dom.create_ignored();
        let document = dom.document();
        dom.append(document, doctype);
    }

    fn get_template_contents(&self, target: &Self::Handle) -> Self::Handle {
        target.clone()
    }

    fn same_node(&self, x: &Self::Handle, y: &Self::Handle) -> bool {
        x.id == y.id
    }

    fn set_quirks_mode(&self, _mode: QuirksMode) {}

    fn append_before_sibling(&self, sibling: &Self::Handle, new_node: NodeOrText<Self::Handle>) {
        let mut dom = self.dom.borrow_mut();
        match new_node {
            NodeOrText::AppendNode(node) => dom.insert_before(sibling.id, node.id),
            NodeOrText::AppendText(text) => {
                let text_node = dom.create_text(text.to_string());
                dom.insert_before(sibling.id, text_node);
            }
        }
    }

    fn add_attrs_if_missing(&self, target: &Self::Handle, attrs: Vec<Attribute>) {
        let mut dom = self.dom.borrow_mut();
        if let Some(node) = dom.get_mut(target.id)
            && let NodeData::Element {
                attrs: existing, ..
            } = &mut node.data
        {
            for attr in attrs {
                if !existing.iter().any(|(name, _)| *name == attr.name.local) {
                    existing.push((attr.name.local, attr.value.to_string()));
                }
            }
        }
    }

    fn remove_from_parent(&self, target: &Self::Handle) {
        self.dom.borrow_mut().detach(target.id);
    }

    fn reparent_children(&self, node: &Self::Handle, new_parent: &Self::Handle) {
        let mut dom = self.dom.borrow_mut();
        let children: Vec<_> = dom.children(node.id).collect();
        for child in children {
            dom.detach(child);
            dom.append(new_parent.id, child);
        }
    }
}
