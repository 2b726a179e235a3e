//! XML-shaped tree nodes.
//!
//! An [`XmlNode`] is one of three variants: an element (with children, an
//! optional bound YANG statement and a cached typed body value), an
//! attribute, or a body (text). Children keep insertion order; element
//! children are additionally kept in schema order by the sort module.
//! Ownership is strictly hierarchical: a parent owns its children, a child
//! holds only a weak back-reference used for namespace lookups.

pub mod namespace;

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use crate::yang::{TypedValue, YangRef};

/// A reference-counted pointer to a tree node.
pub type NodeRef = Rc<RefCell<XmlNode>>;

/// A node in an XML-shaped tree.
#[derive(Debug)]
pub struct XmlNode {
    /// Local name; empty for body nodes.
    name: String,
    /// Namespace prefix, when the wire form carried one.
    prefix: Option<String>,
    /// Weak reference to the parent node.
    parent: Weak<RefCell<XmlNode>>,
    /// Variant-specific data.
    kind: NodeKind,
}

/// Variant-specific node data.
#[derive(Debug)]
pub enum NodeKind {
    Element {
        /// Child nodes in insertion (or sorted) order.
        children: Vec<NodeRef>,
        /// The YANG statement governing this element, once bound.
        spec: Option<YangRef>,
        /// Cached parse of the body under the resolved type.
        value: Option<TypedValue>,
    },
    Attribute {
        value: String,
    },
    Body {
        value: String,
    },
}

impl XmlNode {
    /// Creates a new element node.
    pub fn new_element(name: impl Into<String>) -> NodeRef {
        Rc::new(RefCell::new(XmlNode {
            name: name.into(),
            prefix: None,
            parent: Weak::new(),
            kind: NodeKind::Element {
                children: Vec::new(),
                spec: None,
                value: None,
            },
        }))
    }

    /// Creates a new attribute node.
    pub fn new_attribute(name: impl Into<String>, value: impl Into<String>) -> NodeRef {
        Rc::new(RefCell::new(XmlNode {
            name: name.into(),
            prefix: None,
            parent: Weak::new(),
            kind: NodeKind::Attribute {
                value: value.into(),
            },
        }))
    }

    /// Creates a new body (text) node.
    pub fn new_body(text: impl Into<String>) -> NodeRef {
        Rc::new(RefCell::new(XmlNode {
            name: String::new(),
            prefix: None,
            parent: Weak::new(),
            kind: NodeKind::Body { value: text.into() },
        }))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }

    pub fn set_prefix(&mut self, prefix: Option<String>) {
        self.prefix = prefix;
    }

    /// The name as written on the wire: `prefix:name` or `name`.
    pub fn qualified_name(&self) -> String {
        match &self.prefix {
            Some(p) => format!("{}:{}", p, self.name),
            None => self.name.clone(),
        }
    }

    pub fn is_element(&self) -> bool {
        matches!(self.kind, NodeKind::Element { .. })
    }

    pub fn is_attribute(&self) -> bool {
        matches!(self.kind, NodeKind::Attribute { .. })
    }

    pub fn is_body(&self) -> bool {
        matches!(self.kind, NodeKind::Body { .. })
    }

    /// The text of an attribute or body node, None for elements.
    pub fn value(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Attribute { value } | NodeKind::Body { value } => Some(value),
            NodeKind::Element { .. } => None,
        }
    }

    /// Replaces the text of an attribute or body node.
    pub fn set_value(&mut self, text: impl Into<String>) {
        match &mut self.kind {
            NodeKind::Attribute { value } | NodeKind::Body { value } => *value = text.into(),
            NodeKind::Element { .. } => {}
        }
    }

    /// The bound YANG statement of an element.
    pub fn spec(&self) -> Option<YangRef> {
        match &self.kind {
            NodeKind::Element { spec, .. } => spec.clone(),
            _ => None,
        }
    }

    /// Binds a YANG statement to an element and drops any cached value.
    pub fn set_spec(&mut self, spec: Option<YangRef>) {
        if let NodeKind::Element {
            spec: s, value, ..
        } = &mut self.kind
        {
            *s = spec;
            *value = None;
        }
    }

    pub fn children(&self) -> &[NodeRef] {
        match &self.kind {
            NodeKind::Element { children, .. } => children,
            _ => &[],
        }
    }

    pub fn child_count(&self) -> usize {
        self.children().len()
    }

    pub fn child(&self, index: usize) -> Option<&NodeRef> {
        self.children().get(index)
    }

    /// The parent node, if still alive.
    pub fn parent(&self) -> Option<NodeRef> {
        self.parent.upgrade()
    }

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    pub fn kind_mut(&mut self) -> &mut NodeKind {
        &mut self.kind
    }
}

/// Helper functions that work with NodeRef.
impl XmlNode {
    /// Appends a child node. Must be called on the NodeRef wrappers.
    pub fn add_child_to_ref(parent_ref: &NodeRef, child_ref: NodeRef) {
        child_ref.borrow_mut().parent = Rc::downgrade(parent_ref);
        if let NodeKind::Element { children, .. } = &mut parent_ref.borrow_mut().kind {
            children.push(child_ref);
        }
    }

    /// Inserts a child at the given index.
    pub fn insert_child_at(parent_ref: &NodeRef, index: usize, child_ref: NodeRef) {
        child_ref.borrow_mut().parent = Rc::downgrade(parent_ref);
        if let NodeKind::Element { children, .. } = &mut parent_ref.borrow_mut().kind {
            let index = index.min(children.len());
            children.insert(index, child_ref);
        }
    }

    /// Removes and returns the child at the given index; ownership passes
    /// to the caller.
    pub fn remove_child_at(parent_ref: &NodeRef, index: usize) -> Option<NodeRef> {
        let removed = {
            let mut parent = parent_ref.borrow_mut();
            match &mut parent.kind {
                NodeKind::Element { children, .. } if index < children.len() => {
                    Some(children.remove(index))
                }
                _ => None,
            }
        };
        if let Some(node) = &removed {
            node.borrow_mut().parent = Weak::new();
        }
        removed
    }
}

/// Returns the element children of a node.
pub fn element_children(node: &NodeRef) -> Vec<NodeRef> {
    node.borrow()
        .children()
        .iter()
        .filter(|c| c.borrow().is_element())
        .cloned()
        .collect()
}

/// Returns the body text of an element: the value of its first body child.
pub fn body(node: &NodeRef) -> Option<String> {
    node.borrow()
        .children()
        .iter()
        .find(|c| c.borrow().is_body())
        .map(|c| c.borrow().value().unwrap_or_default().to_string())
}

/// Sets (or replaces) the body text of an element, invalidating the cached
/// typed value.
pub fn set_body(node: &NodeRef, text: &str) {
    {
        let mut n = node.borrow_mut();
        if let NodeKind::Element { value, .. } = &mut n.kind {
            *value = None;
        }
    }
    let existing = node
        .borrow()
        .children()
        .iter()
        .find(|c| c.borrow().is_body())
        .cloned();
    match existing {
        Some(b) => b.borrow_mut().set_value(text),
        None => XmlNode::add_child_to_ref(node, XmlNode::new_body(text)),
    }
}

/// Finds the first element child with the given name.
pub fn find_child(node: &NodeRef, name: &str) -> Option<NodeRef> {
    node.borrow()
        .children()
        .iter()
        .find(|c| {
            let c = c.borrow();
            c.is_element() && c.name() == name
        })
        .cloned()
}

/// Returns the body of the named element child, e.g. `"e0"` for
/// `<if><name>e0</name></if>` given `"name"`.
pub fn find_body(node: &NodeRef, name: &str) -> Option<String> {
    find_child(node, name).and_then(|c| body(&c))
}

/// Finds the first element child with the given name and body value.
pub fn find_body_child(node: &NodeRef, name: &str, value: &str) -> Option<NodeRef> {
    node.borrow()
        .children()
        .iter()
        .find(|c| {
            let is_match = {
                let n = c.borrow();
                n.is_element() && n.name() == name
            };
            is_match && body(c).as_deref() == Some(value)
        })
        .cloned()
}

/// Finds an attribute child by prefix and name and returns its value.
pub fn find_attr_value(node: &NodeRef, prefix: Option<&str>, name: &str) -> Option<String> {
    node.borrow()
        .children()
        .iter()
        .find(|c| {
            let c = c.borrow();
            c.is_attribute() && c.name() == name && c.prefix() == prefix
        })
        .map(|c| c.borrow().value().unwrap_or_default().to_string())
}

/// Parses and caches the typed body value of a bound leaf element.
///
/// Returns None when the element is unbound, has no resolvable type, has no
/// body, or the body does not parse; callers fall back to raw comparison in
/// those cases. Repeated calls return the cached value.
pub fn typed_value(node: &NodeRef) -> Option<TypedValue> {
    {
        let n = node.borrow();
        if let NodeKind::Element {
            value: Some(v), ..
        } = &n.kind
        {
            return Some(v.clone());
        }
    }
    let spec = node.borrow().spec()?;
    let ty = spec.borrow().resolved_type()?.clone();
    let text = body(node)?;
    let parsed = crate::yang::types::parse_value(&text, &ty).ok()?;
    if let NodeKind::Element { value, .. } = &mut node.borrow_mut().kind {
        *value = Some(parsed.clone());
    }
    Some(parsed)
}

/// Verdict of a tree-walk visitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Walk {
    /// Descend into this node's children.
    Continue,
    /// Do not descend, continue with siblings.
    SkipSubtree,
    /// Abort the whole walk.
    Stop,
}

/// Applies a visitor to a node and its element descendants, depth first.
/// The visitor receives each node with its depth; returns true if the walk
/// was stopped early.
pub fn apply<F>(node: &NodeRef, f: &mut F) -> bool
where
    F: FnMut(&NodeRef, usize) -> Walk,
{
    apply_at(node, 0, f)
}

fn apply_at<F>(node: &NodeRef, depth: usize, f: &mut F) -> bool
where
    F: FnMut(&NodeRef, usize) -> Walk,
{
    match f(node, depth) {
        Walk::Stop => return true,
        Walk::SkipSubtree => return false,
        Walk::Continue => {}
    }
    let children = element_children(node);
    for child in &children {
        if apply_at(child, depth + 1, f) {
            return true;
        }
    }
    false
}
