//! Namespace handling over trees.
//!
//! Namespaces are not cached on nodes: an element's effective namespace is
//! whatever its `xmlns`/`xmlns:p` attribute children and those of its
//! ancestors say. The two primitives here are the ancestor walk resolving a
//! prefix to a URI, and the reverse find-or-inject used when a tree must
//! carry a given default namespace.

use super::{find_attr_value, NodeRef, XmlNode};

/// The always-bound `xml` prefix namespace.
pub const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";

/// Splits a qualified name into prefix and local name.
///
/// Returns (Some(prefix), local) for "prefix:local"
/// Returns (None, name) for "name" without prefix
pub fn split_qname(qname: &str) -> (Option<&str>, &str) {
    match qname.find(':') {
        Some(pos) => (Some(&qname[..pos]), &qname[pos + 1..]),
        None => (None, qname),
    }
}

/// Checks if an attribute name is a namespace declaration.
pub fn is_xmlns_attr(name: &str) -> bool {
    name == "xmlns" || name.starts_with("xmlns:")
}

/// Resolves a prefix (None for the default namespace) to a namespace URI by
/// walking the node and its ancestors.
pub fn namespace_of_prefix(node: &NodeRef, prefix: Option<&str>) -> Option<String> {
    if prefix == Some("xml") {
        return Some(XML_NAMESPACE.to_string());
    }
    let mut current = Some(node.clone());
    while let Some(n) = current {
        let hit = match prefix {
            Some(p) => find_attr_value(&n, Some("xmlns"), p),
            None => find_attr_value(&n, None, "xmlns"),
        };
        if hit.is_some() {
            return hit;
        }
        current = n.borrow().parent();
    }
    None
}

/// Finds an in-scope prefix bound to the given namespace URI.
///
/// Returns `Some(None)` when the URI is the in-scope default namespace,
/// `Some(Some(prefix))` for a prefixed binding, `None` when the URI is not
/// bound at all. Inner bindings shadow outer ones.
pub fn prefix_of_namespace(node: &NodeRef, uri: &str) -> Option<Option<String>> {
    let mut seen: Vec<(Option<String>, String)> = Vec::new();
    let mut current = Some(node.clone());
    while let Some(n) = current {
        for child in n.borrow().children() {
            let c = child.borrow();
            if !c.is_attribute() {
                continue;
            }
            let binding = if c.prefix() == Some("xmlns") {
                Some((Some(c.name().to_string()), c.value().unwrap_or("").to_string()))
            } else if c.prefix().is_none() && c.name() == "xmlns" {
                Some((None, c.value().unwrap_or("").to_string()))
            } else {
                None
            };
            if let Some((p, u)) = binding {
                if !seen.iter().any(|(sp, _)| *sp == p) {
                    seen.push((p, u));
                }
            }
        }
        current = n.borrow().parent();
    }
    seen.iter()
        .find(|(_, u)| u == uri)
        .map(|(p, _)| p.clone())
}

/// Inserts an attribute before the first non-attribute child.
pub fn insert_attr(node: &NodeRef, attr: NodeRef) {
    let pos = node
        .borrow()
        .children()
        .iter()
        .position(|c| !c.borrow().is_attribute())
        .unwrap_or(node.borrow().child_count());
    XmlNode::insert_child_at(node, pos, attr);
}

/// Makes `uri` the effective default namespace of an element, injecting or
/// rewriting its local `xmlns` attribute as needed.
pub fn set_default_namespace(node: &NodeRef, uri: &str) {
    if namespace_of_prefix(node, None).as_deref() == Some(uri) {
        return;
    }
    let existing = node
        .borrow()
        .children()
        .iter()
        .find(|c| {
            let c = c.borrow();
            c.is_attribute() && c.prefix().is_none() && c.name() == "xmlns"
        })
        .cloned();
    match existing {
        Some(attr) => attr.borrow_mut().set_value(uri),
        None => insert_attr(node, XmlNode::new_attribute("xmlns", uri)),
    }
}

/// Binds a prefix to a URI on an element (`xmlns:prefix="uri"`).
pub fn add_namespace_binding(node: &NodeRef, prefix: &str, uri: &str) {
    let attr = XmlNode::new_attribute(prefix, uri);
    attr.borrow_mut().set_prefix(Some("xmlns".to_string()));
    insert_attr(node, attr);
}
