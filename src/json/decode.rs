//! JSON to XML translation (RFC 7951).
//!
//! Decoding runs in stages: parse the JSON text, build a provisional tree
//! whose member prefixes are module names, translate those module names to
//! default namespaces, bind the schema, rewrite identityref bodies into
//! prefixed XML form, then sort the whole tree into schema order.

use std::io::Read;

use serde_json::Value;
use tracing::debug;

use crate::engine::EngineOptions;
use crate::error::{Outcome, Result, RpcError};
use crate::resolve::bind_tree;
use crate::sort::sort_tree;
use crate::tree::namespace::{
    add_namespace_binding, prefix_of_namespace, set_default_namespace, split_qname,
};
use crate::tree::{body, element_children, set_body, NodeRef, XmlNode};
use crate::yang::{BaseType, Keyword, YangSpec};

/// Parses RFC 7951 JSON into a schema-bound, sorted XML tree.
///
/// The result is a synthetic `top` element holding the decoded top-level
/// members. Top-level member names must be module-qualified; syntax errors
/// and schema violations come back as an invalid outcome.
pub fn json_decode(spec: &YangSpec, text: &str, opts: &EngineOptions) -> Outcome<NodeRef> {
    let value: Value = serde_json::from_str(text).map_err(|e| {
        RpcError::malformed_message(&format!(
            "JSON parse error: line {} column {}: {}",
            e.line(),
            e.column(),
            e
        ))
    })?;
    let Value::Object(members) = value else {
        return Err(RpcError::malformed_message(
            "top-level JSON value is not an object",
        ));
    };

    let top = XmlNode::new_element("top");
    for (qname, v) in &members {
        // RFC 7951 section 4: top-level members MUST be module-qualified
        let (prefix, _) = split_qname(qname);
        if prefix.is_none() {
            return Err(RpcError::malformed_message(&format!(
                "Top-level JSON object {} is not qualified with namespace \
                 which is a MUST according to RFC 7951",
                qname
            )));
        }
        add_members(&top, qname, v)?;
    }

    xmlns_translate(spec, &top)?;
    bind_tree(spec, &top, opts)?;
    decode_bodies(spec, &top, opts)?;
    sort_tree(&top);
    Ok(top)
}

/// Reads and decodes JSON from a stream. I/O failures are fatal, everything
/// else follows [`json_decode`].
pub fn json_decode_reader<R: Read>(
    spec: &YangSpec,
    mut reader: R,
    opts: &EngineOptions,
) -> Result<Outcome<NodeRef>> {
    let mut text = String::new();
    reader.read_to_string(&mut text)?;
    Ok(json_decode(spec, &text, opts))
}

/// Adds the element(s) for one JSON member; an array member contributes one
/// element per item.
fn add_members(parent: &NodeRef, qname: &str, value: &Value) -> Outcome<()> {
    match value {
        Value::Array(items) => {
            for item in items {
                if item.is_array() {
                    return Err(RpcError::malformed_message(&format!(
                        "nested array in member {}",
                        qname
                    )));
                }
                let elem = new_member(parent, qname);
                fill_element(&elem, item)?;
            }
            Ok(())
        }
        _ => {
            let elem = new_member(parent, qname);
            fill_element(&elem, value)
        }
    }
}

fn new_member(parent: &NodeRef, qname: &str) -> NodeRef {
    let (prefix, local) = split_qname(qname);
    let elem = XmlNode::new_element(local);
    elem.borrow_mut().set_prefix(prefix.map(str::to_string));
    XmlNode::add_child_to_ref(parent, elem.clone());
    elem
}

fn fill_element(elem: &NodeRef, value: &Value) -> Outcome<()> {
    match value {
        // null is the empty-leaf marker: no body
        Value::Null => Ok(()),
        Value::Bool(b) => {
            XmlNode::add_child_to_ref(elem, XmlNode::new_body(b.to_string()));
            Ok(())
        }
        Value::Number(n) => {
            XmlNode::add_child_to_ref(elem, XmlNode::new_body(n.to_string()));
            Ok(())
        }
        Value::String(s) => {
            XmlNode::add_child_to_ref(elem, XmlNode::new_body(s.clone()));
            Ok(())
        }
        Value::Object(members) => {
            for (qname, v) in members {
                add_members(elem, qname, v)?;
            }
            Ok(())
        }
        Value::Array(_) => Err(RpcError::malformed_message("unexpected nested array")),
    }
}

/// Rewrites member prefixes (module names, per RFC 7951) into XML default
/// namespaces, recursively.
fn xmlns_translate(spec: &YangSpec, x: &NodeRef) -> Outcome<()> {
    let prefix = x.borrow().prefix().map(str::to_string);
    if let Some(modname) = prefix {
        let Some(ymod) = spec.find_module_by_name(&modname) else {
            return Err(RpcError::unknown_namespace(
                &modname,
                "No yang module found corresponding to prefix",
            ));
        };
        if let Some(namespace) = spec.namespace_of(&ymod) {
            set_default_namespace(x, &namespace);
            x.borrow_mut().set_prefix(None);
        }
    }
    for child in element_children(x) {
        xmlns_translate(spec, &child)?;
    }
    Ok(())
}

/// Walks a bound tree fixing up leaf bodies whose type needs it:
/// identityref values are rewritten into prefixed XML form, `empty` leaves
/// keep their bare marker.
fn decode_bodies(spec: &YangSpec, x: &NodeRef, opts: &EngineOptions) -> Outcome<()> {
    let spec_ref = x.borrow().spec();
    if let Some(y) = spec_ref {
        let keyword = y.borrow().keyword();
        if matches!(keyword, Keyword::Leaf | Keyword::LeafList) {
            let base = y.borrow().resolved_type().map(|t| t.base.clone());
            match base {
                Some(BaseType::Identityref) => decode_identityref(spec, x)?,
                Some(BaseType::Empty) => {
                    // nothing to do: the null marker became a bodyless leaf
                }
                _ => {}
            }
        }
    }
    for child in element_children(x) {
        decode_bodies(spec, &child, opts)?;
    }
    Ok(())
}

/// Decodes one identityref body `module:id`: resolves the module, finds or
/// injects a prefix for its namespace on the element, and rewrites the body
/// to `prefix:id` (bare `id` when the namespace is the in-scope default).
fn decode_identityref(spec: &YangSpec, x: &NodeRef) -> Outcome<()> {
    let Some(body_text) = body(x) else {
        return Ok(());
    };
    let (prefix, id) = split_qname(&body_text);
    let Some(modname) = prefix else {
        // unprefixed: stays under the enclosing module's default namespace
        return Ok(());
    };
    let Some(ymod) = spec.find_module_by_name(modname) else {
        return Err(RpcError::unknown_namespace(
            modname,
            "No module corresponding to prefix",
        ));
    };
    let Some(namespace) = spec.namespace_of(&ymod) else {
        return Ok(());
    };
    debug!(
        prefix = modname,
        body = %body_text,
        namespace = %namespace,
        "decoding identityref"
    );
    let target_prefix = match prefix_of_namespace(x, &namespace) {
        // already bound in scope, possibly as the default namespace
        Some(bound) => bound,
        None => {
            // bind the module's canonical prefix on this element
            let canonical = spec
                .prefix_of(&ymod)
                .unwrap_or_else(|| modname.to_string());
            add_namespace_binding(x, &canonical, &namespace);
            Some(canonical)
        }
    };
    let new_body = match &target_prefix {
        Some(p) => format!("{}:{}", p, id),
        None => id.to_string(),
    };
    set_body(x, &new_body);
    Ok(())
}
