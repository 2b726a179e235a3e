//! Schema resolution: binding XML elements to the YANG statements that
//! govern them.
//!
//! Resolution of a child element works top down: under a bound parent the
//! parent's data-node children are searched (an `rpc` parent re-enters its
//! `input` block); at the top of a tree the element's namespace selects the
//! module. A resolved `rpc` statement immediately descends into `input`,
//! since the payload elements of an operation live there.

use tracing::{debug, warn};

use crate::engine::EngineOptions;
use crate::error::{Outcome, RpcError};
use crate::tree::namespace::namespace_of_prefix;
use crate::tree::NodeRef;
use crate::yang::{find_datanode, find_schemanode, Keyword, YangRef, YangSpec};

/// Resolves the YANG statement governing element `child` under `parent`
/// (absent for top-level elements). Returns None when no statement matches.
pub fn child_spec(
    spec: &YangSpec,
    child: &NodeRef,
    parent: Option<&NodeRef>,
    opts: &EngineOptions,
) -> Option<YangRef> {
    let name = child.borrow().name().to_string();
    let parent_spec = parent.and_then(|p| p.borrow().spec());

    let mut y = match parent_spec {
        Some(yp) => {
            if yp.borrow().keyword() == Keyword::Rpc {
                yp.borrow()
                    .find_child(Keyword::Input)
                    .and_then(|yi| find_datanode(&yi, &name))
            } else {
                find_datanode(&yp, &name)
            }
        }
        None => {
            let prefix = child.borrow().prefix().map(str::to_string);
            let namespace = namespace_of_prefix(child, prefix.as_deref());
            let mut found = namespace
                .as_deref()
                .and_then(|ns| spec.find_module_by_namespace(ns))
                .and_then(|m| find_schemanode(&m, &name));
            if found.is_none() && !opts.ns_strict {
                found = find_any_module(spec, &name);
            }
            found
        }
    };

    // rpc resolves through to its input block
    if let Some(stmt) = &y {
        let is_rpc = stmt.borrow().keyword() == Keyword::Rpc;
        let input = if is_rpc {
            stmt.borrow().find_child(Keyword::Input)
        } else {
            None
        };
        if let Some(input) = input {
            y = Some(input);
        }
    }
    y
}

/// Non-strict fallback: match a top-level name in any module. A name
/// defined by several modules is ambiguous; the first match wins but the
/// collision is reported loudly.
fn find_any_module(spec: &YangSpec, name: &str) -> Option<YangRef> {
    let mut hits: Vec<(String, YangRef)> = Vec::new();
    for module in spec.modules() {
        if let Some(y) = find_schemanode(module, name) {
            hits.push((module.borrow().argument().to_string(), y));
        }
    }
    if hits.len() > 1 {
        let names: Vec<&str> = hits.iter().map(|(m, _)| m.as_str()).collect();
        warn!(
            element = name,
            modules = %names.join(", "),
            "non-strict namespace lookup is ambiguous, using first match"
        );
    }
    if !hits.is_empty() {
        debug!(element = name, "resolved via non-strict namespace fallback");
    }
    hits.into_iter().next().map(|(_, y)| y)
}

/// Binds YANG statements to every element below `root` (exclusive).
///
/// `root` itself may be bound or a synthetic container; either way its
/// element children resolve against it. An element no statement governs
/// yields an `unknown-element` report.
pub fn bind_tree(spec: &YangSpec, root: &NodeRef, opts: &EngineOptions) -> Outcome<()> {
    let children = crate::tree::element_children(root);
    for child in &children {
        match child_spec(spec, child, Some(root), opts) {
            Some(y) => child.borrow_mut().set_spec(Some(y)),
            None => {
                let name = child.borrow().name().to_string();
                return Err(RpcError::unknown_element(&name));
            }
        }
        bind_tree(spec, child, opts)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::XmlNode;
    use crate::yang::{Keyword, YangStmt};
    use std::rc::Rc;

    fn stmt(kw: Keyword, arg: &str, children: Vec<YangRef>) -> YangRef {
        let s = YangStmt::new(kw, arg);
        for c in children {
            YangStmt::add_child_to_ref(&s, c);
        }
        s
    }

    fn spec_with_rpc() -> YangSpec {
        let m = stmt(
            Keyword::Module,
            "conf-example",
            vec![
                stmt(Keyword::Namespace, "urn:example:conf", vec![]),
                stmt(Keyword::Prefix, "ex", vec![]),
                stmt(
                    Keyword::Container,
                    "state",
                    vec![stmt(
                        Keyword::Leaf,
                        "op",
                        vec![stmt(Keyword::Type, "string", vec![])],
                    )],
                ),
                stmt(
                    Keyword::Rpc,
                    "example",
                    vec![stmt(
                        Keyword::Input,
                        "",
                        vec![stmt(
                            Keyword::Leaf,
                            "x",
                            vec![stmt(Keyword::Type, "uint32", vec![])],
                        )],
                    )],
                ),
            ],
        );
        let mut spec = YangSpec::new();
        spec.add_module(m).unwrap();
        spec
    }

    #[test]
    fn test_resolve_top_level_by_namespace() {
        let spec = spec_with_rpc();
        let opts = EngineOptions::default();
        let e = XmlNode::new_element("state");
        XmlNode::add_child_to_ref(&e, XmlNode::new_attribute("xmlns", "urn:example:conf"));

        let y = child_spec(&spec, &e, None, &opts).unwrap();
        assert_eq!(y.borrow().keyword(), Keyword::Container);
        assert_eq!(y.borrow().argument(), "state");
    }

    #[test]
    fn test_rpc_resolves_to_input() {
        let spec = spec_with_rpc();
        let opts = EngineOptions::default();
        let e = XmlNode::new_element("example");
        XmlNode::add_child_to_ref(&e, XmlNode::new_attribute("xmlns", "urn:example:conf"));

        let y = child_spec(&spec, &e, None, &opts).unwrap();
        assert_eq!(y.borrow().keyword(), Keyword::Input);

        // its children resolve against the input block
        e.borrow_mut().set_spec(Some(y));
        let x = XmlNode::new_element("x");
        XmlNode::add_child_to_ref(&e, x.clone());
        let yx = child_spec(&spec, &x, Some(&e), &opts).unwrap();
        assert_eq!(yx.borrow().argument(), "x");
    }

    #[test]
    fn test_strict_namespace_miss() {
        let spec = spec_with_rpc();
        let opts = EngineOptions::default();
        let e = XmlNode::new_element("state");
        XmlNode::add_child_to_ref(&e, XmlNode::new_attribute("xmlns", "urn:example:other"));
        assert!(child_spec(&spec, &e, None, &opts).is_none());
    }

    #[test]
    fn test_non_strict_fallback() {
        let spec = spec_with_rpc();
        let opts = EngineOptions {
            ns_strict: false,
            ..Default::default()
        };
        // no namespace at all, resolved by bare name
        let e = XmlNode::new_element("state");
        let y = child_spec(&spec, &e, None, &opts).unwrap();
        assert_eq!(y.borrow().argument(), "state");
    }

    #[test]
    fn test_bind_tree() {
        let spec = spec_with_rpc();
        let opts = EngineOptions::default();
        let top = XmlNode::new_element("top");
        let state = XmlNode::new_element("state");
        XmlNode::add_child_to_ref(
            &state,
            XmlNode::new_attribute("xmlns", "urn:example:conf"),
        );
        let op = XmlNode::new_element("op");
        XmlNode::add_child_to_ref(&op, XmlNode::new_body("noop"));
        XmlNode::add_child_to_ref(&state, op.clone());
        XmlNode::add_child_to_ref(&top, state.clone());

        bind_tree(&spec, &top, &opts).unwrap();
        assert!(state.borrow().spec().is_some());
        assert_eq!(op.borrow().spec().unwrap().borrow().argument(), "op");
    }

    #[test]
    fn test_bind_unknown_element() {
        let spec = spec_with_rpc();
        let top = XmlNode::new_element("top");
        let state = XmlNode::new_element("state");
        XmlNode::add_child_to_ref(
            &state,
            XmlNode::new_attribute("xmlns", "urn:example:conf"),
        );
        XmlNode::add_child_to_ref(&state, XmlNode::new_element("bogus"));
        XmlNode::add_child_to_ref(&top, state);

        let err = bind_tree(&spec, &top, &EngineOptions::default()).unwrap_err();
        assert_eq!(err.tag, crate::error::ErrorTag::UnknownElement);
        assert_eq!(err.info.bad_element.as_deref(), Some("bogus"));
    }

    #[test]
    fn test_same_statement_instances_share_rc() {
        let spec = spec_with_rpc();
        let opts = EngineOptions::default();
        let top = XmlNode::new_element("top");
        for _ in 0..2 {
            let e = XmlNode::new_element("state");
            XmlNode::add_child_to_ref(
                &e,
                XmlNode::new_attribute("xmlns", "urn:example:conf"),
            );
            XmlNode::add_child_to_ref(&top, e);
        }
        bind_tree(&spec, &top, &opts).unwrap();
        let kids = crate::tree::element_children(&top);
        let y0 = kids[0].borrow().spec().unwrap();
        let y1 = kids[1].borrow().spec().unwrap();
        assert!(Rc::ptr_eq(&y0, &y1));
    }
}
