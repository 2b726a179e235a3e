//! The engine handle: a shared schema plus the two behavior flags, with
//! convenience entry points over the free functions.

use std::rc::Rc;
use std::sync::Once;

use tracing::warn;

use crate::error::Outcome;
use crate::json::{json_decode, json_encode, JsonOptions};
use crate::resolve::bind_tree;
use crate::sort::sort_tree;
use crate::tree::NodeRef;
use crate::validate::{fill_defaults, validate_tree};
use crate::xml::parse_str;
use crate::yang::YangSpec;

/// Behavior flags consumed by the resolver and the JSON codec.
#[derive(Debug, Clone)]
pub struct EngineOptions {
    /// When set (the default), top-level resolution requires a namespace
    /// match; when cleared, a failed namespace lookup falls back to
    /// matching by name across all modules.
    pub ns_strict: bool,
    /// Opt-in compatibility path for identityref bodies whose prefix has no
    /// `xmlns` binding: the prefix is read as a module prefix instead.
    /// Deprecated, off by default.
    pub identityref_kludge: bool,
}

impl Default for EngineOptions {
    fn default() -> Self {
        EngineOptions {
            ns_strict: true,
            identityref_kludge: false,
        }
    }
}

static KLUDGE_WARNING: Once = Once::new();

/// A configuration data engine: one read-only [`YangSpec`] shared across
/// trees, plus the flags. Trees themselves stay caller-owned; the engine
/// holds no tree state.
pub struct Engine {
    spec: Rc<YangSpec>,
    options: EngineOptions,
}

impl Engine {
    pub fn new(spec: YangSpec) -> Self {
        Engine {
            spec: Rc::new(spec),
            options: EngineOptions::default(),
        }
    }

    pub fn with_options(spec: YangSpec, options: EngineOptions) -> Self {
        if options.identityref_kludge {
            KLUDGE_WARNING.call_once(|| {
                warn!("identityref-kludge is deprecated and will be removed");
            });
        }
        Engine {
            spec: Rc::new(spec),
            options,
        }
    }

    pub fn spec(&self) -> &YangSpec {
        &self.spec
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    /// Binds YANG statements to every element of a tree.
    pub fn bind(&self, root: &NodeRef) -> Outcome<()> {
        bind_tree(&self.spec, root, &self.options)
    }

    /// Sorts a whole tree into schema order.
    pub fn sort(&self, root: &NodeRef) {
        sort_tree(root)
    }

    /// Validates a bound tree against the schema.
    pub fn validate(&self, root: &NodeRef) -> Outcome<()> {
        validate_tree(root)
    }

    /// Fills in absent leaves that declare defaults.
    pub fn fill_defaults(&self, root: &NodeRef) {
        fill_defaults(root)
    }

    /// Parses XML, binds the schema and sorts: the full inbound XML path.
    pub fn xml_parse(&self, xml: &str) -> Outcome<NodeRef> {
        let top = parse_str(xml)?;
        bind_tree(&self.spec, &top, &self.options)?;
        sort_tree(&top);
        Ok(top)
    }

    /// Encodes a bound tree as RFC 7951 JSON.
    pub fn json_encode(&self, root: &NodeRef, opts: &JsonOptions) -> String {
        json_encode(&self.spec, root, opts, &self.options)
    }

    /// Decodes RFC 7951 JSON into a bound, sorted tree.
    pub fn json_decode(&self, text: &str) -> Outcome<NodeRef> {
        json_decode(&self.spec, text, &self.options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::{find_body, find_child};
    use crate::yang::{Keyword, YangRef, YangStmt};

    fn stmt(kw: Keyword, arg: &str, children: Vec<YangRef>) -> YangRef {
        let s = YangStmt::new(kw, arg);
        for c in children {
            YangStmt::add_child_to_ref(&s, c);
        }
        s
    }

    fn engine() -> Engine {
        let mut spec = YangSpec::new();
        spec.add_module(stmt(
            Keyword::Module,
            "test",
            vec![
                stmt(Keyword::Namespace, "urn:example:test", vec![]),
                stmt(Keyword::Prefix, "t", vec![]),
                stmt(
                    Keyword::Container,
                    "sys",
                    vec![stmt(
                        Keyword::Leaf,
                        "hostname",
                        vec![stmt(Keyword::Type, "string", vec![])],
                    )],
                ),
            ],
        ))
        .unwrap();
        Engine::new(spec)
    }

    #[test]
    fn test_defaults() {
        let e = engine();
        assert!(e.options().ns_strict);
        assert!(!e.options().identityref_kludge);
    }

    #[test]
    fn test_xml_parse_binds_and_sorts() {
        let e = engine();
        let top = e
            .xml_parse(r#"<sys xmlns="urn:example:test"><hostname>h</hostname></sys>"#)
            .unwrap();
        let sys = find_child(&top, "sys").unwrap();
        assert!(sys.borrow().spec().is_some());
        assert_eq!(find_body(&sys, "hostname").as_deref(), Some("h"));
    }

    #[test]
    fn test_json_through_engine() {
        let e = engine();
        let top = e.json_decode(r#"{"test:sys":{"hostname":"h"}}"#).unwrap();
        let sys = find_child(&top, "sys").unwrap();
        let json = e.json_encode(&sys, &JsonOptions::default());
        assert_eq!(json, r#"{"test:sys":{"hostname":"h"}}"#);
    }
}
