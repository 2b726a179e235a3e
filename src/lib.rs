//! yang-tree - schema-directed configuration data trees
//!
//! This library is the tree core of a NETCONF/RESTCONF-style configuration
//! stack: it represents configuration data as XML-shaped trees whose child
//! order, lookup keys and wire encodings are all dictated by a YANG schema
//! (RFC 7950).
//!
//! # Overview
//!
//! Three subsystems cooperate:
//!
//! - Ordering and lookup: a sibling comparator derived from YANG order
//!   indices and list keys, with stable sort, order verification, binary
//!   search, insert-position computation and a diff-pair matcher on top.
//! - An RFC 7951 JSON codec translating trees to and from NETCONF XML,
//!   including module-qualified member names, identityref re-encoding and
//!   CDATA-aware escaping.
//! - Typed leaf bodies: textual values parsed under their resolved YANG
//!   type (with `decimal64` fraction digits honored) and cached on the
//!   node, shared by the comparator and the codec.
//!
//! The schema itself is an input: the engine consumes an already-parsed
//! [`YangSpec`] and never parses YANG source. Trees are single-owner
//! mutable structures; the schema is read-only and shared.
//!
//! # Example
//!
//! ```
//! use yang_tree::{Engine, JsonOptions, Keyword, YangSpec, YangStmt};
//!
//! // schema: module "m" { container c { leaf x { type uint8; } } }
//! let module = YangStmt::new(Keyword::Module, "m");
//! YangStmt::add_child_to_ref(&module, YangStmt::new(Keyword::Namespace, "urn:m"));
//! YangStmt::add_child_to_ref(&module, YangStmt::new(Keyword::Prefix, "m"));
//! let c = YangStmt::new(Keyword::Container, "c");
//! let x = YangStmt::new(Keyword::Leaf, "x");
//! YangStmt::add_child_to_ref(&x, YangStmt::new(Keyword::Type, "uint8"));
//! YangStmt::add_child_to_ref(&c, x);
//! YangStmt::add_child_to_ref(&module, c);
//!
//! let mut spec = YangSpec::new();
//! spec.add_module(module).unwrap();
//! let engine = Engine::new(spec);
//!
//! let tree = engine.json_decode(r#"{"m:c":{"x":7}}"#).unwrap();
//! let c = yang_tree::tree::find_child(&tree, "c").unwrap();
//! assert_eq!(engine.json_encode(&c, &JsonOptions::default()), r#"{"m:c":{"x":7}}"#);
//! ```

pub mod engine;
pub mod error;
pub mod json;
pub mod resolve;
pub mod search;
pub mod sort;
pub mod tree;
pub mod validate;
pub mod xml;
pub mod yang;

// Re-export commonly used types
pub use engine::{Engine, EngineOptions};
pub use error::{Error, ErrorTag, ErrorType, Outcome, Result, RpcError, RpcErrorInfo};
pub use json::{json_decode, json_encode, JsonOptions};
pub use resolve::{bind_tree, child_spec};
pub use search::{insert_child, insert_pos, match_base_child, match_child, search, SearchKey};
pub use sort::{cmp_siblings, sort_children, sort_tree, verify_sorted};
pub use tree::{NodeKind, NodeRef, Walk, XmlNode};
pub use validate::{fill_defaults, validate_tree};
pub use xml::{parse_str, print_to_string, print_to_string_pretty};
pub use yang::{
    BaseType, Decimal64, Keyword, ResolvedType, StmtFlags, TypedValue, YangRef, YangSpec, YangStmt,
};
