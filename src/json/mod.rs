//! RFC 7951 JSON encoding of YANG-modeled XML trees, both directions.
//!
//! The encoder classifies every element by its position in a same-name
//! sibling run and by the shape of its children, then emits the matching
//! JSON production; member names are module-qualified exactly where the
//! resolved module changes. The decoder parses JSON, re-interprets member
//! prefixes as module names, binds the schema and re-sorts the tree.

mod decode;
mod encode;

pub use decode::{json_decode, json_decode_reader};
pub use encode::json_encode;

/// Options for JSON output.
#[derive(Debug, Clone)]
pub struct JsonOptions {
    /// Whether to pretty-print.
    pub pretty: bool,
    /// Indent width per level when pretty-printing.
    pub indent: usize,
}

impl Default for JsonOptions {
    fn default() -> Self {
        JsonOptions {
            pretty: false,
            indent: 2,
        }
    }
}
