//! XML parsing and output.
//!
//! The parser builds [`crate::tree::NodeRef`] trees from quick-xml's
//! streaming events; the printer writes them back out, optionally
//! pretty-printed. Namespace declarations are kept as ordinary attribute
//! children so the tree-walking namespace primitives see them.

mod parser;
mod printer;

pub use parser::{parse_reader, parse_str};
pub use printer::{print_to_string, print_to_string_pretty, XmlPrintOptions};
