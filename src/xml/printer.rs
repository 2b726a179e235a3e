//! XML printer that outputs node trees.

use crate::tree::{NodeKind, NodeRef};

/// Options for XML printing.
#[derive(Debug, Clone, Default)]
pub struct XmlPrintOptions {
    /// Whether to pretty-print with two-space indentation.
    pub pretty: bool,
}

/// Prints a node tree to a string.
pub fn print_to_string(root: &NodeRef) -> String {
    let mut out = String::new();
    print_node(&mut out, root, 0, &XmlPrintOptions::default());
    out
}

/// Prints a node tree to a string with pretty printing.
pub fn print_to_string_pretty(root: &NodeRef) -> String {
    let mut out = String::new();
    print_node(
        &mut out,
        root,
        0,
        &XmlPrintOptions { pretty: true },
    );
    out
}

fn print_node(out: &mut String, node: &NodeRef, level: usize, opts: &XmlPrintOptions) {
    let n = node.borrow();
    match n.kind() {
        NodeKind::Body { value } => {
            escape_body(out, value);
        }
        NodeKind::Attribute { .. } => {
            // printed in the element head, never standalone
        }
        NodeKind::Element { children, .. } => {
            if opts.pretty {
                out.push_str(&"  ".repeat(level));
            }
            out.push('<');
            out.push_str(&n.qualified_name());
            for child in children {
                let c = child.borrow();
                if c.is_attribute() {
                    out.push(' ');
                    out.push_str(&c.qualified_name());
                    out.push_str("=\"");
                    escape_attr(out, c.value().unwrap_or(""));
                    out.push('"');
                }
            }
            let body_children: Vec<&NodeRef> =
                children.iter().filter(|c| !c.borrow().is_attribute()).collect();
            if body_children.is_empty() {
                out.push_str("/>");
                if opts.pretty {
                    out.push('\n');
                }
                return;
            }
            out.push('>');
            // Elements with body content print inline; element-only content
            // gets one child per line when pretty printing.
            let inline = body_children.iter().any(|c| c.borrow().is_body());
            if opts.pretty && !inline {
                out.push('\n');
            }
            for child in &body_children {
                if inline {
                    print_node(out, child, 0, &XmlPrintOptions { pretty: false });
                } else {
                    print_node(out, child, level + 1, opts);
                }
            }
            if opts.pretty && !inline {
                out.push_str(&"  ".repeat(level));
            }
            out.push_str("</");
            out.push_str(&n.qualified_name());
            out.push('>');
            if opts.pretty {
                out.push('\n');
            }
        }
    }
}

/// Converts special characters to XML entities.
fn escape_attr(out: &mut String, s: &str) {
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\'' => out.push_str("&apos;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
}

/// Escapes body text, passing CDATA sections through verbatim.
fn escape_body(out: &mut String, s: &str) {
    let mut rest = s;
    while let Some(start) = rest.find("<![CDATA[") {
        escape_attr(out, &rest[..start]);
        let after = &rest[start..];
        match after.find("]]>") {
            Some(end) => {
                out.push_str(&after[..end + 3]);
                rest = &after[end + 3..];
            }
            None => {
                // unterminated section: escape the remainder
                escape_attr(out, after);
                return;
            }
        }
    }
    escape_attr(out, rest);
}
