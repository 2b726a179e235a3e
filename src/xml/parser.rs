//! XML parser that builds node trees.
//!
//! Uses quick-xml's streaming API. Element attributes become attribute
//! children (namespace declarations included); text and CDATA become body
//! children. Whitespace-only text between elements is dropped; CDATA
//! sections keep their markers in the body so the JSON encoder can unwrap
//! them later.

use std::io::BufRead;

use quick_xml::escape::unescape;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::error::{Outcome, Result, RpcError};
use crate::tree::namespace::split_qname;
use crate::tree::{NodeRef, XmlNode};

/// Parses XML from a string.
///
/// Returns a synthetic `top` element containing the document's root
/// element(s); NETCONF message content is often a fragment list, so more
/// than one root is accepted. Well-formedness errors come back as an
/// invalid outcome with a `malformed-message` report.
pub fn parse_str(xml: &str) -> Outcome<NodeRef> {
    let mut reader = Reader::from_str(xml);
    parse_events(&mut reader)
}

/// Parses XML from a buffered reader. The only I/O-blocking entry point;
/// I/O failures are fatal, syntax failures are an invalid outcome.
pub fn parse_reader<R: BufRead>(reader: R) -> Result<Outcome<NodeRef>> {
    let mut reader = Reader::from_reader(reader);
    Ok(parse_events(&mut reader))
}

fn parse_events<R: BufRead>(reader: &mut Reader<R>) -> Outcome<NodeRef> {
    let top = XmlNode::new_element("top");
    let mut node_stack: Vec<NodeRef> = vec![top.clone()];
    let mut current_text: Option<String> = None;
    let mut has_cdata = false;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => {
                flush_text(&node_stack, &mut current_text, &mut has_cdata);
                let node = parse_element(e, reader)?;
                if let Some(parent) = node_stack.last() {
                    XmlNode::add_child_to_ref(parent, node.clone());
                }
                node_stack.push(node);
            }
            Ok(Event::Empty(ref e)) => {
                flush_text(&node_stack, &mut current_text, &mut has_cdata);
                let node = parse_element(e, reader)?;
                if let Some(parent) = node_stack.last() {
                    XmlNode::add_child_to_ref(parent, node);
                }
            }
            Ok(Event::End(_)) => {
                flush_text(&node_stack, &mut current_text, &mut has_cdata);
                if node_stack.len() > 1 {
                    node_stack.pop();
                }
            }
            Ok(Event::Text(e)) => {
                let raw = std::str::from_utf8(e.as_ref())
                    .map_err(|e| malformed(reader, &e.to_string()))?;
                let text =
                    unescape(raw).map_err(|e| malformed(reader, &e.to_string()))?;
                append_text(&mut current_text, &text);
            }
            Ok(Event::CData(ref e)) => {
                // Keep the markers: bodies carry CDATA through to the codec.
                let text = String::from_utf8_lossy(e.as_ref());
                append_text(
                    &mut current_text,
                    &format!("<![CDATA[{}]]>", text),
                );
                has_cdata = true;
            }
            Ok(Event::Eof) => break,
            Ok(Event::Comment(_))
            | Ok(Event::PI(_))
            | Ok(Event::Decl(_))
            | Ok(Event::DocType(_)) => {
                // Not on the hot path: comments, PIs and declarations are dropped.
            }
            Err(e) => return Err(malformed(reader, &e.to_string())),
        }
        buf.clear();
    }

    Ok(top)
}

fn malformed<R>(reader: &Reader<R>, message: &str) -> RpcError {
    RpcError::malformed_message(&format!(
        "XML parse error at position {}: {}",
        reader.buffer_position(),
        message
    ))
}

fn append_text(current: &mut Option<String>, text: &str) {
    match current {
        Some(existing) => existing.push_str(text),
        None => *current = Some(text.to_string()),
    }
}

/// Flushes accumulated text as a body child of the innermost open element.
/// Whitespace-only runs between elements are dropped, CDATA is kept intact.
fn flush_text(node_stack: &[NodeRef], current: &mut Option<String>, has_cdata: &mut bool) {
    let Some(text) = current.take() else {
        return;
    };
    let store = if *has_cdata {
        text
    } else {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return;
        }
        trimmed.to_string()
    };
    *has_cdata = false;
    if let Some(parent) = node_stack.last() {
        XmlNode::add_child_to_ref(parent, XmlNode::new_body(store));
    }
}

/// Parses an element's name and attributes into an element node.
fn parse_element<R>(e: &BytesStart, reader: &Reader<R>) -> Outcome<NodeRef> {
    let qname = reader
        .decoder()
        .decode(e.name().as_ref())
        .map_err(|e| RpcError::malformed_message(&e.to_string()))?
        .to_string();
    let (prefix, local) = split_qname(&qname);
    let node = XmlNode::new_element(local);
    node.borrow_mut().set_prefix(prefix.map(str::to_string));

    for attr_result in e.attributes() {
        let attr = attr_result.map_err(|e| {
            RpcError::malformed_message(&format!("attribute error: {}", e))
        })?;
        let key = reader
            .decoder()
            .decode(attr.key.as_ref())
            .map_err(|e| RpcError::malformed_message(&e.to_string()))?
            .to_string();
        let value = attr
            .unescape_value()
            .map_err(|e| RpcError::malformed_message(&e.to_string()))?
            .to_string();
        let (aprefix, aname) = split_qname(&key);
        let attr_node = XmlNode::new_attribute(aname, value);
        attr_node
            .borrow_mut()
            .set_prefix(aprefix.map(str::to_string));
        XmlNode::add_child_to_ref(&node, attr_node);
    }
    Ok(node)
}
