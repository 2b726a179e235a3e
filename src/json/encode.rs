//! XML to JSON translation (RFC 7951).

use tracing::debug;

use super::JsonOptions;
use crate::engine::EngineOptions;
use crate::tree::namespace::{namespace_of_prefix, split_qname};
use crate::tree::NodeRef;
use crate::yang::{module_name, BaseType, Keyword, YangRef, YangSpec};
use std::rc::Rc;

/// Position of an element among its same-name, same-namespace siblings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ArrayPos {
    /// Not part of an array.
    No,
    /// First element of a run: opens `[`.
    First,
    /// Interior element of a run.
    Middle,
    /// Final element of a run: closes `]`.
    Last,
    /// A `list` instance with no same-name neighbours: one-element array.
    Single,
    /// A body node, printed as a value.
    Body,
}

/// Shape of an element's non-attribute children.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ChildKind {
    /// No children: `null`, `[null]` or `{}` depending on the statement.
    Null,
    /// Exactly one body child: a scalar value.
    Body,
    /// Anything else: an object.
    Any,
}

fn child_kind(x: &NodeRef) -> ChildKind {
    let n = x.borrow();
    let mut count = 0;
    let mut only_body = false;
    for c in n.children() {
        let c = c.borrow();
        if c.is_attribute() {
            continue;
        }
        count += 1;
        only_body = c.is_body();
    }
    match count {
        0 => ChildKind::Null,
        1 if only_body => ChildKind::Body,
        _ => ChildKind::Any,
    }
}

fn effective_namespace(x: &NodeRef) -> Option<String> {
    let prefix = x.borrow().prefix().map(str::to_string);
    namespace_of_prefix(x, prefix.as_deref())
}

/// Classifies an element's array position from its immediate neighbours.
/// Same name and same effective namespace make two siblings part of one
/// run; a lone `list` instance still becomes a one-element array.
fn array_eval(prev: Option<&NodeRef>, x: &NodeRef, next: Option<&NodeRef>) -> ArrayPos {
    if !x.borrow().is_element() {
        return ArrayPos::Body;
    }
    let name = x.borrow().name().to_string();
    let ns = effective_namespace(x);
    let same_run = |other: &&NodeRef| -> bool {
        let o = other.borrow();
        if !o.is_element() || o.name() != name {
            return false;
        }
        drop(o);
        effective_namespace(other) == ns
    };
    let eqprev = prev.as_ref().map_or(false, same_run);
    let eqnext = next.as_ref().map_or(false, same_run);
    match (eqprev, eqnext) {
        (true, true) => ArrayPos::Middle,
        (true, false) => ArrayPos::Last,
        (false, true) => ArrayPos::First,
        (false, false) => {
            let is_list = x
                .borrow()
                .spec()
                .map_or(false, |y| y.borrow().keyword() == Keyword::List);
            if is_list {
                ArrayPos::Single
            } else {
                ArrayPos::No
            }
        }
    }
}

/// Translates a tree to a JSON object `{ <member> }` where the tree's root
/// element is the (module-qualified) top-level member.
pub fn json_encode(
    spec: &YangSpec,
    x: &NodeRef,
    opts: &JsonOptions,
    engine_opts: &EngineOptions,
) -> String {
    let mut out = String::new();
    let nl = if opts.pretty { "\n" } else { "" };
    out.push('{');
    out.push_str(nl);
    encode_node(&mut out, spec, x, ArrayPos::No, 1, opts, engine_opts, None);
    out.push_str(nl);
    out.push('}');
    out.push_str(nl);
    out
}

fn indent(opts: &JsonOptions, level: usize) -> String {
    if opts.pretty {
        " ".repeat(opts.indent * level)
    } else {
        String::new()
    }
}

/// The emission matrix: one call per node, dispatching on (array position,
/// child kind). `ancestor_module` is the module of the nearest qualified
/// ancestor; the member name is qualified exactly when it differs.
#[allow(clippy::too_many_arguments)]
fn encode_node(
    out: &mut String,
    spec: &YangSpec,
    x: &NodeRef,
    array: ArrayPos,
    level: usize,
    opts: &JsonOptions,
    engine_opts: &EngineOptions,
    ancestor_module: Option<&str>,
) {
    let mut level = level;
    let nl = if opts.pretty { "\n" } else { "" };
    let sp = if opts.pretty { " " } else { "" };

    let ys = x.borrow().spec();
    let mut qualifier: Option<String> = None;
    let mut child_ancestor: Option<String> = ancestor_module.map(str::to_string);
    if let Some(ys) = &ys {
        if let Some(modname) = module_name(ys) {
            if ancestor_module != Some(modname.as_str()) {
                qualifier = Some(modname.clone());
            }
            child_ancestor = Some(modname);
        }
    }
    let childt = child_kind(x);

    match array {
        ArrayPos::Body => {
            // the only place a value is printed
            encode_body(out, spec, x, engine_opts);
            return;
        }
        ArrayPos::No => {
            out.push_str(&indent(opts, level));
            out.push('"');
            if let Some(m) = &qualifier {
                out.push_str(m);
                out.push(':');
            }
            out.push_str(x.borrow().name());
            out.push_str("\":");
            out.push_str(sp);
            match childt {
                ChildKind::Null => {
                    // a childless container is {}, a childless leaf or
                    // leaf-list is the empty-type marker [null]
                    let keyword = ys.as_ref().map(|y| y.borrow().keyword());
                    match keyword {
                        Some(Keyword::Container) => out.push_str("{}"),
                        Some(Keyword::Leaf) | Some(Keyword::LeafList) => out.push_str("[null]"),
                        _ => out.push_str("null"),
                    }
                }
                ChildKind::Body => {}
                ChildKind::Any => {
                    out.push('{');
                    out.push_str(nl);
                }
            }
        }
        ArrayPos::First | ArrayPos::Single => {
            out.push_str(&indent(opts, level));
            out.push('"');
            if let Some(m) = &qualifier {
                out.push_str(m);
                out.push(':');
            }
            out.push_str(x.borrow().name());
            out.push_str("\":");
            out.push_str(sp);
            level += 1;
            out.push('[');
            out.push_str(nl);
            out.push_str(&indent(opts, level));
            match childt {
                ChildKind::Null => out.push_str("null"),
                ChildKind::Body => {}
                ChildKind::Any => {
                    out.push('{');
                    out.push_str(nl);
                }
            }
        }
        ArrayPos::Middle | ArrayPos::Last => {
            level += 1;
            out.push_str(&indent(opts, level));
            match childt {
                ChildKind::Null => out.push_str("null"),
                ChildKind::Body => {}
                ChildKind::Any => {
                    out.push('{');
                    out.push_str(nl);
                }
            }
        }
    }

    // children, attributes excepted, with commas between them
    let children: Vec<NodeRef> = x
        .borrow()
        .children()
        .iter()
        .filter(|c| !c.borrow().is_attribute())
        .cloned()
        .collect();
    let mut commas = children.len().saturating_sub(1);
    for (i, xc) in children.iter().enumerate() {
        let prev = if i > 0 { children.get(i - 1) } else { None };
        let xc_array = array_eval(prev, xc, children.get(i + 1));
        encode_node(
            out,
            spec,
            xc,
            xc_array,
            level + 1,
            opts,
            engine_opts,
            child_ancestor.as_deref(),
        );
        if commas > 0 {
            out.push(',');
            out.push_str(nl);
            commas -= 1;
        }
    }

    match array {
        ArrayPos::Body => {}
        ArrayPos::No => {
            if childt == ChildKind::Any {
                out.push_str(nl);
                out.push_str(&indent(opts, level));
                out.push('}');
            }
        }
        ArrayPos::First | ArrayPos::Middle => {
            if childt == ChildKind::Any {
                out.push_str(nl);
                out.push_str(&indent(opts, level));
                out.push('}');
            }
        }
        ArrayPos::Single | ArrayPos::Last => {
            match childt {
                ChildKind::Null | ChildKind::Body => {
                    out.push_str(nl);
                }
                ChildKind::Any => {
                    out.push_str(nl);
                    out.push_str(&indent(opts, level));
                    out.push('}');
                    out.push_str(nl);
                    level -= 1;
                }
            }
            out.push_str(&indent(opts, level));
            out.push(']');
        }
    }
}

/// Prints one body value, quoted or not per the JSON kind of the parent
/// leaf's resolved type. Identityref values are re-qualified with module
/// names; everything else passes through the CDATA-aware escaper.
fn encode_body(out: &mut String, spec: &YangSpec, xb: &NodeRef, engine_opts: &EngineOptions) {
    let body_text = {
        let n = xb.borrow();
        n.value().unwrap_or("").to_string()
    };
    let parent = xb.borrow().parent();
    let yp = parent.as_ref().and_then(|p| p.borrow().spec());

    let mut quote = true;
    let mut value = body_text.clone();
    if let Some(yp) = &yp {
        let keyword = yp.borrow().keyword();
        if matches!(keyword, Keyword::Leaf | Keyword::LeafList) {
            let resolved = yp.borrow().resolved_type().cloned();
            if let Some(ty) = resolved {
                if ty.base == BaseType::Identityref {
                    value = encode_identityref(spec, xb, &body_text, yp, engine_opts);
                } else if ty.base.json_unquoted() {
                    quote = false;
                }
            }
        }
    }
    if quote {
        out.push('"');
        escape_json_cdata(out, &value);
        out.push('"');
    } else {
        out.push_str(&value);
    }
}

/// Rewrites an identityref body `prefix:id` to `module:id` form, dropping
/// the module when it is the leaf's own. The kludge flag tolerates inputs
/// whose prefix has no `xmlns` binding by reading it as a module prefix.
fn encode_identityref(
    spec: &YangSpec,
    xb: &NodeRef,
    body: &str,
    yp: &YangRef,
    engine_opts: &EngineOptions,
) -> String {
    let (prefix, id) = split_qname(body);
    let namespace = namespace_of_prefix(xb, prefix);
    debug!(body, namespace = namespace.as_deref(), "encoding identityref");
    match namespace {
        Some(ns) => match spec.find_module_by_namespace(&ns) {
            Some(ymod) => {
                let same_module = yp
                    .borrow()
                    .module()
                    .map_or(false, |my| Rc::ptr_eq(&my, &ymod));
                if same_module {
                    id.to_string()
                } else {
                    format!("{}:{}", ymod.borrow().argument(), id)
                }
            }
            None => id.to_string(),
        },
        None => {
            if engine_opts.identityref_kludge {
                if let Some(p) = prefix {
                    if let Some(ymod) = spec.find_module_by_prefix(p) {
                        return format!("{}:{}", ymod.borrow().argument(), id);
                    }
                }
            }
            id.to_string()
        }
    }
}

/// JSON string escaping with XML CDATA sections unwrapped on the fly.
fn escape_json_cdata(out: &mut String, s: &str) {
    let mut in_cdata = false;
    let mut i = 0;
    while i < s.len() {
        if !in_cdata && s[i..].starts_with("<![CDATA[") {
            in_cdata = true;
            i += "<![CDATA[".len();
            continue;
        }
        if in_cdata && s[i..].starts_with("]]>") {
            in_cdata = false;
            i += "]]>".len();
            continue;
        }
        let Some(c) = s[i..].chars().next() else { break };
        match c {
            '\n' => out.push_str("\\n"),
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x20 => {
                out.push_str(&format!("\\u{:04x}", c as u32));
            }
            c => out.push(c),
        }
        i += c.len_utf8();
    }
}
