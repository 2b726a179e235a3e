//! Schema-directed ordering of sibling elements.
//!
//! The sibling comparator is the single source of truth for child order:
//! sort, binary search and insert-position all agree with it. It is a total
//! function over any pair of siblings; nodes it cannot judge (unbound,
//! state data, `ordered-by user`) compare equal so a stable sort leaves
//! them in arrival order.

use std::cmp::Ordering;
use std::rc::Rc;

use crate::tree::{body, find_body, typed_value, NodeKind, NodeRef, Walk};
use crate::yang::Keyword;

/// Compares two sibling elements of a bound parent.
///
/// Rules, in order: unbound nodes compare equal; different statements
/// compare by YANG order index; state data and `ordered-by user` pin
/// arrival order; `leaf-list` instances compare by typed body value with a
/// missing body first; `list` instances compare by their key bodies in
/// declared order; anything else is equal.
pub fn cmp_siblings(a: &NodeRef, b: &NodeRef) -> Ordering {
    let ya = a.borrow().spec();
    let yb = b.borrow().spec();
    let (ya, yb) = match (ya, yb) {
        (Some(ya), Some(yb)) => (ya, yb),
        _ => return Ordering::Equal,
    };
    if !Rc::ptr_eq(&ya, &yb) {
        let oa = ya.borrow().order();
        let ob = yb.borrow().order();
        return oa.cmp(&ob);
    }
    // same statement: can only be list or leaf-list instances
    let (keyword, pinned, keys) = {
        let y = ya.borrow();
        (
            y.keyword(),
            !y.is_config() || y.is_user_ordered(),
            y.keys().to_vec(),
        )
    };
    if pinned {
        return Ordering::Equal;
    }
    match keyword {
        Keyword::LeafList => match (body(a), body(b)) {
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Less,
            (Some(_), None) => Ordering::Greater,
            (Some(ba), Some(bb)) => match (typed_value(a), typed_value(b)) {
                (Some(va), Some(vb)) => va.cmp_value(&vb),
                // unparseable body: raw bytes keep the order total
                _ => ba.cmp(&bb),
            },
        },
        Keyword::List => {
            for key in &keys {
                let ord = match (find_body(a, key), find_body(b, key)) {
                    (None, None) => Ordering::Equal,
                    (None, Some(_)) => Ordering::Less,
                    (Some(_), None) => Ordering::Greater,
                    (Some(ka), Some(kb)) => ka.cmp(&kb),
                };
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            Ordering::Equal
        }
        _ => Ordering::Equal,
    }
}

/// Sorts an element's element children with the sibling comparator.
///
/// State-data elements are left untouched (arrival order is authoritative
/// for them). Attribute and body children keep their positions; only the
/// element slots are rewritten. The sort is stable, so ties keep insertion
/// order. Not recursive; see [`sort_tree`].
pub fn sort_children(x: &NodeRef) {
    if let Some(y) = x.borrow().spec() {
        if !y.borrow().is_config() {
            return;
        }
    }
    let slots: Vec<usize>;
    let mut elems: Vec<NodeRef>;
    {
        let n = x.borrow();
        let pairs: Vec<(usize, NodeRef)> = n
            .children()
            .iter()
            .enumerate()
            .filter(|(_, c)| c.borrow().is_element())
            .map(|(i, c)| (i, c.clone()))
            .collect();
        slots = pairs.iter().map(|(i, _)| *i).collect();
        elems = pairs.into_iter().map(|(_, c)| c).collect();
    }
    elems.sort_by(cmp_siblings);
    if let NodeKind::Element { children, .. } = x.borrow_mut().kind_mut() {
        for (slot, node) in slots.into_iter().zip(elems) {
            children[slot] = node;
        }
    }
}

/// Sorts every element of a tree, top down. State-data subtrees are
/// skipped whole.
pub fn sort_tree(x: &NodeRef) {
    crate::tree::apply(x, &mut |node, _| {
        if let Some(y) = node.borrow().spec() {
            if !y.borrow().is_config() {
                return Walk::SkipSubtree;
            }
        }
        sort_children(node);
        Walk::Continue
    });
}

/// Checks that an element's children are in comparator order.
///
/// Returns the first offending adjacent pair as (left index, right index)
/// among the element children. State-data elements verify vacuously.
pub fn verify_sorted(x: &NodeRef) -> Result<(), (usize, usize)> {
    if let Some(y) = x.borrow().spec() {
        if !y.borrow().is_config() {
            return Ok(());
        }
    }
    let elems = crate::tree::element_children(x);
    for i in 1..elems.len() {
        if cmp_siblings(&elems[i - 1], &elems[i]) == Ordering::Greater {
            return Err((i - 1, i));
        }
    }
    Ok(())
}
