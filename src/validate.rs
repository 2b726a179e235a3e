//! Schema checks over bound trees, and default filling.
//!
//! These run after binding: they assume every element either carries its
//! statement or is an error. The first violation wins and is returned as a
//! NETCONF-style report; the shapes here (tags, app-tags, messages) are
//! what the error-reporter contract pins.

use std::rc::Rc;

use crate::error::{Outcome, RpcError};
use crate::search::insert_child;
use crate::tree::{element_children, find_body, find_child, NodeRef, XmlNode};
use crate::yang::{choice_ancestor, Keyword, YangRef};

/// Validates every element below `root` (exclusive) against its statement:
/// unknown elements, list keys, mandatory leaves, mandatory choices and
/// duplicate list entries.
pub fn validate_tree(root: &NodeRef) -> Outcome<()> {
    for child in element_children(root) {
        validate_element(&child)?;
    }
    check_duplicates(root)?;
    Ok(())
}

fn validate_element(x: &NodeRef) -> Outcome<()> {
    let Some(y) = x.borrow().spec() else {
        let name = x.borrow().name().to_string();
        return Err(RpcError::unknown_element(&name));
    };

    // list instances must carry all declared keys, non-empty
    let keys = y.borrow().keys().to_vec();
    if y.borrow().keyword() == Keyword::List {
        for key in &keys {
            match find_body(x, key) {
                Some(v) if !v.is_empty() => {}
                _ => return Err(RpcError::missing_element(key)),
            }
        }
    }

    // mandatory leaves and choices among the statement's direct children;
    // leaves inside a choice leg are only required once that leg is taken,
    // which the direct-child walk gets right for free
    let stmt_children: Vec<YangRef> = y.borrow().children().to_vec();
    for yc in &stmt_children {
        let (kw, mandatory, name) = {
            let c = yc.borrow();
            (c.keyword(), c.is_mandatory(), c.argument().to_string())
        };
        match kw {
            Keyword::Leaf if mandatory => {
                if find_child(x, &name).is_none() {
                    return Err(RpcError::missing_element(&name));
                }
            }
            Keyword::Choice if mandatory => {
                let satisfied = element_children(x).iter().any(|xc| {
                    let Some(yxc) = xc.borrow().spec() else {
                        return false;
                    };
                    match choice_ancestor(&yxc) {
                        Some(ych) => Rc::ptr_eq(&ych, yc),
                        None => false,
                    }
                });
                if !satisfied {
                    return Err(RpcError::missing_choice(&name));
                }
            }
            _ => {}
        }
    }

    for child in element_children(x) {
        validate_element(&child)?;
    }
    check_duplicates(x)?;
    Ok(())
}

/// Rejects adjacent list instances with an equal key tuple. Assumes
/// comparator order, where equal-key instances are neighbours.
fn check_duplicates(x: &NodeRef) -> Outcome<()> {
    let elems = element_children(x);
    for pair in elems.windows(2) {
        let (ya, yb) = (pair[0].borrow().spec(), pair[1].borrow().spec());
        let (Some(ya), Some(yb)) = (ya, yb) else {
            continue;
        };
        if !Rc::ptr_eq(&ya, &yb) || ya.borrow().keyword() != Keyword::List {
            continue;
        }
        let keys = ya.borrow().keys().to_vec();
        if keys.is_empty() {
            continue;
        }
        let equal = keys.iter().all(|k| {
            let (a, b) = (find_body(&pair[0], k), find_body(&pair[1], k));
            a.is_some() && a == b
        });
        if equal {
            let name = pair[0].borrow().name().to_string();
            return Err(RpcError::data_not_unique(&name));
        }
    }
    Ok(())
}

/// Fills in absent leaves that declare a `default`, for every bound config
/// element below `root`. Inserted leaves land at their comparator position.
pub fn fill_defaults(root: &NodeRef) {
    for child in element_children(root) {
        fill_element(&child);
    }
}

fn fill_element(x: &NodeRef) {
    let Some(y) = x.borrow().spec() else {
        return;
    };
    if !y.borrow().is_config() {
        return;
    }
    let stmt_children: Vec<YangRef> = y.borrow().children().to_vec();
    for yc in &stmt_children {
        let (kw, name) = {
            let c = yc.borrow();
            (c.keyword(), c.argument().to_string())
        };
        if kw != Keyword::Leaf {
            continue;
        }
        let default = yc
            .borrow()
            .find_child(Keyword::Default)
            .map(|d| d.borrow().argument().to_string());
        let Some(default) = default else {
            continue;
        };
        if find_child(x, &name).is_some() {
            continue;
        }
        let leaf = XmlNode::new_element(&name);
        leaf.borrow_mut().set_spec(Some(yc.clone()));
        XmlNode::add_child_to_ref(&leaf, XmlNode::new_body(default));
        insert_child(x, leaf);
    }
    for child in element_children(x) {
        fill_element(&child);
    }
}
