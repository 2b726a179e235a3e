//! YANG schema model consumed by the engine.
//!
//! The engine does not parse YANG source; it consumes an already-parsed
//! statement forest. [`YangStmt`] is one statement (keyword, argument,
//! children), [`YangSpec`] is the forest root with module lookup by name,
//! prefix and namespace URI. `YangSpec::add_module` finalizes a statement
//! tree: it assigns the order indices the sibling comparator relies on,
//! caches list keys, resolves leaf types and distributes flags. After that
//! the schema is read-only and may be shared across trees.

pub mod types;

pub use types::{BaseType, Decimal64, ResolvedType, TypedValue};

use bitflags::bitflags;
use rustc_hash::FxHashMap;
use std::cell::RefCell;
use std::rc::{Rc, Weak};

use crate::error::{Error, Result};

/// A reference-counted pointer to a schema statement.
pub type YangRef = Rc<RefCell<YangStmt>>;

/// YANG statement keywords the engine interprets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Keyword {
    Module,
    Container,
    List,
    Leaf,
    LeafList,
    Anydata,
    Anyxml,
    Rpc,
    Input,
    Output,
    Notification,
    Choice,
    Case,
    Type,
    Key,
    OrderedBy,
    Config,
    Mandatory,
    Default,
    FractionDigits,
    Namespace,
    Prefix,
    /// Any other keyword; carried through but not interpreted.
    Unknown,
}

impl Keyword {
    /// True for YANG data nodes: statements that XML elements bind to.
    pub fn is_datanode(&self) -> bool {
        matches!(
            self,
            Keyword::Container
                | Keyword::List
                | Keyword::Leaf
                | Keyword::LeafList
                | Keyword::Anydata
                | Keyword::Anyxml
        )
    }

    /// True for schema nodes addressable from the top of a module.
    fn is_schemanode(&self) -> bool {
        self.is_datanode() || matches!(self, Keyword::Rpc | Keyword::Notification)
    }
}

bitflags! {
    /// Per-statement flags distributed during finalization.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct StmtFlags: u8 {
        /// `config false`, own or inherited: state data.
        const CONFIG_FALSE = 1;
        /// `ordered-by user`: arrival order is authoritative.
        const ORDERED_BY_USER = 2;
        /// `mandatory true`.
        const MANDATORY = 4;
    }
}

/// One YANG statement.
#[derive(Debug)]
pub struct YangStmt {
    keyword: Keyword,
    argument: String,
    children: Vec<YangRef>,
    parent: Weak<RefCell<YangStmt>>,
    /// Owning module statement; set during finalization.
    module: Weak<RefCell<YangStmt>>,
    /// Rank among the parent's data-node children (choice/case flattened).
    order: usize,
    flags: StmtFlags,
    /// Cached ordered key names, `list` statements only.
    keys: Vec<String>,
    /// Resolved leaf type, `leaf`/`leaf-list` statements only.
    resolved: Option<ResolvedType>,
}

impl YangStmt {
    /// Creates a new unattached statement.
    pub fn new(keyword: Keyword, argument: impl Into<String>) -> YangRef {
        Rc::new(RefCell::new(YangStmt {
            keyword,
            argument: argument.into(),
            children: Vec::new(),
            parent: Weak::new(),
            module: Weak::new(),
            order: 0,
            flags: StmtFlags::empty(),
            keys: Vec::new(),
            resolved: None,
        }))
    }

    /// Attaches a child statement. Must be called on the wrapped refs.
    pub fn add_child_to_ref(parent: &YangRef, child: YangRef) {
        child.borrow_mut().parent = Rc::downgrade(parent);
        parent.borrow_mut().children.push(child);
    }

    pub fn keyword(&self) -> Keyword {
        self.keyword
    }

    pub fn argument(&self) -> &str {
        &self.argument
    }

    pub fn children(&self) -> &[YangRef] {
        &self.children
    }

    /// The parent statement, if still alive.
    pub fn parent(&self) -> Option<YangRef> {
        self.parent.upgrade()
    }

    /// The owning module statement.
    pub fn module(&self) -> Option<YangRef> {
        self.module.upgrade()
    }

    /// Rank among the parent's data-node children.
    pub fn order(&self) -> usize {
        self.order
    }

    pub fn flags(&self) -> StmtFlags {
        self.flags
    }

    /// True unless this statement is (or inherits) `config false`.
    pub fn is_config(&self) -> bool {
        !self.flags.contains(StmtFlags::CONFIG_FALSE)
    }

    pub fn is_user_ordered(&self) -> bool {
        self.flags.contains(StmtFlags::ORDERED_BY_USER)
    }

    pub fn is_mandatory(&self) -> bool {
        self.flags.contains(StmtFlags::MANDATORY)
    }

    /// Cached key names of a `list` statement, in declared order.
    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    /// Resolved type of a `leaf`/`leaf-list` statement.
    pub fn resolved_type(&self) -> Option<&ResolvedType> {
        self.resolved.as_ref()
    }

    /// First child with the given keyword.
    pub fn find_child(&self, keyword: Keyword) -> Option<YangRef> {
        self.children
            .iter()
            .find(|c| c.borrow().keyword == keyword)
            .cloned()
    }

    /// First child with the given keyword and argument.
    pub fn find_child_arg(&self, keyword: Keyword, argument: &str) -> Option<YangRef> {
        self.children
            .iter()
            .find(|c| {
                let c = c.borrow();
                c.keyword == keyword && c.argument == argument
            })
            .cloned()
    }
}

/// Searches a statement's data-node children for one named `name`,
/// descending transparently through `choice` and `case`.
pub fn find_datanode(parent: &YangRef, name: &str) -> Option<YangRef> {
    find_node(parent, name, false)
}

/// Searches a statement's schema-node children (data nodes plus `rpc` and
/// `notification`) for one named `name`, descending through `choice`/`case`.
pub fn find_schemanode(parent: &YangRef, name: &str) -> Option<YangRef> {
    find_node(parent, name, true)
}

fn find_node(parent: &YangRef, name: &str, schemanode: bool) -> Option<YangRef> {
    for child in parent.borrow().children() {
        let (kw, matches_name) = {
            let c = child.borrow();
            (c.keyword, c.argument == name)
        };
        let wanted = if schemanode {
            kw.is_schemanode()
        } else {
            kw.is_datanode()
        };
        if wanted && matches_name {
            return Some(child.clone());
        }
        if matches!(kw, Keyword::Choice | Keyword::Case) {
            if let Some(found) = find_node(child, name, schemanode) {
                return Some(found);
            }
        }
    }
    None
}

/// Returns the nearest lexical `choice` ancestor of a statement, looking
/// through an intervening `case`. None if the statement is not a choice leg.
pub fn choice_ancestor(stmt: &YangRef) -> Option<YangRef> {
    let parent = stmt.borrow().parent()?;
    let kw = parent.borrow().keyword;
    match kw {
        Keyword::Choice => Some(parent),
        Keyword::Case => {
            let grand = parent.borrow().parent()?;
            if grand.borrow().keyword == Keyword::Choice {
                Some(grand)
            } else {
                None
            }
        }
        _ => None,
    }
}

/// Resolved type of a `leaf`/`leaf-list` statement, or a type-resolution
/// error naming the statement when it carries no reducible `type`.
pub fn leaf_type(stmt: &YangRef) -> Result<ResolvedType> {
    let s = stmt.borrow();
    s.resolved
        .clone()
        .ok_or_else(|| Error::TypeResolution(s.argument.clone()))
}

/// Name of the module owning a statement.
pub fn module_name(stmt: &YangRef) -> Option<String> {
    let module = stmt.borrow().module()?;
    let name = module.borrow().argument.clone();
    Some(name)
}

/// A parsed YANG specification: the module forest plus lookup tables.
#[derive(Debug, Default)]
pub struct YangSpec {
    modules: Vec<YangRef>,
    by_name: FxHashMap<String, usize>,
    by_prefix: FxHashMap<String, usize>,
    by_namespace: FxHashMap<String, usize>,
}

impl YangSpec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers and finalizes a module statement tree.
    ///
    /// The module must carry `namespace` and `prefix` substatements.
    /// Finalization assigns order indices, caches list keys, resolves
    /// leaf types and distributes flags; the tree must not be mutated
    /// afterwards.
    pub fn add_module(&mut self, module: YangRef) -> Result<()> {
        let (keyword, name) = {
            let m = module.borrow();
            (m.keyword, m.argument.clone())
        };
        if keyword != Keyword::Module {
            return Err(Error::Schema(format!(
                "expected module statement, got {:?}",
                keyword
            )));
        }
        let namespace = module
            .borrow()
            .find_child(Keyword::Namespace)
            .map(|c| c.borrow().argument.clone())
            .ok_or_else(|| Error::Schema(format!("module {} has no namespace", name)))?;
        let prefix = module
            .borrow()
            .find_child(Keyword::Prefix)
            .map(|c| c.borrow().argument.clone())
            .ok_or_else(|| Error::Schema(format!("module {} has no prefix", name)))?;

        finalize_stmt(&module, &Rc::downgrade(&module), false)?;

        let index = self.modules.len();
        self.modules.push(module);
        self.by_name.insert(name, index);
        self.by_prefix.insert(prefix, index);
        self.by_namespace.insert(namespace, index);
        Ok(())
    }

    pub fn modules(&self) -> &[YangRef] {
        &self.modules
    }

    pub fn find_module_by_name(&self, name: &str) -> Option<YangRef> {
        self.by_name.get(name).map(|i| self.modules[*i].clone())
    }

    pub fn find_module_by_prefix(&self, prefix: &str) -> Option<YangRef> {
        self.by_prefix.get(prefix).map(|i| self.modules[*i].clone())
    }

    pub fn find_module_by_namespace(&self, namespace: &str) -> Option<YangRef> {
        self.by_namespace
            .get(namespace)
            .map(|i| self.modules[*i].clone())
    }

    /// Namespace URI of a registered module.
    pub fn namespace_of(&self, module: &YangRef) -> Option<String> {
        module
            .borrow()
            .find_child(Keyword::Namespace)
            .map(|c| c.borrow().argument.clone())
    }

    /// Canonical prefix of a registered module.
    pub fn prefix_of(&self, module: &YangRef) -> Option<String> {
        module
            .borrow()
            .find_child(Keyword::Prefix)
            .map(|c| c.borrow().argument.clone())
    }
}

/// Recursively finalizes a statement: module back-reference, flags, key
/// cache, type resolution and child order indices.
fn finalize_stmt(
    stmt: &YangRef,
    module: &Weak<RefCell<YangStmt>>,
    parent_state: bool,
) -> Result<()> {
    let keyword = stmt.borrow().keyword;
    let (flags, keys, resolved) = {
        let s = stmt.borrow();

        let mut flags = StmtFlags::empty();
        if parent_state {
            flags |= StmtFlags::CONFIG_FALSE;
        }
        for child in &s.children {
            let c = child.borrow();
            match c.keyword {
                Keyword::Config if c.argument == "false" => flags |= StmtFlags::CONFIG_FALSE,
                Keyword::OrderedBy if c.argument == "user" => flags |= StmtFlags::ORDERED_BY_USER,
                Keyword::Mandatory if c.argument == "true" => flags |= StmtFlags::MANDATORY,
                _ => {}
            }
        }

        let keys: Vec<String> = if keyword == Keyword::List {
            s.children
                .iter()
                .find(|c| c.borrow().keyword == Keyword::Key)
                .map(|key| {
                    key.borrow()
                        .argument
                        .split_whitespace()
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default()
        } else {
            Vec::new()
        };

        let resolved = if matches!(keyword, Keyword::Leaf | Keyword::LeafList) {
            s.children
                .iter()
                .find(|c| c.borrow().keyword == Keyword::Type)
                .map(|ty| {
                    let ty = ty.borrow();
                    let mut resolved = ResolvedType::new(BaseType::from_name(&ty.argument));
                    if resolved.base == BaseType::Decimal64 {
                        resolved.fraction_digits = ty
                            .children
                            .iter()
                            .find(|c| c.borrow().keyword == Keyword::FractionDigits)
                            .and_then(|c| c.borrow().argument.parse().ok())
                            .unwrap_or(2);
                    }
                    resolved
                })
        } else {
            None
        };

        (flags, keys, resolved)
    };
    {
        let mut s = stmt.borrow_mut();
        s.module = module.clone();
        s.flags = flags;
        s.keys = keys;
        s.resolved = resolved;
    }

    // Order indices: rank among this statement's data-node children with
    // choice/case flattened, so siblings from different cases still compare.
    // A choice/case child's data nodes were ranked by the nearest real
    // ancestor, so the pass is skipped for them.
    if !matches!(keyword, Keyword::Choice | Keyword::Case) {
        let mut counter = 0usize;
        assign_child_orders(stmt, &mut counter);
    }

    let state = !stmt.borrow().is_config();
    let children: Vec<YangRef> = stmt.borrow().children.to_vec();
    for child in &children {
        finalize_stmt(child, module, state)?;
    }
    Ok(())
}

fn assign_child_orders(stmt: &YangRef, counter: &mut usize) {
    for child in stmt.borrow().children() {
        let kw = child.borrow().keyword;
        if kw.is_schemanode() {
            child.borrow_mut().order = *counter;
            *counter += 1;
        } else if matches!(kw, Keyword::Choice | Keyword::Case) {
            assign_child_orders(child, counter);
        }
    }
}
