//! Arena-backed syntax tree shared by every lowering pass.
//!
//! Nodes live in one `Vec` and are addressed by [`NodeId`]. Ids are handed
//! out in allocation order and never reused: a node that is replaced stays in
//! the arena, detached, so stale ids held elsewhere never alias a new node.
//! Parent links are plain ids and are rewritten on every reparent/replace;
//! ownership is expressed only by the child slots of the parent's payload.

pub mod cloning;
pub mod imports;
pub mod inference;
pub mod mapper;
pub mod nodes;
pub mod templates;
pub mod types;

use std::fmt;

use crate::ensure_consistent;
use crate::errors::{Result, TranspileError};

pub use imports::{ImportRecord, ImportRegistry, StubSignature};
pub use inference::{StructuralInference, TypeQuery};
pub use nodes::*;
pub use types::{DataLocation, TypeNode};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Clone, Debug)]
pub struct Node {
    pub id: NodeId,
    pub parent: Option<NodeId>,
    pub kind: NodeKind,
}

/// One compilation's tree plus the state every pass threads through it:
/// the id counter, the unique-name counter and the import registrar.
pub struct Ast {
    nodes: Vec<Node>,
    roots: Vec<NodeId>,
    name_counter: usize,
    imports: ImportRegistry,
    inference: Box<dyn TypeQuery>,
}

impl Default for Ast {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Ast {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ast")
            .field("nodes", &self.nodes.len())
            .field("roots", &self.roots)
            .field("imports", &self.imports.len())
            .finish()
    }
}

impl Ast {
    pub fn new() -> Self {
        Self::with_inference(Box::new(StructuralInference))
    }

    /// Build an empty tree whose type queries go through `inference`.
    pub fn with_inference(inference: Box<dyn TypeQuery>) -> Self {
        Self {
            nodes: Vec::new(),
            roots: Vec::new(),
            name_counter: 0,
            imports: ImportRegistry::default(),
            inference,
        }
    }

    /// Allocate a node and adopt every child its payload names.
    pub fn insert(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        let children = kind.children();
        self.nodes.push(Node { id, parent: None, kind });
        for child in children {
            self.nodes[child.index()].parent = Some(id);
        }
        id
    }

    pub fn add_root(&mut self, kind: NodeKind) -> NodeId {
        let id = self.insert(kind);
        self.roots.push(id);
        id
    }

    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    /// Number of nodes ever allocated, detached ones included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.nodes[id.index()].kind
    }

    pub fn kind_mut(&mut self, id: NodeId) -> &mut NodeKind {
        &mut self.nodes[id.index()].kind
    }

    pub fn tag(&self, id: NodeId) -> NodeTag {
        self.kind(id).tag()
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.index()].parent
    }

    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        self.kind(id).children()
    }

    pub fn register_child(&mut self, child: NodeId, parent: NodeId) {
        self.nodes[child.index()].parent = Some(parent);
    }

    /// Re-point the parent link of every child `parent` currently owns.
    pub fn adopt_children(&mut self, parent: NodeId) {
        for child in self.children(parent) {
            self.register_child(child, parent);
        }
    }

    /// Clear the parent link of a node its parent no longer lists.
    pub fn detach(&mut self, id: NodeId) {
        self.nodes[id.index()].parent = None;
    }

    /// Put `new` in the tree position held by `old` and detach `old`.
    pub fn replace_node(&mut self, old: NodeId, new: NodeId) -> Result<()> {
        match self.parent(old) {
            Some(parent) => {
                let replaced = self.kind_mut(parent).replace_child(old, new);
                ensure_consistent!(replaced, "node {} is not a child of its parent {}", old, parent);
                self.nodes[new.index()].parent = Some(parent);
            }
            None => {
                let slot = self.roots.iter_mut().find(|root| **root == old);
                match slot {
                    Some(slot) => *slot = new,
                    None => {
                        return Err(TranspileError::consistency(format!(
                            "cannot replace detached node {}",
                            old
                        )))
                    }
                }
                self.nodes[new.index()].parent = None;
            }
        }
        self.nodes[old.index()].parent = None;
        Ok(())
    }

    /// Append `child` to the list-shaped slot of `parent` (members, statements, ...).
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        let appended = self.kind_mut(parent).append_child(child);
        ensure_consistent!(appended, "node {} ({:?}) cannot own appended children", parent, self.tag(parent));
        self.register_child(child, parent);
        Ok(())
    }

    /// Outermost ancestor of `id`.
    pub fn root_of(&self, id: NodeId) -> NodeId {
        let mut current = id;
        while let Some(parent) = self.parent(current) {
            current = parent;
        }
        current
    }

    /// Whether `id` hangs, directly or transitively, off one of the roots.
    pub fn is_reachable(&self, id: NodeId) -> bool {
        self.roots.contains(&self.root_of(id))
    }

    /// Every node reachable from the roots, in depth-first pre-order.
    pub fn reachable_nodes(&self) -> Vec<NodeId> {
        let mut out = Vec::new();
        for &root in &self.roots {
            self.collect_subtree(root, &mut out);
        }
        out
    }

    pub fn subtree(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        self.collect_subtree(id, &mut out);
        out
    }

    fn collect_subtree(&self, id: NodeId, out: &mut Vec<NodeId>) {
        out.push(id);
        for child in self.children(id) {
            self.collect_subtree(child, out);
        }
    }

    /// A name no other call on this tree will return and no node already carries.
    pub fn fresh_name(&mut self, prefix: &str) -> String {
        loop {
            let name = format!("{}_{}", prefix, self.name_counter);
            self.name_counter += 1;
            if !self.nodes.iter().any(|node| self.name_of(node.id) == Some(name.as_str())) {
                return name;
            }
        }
    }

    pub fn node_type(&self, id: NodeId) -> Result<TypeNode> {
        self.inference.node_type(self, id)
    }

    pub fn imports(&self) -> &ImportRegistry {
        &self.imports
    }

    pub(crate) fn imports_mut(&mut self) -> &mut ImportRegistry {
        &mut self.imports
    }

    // Typed accessors. A wrong kind here means an earlier stage wired the tree wrongly.

    pub fn contract(&self, id: NodeId) -> Result<&ContractDefinition> {
        match self.kind(id) {
            NodeKind::Contract(contract) => Ok(contract),
            other => Err(wrong_kind(id, "contract", other)),
        }
    }

    pub fn contract_mut(&mut self, id: NodeId) -> Result<&mut ContractDefinition> {
        match self.kind_mut(id) {
            NodeKind::Contract(contract) => Ok(contract),
            other => Err(wrong_kind(id, "contract", other)),
        }
    }

    pub fn function(&self, id: NodeId) -> Result<&FunctionDefinition> {
        match self.kind(id) {
            NodeKind::Function(func) => Ok(func),
            other => Err(wrong_kind(id, "function", other)),
        }
    }

    pub fn function_mut(&mut self, id: NodeId) -> Result<&mut FunctionDefinition> {
        match self.kind_mut(id) {
            NodeKind::Function(func) => Ok(func),
            other => Err(wrong_kind(id, "function", other)),
        }
    }

    pub fn variable(&self, id: NodeId) -> Result<&VariableDeclaration> {
        match self.kind(id) {
            NodeKind::Variable(var) => Ok(var),
            other => Err(wrong_kind(id, "variable declaration", other)),
        }
    }

    pub fn variable_mut(&mut self, id: NodeId) -> Result<&mut VariableDeclaration> {
        match self.kind_mut(id) {
            NodeKind::Variable(var) => Ok(var),
            other => Err(wrong_kind(id, "variable declaration", other)),
        }
    }

    pub fn parameter_list(&self, id: NodeId) -> Result<&ParameterList> {
        match self.kind(id) {
            NodeKind::ParameterList(list) => Ok(list),
            other => Err(wrong_kind(id, "parameter list", other)),
        }
    }

    /// Parameter declarations of a function, in order.
    pub fn parameters_of(&self, func: NodeId) -> Result<Vec<NodeId>> {
        let list = self.function(func)?.parameters;
        Ok(self.parameter_list(list)?.parameters.clone())
    }

    pub fn return_parameters_of(&self, func: NodeId) -> Result<Vec<NodeId>> {
        let list = self.function(func)?.return_parameters;
        Ok(self.parameter_list(list)?.parameters.clone())
    }

    /// The contract's declared constructor, if any.
    pub fn constructor_of(&self, contract: NodeId) -> Result<Option<NodeId>> {
        let members = &self.contract(contract)?.members;
        Ok(members.iter().copied().find(|&member| {
            matches!(self.kind(member), NodeKind::Function(f) if f.kind == FunctionKind::Constructor)
        }))
    }

    /// Every contract reachable from the roots, in source order.
    pub fn contracts(&self) -> Vec<NodeId> {
        self.reachable_nodes()
            .into_iter()
            .filter(|&id| self.tag(id) == NodeTag::Contract)
            .collect()
    }

    pub fn find_contract(&self, name: &str) -> Option<NodeId> {
        self.contracts()
            .into_iter()
            .find(|&id| matches!(self.kind(id), NodeKind::Contract(c) if c.name == name))
    }

    /// Name carried by a declaration-like node, for diagnostics and lookups.
    pub fn name_of(&self, id: NodeId) -> Option<&str> {
        match self.kind(id) {
            NodeKind::Contract(c) => Some(&c.name),
            NodeKind::Function(f) => Some(&f.name),
            NodeKind::Variable(v) => Some(&v.name),
            NodeKind::Identifier(i) => Some(&i.name),
            NodeKind::ModifierInvocation(m) => Some(&m.name),
            _ => None,
        }
    }
}

fn wrong_kind(id: NodeId, expected: &str, found: &NodeKind) -> TranspileError {
    TranspileError::consistency(format!("expected {} at node {}, found {:?}", expected, id, found.tag()))
}

#[cfg(test)]
mod tests {
    use super::templates::*;
    use super::*;

    fn literal(ast: &mut Ast, value: &str) -> NodeId {
        create_number_literal(ast, value, &format!("int_const {}", value))
    }

    #[test]
    fn ids_are_monotonic_and_children_adopted() {
        let mut ast = Ast::new();
        let left = literal(&mut ast, "1");
        let right = literal(&mut ast, "2");
        let sum = ast.insert(NodeKind::BinaryOperation(BinaryOperation {
            operator: "+".to_string(),
            left,
            right,
            type_string: "int_const 3".to_string(),
        }));
        assert!(left < right && right < sum);
        assert_eq!(ast.parent(left), Some(sum));
        assert_eq!(ast.parent(right), Some(sum));
        assert_eq!(ast.children(sum), vec![left, right]);
    }

    #[test]
    fn replace_updates_parent_slot_and_detaches_old() {
        let mut ast = Ast::new();
        let one = literal(&mut ast, "1");
        let stmt = ast.insert(NodeKind::ExpressionStatement(ExpressionStatement { expression: one }));
        let block = create_block(&mut ast, vec![stmt]);
        let unit = ast.add_root(NodeKind::SourceUnit(SourceUnit { path: "a.sol".into(), nodes: vec![block] }));
        let two = literal(&mut ast, "2");

        ast.replace_node(one, two).unwrap();

        assert_eq!(ast.children(stmt), vec![two]);
        assert_eq!(ast.parent(two), Some(stmt));
        assert_eq!(ast.parent(one), None);
        assert!(ast.is_reachable(two));
        assert!(!ast.is_reachable(one));
        assert_eq!(ast.root_of(two), unit);
    }

    #[test]
    fn replacing_a_detached_node_is_a_consistency_error() {
        let mut ast = Ast::new();
        let one = literal(&mut ast, "1");
        let two = literal(&mut ast, "2");
        let err = ast.replace_node(one, two).unwrap_err();
        assert!(matches!(err, TranspileError::Consistency { .. }));
    }

    #[test]
    fn fresh_names_never_repeat() {
        let mut ast = Ast::new();
        let a = ast.fresh_name("__constructor");
        let b = ast.fresh_name("__constructor");
        assert_ne!(a, b);
    }

    #[test]
    fn fresh_names_skip_names_already_in_the_tree() {
        let mut ast = Ast::new();
        create_variable_declaration(&mut ast, "__constructor_0", TypeNode::uint8(), None);
        assert_eq!(ast.fresh_name("__constructor"), "__constructor_1");
    }

    #[test]
    fn appending_to_a_leaf_fails() {
        let mut ast = Ast::new();
        let one = literal(&mut ast, "1");
        let two = literal(&mut ast, "2");
        assert!(ast.append_child(one, two).is_err());
    }
}
