//! Deep copies with fresh identities, and reference remapping across scopes.

use std::collections::HashMap;

use crate::errors::Result;

use super::nodes::{NodeKind, NodeTag};
use super::{Ast, NodeId};

/// Declaration id -> the declaration that supersedes it, for one rewrite.
#[derive(Debug, Default, Clone)]
pub struct RemapTable {
    entries: HashMap<NodeId, NodeId>,
}

impl RemapTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, old: NodeId, new: NodeId) {
        self.entries.insert(old, new);
    }

    pub fn get(&self, old: NodeId) -> Option<NodeId> {
        self.entries.get(&old).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Deep-copy the subtree at `root`.
///
/// Every node of the copy gets a fresh id. References and scopes inside the
/// copy that pointed at nodes of the original subtree are redirected to their
/// copies; anything pointing outside is left as is. The copy is detached.
pub fn clone_node(ast: &mut Ast, root: NodeId) -> NodeId {
    let mut copies = HashMap::new();
    let new_root = copy_recursive(ast, root, &mut copies);

    for &copy in copies.values() {
        let kind = ast.kind_mut(copy);
        if let Some(slot) = kind.reference_mut() {
            if let Some(target) = slot.and_then(|t| copies.get(&t)) {
                *slot = Some(*target);
            }
        }
        if let Some(slot) = kind.scope_mut() {
            if let Some(target) = slot.and_then(|t| copies.get(&t)) {
                *slot = Some(*target);
            }
        }
    }
    new_root
}

fn copy_recursive(ast: &mut Ast, id: NodeId, copies: &mut HashMap<NodeId, NodeId>) -> NodeId {
    let mut kind = ast.kind(id).clone();
    for slot in kind.children_mut() {
        *slot = copy_recursive(ast, *slot, copies);
    }
    let new_id = ast.insert(kind);
    copies.insert(id, new_id);
    new_id
}

/// Rewrite every reference under `root` whose target appears in `remap`.
///
/// Identifiers also take the new declaration's name and type, so the
/// rewritten subtree reads correctly in the scope of its new target.
pub fn update_referenced_declarations(ast: &mut Ast, root: NodeId, remap: &RemapTable) -> Result<()> {
    for id in ast.subtree(root) {
        let Some(target) = ast.kind(id).referenced_declaration().and_then(|t| remap.get(t)) else {
            continue;
        };
        if let Some(slot) = ast.kind_mut(id).reference_mut() {
            *slot = Some(target);
        }
        if ast.tag(id) == NodeTag::Identifier {
            let name = ast.name_of(target).unwrap_or_default().to_string();
            let type_string = ast.node_type(target)?.to_string();
            if let NodeKind::Identifier(ident) = ast.kind_mut(id) {
                ident.name = name;
                ident.type_string = type_string;
            }
        }
    }
    Ok(())
}

/// [`clone_node`] followed by [`update_referenced_declarations`] on the copy.
pub fn clone_with_remap(ast: &mut Ast, root: NodeId, remap: &RemapTable) -> Result<NodeId> {
    let copy = clone_node(ast, root);
    update_referenced_declarations(ast, copy, remap)?;
    Ok(copy)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::nodes::*;
    use crate::ast::templates::*;
    use crate::ast::types::TypeNode;

    /// `function f(uint a) { a + 1; }` without any enclosing contract.
    fn function_using_its_parameter(ast: &mut Ast) -> (NodeId, NodeId, NodeId) {
        let param = create_variable_declaration(ast, "a", TypeNode::uint256(), None);
        let params = create_parameter_list(ast, vec![param]);
        let returns = create_parameter_list(ast, vec![]);
        let use_a = create_identifier(ast, param).unwrap();
        let one = create_number_literal(ast, "1", "int_const 1");
        let sum = ast.insert(NodeKind::BinaryOperation(BinaryOperation {
            operator: "+".into(),
            left: use_a,
            right: one,
            type_string: "uint256".into(),
        }));
        let stmt = create_expression_statement(ast, sum);
        let body = create_block(ast, vec![stmt]);
        let func = ast.insert(NodeKind::Function(FunctionDefinition {
            name: "f".into(),
            kind: FunctionKind::Function,
            visibility: Visibility::Public,
            mutability: Mutability::NonPayable,
            scope: None,
            parameters: params,
            return_parameters: returns,
            modifiers: vec![],
            body: Some(body),
        }));
        ast.variable_mut(param).unwrap().scope = Some(func);
        (func, param, use_a)
    }

    #[test]
    fn clone_gives_fresh_ids_and_rewires_internal_references() {
        let mut ast = Ast::new();
        let (func, param, use_a) = function_using_its_parameter(&mut ast);
        let before = ast.len();

        let copy = clone_node(&mut ast, func);

        assert_eq!(ast.len() - before, ast.subtree(func).len());
        let new_param = ast.parameters_of(copy).unwrap()[0];
        assert_ne!(new_param, param);
        assert_eq!(ast.variable(new_param).unwrap().scope, Some(copy));

        let new_use = ast
            .subtree(copy)
            .into_iter()
            .find(|&id| ast.tag(id) == NodeTag::Identifier)
            .unwrap();
        assert_ne!(new_use, use_a);
        assert_eq!(ast.kind(new_use).referenced_declaration(), Some(new_param));
        // the original still points at its own parameter
        assert_eq!(ast.kind(use_a).referenced_declaration(), Some(param));
        assert_eq!(ast.parent(copy), None);
    }

    #[test]
    fn remap_only_touches_listed_declarations() {
        let mut ast = Ast::new();
        let outer = create_variable_declaration(&mut ast, "x", TypeNode::uint256(), None);
        let unrelated = create_variable_declaration(&mut ast, "y", TypeNode::uint256(), None);
        let replacement = create_variable_declaration(&mut ast, "x2", TypeNode::uint8(), None);
        let x = create_identifier(&mut ast, outer).unwrap();
        let y = create_identifier(&mut ast, unrelated).unwrap();
        let expr = ast.insert(NodeKind::BinaryOperation(BinaryOperation {
            operator: "*".into(),
            left: x,
            right: y,
            type_string: "uint256".into(),
        }));

        let mut remap = RemapTable::new();
        remap.insert(outer, replacement);
        let copy = clone_with_remap(&mut ast, expr, &remap).unwrap();

        let children = ast.children(copy);
        assert_eq!(ast.kind(children[0]).referenced_declaration(), Some(replacement));
        assert_eq!(ast.kind(children[1]).referenced_declaration(), Some(unrelated));
        assert_eq!(ast.kind(x).referenced_declaration(), Some(outer));
        assert_eq!(ast.name_of(x), Some("x"));
    }

    #[test]
    fn remapped_identifiers_take_the_new_name_and_type() {
        let mut ast = Ast::new();
        let old = create_variable_declaration(&mut ast, "b", TypeNode::uint256(), None);
        let local = create_variable_declaration(&mut ast, "__constructor_arg_0", TypeNode::uint8(), None);
        let b = create_identifier(&mut ast, old).unwrap();

        let mut remap = RemapTable::new();
        remap.insert(old, local);
        let copy = clone_with_remap(&mut ast, b, &remap).unwrap();

        assert_eq!(ast.name_of(copy), Some("__constructor_arg_0"));
        assert_eq!(ast.kind(copy).type_string(), Some("uint8"));
        assert_eq!(ast.name_of(b), Some("b"));
        assert_eq!(ast.kind(b).type_string(), Some("uint256"));
    }
}
