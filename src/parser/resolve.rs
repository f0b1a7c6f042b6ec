//! Name binding for freshly parsed trees.
//!
//! Runs in three steps: bind inheritance specifiers and compute each
//! contract's C3 linearization, resolve every identifier against a scope
//! stack, then stamp each expression with the type string inference gives it.

use std::collections::{HashMap, HashSet};

use tracing::{debug, trace};

use crate::ast::mapper::AstMapper;
use crate::ast::nodes::*;
use crate::ast::{Ast, NodeId};
use crate::errors::{Result, TranspileError};

/// Bind names and annotate types across every root of `ast`.
pub fn resolve(ast: &mut Ast) -> Result<()> {
    let contracts = contract_table(ast)?;
    bind_inheritance_specifiers(ast, &contracts)?;

    let mut linearizer = Linearizer::default();
    for contract in ast.contracts() {
        let order = linearizer.linearize(contract, ast)?;
        trace!(contract = %contract, bases = order.len(), "linearized");
        ast.contract_mut(contract)?.linearized_base_contracts = order;
    }

    Resolver { contracts, scopes: Vec::new() }.map(ast)?;
    TypeAnnotator.map(ast)
}

fn contract_table(ast: &Ast) -> Result<HashMap<String, NodeId>> {
    let mut table = HashMap::new();
    for contract in ast.contracts() {
        let name = ast.contract(contract)?.name.clone();
        if table.insert(name.clone(), contract).is_some() {
            return Err(TranspileError::resolution(format!("Contract `{}` is declared twice", name)));
        }
    }
    Ok(table)
}

fn bind_inheritance_specifiers(ast: &mut Ast, contracts: &HashMap<String, NodeId>) -> Result<()> {
    for contract in ast.contracts() {
        for spec in ast.contract(contract)?.inheritance_specifiers.clone() {
            if let NodeKind::InheritanceSpecifier(spec) = ast.kind_mut(spec) {
                let base = contracts.get(&spec.base_name).ok_or_else(|| {
                    TranspileError::resolution(format!("Base contract `{}` not found", spec.base_name))
                })?;
                spec.referenced_declaration = Some(*base);
            }
        }
    }
    Ok(())
}

/// Direct bases of `contract` as written, left to right.
fn direct_bases(ast: &Ast, contract: NodeId) -> Result<Vec<NodeId>> {
    ast.contract(contract)?
        .inheritance_specifiers
        .iter()
        .map(|&spec| {
            ast.kind(spec).referenced_declaration().ok_or_else(|| {
                TranspileError::consistency(format!("inheritance specifier {} is unbound", spec))
            })
        })
        .collect()
}

#[derive(Default)]
struct Linearizer {
    done: HashMap<NodeId, Vec<NodeId>>,
    in_progress: HashSet<NodeId>,
}

impl Linearizer {
    /// Most derived first. Bases listed later in `is` count as more derived.
    fn linearize(&mut self, contract: NodeId, ast: &Ast) -> Result<Vec<NodeId>> {
        if let Some(order) = self.done.get(&contract) {
            return Ok(order.clone());
        }
        let name = ast.contract(contract)?.name.clone();
        if !self.in_progress.insert(contract) {
            return Err(TranspileError::resolution(format!("Cyclic inheritance involving `{}`", name)));
        }

        let bases = direct_bases(ast, contract)?;
        let mut sequences = Vec::new();
        for &base in bases.iter().rev() {
            sequences.push(self.linearize(base, ast)?);
        }
        sequences.push(bases.iter().rev().copied().collect());

        let merged = c3_merge(sequences).ok_or_else(|| {
            TranspileError::resolution(format!("Linearization of inheritance graph impossible for `{}`", name))
        })?;
        let mut order = vec![contract];
        order.extend(merged);

        self.in_progress.remove(&contract);
        self.done.insert(contract, order.clone());
        Ok(order)
    }
}

fn c3_merge(mut sequences: Vec<Vec<NodeId>>) -> Option<Vec<NodeId>> {
    let mut out = Vec::new();
    loop {
        sequences.retain(|seq| !seq.is_empty());
        if sequences.is_empty() {
            return Some(out);
        }
        let head = sequences
            .iter()
            .map(|seq| seq[0])
            .find(|candidate| sequences.iter().all(|seq| !seq[1..].contains(candidate)))?;
        out.push(head);
        for seq in &mut sequences {
            if seq[0] == head {
                seq.remove(0);
            }
        }
    }
}

struct Scope {
    owner: NodeId,
    names: HashMap<String, NodeId>,
}

/// Sets declaration scopes and binds identifiers and base-constructor modifiers.
struct Resolver {
    contracts: HashMap<String, NodeId>,
    scopes: Vec<Scope>,
}

impl Resolver {
    fn owner(&self) -> Option<NodeId> {
        self.scopes.last().map(|scope| scope.owner)
    }

    fn lookup(&self, name: &str) -> Option<NodeId> {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.names.get(name))
            .or_else(|| self.contracts.get(name))
            .copied()
    }

    fn declare(&mut self, name: &str, decl: NodeId) {
        if name.is_empty() {
            return;
        }
        if let Some(scope) = self.scopes.last_mut() {
            scope.names.insert(name.to_string(), decl);
        }
    }

    /// Visit the children of `node` with a new scope owned by it.
    fn with_scope(&mut self, node: NodeId, names: HashMap<String, NodeId>, ast: &mut Ast) -> Result<()> {
        self.scopes.push(Scope { owner: node, names });
        let result = self.common_visit(node, ast);
        self.scopes.pop();
        result
    }
}

impl AstMapper for Resolver {
    fn pass_name(&self) -> &'static str {
        "Resolver"
    }

    fn visit_contract_definition(&mut self, node: NodeId, ast: &mut Ast) -> Result<()> {
        let chain = ast.contract(node)?.linearized_base_contracts.clone();
        let mut names = HashMap::new();
        // most base first, so derived members shadow inherited ones
        for &contract in chain.iter().rev() {
            for &member in &ast.contract(contract)?.members {
                match ast.kind(member) {
                    NodeKind::Variable(var) => {
                        names.insert(var.name.clone(), member);
                    }
                    NodeKind::Function(func) if func.kind == FunctionKind::Function => {
                        names.insert(func.name.clone(), member);
                    }
                    _ => {}
                }
            }
        }
        debug!(contract = %node, visible = names.len(), "resolving contract");
        self.with_scope(node, names, ast)
    }

    fn visit_function_definition(&mut self, node: NodeId, ast: &mut Ast) -> Result<()> {
        ast.function_mut(node)?.scope = self.owner();
        let mut names = HashMap::new();
        for param in ast.parameters_of(node)?.into_iter().chain(ast.return_parameters_of(node)?) {
            let name = &ast.variable(param)?.name;
            if !name.is_empty() {
                names.insert(name.clone(), param);
            }
        }
        self.with_scope(node, names, ast)
    }

    fn visit_variable_declaration(&mut self, node: NodeId, ast: &mut Ast) -> Result<()> {
        ast.variable_mut(node)?.scope = self.owner();
        self.common_visit(node, ast)
    }

    fn visit_block(&mut self, node: NodeId, ast: &mut Ast) -> Result<()> {
        self.with_scope(node, HashMap::new(), ast)
    }

    fn visit_variable_declaration_statement(&mut self, node: NodeId, ast: &mut Ast) -> Result<()> {
        let NodeKind::VariableDeclarationStatement(stmt) = ast.kind(node) else {
            return Err(TranspileError::consistency(format!("{} is not a declaration statement", node)));
        };
        let (declarations, initial_value) = (stmt.declarations.clone(), stmt.initial_value);
        // the initializer cannot see the variable it initializes
        if let Some(value) = initial_value {
            self.dispatch_visit(value, ast)?;
        }
        for decl in declarations {
            self.dispatch_visit(decl, ast)?;
            let name = ast.variable(decl)?.name.clone();
            self.declare(&name, decl);
        }
        Ok(())
    }

    fn visit_identifier(&mut self, node: NodeId, ast: &mut Ast) -> Result<()> {
        let NodeKind::Identifier(ident) = ast.kind_mut(node) else {
            return Err(TranspileError::consistency(format!("{} is not an identifier", node)));
        };
        let decl = self
            .lookup(&ident.name)
            .ok_or_else(|| TranspileError::resolution(format!("Undeclared identifier `{}`", ident.name)))?;
        ident.referenced_declaration = Some(decl);
        Ok(())
    }

    fn visit_modifier_invocation(&mut self, node: NodeId, ast: &mut Ast) -> Result<()> {
        if let NodeKind::ModifierInvocation(invocation) = ast.kind_mut(node) {
            let base = self.contracts.get(&invocation.name).ok_or_else(|| {
                TranspileError::not_supported(format!("modifier `{}`", invocation.name))
            })?;
            invocation.referenced_declaration = Some(*base);
        }
        self.common_visit(node, ast)
    }
}

/// Writes the inferred type of every expression into its type string.
struct TypeAnnotator;

impl AstMapper for TypeAnnotator {
    fn pass_name(&self) -> &'static str {
        "TypeAnnotator"
    }

    fn visit_expression(&mut self, node: NodeId, ast: &mut Ast) -> Result<()> {
        self.common_visit(node, ast)?;
        let ty = ast.node_type(node)?.to_string();
        if let Some(slot) = ast.kind_mut(node).type_string_mut() {
            *slot = ty;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    fn chain_names(ast: &Ast, contract: &str) -> Vec<String> {
        let id = ast.find_contract(contract).unwrap();
        ast.contract(id)
            .unwrap()
            .linearized_base_contracts
            .iter()
            .map(|&c| ast.contract(c).unwrap().name.clone())
            .collect()
    }

    #[test]
    fn diamond_linearizes_most_derived_first() {
        let ast = parse(
            "contract A {} contract B is A {} contract C is A {} contract D is B, C {}",
        )
        .unwrap();
        assert_eq!(chain_names(&ast, "D"), ["D", "C", "B", "A"]);
        assert_eq!(chain_names(&ast, "A"), ["A"]);
    }

    #[test]
    fn impossible_order_is_rejected() {
        let err = parse("contract A {} contract B is A {} contract C is B, A {}").unwrap_err();
        assert!(format!("{:#}", err).contains("Linearization of inheritance graph impossible"));
    }

    #[test]
    fn locals_resolve_and_shadow() {
        let ast = parse(
            "contract C {
                uint8 x;
                function f(uint8 y) public returns (uint8) {
                    uint8 x = y;
                    return x;
                }
            }",
        )
        .unwrap();
        let ret = ast
            .reachable_nodes()
            .into_iter()
            .find(|&id| ast.tag(id) == NodeTag::Return)
            .unwrap();
        let NodeKind::Return(Return { expression: Some(expr) }) = ast.kind(ret) else { panic!() };
        let decl = ast.kind(*expr).referenced_declaration().unwrap();
        let var = ast.variable(decl).unwrap();
        assert!(!var.state_variable);
        assert_eq!(ast.tag(var.scope.unwrap()), NodeTag::Block);
        assert_eq!(ast.kind(*expr).type_string(), Some("uint8"));
    }

    #[test]
    fn undeclared_identifier_is_a_resolution_error() {
        let err = parse("contract C { function f() public { y; } }").unwrap_err();
        let err = err.downcast_ref::<TranspileError>().unwrap();
        assert!(matches!(err, TranspileError::Resolution { .. }));
    }
}
