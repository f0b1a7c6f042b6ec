//! Replace constructor chaining with one explicit initializer per contract.
//!
//! The target has flat units only, so a contract `C is B1, ..., Bn` gets a
//! single public constructor that:
//! 1. evaluates every argument passed to a base constructor anywhere in the
//!    chain, once, into a fresh local (chain order, most-derived first);
//! 2. calls a private copy of each base constructor, most base-like first;
//! 3. calls C's own constructor, demoted to a private helper.
//!
//! Arguments are cloned through one [`RemapTable`] per contract, so an
//! argument written against an intermediate base's constructor parameter
//! binds to the local that now holds that parameter's value.

use std::collections::HashMap;

use tracing::{debug, trace};

use crate::ast::cloning::{clone_node, clone_with_remap, RemapTable};
use crate::ast::mapper::AstMapper;
use crate::ast::nodes::*;
use crate::ast::templates::*;
use crate::ast::{Ast, NodeId};
use crate::ensure_consistent;
use crate::errors::{Result, TranspileError};

const ARGUMENT_PREFIX: &str = "__constructor_arg";
const HELPER_PREFIX: &str = "__constructor";

#[derive(Debug, Default)]
pub struct ConstructorInheritance {
    /// contract -> constructor, as declared before this pass changed anything
    constructors: HashMap<NodeId, NodeId>,
    demoted: Vec<NodeId>,
}

/// Per-contract scratch state.
struct Linearization {
    contract: NodeId,
    constructor: NodeId,
    remap: RemapTable,
    arguments: HashMap<NodeId, Vec<NodeId>>,
    statements: Vec<NodeId>,
}

impl AstMapper for ConstructorInheritance {
    fn pass_name(&self) -> &'static str {
        "ConstructorInheritance"
    }

    fn map(&mut self, ast: &mut Ast) -> Result<()> {
        debug!(pass = self.pass_name(), "running pass");
        self.constructors.clear();
        self.demoted.clear();
        for contract in ast.contracts() {
            if let Some(constructor) = ast.constructor_of(contract)? {
                self.constructors.insert(contract, constructor);
            }
        }

        for root in ast.roots().to_vec() {
            self.dispatch_visit(root, ast)?;
        }

        // Base invocations on demoted constructors stay readable until every
        // derived contract has collected its arguments.
        for func in std::mem::take(&mut self.demoted) {
            detach_base_invocations(func, ast)?;
        }
        Ok(())
    }

    fn visit_contract_definition(&mut self, node: NodeId, ast: &mut Ast) -> Result<()> {
        self.solve_constructor_inheritance(node, ast)
    }
}

impl ConstructorInheritance {
    fn solve_constructor_inheritance(&mut self, node: NodeId, ast: &mut Ast) -> Result<()> {
        let contract = ast.contract(node)?;
        if contract.is_abstract {
            trace!(contract = %contract.name, "abstract, skipping");
            return Ok(());
        }
        let name = contract.name.clone();
        let chain = contract.linearized_base_contracts.clone();
        ensure_consistent!(
            chain.first() == Some(&node),
            "linearization of `{}` does not start with the contract itself",
            name
        );

        let own_constructor = self.constructors.get(&node).copied();
        let mut state = Linearization {
            contract: node,
            constructor: create_default_constructor(ast, node),
            remap: RemapTable::new(),
            arguments: HashMap::new(),
            statements: Vec::new(),
        };
        if let Some(own) = own_constructor {
            inherit_signature(own, &mut state, ast)?;
        }

        for &member in &chain {
            self.collect_arguments(member, &mut state, ast)?;
        }
        let locals = state.statements.len();

        // Most base-like first: base state exists before derived code runs.
        for &base in chain.iter().skip(1).rev() {
            let Some(&base_constructor) = self.constructors.get(&base) else {
                continue;
            };
            let arguments = state.arguments.remove(&base).unwrap_or_default();
            let expected = ast.parameters_of(base_constructor)?.len();
            ensure_consistent!(
                expected == arguments.len(),
                "Wrong number of arguments for the constructor of `{}` in `{}`: expected {}, got {}",
                contract_name(base, ast),
                name,
                expected,
                arguments.len()
            );
            let helper = create_function_from_constructor(base_constructor, node, ast)?;
            ast.append_child(node, helper)?;
            let call = create_call_to_function(ast, helper, arguments)?;
            state.statements.push(create_expression_statement(ast, call));
        }

        if let Some(own) = own_constructor {
            let helper_name = ast.fresh_name(HELPER_PREFIX);
            let func = ast.function_mut(own)?;
            func.kind = FunctionKind::Function;
            func.name = helper_name;
            func.visibility = Visibility::Private;
            self.demoted.push(own);

            let mut forwarded = Vec::new();
            for param in ast.parameters_of(state.constructor)? {
                forwarded.push(create_identifier(ast, param)?);
            }
            let call = create_call_to_function(ast, own, forwarded)?;
            state.statements.push(create_expression_statement(ast, call));
        }

        debug!(
            contract = %name,
            locals,
            calls = state.statements.len() - locals,
            "synthesized constructor"
        );
        let body = create_block(ast, state.statements);
        ast.function_mut(state.constructor)?.body = Some(body);
        ast.register_child(body, state.constructor);
        ast.append_child(node, state.constructor)
    }

    /// Arguments `member` passes to its own bases, from exactly one source
    /// per base: its inheritance specifier or its constructor's invocation.
    fn collect_arguments(&self, member: NodeId, state: &mut Linearization, ast: &mut Ast) -> Result<()> {
        for spec in ast.contract(member)?.inheritance_specifiers.clone() {
            let NodeKind::InheritanceSpecifier(specifier) = ast.kind(spec) else {
                return Err(TranspileError::consistency(format!("{} is not an inheritance specifier", spec)));
            };
            if specifier.arguments.is_empty() {
                continue;
            }
            let base = specifier.referenced_declaration.ok_or_else(|| {
                TranspileError::consistency(format!("base `{}` is unresolved", specifier.base_name))
            })?;
            let arguments = specifier.arguments.clone();
            self.bind_arguments(member, base, &arguments, state, ast)?;
        }

        let Some(&constructor) = self.constructors.get(&member) else {
            return Ok(());
        };
        for invocation in ast.function(constructor)?.modifiers.clone() {
            let NodeKind::ModifierInvocation(modifier) = ast.kind(invocation) else {
                return Err(TranspileError::consistency(format!("{} is not a modifier invocation", invocation)));
            };
            let Some(target) = modifier.referenced_declaration else {
                return Err(TranspileError::consistency(format!("modifier `{}` is unresolved", modifier.name)));
            };
            if ast.tag(target) != NodeTag::Contract || modifier.arguments.is_empty() {
                continue;
            }
            let arguments = modifier.arguments.clone();
            self.bind_arguments(member, target, &arguments, state, ast)?;
        }
        Ok(())
    }

    /// Bind each argument for `base` to a fresh local of the new constructor.
    fn bind_arguments(
        &self,
        member: NodeId,
        base: NodeId,
        arguments: &[NodeId],
        state: &mut Linearization,
        ast: &mut Ast,
    ) -> Result<()> {
        let Some(&base_constructor) = self.constructors.get(&base) else {
            return Err(TranspileError::consistency(format!(
                "`{}` passes constructor arguments to `{}`, which declares no constructor",
                contract_name(member, ast),
                contract_name(base, ast)
            )));
        };
        let parameters = ast.parameters_of(base_constructor)?;
        ensure_consistent!(
            parameters.len() == arguments.len(),
            "Wrong number of arguments for the constructor of `{}` in `{}`: expected {}, got {}",
            contract_name(base, ast),
            contract_name(member, ast),
            parameters.len(),
            arguments.len()
        );
        ensure_consistent!(
            !state.arguments.contains_key(&base),
            "Arguments for the constructor of `{}` are supplied more than once (again by `{}` while linearizing `{}`)",
            contract_name(base, ast),
            contract_name(member, ast),
            contract_name(state.contract, ast)
        );

        let mut bound = Vec::with_capacity(arguments.len());
        for (&argument, &parameter) in arguments.iter().zip(&parameters) {
            let value = clone_with_remap(ast, argument, &state.remap)?;
            let local = clone_node(ast, parameter);
            let local_name = ast.fresh_name(ARGUMENT_PREFIX);
            let var = ast.variable_mut(local)?;
            var.name = local_name;
            var.scope = Some(state.constructor);
            state.remap.insert(parameter, local);
            bound.push(create_identifier(ast, local)?);
            state
                .statements
                .push(create_variable_declaration_statement(ast, local, value));
        }
        state.arguments.insert(base, bound);
        Ok(())
    }
}

/// Give the synthesized constructor copies of `own`'s parameter lists.
fn inherit_signature(own: NodeId, state: &mut Linearization, ast: &mut Ast) -> Result<()> {
    let (parameters, return_parameters, mutability) = {
        let func = ast.function(own)?;
        (func.parameters, func.return_parameters, func.mutability)
    };
    let (new_parameters, new_returns) = {
        let func = ast.function_mut(state.constructor)?;
        func.mutability = mutability;
        (func.parameters, func.return_parameters)
    };
    for (from, to) in [(parameters, new_parameters), (return_parameters, new_returns)] {
        for param in ast.parameter_list(from)?.parameters.clone() {
            let copy = clone_node(ast, param);
            ast.variable_mut(copy)?.scope = Some(state.constructor);
            state.remap.insert(param, copy);
            ast.append_child(to, copy)?;
        }
    }
    Ok(())
}

/// Private, uniquely named copy of a base constructor, owned by `contract`.
fn create_function_from_constructor(constructor: NodeId, contract: NodeId, ast: &mut Ast) -> Result<NodeId> {
    let helper = clone_node(ast, constructor);
    let name = ast.fresh_name(HELPER_PREFIX);
    let func = ast.function_mut(helper)?;
    func.kind = FunctionKind::Function;
    func.name = name;
    func.visibility = Visibility::Private;
    func.scope = Some(contract);
    detach_base_invocations(helper, ast)?;
    Ok(helper)
}

/// Drop `Base(args)` invocations from a function; their arguments now live
/// in the synthesized constructor.
fn detach_base_invocations(func: NodeId, ast: &mut Ast) -> Result<()> {
    let modifiers = ast.function(func)?.modifiers.clone();
    let (bases, kept): (Vec<NodeId>, Vec<NodeId>) = modifiers.into_iter().partition(|&m| {
        ast.kind(m)
            .referenced_declaration()
            .map_or(false, |target| ast.tag(target) == NodeTag::Contract)
    });
    ast.function_mut(func)?.modifiers = kept;
    for invocation in bases {
        ast.detach(invocation);
    }
    Ok(())
}

fn contract_name(contract: NodeId, ast: &Ast) -> String {
    ast.name_of(contract).unwrap_or("<unknown>").to_string()
}
