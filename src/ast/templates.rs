//! Constructors for the handful of node shapes passes synthesize.

use crate::errors::Result;

use super::nodes::*;
use super::types::TypeNode;
use super::{Ast, NodeId};

pub fn create_identifier(ast: &mut Ast, decl: NodeId) -> Result<NodeId> {
    let name = ast.name_of(decl).unwrap_or_default().to_string();
    let type_string = ast.node_type(decl)?.to_string();
    Ok(ast.insert(NodeKind::Identifier(Identifier {
        name,
        referenced_declaration: Some(decl),
        type_string,
    })))
}

pub fn create_number_literal(ast: &mut Ast, value: &str, type_string: &str) -> NodeId {
    ast.insert(NodeKind::Literal(Literal {
        kind: LiteralKind::Number,
        value: value.to_string(),
        type_string: type_string.to_string(),
    }))
}

/// `func(args...)`; the call's type string comes from `func`'s return list.
pub fn create_call_to_function(ast: &mut Ast, func: NodeId, arguments: Vec<NodeId>) -> Result<NodeId> {
    let callee = create_identifier(ast, func)?;
    let call = ast.insert(NodeKind::FunctionCall(FunctionCall {
        callee,
        arguments,
        type_string: String::new(),
    }));
    let type_string = ast.node_type(call)?.to_string();
    if let Some(slot) = ast.kind_mut(call).type_string_mut() {
        *slot = type_string;
    }
    Ok(call)
}

pub fn create_block(ast: &mut Ast, statements: Vec<NodeId>) -> NodeId {
    ast.insert(NodeKind::Block(Block { statements }))
}

pub fn create_parameter_list(ast: &mut Ast, parameters: Vec<NodeId>) -> NodeId {
    ast.insert(NodeKind::ParameterList(ParameterList { parameters }))
}

pub fn create_expression_statement(ast: &mut Ast, expression: NodeId) -> NodeId {
    ast.insert(NodeKind::ExpressionStatement(ExpressionStatement { expression }))
}

pub fn create_variable_declaration_statement(ast: &mut Ast, decl: NodeId, initial_value: NodeId) -> NodeId {
    ast.insert(NodeKind::VariableDeclarationStatement(VariableDeclarationStatement {
        declarations: vec![decl],
        initial_value: Some(initial_value),
    }))
}

/// A local/parameter declaration with no initializer.
pub fn create_variable_declaration(ast: &mut Ast, name: &str, ty: TypeNode, scope: Option<NodeId>) -> NodeId {
    ast.insert(NodeKind::Variable(VariableDeclaration {
        name: name.to_string(),
        scope,
        ty,
        state_variable: false,
        constant: false,
        visibility: Visibility::Internal,
        value: None,
    }))
}

/// A public, non-payable constructor with empty parameter lists and no body.
pub fn create_default_constructor(ast: &mut Ast, contract: NodeId) -> NodeId {
    let parameters = create_parameter_list(ast, Vec::new());
    let return_parameters = create_parameter_list(ast, Vec::new());
    ast.insert(NodeKind::Function(FunctionDefinition {
        name: String::new(),
        kind: FunctionKind::Constructor,
        visibility: Visibility::Public,
        mutability: Mutability::NonPayable,
        scope: Some(contract),
        parameters,
        return_parameters,
        modifiers: Vec::new(),
        body: None,
    }))
}
