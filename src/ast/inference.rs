use crate::errors::{Result, TranspileError};

use super::nodes::{LiteralKind, NodeKind};
use super::types::TypeNode;
use super::{Ast, NodeId};

/// Type-query surface: maps any node to its structural type.
///
/// A production frontend supplies its own implementation; passes only ever
/// reach it through [`Ast::node_type`].
pub trait TypeQuery {
    fn node_type(&self, ast: &Ast, node: NodeId) -> Result<TypeNode>;
}

/// Derives types from declarations already resolved in the tree.
#[derive(Debug, Default, Clone, Copy)]
pub struct StructuralInference;

const COMPARISON_OPERATORS: &[&str] = &["==", "!=", "<", ">", "<=", ">=", "&&", "||"];

impl TypeQuery for StructuralInference {
    fn node_type(&self, ast: &Ast, node: NodeId) -> Result<TypeNode> {
        match ast.kind(node) {
            NodeKind::Variable(var) => Ok(var.ty.clone()),
            NodeKind::Function(_) => function_type(ast, node),
            NodeKind::Contract(contract) => Ok(TypeNode::Contract {
                name: contract.name.clone(),
                definition: Some(node),
            }),
            NodeKind::Identifier(ident) => {
                let decl = ident.referenced_declaration.ok_or_else(|| {
                    TranspileError::consistency(format!("identifier `{}` ({}) is unresolved", ident.name, node))
                })?;
                self.node_type(ast, decl)
            }
            NodeKind::Literal(literal) => literal_type(literal.kind, &literal.value, &literal.type_string),
            NodeKind::IndexAccess(access) => {
                let base = self.node_type(ast, access.base)?;
                match base.generalize() {
                    TypeNode::Array { element, .. } => Ok((**element).clone()),
                    TypeNode::Mapping { value, .. } => Ok((**value).clone()),
                    TypeNode::FixedBytes(_) | TypeNode::Bytes => Ok(TypeNode::FixedBytes(1)),
                    other => Err(TranspileError::not_supported(format!("index access on `{}`", other))),
                }
            }
            NodeKind::FunctionCall(call) => match self.node_type(ast, call.callee)? {
                TypeNode::Function { mut returns, .. } if returns.len() == 1 => Ok(returns.remove(0)),
                TypeNode::Function { returns, .. } => Ok(TypeNode::Tuple(returns)),
                other => Err(TranspileError::not_supported(format!("call of a `{}` value", other))),
            },
            NodeKind::MemberAccess(access) => {
                if let Some(decl) = access.referenced_declaration {
                    return self.node_type(ast, decl);
                }
                let base = self.node_type(ast, access.expression)?;
                match (base.generalize(), access.member_name.as_str()) {
                    (TypeNode::Array { .. } | TypeNode::Bytes, "length") => Ok(TypeNode::uint256()),
                    (other, member) => {
                        Err(TranspileError::not_supported(format!("member `{}` of `{}`", member, other)))
                    }
                }
            }
            NodeKind::BinaryOperation(op) => {
                if COMPARISON_OPERATORS.contains(&op.operator.as_str()) {
                    return Ok(TypeNode::Bool);
                }
                let left = self.node_type(ast, op.left)?;
                if let TypeNode::IntLiteral(_) = left {
                    if op.operator != "<<" && op.operator != ">>" {
                        return self.node_type(ast, op.right);
                    }
                }
                Ok(left)
            }
            NodeKind::UnaryOperation(op) => {
                if op.operator == "!" {
                    return Ok(TypeNode::Bool);
                }
                self.node_type(ast, op.operand)
            }
            NodeKind::Assignment(assign) => self.node_type(ast, assign.lhs),
            other => Err(TranspileError::consistency(format!(
                "node {} ({:?}) has no type",
                node,
                other.tag()
            ))),
        }
    }
}

fn function_type(ast: &Ast, func: NodeId) -> Result<TypeNode> {
    let parameters = ast
        .parameters_of(func)?
        .into_iter()
        .map(|p| ast.variable(p).map(|v| v.ty.clone()))
        .collect::<Result<Vec<_>>>()?;
    let returns = ast
        .return_parameters_of(func)?
        .into_iter()
        .map(|p| ast.variable(p).map(|v| v.ty.clone()))
        .collect::<Result<Vec<_>>>()?;
    Ok(TypeNode::Function { parameters, returns })
}

fn literal_type(kind: LiteralKind, value: &str, type_string: &str) -> Result<TypeNode> {
    if let Some(ty) = TypeNode::from_type_string(type_string) {
        return Ok(ty);
    }
    match kind {
        LiteralKind::Number | LiteralKind::HexNumber => Ok(TypeNode::IntLiteral(value.to_string())),
        LiteralKind::Bool => Ok(TypeNode::Bool),
        LiteralKind::String => Ok(TypeNode::StringLiteral),
    }
}
