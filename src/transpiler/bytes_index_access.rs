//! Lower `bN[i]` to a call into the bytes-access support library.
//!
//! Helper choice is a 2x2 dispatch on whether the index is a `uint256` and
//! whether the base is full width (`bytes32`). Helpers for narrower bases
//! take the width as a trailing `uint8` so they can bound their shift/mask.

use tracing::debug;

use crate::ast::mapper::AstMapper;
use crate::ast::nodes::*;
use crate::ast::templates::{create_call_to_function, create_number_literal};
use crate::ast::{Ast, NodeId, TypeNode};
use crate::errors::{Result, TranspileError};

pub const BYTES_ACCESS_LIBRARY: &str = "support_lib.maths.bytes_access";

const FULL_WIDTH: u8 = 32;

#[derive(Debug, Default)]
pub struct BytesIndexAccess;

impl AstMapper for BytesIndexAccess {
    fn pass_name(&self) -> &'static str {
        "BytesIndexAccess"
    }

    fn visit_index_access(&mut self, node: NodeId, ast: &mut Ast) -> Result<()> {
        let NodeKind::IndexAccess(access) = ast.kind(node) else {
            return Err(TranspileError::consistency(format!("{} is not an index access", node)));
        };
        let (base, index) = (access.base, access.index);
        let Some(index) = index else {
            return self.visit_expression(node, ast);
        };
        let base_type = ast.node_type(base)?.generalize().clone();
        let width = match base_type {
            TypeNode::FixedBytes(width) => width,
            _ => return self.visit_expression(node, ast),
        };

        let index_type = match ast.node_type(index)? {
            _ if ast.tag(index) == NodeTag::Literal => TypeNode::uint256(),
            TypeNode::IntLiteral(_) => TypeNode::uint256(),
            other => other,
        };
        let helper = select_helper(width, &index_type);

        let mut parameters = vec![("base".to_string(), base_type), ("index".to_string(), index_type)];
        let mut arguments = vec![base, index];
        if width != FULL_WIDTH {
            parameters.push(("width".to_string(), TypeNode::uint8()));
            arguments.push(create_number_literal(ast, &width.to_string(), "uint8"));
        }
        let stub = ast.register_import(
            node,
            BYTES_ACCESS_LIBRARY,
            helper,
            parameters,
            vec![("res".to_string(), TypeNode::uint8())],
        )?;

        let call = create_call_to_function(ast, stub, arguments)?;
        ast.replace_node(node, call)?;
        let result_type = ast.node_type(call)?.to_string();
        if let Some(slot) = ast.kind_mut(call).type_string_mut() {
            *slot = result_type;
        }
        debug!(node = %node, call = %call, helper, width, "lowered fixed-bytes index access");

        // base and index may hold further accesses
        self.common_visit(call, ast)
    }
}

/// Support function for indexing a `bytes<width>` value with `index_type`.
pub fn select_helper(width: u8, index_type: &TypeNode) -> &'static str {
    match (index_type.is_uint256(), width == FULL_WIDTH) {
        (true, true) => "byte256_at_index_uint256",
        (true, false) => "byte_at_index_uint256",
        (false, true) => "byte256_at_index",
        (false, false) => "byte_at_index",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dispatch_table() {
        assert_eq!(select_helper(32, &TypeNode::uint256()), "byte256_at_index_uint256");
        assert_eq!(select_helper(4, &TypeNode::uint256()), "byte_at_index_uint256");
        assert_eq!(select_helper(32, &TypeNode::uint8()), "byte256_at_index");
        assert_eq!(select_helper(4, &TypeNode::uint8()), "byte_at_index");
        assert_eq!(select_helper(4, &TypeNode::int(256)), "byte_at_index");
    }
}
