//! Pass framework: depth-first traversal with one hook per node kind.
//!
//! Implement [`AstMapper`] for a pass and override only the hooks it needs.
//! Every hook defaults to its group hook (`visit_expression`,
//! `visit_statement`, `visit_declaration`), and the group hooks default to
//! [`AstMapper::common_visit`], which recurses into all children. Leaving a
//! hook without calling back into `common_visit` prunes traversal there.
//!
//! A hook that replaces its node (see [`Ast::replace_node`]) must continue
//! into the replacement itself; the traversal holds on to a snapshot of the
//! parent's children and never returns to a detached node.

use tracing::{debug, trace};

use crate::errors::Result;

use super::nodes::NodeTag;
use super::{Ast, NodeId};

pub trait AstMapper {
    /// Short key naming the pass in logs and pipeline options.
    fn pass_name(&self) -> &'static str;

    /// Run the pass over every root of the tree.
    fn map(&mut self, ast: &mut Ast) -> Result<()> {
        debug!(pass = self.pass_name(), "running pass");
        for root in ast.roots().to_vec() {
            self.dispatch_visit(root, ast)?;
        }
        Ok(())
    }

    fn dispatch_visit(&mut self, node: NodeId, ast: &mut Ast) -> Result<()> {
        trace!(pass = self.pass_name(), node = %node, "visit");
        match ast.tag(node) {
            NodeTag::SourceUnit => self.visit_source_unit(node, ast),
            NodeTag::Contract => self.visit_contract_definition(node, ast),
            NodeTag::InheritanceSpecifier => self.visit_inheritance_specifier(node, ast),
            NodeTag::Function => self.visit_function_definition(node, ast),
            NodeTag::ParameterList => self.visit_parameter_list(node, ast),
            NodeTag::ModifierInvocation => self.visit_modifier_invocation(node, ast),
            NodeTag::Variable => self.visit_variable_declaration(node, ast),
            NodeTag::Block => self.visit_block(node, ast),
            NodeTag::VariableDeclarationStatement => self.visit_variable_declaration_statement(node, ast),
            NodeTag::ExpressionStatement => self.visit_expression_statement(node, ast),
            NodeTag::If => self.visit_if_statement(node, ast),
            NodeTag::Return => self.visit_return(node, ast),
            NodeTag::Identifier => self.visit_identifier(node, ast),
            NodeTag::Literal => self.visit_literal(node, ast),
            NodeTag::IndexAccess => self.visit_index_access(node, ast),
            NodeTag::FunctionCall => self.visit_function_call(node, ast),
            NodeTag::MemberAccess => self.visit_member_access(node, ast),
            NodeTag::BinaryOperation => self.visit_binary_operation(node, ast),
            NodeTag::UnaryOperation => self.visit_unary_operation(node, ast),
            NodeTag::Assignment => self.visit_assignment(node, ast),
        }
    }

    /// Visit every current child of `node`, in order.
    fn common_visit(&mut self, node: NodeId, ast: &mut Ast) -> Result<()> {
        for child in ast.children(node) {
            self.dispatch_visit(child, ast)?;
        }
        Ok(())
    }

    // Groups

    fn visit_declaration(&mut self, node: NodeId, ast: &mut Ast) -> Result<()> {
        self.common_visit(node, ast)
    }

    fn visit_statement(&mut self, node: NodeId, ast: &mut Ast) -> Result<()> {
        self.common_visit(node, ast)
    }

    fn visit_expression(&mut self, node: NodeId, ast: &mut Ast) -> Result<()> {
        self.common_visit(node, ast)
    }

    // Declarations

    fn visit_source_unit(&mut self, node: NodeId, ast: &mut Ast) -> Result<()> {
        self.common_visit(node, ast)
    }

    fn visit_contract_definition(&mut self, node: NodeId, ast: &mut Ast) -> Result<()> {
        self.visit_declaration(node, ast)
    }

    fn visit_inheritance_specifier(&mut self, node: NodeId, ast: &mut Ast) -> Result<()> {
        self.common_visit(node, ast)
    }

    fn visit_function_definition(&mut self, node: NodeId, ast: &mut Ast) -> Result<()> {
        self.visit_declaration(node, ast)
    }

    fn visit_parameter_list(&mut self, node: NodeId, ast: &mut Ast) -> Result<()> {
        self.common_visit(node, ast)
    }

    fn visit_modifier_invocation(&mut self, node: NodeId, ast: &mut Ast) -> Result<()> {
        self.common_visit(node, ast)
    }

    fn visit_variable_declaration(&mut self, node: NodeId, ast: &mut Ast) -> Result<()> {
        self.visit_declaration(node, ast)
    }

    // Statements

    fn visit_block(&mut self, node: NodeId, ast: &mut Ast) -> Result<()> {
        self.visit_statement(node, ast)
    }

    fn visit_variable_declaration_statement(&mut self, node: NodeId, ast: &mut Ast) -> Result<()> {
        self.visit_statement(node, ast)
    }

    fn visit_expression_statement(&mut self, node: NodeId, ast: &mut Ast) -> Result<()> {
        self.visit_statement(node, ast)
    }

    fn visit_if_statement(&mut self, node: NodeId, ast: &mut Ast) -> Result<()> {
        self.visit_statement(node, ast)
    }

    fn visit_return(&mut self, node: NodeId, ast: &mut Ast) -> Result<()> {
        self.visit_statement(node, ast)
    }

    // Expressions

    fn visit_identifier(&mut self, node: NodeId, ast: &mut Ast) -> Result<()> {
        self.visit_expression(node, ast)
    }

    fn visit_literal(&mut self, node: NodeId, ast: &mut Ast) -> Result<()> {
        self.visit_expression(node, ast)
    }

    fn visit_index_access(&mut self, node: NodeId, ast: &mut Ast) -> Result<()> {
        self.visit_expression(node, ast)
    }

    fn visit_function_call(&mut self, node: NodeId, ast: &mut Ast) -> Result<()> {
        self.visit_expression(node, ast)
    }

    fn visit_member_access(&mut self, node: NodeId, ast: &mut Ast) -> Result<()> {
        self.visit_expression(node, ast)
    }

    fn visit_binary_operation(&mut self, node: NodeId, ast: &mut Ast) -> Result<()> {
        self.visit_expression(node, ast)
    }

    fn visit_unary_operation(&mut self, node: NodeId, ast: &mut Ast) -> Result<()> {
        self.visit_expression(node, ast)
    }

    fn visit_assignment(&mut self, node: NodeId, ast: &mut Ast) -> Result<()> {
        self.visit_expression(node, ast)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::nodes::*;
    use crate::ast::templates::*;

    #[derive(Default)]
    struct LiteralCounter {
        seen: Vec<String>,
    }

    impl AstMapper for LiteralCounter {
        fn pass_name(&self) -> &'static str {
            "LiteralCounter"
        }

        fn visit_literal(&mut self, node: NodeId, ast: &mut Ast) -> Result<()> {
            if let NodeKind::Literal(lit) = ast.kind(node) {
                self.seen.push(lit.value.clone());
            }
            Ok(())
        }
    }

    /// Doubles every literal by replacing it with `lit + lit`.
    struct Doubler;

    impl AstMapper for Doubler {
        fn pass_name(&self) -> &'static str {
            "Doubler"
        }

        fn visit_literal(&mut self, node: NodeId, ast: &mut Ast) -> Result<()> {
            let NodeKind::Literal(lit) = ast.kind(node).clone() else { unreachable!() };
            if lit.value != "7" {
                return Ok(());
            }
            let left = create_number_literal(ast, "3", "int_const 3");
            let right = create_number_literal(ast, "4", "int_const 4");
            let sum = ast.insert(NodeKind::BinaryOperation(BinaryOperation {
                operator: "+".into(),
                left,
                right,
                type_string: "int_const 7".into(),
            }));
            ast.replace_node(node, sum)?;
            self.common_visit(sum, ast)
        }
    }

    fn tree_with(ast: &mut Ast, values: &[&str]) -> NodeId {
        let stmts = values
            .iter()
            .map(|v| {
                let lit = create_number_literal(ast, v, &format!("int_const {}", v));
                create_expression_statement(ast, lit)
            })
            .collect();
        let block = create_block(ast, stmts);
        ast.add_root(NodeKind::SourceUnit(SourceUnit { path: "t.sol".into(), nodes: vec![block] }))
    }

    #[test]
    fn default_traversal_reaches_every_leaf_in_order() {
        let mut ast = Ast::new();
        tree_with(&mut ast, &["1", "2", "3"]);
        let mut counter = LiteralCounter::default();
        counter.map(&mut ast).unwrap();
        assert_eq!(counter.seen, ["1", "2", "3"]);
    }

    #[test]
    fn traversal_continues_into_replacement() {
        let mut ast = Ast::new();
        tree_with(&mut ast, &["7"]);
        Doubler.map(&mut ast).unwrap();

        let mut counter = LiteralCounter::default();
        counter.map(&mut ast).unwrap();
        assert_eq!(counter.seen, ["3", "4"]);
    }
}
