use super::ast::*;
use super::parser;
use super::transpiler::{self, LowerOptions};
use anyhow::{anyhow, Result};

mod bytes_index_access;
mod frontend;

/// Parse `source` and run the pipeline, up to and including pass `until`.
fn lowered(source: &str, until: Option<&str>) -> Result<Ast> {
    let mut ast = parser::parse(source)?;
    let options = LowerOptions { until: until.map(String::from) };
    transpiler::lower(&mut ast, &options)?;
    Ok(ast)
}

fn contract_named(ast: &Ast, name: &str) -> Result<NodeId> {
    ast.find_contract(name).ok_or_else(|| anyhow!("no contract `{}`", name))
}

fn constructor_body(ast: &Ast, contract: NodeId) -> Result<Vec<NodeId>> {
    let constructor = ast
        .constructor_of(contract)?
        .ok_or_else(|| anyhow!("contract {} has no constructor", contract))?;
    let body = ast
        .function(constructor)?
        .body
        .ok_or_else(|| anyhow!("constructor {} has no body", constructor))?;
    match ast.kind(body) {
        NodeKind::Block(block) => Ok(block.statements.clone()),
        other => Err(anyhow!("constructor body is a {:?}", other.tag())),
    }
}

/// Declaration called by the expression statement `stmt`.
fn called_function(ast: &Ast, stmt: NodeId) -> Result<NodeId> {
    let NodeKind::ExpressionStatement(stmt) = ast.kind(stmt) else {
        return Err(anyhow!("{} is not an expression statement", stmt));
    };
    let NodeKind::FunctionCall(call) = ast.kind(stmt.expression) else {
        return Err(anyhow!("{} is not a call", stmt.expression));
    };
    ast.kind(call.callee)
        .referenced_declaration()
        .ok_or_else(|| anyhow!("callee of {} is unresolved", stmt.expression))
}

fn reachable_with_tag(ast: &Ast, tag: NodeTag) -> Vec<NodeId> {
    ast.reachable_nodes()
        .into_iter()
        .filter(|&id| ast.tag(id) == tag)
        .collect()
}
