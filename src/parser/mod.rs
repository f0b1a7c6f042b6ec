//! Reference frontend for a Solidity subset.
//!
//! Builds the arena tree straight from the pest parse, then hands it to
//! [`resolve`] for name binding, linearization and type annotation, so the
//! result looks like what a full type-checking frontend would supply.

mod resolve;

use anyhow::{anyhow, Context, Result};
use pest::iterators::Pair;
use pest::Parser;
use pest_derive::Parser;
use tracing::{debug, trace};

use crate::ast::nodes::*;
use crate::ast::templates::{create_block, create_parameter_list};
use crate::ast::{Ast, DataLocation, NodeId, TypeNode};
use crate::errors::TranspileError;

pub use resolve::resolve;

#[derive(Parser)]
#[grammar = "parser/solidity.pest"]
pub struct SolidityParser;

/// Parse and resolve a single source file.
pub fn parse(source: &str) -> Result<Ast> {
    parse_all(&[("input.sol", source)])
}

/// Parse and resolve several source files into one tree, one root per file.
pub fn parse_all(sources: &[(&str, &str)]) -> Result<Ast> {
    let mut ast = Ast::new();
    for (path, source) in sources {
        parse_source_unit(&mut ast, path, source).with_context(|| format!("Failed to parse {}", path))?;
    }
    resolve(&mut ast).with_context(|| "Failed to resolve declarations")?;
    Ok(ast)
}

fn parse_source_unit(ast: &mut Ast, path: &str, source: &str) -> Result<NodeId> {
    let mut pairs = SolidityParser::parse(Rule::source_unit, source)
        .map_err(|e| TranspileError::syntax(e.to_string()))?;
    let unit = pairs.next().ok_or_else(|| anyhow!("Empty source unit"))?;

    let mut nodes = Vec::new();
    for item in unit.into_inner() {
        if item.as_rule() == Rule::contract_definition {
            nodes.push(parse_contract(item, ast)?);
        }
    }
    debug!(path, contracts = nodes.len(), "parsed source unit");
    Ok(ast.add_root(NodeKind::SourceUnit(SourceUnit { path: path.to_string(), nodes })))
}

fn parse_contract(pair: Pair<Rule>, ast: &mut Ast) -> Result<NodeId> {
    let mut contract = ContractDefinition {
        name: String::new(),
        is_abstract: false,
        linearized_base_contracts: Vec::new(),
        inheritance_specifiers: Vec::new(),
        members: Vec::new(),
    };

    for item in pair.into_inner() {
        match item.as_rule() {
            Rule::abstract_modifier => contract.is_abstract = true,
            Rule::identifier => contract.name = item.as_str().to_string(),
            Rule::inheritance_list => {
                for spec in item.into_inner() {
                    contract.inheritance_specifiers.push(parse_inheritance_specifier(spec, ast)?);
                }
            }
            Rule::constructor_definition => contract.members.push(parse_constructor(item, ast)?),
            Rule::function_definition => contract.members.push(parse_function(item, ast)?),
            Rule::state_variable_declaration => contract.members.push(parse_state_variable(item, ast)?),
            _ => {}
        }
    }

    if contract.name.is_empty() {
        return Err(anyhow!("Contract name not found"));
    }
    trace!(contract = %contract.name, members = contract.members.len(), "parsed contract");
    Ok(ast.insert(NodeKind::Contract(contract)))
}

fn parse_inheritance_specifier(pair: Pair<Rule>, ast: &mut Ast) -> Result<NodeId> {
    let mut inner = pair.into_inner();
    let base_name = inner
        .next()
        .ok_or_else(|| anyhow!("Base contract name not found"))?
        .as_str()
        .to_string();
    let arguments = match inner.next() {
        Some(args) => parse_call_arguments(args, ast)?,
        None => Vec::new(),
    };
    Ok(ast.insert(NodeKind::InheritanceSpecifier(InheritanceSpecifier {
        base_name,
        referenced_declaration: None,
        arguments,
    })))
}

fn parse_constructor(pair: Pair<Rule>, ast: &mut Ast) -> Result<NodeId> {
    let mut parameters = None;
    let mut visibility = Visibility::Public;
    let mut mutability = Mutability::NonPayable;
    let mut modifiers = Vec::new();
    let mut body = None;

    for item in pair.into_inner() {
        match item.as_rule() {
            Rule::parameter_list => parameters = Some(parse_parameter_list(item, ast)?),
            Rule::visibility => visibility = parse_visibility(&item)?,
            Rule::state_mutability => mutability = parse_mutability(&item)?,
            Rule::modifier_invocation => modifiers.push(parse_modifier_invocation(item, ast)?),
            Rule::block => body = Some(parse_block(item, ast)?),
            _ => {}
        }
    }

    let parameters = parameters.ok_or_else(|| anyhow!("Constructor parameter list not found"))?;
    let return_parameters = create_parameter_list(ast, Vec::new());
    Ok(ast.insert(NodeKind::Function(FunctionDefinition {
        name: String::new(),
        kind: FunctionKind::Constructor,
        visibility,
        mutability,
        scope: None,
        parameters,
        return_parameters,
        modifiers,
        body,
    })))
}

fn parse_modifier_invocation(pair: Pair<Rule>, ast: &mut Ast) -> Result<NodeId> {
    let mut inner = pair.into_inner();
    let name = inner
        .next()
        .ok_or_else(|| anyhow!("Modifier name not found"))?
        .as_str()
        .to_string();
    let arguments = match inner.next() {
        Some(args) => parse_call_arguments(args, ast)?,
        None => Vec::new(),
    };
    Ok(ast.insert(NodeKind::ModifierInvocation(ModifierInvocation {
        name,
        referenced_declaration: None,
        arguments,
    })))
}

fn parse_function(pair: Pair<Rule>, ast: &mut Ast) -> Result<NodeId> {
    let mut name = String::new();
    let mut parameters = None;
    let mut return_parameters = None;
    let mut visibility = Visibility::Public;
    let mut mutability = Mutability::NonPayable;
    let mut body = None;

    for item in pair.into_inner() {
        match item.as_rule() {
            Rule::identifier => name = item.as_str().to_string(),
            Rule::parameter_list => parameters = Some(parse_parameter_list(item, ast)?),
            Rule::visibility => visibility = parse_visibility(&item)?,
            Rule::state_mutability => mutability = parse_mutability(&item)?,
            Rule::returns_clause => {
                let list = item
                    .into_inner()
                    .next()
                    .ok_or_else(|| anyhow!("Invalid return type"))?;
                return_parameters = Some(parse_parameter_list(list, ast)?);
            }
            Rule::block => body = Some(parse_block(item, ast)?),
            _ => {}
        }
    }

    if name.is_empty() {
        return Err(anyhow!("Function must have a name"));
    }
    let parameters = parameters.ok_or_else(|| anyhow!("Parameter list of `{}` not found", name))?;
    let return_parameters = match return_parameters {
        Some(list) => list,
        None => create_parameter_list(ast, Vec::new()),
    };
    Ok(ast.insert(NodeKind::Function(FunctionDefinition {
        name,
        kind: FunctionKind::Function,
        visibility,
        mutability,
        scope: None,
        parameters,
        return_parameters,
        modifiers: Vec::new(),
        body,
    })))
}

fn parse_visibility(pair: &Pair<Rule>) -> Result<Visibility> {
    Visibility::from_keyword(pair.as_str()).ok_or_else(|| anyhow!("Unknown visibility `{}`", pair.as_str()))
}

fn parse_mutability(pair: &Pair<Rule>) -> Result<Mutability> {
    Mutability::from_keyword(pair.as_str()).ok_or_else(|| anyhow!("Unknown mutability `{}`", pair.as_str()))
}

fn parse_parameter_list(pair: Pair<Rule>, ast: &mut Ast) -> Result<NodeId> {
    let mut params = Vec::new();
    for param in pair.into_inner() {
        if param.as_rule() != Rule::parameter {
            continue;
        }
        let mut ty = None;
        let mut location = None;
        let mut name = String::new();
        for token in param.into_inner() {
            match token.as_rule() {
                Rule::type_name => ty = Some(parse_type_name(token)?),
                Rule::data_location => location = DataLocation::from_keyword(token.as_str()),
                Rule::identifier => name = token.as_str().to_string(),
                _ => {}
            }
        }
        let ty = ty.ok_or_else(|| anyhow!("Parameter type not found"))?;
        params.push(ast.insert(NodeKind::Variable(VariableDeclaration {
            name,
            scope: None,
            ty: with_location(ty, location),
            state_variable: false,
            constant: false,
            visibility: Visibility::Internal,
            value: None,
        })));
    }
    Ok(create_parameter_list(ast, params))
}

fn with_location(ty: TypeNode, location: Option<DataLocation>) -> TypeNode {
    match (location, &ty) {
        (
            Some(location),
            TypeNode::Bytes | TypeNode::String | TypeNode::Array { .. } | TypeNode::Mapping { .. },
        ) => TypeNode::Pointer { to: Box::new(ty), location },
        _ => ty,
    }
}

fn parse_type_name(pair: Pair<Rule>) -> Result<TypeNode> {
    let mut ty = None;
    for item in pair.into_inner() {
        match item.as_rule() {
            Rule::elementary_type => {
                let text = item.as_str();
                ty = Some(if text.starts_with("address") && text.ends_with("payable") {
                    TypeNode::Address { payable: true }
                } else {
                    TypeNode::elementary(text).ok_or_else(|| anyhow!("Unknown type `{}`", text))?
                });
            }
            Rule::mapping_type => {
                let mut inner = item.into_inner();
                let key = inner.next().ok_or_else(|| anyhow!("Mapping key type not found"))?;
                let value = inner.next().ok_or_else(|| anyhow!("Mapping value type not found"))?;
                ty = Some(TypeNode::Mapping {
                    key: Box::new(parse_type_name(key)?),
                    value: Box::new(parse_type_name(value)?),
                });
            }
            Rule::array_suffix => {
                let element = ty.take().ok_or_else(|| anyhow!("Array suffix without element type"))?;
                let length = match item.into_inner().next() {
                    Some(n) => Some(n.as_str().parse().with_context(|| "Invalid array length")?),
                    None => None,
                };
                ty = Some(TypeNode::Array { element: Box::new(element), length });
            }
            _ => {}
        }
    }
    ty.ok_or_else(|| anyhow!("Type name not found"))
}

fn parse_state_variable(pair: Pair<Rule>, ast: &mut Ast) -> Result<NodeId> {
    let mut ty = None;
    let mut name = String::new();
    let mut visibility = Visibility::Internal;
    let mut constant = false;
    let mut value = None;

    for token in pair.into_inner() {
        match token.as_rule() {
            Rule::type_name => ty = Some(parse_type_name(token)?),
            Rule::visibility => visibility = parse_visibility(&token)?,
            Rule::constant_keyword => constant = true,
            Rule::identifier => name = token.as_str().to_string(),
            Rule::expression => value = Some(parse_expression(token, ast)?),
            _ => {}
        }
    }

    let ty = ty.ok_or_else(|| anyhow!("Type of state variable `{}` not found", name))?;
    let ty = match ty {
        TypeNode::Bytes | TypeNode::String | TypeNode::Array { .. } | TypeNode::Mapping { .. } => {
            TypeNode::Pointer { to: Box::new(ty), location: DataLocation::Storage }
        }
        other => other,
    };
    Ok(ast.insert(NodeKind::Variable(VariableDeclaration {
        name,
        scope: None,
        ty,
        state_variable: true,
        constant,
        visibility,
        value,
    })))
}

fn parse_block(pair: Pair<Rule>, ast: &mut Ast) -> Result<NodeId> {
    let mut statements = Vec::new();
    for stmt in pair.into_inner() {
        statements.push(parse_statement(stmt, ast)?);
    }
    Ok(create_block(ast, statements))
}

fn parse_statement(pair: Pair<Rule>, ast: &mut Ast) -> Result<NodeId> {
    match pair.as_rule() {
        Rule::block => parse_block(pair, ast),
        Rule::if_statement => {
            let mut parts = pair
                .into_inner()
                .filter(|p| !matches!(p.as_rule(), Rule::kw_if | Rule::kw_else));
            let condition = parts.next().ok_or_else(|| anyhow!("If condition not found"))?;
            let true_body = parts.next().ok_or_else(|| anyhow!("If body not found"))?;
            let false_body = parts.next();
            let condition = parse_expression(condition, ast)?;
            let true_body = parse_statement(true_body, ast)?;
            let false_body = match false_body {
                Some(stmt) => Some(parse_statement(stmt, ast)?),
                None => None,
            };
            Ok(ast.insert(NodeKind::If(IfStatement { condition, true_body, false_body })))
        }
        Rule::return_statement => {
            let expression = match pair.into_inner().find(|p| p.as_rule() == Rule::expression) {
                Some(expr) => Some(parse_expression(expr, ast)?),
                None => None,
            };
            Ok(ast.insert(NodeKind::Return(Return { expression })))
        }
        Rule::variable_declaration_statement => {
            let mut ty = None;
            let mut location = None;
            let mut name = String::new();
            let mut initial_value = None;
            for token in pair.into_inner() {
                match token.as_rule() {
                    Rule::type_name => ty = Some(parse_type_name(token)?),
                    Rule::data_location => location = DataLocation::from_keyword(token.as_str()),
                    Rule::identifier => name = token.as_str().to_string(),
                    Rule::expression => initial_value = Some(parse_expression(token, ast)?),
                    _ => {}
                }
            }
            let ty = ty.ok_or_else(|| anyhow!("Type of local `{}` not found", name))?;
            let decl = ast.insert(NodeKind::Variable(VariableDeclaration {
                name,
                scope: None,
                ty: with_location(ty, location),
                state_variable: false,
                constant: false,
                visibility: Visibility::Internal,
                value: None,
            }));
            Ok(ast.insert(NodeKind::VariableDeclarationStatement(VariableDeclarationStatement {
                declarations: vec![decl],
                initial_value,
            })))
        }
        Rule::expression_statement => {
            let expr = pair
                .into_inner()
                .next()
                .ok_or_else(|| anyhow!("Empty expression statement"))?;
            let expression = parse_expression(expr, ast)?;
            Ok(ast.insert(NodeKind::ExpressionStatement(ExpressionStatement { expression })))
        }
        other => Err(anyhow!("Unexpected statement type: {:?}", other)),
    }
}

fn parse_expression(pair: Pair<Rule>, ast: &mut Ast) -> Result<NodeId> {
    let mut inner = pair.into_inner();
    let first = inner.next().ok_or_else(|| anyhow!("Empty expression"))?;
    let lhs = parse_binary(first, ast)?;
    let Some(operator) = inner.next() else {
        return Ok(lhs);
    };
    let value = inner
        .next()
        .ok_or_else(|| anyhow!("Assignment value not found"))?;
    let rhs = parse_expression(value, ast)?;
    Ok(ast.insert(NodeKind::Assignment(Assignment {
        operator: operator.as_str().to_string(),
        lhs,
        rhs,
        type_string: String::new(),
    })))
}

fn precedence(operator: &str) -> u8 {
    match operator {
        "||" => 1,
        "&&" => 2,
        "==" | "!=" => 3,
        "<" | ">" | "<=" | ">=" => 4,
        "|" => 5,
        "^" => 6,
        "&" => 7,
        "<<" | ">>" => 8,
        "+" | "-" => 9,
        _ => 10,
    }
}

fn parse_binary(pair: Pair<Rule>, ast: &mut Ast) -> Result<NodeId> {
    let mut operands = Vec::new();
    let mut pending: Vec<String> = Vec::new();

    for item in pair.into_inner() {
        match item.as_rule() {
            Rule::binary_operator => {
                let operator = item.as_str().to_string();
                while pending
                    .last()
                    .map_or(false, |top| precedence(top) >= precedence(&operator))
                {
                    if let Some(top) = pending.pop() {
                        reduce(&mut operands, top, ast)?;
                    }
                }
                pending.push(operator);
            }
            _ => operands.push(parse_unary(item, ast)?),
        }
    }
    while let Some(top) = pending.pop() {
        reduce(&mut operands, top, ast)?;
    }
    operands.pop().ok_or_else(|| anyhow!("Expression must have at least one term"))
}

fn reduce(operands: &mut Vec<NodeId>, operator: String, ast: &mut Ast) -> Result<()> {
    let right = operands
        .pop()
        .ok_or_else(|| anyhow!("Missing right operand of `{}`", operator))?;
    let left = operands
        .pop()
        .ok_or_else(|| anyhow!("Missing left operand of `{}`", operator))?;
    operands.push(ast.insert(NodeKind::BinaryOperation(BinaryOperation {
        operator,
        left,
        right,
        type_string: String::new(),
    })));
    Ok(())
}

fn parse_unary(pair: Pair<Rule>, ast: &mut Ast) -> Result<NodeId> {
    let mut operators = Vec::new();
    let mut operand = None;
    for item in pair.into_inner() {
        match item.as_rule() {
            Rule::unary_operator => operators.push(item.as_str().to_string()),
            _ => operand = Some(parse_postfix(item, ast)?),
        }
    }
    let mut expr = operand.ok_or_else(|| anyhow!("Unary operator without operand"))?;
    for operator in operators.into_iter().rev() {
        expr = ast.insert(NodeKind::UnaryOperation(UnaryOperation {
            operator,
            operand: expr,
            type_string: String::new(),
        }));
    }
    Ok(expr)
}

fn parse_postfix(pair: Pair<Rule>, ast: &mut Ast) -> Result<NodeId> {
    let mut inner = pair.into_inner();
    let primary = inner.next().ok_or_else(|| anyhow!("Invalid primary expression"))?;
    let mut expr = parse_primary(primary, ast)?;

    for suffix in inner {
        expr = match suffix.as_rule() {
            Rule::index_suffix => {
                let index = match suffix.into_inner().next() {
                    Some(index) => Some(parse_expression(index, ast)?),
                    None => None,
                };
                ast.insert(NodeKind::IndexAccess(IndexAccess {
                    base: expr,
                    index,
                    type_string: String::new(),
                }))
            }
            Rule::call_arguments => {
                let arguments = parse_call_arguments(suffix, ast)?;
                ast.insert(NodeKind::FunctionCall(FunctionCall {
                    callee: expr,
                    arguments,
                    type_string: String::new(),
                }))
            }
            Rule::member_suffix => {
                let member = suffix
                    .into_inner()
                    .next()
                    .ok_or_else(|| anyhow!("Member name not found"))?;
                ast.insert(NodeKind::MemberAccess(MemberAccess {
                    expression: expr,
                    member_name: member.as_str().to_string(),
                    referenced_declaration: None,
                    type_string: String::new(),
                }))
            }
            other => return Err(anyhow!("Unexpected expression suffix: {:?}", other)),
        };
    }
    Ok(expr)
}

fn parse_primary(pair: Pair<Rule>, ast: &mut Ast) -> Result<NodeId> {
    let text = pair.as_str().to_string();
    let literal = |kind, type_string: String| {
        NodeKind::Literal(Literal { kind, value: text.clone(), type_string })
    };
    let kind = match pair.as_rule() {
        Rule::number_literal => literal(LiteralKind::Number, format!("int_const {}", text)),
        Rule::hex_literal => literal(LiteralKind::HexNumber, format!("int_const {}", text)),
        Rule::bool_literal => literal(LiteralKind::Bool, "bool".to_string()),
        Rule::string_literal => literal(LiteralKind::String, format!("literal_string {}", text)),
        Rule::identifier => NodeKind::Identifier(Identifier {
            name: text.clone(),
            referenced_declaration: None,
            type_string: String::new(),
        }),
        Rule::paren_expression => {
            let inner = pair
                .into_inner()
                .next()
                .ok_or_else(|| anyhow!("Empty parenthesized expression"))?;
            return parse_expression(inner, ast);
        }
        other => return Err(anyhow!("Unexpected term type: {:?}", other)),
    };
    Ok(ast.insert(kind))
}

fn parse_call_arguments(pair: Pair<Rule>, ast: &mut Ast) -> Result<Vec<NodeId>> {
    pair.into_inner().map(|arg| parse_expression(arg, ast)).collect()
}
