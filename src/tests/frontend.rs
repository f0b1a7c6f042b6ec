use super::*;
use crate::errors::TranspileError;
use crate::generator;

#[test]
fn test_parse_basic_contract() -> Result<()> {
    let source = r#"
        pragma solidity ^0.8.0;

        contract Counter {
            uint256 count;
            function increment() public {
                count = count + 1;
            }
        }
    "#;
    let ast = parser::parse(source)?;
    let counter = contract_named(&ast, "Counter")?;
    let contract = ast.contract(counter)?;
    assert_eq!(contract.members.len(), 2);
    assert_eq!(contract.linearized_base_contracts, vec![counter]);
    Ok(())
}

#[test]
fn test_parse_state_variables() -> Result<()> {
    let source = r#"
        contract Test {
            uint256 count;
            bool flag;
            address payable owner;
            bytes data;
            uint8[4] small;
        }
    "#;
    let ast = parser::parse(source)?;
    let test = contract_named(&ast, "Test")?;
    let types: Vec<String> = ast
        .contract(test)?
        .members
        .iter()
        .map(|&m| ast.variable(m).map(|v| v.ty.to_string()))
        .collect::<std::result::Result<_, _>>()?;
    assert_eq!(types, ["uint256", "bool", "address payable", "bytes storage", "uint8[4] storage"]);
    Ok(())
}

#[test]
fn test_parse_function_with_return() -> Result<()> {
    let source = r#"
        contract Test {
            uint256 value;
            function getValue() public view returns (uint256) {
                return value;
            }
        }
    "#;
    let ast = parser::parse(source)?;
    let test = contract_named(&ast, "Test")?;
    let func = ast.contract(test)?.members[1];
    assert_eq!(ast.name_of(func), Some("getValue"));
    assert_eq!(ast.function(func)?.mutability, Mutability::View);
    assert_eq!(ast.function(func)?.scope, Some(test));
    let returns = ast.return_parameters_of(func)?;
    assert_eq!(ast.variable(returns[0])?.ty, TypeNode::uint256());
    Ok(())
}

#[test]
fn test_operator_precedence() -> Result<()> {
    let source = r#"
        contract Test {
            function f(uint256 a, uint256 b) public pure returns (bool) {
                return a + b * 2 == a || b < 1;
            }
        }
    "#;
    let ast = parser::parse(source)?;
    let ret = reachable_with_tag(&ast, NodeTag::Return)[0];
    let NodeKind::Return(Return { expression: Some(expr) }) = ast.kind(ret) else {
        return Err(anyhow!("return without value"));
    };
    let NodeKind::BinaryOperation(or) = ast.kind(*expr) else {
        return Err(anyhow!("expected `||` at the top"));
    };
    assert_eq!(or.operator, "||");
    let NodeKind::BinaryOperation(eq) = ast.kind(or.left) else {
        return Err(anyhow!("expected `==` on the left"));
    };
    assert_eq!(eq.operator, "==");
    let NodeKind::BinaryOperation(sum) = ast.kind(eq.left) else {
        return Err(anyhow!("expected `+`"));
    };
    assert_eq!(sum.operator, "+");
    assert!(matches!(ast.kind(sum.right), NodeKind::BinaryOperation(mul) if mul.operator == "*"));
    assert_eq!(ast.kind(*expr).type_string(), Some("bool"));
    Ok(())
}

#[test]
fn test_keyword_prefixed_identifiers() -> Result<()> {
    let source = r#"
        contract Test {
            uint256 returnValue;
            function f() public {
                if (returnValue == 0) { returnValue = 1; } else returnValue = 2;
            }
        }
    "#;
    let ast = parser::parse(source)?;
    assert_eq!(reachable_with_tag(&ast, NodeTag::If).len(), 1);
    assert!(reachable_with_tag(&ast, NodeTag::Return).is_empty());
    Ok(())
}

#[test]
fn test_syntax_error() {
    let err = parser::parse("contract { }").unwrap_err();
    assert!(err.chain().any(|cause| cause.to_string().starts_with("Syntax error")));
}

#[test]
fn test_plain_modifiers_are_not_supported_yet() {
    let err = parser::parse("contract C { constructor() onlyOwner { } }").unwrap_err();
    let err = err.downcast_ref::<TranspileError>().unwrap();
    assert!(err.is_not_supported());
    assert!(err.to_string().contains("`onlyOwner`"));
}

#[test]
fn test_unknown_pass_key() -> Result<()> {
    let mut ast = parser::parse("contract A {}")?;
    let options = LowerOptions { until: Some("Xx".to_string()) };
    let err = transpiler::lower(&mut ast, &options).unwrap_err();
    assert_eq!(err.to_string(), "Unknown pass `Xx`");
    Ok(())
}

#[test]
fn test_generate_lowered_source() -> Result<()> {
    let source = r#"
        contract Base {
            uint256 value;
            constructor(uint256 a) { value = a; }
        }
        contract Derived is Base(10) {
            function first(bytes32 b) public pure returns (bytes1) {
                return b[0];
            }
        }
    "#;
    let ast = lowered(source, None)?;
    let output = generator::generate(&ast);

    assert!(output.contains(r#"import {byte256_at_index_uint256} from "support_lib.maths.bytes_access";"#));
    assert!(output.contains("contract Derived is Base(10) {"));
    assert!(output.contains("return byte256_at_index_uint256(b, 0);"));
    assert!(output.contains("uint256 __constructor_arg_1 = 10;"));
    assert!(output.contains("__constructor_2(__constructor_arg_1);"));
    assert!(output.contains("function __constructor_2(uint256 a) private {"));
    // stubs are imported, never printed as functions
    assert!(!output.contains("function byte256_at_index_uint256"));
    Ok(())
}
