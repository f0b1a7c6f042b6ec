use super::*;
use crate::ast::mapper::AstMapper;
use crate::generator;
use crate::transpiler::bytes_index_access::{select_helper, BytesIndexAccess, BYTES_ACCESS_LIBRARY};
use proptest::prelude::*;

/// The single support-library call left in the tree.
fn only_call(ast: &Ast) -> Result<(NodeId, FunctionCall)> {
    let calls: Vec<NodeId> = reachable_with_tag(ast, NodeTag::FunctionCall)
        .into_iter()
        .filter(|&id| match ast.kind(id) {
            NodeKind::FunctionCall(call) => ast
                .kind(call.callee)
                .referenced_declaration()
                .map_or(false, |decl| ast.imports().is_stub(decl)),
            _ => false,
        })
        .collect();
    match calls.as_slice() {
        [call] => match ast.kind(*call) {
            NodeKind::FunctionCall(payload) => Ok((*call, payload.clone())),
            _ => Err(anyhow!("not a call")),
        },
        other => Err(anyhow!("expected one support call, found {}", other.len())),
    }
}

#[test]
fn test_full_width_literal_index() -> Result<()> {
    let source = r#"
        contract C {
            function f(bytes32 b) public pure returns (bytes1) {
                bytes1 x = b[2];
                return x;
            }
        }
    "#;
    let ast = lowered(source, None)?;
    assert!(reachable_with_tag(&ast, NodeTag::IndexAccess).is_empty());

    let (_, call) = only_call(&ast)?;
    assert_eq!(call.arguments.len(), 2);
    assert_eq!(call.type_string, "uint8");
    let stub = ast.kind(call.callee).referenced_declaration().ok_or_else(|| anyhow!("unbound callee"))?;
    assert_eq!(ast.name_of(stub), Some("byte256_at_index_uint256"));

    let record = ast
        .imports()
        .get(BYTES_ACCESS_LIBRARY, "byte256_at_index_uint256")
        .ok_or_else(|| anyhow!("import not recorded"))?;
    assert_eq!(record.declaration, stub);
    assert_eq!(ast.function(stub)?.kind, FunctionKind::Free);
    assert!(ast.function(stub)?.body.is_none());
    Ok(())
}

#[test]
fn test_narrow_base_with_uint8_index() -> Result<()> {
    let source = r#"
        contract C {
            function g(bytes4 b, uint8 i) public pure {
                bytes1 x = b[i];
            }
        }
    "#;
    let ast = lowered(source, None)?;
    let (_, call) = only_call(&ast)?;
    assert_eq!(call.arguments.len(), 3);
    let stub = ast.kind(call.callee).referenced_declaration().ok_or_else(|| anyhow!("unbound callee"))?;
    assert_eq!(ast.name_of(stub), Some("byte_at_index"));

    match ast.kind(call.arguments[2]) {
        NodeKind::Literal(lit) => {
            assert_eq!(lit.value, "4");
            assert_eq!(lit.type_string, "uint8");
        }
        other => return Err(anyhow!("width is a {:?}", other.tag())),
    }

    let params = ast.parameters_of(stub)?;
    assert_eq!(ast.variable(params[0])?.ty, TypeNode::FixedBytes(4));
    assert_eq!(ast.variable(params[1])?.ty, TypeNode::uint8());
    assert_eq!(ast.variable(params[2])?.ty, TypeNode::uint8());
    Ok(())
}

#[test]
fn test_non_fixed_bytes_access_is_left_alone() -> Result<()> {
    let source = r#"
        contract C {
            mapping(uint256 => uint8) values;
            function h(uint256 k) public view returns (uint8) {
                return values[k];
            }
        }
    "#;
    let ast = lowered(source, None)?;
    assert_eq!(reachable_with_tag(&ast, NodeTag::IndexAccess).len(), 1);
    assert!(ast.imports().is_empty());
    Ok(())
}

#[test]
fn test_registrar_shares_one_stub_per_helper() -> Result<()> {
    let source = r#"
        contract C {
            function f(bytes32 b, bytes32 c) public pure {
                bytes1 x = b[0];
                bytes1 y = c[31];
            }
        }
    "#;
    let ast = lowered(source, None)?;
    assert_eq!(ast.imports().len(), 1);

    let callees: Vec<NodeId> = reachable_with_tag(&ast, NodeTag::FunctionCall)
        .into_iter()
        .filter_map(|id| match ast.kind(id) {
            NodeKind::FunctionCall(call) => ast.kind(call.callee).referenced_declaration(),
            _ => None,
        })
        .collect();
    assert_eq!(callees.len(), 2);
    assert_eq!(callees[0], callees[1]);

    let unit = ast.roots()[0];
    let NodeKind::SourceUnit(source_unit) = ast.kind(unit) else {
        return Err(anyhow!("root is not a source unit"));
    };
    assert_eq!(source_unit.nodes.len(), 2);
    assert_eq!(ast.root_of(callees[0]), unit);
    Ok(())
}

#[test]
fn test_nested_accesses_are_lowered() -> Result<()> {
    let source = r#"
        contract C {
            bytes4 table;
            function f(bytes32 b) public view {
                bytes1 x = table[b[0]];
            }
        }
    "#;
    let ast = lowered(source, None)?;
    assert!(reachable_with_tag(&ast, NodeTag::IndexAccess).is_empty());
    assert_eq!(ast.imports().len(), 2);
    assert!(ast.imports().get(BYTES_ACCESS_LIBRARY, "byte_at_index").is_some());
    assert!(ast.imports().get(BYTES_ACCESS_LIBRARY, "byte256_at_index_uint256").is_some());
    Ok(())
}

#[test]
fn test_lowering_is_idempotent() -> Result<()> {
    let source = r#"
        contract C {
            function f(bytes16 b, uint256 i) public pure {
                bytes1 x = b[i];
            }
        }
    "#;
    let mut ast = lowered(source, None)?;
    let once = generator::generate(&ast);
    let imports = ast.imports().len();

    BytesIndexAccess.map(&mut ast)?;
    assert_eq!(generator::generate(&ast), once);
    assert_eq!(ast.imports().len(), imports);
    assert!(once.contains(r#"import {byte_at_index_uint256} from "support_lib.maths.bytes_access";"#));
    Ok(())
}

#[test]
fn test_until_stops_before_bytes_lowering() -> Result<()> {
    let source = r#"
        contract C {
            function f(bytes32 b) public pure {
                bytes1 x = b[1];
            }
        }
    "#;
    let ast = lowered(source, Some("Ci"))?;
    assert_eq!(reachable_with_tag(&ast, NodeTag::IndexAccess).len(), 1);
    assert!(ast.imports().is_empty());
    Ok(())
}

fn index_type() -> impl Strategy<Value = TypeNode> {
    prop_oneof![
        (1u16..=32).prop_map(|n| TypeNode::uint(n * 8)),
        (1u16..=32).prop_map(|n| TypeNode::int(n * 8)),
    ]
}

proptest! {
    #[test]
    fn helper_choice_tracks_width_and_index_type(width in 1u8..=32, ty in index_type()) {
        let helper = select_helper(width, &ty);
        prop_assert_eq!(helper.starts_with("byte256_"), width == 32);
        prop_assert_eq!(helper.ends_with("_uint256"), ty.is_uint256());
    }
}
