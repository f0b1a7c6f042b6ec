//! Registrar for runtime-support functions that passes call into.
//!
//! A lowering that has no target primitive calls a bodyless stub instead. The
//! first request for a `(library, name)` key creates the stub in the
//! requesting source unit; later requests get the same declaration back, so
//! the writer emits exactly one import per key.

use std::collections::HashMap;

use tracing::debug;

use crate::ensure_consistent;
use crate::errors::Result;

use super::nodes::*;
use super::templates::{create_parameter_list, create_variable_declaration};
use super::types::TypeNode;
use super::{Ast, NodeId};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StubSignature {
    pub parameters: Vec<(String, TypeNode)>,
    pub returns: Vec<(String, TypeNode)>,
}

#[derive(Clone, Debug)]
pub struct ImportRecord {
    pub library: String,
    pub name: String,
    pub signature: StubSignature,
    pub declaration: NodeId,
}

#[derive(Debug, Default)]
pub struct ImportRegistry {
    records: Vec<ImportRecord>,
    by_key: HashMap<(String, String), usize>,
}

impl ImportRegistry {
    pub fn get(&self, library: &str, name: &str) -> Option<&ImportRecord> {
        self.by_key
            .get(&(library.to_string(), name.to_string()))
            .map(|&i| &self.records[i])
    }

    /// Records in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &ImportRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn is_stub(&self, decl: NodeId) -> bool {
        self.records.iter().any(|r| r.declaration == decl)
    }

    fn push(&mut self, record: ImportRecord) {
        let key = (record.library.clone(), record.name.clone());
        self.by_key.insert(key, self.records.len());
        self.records.push(record);
    }
}

impl Ast {
    /// Declaration of the support function `library::name`, created on first use.
    ///
    /// `anchor` is the node that needs the import; a new stub is attached to
    /// its source unit.
    pub fn register_import(
        &mut self,
        anchor: NodeId,
        library: &str,
        name: &str,
        parameters: Vec<(String, TypeNode)>,
        returns: Vec<(String, TypeNode)>,
    ) -> Result<NodeId> {
        let signature = StubSignature { parameters, returns };
        if let Some(existing) = self.imports().get(library, name) {
            if existing.signature != signature {
                debug!(library, name, "reusing stub registered with a different signature");
            }
            return Ok(existing.declaration);
        }

        let unit = self.root_of(anchor);
        ensure_consistent!(
            self.tag(unit) == NodeTag::SourceUnit,
            "node {} needs `{}` but does not belong to a source unit",
            anchor,
            name
        );
        let stub = self.create_stub(name, &signature);
        self.append_child(unit, stub)?;
        debug!(library, name, stub = %stub, "registered support function");
        self.imports_mut().push(ImportRecord {
            library: library.to_string(),
            name: name.to_string(),
            signature,
            declaration: stub,
        });
        Ok(stub)
    }

    fn create_stub(&mut self, name: &str, signature: &StubSignature) -> NodeId {
        let parameters: Vec<NodeId> = signature
            .parameters
            .iter()
            .map(|(n, ty)| create_variable_declaration(self, n, ty.clone(), None))
            .collect();
        let returns: Vec<NodeId> = signature
            .returns
            .iter()
            .map(|(n, ty)| create_variable_declaration(self, n, ty.clone(), None))
            .collect();
        let parameter_list = create_parameter_list(self, parameters.clone());
        let return_list = create_parameter_list(self, returns.clone());
        let stub = self.insert(NodeKind::Function(FunctionDefinition {
            name: name.to_string(),
            kind: FunctionKind::Free,
            visibility: Visibility::Internal,
            mutability: Mutability::Pure,
            scope: None,
            parameters: parameter_list,
            return_parameters: return_list,
            modifiers: Vec::new(),
            body: None,
        }));
        for decl in parameters.into_iter().chain(returns) {
            if let NodeKind::Variable(var) = self.kind_mut(decl) {
                var.scope = Some(stub);
            }
        }
        stub
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit(ast: &mut Ast) -> NodeId {
        ast.add_root(NodeKind::SourceUnit(SourceUnit { path: "a.sol".into(), nodes: vec![] }))
    }

    fn byte_params() -> Vec<(String, TypeNode)> {
        vec![("base".into(), TypeNode::FixedBytes(4)), ("index".into(), TypeNode::uint8())]
    }

    #[test]
    fn same_key_returns_same_declaration() {
        let mut ast = Ast::new();
        let unit = unit(&mut ast);
        let ret = vec![("res".to_string(), TypeNode::uint8())];

        let first = ast.register_import(unit, "lib.bytes", "byte_at_index", byte_params(), ret.clone()).unwrap();
        let second = ast.register_import(unit, "lib.bytes", "byte_at_index", byte_params(), ret).unwrap();

        assert_eq!(first, second);
        assert_eq!(ast.imports().len(), 1);
        let NodeKind::SourceUnit(source) = ast.kind(unit) else { panic!("not a source unit") };
        assert_eq!(source.nodes, vec![first]);
    }

    #[test]
    fn stub_is_a_bodyless_free_function() {
        let mut ast = Ast::new();
        let unit = unit(&mut ast);
        let stub = ast
            .register_import(unit, "lib.bytes", "f", byte_params(), vec![("res".into(), TypeNode::uint8())])
            .unwrap();

        let func = ast.function(stub).unwrap();
        assert_eq!(func.kind, FunctionKind::Free);
        assert!(func.body.is_none());
        assert_eq!(ast.parameters_of(stub).unwrap().len(), 2);
        assert!(ast.imports().is_stub(stub));
        assert_eq!(ast.node_type(stub).unwrap().to_string(), "function (bytes4,uint8) returns (uint8)");
    }

    #[test]
    fn distinct_names_get_distinct_stubs() {
        let mut ast = Ast::new();
        let unit = unit(&mut ast);
        let a = ast.register_import(unit, "lib", "a", vec![], vec![]).unwrap();
        let b = ast.register_import(unit, "lib", "b", vec![], vec![]).unwrap();
        assert_ne!(a, b);
        let names: Vec<_> = ast.imports().iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, ["a", "b"]);
    }
}
