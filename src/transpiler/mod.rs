pub mod bytes_index_access;
pub mod constructor_inheritance;

use tracing::info;

use crate::ast::mapper::AstMapper;
use crate::ast::Ast;
use crate::errors::{Result, TranspileError};

use bytes_index_access::BytesIndexAccess;
use constructor_inheritance::ConstructorInheritance;

pub struct PassInfo {
    pub key: &'static str,
    pub description: &'static str,
    run: fn(&mut Ast) -> Result<()>,
}

/// Fixed pass order. Later passes rely on what earlier ones established.
pub const PASSES: &[PassInfo] = &[
    PassInfo {
        key: "Ci",
        description: "constructor inheritance linearization",
        run: run_constructor_inheritance,
    },
    PassInfo {
        key: "Bc",
        description: "fixed-bytes index access lowering",
        run: run_bytes_index_access,
    },
];

#[derive(Debug, Default, Clone)]
pub struct LowerOptions {
    /// Stop after the pass with this key.
    pub until: Option<String>,
}

fn run_constructor_inheritance(ast: &mut Ast) -> Result<()> {
    ConstructorInheritance::default().map(ast)
}

fn run_bytes_index_access(ast: &mut Ast) -> Result<()> {
    BytesIndexAccess.map(ast)
}

/// Passes selected by `options`, in pipeline order.
pub fn selected_passes(options: &LowerOptions) -> Result<&'static [PassInfo]> {
    match &options.until {
        None => Ok(PASSES),
        Some(key) => PASSES
            .iter()
            .position(|pass| pass.key == key)
            .map(|last| &PASSES[..=last])
            .ok_or_else(|| TranspileError::UnknownPass { key: key.clone() }),
    }
}

/// Run the lowering pipeline over `ast`, in place.
pub fn lower(ast: &mut Ast, options: &LowerOptions) -> Result<()> {
    for pass in selected_passes(options)? {
        info!(pass = pass.key, "{}", pass.description);
        (pass.run)(ast)?;
    }
    Ok(())
}
