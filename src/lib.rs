pub mod ast;
pub mod errors;
pub mod generator;
pub mod parser;
pub mod transpiler;

#[cfg(test)]
mod tests;
