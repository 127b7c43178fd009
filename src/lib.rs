pub mod analysis;
pub mod backend;
pub mod frontend;
pub mod ir;


use std::fmt;
use thiserror::Error;

pub use analysis::semantic::CompileError;
pub use frontend::ast::Statement;
pub use frontend::parser::{parse, ParseError};
pub use ir::cfg::Assembly;
pub use ir::lower::lower;

#[derive(Debug, Error)]
pub enum Error {
    #[error("{}", one_per_line(.0))]
    Parse(Vec<ParseError>),

    #[error("{}", one_per_line(.0))]
    Compile(Vec<CompileError>),

    #[error("failed to format assembly")]
    Format(#[from] fmt::Error),
}

fn one_per_line<E: fmt::Display>(errors: &[E]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Lower a parsed program and render the LMC listing.
pub fn compile(program: &[Statement]) -> Result<String, Error> {
    let asm = lower(program).map_err(Error::Compile)?;
    Ok(backend::generate(&asm)?)
}

pub fn compile_source(source: &str) -> Result<String, Error> {
    let program = parse(source).map_err(Error::Parse)?;
    compile(&program)
}
