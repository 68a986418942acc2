//! Lowering analyzed trees into instructions.
//!
//! A compiler either recognizes a tree and lowers it, recognizes it and
//! rejects it with a [`CompileError`], or declares it [`Compiled::NotApplicable`]
//! so that the next compiler in the chain gets a chance.
pub mod combinator;
pub mod error;

use crate::{compilation::Compilation, instruction::Instruction, tree::TreeId};

pub use combinator::{
    FirstCompiler, FlattenCompiler, HierarchyCompiler, KindCompiler, MandatoryCompiler, TextCompiler,
};
pub use error::CompileError;

#[derive(Debug, Clone)]
pub enum Compiled {
    Instruction(Instruction),
    NotApplicable,
}

impl Compiled {
    pub fn is_applicable(&self) -> bool {
        matches!(self, Compiled::Instruction(_))
    }

    pub fn into_instruction(self) -> Option<Instruction> {
        match self {
            Compiled::Instruction(instruction) => Some(instruction),
            Compiled::NotApplicable => None,
        }
    }
}

impl From<Instruction> for Compiled {
    fn from(instruction: Instruction) -> Self {
        Compiled::Instruction(instruction)
    }
}

/// Lowers a tree into an instruction.
///
/// `root` is the compiler of the whole flavor, used to compile sub trees.
pub trait Compiler: Send + Sync {
    fn compile(&self, root: &dyn Compiler, compilation: &Compilation, tree: TreeId) -> Result<Compiled, CompileError>;
}

impl<F> Compiler for F
where
    F: Fn(&dyn Compiler, &Compilation, TreeId) -> Result<Compiled, CompileError> + Send + Sync,
{
    fn compile(&self, root: &dyn Compiler, compilation: &Compilation, tree: TreeId) -> Result<Compiled, CompileError> {
        self(root, compilation, tree)
    }
}

/// Compiles `tree` with the `root` compiler, treating "not applicable" as an error.
pub fn require(root: &dyn Compiler, compilation: &Compilation, tree: TreeId) -> Result<Instruction, CompileError> {
    match root.compile(root, compilation, tree)? {
        Compiled::Instruction(instruction) => Ok(instruction),
        Compiled::NotApplicable => Err(CompileError::unrecognized(compilation.forest(), tree)),
    }
}

/// Compiles the root tree of `compilation`.
#[tracing::instrument(level = "debug", skip_all, fields(document = %compilation.document()))]
pub fn compile(compiler: &dyn Compiler, compilation: &Compilation) -> Result<Instruction, CompileError> {
    require(compiler, compilation, compilation.forest().root())
}
