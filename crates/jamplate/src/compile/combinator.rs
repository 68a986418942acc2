use smol_str::SmolStr;

use crate::{compilation::Compilation, instruction::Instruction, reference::Reference, tree::TreeId};

use super::{CompileError, Compiled, Compiler, require};

fn kinds(kinds: &[&str]) -> Vec<SmolStr> {
    kinds.iter().map(|kind| SmolStr::new(kind)).collect()
}

/// Delegates only trees of the given kinds.
pub struct KindCompiler {
    kinds: Vec<SmolStr>,
    compiler: Box<dyn Compiler>,
}

impl KindCompiler {
    pub fn new(kind: &str, compiler: impl Compiler + 'static) -> Self {
        Self::any(&[kind], compiler)
    }

    pub fn any(kinds: &[&str], compiler: impl Compiler + 'static) -> Self {
        Self {
            kinds: self::kinds(kinds),
            compiler: Box::new(compiler),
        }
    }
}

impl Compiler for KindCompiler {
    fn compile(&self, root: &dyn Compiler, compilation: &Compilation, tree: TreeId) -> Result<Compiled, CompileError> {
        let kind = compilation.forest().kind(tree);
        if self.kinds.iter().any(|k| k == kind) {
            self.compiler.compile(root, compilation, tree)
        } else {
            Ok(Compiled::NotApplicable)
        }
    }
}

/// Tries compilers in order; the first applicable one wins.
#[derive(Default)]
pub struct FirstCompiler {
    compilers: Vec<Box<dyn Compiler>>,
}

impl FirstCompiler {
    pub fn new(compilers: Vec<Box<dyn Compiler>>) -> Self {
        Self { compilers }
    }

    pub fn push(&mut self, compiler: impl Compiler + 'static) {
        self.compilers.push(Box::new(compiler));
    }

    pub fn with(mut self, compiler: impl Compiler + 'static) -> Self {
        self.push(compiler);
        self
    }
}

impl Compiler for FirstCompiler {
    fn compile(&self, root: &dyn Compiler, compilation: &Compilation, tree: TreeId) -> Result<Compiled, CompileError> {
        for compiler in &self.compilers {
            if let compiled @ Compiled::Instruction(_) = compiler.compile(root, compilation, tree)? {
                return Ok(compiled);
            }
        }
        Ok(Compiled::NotApplicable)
    }
}

/// Delegates only trees with an ancestor of one of the given kinds.
pub struct HierarchyCompiler {
    kinds: Vec<SmolStr>,
    compiler: Box<dyn Compiler>,
}

impl HierarchyCompiler {
    pub fn new(kinds: &[&str], compiler: impl Compiler + 'static) -> Self {
        Self {
            kinds: self::kinds(kinds),
            compiler: Box::new(compiler),
        }
    }
}

impl Compiler for HierarchyCompiler {
    fn compile(&self, root: &dyn Compiler, compilation: &Compilation, tree: TreeId) -> Result<Compiled, CompileError> {
        let forest = compilation.forest();
        let inside = forest
            .ancestors(tree)
            .any(|ancestor| self.kinds.iter().any(|k| k == forest.kind(ancestor)));

        if inside {
            self.compiler.compile(root, compilation, tree)
        } else {
            Ok(Compiled::NotApplicable)
        }
    }
}

/// Turns "not applicable" into [`CompileError::Unrecognized`].
pub struct MandatoryCompiler {
    compiler: Box<dyn Compiler>,
}

impl MandatoryCompiler {
    pub fn new(compiler: impl Compiler + 'static) -> Self {
        Self {
            compiler: Box::new(compiler),
        }
    }
}

impl Compiler for MandatoryCompiler {
    fn compile(&self, root: &dyn Compiler, compilation: &Compilation, tree: TreeId) -> Result<Compiled, CompileError> {
        match self.compiler.compile(root, compilation, tree)? {
            Compiled::NotApplicable => Err(CompileError::unrecognized(compilation.forest(), tree)),
            compiled => Ok(compiled),
        }
    }
}

/// Lowers a span of text no tree claimed.
pub trait TextCompiler: Send + Sync {
    fn compile_text(&self, compilation: &Compilation, text: &Reference) -> Result<Instruction, CompileError>;
}

impl<F> TextCompiler for F
where
    F: Fn(&Compilation, &Reference) -> Result<Instruction, CompileError> + Send + Sync,
{
    fn compile_text(&self, compilation: &Compilation, text: &Reference) -> Result<Instruction, CompileError> {
        self(compilation, text)
    }
}

/// Compiles the children of a tree with the root compiler and the text
/// between them with a [`TextCompiler`], in position order, into one block.
pub struct FlattenCompiler {
    text: Box<dyn TextCompiler>,
}

impl FlattenCompiler {
    pub fn new(text: impl TextCompiler + 'static) -> Self {
        Self { text: Box::new(text) }
    }
}

impl Compiler for FlattenCompiler {
    fn compile(&self, root: &dyn Compiler, compilation: &Compilation, tree: TreeId) -> Result<Compiled, CompileError> {
        let forest = compilation.forest();
        let mut parts = Vec::new();

        for child in forest.children(tree) {
            parts.push((forest.reference(child).position(), require(root, compilation, child)?));
        }
        for gap in forest.gaps(tree).into_iter().filter(|gap| !gap.is_empty()) {
            parts.push((gap.position(), self.text.compile_text(compilation, &gap)?));
        }
        parts.sort_by_key(|(position, _)| *position);

        let block = Instruction::block(parts.into_iter().map(|(_, instruction)| instruction));
        Ok(block.with_reference(forest.reference(tree)).into())
    }
}
