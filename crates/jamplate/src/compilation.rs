use smol_str::SmolStr;

use crate::{
    document::Document,
    instruction::Instruction,
    runtime::Value,
    sketch::Sketch,
    tree::Forest,
};

/// Everything known about one document between parsing and execution.
#[derive(Debug)]
pub struct Compilation {
    document: Document,
    forest: Forest,
    globals: Vec<(SmolStr, Value)>,
    instruction: Option<Instruction>,
}

impl Compilation {
    pub fn new(document: &Document, root: &str) -> Self {
        Self {
            document: document.clone(),
            forest: Forest::new(document, Sketch::new(root)),
            globals: Vec::new(),
            instruction: None,
        }
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn forest(&self) -> &Forest {
        &self.forest
    }

    pub fn forest_mut(&mut self) -> &mut Forest {
        &mut self.forest
    }

    /// Values allocated into the root frame before execution, in order.
    pub fn globals(&self) -> &[(SmolStr, Value)] {
        &self.globals
    }

    /// Sets a global, replacing any previous value of the same name.
    pub fn set_global(&mut self, name: impl Into<SmolStr>, value: Value) {
        let name = name.into();
        match self.globals.iter_mut().find(|(existing, _)| *existing == name) {
            Some((_, existing)) => *existing = value,
            None => self.globals.push((name, value)),
        }
    }

    pub fn instruction(&self) -> Option<&Instruction> {
        self.instruction.as_ref()
    }

    pub fn set_instruction(&mut self, instruction: Instruction) {
        self.instruction = Some(instruction);
    }

    pub fn take_instruction(&mut self) -> Option<Instruction> {
        self.instruction.take()
    }
}
