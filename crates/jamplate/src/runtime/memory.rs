use std::collections::BTreeMap;

use rustc_hash::FxHashMap;
use smol_str::SmolStr;

use crate::reference::Reference;

use super::{BufferConsole, Console, ExecutionError, Value};

/// A named-value heap pushed and popped in LIFO order.
#[derive(Debug, Default)]
pub struct Frame {
    heap: FxHashMap<SmolStr, Value>,
    /// Operand stack depth at the time the frame was pushed.
    anchor: usize,
    origin: Option<Reference>,
}

impl Frame {
    pub fn get(&self, address: &str) -> Option<&Value> {
        self.heap.get(address)
    }

    pub fn anchor(&self) -> usize {
        self.anchor
    }

    pub fn origin(&self) -> Option<&Reference> {
        self.origin.as_ref()
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}

/// The state of one execution: the operand stack, the frame stack and the
/// active console.
///
/// The frame stack is never empty; the root frame lives as long as the memory.
pub struct Memory {
    stack: Vec<Value>,
    frames: Vec<Frame>,
    console: Box<dyn Console>,
    outputs: BTreeMap<SmolStr, BufferConsole>,
    iterations: u64,
    max_iterations: Option<u64>,
}

impl Memory {
    pub fn new(console: Box<dyn Console>) -> Self {
        Self {
            stack: Vec::with_capacity(64),
            frames: vec![Frame::default()],
            console,
            outputs: BTreeMap::new(),
            iterations: 0,
            max_iterations: None,
        }
    }

    pub fn with_max_iterations(mut self, max_iterations: Option<u64>) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn push(&mut self, value: Value) {
        self.stack.push(value);
    }

    pub fn pop(&mut self, origin: &Option<Reference>) -> Result<Value, ExecutionError> {
        self.stack
            .pop()
            .ok_or_else(|| ExecutionError::StackUnderflow(origin.clone()))
    }

    pub fn peek(&self) -> Option<&Value> {
        self.stack.last()
    }

    pub fn stack(&self) -> &[Value] {
        &self.stack
    }

    pub fn push_frame(&mut self, origin: Option<Reference>) {
        self.frames.push(Frame {
            heap: FxHashMap::default(),
            anchor: self.stack.len(),
            origin,
        });
    }

    pub fn pop_frame(&mut self, origin: &Option<Reference>) -> Result<Frame, ExecutionError> {
        if self.frames.len() == 1 {
            return Err(ExecutionError::FrameUnderflow(origin.clone()));
        }
        self.frames
            .pop()
            .ok_or_else(|| ExecutionError::FrameUnderflow(origin.clone()))
    }

    /// Pops every value pushed since the current frame was pushed, oldest first.
    pub fn drain_frame(&mut self) -> Vec<Value> {
        let anchor = self.frame().anchor.min(self.stack.len());
        self.stack.split_off(anchor)
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    /// The current (topmost) frame.
    pub fn frame(&self) -> &Frame {
        // The root frame is never popped.
        &self.frames[self.frames.len() - 1]
    }

    /// Writes into the current frame.
    pub fn alloc(&mut self, address: impl Into<SmolStr>, value: Value) {
        let last = self.frames.len() - 1;
        self.frames[last].heap.insert(address.into(), value);
    }

    /// Writes into the root frame.
    pub fn alloc_global(&mut self, address: impl Into<SmolStr>, value: Value) {
        self.frames[0].heap.insert(address.into(), value);
    }

    /// Looks `address` up from the current frame down to the root frame.
    pub fn access(&self, address: &str) -> Value {
        self.frames
            .iter()
            .rev()
            .find_map(|frame| frame.heap.get(address))
            .cloned()
            .unwrap_or_default()
    }

    pub fn print(&mut self, text: &str) {
        self.console.print(text);
    }

    pub fn console(&self) -> &dyn Console {
        self.console.as_ref()
    }

    pub fn console_mut(&mut self) -> &mut dyn Console {
        self.console.as_mut()
    }

    /// Installs `console` and hands back the one it replaces.
    pub fn set_console(&mut self, console: Box<dyn Console>) -> Box<dyn Console> {
        std::mem::replace(&mut self.console, console)
    }

    /// The buffer collecting the named output `name`, created on first use.
    pub fn output(&mut self, name: &str) -> BufferConsole {
        self.outputs.entry(name.into()).or_default().clone()
    }

    /// Every named output and what has been printed into it so far.
    pub fn outputs(&self) -> impl Iterator<Item = (&str, String)> {
        self.outputs
            .iter()
            .map(|(name, buffer)| (name.as_str(), buffer.read()))
    }

    /// Counts one loop iteration against the configured budget.
    pub fn tick(&mut self, origin: &Option<Reference>) -> Result<(), ExecutionError> {
        self.iterations += 1;
        match self.max_iterations {
            Some(limit) if self.iterations > limit => Err(ExecutionError::IterationLimit {
                reference: origin.clone(),
                limit,
            }),
            _ => Ok(()),
        }
    }

    /// The references of the instructions that pushed the live frames,
    /// innermost first.
    pub fn trace(&self) -> Vec<Reference> {
        self.frames
            .iter()
            .rev()
            .filter_map(|frame| frame.origin.clone())
            .collect()
    }

    /// Closes the active console.
    pub fn close(&mut self) {
        self.console.close();
    }
}

impl std::fmt::Debug for Memory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Memory")
            .field("stack", &self.stack)
            .field("frames", &self.frames)
            .field("outputs", &self.outputs.keys().collect::<Vec<_>>())
            .field("iterations", &self.iterations)
            .finish()
    }
}
