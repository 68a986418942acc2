//! The instruction tree the compiler lowers documents into.
//!
//! Each [`Op`] documents the operand stack before and after it runs, top of
//! the stack on the right. Constructs built out of several ops depend on
//! these shapes exactly.
pub mod debug;
pub mod exec;
pub mod optimize;

use smol_str::SmolStr;

use crate::{reference::Reference, runtime::Value};

pub use debug::dump_instruction;
pub use optimize::Optimization;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Arithmetic {
    Sum,
    Difference,
    Product,
    Quotient,
    Modulo,
}

impl Arithmetic {
    pub fn name(self) -> &'static str {
        match self {
            Arithmetic::Sum => "SUM",
            Arithmetic::Difference => "SUB",
            Arithmetic::Product => "MUL",
            Arithmetic::Quotient => "DIV",
            Arithmetic::Modulo => "MOD",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Pack {
    Array,
    Object,
}

#[derive(Debug, Clone)]
pub enum Op {
    /// `[] -> []`
    Idle,
    /// Runs each instruction in order.
    Block(Vec<Instruction>),

    /// `[] -> [value]`
    PushConst(Value),
    /// `[a] -> [a, a]`
    Dup,
    /// `[a, b] -> [b, a]`
    Swap,
    /// `[a, b, c] -> [c, b, a]`
    Swap3,
    /// `[a, b, c, d] -> [d, b, c, a]`
    Swap4,
    /// `[a] -> []`
    Pop,

    /// Pushes an empty frame anchored at the current stack depth.
    PushFrame,
    /// Discards the current frame and its heap. The operand stack is untouched.
    PopFrame,
    /// `[anchor.., a, b, c] -> [anchor.., abc]`
    GlueFrame,
    /// Like `GlueFrame`, then pops the frame.
    DumpFrame,
    /// `[anchor.., a, b, c] -> [anchor.., [a, b, c]]` or `{..a, ..b, ..c}`,
    /// then pops the frame.
    Pack(Pack),

    /// `[address, value] -> []`, writes into the current frame.
    Alloc,
    /// `[address] -> [value]`, searching from the current frame down.
    Access,
    /// `[value] -> [defined]`
    Defined,

    /// `[object, key] -> [value]`
    Get,
    /// `[key, value] -> [{key: value}]`
    Pair,
    /// `[object, other] -> [{..object, ..other}]`
    Put,
    /// `[object, key] -> [object without key]`
    Remove,
    /// `[array] -> [..elements reversed]`, the first element on top.
    Spread,

    /// `[left, right] -> [-1 | 0 | 1]`
    Compare,
    /// `[left, right] -> [left == right]` by text.
    Equals,
    /// `[value] -> [!value]`
    Not,
    /// `[left, right] -> [left && right]`
    And,
    /// `[left, right] -> [left || right]`
    Or,
    /// `[number] -> [-number]`
    Negate,
    /// `[left, right] -> [left op right]`
    Arithmetic(Arithmetic),

    /// `[value] -> []`, prints to the active console.
    Print,
    /// `[] -> []`, prints the text.
    PrintConst(SmolStr),
    /// `[text, definitions] -> [text with definitions replaced]`
    Replace,
    /// `[name] -> []`, redirects output to the named buffer.
    Console,
    /// `[value] -> []`, reports a note.
    Message,
    /// `[value] -> !`, raises a user error.
    Fail,

    /// `[condition] -> []`, then runs one of the branches.
    Branch {
        then: Box<Instruction>,
        otherwise: Box<Instruction>,
    },
    /// Runs `body`, then pops a condition and repeats while it is truthy.
    /// `body` must push exactly one value more than it pops.
    Repeat(Box<Instruction>),
    /// `[] -> [printed]`, runs `body` with its output redirected into a buffer.
    Capture(Box<Instruction>),
}

/// An [`Op`] and the span of source it was compiled from.
#[derive(Debug, Clone)]
pub struct Instruction {
    op: Op,
    reference: Option<Reference>,
}

impl Instruction {
    pub fn new(op: Op) -> Self {
        Self { op, reference: None }
    }

    pub fn at(op: Op, reference: &Reference) -> Self {
        Self {
            op,
            reference: Some(reference.clone()),
        }
    }

    pub fn block(instructions: impl IntoIterator<Item = Instruction>) -> Self {
        Self::new(Op::Block(instructions.into_iter().collect()))
    }

    pub fn push(value: impl Into<Value>) -> Self {
        Self::new(Op::PushConst(value.into()))
    }

    pub fn idle() -> Self {
        Self::new(Op::Idle)
    }

    pub fn branch(then: Instruction, otherwise: Instruction) -> Self {
        Self::new(Op::Branch {
            then: Box::new(then),
            otherwise: Box::new(otherwise),
        })
    }

    pub fn repeat(body: Instruction) -> Self {
        Self::new(Op::Repeat(Box::new(body)))
    }

    pub fn capture(body: Instruction) -> Self {
        Self::new(Op::Capture(Box::new(body)))
    }

    /// Attaches `reference` unless the instruction already has one.
    pub fn with_reference(mut self, reference: &Reference) -> Self {
        if self.reference.is_none() {
            self.reference = Some(reference.clone());
        }
        self
    }

    pub fn op(&self) -> &Op {
        &self.op
    }

    pub fn reference(&self) -> Option<&Reference> {
        self.reference.as_ref()
    }

    pub fn into_op(self) -> Op {
        self.op
    }

    /// Direct sub instructions, in execution order.
    pub fn children(&self) -> Vec<&Instruction> {
        match &self.op {
            Op::Block(instructions) => instructions.iter().collect(),
            Op::Branch { then, otherwise } => vec![then, otherwise],
            Op::Repeat(body) | Op::Capture(body) => vec![body],
            _ => Vec::new(),
        }
    }
}

impl From<Op> for Instruction {
    fn from(op: Op) -> Self {
        Instruction::new(op)
    }
}
