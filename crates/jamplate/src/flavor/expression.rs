//! Lowering of expressions. Every expression leaves exactly one value.
use crate::{
    compilation::Compilation,
    compile::{CompileError, Compiled, Compiler, require},
    instruction::{Arithmetic, Instruction, Op, Pack},
    reference::Reference,
    runtime::Value,
    sketch::key,
    tree::TreeId,
};

use super::{
    compiler::{framed, slot},
    kind::*,
};

type Lowered = Result<Compiled, CompileError>;

/// Whitespace between expressions. Anything else was not understood.
pub(super) fn gap(_: &Compilation, text: &Reference) -> Result<Instruction, CompileError> {
    if text.text().trim().is_empty() {
        Ok(Instruction::idle())
    } else {
        Err(CompileError::Unrecognized(text.clone()))
    }
}

pub(super) fn reference(_: &dyn Compiler, compilation: &Compilation, tree: TreeId) -> Lowered {
    let reference = compilation.forest().reference(tree);
    let instruction = match reference.text() {
        "true" | "false" => Instruction::at(Op::PushConst(Value::new(reference.text())), reference),
        "null" => Instruction::at(Op::PushConst(Value::Null), reference),
        name => Instruction::block([
            Instruction::push(name),
            Instruction::at(Op::Access, reference),
        ]),
    };
    Ok(instruction.into())
}

pub(super) fn number(_: &dyn Compiler, compilation: &Compilation, tree: TreeId) -> Lowered {
    let reference = compilation.forest().reference(tree);
    Ok(Instruction::at(Op::PushConst(Value::new(reference.text())), reference).into())
}

pub(super) fn string(_: &dyn Compiler, compilation: &Compilation, tree: TreeId) -> Lowered {
    let body = slot(compilation, tree, key::BODY)?;
    let text = unescape(compilation.forest().text(body));
    Ok(Instruction::at(Op::PushConst(Value::new(text)), compilation.forest().reference(tree)).into())
}

fn unescape(text: &str) -> String {
    let mut unescaped = String::with_capacity(text.len());
    let mut chars = text.chars();

    while let Some(c) = chars.next() {
        if c != '\\' {
            unescaped.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => unescaped.push('\n'),
            Some('r') => unescaped.push('\r'),
            Some('t') => unescaped.push('\t'),
            Some(other) => unescaped.push(other),
            None => unescaped.push('\\'),
        }
    }

    unescaped
}

pub(super) fn group(root: &dyn Compiler, compilation: &Compilation, tree: TreeId) -> Lowered {
    let body = slot(compilation, tree, key::BODY)?;
    Ok(framed(root, compilation, body)?.into())
}

/// `[a, b]` and `{a: 1, b: 2}`: every comma separated segment is glued on
/// its own, then the segments are packed.
pub(super) fn collection(root: &dyn Compiler, compilation: &Compilation, tree: TreeId) -> Lowered {
    let forest = compilation.forest();
    let reference = forest.reference(tree);
    let body = slot(compilation, tree, key::BODY)?;
    let pack = if forest.kind(tree) == ARRAY {
        Pack::Array
    } else {
        Pack::Object
    };

    if let Some(gap) = forest.gaps(body).into_iter().find(|gap| !gap.text().trim().is_empty()) {
        return Err(CompileError::Unrecognized(gap));
    }

    let children: Vec<_> = forest.children(body).collect();
    let mut instructions = vec![Instruction::at(Op::PushFrame, reference)];

    for segment in children
        .split(|child| forest.kind(*child) == COMMA)
        .filter(|segment| !segment.is_empty())
    {
        instructions.push(Instruction::new(Op::PushFrame));
        for child in segment {
            instructions.push(require(root, compilation, *child)?);
        }
        instructions.push(Instruction::new(Op::DumpFrame));
    }

    instructions.push(Instruction::at(Op::Pack(pack), reference));
    Ok(Instruction::block(instructions).into())
}

/// A reference used as a key is the key itself, not its value.
fn literal_key(root: &dyn Compiler, compilation: &Compilation, tree: TreeId) -> Result<Instruction, CompileError> {
    let forest = compilation.forest();
    if forest.kind(tree) == REFERENCE {
        Ok(Instruction::at(Op::PushConst(Value::new(forest.text(tree))), forest.reference(tree)))
    } else {
        require(root, compilation, tree)
    }
}

pub(super) fn pair(root: &dyn Compiler, compilation: &Compilation, tree: TreeId) -> Lowered {
    let left = slot(compilation, tree, key::LEFT)?;
    let right = slot(compilation, tree, key::RIGHT)?;

    Ok(Instruction::block([
        literal_key(root, compilation, left)?,
        require(root, compilation, right)?,
        Instruction::at(Op::Pair, compilation.forest().reference(tree)),
    ])
    .into())
}

pub(super) fn getter(root: &dyn Compiler, compilation: &Compilation, tree: TreeId) -> Lowered {
    let left = slot(compilation, tree, key::LEFT)?;
    let right = slot(compilation, tree, key::RIGHT)?;

    Ok(Instruction::block([
        require(root, compilation, left)?,
        literal_key(root, compilation, right)?,
        Instruction::at(Op::Get, compilation.forest().reference(tree)),
    ])
    .into())
}

pub(super) fn unary(root: &dyn Compiler, compilation: &Compilation, tree: TreeId) -> Lowered {
    let forest = compilation.forest();
    let right = slot(compilation, tree, key::RIGHT)?;
    let op = if forest.kind(tree) == NOT { Op::Not } else { Op::Negate };

    Ok(Instruction::block([
        require(root, compilation, right)?,
        Instruction::at(op, forest.reference(tree)),
    ])
    .into())
}

/// The ops that turn `[left, right]` into the result of the operator `kind`.
fn operation(kind: &str) -> Option<Vec<Op>> {
    // `Compare` leaves -1, 0 or 1; each comparison tests for one of them.
    let comparison = |expected: &str, negated: bool| {
        let mut ops = vec![Op::Compare, Op::PushConst(Value::new(expected)), Op::Equals];
        if negated {
            ops.push(Op::Not);
        }
        ops
    };

    let ops = match kind {
        PRODUCT => vec![Op::Arithmetic(Arithmetic::Product)],
        QUOTIENT => vec![Op::Arithmetic(Arithmetic::Quotient)],
        MODULO => vec![Op::Arithmetic(Arithmetic::Modulo)],
        SUM => vec![Op::Arithmetic(Arithmetic::Sum)],
        DIFFERENCE => vec![Op::Arithmetic(Arithmetic::Difference)],
        LESS => comparison("-1", false),
        GREATER => comparison("1", false),
        LESS_EQUAL => comparison("1", true),
        GREATER_EQUAL => comparison("-1", true),
        EQUAL => comparison("0", false),
        NOT_EQUAL => comparison("0", true),
        AND => vec![Op::And],
        OR => vec![Op::Or],
        _ => return None,
    };
    Some(ops)
}

pub(super) fn binary(root: &dyn Compiler, compilation: &Compilation, tree: TreeId) -> Lowered {
    let forest = compilation.forest();
    let Some(ops) = operation(forest.kind(tree)) else {
        return Ok(Compiled::NotApplicable);
    };
    let reference = forest.reference(tree);
    let left = slot(compilation, tree, key::LEFT)?;
    let right = slot(compilation, tree, key::RIGHT)?;

    let mut instructions = vec![
        require(root, compilation, left)?,
        require(root, compilation, right)?,
    ];
    instructions.extend(ops.into_iter().map(|op| Instruction::at(op, reference)));
    Ok(Instruction::block(instructions).into())
}
