//! Lowering of text, commands and flows.
use crate::{
    compilation::Compilation,
    compile::{
        CompileError, Compiled, Compiler, FirstCompiler, FlattenCompiler, HierarchyCompiler, KindCompiler, require,
    },
    instruction::{Instruction, Op},
    reference::Reference,
    runtime::Value,
    sketch::key,
    tree::TreeId,
};

use super::{builtin, expression, kind::*};

type Lowered = Result<Compiled, CompileError>;

/// The compiler of the jamplate flavor.
pub fn compiler() -> Box<dyn Compiler> {
    let expressions = FirstCompiler::default()
        .with(KindCompiler::new(REFERENCE, expression::reference))
        .with(KindCompiler::new(NUMBER, expression::number))
        .with(KindCompiler::new(STRING, expression::string))
        .with(KindCompiler::new(GROUP, expression::group))
        .with(KindCompiler::any(&[ARRAY, OBJECT], expression::collection))
        .with(KindCompiler::new(PAIR, expression::pair))
        .with(KindCompiler::new(GETTER, expression::getter))
        .with(KindCompiler::any(&[NOT, NEGATE], expression::unary))
        .with(KindCompiler::any(
            &[
                PRODUCT,
                QUOTIENT,
                MODULO,
                SUM,
                DIFFERENCE,
                LESS,
                GREATER,
                LESS_EQUAL,
                GREATER_EQUAL,
                EQUAL,
                NOT_EQUAL,
                AND,
                OR,
            ],
            expression::binary,
        ));

    Box::new(
        FirstCompiler::default()
            .with(KindCompiler::any(&[ROOT, BODY], FlattenCompiler::new(text)))
            .with(KindCompiler::new(COMMENT, comment))
            .with(KindCompiler::new(INJECTION, injection))
            .with(KindCompiler::new(DECLARE, declare))
            .with(KindCompiler::new(DEFINE, define))
            .with(KindCompiler::new(UNDEF, undef))
            .with(KindCompiler::any(&[CONSOLE, MESSAGE, ERROR], directive))
            .with(KindCompiler::new(IF_FLOW, if_flow))
            .with(KindCompiler::new(FOR_FLOW, for_flow))
            .with(KindCompiler::new(WHILE_FLOW, while_flow))
            .with(KindCompiler::new(CAPTURE_FLOW, capture_flow))
            .with(KindCompiler::any(FLOW_COMMANDS, outside_flow))
            .with(KindCompiler::new(PARAMETER, FlattenCompiler::new(expression::gap)))
            .with(HierarchyCompiler::new(&[PARAMETER], expressions)),
    )
}

/// The component `key` of `tree`, or [`CompileError::MissingComponent`].
pub(super) fn slot(compilation: &Compilation, tree: TreeId, key: &str) -> Result<TreeId, CompileError> {
    let forest = compilation.forest();
    forest
        .slot(tree, key)
        .ok_or_else(|| CompileError::missing(forest, tree, key))
}

/// Evaluates `tree` inside its own frame, leaving one glued value.
pub(super) fn framed(root: &dyn Compiler, compilation: &Compilation, tree: TreeId) -> Result<Instruction, CompileError> {
    let reference = compilation.forest().reference(tree);
    Ok(Instruction::block([
        Instruction::at(Op::PushFrame, reference),
        require(root, compilation, tree)?,
        Instruction::at(Op::DumpFrame, reference),
    ]))
}

/// Sets the line the following output comes from.
fn locate(compilation: &Compilation, position: u32) -> Instruction {
    let line = compilation.document().line_of(position);
    Instruction::block([
        Instruction::push(builtin::LINE),
        Instruction::push(line.to_string()),
        Instruction::new(Op::Alloc),
    ])
}

/// Literal text, printed with every definition replaced.
fn text(_: &Compilation, text: &Reference) -> Result<Instruction, CompileError> {
    Ok(Instruction::block([
        Instruction::at(Op::PushConst(Value::new(text.text())), text),
        Instruction::push(builtin::DEFINE),
        Instruction::new(Op::Access),
        Instruction::at(Op::Replace, text),
        Instruction::at(Op::Print, text),
    ]))
}

fn comment(_: &dyn Compiler, compilation: &Compilation, tree: TreeId) -> Lowered {
    Ok(Instruction::idle().with_reference(compilation.forest().reference(tree)).into())
}

/// Prints its value, or inside a command parameter, leaves it as an operand.
fn injection(root: &dyn Compiler, compilation: &Compilation, tree: TreeId) -> Lowered {
    let forest = compilation.forest();
    let reference = forest.reference(tree);
    let body = slot(compilation, tree, key::BODY)?;

    if forest.ancestors(tree).any(|ancestor| forest.kind(ancestor) == PARAMETER) {
        return Ok(framed(root, compilation, body)?.with_reference(reference).into());
    }

    Ok(Instruction::block([
        locate(compilation, reference.position()),
        framed(root, compilation, body)?,
        Instruction::at(Op::Print, reference),
    ])
    .with_reference(reference)
    .into())
}

/// The name a command operates on.
fn name(compilation: &Compilation, tree: TreeId) -> Result<Value, CompileError> {
    let key = slot(compilation, tree, KEY)?;
    Ok(Value::new(compilation.forest().text(key)))
}

/// The framed parameter of a command, or `Null` when it has none.
fn parameter_or_null(root: &dyn Compiler, compilation: &Compilation, tree: TreeId) -> Result<Instruction, CompileError> {
    match compilation.forest().slot(tree, PARAMETER) {
        Some(parameter) => framed(root, compilation, parameter),
        None => Ok(Instruction::new(Op::PushConst(Value::Null))),
    }
}

fn declare(root: &dyn Compiler, compilation: &Compilation, tree: TreeId) -> Lowered {
    let reference = compilation.forest().reference(tree);

    Ok(Instruction::block([
        locate(compilation, reference.position()),
        Instruction::push(name(compilation, tree)?),
        parameter_or_null(root, compilation, tree)?,
        Instruction::at(Op::Alloc, reference),
    ])
    .with_reference(reference)
    .into())
}

/// Pushes the address of the definitions and their current value.
fn definitions() -> Instruction {
    Instruction::block([
        Instruction::push(builtin::DEFINE),
        Instruction::push(builtin::DEFINE),
        Instruction::new(Op::Access),
    ])
}

fn define(root: &dyn Compiler, compilation: &Compilation, tree: TreeId) -> Lowered {
    let reference = compilation.forest().reference(tree);
    let value = match compilation.forest().slot(tree, PARAMETER) {
        Some(parameter) => framed(root, compilation, parameter)?,
        None => Instruction::push(""),
    };

    Ok(Instruction::block([
        locate(compilation, reference.position()),
        definitions(),
        Instruction::push(name(compilation, tree)?),
        value,
        Instruction::at(Op::Pair, reference),
        Instruction::at(Op::Put, reference),
        Instruction::at(Op::Alloc, reference),
    ])
    .with_reference(reference)
    .into())
}

fn undef(_: &dyn Compiler, compilation: &Compilation, tree: TreeId) -> Lowered {
    let reference = compilation.forest().reference(tree);

    Ok(Instruction::block([
        locate(compilation, reference.position()),
        definitions(),
        Instruction::push(name(compilation, tree)?),
        Instruction::at(Op::Remove, reference),
        Instruction::at(Op::Alloc, reference),
    ])
    .with_reference(reference)
    .into())
}

/// `#console`, `#message` and `#error`: evaluate the parameter and hand it to the machine.
fn directive(root: &dyn Compiler, compilation: &Compilation, tree: TreeId) -> Lowered {
    let forest = compilation.forest();
    let reference = forest.reference(tree);
    let parameter = slot(compilation, tree, PARAMETER)?;
    let op = match forest.kind(tree) {
        CONSOLE => Op::Console,
        MESSAGE => Op::Message,
        _ => Op::Fail,
    };

    Ok(Instruction::block([
        locate(compilation, reference.position()),
        framed(root, compilation, parameter)?,
        Instruction::at(op, reference),
    ])
    .with_reference(reference)
    .into())
}

fn outside_flow(_: &dyn Compiler, compilation: &Compilation, tree: TreeId) -> Lowered {
    Err(CompileError::OutsideFlow(compilation.forest().reference(tree).clone()))
}

/// The flow, then the line after its end command.
fn closed(compilation: &Compilation, tree: TreeId, flow: Instruction) -> Lowered {
    let reference = compilation.forest().reference(tree);
    Ok(Instruction::block([flow, locate(compilation, reference.end())])
        .with_reference(reference)
        .into())
}

fn if_flow(root: &dyn Compiler, compilation: &Compilation, tree: TreeId) -> Lowered {
    let flow = branch(root, compilation, tree)?;
    closed(compilation, tree, flow)
}

/// One `#if`, `#elif` or `#else` branch and the branches after it.
fn branch(root: &dyn Compiler, compilation: &Compilation, tree: TreeId) -> Result<Instruction, CompileError> {
    let forest = compilation.forest();
    let start = slot(compilation, tree, key::START)?;
    let body = require(root, compilation, slot(compilation, tree, key::BODY)?)?;
    let sub = forest.slot(tree, key::SUB);

    if forest.kind(start) == ELSE {
        return match sub {
            Some(sub) => Err(CompileError::Illegal {
                reference: forest.reference(sub).clone(),
                message: "`#else` must be the last branch".to_string(),
            }),
            None => Ok(body),
        };
    }

    let reference = forest.reference(start);
    let condition = slot(compilation, start, PARAMETER)?;
    let otherwise = match sub {
        Some(sub) => branch(root, compilation, sub)?,
        None => Instruction::idle(),
    };

    Ok(Instruction::block([
        locate(compilation, reference.position()),
        framed(root, compilation, condition)?,
        Instruction::branch(body, otherwise).with_reference(reference),
    ]))
}

fn for_flow(root: &dyn Compiler, compilation: &Compilation, tree: TreeId) -> Lowered {
    let start = slot(compilation, tree, key::START)?;
    let reference = compilation.forest().reference(start);
    let variable = name(compilation, start)?;
    let iterable = slot(compilation, start, PARAMETER)?;
    let body = require(root, compilation, slot(compilation, tree, key::BODY)?)?;

    // [null, ..items] with the first item on top; null marks the end.
    let flow = Instruction::block([
        locate(compilation, reference.position()),
        Instruction::new(Op::PushConst(Value::Null)),
        framed(root, compilation, iterable)?,
        Instruction::at(Op::Spread, reference),
        Instruction::repeat(Instruction::block([
            Instruction::new(Op::Dup),
            Instruction::new(Op::Defined),
            Instruction::branch(
                Instruction::block([
                    Instruction::push(variable.clone()),
                    Instruction::new(Op::Swap),
                    Instruction::new(Op::Alloc),
                    body,
                    Instruction::push(true),
                ]),
                Instruction::block([Instruction::new(Op::Pop), Instruction::push(false)]),
            ),
        ]))
        .with_reference(reference),
        Instruction::push(variable),
        Instruction::new(Op::PushConst(Value::Null)),
        Instruction::new(Op::Alloc),
    ]);

    closed(compilation, tree, flow)
}

fn while_flow(root: &dyn Compiler, compilation: &Compilation, tree: TreeId) -> Lowered {
    let start = slot(compilation, tree, key::START)?;
    let reference = compilation.forest().reference(start);
    let condition = slot(compilation, start, PARAMETER)?;
    let body = require(root, compilation, slot(compilation, tree, key::BODY)?)?;

    let flow = Instruction::repeat(Instruction::block([
        locate(compilation, reference.position()),
        framed(root, compilation, condition)?,
        Instruction::branch(
            Instruction::block([body, Instruction::push(true)]),
            Instruction::push(false),
        ),
    ]))
    .with_reference(reference);

    closed(compilation, tree, flow)
}

fn capture_flow(root: &dyn Compiler, compilation: &Compilation, tree: TreeId) -> Lowered {
    let start = slot(compilation, tree, key::START)?;
    let reference = compilation.forest().reference(start);
    let body = require(root, compilation, slot(compilation, tree, key::BODY)?)?;

    let flow = Instruction::block([
        Instruction::push(name(compilation, start)?),
        Instruction::capture(body).with_reference(reference),
        Instruction::at(Op::Alloc, reference),
    ]);

    closed(compilation, tree, flow)
}
