//! Human-readable rendering of instruction trees.
use std::fmt::{self, Display, Formatter};

use super::{Instruction, Op};

/// Renders `instruction` and everything below it, one op per line.
///
/// Output format:
/// ```text
/// Block(2)                  page.jamplate:1
///   PushConst("x")          page.jamplate:1
///   Branch                  page.jamplate:2
///     then:
///       PrintConst("yes")   page.jamplate:3
///     else:
///       Idle
/// ```
pub fn dump_instruction(instruction: &Instruction) -> String {
    Dump(instruction).to_string()
}

struct Dump<'a>(&'a Instruction);

impl Display for Dump<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write_instruction(f, self.0, 0)
    }
}

fn write_instruction(f: &mut Formatter<'_>, instruction: &Instruction, depth: usize) -> fmt::Result {
    let indent = "  ".repeat(depth);
    let brief = format!("{indent}{}", brief(instruction.op()));

    match instruction.reference() {
        Some(reference) => writeln!(f, "{brief:<40} {}:{}", reference.document(), reference.line())?,
        None => writeln!(f, "{brief}")?,
    }

    match instruction.op() {
        Op::Block(instructions) => {
            for child in instructions {
                write_instruction(f, child, depth + 1)?;
            }
        }
        Op::Branch { then, otherwise } => {
            writeln!(f, "{indent}  then:")?;
            write_instruction(f, then, depth + 2)?;
            writeln!(f, "{indent}  else:")?;
            write_instruction(f, otherwise, depth + 2)?;
        }
        Op::Repeat(body) | Op::Capture(body) => write_instruction(f, body, depth + 1)?,
        _ => {}
    }

    Ok(())
}

fn brief(op: &Op) -> String {
    match op {
        Op::Block(instructions) => format!("Block({})", instructions.len()),
        Op::Branch { .. } => "Branch".to_string(),
        Op::Repeat(_) => "Repeat".to_string(),
        Op::Capture(_) => "Capture".to_string(),
        op => format!("{op:?}"),
    }
}
