use super::{Instruction, Op};
use crate::runtime::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Optimization {
    None,
    /// Flattens blocks, drops idle instructions and fuses constant prints.
    #[default]
    Basic,
}

impl Instruction {
    /// Rewrites the instruction into an equivalent, cheaper one.
    pub fn optimize(self, optimization: Optimization) -> Instruction {
        match optimization {
            Optimization::None => self,
            Optimization::Basic => self.simplify(),
        }
    }

    fn simplify(self) -> Instruction {
        let reference = self.reference;
        let op = match self.op {
            Op::Block(instructions) => {
                let mut flat = Vec::with_capacity(instructions.len());
                for instruction in instructions {
                    splice(instruction.simplify(), &mut flat);
                }
                let mut fused = fuse(flat);
                match fused.len() {
                    0 => Op::Idle,
                    1 => {
                        let single = fused.remove(0);
                        let single = match &reference {
                            Some(reference) => single.with_reference(reference),
                            None => single,
                        };
                        return single;
                    }
                    _ => Op::Block(fused),
                }
            }
            Op::Branch { then, otherwise } => Op::Branch {
                then: Box::new(then.simplify()),
                otherwise: Box::new(otherwise.simplify()),
            },
            Op::Repeat(body) => Op::Repeat(Box::new(body.simplify())),
            Op::Capture(body) => Op::Capture(Box::new(body.simplify())),
            op => op,
        };
        Instruction { op, reference }
    }
}

/// Appends `instruction` to `into`, inlining nested blocks and skipping idles.
fn splice(instruction: Instruction, into: &mut Vec<Instruction>) {
    match instruction.op {
        Op::Idle => {}
        Op::Block(instructions) => into.extend(instructions),
        _ => into.push(instruction),
    }
}

/// `PushConst(text); Print` becomes `PrintConst(text)`.
fn fuse(instructions: Vec<Instruction>) -> Vec<Instruction> {
    let mut fused: Vec<Instruction> = Vec::with_capacity(instructions.len());

    for instruction in instructions {
        let printable = matches!(
            fused.last(),
            Some(Instruction {
                op: Op::PushConst(Value::Const(_)),
                ..
            })
        );
        if printable && matches!(instruction.op, Op::Print) {
            if let Some(Instruction {
                op: Op::PushConst(Value::Const(text)),
                reference,
            }) = fused.pop()
            {
                fused.push(Instruction {
                    op: Op::PrintConst(text),
                    reference: reference.or(instruction.reference),
                });
                continue;
            }
        }
        fused.push(instruction);
    }

    fused
}
