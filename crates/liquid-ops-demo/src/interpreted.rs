//! A toy bytecode interpreter backend.
//!
//! Stands in for the original's Python reference implementation: rather
//! than compiling to machine code (see `jit.rs`) or letting the optimizer
//! fuse the multiply into a tight loop (`cpu.rs`), each element is processed
//! by dispatching through an explicit instruction stream one opcode at a
//! time. This is deliberately the slowest backend, which is the point --
//! it gives the Selector a real low-throughput option to explore away from.

use crate::op::IntensityScaleArgs;

/// One instruction in the per-element program.
enum Op {
    Load,
    MulConst(f32),
    Store,
}

/// Interpret `program` against a fresh stack for every element of `data`.
fn interpret(data: &[f32], program: &[Op]) -> Vec<f32> {
    let mut out = Vec::with_capacity(data.len());
    let mut stack: Vec<f32> = Vec::with_capacity(4);

    for &value in data {
        stack.clear();
        for instr in program {
            match instr {
                Op::Load => stack.push(value),
                Op::MulConst(factor) => {
                    let top = stack.pop().expect("interpreter stack underflow");
                    stack.push(top * factor);
                }
                Op::Store => {
                    let top = stack.pop().expect("interpreter stack underflow");
                    out.push(top);
                }
            }
        }
    }

    out
}

pub fn run(args: &IntensityScaleArgs) -> Vec<f32> {
    let program = [Op::Load, Op::MulConst(args.scale), Op::Store];
    interpret(&args.data, &program)
}
