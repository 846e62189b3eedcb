//////////////////////////////////////////////////////////////
/// Virtual Machine
///
/// The stack machine's `step` function: fetch the instruction at `pctr`,
/// advance `pctr`, execute the opcode (§4.A). `run_to_halt` drives `step`
/// until the return stack's sanctioned terminal underflow, recording a
/// `TraceView` per step through whatever `TraceSink` the caller supplies.
///
use crate::errors::ForthError;
use crate::kernel::{Cell, Core, Op};
use crate::trace::{self, TraceSink};

/// What happened after executing one instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Continue,
    Halt,
}

/// Attach the current program counter to a stack error raised during
/// execution; `kernel::Stack` doesn't know about `pctr` itself.
fn at_pctr(core: &Core, err: ForthError) -> ForthError {
    match err {
        ForthError::StackUnderflow { stack, .. } => ForthError::StackUnderflow { stack, pctr: core.pctr },
        other => other,
    }
}

/// Execute a single instruction at `core.pctr`, advancing `pctr` first.
pub fn step(core: &mut Core) -> Result<Outcome, ForthError> {
    let pc = core.pctr;
    let instr = core
        .fetch(pc)
        .and_then(Cell::as_instruction)
        .ok_or(ForthError::BadMemoryAccess { address: pc as i64, pctr: pc })?;
    core.pctr = pc + 1;

    match instr.op {
        Op::Const => {
            core.data.push(instr.arg.unwrap_or(0)).map_err(|e| at_pctr(core, e))?;
        }
        Op::Stk => {
            let k = instr.arg.unwrap_or(0);
            let v = core.data.peek(k).map_err(|e| at_pctr(core, e))?;
            core.data.push(v).map_err(|e| at_pctr(core, e))?;
        }
        Op::Rstk => {
            let k = instr.arg.unwrap_or(0);
            let v = core.ret.peek(k).map_err(|e| at_pctr(core, e))?;
            core.data.push(v).map_err(|e| at_pctr(core, e))?;
        }
        Op::Drop => {
            core.data.pop().map_err(|e| at_pctr(core, e))?;
        }
        Op::Rdrop => {
            core.ret.pop().map_err(|e| at_pctr(core, e))?;
        }
        Op::Swap => {
            let a = core.data.pop().map_err(|e| at_pctr(core, e))?;
            let b = core.data.pop().map_err(|e| at_pctr(core, e))?;
            core.data.push(a).map_err(|e| at_pctr(core, e))?;
            core.data.push(b).map_err(|e| at_pctr(core, e))?;
        }
        Op::Rswap => {
            let a = core.ret.pop().map_err(|e| at_pctr(core, e))?;
            let b = core.ret.pop().map_err(|e| at_pctr(core, e))?;
            core.ret.push(a).map_err(|e| at_pctr(core, e))?;
            core.ret.push(b).map_err(|e| at_pctr(core, e))?;
        }
        Op::Str => {
            let v = core.data.pop().map_err(|e| at_pctr(core, e))?;
            core.ret.push(v).map_err(|e| at_pctr(core, e))?;
        }
        Op::Rts => {
            let v = core.ret.pop().map_err(|e| at_pctr(core, e))?;
            core.data.push(v).map_err(|e| at_pctr(core, e))?;
        }
        Op::Load => {
            let addr = core.data.pop().map_err(|e| at_pctr(core, e))?;
            let v = core.load(addr)?;
            core.data.push(v).map_err(|e| at_pctr(core, e))?;
        }
        Op::Store => {
            let addr = core.data.pop().map_err(|e| at_pctr(core, e))?;
            let v = core.data.pop().map_err(|e| at_pctr(core, e))?;
            core.store(addr, v)?;
        }
        Op::Add => binary(core, |a, b| a + b)?,
        Op::Sub => binary(core, |a, b| a - b)?,
        Op::And => binary(core, |a, b| a & b)?,
        Op::Or => binary(core, |a, b| a | b)?,
        Op::Not => {
            let v = core.data.pop().map_err(|e| at_pctr(core, e))?;
            // Bitwise complement, not logical negation: `not 5 == -6`.
            core.data.push(!v).map_err(|e| at_pctr(core, e))?;
        }
        Op::Equ => compare(core, |a, b| a == b)?,
        Op::Gtr => compare(core, |a, b| a > b)?,
        Op::Ltn => compare(core, |a, b| a < b)?,
        Op::Jump => {
            core.pctr = instr.arg.unwrap_or(0) as usize;
        }
        Op::Jumpz => {
            let v = core.data.pop().map_err(|e| at_pctr(core, e))?;
            if v == 0 {
                core.pctr = instr.arg.unwrap_or(0) as usize;
            }
        }
        Op::Call => {
            core.ret.push(core.pctr as i64).map_err(|e| at_pctr(core, e))?;
            core.pctr = instr.arg.unwrap_or(0) as usize;
        }
        Op::Ret => {
            return Ok(match core.ret.try_pop() {
                Some(addr) => {
                    core.pctr = addr as usize;
                    Outcome::Continue
                }
                None => Outcome::Halt,
            });
        }
    }
    Ok(Outcome::Continue)
}

fn binary(core: &mut Core, f: impl Fn(i64, i64) -> i64) -> Result<(), ForthError> {
    let b = core.data.pop().map_err(|e| at_pctr(core, e))?;
    let a = core.data.pop().map_err(|e| at_pctr(core, e))?;
    core.data.push(f(a, b)).map_err(|e| at_pctr(core, e))
}

fn compare(core: &mut Core, f: impl Fn(i64, i64) -> bool) -> Result<(), ForthError> {
    let b = core.data.pop().map_err(|e| at_pctr(core, e))?;
    let a = core.data.pop().map_err(|e| at_pctr(core, e))?;
    let v = if f(a, b) { crate::kernel::TRUE } else { crate::kernel::FALSE };
    core.data.push(v).map_err(|e| at_pctr(core, e))
}

/// Walk backward from `pctr` to the nearest name marker, then forward from
/// `pctr` to the last contiguous instruction cell (§4.H).
pub fn this_word(core: &Core, pctr: usize) -> Option<(usize, usize, String)> {
    let mut b = pctr;
    let name = loop {
        match core.fetch(b) {
            Some(Cell::Marker(name)) => break name.clone(),
            Some(_) if b > 0 => b -= 1,
            _ => return None,
        }
    };
    let first = b + 1;
    let mut last = first.saturating_sub(1);
    let mut i = pctr;
    while let Some(Cell::Instr(_)) = core.fetch(i) {
        last = i;
        i += 1;
    }
    Some((first, last, name))
}

/// Run `step` until the return stack's sanctioned terminal underflow,
/// recording a `TraceView` of the instruction about to execute at each
/// step. `max_steps` bounds a runaway program (§10.F); `None` means
/// unbounded.
pub fn run_to_halt(core: &mut Core, sink: &mut dyn TraceSink, max_steps: Option<usize>) -> Result<usize, ForthError> {
    let mut steps = 0usize;
    loop {
        let view = trace::capture(core, steps);
        sink.record(&view);

        match step(core)? {
            Outcome::Continue => {
                steps += 1;
                if let Some(limit) = max_steps {
                    if steps >= limit {
                        return Err(ForthError::StepLimitExceeded { max_steps: limit });
                    }
                }
            }
            Outcome::Halt => return Ok(steps),
        }
    }
}
