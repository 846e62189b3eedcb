//////////////////////////////////////////////////////////////
/// Immediate Words
///
/// Compile-time macros (§4.E). Each reads or writes the compiler's
/// address-patch stack to resolve forward/back jump targets once the
/// matching closing word is seen. Control-flow words assume the active
/// region is whichever one the driver loop is currently filling — they
/// never switch regions themselves (only `:`, `;`, and `variable` do).
///
use super::Compiler;
use crate::dictionary::find_word;
use crate::errors::ForthError;
use crate::kernel::{Cell, Instruction, Op};

pub type Handler = fn(&mut Compiler) -> Result<(), ForthError>;

pub fn lookup(name: &str) -> Option<Handler> {
    let handler: Handler = match name {
        ":" => colon,
        ";" => semicolon,
        "exit" => exit,
        "if" => r#if,
        "else" => r#else,
        "then" => then,
        "begin" => begin,
        "until" => until,
        "repeat" => repeat,
        "do" => r#do,
        "loop" => r#loop,
        "+loop" => plus_loop,
        "variable" => variable,
        "i" => index,
        "i'" => index_prime,
        "j" => outer_index,
        ">r" => to_r,
        "r>" => from_r,
        _ => return None,
    };
    Some(handler)
}

/// `i`, `i'`, `j`, `>r`, and `r>` are single return-stack instructions
/// emitted directly into whichever region is active, not dictionary words
/// reached through `CALL`/`RET` (see the comment on `rom::install` for why
/// wrapping them in a call frame would corrupt the return stack).
fn index(c: &mut Compiler) -> Result<(), ForthError> {
    c.core.add_word(Cell::Instr(Instruction::with_arg(Op::Rstk, 0)))?;
    Ok(())
}

fn index_prime(c: &mut Compiler) -> Result<(), ForthError> {
    c.core.add_word(Cell::Instr(Instruction::with_arg(Op::Rstk, 2)))?;
    Ok(())
}

fn outer_index(c: &mut Compiler) -> Result<(), ForthError> {
    c.core.add_word(Cell::Instr(Instruction::with_arg(Op::Rstk, 3)))?;
    Ok(())
}

fn to_r(c: &mut Compiler) -> Result<(), ForthError> {
    c.core.add_word(Cell::Instr(Instruction::bare(Op::Str)))?;
    Ok(())
}

fn from_r(c: &mut Compiler) -> Result<(), ForthError> {
    c.core.add_word(Cell::Instr(Instruction::bare(Op::Rts)))?;
    Ok(())
}

fn unbalanced() -> ForthError {
    ForthError::UnbalancedControl { pending: 0 }
}

fn colon(c: &mut Compiler) -> Result<(), ForthError> {
    c.core.compiling();
    let name = c.expect_name()?;
    c.core.add_word(Cell::Marker(name))?;
    Ok(())
}

fn semicolon(c: &mut Compiler) -> Result<(), ForthError> {
    c.core.add_word(Cell::Instr(Instruction::bare(Op::Ret)))?;
    c.core.interpreting();
    Ok(())
}

fn exit(c: &mut Compiler) -> Result<(), ForthError> {
    c.core.add_word(Cell::Instr(Instruction::bare(Op::Ret)))?;
    Ok(())
}

fn r#if(c: &mut Compiler) -> Result<(), ForthError> {
    c.addr_stack.push(c.core.here());
    c.core.add_word(Cell::Instr(Instruction::with_arg(Op::Jumpz, -1)))?;
    Ok(())
}

/// Pops the `if`'s pending `JUMPZ` address and patches it to land just past
/// the `JUMP` emitted here (the start of the else-branch body), then pushes
/// this `JUMP`'s own address for `then` to patch to the join point.
fn r#else(c: &mut Compiler) -> Result<(), ForthError> {
    let jump_addr = c.core.here();
    c.core.add_word(Cell::Instr(Instruction::with_arg(Op::Jump, -1)))?;
    let else_body = c.core.here();
    let if_addr = c.addr_stack.pop().ok_or_else(unbalanced)?;
    c.core.patch_here_relative(if_addr, else_body as i64);
    c.addr_stack.push(jump_addr);
    Ok(())
}

fn then(c: &mut Compiler) -> Result<(), ForthError> {
    let addr = c.addr_stack.pop().ok_or_else(unbalanced)?;
    c.core.patch_here_relative(addr, c.core.here() as i64);
    Ok(())
}

fn begin(c: &mut Compiler) -> Result<(), ForthError> {
    c.addr_stack.push(c.core.here());
    Ok(())
}

fn until(c: &mut Compiler) -> Result<(), ForthError> {
    let target = c.addr_stack.pop().ok_or_else(unbalanced)?;
    c.core.add_word(Cell::Instr(Instruction::with_arg(Op::Jumpz, target as i64)))?;
    Ok(())
}

fn repeat(c: &mut Compiler) -> Result<(), ForthError> {
    let target = c.addr_stack.pop().ok_or_else(unbalanced)?;
    c.core.add_word(Cell::Instr(Instruction::with_arg(Op::Jump, target as i64)))?;
    Ok(())
}

fn r#do(c: &mut Compiler) -> Result<(), ForthError> {
    c.core.add_word(Cell::Instr(Instruction::bare(Op::Swap)))?;
    c.core.add_word(Cell::Instr(Instruction::bare(Op::Str)))?;
    c.core.add_word(Cell::Instr(Instruction::bare(Op::Str)))?;
    c.addr_stack.push(c.core.here());
    Ok(())
}

fn loop_helper_body_addr(c: &Compiler, name: &str) -> Result<i64, ForthError> {
    find_word(c.core, name)
        .map(|marker| (marker + 1) as i64)
        .ok_or_else(|| ForthError::UnknownWord { token: name.to_string(), head: 0 })
}

fn r#loop(c: &mut Compiler) -> Result<(), ForthError> {
    let body = loop_helper_body_addr(c, "[loop]")?;
    c.core.add_word(Cell::Instr(Instruction::with_arg(Op::Call, body)))?;
    let back = c.addr_stack.pop().ok_or_else(unbalanced)?;
    c.core.add_word(Cell::Instr(Instruction::with_arg(Op::Jumpz, back as i64)))?;
    c.core.add_word(Cell::Instr(Instruction::bare(Op::Rdrop)))?;
    c.core.add_word(Cell::Instr(Instruction::bare(Op::Rdrop)))?;
    Ok(())
}

fn plus_loop(c: &mut Compiler) -> Result<(), ForthError> {
    let body = loop_helper_body_addr(c, "[+loop]")?;
    c.core.add_word(Cell::Instr(Instruction::with_arg(Op::Call, body)))?;
    let back = c.addr_stack.pop().ok_or_else(unbalanced)?;
    c.core.add_word(Cell::Instr(Instruction::with_arg(Op::Jumpz, back as i64)))?;
    c.core.add_word(Cell::Instr(Instruction::bare(Op::Rdrop)))?;
    c.core.add_word(Cell::Instr(Instruction::bare(Op::Rdrop)))?;
    Ok(())
}

fn variable(c: &mut Compiler) -> Result<(), ForthError> {
    c.core.compiling();
    let name = c.expect_name()?;
    c.core.add_word(Cell::Marker(name))?;
    let const_addr = c.core.here();
    let data_cell = const_addr + 2;
    c.core.add_word(Cell::Instr(Instruction::with_arg(Op::Const, data_cell as i64)))?;
    c.core.add_word(Cell::Instr(Instruction::bare(Op::Ret)))?;
    c.core.add_word(Cell::Int(0))?;
    c.core.interpreting();
    Ok(())
}

//////////////////////////////////////////////
/// TESTS
///
#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::compile;
    use crate::kernel::Core;
    use crate::trace::NullSink;
    use crate::vm;

    #[test]
    fn unmatched_until_is_unbalanced() {
        let mut core = Core::new(1000, 100, 10, 10);
        let err = compile(&mut core, ": t until ;").unwrap_err();
        assert!(matches!(err, ForthError::UnbalancedControl { .. }));
    }

    #[test]
    fn variable_store_and_fetch_round_trip() {
        let mut core = Core::new(1000, 100, 10, 10);
        compile(&mut core, "variable v 7 v ! v @ v @").unwrap();
        let mut sink = NullSink;
        vm::run_to_halt(&mut core, &mut sink, Some(10_000)).unwrap();
        assert_eq!(core.data.snapshot(), &[7, 7]);
    }

    #[test]
    fn nested_do_loops_use_i_prime_for_the_outer_index() {
        let mut core = Core::new(1000, 200, 64, 64);
        compile(&mut core, ": c 2 0 do 3 0 do i' i loop loop ; c").unwrap();
        let mut sink = NullSink;
        vm::run_to_halt(&mut core, &mut sink, Some(100_000)).unwrap();
        assert_eq!(core.data.snapshot(), &[0, 0, 0, 1, 0, 2, 1, 0, 1, 1, 1, 2]);
    }

    #[test]
    fn to_r_and_from_r_round_trip_through_the_return_stack() {
        let mut core = Core::new(1000, 100, 10, 10);
        compile(&mut core, "5 >r 9 r>").unwrap();
        let mut sink = NullSink;
        vm::run_to_halt(&mut core, &mut sink, Some(10_000)).unwrap();
        assert_eq!(core.data.snapshot(), &[9, 5]);
    }
}
