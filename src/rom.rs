//////////////////////////////////////////////////////////////
/// Base ROM
///
/// A hand-assembled sequence of primitive word definitions, laid down at
/// the start of core memory before any user code is compiled (§4.G). Each
/// entry is a name marker followed by its instruction body, always ending
/// in `RET`. `find-word` sees these the same way it sees user-defined
/// words: by linear scan of the compiling region.
///
use crate::errors::ForthError;
use crate::kernel::{Cell, Core, Instruction, Op};

struct Primitive {
    name: &'static str,
    body: Vec<Instruction>,
}

macro_rules! ins {
    ($op:ident) => {
        Instruction { op: Op::$op, arg: None }
    };
    ($op:ident, $arg:expr) => {
        Instruction { op: Op::$op, arg: Some($arg) }
    };
}

/// `[loop]` and `[+loop]` read the index/limit pair `do` left on the return
/// stack beneath the `CALL`'s own return address (bottom to top: `limit`,
/// `index`, `ret-addr`), increment the index in place, and leave a boolean
/// on the data stack for the `loop`/`+loop` expansion's trailing `JUMPZ` to
/// consume: `0` means "keep looping", `-1` means "done" (the `JUMPZ back`
/// that follows jumps only when it pops `0`).
fn loop_body() -> Vec<Instruction> {
    vec![
        ins!(Rstk, 1),  // index
        ins!(Const, 1),
        ins!(Add), // new index
        ins!(Rswap), // return: limit, ret-addr, index
        ins!(Rdrop), // return: limit, ret-addr
        ins!(Str),   // return: limit, ret-addr, new-index
        ins!(Rswap), // return: limit, new-index, ret-addr
        ins!(Rstk, 1), // new-index
        ins!(Rstk, 2), // limit
        ins!(Ltn),   // new-index < limit
        ins!(Not),   // invert: 0 = continue, -1 = done
        ins!(Ret),
    ]
}

fn plus_loop_body() -> Vec<Instruction> {
    vec![
        ins!(Rstk, 1), // index
        ins!(Add),     // step (already on data stack) + index = new index
        ins!(Rswap),
        ins!(Rdrop),
        ins!(Str),
        ins!(Rswap),
        ins!(Rstk, 1),
        ins!(Rstk, 2),
        ins!(Ltn),
        ins!(Not),
        ins!(Ret),
    ]
}

/// Install the base ROM at the head of `core`'s compiling region.
///
/// Must be called before any user-code compilation so that `find-word`
/// resolves the accepted Forth surface (§6) and the `loop`/`+loop`
/// expansions can resolve `[loop]`/`[+loop]` by name.
///
/// `i`, `i'`, `j`, `>r`, and `r>` are conspicuously absent: each is a
/// single return-stack-touching instruction, and wrapping one in a
/// `CALL`/`RET` pair would leave the call's own return address sitting on
/// the return stack exactly where that instruction looks, corrupting it
/// (`>r` as a ROM word would push its argument on top of its own return
/// address, and the matching `RET` would then jump to that argument
/// instead of coming home). They're compiled as direct inline instruction
/// emission by the immediate-word table instead (`compiler::immediates`).
/// `[loop]`/`[+loop]` get away with touching the return stack because
/// their bodies explicitly account for the extra frame with `RSWAP`.
pub fn install(core: &mut Core) -> Result<(), ForthError> {
    core.compiling();

    let primitives: Vec<Primitive> = vec![
        Primitive { name: "dup", body: vec![ins!(Stk, 0), ins!(Ret)] },
        Primitive { name: "drop", body: vec![ins!(Drop), ins!(Ret)] },
        Primitive { name: "swap", body: vec![ins!(Swap), ins!(Ret)] },
        Primitive { name: "over", body: vec![ins!(Stk, 1), ins!(Ret)] },
        Primitive { name: "@", body: vec![ins!(Load), ins!(Ret)] },
        Primitive { name: "!", body: vec![ins!(Store), ins!(Ret)] },
        Primitive { name: "+", body: vec![ins!(Add), ins!(Ret)] },
        Primitive { name: "-", body: vec![ins!(Sub), ins!(Ret)] },
        Primitive { name: "=", body: vec![ins!(Equ), ins!(Ret)] },
        Primitive { name: ">", body: vec![ins!(Gtr), ins!(Ret)] },
        Primitive { name: "<", body: vec![ins!(Ltn), ins!(Ret)] },
        Primitive { name: "not", body: vec![ins!(Not), ins!(Ret)] },
        Primitive { name: "and", body: vec![ins!(And), ins!(Ret)] },
        Primitive { name: "or", body: vec![ins!(Or), ins!(Ret)] },
        Primitive { name: "[loop]", body: loop_body() },
        Primitive { name: "[+loop]", body: plus_loop_body() },
    ];

    for prim in &primitives {
        core.add_word(Cell::Marker(prim.name.to_string()))?;
        for instr in &prim.body {
            core.add_word(Cell::Instr(*instr))?;
        }
    }

    Ok(())
}

//////////////////////////////////////////////
/// TESTS
///
#[cfg(test)]
mod tests {
    use super::*;
    use crate::dictionary::find_word;

    #[test]
    fn every_accepted_builtin_resolves() {
        let mut core = Core::new(200, 20, 10, 10);
        install(&mut core).unwrap();
        for name in [
            "dup", "drop", "swap", "over", "@", "!", "+", "-", "=", ">", "<", "not", "and", "or",
            "[loop]", "[+loop]",
        ] {
            assert!(find_word(&core, name).is_some(), "missing builtin {name}");
        }
    }

    #[test]
    fn every_primitive_body_ends_in_ret() {
        let mut core = Core::new(200, 20, 10, 10);
        install(&mut core).unwrap();
        let addr = find_word(&core, "dup").unwrap();
        let last = core.fetch(addr + 1).unwrap().as_instruction().unwrap();
        assert_eq!(last.op, Op::Stk);
        let ret = core.fetch(addr + 2).unwrap().as_instruction().unwrap();
        assert_eq!(ret.op, Op::Ret);
    }

    #[test]
    fn shadowing_favors_the_later_definition() {
        let mut core = Core::new(200, 20, 10, 10);
        install(&mut core).unwrap();
        let first = find_word(&core, "dup").unwrap();
        core.add_word(Cell::Marker("dup".to_string())).unwrap();
        core.add_word(Cell::Instr(ins!(Ret))).unwrap();
        let second = find_word(&core, "dup").unwrap();
        assert!(second > first);
    }
}
