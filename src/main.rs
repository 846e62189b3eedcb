// forthtrace main program

mod compiler;
mod config;
mod dictionary;
mod errors;
mod kernel;
mod messages;
mod rom;
mod tokenizer;
mod trace;
mod vm;

use std::fs;
use std::process::ExitCode;

use config::Config;
use errors::ForthError;
use kernel::{Cell, Core};
use messages::Msg;
use trace::{NullSink, TextPageSink, TraceSink};

fn main() -> ExitCode {
    let mut config = Config::new();
    config.process_args();

    let mut msg = Msg::new();
    msg.set_level(config.debug_level);

    match run(&config, &msg) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            msg.error("main", &e.to_string(), None::<()>);
            ExitCode::FAILURE
        }
    }
}

fn run(config: &Config, msg: &Msg) -> Result<(), ForthError> {
    let mut core = Core::new(
        config.core_size,
        config.interp_size,
        config.data_size,
        config.return_size,
    );

    if config.dump_rom {
        rom::install(&mut core)?;
        dump_rom(&core);
        return Ok(());
    }

    let source = source_text(config)?;
    compiler::compile(&mut core, &source)?;

    let mut null_sink = NullSink;
    let mut text_sink = TextPageSink::new(config.trace_dir.clone(), config.stack_elements);
    let sink: &mut dyn TraceSink = if config.no_trace { &mut null_sink } else { &mut text_sink };

    let steps = vm::run_to_halt(&mut core, sink, Some(config.max_steps))?;
    msg.info("main", "program halted", Some(steps));

    println!("{:?}", core.data.snapshot());
    Ok(())
}

/// `--file` wins over `--prog` when both are given; an empty program is
/// valid (it just installs the ROM and immediately halts).
fn source_text(config: &Config) -> Result<String, ForthError> {
    if let Some(path) = &config.file {
        return fs::read_to_string(path).map_err(|_| ForthError::TokenizerFailure { head: 0 });
    }
    if let Some(prog) = &config.prog {
        return Ok(prog.clone());
    }
    Ok(String::new())
}

/// Disassemble the installed base ROM: every marker and instruction in the
/// compiling region, in address order (§10.F).
fn dump_rom(core: &Core) {
    for addr in 0..core.here_com() {
        match core.fetch(addr) {
            Some(Cell::Marker(name)) => println!("{addr:>4}: {name}:"),
            Some(Cell::Instr(ins)) => match ins.arg {
                Some(arg) => println!("{addr:>4}:     {} {}", ins.op.mnemonic(), arg),
                None => println!("{addr:>4}:     {}", ins.op.mnemonic()),
            },
            Some(Cell::Int(n)) => println!("{addr:>4}:     {n}"),
            None => {}
        }
    }
}
