// system configuration and command line processing

use ::clap::{arg, Command};
use std::path::PathBuf;

use crate::kernel::{DEFAULT_CORE_SIZE, DEFAULT_INTERP_SIZE, DEFAULT_STACK_SIZE};
use crate::messages::DebugLevel;

pub const VERSION: &str = "0.1.0";
pub const DEFAULT_MAX_STEPS: usize = 1_000_000;

pub struct Config {
    pub debug_level: DebugLevel,
    pub core_size: usize,
    pub interp_size: usize,
    pub data_size: usize,
    pub return_size: usize,
    pub stack_elements: usize,
    pub file: Option<String>,
    pub prog: Option<String>,
    pub trace_dir: Option<PathBuf>,
    pub no_trace: bool,
    pub dump_rom: bool,
    pub max_steps: usize,
}

impl Config {
    pub fn new() -> Config {
        Config {
            debug_level: DebugLevel::Error,
            core_size: DEFAULT_CORE_SIZE,
            interp_size: DEFAULT_INTERP_SIZE,
            data_size: DEFAULT_STACK_SIZE,
            return_size: DEFAULT_STACK_SIZE,
            stack_elements: DEFAULT_STACK_SIZE,
            file: None,
            prog: None,
            trace_dir: None,
            no_trace: false,
            dump_rom: false,
            max_steps: DEFAULT_MAX_STEPS,
        }
    }

    /// process_args handles command line argument processing using the clap library
    ///
    pub fn process_args(&mut self) -> &Config {
        let arguments = Command::new("forthtrace")
            .version(VERSION)
            .about("Tokenizer, compiler, and stack VM for a minimal Forth, with a per-step trace interface")
            .arg(arg!(--debuglevel <VALUE>).required(false).value_parser(["error", "warning", "info", "debug"]))
            .arg(arg!(--"core-size" <N>).required(false))
            .arg(arg!(--"data-size" <N>).required(false))
            .arg(arg!(--"return-size" <N>).required(false))
            .arg(arg!(--"stack-elements" <N>).required(false))
            .arg(arg!(--file <PATH>).required(false))
            .arg(arg!(--prog <SOURCE>).required(false))
            .arg(arg!(--"trace-dir" <PATH>).required(false))
            .arg(arg!(--"no-trace").required(false))
            .arg(arg!(--"dump-rom").required(false))
            .arg(arg!(--"max-steps" <N>).required(false))
            .get_matches();

        if let Some(level) = arguments.get_one::<String>("debuglevel") {
            self.debug_level = match level.as_str() {
                "debug" => DebugLevel::Debug,
                "info" => DebugLevel::Info,
                "warning" => DebugLevel::Warning,
                _ => DebugLevel::Error,
            };
        }

        if let Some(n) = arguments.get_one::<String>("core-size").and_then(|s| s.parse().ok()) {
            self.core_size = n;
        }
        // `--stack-elements` only bounds how many cells the trace renderer
        // prints per stack (§6); it never touches the VM's actual stack
        // capacity, which is `--data-size`/`--return-size` alone.
        if let Some(n) = arguments.get_one::<String>("stack-elements").and_then(|s| s.parse().ok()) {
            self.stack_elements = n;
        }
        if let Some(n) = arguments.get_one::<String>("data-size").and_then(|s| s.parse().ok()) {
            self.data_size = n;
        }
        if let Some(n) = arguments.get_one::<String>("return-size").and_then(|s| s.parse().ok()) {
            self.return_size = n;
        }
        if let Some(n) = arguments.get_one::<String>("max-steps").and_then(|s| s.parse().ok()) {
            self.max_steps = n;
        }

        if let Some(file) = arguments.get_one::<String>("file") {
            self.file = Some(file.clone());
        }
        if let Some(prog) = arguments.get_one::<String>("prog") {
            self.prog = Some(prog.clone());
        }
        if let Some(dir) = arguments.get_one::<String>("trace-dir") {
            self.trace_dir = Some(PathBuf::from(dir));
        }

        self.no_trace = arguments.get_flag("no-trace");
        self.dump_rom = arguments.get_flag("dump-rom");

        self
    }
}

impl Default for Config {
    fn default() -> Config {
        Config::new()
    }
}
