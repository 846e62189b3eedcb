//////////////////////////////////////////////////////////////
/// Trace Interface
///
/// A read-only, owned snapshot of VM state taken once per step (§4.H): the
/// program counter, both stacks, the enclosing word's name and address
/// range, and the decoded mnemonic of the instruction about to execute.
/// `TraceSink` is the contract the (out-of-scope) renderer implements;
/// `NullSink` and `TextPageSink` are the reference consumers this crate
/// ships to prove the interface is sufficient (§10.D), not the deliverable.
///
use std::fs;
use std::path::PathBuf;

use crate::kernel::Core;
use crate::vm;

#[derive(Debug, Clone)]
pub struct TraceView {
    pub step: usize,
    pub pctr: usize,
    pub data_stack: Vec<i64>,
    pub return_stack: Vec<i64>,
    pub word_name: Option<String>,
    pub word_range: Option<(usize, usize)>,
    pub mnemonic: Option<(&'static str, Option<i64>)>,
}

/// Decode the instruction at `pctr`, if any, into a mnemonic and argument.
pub fn decode(core: &Core, pctr: usize) -> Option<(&'static str, Option<i64>)> {
    core.fetch(pctr).and_then(|c| c.as_instruction()).map(|ins| (ins.op.mnemonic(), ins.arg))
}

/// Build the read-only view of the instruction about to execute at
/// `core.pctr`. `step` is the running count of instructions already
/// executed, supplied by the driver loop (`vm::run_to_halt`).
pub fn capture(core: &Core, step: usize) -> TraceView {
    let pctr = core.pctr;
    let (word_name, word_range) = match vm::this_word(core, pctr) {
        Some((first, last, name)) => (Some(name), Some((first, last))),
        None => (None, None),
    };
    TraceView {
        step,
        pctr,
        data_stack: core.data.snapshot().to_vec(),
        return_stack: core.ret.snapshot().to_vec(),
        word_name,
        word_range,
        mnemonic: decode(core, pctr),
    }
}

pub trait TraceSink {
    fn record(&mut self, view: &TraceView);
}

/// Discards every view. Used with `--no-trace` to skip the per-step
/// snapshot cost.
pub struct NullSink;

impl TraceSink for NullSink {
    fn record(&mut self, _view: &TraceView) {}
}

/// Renders each step as a small formatted text block: the word name and
/// range, an arrow at `pctr`, the decoded instruction, and both stacks.
/// Stands in for the vector-document renderer the design excludes from the
/// core (§1, §10.D); it does not attempt pagination, fonts, or layout.
pub struct TextPageSink {
    trace_dir: Option<PathBuf>,
    pages: Vec<String>,
    /// How many cells of each stack to print, counting from the top (§6's
    /// "how many cells the trace draws" knob). Purely cosmetic: it never
    /// affects the VM's real stack capacity.
    stack_elements: usize,
}

impl TextPageSink {
    pub fn new(trace_dir: Option<PathBuf>, stack_elements: usize) -> TextPageSink {
        TextPageSink {
            trace_dir,
            pages: Vec::new(),
            stack_elements,
        }
    }

    pub fn pages(&self) -> &[String] {
        &self.pages
    }

    /// The top `stack_elements` cells of `stack` (bottom-first order
    /// preserved), or the whole stack if it's shorter than that.
    fn visible<'a>(&self, stack: &'a [i64]) -> &'a [i64] {
        let start = stack.len().saturating_sub(self.stack_elements);
        &stack[start..]
    }

    fn render(&self, step: usize, view: &TraceView) -> String {
        let word = view.word_name.as_deref().unwrap_or("?");
        let range = view
            .word_range
            .map(|(a, b)| format!("{a}..{b}"))
            .unwrap_or_else(|| "?".to_string());
        let instr = match view.mnemonic {
            Some((name, Some(arg))) => format!("{name} {arg}"),
            Some((name, None)) => name.to_string(),
            None => "?".to_string(),
        };
        format!(
            "step {step}\nword {word} [{range}]\n-> pctr {pctr}: {instr}\ndata  {data:?}\nreturn {ret:?}\n",
            step = step,
            word = word,
            range = range,
            pctr = view.pctr,
            instr = instr,
            data = self.visible(&view.data_stack),
            ret = self.visible(&view.return_stack),
        )
    }
}

impl TraceSink for TextPageSink {
    fn record(&mut self, view: &TraceView) {
        let step = view.step;
        let page = self.render(step, view);

        match &self.trace_dir {
            Some(dir) => {
                let path = dir.join(format!("step_{step:06}.txt"));
                if let Err(e) = fs::write(&path, &page) {
                    eprintln!("WARNING trace: failed to write {}: {e}", path.display());
                }
            }
            None => self.pages.push(page),
        }
    }
}

//////////////////////////////////////////////
/// TESTS
///
#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::{Cell, Instruction, Op};

    fn core_with_one_word() -> Core {
        let mut core = Core::new(16, 8, 8, 8);
        core.compiling();
        core.add_word(Cell::Marker("foo".to_string())).unwrap();
        core.add_word(Cell::Instr(Instruction::with_arg(Op::Const, 5))).unwrap();
        core.add_word(Cell::Instr(Instruction::bare(Op::Ret))).unwrap();
        core
    }

    #[test]
    fn capture_reports_word_and_instruction() {
        let mut core = core_with_one_word();
        core.pctr = 1;
        core.data.push(1).unwrap();
        let view = capture(&core, 0);
        assert_eq!(view.word_name.as_deref(), Some("foo"));
        assert_eq!(view.word_range, Some((1, 2)));
        assert_eq!(view.mnemonic, Some(("const", Some(5))));
        assert_eq!(view.data_stack, vec![1]);
    }

    #[test]
    fn capture_reports_the_supplied_step_count() {
        let core = core_with_one_word();
        assert_eq!(capture(&core, 0).step, 0);
        assert_eq!(capture(&core, 7).step, 7);
    }

    #[test]
    fn null_sink_discards_everything() {
        let core = core_with_one_word();
        let view = capture(&core, 0);
        let mut sink = NullSink;
        sink.record(&view);
    }

    #[test]
    fn text_page_sink_collects_pages_in_memory_without_a_dir() {
        let core = core_with_one_word();
        let mut sink = TextPageSink::new(None, 10);
        sink.record(&capture(&core, 0));
        sink.record(&capture(&core, 1));
        assert_eq!(sink.pages().len(), 2);
        assert!(sink.pages()[0].contains("foo"));
        assert!(sink.pages()[0].contains("const 5"));
        assert!(sink.pages()[1].contains("step 1"));
    }

    #[test]
    fn stack_elements_truncates_to_the_top_n_cells() {
        let mut core = core_with_one_word();
        for v in [1, 2, 3, 4, 5] {
            core.data.push(v).unwrap();
        }
        let view = capture(&core, 0);
        let mut sink = TextPageSink::new(None, 2);
        sink.record(&view);
        assert!(sink.pages()[0].contains("data  [4, 5]"));
    }

    #[test]
    fn stack_elements_larger_than_the_stack_prints_everything() {
        let mut core = core_with_one_word();
        core.data.push(1).unwrap();
        let view = capture(&core, 0);
        let mut sink = TextPageSink::new(None, 100);
        sink.record(&view);
        assert!(sink.pages()[0].contains("data  [1]"));
    }
}
