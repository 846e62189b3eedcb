//! Fatal interpreter errors (§7 of the design).
//!
//! Nothing in this crate recovers from one of these: the tokenizer, compiler,
//! and VM all return `Result<_, ForthError>`, and `main` is the only place
//! that turns an `Err` into a logged message and a process exit.

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ForthError {
    /// An empty or malformed source could not even be scanned into tokens.
    TokenizerFailure { head: usize },
    /// A token was neither an integer, a dictionary word, nor an immediate word.
    UnknownWord { token: String, head: usize },
    StackOverflow { stack: StackKind, capacity: usize },
    StackUnderflow { stack: StackKind, pctr: usize },
    /// `here-com` or `here-int` would exceed its region's capacity.
    CoreOverflow { region: Region, here: usize, capacity: usize },
    /// Compile ended with unmatched `if`/`begin`/`do` (non-empty address stack).
    UnbalancedControl { pending: usize },
    /// `LOAD`/`STORE` addressed outside `[0, core-size)`.
    BadMemoryAccess { address: i64, pctr: usize },
    /// `--max-steps` exceeded without the return stack underflowing.
    StepLimitExceeded { max_steps: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StackKind {
    Data,
    Return,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Region {
    Compiling,
    Interpreting,
}

impl fmt::Display for ForthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ForthError::TokenizerFailure { head } => {
                write!(f, "tokenizer failed at source offset {head}")
            }
            ForthError::UnknownWord { token, head } => {
                write!(f, "unknown word '{token}' at source offset {head}")
            }
            ForthError::StackOverflow { stack, capacity } => {
                write!(f, "{stack:?} stack overflow: capacity {capacity} exceeded")
            }
            ForthError::StackUnderflow { stack, pctr } => {
                write!(f, "{stack:?} stack underflow at pctr {pctr}")
            }
            ForthError::CoreOverflow { region, here, capacity } => {
                write!(f, "{region:?} region overflow: here={here} capacity={capacity}")
            }
            ForthError::UnbalancedControl { pending } => {
                write!(f, "unbalanced control structure: {pending} unresolved reference(s) at end of compile")
            }
            ForthError::BadMemoryAccess { address, pctr } => {
                write!(f, "bad memory access at address {address} (pctr {pctr})")
            }
            ForthError::StepLimitExceeded { max_steps } => {
                write!(f, "program did not halt within {max_steps} steps")
            }
        }
    }
}

impl std::error::Error for ForthError {}
