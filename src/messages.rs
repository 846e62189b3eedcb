//! Diagnostics
//!
//! A small, dependency-free logger used throughout the interpreter. Every
//! message carries a caller tag, free text, and an optional context value
//! printed with `{:?}`. Severity filtering happens at the call site by
//! comparing against the level set with `set_level`.

use std::fmt::Debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum DebugLevel {
    Error,
    Warning,
    Info,
    Debug,
}

pub struct Msg {
    level: DebugLevel,
}

impl Msg {
    pub fn new() -> Msg {
        Msg {
            level: DebugLevel::Error,
        }
    }

    pub fn set_level(&mut self, level: DebugLevel) {
        self.level = level;
    }

    pub fn get_level(&self) -> DebugLevel {
        self.level
    }

    fn emit<T: Debug>(&self, severity: DebugLevel, tag: &str, caller: &str, text: &str, context: Option<T>) {
        if severity > self.level {
            return;
        }
        match context {
            Some(ctx) => eprintln!("{tag} {caller}: {text} ({ctx:?})"),
            None => eprintln!("{tag} {caller}: {text}"),
        }
    }

    pub fn error<T: Debug>(&self, caller: &str, text: &str, context: Option<T>) {
        self.emit(DebugLevel::Error, "ERROR", caller, text, context);
    }

    pub fn warning<T: Debug>(&self, caller: &str, text: &str, context: Option<T>) {
        self.emit(DebugLevel::Warning, "WARNING", caller, text, context);
    }

    pub fn info<T: Debug>(&self, caller: &str, text: &str, context: Option<T>) {
        self.emit(DebugLevel::Info, "INFO", caller, text, context);
    }

    pub fn debug<T: Debug>(&self, caller: &str, text: &str, context: Option<T>) {
        self.emit(DebugLevel::Debug, "DEBUG", caller, text, context);
    }
}

impl Default for Msg {
    fn default() -> Msg {
        Msg::new()
    }
}
