//! Stage roles, stage traits and the compiler seam.
//!
//! A fragment is one piece of user code attached to a lifecycle role. Once
//! compiled it becomes a stage: a boxed callable with a fixed signature per
//! role. Any backend that can turn text into these callables implements
//! [`ScriptCompiler`].

use std::fmt;

use crate::store::{Store, Value};

/// Lifecycle role of a fragment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Begin,
    Line,
    End,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Role::Begin => "begin",
            Role::Line => "line",
            Role::End => "end",
        };
        f.write_str(name)
    }
}

/// Message describing why a stage invocation failed.
pub type StageFailure = String;

/// A compiled begin fragment: `(store) -> ()`.
pub trait BeginStage {
    fn run(&self, store: &mut Store) -> Result<(), StageFailure>;
}

/// A compiled per-line fragment: `(current, store, index) -> result`.
///
/// `index` is the 0-based line index. The returned value is classified by
/// the executor; see [`crate::executor::classify`].
pub trait LineStage {
    fn apply(&self, current: Value, store: &mut Store, index: usize)
    -> Result<Value, StageFailure>;
}

/// A compiled end fragment: `(store, processed_count) -> ()`.
pub trait EndStage {
    fn run(&self, store: &mut Store, count: usize) -> Result<(), StageFailure>;
}

impl<F> BeginStage for F
where
    F: Fn(&mut Store) -> Result<(), StageFailure>,
{
    fn run(&self, store: &mut Store) -> Result<(), StageFailure> {
        self(store)
    }
}

impl<F> LineStage for F
where
    F: Fn(Value, &mut Store, usize) -> Result<Value, StageFailure>,
{
    fn apply(
        &self,
        current: Value,
        store: &mut Store,
        index: usize,
    ) -> Result<Value, StageFailure> {
        self(current, store, index)
    }
}

impl<F> EndStage for F
where
    F: Fn(&mut Store, usize) -> Result<(), StageFailure>,
{
    fn run(&self, store: &mut Store, count: usize) -> Result<(), StageFailure> {
        self(store, count)
    }
}

/// Host service that compiles fragment text into stages.
///
/// Implementations must report syntax errors from these methods, never
/// defer them to the first invocation.
pub trait ScriptCompiler {
    fn compile_begin(&self, source: &str) -> Result<Box<dyn BeginStage>, String>;
    fn compile_line(&self, source: &str) -> Result<Box<dyn LineStage>, String>;
    fn compile_end(&self, source: &str) -> Result<Box<dyn EndStage>, String>;
}

/// A compiled fragment together with the text it was compiled from.
pub struct Fragment<S: ?Sized> {
    pub role: Role,
    /// 1-based position among registered per-line fragments.
    pub ordinal: Option<usize>,
    /// Source text as compiled (trimmed, shorthand expanded).
    pub text: String,
    pub stage: Box<S>,
}

impl<S: ?Sized> fmt::Debug for Fragment<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Fragment")
            .field("role", &self.role)
            .field("ordinal", &self.ordinal)
            .field("text", &self.text)
            .finish_non_exhaustive()
    }
}

impl<S: ?Sized> Fragment<S> {
    /// Label used in trace output, e.g. `func #2` or `begin`.
    pub fn label(&self) -> String {
        match self.ordinal {
            Some(n) => format!("func #{n}"),
            None => self.role.to_string(),
        }
    }
}
