//! Stage-by-stage tracing to the diagnostics stream.
//!
//! The tracer only observes: it receives references to values the executor
//! already holds and never alters what a stage receives or returns. Layout:
//!
//! ```text
//! [line #1]
//!   in: "a"
//!   [func #1]
//!     in:  "a"
//!     out: "A"
//!   [/func #1]
//!   out: "A"
//! [/line #1]
//! ```
//!
//! With store tracing on, the store is dumped after a per-line stage only
//! when its JSON snapshot differs from the one taken before the call.

use std::io::{self, Write};

use crate::executor::{LineOutcome, StepOutcome, to_json};
use crate::fragment::Fragment;
use crate::store::{Store, Value};

const IGNORED: &str = "IGNORED";

pub struct Tracer<'a> {
    out: &'a mut dyn Write,
    store_deltas: bool,
    before: Option<String>,
}

impl<'a> Tracer<'a> {
    pub fn new(out: &'a mut dyn Write, store_deltas: bool) -> Self {
        Self {
            out,
            store_deltas,
            before: None,
        }
    }

    pub fn begin_start(&mut self) -> io::Result<()> {
        writeln!(self.out, "[begin]")?;
        self.out.flush()
    }

    pub fn begin_end(&mut self, store: &Store) -> io::Result<()> {
        writeln!(self.out, "[/begin]")?;
        writeln!(self.out, "{}", store.to_pretty_json())?;
        self.out.flush()
    }

    pub fn line_start(&mut self, line_number: usize, input: &Value) -> io::Result<()> {
        writeln!(self.out, "[line #{line_number}]")?;
        writeln!(self.out, "  in: {}", to_json(input))?;
        self.out.flush()
    }

    pub fn stage_start<S: ?Sized>(
        &mut self,
        fragment: &Fragment<S>,
        input: &Value,
        store: &Store,
    ) -> io::Result<()> {
        writeln!(self.out, "  [{}]", fragment.label())?;
        writeln!(self.out, "    in:  {}", to_json(input))?;
        if self.store_deltas {
            self.before = Some(store.snapshot());
        }
        self.out.flush()
    }

    /// `current` is the value after the step was applied.
    pub fn stage_end<S: ?Sized>(
        &mut self,
        fragment: &Fragment<S>,
        step: &StepOutcome,
        current: &Value,
        store: &Store,
    ) -> io::Result<()> {
        match step {
            StepOutcome::Suppressed => writeln!(self.out, "    out: {IGNORED}")?,
            StepOutcome::Continue(_) | StepOutcome::Unchanged => {
                writeln!(self.out, "    out: {}", to_json(current))?
            }
        }
        writeln!(self.out, "  [/{}]", fragment.label())?;
        if let Some(before) = self.before.take()
            && before != store.snapshot()
        {
            writeln!(self.out, "{}", store.to_pretty_json())?;
        }
        self.out.flush()
    }

    pub fn line_end(&mut self, line_number: usize, outcome: &LineOutcome) -> io::Result<()> {
        match outcome {
            LineOutcome::Emit(value) => writeln!(self.out, "  out: {}", to_json(value))?,
            LineOutcome::Suppress => writeln!(self.out, "  out: {IGNORED}")?,
        }
        writeln!(self.out, "[/line #{line_number}]")?;
        self.out.flush()
    }

    pub fn end_start(&mut self) -> io::Result<()> {
        writeln!(self.out, "[end]")?;
        self.out.flush()
    }

    pub fn end_end(&mut self, store: &Store) -> io::Result<()> {
        writeln!(self.out, "[/end]")?;
        writeln!(self.out, "{}", store.to_pretty_json())?;
        self.out.flush()
    }
}
