//! Run configuration consumed by the pipeline core.

/// Raw fragment text as registered on the command line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FragmentSources {
    pub begin: Option<String>,
    /// Per-line fragments in declaration order.
    pub code: Vec<String>,
    pub end: Option<String>,
}

impl FragmentSources {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_begin(mut self, text: impl Into<String>) -> Self {
        self.begin = Some(text.into());
        self
    }

    pub fn with_code(mut self, text: impl Into<String>) -> Self {
        self.code.push(text.into());
        self
    }

    pub fn with_end(mut self, text: impl Into<String>) -> Self {
        self.end = Some(text.into());
        self
    }
}

/// Output and diagnostics switches for a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunOptions {
    /// Never write records to the output stream.
    pub quiet: bool,
    /// Trace every stage to the diagnostics stream.
    pub debug: bool,
    /// Also dump the store whenever a per-line fragment changes it.
    pub debug_store: bool,
}

impl RunOptions {
    /// Apply flag interactions: debug implies quiet, and store tracing
    /// only applies while debugging.
    pub fn normalized(self) -> Self {
        Self {
            quiet: self.quiet || self.debug,
            debug: self.debug,
            debug_store: self.debug && self.debug_store,
        }
    }
}
