//! Error tiers for compiling and running a line pipeline.
//!
//! Compile errors are usage errors: the user's program cannot run at all.
//! Everything raised while a stage is executing is a runtime failure and
//! terminates the run.

use thiserror::Error;

use crate::fragment::Role;

/// Exit status for a run that consumed all input.
pub const EXIT_SUCCESS: i32 = 0;
/// Exit status for a fatal stage error at runtime.
pub const EXIT_RUNTIME_FAILURE: i32 = 1;
/// Exit status for a malformed fragment or invalid invocation.
pub const EXIT_USAGE: i32 = 2;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("{} cannot be compiled ({text}): {message}", describe(.role, .ordinal))]
    FragmentCompile {
        role: Role,
        /// 1-based position, only set for per-line fragments.
        ordinal: Option<usize>,
        /// Fragment text after the shorthand rewrite.
        text: String,
        message: String,
    },

    #[error("Begin code failed: {message}")]
    BeginFailed { message: String },

    #[error(
        "Line processing code #{ordinal} ({text}) failed when processing line #{line_number}: {message}\n  current: {current}\n  input:   {input}"
    )]
    LineFailed {
        ordinal: usize,
        text: String,
        line_number: usize,
        /// JSON rendering of the value the fragment received.
        current: String,
        /// JSON rendering of the unmodified input line.
        input: String,
        message: String,
    },

    #[error("End code failed: {message}")]
    EndFailed { message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl PipelineError {
    /// Process exit status for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            PipelineError::FragmentCompile { .. } => EXIT_USAGE,
            _ => EXIT_RUNTIME_FAILURE,
        }
    }

    /// True for registration-time errors detected before any input is read.
    pub fn is_usage_error(&self) -> bool {
        self.exit_code() == EXIT_USAGE
    }
}

fn describe(role: &Role, ordinal: &Option<usize>) -> String {
    match (role, ordinal) {
        (Role::Line, Some(n)) => format!("Line processing code #{n}"),
        (Role::Line, None) => "Line processing code".to_string(),
        (Role::Begin, _) => "Begin code".to_string(),
        (Role::End, _) => "End code".to_string(),
    }
}
