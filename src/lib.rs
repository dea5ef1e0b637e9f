//! # linepipe-rs
//!
//! A streaming line transformer driven by user-supplied script fragments.
//!
//! Lines are read one at a time and pushed through an ordered chain of
//! per-line fragments, with optional begin and end fragments around the
//! whole stream. All fragments share one mutable store for the duration of
//! a run.
//!
//! ## Overview
//!
//! - **Fragments** are compiled once, up front, by a [`ScriptCompiler`]
//!   (Rhai by default, see [`RhaiCompiler`])
//! - **Per-line stages** return a new value, a suppression signal, or
//!   anything else to leave the line as it is
//! - **The store** carries state between stages, lines and the end stage
//! - **The tracer** reports every stage call on the diagnostics stream
//!
//! ## Example
//!
//! ```
//! use linepipe_rs::{FragmentSources, Pipeline, RhaiCompiler, RunOptions, run};
//! use std::io::Cursor;
//!
//! let sources = FragmentSources::new()
//!     .with_code("return parse_int(line) * 2")
//!     .with_end("store.lines = count;");
//! let pipeline = Pipeline::compile(&RhaiCompiler::new(), &sources).unwrap();
//!
//! let mut out = Vec::new();
//! let summary = run(
//!     &pipeline,
//!     RunOptions::default(),
//!     Cursor::new("1\n2\n3\n"),
//!     &mut out,
//!     &mut std::io::sink(),
//! )
//! .unwrap();
//!
//! assert_eq!(String::from_utf8(out).unwrap(), "2\n4\n6\n");
//! assert_eq!(summary.processed, 3);
//! ```

pub mod config;
pub mod debug_trace;
pub mod error;
pub mod executor;
pub mod fragment;
pub mod pipeline;
pub mod rewrite;
pub mod runner;
pub mod script;
pub mod store;

pub use config::{FragmentSources, RunOptions};
pub use debug_trace::Tracer;
pub use error::{EXIT_RUNTIME_FAILURE, EXIT_SUCCESS, EXIT_USAGE, PipelineError};
pub use executor::{LineOutcome, StepOutcome, classify, process_line, render_value};
pub use fragment::{BeginStage, EndStage, Fragment, LineStage, Role, ScriptCompiler};
pub use pipeline::Pipeline;
pub use rewrite::expand_shorthand;
pub use runner::{RunSummary, run};
pub use script::RhaiCompiler;
pub use store::{Store, Value};
