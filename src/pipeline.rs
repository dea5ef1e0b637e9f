//! The compiled pipeline: begin stage, ordered per-line stages, end stage.
//!
//! Every fragment is compiled when the pipeline is built, before any input
//! is read, so a malformed fragment never processes a single line.

use tracing::debug;

use crate::config::FragmentSources;
use crate::error::PipelineError;
use crate::fragment::{BeginStage, EndStage, Fragment, LineStage, Role, ScriptCompiler};
use crate::rewrite::expand_shorthand;

/// An owned, fully compiled set of stages for one run.
#[derive(Debug, Default)]
pub struct Pipeline {
    pub begin: Option<Fragment<dyn BeginStage>>,
    pub lines: Vec<Fragment<dyn LineStage>>,
    pub end: Option<Fragment<dyn EndStage>>,
}

impl Pipeline {
    /// Empty pipeline: no begin or end stage, identity per line.
    pub fn new() -> Self {
        Self::default()
    }

    /// Compile all fragment sources.
    ///
    /// Blank fragments are skipped and do not take an ordinal. Per-line text
    /// has the `line!.` shorthand expanded before compilation.
    pub fn compile(
        compiler: &dyn ScriptCompiler,
        sources: &FragmentSources,
    ) -> Result<Self, PipelineError> {
        let mut pipeline = Pipeline::new();

        if let Some(text) = non_blank(sources.begin.as_deref()) {
            let stage = compiler
                .compile_begin(text)
                .map_err(|message| compile_error(Role::Begin, None, text, message))?;
            pipeline = pipeline.with_begin(text, stage);
        }

        for text in sources.code.iter().filter_map(|t| non_blank(Some(t.as_str()))) {
            let text = expand_shorthand(text);
            let ordinal = pipeline.lines.len() + 1;
            let stage = compiler
                .compile_line(&text)
                .map_err(|message| compile_error(Role::Line, Some(ordinal), &text, message))?;
            pipeline = pipeline.with_line(text, stage);
        }

        if let Some(text) = non_blank(sources.end.as_deref()) {
            let stage = compiler
                .compile_end(text)
                .map_err(|message| compile_error(Role::End, None, text, message))?;
            pipeline = pipeline.with_end(text, stage);
        }

        debug!(
            begin = pipeline.begin.is_some(),
            lines = pipeline.lines.len(),
            end = pipeline.end.is_some(),
            "pipeline compiled"
        );
        Ok(pipeline)
    }

    pub fn with_begin(mut self, text: impl Into<String>, stage: Box<dyn BeginStage>) -> Self {
        self.begin = Some(Fragment {
            role: Role::Begin,
            ordinal: None,
            text: text.into(),
            stage,
        });
        self
    }

    /// Append a per-line stage; its ordinal is its 1-based position.
    pub fn with_line(mut self, text: impl Into<String>, stage: Box<dyn LineStage>) -> Self {
        let ordinal = self.lines.len() + 1;
        self.lines.push(Fragment {
            role: Role::Line,
            ordinal: Some(ordinal),
            text: text.into(),
            stage,
        });
        self
    }

    pub fn with_end(mut self, text: impl Into<String>, stage: Box<dyn EndStage>) -> Self {
        self.end = Some(Fragment {
            role: Role::End,
            ordinal: None,
            text: text.into(),
            stage,
        });
        self
    }
}

fn non_blank(text: Option<&str>) -> Option<&str> {
    text.map(str::trim).filter(|t| !t.is_empty())
}

fn compile_error(
    role: Role,
    ordinal: Option<usize>,
    text: &str,
    message: String,
) -> PipelineError {
    PipelineError::FragmentCompile {
        role,
        ordinal,
        text: text.to_string(),
        message: message.trim().to_string(),
    }
}
