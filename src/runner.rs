//! Lifecycle runner: begin stage, every input line, end stage.
//!
//! Input is read one line at a time; a line is fully processed and its
//! output flushed before the next line is read. Any stage failure stops
//! the run at once, so later lines are never read and the end stage does
//! not run.

use std::io::{BufRead, Write};

use tracing::{debug, info};

use crate::config::RunOptions;
use crate::debug_trace::Tracer;
use crate::error::PipelineError;
use crate::executor::process_line;
use crate::pipeline::Pipeline;
use crate::store::Store;

/// Counters and final store of a completed run.
#[derive(Debug)]
pub struct RunSummary {
    /// Lines that reached the executor; also the count given to the end stage.
    pub processed: usize,
    pub emitted: usize,
    pub suppressed: usize,
    pub store: Store,
}

/// Run `pipeline` over `input`, writing records to `output` and traces to
/// `diagnostics`.
pub fn run<R, W, D>(
    pipeline: &Pipeline,
    options: RunOptions,
    input: R,
    output: &mut W,
    diagnostics: &mut D,
) -> Result<RunSummary, PipelineError>
where
    R: BufRead,
    W: Write,
    D: Write,
{
    let options = options.normalized();
    let mut store = Store::new();
    let mut tracer = if options.debug {
        Some(Tracer::new(diagnostics, options.debug_store))
    } else {
        None
    };

    if let Some(begin) = &pipeline.begin {
        debug!("running begin stage");
        if let Some(t) = tracer.as_mut() {
            t.begin_start()?;
        }
        begin
            .stage
            .run(&mut store)
            .map_err(|message| PipelineError::BeginFailed {
                message: message.trim().to_string(),
            })?;
        if let Some(t) = tracer.as_mut() {
            t.begin_end(&store)?;
        }
    }

    let mut processed = 0;
    let mut emitted = 0;
    let mut suppressed = 0;
    for (index, line) in input.lines().enumerate() {
        let raw = line?;
        let outcome = process_line(pipeline, &raw, index, &mut store, tracer.as_mut())?;
        processed += 1;
        match outcome.render() {
            Some(text) => {
                emitted += 1;
                if !options.quiet {
                    writeln!(output, "{text}")?;
                    output.flush()?;
                }
            }
            None => suppressed += 1,
        }
    }
    output.flush()?;

    if let Some(end) = &pipeline.end {
        debug!(processed, "running end stage");
        if let Some(t) = tracer.as_mut() {
            t.end_start()?;
        }
        end.stage
            .run(&mut store, processed)
            .map_err(|message| PipelineError::EndFailed {
                message: message.trim().to_string(),
            })?;
        if let Some(t) = tracer.as_mut() {
            t.end_end(&store)?;
        }
    }

    info!(processed, emitted, suppressed, "run complete");
    Ok(RunSummary {
        processed,
        emitted,
        suppressed,
        store,
    })
}
