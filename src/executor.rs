//! Per-line execution protocol.
//!
//! Each line starts with its raw text as the current value and is pushed
//! through every per-line stage in declaration order before the next line
//! is read. A stage's result is classified:
//!
//! - string, char or number: becomes the new current value
//! - unit or `false`: the line is suppressed and later stages are skipped
//! - anything else (`true`, maps, arrays): the current value is kept
//!
//! A failing stage aborts the run; there is no skip-and-continue.

use crate::debug_trace::Tracer;
use crate::error::PipelineError;
use crate::pipeline::Pipeline;
use crate::store::{Store, Value};

/// Classification of a single stage result.
#[derive(Debug, Clone)]
pub enum StepOutcome {
    /// The result replaces the current value.
    Continue(Value),
    /// Drop the line; remaining stages do not run.
    Suppressed,
    /// Keep the current value and move on.
    Unchanged,
}

/// Final decision for one input line.
#[derive(Debug, Clone)]
pub enum LineOutcome {
    Emit(Value),
    Suppress,
}

impl LineOutcome {
    pub fn is_emit(&self) -> bool {
        matches!(self, LineOutcome::Emit(_))
    }

    /// Output text for an emitted line, without the newline.
    pub fn render(&self) -> Option<String> {
        match self {
            LineOutcome::Emit(value) => Some(render_value(value)),
            LineOutcome::Suppress => None,
        }
    }
}

/// Output text for a value. Integral floats print without a fraction
/// (`2.0` is written as `2`); non-finite floats print as `NaN`/`Infinity`.
pub fn render_value(value: &Value) -> String {
    match value.as_float() {
        Ok(f) if f.is_nan() => "NaN".to_string(),
        Ok(f) if f.is_infinite() => if f > 0.0 { "Infinity" } else { "-Infinity" }.to_string(),
        Ok(f) if f.fract() == 0.0 && f.abs() < 1e21 => format!("{:.0}", f + 0.0),
        _ => value.to_string(),
    }
}

pub fn classify(result: Value) -> StepOutcome {
    if result.is_unit() || result.as_bool() == Ok(false) {
        StepOutcome::Suppressed
    } else if result.is_string() || result.is_char() || result.is_int() || result.is_float() {
        StepOutcome::Continue(result)
    } else {
        StepOutcome::Unchanged
    }
}

/// JSON rendering used in diagnostics; falls back to `Display`.
pub fn to_json(value: &Value) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| value.to_string())
}

/// Push one line through every per-line stage.
///
/// `index` is the 0-based line index handed to the stages. With no
/// per-line stages the raw text is emitted unchanged.
pub fn process_line(
    pipeline: &Pipeline,
    raw: &str,
    index: usize,
    store: &mut Store,
    mut tracer: Option<&mut Tracer<'_>>,
) -> Result<LineOutcome, PipelineError> {
    let line_number = index + 1;
    let input = Value::from(raw.to_string());
    if let Some(t) = tracer.as_deref_mut() {
        t.line_start(line_number, &input)?;
    }

    let mut current = input.clone();
    let mut outcome = None;
    for fragment in &pipeline.lines {
        if let Some(t) = tracer.as_deref_mut() {
            t.stage_start(fragment, &current, store)?;
        }

        let result = fragment
            .stage
            .apply(current.clone(), store, index)
            .map_err(|message| PipelineError::LineFailed {
                ordinal: fragment.ordinal.unwrap_or_default(),
                text: fragment.text.clone(),
                line_number,
                current: to_json(&current),
                input: to_json(&input),
                message: message.trim().to_string(),
            })?;

        let step = classify(result);
        if let StepOutcome::Continue(value) = &step {
            current = value.clone();
        }
        if let Some(t) = tracer.as_deref_mut() {
            t.stage_end(fragment, &step, &current, store)?;
        }
        if let StepOutcome::Suppressed = step {
            outcome = Some(LineOutcome::Suppress);
            break;
        }
    }

    let outcome = outcome.unwrap_or(LineOutcome::Emit(current));
    if let Some(t) = tracer.as_deref_mut() {
        t.line_end(line_number, &outcome)?;
    }
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fragment::StageFailure;
    use rhai::{Array, Map};
    use std::cell::Cell;
    use std::rc::Rc;

    fn stage<F>(f: F) -> Box<dyn crate::fragment::LineStage>
    where
        F: Fn(Value, &mut Store, usize) -> Result<Value, StageFailure> + 'static,
    {
        Box::new(f)
    }

    fn run_one(pipeline: &Pipeline, raw: &str) -> LineOutcome {
        let mut store = Store::new();
        process_line(pipeline, raw, 0, &mut store, None).unwrap()
    }

    #[test]
    fn test_classify_values() {
        assert!(matches!(classify(Value::from("x")), StepOutcome::Continue(_)));
        assert!(matches!(classify(Value::from(3_i64)), StepOutcome::Continue(_)));
        assert!(matches!(classify(Value::from(1.5_f64)), StepOutcome::Continue(_)));
        assert!(matches!(classify(Value::from('c')), StepOutcome::Continue(_)));
        assert!(matches!(classify(Value::UNIT), StepOutcome::Suppressed));
        assert!(matches!(classify(Value::FALSE), StepOutcome::Suppressed));
        assert!(matches!(classify(Value::TRUE), StepOutcome::Unchanged));
        assert!(matches!(classify(Value::from_map(Map::new())), StepOutcome::Unchanged));
        assert!(matches!(classify(Value::from_array(Array::new())), StepOutcome::Unchanged));
    }

    #[test]
    fn test_render_integral_floats_without_fraction() {
        assert_eq!(render_value(&Value::from(2.0_f64)), "2");
        assert_eq!(render_value(&Value::from(-0.0_f64)), "0");
        assert_eq!(render_value(&Value::from(2.5_f64)), "2.5");
        assert_eq!(render_value(&Value::from(f64::NAN)), "NaN");
        assert_eq!(render_value(&Value::from(f64::NEG_INFINITY)), "-Infinity");
        assert_eq!(render_value(&Value::from(7_i64)), "7");
        assert_eq!(render_value(&Value::from("2.0")), "2.0");

        let pipeline =
            Pipeline::new().with_line("half", stage(|_, _, _| Ok(Value::from(4.0_f64 / 2.0))));
        assert_eq!(run_one(&pipeline, "x").render().as_deref(), Some("2"));
    }

    #[test]
    fn test_identity_without_stages() {
        let outcome = run_one(&Pipeline::new(), "unchanged");
        assert_eq!(outcome.render().as_deref(), Some("unchanged"));
    }

    #[test]
    fn test_stages_run_in_order() {
        let pipeline = Pipeline::new()
            .with_line("a", stage(|v, _, _| Ok(Value::from(format!("{v}-a")))))
            .with_line("b", stage(|v, _, _| Ok(Value::from(format!("{v}-b")))));
        let outcome = run_one(&pipeline, "x");
        assert_eq!(outcome.render().as_deref(), Some("x-a-b"));
    }

    #[test]
    fn test_suppression_short_circuits() {
        let later_calls = Rc::new(Cell::new(0));
        let counter = Rc::clone(&later_calls);
        let pipeline = Pipeline::new()
            .with_line("drop", stage(|_, _, _| Ok(Value::UNIT)))
            .with_line(
                "after",
                stage(move |v, _, _| {
                    counter.set(counter.get() + 1);
                    Ok(v)
                }),
            );
        let outcome = run_one(&pipeline, "x");
        assert!(!outcome.is_emit());
        assert_eq!(later_calls.get(), 0);
    }

    #[test]
    fn test_true_keeps_current_value() {
        let pipeline = Pipeline::new()
            .with_line("upper", stage(|v, _, _| Ok(Value::from(v.to_string().to_uppercase()))))
            .with_line("keep", stage(|_, _, _| Ok(Value::TRUE)));
        let outcome = run_one(&pipeline, "abc");
        assert_eq!(outcome.render().as_deref(), Some("ABC"));
    }

    #[test]
    fn test_number_type_preserved_between_stages() {
        let pipeline = Pipeline::new()
            .with_line("num", stage(|_, _, _| Ok(Value::from(21_i64))))
            .with_line(
                "check",
                stage(|v, _, _| {
                    let n = v.as_int().map_err(|t| format!("expected int, got {t}"))?;
                    Ok(Value::from(n * 2))
                }),
            );
        match run_one(&pipeline, "ignored") {
            LineOutcome::Emit(v) => assert_eq!(v.as_int().unwrap(), 42),
            LineOutcome::Suppress => panic!("line was suppressed"),
        }
    }

    #[test]
    fn test_failure_reports_context() {
        let pipeline = Pipeline::new()
            .with_line("first", stage(|_, _, _| Ok(Value::from("changed"))))
            .with_line("boom", stage(|_, _, _| Err("kaput".to_string())));
        let mut store = Store::new();
        let err = process_line(&pipeline, "orig", 2, &mut store, None).unwrap_err();
        match err {
            PipelineError::LineFailed {
                ordinal,
                text,
                line_number,
                current,
                input,
                message,
            } => {
                assert_eq!(ordinal, 2);
                assert_eq!(text, "boom");
                assert_eq!(line_number, 3);
                assert_eq!(current, "\"changed\"");
                assert_eq!(input, "\"orig\"");
                assert_eq!(message, "kaput");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_stages_receive_index_and_store() {
        let pipeline = Pipeline::new().with_line(
            "count",
            stage(|v, store: &mut Store, index| {
                store.set("last_index", index as i64);
                Ok(v)
            }),
        );
        let mut store = Store::new();
        process_line(&pipeline, "a", 4, &mut store, None).unwrap();
        assert_eq!(store.get("last_index").unwrap().as_int().unwrap(), 4);
    }
}
