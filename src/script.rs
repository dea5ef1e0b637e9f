//! Fragment compilation backed by the Rhai scripting engine.
//!
//! Variables visible to fragments:
//!
//! | role     | variables                |
//! |----------|--------------------------|
//! | begin    | `store`                  |
//! | per-line | `line`, `store`, `index` |
//! | end      | `store`, `count`         |
//!
//! A per-line fragment runs like a function body ending in `return line`,
//! so assigning to `line` without returning still updates the value.
//!
//! `line!.m(args)` in per-line code updates `line` with the method result,
//! or keeps the mutated `line` when the method returns `()` (`trim`,
//! `replace`, `pad` and other in-place string methods).
//!
//! By default `print(x)` writes straight to the process stdout and
//! `eprint(x)` to stderr, not to the writers handed to [`crate::run`].
//! Use [`RhaiCompiler::with_printers`] to send them elsewhere.

use std::io::{self, Write};
use std::rc::Rc;

use rhai::{AST, Dynamic, Engine, INT, Scope};
use tracing::warn;

use crate::fragment::{BeginStage, EndStage, LineStage, ScriptCompiler, StageFailure};
use crate::store::{Store, Value};

pub const LINE_VAR: &str = "line";
pub const STORE_VAR: &str = "store";
pub const INDEX_VAR: &str = "index";
pub const COUNT_VAR: &str = "count";

/// Compiles fragments with a shared Rhai [`Engine`].
pub struct RhaiCompiler {
    engine: Rc<Engine>,
}

impl Default for RhaiCompiler {
    fn default() -> Self {
        Self::new()
    }
}

impl RhaiCompiler {
    /// `print` goes to stdout, `eprint` to stderr.
    pub fn new() -> Self {
        Self::with_printers(write_stdout, write_stderr)
    }

    /// Route the `print` and `eprint` helpers through the given callbacks.
    ///
    /// Each callback receives the rendered text without a trailing newline.
    pub fn with_printers(
        print: impl Fn(&str) + 'static,
        eprint: impl Fn(&str) + 'static,
    ) -> Self {
        let mut engine = Engine::new();
        engine.on_print(print);
        engine.register_fn("eprint", move |value: Dynamic| eprint(&value.to_string()));
        Self {
            engine: Rc::new(engine),
        }
    }

    fn compile(&self, source: &str) -> Result<AST, String> {
        self.engine.compile(source).map_err(|e| e.to_string())
    }

    fn script(&self, ast: AST) -> Script {
        Script {
            engine: Rc::clone(&self.engine),
            ast,
        }
    }
}

impl ScriptCompiler for RhaiCompiler {
    fn compile_begin(&self, source: &str) -> Result<Box<dyn BeginStage>, String> {
        let ast = self.compile(source)?;
        Ok(Box::new(BeginScript(self.script(ast))))
    }

    fn compile_line(&self, source: &str) -> Result<Box<dyn LineStage>, String> {
        // Newline first so a trailing `//` comment cannot swallow the tail.
        let ast = self.compile(&format!("{source}\n;\n{LINE_VAR}"))?;
        Ok(Box::new(LineScript(self.script(ast))))
    }

    fn compile_end(&self, source: &str) -> Result<Box<dyn EndStage>, String> {
        let ast = self.compile(source)?;
        Ok(Box::new(EndScript(self.script(ast))))
    }
}

fn write_stdout(text: &str) {
    let mut out = io::stdout().lock();
    if let Err(e) = writeln!(out, "{text}").and_then(|_| out.flush()) {
        warn!(error = %e, "print failed");
    }
}

fn write_stderr(text: &str) {
    if let Err(e) = writeln!(io::stderr().lock(), "{text}") {
        warn!(error = %e, "eprint failed");
    }
}

struct Script {
    engine: Rc<Engine>,
    ast: AST,
}

impl Script {
    /// Evaluate with `store` bound in `scope`, then move the store back out.
    ///
    /// The store is restored even when evaluation fails.
    fn eval(&self, mut scope: Scope<'_>, store: &mut Store) -> Result<Value, StageFailure> {
        scope.push_dynamic(STORE_VAR, store.take());
        let bound = scope.len();
        let result = self
            .engine
            .eval_ast_with_scope::<Dynamic>(&mut scope, &self.ast);
        // Drop top-level `let`s so a shadowing `store` is not picked up.
        scope.rewind(bound);
        let returned = scope
            .get_mut(STORE_VAR)
            .map(|slot| std::mem::replace(slot, Dynamic::UNIT))
            .unwrap_or(Dynamic::UNIT);
        let restored = store.restore(returned);
        let value = result.map_err(|e| e.to_string())?;
        restored?;
        Ok(value)
    }
}

struct BeginScript(Script);

impl BeginStage for BeginScript {
    fn run(&self, store: &mut Store) -> Result<(), StageFailure> {
        self.0.eval(Scope::new(), store).map(|_| ())
    }
}

struct LineScript(Script);

impl LineStage for LineScript {
    fn apply(
        &self,
        current: Value,
        store: &mut Store,
        index: usize,
    ) -> Result<Value, StageFailure> {
        let mut scope = Scope::new();
        scope.push_dynamic(LINE_VAR, current);
        scope.push(INDEX_VAR, index as INT);
        self.0.eval(scope, store)
    }
}

struct EndScript(Script);

impl EndStage for EndScript {
    fn run(&self, store: &mut Store, count: usize) -> Result<(), StageFailure> {
        let mut scope = Scope::new();
        scope.push(COUNT_VAR, count as INT);
        self.0.eval(scope, store).map(|_| ())
    }
}
