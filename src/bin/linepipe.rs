//! CLI tool to transform stdin line by line with script fragments.
//!
//! Usage:
//!   linepipe -c 'return line.to_upper()' < input.txt
//!   linepipe -b 'store.n = 0;' -c 'store.n += 1;' -e 'print(store.n);' -q < input.txt

use clap::{CommandFactory, Parser};
use linepipe_rs::{EXIT_SUCCESS, FragmentSources, Pipeline, RhaiCompiler, RunOptions, run};
use std::io;
use std::process;
use tracing_subscriber::EnvFilter;

/// Line processing utility using Rhai script fragments.
///
/// In per-line code, `line` is the current line, `store` the shared store
/// and `index` the 0-based line index. Returning `()` or `false` drops the
/// line; returning a string or number replaces it; anything else keeps it.
/// `line!.f(..)` updates the line with the method result, or keeps the
/// mutated line when the method works in place (e.g. `line!.trim()`).
#[derive(Parser)]
#[command(name = "linepipe", version)]
struct Cli {
    /// Code to execute for each line (repeatable, runs in order)
    #[arg(short, long = "code", value_name = "CODE")]
    code: Vec<String>,

    /// Code to execute before processing lines (`store` is available)
    #[arg(short, long, value_name = "CODE")]
    begin: Option<String>,

    /// Code to execute after all lines (`store` and `count` are available)
    #[arg(short, long, value_name = "CODE")]
    end: Option<String>,

    /// Never print input lines
    #[arg(short, long)]
    quiet: bool,

    /// Print stage-by-stage trace on stderr (implies --quiet)
    #[arg(short, long)]
    debug: bool,

    /// Print the store whenever a line stage changes it (requires --debug)
    #[arg(long)]
    debug_store: bool,
}

impl Cli {
    fn sources(&self) -> FragmentSources {
        FragmentSources {
            begin: self.begin.clone(),
            code: self.code.clone(),
            end: self.end.clone(),
        }
    }

    fn options(&self) -> RunOptions {
        RunOptions {
            quiet: self.quiet,
            debug: self.debug,
            debug_store: self.debug_store,
        }
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    let pipeline = match Pipeline::compile(&RhaiCompiler::new(), &cli.sources()) {
        Ok(pipeline) => pipeline,
        Err(e) => {
            eprintln!("{e}");
            eprintln!("{}", Cli::command().render_usage());
            process::exit(e.exit_code());
        }
    };

    let stdin = io::stdin();
    let result = run(
        &pipeline,
        cli.options(),
        stdin.lock(),
        &mut io::stdout().lock(),
        &mut io::stderr(),
    );
    match result {
        Ok(_) => process::exit(EXIT_SUCCESS),
        Err(e) => {
            eprintln!("{e}");
            process::exit(e.exit_code());
        }
    }
}
