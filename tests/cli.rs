//! Black-box tests for the `linepipe` binary.

use std::io::Write;
use std::process::{Command, Output, Stdio};

fn linepipe(args: &[&str], input: &str) -> Output {
    let mut child = Command::new(env!("CARGO_BIN_EXE_linepipe"))
        .args(args)
        .env_remove("RUST_LOG")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("failed to start linepipe");
    // A failing run may exit before reading all input.
    let _ = child
        .stdin
        .take()
        .expect("stdin is piped")
        .write_all(input.as_bytes());
    child.wait_with_output().expect("failed to wait for linepipe")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[test]
fn test_passthrough_without_code() {
    let out = linepipe(&[], "one\ntwo\n");
    assert_eq!(out.status.code(), Some(0));
    assert_eq!(stdout(&out), "one\ntwo\n");
}

#[test]
fn test_doubles_each_line() {
    let out = linepipe(&["-c", "return parse_int(line) * 2"], "1\n2\n3\n");
    assert_eq!(out.status.code(), Some(0));
    assert_eq!(stdout(&out), "2\n4\n6\n");
}

#[test]
fn test_suppresses_line() {
    let out = linepipe(
        &["-c", r#"if line == "b" { return (); } return line"#],
        "a\nb\n",
    );
    assert_eq!(stdout(&out), "a\n");
}

#[test]
fn test_shorthand_and_chained_code() {
    let out = linepipe(
        &["-c", "line!.to_upper()", "--code", "return `${index}:${line}`"],
        "x\ny\n",
    );
    assert_eq!(stdout(&out), "0:X\n1:Y\n");
}

#[test]
fn test_shorthand_trim_keeps_lines() {
    let out = linepipe(&["-c", "line!.trim()"], "  padded  \nplain\n");
    assert_eq!(out.status.code(), Some(0));
    assert_eq!(stdout(&out), "padded\nplain\n");
}

#[test]
fn test_begin_and_end_with_print() {
    let out = linepipe(
        &[
            "-b",
            "store.total = 0;",
            "-c",
            "store.total += parse_int(line);",
            "-e",
            "print(`${count} lines, total ${store.total}`);",
            "-q",
        ],
        "4\n5\n",
    );
    assert_eq!(out.status.code(), Some(0));
    assert_eq!(stdout(&out), "2 lines, total 9\n");
}

#[test]
fn test_eprint_goes_to_stderr() {
    let out = linepipe(&["-c", "eprint(`saw ${line}`);"], "z\n");
    assert_eq!(stdout(&out), "z\n");
    assert!(stderr(&out).contains("saw z"));
}

#[test]
fn test_compile_error_is_usage_error() {
    let out = linepipe(&["-c", "return line", "-c", "line = ;"], "a\n");
    assert_eq!(out.status.code(), Some(2));
    assert!(stdout(&out).is_empty());
    let err = stderr(&out);
    assert!(err.contains("Line processing code #2 cannot be compiled (line = ;)"));
    assert!(err.contains("Usage:"));
}

#[test]
fn test_runtime_error_stops_processing() {
    let out = linepipe(
        &[
            "-c",
            r#"if line == "3" { throw "cannot handle 3"; }"#,
            "-e",
            r#"print("end ran");"#,
        ],
        "1\n2\n3\n4\n5\n",
    );
    assert_eq!(out.status.code(), Some(1));
    assert_eq!(stdout(&out), "1\n2\n");
    let err = stderr(&out);
    assert!(err.contains("failed when processing line #3"));
    assert!(err.contains("cannot handle 3"));
}

#[test]
fn test_begin_error_reads_no_lines() {
    let out = linepipe(&["-b", r#"throw "broken";"#], "a\n");
    assert_eq!(out.status.code(), Some(1));
    assert!(stdout(&out).is_empty());
    assert!(stderr(&out).contains("Begin code failed"));
}

#[test]
fn test_debug_traces_to_stderr_only() {
    let out = linepipe(&["-d", "--debug-store", "-c", "store.n = 1;"], "a\n");
    assert_eq!(out.status.code(), Some(0));
    assert!(stdout(&out).is_empty());
    let err = stderr(&out);
    assert!(err.contains("[line #1]"));
    assert!(err.contains("[func #1]"));
    assert!(err.contains("\"n\": 1"));
}

#[test]
fn test_begin_twice_is_rejected() {
    let out = linepipe(&["-b", "1", "-b", "2"], "");
    assert_eq!(out.status.code(), Some(2));
}
