//! In-place update shorthand for per-line fragments.
//!
//! `line!.m(args)` is expanded to `line = (line.m(args) ?? line)` before the
//! fragment reaches the compiler. Methods that return a new value (such as
//! `to_upper`) replace `line` with it. Methods that mutate in place and
//! return `()` (such as `trim` or `replace`) leave the mutated `line`.
//! When no balanced call follows, the prefix becomes `line = line.`.
//!
//! This is a plain text substitution; the compiler never sees the `!` form.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::script::LINE_VAR;

static LINE_BANG: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"\b{}!\.", regex::escape(LINE_VAR))).expect("shorthand pattern is valid")
});

/// Expand every `line!.` occurrence.
pub fn expand_shorthand(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(m) = LINE_BANG.find(rest) {
        out.push_str(&rest[..m.start()]);
        let after = &rest[m.end()..];
        match call_len(after) {
            Some(len) => {
                let call = &after[..len];
                out.push_str(&format!("{LINE_VAR} = ({LINE_VAR}.{call} ?? {LINE_VAR})"));
                rest = &after[len..];
            }
            None => {
                out.push_str(&format!("{LINE_VAR} = {LINE_VAR}."));
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

/// Byte length of a leading `name(args)` call, skipping parentheses inside
/// string and char literals. `None` if the call is missing or unbalanced.
fn call_len(text: &str) -> Option<usize> {
    let name_len = text.find(|c: char| !(c.is_alphanumeric() || c == '_'))?;
    if name_len == 0 || !text[name_len..].starts_with('(') {
        return None;
    }

    let mut depth = 0usize;
    let mut quote = None;
    let mut escaped = false;
    for (i, c) in text[name_len..].char_indices() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == q {
                quote = None;
            }
            continue;
        }
        match c {
            '"' | '\'' | '`' => quote = Some(c),
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    return Some(name_len + i + 1);
                }
            }
            _ => {}
        }
    }
    None
}
