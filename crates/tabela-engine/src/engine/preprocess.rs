//! Formula preprocessing.
//!
//! Before formulas can be evaluated by Rhai, spreadsheet syntax must be
//! rewritten into script syntax. This module handles:
//!
//! - **Range functions**: `SUM(A1:B5)` → `SUM_RANGE(0, 0, 1, 4)` (col/row)
//! - **Cell references**: `A1` → `CELL(0, 0)`
//! - **Operators**: `^` → `**`, `<>` → `!=`, `=` → `==`
//! - **Literals**: integer literals become floats so `7/2` is `3.5`;
//!   `TRUE`/`FALSE` become `true`/`false`
//!
//! Text inside double-quoted string literals is never rewritten.

use regex::{Captures, Regex};
use std::sync::OnceLock;

use super::cell_ref::CellRef;

/// Regex matching a single A1-style token (optional `$` markers).
///
/// Captures:
/// - group 1: column letters
/// - group 2: row digits
pub fn cell_token_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\$?\b([A-Za-z]{1,3})\$?([0-9]+)\b").expect("cell token regex must compile")
    })
}

fn number_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\b[0-9]+(\.[0-9]+)?([eE][+-]?[0-9]+)?\b").expect("number regex must compile")
    })
}

fn bool_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b(TRUE|FALSE)\b").expect("bool regex must compile"))
}

/// Apply `f` to every segment of `script` that lies outside double-quoted
/// string literals; string literals (quotes included) are copied verbatim.
pub fn map_outside_strings<F>(script: &str, mut f: F) -> String
where
    F: FnMut(&str) -> String,
{
    let bytes = script.as_bytes();
    let mut out = String::with_capacity(script.len());
    let mut seg_start = 0;
    let mut in_string = false;
    let mut backslashes = 0usize;
    let mut i = 0usize;

    while i < bytes.len() {
        let b = bytes[i];
        if in_string {
            if b == b'\\' {
                backslashes += 1;
                i += 1;
                continue;
            }
            if b == b'"' && backslashes.is_multiple_of(2) {
                out.push_str(&script[seg_start..=i]);
                in_string = false;
                seg_start = i + 1;
            }
            backslashes = 0;
            i += 1;
            continue;
        }

        if b == b'"' {
            out.push_str(&f(&script[seg_start..i]));
            in_string = true;
            seg_start = i;
            backslashes = 0;
        }
        i += 1;
    }

    if seg_start < script.len() {
        if in_string {
            out.push_str(&script[seg_start..]);
        } else {
            out.push_str(&f(&script[seg_start..]));
        }
    }

    out
}

/// Whether the character right after a regex match is an opening parenthesis,
/// which marks the token as a function name (e.g. `LOG10(`), not a reference.
pub fn followed_by_call(seg: &str, end: usize) -> bool {
    seg[end..].trim_start().starts_with('(')
}

/// Rewrite a spreadsheet formula (without the leading `=`) into a Rhai script.
pub fn preprocess_script(formula: &str) -> String {
    map_outside_strings(formula, preprocess_segment)
}

fn preprocess_segment(seg: &str) -> String {
    let seg = rewrite_operators(seg);

    let seg = number_re()
        .replace_all(&seg, |caps: &Captures| {
            let token = &caps[0];
            if caps.get(1).is_none() && caps.get(2).is_none() {
                format!("{}.0", token)
            } else {
                token.to_string()
            }
        })
        .to_string();

    let seg = bool_re()
        .replace_all(&seg, |caps: &Captures| caps[1].to_ascii_lowercase())
        .to_string();

    let seg = crate::builtins::range_fn_re()
        .replace_all(&seg, |caps: &Captures| {
            let Some(rhai_name) = crate::builtins::range_rhai_name(&caps[1]) else {
                return caps[0].to_string();
            };
            match (CellRef::from_str(&caps[2]), CellRef::from_str(&caps[3])) {
                (Some(start), Some(end)) => format!(
                    "{}({}, {}, {}, {})",
                    rhai_name, start.col, start.row, end.col, end.row
                ),
                _ => caps[0].to_string(),
            }
        })
        .to_string();

    let mut out = String::with_capacity(seg.len());
    let mut last = 0;
    for caps in cell_token_re().captures_iter(&seg) {
        let Some(whole) = caps.get(0) else {
            continue;
        };
        out.push_str(&seg[last..whole.start()]);
        let token = format!("{}{}", &caps[1], &caps[2]);
        match CellRef::from_str(&token) {
            Some(cr) if !followed_by_call(&seg, whole.end()) => {
                out.push_str(&format!("CELL({}, {})", cr.col, cr.row));
            }
            _ => out.push_str(whole.as_str()),
        }
        last = whole.end();
    }
    out.push_str(&seg[last..]);
    out
}

/// Translate spreadsheet comparison/power operators into Rhai operators.
fn rewrite_operators(seg: &str) -> String {
    let chars: Vec<char> = seg.chars().collect();
    let mut out = String::with_capacity(seg.len() + 4);
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        let next = chars.get(i + 1).copied();
        let prev = if i > 0 { Some(chars[i - 1]) } else { None };
        match c {
            '^' => out.push_str("**"),
            '<' if next == Some('>') => {
                out.push_str("!=");
                i += 1;
            }
            '=' if !matches!(prev, Some('<' | '>' | '!' | '='))
                && next != Some('=') =>
            {
                out.push_str("==");
            }
            _ => out.push(c),
        }
        i += 1;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preprocess_simple_reference() {
        assert_eq!(preprocess_script("A1"), "CELL(0, 0)");
        assert_eq!(preprocess_script("B1+A2"), "CELL(1, 0)+CELL(0, 1)");
    }

    #[test]
    fn test_preprocess_integer_literals_become_floats() {
        assert_eq!(preprocess_script("7/2"), "7.0/2.0");
        assert_eq!(preprocess_script("1.5*A1"), "1.5*CELL(0, 0)");
    }

    #[test]
    fn test_preprocess_range_function() {
        assert_eq!(
            preprocess_script("SUM(A1:B3) + 1"),
            "SUM_RANGE(0, 0, 1, 2) + 1.0"
        );
    }

    #[test]
    fn test_preprocess_leaves_strings_untouched() {
        assert_eq!(
            preprocess_script(r#"IF(A1 > 2, "A1 big", "small")"#),
            r#"IF(CELL(0, 0) > 2.0, "A1 big", "small")"#
        );
    }

    #[test]
    fn test_preprocess_operators() {
        assert_eq!(preprocess_script("A1^2"), "CELL(0, 0)**2.0");
        assert_eq!(preprocess_script("A1<>B1"), "CELL(0, 0)!=CELL(1, 0)");
        assert_eq!(preprocess_script("A1=B1"), "CELL(0, 0)==CELL(1, 0)");
        assert_eq!(preprocess_script("A1>=B1"), "CELL(0, 0)>=CELL(1, 0)");
    }

    #[test]
    fn test_preprocess_function_names_with_digits_are_not_refs() {
        assert_eq!(preprocess_script("LOG10(A1)"), "LOG10(CELL(0, 0))");
    }

    #[test]
    fn test_map_outside_strings_handles_escaped_quotes() {
        let out = map_outside_strings(r#"a "x\"y" b"#, |s| s.to_uppercase());
        assert_eq!(out, r#"A "x\"y" B"#);
    }
}
