//! Parameter name inference from function source text.
//!
//! Generated wrappers need parameter names, and most exported functions do
//! not declare them explicitly. This module scans the source of a function
//! (`function f(a, b) {}`, `(a, b = 5) => a + b`, `x => x * 2`, method
//! shorthand) and returns its parameter names.
//!
//! The scanner is aware of comments, string literals, and `()[]{}` nesting.
//! Destructured parameters have no usable name and come back as `argN`, where
//! `N` is their position. Engine-stubbed source such as
//! `function f() { [native code] }` yields nothing.

use crate::callable::NativeCallable;

/// Parameter names for `callable`, padded with `argN` up to its declared
/// arity.
pub fn infer_parameters(callable: &dyn NativeCallable) -> Vec<String> {
    let mut names = callable.source_text().map(parameter_names).unwrap_or_default();
    if let Some(arity) = callable.arity() {
        while names.len() < arity {
            names.push(positional(names.len()));
        }
    }
    names
}

/// Ordered parameter names declared by the function in `source`.
pub fn parameter_names(source: &str) -> Vec<String> {
    let cleaned = strip_comments(source);
    let text = strip_async(cleaned.trim());

    let Some(open) = find_top_level(text, '(') else {
        return bare_arrow_parameter(text).into_iter().collect();
    };
    // `x => f(x)`: the first paren belongs to the body.
    if text[..open].contains("=>") {
        return bare_arrow_parameter(text).into_iter().collect();
    }

    let Some(list) = balanced_group(&text[open..]) else {
        return Vec::new();
    };

    split_top_level(list, ',')
        .into_iter()
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .enumerate()
        .map(|(index, part)| {
            let without_default = split_top_level(part, '=')
                .into_iter()
                .next()
                .unwrap_or_default();
            let name = without_default.trim().trim_start_matches("...").trim();
            if is_identifier(name) {
                name.to_string()
            } else {
                positional(index)
            }
        })
        .collect()
}

fn positional(index: usize) -> String {
    format!("arg{index}")
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' || c == '$' => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || c == '_' || c == '$')
}

fn strip_async(text: &str) -> &str {
    match text.strip_prefix("async") {
        Some(rest) if rest.starts_with(|c: char| c.is_whitespace() || c == '(') => rest.trim_start(),
        _ => text,
    }
}

fn bare_arrow_parameter(text: &str) -> Option<String> {
    let (head, _) = text.split_once("=>")?;
    let head = head.trim();
    is_identifier(head).then(|| head.to_string())
}

/// Remove `//` and `/* */` comments, leaving string literals intact.
fn strip_comments(source: &str) -> String {
    let mut out = String::with_capacity(source.len());
    let mut chars = source.chars().peekable();
    let mut quote: Option<char> = None;

    while let Some(c) = chars.next() {
        if let Some(q) = quote {
            out.push(c);
            if c == '\\' {
                if let Some(escaped) = chars.next() {
                    out.push(escaped);
                }
            } else if c == q {
                quote = None;
            }
            continue;
        }

        match c {
            '"' | '\'' | '`' => {
                quote = Some(c);
                out.push(c);
            }
            '/' if chars.peek() == Some(&'/') => {
                for skipped in chars.by_ref() {
                    if skipped == '\n' {
                        out.push('\n');
                        break;
                    }
                }
            }
            '/' if chars.peek() == Some(&'*') => {
                chars.next();
                let mut previous = '\0';
                for skipped in chars.by_ref() {
                    if previous == '*' && skipped == '/' {
                        break;
                    }
                    previous = skipped;
                }
                out.push(' ');
            }
            _ => out.push(c),
        }
    }
    out
}

/// Walks `text` tracking string literals and bracket depth, calling `visit`
/// with each top-level character's byte offset. Stops when `visit` returns
/// `true` or depth drops below zero.
fn scan(text: &str, mut visit: impl FnMut(usize, char, usize) -> bool) {
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for (offset, c) in text.char_indices() {
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
        if visit(offset, c, depth) {
            return;
        }
        match c {
            '"' | '\'' | '`' => quote = Some(c),
            '(' | '[' | '{' => depth += 1,
            ')' | ']' | '}' => {
                if depth == 0 {
                    return;
                }
                depth -= 1;
            }
            _ => {}
        }
    }
}

fn find_top_level(text: &str, needle: char) -> Option<usize> {
    let mut found = None;
    scan(text, |offset, c, depth| {
        if depth == 0 && c == needle {
            found = Some(offset);
            return true;
        }
        false
    });
    found
}

/// Contents of the group opened by the first character of `text`.
fn balanced_group(text: &str) -> Option<&str> {
    let mut close = None;
    scan(text, |offset, c, depth| {
        if depth == 1 && matches!(c, ')' | ']' | '}') {
            close = Some(offset);
            return true;
        }
        false
    });
    close.map(|end| &text[1..end])
}

/// Split on `separator` where it appears outside strings and brackets.
/// An `=` that is part of `==` or `=>` is not a separator.
fn split_top_level(text: &str, separator: char) -> Vec<&str> {
    let bytes = text.as_bytes();
    let mut parts = Vec::new();
    let mut start = 0;
    scan(text, |offset, c, depth| {
        if depth == 0 && c == separator {
            let next = bytes.get(offset + 1).copied();
            let previous = offset.checked_sub(1).and_then(|i| bytes.get(i).copied());
            let compound = separator == '='
                && (matches!(next, Some(b'=') | Some(b'>')) || matches!(previous, Some(b'=') | Some(b'!')));
            if !compound {
                parts.push(&text[start..offset]);
                start = offset + c.len_utf8();
            }
        }
        false
    });
    parts.push(&text[start..]);
    parts
}
