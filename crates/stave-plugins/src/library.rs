//! Jsonnet source generation for forwarding wrappers.
//!
//! Each registered function gets a hidden method that forwards its arguments
//! to `std.native(<qualified name>)`, so templates can write
//! `modules.utils.add(2, 3)` instead of spelling out the native call.

use std::fmt::Write;

use crate::loader::ExportSummary;
use crate::local::LocalModuleRecord;

/// First line prefix of every file stave generates.
pub const GENERATED_MARKER: &str = "// Generated by stave";

const JSONNET_KEYWORDS: &[&str] = &[
    "assert", "else", "error", "false", "for", "function", "if", "import", "importbin",
    "importstr", "in", "local", "null", "self", "super", "tailstrict", "then", "true",
];

/// Whether `name` can be used bare as a Jsonnet field or parameter name.
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    let valid = match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    };
    valid && !JSONNET_KEYWORDS.contains(&name)
}

/// Single-quoted Jsonnet string literal.
pub fn quote(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('\'');
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => {
                let _ = write!(out, "\\u{:04x}", c as u32);
            }
            c => out.push(c),
        }
    }
    out.push('\'');
    out
}

fn field_name(name: &str) -> String {
    if is_identifier(name) {
        name.to_string()
    } else {
        quote(name)
    }
}

/// Parameter names usable in Jsonnet; anything else becomes `argN`.
/// `std` would shadow the standard library inside the wrapper body.
fn wrapper_params(params: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(params.len());
    for (index, param) in params.iter().enumerate() {
        if is_identifier(param) && param != "std" && !out.contains(param) {
            out.push(param.clone());
        } else {
            let mut fallback = format!("arg{index}");
            let mut suffix = 0;
            while out.contains(&fallback) || params[index + 1..].contains(&fallback) {
                suffix += 1;
                fallback = format!("arg{index}_{suffix}");
            }
            out.push(fallback);
        }
    }
    out
}

/// One hidden forwarding member, indented by `indent` spaces.
fn render_wrapper(out: &mut String, function: &ExportSummary, indent: usize) {
    let params = wrapper_params(&function.params).join(", ");
    let native = format!("std.native({})({params})", quote(&function.qualified));
    let pad = " ".repeat(indent);
    if is_identifier(&function.name) {
        let _ = writeln!(out, "{pad}{}({params}):: {native},", function.name);
    } else {
        let _ = writeln!(
            out,
            "{pad}{}:: function({params}) {native},",
            quote(&function.name)
        );
    }
}

/// The aggregator imported as `modules.libsonnet`.
pub fn render_modules_artifact(modules: &[LocalModuleRecord]) -> String {
    let mut out = format!("{GENERATED_MARKER} from local modules. Do not edit.\n{{\n");
    for module in modules {
        let _ = writeln!(out, "  {}: {{", field_name(&module.namespace));
        for function in &module.functions {
            render_wrapper(&mut out, function, 4);
        }
        out.push_str("  },\n");
    }
    out.push_str("}\n");
    out
}

/// Wrapper library for one plugin, optionally extended by its own Jsonnet
/// library file.
pub fn render_plugin_library(
    identity: &str,
    functions: &[ExportSummary],
    library_import: Option<&str>,
) -> String {
    let mut out = format!("{GENERATED_MARKER} for plugin {}. Do not edit.\n{{\n", quote(identity));
    for function in functions {
        render_wrapper(&mut out, function, 2);
    }
    out.push('}');
    if let Some(path) = library_import {
        let _ = write!(out, " + (import {})", quote(path));
    }
    out.push('\n');
    out
}
