//! AST Sandbox Transform (C7): hardens generated (or hand-written) TSL
//! source before it reaches the [Compartment Host](crate::runtime::compartment).
//!
//! TSL scripts are treated as host-evaluated text throughout this crate
//! (the JS/TS runtime that actually executes them is the out-of-scope host
//! engine), so this transform works structurally over the source string
//! rather than over a full ECMAScript AST: loop/`do` bodies are located and
//! wrapped via brace-matching that is aware of string/template/comment
//! spans, not by parsing expressions.

use crate::codegen::Diagnostic;
use crate::config::RuntimeConfig;
use regex::Regex;
use std::sync::OnceLock;

/// The result of a [`transform`] call.
#[derive(Debug, Clone)]
pub struct SandboxResult {
    pub code: String,
    pub success: bool,
    pub diagnostics: Vec<Diagnostic>,
}

const BLOCKED_GLOBALS: &[&str] = &[
    "window",
    "document",
    "fetch",
    "eval",
    "Function",
    "XMLHttpRequest",
    "WebSocket",
    "Worker",
    "self",
    "globalThis",
    "Proxy",
    "Reflect",
];

/// Transforms `source` TSL text, applying loop/call-depth guards, stripping
/// module syntax, and warning on references to globals the
/// [Compartment](crate::runtime::compartment) denies at evaluation time.
pub fn transform(source: &str, config: &RuntimeConfig) -> SandboxResult {
    let mut diagnostics = Vec::new();

    if !braces_balanced(source) {
        return SandboxResult {
            code: String::new(),
            success: false,
            diagnostics: vec![Diagnostic::error("unbalanced braces/parens in TSL source")],
        };
    }

    let mut code = source.to_string();

    strip_imports(&mut code, &mut diagnostics);
    strip_exports(&mut code, &mut diagnostics);
    inject_loop_counters(&mut code);
    scan_blocked_globals(&code, &mut diagnostics);

    let preamble = format!(
        "let __loopCount = 0;\nconst __MAX_ITERATIONS = {};\nfunction __checkLoop() {{\n  __loopCount++;\n  if (__loopCount > __MAX_ITERATIONS) {{\n    throw new Error(\"maximum iterations exceeded\");\n  }}\n}}\nconst __MAX_CALL_DEPTH = {};\nfunction __checkCall(depth) {{\n  if (depth > __MAX_CALL_DEPTH) {{\n    throw new Error(\"maximum call depth exceeded\");\n  }}\n}}\n",
        config.max_iterations, config.max_call_depth
    );

    SandboxResult {
        code: preamble + &code,
        success: true,
        diagnostics,
    }
}

fn braces_balanced(source: &str) -> bool {
    let mask = build_mask(source);
    let bytes = source.as_bytes();
    let mut depth = 0i32;
    for (i, &b) in bytes.iter().enumerate() {
        if !mask[i] {
            continue;
        }
        match b {
            b'{' | b'(' | b'[' => depth += 1,
            b'}' | b')' | b']' => depth -= 1,
            _ => {}
        }
        if depth < 0 {
            return false;
        }
    }
    depth == 0
}

/// Marks every byte index that is plain code: `false` inside string,
/// template, or comment spans.
fn build_mask(source: &str) -> Vec<bool> {
    let bytes = source.as_bytes();
    let mut mask = vec![true; bytes.len()];
    let mut i = 0;
    #[derive(PartialEq)]
    enum State {
        Code,
        SingleQuote,
        DoubleQuote,
        Template,
        LineComment,
        BlockComment,
    }
    let mut state = State::Code;
    while i < bytes.len() {
        let c = bytes[i];
        match state {
            State::Code => {
                mask[i] = true;
                if c == b'\'' {
                    state = State::SingleQuote;
                } else if c == b'"' {
                    state = State::DoubleQuote;
                } else if c == b'`' {
                    state = State::Template;
                } else if c == b'/' && bytes.get(i + 1) == Some(&b'/') {
                    state = State::LineComment;
                } else if c == b'/' && bytes.get(i + 1) == Some(&b'*') {
                    state = State::BlockComment;
                }
            }
            State::SingleQuote => {
                mask[i] = false;
                if c == b'\\' {
                    i += 1;
                    if i < bytes.len() {
                        mask[i] = false;
                    }
                } else if c == b'\'' {
                    state = State::Code;
                }
            }
            State::DoubleQuote => {
                mask[i] = false;
                if c == b'\\' {
                    i += 1;
                    if i < bytes.len() {
                        mask[i] = false;
                    }
                } else if c == b'"' {
                    state = State::Code;
                }
            }
            State::Template => {
                mask[i] = false;
                if c == b'\\' {
                    i += 1;
                    if i < bytes.len() {
                        mask[i] = false;
                    }
                } else if c == b'`' {
                    state = State::Code;
                }
            }
            State::LineComment => {
                mask[i] = false;
                if c == b'\n' {
                    state = State::Code;
                }
            }
            State::BlockComment => {
                mask[i] = false;
                if c == b'*' && bytes.get(i + 1) == Some(&b'/') {
                    mask[i + 1] = false;
                    i += 1;
                    state = State::Code;
                }
            }
        }
        i += 1;
    }
    mask
}

fn find_matching(bytes: &[u8], mask: &[bool], open_idx: usize, open: u8, close: u8) -> Option<usize> {
    let mut depth = 0i32;
    let mut i = open_idx;
    while i < bytes.len() {
        if mask[i] {
            if bytes[i] == open {
                depth += 1;
            } else if bytes[i] == close {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
        }
        i += 1;
    }
    None
}

fn next_non_ws_code(bytes: &[u8], mask: &[bool], from: usize) -> Option<usize> {
    let mut i = from;
    while i < bytes.len() {
        if mask[i] && !(bytes[i] as char).is_whitespace() {
            return Some(i);
        }
        i += 1;
    }
    None
}

/// Finds the index of the statement-terminating `;` at the same bracket
/// nesting depth as `from`, for wrapping a single-statement loop/do body.
fn find_stmt_end(bytes: &[u8], mask: &[bool], from: usize) -> Option<usize> {
    let mut depth = 0i32;
    let mut i = from;
    while i < bytes.len() {
        if mask[i] {
            match bytes[i] {
                b'{' | b'(' | b'[' => depth += 1,
                b'}' | b')' | b']' => depth -= 1,
                b';' if depth == 0 => return Some(i),
                _ => {}
            }
        }
        i += 1;
    }
    None
}

fn import_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?m)^[ \t]*import\b[^\n]*\n?").expect("static regex is valid"))
}

fn strip_imports(code: &mut String, diagnostics: &mut Vec<Diagnostic>) {
    for m in import_re().find_iter(code.clone().as_str()) {
        diagnostics.push(Diagnostic::warn(format!("Import statement removed: {}", m.as_str().trim())));
    }
    *code = import_re().replace_all(code, "").into_owned();
}

fn export_default_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"export\s+default\s+class\s+(\w+)").expect("static regex is valid"))
}

fn export_other_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"export\s+(class|function|const)\s+").expect("static regex is valid"))
}

fn strip_exports(code: &mut String, diagnostics: &mut Vec<Diagnostic>) {
    while let Some(caps) = export_default_re().captures(code) {
        let whole = caps.get(0).unwrap();
        let name = caps.get(1).unwrap().as_str().to_string();
        let decl_start = whole.start();
        let replaced = format!("class {name}");
        let after_decl = decl_start + replaced.len();
        *code = format!("{}{}{}", &code[..decl_start], replaced, &code[whole.end()..]);

        let bytes = code.as_bytes().to_vec();
        let mask = build_mask(code);
        let Some(brace_idx) = next_non_ws_code(&bytes, &mask, after_decl).filter(|&i| bytes[i] == b'{') else {
            diagnostics.push(Diagnostic::warn(format!("could not locate body of exported class '{name}'")));
            continue;
        };
        let Some(close_idx) = find_matching(&bytes, &mask, brace_idx, b'{', b'}') else {
            diagnostics.push(Diagnostic::warn(format!("unbalanced class body for exported class '{name}'")));
            continue;
        };
        let insertion = format!("\n__exports.default = {name};");
        code.insert_str(close_idx + 1, &insertion);
    }

    *code = export_other_re().replace_all(code, "$1 ").into_owned();
}

/// Wraps every `while`/`for`/`do` body (if not already a block) and
/// prepends a call to `__checkLoop()`.
fn inject_loop_counters(code: &mut String) {
    inject_for_keyword(code, "while");
    inject_for_keyword(code, "for");
    inject_do(code);
}

fn inject_for_keyword(code: &mut String, keyword: &str) {
    let mut search_from = 0;
    loop {
        let bytes = code.as_bytes().to_vec();
        let mask = build_mask(code);
        let Some(kw_idx) = find_keyword(&bytes, &mask, search_from, keyword) else { break };
        let Some(paren_idx) = next_non_ws_code(&bytes, &mask, kw_idx + keyword.len()).filter(|&i| bytes[i] == b'(') else {
            search_from = kw_idx + keyword.len();
            continue;
        };
        let Some(close_paren) = find_matching(&bytes, &mask, paren_idx, b'(', b')') else {
            search_from = kw_idx + keyword.len();
            continue;
        };
        let Some(body_start) = next_non_ws_code(&bytes, &mask, close_paren + 1) else { break };

        if bytes[body_start] == b'{' {
            code.insert_str(body_start + 1, "\n__checkLoop();");
            search_from = body_start + 1 + "\n__checkLoop();".len();
        } else {
            let Some(stmt_end) = find_stmt_end(&bytes, &mask, body_start) else { break };
            let stmt = code[body_start..=stmt_end].to_string();
            let wrapped = format!("{{\n__checkLoop();\n{stmt}\n}}");
            code.replace_range(body_start..=stmt_end, &wrapped);
            search_from = body_start + wrapped.len();
        }
    }
}

fn inject_do(code: &mut String) {
    let mut search_from = 0;
    loop {
        let bytes = code.as_bytes().to_vec();
        let mask = build_mask(code);
        let Some(kw_idx) = find_keyword(&bytes, &mask, search_from, "do") else { break };
        let Some(body_start) = next_non_ws_code(&bytes, &mask, kw_idx + 2) else { break };

        if bytes[body_start] == b'{' {
            code.insert_str(body_start + 1, "\n__checkLoop();");
            search_from = body_start + 1 + "\n__checkLoop();".len();
        } else {
            let Some(stmt_end) = find_stmt_end(&bytes, &mask, body_start) else { break };
            let stmt = code[body_start..=stmt_end].to_string();
            let wrapped = format!("{{\n__checkLoop();\n{stmt}\n}}");
            code.replace_range(body_start..=stmt_end, &wrapped);
            search_from = body_start + wrapped.len();
        }
    }
}

fn find_keyword(bytes: &[u8], mask: &[bool], from: usize, keyword: &str) -> Option<usize> {
    let kw = keyword.as_bytes();
    let mut i = from;
    while i + kw.len() <= bytes.len() {
        if mask[i] && &bytes[i..i + kw.len()] == kw {
            let before_ok = i == 0 || !(bytes[i - 1] as char).is_alphanumeric() && bytes[i - 1] != b'_';
            let after_ok = bytes.get(i + kw.len()).is_none_or(|&c| !(c as char).is_alphanumeric() && c != b'_');
            if before_ok && after_ok {
                return Some(i);
            }
        }
        i += 1;
    }
    None
}

fn scan_blocked_globals(code: &str, diagnostics: &mut Vec<Diagnostic>) {
    let mask = build_mask(code);
    let bytes = code.as_bytes();
    for &name in BLOCKED_GLOBALS {
        if find_keyword(bytes, &mask, 0, name).is_some() {
            diagnostics.push(Diagnostic::warn(format!("reference to blocked global '{name}' found; denied at evaluation time")));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::Severity;

    fn cfg() -> RuntimeConfig {
        RuntimeConfig::default()
    }

    #[test]
    fn empty_input_succeeds_with_only_a_preamble() {
        let result = transform("", &cfg());
        assert!(result.success);
        assert!(result.code.contains("__MAX_ITERATIONS"));
        assert!(result.code.contains("__checkCall"));
    }

    #[test]
    fn while_loop_gets_a_check_call_injected() {
        let result = transform("while (true) { x = 1; }", &cfg());
        assert!(result.code.contains("while (true) {\n__checkLoop();"));
    }

    #[test]
    fn single_statement_loop_body_is_wrapped_into_a_block() {
        let result = transform("while (true) x = 1;", &cfg());
        assert!(result.code.contains("while (true) {\n__checkLoop();\nx = 1;\n}"));
    }

    #[test]
    fn do_while_body_gets_a_check_call_injected() {
        let result = transform("do { x++; } while (x < 10);", &cfg());
        assert!(result.code.contains("do {\n__checkLoop();"));
    }

    #[test]
    fn export_default_class_is_stripped_and_exports_assigned() {
        let result = transform("export default class Foo { bar() { return 1; } }", &cfg());
        assert!(!result.code.contains("export default"));
        assert!(result.code.contains("class Foo {"));
        assert!(result.code.contains("__exports.default = Foo;"));
    }

    #[test]
    fn other_export_forms_lose_the_export_keyword() {
        let result = transform("export class Bar {}\nexport function f() {}\nexport const k = 1;", &cfg());
        assert!(!result.code.contains("export class"));
        assert!(!result.code.contains("export function"));
        assert!(!result.code.contains("export const"));
        assert!(result.code.contains("class Bar {}"));
    }

    #[test]
    fn import_statements_are_removed_with_a_warning() {
        let result = transform("import { x } from './y';\nclass Z {}", &cfg());
        assert!(!result.code.contains("import"));
        assert!(result
            .diagnostics
            .iter()
            .any(|d| d.severity == Severity::Warning && d.message.contains("Import")));
    }

    #[test]
    fn blocked_globals_are_warned_but_not_deleted() {
        let result = transform("class Z { run() { return fetch('x'); } }", &cfg());
        assert!(result.code.contains("fetch('x')"));
        assert!(result.diagnostics.iter().any(|d| d.message.contains("fetch")));
    }

    #[test]
    fn unbalanced_input_fails() {
        let result = transform("class Z { run() {", &cfg());
        assert!(!result.success);
    }
}
