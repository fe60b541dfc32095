//! The transpile facade (C4): preprocess, then lex, parse and generate,
//! folding every failure mode into a diagnostic instead of a `panic`/`Err`
//! surfaced to the caller.

use crate::codegen::{self, CodegenResult, Diagnostic, GenOptions};
use crate::lexer;
use crate::parser;
use regex::Regex;
use std::sync::OnceLock;

/// `transpile`'s complete, never-throwing output.
#[derive(Debug, Clone)]
pub struct TranspileResult {
    pub code: String,
    pub success: bool,
    pub diagnostics: Vec<Diagnostic>,
    pub class_name: String,
}

/// Transpiles a single LSL source string to TSL. Never panics or returns
/// `Err`: lex/parse/codegen failures become a single `error` diagnostic
/// and an empty `code`.
pub fn transpile(source: &str, options: &GenOptions) -> TranspileResult {
    let preprocessed = preprocess(source);

    let tokens = match lexer::lex(&preprocessed) {
        Ok(tokens) => tokens,
        Err(e) => {
            return TranspileResult {
                code: String::new(),
                success: false,
                diagnostics: vec![Diagnostic::error(format!("lex error: {e}"))],
                class_name: options.class_name.clone().unwrap_or_else(|| "LSLScript".to_string()),
            }
        }
    };

    let parsed = match parser::parse(tokens) {
        Ok(parsed) => parsed,
        Err(errors) => {
            return TranspileResult {
                code: String::new(),
                success: false,
                diagnostics: errors.0.iter().map(|e| Diagnostic::error(format!("parse error: {e}"))).collect(),
                class_name: options.class_name.clone().unwrap_or_else(|| "LSLScript".to_string()),
            }
        }
    };

    let CodegenResult { code, success, diagnostics, class_name } =
        codegen::generate(&parsed.unit, &parsed.functions, options);

    TranspileResult { code, success, diagnostics, class_name }
}

fn merge_conflict_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?s)<<<<<<<[^\n]*\n(.*?)\n=======\n.*?\n>>>>>>>[^\n]*\n?").expect("static regex is valid")
    })
}

/// Preprocessing: decode the four HTML entities LSL editors commonly
/// mangle source with, then strip any git merge-conflict regions, keeping
/// the "ours" branch. Idempotent: running it twice is the same as once.
pub fn preprocess(source: &str) -> String {
    let decoded = decode_entities(source);
    merge_conflict_re().replace_all(&decoded, "$1\n").into_owned()
}

fn decode_entities(source: &str) -> String {
    if !source.contains('&') {
        return source.to_string();
    }
    source
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::Severity;

    #[test]
    fn hello_world_succeeds() {
        let result = transpile(r#"default { state_entry() { llSay(0, "Hi"); } }"#, &GenOptions::default());
        assert!(result.success);
        assert_eq!(result.class_name, "LSLScript");
    }

    #[test]
    fn decodes_entities_and_strips_merge_conflicts_keeping_ours() {
        let src = "default {\n    state_entry() {\n<<<<<<< ours\n        llSay(0, \"&lt;1,2,3&gt;\");\n=======\n        llSay(0, \"theirs\");\n>>>>>>> branch\n    }\n}";
        let result = transpile(src, &GenOptions::default());
        assert!(result.success, "{:?}", result.diagnostics);
        assert!(result.code.contains("<1,2,3>"));
        assert!(!result.code.contains("theirs"));
    }

    #[test]
    fn preprocessing_is_idempotent() {
        let src = "&lt;weird&gt; &amp; text";
        let once = preprocess(src);
        let twice = preprocess(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn total_failure_yields_empty_code_and_error_diagnostic() {
        let result = transpile("not valid lsl at all !!!", &GenOptions::default());
        assert!(!result.success);
        assert!(result.code.is_empty());
        assert!(result.diagnostics.iter().any(|d| d.severity == Severity::Error));
    }
}
