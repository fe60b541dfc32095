//! Bundle Transpiler (C6): batch-transpiles every [`ScriptBinding`] in a
//! [`ParsedBundle`] against caller-supplied source text, deriving a unique
//! TSL class name per script.

use super::parser::{ParsedBundle, ScriptBinding};
use crate::codegen::{Diagnostic, GenOptions};
use crate::facade::{self, TranspileResult};
use rustc_hash::FxHashSet;
use std::collections::HashMap;

/// One script's transpile outcome, tagged with its object/script identity.
#[derive(Debug, Clone)]
pub struct TranspiledScript {
    pub object_id: String,
    pub object_name: String,
    pub script_name: String,
    pub class_name: String,
    pub code: String,
    pub success: bool,
    pub diagnostics: Vec<Diagnostic>,
}

/// Aggregate result of transpiling an entire bundle.
#[derive(Debug, Clone)]
pub struct TranspiledBundle {
    pub scripts: Vec<TranspiledScript>,
    pub success_count: usize,
    pub failure_count: usize,
}

/// Transpiles every binding in `bundle`, looking its source up in `sources`
/// (asset path -> source text, owned by the caller).
pub fn transpile_bundle(bundle: &ParsedBundle, sources: &HashMap<String, String>) -> TranspiledBundle {
    let mut used_names = FxHashSet::default();
    let mut scripts = Vec::new();
    let mut success_count = 0;
    let mut failure_count = 0;

    for binding in &bundle.scripts {
        let class_name = derive_class_name(&binding.script_name, &mut used_names);
        let transpiled = transpile_one(binding, sources, &class_name);
        if transpiled.success {
            success_count += 1;
        } else {
            failure_count += 1;
        }
        scripts.push(transpiled);
    }

    TranspiledBundle { scripts, success_count, failure_count }
}

fn transpile_one(binding: &ScriptBinding, sources: &HashMap<String, String>, class_name: &str) -> TranspiledScript {
    let Some(source) = sources.get(&binding.asset_path) else {
        return TranspiledScript {
            object_id: binding.object_id.clone(),
            object_name: binding.object_name.clone(),
            script_name: binding.script_name.clone(),
            class_name: class_name.to_string(),
            code: String::new(),
            success: false,
            diagnostics: vec![Diagnostic::error(format!("Source file not found: {}", binding.asset_path))],
        };
    };

    let options = GenOptions {
        class_name: Some(class_name.to_string()),
        source_comment: Some(binding.asset_path.clone()),
    };
    let TranspileResult { code, success, diagnostics, class_name } = facade::transpile(source, &options);
    TranspiledScript {
        object_id: binding.object_id.clone(),
        object_name: binding.object_name.clone(),
        script_name: binding.script_name.clone(),
        class_name,
        code,
        success,
        diagnostics,
    }
}

/// Derives a unique PascalCase TSL class name from a free-form script name:
/// strip non-alphanumeric characters except separators, split on
/// whitespace/`_`/`-`, PascalCase each segment, prefix `Script` if the
/// result would be empty or not start with a letter, then dedupe against
/// `used` by suffixing `_2`, `_3`, ... (lowest unused >= 2).
pub fn derive_class_name(raw_name: &str, used: &mut FxHashSet<String>) -> String {
    let cleaned: String = raw_name
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '_' || c == '-' || c.is_whitespace() { c } else { ' ' })
        .collect();

    let mut name: String = cleaned
        .split(|c: char| c == '_' || c == '-' || c.is_whitespace())
        .filter(|s| !s.is_empty())
        .map(pascal_case_segment)
        .collect();

    if name.is_empty() || !name.chars().next().unwrap().is_alphabetic() {
        name = format!("Script{name}");
    }

    if !used.contains(&name) {
        used.insert(name.clone());
        return name;
    }

    let mut n = 2;
    loop {
        let candidate = format!("{name}_{n}");
        if !used.contains(&candidate) {
            used.insert(candidate.clone());
            return candidate;
        }
        n += 1;
    }
}

fn pascal_case_segment(segment: &str) -> String {
    let mut chars = segment.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::Severity;

    #[test]
    fn dedups_repeated_names_with_lowest_available_suffix() {
        let mut used = FxHashSet::default();
        assert_eq!(derive_class_name("Door", &mut used), "Door");
        assert_eq!(derive_class_name("Door", &mut used), "Door_2");
        assert_eq!(derive_class_name("Door", &mut used), "Door_3");
    }

    #[test]
    fn empty_or_numeric_leading_names_get_a_script_prefix() {
        let mut used = FxHashSet::default();
        assert_eq!(derive_class_name("!!!", &mut used), "Script");
        let mut used2 = FxHashSet::default();
        assert_eq!(derive_class_name("1-door", &mut used2), "Script1Door");
    }

    #[test]
    fn missing_source_is_a_per_script_failure_others_continue() {
        let bundle = super::super::parser::parse(
            r#"{
                "format_version": "1.0", "scene_name": "s",
                "objects": { "o": { "inventory": [
                    { "name": "a", "asset": "x", "kind": "script" },
                    { "name": "b", "asset": "y", "kind": "script" }
                ]}},
                "assets": {
                    "x": {"type": "script", "path": "a.lsl"},
                    "y": {"type": "script", "path": "b.lsl"}
                }
            }"#,
        )
        .unwrap();
        let mut sources = HashMap::new();
        sources.insert("a.lsl".to_string(), r#"default { state_entry() {} }"#.to_string());
        let result = transpile_bundle(&bundle, &sources);
        assert_eq!(result.success_count, 1);
        assert_eq!(result.failure_count, 1);
        assert!(result.scripts.iter().any(|s| !s.success && s.diagnostics.iter().any(|d| d.severity == Severity::Error)));
    }
}
