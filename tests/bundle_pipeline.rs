//! End-to-end exercise of the bundle pipeline described in spec §2: scene
//! manifest -> resolved bindings -> batch transpile -> sandbox transform.

use lsl_runtime::{bundle, sandbox};
use std::collections::HashMap;

const MANIFEST: &str = r#"{
    "format_version": "1.0",
    "scene_name": "Courtyard",
    "objects": {
        "obj-door": {
            "name": "Door",
            "inventory": [
                { "name": "door script", "asset": "asset-door", "kind": "script" },
                { "name": "missing script", "asset": "no-such-asset", "kind": "script" }
            ]
        },
        "obj-door-2": {
            "name": "Door",
            "inventory": [
                { "name": "door script 2", "asset": "asset-door2", "kind": "script" }
            ]
        }
    },
    "assets": {
        "asset-door": { "type": "script", "path": "scripts/door.lsl" },
        "asset-door2": { "type": "script", "path": "scripts/door2.lsl" }
    }
}"#;

const DOOR_SOURCE: &str = r#"
default {
    state_entry() {
        llSay(0, "door ready");
    }
    touch_start(integer total_number) {
        llSetText("touched", <1.0, 1.0, 1.0>, 1.0);
    }
}
"#;

#[test]
fn bundle_parse_resolves_only_scripts_with_a_matching_asset() {
    let parsed = bundle::parse_manifest(MANIFEST).unwrap();
    assert_eq!(parsed.scripts.len(), 2);

    let errors = bundle::validate(MANIFEST).unwrap();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].message.contains("no-such-asset"));
}

#[test]
fn bundle_transpile_derives_unique_class_names_across_same_named_objects() {
    let parsed = bundle::parse_manifest(MANIFEST).unwrap();
    let mut sources = HashMap::new();
    sources.insert("scripts/door.lsl".to_string(), DOOR_SOURCE.to_string());
    sources.insert("scripts/door2.lsl".to_string(), DOOR_SOURCE.to_string());

    let transpiled = bundle::transpile_bundle(&parsed, &sources);
    assert_eq!(transpiled.success_count, 2);
    assert_eq!(transpiled.failure_count, 0);

    let names: Vec<&str> = transpiled.scripts.iter().map(|s| s.class_name.as_str()).collect();
    assert_eq!(names.len(), 2);
    assert_ne!(names[0], names[1]);
    assert!(names.iter().all(|n| n.starts_with(char::is_uppercase)));
}

#[test]
fn bundle_transpile_reports_a_synthetic_error_for_missing_source() {
    let parsed = bundle::parse_manifest(MANIFEST).unwrap();
    let sources = HashMap::new(); // no source text provided for either binding

    let transpiled = bundle::transpile_bundle(&parsed, &sources);
    assert_eq!(transpiled.success_count, 0);
    assert_eq!(transpiled.failure_count, 2);
    assert!(transpiled.scripts.iter().all(|s| s.code.is_empty()));
    assert!(transpiled
        .scripts
        .iter()
        .all(|s| s.diagnostics.iter().any(|d| d.message.contains("Source file not found"))));
}

#[test]
fn transpiled_output_survives_the_sandbox_transform_unscathed() {
    let parsed = bundle::parse_manifest(MANIFEST).unwrap();
    let mut sources = HashMap::new();
    sources.insert("scripts/door.lsl".to_string(), DOOR_SOURCE.to_string());
    sources.insert("scripts/door2.lsl".to_string(), DOOR_SOURCE.to_string());

    let transpiled = bundle::transpile_bundle(&parsed, &sources);
    for script in &transpiled.scripts {
        assert!(script.success, "{:?}", script.diagnostics);
        let hardened = sandbox::transform(&script.code, &Default::default());
        assert!(hardened.success);
        assert!(!hardened.code.contains("export default"));
        assert!(hardened.code.contains("__MAX_ITERATIONS"));
    }
}
