use super::*;
use crate::lexer::lex;
use crate::parser::parse;

fn compile(src: &str) -> CodegenResult {
    let tokens = lex(src).unwrap();
    let out = parse(tokens).unwrap();
    generate(&out.unit, &out.functions, &GenOptions::default())
}

#[test]
fn hello_world_generates_expected_shape() {
    let result = compile(r#"default { state_entry() { llSay(0, "Hi"); } }"#);
    assert!(result.success);
    assert_eq!(result.class_name, "LSLScript");
    assert!(result.code.contains("class LSLScript extends WorldScript"));
    assert!(result.code.contains("default: {"));
    assert!(result.code.contains("async onStateEntry()"));
    assert!(result.code.contains("await this.world.say(0, \"Hi\")"));
}

#[test]
fn class_name_override_is_honored() {
    let tokens = lex(r#"default { state_entry() {} }"#).unwrap();
    let out = parse(tokens).unwrap();
    let result = generate(
        &out.unit,
        &out.functions,
        &GenOptions { class_name: Some("Door".to_string()), source_comment: None },
    );
    assert!(result.code.contains("class Door extends WorldScript"));
    assert_eq!(result.class_name, "Door");
}

#[test]
fn state_transition_becomes_awaited_transition_to() {
    let result = compile("default { state_entry() { state running; } } state running { state_entry() {} }");
    assert!(result.code.contains("await this.transitionTo(\"running\")"));
}

#[test]
fn integer_cast_truncates() {
    let result = compile("default { state_entry() { integer i = (integer) 3.9; } }");
    assert!(result.code.contains("Math.trunc(3.9)"));
}

#[test]
fn object_and_container_builtins_route_to_their_namespace() {
    let result = compile(
        r#"default { state_entry() { llSetPos(<1.0,2.0,3.0>); llMessageLinked(-1, 0, "hi", ""); } }"#,
    );
    assert!(result.code.contains("this.object.setPosition("));
    assert!(result.code.contains("this.container.sendLinkMessage("));
}

#[test]
fn unmapped_builtin_call_is_a_warning_not_an_error() {
    let result = compile(r#"default { state_entry() { llNotARealFunction(); } }"#);
    assert!(result.success);
    assert!(result.diagnostics.iter().any(|d| d.message.contains("llNotARealFunction")));
}

#[test]
fn integer_division_truncates_toward_zero() {
    let result = compile("default { state_entry() { integer q = 7 / 2; } }");
    assert!(result.code.contains("Math.trunc(7 / 2)"), "{}", result.code);
}

#[test]
fn float_division_is_left_as_plain_division() {
    let result = compile("default { state_entry() { float f = 7.0 / 2; } }");
    assert!(result.code.contains("(7.0 / 2)"), "{}", result.code);
    assert!(!result.code.contains("Math.trunc"), "{}", result.code);
}

#[test]
fn list_plus_scalar_concatenates_instead_of_stringifying() {
    let result = compile(r#"default { state_entry() { list l = [1, 2] + 3; } }"#);
    assert!(result.code.contains("[...[1, 2], 3]"), "{}", result.code);
}

#[test]
fn list_plus_list_concatenates_both_spreads() {
    let result = compile(r#"default { state_entry() { list l = [1] + [2]; } }"#);
    assert!(result.code.contains("[...[1], ...[2]]"), "{}", result.code);
}
