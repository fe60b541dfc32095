use super::*;
use crate::lexer::lex;

fn parse_src(src: &str) -> Result<ParseOutput, ParseErrors> {
    parse(lex(src).expect("lex should succeed in these fixtures"))
}

#[test]
fn parses_minimal_hello_world() {
    let out = parse_src(r#"default { state_entry() { llSay(0, "Hi"); } }"#).unwrap();
    assert_eq!(out.unit.states.len(), 1);
    assert_eq!(out.unit.states[0].name, "default");
    assert_eq!(out.unit.states[0].handlers[0].event, "state_entry");
}

#[test]
fn default_must_be_first_state() {
    let err = parse_src("state foo { state_entry() {} } default { state_entry() {} }").unwrap_err();
    assert!(err.0.iter().any(|e| e.expected.contains("default")));
}

#[test]
fn duplicate_state_names_are_rejected() {
    let err = parse_src("default { state_entry() {} } state foo {} state foo {}").unwrap_err();
    assert!(err.0.iter().any(|e| e.got.contains("duplicate")));
}

#[test]
fn duplicate_event_handlers_are_rejected() {
    let err = parse_src("default { state_entry() {} state_entry() {} }").unwrap_err();
    assert!(err.0.iter().any(|e| e.got.contains("duplicate")));
}

#[test]
fn parses_globals_and_functions() {
    let out = parse_src(
        r#"
        integer counter = 0;
        integer addOne(integer x) { return x + 1; }
        default { state_entry() { counter = addOne(counter); } }
        "#,
    )
    .unwrap();
    assert_eq!(out.unit.globals.len(), 1);
    assert_eq!(out.unit.functions.len(), 1);
    assert!(out.functions.resolve_user("addOne").is_some());
}

#[test]
fn parses_vector_and_rotation_literals() {
    let out = parse_src(
        r#"
        default {
            state_entry() {
                vector v = <1.0, 2.0, 3.0>;
                rotation r = <0.0, 0.0, 0.0, 1.0>;
            }
        }
        "#,
    )
    .unwrap();
    let body = &out.unit.states[0].handlers[0].body;
    let Stmt::LocalDecl { initializer: Some(v), .. } = &body[0] else { panic!("expected a local decl") };
    assert!(matches!(v.static_type(), Some(Type::Vector)));
    assert!(matches!(unwrap_typed(v), Expr::VectorLiteral(..)));

    let Stmt::LocalDecl { initializer: Some(r), .. } = &body[1] else { panic!("expected a local decl") };
    assert!(matches!(r.static_type(), Some(Type::Rotation)));
    assert!(matches!(unwrap_typed(r), Expr::RotationLiteral(..)));
}

fn unwrap_typed(e: &Expr) -> &Expr {
    match e {
        Expr::Typed { expr, .. } => expr,
        other => other,
    }
}

#[test]
fn parses_all_five_loop_forms_and_state_transition() {
    let out = parse_src(
        r#"
        default {
            state_entry() {
                integer i = 0;
                while (i < 10) { i = i + 1; }
                do { i = i - 1; } while (i > 0);
                for (i = 0; i < 5; i = i + 1) { llSay(0, "x"); }
                state running;
            }
        }
        state running {
            state_entry() { llSay(0, "running"); }
        }
        "#,
    )
    .unwrap();
    assert_eq!(out.unit.states.len(), 2);
}

#[test]
fn arithmetic_promotes_int_plus_float_to_float() {
    let out = parse_src(
        r#"
        default {
            state_entry() {
                float f = 1 + 2.0;
            }
        }
        "#,
    )
    .unwrap();
    let Stmt::LocalDecl { ty, initializer: Some(init), .. } = &out.unit.states[0].handlers[0].body[0] else {
        panic!("expected a local decl");
    };
    assert_eq!(*ty, Type::Float);
    assert_eq!(init.static_type(), Some(Type::Float));
}

#[test]
fn list_plus_scalar_is_list_concat_not_arithmetic_add() {
    let out = parse_src(
        r#"
        default {
            state_entry() {
                list l = [1, 2] + 3;
            }
        }
        "#,
    )
    .unwrap();
    let Stmt::LocalDecl { initializer: Some(init), .. } = &out.unit.states[0].handlers[0].body[0] else {
        panic!("expected a local decl");
    };
    assert_eq!(init.static_type(), Some(Type::List));
    let Expr::Typed { expr, .. } = init else { panic!("expected a typed binary") };
    assert!(matches!(**expr, Expr::Binary { op: BinOp::ListConcat, .. }));
}

#[test]
fn integer_division_is_typed_integer_for_truncation() {
    let out = parse_src(
        r#"
        default {
            state_entry() {
                integer q = 7 / 2;
            }
        }
        "#,
    )
    .unwrap();
    let Stmt::LocalDecl { initializer: Some(init), .. } = &out.unit.states[0].handlers[0].body[0] else {
        panic!("expected a local decl");
    };
    assert_eq!(init.static_type(), Some(Type::Integer));
}
