//! Tracks the static type of every identifier in scope as the parser walks
//! the tree, so [`crate::codegen`] can insert lossless coercions and pick
//! overloaded built-in call forms without a second pass.

use crate::ast::{BinOp, Type};
use rustc_hash::FxHashMap;

/// A stack of lexical scopes mapping identifier name to declared [`Type`].
#[derive(Debug, Default)]
pub struct TypeTracker {
    scopes: Vec<FxHashMap<String, Type>>,
}

impl TypeTracker {
    /// Creates a tracker with a single (global) scope.
    pub fn new() -> Self {
        Self {
            scopes: vec![FxHashMap::default()],
        }
    }

    /// Enters a new scope (function body or compound statement).
    pub fn enter_scope(&mut self) {
        self.scopes.push(FxHashMap::default());
    }

    /// Leaves the innermost scope.
    pub fn exit_scope(&mut self) {
        self.scopes.pop();
    }

    /// Declares `name` with `ty` in the innermost scope, shadowing any
    /// outer declaration of the same name.
    pub fn declare(&mut self, name: &str, ty: Type) {
        self.scopes
            .last_mut()
            .expect("at least one scope is always open")
            .insert(name.to_string(), ty);
    }

    /// Looks up `name` starting from the innermost scope outward.
    pub fn lookup(&self, name: &str) -> Option<Type> {
        self.scopes.iter().rev().find_map(|scope| scope.get(name).copied())
    }

    /// Computes the static type of a binary arithmetic/comparison operator
    /// given its already-resolved operand types.
    pub fn binary_result_type(op: BinOp, lhs: Type, rhs: Type) -> Type {
        match op {
            BinOp::Add if lhs == Type::List || rhs == Type::List => Type::List,
            BinOp::Add if lhs == Type::String || rhs == Type::String => Type::String,
            BinOp::Add | BinOp::Sub | BinOp::Mul | BinOp::Div | BinOp::Mod => Type::numeric_promote(lhs, rhs),
            BinOp::ListConcat => Type::List,
            BinOp::Eq
            | BinOp::NotEq
            | BinOp::Less
            | BinOp::LessEq
            | BinOp::Greater
            | BinOp::GreaterEq
            | BinOp::And
            | BinOp::Or => Type::Integer,
            BinOp::BitAnd | BinOp::BitOr | BinOp::BitXor | BinOp::Shl | BinOp::Shr => Type::Integer,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_scopes_shadow_outer_declarations() {
        let mut t = TypeTracker::new();
        t.declare("x", Type::Integer);
        t.enter_scope();
        t.declare("x", Type::String);
        assert_eq!(t.lookup("x"), Some(Type::String));
        t.exit_scope();
        assert_eq!(t.lookup("x"), Some(Type::Integer));
    }

    #[test]
    fn arithmetic_promotes_to_float() {
        assert_eq!(
            TypeTracker::binary_result_type(BinOp::Add, Type::Integer, Type::Float),
            Type::Float
        );
        assert_eq!(
            TypeTracker::binary_result_type(BinOp::Add, Type::Integer, Type::Integer),
            Type::Integer
        );
    }
}
