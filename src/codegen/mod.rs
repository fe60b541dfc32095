//! Lowers a parsed LSL [`TranslationUnit`] to TSL source text.
//!
//! Produces a single class extending `WorldScript`: globals become
//! instance fields, LSL functions become async instance methods, and
//! state/event handlers become a `states` table of async methods.
//! Generation never throws on semantic issues — it records
//! [`Diagnostic`]s and keeps going; `success` is `true` iff none of them
//! is [`Severity::Error`].

mod event_names;

#[cfg(test)]
mod tests;

use crate::ast::*;
use crate::parser::function_resolver::{FunctionResolver, TargetForm};
use event_names::tsl_handler_name;
use std::fmt::Write as _;

/// Generation options.
#[derive(Debug, Clone, Default)]
pub struct GenOptions {
    /// Overrides the default `LSLScript` class name.
    pub class_name: Option<String>,
    /// Prepend a `// compiled from <hint>` comment when set.
    pub source_comment: Option<String>,
}

/// Diagnostic severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Warning,
    Error,
}

/// A single codegen diagnostic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
}

impl Diagnostic {
    pub(crate) fn warn(message: impl Into<String>) -> Self {
        Self { severity: Severity::Warning, message: message.into() }
    }

    pub(crate) fn error(message: impl Into<String>) -> Self {
        Self { severity: Severity::Error, message: message.into() }
    }
}

/// The output of a single [`generate`] call.
#[derive(Debug, Clone)]
pub struct CodegenResult {
    pub code: String,
    pub success: bool,
    pub diagnostics: Vec<Diagnostic>,
    pub class_name: String,
}

/// Lowers `unit` to TSL source, using `functions` to resolve built-in calls.
pub fn generate(unit: &TranslationUnit, functions: &FunctionResolver, options: &GenOptions) -> CodegenResult {
    let class_name = options.class_name.clone().unwrap_or_else(|| "LSLScript".to_string());
    let mut gen = Generator {
        functions,
        diagnostics: Vec::new(),
    };

    let mut out = String::new();
    if let Some(hint) = &options.source_comment {
        let _ = writeln!(out, "// compiled from {hint}");
    }
    let _ = writeln!(out, "class {class_name} extends WorldScript {{");
    let _ = writeln!(out, "  __callDepth = 0;");

    for g in &unit.globals {
        let init = g
            .initializer
            .as_ref()
            .map(|e| gen.expr(e))
            .unwrap_or_else(|| default_value(g.ty));
        let _ = writeln!(out, "  {} = {};", g.name, init);
    }
    out.push('\n');

    for f in &unit.functions {
        gen.function(&mut out, f);
    }

    let _ = writeln!(out, "  states = {{");
    for state in &unit.states {
        let _ = writeln!(out, "    {}: {{", state.name);
        for handler in &state.handlers {
            gen.handler(&mut out, handler);
        }
        let _ = writeln!(out, "    }},");
    }
    let _ = writeln!(out, "  }};");

    out.push_str("}\n");

    let success = !gen.diagnostics.iter().any(|d| d.severity == Severity::Error);
    CodegenResult {
        code: if success { out } else { String::new() },
        success,
        diagnostics: gen.diagnostics,
        class_name,
    }
}

struct Generator<'a> {
    functions: &'a FunctionResolver,
    diagnostics: Vec<Diagnostic>,
}

fn default_value(ty: Type) -> String {
    match ty {
        Type::Integer => "0".to_string(),
        Type::Float => "0.0".to_string(),
        Type::String => "\"\"".to_string(),
        Type::Key => "\"\"".to_string(),
        Type::List => "[]".to_string(),
        Type::Vector => "{ x: 0, y: 0, z: 0 }".to_string(),
        Type::Rotation => "{ x: 0, y: 0, z: 0, s: 1 }".to_string(),
        Type::Void => "undefined".to_string(),
    }
}

fn indent(out: &mut String, depth: usize) {
    for _ in 0..depth {
        out.push_str("  ");
    }
}

impl<'a> Generator<'a> {
    fn function(&mut self, out: &mut String, f: &FunctionDef) {
        let params = f.params.iter().map(|p| p.name.as_str()).collect::<Vec<_>>().join(", ");
        let _ = writeln!(out, "  async {}({}) {{", f.name, params);
        let _ = writeln!(out, "    this.__callDepth++;");
        let _ = writeln!(out, "    __checkCall(this.__callDepth);");
        let _ = writeln!(out, "    try {{");
        for s in &f.body {
            self.stmt(out, s, 3);
        }
        let _ = writeln!(out, "    }} finally {{");
        let _ = writeln!(out, "      this.__callDepth--;");
        let _ = writeln!(out, "    }}");
        let _ = writeln!(out, "  }}\n");
    }

    fn handler(&mut self, out: &mut String, h: &EventHandler) {
        let params = h.params.iter().map(|p| p.name.as_str()).collect::<Vec<_>>().join(", ");
        let name = tsl_handler_name(&h.event);
        let _ = writeln!(out, "      async {name}({params}) {{");
        for s in &h.body {
            self.stmt(out, s, 4);
        }
        let _ = writeln!(out, "      }},");
    }

    fn stmt(&mut self, out: &mut String, s: &Stmt, depth: usize) {
        match s {
            Stmt::LocalDecl { name, initializer, ty } => {
                indent(out, depth);
                let init = initializer.as_ref().map(|e| self.expr(e)).unwrap_or_else(|| default_value(*ty));
                let _ = writeln!(out, "let {name} = {init};");
            }
            Stmt::Assign { target, op, value } => {
                indent(out, depth);
                let t = self.expr(target);
                let v = self.expr(value);
                let op_str = match op {
                    AssignOp::Assign => "=",
                    AssignOp::Add => "+=",
                    AssignOp::Sub => "-=",
                    AssignOp::Mul => "*=",
                    AssignOp::Div => "/=",
                    AssignOp::Mod => "%=",
                };
                let _ = writeln!(out, "{t} {op_str} {v};");
            }
            Stmt::If { cond, then_branch, else_branch } => {
                indent(out, depth);
                let _ = writeln!(out, "if ({}) {{", self.expr(cond));
                for s in then_branch {
                    self.stmt(out, s, depth + 1);
                }
                indent(out, depth);
                if let Some(else_branch) = else_branch {
                    let _ = writeln!(out, "}} else {{");
                    for s in else_branch {
                        self.stmt(out, s, depth + 1);
                    }
                    indent(out, depth);
                    let _ = writeln!(out, "}}");
                } else {
                    let _ = writeln!(out, "}}");
                }
            }
            Stmt::While { cond, body } => {
                indent(out, depth);
                let _ = writeln!(out, "while ({}) {{", self.expr(cond));
                for s in body {
                    self.stmt(out, s, depth + 1);
                }
                indent(out, depth);
                let _ = writeln!(out, "}}");
            }
            Stmt::DoWhile { body, cond } => {
                indent(out, depth);
                let _ = writeln!(out, "do {{");
                for s in body {
                    self.stmt(out, s, depth + 1);
                }
                indent(out, depth);
                let _ = writeln!(out, "}} while ({});", self.expr(cond));
            }
            Stmt::For { init, cond, step, body } => {
                indent(out, depth);
                let init_s = init.iter().map(|s| self.inline_stmt(s)).collect::<Vec<_>>().join(", ");
                let cond_s = cond.as_ref().map(|e| self.expr(e)).unwrap_or_default();
                let step_s = step.iter().map(|s| self.inline_stmt(s)).collect::<Vec<_>>().join(", ");
                let _ = writeln!(out, "for ({init_s}; {cond_s}; {step_s}) {{");
                for s in body {
                    self.stmt(out, s, depth + 1);
                }
                indent(out, depth);
                let _ = writeln!(out, "}}");
            }
            Stmt::Return(value) => {
                indent(out, depth);
                match value {
                    Some(e) => {
                        let _ = writeln!(out, "return {};", self.expr(e));
                    }
                    None => {
                        let _ = writeln!(out, "return;");
                    }
                }
            }
            Stmt::ChangeState(name) => {
                indent(out, depth);
                let _ = writeln!(out, "await this.transitionTo(\"{name}\");");
            }
            Stmt::Jump(label) => {
                indent(out, depth);
                self.diagnostics.push(Diagnostic::warn(format!(
                    "'jump {label}' has no structured TSL equivalent; emitted as a labeled continue target"
                )));
                let _ = writeln!(out, "/* jump {label} */");
            }
            Stmt::Label(name) => {
                indent(out, depth);
                let _ = writeln!(out, "{name}: ;");
            }
            Stmt::Expr(e) => {
                indent(out, depth);
                let _ = writeln!(out, "{};", self.expr(e));
            }
            Stmt::Block(stmts) => {
                indent(out, depth);
                let _ = writeln!(out, "{{");
                for s in stmts {
                    self.stmt(out, s, depth + 1);
                }
                indent(out, depth);
                let _ = writeln!(out, "}}");
            }
        }
    }

    /// Renders a statement usable in a `for(init; cond; step)` clause position.
    fn inline_stmt(&mut self, s: &Stmt) -> String {
        match s {
            Stmt::LocalDecl { name, initializer, ty } => {
                let init = initializer.as_ref().map(|e| self.expr(e)).unwrap_or_else(|| default_value(*ty));
                format!("let {name} = {init}")
            }
            Stmt::Assign { target, op, value } => {
                let t = self.expr(target);
                let v = self.expr(value);
                let op_str = match op {
                    AssignOp::Assign => "=",
                    AssignOp::Add => "+=",
                    AssignOp::Sub => "-=",
                    AssignOp::Mul => "*=",
                    AssignOp::Div => "/=",
                    AssignOp::Mod => "%=",
                };
                format!("{t} {op_str} {v}")
            }
            Stmt::Expr(e) => self.expr(e),
            other => {
                self.diagnostics.push(Diagnostic::warn("unsupported statement in for-clause position"));
                format!("{other:?}")
            }
        }
    }

    fn expr(&mut self, e: &Expr) -> String {
        match e {
            Expr::IntegerLiteral(n) => n.to_string(),
            Expr::FloatLiteral(n) => format_float(*n),
            Expr::StringLiteral(s) => format!("{:?}", s),
            Expr::KeyLiteral(s) => format!("{:?}", s),
            Expr::ListLiteral(items) => {
                format!("[{}]", items.iter().map(|e| self.expr(e)).collect::<Vec<_>>().join(", "))
            }
            Expr::VectorLiteral(x, y, z) => {
                format!("{{ x: {}, y: {}, z: {} }}", self.expr(x), self.expr(y), self.expr(z))
            }
            Expr::RotationLiteral(x, y, z, s) => format!(
                "{{ x: {}, y: {}, z: {}, s: {} }}",
                self.expr(x),
                self.expr(y),
                self.expr(z),
                self.expr(s)
            ),
            Expr::Identifier(name) => name.clone(),
            Expr::Call { name, args } => self.call(name, args),
            Expr::Index { base, index } => format!("{}[{}]", self.expr(base), self.expr(index)),
            Expr::Unary { op, expr } => self.unary(*op, expr),
            Expr::Binary { op, lhs, rhs } => self.binary(*op, lhs, rhs),
            Expr::Cast { ty, expr } => self.cast(*ty, expr),
            Expr::Typed { expr, .. } => self.expr(expr),
        }
    }

    fn unary(&mut self, op: UnaryOp, expr: &Expr) -> String {
        let inner = self.expr(expr);
        match op {
            UnaryOp::Neg => format!("-({inner})"),
            UnaryOp::Not => format!("!({inner})"),
            UnaryOp::BitNot => format!("~({inner})"),
            UnaryOp::PreInc => format!("++{inner}"),
            UnaryOp::PreDec => format!("--{inner}"),
            UnaryOp::PostInc => format!("{inner}++"),
            UnaryOp::PostDec => format!("{inner}--"),
        }
    }

    /// Uses the bottom-up pass's per-operand types (see [`Expr::static_type`])
    /// for two decisions the raw AST can't make on its own: list
    /// concatenation renders as array spread rather than JS `+` (which would
    /// stringify a list operand), and `integer / integer` truncates toward
    /// zero like LSL's division rather than producing a JS float.
    fn binary(&mut self, op: BinOp, lhs: &Expr, rhs: &Expr) -> String {
        let lhs_ty = lhs.static_type();
        let rhs_ty = rhs.static_type();
        let l = self.expr(lhs);
        let r = self.expr(rhs);

        if op == BinOp::ListConcat {
            return match (lhs_ty == Some(Type::List), rhs_ty == Some(Type::List)) {
                (true, true) => format!("[...{l}, ...{r}]"),
                (true, false) => format!("[...{l}, {r}]"),
                (false, true) => format!("[{l}, ...{r}]"),
                (false, false) => format!("[{l}, {r}]"),
            };
        }
        if op == BinOp::Div && lhs_ty == Some(Type::Integer) && rhs_ty == Some(Type::Integer) {
            return format!("Math.trunc({l} / {r})");
        }

        let op_str = match op {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Mod => "%",
            BinOp::Eq => "===",
            BinOp::NotEq => "!==",
            BinOp::Less => "<",
            BinOp::LessEq => "<=",
            BinOp::Greater => ">",
            BinOp::GreaterEq => ">=",
            BinOp::And => "&&",
            BinOp::Or => "||",
            BinOp::BitAnd => "&",
            BinOp::BitOr => "|",
            BinOp::BitXor => "^",
            BinOp::Shl => "<<",
            BinOp::Shr => ">>",
            BinOp::ListConcat => unreachable!("handled above"),
        };
        format!("({l} {op_str} {r})")
    }

    fn cast(&mut self, ty: Type, expr: &Expr) -> String {
        let inner = self.expr(expr);
        match ty {
            Type::Integer => format!("Math.trunc({inner})"),
            Type::Float => format!("Number({inner})"),
            Type::String => format!("String({inner})"),
            Type::Key => format!("String({inner})"),
            Type::List => format!("[{inner}]"),
            Type::Vector | Type::Rotation => {
                self.diagnostics.push(Diagnostic::warn(format!("cast to {ty:?} has no lossless TSL equivalent; passed through")));
                inner
            }
            Type::Void => inner,
        }
    }

    fn call(&mut self, name: &str, args: &[Expr]) -> String {
        let rendered_args: Vec<String> = args.iter().map(|a| self.expr(a)).collect();
        if let Some(sig) = self.functions.resolve_builtin(name) {
            let joined = rendered_args.join(", ");
            return match sig.target {
                TargetForm::World => format!("(await this.world.{}({joined}))", sig.tsl_name),
                TargetForm::Object => format!("(await this.object.{}({joined}))", sig.tsl_name),
                TargetForm::Container => format!("(await this.container.{}({joined}))", sig.tsl_name),
                TargetForm::Inline => {
                    if sig.tsl_name.contains('.') {
                        format!("{}({joined})", sig.tsl_name)
                    } else if rendered_args.is_empty() {
                        format!("this.object.{}()", sig.tsl_name)
                    } else if rendered_args.len() == 1 && matches!(sig.tsl_name, "length" | "toUpperCase" | "toLowerCase") {
                        format!("{}.{}", rendered_args[0], sig.tsl_name)
                    } else {
                        format!("{}({joined})", sig.tsl_name)
                    }
                }
            };
        }
        // unresolved built-in-looking call (ll*/os*) vs. user function
        if (name.starts_with("ll") || name.starts_with("os")) && name.chars().nth(2).is_some_and(|c| c.is_uppercase()) {
            self.diagnostics
                .push(Diagnostic::warn(format!("no built-in mapping for '{name}'; emitted as a direct call")));
        }
        format!("(await this.{name}({}))", rendered_args.join(", "))
    }
}

fn format_float(n: f64) -> String {
    if n.fract() == 0.0 && n.is_finite() {
        format!("{n:.1}")
    } else {
        n.to_string()
    }
}
