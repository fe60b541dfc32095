//! A recursive-descent parser for LSL.
//!
//! Builds the [`crate::ast`] tree while threading two side tables through
//! the walk: a [`TypeTracker`] (static types) and a [`FunctionResolver`]
//! (built-in + user function signatures). Recovers at statement (`;`) and
//! block (`}`) boundaries so a single parse can surface more than one
//! [`ParseError`].

mod error;
pub mod function_resolver;
pub mod type_tracker;

#[cfg(test)]
mod tests;

pub use error::{ParseError, ParseErrors};
pub use function_resolver::FunctionResolver;
pub use type_tracker::TypeTracker;

use crate::ast::*;
use crate::lexer::{Keyword, Position, Punctuator, Token, TokenKind};

/// The result of a successful parse: the AST plus the two side tables
/// built while parsing it.
#[derive(Debug)]
pub struct ParseOutput {
    pub unit: TranslationUnit,
    pub types: TypeTracker,
    pub functions: FunctionResolver,
}

/// Parses a complete token stream into a [`ParseOutput`], or a
/// [`ParseErrors`] collecting every recoverable error found.
pub fn parse(tokens: Vec<Token>) -> Result<ParseOutput, ParseErrors> {
    let mut parser = Parser::new(tokens);
    let unit = parser.parse_translation_unit();
    if parser.errors.is_empty() {
        Ok(ParseOutput {
            unit,
            types: parser.types,
            functions: parser.functions,
        })
    } else {
        Err(ParseErrors(parser.errors))
    }
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    errors: Vec<ParseError>,
    types: TypeTracker,
    functions: FunctionResolver,
}

impl Parser {
    fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            pos: 0,
            errors: Vec::new(),
            types: TypeTracker::new(),
            functions: FunctionResolver::new(),
        }
    }

    // ---- token stream helpers ----

    fn current(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn peek_kind(&self, ahead: usize) -> &TokenKind {
        let idx = (self.pos + ahead).min(self.tokens.len() - 1);
        self.tokens[idx].kind()
    }

    fn position(&self) -> Position {
        self.current().position()
    }

    fn advance(&mut self) -> Token {
        let t = self.current().clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        t
    }

    fn is_eof(&self) -> bool {
        matches!(self.current().kind(), TokenKind::Eof)
    }

    fn describe(kind: &TokenKind) -> String {
        match kind {
            TokenKind::Identifier(s) => format!("identifier '{s}'"),
            TokenKind::Keyword(k) => format!("keyword '{k}'"),
            TokenKind::IntegerLiteral(n) => format!("integer '{n}'"),
            TokenKind::FloatLiteral(n) => format!("float '{n}'"),
            TokenKind::StringLiteral(s) => format!("string \"{s}\""),
            TokenKind::Punctuator(p) => format!("'{p}'"),
            TokenKind::Eof => "end of file".to_string(),
        }
    }

    fn error_here(&mut self, expected: impl Into<String>) {
        let pos = self.position();
        let got = Self::describe(self.current().kind());
        self.errors.push(ParseError::new(pos, expected, got));
    }

    fn expect_punc(&mut self, p: Punctuator) -> bool {
        if matches!(self.current().kind(), TokenKind::Punctuator(x) if *x == p) {
            self.advance();
            true
        } else {
            self.error_here(format!("'{p}'"));
            false
        }
    }

    fn eat_punc(&mut self, p: Punctuator) -> bool {
        if matches!(self.current().kind(), TokenKind::Punctuator(x) if *x == p) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn eat_keyword(&mut self, k: Keyword) -> bool {
        if matches!(self.current().kind(), TokenKind::Keyword(x) if *x == k) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn peek_is_punc(&self, p: Punctuator) -> bool {
        matches!(self.current().kind(), TokenKind::Punctuator(x) if *x == p)
    }

    /// Skips to the next statement boundary (`;` or `}`) for error recovery.
    fn recover_to_boundary(&mut self) {
        loop {
            match self.current().kind() {
                TokenKind::Eof => break,
                TokenKind::Punctuator(Punctuator::Semicolon) => {
                    self.advance();
                    break;
                }
                TokenKind::Punctuator(Punctuator::CloseBrace) => break,
                _ => {
                    self.advance();
                }
            }
        }
    }

    fn ident(&mut self) -> Option<String> {
        if let TokenKind::Identifier(s) = self.current().kind() {
            let s = s.clone();
            self.advance();
            Some(s)
        } else {
            self.error_here("identifier");
            None
        }
    }

    fn type_keyword(&self) -> Option<Type> {
        match self.current().kind() {
            TokenKind::Keyword(Keyword::Integer) => Some(Type::Integer),
            TokenKind::Keyword(Keyword::Float) => Some(Type::Float),
            TokenKind::Keyword(Keyword::String) => Some(Type::String),
            TokenKind::Keyword(Keyword::Key) => Some(Type::Key),
            TokenKind::Keyword(Keyword::List) => Some(Type::List),
            TokenKind::Keyword(Keyword::Vector) => Some(Type::Vector),
            TokenKind::Keyword(Keyword::Rotation) => Some(Type::Rotation),
            _ => None,
        }
    }

    // ---- top level ----

    fn parse_translation_unit(&mut self) -> TranslationUnit {
        let mut globals = Vec::new();
        let mut functions = Vec::new();
        let mut states = Vec::new();
        let mut seen_state_names: Vec<String> = Vec::new();

        while !self.is_eof() {
            if matches!(self.current().kind(), TokenKind::Keyword(Keyword::Default))
                || matches!(self.current().kind(), TokenKind::Keyword(Keyword::State))
            {
                if let Some(state) = self.parse_state_block() {
                    if states.is_empty() && state.name != "default" {
                        let pos = self.position();
                        self.errors
                            .push(ParseError::new(pos, "'default' as the first state", state.name.clone()));
                    }
                    if seen_state_names.contains(&state.name) {
                        let pos = self.position();
                        self.errors
                            .push(ParseError::new(pos, "unique state name", format!("duplicate state '{}'", state.name)));
                    } else {
                        seen_state_names.push(state.name.clone());
                    }
                    states.push(state);
                }
                continue;
            }

            let Some(ty) = self.type_keyword() else {
                self.error_here("a type, 'default', or 'state'");
                self.recover_to_boundary();
                continue;
            };
            self.advance();
            let Some(name) = self.ident() else {
                self.recover_to_boundary();
                continue;
            };

            if self.peek_is_punc(Punctuator::OpenParen) {
                if let Some(f) = self.parse_function_rest(ty, name) {
                    functions.push(f);
                }
            } else {
                let init = if self.eat_punc(Punctuator::Assign) {
                    Some(self.parse_expr(0))
                } else {
                    None
                };
                self.expect_punc(Punctuator::Semicolon);
                self.types.declare(&name, ty);
                globals.push(GlobalVar { name, ty, initializer: init });
            }
        }

        if states.is_empty() {
            let pos = self.position();
            self.errors.push(ParseError::new(pos, "at least one state block", "end of file"));
        }

        TranslationUnit { globals, functions, states }
    }

    fn parse_params(&mut self) -> Vec<Param> {
        let mut params = Vec::new();
        self.expect_punc(Punctuator::OpenParen);
        if !self.peek_is_punc(Punctuator::CloseParen) {
            loop {
                let Some(ty) = self.type_keyword() else {
                    self.error_here("a parameter type");
                    break;
                };
                self.advance();
                if let Some(name) = self.ident() {
                    params.push(Param { name, ty });
                }
                if !self.eat_punc(Punctuator::Comma) {
                    break;
                }
            }
        }
        self.expect_punc(Punctuator::CloseParen);
        params
    }

    fn parse_function_rest(&mut self, return_ty: Type, name: String) -> Option<FunctionDef> {
        let params = self.parse_params();
        self.types.enter_scope();
        for p in &params {
            self.types.declare(&p.name, p.ty);
        }
        let param_types = params.iter().map(|p| p.ty).collect();
        self.functions.declare_user_function(&name, param_types, return_ty);
        let body = self.parse_block();
        self.types.exit_scope();
        Some(FunctionDef { name, return_ty, params, body })
    }

    fn parse_state_block(&mut self) -> Option<StateBlock> {
        let name = if self.eat_keyword(Keyword::Default) {
            "default".to_string()
        } else {
            self.expect_punc_or_keyword_state();
            self.ident().unwrap_or_default()
        };
        self.expect_punc(Punctuator::OpenBrace);
        let mut handlers = Vec::new();
        let mut seen = Vec::new();
        while !self.peek_is_punc(Punctuator::CloseBrace) && !self.is_eof() {
            let Some(event_name) = self.ident() else {
                self.recover_to_boundary();
                continue;
            };
            let params = self.parse_params();
            self.types.enter_scope();
            for p in &params {
                self.types.declare(&p.name, p.ty);
            }
            let body = self.parse_block();
            self.types.exit_scope();
            if seen.contains(&event_name) {
                let pos = self.position();
                self.errors
                    .push(ParseError::new(pos, "unique event handler", format!("duplicate '{event_name}'")));
            } else {
                seen.push(event_name.clone());
            }
            handlers.push(EventHandler { event: event_name, params, body });
        }
        self.expect_punc(Punctuator::CloseBrace);
        Some(StateBlock { name, handlers })
    }

    fn expect_punc_or_keyword_state(&mut self) {
        if !self.eat_keyword(Keyword::State) {
            self.error_here("'state'");
        }
    }

    // ---- statements ----

    fn parse_block(&mut self) -> Vec<Stmt> {
        self.expect_punc(Punctuator::OpenBrace);
        self.types.enter_scope();
        let mut stmts = Vec::new();
        while !self.peek_is_punc(Punctuator::CloseBrace) && !self.is_eof() {
            stmts.push(self.parse_statement());
        }
        self.expect_punc(Punctuator::CloseBrace);
        self.types.exit_scope();
        stmts
    }

    fn parse_statement(&mut self) -> Stmt {
        if self.peek_is_punc(Punctuator::OpenBrace) {
            return Stmt::Block(self.parse_block());
        }
        if let Some(ty) = self.type_keyword() {
            self.advance();
            let name = self.ident().unwrap_or_default();
            let initializer = if self.eat_punc(Punctuator::Assign) {
                Some(self.parse_expr(0))
            } else {
                None
            };
            self.expect_punc(Punctuator::Semicolon);
            self.types.declare(&name, ty);
            return Stmt::LocalDecl { name, ty, initializer };
        }
        if self.eat_keyword(Keyword::If) {
            return self.parse_if();
        }
        if self.eat_keyword(Keyword::While) {
            self.expect_punc(Punctuator::OpenParen);
            let cond = self.parse_expr(0);
            self.expect_punc(Punctuator::CloseParen);
            let body = self.parse_body();
            return Stmt::While { cond, body };
        }
        if self.eat_keyword(Keyword::Do) {
            let body = self.parse_body();
            if !self.eat_keyword(Keyword::While) {
                self.error_here("'while'");
            }
            self.expect_punc(Punctuator::OpenParen);
            let cond = self.parse_expr(0);
            self.expect_punc(Punctuator::CloseParen);
            self.expect_punc(Punctuator::Semicolon);
            return Stmt::DoWhile { body, cond };
        }
        if self.eat_keyword(Keyword::For) {
            return self.parse_for();
        }
        if self.eat_keyword(Keyword::Return) {
            let value = if self.peek_is_punc(Punctuator::Semicolon) {
                None
            } else {
                Some(self.parse_expr(0))
            };
            self.expect_punc(Punctuator::Semicolon);
            return Stmt::Return(value);
        }
        if self.eat_keyword(Keyword::State) {
            let name = self.ident().unwrap_or_default();
            self.expect_punc(Punctuator::Semicolon);
            return Stmt::ChangeState(name);
        }
        if self.eat_keyword(Keyword::Jump) {
            let name = self.ident().unwrap_or_default();
            self.expect_punc(Punctuator::Semicolon);
            return Stmt::Jump(name);
        }
        // label: IDENT ':'
        if let TokenKind::Identifier(name) = self.current().kind().clone() {
            if matches!(self.peek_kind(1), TokenKind::Punctuator(Punctuator::Colon)) {
                self.advance();
                self.advance();
                return Stmt::Label(name);
            }
        }

        // assignment or expression statement
        let expr = self.parse_expr(0);
        if let Some(op) = self.assign_op_here() {
            self.advance();
            let value = self.parse_expr(0);
            self.expect_punc(Punctuator::Semicolon);
            return Stmt::Assign { target: expr, op, value };
        }
        self.expect_punc(Punctuator::Semicolon);
        Stmt::Expr(expr)
    }

    fn assign_op_here(&self) -> Option<AssignOp> {
        match self.current().kind() {
            TokenKind::Punctuator(Punctuator::Assign) => Some(AssignOp::Assign),
            TokenKind::Punctuator(Punctuator::PlusAssign) => Some(AssignOp::Add),
            TokenKind::Punctuator(Punctuator::MinusAssign) => Some(AssignOp::Sub),
            TokenKind::Punctuator(Punctuator::StarAssign) => Some(AssignOp::Mul),
            TokenKind::Punctuator(Punctuator::SlashAssign) => Some(AssignOp::Div),
            TokenKind::Punctuator(Punctuator::PercentAssign) => Some(AssignOp::Mod),
            _ => None,
        }
    }

    /// A loop/if body: either a `{ }` block, or a single statement (which
    /// C7's sandbox transform later requires to be wrapped into a block).
    fn parse_body(&mut self) -> Vec<Stmt> {
        if self.peek_is_punc(Punctuator::OpenBrace) {
            self.parse_block()
        } else {
            vec![self.parse_statement()]
        }
    }

    fn parse_if(&mut self) -> Stmt {
        self.expect_punc(Punctuator::OpenParen);
        let cond = self.parse_expr(0);
        self.expect_punc(Punctuator::CloseParen);
        let then_branch = self.parse_body();
        let else_branch = if self.eat_keyword(Keyword::Else) {
            Some(self.parse_body())
        } else {
            None
        };
        Stmt::If { cond, then_branch, else_branch }
    }

    fn parse_for(&mut self) -> Stmt {
        self.expect_punc(Punctuator::OpenParen);
        let mut init = Vec::new();
        if !self.peek_is_punc(Punctuator::Semicolon) {
            loop {
                init.push(self.parse_for_clause_stmt());
                if !self.eat_punc(Punctuator::Comma) {
                    break;
                }
            }
        }
        self.expect_punc(Punctuator::Semicolon);
        let cond = if self.peek_is_punc(Punctuator::Semicolon) {
            None
        } else {
            Some(self.parse_expr(0))
        };
        self.expect_punc(Punctuator::Semicolon);
        let mut step = Vec::new();
        if !self.peek_is_punc(Punctuator::CloseParen) {
            loop {
                step.push(self.parse_for_clause_stmt());
                if !self.eat_punc(Punctuator::Comma) {
                    break;
                }
            }
        }
        self.expect_punc(Punctuator::CloseParen);
        let body = self.parse_body();
        Stmt::For { init, cond, step, body }
    }

    /// A bare assignment/declaration/expression inside a `for(...)` clause, without the trailing `;`.
    fn parse_for_clause_stmt(&mut self) -> Stmt {
        if let Some(ty) = self.type_keyword() {
            self.advance();
            let name = self.ident().unwrap_or_default();
            let initializer = if self.eat_punc(Punctuator::Assign) {
                Some(self.parse_expr(0))
            } else {
                None
            };
            self.types.declare(&name, ty);
            return Stmt::LocalDecl { name, ty, initializer };
        }
        let expr = self.parse_expr(0);
        if let Some(op) = self.assign_op_here() {
            self.advance();
            let value = self.parse_expr(0);
            return Stmt::Assign { target: expr, op, value };
        }
        Stmt::Expr(expr)
    }

    // ---- expressions (precedence climbing) ----

    fn binop_here(&self) -> Option<(BinOp, u8)> {
        use Punctuator::*;
        let tk = match self.current().kind() {
            TokenKind::Punctuator(p) => *p,
            _ => return None,
        };
        Some(match tk {
            OrOr => (BinOp::Or, 1),
            AndAnd => (BinOp::And, 2),
            Pipe => (BinOp::BitOr, 3),
            Caret => (BinOp::BitXor, 4),
            Amp => (BinOp::BitAnd, 5),
            Eq => (BinOp::Eq, 6),
            NotEq => (BinOp::NotEq, 6),
            Less => (BinOp::Less, 7),
            LessEq => (BinOp::LessEq, 7),
            Greater => (BinOp::Greater, 7),
            GreaterEq => (BinOp::GreaterEq, 7),
            Shl => (BinOp::Shl, 8),
            Shr => (BinOp::Shr, 8),
            Plus => (BinOp::Add, 9),
            Minus => (BinOp::Sub, 9),
            Star => (BinOp::Mul, 10),
            Slash => (BinOp::Div, 10),
            Percent => (BinOp::Mod, 10),
            _ => return None,
        })
    }

    fn parse_expr(&mut self, min_prec: u8) -> Expr {
        let mut lhs = self.parse_unary();
        while let Some((op, prec)) = self.binop_here() {
            if prec < min_prec {
                break;
            }
            self.advance();
            let rhs = self.parse_expr(prec + 1);
            lhs = self.build_binary(op, lhs, rhs);
        }
        lhs
    }

    /// Bottom-up: resolves the already-computed operand types (lower nodes
    /// are typed first, since they're built first) to pick `+` vs. list
    /// `ListConcat` and to annotate the result with its own type. Operands
    /// the pass couldn't type (currently only list-element access) leave the
    /// result untyped too, rather than guessing.
    fn build_binary(&self, op: BinOp, lhs: Expr, rhs: Expr) -> Expr {
        let lhs_ty = lhs.static_type();
        let rhs_ty = rhs.static_type();
        let op = if op == BinOp::Add && (matches!(lhs_ty, Some(Type::List)) || matches!(rhs_ty, Some(Type::List))) {
            BinOp::ListConcat
        } else {
            op
        };
        let binary = Expr::Binary { op, lhs: Box::new(lhs), rhs: Box::new(rhs) };
        match (lhs_ty, rhs_ty) {
            (Some(l), Some(r)) => Expr::Typed { ty: TypeTracker::binary_result_type(op, l, r), expr: Box::new(binary) },
            _ => binary,
        }
    }

    /// Propagates the operand's type to the result, except `!` which always
    /// yields LSL's boolean-as-integer.
    fn build_unary(&self, op: UnaryOp, expr: Expr) -> Expr {
        let ty = match op {
            UnaryOp::Not => Some(Type::Integer),
            _ => expr.static_type(),
        };
        let unary = Expr::Unary { op, expr: Box::new(expr) };
        match ty {
            Some(ty) => Expr::Typed { ty, expr: Box::new(unary) },
            None => unary,
        }
    }

    fn parse_unary(&mut self) -> Expr {
        if self.eat_punc(Punctuator::Minus) {
            let expr = self.parse_unary();
            return self.build_unary(UnaryOp::Neg, expr);
        }
        if self.eat_punc(Punctuator::Not) {
            let expr = self.parse_unary();
            return self.build_unary(UnaryOp::Not, expr);
        }
        if self.eat_punc(Punctuator::Tilde) {
            let expr = self.parse_unary();
            return self.build_unary(UnaryOp::BitNot, expr);
        }
        if self.eat_punc(Punctuator::PlusPlus) {
            let expr = self.parse_unary();
            return self.build_unary(UnaryOp::PreInc, expr);
        }
        if self.eat_punc(Punctuator::MinusMinus) {
            let expr = self.parse_unary();
            return self.build_unary(UnaryOp::PreDec, expr);
        }
        // explicit cast: `(integer) expr`
        if self.peek_is_punc(Punctuator::OpenParen) {
            if let Some(ty) = self.cast_lookahead() {
                self.advance(); // (
                self.advance(); // type keyword
                self.expect_punc(Punctuator::CloseParen);
                let expr = self.parse_unary();
                return Expr::Typed { ty, expr: Box::new(Expr::Cast { ty, expr: Box::new(expr) }) };
            }
        }
        self.parse_postfix()
    }

    /// `(` TYPE `)` lookahead for an explicit cast, without consuming on failure.
    fn cast_lookahead(&self) -> Option<Type> {
        if !matches!(self.peek_kind(0), TokenKind::Punctuator(Punctuator::OpenParen)) {
            return None;
        }
        let ty = match self.peek_kind(1) {
            TokenKind::Keyword(Keyword::Integer) => Type::Integer,
            TokenKind::Keyword(Keyword::Float) => Type::Float,
            TokenKind::Keyword(Keyword::String) => Type::String,
            TokenKind::Keyword(Keyword::Key) => Type::Key,
            TokenKind::Keyword(Keyword::List) => Type::List,
            TokenKind::Keyword(Keyword::Vector) => Type::Vector,
            TokenKind::Keyword(Keyword::Rotation) => Type::Rotation,
            _ => return None,
        };
        if matches!(self.peek_kind(2), TokenKind::Punctuator(Punctuator::CloseParen)) {
            Some(ty)
        } else {
            None
        }
    }

    fn parse_postfix(&mut self) -> Expr {
        let mut expr = self.parse_primary();
        loop {
            if self.eat_punc(Punctuator::PlusPlus) {
                expr = self.build_unary(UnaryOp::PostInc, expr);
            } else if self.eat_punc(Punctuator::MinusMinus) {
                expr = self.build_unary(UnaryOp::PostDec, expr);
            } else if self.eat_punc(Punctuator::OpenBracket) {
                let index = self.parse_expr(0);
                self.expect_punc(Punctuator::CloseBracket);
                expr = Expr::Index { base: Box::new(expr), index: Box::new(index) };
            } else {
                break;
            }
        }
        expr
    }

    fn parse_primary(&mut self) -> Expr {
        match self.current().kind().clone() {
            TokenKind::IntegerLiteral(n) => {
                self.advance();
                Expr::Typed { ty: Type::Integer, expr: Box::new(Expr::IntegerLiteral(n)) }
            }
            TokenKind::FloatLiteral(n) => {
                self.advance();
                Expr::Typed { ty: Type::Float, expr: Box::new(Expr::FloatLiteral(n)) }
            }
            TokenKind::StringLiteral(s) => {
                self.advance();
                Expr::Typed { ty: Type::String, expr: Box::new(Expr::StringLiteral(s)) }
            }
            TokenKind::Identifier(name) => {
                self.advance();
                if self.eat_punc(Punctuator::OpenParen) {
                    let mut args = Vec::new();
                    if !self.peek_is_punc(Punctuator::CloseParen) {
                        loop {
                            args.push(self.parse_expr(0));
                            if !self.eat_punc(Punctuator::Comma) {
                                break;
                            }
                        }
                    }
                    self.expect_punc(Punctuator::CloseParen);
                    let return_ty = self
                        .functions
                        .resolve_builtin(&name)
                        .map(|sig| sig.return_ty)
                        .or_else(|| self.functions.resolve_user(&name).map(|sig| sig.return_ty));
                    let call = Expr::Call { name, args };
                    match return_ty {
                        Some(Type::Void) | None => call,
                        Some(ty) => Expr::Typed { ty, expr: Box::new(call) },
                    }
                } else {
                    let ty = self.types.lookup(&name);
                    let ident = Expr::Identifier(name);
                    match ty {
                        Some(ty) => Expr::Typed { ty, expr: Box::new(ident) },
                        None => ident,
                    }
                }
            }
            TokenKind::Punctuator(Punctuator::OpenParen) => {
                self.advance();
                let expr = self.parse_expr(0);
                self.expect_punc(Punctuator::CloseParen);
                expr
            }
            TokenKind::Punctuator(Punctuator::OpenBracket) => self.parse_list_literal(),
            TokenKind::Punctuator(Punctuator::Less) => self.parse_angle_literal(),
            _ => {
                self.error_here("an expression");
                self.advance();
                Expr::Typed { ty: Type::Integer, expr: Box::new(Expr::IntegerLiteral(0)) }
            }
        }
    }

    fn parse_list_literal(&mut self) -> Expr {
        self.advance(); // [
        let mut items = Vec::new();
        if !self.peek_is_punc(Punctuator::CloseBracket) {
            loop {
                items.push(self.parse_expr(0));
                if !self.eat_punc(Punctuator::Comma) {
                    break;
                }
            }
        }
        self.expect_punc(Punctuator::CloseBracket);
        Expr::Typed { ty: Type::List, expr: Box::new(Expr::ListLiteral(items)) }
    }

    /// Parses `<a, b, c>` (vector) or `<a, b, c, d>` (rotation). Per spec,
    /// this form is only reached when an expression was expected, so no
    /// further disambiguation against `<` comparison is needed here.
    fn parse_angle_literal(&mut self) -> Expr {
        let start = self.position();
        self.advance(); // <
        let mut items = vec![self.parse_expr(8)]; // above comparison precedence (7) so inner `<`/`>` doesn't get eaten
        while self.eat_punc(Punctuator::Comma) {
            items.push(self.parse_expr(8));
        }
        if !self.eat_punc(Punctuator::Greater) {
            self.error_here("'>' closing a vector/rotation literal");
        }
        match items.len() {
            3 => {
                let mut it = items.into_iter();
                let vector = Expr::VectorLiteral(
                    Box::new(it.next().unwrap()),
                    Box::new(it.next().unwrap()),
                    Box::new(it.next().unwrap()),
                );
                Expr::Typed { ty: Type::Vector, expr: Box::new(vector) }
            }
            4 => {
                let mut it = items.into_iter();
                let rotation = Expr::RotationLiteral(
                    Box::new(it.next().unwrap()),
                    Box::new(it.next().unwrap()),
                    Box::new(it.next().unwrap()),
                    Box::new(it.next().unwrap()),
                );
                Expr::Typed { ty: Type::Rotation, expr: Box::new(rotation) }
            }
            n => {
                self.errors
                    .push(ParseError::new(start, "3 or 4 components", format!("{n} components")));
                let vector =
                    Expr::VectorLiteral(Box::new(Expr::FloatLiteral(0.0)), Box::new(Expr::FloatLiteral(0.0)), Box::new(Expr::FloatLiteral(0.0)));
                Expr::Typed { ty: Type::Vector, expr: Box::new(vector) }
            }
        }
    }
}
