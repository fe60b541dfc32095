//! A lexical analyzer for LSL source code.
//!
//! Splits LSL source text into a stream of [`Token`]s, tracking line/column
//! position for every one. Whitespace and comments (`//` and `/* */`) are
//! consumed and discarded.

mod error;
mod token;

#[cfg(test)]
mod tests;

pub use error::LexError;
pub use token::{Keyword, Position, Punctuator, Token, TokenKind};

use std::iter::Peekable;
use std::str::Chars;

/// Turns LSL source text into a vector of [`Token`]s.
pub struct Lexer<'a> {
    chars: Peekable<Chars<'a>>,
    line: u32,
    column: u32,
    offset: u32,
}

impl<'a> Lexer<'a> {
    /// Creates a new lexer over `source`.
    pub fn new(source: &'a str) -> Self {
        Self {
            chars: source.chars().peekable(),
            line: 1,
            column: 1,
            offset: 0,
        }
    }

    /// Lexes the entire input, returning the token stream terminated by
    /// [`TokenKind::Eof`], or the first [`LexError`] encountered.
    pub fn tokenize(mut self) -> Result<Vec<Token>, LexError> {
        let mut tokens = Vec::new();
        loop {
            self.skip_whitespace_and_comments()?;
            let pos = self.pos();
            let Some(c) = self.peek() else {
                tokens.push(Token::new(TokenKind::Eof, pos));
                break;
            };
            let tok = if c.is_ascii_digit() {
                self.read_number(pos)?
            } else if c == '"' {
                self.read_string(pos)?
            } else if is_ident_start(c) {
                self.read_identifier(pos)
            } else {
                self.read_punctuator(pos)?
            };
            tokens.push(tok);
        }
        Ok(tokens)
    }

    fn pos(&self) -> Position {
        Position::new(self.line, self.column, self.offset)
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().copied()
    }

    fn peek_at(&self, n: usize) -> Option<char> {
        self.chars.clone().nth(n)
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.chars.next()?;
        self.offset += c.len_utf8() as u32;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn skip_whitespace_and_comments(&mut self) -> Result<(), LexError> {
        loop {
            match self.peek() {
                Some(c) if c.is_whitespace() => {
                    self.advance();
                }
                Some('/') if self.peek_at(1) == Some('/') => {
                    while !matches!(self.peek(), None | Some('\n')) {
                        self.advance();
                    }
                }
                Some('/') if self.peek_at(1) == Some('*') => {
                    let start = self.pos();
                    self.advance();
                    self.advance();
                    loop {
                        match self.peek() {
                            None => return Err(LexError::new(start, "unterminated block comment")),
                            Some('*') if self.peek_at(1) == Some('/') => {
                                self.advance();
                                self.advance();
                                break;
                            }
                            Some(_) => {
                                self.advance();
                            }
                        }
                    }
                }
                _ => break,
            }
        }
        Ok(())
    }

    fn read_identifier(&mut self, pos: Position) -> Token {
        let mut s = String::new();
        while let Some(c) = self.peek() {
            if is_ident_continue(c) {
                s.push(c);
                self.advance();
            } else {
                break;
            }
        }
        let kind = match Keyword::from_str(&s) {
            Some(kw) => TokenKind::Keyword(kw),
            None => TokenKind::Identifier(s),
        };
        Token::new(kind, pos)
    }

    fn read_number(&mut self, pos: Position) -> Result<Token, LexError> {
        if self.peek() == Some('0') && matches!(self.peek_at(1), Some('x') | Some('X')) {
            self.advance();
            self.advance();
            let mut digits = String::new();
            while let Some(c) = self.peek() {
                if c.is_ascii_hexdigit() {
                    digits.push(c);
                    self.advance();
                } else {
                    break;
                }
            }
            if digits.is_empty() {
                return Err(LexError::new(pos, "expected hex digits after 0x"));
            }
            let value = i64::from_str_radix(&digits, 16)
                .map_err(|_| LexError::new(pos, "hex literal out of range"))?;
            return Ok(Token::new(TokenKind::IntegerLiteral(value), pos));
        }

        let mut s = String::new();
        while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
            s.push(self.advance().unwrap());
        }

        let mut is_float = false;
        if self.peek() == Some('.') && matches!(self.peek_at(1), Some(c) if c.is_ascii_digit()) {
            is_float = true;
            s.push(self.advance().unwrap());
            while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
                s.push(self.advance().unwrap());
            }
        }
        if matches!(self.peek(), Some('e') | Some('E')) {
            let mut lookahead = 1;
            if matches!(self.peek_at(1), Some('+') | Some('-')) {
                lookahead = 2;
            }
            if matches!(self.peek_at(lookahead), Some(c) if c.is_ascii_digit()) {
                is_float = true;
                s.push(self.advance().unwrap());
                if matches!(self.peek(), Some('+') | Some('-')) {
                    s.push(self.advance().unwrap());
                }
                while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
                    s.push(self.advance().unwrap());
                }
            }
        }
        // trailing `f` suffix, e.g. `1f`
        if self.peek() == Some('f') || self.peek() == Some('F') {
            is_float = true;
            self.advance();
        }

        if is_float {
            let value: f64 = s.parse().map_err(|_| LexError::new(pos, "invalid float literal"))?;
            Ok(Token::new(TokenKind::FloatLiteral(value), pos))
        } else {
            let value: i64 = s.parse().map_err(|_| LexError::new(pos, "invalid integer literal"))?;
            Ok(Token::new(TokenKind::IntegerLiteral(value), pos))
        }
    }

    fn read_string(&mut self, pos: Position) -> Result<Token, LexError> {
        self.advance(); // opening quote
        let mut s = String::new();
        loop {
            match self.advance() {
                None => return Err(LexError::new(pos, "unterminated string literal")),
                Some('"') => break,
                Some('\\') => match self.advance() {
                    Some('n') => s.push('\n'),
                    Some('t') => s.push('\t'),
                    Some('"') => s.push('"'),
                    Some('\\') => s.push('\\'),
                    Some(other) => {
                        return Err(LexError::new(pos, format!("invalid escape sequence '\\{other}'")))
                    }
                    None => return Err(LexError::new(pos, "unterminated string literal")),
                },
                Some(c) => s.push(c),
            }
        }
        Ok(Token::new(TokenKind::StringLiteral(s), pos))
    }

    fn read_punctuator(&mut self, pos: Position) -> Result<Token, LexError> {
        use Punctuator::*;
        let c = self.advance().unwrap();
        let punc = match c {
            '(' => OpenParen,
            ')' => CloseParen,
            '{' => OpenBrace,
            '}' => CloseBrace,
            '[' => OpenBracket,
            ']' => CloseBracket,
            ';' => Semicolon,
            ',' => Comma,
            '.' => Dot,
            '@' => At,
            ':' => Colon,
            '~' => Tilde,
            '<' => self.two_char('=', LessEq, Less),
            '>' => self.two_char('=', GreaterEq, Greater),
            '=' => self.two_char('=', Eq, Assign),
            '!' => self.two_char('=', NotEq, Not),
            '+' => {
                if self.peek() == Some('+') {
                    self.advance();
                    PlusPlus
                } else {
                    self.two_char('=', PlusAssign, Plus)
                }
            }
            '-' => {
                if self.peek() == Some('-') {
                    self.advance();
                    MinusMinus
                } else {
                    self.two_char('=', MinusAssign, Minus)
                }
            }
            '*' => self.two_char('=', StarAssign, Star),
            '/' => self.two_char('=', SlashAssign, Slash),
            '%' => self.two_char('=', PercentAssign, Percent),
            '&' => {
                if self.peek() == Some('&') {
                    self.advance();
                    AndAnd
                } else {
                    Amp
                }
            }
            '|' => {
                if self.peek() == Some('|') {
                    self.advance();
                    OrOr
                } else {
                    Pipe
                }
            }
            '^' => Caret,
            other => return Err(LexError::new(pos, format!("unexpected character '{other}'"))),
        };
        Ok(Token::new(TokenKind::Punctuator(punc), pos))
    }

    fn two_char(&mut self, follow: char, yes: Punctuator, no: Punctuator) -> Punctuator {
        if self.peek() == Some(follow) {
            self.advance();
            yes
        } else {
            no
        }
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_ident_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Convenience entry point: lex `source` into a complete token stream.
pub fn lex(source: &str) -> Result<Vec<Token>, LexError> {
    Lexer::new(source).tokenize()
}
