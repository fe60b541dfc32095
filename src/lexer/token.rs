//! Tokens produced by the [lexer](super).

use std::fmt;

/// A position in the original source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    /// 1-based line number.
    pub line: u32,
    /// 1-based column number.
    pub column: u32,
    /// 0-based absolute byte offset.
    pub offset: u32,
}

impl Position {
    pub(crate) fn new(line: u32, column: u32, offset: u32) -> Self {
        Self { line, column, offset }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// The kind of an LSL keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyword {
    Default,
    State,
    If,
    Else,
    While,
    Do,
    For,
    Jump,
    Return,
    Integer,
    Float,
    String,
    Key,
    List,
    Vector,
    Rotation,
}

impl Keyword {
    pub(crate) fn from_str(s: &str) -> Option<Self> {
        Some(match s {
            "default" => Self::Default,
            "state" => Self::State,
            "if" => Self::If,
            "else" => Self::Else,
            "while" => Self::While,
            "do" => Self::Do,
            "for" => Self::For,
            "jump" => Self::Jump,
            "return" => Self::Return,
            "integer" => Self::Integer,
            "float" => Self::Float,
            "string" => Self::String,
            "key" => Self::Key,
            "list" => Self::List,
            "vector" => Self::Vector,
            "rotation" => Self::Rotation,
            _ => return None,
        })
    }

    /// `true` if this keyword names one of the built-in LSL scalar/composite types.
    pub fn is_type(self) -> bool {
        matches!(
            self,
            Self::Integer | Self::Float | Self::String | Self::Key | Self::List | Self::Vector | Self::Rotation
        )
    }
}

impl fmt::Display for Keyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Default => "default",
            Self::State => "state",
            Self::If => "if",
            Self::Else => "else",
            Self::While => "while",
            Self::Do => "do",
            Self::For => "for",
            Self::Jump => "jump",
            Self::Return => "return",
            Self::Integer => "integer",
            Self::Float => "float",
            Self::String => "string",
            Self::Key => "key",
            Self::List => "list",
            Self::Vector => "vector",
            Self::Rotation => "rotation",
        };
        f.write_str(s)
    }
}

/// Punctuation and operator tokens. `<` and `>` are emitted as plain
/// `Less`/`Greater` punctuators; the parser disambiguates vector/rotation
/// literals from comparisons by lookahead, per spec.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Punctuator {
    OpenParen,
    CloseParen,
    OpenBrace,
    CloseBrace,
    OpenBracket,
    CloseBracket,
    Semicolon,
    Comma,
    Dot,
    Less,
    Greater,
    LessEq,
    GreaterEq,
    Assign,
    Eq,
    NotEq,
    Not,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    PlusAssign,
    MinusAssign,
    StarAssign,
    SlashAssign,
    PercentAssign,
    PlusPlus,
    MinusMinus,
    AndAnd,
    OrOr,
    Amp,
    Pipe,
    Caret,
    Tilde,
    Shl,
    Shr,
    At,
    Colon,
}

impl fmt::Display for Punctuator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use Punctuator::*;
        let s = match self {
            OpenParen => "(",
            CloseParen => ")",
            OpenBrace => "{",
            CloseBrace => "}",
            OpenBracket => "[",
            CloseBracket => "]",
            Semicolon => ";",
            Comma => ",",
            Dot => ".",
            Less => "<",
            Greater => ">",
            LessEq => "<=",
            GreaterEq => ">=",
            Assign => "=",
            Eq => "==",
            NotEq => "!=",
            Not => "!",
            Plus => "+",
            Minus => "-",
            Star => "*",
            Slash => "/",
            Percent => "%",
            PlusAssign => "+=",
            MinusAssign => "-=",
            StarAssign => "*=",
            SlashAssign => "/=",
            PercentAssign => "%=",
            PlusPlus => "++",
            MinusMinus => "--",
            AndAnd => "&&",
            OrOr => "||",
            Amp => "&",
            Pipe => "|",
            Caret => "^",
            Tilde => "~",
            Shl => "<<",
            Shr => ">>",
            At => "@",
            Colon => ":",
        };
        f.write_str(s)
    }
}

/// The payload of a [`Token`].
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    Identifier(String),
    Keyword(Keyword),
    IntegerLiteral(i64),
    FloatLiteral(f64),
    StringLiteral(String),
    Punctuator(Punctuator),
    Eof,
}

/// A single lexical token with its source [`Position`].
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    kind: TokenKind,
    position: Position,
}

impl Token {
    pub(crate) fn new(kind: TokenKind, position: Position) -> Self {
        Self { kind, position }
    }

    /// The token's kind/payload.
    pub fn kind(&self) -> &TokenKind {
        &self.kind
    }

    /// Where this token starts in the source.
    pub fn position(&self) -> Position {
        self.position
    }
}
