use serde::{Deserialize, Serialize};

/// A single token from the source code
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    /// The type of token
    pub kind: TokenKind,
    /// Original text of the token
    pub lexeme: String,
    /// Line number where token appears (1-indexed)
    pub line: usize,
    /// Column number where token starts (1-indexed)
    pub column: usize,
}

impl Token {
    /// Creates a new token with the given properties
    pub fn new(kind: TokenKind, lexeme: String, line: usize, column: usize) -> Self {
        Token {
            kind,
            lexeme,
            line,
            column,
        }
    }
}

/// One piece of an interpolated string literal (`$"Hello {name}"`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum InterpolationPart {
    /// Literal text with escapes already resolved
    Text(String),
    /// Raw source of an embedded expression, with its position
    Hole {
        /// Expression source between the braces
        source: String,
        /// Line where the hole starts
        line: usize,
        /// Column where the hole starts
        column: usize,
    },
}

/// All possible token types in the lambda language
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TokenKind {
    // Literals
    /// Integer literal
    Integer(i64),
    /// Floating-point literal
    Float(f64),
    /// String literal
    String(String),
    /// Interpolated string literal
    InterpolatedString(Vec<InterpolationPart>),
    /// Boolean true literal
    True,
    /// Boolean false literal
    False,
    /// Null literal
    Null,

    /// Identifier
    Identifier(String),

    // Keywords
    /// `if`
    If,
    /// `else`
    Else,
    /// `return`
    Return,
    /// `new`
    New,

    // Operators
    /// Plus operator (+)
    Plus,
    /// Minus operator (-)
    Minus,
    /// Star operator (*)
    Star,
    /// Slash operator (/)
    Slash,
    /// Percent operator (%)
    Percent,
    /// Equality operator (==)
    Eq,
    /// Inequality operator (!=)
    NotEq,
    /// Less than operator (<)
    Lt,
    /// Greater than operator (>)
    Gt,
    /// Less than or equal operator (<=)
    LtEq,
    /// Greater than or equal operator (>=)
    GtEq,
    /// Logical AND operator (&&)
    And,
    /// Logical OR operator (||)
    Or,
    /// Logical NOT operator (!)
    Not,
    /// Assignment operator (=)
    Assign,
    /// Plus-assign operator (+=)
    PlusAssign,
    /// Minus-assign operator (-=)
    MinusAssign,
    /// Star-assign operator (*=)
    StarAssign,
    /// Slash-assign operator (/=)
    SlashAssign,
    /// Percent-assign operator (%=)
    PercentAssign,
    /// Question mark operator (?)
    Question,
    /// Colon (:)
    Colon,
    /// Null-conditional member access (?.)
    QuestionDot,
    /// Null coalescing operator (??)
    QuestionQuestion,
    /// Lambda introducer (=>)
    FatArrow,

    // Delimiters
    /// Left parenthesis (
    LeftParen,
    /// Right parenthesis )
    RightParen,
    /// Left brace {
    LeftBrace,
    /// Right brace }
    RightBrace,
    /// Left bracket [
    LeftBracket,
    /// Right bracket ]
    RightBracket,
    /// Comma delimiter
    Comma,
    /// Dot operator
    Dot,
    /// Semicolon delimiter
    Semicolon,

    // Special
    /// End of input marker
    Eof,
}

impl TokenKind {
    /// Check if token is a keyword
    pub fn is_keyword(&self) -> bool {
        matches!(
            self,
            TokenKind::If | TokenKind::Else | TokenKind::Return | TokenKind::New
        )
    }

    /// Get keyword from string. Declaration words such as `var`, `let`, `fn`,
    /// `class` and `namespace` are contextual and stay identifiers.
    pub fn keyword(s: &str) -> Option<TokenKind> {
        match s {
            "if" => Some(TokenKind::If),
            "else" => Some(TokenKind::Else),
            "return" => Some(TokenKind::Return),
            "new" => Some(TokenKind::New),
            _ => None,
        }
    }
}

impl std::fmt::Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            TokenKind::Integer(n) => write!(f, "{}", n),
            TokenKind::Float(fl) => write!(f, "{}", fl),
            TokenKind::String(s) => write!(f, "\"{}\"", s),
            TokenKind::Identifier(id) => write!(f, "{}", id),
            _ => write!(f, "{:?}", self),
        }
    }
}
