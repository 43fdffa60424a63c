//! Lexical analysis for the lambda language
//!
//! Converts source text into a stream of tokens. Interpolated strings keep
//! their embedded expressions as raw source which the parser scans again.

mod scanner;
mod token;

pub use scanner::Scanner;
pub use token::{InterpolationPart, Token, TokenKind};
