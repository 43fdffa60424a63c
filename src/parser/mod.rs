//! Lambda-language parser
//!
//! Parses function literals and compilation units into an AST, and prints
//! them back canonically.

mod ast;
#[allow(clippy::module_inception)]
mod parser;
mod printer;

pub use ast::{
    AssignTarget, BinaryOp, ClassDecl, CompilationUnit, Expression, InterpolatedSegment, Lambda,
    LambdaBody, MemberDecl, NamespaceDecl, Precedence, Statement, TypeRef, UnaryOp,
};
pub use parser::{Parser, MAX_NESTING};
pub use printer::{print_expression, print_lambda};

use crate::error::Result;
use crate::lexer::Scanner;

/// Scans and parses a standalone expression
pub fn parse_expression(source: &str) -> Result<Expression> {
    let tokens = Scanner::new(source).scan_tokens()?;
    Parser::new(tokens).parse_standalone_expression()
}

/// Scans and parses a compilation unit
pub fn parse_unit(source: &str) -> Result<CompilationUnit> {
    let tokens = Scanner::new(source).scan_tokens()?;
    Parser::new(tokens).parse_unit()
}
