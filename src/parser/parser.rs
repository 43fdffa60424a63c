use super::ast::{
    AssignTarget, BinaryOp, ClassDecl, CompilationUnit, Expression, InterpolatedSegment, Lambda,
    LambdaBody, MemberDecl, NamespaceDecl, Precedence, Statement, TypeRef, UnaryOp,
};
use crate::error::{Error, Result};
use crate::lexer::{InterpolationPart, Scanner, Token, TokenKind};

/// Deepest nesting of expressions, statements and operator chains the
/// parser accepts. Deeper input is a syntax error rather than a stack overflow.
pub const MAX_NESTING: usize = 100;

/// Recursive-descent parser for lambda expressions and compilation units
pub struct Parser {
    tokens: Vec<Token>,
    current: usize,
    depth: usize,
}

impl Parser {
    /// Creates a new parser over scanned tokens
    pub fn new(tokens: Vec<Token>) -> Self {
        Parser {
            tokens,
            current: 0,
            depth: 0,
        }
    }

    /// Parses a whole compilation unit (`namespace ... { class ... { ... } }`)
    pub fn parse_unit(&mut self) -> Result<CompilationUnit> {
        let mut namespaces = Vec::new();

        while !self.is_at_end() {
            namespaces.push(self.parse_namespace()?);
        }

        Ok(CompilationUnit { namespaces })
    }

    /// Parses a single expression that must span the whole input
    pub fn parse_standalone_expression(&mut self) -> Result<Expression> {
        let expr = self.parse_expression()?;
        if !self.is_at_end() {
            return Err(self.syntax_error(format!(
                "Unexpected {} after end of expression",
                Self::token_kind_name(&self.peek().kind)
            )));
        }
        Ok(expr)
    }

    // ---------------------------------------------------------------------
    // Units
    // ---------------------------------------------------------------------

    fn parse_namespace(&mut self) -> Result<NamespaceDecl> {
        self.expect_word("namespace")?;

        let mut name = self.expect_identifier()?;
        while self.match_kind(&TokenKind::Dot) {
            name.push('.');
            name.push_str(&self.expect_identifier()?);
        }

        self.consume(TokenKind::LeftBrace)?;
        let mut classes = Vec::new();
        while !self.check(&TokenKind::RightBrace) && !self.is_at_end() {
            classes.push(self.parse_class()?);
        }
        self.consume(TokenKind::RightBrace)?;

        Ok(NamespaceDecl { name, classes })
    }

    fn parse_class(&mut self) -> Result<ClassDecl> {
        let keyword = self.expect_word("class")?;
        let name = self.expect_identifier()?;

        self.consume(TokenKind::LeftBrace)?;
        let mut members = Vec::new();
        while !self.check(&TokenKind::RightBrace) && !self.is_at_end() {
            members.push(self.parse_member()?);
        }
        self.consume(TokenKind::RightBrace)?;

        Ok(ClassDecl {
            name,
            members,
            line: keyword.line,
            column: keyword.column,
        })
    }

    fn parse_member(&mut self) -> Result<MemberDecl> {
        let (line, column) = (self.peek().line, self.peek().column);

        if self.match_word("let") {
            let name = self.expect_identifier()?;
            let ty = if self.match_kind(&TokenKind::Colon) {
                Some(self.parse_type()?)
            } else {
                None
            };
            self.consume(TokenKind::Assign)?;
            let value = self.parse_expression()?;
            self.consume(TokenKind::Semicolon)?;

            return Ok(MemberDecl::Field {
                name,
                ty,
                value,
                line,
                column,
            });
        }

        if self.match_word("fn") {
            let name = self.expect_identifier()?;
            let params = self
                .parse_param_list(false)?
                .into_iter()
                .map(|(_, name)| name)
                .collect();
            self.consume(TokenKind::FatArrow)?;
            let body = self.parse_lambda_body()?;
            match body {
                LambdaBody::Expression(_) => {
                    self.consume(TokenKind::Semicolon)?;
                }
                LambdaBody::Block(_) => {
                    self.match_kind(&TokenKind::Semicolon);
                }
            }

            return Ok(MemberDecl::Method {
                name,
                params,
                body,
                line,
                column,
            });
        }

        Err(self.syntax_error(format!(
            "Expected member declaration (`let` or `fn`), found {}",
            Self::token_kind_name(&self.peek().kind)
        )))
    }

    fn parse_type(&mut self) -> Result<TypeRef> {
        let name = self.expect_identifier()?;
        let mut args = Vec::new();

        if self.match_kind(&TokenKind::Lt) {
            loop {
                args.push(self.parse_type()?);
                if !self.match_kind(&TokenKind::Comma) {
                    break;
                }
            }
            self.consume(TokenKind::Gt)?;
        }

        Ok(TypeRef { name, args })
    }

    // ---------------------------------------------------------------------
    // Lambdas and statements
    // ---------------------------------------------------------------------

    /// True when the upcoming tokens start a function literal:
    /// `x =>`, `() =>` or `(a, b) =>`
    fn lambda_ahead(&self) -> bool {
        match &self.peek().kind {
            TokenKind::Identifier(_) => {
                matches!(self.kind_at(1), Some(TokenKind::FatArrow))
            }
            TokenKind::LeftParen => {
                let mut offset = 1;
                if matches!(self.kind_at(offset), Some(TokenKind::RightParen)) {
                    return matches!(self.kind_at(offset + 1), Some(TokenKind::FatArrow));
                }
                loop {
                    if !matches!(self.kind_at(offset), Some(TokenKind::Identifier(_))) {
                        return false;
                    }
                    offset += 1;
                    // typed parameter: `int a`
                    if matches!(self.kind_at(offset), Some(TokenKind::Identifier(_))) {
                        offset += 1;
                    }
                    match self.kind_at(offset) {
                        Some(TokenKind::Comma) => offset += 1,
                        Some(TokenKind::RightParen) => {
                            return matches!(self.kind_at(offset + 1), Some(TokenKind::FatArrow))
                        }
                        _ => return false,
                    }
                }
            }
            _ => false,
        }
    }

    fn parse_lambda(&mut self) -> Result<Lambda> {
        let (typed, parenthesized) = if self.check(&TokenKind::LeftParen) {
            (self.parse_param_list(true)?, true)
        } else {
            (vec![(None, self.expect_identifier()?)], false)
        };
        let (param_types, params) = typed.into_iter().unzip();

        self.consume(TokenKind::FatArrow)?;
        let body = self.parse_lambda_body()?;

        Ok(Lambda {
            params,
            param_types,
            parenthesized,
            body,
        })
    }

    /// `(a, b)`, or with `allow_types` also `(int a, string b)`
    fn parse_param_list(&mut self, allow_types: bool) -> Result<Vec<(Option<String>, String)>> {
        self.consume(TokenKind::LeftParen)?;
        let mut params: Vec<(Option<String>, String)> = Vec::new();

        if !self.check(&TokenKind::RightParen) {
            loop {
                let first = self.expect_identifier()?;
                let (type_name, name) = match self.peek().kind {
                    TokenKind::Identifier(_) if allow_types => {
                        (Some(first), self.expect_identifier()?)
                    }
                    _ => (None, first),
                };
                if params.iter().any(|(_, existing)| *existing == name) {
                    return Err(self.syntax_error(format!(
                        "A parameter named '{}' is a duplicate",
                        name
                    )));
                }
                params.push((type_name, name));
                if !self.match_kind(&TokenKind::Comma) {
                    break;
                }
            }
        }

        self.consume(TokenKind::RightParen)?;
        Ok(params)
    }

    fn parse_lambda_body(&mut self) -> Result<LambdaBody> {
        if self.check(&TokenKind::LeftBrace) {
            Ok(LambdaBody::Block(self.parse_block()?))
        } else {
            Ok(LambdaBody::Expression(Box::new(self.parse_expression()?)))
        }
    }

    fn parse_block(&mut self) -> Result<Vec<Statement>> {
        self.consume(TokenKind::LeftBrace)?;
        let mut statements = Vec::new();
        while !self.check(&TokenKind::RightBrace) && !self.is_at_end() {
            statements.push(self.parse_statement()?);
        }
        self.consume(TokenKind::RightBrace)?;
        Ok(statements)
    }

    fn parse_statement(&mut self) -> Result<Statement> {
        self.enter()?;
        let statement = self.parse_statement_inner();
        self.depth -= 1;
        statement
    }

    fn parse_statement_inner(&mut self) -> Result<Statement> {
        match &self.peek().kind {
            TokenKind::LeftBrace => return Ok(Statement::Block(self.parse_block()?)),
            TokenKind::If => return self.parse_if(),
            TokenKind::Return => {
                self.advance();
                let value = self.parse_expression()?;
                self.consume(TokenKind::Semicolon)?;
                return Ok(Statement::Return(value));
            }
            _ => {}
        }

        // `T name = value;`
        if let (Some(TokenKind::Identifier(type_name)), Some(TokenKind::Identifier(name))) =
            (self.kind_at(0), self.kind_at(1))
        {
            if matches!(self.kind_at(2), Some(TokenKind::Assign)) {
                let (type_name, name) = (type_name.clone(), name.clone());
                self.advance();
                self.advance();
                self.advance();
                let value = self.parse_expression()?;
                self.consume(TokenKind::Semicolon)?;
                return Ok(Statement::LocalDecl {
                    type_name,
                    name,
                    value,
                });
            }
        }

        if let Some(target) = self.assign_target_ahead() {
            let op = self.parse_assign_operator()?;
            let value = self.parse_expression()?;
            self.consume(TokenKind::Semicolon)?;
            return Ok(Statement::Assign { target, op, value });
        }

        let expr = self.parse_expression()?;
        self.consume(TokenKind::Semicolon)?;
        Ok(Statement::Expression(expr))
    }

    /// Consumes `x` or `x.f` when an assignment operator follows it
    fn assign_target_ahead(&mut self) -> Option<AssignTarget> {
        let first = match self.kind_at(0) {
            Some(TokenKind::Identifier(name)) => name.clone(),
            _ => return None,
        };

        if self.kind_at(1).map(Self::is_assign_operator).unwrap_or(false) {
            self.advance();
            return Some(AssignTarget::Variable(first));
        }

        if let (Some(TokenKind::Dot), Some(TokenKind::Identifier(field))) =
            (self.kind_at(1), self.kind_at(2))
        {
            if self.kind_at(3).map(Self::is_assign_operator).unwrap_or(false) {
                let name = field.clone();
                self.advance();
                self.advance();
                self.advance();
                return Some(AssignTarget::Member {
                    object: first,
                    name,
                });
            }
        }

        None
    }

    fn is_assign_operator(kind: &TokenKind) -> bool {
        matches!(
            kind,
            TokenKind::Assign
                | TokenKind::PlusAssign
                | TokenKind::MinusAssign
                | TokenKind::StarAssign
                | TokenKind::SlashAssign
                | TokenKind::PercentAssign
        )
    }

    fn parse_assign_operator(&mut self) -> Result<Option<BinaryOp>> {
        let op = match self.peek().kind {
            TokenKind::Assign => None,
            TokenKind::PlusAssign => Some(BinaryOp::Add),
            TokenKind::MinusAssign => Some(BinaryOp::Sub),
            TokenKind::StarAssign => Some(BinaryOp::Mul),
            TokenKind::SlashAssign => Some(BinaryOp::Div),
            TokenKind::PercentAssign => Some(BinaryOp::Mod),
            _ => return Err(self.expected_error("assignment operator")),
        };
        self.advance();
        Ok(op)
    }

    fn parse_if(&mut self) -> Result<Statement> {
        self.consume(TokenKind::If)?;
        self.consume(TokenKind::LeftParen)?;
        let condition = self.parse_expression()?;
        self.consume(TokenKind::RightParen)?;

        let then_branch = Box::new(self.parse_statement()?);
        let else_branch = if self.match_kind(&TokenKind::Else) {
            Some(Box::new(self.parse_statement()?))
        } else {
            None
        };

        Ok(Statement::If {
            condition,
            then_branch,
            else_branch,
        })
    }

    // ---------------------------------------------------------------------
    // Expressions
    // ---------------------------------------------------------------------

    fn parse_expression(&mut self) -> Result<Expression> {
        self.enter()?;
        let expr = if self.lambda_ahead() {
            self.parse_lambda().map(Expression::Lambda)
        } else {
            self.parse_ternary()
        };
        self.depth -= 1;
        expr
    }

    fn parse_ternary(&mut self) -> Result<Expression> {
        let condition = self.parse_binary(Precedence::Coalesce)?;

        if self.match_kind(&TokenKind::Question) {
            let then_expr = self.parse_expression()?;
            self.consume(TokenKind::Colon)?;
            let else_expr = self.parse_expression()?;
            return Ok(Expression::Ternary {
                condition: Box::new(condition),
                then_expr: Box::new(then_expr),
                else_expr: Box::new(else_expr),
            });
        }

        Ok(condition)
    }

    fn parse_binary(&mut self, min: Precedence) -> Result<Expression> {
        let entered = self.depth;
        let result = self.parse_binary_chain(min);
        self.depth = entered;
        result
    }

    /// Every operator in the chain adds a tree level, so each one counts
    /// towards the nesting limit until the chain is done
    fn parse_binary_chain(&mut self, min: Precedence) -> Result<Expression> {
        let mut left = self.parse_unary()?;

        while let Some(op) = Self::binary_operator(&self.peek().kind) {
            let precedence = op.precedence();
            if precedence < min {
                break;
            }
            self.enter()?;
            self.advance();

            // `??` is right-associative; everything else is left-associative
            let right = if op == BinaryOp::Coalesce {
                self.parse_binary(precedence)?
            } else {
                self.parse_binary(precedence.next())?
            };

            left = Expression::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }

        Ok(left)
    }

    fn binary_operator(kind: &TokenKind) -> Option<BinaryOp> {
        let op = match kind {
            TokenKind::Plus => BinaryOp::Add,
            TokenKind::Minus => BinaryOp::Sub,
            TokenKind::Star => BinaryOp::Mul,
            TokenKind::Slash => BinaryOp::Div,
            TokenKind::Percent => BinaryOp::Mod,
            TokenKind::Eq => BinaryOp::Eq,
            TokenKind::NotEq => BinaryOp::NotEq,
            TokenKind::Lt => BinaryOp::Lt,
            TokenKind::Gt => BinaryOp::Gt,
            TokenKind::LtEq => BinaryOp::LtEq,
            TokenKind::GtEq => BinaryOp::GtEq,
            TokenKind::And => BinaryOp::And,
            TokenKind::Or => BinaryOp::Or,
            TokenKind::QuestionQuestion => BinaryOp::Coalesce,
            _ => return None,
        };
        Some(op)
    }

    fn parse_unary(&mut self) -> Result<Expression> {
        let op = match self.peek().kind {
            TokenKind::Not => Some(UnaryOp::Not),
            TokenKind::Minus => Some(UnaryOp::Neg),
            _ => None,
        };

        match op {
            Some(op) => {
                self.enter()?;
                self.advance();
                let operand = self.parse_unary();
                self.depth -= 1;
                Ok(Expression::Unary {
                    op,
                    operand: Box::new(operand?),
                })
            }
            None => self.parse_postfix(),
        }
    }

    fn parse_postfix(&mut self) -> Result<Expression> {
        let entered = self.depth;
        let result = self.parse_postfix_chain();
        self.depth = entered;
        result
    }

    fn parse_postfix_chain(&mut self) -> Result<Expression> {
        let mut expr = self.parse_primary()?;

        loop {
            if matches!(
                self.peek().kind,
                TokenKind::Dot | TokenKind::QuestionDot | TokenKind::LeftParen | TokenKind::LeftBracket
            ) {
                self.enter()?;
            }
            match self.peek().kind {
                TokenKind::Dot | TokenKind::QuestionDot => {
                    let null_conditional = matches!(self.advance().kind, TokenKind::QuestionDot);
                    let name = self.expect_identifier()?;
                    expr = Expression::Member {
                        object: Box::new(expr),
                        name,
                        null_conditional,
                    };
                }
                TokenKind::LeftParen => {
                    self.advance();
                    let args = self.parse_arguments(TokenKind::RightParen)?;
                    expr = Expression::Call {
                        callee: Box::new(expr),
                        args,
                    };
                }
                TokenKind::LeftBracket => {
                    self.advance();
                    let index = self.parse_expression()?;
                    self.consume(TokenKind::RightBracket)?;
                    expr = Expression::Index {
                        object: Box::new(expr),
                        index: Box::new(index),
                    };
                }
                _ => break,
            }
        }

        Ok(expr)
    }

    /// Parses a comma-separated list; the opening delimiter is already consumed
    fn parse_arguments(&mut self, close: TokenKind) -> Result<Vec<Expression>> {
        let mut args = Vec::new();

        if !self.check(&close) {
            loop {
                args.push(self.parse_expression()?);
                if !self.match_kind(&TokenKind::Comma) {
                    break;
                }
            }
        }

        self.consume(close)?;
        Ok(args)
    }

    fn parse_primary(&mut self) -> Result<Expression> {
        let token = self.peek().clone();

        match token.kind {
            TokenKind::Integer(n) => {
                self.advance();
                Ok(Expression::IntLiteral(n))
            }
            TokenKind::Float(f) => {
                self.advance();
                Ok(Expression::FloatLiteral(f))
            }
            TokenKind::String(s) => {
                self.advance();
                Ok(Expression::StringLiteral(s))
            }
            TokenKind::InterpolatedString(parts) => {
                self.advance();
                Ok(Expression::Interpolated(self.parse_interpolation(parts)?))
            }
            TokenKind::True => {
                self.advance();
                Ok(Expression::BoolLiteral(true))
            }
            TokenKind::False => {
                self.advance();
                Ok(Expression::BoolLiteral(false))
            }
            TokenKind::Null => {
                self.advance();
                Ok(Expression::NullLiteral)
            }
            TokenKind::Identifier(name) => {
                self.advance();
                Ok(Expression::Variable(name))
            }
            TokenKind::LeftParen => {
                self.advance();
                let inner = self.parse_expression()?;
                self.consume(TokenKind::RightParen)?;
                Ok(Expression::Grouping(Box::new(inner)))
            }
            TokenKind::LeftBracket => {
                self.advance();
                let elements = self.parse_arguments(TokenKind::RightBracket)?;
                Ok(Expression::ArrayLiteral(elements))
            }
            TokenKind::New => self.parse_object_literal(),
            TokenKind::Eof => Err(Error::UnexpectedEof),
            _ => Err(self.syntax_error(format!(
                "Unexpected token {} in expression.\n\n\
                 Help: Expected one of: number, string, boolean, null, identifier, \
                 function literal, `(...)`, array `[...]` or `new {{ ... }}`",
                Self::token_kind_name(&token.kind)
            ))),
        }
    }

    fn parse_object_literal(&mut self) -> Result<Expression> {
        self.consume(TokenKind::New)?;
        self.consume(TokenKind::LeftBrace)?;

        let mut fields: Vec<(String, Expression)> = Vec::new();
        if !self.check(&TokenKind::RightBrace) {
            loop {
                let name = self.expect_identifier()?;
                if fields.iter().any(|(existing, _)| existing == &name) {
                    return Err(self.syntax_error(format!(
                        "An anonymous type cannot have multiple properties with the same name '{}'",
                        name
                    )));
                }
                self.consume(TokenKind::Assign)?;
                let value = self.parse_expression()?;
                fields.push((name, value));
                if !self.match_kind(&TokenKind::Comma) {
                    break;
                }
            }
        }

        self.consume(TokenKind::RightBrace)?;
        Ok(Expression::ObjectLiteral(fields))
    }

    /// Parses the holes of an interpolated string with a nested parser,
    /// mapping error positions back into the enclosing source
    fn parse_interpolation(&self, parts: Vec<InterpolationPart>) -> Result<Vec<InterpolatedSegment>> {
        let mut segments = Vec::with_capacity(parts.len());

        for part in parts {
            match part {
                InterpolationPart::Text(text) => segments.push(InterpolatedSegment::Text(text)),
                InterpolationPart::Hole {
                    source,
                    line,
                    column,
                } => {
                    let depth = self.depth;
                    let parsed = Scanner::new(&source).scan_tokens().and_then(|tokens| {
                        Parser {
                            tokens,
                            current: 0,
                            depth,
                        }
                        .parse_standalone_expression()
                    });

                    match parsed {
                        Ok(expr) => segments.push(InterpolatedSegment::Expr(expr)),
                        Err(Error::SyntaxError { col, message, .. }) => {
                            return Err(Error::SyntaxError {
                                line,
                                col: column + col - 1,
                                message,
                            })
                        }
                        Err(other) => return Err(other),
                    }
                }
            }
        }

        Ok(segments)
    }

    // ---------------------------------------------------------------------
    // Token helpers
    // ---------------------------------------------------------------------

    fn is_at_end(&self) -> bool {
        matches!(self.peek().kind, TokenKind::Eof)
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.current.min(self.tokens.len() - 1)]
    }

    fn kind_at(&self, offset: usize) -> Option<&TokenKind> {
        self.tokens.get(self.current + offset).map(|t| &t.kind)
    }

    fn advance(&mut self) -> Token {
        if self.is_at_end() {
            return self.peek().clone();
        }
        self.current += 1;
        self.tokens[self.current - 1].clone()
    }

    fn check(&self, kind: &TokenKind) -> bool {
        if self.is_at_end() {
            return false;
        }
        std::mem::discriminant(&self.peek().kind) == std::mem::discriminant(kind)
    }

    fn match_kind(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn check_word(&self, word: &str) -> bool {
        matches!(&self.peek().kind, TokenKind::Identifier(name) if name == word)
    }

    fn match_word(&mut self, word: &str) -> bool {
        if self.check_word(word) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect_word(&mut self, word: &str) -> Result<Token> {
        if self.check_word(word) {
            Ok(self.advance())
        } else {
            Err(self.expected_error(&format!("`{}`", word)))
        }
    }

    fn consume(&mut self, kind: TokenKind) -> Result<Token> {
        if self.check(&kind) {
            Ok(self.advance())
        } else {
            let token = self.peek();
            if matches!(token.kind, TokenKind::Eof) {
                return Err(Error::UnexpectedEof);
            }
            Err(Error::SyntaxError {
                line: token.line,
                col: token.column,
                message: format!(
                    "Expected {}, found {}",
                    Self::token_kind_name(&kind),
                    Self::token_kind_name(&token.kind)
                ),
            })
        }
    }

    fn expect_identifier(&mut self) -> Result<String> {
        match &self.peek().kind {
            TokenKind::Identifier(name) => {
                let name = name.clone();
                self.advance();
                Ok(name)
            }
            TokenKind::Eof => Err(Error::UnexpectedEof),
            _ => Err(self.expected_error("identifier")),
        }
    }

    fn token_kind_name(kind: &TokenKind) -> String {
        match kind {
            TokenKind::Integer(n) => format!("integer `{}`", n),
            TokenKind::Float(f) => format!("number `{}`", f),
            TokenKind::String(_) | TokenKind::InterpolatedString(_) => "string".to_string(),
            TokenKind::Identifier(name) => format!("identifier `{}`", name),
            TokenKind::True => "`true`".to_string(),
            TokenKind::False => "`false`".to_string(),
            TokenKind::Null => "`null`".to_string(),
            TokenKind::If => "`if`".to_string(),
            TokenKind::Else => "`else`".to_string(),
            TokenKind::Return => "`return`".to_string(),
            TokenKind::New => "`new`".to_string(),
            TokenKind::Plus => "`+`".to_string(),
            TokenKind::Minus => "`-`".to_string(),
            TokenKind::Star => "`*`".to_string(),
            TokenKind::Slash => "`/`".to_string(),
            TokenKind::Percent => "`%`".to_string(),
            TokenKind::Eq => "`==`".to_string(),
            TokenKind::NotEq => "`!=`".to_string(),
            TokenKind::Lt => "`<`".to_string(),
            TokenKind::Gt => "`>`".to_string(),
            TokenKind::LtEq => "`<=`".to_string(),
            TokenKind::GtEq => "`>=`".to_string(),
            TokenKind::And => "`&&`".to_string(),
            TokenKind::Or => "`||`".to_string(),
            TokenKind::Not => "`!`".to_string(),
            TokenKind::Assign => "`=`".to_string(),
            TokenKind::PlusAssign => "`+=`".to_string(),
            TokenKind::MinusAssign => "`-=`".to_string(),
            TokenKind::StarAssign => "`*=`".to_string(),
            TokenKind::SlashAssign => "`/=`".to_string(),
            TokenKind::PercentAssign => "`%=`".to_string(),
            TokenKind::Question => "`?`".to_string(),
            TokenKind::Colon => "`:`".to_string(),
            TokenKind::QuestionDot => "`?.`".to_string(),
            TokenKind::QuestionQuestion => "`??`".to_string(),
            TokenKind::FatArrow => "`=>`".to_string(),
            TokenKind::LeftParen => "`(`".to_string(),
            TokenKind::RightParen => "`)`".to_string(),
            TokenKind::LeftBrace => "`{`".to_string(),
            TokenKind::RightBrace => "`}`".to_string(),
            TokenKind::LeftBracket => "`[`".to_string(),
            TokenKind::RightBracket => "`]`".to_string(),
            TokenKind::Comma => "`,`".to_string(),
            TokenKind::Dot => "`.`".to_string(),
            TokenKind::Semicolon => "`;`".to_string(),
            TokenKind::Eof => "end of input".to_string(),
        }
    }

    fn enter(&mut self) -> Result<()> {
        if self.depth >= MAX_NESTING {
            return Err(self.syntax_error(format!(
                "Expression is nested too deeply (more than {} levels)",
                MAX_NESTING
            )));
        }
        self.depth += 1;
        Ok(())
    }

    fn syntax_error(&self, message: impl Into<String>) -> Error {
        let token = self.peek();
        Error::SyntaxError {
            line: token.line,
            col: token.column,
            message: message.into(),
        }
    }

    fn expected_error(&self, expected: &str) -> Error {
        self.syntax_error(format!(
            "Expected {}, found {}",
            expected,
            Self::token_kind_name(&self.peek().kind)
        ))
    }
}
