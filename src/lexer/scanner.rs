use super::token::{InterpolationPart, Token, TokenKind};
use crate::error::{Error, Result};

/// Scanner for lambda-language source text
pub struct Scanner {
    /// Source code as character vector
    source: Vec<char>,
    /// Accumulated tokens
    tokens: Vec<Token>,
    /// Start position of current token
    start: usize,
    /// Current position in source
    current: usize,
    /// Current line number (1-indexed)
    line: usize,
    /// Current column number (1-indexed)
    column: usize,
    /// Line and column where the current token started
    start_line: usize,
    start_column: usize,
}

impl Scanner {
    /// Creates a new scanner from source code
    pub fn new(source: &str) -> Self {
        Scanner {
            source: source.chars().collect(),
            tokens: Vec::new(),
            start: 0,
            current: 0,
            line: 1,
            column: 1,
            start_line: 1,
            start_column: 1,
        }
    }

    /// Scans all tokens from source code and returns them as a vector
    pub fn scan_tokens(&mut self) -> Result<Vec<Token>> {
        while !self.is_at_end() {
            self.start = self.current;
            self.start_line = self.line;
            self.start_column = self.column;
            self.scan_token()?;
        }

        self.tokens.push(Token::new(
            TokenKind::Eof,
            String::new(),
            self.line,
            self.column,
        ));

        Ok(std::mem::take(&mut self.tokens))
    }

    fn scan_token(&mut self) -> Result<()> {
        let c = self.advance();

        match c {
            ' ' | '\r' | '\t' => {}
            '\n' => self.newline(),

            '(' => self.add_token(TokenKind::LeftParen),
            ')' => self.add_token(TokenKind::RightParen),
            '{' => self.add_token(TokenKind::LeftBrace),
            '}' => self.add_token(TokenKind::RightBrace),
            '[' => self.add_token(TokenKind::LeftBracket),
            ']' => self.add_token(TokenKind::RightBracket),
            ',' => self.add_token(TokenKind::Comma),
            ';' => self.add_token(TokenKind::Semicolon),
            ':' => self.add_token(TokenKind::Colon),
            '.' => {
                if self.peek().is_ascii_digit() {
                    return Err(self.error("Numeric literals must start with a digit"));
                }
                self.add_token(TokenKind::Dot)
            }

            '+' => self.add_with_assign(TokenKind::PlusAssign, TokenKind::Plus),
            '-' => self.add_with_assign(TokenKind::MinusAssign, TokenKind::Minus),
            '*' => self.add_with_assign(TokenKind::StarAssign, TokenKind::Star),
            '%' => self.add_with_assign(TokenKind::PercentAssign, TokenKind::Percent),
            '/' => {
                if self.match_char('/') {
                    self.skip_line_comment();
                } else if self.match_char('*') {
                    self.skip_block_comment()?;
                } else {
                    self.add_with_assign(TokenKind::SlashAssign, TokenKind::Slash);
                }
            }

            '=' => {
                if self.match_char('=') {
                    self.add_token(TokenKind::Eq);
                } else if self.match_char('>') {
                    self.add_token(TokenKind::FatArrow);
                } else {
                    self.add_token(TokenKind::Assign);
                }
            }
            '!' => self.add_with_assign(TokenKind::NotEq, TokenKind::Not),
            '<' => self.add_with_assign(TokenKind::LtEq, TokenKind::Lt),
            '>' => self.add_with_assign(TokenKind::GtEq, TokenKind::Gt),
            '&' => {
                if self.match_char('&') {
                    self.add_token(TokenKind::And);
                } else {
                    return Err(self.error("Unexpected character '&' (did you mean '&&'?)"));
                }
            }
            '|' => {
                if self.match_char('|') {
                    self.add_token(TokenKind::Or);
                } else {
                    return Err(self.error("Unexpected character '|' (did you mean '||'?)"));
                }
            }
            '?' => {
                if self.match_char('?') {
                    self.add_token(TokenKind::QuestionQuestion);
                } else if self.match_char('.') {
                    self.add_token(TokenKind::QuestionDot);
                } else {
                    self.add_token(TokenKind::Question);
                }
            }

            '"' => self.scan_string()?,
            '$' => {
                if self.match_char('"') {
                    self.scan_interpolated_string()?;
                } else {
                    return Err(self.error("Expected '\"' after '$'"));
                }
            }

            c if c.is_ascii_digit() => self.scan_number()?,

            c if c.is_alphabetic() || c == '_' => self.scan_identifier_or_keyword(),

            _ => {
                return Err(Error::ParseError(format!(
                    "Unexpected character '{}' at line {}, column {}",
                    c, self.start_line, self.start_column
                )));
            }
        }

        Ok(())
    }

    fn add_with_assign(&mut self, with_assign: TokenKind, plain: TokenKind) {
        if self.match_char('=') {
            self.add_token(with_assign);
        } else {
            self.add_token(plain);
        }
    }

    fn skip_line_comment(&mut self) {
        while !self.is_at_end() && self.peek() != '\n' {
            self.advance();
        }
    }

    fn skip_block_comment(&mut self) -> Result<()> {
        while !self.is_at_end() {
            if self.peek() == '*' && self.peek_next() == '/' {
                self.advance();
                self.advance();
                return Ok(());
            }
            if self.advance() == '\n' {
                self.newline();
            }
        }
        Err(self.error("Unterminated block comment"))
    }

    fn scan_escape(&mut self) -> Result<char> {
        if self.is_at_end() {
            return Err(self.error("Unterminated escape sequence"));
        }
        let escaped = self.advance();
        match escaped {
            'n' => Ok('\n'),
            't' => Ok('\t'),
            'r' => Ok('\r'),
            '0' => Ok('\0'),
            '\\' => Ok('\\'),
            '"' => Ok('"'),
            '\'' => Ok('\''),
            _ => Err(Error::ParseError(format!(
                "Invalid escape sequence \\{} at line {}",
                escaped, self.line
            ))),
        }
    }

    fn scan_string(&mut self) -> Result<()> {
        let mut value = String::new();

        while !self.is_at_end() && self.peek() != '"' {
            if self.peek() == '\n' {
                return Err(self.error("Newline in string literal"));
            }
            if self.peek() == '\\' {
                self.advance();
                value.push(self.scan_escape()?);
            } else {
                value.push(self.advance());
            }
        }

        if self.is_at_end() {
            return Err(Error::ParseError(format!(
                "Unterminated string at line {}",
                self.start_line
            )));
        }

        self.advance(); // Closing "

        self.add_token(TokenKind::String(value));
        Ok(())
    }

    /// Scans `$"..."`. Holes are captured as raw source and parsed later by the
    /// parser; braces inside quoted strings within a hole do not close it.
    fn scan_interpolated_string(&mut self) -> Result<()> {
        let mut parts = Vec::new();
        let mut text = String::new();

        loop {
            if self.is_at_end() {
                return Err(Error::ParseError(format!(
                    "Unterminated interpolated string at line {}",
                    self.start_line
                )));
            }

            match self.peek() {
                '"' => {
                    self.advance();
                    break;
                }
                '\n' => return Err(self.error("Newline in string literal")),
                '\\' => {
                    self.advance();
                    text.push(self.scan_escape()?);
                }
                '{' if self.peek_next() == '{' => {
                    self.advance();
                    self.advance();
                    text.push('{');
                }
                '}' if self.peek_next() == '}' => {
                    self.advance();
                    self.advance();
                    text.push('}');
                }
                '}' => return Err(self.error("Unmatched '}' in interpolated string")),
                '{' => {
                    self.advance();
                    if !text.is_empty() {
                        parts.push(InterpolationPart::Text(std::mem::take(&mut text)));
                    }
                    let (line, column) = (self.line, self.column);
                    let source = self.scan_hole()?;
                    parts.push(InterpolationPart::Hole {
                        source,
                        line,
                        column,
                    });
                }
                _ => text.push(self.advance()),
            }
        }

        if !text.is_empty() {
            parts.push(InterpolationPart::Text(text));
        }

        self.add_token(TokenKind::InterpolatedString(parts));
        Ok(())
    }

    fn scan_hole(&mut self) -> Result<String> {
        let mut source = String::new();
        let mut in_string = false;

        loop {
            if self.is_at_end() || self.peek() == '\n' {
                return Err(self.error("Unterminated interpolation hole"));
            }
            let c = self.advance();
            match c {
                '\\' if in_string => {
                    if self.is_at_end() {
                        return Err(self.error("Unterminated escape sequence"));
                    }
                    source.push(c);
                    source.push(self.advance());
                }
                '"' => {
                    in_string = !in_string;
                    source.push(c);
                }
                '{' if !in_string => {
                    return Err(self.error("Nested braces are not allowed in interpolation holes"))
                }
                '}' if !in_string => break,
                _ => source.push(c),
            }
        }

        if source.trim().is_empty() {
            return Err(self.error("Empty interpolation hole"));
        }
        Ok(source)
    }

    fn scan_number(&mut self) -> Result<()> {
        while self.peek().is_ascii_digit() {
            self.advance();
        }

        let mut is_float = false;
        if self.peek() == '.' && self.peek_next().is_ascii_digit() {
            is_float = true;
            self.advance(); // consume .
            while self.peek().is_ascii_digit() {
                self.advance();
            }
        }

        if matches!(self.peek(), 'e' | 'E')
            && (self.peek_next().is_ascii_digit()
                || (matches!(self.peek_next(), '+' | '-') && self.peek_at(2).is_ascii_digit()))
        {
            is_float = true;
            self.advance(); // consume e
            if matches!(self.peek(), '+' | '-') {
                self.advance();
            }
            while self.peek().is_ascii_digit() {
                self.advance();
            }
        }

        let text: String = self.source[self.start..self.current].iter().collect();

        if is_float {
            let value: f64 = text
                .parse()
                .map_err(|_| Error::ParseError(format!("Invalid float: {}", text)))?;
            self.add_token(TokenKind::Float(value));
        } else {
            let value: i64 = text
                .parse()
                .map_err(|_| Error::ParseError(format!("Invalid integer: {}", text)))?;
            self.add_token(TokenKind::Integer(value));
        }

        Ok(())
    }

    fn scan_identifier_or_keyword(&mut self) {
        while self.peek().is_alphanumeric() || self.peek() == '_' {
            self.advance();
        }

        let text: String = self.source[self.start..self.current].iter().collect();

        let token_kind = match text.as_str() {
            "true" => TokenKind::True,
            "false" => TokenKind::False,
            "null" => TokenKind::Null,
            other => TokenKind::keyword(other).unwrap_or(TokenKind::Identifier(text)),
        };

        self.add_token(token_kind);
    }

    fn newline(&mut self) {
        self.line += 1;
        self.column = 1;
    }

    fn error(&self, message: &str) -> Error {
        Error::SyntaxError {
            line: self.line,
            col: self.column,
            message: message.to_string(),
        }
    }

    fn is_at_end(&self) -> bool {
        self.current >= self.source.len()
    }

    fn advance(&mut self) -> char {
        let c = self.source[self.current];
        self.current += 1;
        self.column += 1;
        c
    }

    fn peek(&self) -> char {
        self.peek_at(0)
    }

    fn peek_next(&self) -> char {
        self.peek_at(1)
    }

    fn peek_at(&self, offset: usize) -> char {
        self.source
            .get(self.current + offset)
            .copied()
            .unwrap_or('\0')
    }

    fn match_char(&mut self, expected: char) -> bool {
        if self.is_at_end() || self.source[self.current] != expected {
            false
        } else {
            self.current += 1;
            self.column += 1;
            true
        }
    }

    fn add_token(&mut self, kind: TokenKind) {
        let lexeme: String = self.source[self.start..self.current].iter().collect();
        self.tokens.push(Token::new(
            kind,
            lexeme,
            self.start_line,
            self.start_column,
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        let mut scanner = Scanner::new(source);
        scanner
            .scan_tokens()
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn test_simple_lambda() {
        let tokens = kinds("(a, b) => a * b");
        assert_eq!(
            tokens,
            vec![
                TokenKind::LeftParen,
                TokenKind::Identifier("a".to_string()),
                TokenKind::Comma,
                TokenKind::Identifier("b".to_string()),
                TokenKind::RightParen,
                TokenKind::FatArrow,
                TokenKind::Identifier("a".to_string()),
                TokenKind::Star,
                TokenKind::Identifier("b".to_string()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_operators() {
        let tokens = kinds("== != <= >= && || ?? ?. += %=");
        assert_eq!(
            &tokens[..10],
            &[
                TokenKind::Eq,
                TokenKind::NotEq,
                TokenKind::LtEq,
                TokenKind::GtEq,
                TokenKind::And,
                TokenKind::Or,
                TokenKind::QuestionQuestion,
                TokenKind::QuestionDot,
                TokenKind::PlusAssign,
                TokenKind::PercentAssign,
            ]
        );
    }

    #[test]
    fn test_numbers() {
        assert_eq!(kinds("42")[0], TokenKind::Integer(42));
        assert_eq!(kinds("2.5")[0], TokenKind::Float(2.5));
        assert_eq!(kinds("1e3")[0], TokenKind::Float(1000.0));
        // a member access on an integer is not a float
        assert_eq!(kinds("1.ToString")[1], TokenKind::Dot);
    }

    #[test]
    fn test_string_escapes() {
        assert_eq!(
            kinds(r#""a\"b\n""#)[0],
            TokenKind::String("a\"b\n".to_string())
        );
    }

    #[test]
    fn test_interpolated_string() {
        let tokens = kinds(r#"$"Name: {i.first} {{x}} {trace(i, "}")}""#);
        match &tokens[0] {
            TokenKind::InterpolatedString(parts) => {
                assert_eq!(parts.len(), 4);
                assert_eq!(parts[0], InterpolationPart::Text("Name: ".to_string()));
                assert!(
                    matches!(&parts[1], InterpolationPart::Hole { source, .. } if source == "i.first")
                );
                assert_eq!(parts[2], InterpolationPart::Text(" {x} ".to_string()));
                assert!(
                    matches!(&parts[3], InterpolationPart::Hole { source, .. } if source == "trace(i, \"}\")")
                );
            }
            other => panic!("expected interpolated string, got {:?}", other),
        }
    }

    #[test]
    fn test_comments_are_skipped() {
        let tokens = kinds("// leading\nx /* inner */ => x");
        assert_eq!(tokens[0], TokenKind::Identifier("x".to_string()));
        assert_eq!(tokens[1], TokenKind::FatArrow);
    }

    #[test]
    fn test_token_positions() {
        let mut scanner = Scanner::new("a =>\n  b");
        let tokens = scanner.scan_tokens().unwrap();
        assert_eq!((tokens[0].line, tokens[0].column), (1, 1));
        assert_eq!((tokens[1].line, tokens[1].column), (1, 3));
        assert_eq!((tokens[2].line, tokens[2].column), (2, 3));
    }

    #[test]
    fn test_unterminated_string() {
        let mut scanner = Scanner::new("\"abc");
        assert!(scanner.scan_tokens().is_err());
    }
}
