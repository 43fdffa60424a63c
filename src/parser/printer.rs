//! Canonical source printer
//!
//! Prints parsed expressions back to text with normalized whitespace: single
//! spaces around binary operators and `=>`, block bodies on their own lines
//! with four-space indentation. Parenthesization is taken from the tree
//! (`Grouping` nodes and the lambda `parenthesized` flag), so printing a
//! reparsed output yields the same text again.

use super::ast::{
    AssignTarget, Expression, InterpolatedSegment, Lambda, LambdaBody, Statement,
};

const INDENT: &str = "    ";

/// Prints an expression canonically
pub fn print_expression(expr: &Expression) -> String {
    let mut printer = Printer::default();
    printer.expression(expr);
    printer.out
}

/// Prints a function literal canonically
pub fn print_lambda(lambda: &Lambda) -> String {
    let mut printer = Printer::default();
    printer.lambda(lambda);
    printer.out
}

#[derive(Default)]
struct Printer {
    out: String,
    depth: usize,
}

impl Printer {
    fn newline(&mut self) {
        self.out.push('\n');
        for _ in 0..self.depth {
            self.out.push_str(INDENT);
        }
    }

    fn lambda(&mut self, lambda: &Lambda) {
        if lambda.parenthesized || lambda.params.len() != 1 {
            let params = lambda
                .params
                .iter()
                .enumerate()
                .map(|(i, name)| match lambda.param_types.get(i) {
                    Some(Some(type_name)) => format!("{} {}", type_name, name),
                    _ => name.clone(),
                })
                .collect::<Vec<_>>();
            self.out.push('(');
            self.out.push_str(&params.join(", "));
            self.out.push(')');
        } else {
            self.out.push_str(&lambda.params[0]);
        }

        match &lambda.body {
            LambdaBody::Expression(body) => {
                self.out.push_str(" => ");
                self.expression(body);
            }
            LambdaBody::Block(statements) => {
                self.out.push_str(" =>");
                self.newline();
                self.block(statements);
            }
        }
    }

    /// Prints `{ ... }` starting at the current position
    fn block(&mut self, statements: &[Statement]) {
        self.out.push('{');
        self.depth += 1;
        for statement in statements {
            self.newline();
            self.statement(statement);
        }
        self.depth -= 1;
        self.newline();
        self.out.push('}');
    }

    fn statement(&mut self, statement: &Statement) {
        match statement {
            Statement::LocalDecl {
                type_name,
                name,
                value,
            } => {
                self.out.push_str(&format!("{} {} = ", type_name, name));
                self.expression(value);
                self.out.push(';');
            }
            Statement::Assign { target, op, value } => {
                self.target(target);
                match op {
                    Some(op) => self.out.push_str(&format!(" {}= ", op)),
                    None => self.out.push_str(" = "),
                }
                self.expression(value);
                self.out.push(';');
            }
            Statement::Return(value) => {
                self.out.push_str("return ");
                self.expression(value);
                self.out.push(';');
            }
            Statement::If {
                condition,
                then_branch,
                else_branch,
            } => {
                self.out.push_str("if (");
                self.expression(condition);
                self.out.push(')');
                self.embedded(then_branch);

                if let Some(else_branch) = else_branch {
                    self.newline();
                    self.out.push_str("else");
                    if let Statement::If { .. } = else_branch.as_ref() {
                        self.out.push(' ');
                        self.statement(else_branch);
                    } else {
                        self.embedded(else_branch);
                    }
                }
            }
            Statement::Block(statements) => self.block(statements),
            Statement::Expression(expr) => {
                self.expression(expr);
                self.out.push(';');
            }
        }
    }

    /// Branch of an `if`: blocks align with the keyword, single statements indent
    fn embedded(&mut self, statement: &Statement) {
        if let Statement::Block(statements) = statement {
            self.newline();
            self.block(statements);
        } else {
            self.depth += 1;
            self.newline();
            self.statement(statement);
            self.depth -= 1;
        }
    }

    fn target(&mut self, target: &AssignTarget) {
        self.out.push_str(&target.to_string());
    }

    fn expression(&mut self, expr: &Expression) {
        match expr {
            Expression::IntLiteral(n) => self.out.push_str(&n.to_string()),
            Expression::FloatLiteral(f) => self.out.push_str(&format!("{:?}", f)),
            Expression::StringLiteral(s) => {
                self.out.push('"');
                self.out.push_str(&escape(s, false));
                self.out.push('"');
            }
            Expression::BoolLiteral(b) => self.out.push_str(if *b { "true" } else { "false" }),
            Expression::NullLiteral => self.out.push_str("null"),
            Expression::Interpolated(segments) => {
                self.out.push_str("$\"");
                for segment in segments {
                    match segment {
                        InterpolatedSegment::Text(text) => self.out.push_str(&escape(text, true)),
                        InterpolatedSegment::Expr(expr) => {
                            self.out.push('{');
                            self.expression(expr);
                            self.out.push('}');
                        }
                    }
                }
                self.out.push('"');
            }
            Expression::ArrayLiteral(items) => {
                self.out.push('[');
                self.list(items);
                self.out.push(']');
            }
            Expression::ObjectLiteral(fields) => {
                if fields.is_empty() {
                    self.out.push_str("new { }");
                    return;
                }
                self.out.push_str("new { ");
                for (i, (name, value)) in fields.iter().enumerate() {
                    if i > 0 {
                        self.out.push_str(", ");
                    }
                    self.out.push_str(name);
                    self.out.push_str(" = ");
                    self.expression(value);
                }
                self.out.push_str(" }");
            }
            Expression::Variable(name) => self.out.push_str(name),
            Expression::Grouping(inner) => {
                self.out.push('(');
                self.expression(inner);
                self.out.push(')');
            }
            Expression::Binary { op, left, right } => {
                self.expression(left);
                self.out.push_str(&format!(" {} ", op));
                self.expression(right);
            }
            Expression::Unary { op, operand } => {
                self.out.push_str(&op.to_string());
                self.expression(operand);
            }
            Expression::Ternary {
                condition,
                then_expr,
                else_expr,
            } => {
                self.expression(condition);
                self.out.push_str(" ? ");
                self.expression(then_expr);
                self.out.push_str(" : ");
                self.expression(else_expr);
            }
            Expression::Call { callee, args } => {
                self.expression(callee);
                self.out.push('(');
                self.list(args);
                self.out.push(')');
            }
            Expression::Member {
                object,
                name,
                null_conditional,
            } => {
                self.expression(object);
                self.out.push_str(if *null_conditional { "?." } else { "." });
                self.out.push_str(name);
            }
            Expression::Index { object, index } => {
                self.expression(object);
                self.out.push('[');
                self.expression(index);
                self.out.push(']');
            }
            Expression::Lambda(lambda) => self.lambda(lambda),
        }
    }

    fn list(&mut self, items: &[Expression]) {
        for (i, item) in items.iter().enumerate() {
            if i > 0 {
                self.out.push_str(", ");
            }
            self.expression(item);
        }
    }
}

fn escape(text: &str, interpolated: bool) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '"' => escaped.push_str("\\\""),
            '\n' => escaped.push_str("\\n"),
            '\t' => escaped.push_str("\\t"),
            '\r' => escaped.push_str("\\r"),
            '\0' => escaped.push_str("\\0"),
            '{' if interpolated => escaped.push_str("{{"),
            '}' if interpolated => escaped.push_str("}}"),
            other => escaped.push(other),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_expression;

    fn reprint(source: &str) -> String {
        print_expression(&parse_expression(source).unwrap())
    }

    #[test]
    fn test_expression_spacing() {
        assert_eq!(reprint("(a,b)=>a*b"), "(a, b) => a * b");
        assert_eq!(reprint("x=>x"), "x => x");
        assert_eq!(reprint("()=>-1"), "() => -1");
        assert_eq!(reprint("i=>i?.Name??\"none\""), "i => i?.Name ?? \"none\"");
    }

    #[test]
    fn test_typed_parameters() {
        assert_eq!(reprint("(int a,b)=>a+b"), "(int a, b) => a + b");
    }

    #[test]
    fn test_grouping_is_preserved() {
        assert_eq!(reprint("x => (x+1)*2"), "x => (x + 1) * 2");
    }

    #[test]
    fn test_block_layout() {
        let printed = reprint("(s) => { if (s > 1) return 1; else { return 2; } }");
        assert_eq!(
            printed,
            "(s) =>\n{\n    if (s > 1)\n        return 1;\n    else\n    {\n        return 2;\n    }\n}"
        );
    }

    #[test]
    fn test_literals() {
        assert_eq!(reprint("x => 1.5"), "x => 1.5");
        assert_eq!(reprint("x => 2.0"), "x => 2.0");
        assert_eq!(reprint(r#"x => "a\"b""#), r#"x => "a\"b""#);
        assert_eq!(
            reprint(r#"x => $"{{{x.a}}} {x.b}""#),
            r#"x => $"{{{x.a}}} {x.b}""#
        );
        assert_eq!(reprint("x => new {a=1,b=[1,2]}"), "x => new { a = 1, b = [1, 2] }");
    }
}
