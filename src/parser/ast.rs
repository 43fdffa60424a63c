use serde::{Deserialize, Serialize};
use std::fmt;

/// A compilation unit: one or more namespaces of classes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompilationUnit {
    /// Namespaces declared in the unit
    pub namespaces: Vec<NamespaceDecl>,
}

/// `namespace A.B { ... }`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamespaceDecl {
    /// Dotted namespace name
    pub name: String,
    /// Classes declared in the namespace
    pub classes: Vec<ClassDecl>,
}

/// `class Name { ... }`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassDecl {
    /// Class name
    pub name: String,
    /// Member declarations in source order
    pub members: Vec<MemberDecl>,
    /// Line of the `class` keyword
    pub line: usize,
    /// Column of the `class` keyword
    pub column: usize,
}

/// Class member declarations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MemberDecl {
    /// Field binding: `let name: Type = value;`
    Field {
        /// Field name
        name: String,
        /// Optional declared type
        ty: Option<TypeRef>,
        /// Initializer expression
        value: Expression,
        /// Declaration line
        line: usize,
        /// Declaration column
        column: usize,
    },

    /// Method: `fn name(a, b) => body;`
    Method {
        /// Method name (overloaded by parameter count)
        name: String,
        /// Parameter names
        params: Vec<String>,
        /// Method body
        body: LambdaBody,
        /// Declaration line
        line: usize,
        /// Declaration column
        column: usize,
    },
}

impl MemberDecl {
    /// Member name
    pub fn name(&self) -> &str {
        match self {
            MemberDecl::Field { name, .. } | MemberDecl::Method { name, .. } => name,
        }
    }

    /// Declaration position as (line, column)
    pub fn position(&self) -> (usize, usize) {
        match self {
            MemberDecl::Field { line, column, .. } | MemberDecl::Method { line, column, .. } => {
                (*line, *column)
            }
        }
    }
}

/// A type reference such as `int` or `Func<dynamic, string, dynamic>`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeRef {
    /// Type name
    pub name: String,
    /// Generic arguments
    pub args: Vec<TypeRef>,
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name)?;
        if !self.args.is_empty() {
            write!(f, "<")?;
            for (i, arg) in self.args.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{}", arg)?;
            }
            write!(f, ">")?;
        }
        Ok(())
    }
}

/// Function literal: `(a, b) => body`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lambda {
    /// Parameter names
    pub params: Vec<String>,
    /// Declared parameter type names, parallel to `params` (`(int a) => ...`)
    #[serde(default)]
    pub param_types: Vec<Option<String>>,
    /// Whether the parameter list was written in parentheses
    pub parenthesized: bool,
    /// Lambda body
    pub body: LambdaBody,
}

/// Lambda or method body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LambdaBody {
    /// `=> expr`
    Expression(Box<Expression>),
    /// `=> { statements }`
    Block(Vec<Statement>),
}

/// Statements (block bodies only)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Statement {
    /// Local declaration: `var x = e;` or `string x = e;`
    LocalDecl {
        /// Declared type name (`var` when inferred)
        type_name: String,
        /// Local name
        name: String,
        /// Initial value
        value: Expression,
    },

    /// Assignment: `x = e;`, `x += e;`, `x.f = e;`
    Assign {
        /// Assignment target
        target: AssignTarget,
        /// Operator for compound assignment
        op: Option<BinaryOp>,
        /// Assigned value
        value: Expression,
    },

    /// `return e;`
    Return(Expression),

    /// `if (c) s else s`
    If {
        /// Condition expression
        condition: Expression,
        /// Statement executed when the condition holds
        then_branch: Box<Statement>,
        /// Optional else statement
        else_branch: Option<Box<Statement>>,
    },

    /// Nested block
    Block(Vec<Statement>),

    /// Expression statement
    Expression(Expression),
}

/// Left-hand side of an assignment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AssignTarget {
    /// Local variable
    Variable(String),
    /// Field of a record held in a local variable
    Member {
        /// Local holding the record
        object: String,
        /// Field name
        name: String,
    },
}

impl fmt::Display for AssignTarget {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AssignTarget::Variable(name) => write!(f, "{}", name),
            AssignTarget::Member { object, name } => write!(f, "{}.{}", object, name),
        }
    }
}

/// Piece of an interpolated string
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum InterpolatedSegment {
    /// Literal text
    Text(String),
    /// Embedded expression
    Expr(Expression),
}

/// Expressions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expression {
    // Literals
    /// Integer literal expression
    IntLiteral(i64),
    /// Floating-point literal expression
    FloatLiteral(f64),
    /// String literal expression
    StringLiteral(String),
    /// Boolean literal expression
    BoolLiteral(bool),
    /// Null literal expression
    NullLiteral,
    /// Interpolated string `$"..."`
    Interpolated(Vec<InterpolatedSegment>),

    // Collections
    /// Array literal `[a, b]`
    ArrayLiteral(Vec<Expression>),
    /// Anonymous record `new { a = 1, b = 2 }`
    ObjectLiteral(Vec<(String, Expression)>),

    /// Variable reference expression
    Variable(String),

    /// Parenthesized expression, kept so formatting round-trips
    Grouping(Box<Expression>),

    /// Binary operation expression
    Binary {
        /// Binary operator to apply
        op: BinaryOp,
        /// Left operand expression
        left: Box<Expression>,
        /// Right operand expression
        right: Box<Expression>,
    },

    /// Unary operation expression
    Unary {
        /// Unary operator to apply
        op: UnaryOp,
        /// Operand expression
        operand: Box<Expression>,
    },

    /// Ternary conditional expression
    Ternary {
        /// Condition expression to evaluate
        condition: Box<Expression>,
        /// Expression to evaluate if condition is true
        then_expr: Box<Expression>,
        /// Expression to evaluate if condition is false
        else_expr: Box<Expression>,
    },

    /// Invocation `callee(args)`
    Call {
        /// Called expression
        callee: Box<Expression>,
        /// Arguments
        args: Vec<Expression>,
    },

    /// Member access `object.name` or `object?.name`
    Member {
        /// Receiver expression
        object: Box<Expression>,
        /// Member name
        name: String,
        /// True for `?.`
        null_conditional: bool,
    },

    /// Index access `object[index]`
    Index {
        /// Indexed expression
        object: Box<Expression>,
        /// Index expression
        index: Box<Expression>,
    },

    /// Nested function literal
    Lambda(Lambda),
}

impl Expression {
    /// Returns the dotted path of a plain identifier/member chain (`a.b.c`)
    pub fn dotted_path(&self) -> Option<Vec<String>> {
        match self {
            Expression::Variable(name) => Some(vec![name.clone()]),
            Expression::Member {
                object,
                name,
                null_conditional: false,
            } => {
                let mut path = object.dotted_path()?;
                path.push(name.clone());
                Some(path)
            }
            _ => None,
        }
    }
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinaryOp {
    // Arithmetic
    /// Addition / concatenation operator (+)
    Add,
    /// Subtraction operator (-)
    Sub,
    /// Multiplication operator (*)
    Mul,
    /// Division operator (/)
    Div,
    /// Modulo operator (%)
    Mod,

    // Comparison
    /// Equality comparison operator (==)
    Eq,
    /// Inequality comparison operator (!=)
    NotEq,
    /// Less than comparison operator (<)
    Lt,
    /// Greater than comparison operator (>)
    Gt,
    /// Less than or equal comparison operator (<=)
    LtEq,
    /// Greater than or equal comparison operator (>=)
    GtEq,

    // Logical
    /// Short-circuit AND (&&)
    And,
    /// Short-circuit OR (||)
    Or,
    /// Null coalescing (??)
    Coalesce,
}

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnaryOp {
    /// Negation operator (-)
    Neg,
    /// Logical NOT operator (!)
    Not,
}

/// Operator precedence levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Precedence {
    /// No precedence
    None,
    /// Conditional operator (?:)
    Ternary,
    /// Null coalescing (??)
    Coalesce,
    /// Logical OR operator
    Or,
    /// Logical AND operator
    And,
    /// Equality operators (==, !=)
    Equality,
    /// Comparison operators (<, >, <=, >=)
    Comparison,
    /// Addition and subtraction (+, -)
    Term,
    /// Multiplication, division, modulo (*, /, %)
    Factor,
    /// Unary operators (!, -)
    Unary,
    /// Call operators (., (), [])
    Call,
    /// Primary expressions (literals, identifiers)
    Primary,
}

impl Precedence {
    /// The next tighter-binding level
    pub fn next(self) -> Precedence {
        match self {
            Precedence::None => Precedence::Ternary,
            Precedence::Ternary => Precedence::Coalesce,
            Precedence::Coalesce => Precedence::Or,
            Precedence::Or => Precedence::And,
            Precedence::And => Precedence::Equality,
            Precedence::Equality => Precedence::Comparison,
            Precedence::Comparison => Precedence::Term,
            Precedence::Term => Precedence::Factor,
            Precedence::Factor => Precedence::Unary,
            Precedence::Unary => Precedence::Call,
            Precedence::Call | Precedence::Primary => Precedence::Primary,
        }
    }
}

impl BinaryOp {
    /// Returns the precedence level of this binary operator
    pub fn precedence(&self) -> Precedence {
        match self {
            BinaryOp::Coalesce => Precedence::Coalesce,
            BinaryOp::Or => Precedence::Or,
            BinaryOp::And => Precedence::And,
            BinaryOp::Eq | BinaryOp::NotEq => Precedence::Equality,
            BinaryOp::Lt | BinaryOp::Gt | BinaryOp::LtEq | BinaryOp::GtEq => Precedence::Comparison,
            BinaryOp::Add | BinaryOp::Sub => Precedence::Term,
            BinaryOp::Mul | BinaryOp::Div | BinaryOp::Mod => Precedence::Factor,
        }
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            BinaryOp::Add => write!(f, "+"),
            BinaryOp::Sub => write!(f, "-"),
            BinaryOp::Mul => write!(f, "*"),
            BinaryOp::Div => write!(f, "/"),
            BinaryOp::Mod => write!(f, "%"),
            BinaryOp::Eq => write!(f, "=="),
            BinaryOp::NotEq => write!(f, "!="),
            BinaryOp::Lt => write!(f, "<"),
            BinaryOp::Gt => write!(f, ">"),
            BinaryOp::LtEq => write!(f, "<="),
            BinaryOp::GtEq => write!(f, ">="),
            BinaryOp::And => write!(f, "&&"),
            BinaryOp::Or => write!(f, "||"),
            BinaryOp::Coalesce => write!(f, "??"),
        }
    }
}

impl fmt::Display for UnaryOp {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            UnaryOp::Neg => write!(f, "-"),
            UnaryOp::Not => write!(f, "!"),
        }
    }
}
