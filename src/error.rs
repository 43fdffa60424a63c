//! Error types for the Lucid expression compiler

use std::fmt;

use thiserror::Error;

/// A single compiler diagnostic, reported against the line and column of the
/// declaration it was raised for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// Line number (1-indexed)
    pub line: usize,
    /// Column number (1-indexed)
    pub column: usize,
    /// Diagnostic text
    pub message: String,
}

impl Diagnostic {
    /// Creates a new diagnostic
    pub fn new(line: usize, column: usize, message: impl Into<String>) -> Self {
        Diagnostic {
            line,
            column,
            message: message.into(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "({},{}): error: {}", self.line, self.column, self.message)
    }
}

fn join_diagnostics(diagnostics: &[Diagnostic]) -> String {
    diagnostics
        .iter()
        .map(|d| d.to_string())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Lucid errors
#[derive(Error, Debug, Clone)]
pub enum Error {
    // Parse errors
    /// Syntax error encountered during scanning or parsing
    ///
    /// **Triggered by:** Invalid lambda syntax (unbalanced parentheses, stray tokens)
    /// **Example:** `(a, b => a`
    #[error("Syntax error at line {line}, column {col}: {message}")]
    SyntaxError {
        /// Line number where error occurred
        line: usize,
        /// Column number where error occurred
        col: usize,
        /// Error description
        message: String,
    },

    /// General parse error
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Unexpected end of input during parsing
    #[error("Unexpected end of input")]
    UnexpectedEof,

    // Runtime errors
    /// Reference to an undefined record field or variable
    ///
    /// **Triggered by:** Reading a field the input record does not carry
    /// **Example:** `i => i.missing` invoked with `{"name": "x"}`
    #[error("Undefined variable: {name}")]
    UndefinedVariable {
        /// Variable or field name
        name: String,
        /// Available fields (if accessing a record field) - not shown in base error message
        #[doc(hidden)]
        available_fields: Option<Vec<String>>,
    },

    /// Member access on a value that has no such member
    #[error("'{type_name}' does not contain a definition for '{member}'")]
    UndefinedMember {
        /// Type of the receiver
        type_name: String,
        /// Requested member
        member: String,
    },

    /// Type mismatch error
    ///
    /// **Triggered by:** A value not matching a declared kind, e.g. `Func<int, dynamic>` called with a string
    #[error("Type error: expected {expected}, got {got}")]
    TypeError {
        /// Expected type
        expected: String,
        /// Actual type
        got: String,
    },

    /// Integer division by zero
    #[error("Division by zero")]
    DivisionByZero,

    /// Array index out of bounds
    #[error("Index out of bounds: {index} for array of length {length}")]
    IndexOutOfBounds {
        /// Requested index
        index: usize,
        /// Array length
        length: usize,
    },

    /// Invalid operation for given types
    ///
    /// **Example:** `true * 2`
    #[error("Invalid operation: {op} on types {left_type} and {right_type}")]
    InvalidOperation {
        /// Operation name
        op: String,
        /// Left operand type
        left_type: String,
        /// Right operand type
        right_type: String,
    },

    /// Invalid comparison between incompatible types
    #[error("Invalid comparison between types {left_type} and {right_type}")]
    InvalidComparison {
        /// Left operand type
        left_type: String,
        /// Right operand type
        right_type: String,
    },

    /// Attempt to call a non-callable value
    #[error("Value is not callable: {type_name}")]
    NotCallable {
        /// Type of non-callable value
        type_name: String,
    },

    /// A function value was invoked with the wrong number of arguments
    #[error("Function {name} expects {expected} arguments, got {got}")]
    ArityMismatch {
        /// Function description
        name: String,
        /// Declared parameter count
        expected: usize,
        /// Supplied argument count
        got: usize,
    },

    /// Invalid arguments provided to a native library function
    #[error("Invalid arguments for {tool}: {reason}")]
    InvalidArguments {
        /// Function name
        tool: String,
        /// Reason for invalidity
        reason: String,
    },

    /// A closure outlived every callable that kept its module loaded
    #[error("Module {name} is no longer loaded")]
    ModuleUnloaded {
        /// Module name
        name: String,
    },

    /// General runtime error
    #[error("Runtime error: {0}")]
    RuntimeError(String),

    // Pipeline errors
    /// No classification branch matched the expression
    #[error("Invalid expression provided: '{expression}'")]
    ClassificationExhausted {
        /// The expression text
        expression: String,
    },

    /// The compiler rejected a unit
    ///
    /// **Triggered by:** Undefined names, arity mismatches, syntax errors in synthesized units
    /// **Recovery:** Permanent for this text; edit the expression and resubmit
    #[error("Failed to process expression: {source_text}\n Error: {}", join_diagnostics(.diagnostics))]
    CompileFailure {
        /// The first unit that was submitted
        source_text: String,
        /// All diagnostics reported by the compiler
        diagnostics: Vec<Diagnostic>,
    },

    /// A compiled module lacks the entry point, overload or hook field the pipeline expects
    #[error("Binding failure: {0}")]
    BindingFailure(String),

    /// An external source or module reference could not be read or loaded
    #[error("Unable to load '{path}': {reason}")]
    ResourceFailure {
        /// The referenced path
        path: String,
        /// Failure reason
        reason: String,
    },

    /// A support mapping entry is unusable
    #[error("Invalid support expression '{name}': {reason}")]
    InvalidSupport {
        /// Support entry name
        name: String,
        /// Reason it was rejected
        reason: String,
    },

    /// Any pipeline failure, wrapped with the expression that caused it
    #[error("Unable to compile expression: '{expression}'\n {source}")]
    Expression {
        /// The original expression text
        expression: String,
        /// Underlying failure
        source: Box<Error>,
    },
}

/// Error severity classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    /// Internal invariant violation; never retried
    Fatal,
    /// Caused by the input; may succeed after the caller edits and resubmits
    Recoverable,
    /// Raised while evaluating a compiled expression against a particular input
    Warning,
}

impl Error {
    /// Create a runtime error with a message
    pub fn runtime(msg: impl Into<String>) -> Self {
        Error::RuntimeError(msg.into())
    }

    /// Create a binding error with a message
    pub fn binding(msg: impl Into<String>) -> Self {
        Error::BindingFailure(msg.into())
    }

    /// Wrap an error with the expression text that produced it
    pub fn in_expression(self, expression: impl Into<String>) -> Self {
        Error::Expression {
            expression: expression.into(),
            source: Box::new(self),
        }
    }

    /// Returns the innermost error, looking through expression wrappers
    pub fn root_cause(&self) -> &Error {
        match self {
            Error::Expression { source, .. } => source.root_cause(),
            other => other,
        }
    }

    /// Classify error severity
    pub fn classify(&self) -> ErrorSeverity {
        match self {
            Error::Expression { source, .. } => source.classify(),

            Error::BindingFailure(_) => ErrorSeverity::Fatal,
            Error::ClassificationExhausted { .. } => ErrorSeverity::Fatal,

            Error::CompileFailure { .. } => ErrorSeverity::Recoverable,
            Error::ResourceFailure { .. } => ErrorSeverity::Recoverable,
            Error::InvalidSupport { .. } => ErrorSeverity::Recoverable,
            Error::SyntaxError { .. } => ErrorSeverity::Recoverable,
            Error::ParseError(_) => ErrorSeverity::Recoverable,
            Error::UnexpectedEof => ErrorSeverity::Recoverable,

            _ => ErrorSeverity::Warning,
        }
    }

    /// Get enhanced error message with available fields (for UndefinedVariable errors)
    pub fn enhanced_message(&self) -> String {
        match self {
            Error::UndefinedVariable {
                name,
                available_fields,
            } => {
                let base = format!("Undefined variable: {}", name);
                if let Some(fields) = available_fields {
                    if !fields.is_empty() {
                        return format!("{}. Record has fields: [{}]", base, fields.join(", "));
                    }
                }
                base
            }
            _ => self.to_string(),
        }
    }
}

/// Result type for Lucid operations
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compile_failure_joins_diagnostics() {
        let err = Error::CompileFailure {
            source_text: "unit".to_string(),
            diagnostics: vec![
                Diagnostic::new(1, 2, "first"),
                Diagnostic::new(3, 4, "second"),
            ],
        };
        let message = err.to_string();
        assert!(message.contains("(1,2): error: first"));
        assert!(message.contains("(3,4): error: second"));
    }

    #[test]
    fn test_wrapped_errors_keep_cause() {
        let err = Error::binding("missing execute").in_expression("x => x");
        assert!(err.to_string().contains("Unable to compile expression: 'x => x'"));
        assert!(err.to_string().contains("missing execute"));
        assert!(matches!(err.root_cause(), Error::BindingFailure(_)));
        assert_eq!(err.classify(), ErrorSeverity::Fatal);
    }

    #[test]
    fn test_parse_errors_are_recoverable() {
        let syntax = Error::SyntaxError {
            line: 1,
            col: 7,
            message: "Expected `)`".to_string(),
        };
        assert_eq!(syntax.classify(), ErrorSeverity::Recoverable);
        assert_eq!(Error::UnexpectedEof.classify(), ErrorSeverity::Recoverable);
        assert_eq!(
            Error::ParseError("bad unit".to_string()).classify(),
            ErrorSeverity::Recoverable
        );
    }

    #[test]
    fn test_enhanced_message_lists_fields() {
        let err = Error::UndefinedVariable {
            name: "age".to_string(),
            available_fields: Some(vec!["first".to_string(), "last".to_string()]),
        };
        assert_eq!(
            err.enhanced_message(),
            "Undefined variable: age. Record has fields: [first, last]"
        );
    }
}
