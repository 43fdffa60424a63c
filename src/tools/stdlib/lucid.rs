//! `lucid` library: lambda text utilities callable from expressions

use super::arg;
use crate::error::Result;
use crate::lambda;
use crate::runtime::Value;
use crate::tools::{Library, Tool};

/// Build the `lucid` library
pub fn library() -> Library {
    let mut library = Library::new("lucid");
    library.register(FormatTool);
    library.register(ParameterCountTool);
    library.register(IsLambdaTool);
    library
}

/// Tool for canonically reformatting a function literal
///
/// Usage: `Lucid.Format(source) -> string`
/// Example: `Lucid.Format("(a,b)=>a+b")` returns `"(a, b) => a + b"`
pub struct FormatTool;

impl Tool for FormatTool {
    fn name(&self) -> &str {
        "Lucid.Format"
    }

    fn description(&self) -> &str {
        "Reformat a function literal"
    }

    fn arity(&self) -> Option<usize> {
        Some(1)
    }

    fn execute(&self, args: &[Value]) -> Result<Value> {
        let source = arg(self.name(), args, 0)?.as_string()?;
        Ok(Value::String(lambda::reformat(source)?))
    }
}

/// Tool for counting the parameters of a function literal
///
/// Usage: `Lucid.ParameterCount(source) -> int`
pub struct ParameterCountTool;

impl Tool for ParameterCountTool {
    fn name(&self) -> &str {
        "Lucid.ParameterCount"
    }

    fn description(&self) -> &str {
        "Parameter count of a function literal"
    }

    fn arity(&self) -> Option<usize> {
        Some(1)
    }

    fn execute(&self, args: &[Value]) -> Result<Value> {
        let source = arg(self.name(), args, 0)?.as_string()?;
        Ok(Value::Int(lambda::parameter_count(source) as i64))
    }
}

/// Tool for checking whether text is a function literal
///
/// Usage: `Lucid.IsLambda(text) -> bool`
pub struct IsLambdaTool;

impl Tool for IsLambdaTool {
    fn name(&self) -> &str {
        "Lucid.IsLambda"
    }

    fn description(&self) -> &str {
        "Check for a function literal"
    }

    fn arity(&self) -> Option<usize> {
        Some(1)
    }

    fn execute(&self, args: &[Value]) -> Result<Value> {
        let text = arg(self.name(), args, 0)?.as_string()?;
        Ok(Value::Bool(lambda::is_lambda(text)))
    }
}
