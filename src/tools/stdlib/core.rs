//! `core` library: math, string and conversion helpers

use super::arg;
use crate::error::{Error, Result};
use crate::runtime::Value;
use crate::tools::{Library, Tool};

/// Build the `core` library
pub fn library() -> Library {
    let mut library = Library::new("core");
    library.register(AbsTool);
    library.register(MaxTool);
    library.register(MinTool);
    library.register(RoundTool);
    library.register(FloorTool);
    library.register(CeilingTool);
    library.register(SqrtTool);
    library.register(PowTool);
    library.export("Math.PI", Value::Float(std::f64::consts::PI));
    library.register(JoinTool);
    library.register(ConcatTool);
    library.register(IsNullOrEmptyTool);
    library.register(ToInt32Tool);
    library.register(ToDoubleTool);
    library.register(ToStringTool);
    library.register(ToBooleanTool);
    library
}

/// Tool for calculating absolute value of a number
///
/// Usage: `Math.Abs(number) -> number`
/// Example: `Math.Abs(-5)` returns `5`
pub struct AbsTool;

impl Tool for AbsTool {
    fn name(&self) -> &str {
        "Math.Abs"
    }

    fn description(&self) -> &str {
        "Absolute value"
    }

    fn arity(&self) -> Option<usize> {
        Some(1)
    }

    fn execute(&self, args: &[Value]) -> Result<Value> {
        match arg(self.name(), args, 0)? {
            Value::Int(n) => Ok(Value::Int(n.saturating_abs())),
            Value::Float(f) => Ok(Value::Float(f.abs())),
            other => Err(Error::TypeError {
                expected: "number".to_string(),
                got: other.type_name(),
            }),
        }
    }
}

/// Larger of two numbers; stays integral when both are integers
///
/// Usage: `Math.Max(a, b) -> number`
pub struct MaxTool;

impl Tool for MaxTool {
    fn name(&self) -> &str {
        "Math.Max"
    }

    fn description(&self) -> &str {
        "Larger of two numbers"
    }

    fn arity(&self) -> Option<usize> {
        Some(2)
    }

    fn execute(&self, args: &[Value]) -> Result<Value> {
        pick(self.name(), args, |a, b| a >= b)
    }
}

/// Smaller of two numbers; stays integral when both are integers
///
/// Usage: `Math.Min(a, b) -> number`
pub struct MinTool;

impl Tool for MinTool {
    fn name(&self) -> &str {
        "Math.Min"
    }

    fn description(&self) -> &str {
        "Smaller of two numbers"
    }

    fn arity(&self) -> Option<usize> {
        Some(2)
    }

    fn execute(&self, args: &[Value]) -> Result<Value> {
        pick(self.name(), args, |a, b| a <= b)
    }
}

fn pick(tool: &str, args: &[Value], keep_first: impl Fn(f64, f64) -> bool) -> Result<Value> {
    let (a, b) = (arg(tool, args, 0)?, arg(tool, args, 1)?);
    match (a, b) {
        (Value::Int(x), Value::Int(y)) => Ok(Value::Int(if keep_first(*x as f64, *y as f64) {
            *x
        } else {
            *y
        })),
        _ => {
            let (x, y) = (a.as_float()?, b.as_float()?);
            Ok(Value::Float(if keep_first(x, y) { x } else { y }))
        }
    }
}

/// Tool for rounding a number to the nearest integer (halves away from zero)
pub struct RoundTool;

impl Tool for RoundTool {
    fn name(&self) -> &str {
        "Math.Round"
    }

    fn description(&self) -> &str {
        "Round to nearest integer"
    }

    fn arity(&self) -> Option<usize> {
        Some(1)
    }

    fn execute(&self, args: &[Value]) -> Result<Value> {
        float_unary(self.name(), args, f64::round)
    }
}

/// Tool for rounding down
pub struct FloorTool;

impl Tool for FloorTool {
    fn name(&self) -> &str {
        "Math.Floor"
    }

    fn description(&self) -> &str {
        "Round down"
    }

    fn arity(&self) -> Option<usize> {
        Some(1)
    }

    fn execute(&self, args: &[Value]) -> Result<Value> {
        float_unary(self.name(), args, f64::floor)
    }
}

/// Tool for rounding up
pub struct CeilingTool;

impl Tool for CeilingTool {
    fn name(&self) -> &str {
        "Math.Ceiling"
    }

    fn description(&self) -> &str {
        "Round up"
    }

    fn arity(&self) -> Option<usize> {
        Some(1)
    }

    fn execute(&self, args: &[Value]) -> Result<Value> {
        float_unary(self.name(), args, f64::ceil)
    }
}

/// Integers pass through unchanged; doubles are mapped by `f`
fn float_unary(tool: &str, args: &[Value], f: fn(f64) -> f64) -> Result<Value> {
    match arg(tool, args, 0)? {
        Value::Int(n) => Ok(Value::Int(*n)),
        other => Ok(Value::Float(f(other.as_float()?))),
    }
}

/// Tool for calculating square root of a number
///
/// Usage: `Math.Sqrt(number) -> double`
/// Example: `Math.Sqrt(16)` returns `4.0`
pub struct SqrtTool;

impl Tool for SqrtTool {
    fn name(&self) -> &str {
        "Math.Sqrt"
    }

    fn description(&self) -> &str {
        "Square root"
    }

    fn arity(&self) -> Option<usize> {
        Some(1)
    }

    fn execute(&self, args: &[Value]) -> Result<Value> {
        let val = arg(self.name(), args, 0)?.as_float()?;
        Ok(Value::Float(val.sqrt()))
    }
}

/// Tool for raising a base to an exponent (base^exponent)
///
/// Usage: `Math.Pow(base, exponent) -> double`
/// Example: `Math.Pow(2, 8)` returns `256.0`
pub struct PowTool;

impl Tool for PowTool {
    fn name(&self) -> &str {
        "Math.Pow"
    }

    fn description(&self) -> &str {
        "Power (base^exponent)"
    }

    fn arity(&self) -> Option<usize> {
        Some(2)
    }

    fn execute(&self, args: &[Value]) -> Result<Value> {
        let base = arg(self.name(), args, 0)?.as_float()?;
        let exp = arg(self.name(), args, 1)?.as_float()?;
        Ok(Value::Float(base.powf(exp)))
    }
}

/// Joins the display text of an array's items
///
/// Usage: `String.Join(separator, array) -> string`
/// Example: `String.Join(", ", ["a", 1])` returns `"a, 1"`
pub struct JoinTool;

impl Tool for JoinTool {
    fn name(&self) -> &str {
        "String.Join"
    }

    fn description(&self) -> &str {
        "Join array items with a separator"
    }

    fn arity(&self) -> Option<usize> {
        Some(2)
    }

    fn execute(&self, args: &[Value]) -> Result<Value> {
        let separator = arg(self.name(), args, 0)?.to_display_string();
        let items = arg(self.name(), args, 1)?.as_array()?;
        let joined = items
            .iter()
            .map(Value::to_display_string)
            .collect::<Vec<_>>()
            .join(&separator);
        Ok(Value::String(joined))
    }
}

/// Concatenates the display text of every argument
///
/// Usage: `String.Concat(a, b, ...) -> string`
pub struct ConcatTool;

impl Tool for ConcatTool {
    fn name(&self) -> &str {
        "String.Concat"
    }

    fn description(&self) -> &str {
        "Concatenate values as text"
    }

    fn execute(&self, args: &[Value]) -> Result<Value> {
        Ok(Value::String(
            args.iter().map(Value::to_display_string).collect(),
        ))
    }
}

/// True for `null` and `""`
pub struct IsNullOrEmptyTool;

impl Tool for IsNullOrEmptyTool {
    fn name(&self) -> &str {
        "String.IsNullOrEmpty"
    }

    fn description(&self) -> &str {
        "Check for a null or empty string"
    }

    fn arity(&self) -> Option<usize> {
        Some(1)
    }

    fn execute(&self, args: &[Value]) -> Result<Value> {
        match arg(self.name(), args, 0)? {
            Value::Null => Ok(Value::Bool(true)),
            Value::String(s) => Ok(Value::Bool(s.is_empty())),
            other => Err(Error::TypeError {
                expected: "string".to_string(),
                got: other.type_name(),
            }),
        }
    }
}

/// Converts numbers, numeric text and booleans to an integer
///
/// Usage: `Convert.ToInt32(value) -> int`
/// Example: `Convert.ToInt32("42")` returns `42`
pub struct ToInt32Tool;

impl Tool for ToInt32Tool {
    fn name(&self) -> &str {
        "Convert.ToInt32"
    }

    fn description(&self) -> &str {
        "Convert to integer"
    }

    fn arity(&self) -> Option<usize> {
        Some(1)
    }

    fn execute(&self, args: &[Value]) -> Result<Value> {
        match arg(self.name(), args, 0)? {
            Value::Null => Ok(Value::Int(0)),
            Value::Int(n) => Ok(Value::Int(*n)),
            Value::Float(f) => Ok(Value::Int(f.round() as i64)),
            Value::Bool(b) => Ok(Value::Int(*b as i64)),
            Value::String(s) => s.trim().parse().map(Value::Int).map_err(|_| {
                Error::InvalidArguments {
                    tool: self.name().to_string(),
                    reason: format!("'{}' is not an integer", s),
                }
            }),
            other => Err(Error::TypeError {
                expected: "number or string".to_string(),
                got: other.type_name(),
            }),
        }
    }
}

/// Converts numbers and numeric text to a double
pub struct ToDoubleTool;

impl Tool for ToDoubleTool {
    fn name(&self) -> &str {
        "Convert.ToDouble"
    }

    fn description(&self) -> &str {
        "Convert to double"
    }

    fn arity(&self) -> Option<usize> {
        Some(1)
    }

    fn execute(&self, args: &[Value]) -> Result<Value> {
        match arg(self.name(), args, 0)? {
            Value::Null => Ok(Value::Float(0.0)),
            Value::String(s) => s.trim().parse().map(Value::Float).map_err(|_| {
                Error::InvalidArguments {
                    tool: self.name().to_string(),
                    reason: format!("'{}' is not a number", s),
                }
            }),
            other => Ok(Value::Float(other.as_float()?)),
        }
    }
}

/// Display text of any value
pub struct ToStringTool;

impl Tool for ToStringTool {
    fn name(&self) -> &str {
        "Convert.ToString"
    }

    fn description(&self) -> &str {
        "Convert to string"
    }

    fn arity(&self) -> Option<usize> {
        Some(1)
    }

    fn execute(&self, args: &[Value]) -> Result<Value> {
        Ok(Value::String(
            arg(self.name(), args, 0)?.to_display_string(),
        ))
    }
}

/// Converts booleans, numbers and `"true"`/`"false"` text to a bool
pub struct ToBooleanTool;

impl Tool for ToBooleanTool {
    fn name(&self) -> &str {
        "Convert.ToBoolean"
    }

    fn description(&self) -> &str {
        "Convert to bool"
    }

    fn arity(&self) -> Option<usize> {
        Some(1)
    }

    fn execute(&self, args: &[Value]) -> Result<Value> {
        match arg(self.name(), args, 0)? {
            Value::Null => Ok(Value::Bool(false)),
            Value::Bool(b) => Ok(Value::Bool(*b)),
            Value::Int(n) => Ok(Value::Bool(*n != 0)),
            Value::Float(f) => Ok(Value::Bool(*f != 0.0)),
            Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" => Ok(Value::Bool(true)),
                "false" => Ok(Value::Bool(false)),
                _ => Err(Error::InvalidArguments {
                    tool: self.name().to_string(),
                    reason: format!("'{}' is not a boolean", s),
                }),
            },
            other => Err(Error::TypeError {
                expected: "bool".to_string(),
                got: other.type_name(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_math() {
        assert_eq!(AbsTool.execute(&[Value::Int(-5)]).unwrap(), Value::Int(5));
        assert_eq!(
            MaxTool.execute(&[Value::Int(3), Value::Int(7)]).unwrap(),
            Value::Int(7)
        );
        assert_eq!(
            MinTool.execute(&[Value::Int(3), Value::Float(1.5)]).unwrap(),
            Value::Float(1.5)
        );
        assert_eq!(RoundTool.execute(&[Value::Float(2.5)]).unwrap(), Value::Float(3.0));
        assert_eq!(
            PowTool.execute(&[Value::Int(2), Value::Int(8)]).unwrap(),
            Value::Float(256.0)
        );
        assert!(SqrtTool.execute(&[]).is_err());
    }

    #[test]
    fn test_strings() {
        let items = Value::array(vec![Value::from("a"), Value::Int(1)]);
        assert_eq!(
            JoinTool.execute(&[Value::from(", "), items]).unwrap(),
            Value::from("a, 1")
        );
        assert_eq!(
            ConcatTool
                .execute(&[Value::from("x"), Value::Int(2), Value::Null])
                .unwrap(),
            Value::from("x2")
        );
        assert_eq!(
            IsNullOrEmptyTool.execute(&[Value::Null]).unwrap(),
            Value::Bool(true)
        );
    }

    #[test]
    fn test_conversions() {
        assert_eq!(
            ToInt32Tool.execute(&[Value::from(" 42 ")]).unwrap(),
            Value::Int(42)
        );
        assert!(ToInt32Tool.execute(&[Value::from("x")]).is_err());
        assert_eq!(
            ToDoubleTool.execute(&[Value::from("2.5")]).unwrap(),
            Value::Float(2.5)
        );
        assert_eq!(
            ToBooleanTool.execute(&[Value::from("True")]).unwrap(),
            Value::Bool(true)
        );
        assert_eq!(
            ToStringTool.execute(&[Value::Float(1.5)]).unwrap(),
            Value::from("1.5")
        );
    }

    #[test]
    fn test_library_contents() {
        let library = library();
        assert_eq!(library.name(), "core");
        assert!(library.has("Math.PI"));
        assert!(library.has("Convert.ToInt32"));
    }
}
