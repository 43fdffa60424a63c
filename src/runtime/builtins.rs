//! Members available on every value: record fields, `Length`/`Count`
//! properties, and the string/array methods expressions can call.

use super::operators::values_equal;
use super::value::Value;
use crate::error::{Error, Result};

/// Reads `receiver.name`
pub fn get_member(receiver: &Value, name: &str) -> Result<Value> {
    match (receiver, name) {
        (Value::Object(_), _) => receiver.get_field(name),
        (Value::String(s), "Length") => Ok(Value::Int(s.chars().count() as i64)),
        (Value::Array(items), "Length") | (Value::Array(items), "Count") => {
            Ok(Value::Int(items.len() as i64))
        }
        (Value::Null, _) => Err(Error::runtime(format!(
            "Cannot read member '{}' of a null value",
            name
        ))),
        _ => Err(undefined(receiver, name)),
    }
}

/// Calls `receiver.name(args)`. A record field holding a function is called
/// directly; otherwise the built-in method table for the receiver applies.
pub fn invoke_member(receiver: &Value, name: &str, args: Vec<Value>) -> Result<Value> {
    if let Value::Object(fields) = receiver {
        if let Some(field) = fields.get(name) {
            return field.call(args);
        }
    }

    if name == "ToString" {
        expect_args(receiver, name, &args, 0)?;
        return Ok(Value::String(receiver.to_display_string()));
    }

    match receiver {
        Value::String(s) => string_method(receiver, s, name, args),
        Value::Array(items) => array_method(receiver, items, name, args),
        Value::Null => Err(Error::runtime(format!(
            "Cannot call method '{}' on a null value",
            name
        ))),
        _ => Err(undefined(receiver, name)),
    }
}

fn string_method(receiver: &Value, s: &str, name: &str, args: Vec<Value>) -> Result<Value> {
    match name {
        "ToUpper" => {
            expect_args(receiver, name, &args, 0)?;
            Ok(Value::String(s.to_uppercase()))
        }
        "ToLower" => {
            expect_args(receiver, name, &args, 0)?;
            Ok(Value::String(s.to_lowercase()))
        }
        "Trim" => {
            expect_args(receiver, name, &args, 0)?;
            Ok(Value::String(s.trim().to_string()))
        }
        "Contains" => {
            expect_args(receiver, name, &args, 1)?;
            Ok(Value::Bool(s.contains(args[0].as_string()?)))
        }
        "StartsWith" => {
            expect_args(receiver, name, &args, 1)?;
            Ok(Value::Bool(s.starts_with(args[0].as_string()?)))
        }
        "EndsWith" => {
            expect_args(receiver, name, &args, 1)?;
            Ok(Value::Bool(s.ends_with(args[0].as_string()?)))
        }
        "Replace" => {
            expect_args(receiver, name, &args, 2)?;
            let from = args[0].as_string()?;
            if from.is_empty() {
                return Err(Error::InvalidArguments {
                    tool: "string.Replace".to_string(),
                    reason: "String cannot be of zero length".to_string(),
                });
            }
            Ok(Value::String(s.replace(from, args[1].as_string()?)))
        }
        "IndexOf" => {
            expect_args(receiver, name, &args, 1)?;
            let needle = args[0].as_string()?;
            let index = s
                .find(needle)
                .map(|byte| s[..byte].chars().count() as i64)
                .unwrap_or(-1);
            Ok(Value::Int(index))
        }
        "Split" => {
            expect_args(receiver, name, &args, 1)?;
            let separator = args[0].as_string()?;
            let parts = if separator.is_empty() {
                vec![Value::String(s.to_string())]
            } else {
                s.split(separator)
                    .map(|part| Value::String(part.to_string()))
                    .collect()
            };
            Ok(Value::array(parts))
        }
        "Substring" => {
            if args.is_empty() || args.len() > 2 {
                return Err(Error::ArityMismatch {
                    name: "string.Substring".to_string(),
                    expected: 2,
                    got: args.len(),
                });
            }
            let chars: Vec<char> = s.chars().collect();
            let start = non_negative(&args[0], chars.len())?;
            let length = match args.get(1) {
                Some(n) => non_negative(n, chars.len())?,
                None => chars.len() - start,
            };
            if start + length > chars.len() {
                return Err(Error::IndexOutOfBounds {
                    index: start + length,
                    length: chars.len(),
                });
            }
            Ok(Value::String(chars[start..start + length].iter().collect()))
        }
        _ => Err(undefined(receiver, name)),
    }
}

fn array_method(receiver: &Value, items: &[Value], name: &str, args: Vec<Value>) -> Result<Value> {
    match name {
        "Count" => {
            expect_args(receiver, name, &args, 0)?;
            Ok(Value::Int(items.len() as i64))
        }
        "Contains" => {
            expect_args(receiver, name, &args, 1)?;
            Ok(Value::Bool(
                items.iter().any(|item| values_equal(item, &args[0])),
            ))
        }
        "First" | "Last" => {
            expect_args(receiver, name, &args, 0)?;
            let item = if name == "First" {
                items.first()
            } else {
                items.last()
            };
            item.cloned()
                .ok_or_else(|| Error::runtime("Sequence contains no elements"))
        }
        _ => Err(undefined(receiver, name)),
    }
}

fn non_negative(value: &Value, length: usize) -> Result<usize> {
    let n = value.as_int()?;
    if n < 0 || n as usize > length {
        return Err(Error::IndexOutOfBounds {
            index: n.max(0) as usize,
            length,
        });
    }
    Ok(n as usize)
}

fn expect_args(receiver: &Value, name: &str, args: &[Value], expected: usize) -> Result<()> {
    if args.len() != expected {
        return Err(Error::ArityMismatch {
            name: format!("{}.{}", receiver.type_name(), name),
            expected,
            got: args.len(),
        });
    }
    Ok(())
}

fn undefined(receiver: &Value, name: &str) -> Error {
    Error::UndefinedMember {
        type_name: receiver.type_name(),
        member: name.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call(receiver: impl Into<Value>, name: &str, args: Vec<Value>) -> Result<Value> {
        invoke_member(&receiver.into(), name, args)
    }

    #[test]
    fn test_string_methods() {
        assert_eq!(call(" Ab ", "Trim", vec![]).unwrap(), Value::from("Ab"));
        assert_eq!(call("Ab", "ToUpper", vec![]).unwrap(), Value::from("AB"));
        assert_eq!(
            call("a,b", "Split", vec![Value::from(",")]).unwrap(),
            vec![Value::from("a"), Value::from("b")]
        );
        assert_eq!(
            call("hello", "Substring", vec![Value::Int(1), Value::Int(3)]).unwrap(),
            Value::from("ell")
        );
        assert_eq!(
            call("hello", "Substring", vec![Value::Int(2)]).unwrap(),
            Value::from("llo")
        );
        assert_eq!(
            call("hello", "IndexOf", vec![Value::from("l")]).unwrap(),
            Value::Int(2)
        );
        assert_eq!(
            call("abc", "Replace", vec![Value::from("b"), Value::from("x")]).unwrap(),
            Value::from("axc")
        );
        assert!(call("hello", "Substring", vec![Value::Int(3), Value::Int(9)]).is_err());
    }

    #[test]
    fn test_properties() {
        assert_eq!(get_member(&Value::from("héllo"), "Length").unwrap(), Value::Int(5));
        let arr = Value::array(vec![Value::Int(1), Value::Int(2)]);
        assert_eq!(get_member(&arr, "Count").unwrap(), Value::Int(2));
        assert!(matches!(
            get_member(&Value::Int(1), "Length"),
            Err(Error::UndefinedMember { .. })
        ));
    }

    #[test]
    fn test_array_methods() {
        let arr = Value::array(vec![Value::Int(1), Value::Int(2)]);
        assert_eq!(
            invoke_member(&arr, "Contains", vec![Value::Float(2.0)]).unwrap(),
            Value::Bool(true)
        );
        assert_eq!(invoke_member(&arr, "Last", vec![]).unwrap(), Value::Int(2));
        assert!(invoke_member(&Value::array(vec![]), "First", vec![]).is_err());
    }

    #[test]
    fn test_to_string_and_arity() {
        assert_eq!(call(42, "ToString", vec![]).unwrap(), Value::from("42"));
        assert!(matches!(
            call("x", "ToUpper", vec![Value::Int(1)]),
            Err(Error::ArityMismatch { .. })
        ));
    }
}
