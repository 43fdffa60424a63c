//! `dynamic` library: records and JSON over dynamic values

use std::collections::HashMap;

use super::arg;
use crate::error::{Error, Result};
use crate::runtime::Value;
use crate::tools::{Library, Tool};

/// Build the `dynamic` library
pub fn library() -> Library {
    let mut library = Library::new("dynamic");
    library.register(GetTool);
    library.register(HasTool);
    library.register(KeysTool);
    library.register(SetTool);
    library.register(ParseTool);
    library.register(StringifyTool);
    library
}

fn key<'a>(tool: &str, args: &'a [Value], index: usize) -> Result<&'a str> {
    arg(tool, args, index)?.as_string()
}

/// Tool for reading a record field, `null` when absent
///
/// Usage: `Record.Get(record, key) -> value`
/// Example: `Record.Get(new { a = 1 }, "b")` returns `null`
pub struct GetTool;

impl Tool for GetTool {
    fn name(&self) -> &str {
        "Record.Get"
    }

    fn description(&self) -> &str {
        "Read a record field or null"
    }

    fn arity(&self) -> Option<usize> {
        Some(2)
    }

    fn execute(&self, args: &[Value]) -> Result<Value> {
        let record = arg(self.name(), args, 0)?;
        let key = key(self.name(), args, 1)?;
        match record {
            Value::Null => Ok(Value::Null),
            other => Ok(other.as_object()?.get(key).cloned().unwrap_or(Value::Null)),
        }
    }
}

/// Tool for checking if a record carries a field
///
/// Usage: `Record.Has(record, key) -> bool`
pub struct HasTool;

impl Tool for HasTool {
    fn name(&self) -> &str {
        "Record.Has"
    }

    fn description(&self) -> &str {
        "Check if a record carries a field"
    }

    fn arity(&self) -> Option<usize> {
        Some(2)
    }

    fn execute(&self, args: &[Value]) -> Result<Value> {
        let record = arg(self.name(), args, 0)?;
        let key = key(self.name(), args, 1)?;
        match record {
            Value::Object(fields) => Ok(Value::Bool(fields.contains_key(key))),
            _ => Ok(Value::Bool(false)),
        }
    }
}

/// Tool for listing record field names in sorted order
///
/// Usage: `Record.Keys(record) -> array`
pub struct KeysTool;

impl Tool for KeysTool {
    fn name(&self) -> &str {
        "Record.Keys"
    }

    fn description(&self) -> &str {
        "Sorted field names of a record"
    }

    fn arity(&self) -> Option<usize> {
        Some(1)
    }

    fn execute(&self, args: &[Value]) -> Result<Value> {
        let fields = arg(self.name(), args, 0)?.as_object()?;
        let mut keys: Vec<&String> = fields.keys().collect();
        keys.sort();
        Ok(Value::array(
            keys.into_iter().map(|k| Value::String(k.clone())).collect(),
        ))
    }
}

/// Tool for producing a copy of a record with one field replaced.
/// A `null` record starts empty.
///
/// Usage: `Record.Set(record, key, value) -> record`
pub struct SetTool;

impl Tool for SetTool {
    fn name(&self) -> &str {
        "Record.Set"
    }

    fn description(&self) -> &str {
        "Copy of a record with one field set"
    }

    fn arity(&self) -> Option<usize> {
        Some(3)
    }

    fn execute(&self, args: &[Value]) -> Result<Value> {
        let mut fields = match arg(self.name(), args, 0)? {
            Value::Null => HashMap::new(),
            other => other.as_object()?.clone(),
        };
        let key = key(self.name(), args, 1)?;
        let value = arg(self.name(), args, 2)?.clone();
        fields.insert(key.to_string(), value);
        Ok(Value::object(fields))
    }
}

/// Tool for parsing JSON text into a dynamic value
///
/// Usage: `Json.Parse(text) -> value`
/// Example: `Json.Parse("{\"a\": 1}").a` returns `1`
pub struct ParseTool;

impl Tool for ParseTool {
    fn name(&self) -> &str {
        "Json.Parse"
    }

    fn description(&self) -> &str {
        "Parse JSON text"
    }

    fn arity(&self) -> Option<usize> {
        Some(1)
    }

    fn execute(&self, args: &[Value]) -> Result<Value> {
        let text = arg(self.name(), args, 0)?.as_string()?;
        let json: serde_json::Value =
            serde_json::from_str(text).map_err(|e| Error::InvalidArguments {
                tool: self.name().to_string(),
                reason: e.to_string(),
            })?;
        Ok(Value::from_json(&json))
    }
}

/// Tool for rendering a value as compact JSON with sorted keys
///
/// Usage: `Json.Stringify(value) -> string`
pub struct StringifyTool;

impl Tool for StringifyTool {
    fn name(&self) -> &str {
        "Json.Stringify"
    }

    fn description(&self) -> &str {
        "Render a value as JSON"
    }

    fn arity(&self) -> Option<usize> {
        Some(1)
    }

    fn execute(&self, args: &[Value]) -> Result<Value> {
        let json = arg(self.name(), args, 0)?.to_json();
        Ok(Value::String(json.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Value {
        Value::record([("b", Value::Int(2)), ("a", Value::from("x"))])
    }

    #[test]
    fn test_record_access() {
        assert_eq!(
            GetTool.execute(&[sample(), Value::from("a")]).unwrap(),
            Value::from("x")
        );
        assert_eq!(
            GetTool.execute(&[sample(), Value::from("zz")]).unwrap(),
            Value::Null
        );
        assert_eq!(
            HasTool.execute(&[sample(), Value::from("b")]).unwrap(),
            Value::Bool(true)
        );
        assert_eq!(
            KeysTool.execute(&[sample()]).unwrap(),
            Value::array(vec![Value::from("a"), Value::from("b")])
        );
    }

    #[test]
    fn test_set_copies() {
        let original = sample();
        let updated = SetTool
            .execute(&[original.clone(), Value::from("c"), Value::Bool(true)])
            .unwrap();
        assert_eq!(updated.get_field("c").unwrap(), Value::Bool(true));
        assert!(original.get_field("c").is_err());
    }

    #[test]
    fn test_json() {
        let parsed = ParseTool
            .execute(&[Value::from(r#"{"n": 1, "items": [1.5, null]}"#)])
            .unwrap();
        assert_eq!(parsed.get_field("n").unwrap(), Value::Int(1));

        let text = StringifyTool.execute(&[sample()]).unwrap();
        assert_eq!(text, Value::from(r#"{"a":"x","b":2}"#));

        assert!(matches!(
            ParseTool.execute(&[Value::from("{")]),
            Err(Error::InvalidArguments { .. })
        ));
    }
}
