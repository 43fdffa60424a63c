use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use super::evaluator::Closure;
use crate::error::{Error, Result};
use crate::tools::Tool;

/// Runtime value representation
///
/// This is the dynamic boundary of compiled expressions: every argument,
/// intermediate and result is a `Value`.
#[derive(Debug, Clone)]
pub enum Value {
    // Primitives
    /// Null value
    Null,
    /// Boolean value
    Bool(bool),
    /// 64-bit integer value
    Int(i64),
    /// 64-bit floating-point value
    Float(f64),
    /// String value
    String(String),

    // Collections (use Arc for large values)
    /// Array of values (reference-counted)
    Array(Arc<Vec<Value>>),
    /// Record with string keys and value fields (reference-counted)
    Object(Arc<HashMap<String, Value>>),

    // Callables
    /// Function literal created by compiled code
    Function(Arc<Closure>),
    /// Native function exported by a reference library
    Native(Arc<dyn Tool>),
}

impl Value {
    /// Creates an array value from a vector of values
    pub fn array(values: Vec<Value>) -> Self {
        Value::Array(Arc::new(values))
    }

    /// Creates a record value from a hashmap of fields
    pub fn object(fields: HashMap<String, Value>) -> Self {
        Value::Object(Arc::new(fields))
    }

    /// Creates a record value from `(name, value)` pairs
    pub fn record<K, I>(fields: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Value)>,
    {
        Value::Object(Arc::new(
            fields.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        ))
    }

    /// Wraps a native function
    pub fn native<T: Tool + 'static>(tool: T) -> Self {
        Value::Native(Arc::new(tool))
    }

    /// Returns the type name as a string
    pub fn type_name(&self) -> String {
        match self {
            Value::Null => "null".to_string(),
            Value::Bool(_) => "bool".to_string(),
            Value::Int(_) => "int".to_string(),
            Value::Float(_) => "double".to_string(),
            Value::String(_) => "string".to_string(),
            Value::Array(_) => "array".to_string(),
            Value::Object(_) => "record".to_string(),
            Value::Function(_) => "function".to_string(),
            Value::Native(_) => "native function".to_string(),
        }
    }

    /// True for `null`
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    // Type conversion methods

    /// Returns the boolean value. Conditions are strict: only `bool` qualifies.
    pub fn as_bool(&self) -> Result<bool> {
        match self {
            Value::Bool(b) => Ok(*b),
            _ => Err(Error::TypeError {
                expected: "bool".to_string(),
                got: self.type_name(),
            }),
        }
    }

    /// Converts value to a 64-bit integer
    pub fn as_int(&self) -> Result<i64> {
        match self {
            Value::Int(n) => Ok(*n),
            Value::Float(f) if f.fract() == 0.0 => Ok(*f as i64),
            _ => Err(Error::TypeError {
                expected: "int".to_string(),
                got: self.type_name(),
            }),
        }
    }

    /// Converts value to a 64-bit floating-point number
    pub fn as_float(&self) -> Result<f64> {
        match self {
            Value::Float(f) => Ok(*f),
            Value::Int(n) => Ok(*n as f64),
            _ => Err(Error::TypeError {
                expected: "double".to_string(),
                got: self.type_name(),
            }),
        }
    }

    /// Returns a reference to the string value
    pub fn as_string(&self) -> Result<&str> {
        match self {
            Value::String(s) => Ok(s),
            _ => Err(Error::TypeError {
                expected: "string".to_string(),
                got: self.type_name(),
            }),
        }
    }

    /// Returns a reference to the array value
    pub fn as_array(&self) -> Result<&Vec<Value>> {
        match self {
            Value::Array(arr) => Ok(arr),
            _ => Err(Error::TypeError {
                expected: "array".to_string(),
                got: self.type_name(),
            }),
        }
    }

    /// Returns a reference to the record value
    pub fn as_object(&self) -> Result<&HashMap<String, Value>> {
        match self {
            Value::Object(obj) => Ok(obj),
            _ => Err(Error::TypeError {
                expected: "record".to_string(),
                got: self.type_name(),
            }),
        }
    }

    /// Text used by string concatenation, interpolation and `ToString()`
    pub fn to_display_string(&self) -> String {
        match self {
            Value::Null => String::new(),
            Value::Bool(true) => "True".to_string(),
            Value::Bool(false) => "False".to_string(),
            Value::Int(n) => n.to_string(),
            Value::Float(f) => f.to_string(),
            Value::String(s) => s.clone(),
            Value::Array(_) | Value::Object(_) => self.to_json().to_string(),
            Value::Function(closure) => format!("<function({} params)>", closure.params()),
            Value::Native(tool) => format!("<native {}>", tool.name()),
        }
    }

    /// Gets a field value from a record by name
    pub fn get_field(&self, field: &str) -> Result<Value> {
        match self {
            Value::Object(obj) => obj.get(field).cloned().ok_or_else(|| {
                // Collect available fields to help debugging
                let mut available: Vec<String> = obj.keys().cloned().collect();
                available.sort();
                tracing::debug!(field, ?available, "record field not found");
                Error::UndefinedVariable {
                    name: field.to_string(),
                    available_fields: Some(available),
                }
            }),
            _ => Err(Error::TypeError {
                expected: "record".to_string(),
                got: self.type_name(),
            }),
        }
    }

    /// Gets an element from an array, a character from a string, or a field
    /// from a record by key
    pub fn get_index(&self, index: &Value) -> Result<Value> {
        match self {
            Value::Array(arr) => {
                let idx = Self::checked_index(index, arr.len())?;
                Ok(arr[idx].clone())
            }
            Value::String(s) => {
                let length = s.chars().count();
                let idx = Self::checked_index(index, length)?;
                Ok(s.chars()
                    .nth(idx)
                    .map(|c| Value::String(c.to_string()))
                    .unwrap_or(Value::Null))
            }
            Value::Object(_) => self.get_field(index.as_string()?),
            _ => Err(Error::TypeError {
                expected: "array, string or record".to_string(),
                got: self.type_name(),
            }),
        }
    }

    fn checked_index(index: &Value, length: usize) -> Result<usize> {
        let raw = index.as_int()?;
        if raw < 0 || raw as usize >= length {
            return Err(Error::IndexOutOfBounds {
                index: raw.max(0) as usize,
                length,
            });
        }
        Ok(raw as usize)
    }

    /// Number of parameters a callable value accepts, if known
    pub fn parameter_count(&self) -> Option<usize> {
        match self {
            Value::Function(closure) => Some(closure.params()),
            Value::Native(tool) => tool.arity(),
            _ => None,
        }
    }

    /// Invokes a callable value
    pub fn call(&self, args: Vec<Value>) -> Result<Value> {
        match self {
            Value::Function(closure) => closure.invoke(args),
            Value::Native(tool) => {
                if let Some(expected) = tool.arity() {
                    if expected != args.len() {
                        return Err(Error::ArityMismatch {
                            name: tool.name().to_string(),
                            expected,
                            got: args.len(),
                        });
                    }
                }
                tool.execute(&args)
            }
            other => Err(Error::NotCallable {
                type_name: other.type_name(),
            }),
        }
    }

    /// Converts to JSON. Callables and non-finite floats become `null`.
    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::Value as Json;

        match self {
            Value::Null | Value::Function(_) | Value::Native(_) => Json::Null,
            Value::Bool(b) => Json::Bool(*b),
            Value::Int(n) => Json::from(*n),
            Value::Float(f) => serde_json::Number::from_f64(*f)
                .map(Json::Number)
                .unwrap_or(Json::Null),
            Value::String(s) => Json::String(s.clone()),
            Value::Array(arr) => Json::Array(arr.iter().map(Value::to_json).collect()),
            Value::Object(obj) => {
                let mut keys: Vec<&String> = obj.keys().collect();
                keys.sort();
                Json::Object(
                    keys.into_iter()
                        .map(|k| (k.clone(), obj[k].to_json()))
                        .collect(),
                )
            }
        }
    }

    /// Converts from JSON. Integral numbers become `Int`, others `Float`.
    pub fn from_json(json: &serde_json::Value) -> Value {
        use serde_json::Value as Json;

        match json {
            Json::Null => Value::Null,
            Json::Bool(b) => Value::Bool(*b),
            Json::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            Json::String(s) => Value::String(s.clone()),
            Json::Array(items) => Value::array(items.iter().map(Value::from_json).collect()),
            Json::Object(fields) => Value::object(
                fields
                    .iter()
                    .map(|(k, v)| (k.clone(), Value::from_json(v)))
                    .collect(),
            ),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(n) => write!(f, "{}", n),
            Value::Float(fl) => write!(f, "{}", fl),
            Value::String(s) => write!(f, "\"{}\"", s),
            Value::Array(arr) => {
                write!(f, "[")?;
                for (i, val) in arr.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", val)?;
                }
                write!(f, "]")
            }
            Value::Object(obj) => {
                let mut keys: Vec<&String> = obj.keys().collect();
                keys.sort();
                write!(f, "{{")?;
                for (i, key) in keys.into_iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", key, obj[key])?;
                }
                write!(f, "}}")
            }
            Value::Function(closure) => write!(f, "<function({} params)>", closure.params()),
            Value::Native(tool) => write!(f, "<native {}>", tool.name()),
        }
    }
}

// Callables compare by identity
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => a == b,
            (Value::Function(a), Value::Function(b)) => Arc::ptr_eq(a, b),
            (Value::Native(a), Value::Native(b)) => {
                Arc::as_ptr(a) as *const () == Arc::as_ptr(b) as *const ()
            }
            _ => false,
        }
    }
}

impl PartialEq<Vec<Value>> for Value {
    fn eq(&self, other: &Vec<Value>) -> bool {
        match self {
            Value::Array(arr) => arr.as_ref() == other,
            _ => false,
        }
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Int(n as i64)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(values: Vec<Value>) -> Self {
        Value::array(values)
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        Value::from_json(&json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_names() {
        assert_eq!(Value::Null.type_name(), "null");
        assert_eq!(Value::Bool(true).type_name(), "bool");
        assert_eq!(Value::Int(42).type_name(), "int");
        assert_eq!(Value::Float(2.71).type_name(), "double");
        assert_eq!(Value::from("test").type_name(), "string");
        assert_eq!(Value::record([("a", Value::Int(1))]).type_name(), "record");
    }

    #[test]
    fn test_conversions() {
        let v = Value::Int(42);
        assert_eq!(v.as_int().unwrap(), 42);
        assert_eq!(v.as_float().unwrap(), 42.0);
        assert!(v.as_bool().is_err());

        let v = Value::Float(3.0);
        assert_eq!(v.as_int().unwrap(), 3);
        assert!(Value::Float(3.5).as_int().is_err());

        let v = Value::from("test");
        assert_eq!(v.as_string().unwrap(), "test");
    }

    #[test]
    fn test_display_string() {
        assert_eq!(Value::Null.to_display_string(), "");
        assert_eq!(Value::Bool(true).to_display_string(), "True");
        assert_eq!(Value::Float(2.0).to_display_string(), "2");
        assert_eq!(Value::Float(2.5).to_display_string(), "2.5");
        assert_eq!(
            Value::array(vec![Value::Int(1), Value::from("a")]).to_display_string(),
            "[1,\"a\"]"
        );
    }

    #[test]
    fn test_array_and_string_index() {
        let arr = Value::array(vec![Value::Int(1), Value::Int(2), Value::Int(3)]);
        assert_eq!(arr.get_index(&Value::Int(1)).unwrap(), Value::Int(2));
        assert!(matches!(
            arr.get_index(&Value::Int(5)),
            Err(Error::IndexOutOfBounds {
                index: 5,
                length: 3
            })
        ));
        assert!(arr.get_index(&Value::Int(-1)).is_err());

        let s = Value::from("héllo");
        assert_eq!(s.get_index(&Value::Int(1)).unwrap(), Value::from("é"));
    }

    #[test]
    fn test_record_fields() {
        let obj = Value::record([("name", Value::from("Alice")), ("age", Value::Int(30))]);
        assert_eq!(obj.get_field("name").unwrap(), Value::from("Alice"));
        assert_eq!(obj.get_index(&Value::from("age")).unwrap(), Value::Int(30));

        match obj.get_field("missing") {
            Err(Error::UndefinedVariable {
                available_fields: Some(fields),
                ..
            }) => assert_eq!(fields, vec!["age", "name"]),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_json_conversion() {
        let json = serde_json::json!({"first": "Ada", "scores": [1, 2.5], "ok": true, "none": null});
        let value = Value::from_json(&json);
        assert_eq!(value.get_field("first").unwrap(), Value::from("Ada"));
        assert_eq!(
            value.get_field("scores").unwrap(),
            vec![Value::Int(1), Value::Float(2.5)]
        );
        assert_eq!(value.to_json(), json);
    }

    #[test]
    fn test_call_requires_callable() {
        assert!(matches!(
            Value::Int(1).call(vec![]),
            Err(Error::NotCallable { .. })
        ));
    }
}
