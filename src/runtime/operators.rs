//! Operator semantics for dynamic values
//!
//! Numeric operators promote `int` to `double` when the operands are mixed.
//! `+` concatenates as soon as either side is a string. Arithmetic involving
//! `null` yields `null`.

use std::sync::Arc;

use super::value::Value;
use crate::error::{Error, Result};
use crate::parser::{BinaryOp, UnaryOp};

/// Applies a strict (non short-circuit) binary operator
pub fn apply_binary_op(op: BinaryOp, left: Value, right: Value) -> Result<Value> {
    match op {
        BinaryOp::Add => match (left, right) {
            (Value::String(l), r) => Ok(Value::String(l + &r.to_display_string())),
            (l, Value::String(r)) => Ok(Value::String(l.to_display_string() + &r)),
            (Value::Int(l), Value::Int(r)) => Ok(Value::Int(l.saturating_add(r))),
            (Value::Float(l), Value::Float(r)) => Ok(Value::Float(l + r)),
            (Value::Int(l), Value::Float(r)) => Ok(Value::Float(l as f64 + r)),
            (Value::Float(l), Value::Int(r)) => Ok(Value::Float(l + r as f64)),
            (Value::Array(l), Value::Array(r)) => {
                // Array concatenation
                let mut result = (*l).clone();
                result.extend(r.iter().cloned());
                Ok(Value::Array(Arc::new(result)))
            }
            (Value::Null, r) if is_numeric(&r) => Ok(Value::Null),
            (l, Value::Null) if is_numeric(&l) => Ok(Value::Null),
            (l, r) => Err(invalid("add", &l, &r)),
        },

        BinaryOp::Sub => numeric(
            "subtract",
            left,
            right,
            |l, r| Ok(l.saturating_sub(r)),
            |l, r| l - r,
        ),

        BinaryOp::Mul => numeric(
            "multiply",
            left,
            right,
            |l, r| Ok(l.saturating_mul(r)),
            |l, r| l * r,
        ),

        BinaryOp::Div => numeric(
            "divide",
            left,
            right,
            |l, r| {
                if r == 0 {
                    Err(Error::DivisionByZero)
                } else {
                    Ok(l.saturating_div(r))
                }
            },
            |l, r| l / r,
        ),

        BinaryOp::Mod => numeric(
            "modulo",
            left,
            right,
            |l, r| {
                if r == 0 {
                    Err(Error::DivisionByZero)
                } else {
                    Ok(l.wrapping_rem(r))
                }
            },
            |l, r| l % r,
        ),

        BinaryOp::Eq => Ok(Value::Bool(values_equal(&left, &right))),
        BinaryOp::NotEq => Ok(Value::Bool(!values_equal(&left, &right))),

        BinaryOp::Lt => compare(left, right, |o| o.is_lt()),
        BinaryOp::Gt => compare(left, right, |o| o.is_gt()),
        BinaryOp::LtEq => compare(left, right, |o| o.is_le()),
        BinaryOp::GtEq => compare(left, right, |o| o.is_ge()),

        BinaryOp::And => Ok(Value::Bool(left.as_bool()? && right.as_bool()?)),
        BinaryOp::Or => Ok(Value::Bool(left.as_bool()? || right.as_bool()?)),
        BinaryOp::Coalesce => Ok(if left.is_null() { right } else { left }),
    }
}

/// Applies a unary operator
pub fn apply_unary_op(op: UnaryOp, operand: Value) -> Result<Value> {
    match (op, operand) {
        (UnaryOp::Neg, Value::Int(n)) => Ok(Value::Int(n.saturating_neg())),
        (UnaryOp::Neg, Value::Float(f)) => Ok(Value::Float(-f)),
        (UnaryOp::Neg, Value::Null) => Ok(Value::Null),
        (UnaryOp::Not, Value::Bool(b)) => Ok(Value::Bool(!b)),
        (UnaryOp::Neg, other) => Err(Error::TypeError {
            expected: "number".to_string(),
            got: other.type_name(),
        }),
        (UnaryOp::Not, other) => Err(Error::TypeError {
            expected: "bool".to_string(),
            got: other.type_name(),
        }),
    }
}

/// Equality with numeric promotion; everything else compares structurally
pub fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Int(l), Value::Float(r)) => (*l as f64) == *r,
        (Value::Float(l), Value::Int(r)) => *l == (*r as f64),
        (Value::Array(l), Value::Array(r)) => {
            l.len() == r.len() && l.iter().zip(r.iter()).all(|(x, y)| values_equal(x, y))
        }
        (Value::Object(l), Value::Object(r)) => {
            l.len() == r.len()
                && l.iter()
                    .all(|(k, v)| r.get(k).map(|o| values_equal(v, o)).unwrap_or(false))
        }
        _ => a == b,
    }
}

fn is_numeric(value: &Value) -> bool {
    matches!(value, Value::Int(_) | Value::Float(_))
}

fn numeric(
    name: &str,
    left: Value,
    right: Value,
    int_op: impl Fn(i64, i64) -> Result<i64>,
    float_op: impl Fn(f64, f64) -> f64,
) -> Result<Value> {
    match (left, right) {
        (Value::Int(l), Value::Int(r)) => Ok(Value::Int(int_op(l, r)?)),
        (Value::Float(l), Value::Float(r)) => Ok(Value::Float(float_op(l, r))),
        (Value::Int(l), Value::Float(r)) => Ok(Value::Float(float_op(l as f64, r))),
        (Value::Float(l), Value::Int(r)) => Ok(Value::Float(float_op(l, r as f64))),
        (Value::Null, r) if is_numeric(&r) => Ok(Value::Null),
        (l, Value::Null) if is_numeric(&l) => Ok(Value::Null),
        (l, r) => Err(invalid(name, &l, &r)),
    }
}

fn compare(
    left: Value,
    right: Value,
    accept: impl Fn(std::cmp::Ordering) -> bool,
) -> Result<Value> {
    let ordering = match (&left, &right) {
        (Value::Int(l), Value::Int(r)) => Some(l.cmp(r)),
        (Value::Float(l), Value::Float(r)) => l.partial_cmp(r),
        (Value::Int(l), Value::Float(r)) => (*l as f64).partial_cmp(r),
        (Value::Float(l), Value::Int(r)) => l.partial_cmp(&(*r as f64)),
        // Lifted comparison: null never orders
        (Value::Null, _) | (_, Value::Null) => None,
        (l, r) => {
            return Err(Error::InvalidComparison {
                left_type: l.type_name(),
                right_type: r.type_name(),
            })
        }
    };
    Ok(Value::Bool(ordering.map(accept).unwrap_or(false)))
}

fn invalid(op: &str, left: &Value, right: &Value) -> Error {
    Error::InvalidOperation {
        op: op.to_string(),
        left_type: left.type_name(),
        right_type: right.type_name(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bin(op: BinaryOp, l: impl Into<Value>, r: impl Into<Value>) -> Result<Value> {
        apply_binary_op(op, l.into(), r.into())
    }

    #[test]
    fn test_arithmetic_promotion() {
        assert_eq!(bin(BinaryOp::Mul, 3, 5).unwrap(), Value::Int(15));
        assert_eq!(bin(BinaryOp::Add, 1, 0.5).unwrap(), Value::Float(1.5));
        assert_eq!(bin(BinaryOp::Div, 7, 2).unwrap(), Value::Int(3));
        assert_eq!(bin(BinaryOp::Div, 7.0, 2).unwrap(), Value::Float(3.5));
        assert_eq!(bin(BinaryOp::Mod, -7, 3).unwrap(), Value::Int(-1));
    }

    #[test]
    fn test_integer_division_by_zero() {
        assert!(matches!(bin(BinaryOp::Div, 1, 0), Err(Error::DivisionByZero)));
        assert!(matches!(bin(BinaryOp::Mod, 1, 0), Err(Error::DivisionByZero)));
        assert_eq!(
            bin(BinaryOp::Div, 1.0, 0.0).unwrap(),
            Value::Float(f64::INFINITY)
        );
        assert_eq!(bin(BinaryOp::Div, i64::MIN, -1).unwrap(), Value::Int(i64::MAX));
    }

    #[test]
    fn test_string_concatenation() {
        assert_eq!(bin(BinaryOp::Add, "A", "B").unwrap(), Value::from("AB"));
        assert_eq!(bin(BinaryOp::Add, "n=", 4).unwrap(), Value::from("n=4"));
        assert_eq!(bin(BinaryOp::Add, 1.5, "x").unwrap(), Value::from("1.5x"));
        assert_eq!(
            apply_binary_op(BinaryOp::Add, Value::from("a"), Value::Null).unwrap(),
            Value::from("a")
        );
    }

    #[test]
    fn test_equality_and_comparison() {
        assert_eq!(bin(BinaryOp::Eq, 2, 2.0).unwrap(), Value::Bool(true));
        assert_eq!(bin(BinaryOp::NotEq, "a", "b").unwrap(), Value::Bool(true));
        assert_eq!(bin(BinaryOp::LtEq, 2, 2.5).unwrap(), Value::Bool(true));
        assert_eq!(
            apply_binary_op(BinaryOp::Lt, Value::Null, Value::Int(1)).unwrap(),
            Value::Bool(false)
        );
        assert!(matches!(
            bin(BinaryOp::Lt, "a", "b"),
            Err(Error::InvalidComparison { .. })
        ));
    }

    #[test]
    fn test_invalid_operation() {
        assert!(matches!(
            bin(BinaryOp::Mul, true, 2),
            Err(Error::InvalidOperation { .. })
        ));
    }

    #[test]
    fn test_unary() {
        assert_eq!(apply_unary_op(UnaryOp::Neg, Value::Int(3)).unwrap(), Value::Int(-3));
        assert_eq!(
            apply_unary_op(UnaryOp::Not, Value::Bool(true)).unwrap(),
            Value::Bool(false)
        );
        assert!(apply_unary_op(UnaryOp::Not, Value::Int(1)).is_err());
    }
}
