//! Change Detection Utilities
//!
//! Corresponds to angular2/src/core/change_detection/change_detection_util.ts
//! Identity checks, primitive operations and change records used by generated detectors

use crate::change_detection::value::Value;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::rc::Rc;

/// Identity used for dirty checking. `NaN` is identical to `NaN` so that a
/// `NaN` binding does not report a change on every pass.
pub fn loose_identical(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Undefined, Value::Undefined)
        | (Value::Null, Value::Null)
        | (Value::Uninitialized, Value::Uninitialized) => true,
        (Value::Bool(x), Value::Bool(y)) => x == y,
        (Value::Number(x), Value::Number(y)) => x == y || (x.is_nan() && y.is_nan()),
        (Value::String(x), Value::String(y)) => x == y,
        (Value::List(x), Value::List(y)) => Rc::ptr_eq(x, y),
        (Value::Map(x), Value::Map(y)) => Rc::ptr_eq(x, y),
        (Value::Function(x), Value::Function(y)) => std::ptr::addr_eq(Rc::as_ptr(x), Rc::as_ptr(y)),
        (Value::Wrapped(x), Value::Wrapped(y)) => Rc::ptr_eq(x, y),
        _ => false,
    }
}

pub fn loose_not_identical(a: &Value, b: &Value) -> bool {
    !loose_identical(a, b)
}

pub fn unwrap_value(value: Value) -> Value {
    match value {
        Value::Wrapped(inner) => (*inner).clone(),
        other => other,
    }
}

/// Interpolation stringification: blank values render as the empty string.
pub fn s(value: &Value) -> String {
    if value.is_blank() {
        String::new()
    } else {
        value.to_string()
    }
}

/// Built-in operators compiled into `PrimitiveOp` records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PrimitiveOp {
    Negate,
    Add,
    Subtract,
    Multiply,
    Divide,
    Remainder,
    Equals,
    NotEquals,
    Identical,
    NotIdentical,
    LessThan,
    GreaterThan,
    LessOrEqualsThan,
    GreaterOrEqualsThan,
    LogicalAnd,
    LogicalOr,
    Cond,
}

impl PrimitiveOp {
    pub fn arity(self) -> usize {
        match self {
            PrimitiveOp::Negate => 1,
            PrimitiveOp::Cond => 3,
            _ => 2,
        }
    }

    /// Name of the helper the rendered source calls.
    pub fn helper_name(self) -> &'static str {
        match self {
            PrimitiveOp::Negate => "operation_negate",
            PrimitiveOp::Add => "operation_add",
            PrimitiveOp::Subtract => "operation_subtract",
            PrimitiveOp::Multiply => "operation_multiply",
            PrimitiveOp::Divide => "operation_divide",
            PrimitiveOp::Remainder => "operation_remainder",
            PrimitiveOp::Equals => "operation_equals",
            PrimitiveOp::NotEquals => "operation_not_equals",
            PrimitiveOp::Identical => "operation_identical",
            PrimitiveOp::NotIdentical => "operation_not_identical",
            PrimitiveOp::LessThan => "operation_less_then",
            PrimitiveOp::GreaterThan => "operation_greater_then",
            PrimitiveOp::LessOrEqualsThan => "operation_less_or_equals_then",
            PrimitiveOp::GreaterOrEqualsThan => "operation_greater_or_equals_then",
            PrimitiveOp::LogicalAnd => "operation_logical_and",
            PrimitiveOp::LogicalOr => "operation_logical_or",
            PrimitiveOp::Cond => "cond",
        }
    }

    /// Callers guarantee `args.len() == self.arity()`.
    pub fn apply(self, args: &[Value]) -> Value {
        let arg = |i: usize| args.get(i).cloned().unwrap_or_default();
        match self {
            PrimitiveOp::Negate => Value::Bool(!arg(0).is_truthy()),
            PrimitiveOp::Add => match (arg(0), arg(1)) {
                (Value::Number(a), Value::Number(b)) => Value::Number(a + b),
                (a @ Value::String(_), b) | (a, b @ Value::String(_)) => {
                    Value::string(format!("{}{}", a, b))
                }
                (a, b) => Value::Number(to_number(&a) + to_number(&b)),
            },
            PrimitiveOp::Subtract => numeric(args, |a, b| a - b),
            PrimitiveOp::Multiply => numeric(args, |a, b| a * b),
            PrimitiveOp::Divide => numeric(args, |a, b| a / b),
            PrimitiveOp::Remainder => numeric(args, |a, b| a % b),
            PrimitiveOp::Equals => Value::Bool(loose_equals(&arg(0), &arg(1))),
            PrimitiveOp::NotEquals => Value::Bool(!loose_equals(&arg(0), &arg(1))),
            PrimitiveOp::Identical => Value::Bool(strict_identical(&arg(0), &arg(1))),
            PrimitiveOp::NotIdentical => Value::Bool(!strict_identical(&arg(0), &arg(1))),
            PrimitiveOp::LessThan => compare(args, |a, b| a < b),
            PrimitiveOp::GreaterThan => compare(args, |a, b| a > b),
            PrimitiveOp::LessOrEqualsThan => compare(args, |a, b| a <= b),
            PrimitiveOp::GreaterOrEqualsThan => compare(args, |a, b| a >= b),
            PrimitiveOp::LogicalAnd => {
                let a = arg(0);
                if a.is_truthy() {
                    arg(1)
                } else {
                    a
                }
            }
            PrimitiveOp::LogicalOr => {
                let a = arg(0);
                if a.is_truthy() {
                    a
                } else {
                    arg(1)
                }
            }
            PrimitiveOp::Cond => {
                if arg(0).is_truthy() {
                    arg(1)
                } else {
                    arg(2)
                }
            }
        }
    }
}

fn to_number(value: &Value) -> f64 {
    match value {
        Value::Number(n) => *n,
        Value::Bool(b) => f64::from(u8::from(*b)),
        Value::Null => 0.0,
        Value::String(s) => s.trim().parse().unwrap_or(f64::NAN),
        _ => f64::NAN,
    }
}

fn numeric(args: &[Value], op: impl Fn(f64, f64) -> f64) -> Value {
    let a = args.first().map(to_number).unwrap_or(f64::NAN);
    let b = args.get(1).map(to_number).unwrap_or(f64::NAN);
    Value::Number(op(a, b))
}

fn compare(args: &[Value], op: impl Fn(f64, f64) -> bool) -> Value {
    match (args.first(), args.get(1)) {
        (Some(Value::String(a)), Some(Value::String(b))) => {
            Value::Bool(op(a.cmp(b) as i8 as f64, 0.0))
        }
        (Some(a), Some(b)) => Value::Bool(op(to_number(a), to_number(b))),
        _ => Value::Bool(false),
    }
}

fn strict_identical(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x == y,
        _ => loose_identical(a, b),
    }
}

fn loose_equals(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (x, y) if x.is_blank() && y.is_blank() => true,
        (x, y) if x.is_blank() || y.is_blank() => false,
        (Value::Number(_), Value::String(_) | Value::Bool(_))
        | (Value::String(_) | Value::Bool(_), Value::Number(_)) => to_number(a) == to_number(b),
        _ => strict_identical(a, b),
    }
}

/// Builds the value of an array literal record.
pub fn array_fn(args: &[Value]) -> Value {
    Value::list(args.to_vec())
}

/// Builds the value of a map literal record; `keys` pair up with `args`.
pub fn map_fn(keys: &[String], args: &[Value]) -> Value {
    Value::object(keys.iter().cloned().zip(args.iter().cloned()))
}

/// A single input change delivered to `OnChanges`.
#[derive(Debug, Clone, PartialEq)]
pub struct SimpleChange {
    pub previous_value: Value,
    pub current_value: Value,
}

impl SimpleChange {
    pub fn new(previous_value: Value, current_value: Value) -> Self {
        SimpleChange {
            previous_value,
            current_value,
        }
    }

    pub fn is_first_change(&self) -> bool {
        self.previous_value.is_uninitialized()
    }
}

impl fmt::Display for SimpleChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} -> {:?}", self.previous_value, self.current_value)
    }
}

/// Changes keyed by the name of the directive property they target, in the
/// order the bindings were checked.
pub type SimpleChanges = IndexMap<String, SimpleChange>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_loose_identical_treats_nan_as_identical() {
        assert!(loose_identical(&Value::Number(f64::NAN), &Value::Number(f64::NAN)));
        assert!(loose_not_identical(&Value::Number(1.0), &Value::Number(2.0)));
    }

    #[test]
    fn test_containers_compare_by_reference() {
        let a = Value::list(vec![Value::from(1)]);
        let b = Value::list(vec![Value::from(1)]);
        assert!(loose_identical(&a, &a.clone()));
        assert!(loose_not_identical(&a, &b));
    }

    #[test]
    fn test_uninitialized_differs_from_everything_else() {
        assert!(loose_not_identical(&Value::Uninitialized, &Value::Undefined));
        assert!(loose_identical(&Value::Uninitialized, &Value::Uninitialized));
    }

    #[test]
    fn test_wrapped_values_unwrap() {
        let wrapped = Value::wrap(Value::from("a"));
        assert!(loose_not_identical(&wrapped, &Value::wrap(Value::from("a"))));
        assert_eq!(unwrap_value(wrapped), Value::from("a"));
    }

    #[test]
    fn test_primitive_ops() {
        assert_eq!(PrimitiveOp::Add.apply(&[Value::from(1), Value::from(2)]), Value::from(3));
        assert_eq!(
            PrimitiveOp::Add.apply(&[Value::from("a"), Value::from(1)]),
            Value::from("a1")
        );
        assert_eq!(
            PrimitiveOp::Cond.apply(&[Value::Bool(false), Value::from(1), Value::from(2)]),
            Value::from(2)
        );
        assert_eq!(
            PrimitiveOp::Equals.apply(&[Value::from(1), Value::from("1")]),
            Value::Bool(true)
        );
        assert_eq!(
            PrimitiveOp::Identical.apply(&[Value::from(1), Value::from("1")]),
            Value::Bool(false)
        );
    }

    #[test]
    fn test_interpolation_stringify() {
        assert_eq!(s(&Value::Null), "");
        assert_eq!(s(&Value::from(2)), "2");
    }

    #[test]
    fn test_first_change() {
        assert!(SimpleChange::new(Value::Uninitialized, Value::from(1)).is_first_change());
        assert!(!SimpleChange::new(Value::from(1), Value::from(2)).is_first_change());
    }
}
