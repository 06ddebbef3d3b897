//! Runtime Values
//!
//! The dynamic values flowing through generated change detectors. Primitives
//! compare by value, containers and functions by reference.

use crate::change_detection::exceptions::{ChangeDetectionError, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// A host function callable from bindings (`fn(args)`, `obj.method(args)`).
pub type NativeFunction = dyn Fn(&[Value]) -> Value;

#[derive(Clone, Default)]
pub enum Value {
    #[default]
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    String(Rc<str>),
    List(Rc<RefCell<Vec<Value>>>),
    Map(Rc<RefCell<IndexMap<String, Value>>>),
    Function(Rc<NativeFunction>),
    /// Forces a change notification even when the wrapped value is identical.
    Wrapped(Rc<Value>),
    /// Sentinel held by fields and pipe slots that were never written.
    Uninitialized,
}

impl Value {
    pub fn string(s: impl AsRef<str>) -> Self {
        Value::String(Rc::from(s.as_ref()))
    }

    pub fn list(items: Vec<Value>) -> Self {
        Value::List(Rc::new(RefCell::new(items)))
    }

    pub fn object<K: Into<String>>(entries: impl IntoIterator<Item = (K, Value)>) -> Self {
        Value::Map(Rc::new(RefCell::new(
            entries.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        )))
    }

    pub fn function(f: impl Fn(&[Value]) -> Value + 'static) -> Self {
        Value::Function(Rc::new(f))
    }

    pub fn wrap(value: Value) -> Self {
        Value::Wrapped(Rc::new(value))
    }

    /// `null` or `undefined`.
    pub fn is_blank(&self) -> bool {
        matches!(self, Value::Undefined | Value::Null)
    }

    pub fn is_uninitialized(&self) -> bool {
        matches!(self, Value::Uninitialized)
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Undefined | Value::Null => false,
            Value::Bool(b) => *b,
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            Value::String(s) => !s.is_empty(),
            _ => true,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Undefined => "undefined",
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::List(_) => "array",
            Value::Map(_) => "object",
            Value::Function(_) => "function",
            Value::Wrapped(_) => "wrapped value",
            Value::Uninitialized => "uninitialized",
        }
    }

    pub fn get_property(&self, name: &str) -> Result<Value> {
        match self {
            Value::Map(map) => Ok(map.borrow().get(name).cloned().unwrap_or_default()),
            Value::List(items) if name == "length" => Ok(Value::Number(items.borrow().len() as f64)),
            Value::String(s) if name == "length" => Ok(Value::Number(s.chars().count() as f64)),
            Value::Undefined | Value::Null | Value::Uninitialized => {
                Err(self.invalid_receiver(format!("read property '{}'", name)))
            }
            _ => Ok(Value::Undefined),
        }
    }

    pub fn set_property(&self, name: &str, value: Value) -> Result<()> {
        match self {
            Value::Map(map) => {
                map.borrow_mut().insert(name.to_string(), value);
                Ok(())
            }
            _ => Err(self.invalid_receiver(format!("set property '{}'", name))),
        }
    }

    pub fn get_keyed(&self, key: &Value) -> Result<Value> {
        match (self, key) {
            (Value::List(items), Value::Number(n)) => {
                Ok(index_of(*n).and_then(|i| items.borrow().get(i).cloned()).unwrap_or_default())
            }
            (Value::Map(map), key) => Ok(map.borrow().get(&key.to_string()).cloned().unwrap_or_default()),
            (Value::Undefined | Value::Null | Value::Uninitialized, _) => {
                Err(self.invalid_receiver(format!("read key '{}'", key)))
            }
            _ => Ok(Value::Undefined),
        }
    }

    pub fn set_keyed(&self, key: &Value, value: Value) -> Result<()> {
        match (self, key) {
            (Value::List(items), Value::Number(n)) => {
                // Lists grow by appending only; writes past the end are rejected.
                let mut items = items.borrow_mut();
                match index_of(*n) {
                    Some(index) if index < items.len() => items[index] = value,
                    Some(index) if index == items.len() => items.push(value),
                    _ => return Err(self.invalid_receiver(format!("write key '{}'", key))),
                }
                Ok(())
            }
            (Value::Map(map), key) => {
                map.borrow_mut().insert(key.to_string(), value);
                Ok(())
            }
            _ => Err(self.invalid_receiver(format!("write key '{}'", key))),
        }
    }

    pub fn call(&self, args: &[Value]) -> Result<Value> {
        match self {
            Value::Function(f) => Ok(f(args)),
            _ => Err(ChangeDetectionError::NotAFunction(self.type_name().to_string())),
        }
    }

    pub fn invoke_method(&self, name: &str, args: &[Value]) -> Result<Value> {
        match self.get_property(name)? {
            Value::Function(f) => Ok(f(args)),
            _ => Err(ChangeDetectionError::NotAFunction(name.to_string())),
        }
    }

    fn invalid_receiver(&self, operation: String) -> ChangeDetectionError {
        ChangeDetectionError::InvalidReceiver {
            operation,
            receiver: self.type_name().to_string(),
        }
    }
}

fn index_of(n: f64) -> Option<usize> {
    if n >= 0.0 && n.fract() == 0.0 {
        Some(n as usize)
    } else {
        None
    }
}

/// Equality follows `looseIdentical`: primitives by value (with `NaN`
/// identical to itself), everything else by reference.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        crate::change_detection::change_detection_util::loose_identical(self, other)
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined => write!(f, "undefined"),
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Number(_) => write!(f, "{}", self),
            Value::String(s) => write!(f, "{:?}", s),
            Value::List(items) => f.debug_list().entries(items.borrow().iter()).finish(),
            Value::Map(map) => f.debug_map().entries(map.borrow().iter()).finish(),
            Value::Function(_) => write!(f, "[function]"),
            Value::Wrapped(inner) => write!(f, "Wrapped({:?})", inner),
            Value::Uninitialized => write!(f, "[uninitialized]"),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(n) => {
                if n.is_nan() {
                    write!(f, "NaN")
                } else if n.is_infinite() {
                    write!(f, "{}Infinity", if *n < 0.0 { "-" } else { "" })
                } else if n.fract() == 0.0 && n.abs() < 1e15 {
                    write!(f, "{}", *n as i64)
                } else {
                    write!(f, "{}", n)
                }
            }
            Value::String(s) => write!(f, "{}", s),
            Value::List(items) => {
                let parts: Vec<String> = items.borrow().iter().map(|v| v.to_string()).collect();
                write!(f, "{}", parts.join(","))
            }
            Value::Map(_) => write!(f, "[object Object]"),
            Value::Wrapped(inner) => write!(f, "{}", inner),
            _ => write!(f, "{:?}", self),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(n as f64)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::string(s)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::string(s)
    }
}

/// Literal operands carried by proto records (`fixedArgs`, constants).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Literal {
    Null,
    Bool(bool),
    Number(f64),
    String(String),
}

impl Literal {
    /// Reads a literal as a record index (skip record ends).
    pub fn as_index(&self) -> Option<usize> {
        match self {
            Literal::Number(n) => index_of(*n),
            _ => None,
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            Literal::Null => Value::Null,
            Literal::Bool(b) => Value::Bool(*b),
            Literal::Number(n) => Value::Number(*n),
            Literal::String(s) => Value::string(s),
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Null => Ok(()),
            Literal::String(s) => write!(f, "{}", s),
            other => write!(f, "{}", other.to_value()),
        }
    }
}

impl From<usize> for Literal {
    fn from(n: usize) -> Self {
        Literal::Number(n as f64)
    }
}

impl From<&str> for Literal {
    fn from(s: &str) -> Self {
        Literal::String(s.to_string())
    }
}
