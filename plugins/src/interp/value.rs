//!
//! Script Values
//!
//! Values are reference-counted and single-threaded. Strings are kept as
//! NUL-terminated byte strings so a builtin call can lend them to the host
//! as `const char *` without copying; they are always valid UTF-8 because
//! every constructor starts from Rust text.
//!
//! Callables come in two shapes: script functions (a shared declaration)
//! and native callables behind the NativeCallable trait. The builtin bridge
//! and the interpreter's intrinsics are both native callables.
//!

use std::cell::RefCell;
use std::ffi::{CStr, CString};
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::ast::FunctionDecl;

use super::exception::{Exception, ExceptionKind};

/// A function implemented outside the script.
pub trait NativeCallable {
    fn name(&self) -> &str;
    fn call(&self, args: &[Value]) -> Result<Value, Exception>;
}

/// A named set of values reachable through `ns.member`.
pub struct Namespace {
    name: String,
    members: IndexMap<String, Value>,
}

impl Namespace {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            members: IndexMap::new(),
        }
    }

    pub fn insert(&mut self, member: impl Into<String>, value: Value) {
        self.members.insert(member.into(), value);
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn get(&self, member: &str) -> Option<&Value> {
        self.members.get(member)
    }

    pub fn members(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.members.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

#[derive(Clone)]
pub enum Value {
    None,
    Bool(bool),
    Int(i64),
    Str(Rc<CStr>),
    List(Rc<RefCell<Vec<Value>>>),
    Function(Rc<FunctionDecl>),
    Native(Rc<dyn NativeCallable>),
    Namespace(Rc<Namespace>),
}

impl Value {
    pub fn string(text: impl Into<Vec<u8>>) -> Result<Value, Exception> {
        CString::new(text)
            .map(|s| Value::Str(Rc::from(s.as_c_str())))
            .map_err(|_| Exception::new(ExceptionKind::ValueError, "string contains a NUL byte"))
    }

    pub fn list(items: Vec<Value>) -> Value {
        Value::List(Rc::new(RefCell::new(items)))
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::None => "none",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Str(_) => "string",
            Value::List(_) => "list",
            Value::Function(_) => "function",
            Value::Native(_) => "builtin",
            Value::Namespace(_) => "namespace",
        }
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            Value::None => false,
            Value::Bool(b) => *b,
            Value::Int(n) => *n != 0,
            Value::Str(s) => !s.is_empty(),
            Value::List(items) => !items.borrow().is_empty(),
            Value::Function(_) | Value::Native(_) | Value::Namespace(_) => true,
        }
    }

    pub fn as_c_str(&self) -> Option<&CStr> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Text of a string value.
    pub fn as_str(&self) -> Option<&str> {
        self.as_c_str().and_then(|s| s.to_str().ok())
    }

    /// Like Display, but quotes strings. Used for list elements.
    fn write_repr(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Str(s) => write!(f, "{:?}", s.to_string_lossy()),
            other => write!(f, "{}", other),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::None => f.write_str("none"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(n) => write!(f, "{}", n),
            Value::Str(s) => f.write_str(&s.to_string_lossy()),
            Value::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.borrow().iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    item.write_repr(f)?;
                }
                f.write_str("]")
            }
            Value::Function(decl) => write!(f, "<fn {}>", decl.name.name),
            Value::Native(native) => write!(f, "<builtin {}>", native.name()),
            Value::Namespace(ns) => write!(f, "<namespace {}>", ns.name()),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Str(_) => self.write_repr(f),
            other => write!(f, "{}", other),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::None, Value::None) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::List(a), Value::List(b)) => Rc::ptr_eq(a, b) || *a.borrow() == *b.borrow(),
            (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(a, b),
            (Value::Native(a), Value::Native(b)) => Rc::ptr_eq(a, b),
            (Value::Namespace(a), Value::Namespace(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}
