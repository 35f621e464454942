//!
//! Export Extraction
//!
//! After a run, the host copies the values it cares about out of the root
//! scope. Exports are deep copies owned by the host; nothing in them
//! refers back into the interpreter.
//!

use std::fmt;

use indexmap::IndexMap;
use serde::Serialize;
use thiserror::Error;

use crate::interp::{Interpreter, Value};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ExportedValue {
    Null,
    Bool(bool),
    Int(i64),
    Str(String),
    List(Vec<ExportedValue>),
    Callable { function: String },
    Builtin { builtin: String },
    Namespace { namespace: String, members: Vec<String> },
}

impl ExportedValue {
    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::None => ExportedValue::Null,
            Value::Bool(b) => ExportedValue::Bool(*b),
            Value::Int(n) => ExportedValue::Int(*n),
            Value::Str(s) => ExportedValue::Str(s.to_string_lossy().into_owned()),
            Value::List(items) => {
                ExportedValue::List(items.borrow().iter().map(Self::from_value).collect())
            }
            Value::Function(decl) => ExportedValue::Callable {
                function: decl.name.name.to_string(),
            },
            Value::Native(native) => ExportedValue::Builtin {
                builtin: native.name().to_string(),
            },
            Value::Namespace(ns) => ExportedValue::Namespace {
                namespace: ns.name().to_string(),
                members: ns.members().map(|(name, _)| name.to_string()).collect(),
            },
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ExportedValue::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_callable(&self) -> bool {
        matches!(self, ExportedValue::Callable { .. } | ExportedValue::Builtin { .. })
    }
}

impl fmt::Display for ExportedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportedValue::Null => f.write_str("none"),
            ExportedValue::Bool(b) => write!(f, "{}", b),
            ExportedValue::Int(n) => write!(f, "{}", n),
            ExportedValue::Str(s) => write!(f, "{:?}", s),
            ExportedValue::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                f.write_str("]")
            }
            ExportedValue::Callable { function } => write!(f, "<fn {}>", function),
            ExportedValue::Builtin { builtin } => write!(f, "<builtin {}>", builtin),
            ExportedValue::Namespace { namespace, .. } => write!(f, "<namespace {}>", namespace),
        }
    }
}

/// Exports by name, in the order they were requested or defined.
pub type ExportedValueSet = IndexMap<String, ExportedValue>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportMode {
    /// Names the script never defined are left out.
    #[default]
    Lenient,
    /// A name the script never defined is an error.
    Strict,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExportError {
    #[error("plugin did not define '{0}'")]
    NameNotFound(String),
}

pub fn extract<I, S>(interp: &Interpreter, names: I, mode: ExportMode) -> Result<ExportedValueSet, ExportError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut exports = ExportedValueSet::new();
    for name in names {
        let name = name.as_ref();
        match interp.lookup_root(name) {
            Some(value) => {
                exports.insert(name.to_string(), ExportedValue::from_value(value));
            }
            None if mode == ExportMode::Strict => {
                return Err(ExportError::NameNotFound(name.to_string()));
            }
            None => {}
        }
    }
    Ok(exports)
}

/// Every public root binding except the names in `skip`.
///
/// Names starting with `_` are private to the script.
pub fn extract_all(interp: &Interpreter, skip: &[&str]) -> ExportedValueSet {
    interp
        .root_bindings()
        .filter(|(name, _)| !name.starts_with('_') && !skip.contains(name))
        .map(|(name, value)| (name.to_string(), ExportedValue::from_value(value)))
        .collect()
}
