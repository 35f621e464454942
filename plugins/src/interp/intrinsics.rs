//!
//! Intrinsic Functions
//!
//! Small helpers every script can call without going through the host:
//! `str(x)`, `len(x)` and `join(sep, list)`. They are looked up after
//! locals and globals, so a script may shadow them.
//!

use std::rc::Rc;

use super::exception::Exception;
use super::value::{NativeCallable, Value};

type IntrinsicFn = fn(&[Value]) -> Result<Value, Exception>;

pub struct Intrinsic {
    name: &'static str,
    arity: usize,
    func: IntrinsicFn,
}

impl NativeCallable for Intrinsic {
    fn name(&self) -> &str {
        self.name
    }

    fn call(&self, args: &[Value]) -> Result<Value, Exception> {
        if args.len() != self.arity {
            return Err(Exception::type_error(format!(
                "{}() takes {} argument{} but {} were given",
                self.name,
                self.arity,
                if self.arity == 1 { "" } else { "s" },
                args.len()
            )));
        }
        (self.func)(args)
    }
}

pub fn all() -> Vec<(&'static str, Value)> {
    [
        Intrinsic { name: "str", arity: 1, func: str_of },
        Intrinsic { name: "len", arity: 1, func: len_of },
        Intrinsic { name: "join", arity: 2, func: join },
    ]
    .into_iter()
    .map(|i| (i.name, Value::Native(Rc::new(i))))
    .collect()
}

fn str_of(args: &[Value]) -> Result<Value, Exception> {
    match &args[0] {
        Value::Str(_) => Ok(args[0].clone()),
        other => Value::string(other.to_string()),
    }
}

fn len_of(args: &[Value]) -> Result<Value, Exception> {
    let len = match &args[0] {
        Value::Str(s) => s.to_bytes().len(),
        Value::List(items) => items.borrow().len(),
        Value::Namespace(ns) => ns.len(),
        other => {
            return Err(Exception::type_error(format!(
                "object of type '{}' has no len()",
                other.type_name()
            )));
        }
    };
    Ok(Value::Int(len as i64))
}

fn join(args: &[Value]) -> Result<Value, Exception> {
    let Some(sep) = args[0].as_str() else {
        return Err(Exception::type_error("join() separator must be a string"));
    };
    let Value::List(items) = &args[1] else {
        return Err(Exception::type_error(format!(
            "join() expects a list, not {}",
            args[1].type_name()
        )));
    };

    let items = items.borrow();
    let mut parts = Vec::with_capacity(items.len());
    for (i, item) in items.iter().enumerate() {
        match item.as_str() {
            Some(s) => parts.push(s),
            None => {
                return Err(Exception::type_error(format!(
                    "join() item {} is {}, not string",
                    i,
                    item.type_name()
                )));
            }
        }
    }
    Value::string(parts.join(sep))
}
