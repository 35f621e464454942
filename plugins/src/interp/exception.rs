//!
//! Script Exceptions
//!
//! Every runtime failure inside a script is an Exception. Scripts can
//! catch any of them with `try { } catch (e) { }`; an uncaught one ends
//! the run and is reported to the host.
//!
//! Exception kinds:
//! - Error: raised by `throw`
//! - TypeError: wrong operand or argument type, wrong arity, not callable
//! - ValueError: a string would contain a NUL byte
//! - MemoryError: allocation failed while preparing a builtin call
//! - RuntimeError: a host builtin reported an error
//! - NameError / AttributeError / IndexError: failed lookups
//! - ArithmeticError: division by zero, integer overflow
//! - RecursionError: call depth or nesting limit exceeded
//!

use std::fmt;

use thiserror::Error;

use crate::source::Span;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExceptionKind {
    Error,
    TypeError,
    ValueError,
    MemoryError,
    RuntimeError,
    NameError,
    AttributeError,
    IndexError,
    ArithmeticError,
    RecursionError,
}

impl ExceptionKind {
    pub fn name(&self) -> &'static str {
        match self {
            ExceptionKind::Error => "Error",
            ExceptionKind::TypeError => "TypeError",
            ExceptionKind::ValueError => "ValueError",
            ExceptionKind::MemoryError => "MemoryError",
            ExceptionKind::RuntimeError => "RuntimeError",
            ExceptionKind::NameError => "NameError",
            ExceptionKind::AttributeError => "AttributeError",
            ExceptionKind::IndexError => "IndexError",
            ExceptionKind::ArithmeticError => "ArithmeticError",
            ExceptionKind::RecursionError => "RecursionError",
        }
    }
}

impl fmt::Display for ExceptionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {message}")]
pub struct Exception {
    pub kind: ExceptionKind,
    pub message: String,
    pub span: Option<Span>,
}

impl Exception {
    pub fn new(kind: ExceptionKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            span: None,
        }
    }

    pub fn type_error(message: impl Into<String>) -> Self {
        Self::new(ExceptionKind::TypeError, message)
    }

    pub fn runtime_error(message: impl Into<String>) -> Self {
        Self::new(ExceptionKind::RuntimeError, message)
    }

    pub fn memory_error(message: impl Into<String>) -> Self {
        Self::new(ExceptionKind::MemoryError, message)
    }

    pub fn name_error(name: &str) -> Self {
        Self::new(ExceptionKind::NameError, format!("name '{}' is not defined", name))
    }

    pub fn arithmetic(message: impl Into<String>) -> Self {
        Self::new(ExceptionKind::ArithmeticError, message)
    }

    /// Attach a location unless one was recorded closer to the failure.
    pub fn at(mut self, span: Span) -> Self {
        self.span.get_or_insert(span);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_kind() {
        let exc = Exception::runtime_error("boom");
        assert_eq!(exc.to_string(), "RuntimeError: boom");
    }

    #[test]
    fn test_innermost_span_wins() {
        let exc = Exception::name_error("x").at(Span::new(4, 5)).at(Span::new(0, 10));
        assert_eq!(exc.span, Some(Span::new(4, 5)));
        assert_eq!(exc.message, "name 'x' is not defined");
    }
}
