//!
//! Host-side Helpers
//!
//! Builtins written in Rust rarely want to touch raw pointers. `dispatch`
//! decodes the argument array into `&[&str]`, runs a closure, and encodes
//! its `HostResult` back into a `BuiltinReturn`:
//!
//! ```ignore
//! unsafe extern "C" fn echo(argc: usize, argv: *const ArgView<'_>) -> BuiltinReturn {
//!     unsafe { dispatch(argc, argv, |args| Ok(args.first().map(|s| s.to_string()))) }
//! }
//! ```
//!

use std::fmt;

use crate::abi::{ArgView, BuiltinReturn};

pub type HostResult = Result<Option<String>, HostError>;

/// One or more failures reported by a builtin.
///
/// Several messages are joined with a newline when shown to the script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostError {
    messages: Vec<String>,
}

impl HostError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            messages: vec![message.into()],
        }
    }

    pub fn from_messages<I, S>(messages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            messages: messages.into_iter().map(Into::into).collect(),
        }
    }

    pub fn push(&mut self, message: impl Into<String>) {
        self.messages.push(message.into());
    }

    pub fn messages(&self) -> &[String] {
        &self.messages
    }
}

impl fmt::Display for HostError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.messages.join("\n"))
    }
}

impl std::error::Error for HostError {}

impl From<String> for HostError {
    fn from(message: String) -> Self {
        Self::new(message)
    }
}

impl From<&str> for HostError {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

impl From<std::io::Error> for HostError {
    fn from(err: std::io::Error) -> Self {
        Self::new(err.to_string())
    }
}

/// View the raw argument array as a slice.
///
/// # Safety
/// `argv` must point to `argc` valid views, or `argc` must be zero.
pub unsafe fn args_from_raw<'a>(argc: usize, argv: *const ArgView<'a>) -> &'a [ArgView<'a>] {
    if argc == 0 || argv.is_null() {
        &[]
    } else {
        unsafe { std::slice::from_raw_parts(argv, argc) }
    }
}

/// Run `f` over decoded arguments and encode its result for the caller.
///
/// # Safety
/// Same contract as `args_from_raw`.
pub unsafe fn dispatch<'a, F>(argc: usize, argv: *const ArgView<'a>, f: F) -> BuiltinReturn
where
    F: FnOnce(&[&'a str]) -> HostResult,
{
    let views = unsafe { args_from_raw(argc, argv) };
    let mut args = Vec::with_capacity(views.len());
    for (i, view) in views.iter().enumerate() {
        match view.to_str() {
            Ok(s) => args.push(s),
            Err(_) => return BuiltinReturn::error(&format!("argument {} is not valid UTF-8", i + 1)),
        }
    }

    match f(&args) {
        Ok(Some(value)) => BuiltinReturn::value(&value),
        Ok(None) => BuiltinReturn::none(),
        Err(err) => BuiltinReturn::error(&err.to_string()),
    }
}
