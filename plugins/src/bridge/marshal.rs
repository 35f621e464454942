//!
//! Argument Marshaling
//!
//! Turns the argument list of a builtin call into the borrowed C string
//! array the host receives. Nothing is copied: each view points into the
//! script's own string storage and cannot outlive the argument slice.
//!

use fubsy_std_core::ArgView;

use super::BridgeError;
use crate::interp::Value;

/// Borrowed argument array for one builtin call.
#[derive(Debug)]
pub struct CallArgs<'a> {
    views: Vec<ArgView<'a>>,
}

impl<'a> CallArgs<'a> {
    pub fn len(&self) -> usize {
        self.views.len()
    }

    pub fn is_empty(&self) -> bool {
        self.views.is_empty()
    }

    pub fn as_ptr(&self) -> *const ArgView<'a> {
        self.views.as_ptr()
    }

    pub fn views(&self) -> &[ArgView<'a>] {
        &self.views
    }
}

/// Build the argument array, rejecting any non-string argument.
///
/// The array is reserved up front with a fallible allocation; failure is
/// reported as `OutOfMemory` before any argument is looked at.
pub fn marshal(args: &[Value]) -> Result<CallArgs<'_>, BridgeError> {
    let mut views = Vec::new();
    views
        .try_reserve_exact(args.len())
        .map_err(|_| BridgeError::OutOfMemory)?;

    for (position, arg) in args.iter().enumerate() {
        match arg.as_c_str() {
            Some(s) => views.push(ArgView::new(s)),
            None => {
                return Err(BridgeError::ArgumentType {
                    position,
                    found: arg.type_name(),
                });
            }
        }
    }

    Ok(CallArgs { views })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(text: &str) -> Value {
        Value::string(text).unwrap()
    }

    #[test]
    fn test_views_alias_script_strings() {
        let args = vec![s("ding"), s("dong")];
        let call_args = marshal(&args).unwrap();
        assert_eq!(call_args.len(), 2);
        for (view, arg) in call_args.views().iter().zip(&args) {
            assert_eq!(view.as_ptr(), arg.as_c_str().unwrap().as_ptr());
        }
    }

    #[test]
    fn test_zero_arguments() {
        let call_args = marshal(&[]).unwrap();
        assert!(call_args.is_empty());
    }

    #[test]
    fn test_rejects_non_string_at_any_position() {
        for position in 0..3 {
            let mut args = vec![s("a"), s("b"), s("c")];
            args[position] = Value::Int(7);
            let err = marshal(&args).unwrap_err();
            assert!(matches!(
                err,
                BridgeError::ArgumentType { position: p, found: "int" } if p == position
            ));
        }
    }
}
