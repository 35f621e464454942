//!
//! Builtin Invocation
//!
//! Calls a host function synchronously and takes ownership of whatever it
//! returns. A panic inside a host function aborts the process at the
//! `extern "C"` boundary; only explicit error returns reach the script.
//!

use fubsy_std_core::{BuiltinReturn, HostFn, TransferredBuffer};
use tracing::{debug, warn};

use super::marshal::CallArgs;

/// Outcome of one builtin call. Exactly one arm; buffers are released
/// when the result is dropped.
#[derive(Debug)]
pub enum InvocationResult {
    Success(Option<TransferredBuffer>),
    Failure(TransferredBuffer),
}

impl InvocationResult {
    /// Take ownership of the pointers in a builtin's return.
    ///
    /// A host that sets both pointers breaks the ABI contract; the error
    /// wins and the value buffer is released right away.
    ///
    /// # Safety
    /// Each pointer must be null or an unreleased `fubsy_string_new` buffer.
    pub unsafe fn from_return(name: &str, ret: BuiltinReturn) -> Self {
        let value = unsafe { TransferredBuffer::from_raw(ret.value) };
        let error = unsafe { TransferredBuffer::from_raw(ret.error) };

        match (value, error) {
            (Some(_discarded), Some(error)) => {
                warn!(builtin = name, "builtin returned both a value and an error; keeping the error");
                InvocationResult::Failure(error)
            }
            (_, Some(error)) => InvocationResult::Failure(error),
            (value, None) => InvocationResult::Success(value),
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, InvocationResult::Failure(_))
    }
}

pub fn invoke(name: &str, callback: HostFn, args: &CallArgs<'_>) -> InvocationResult {
    debug!(builtin = name, argc = args.len(), "calling host builtin");
    // SAFETY: `args` holds `len()` views borrowed from live script strings,
    // and the host owns the returned buffers until we adopt them.
    let ret = unsafe { callback(args.len(), args.as_ptr()) };
    let result = unsafe { InvocationResult::from_return(name, ret) };
    debug!(builtin = name, failed = result.is_failure(), "host builtin returned");
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::marshal::marshal;
    use crate::interp::Value;
    use fubsy_std_core::{ArgView, outstanding_buffers};

    unsafe extern "C" fn both(_argc: usize, _argv: *const ArgView<'_>) -> BuiltinReturn {
        BuiltinReturn {
            value: BuiltinReturn::value("v").value,
            error: BuiltinReturn::error("e").error,
        }
    }

    unsafe extern "C" fn count_args(argc: usize, _argv: *const ArgView<'_>) -> BuiltinReturn {
        BuiltinReturn::value(&argc.to_string())
    }

    #[test]
    fn test_both_pointers_keeps_error() {
        let before = outstanding_buffers();
        let args = marshal(&[]).unwrap();
        let result = invoke("both", both, &args);
        let InvocationResult::Failure(ref err) = result else {
            panic!("expected failure");
        };
        assert_eq!(err.to_string_lossy(), "e");
        assert_eq!(outstanding_buffers(), before + 1);
        drop(result);
        assert_eq!(outstanding_buffers(), before);
    }

    #[test]
    fn test_argument_count_reaches_host() {
        let values = vec![Value::string("a").unwrap(), Value::string("b").unwrap()];
        let args = marshal(&values).unwrap();
        let InvocationResult::Success(Some(buf)) = invoke("count", count_args, &args) else {
            panic!("expected value");
        };
        assert_eq!(buf.to_string_lossy(), "2");
    }
}
