//!
//! Result Translation
//!
//! Converts what a builtin returned into a script value or exception.
//! The result is consumed, so its buffers are released when this returns
//! whichever arm was taken.
//!
//! Host strings are not required to be UTF-8. Invalid sequences are
//! replaced with U+FFFD by `to_string_lossy`, so a script always sees a
//! valid string. Anything after an interior NUL was already dropped when
//! the buffer was allocated.
//!

use super::invoke::InvocationResult;
use crate::interp::{Exception, Value};

pub fn translate(result: InvocationResult) -> Result<Value, Exception> {
    match result {
        InvocationResult::Failure(message) => {
            Err(Exception::runtime_error(message.to_string_lossy()))
        }
        InvocationResult::Success(Some(value)) => Value::string(value.to_string_lossy().into_owned()),
        InvocationResult::Success(None) => Ok(Value::None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interp::ExceptionKind;
    use fubsy_std_core::{TransferredBuffer, outstanding_buffers};

    #[test]
    fn test_failure_becomes_runtime_error() {
        let before = outstanding_buffers();
        let result = InvocationResult::Failure(TransferredBuffer::new("boom"));
        let exc = translate(result).unwrap_err();
        assert_eq!(exc.kind, ExceptionKind::RuntimeError);
        assert_eq!(exc.message, "boom");
        assert_eq!(outstanding_buffers(), before);
    }

    #[test]
    fn test_value_is_copied_then_released() {
        let before = outstanding_buffers();
        let result = InvocationResult::Success(Some(TransferredBuffer::new("hello")));
        let value = translate(result).unwrap();
        assert_eq!(value.as_str(), Some("hello"));
        assert_eq!(outstanding_buffers(), before);
    }

    #[test]
    fn test_no_value_is_none() {
        assert_eq!(translate(InvocationResult::Success(None)).unwrap(), Value::None);
    }

    #[test]
    fn test_invalid_utf8_is_replaced() {
        let before = outstanding_buffers();
        let result = InvocationResult::Success(Some(TransferredBuffer::from_bytes(b"a\xffb")));
        assert_eq!(translate(result).unwrap().as_str(), Some("a\u{FFFD}b"));

        let exc = translate(InvocationResult::Failure(TransferredBuffer::from_bytes(b"bad \xc3"))).unwrap_err();
        assert_eq!(exc.message, "bad \u{FFFD}");
        assert_eq!(outstanding_buffers(), before);
    }
}
