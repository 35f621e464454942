//!
//! Builtin ABI
//!
//! A builtin receives its arguments as an array of borrowed C strings and
//! returns a `BuiltinReturn`. At most one of `value` and `error` is set;
//! whichever is set is a buffer from `fubsy_string_new` that the caller
//! now owns.
//!

use std::ffi::{CStr, c_char};
use std::marker::PhantomData;
use std::ptr::{self, NonNull};
use std::str::Utf8Error;

use crate::buffer::TransferredBuffer;

/// Host implementation of a builtin.
pub type HostFn = for<'a> unsafe extern "C" fn(argc: usize, argv: *const ArgView<'a>) -> BuiltinReturn;

/// Borrowed argument string. Layout-compatible with `const char *`.
///
/// The lifetime ties the view to the guest string it points into; it is
/// valid only for the duration of one builtin call.
#[repr(transparent)]
#[derive(Clone, Copy)]
pub struct ArgView<'a> {
    ptr: NonNull<c_char>,
    _marker: PhantomData<&'a CStr>,
}

impl<'a> ArgView<'a> {
    pub fn new(s: &'a CStr) -> Self {
        Self {
            ptr: NonNull::from(s).cast(),
            _marker: PhantomData,
        }
    }

    pub fn as_ptr(&self) -> *const c_char {
        self.ptr.as_ptr()
    }

    pub fn as_c_str(&self) -> &'a CStr {
        unsafe { CStr::from_ptr(self.ptr.as_ptr()) }
    }

    pub fn to_str(&self) -> Result<&'a str, Utf8Error> {
        self.as_c_str().to_str()
    }
}

impl std::fmt::Debug for ArgView<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Debug::fmt(self.as_c_str(), f)
    }
}

/// Value/error pair returned by a builtin.
#[repr(C)]
#[derive(Debug)]
pub struct BuiltinReturn {
    pub value: *mut c_char,
    pub error: *mut c_char,
}

impl BuiltinReturn {
    /// No value and no error: the builtin returns none.
    pub const fn none() -> Self {
        Self {
            value: ptr::null_mut(),
            error: ptr::null_mut(),
        }
    }

    pub fn value(text: &str) -> Self {
        Self {
            value: TransferredBuffer::new(text).into_raw(),
            error: ptr::null_mut(),
        }
    }

    pub fn error(message: &str) -> Self {
        Self {
            value: ptr::null_mut(),
            error: TransferredBuffer::new(message).into_raw(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::outstanding_buffers;

    #[test]
    fn test_arg_view_borrows_without_copy() {
        let owned = c"hello";
        let view = ArgView::new(owned);
        assert_eq!(view.as_ptr(), owned.as_ptr());
        assert_eq!(view.to_str().unwrap(), "hello");
    }

    #[test]
    fn test_arg_view_layout_matches_pointer() {
        assert_eq!(std::mem::size_of::<ArgView<'_>>(), std::mem::size_of::<*const c_char>());
    }

    #[test]
    fn test_return_constructors() {
        let before = outstanding_buffers();

        let none = BuiltinReturn::none();
        assert!(none.value.is_null() && none.error.is_null());

        let ret = BuiltinReturn::error("boom");
        assert!(ret.value.is_null());
        let err = unsafe { TransferredBuffer::from_raw(ret.error) }.unwrap();
        assert_eq!(err.to_string_lossy(), "boom");
        drop(err);

        let ret = BuiltinReturn::value("ok");
        assert!(ret.error.is_null());
        drop(unsafe { TransferredBuffer::from_raw(ret.value) });

        assert_eq!(outstanding_buffers(), before);
    }
}
