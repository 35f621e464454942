//!
//! Transferred String Buffers
//!
//! A builtin returns its value or error text as a heap string that it
//! allocates and the runtime releases. Both sides go through the two entry
//! points below so allocation and release always pair up, whichever side
//! of the boundary a builtin was written on.
//!
//! Buffers are counted per thread. Builtins run synchronously on the
//! calling thread, so the count returns to its previous value once a call
//! has been fully translated.
//!

use std::borrow::Cow;
use std::cell::Cell;
use std::ffi::{CStr, CString, c_char};
use std::fmt;
use std::ptr::NonNull;

thread_local! {
    static OUTSTANDING: Cell<usize> = const { Cell::new(0) };
}

/// Number of buffers allocated on this thread and not yet released.
pub fn outstanding_buffers() -> usize {
    OUTSTANDING.with(|n| n.get())
}

/// Allocate a NUL-terminated copy of `len` bytes starting at `data`.
///
/// Bytes from the first interior NUL onward are dropped. Other bytes are
/// kept as is; invalid UTF-8 is only replaced with U+FFFD when the
/// receiver reads the buffer through `to_string_lossy`. The returned
/// pointer must be released with `fubsy_string_free`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn fubsy_string_new(data: *const u8, len: usize) -> *mut c_char {
    let bytes = if data.is_null() || len == 0 {
        &[][..]
    } else {
        unsafe { std::slice::from_raw_parts(data, len) }
    };
    TransferredBuffer::from_bytes(bytes).into_raw()
}

/// Release a buffer allocated by `fubsy_string_new`. Null is ignored.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn fubsy_string_free(ptr: *mut c_char) {
    if ptr.is_null() {
        return;
    }
    drop(unsafe { CString::from_raw(ptr) });
    OUTSTANDING.with(|n| n.set(n.get().saturating_sub(1)));
}

/// An owned string handed across the builtin boundary.
///
/// Dropping the buffer releases it, so every path through the code that
/// receives one frees it exactly once.
pub struct TransferredBuffer {
    ptr: NonNull<c_char>,
}

impl TransferredBuffer {
    pub fn new(text: &str) -> Self {
        Self::from_bytes(text.as_bytes())
    }

    pub fn from_bytes(bytes: &[u8]) -> Self {
        let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
        let owned = CString::new(&bytes[..end]).unwrap_or_default();
        OUTSTANDING.with(|n| n.set(n.get() + 1));
        // CString::into_raw never returns null
        let ptr = unsafe { NonNull::new_unchecked(owned.into_raw()) };
        Self { ptr }
    }

    /// Take ownership of a pointer produced by `fubsy_string_new`.
    ///
    /// # Safety
    /// `ptr` must be null or a live buffer from `fubsy_string_new` that no
    /// one else will release.
    pub unsafe fn from_raw(ptr: *mut c_char) -> Option<Self> {
        NonNull::new(ptr).map(|ptr| Self { ptr })
    }

    /// Give up ownership, e.g. to return the buffer from a builtin.
    pub fn into_raw(self) -> *mut c_char {
        let ptr = self.ptr.as_ptr();
        std::mem::forget(self);
        ptr
    }

    pub fn as_c_str(&self) -> &CStr {
        unsafe { CStr::from_ptr(self.ptr.as_ptr()) }
    }

    pub fn to_string_lossy(&self) -> Cow<'_, str> {
        self.as_c_str().to_string_lossy()
    }

    pub fn len(&self) -> usize {
        self.as_c_str().to_bytes().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Drop for TransferredBuffer {
    fn drop(&mut self) {
        unsafe { fubsy_string_free(self.ptr.as_ptr()) }
    }
}

impl fmt::Debug for TransferredBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("TransferredBuffer").field(&self.as_c_str()).finish()
    }
}
