///
/// Builtin Bridge
///
/// Connects host builtins to scripts. A script call to `fubsy.name(...)`
/// goes through four steps:
///
/// - marshal: check every argument is a string and lend it to the host
/// - invoke: call the host function and adopt the buffers it returns
/// - translate: turn the result into a value or a RuntimeError
/// - release: buffers are dropped exactly once, on every path
///
/// The registry holds the host functions; install binds them into a
/// script's root scope; export copies results back out after a run.
///

pub mod export;
pub mod install;
pub mod invoke;
pub mod marshal;
pub mod registry;
pub mod translate;

pub use export::{ExportError, ExportMode, ExportedValue, ExportedValueSet, extract, extract_all};
pub use install::{DEFAULT_NAMESPACE, InstallError, install_builtins};
pub use invoke::{InvocationResult, invoke};
pub use marshal::{CallArgs, marshal};
pub use registry::{BUILTIN_COUNT, Builtin, BuiltinEntry, BuiltinRegistry};
pub use translate::translate;

use fubsy_std_core::HostFn;
use thiserror::Error;
use tracing::debug;

use crate::interp::{Exception, NativeCallable, Value};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BridgeError {
    #[error("all arguments must be strings")]
    ArgumentType { position: usize, found: &'static str },

    #[error("out of memory marshaling builtin arguments")]
    OutOfMemory,
}

impl From<BridgeError> for Exception {
    fn from(err: BridgeError) -> Self {
        match err {
            BridgeError::ArgumentType { .. } => Exception::type_error(err.to_string()),
            BridgeError::OutOfMemory => Exception::memory_error(err.to_string()),
        }
    }
}

/// Script-callable wrapper around one bound registry slot.
pub struct BuiltinWrapper {
    name: &'static str,
    callback: HostFn,
}

impl BuiltinWrapper {
    pub fn new(name: &'static str, callback: HostFn) -> Self {
        Self { name, callback }
    }
}

impl NativeCallable for BuiltinWrapper {
    fn name(&self) -> &str {
        self.name
    }

    fn call(&self, args: &[Value]) -> Result<Value, Exception> {
        call_builtin(self.name, self.callback, args)
    }
}

/// Marshal, invoke and translate one builtin call.
pub fn call_builtin(name: &str, callback: HostFn, args: &[Value]) -> Result<Value, Exception> {
    let call_args = marshal(args).map_err(|err| {
        debug!(builtin = name, error = %err, "rejected builtin arguments");
        Exception::from(err)
    })?;
    translate(invoke(name, callback, &call_args))
}
