//!
//! fubsy-std-core - Builtin Call Boundary
//!
//! Types shared by host builtins and the plugin runtime. Everything that
//! crosses the boundary is described here:
//!
//! - `HostFn`: the C-ABI signature every builtin implements
//! - `ArgView`: a borrowed, NUL-terminated argument string valid for one call
//! - `BuiltinReturn`: the value/error pointer pair a builtin hands back
//! - `TransferredBuffer`: an owned string allocated by the host and released
//!   by the runtime exactly once
//! - `dispatch`: adapter that lets a builtin be written as a Rust closure
//!   over `&[&str]`
//!

pub mod abi;
pub mod buffer;
pub mod host;

pub use abi::*;
pub use buffer::*;
pub use host::*;
