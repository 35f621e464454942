//!
//! Builtin Registry
//!
//! A fixed table with one slot per declared builtin. The host binds its
//! implementations into slots before any script runs; the installer then
//! exposes every bound slot to scripts.
//!
//! Slots are addressed by index. `Builtin` names the indices so embedders
//! can write `registry.bind(Builtin::Mkdir, f)`; `set_callback` takes the
//! raw index and treats an out-of-range one as a programming error.
//!

use fubsy_std_core::HostFn;

/// Declared builtins, in slot order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Builtin {
    Println,
    Mkdir,
    Remove,
}

pub const BUILTIN_COUNT: usize = 3;

impl Builtin {
    pub const ALL: [Builtin; BUILTIN_COUNT] = [Builtin::Println, Builtin::Mkdir, Builtin::Remove];

    pub const fn index(self) -> usize {
        self as usize
    }

    pub const fn name(self) -> &'static str {
        match self {
            Builtin::Println => "println",
            Builtin::Mkdir => "mkdir",
            Builtin::Remove => "remove",
        }
    }

    pub fn from_name(name: &str) -> Option<Builtin> {
        Self::ALL.into_iter().find(|b| b.name() == name)
    }
}

#[derive(Clone, Copy)]
pub struct BuiltinEntry {
    pub name: &'static str,
    pub callback: Option<HostFn>,
}

impl std::fmt::Debug for BuiltinEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BuiltinEntry")
            .field("name", &self.name)
            .field("bound", &self.callback.is_some())
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct BuiltinRegistry {
    entries: [BuiltinEntry; BUILTIN_COUNT],
}

impl Default for BuiltinRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl BuiltinRegistry {
    pub fn new() -> Self {
        Self {
            entries: Builtin::ALL.map(|b| BuiltinEntry {
                name: b.name(),
                callback: None,
            }),
        }
    }

    /// Bind `callback` to slot `index`, replacing any earlier binding.
    ///
    /// # Panics
    /// If `index` is not below `BUILTIN_COUNT`.
    pub fn set_callback(&mut self, index: usize, callback: HostFn) {
        assert!(
            index < BUILTIN_COUNT,
            "builtin index {} out of range (registry has {} slots)",
            index,
            BUILTIN_COUNT
        );
        self.entries[index].callback = Some(callback);
    }

    pub fn bind(&mut self, builtin: Builtin, callback: HostFn) {
        self.set_callback(builtin.index(), callback);
    }

    pub fn entry(&self, builtin: Builtin) -> &BuiltinEntry {
        &self.entries[builtin.index()]
    }

    pub fn is_bound(&self, builtin: Builtin) -> bool {
        self.entry(builtin).callback.is_some()
    }

    /// Bound entries in slot order.
    pub fn bound(&self) -> impl Iterator<Item = (&'static str, HostFn)> + '_ {
        self.entries
            .iter()
            .filter_map(|e| e.callback.map(|cb| (e.name, cb)))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fubsy_std_core::{ArgView, BuiltinReturn};

    unsafe extern "C" fn noop(_argc: usize, _argv: *const ArgView<'_>) -> BuiltinReturn {
        BuiltinReturn::none()
    }

    #[test]
    fn test_slots_follow_declaration_order() {
        let registry = BuiltinRegistry::new();
        let names: Vec<_> = Builtin::ALL.iter().map(|b| registry.entry(*b).name).collect();
        assert_eq!(names, ["println", "mkdir", "remove"]);
        assert_eq!(registry.bound().count(), 0);
        assert_eq!(Builtin::from_name("mkdir"), Some(Builtin::Mkdir));
        assert_eq!(Builtin::from_name("rmdir"), None);
    }

    #[test]
    fn test_bind_by_index_and_overwrite() {
        let mut registry = BuiltinRegistry::new();
        registry.set_callback(2, noop);
        registry.set_callback(2, noop);
        assert!(registry.is_bound(Builtin::Remove));
        assert!(!registry.is_bound(Builtin::Println));
        let bound: Vec<_> = registry.bound().map(|(name, _)| name).collect();
        assert_eq!(bound, ["remove"]);
    }

    #[test]
    #[should_panic(expected = "builtin index 3 out of range")]
    fn test_out_of_range_index_panics() {
        let mut registry = BuiltinRegistry::new();
        registry.set_callback(BUILTIN_COUNT, noop);
    }
}
