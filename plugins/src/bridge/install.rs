//!
//! Namespace Installation
//!
//! Builds the namespace scripts use to reach the host (`fubsy.mkdir(...)`)
//! and binds it into the root scope, so top-level code sees it without an
//! import. Only bound registry slots get a member.
//!
//! Installing again rebuilds the namespace from the registry's current
//! bindings and replaces the previous one.
//!

use std::rc::Rc;

use thiserror::Error;
use tracing::info;

use super::BuiltinWrapper;
use super::registry::BuiltinRegistry;
use crate::interp::{Interpreter, Namespace, Value};
use crate::lexer::{TokenKind, tokenize};

pub const DEFAULT_NAMESPACE: &str = "fubsy";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InstallError {
    #[error("invalid namespace name '{0}'")]
    InvalidNamespace(String),

    #[error("cannot install builtins as '{name}': name is already bound to a {found}")]
    NameConflict { name: String, found: &'static str },
}

pub fn install_builtins(
    interp: &mut Interpreter,
    registry: &BuiltinRegistry,
    namespace: &str,
) -> Result<(), InstallError> {
    if !is_identifier(namespace) {
        return Err(InstallError::InvalidNamespace(namespace.to_string()));
    }
    match interp.lookup_root(namespace) {
        None | Some(Value::Namespace(_)) => {}
        Some(other) => {
            return Err(InstallError::NameConflict {
                name: namespace.to_string(),
                found: other.type_name(),
            });
        }
    }

    let mut ns = Namespace::new(namespace);
    for (name, callback) in registry.bound() {
        ns.insert(name, Value::Native(Rc::new(BuiltinWrapper::new(name, callback))));
    }

    info!(namespace, builtins = ns.len(), "installed builtin namespace");
    interp.bind_root(namespace, Value::Namespace(Rc::new(ns)));
    Ok(())
}

/// A plain identifier that is not a keyword.
fn is_identifier(name: &str) -> bool {
    let (tokens, _) = tokenize(name);
    matches!(
        tokens.as_slice(),
        [tok, eof] if tok.kind == TokenKind::Ident
            && tok.span.len() as usize == name.len()
            && eof.is_eof()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::registry::Builtin;
    use fubsy_std_core::{ArgView, BuiltinReturn};

    unsafe extern "C" fn noop(_argc: usize, _argv: *const ArgView<'_>) -> BuiltinReturn {
        BuiltinReturn::none()
    }

    #[test]
    fn test_only_bound_slots_are_members() {
        let mut registry = BuiltinRegistry::new();
        registry.bind(Builtin::Mkdir, noop);
        let mut interp = Interpreter::new();
        install_builtins(&mut interp, &registry, DEFAULT_NAMESPACE).unwrap();

        let Some(Value::Namespace(ns)) = interp.lookup_root("fubsy") else {
            panic!("namespace not bound");
        };
        let members: Vec<_> = ns.members().map(|(name, _)| name).collect();
        assert_eq!(members, ["mkdir"]);
    }

    #[test]
    fn test_invalid_namespace_names() {
        let registry = BuiltinRegistry::new();
        let mut interp = Interpreter::new();
        for bad in ["", "two words", " fubsy", "while", "9lives", "a.b"] {
            assert_eq!(
                install_builtins(&mut interp, &registry, bad),
                Err(InstallError::InvalidNamespace(bad.to_string())),
                "{:?} should be rejected",
                bad
            );
        }
    }

    #[test]
    fn test_conflicting_root_binding() {
        let registry = BuiltinRegistry::new();
        let mut interp = Interpreter::new();
        interp.bind_root("fubsy", Value::Int(1));
        let err = install_builtins(&mut interp, &registry, "fubsy").unwrap_err();
        insta::assert_snapshot!(err.to_string(), @"cannot install builtins as 'fubsy': name is already bound to a int");
    }
}
