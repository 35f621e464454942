//!
//! Plugin Runtime
//!
//! One interpreter, one builtin registry, one configuration. The runtime
//! installs the builtin namespace when it is created, so a runtime that
//! exists always has a working bridge; installation failure is returned
//! from `new` instead.
//!
//! Root-scope state persists across `run` calls until `close`, which lets
//! a build script define functions in one inline block and call them from
//! a later one, or from the host through `call`.
//!

use tracing::{debug, info, warn};

use crate::bridge::{
    BuiltinRegistry, ExportError, ExportMode, ExportedValueSet, extract, extract_all, install_builtins,
};
use crate::config::PluginConfig;
use crate::error::PluginError;
use crate::interp::{Interpreter, Value};
use crate::meta::MetaPlugin;
use crate::parser::parse_source;

pub const LANGUAGE: &str = "fubsy";

pub struct PluginRuntime {
    interp: Interpreter,
    registry: BuiltinRegistry,
    config: PluginConfig,
}

impl PluginRuntime {
    pub fn new(registry: BuiltinRegistry, config: PluginConfig) -> Result<Self, PluginError> {
        let mut interp = Interpreter::with_max_call_depth(config.max_call_depth);
        install_builtins(&mut interp, &registry, &config.namespace)?;
        Ok(Self {
            interp,
            registry,
            config,
        })
    }

    pub fn registry(&self) -> &BuiltinRegistry {
        &self.registry
    }

    pub fn config(&self) -> &PluginConfig {
        &self.config
    }

    pub fn interpreter(&self) -> &Interpreter {
        &self.interp
    }

    /// Rebuild the builtin namespace from the registry.
    pub fn reinstall(&mut self) -> Result<(), PluginError> {
        install_builtins(&mut self.interp, &self.registry, &self.config.namespace)?;
        Ok(())
    }

    /// Parse and run a script without extracting anything.
    pub fn execute(&mut self, source: &str) -> Result<(), PluginError> {
        let program = parse_source(source).into_result().map_err(PluginError::Parse)?;
        info!(statements = program.statements.len(), "running inline plugin");
        self.interp.run(&program).map_err(|exc| {
            warn!(error = %exc, "inline plugin raised an exception");
            PluginError::Exception(exc)
        })
    }

    /// Run a script and return its exports.
    ///
    /// With `exports` configured, exactly those names are extracted using
    /// the configured mode; otherwise every public root binding except the
    /// builtin namespace is.
    pub fn run(&mut self, source: &str) -> Result<ExportedValueSet, PluginError> {
        self.execute(source)?;
        if self.config.exports.is_empty() {
            Ok(extract_all(&self.interp, &[self.config.namespace.as_str()]))
        } else {
            Ok(extract(&self.interp, &self.config.exports, self.config.export_mode())?)
        }
    }

    pub fn extract<I, S>(&self, names: I, mode: ExportMode) -> Result<ExportedValueSet, PluginError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Ok(extract(&self.interp, names, mode)?)
    }

    /// Call a function the script defined at top level.
    ///
    /// Arguments are passed as script strings. A `none` result is `None`;
    /// anything else is converted to text. An uncaught exception in the
    /// script function comes back as `PluginError::Exception`.
    pub fn call(&mut self, name: &str, args: &[&str]) -> Result<Option<String>, PluginError> {
        match self.interp.lookup_root(name) {
            Some(Value::Function(_) | Value::Native(_)) => {}
            Some(other) => {
                return Err(PluginError::NotCallable {
                    name: name.to_string(),
                    found: other.type_name(),
                });
            }
            None => return Err(ExportError::NameNotFound(name.to_string()).into()),
        }

        let args = args
            .iter()
            .map(|arg| Value::string(*arg))
            .collect::<Result<Vec<_>, _>>()?;
        debug!(function = name, argc = args.len(), "calling plugin function");

        match self.interp.call_root(name, args)? {
            Value::None => Ok(None),
            value => Ok(Some(value.to_string())),
        }
    }

    /// Drop every root binding, then reinstall the builtin namespace.
    pub fn close(&mut self) {
        self.interp.clear_root();
        if let Err(err) = self.reinstall() {
            warn!(error = %err, "failed to reinstall builtins after close");
        }
    }
}

impl MetaPlugin for PluginRuntime {
    fn language(&self) -> &str {
        LANGUAGE
    }

    fn run(&mut self, content: &str) -> Result<ExportedValueSet, PluginError> {
        PluginRuntime::run(self, content)
    }

    fn close(&mut self) {
        PluginRuntime::close(self)
    }
}
