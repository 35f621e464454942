//!
//! Inline Plugin Loader
//!
//! Build scripts embed plugin code tagged with a language name. The loader
//! maps each language to a factory and keeps one live plugin per language,
//! created on first use, so consecutive inline blocks in the same language
//! share state.
//!
//! Every created plugin gets its own copy of the loader's registry; later
//! changes to the loader do not affect plugins that already exist.
//!

use indexmap::IndexMap;
use indexmap::map::Entry;
use tracing::info;

use crate::bridge::{BuiltinRegistry, ExportedValueSet};
use crate::config::PluginConfig;
use crate::error::PluginError;
use crate::plugin::{LANGUAGE, PluginRuntime};

/// A runtime for one inline plugin language.
pub trait MetaPlugin {
    fn language(&self) -> &str;

    /// Run one block of inline plugin code and return its exports.
    fn run(&mut self, content: &str) -> Result<ExportedValueSet, PluginError>;

    fn close(&mut self);
}

pub type PluginFactory = fn(&BuiltinRegistry, &PluginConfig) -> Result<Box<dyn MetaPlugin>, PluginError>;

fn script_factory(registry: &BuiltinRegistry, config: &PluginConfig) -> Result<Box<dyn MetaPlugin>, PluginError> {
    Ok(Box::new(PluginRuntime::new(registry.clone(), config.clone())?))
}

pub struct MetaPluginLoader {
    registry: BuiltinRegistry,
    config: PluginConfig,
    factories: IndexMap<String, PluginFactory>,
    cache: IndexMap<String, Box<dyn MetaPlugin>>,
}

impl MetaPluginLoader {
    pub fn new(registry: BuiltinRegistry, config: PluginConfig) -> Self {
        let mut loader = Self {
            registry,
            config,
            factories: IndexMap::new(),
            cache: IndexMap::new(),
        };
        loader.register(LANGUAGE, script_factory);
        loader
    }

    pub fn register(&mut self, language: &str, factory: PluginFactory) {
        self.factories.insert(language.to_string(), factory);
    }

    pub fn languages(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }

    /// The plugin for `language`, created on first use.
    pub fn load(&mut self, language: &str) -> Result<&mut dyn MetaPlugin, PluginError> {
        let plugin = match self.cache.entry(language.to_string()) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => {
                let factory = self
                    .factories
                    .get(language)
                    .ok_or_else(|| PluginError::UnsupportedLanguage(language.to_string()))?;
                let plugin = factory(&self.registry, &self.config)?;
                info!(language, "created inline plugin runtime");
                entry.insert(plugin)
            }
        };
        Ok(&mut **plugin)
    }

    pub fn run_inline(&mut self, language: &str, content: &str) -> Result<ExportedValueSet, PluginError> {
        self.load(language)?.run(content)
    }

    pub fn is_loaded(&self, language: &str) -> bool {
        self.cache.contains_key(language)
    }

    /// Close and forget every plugin created so far.
    pub fn close_all(&mut self) {
        for (language, mut plugin) in self.cache.drain(..) {
            info!(language = %language, "closing inline plugin runtime");
            plugin.close();
        }
    }
}
