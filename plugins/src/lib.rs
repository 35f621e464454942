///
/// fubsy-plugins - Inline Plugin Runtime
///
/// Runs inline plugin scripts embedded in fubsy build files and lets them
/// call back into the host through a fixed set of builtins. It includes:
///
/// - source: Spans and line lookup for scripts
/// - lexer / ast / parser: The script language front end
/// - interp: Tree-walking interpreter, values and exceptions
/// - bridge: Builtin registry, argument marshaling, host invocation,
///   result translation, namespace install and export extraction
/// - plugin / meta: Plugin runtimes and the per-language loader
/// - config / diagnostic / error: Ambient plumbing
///
/// Entry points:
/// - `PluginRuntime::new`: Create a runtime with builtins installed
/// - `PluginRuntime::run`: Run a script and collect its exports
/// - `MetaPluginLoader::run_inline`: Dispatch inline code by language
///

pub mod ast;
pub mod bridge;
pub mod config;
pub mod diagnostic;
pub mod error;
pub mod interp;
pub mod lexer;
pub mod meta;
pub mod parser;
pub mod plugin;
pub mod source;

pub use bridge::{Builtin, BuiltinRegistry, ExportMode, ExportedValue, ExportedValueSet};
pub use config::{PluginConfig, load_config};
pub use diagnostic::DiagnosticReporter;
pub use error::PluginError;
pub use interp::{Exception, ExceptionKind, Interpreter, Value};
pub use lexer::tokenize;
pub use meta::{MetaPlugin, MetaPluginLoader};
pub use parser::{parse, parse_source};
pub use plugin::PluginRuntime;
pub use source::SourceFile;

#[test]
fn test_inline_build_plugin() {
    let source = r#"
fn target_dirs(base) {
    var dirs = [];
    for (name in ["obj", "bin", "lib"]) {
        dirs = dirs + [base + "/" + name];
    }
    return dirs;
}

out = target_dirs("build");
summary = join(",", out);
"#;

    let mut rt = PluginRuntime::new(BuiltinRegistry::new(), PluginConfig::default()).unwrap();
    let exports = rt.run(source).unwrap();
    assert_eq!(exports["summary"].as_str(), Some("build/obj,build/bin,build/lib"));
    assert!(exports["target_dirs"].is_callable());
}
