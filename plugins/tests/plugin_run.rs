///
/// # Integration Tests for plugin runtimes
///
/// End-to-end workflows: loading a config file, running scripts with
/// configured exports, calling script functions from the host, and
/// dispatching inline code through the per-language loader.
///

use std::fs;
use std::path::Path;
use tempfile::TempDir;

use fubsy_plugins::bridge::ExportError;
use fubsy_plugins::config::ConfigError;
use fubsy_plugins::{
    BuiltinRegistry, ExceptionKind, ExportedValue, MetaPluginLoader, PluginConfig, PluginError,
    PluginRuntime, load_config,
};

fn write_config(dir: &Path, body: &str) -> std::path::PathBuf {
    let path = dir.join("fubsy-plugin.toml");
    fs::write(&path, body).expect("Failed to write config");
    path
}

#[test]
fn test_configured_exports_from_file() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let path = write_config(
        temp_dir.path(),
        r#"
exports = ["cflags", "missing"]
"#,
    );

    let config = load_config(&path).expect("Failed to load config");
    let mut rt = PluginRuntime::new(BuiltinRegistry::new(), config).unwrap();
    let exports = rt
        .run(r#"cflags = join(" ", ["-O2", "-Wall"]); scratch = 1;"#)
        .unwrap();

    assert_eq!(exports.len(), 1, "Only configured names should be exported");
    assert_eq!(exports["cflags"].as_str(), Some("-O2 -Wall"));
}

#[test]
fn test_strict_exports_from_file() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let path = write_config(
        temp_dir.path(),
        r#"
exports = ["result"]
strict_exports = true
"#,
    );

    let config = load_config(&path).unwrap();
    let mut rt = PluginRuntime::new(BuiltinRegistry::new(), config).unwrap();

    let err = rt.run("other = 1;").unwrap_err();
    assert!(matches!(err, PluginError::Export(ExportError::NameNotFound(_))));
    assert_eq!(err.to_string(), "plugin did not define 'result'");

    let exports = rt.run(r#"result = "42";"#).unwrap();
    assert_eq!(exports["result"], ExportedValue::Str("42".into()));
}

#[test]
fn test_custom_namespace_and_depth() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let path = write_config(
        temp_dir.path(),
        r#"
namespace = "host"
max_call_depth = 10
"#,
    );

    let config = load_config(&path).unwrap();
    let mut rt = PluginRuntime::new(BuiltinRegistry::new(), config).unwrap();
    assert!(rt.interpreter().lookup_root("host").is_some());
    assert!(rt.interpreter().lookup_root("fubsy").is_none());

    let err = rt.run("fn down(n) { return down(n + 1); } down(0);").unwrap_err();
    let PluginError::Exception(exc) = err else {
        panic!("expected RecursionError");
    };
    assert_eq!(exc.kind, ExceptionKind::RecursionError);
    assert_eq!(exc.message, "maximum call depth of 10 exceeded");
}

#[test]
fn test_invalid_config_file() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let path = write_config(temp_dir.path(), "max_call_depth = \"deep\"\n");

    let err = load_config(&path).unwrap_err();
    assert!(matches!(err, ConfigError::Parse(_)));

    let err = PluginError::from(err);
    assert!(err.to_string().starts_with("Invalid plugin config"));
}

#[test]
fn test_host_calls_script_function() {
    let mut rt = PluginRuntime::new(BuiltinRegistry::new(), PluginConfig::default()).unwrap();
    rt.run(
        r#"
fn object_name(src) {
    if (len(src) == 0) {
        throw "empty source name";
    }
    return src + ".o";
}

fn nothing() {}
"#,
    )
    .unwrap();

    assert_eq!(rt.call("object_name", &["main"]).unwrap().as_deref(), Some("main.o"));
    assert_eq!(rt.call("nothing", &[]).unwrap(), None);

    let err = rt.call("object_name", &[""]).unwrap_err();
    assert_eq!(
        err.to_string(),
        "inline plugin raised an exception: Error: empty source name"
    );

    let err = rt.call("object_name", &[]).unwrap_err();
    let PluginError::Exception(exc) = err else {
        panic!("expected arity error");
    };
    assert_eq!(exc.kind, ExceptionKind::TypeError);
}

#[test]
fn test_loader_runs_inline_blocks() {
    let mut loader = MetaPluginLoader::new(BuiltinRegistry::new(), PluginConfig::default());

    let first = loader.run_inline("fubsy", "base = \"out\";").unwrap();
    assert_eq!(first["base"].as_str(), Some("out"));

    let second = loader.run_inline("fubsy", "bin = base + \"/bin\";").unwrap();
    assert_eq!(second["bin"].as_str(), Some("out/bin"));
    assert_eq!(second["base"].as_str(), Some("out"), "State is shared between blocks");

    loader.close_all();
    let err = loader.run_inline("fubsy", "again = base;").unwrap_err();
    let PluginError::Exception(exc) = err else {
        panic!("expected NameError after close");
    };
    assert_eq!(exc.kind, ExceptionKind::NameError);

    let err = loader.run_inline("cobol", "x").unwrap_err();
    assert_eq!(err.to_string(), "unsupported language for inline plugins: cobol");
}

#[test]
fn test_deep_scripts_fail_cleanly_with_default_config() {
    let mut rt = PluginRuntime::new(BuiltinRegistry::new(), PluginConfig::default()).unwrap();

    let err = rt
        .run(r#"fn f(n) { if (true) { if (true) { return f(n) + 1; } } } x = f("a");"#)
        .unwrap_err();
    let PluginError::Exception(exc) = err else {
        panic!("expected RecursionError");
    };
    assert_eq!(exc.kind, ExceptionKind::RecursionError);
    assert_eq!(exc.message, "maximum call depth of 48 exceeded");

    let source = format!("x = {}1{};", "(".repeat(200), ")".repeat(200));
    let PluginError::Parse(errors) = rt.run(&source).unwrap_err() else {
        panic!("expected a parse error");
    };
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].message, "code nested too deeply (limit is 48 levels)");

    let exports = rt.run("ok = 1;").unwrap();
    assert_eq!(exports["ok"], ExportedValue::Int(1));
}
