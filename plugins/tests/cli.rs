///
/// CLI Integration Tests
///
/// Runs the `fubsy-plugin` binary against scripts written to a temp
/// directory and asserts on exit status, stdout and stderr.
///

use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use tempfile::TempDir;

fn fubsy_plugin(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_fubsy-plugin"))
        .args(args)
        .output()
        .expect("failed to run fubsy-plugin")
}

fn write_script(dir: &Path, name: &str, body: &str) -> String {
    let path = dir.join(name);
    fs::write(&path, body).expect("failed to write script");
    path.to_string_lossy().into_owned()
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[test]
fn run_prints_output_then_exports() {
    let tmp = TempDir::new().unwrap();
    let script = write_script(
        tmp.path(),
        "build.fubsy",
        r#"
fubsy.println("hello", "world");
result = "42";
count = 2;
"#,
    );

    let output = fubsy_plugin(&["run", &script]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert_eq!(stdout(&output), "hello world\nresult = \"42\"\ncount = 2\n");
}

#[test]
fn run_json_with_selected_exports() {
    let tmp = TempDir::new().unwrap();
    let script = write_script(tmp.path(), "build.fubsy", r#"result = "42"; dirs = ["a", "b"]; n = 1;"#);

    let output = fubsy_plugin(&["run", &script, "--export", "result", "--export", "dirs", "--json"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let json: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(json, serde_json::json!({ "result": "42", "dirs": ["a", "b"] }));
}

#[test]
fn run_strict_missing_export_fails() {
    let tmp = TempDir::new().unwrap();
    let script = write_script(tmp.path(), "build.fubsy", r#"result = "42";"#);

    let output = fubsy_plugin(&["run", &script, "--export", "missing", "--strict"]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("plugin did not define 'missing'"));
}

#[test]
fn run_uses_config_file_and_namespace_flag() {
    let tmp = TempDir::new().unwrap();
    let config = write_script(tmp.path(), "fubsy-plugin.toml", "exports = [\"out\"]\n");
    let script = write_script(tmp.path(), "build.fubsy", r#"host.println("via host"); out = "done"; other = 1;"#);

    let output = fubsy_plugin(&["run", &script, "--config", &config, "--namespace", "host"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert_eq!(stdout(&output), "via host\nout = \"done\"\n");
}

#[test]
fn run_reports_uncaught_exception() {
    let tmp = TempDir::new().unwrap();
    let script = write_script(tmp.path(), "build.fubsy", "x = 1;\nthrow \"bad input\";\n");

    let output = fubsy_plugin(&["run", &script]);
    assert_eq!(output.status.code(), Some(1));
    let err = stderr(&output);
    assert!(err.contains("uncaught Error at 2:1"), "stderr: {}", err);
    assert!(err.contains("bad input"), "stderr: {}", err);
}

#[test]
fn check_directory_counts_failures() {
    let tmp = TempDir::new().unwrap();
    write_script(tmp.path(), "good.fubsy", "x = 1;\n");
    write_script(tmp.path(), "bad.fubsy", "x = ;\n");
    write_script(tmp.path(), "notes.txt", "not a script");

    let output = fubsy_plugin(&["check", &tmp.path().to_string_lossy()]);
    assert!(!output.status.success());
    let err = stderr(&output);
    assert!(err.contains("1 of 2 scripts have errors"), "stderr: {}", err);
    assert!(err.contains("syntax error at 1:5"), "stderr: {}", err);
}

#[test]
fn check_clean_file() {
    let tmp = TempDir::new().unwrap();
    let script = write_script(tmp.path(), "good.fubsy", "fn f(a) { return a; }\n");

    let output = fubsy_plugin(&["check", &script]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(stdout(&output).starts_with("No errors in"));
}
