///
/// fubsy-plugin - Run inline plugin scripts from the command line
///
/// Provides commands for running and checking plugin scripts:
/// - fubsy-plugin run <file>: Run a script and print its exports
/// - fubsy-plugin check <path>: Syntax check a file or a directory tree
///
/// The runner binds `println` to standard output so scripts have visible
/// output; `mkdir` and `remove` are left to real build hosts.
///

use std::io::Write;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use tracing::Level;

use fubsy_plugins::{
    Builtin, BuiltinRegistry, DiagnosticReporter, PluginConfig, PluginError, PluginRuntime, SourceFile,
    load_config, parse_source,
};
use fubsy_std_core::{ArgView, BuiltinReturn, dispatch};

const SCRIPT_EXTENSION: &str = "fubsy";

#[derive(Parser)]
#[command(name = "fubsy-plugin")]
#[command(author, version, about = "Run fubsy inline plugin scripts", long_about = None)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a plugin script and print its exports
    Run {
        /// The script to run
        file: PathBuf,

        /// Plugin config file (TOML)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Export only this name (repeatable)
        #[arg(long = "export", value_name = "NAME")]
        exports: Vec<String>,

        /// Fail if a requested export is missing
        #[arg(long)]
        strict: bool,

        /// Root-scope name of the builtin namespace
        #[arg(long)]
        namespace: Option<String>,

        /// Print exports as JSON
        #[arg(long)]
        json: bool,
    },

    /// Syntax check without running
    Check {
        /// File or directory to check
        path: Option<PathBuf>,
    },
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Run {
            file,
            config,
            exports,
            strict,
            namespace,
            json,
        } => {
            let overrides = Overrides {
                exports,
                strict,
                namespace,
            };
            run_file(&file, config.as_deref(), overrides, json);
        }
        Commands::Check { path } => {
            check_code(path.as_deref());
        }
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .with_max_level(level)
        .init();
}

unsafe extern "C" fn host_println(argc: usize, argv: *const ArgView<'_>) -> BuiltinReturn {
    unsafe {
        dispatch(argc, argv, |args| {
            let mut out = std::io::stdout().lock();
            writeln!(out, "{}", args.join(" "))?;
            Ok(None)
        })
    }
}

struct Overrides {
    exports: Vec<String>,
    strict: bool,
    namespace: Option<String>,
}

fn build_config(config_path: Option<&Path>, overrides: Overrides) -> Result<PluginConfig, PluginError> {
    let mut config = match config_path {
        Some(path) => load_config(path)?,
        None => PluginConfig::default(),
    };
    if !overrides.exports.is_empty() {
        config.exports = overrides.exports;
    }
    if overrides.strict {
        config.strict_exports = true;
    }
    if let Some(namespace) = overrides.namespace {
        config.namespace = namespace;
    }
    Ok(config)
}

fn read_source(path: &Path) -> String {
    match std::fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error reading file: {}", e);
            std::process::exit(1);
        }
    }
}

fn run_file(file: &Path, config_path: Option<&Path>, overrides: Overrides, json: bool) {
    let source_text = read_source(file);
    let source_file = SourceFile::new(file.display().to_string(), source_text.clone());

    let config = match build_config(config_path, overrides) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    let mut registry = BuiltinRegistry::new();
    registry.bind(Builtin::Println, host_println);

    let mut runtime = match PluginRuntime::new(registry, config) {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    let exports = match runtime.run(&source_text) {
        Ok(exports) => exports,
        Err(e) => {
            let reporter = DiagnosticReporter::new(&source_file);
            match &e {
                PluginError::Parse(errors) => reporter.report_parse_errors(errors),
                PluginError::Exception(exc) => reporter.report_exception(exc),
                other => eprintln!("Error: {}", other),
            }
            std::process::exit(1);
        }
    };

    if json {
        match serde_json::to_string_pretty(&exports) {
            Ok(text) => println!("{}", text),
            Err(e) => {
                eprintln!("Error encoding exports: {}", e);
                std::process::exit(1);
            }
        }
    } else {
        for (name, value) in &exports {
            println!("{} = {}", name, value);
        }
    }
}

fn check_code(path: Option<&Path>) {
    let path = path.unwrap_or(Path::new("."));

    if path.is_file() {
        if !check_file(path) {
            std::process::exit(1);
        }
        println!("No errors in {}", path.display());
    } else if path.is_dir() {
        check_directory(path);
    } else {
        eprintln!("Error: {} does not exist", path.display());
        std::process::exit(1);
    }
}

/// Report syntax errors in one script; true when it is clean.
fn check_file(path: &Path) -> bool {
    let source_text = match std::fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error reading {}: {}", path.display(), e);
            return false;
        }
    };

    let result = parse_source(&source_text);
    if result.errors.is_empty() {
        return true;
    }

    let source_file = SourceFile::new(path.display().to_string(), source_text);
    DiagnosticReporter::new(&source_file).report_parse_errors(&result.errors);
    false
}

fn check_directory(path: &Path) {
    let mut checked = 0;
    let mut failed = 0;

    for entry in walkdir::WalkDir::new(path)
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let file_path = entry.path();
        if file_path.extension().map(|e| e == SCRIPT_EXTENSION).unwrap_or(false) {
            checked += 1;
            if !check_file(file_path) {
                failed += 1;
            }
        }
    }

    if failed > 0 {
        eprintln!("{} of {} scripts have errors", failed, checked);
        std::process::exit(1);
    }
    println!("Checked {} scripts, no errors", checked);
}
