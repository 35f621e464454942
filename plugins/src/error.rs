///
/// Plugin error types.
///
/// Everything that can go wrong between handing a script to the runtime
/// and getting exports back: syntax errors, uncaught script exceptions,
/// installation and export failures, and loader lookups.
///

use thiserror::Error;

use crate::bridge::{ExportError, InstallError};
use crate::config::ConfigError;
use crate::interp::Exception;
use crate::parser::ParseError;

#[derive(Debug, Error)]
pub enum PluginError {
    #[error("inline plugin has syntax errors ({} found)", .0.len())]
    Parse(Vec<ParseError>),

    #[error("inline plugin raised an exception: {0}")]
    Exception(#[from] Exception),

    #[error(transparent)]
    Install(#[from] InstallError),

    #[error(transparent)]
    Export(#[from] ExportError),

    #[error("plugin export '{name}' is a {found}, not a function")]
    NotCallable { name: String, found: &'static str },

    #[error("unsupported language for inline plugins: {0}")]
    UnsupportedLanguage(String),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interp::ExceptionKind;
    use crate::source::Span;

    #[test]
    fn test_error_display_messages() {
        let err = PluginError::Exception(Exception::new(ExceptionKind::ArithmeticError, "division by zero"));
        assert_eq!(
            err.to_string(),
            "inline plugin raised an exception: ArithmeticError: division by zero"
        );

        let err = PluginError::Parse(vec![ParseError::new("expected `;`", Span::dummy())]);
        assert_eq!(err.to_string(), "inline plugin has syntax errors (1 found)");

        let err = PluginError::UnsupportedLanguage("python2".into());
        assert!(err.to_string().contains("unsupported language"));
        assert!(err.to_string().contains("python2"));
    }
}
