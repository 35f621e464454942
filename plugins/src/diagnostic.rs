//!
//! Diagnostic Module - Source-Annotated Plugin Errors
//!
//! Turns parse errors and uncaught exceptions into miette reports that
//! show the script line and a label under the offending code. Exceptions
//! raised without a location (for example from a host call made by the
//! embedder) are reported without a snippet.
//!
//! Usage:
//!   let reporter = DiagnosticReporter::new(&source_file);
//!   reporter.report_parse_errors(&errors);
//!   reporter.report_exception(&exc);
//!

use miette::{Diagnostic, LabeledSpan, NamedSource, Report, SourceSpan};
use thiserror::Error;

use crate::interp::{Exception, ExceptionKind};
use crate::parser::ParseError;
use crate::source::{SourceFile, Span};

#[derive(Debug, Error)]
#[error("{message}")]
pub struct PluginDiagnostic {
    message: String,
    src: NamedSource<String>,
    span: Option<SourceSpan>,
    label: String,
    help_text: Option<String>,
}

impl Diagnostic for PluginDiagnostic {
    fn source_code(&self) -> Option<&dyn miette::SourceCode> {
        self.span.map(|_| &self.src as &dyn miette::SourceCode)
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        let span = self.span?;
        Some(Box::new(std::iter::once(LabeledSpan::new_primary_with_span(
            Some(self.label.clone()),
            span,
        ))))
    }

    fn help<'a>(&'a self) -> Option<Box<dyn std::fmt::Display + 'a>> {
        self.help_text
            .as_ref()
            .map(|h| Box::new(h.clone()) as Box<dyn std::fmt::Display>)
    }
}

fn source_span(span: Span) -> SourceSpan {
    (span.start as usize, span.len() as usize).into()
}

impl PluginDiagnostic {
    pub fn from_parse_error(err: &ParseError, source: &SourceFile) -> Self {
        let (line, col) = source.line_col(err.span.start);

        Self {
            message: format!("syntax error at {}:{}", line, col),
            src: NamedSource::new(&source.name, source.source.clone()),
            span: Some(source_span(err.span)),
            label: err.message.clone(),
            help_text: None,
        }
    }

    pub fn from_exception(exc: &Exception, source: &SourceFile) -> Self {
        let message = match exc.span {
            Some(span) => {
                let (line, col) = source.line_col(span.start);
                format!("uncaught {} at {}:{}", exc.kind, line, col)
            }
            None => format!("uncaught {}", exc.kind),
        };

        Self {
            message,
            src: NamedSource::new(&source.name, source.source.clone()),
            span: exc.span.map(source_span),
            label: exc.message.clone(),
            help_text: exception_help(exc.kind),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn help_text(&self) -> Option<&str> {
        self.help_text.as_deref()
    }
}

fn exception_help(kind: ExceptionKind) -> Option<String> {
    let help = match kind {
        ExceptionKind::TypeError => "builtins accept only string arguments; convert with str()",
        ExceptionKind::ValueError => "strings passed to the host cannot contain NUL bytes",
        ExceptionKind::RuntimeError => "the host builtin reported this error",
        ExceptionKind::NameError => "check spelling or assign the name before using it",
        ExceptionKind::RecursionError => "reduce recursion or nesting, or raise max_call_depth in the plugin config",
        ExceptionKind::MemoryError => "the host ran out of memory",
        ExceptionKind::Error
        | ExceptionKind::AttributeError
        | ExceptionKind::IndexError
        | ExceptionKind::ArithmeticError => return None,
    };
    Some(help.to_string())
}

pub struct DiagnosticReporter<'a> {
    source: &'a SourceFile,
}

impl<'a> DiagnosticReporter<'a> {
    pub fn new(source: &'a SourceFile) -> Self {
        Self { source }
    }

    pub fn render_parse_error(&self, err: &ParseError) -> String {
        format!("{:?}", Report::new(PluginDiagnostic::from_parse_error(err, self.source)))
    }

    pub fn render_exception(&self, exc: &Exception) -> String {
        format!("{:?}", Report::new(PluginDiagnostic::from_exception(exc, self.source)))
    }

    pub fn report_parse_errors(&self, errors: &[ParseError]) {
        for err in errors {
            eprintln!("{}", self.render_parse_error(err));
        }
    }

    pub fn report_exception(&self, exc: &Exception) {
        eprintln!("{}", self.render_exception(exc));
    }
}
