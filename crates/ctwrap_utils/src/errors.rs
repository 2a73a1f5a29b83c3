use ariadne::{Color, Label, Report, ReportKind, Source};
use ctwrap_span::Span;

/// A located error in a declaration model or generator config document.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    source_id: String,
    span: Span,
    message: String,
    label: Option<String>,
    help: Option<String>,
}

impl Diagnostic {
    pub fn error(source_id: impl Into<String>, span: Span, message: impl Into<String>) -> Self {
        Self {
            source_id: source_id.into(),
            span,
            message: message.into(),
            label: None,
            help: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    pub fn span(&self) -> Span {
        self.span
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn source_id(&self) -> &str {
        &self.source_id
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    pub fn help(&self) -> Option<&str> {
        self.help.as_deref()
    }
}

/// Renders diagnostics against the document text they point into.
pub fn emit_diagnostics(diagnostics: &[Diagnostic], source: &str) {
    for diagnostic in diagnostics {
        let span: std::ops::Range<usize> = diagnostic.span().into();
        let mut label = Label::new((diagnostic.source_id().to_string(), span.clone()))
            .with_color(Color::Red);
        if let Some(text) = diagnostic.label() {
            label = label.with_message(text);
        }

        let mut report = Report::build(
            ReportKind::Error,
            diagnostic.source_id().to_string(),
            span.start,
        )
        .with_message(diagnostic.message())
        .with_label(label);

        if let Some(help) = diagnostic.help() {
            report = report.with_note(help);
        }

        let _ = report
            .finish()
            .eprint((diagnostic.source_id().to_string(), Source::from(source)));
    }
}
