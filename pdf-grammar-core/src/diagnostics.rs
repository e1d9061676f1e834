//! Findings and where they go.
//!
//! Every check failure becomes a [`Diagnostic`] handed to a
//! [`DiagnosticSink`]. Nothing a document contains aborts a run.

use std::fmt;
use std::io::{self, Write};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DiagnosticKind {
    /// Grammar file header has the wrong column names.
    MalformedHeader,
    /// Grammar file is empty or a row uses an unknown type.
    StructuralError,
    /// The grammar for a link could not be loaded.
    SchemaMissing,
    MissingRequiredKey,
    TypeMismatch,
    IndirectionViolation,
    PossibleValueViolation,
    UnresolvedLink,
    AmbiguousLink,
    MixedContainerNode,
    LimitsViolation,
    /// A name or number tree node has the wrong shape.
    MalformedContainer,
    /// A key is used outside the versions that define it.
    VersionMismatch,
}

impl DiagnosticKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiagnosticKind::MalformedHeader => "MalformedHeader",
            DiagnosticKind::StructuralError => "StructuralError",
            DiagnosticKind::SchemaMissing => "SchemaMissing",
            DiagnosticKind::MissingRequiredKey => "MissingRequiredKey",
            DiagnosticKind::TypeMismatch => "TypeMismatch",
            DiagnosticKind::IndirectionViolation => "IndirectionViolation",
            DiagnosticKind::PossibleValueViolation => "PossibleValueViolation",
            DiagnosticKind::UnresolvedLink => "UnresolvedLink",
            DiagnosticKind::AmbiguousLink => "AmbiguousLink",
            DiagnosticKind::MixedContainerNode => "MixedContainerNode",
            DiagnosticKind::LimitsViolation => "LimitsViolation",
            DiagnosticKind::MalformedContainer => "MalformedContainer",
            DiagnosticKind::VersionMismatch => "VersionMismatch",
        }
    }

    /// Defects of the grammar itself rather than of the document.
    pub fn is_grammar_defect(&self) -> bool {
        matches!(
            self,
            DiagnosticKind::MalformedHeader | DiagnosticKind::StructuralError
        )
    }
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One finding.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    /// The grammar table the finding was made against.
    pub link: String,
    /// The offending key, array index or tree key, if any.
    pub key: Option<String>,
    /// Breadcrumb to the container, e.g. `Trailer/Root/Pages`.
    pub context: String,
    pub message: String,
}

impl Diagnostic {
    pub fn new(
        kind: DiagnosticKind,
        link: impl Into<String>,
        context: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            link: link.into(),
            key: None,
            context: context.into(),
            message: message.into(),
        }
    }

    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    /// Single line without the context path, stable across documents so
    /// batch output can be piped through `sort | uniq -c`.
    pub fn terse_line(&self) -> String {
        match &self.key {
            Some(key) => format!("{}: {}::{}: {}", self.kind, self.link, key, self.message),
            None => format!("{}: {}: {}", self.kind, self.link, self.message),
        }
    }

    pub fn verbose_line(&self) -> String {
        format!("{} [{}]", self.terse_line(), self.context)
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.verbose_line())
    }
}

/// Receiver of findings.
pub trait DiagnosticSink {
    fn report(&mut self, diagnostic: Diagnostic);
}

impl DiagnosticSink for Vec<Diagnostic> {
    fn report(&mut self, diagnostic: Diagnostic) {
        self.push(diagnostic);
    }
}

impl<S: DiagnosticSink + ?Sized> DiagnosticSink for &mut S {
    fn report(&mut self, diagnostic: Diagnostic) {
        (**self).report(diagnostic);
    }
}

/// A sink shared between concurrent runs.
impl<S: DiagnosticSink> DiagnosticSink for Arc<Mutex<S>> {
    fn report(&mut self, diagnostic: Diagnostic) {
        let mut sink = self.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        sink.report(diagnostic);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// No context path.
    Terse,
    #[default]
    Verbose,
    /// One JSON object per line.
    #[cfg(feature = "serde")]
    JsonLines,
}

/// Writes one line per finding.
///
/// Write failures do not interrupt validation; the first one is returned by
/// [`WriterSink::finish`].
pub struct WriterSink<W: Write> {
    writer: W,
    format: OutputFormat,
    reported: usize,
    error: Option<io::Error>,
}

impl<W: Write> WriterSink<W> {
    pub fn new(writer: W, format: OutputFormat) -> Self {
        Self {
            writer,
            format,
            reported: 0,
            error: None,
        }
    }

    /// Number of findings reported so far.
    pub fn reported(&self) -> usize {
        self.reported
    }

    pub fn finish(mut self) -> io::Result<W> {
        if let Some(error) = self.error.take() {
            return Err(error);
        }
        self.writer.flush()?;
        Ok(self.writer)
    }

    fn render(&self, diagnostic: &Diagnostic) -> String {
        match self.format {
            OutputFormat::Terse => diagnostic.terse_line(),
            OutputFormat::Verbose => diagnostic.verbose_line(),
            #[cfg(feature = "serde")]
            OutputFormat::JsonLines => serde_json::to_string(diagnostic)
                .unwrap_or_else(|e| format!("{{\"error\":\"{e}\"}}")),
        }
    }
}

impl<W: Write> DiagnosticSink for WriterSink<W> {
    fn report(&mut self, diagnostic: Diagnostic) {
        self.reported += 1;
        if self.error.is_some() {
            return;
        }
        let line = self.render(&diagnostic);
        if let Err(e) = writeln!(self.writer, "{line}") {
            self.error = Some(e);
        }
    }
}
