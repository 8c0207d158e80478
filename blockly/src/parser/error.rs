use std::ops::Range;

use codespan_reporting::diagnostic::{Diagnostic, Label, Severity};
use thiserror::Error;

/// Decode errors with source location information.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct ParseError {
    pub message: String,
    pub span: Range<usize>,
    pub file_id: usize,
    pub severity: Severity,
    /// Name of the XML element the error is about, when there is one.
    pub element: Option<String>,
    pub notes: Vec<String>,
}

impl ParseError {
    pub fn error(message: impl Into<String>, span: Range<usize>, file_id: usize) -> Self {
        ParseError {
            message: message.into(),
            span,
            file_id,
            severity: Severity::Error,
            element: None,
            notes: Vec::new(),
        }
    }

    pub fn with_element(mut self, element: impl Into<String>) -> Self {
        self.element = Some(element.into());
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    /// Convert to a codespan-reporting Diagnostic for display.
    pub fn to_diagnostic(&self) -> Diagnostic<usize> {
        let mut label = Label::primary(self.file_id, self.span.clone());
        if let Some(element) = &self.element {
            label = label.with_message(format!("in <{}>", element));
        }
        Diagnostic::new(self.severity)
            .with_message(&self.message)
            .with_labels(vec![label])
            .with_notes(self.notes.clone())
    }
}
