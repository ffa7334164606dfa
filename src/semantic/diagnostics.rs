//! Recoverable analysis diagnostics.
//!
//! The analyzer never fails fatally: malformed annotation syntax and other
//! recoverable problems are collected here while the model keeps building
//! with the information that remains.

use smol_str::SmolStr;

/// Severity level of a diagnostic.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Info => "info",
        }
    }
}

/// A diagnostic message with its source location.
#[derive(Clone, Debug)]
pub struct Diagnostic {
    /// The file the diagnostic originated from.
    pub file: SmolStr,
    /// 1-based line number.
    pub line: u32,
    /// 1-based column number.
    pub col: u32,
    pub severity: Severity,
    /// Stable diagnostic code (e.g. `A0001`).
    pub code: &'static str,
    pub message: String,
}

impl Diagnostic {
    pub fn warning(
        file: impl Into<SmolStr>,
        line: u32,
        col: u32,
        code: &'static str,
        message: impl Into<String>,
    ) -> Self {
        Self {
            file: file.into(),
            line,
            col,
            severity: Severity::Warning,
            code,
            message: message.into(),
        }
    }
}

/// Malformed annotation syntax, discarded during scope collection.
pub const MALFORMED_ANNOTATION: &str = "A0001";
