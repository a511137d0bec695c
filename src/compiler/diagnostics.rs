use std::{
    fmt::{self, Display, Formatter},
    io::{self, Write},
};

use crate::lang::source_buffer::{LineTable, SourceSpan};

/// How serious a diagnostic is.  Only errors stop a compile.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

/// The label printed in front of the message.
impl Display for Severity {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
        }
    }
}

/// How the offending bytes are marked under the echoed source line.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Highlight {
    /// A caret on the first byte followed by tildes, `^~~~`.
    Underline,

    /// A run of pluses, `++++`, for marking text that belongs with something else.
    Additive,
}

/// A message about a specific place in the source code.  Rendered as a header line, an echo of the
/// source line and a marker line:
///
/// ```text
/// main.stac:1:1: error: stack underflow: `dump` needs 1 value(s), stack depth is 0
///  1 | dump
///    | ^~~~
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Diagnostic {
    severity: Severity,
    location: SourceSpan,
    message: String,
    highlight: Highlight,
}

impl Diagnostic {
    /// Create a new diagnostic using the underline highlight.
    pub fn new(severity: Severity, location: SourceSpan, message: String) -> Diagnostic {
        Diagnostic {
            severity,
            location,
            message,
            highlight: Highlight::Underline,
        }
    }

    /// Switch to a different highlight style.
    pub fn with_highlight(mut self, highlight: Highlight) -> Diagnostic {
        self.highlight = highlight;
        self
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    pub fn location(&self) -> &SourceSpan {
        &self.location
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn highlight(&self) -> Highlight {
        self.highlight
    }

    /// How many columns the marker covers.  The span's byte range is clipped to what is left of its
    /// first line, but at least one column is always marked.
    pub fn marker_width(&self, lines: &LineTable) -> usize {
        let column = self.location.column().max(1);
        let range = self.location.range().max(1);

        match lines.length(self.location.line()) {
            Some(length) => range.min(length.saturating_sub(column - 1)).max(1),
            None => range,
        }
    }

    /// Write the diagnostic to a stream.
    pub fn render(
        &self,
        out: &mut dyn Write,
        name: &str,
        source: &[u8],
        lines: &LineTable,
    ) -> io::Result<()> {
        let line = self.location.line();
        let column = self.location.column();

        writeln!(
            out,
            "{}:{}:{}: {}: {}",
            name, line, column, self.severity, self.message
        )?;

        let text = lines.text(source, line).unwrap_or_default();
        writeln!(out, " {} | {}", line, String::from_utf8_lossy(text))?;

        let gutter = " ".repeat(line.to_string().len());
        let indent = " ".repeat(column.saturating_sub(1));
        let width = self.marker_width(lines);

        let marker = match self.highlight {
            Highlight::Underline => format!("^{}", "~".repeat(width - 1)),
            Highlight::Additive => "+".repeat(width),
        };

        writeln!(out, " {} | {}{}", gutter, indent, marker)
    }
}
