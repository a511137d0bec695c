use std::{
    error::Error,
    fmt::{self, Debug, Display, Formatter},
    io::Write,
};

use crate::{
    compiler::diagnostics::{Diagnostic, Severity},
    lang::source_buffer::{LineTable, SourceSpan},
};

pub type Result<T> = std::result::Result<T, CompileError>;

/// Everything that can stop a compile.  The first group comes from the lexer, the second from the
/// code generator.
#[derive(Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// A string literal ran into the end of the input before its closing quote.
    CutoffString,

    /// A string literal's escapes could not be decoded.
    MalformedString,

    /// Octal and hexadecimal escapes are reserved but not implemented.  Holds the byte that
    /// followed the backslash.
    UnsupportedEscape(u8),

    /// Something that starts with a digit but isn't made only of digits.
    InvalidNumeral,

    /// A numeral too big for 64 bits.
    NumeralOutOfRange,

    /// An operator needed more values than the simulated stack held.
    StackUnderflow {
        word: String,
        depth: usize,
        required: usize,
    },

    /// A token the generator doesn't know how to lower.
    UnsupportedOp(String),

    /// Writing the output failed.
    Io(String),
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            ErrorKind::CutoffString => write!(f, "cutoff string literal"),
            ErrorKind::MalformedString => write!(f, "malformed string literal"),
            ErrorKind::UnsupportedEscape(byte) => write!(
                f,
                "malformed string literal: numeric escape `\\{}` is not supported",
                *byte as char
            ),
            ErrorKind::InvalidNumeral => write!(f, "invalid numeral"),
            ErrorKind::NumeralOutOfRange => write!(f, "invalid numeral: out of range"),
            ErrorKind::StackUnderflow {
                word,
                depth,
                required,
            } => write!(
                f,
                "stack underflow: `{}` needs {} value(s), stack depth is {}",
                word, required, depth
            ),
            ErrorKind::UnsupportedOp(word) => write!(f, "unsupported op `{}`", word),
            ErrorKind::Io(message) => write!(f, "I/O error: {}", message),
        }
    }
}

impl Debug for ErrorKind {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{}", self)
    }
}

/// Any error that stops the compilation of a stac program.
#[derive(Clone, PartialEq, Eq)]
pub struct CompileError {
    /// The location in the source code the error occurred, if available.
    location: Option<SourceSpan>,

    /// What went wrong.
    kind: ErrorKind,
}

impl Error for CompileError {}

/// Pretty print the error with its location, if there is one.
impl Display for CompileError {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match &self.location {
            Some(location) => write!(f, "{}: {}", location, self.kind),
            None => write!(f, "{}", self.kind),
        }
    }
}

impl Debug for CompileError {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{}", self)
    }
}

impl CompileError {
    /// Create a new CompileError.
    pub fn new(location: Option<SourceSpan>, kind: ErrorKind) -> CompileError {
        CompileError { location, kind }
    }

    /// Create a new CompileError and wrap it in a Result::Err.
    pub fn new_as_result<T>(location: Option<SourceSpan>, kind: ErrorKind) -> Result<T> {
        Err(CompileError::new(location, kind))
    }

    /// If available, the location in the source code the error occurred.
    pub fn location(&self) -> &Option<SourceSpan> {
        &self.location
    }

    /// The kind of error.
    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    /// Turn the error into a diagnostic, if it points at source code.
    pub fn to_diagnostic(&self) -> Option<Diagnostic> {
        self.location
            .map(|location| Diagnostic::new(Severity::Error, location, self.kind.to_string()))
    }

    /// Write the error to a diagnostics stream.  Errors with a location get the full source echo,
    /// the others only a single line.
    pub fn render(
        &self,
        out: &mut dyn Write,
        name: &str,
        source: &[u8],
        lines: &LineTable,
    ) -> std::io::Result<()> {
        match self.to_diagnostic() {
            Some(diagnostic) => diagnostic.render(out, name, source, lines),
            None => writeln!(out, "{}: {}: {}", name, Severity::Error, self.kind),
        }
    }
}

/// Allow for the conversion of a std::io::Error into a CompileError.
impl From<std::io::Error> for CompileError {
    fn from(error: std::io::Error) -> CompileError {
        CompileError::new(None, ErrorKind::Io(error.to_string()))
    }
}
