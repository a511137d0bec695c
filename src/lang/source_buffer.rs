use std::fmt::{self, Display, Formatter};

/// Value stored at index 0 of the line table.  Lines are 1 based so this entry must never be used
/// as a real line length.
pub const INVALID_LINE: usize = usize::MAX;

/// The location in the source code where a view, a token, or an error was found.  It records the
/// line and column of both the first and the last byte, as well as the number of bytes covered.
///
/// This is a read-only structure.  Use the field accessor methods to get the values.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct SourceSpan {
    /// The 1 based line of the first byte.
    line_start: usize,

    /// The 1 based line of the last byte.
    line_end: usize,

    /// The 1 based column of the first byte.
    column_start: usize,

    /// The 1 based column of the last byte.
    column_end: usize,

    /// How many bytes of the source the span covers.
    range: usize,
}

/// Used for error reporting to show where in the source code something was found.
impl Display for SourceSpan {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}:{}", self.line_start, self.column_start)
    }
}

impl SourceSpan {
    /// Create a new span with all of the needed information.
    pub fn new(
        line_start: usize,
        column_start: usize,
        line_end: usize,
        column_end: usize,
        range: usize,
    ) -> Self {
        SourceSpan {
            line_start,
            line_end,
            column_start,
            column_end,
            range,
        }
    }

    /// The 1 based line number of the first byte.
    pub fn line(&self) -> usize {
        self.line_start
    }

    /// The 1 based column number of the first byte.
    pub fn column(&self) -> usize {
        self.column_start
    }

    /// The 1 based line number of the last byte.
    pub fn line_end(&self) -> usize {
        self.line_end
    }

    /// The 1 based column number of the last byte.
    pub fn column_end(&self) -> usize {
        self.column_end
    }

    /// Number of bytes covered by the span.
    pub fn range(&self) -> usize {
        self.range
    }
}

/// Keeps track of how long every line of the source is and where it starts.  The lexer fills this
/// in as it crosses new lines, the diagnostics use it to echo the offending line and to keep the
/// highlight from running past the end of it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LineTable {
    /// Length of each line in bytes, not counting the new line.  Index 0 is `INVALID_LINE`.
    lengths: Vec<usize>,

    /// Byte offset of the start of each line.  Index 0 is `INVALID_LINE`.
    starts: Vec<usize>,
}

impl Default for LineTable {
    fn default() -> Self {
        Self::new()
    }
}

impl LineTable {
    /// Create a table for a source that starts with line 1 at offset 0.
    pub fn new() -> Self {
        LineTable {
            lengths: vec![INVALID_LINE],
            starts: vec![INVALID_LINE, 0],
        }
    }

    /// Number of lines whose end has been recorded.
    pub fn line_count(&self) -> usize {
        self.lengths.len() - 1
    }

    /// The length of a line, or None for line 0 and lines that haven't ended yet.
    pub fn length(&self, line: usize) -> Option<usize> {
        match line {
            0 => None,
            _ => self.lengths.get(line).copied(),
        }
    }

    /// The byte offset the line starts at.
    pub fn start(&self, line: usize) -> Option<usize> {
        match line {
            0 => None,
            _ => self.starts.get(line).copied(),
        }
    }

    /// The text of a line without its new line.
    pub fn text<'a>(&self, source: &'a [u8], line: usize) -> Option<&'a [u8]> {
        let start = self.start(line)?;
        let length = self.length(line)?;

        source.get(start..start + length)
    }

    /// Does the span fall within the bounds recorded for its lines?
    pub fn contains(&self, span: &SourceSpan) -> bool {
        let first = match self.length(span.line()) {
            Some(length) => length,
            None => return false,
        };

        let last = match self.length(span.line_end()) {
            Some(length) => length,
            None => return false,
        };

        span.column() >= 1
            && span.column() <= first
            && span.column_end() <= last
            && span.line() <= span.line_end()
    }

    /// Record the end of the current line.  When `next_start` is given a new line begins at that
    /// byte offset.
    fn end_line(&mut self, length: usize, next_start: Option<usize>) {
        self.lengths.push(length);

        if let Some(start) = next_start {
            self.starts.push(start);
        }
    }

    /// Number of raw entries, used by checkpoints.
    fn recorded(&self) -> (usize, usize) {
        (self.lengths.len(), self.starts.len())
    }

    /// Roll the table back to an earlier number of entries.
    fn truncate(&mut self, recorded: (usize, usize)) {
        self.lengths.truncate(recorded.0);
        self.starts.truncate(recorded.1);
    }
}

/// A saved cursor state.  Taking one is a plain copy, restoring it rewinds the buffer to exactly
/// where it was, line table included.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Checkpoint {
    position: usize,
    line: usize,
    column: usize,
    lines_recorded: (usize, usize),
}

/// A buffer for processing source code.  This is used by the lexer to split the source into views.
/// The buffer acts as a forward iterator over the bytes of the code that can be rewound to a saved
/// `Checkpoint`.  As bytes are consumed the line and column of the cursor are maintained, and every
/// new line is recorded in the `LineTable`.
///
/// The SourceBuffer only holds a reference to the source code, the code is not copied.
pub struct SourceBuffer<'a> {
    /// The source being processed.
    source: &'a [u8],

    /// Offset of the next byte to be consumed.
    position: usize,

    /// The 1 based line of the cursor.
    line: usize,

    /// How many bytes of the current line have been consumed.  The next byte sits at column
    /// `column + 1`.
    column: usize,

    /// Lengths and starts of all the lines crossed so far.
    lines: LineTable,
}

impl<'a> SourceBuffer<'a> {
    /// Create a new SourceBuffer over the source code.  The code is not copied and is expected to
    /// outlive the buffer.
    pub fn new(source: &'a [u8]) -> Self {
        SourceBuffer {
            source,
            position: 0,
            line: 1,
            column: 0,
            lines: LineTable::new(),
        }
    }

    /// The source code being processed.
    pub fn source(&self) -> &'a [u8] {
        self.source
    }

    /// Offset of the next byte.
    pub fn position(&self) -> usize {
        self.position
    }

    /// The 1 based line of the cursor.
    pub fn line(&self) -> usize {
        self.line
    }

    /// Bytes consumed so far on the current line.
    pub fn column(&self) -> usize {
        self.column
    }

    /// Have all the bytes been consumed?
    pub fn is_eof(&self) -> bool {
        self.position >= self.source.len()
    }

    /// Take a peek at the next byte without consuming it.
    pub fn peek_next(&self) -> Option<u8> {
        self.peek_at(0)
    }

    /// Take a peek at the byte `offset` places after the next one.
    pub fn peek_at(&self, offset: usize) -> Option<u8> {
        self.source.get(self.position + offset).copied()
    }

    /// Get and consume the next byte in the source code.
    pub fn next_byte(&mut self) -> Option<u8> {
        let next = self.peek_next()?;

        self.position += 1;
        self.increment_location(next);

        Some(next)
    }

    /// Save the cursor so that it can be rewound later.
    pub fn save(&self) -> Checkpoint {
        Checkpoint {
            position: self.position,
            line: self.line,
            column: self.column,
            lines_recorded: self.lines.recorded(),
        }
    }

    /// Rewind the cursor to a saved checkpoint.
    pub fn restore(&mut self, checkpoint: Checkpoint) {
        self.position = checkpoint.position;
        self.line = checkpoint.line;
        self.column = checkpoint.column;
        self.lines.truncate(checkpoint.lines_recorded);
    }

    /// Record the length of the last line and hand back the finished line table.
    pub fn finish(mut self) -> LineTable {
        self.lines.end_line(self.column, None);
        self.lines
    }

    /// Advance one column for regular bytes.  For new lines record the line's length, reset the
    /// column and move on to the next line.
    fn increment_location(&mut self, next: u8) {
        if next == b'\n' {
            self.lines.end_line(self.column, Some(self.position));
            self.line += 1;
            self.column = 0;
        } else {
            self.column += 1;
        }
    }
}
