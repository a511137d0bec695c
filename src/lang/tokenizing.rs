use crate::{
    compiler::{
        diagnostics::{Diagnostic, Highlight, Severity},
        error::{self, CompileError, ErrorKind},
    },
    lang::{
        source_buffer::{LineTable, SourceBuffer, SourceSpan},
        string_literal::{DecodeError, decode_string_literal},
    },
};
use iceoryx2_bb_log::{debug, warn};
use lazy_static::lazy_static;
use std::{
    collections::HashMap,
    fmt::{self, Debug, Display, Formatter},
};

/// Name used for diagnostics when the source wasn't given one.
pub const DEFAULT_NAME: &str = "<unknown>";

/// All of the reserved words of the language.  Operators, the control words that the generator
/// doesn't handle yet, and every primitive type name.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Keyword {
    Add,
    Sub,
    Mul,
    Div,
    Dump,
    Dup,
    Drop,
    DropAll,
    Return,

    Func,
    Arrow,
    Do,
    Then,
    End,

    Char,
    UChar,
    Short,
    UShort,
    Int,
    UInt,
    Long,
    ULong,
    Str,
    Ptr,
    NoneType,
    SizeT,
    IntMaxT,
    UIntMaxT,
    UInt8T,
    Int8T,
    UInt16T,
    Int16T,
    UInt32T,
    Int32T,
    UInt64T,
    Int64T,
}

/// Spelling of every keyword.  Views are matched against this table in order and the first match
/// wins.
pub const KEYWORDS: &[(&str, Keyword)] = &[
    ("+", Keyword::Add),
    ("-", Keyword::Sub),
    ("*", Keyword::Mul),
    ("/", Keyword::Div),
    ("dump", Keyword::Dump),
    ("dup", Keyword::Dup),
    ("drop", Keyword::Drop),
    ("dropall", Keyword::DropAll),
    ("ret", Keyword::Return),
    ("func", Keyword::Func),
    ("->", Keyword::Arrow),
    ("do", Keyword::Do),
    ("then", Keyword::Then),
    ("end", Keyword::End),
    ("char", Keyword::Char),
    ("uchar", Keyword::UChar),
    ("short", Keyword::Short),
    ("ushort", Keyword::UShort),
    ("int", Keyword::Int),
    ("uint", Keyword::UInt),
    ("long", Keyword::Long),
    ("ulong", Keyword::ULong),
    ("str", Keyword::Str),
    ("ptr", Keyword::Ptr),
    ("none", Keyword::NoneType),
    ("size_t", Keyword::SizeT),
    ("intmax_t", Keyword::IntMaxT),
    ("uintmax_t", Keyword::UIntMaxT),
    ("uint8_t", Keyword::UInt8T),
    ("int8_t", Keyword::Int8T),
    ("uint16_t", Keyword::UInt16T),
    ("int16_t", Keyword::Int16T),
    ("uint32_t", Keyword::UInt32T),
    ("int32_t", Keyword::Int32T),
    ("uint64_t", Keyword::UInt64T),
    ("int64_t", Keyword::Int64T),
];

lazy_static! {
    // Index of the keyword table by spelling, keeping only the first entry for any spelling.
    static ref KEYWORD_INDEX: HashMap<&'static [u8], Keyword> = {
        let mut index = HashMap::with_capacity(KEYWORDS.len());

        for (spelling, keyword) in KEYWORDS {
            index.entry(spelling.as_bytes()).or_insert(*keyword);
        }

        index
    };
}

impl Keyword {
    /// Look up the keyword spelled exactly as the given text.
    pub fn from_text(text: &[u8]) -> Option<Keyword> {
        KEYWORD_INDEX.get(text).copied()
    }

    /// How the keyword is written in source code.
    pub fn spelling(&self) -> &'static str {
        KEYWORDS
            .iter()
            .find(|(_, keyword)| keyword == self)
            .map(|(spelling, _)| *spelling)
            .unwrap_or("?")
    }
}

impl Display for Keyword {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{}", self.spelling())
    }
}

/// A number token holds either an unsigned or a signed 64 bit integer.  The lexer currently only
/// produces unsigned values.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NumberType {
    Unsigned(u64),
    Signed(i64),
}

impl Display for NumberType {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            NumberType::Unsigned(num) => write!(f, "{}", num),
            NumberType::Signed(num) => write!(f, "{}", num),
        }
    }
}

/// The syntactic class of a token.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LexicalClass {
    Keyword,
    Literal,
    StringLiteral,
    Numeral,
}

/// The concrete kind of a token.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TokenKind {
    Keyword(Keyword),
    UnsignedInt,
    SignedInt,
    StringLiteral,

    /// A bare word, to be called as a zero-argument routine.
    Call,
}

/// A token is a classified view.  Every variant holds the location in the source code it
/// was found at along with the payload of its class.  Bare words borrow their text from the source,
/// string literals own their decoded bytes.
#[derive(Clone, PartialEq, Eq)]
pub enum Token<'a> {
    /// A reserved word or operator.
    Keyword(SourceSpan, Keyword),

    /// A bare word, to be called by name.
    Literal(SourceSpan, &'a [u8]),

    /// A string literal with its escapes decoded.
    String(SourceSpan, Vec<u8>),

    /// A numeric literal.
    Number(SourceSpan, NumberType),
}

/// A list of tokens found in the source code.
pub type TokenList<'a> = Vec<Token<'a>>;

/// Printable form used by the token listing.
impl Display for Token<'_> {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            Token::Keyword(_, keyword) => write!(f, "(kw) {}", keyword),
            Token::Literal(_, text) => write!(f, "(lit) {}", String::from_utf8_lossy(text)),
            Token::String(_, text) => write!(f, "(strlit) `{}`", String::from_utf8_lossy(text)),
            Token::Number(_, num) => write!(f, "(num) {}", num),
        }
    }
}

impl Debug for Token<'_> {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{}: {}", self.location(), self)
    }
}

impl Token<'_> {
    /// Get the token's location in the source text.
    pub fn location(&self) -> &SourceSpan {
        match self {
            Token::Keyword(location, _) => location,
            Token::Literal(location, _) => location,
            Token::String(location, _) => location,
            Token::Number(location, _) => location,
        }
    }

    pub fn class(&self) -> LexicalClass {
        match self {
            Token::Keyword(_, _) => LexicalClass::Keyword,
            Token::Literal(_, _) => LexicalClass::Literal,
            Token::String(_, _) => LexicalClass::StringLiteral,
            Token::Number(_, _) => LexicalClass::Numeral,
        }
    }

    pub fn kind(&self) -> TokenKind {
        match self {
            Token::Keyword(_, keyword) => TokenKind::Keyword(*keyword),
            Token::Literal(_, _) => TokenKind::Call,
            Token::String(_, _) => TokenKind::StringLiteral,
            Token::Number(_, NumberType::Unsigned(_)) => TokenKind::UnsignedInt,
            Token::Number(_, NumberType::Signed(_)) => TokenKind::SignedInt,
        }
    }

    /// Short text naming the token in diagnostics.
    pub fn describe(&self) -> String {
        match self {
            Token::Keyword(_, keyword) => keyword.spelling().to_string(),
            Token::Literal(_, text) => String::from_utf8_lossy(text).into_owned(),
            Token::String(_, _) => "string literal".to_string(),
            Token::Number(_, num) => num.to_string(),
        }
    }
}

/// A whitespace delimited span of the source, before it's been classified.  Views borrow their text
/// from the source buffer.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct View<'a> {
    /// Offset of the first byte.
    start: usize,

    /// Offset one past the last byte.
    end: usize,

    /// The view's bytes, `source[start..end]`.
    text: &'a [u8],

    /// Lines and columns of the first and last bytes.
    location: SourceSpan,

    /// Is this a string literal that never found its closing quote?
    cutoff: bool,
}

/// Printable form used by the view listing.
impl Display for View<'_> {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "\"{}\"", String::from_utf8_lossy(self.text))?;

        if self.cutoff {
            write!(f, " (cutoff)")?;
        }

        Ok(())
    }
}

impl Debug for View<'_> {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{}: {}", self.location, self)
    }
}

impl<'a> View<'a> {
    pub fn start(&self) -> usize {
        self.start
    }

    pub fn end(&self) -> usize {
        self.end
    }

    /// Number of bytes in the view, always `end - start`.
    pub fn range(&self) -> usize {
        self.end - self.start
    }

    pub fn text(&self) -> &'a [u8] {
        self.text
    }

    pub fn location(&self) -> &SourceSpan {
        &self.location
    }

    pub fn is_cutoff(&self) -> bool {
        self.cutoff
    }
}

/// Check if the given byte is considered whitespace.  Matches C's `isspace`.
fn is_whitespace(next: u8) -> bool {
    matches!(next, b' ' | b'\t' | b'\n' | b'\r' | 0x0b | 0x0c)
}

/// Skip over whitespace in the text.  Every whitespace byte is consumed and checkpointed, the first
/// byte that isn't whitespace gets rolled back.
fn skip_whitespace(buffer: &mut SourceBuffer) {
    loop {
        let checkpoint = buffer.save();

        match buffer.next_byte() {
            Some(next) if is_whitespace(next) => continue,
            Some(_) => {
                buffer.restore(checkpoint);
                break;
            }
            None => break,
        }
    }
}

/// The two kinds of comments.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Comment {
    Line,
    Block,
}

/// Check for the start of a comment.  If one is found its opening pair is consumed, otherwise the
/// buffer is rewound to where it was.
fn try_comment_start(buffer: &mut SourceBuffer) -> Option<Comment> {
    if buffer.peek_next() != Some(b'/') {
        return None;
    }

    let checkpoint = buffer.save();
    let _ = buffer.next_byte();

    match buffer.next_byte() {
        Some(b'/') => Some(Comment::Line),
        Some(b'*') => Some(Comment::Block),
        _ => {
            buffer.restore(checkpoint);
            None
        }
    }
}

/// Skip to the end of the line, leaving the new line for the whitespace skipper.
fn skip_line_comment(buffer: &mut SourceBuffer) {
    while let Some(next) = buffer.peek_next() {
        if next == b'\n' {
            break;
        }

        let _ = buffer.next_byte();
    }
}

/// Skip a block comment whose opening `/*` has already been consumed.  Block comments nest.
/// Returns false if the input ended before the comment was closed.
fn skip_block_comment(buffer: &mut SourceBuffer) -> bool {
    let mut depth = 1;

    while depth > 0 {
        match (buffer.peek_next(), buffer.peek_at(1)) {
            (None, _) => return false,

            (Some(b'/'), Some(b'*')) => {
                let _ = buffer.next_byte();
                let _ = buffer.next_byte();
                depth += 1;
            }

            (Some(b'*'), Some(b'/')) => {
                let _ = buffer.next_byte();
                let _ = buffer.next_byte();
                depth -= 1;
            }

            _ => {
                let _ = buffer.next_byte();
            }
        }
    }

    true
}

/// Scan a string literal, opening quote included.  The literal ends at a quote that isn't escaped
/// by an odd run of backslashes.  Returns false if the input ran out first.
fn scan_string(buffer: &mut SourceBuffer) -> bool {
    let _ = buffer.next_byte();
    let mut escaped = false;

    while let Some(next) = buffer.next_byte() {
        match next {
            b'\\' => escaped = !escaped,
            b'"' if !escaped => return true,
            _ => escaped = false,
        }
    }

    false
}

/// Pull bytes out of the buffer until we hit whitespace or the end of the input.
fn scan_until_whitespace(buffer: &mut SourceBuffer) {
    while let Some(next) = buffer.peek_next() {
        if is_whitespace(next) {
            break;
        }

        let _ = buffer.next_byte();
    }
}

/// Parse a view made only of decimal digits into an unsigned value.
fn parse_numeral(view: &View) -> error::Result<u64> {
    let mut value: u64 = 0;

    for &byte in view.text() {
        if !byte.is_ascii_digit() {
            return CompileError::new_as_result(Some(view.location), ErrorKind::InvalidNumeral);
        }

        value = match value
            .checked_mul(10)
            .and_then(|value| value.checked_add((byte - b'0') as u64))
        {
            Some(value) => value,
            None => {
                return CompileError::new_as_result(
                    Some(view.location),
                    ErrorKind::NumeralOutOfRange,
                );
            }
        };
    }

    Ok(value)
}

/// Classify a single view into a token.
fn classify_view<'a>(view: &View<'a>) -> error::Result<Token<'a>> {
    let location = view.location;

    // The literal never ended, there's nothing sensible to make of it.
    if view.cutoff {
        return CompileError::new_as_result(Some(location), ErrorKind::CutoffString);
    }

    if let Some(keyword) = Keyword::from_text(view.text) {
        return Ok(Token::Keyword(location, keyword));
    }

    match view.text.first() {
        Some(b'"') => match decode_string_literal(view.text) {
            // Something was written between the quotes but nothing came out of it.
            Ok(text) if text.is_empty() => {
                CompileError::new_as_result(Some(location), ErrorKind::MalformedString)
            }
            Ok(text) => Ok(Token::String(location, text)),
            Err(DecodeError::TrailingBackslash) => {
                CompileError::new_as_result(Some(location), ErrorKind::MalformedString)
            }
            Err(DecodeError::NumericEscape(byte)) => {
                CompileError::new_as_result(Some(location), ErrorKind::UnsupportedEscape(byte))
            }
        },

        Some(first) if first.is_ascii_digit() => {
            let value = parse_numeral(view)?;
            Ok(Token::Number(location, NumberType::Unsigned(value)))
        }

        _ => Ok(Token::Literal(location, view.text)),
    }
}

/// The lexer owns nothing but its results.  It borrows the source, splits it into views, and then
/// classifies those views into tokens.  It's meant to be run once; its lists are append only.
pub struct Lexer<'a> {
    /// The path or description of the source, used in diagnostics.
    name: String,

    /// The source code being lexed.
    source: &'a [u8],

    /// The whitespace delimited views, in source order.
    views: Vec<View<'a>>,

    /// The classified tokens, in source order.
    tokens: TokenList<'a>,

    /// Length of every line in the source.
    lines: LineTable,

    /// Things worth telling the user about that don't stop the compile.
    warnings: Vec<Diagnostic>,
}

impl<'a> Lexer<'a> {
    /// Create a lexer for the source code.  The source is not copied.
    pub fn new(name: &str, source: &'a [u8]) -> Self {
        let name = match name {
            "" => DEFAULT_NAME,
            _ => name,
        };

        Lexer {
            name: name.to_string(),
            source,
            views: Vec::new(),
            tokens: TokenList::new(),
            lines: LineTable::new(),
            warnings: Vec::new(),
        }
    }

    /// Lex the whole input.  On error nothing in the token list should be used.
    pub fn run(&mut self) -> error::Result<()> {
        self.split();
        self.classify()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn source(&self) -> &'a [u8] {
        self.source
    }

    pub fn views(&self) -> &[View<'a>] {
        &self.views
    }

    pub fn tokens(&self) -> &[Token<'a>] {
        &self.tokens
    }

    pub fn lines(&self) -> &LineTable {
        &self.lines
    }

    pub fn warnings(&self) -> &[Diagnostic] {
        &self.warnings
    }

    /// Render an error raised while lexing or compiling this source.
    pub fn render_error(
        &self,
        error: &CompileError,
        out: &mut dyn std::io::Write,
    ) -> std::io::Result<()> {
        error.render(out, &self.name, self.source, &self.lines)
    }

    /// Render all of the warnings gathered while lexing.
    pub fn render_warnings(&self, out: &mut dyn std::io::Write) -> std::io::Result<()> {
        for warning in &self.warnings {
            warning.render(out, &self.name, self.source, &self.lines)?;
        }

        Ok(())
    }

    /// Split the source into views, dropping whitespace and comments.
    fn split(&mut self) {
        let mut buffer = SourceBuffer::new(self.source);

        loop {
            skip_whitespace(&mut buffer);

            if buffer.is_eof() {
                break;
            }

            // Where a comment or view starts.
            let start = buffer.position();
            let line = buffer.line();
            let column = buffer.column() + 1;

            match try_comment_start(&mut buffer) {
                Some(Comment::Line) => {
                    skip_line_comment(&mut buffer);
                    continue;
                }

                Some(Comment::Block) => {
                    if !skip_block_comment(&mut buffer) {
                        let location = SourceSpan::new(line, column, line, column + 1, 2);

                        warn!(
                            "{}:{}:{}: unterminated block comment",
                            self.name, line, column
                        );

                        self.warnings.push(
                            Diagnostic::new(
                                Severity::Warning,
                                location,
                                "unterminated block comment".to_string(),
                            )
                            .with_highlight(Highlight::Additive),
                        );
                    }

                    continue;
                }

                None => {}
            }

            // Anything stuck to the end of a closed literal stays part of its view.
            let cutoff = buffer.peek_next() == Some(b'"') && !scan_string(&mut buffer);

            if !cutoff {
                scan_until_whitespace(&mut buffer);
            }

            let end = buffer.position();
            let location =
                SourceSpan::new(line, column, buffer.line(), buffer.column(), end - start);

            self.views.push(View {
                start,
                end,
                text: &self.source[start..end],
                location,
                cutoff,
            });
        }

        self.lines = buffer.finish();

        debug!(
            "{}: split into {} views over {} lines",
            self.name,
            self.views.len(),
            self.lines.line_count()
        );
    }

    /// Classify every view into a token, stopping at the first error.
    fn classify(&mut self) -> error::Result<()> {
        for view in &self.views {
            let token = classify_view(view)?;
            self.tokens.push(token);
        }

        debug!("{}: lexed {} tokens", self.name, self.tokens.len());

        Ok(())
    }
}
