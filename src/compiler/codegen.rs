use crate::{
    compiler::error::{self, CompileError, ErrorKind},
    lang::tokenizing::{Keyword, NumberType, Token},
};
use iceoryx2_bb_log::debug;
use std::{
    fmt::{self, Display, Formatter},
    io::Write,
};

/// Format string handed to `printf` by `dump`.
pub const PRINT_FORMAT: &str = r#"data $fmt = { b "%llu\n", b 0 }"#;

/// Name of the generated entry point.
pub const ENTRY_POINT: &str = "main";

/// The IR register standing in for a position on the simulated stack.  Slot 0 is the bottom of the
/// stack.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Slot(pub usize);

impl Display for Slot {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "%slot{}", self.0)
    }
}

/// Lowers a token list into IR text.  The operand stack is never built, only its depth is tracked.
/// The depth names the registers and lets underflows be caught before anything is emitted for the
/// offending token.
pub struct CodeGenerator<'w> {
    /// Where the IR is written.
    out: &'w mut dyn Write,

    /// How many slots are live.
    depth: usize,

    /// Counter for the labels that follow a `ret`.
    labels: usize,

    /// Number of instructions written for tokens, prologue and epilogue not included.
    instructions: usize,
}

impl<'w> CodeGenerator<'w> {
    pub fn new(out: &'w mut dyn Write) -> Self {
        CodeGenerator {
            out,
            depth: 0,
            labels: 0,
            instructions: 0,
        }
    }

    /// Current simulated stack depth.
    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn instructions(&self) -> usize {
        self.instructions
    }

    /// Emit a whole program: the prologue, one block of instructions for the tokens, and the
    /// epilogue.  Stops at the first error, leaving whatever was written so far in the output.
    pub fn emit_program(&mut self, tokens: &[Token]) -> error::Result<()> {
        self.prologue()?;

        for token in tokens {
            self.emit_token(token)?;
        }

        self.epilogue()?;

        debug!(
            "emitted {} instructions for {} tokens, final depth {}",
            self.instructions,
            tokens.len(),
            self.depth
        );

        Ok(())
    }

    /// Lower a single token.
    pub fn emit_token(&mut self, token: &Token) -> error::Result<()> {
        match token {
            Token::Keyword(_, keyword) => self.emit_keyword(token, *keyword),

            Token::Number(_, number) => {
                let target = Slot(self.depth);

                match number {
                    NumberType::Unsigned(value) => {
                        self.instruction(format_args!("{} =l copy {}", target, value))?
                    }
                    NumberType::Signed(value) => {
                        self.instruction(format_args!("{} =l copy {}", target, value))?
                    }
                }

                self.depth += 1;
                Ok(())
            }

            Token::Literal(_, name) => {
                let target = Slot(self.depth);

                self.instruction(format_args!(
                    "{} =l call ${}()",
                    target,
                    String::from_utf8_lossy(name)
                ))?;

                self.depth += 1;
                Ok(())
            }

            Token::String(location, _) => CompileError::new_as_result(
                Some(*location),
                ErrorKind::UnsupportedOp(token.describe()),
            ),
        }
    }

    fn emit_keyword(&mut self, token: &Token, keyword: Keyword) -> error::Result<()> {
        match keyword {
            Keyword::Add | Keyword::Sub | Keyword::Mul | Keyword::Div => {
                self.require(token, 2)?;

                let op = match keyword {
                    Keyword::Add => "add",
                    Keyword::Sub => "sub",
                    Keyword::Mul => "mul",
                    _ => "div",
                };

                let lhs = Slot(self.depth - 2);
                let rhs = Slot(self.depth - 1);

                self.instruction(format_args!("{} =l {} {}, {}", lhs, op, lhs, rhs))?;
                self.depth -= 1;
            }

            Keyword::Dump => {
                self.require(token, 1)?;

                let value = Slot(self.depth - 1);

                self.instruction(format_args!("call $printf(l $fmt, ..., l {})", value))?;
                self.depth -= 1;
            }

            Keyword::Dup => {
                self.require(token, 1)?;

                let source = Slot(self.depth - 1);
                let target = Slot(self.depth);

                self.instruction(format_args!("{} =l copy {}", target, source))?;
                self.depth += 1;
            }

            Keyword::Drop => {
                self.require(token, 1)?;
                self.depth -= 1;
            }

            Keyword::DropAll => self.depth = 0,

            Keyword::Return => {
                match self.depth {
                    0 => self.instruction(format_args!("ret 0"))?,
                    depth => self.instruction(format_args!("ret {}", Slot(depth - 1)))?,
                }

                // Anything after a ret needs a block of its own.
                self.labels += 1;
                writeln!(self.out, "@ret.{}", self.labels)?;

                self.depth = 0;
            }

            other => {
                return CompileError::new_as_result(
                    Some(*token.location()),
                    ErrorKind::UnsupportedOp(other.spelling().to_string()),
                );
            }
        }

        Ok(())
    }

    /// Make sure the simulated stack holds at least `required` values.
    fn require(&self, token: &Token, required: usize) -> error::Result<()> {
        if self.depth < required {
            return CompileError::new_as_result(
                Some(*token.location()),
                ErrorKind::StackUnderflow {
                    word: token.describe(),
                    depth: self.depth,
                    required,
                },
            );
        }

        Ok(())
    }

    /// Write one indented instruction.
    fn instruction(&mut self, text: fmt::Arguments) -> error::Result<()> {
        writeln!(self.out, "\t{}", text)?;
        self.instructions += 1;
        Ok(())
    }

    fn prologue(&mut self) -> error::Result<()> {
        writeln!(self.out, "{}", PRINT_FORMAT)?;
        writeln!(self.out, "export function w ${}() {{", ENTRY_POINT)?;
        writeln!(self.out, "@start")?;
        Ok(())
    }

    fn epilogue(&mut self) -> error::Result<()> {
        writeln!(self.out, "\tret 0")?;
        writeln!(self.out, "}}")?;
        Ok(())
    }
}

/// Emit the IR for a token list into a stream.
pub fn emit(tokens: &[Token], out: &mut dyn Write) -> error::Result<()> {
    CodeGenerator::new(out).emit_program(tokens)
}

/// Generate the IR for a token list as a String.  On error nothing is returned, the partial output
/// is dropped.
pub fn generate(tokens: &[Token]) -> error::Result<String> {
    let mut out = Vec::new();

    emit(tokens, &mut out)?;

    Ok(String::from_utf8_lossy(&out).into_owned())
}
