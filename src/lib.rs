//! Front end for stac, a small stack based language.  Source bytes are split into views,
//! classified into tokens, and lowered into QBE style IR text for an external backend.

/// Module for the managing source code and turning it into a list of tokens.
pub mod lang;

/// Module for diagnostics, errors, and the code generator.
pub mod compiler;

use compiler::{codegen, error};
use lang::tokenizing::Lexer;
use std::io::Write;

pub use compiler::error::{CompileError, ErrorKind};

/// Compile a source buffer all the way to IR text.  Warnings and the error that stopped the
/// compile, if any, are rendered to `diagnostics`.  On error no IR is returned.
pub fn compile(name: &str, source: &[u8], diagnostics: &mut dyn Write) -> error::Result<String> {
    let mut lexer = Lexer::new(name, source);

    let lexed = lexer.run();

    lexer.render_warnings(diagnostics)?;

    if let Err(error) = lexed {
        lexer.render_error(&error, diagnostics)?;
        return Err(error);
    }

    match codegen::generate(lexer.tokens()) {
        Ok(ir) => Ok(ir),
        Err(error) => {
            lexer.render_error(&error, diagnostics)?;
            Err(error)
        }
    }
}
