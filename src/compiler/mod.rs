/// Module for the errors that stop a compile.
pub mod error;

/// Module for rendering source located messages, with an echo of the offending line.
pub mod diagnostics;

/// Module for lowering a token list into QBE style IR text.  The operand stack is simulated at
/// compile time to name registers and catch underflows.
pub mod codegen;
