/// Module for walking source code and keeping track of lines and columns.
pub mod source_buffer;

/// Module for the table of backslash escapes allowed in string literals.
pub mod escapes;

/// Module for decoding a string literal's raw text into the bytes it stands for.
pub mod string_literal;

/// Module for splitting the source code into views and classifying them into tokens.
pub mod tokenizing;
