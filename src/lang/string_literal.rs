use crate::lang::escapes::{Escape, decode_escape};

/// Reasons a string literal's raw text could not be decoded.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DecodeError {
    /// A backslash was the very last byte, there's nothing left for it to escape.
    TrailingBackslash,

    /// An octal or hexadecimal escape was found.  Numeric escapes aren't supported yet, the byte is
    /// the one that followed the backslash.
    NumericEscape(u8),
}

/// Decode the raw bytes of a string literal, quotes included, into the bytes it stands for.
///
/// The leading quote is skipped, and a quote in the final position is taken as the closing quote
/// and left out.  Finding where the literal actually ends is up to the lexer, this only translates
/// escape sequences.  The decoded text is never longer than the raw text.
pub fn decode_string_literal(raw: &[u8]) -> Result<Vec<u8>, DecodeError> {
    let mut decoded = Vec::with_capacity(raw.len());
    let last = raw.len().saturating_sub(1);
    let mut index = 0;

    // Skip the opening ".
    if raw.first() == Some(&b'"') {
        index += 1;
    }

    while index < raw.len() {
        let next = raw[index];

        // Don't emit the closing ".
        if index == last && next == b'"' {
            break;
        }

        // Regular bytes are copied through.
        if next != b'\\' {
            decoded.push(next);
            index += 1;
            continue;
        }

        if index == last {
            return Err(DecodeError::TrailingBackslash);
        }

        let escaped = raw[index + 1];

        match decode_escape(escaped) {
            Escape::Byte(byte) => decoded.push(byte),
            Escape::Octal | Escape::Hex => return Err(DecodeError::NumericEscape(escaped)),
        }

        index += 2;
    }

    Ok(decoded)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Escape text the way a user would type it into a literal.
    fn quote(text: &str) -> Vec<u8> {
        let mut raw = vec![b'"'];

        for byte in text.bytes() {
            match byte {
                b'\n' => raw.extend_from_slice(b"\\n"),
                b'\t' => raw.extend_from_slice(b"\\t"),
                b'\\' => raw.extend_from_slice(b"\\\\"),
                b'"' => raw.extend_from_slice(b"\\\""),
                other => raw.push(other),
            }
        }

        raw.push(b'"');
        raw
    }

    #[test]
    fn plain_text_is_unquoted() {
        assert_eq!(decode_string_literal(b"\"hello\"").unwrap(), b"hello");
    }

    #[test]
    fn empty_literal_decodes_to_nothing() {
        // Rejecting the empty result is left to the lexer.
        assert!(decode_string_literal(b"\"\"").unwrap().is_empty());
    }

    #[test]
    fn only_the_final_quote_closes() {
        assert_eq!(decode_string_literal(b"\"abc\"xyz").unwrap(), b"abc\"xyz");
    }

    #[test]
    fn escaped_text_decodes_back() {
        for text in ["tab\there", "say \"hi\"\n", "back\\slash", " ~!@#$%^&*()_+{}|:<>?", "\\\""] {
            let raw = quote(text);
            let decoded = decode_string_literal(&raw).unwrap();

            assert!(decoded.len() <= raw.len());
            assert_eq!(decoded, text.as_bytes());
        }
    }

    #[test]
    fn whitespace_passes_through() {
        assert_eq!(decode_string_literal(b"\"a b\nc\"").unwrap(), b"a b\nc");
    }

    #[test]
    fn trailing_backslash_is_malformed() {
        assert_eq!(decode_string_literal(b"\"abc\\"), Err(DecodeError::TrailingBackslash));
    }

    #[test]
    fn numeric_escapes_are_unsupported() {
        assert_eq!(decode_string_literal(b"\"\\033[0m\""), Err(DecodeError::NumericEscape(b'0')));
        assert_eq!(decode_string_literal(b"\"\\x41\""), Err(DecodeError::NumericEscape(b'x')));
    }
}
