use lazy_static::lazy_static;

/// What a byte following a backslash in a string literal turns into.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Escape {
    /// The escape decodes to a single byte.
    Byte(u8),

    /// One to three octal digits follow, starting with this byte.
    Octal,

    /// Hexadecimal digits follow the `x`.
    Hex,
}

/// Work out the meaning of a single escape byte.  Used to fill in the lookup table once.
fn classify(byte: u8) -> Escape {
    match byte {
        b'a' => Escape::Byte(0x07),
        b'b' => Escape::Byte(0x08),
        b'e' => Escape::Byte(0x1b),
        b'f' => Escape::Byte(0x0c),
        b'n' => Escape::Byte(0x0a),
        b'r' => Escape::Byte(0x0d),
        b't' => Escape::Byte(0x09),
        b'v' => Escape::Byte(0x0b),
        b'\\' => Escape::Byte(0x5c),
        b'\'' => Escape::Byte(0x27),
        b'"' => Escape::Byte(0x22),
        b'?' => Escape::Byte(0x3f),

        b'0'..=b'7' => Escape::Octal,
        b'x' => Escape::Hex,

        // No unicode escapes, everything else passes through untouched.
        other => Escape::Byte(other),
    }
}

lazy_static! {
    // Every possible byte mapped to its escape meaning.
    static ref ESCAPE_TABLE: [Escape; 256] = {
        let mut table = [Escape::Byte(0); 256];

        for (byte, entry) in table.iter_mut().enumerate() {
            *entry = classify(byte as u8);
        }

        table
    };
}

/// Decode the byte that follows a backslash.
pub fn decode_escape(byte: u8) -> Escape {
    ESCAPE_TABLE[byte as usize]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn c_escapes_decode() {
        assert_eq!(decode_escape(b'n'), Escape::Byte(b'\n'));
        assert_eq!(decode_escape(b't'), Escape::Byte(b'\t'));
        assert_eq!(decode_escape(b'\\'), Escape::Byte(b'\\'));
        assert_eq!(decode_escape(b'"'), Escape::Byte(b'"'));
        assert_eq!(decode_escape(b'e'), Escape::Byte(0x1b));
    }

    #[test]
    fn numeric_escapes_are_flagged() {
        for digit in b'0'..=b'7' {
            assert_eq!(decode_escape(digit), Escape::Octal);
        }

        assert_eq!(decode_escape(b'8'), Escape::Byte(b'8'));
        assert_eq!(decode_escape(b'x'), Escape::Hex);
    }

    #[test]
    fn unknown_bytes_pass_through() {
        assert_eq!(decode_escape(b'q'), Escape::Byte(b'q'));
        assert_eq!(decode_escape(0xff), Escape::Byte(0xff));
    }
}
