// Code generator tests.  The emitted IR is run through a tiny evaluator so the tests can check what
// the program computes rather than just how the text looks.

use stac::compile;
use stac::compiler::codegen::{self, CodeGenerator};
use stac::compiler::error::{ErrorKind, Result};
use stac::lang::source_buffer::SourceSpan;
use stac::lang::tokenizing::{Lexer, NumberType, Token};
use std::collections::HashMap;
use test_case::test_case;

/// Lex and generate, handing back the IR.
fn generate(source: &str) -> Result<String> {
    let mut lexer = Lexer::new("test.stac", source.as_bytes());
    lexer.run()?;
    codegen::generate(lexer.tokens())
}

/// Evaluate the straight line IR the generator emits and collect everything passed to printf.
/// Calls to other routines return 0.  Evaluation stops at the first `ret`.
fn run(ir: &str) -> Vec<i64> {
    let mut slots: HashMap<&str, i64> = HashMap::new();
    let mut printed = Vec::new();

    let value = |slots: &HashMap<&str, i64>, operand: &str| -> i64 {
        match operand.strip_prefix('%') {
            Some(_) => *slots.get(operand).expect("slot read before it was written"),
            None => operand
                .parse::<u64>()
                .map(|v| v as i64)
                .unwrap_or_else(|_| operand.parse().unwrap()),
        }
    };

    for line in ir.lines().map(str::trim) {
        if let Some((target, expression)) = line.split_once(" =l ") {
            let (op, args) = expression.split_once(' ').unwrap();

            let result = match op {
                "copy" => value(&slots, args),
                "call" => 0,
                _ => {
                    let (lhs, rhs) = args.split_once(", ").unwrap();
                    let lhs = value(&slots, lhs);
                    let rhs = value(&slots, rhs);

                    match op {
                        "add" => lhs.wrapping_add(rhs),
                        "sub" => lhs.wrapping_sub(rhs),
                        "mul" => lhs.wrapping_mul(rhs),
                        "div" => lhs / rhs,
                        other => panic!("unknown op {}", other),
                    }
                }
            };

            slots.insert(target, result);
        } else if let Some(rest) = line.strip_prefix("call $printf(l $fmt, ..., l ") {
            printed.push(value(&slots, rest.trim_end_matches(')')));
        } else if line.starts_with("ret ") {
            break;
        }
    }

    printed
}

fn underflow(source: &str) -> (usize, usize, usize, usize) {
    let error = generate(source).unwrap_err();
    let location = error.location().unwrap();

    match error.kind() {
        ErrorKind::StackUnderflow {
            depth, required, ..
        } => (location.line(), location.column(), *depth, *required),
        other => panic!("expected a stack underflow, got {:?}", other),
    }
}

#[test]
fn empty_program_is_just_the_frame() {
    assert_eq!(
        generate("").unwrap(),
        "data $fmt = { b \"%llu\\n\", b 0 }\n\
         export function w $main() {\n\
         @start\n\
         \tret 0\n\
         }\n"
    );
}

#[test]
fn adding_two_numbers() {
    let ir = generate("2 3 + dump").unwrap();

    assert!(ir.contains(
        "\t%slot0 =l copy 2\n\t%slot1 =l copy 3\n\t%slot0 =l add %slot0, %slot1\n"
    ));
    assert!(ir.contains("\tcall $printf(l $fmt, ..., l %slot0)\n"));
    assert_eq!(run(&ir), vec![5]);
}

#[test]
fn dup_then_add() {
    let mut lexer = Lexer::new("test.stac", b"1 dup +");
    lexer.run().unwrap();

    let mut out = Vec::new();
    let mut generator = CodeGenerator::new(&mut out);

    generator.emit_program(lexer.tokens()).unwrap();

    assert_eq!(generator.depth(), 1);
    assert_eq!(generator.instructions(), 3);

    let ir = String::from_utf8(out).unwrap();

    assert_eq!(ir.matches("=l copy %slot0").count(), 1);
    assert_eq!(ir.matches("=l add").count(), 1);
    assert!(ir.contains("\t%slot0 =l add %slot0, %slot1\n"));
}

#[test_case("2 3 + dump", &[5]; "add")]
#[test_case("5 2 - dump", &[3]; "sub takes the top from the second")]
#[test_case("6 7 * dump", &[42]; "mul")]
#[test_case("20 4 / dump", &[5]; "div divides the second by the top")]
#[test_case("1 2 3 + + dump", &[6]; "nested add")]
#[test_case("1 2 drop dump", &[1]; "drop")]
#[test_case("1 2 dropall 7 dump", &[7]; "dropall")]
#[test_case("4 dup * dup dump dump", &[16, 16]; "dup twice")]
#[test_case("1 2 dump dump", &[2, 1]; "dump pops in order")]
#[test_case("9 dump ret 5 dump", &[9]; "ret ends the program")]
#[test_case("// comment\n10 /* block */ 3 - dump", &[7]; "comments")]
fn programs_compute(source: &str, expected: &[i64]) {
    assert_eq!(run(&generate(source).unwrap()), expected);
}

#[test]
fn bare_words_are_calls() {
    let ir = generate("foo bar + dump").unwrap();

    assert!(ir.contains("\t%slot0 =l call $foo()\n\t%slot1 =l call $bar()\n"));
}

#[test]
fn ret_opens_a_new_block() {
    let ir = generate("4 ret 5 ret ret").unwrap();

    assert!(ir.contains("\tret %slot0\n@ret.1\n\t%slot0 =l copy 5\n\tret %slot0\n@ret.2\n"));
    assert!(ir.contains("@ret.2\n\tret 0\n@ret.3\n\tret 0\n}\n"));
}

#[test]
fn signed_numbers_are_copied() {
    let span = SourceSpan::new(1, 1, 1, 2, 2);
    let tokens = vec![Token::Number(span, NumberType::Signed(-3))];

    assert!(codegen::generate(&tokens).unwrap().contains("\t%slot0 =l copy -3\n"));
}

#[test_case("dump", (1, 1, 0, 1); "dump on empty")]
#[test_case("+", (1, 1, 0, 2); "add on empty")]
#[test_case("1 +", (1, 3, 1, 2); "add with one value")]
#[test_case("1 2 + +", (1, 7, 1, 2); "second add")]
#[test_case("1 2 dropall drop", (1, 13, 0, 1); "drop after dropall")]
#[test_case("dup", (1, 1, 0, 1); "dup on empty")]
#[test_case("1 ret\n  dump", (2, 3, 0, 1); "ret empties the stack")]
fn underflows_are_caught(source: &str, expected: (usize, usize, usize, usize)) {
    assert_eq!(underflow(source), expected);
}

#[test_case("do"; "do")]
#[test_case("func"; "func")]
#[test_case("int"; "type name")]
#[test_case("\"text\""; "string literal")]
fn unsupported_tokens_fail(source: &str) {
    let error = generate(source).unwrap_err();

    assert!(matches!(error.kind(), ErrorKind::UnsupportedOp(_)));
    assert_eq!(error.location().unwrap().column(), 1);
}

#[test]
fn depth_model_matches_generator() {
    // Every sequence of up to four words: the generator succeeds exactly when a plain depth count
    // never drops below what each word needs.
    let words = ["1", "+", "dup", "drop", "dump", "dropall"];
    let needs = [0, 2, 1, 1, 1, 0];

    let mut sequences: Vec<Vec<usize>> = vec![vec![]];

    for _ in 0..4 {
        let longer: Vec<Vec<usize>> = sequences
            .iter()
            .filter(|sequence| sequence.len() == sequences.last().unwrap().len())
            .flat_map(|sequence| {
                (0..words.len()).map(move |word| {
                    let mut next = sequence.clone();
                    next.push(word);
                    next
                })
            })
            .collect();

        sequences.extend(longer);
    }

    for sequence in &sequences {
        let source: Vec<&str> = sequence.iter().map(|&word| words[word]).collect();
        let source = source.join(" ");

        let mut depth: usize = 0;
        let mut expected = Ok(depth);

        for &word in sequence {
            if depth < needs[word] {
                expected = Err(depth);
                break;
            }

            depth = match words[word] {
                "1" | "dup" => depth + 1,
                "dropall" => 0,
                _ => depth - 1,
            };
            expected = Ok(depth);
        }

        let mut lexer = Lexer::new("test.stac", source.as_bytes());
        lexer.run().unwrap();

        let mut out = Vec::new();
        let mut generator = CodeGenerator::new(&mut out);
        let result = generator.emit_program(lexer.tokens());

        match (expected, result) {
            (Ok(depth), Ok(())) => assert_eq!(generator.depth(), depth, "{}", source),
            (Err(depth), Err(error)) => match error.kind() {
                ErrorKind::StackUnderflow { depth: actual, .. } => {
                    assert_eq!(*actual, depth, "{}", source)
                }
                other => panic!("{}: unexpected error {:?}", source, other),
            },
            (expected, result) => panic!("{}: expected {:?}, got {:?}", source, expected, result),
        }
    }
}

#[test]
fn compile_reports_underflow() {
    let mut diagnostics = Vec::new();
    let error = compile("test.stac", b"dump", &mut diagnostics).unwrap_err();

    assert_eq!(error.location().unwrap().line(), 1);
    assert_eq!(error.location().unwrap().column(), 1);
    assert_eq!(
        String::from_utf8(diagnostics).unwrap(),
        "test.stac:1:1: error: stack underflow: `dump` needs 1 value(s), stack depth is 0\n \
         1 | dump\n   \
         | ^~~~\n"
    );
}

#[test]
fn compile_reports_lexer_errors() {
    let mut diagnostics = Vec::new();
    let error = compile("test.stac", b"1 2\n3 4x +", &mut diagnostics).unwrap_err();

    assert_eq!(error.kind(), &ErrorKind::InvalidNumeral);
    assert_eq!(
        String::from_utf8(diagnostics).unwrap(),
        "test.stac:2:3: error: invalid numeral\n \
         2 | 3 4x +\n   \
         |   ^~\n"
    );
}

#[test]
fn compile_produces_ir() {
    let mut diagnostics = Vec::new();
    let ir = compile("test.stac", b"40 2 + dump", &mut diagnostics).unwrap();

    assert!(diagnostics.is_empty());
    assert_eq!(run(&ir), vec![42]);
}
