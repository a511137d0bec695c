use iceoryx2_bb_log::{LogLevel, info, set_log_level_from_env_or};
use stac::{
    compiler::{codegen, error::CompileError},
    lang::tokenizing::Lexer,
};
use std::{
    env::{args, var},
    fs,
    io::{self, Write},
    process::ExitCode,
};

/// Where the IR goes when no output path is given.
const DEFAULT_OUTPUT: &str = "out.ssa";

/// What the user asked for on the command line.
struct Options {
    /// Print the view and token listings before generating code.
    dump: bool,

    /// The source file to compile.
    source: String,

    /// The file to write the IR to.
    output: String,
}

/// Get the output path.  A path on the command line wins, then the environment variable
/// STAC_OUTPUT, then the default.
fn output_path(given: Option<&String>) -> String {
    if let Some(path) = given {
        return path.clone();
    }

    match var("STAC_OUTPUT") {
        Ok(path) if !path.is_empty() => path,
        _ => DEFAULT_OUTPUT.to_string(),
    }
}

/// Gather the options from the arguments, skipping the program name.
fn parse_options(args: &[String]) -> Option<Options> {
    let dump = args.iter().any(|arg| arg == "--dump");
    let positional: Vec<&String> = args.iter().filter(|arg| *arg != "--dump").collect();

    match positional.len() {
        1 | 2 => Some(Options {
            dump,
            source: positional[0].clone(),
            output: output_path(positional.get(1).copied()),
        }),
        _ => None,
    }
}

/// Print the views and tokens the same way diagnostics refer to them.
fn print_listing(lexer: &Lexer) -> io::Result<()> {
    let mut out = io::stdout().lock();
    let bar = "==========";

    writeln!(out, "{}\nViews\n{}", bar, bar)?;

    for view in lexer.views() {
        let location = view.location();
        writeln!(
            out,
            "{}:{}:{}: {}",
            lexer.name(),
            location.line(),
            location.column(),
            view
        )?;
    }

    writeln!(out, "{}\nTokens\n{}", bar, bar)?;

    for token in lexer.tokens() {
        let location = token.location();
        writeln!(
            out,
            "{}:{}:{}: {}",
            lexer.name(),
            location.line(),
            location.column(),
            token
        )?;
    }

    Ok(())
}

/// Report a failed compile and produce the failing exit code.
fn fail(program: &str, lexer: &Lexer, error: &CompileError) -> ExitCode {
    let mut err = io::stderr().lock();

    let _ = lexer.render_error(error, &mut err);
    let _ = writeln!(err, "{}: failed to compile", program);

    ExitCode::FAILURE
}

fn main() -> ExitCode {
    set_log_level_from_env_or(LogLevel::Warn);

    let args: Vec<String> = args().collect();
    let program = args.first().map(String::as_str).unwrap_or("stac");

    let options = match parse_options(args.get(1..).unwrap_or_default()) {
        Some(options) => options,
        None => {
            eprintln!("usage: {} [--dump] <source-file> [output-file]", program);
            return ExitCode::FAILURE;
        }
    };

    // Just read the whole file into memory.
    let source = match fs::read(&options.source) {
        Ok(source) => source,
        Err(error) => {
            eprintln!("{}: could not read {}: {}", program, options.source, error);
            return ExitCode::FAILURE;
        }
    };

    let mut lexer = Lexer::new(&options.source, &source);
    let lexed = lexer.run();

    let _ = lexer.render_warnings(&mut io::stderr().lock());

    if let Err(error) = lexed {
        return fail(program, &lexer, &error);
    }

    if options.dump {
        if let Err(error) = print_listing(&lexer) {
            return fail(program, &lexer, &CompileError::from(error));
        }
    }

    // Generate everything first so a failed compile never leaves a partial file behind.
    let ir = match codegen::generate(lexer.tokens()) {
        Ok(ir) => ir,
        Err(error) => return fail(program, &lexer, &error),
    };

    if let Err(error) = fs::write(&options.output, ir) {
        eprintln!("{}: could not write {}: {}", program, options.output, error);
        return ExitCode::FAILURE;
    }

    info!("{}: wrote {}", options.source, options.output);

    ExitCode::SUCCESS
}
