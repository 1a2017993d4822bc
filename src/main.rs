// ABOUTME: CLI driver: script execution, test harness mode and the REPL

mod helper;

use clap::Parser;
use helper::ReplHelper;
use lisp_vm::builtins::register_builtins;
use lisp_vm::config::{HISTORY_FILE, PROMPT, VERSION, WELCOME_MESSAGE};
use lisp_vm::context::Context;
use lisp_vm::parser::run_parser;
use lisp_vm::testsuite;
use rustyline::error::ReadlineError;
use rustyline::history::FileHistory;
use rustyline::{Config, Editor};
use std::path::PathBuf;
use std::process::ExitCode;

const BOOT: &str = include_str!("boot.lisp");

/// A Scheme-flavored Lisp: bytecode compiler and stack VM with first-class
/// continuations and compile-time macros.
#[derive(Parser, Debug)]
#[command(name = "lisp-vm")]
#[command(version = VERSION)]
#[command(about = "A Scheme-flavored Lisp bytecode compiler and stack VM")]
struct CliArgs {
    /// Script files to execute in order; with no files, starts the REPL
    #[arg(value_name = "FILE")]
    files: Vec<PathBuf>,

    /// Treat FILEs as test-harness suites instead of scripts
    #[arg(long = "test")]
    test: bool,

    /// Skip loading the bootstrap file
    #[arg(long = "no-boot")]
    no_boot: bool,

    /// Arguments visible to scripts through the args builtin
    #[arg(last = true, value_name = "ARGS")]
    script_args: Vec<String>,
}

fn main() -> ExitCode {
    let args = CliArgs::parse();

    let mut context = Context::new();
    register_builtins(&mut context, &args.script_args);

    // Test suites install what they need themselves; the boot file would
    // mask missing definitions.
    if args.test {
        return run_suites(&context, &args.files);
    }

    if !args.no_boot {
        if let Err(e) = exec_source(&context, BOOT) {
            eprintln!("boot: {}", e);
            return ExitCode::FAILURE;
        }
    }

    if args.files.is_empty() {
        return repl(&context);
    }

    for file in &args.files {
        let source = match std::fs::read_to_string(file) {
            Ok(source) => source,
            Err(e) => {
                eprintln!("{}: {}", file.display(), e);
                return ExitCode::FAILURE;
            }
        };
        if let Err(e) = exec_source(&context, &source) {
            eprintln!("{}: {}", file.display(), e);
            return ExitCode::FAILURE;
        }
    }
    ExitCode::SUCCESS
}

/// Parses and evaluates every datum in `source`, stopping at the first
/// failure.
fn exec_source(context: &Context, source: &str) -> Result<(), String> {
    run_parser(source, |datum| match datum {
        Ok(expr) => context.eval(expr).map(|_| ()).map_err(|e| e.to_string()),
        Err(e) => Err(e.to_string()),
    })
}

fn run_suites(context: &Context, files: &[PathBuf]) -> ExitCode {
    let mut failures = 0;
    for file in files {
        match testsuite::run_file(context, file) {
            Ok(n) => failures += n,
            Err(e) => {
                eprintln!("{}: {}", file.display(), e);
                return ExitCode::FAILURE;
            }
        }
    }
    if failures == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn repl(context: &Context) -> ExitCode {
    eprintln!("{}", WELCOME_MESSAGE);

    let config = Config::builder().auto_add_history(true).build();
    let mut rl: Editor<ReplHelper, FileHistory> = match Editor::with_config(config) {
        Ok(editor) => editor,
        Err(e) => {
            eprintln!("Failed to initialize REPL: {}", e);
            return ExitCode::FAILURE;
        }
    };
    rl.set_helper(Some(ReplHelper::new()));
    let _ = rl.load_history(HISTORY_FILE);

    loop {
        match rl.readline(PROMPT) {
            Ok(line) => {
                if line.trim().is_empty() {
                    continue;
                }
                let _ = run_parser::<(), _>(&line, |datum| {
                    match datum {
                        Ok(expr) => match context.eval(expr) {
                            Ok(result) => println!("{}", result),
                            Err(e) => eprintln!("{}", e),
                        },
                        Err(e) => eprintln!("{}", e),
                    }
                    Ok(())
                });
            }
            Err(ReadlineError::Interrupted) => {
                eprintln!("^C");
                continue;
            }
            Err(ReadlineError::Eof) => break,
            Err(e) => {
                eprintln!("Error: {}", e);
                break;
            }
        }
    }

    let _ = rl.save_history(HISTORY_FILE);
    ExitCode::SUCCESS
}
