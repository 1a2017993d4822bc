// ABOUTME: Line-oriented end-to-end test harness runner

use crate::context::Context;
use crate::error::ParseError;
use crate::parser;
use crate::printer::print_code;
use crate::value::Value;
use std::path::Path;
use thiserror::Error;

/// Errors in the suite file itself, as opposed to failing test cases.
#[derive(Error, Debug)]
pub enum SuiteError {
    #[error("Malformed test file: {0}")]
    Malformed(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// One record: a header line for reporting, a command, and its input and
/// expected-output blocks.
pub struct TestCase {
    pub header: String,
    command: Command,
}

enum Command {
    ParseSuccess { input: String, expected: String },
    ParseFailure { input: String },
    CompileSuccess { input: String, expected: String },
    CompileFailure { input: String },
    EvalSuccess { input: String, expected: String },
    EvalFailure { input: String },
    EvalAll { input: String },
}

/// Runs every case in a suite file against `context`, reporting failures on
/// stderr. Returns the failure count.
pub fn run_file(context: &Context, path: &Path) -> Result<usize, SuiteError> {
    let source = std::fs::read_to_string(path)?;
    run_suite(context, &source)
}

pub fn run_suite(context: &Context, source: &str) -> Result<usize, SuiteError> {
    let mut failures = 0;
    for case in parse_testcases(source)? {
        if let Err(detail) = case.run(context) {
            eprintln!("Test failed at {}: {}", case.header, detail);
            failures += 1;
        }
    }
    Ok(failures)
}

pub fn parse_testcases(source: &str) -> Result<Vec<TestCase>, SuiteError> {
    let mut lines = source.lines();
    let mut testcases = Vec::new();

    while let Some(header) = lines.next() {
        let command_line = lines
            .next()
            .ok_or_else(|| SuiteError::Malformed(format!("missing command after {}", header)))?;
        let parts: Vec<&str> = command_line.split_whitespace().collect();

        let command = match parts.as_slice() {
            ["PARSE_SUCCESS", n, m] => Command::ParseSuccess {
                input: read_lines(&mut lines, n)?,
                expected: read_lines(&mut lines, m)?,
            },
            ["PARSE_FAILURE", n] => Command::ParseFailure {
                input: read_lines(&mut lines, n)?,
            },
            ["COMPILE_SUCCESS", n, m] => Command::CompileSuccess {
                input: read_lines(&mut lines, n)?,
                expected: read_lines(&mut lines, m)?,
            },
            ["COMPILE_FAILURE", n] => Command::CompileFailure {
                input: read_lines(&mut lines, n)?,
            },
            ["EVAL_SUCCESS", n, m] => Command::EvalSuccess {
                input: read_lines(&mut lines, n)?,
                expected: read_lines(&mut lines, m)?,
            },
            ["EVAL_FAILURE", n] => Command::EvalFailure {
                input: read_lines(&mut lines, n)?,
            },
            ["EVAL_ALL", n] => Command::EvalAll {
                input: read_lines(&mut lines, n)?,
            },
            _ => {
                return Err(SuiteError::Malformed(format!(
                    "Unknown test command: {}",
                    command_line
                )))
            }
        };

        testcases.push(TestCase {
            header: header.to_string(),
            command,
        });
    }

    Ok(testcases)
}

fn read_lines(lines: &mut std::str::Lines<'_>, count: &str) -> Result<String, SuiteError> {
    let count: usize = count
        .parse()
        .map_err(|_| SuiteError::Malformed(format!("bad line count: {}", count)))?;
    let mut block = String::new();
    for i in 0..count {
        let line = lines
            .next()
            .ok_or_else(|| SuiteError::Malformed("unexpected end of file".to_string()))?;
        if i != 0 {
            block.push('\n');
        }
        block.push_str(line);
    }
    Ok(block)
}

/// Parses the first datum of the input block.
fn parse_line(input: &str) -> Result<Value, ParseError> {
    let mut result = Err(ParseError("empty input".to_string()));
    let _ = parser::run_parser::<(), _>(input, |datum| {
        result = datum;
        // One datum is enough; stop the driver.
        Err(())
    });
    result
}

impl TestCase {
    fn run(&self, context: &Context) -> Result<(), String> {
        match &self.command {
            Command::ParseSuccess { input, expected } => {
                let value = parse_line(input).map_err(|e| e.to_string())?;
                expect(&value.to_string(), expected)
            }

            Command::ParseFailure { input } => match parse_line(input) {
                Ok(value) => Err(value.to_string()),
                Err(_) => Ok(()),
            },

            Command::CompileSuccess { input, expected } => {
                let expr = parse_line(input).map_err(|e| e.to_string())?;
                let code = context.compile(&expr).map_err(|e| e.to_string())?;
                expect(&print_code(&code), &format!("{}\n", expected))
            }

            Command::CompileFailure { input } => {
                let expr = parse_line(input).map_err(|e| e.to_string())?;
                match context.compile(&expr) {
                    Ok(code) => Err(print_code(&code)),
                    Err(_) => Ok(()),
                }
            }

            Command::EvalSuccess { input, expected } => {
                let expr = parse_line(input).map_err(|e| e.to_string())?;
                let value = context.eval(expr).map_err(|e| e.to_string())?;
                expect(&value.to_string(), expected)
            }

            Command::EvalFailure { input } => {
                let expr = parse_line(input).map_err(|e| e.to_string())?;
                match context.eval(expr) {
                    Ok(value) => Err(value.to_string()),
                    Err(_) => Ok(()),
                }
            }

            Command::EvalAll { input } => parser::run_parser(input, |datum| match datum {
                Ok(expr) => context.eval(expr).map(|_| ()).map_err(|e| e.to_string()),
                Err(e) => Err(e.to_string()),
            }),
        }
    }
}

fn expect(actual: &str, expected: &str) -> Result<(), String> {
    if actual == expected {
        Ok(())
    } else {
        Err(actual.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtins::register_builtins;

    fn context() -> Context {
        let mut context = Context::new();
        register_builtins(&mut context, &[]);
        context
    }

    #[test]
    fn test_suite_with_every_command() {
        let suite = "\
parse a pair
PARSE_SUCCESS 1 1
(1 2 . 3)
(1 2 . 3)
reject an unclosed list
PARSE_FAILURE 1
(1 2
compile a constant
COMPILE_SUCCESS 1 2
42
[0 entry]
  ldc 42
reject a malformed def
COMPILE_FAILURE 1
(def)
evaluate arithmetic
EVAL_SUCCESS 1 1
((builtin +) 1 2)
3
reject an unbound variable
EVAL_FAILURE 1
no-such-variable
run a program
EVAL_ALL 2
(def double (fun (n) ((builtin *) n 2)))
(double 21)";
        let failures = run_suite(&context(), suite).unwrap();
        assert_eq!(failures, 0);
    }

    #[test]
    fn test_failures_are_counted() {
        let suite = "\
expected output differs
EVAL_SUCCESS 1 1
((builtin +) 1 2)
4";
        let failures = run_suite(&context(), suite).unwrap();
        assert_eq!(failures, 1);
    }

    #[test]
    fn test_multi_line_input_blocks() {
        let suite = "\
definitions spread over lines
EVAL_ALL 3
(def x 1)
(def y 2)
((builtin +) x y)";
        let failures = run_suite(&context(), suite).unwrap();
        assert_eq!(failures, 0);
    }

    #[test]
    fn test_malformed_suite_is_rejected() {
        assert!(matches!(
            parse_testcases("header only"),
            Err(SuiteError::Malformed(_))
        ));
        assert!(matches!(
            parse_testcases("h\nBOGUS_COMMAND 1\nx"),
            Err(SuiteError::Malformed(_))
        ));
    }
}
