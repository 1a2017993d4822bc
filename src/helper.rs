// ABOUTME: REPL line helper: syntax highlighting and bracket-balance validation

use rustyline::highlight::{CmdKind, Highlighter};
use rustyline::validate::{ValidationContext, ValidationResult, Validator};
use rustyline_derive::{Completer, Helper, Hinter};
use std::borrow::Cow;

// 3-bit/4-bit ANSI colors for terminal compatibility.
const COLOR_RESET: &str = "\x1b[0m";
const COLOR_PAREN: &str = "\x1b[1;34m";
const COLOR_NUMBER: &str = "\x1b[33m";
const COLOR_STRING: &str = "\x1b[32m";
const COLOR_BOOLEAN: &str = "\x1b[33m";
const COLOR_COMMENT: &str = "\x1b[90m";
const COLOR_QUOTE: &str = "\x1b[1;33m";

#[derive(Completer, Helper, Hinter)]
pub struct ReplHelper;

impl ReplHelper {
    pub fn new() -> Self {
        ReplHelper
    }
}

impl Default for ReplHelper {
    fn default() -> Self {
        Self::new()
    }
}

impl Validator for ReplHelper {
    /// Unbalanced brackets or an open string continue on the next line
    /// instead of being submitted as a broken datum.
    fn validate(&self, ctx: &mut ValidationContext<'_>) -> rustyline::Result<ValidationResult> {
        Ok(if input_is_open(ctx.input()) {
            ValidationResult::Incomplete
        } else {
            ValidationResult::Valid(None)
        })
    }
}

fn input_is_open(input: &str) -> bool {
    let mut depth: i32 = 0;
    let mut chars = input.chars();
    while let Some(c) = chars.next() {
        match c {
            '(' | '[' => depth += 1,
            ')' | ']' => depth -= 1,
            ';' => {
                for c in chars.by_ref() {
                    if c == '\n' {
                        break;
                    }
                }
            }
            '"' => loop {
                match chars.next() {
                    Some('"') => break,
                    Some('\\') => {
                        chars.next();
                    }
                    Some(_) => {}
                    // Open string: wait for more input.
                    None => return true,
                }
            },
            _ => {}
        }
    }
    depth > 0
}

impl Highlighter for ReplHelper {
    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        let highlighted = highlight_line(line);
        if highlighted == line {
            Cow::Borrowed(line)
        } else {
            Cow::Owned(highlighted)
        }
    }

    fn highlight_char(&self, _line: &str, _pos: usize, _kind: CmdKind) -> bool {
        true
    }
}

fn highlight_line(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    let chars: Vec<char> = line.chars().collect();
    let mut i = 0;

    while i < chars.len() {
        match chars[i] {
            ';' => {
                out.push_str(COLOR_COMMENT);
                while i < chars.len() && chars[i] != '\n' {
                    out.push(chars[i]);
                    i += 1;
                }
                out.push_str(COLOR_RESET);
            }

            '"' => {
                out.push_str(COLOR_STRING);
                out.push('"');
                i += 1;
                while i < chars.len() {
                    if chars[i] == '\\' && i + 1 < chars.len() {
                        out.push(chars[i]);
                        out.push(chars[i + 1]);
                        i += 2;
                    } else if chars[i] == '"' {
                        out.push('"');
                        i += 1;
                        break;
                    } else {
                        out.push(chars[i]);
                        i += 1;
                    }
                }
                out.push_str(COLOR_RESET);
            }

            '(' | ')' | '[' | ']' => {
                out.push_str(COLOR_PAREN);
                out.push(chars[i]);
                out.push_str(COLOR_RESET);
                i += 1;
            }

            '\'' | '`' | ',' => {
                out.push_str(COLOR_QUOTE);
                out.push(chars[i]);
                i += 1;
                if i < chars.len() && chars[i] == '@' {
                    out.push('@');
                    i += 1;
                }
                out.push_str(COLOR_RESET);
            }

            '#' if i + 1 < chars.len() && (chars[i + 1] == 't' || chars[i + 1] == 'f') => {
                out.push_str(COLOR_BOOLEAN);
                out.push('#');
                out.push(chars[i + 1]);
                out.push_str(COLOR_RESET);
                i += 2;
            }

            c if c.is_ascii_digit() => {
                out.push_str(COLOR_NUMBER);
                while i < chars.len()
                    && (chars[i].is_ascii_digit() || chars[i] == '.' || chars[i] == 'e')
                {
                    out.push(chars[i]);
                    i += 1;
                }
                out.push_str(COLOR_RESET);
            }

            c => {
                out.push(c);
                i += 1;
            }
        }
    }

    out
}
