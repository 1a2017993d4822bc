// ABOUTME: Driver constants: version, REPL prompt and history location

pub const VERSION: &str = "1.0.0";
pub const WELCOME_MESSAGE: &str = "[lisp-vm REPL]";
pub const PROMPT: &str = "> ";
pub const HISTORY_FILE: &str = ".lisp_history";
