//! # Built-in Functions
//!
//! The host-provided function library, organized into category modules.
//! Each category exposes a `register` function that inserts its builtins
//! into the context registry; Lisp code reaches them through the
//! `(builtin name)` form, and the bootstrap file wires them to their
//! conventional toplevel names.
//!
//! - **[lists]**: cons, car, cdr
//! - **[arithmetic]**: +, -, *, /, %
//! - **[comparison]**: =, <, >, <=, >=
//! - **[types]**: num?, sym?, str?, cons?, nil?, bool?, vec?, proc?, meta?
//! - **[strings]**: str, str-ref, length, concat, substr, sym->str, num->str, str->num
//! - **[vectors]**: vec, vec-make, vec-ref, vec-length, vec-set!, vec->list, list->vec
//! - **[control]**: apply, call/cc, never, error, exit
//! - **[meta]**: eval, macroexpand, macroexpand-1, gensym
//! - **[console]**: print, newline, inspect, args

use crate::context::Context;

pub mod arithmetic;
pub mod comparison;
pub mod console;
pub mod control;
pub mod lists;
pub mod meta;
pub mod strings;
pub mod types;
pub mod vectors;

/// Registers every builtin category. `script_args` is the argument tail the
/// driver collected after `--`, exposed to programs via `(builtin args)`.
pub fn register_builtins(context: &mut Context, script_args: &[String]) {
    lists::register(context);
    arithmetic::register(context);
    comparison::register(context);
    types::register(context);
    strings::register(context);
    vectors::register(context);
    control::register(context);
    meta::register(context);
    console::register(context, script_args);
}
