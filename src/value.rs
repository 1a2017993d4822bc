// ABOUTME: Value types representing Lisp data and runtime objects

use crate::env::Env;
use crate::inst::Code;
use crate::pattern::Pattern;
use crate::syntax::SyntaxImpl;
use crate::vm::BuiltinImpl;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// A pair of two values; chains of these terminated by `Nil` form lists.
#[derive(Debug, Clone)]
pub struct Cons {
    pub car: Value,
    pub cdr: Value,
}

/// A user function or macro body: compiled code bundled with the environment
/// in force where the `fun`/`macro` form was evaluated.
#[derive(Clone)]
pub struct Closure {
    pub env: Rc<Env>,
    pub pattern: Pattern,
    pub code: Code,
}

#[derive(Clone)]
pub enum Value {
    Num(f64),
    Sym(Rc<str>),
    /// Opaque byte sequence; not required to be UTF-8.
    Str(Rc<[u8]>),
    Cons(Rc<Cons>),
    Nil,
    Bool(bool),
    /// Shared mutable vector. Two vectors are distinct identities even when
    /// structurally equal.
    Vec(Rc<RefCell<Vec<Value>>>),
    Fun(Rc<Closure>),
    Builtin(Rc<dyn BuiltinImpl>),
    Macro(Rc<Closure>),
    Syntax(Rc<dyn SyntaxImpl>),
}

impl Value {
    pub fn sym(name: &str) -> Value {
        Value::Sym(Rc::from(name))
    }

    pub fn string(text: &str) -> Value {
        Value::Str(Rc::from(text.as_bytes()))
    }

    pub fn cons(car: Value, cdr: Value) -> Value {
        Value::Cons(Rc::new(Cons { car, cdr }))
    }

    /// Builds a proper list from the given values.
    pub fn list(items: Vec<Value>) -> Value {
        Self::list_with_tail(items, Value::Nil)
    }

    /// Builds a cons chain ending in `tail` instead of `Nil`.
    pub fn list_with_tail(items: Vec<Value>, tail: Value) -> Value {
        items
            .into_iter()
            .rev()
            .fold(tail, |acc, item| Value::cons(item, acc))
    }

    pub fn quote(value: Value) -> Value {
        Value::list(vec![Value::sym("quote"), value])
    }

    pub fn quasiquote(value: Value) -> Value {
        Value::list(vec![Value::sym("quasiquote"), value])
    }

    pub fn unquote(value: Value) -> Value {
        Value::list(vec![Value::sym("unquote"), value])
    }

    pub fn unquote_splicing(value: Value) -> Value {
        Value::list(vec![Value::sym("unquote-splicing"), value])
    }

    /// Collects a proper list into a vector; `None` for anything that is not
    /// a `Nil`-terminated cons chain.
    pub fn to_vec(&self) -> Option<Vec<Value>> {
        let mut items = std::vec::Vec::new();
        let mut value = self.clone();
        loop {
            match value {
                Value::Nil => return Some(items),
                Value::Cons(cell) => {
                    items.push(cell.car.clone());
                    value = cell.cdr.clone();
                }
                _ => return None,
            }
        }
    }

    /// Every value is true except `#f`.
    pub fn is_truthy(&self) -> bool {
        !matches!(self, Value::Bool(false))
    }

    pub fn is_proc(&self) -> bool {
        matches!(self, Value::Fun(_) | Value::Builtin(_))
    }

    pub fn is_meta(&self) -> bool {
        matches!(self, Value::Macro(_) | Value::Syntax(_))
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Num(n) => f.write_str(&format_float(*n)),
            Value::Sym(name) => f.write_str(name),
            Value::Str(bytes) => f.write_str(&quote_bytes(bytes)),
            Value::Cons(cell) => match sugared(cell) {
                Some((prefix, value)) => write!(f, "{}{}", prefix, value),
                None => {
                    write!(f, "(")?;
                    let mut cell = Rc::clone(cell);
                    loop {
                        write!(f, "{}", cell.car)?;
                        let next = match &cell.cdr {
                            Value::Nil => break,
                            Value::Cons(next) => Rc::clone(next),
                            other => {
                                write!(f, " . {}", other)?;
                                break;
                            }
                        };
                        write!(f, " ")?;
                        cell = next;
                    }
                    write!(f, ")")
                }
            },
            Value::Nil => f.write_str("()"),
            Value::Bool(true) => f.write_str("#t"),
            Value::Bool(false) => f.write_str("#f"),
            Value::Vec(items) => {
                write!(f, "(vec")?;
                for item in items.borrow().iter() {
                    write!(f, " {}", item)?;
                }
                write!(f, ")")
            }
            Value::Fun(_) => f.write_str("<fun>"),
            Value::Builtin(_) => f.write_str("<builtin>"),
            Value::Macro(_) => f.write_str("<macro>"),
            Value::Syntax(_) => f.write_str("<syntax>"),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

/// Two-element lists headed by a reader-macro symbol print with their sugar.
fn sugared(cell: &Cons) -> Option<(&'static str, Value)> {
    let name = match &cell.car {
        Value::Sym(name) => name.as_ref(),
        _ => return None,
    };
    let prefix = match name {
        "quote" => "'",
        "quasiquote" => "`",
        "unquote" => ",",
        "unquote-splicing" => ",@",
        _ => return None,
    };
    match &cell.cdr {
        Value::Cons(rest) if matches!(rest.cdr, Value::Nil) => Some((prefix, rest.car.clone())),
        _ => None,
    }
}

/// Shortest round-trip float formatting, switching to scientific notation
/// when the decimal exponent is below -4 or at least 21.
fn format_float(x: f64) -> String {
    if x.is_nan() {
        return "NaN".to_string();
    }
    if x.is_infinite() {
        return if x > 0.0 { "+Inf" } else { "-Inf" }.to_string();
    }
    let scientific = format!("{:e}", x);
    let (mantissa, exp) = match scientific.split_once('e') {
        Some(parts) => parts,
        None => return scientific,
    };
    match exp.parse::<i32>() {
        Ok(exp) if !(-4..21).contains(&exp) => {
            let sign = if exp < 0 { '-' } else { '+' };
            format!("{}e{}{:02}", mantissa, sign, exp.abs())
        }
        _ => format!("{}", x),
    }
}

fn quote_bytes(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() + 2);
    out.push('"');
    match std::str::from_utf8(bytes) {
        Ok(text) => {
            for c in text.chars() {
                escape_char(c, &mut out);
            }
        }
        Err(_) => {
            for &b in bytes {
                if b.is_ascii() && !b.is_ascii_control() {
                    escape_char(b as char, &mut out);
                } else {
                    out.push_str(&format!("\\x{:02x}", b));
                }
            }
        }
    }
    out.push('"');
    out
}

fn escape_char(c: char, out: &mut String) {
    match c {
        '"' => out.push_str("\\\""),
        '\\' => out.push_str("\\\\"),
        '\n' => out.push_str("\\n"),
        '\t' => out.push_str("\\t"),
        '\r' => out.push_str("\\r"),
        c if (c as u32) < 0x20 => out.push_str(&format!("\\x{:02x}", c as u32)),
        c => out.push(c),
    }
}
