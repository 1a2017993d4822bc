// ABOUTME: Parameter-list patterns and call-time argument binding

use crate::env::Env;
use crate::error::EvalError;
use crate::value::Value;
use std::fmt;

/// The shape of a function's parameter list: zero or more fixed names,
/// optionally followed by a rest name that collects remaining arguments.
#[derive(Debug, Clone, Default)]
pub struct Pattern {
    fixed: Vec<String>,
    rest: Option<String>,
}

impl Pattern {
    /// Parses a pattern from its surface form: `()`, a bare rest symbol, or
    /// a cons chain of symbols possibly dotted with a rest symbol.
    pub fn build(value: &Value) -> Result<Pattern, EvalError> {
        let mut fixed = Vec::new();
        let mut value = value.clone();
        loop {
            match value {
                Value::Sym(name) => {
                    return Ok(Pattern {
                        fixed,
                        rest: Some(name.to_string()),
                    })
                }
                Value::Nil => return Ok(Pattern { fixed, rest: None }),
                Value::Cons(cell) => match &cell.car {
                    Value::Sym(name) => {
                        fixed.push(name.to_string());
                        value = cell.cdr.clone();
                    }
                    other => {
                        return Err(EvalError::evaluation(format!(
                            "Unsupported pattern: {}",
                            other
                        )))
                    }
                },
                other => {
                    return Err(EvalError::evaluation(format!(
                        "Unsupported pattern: {}",
                        other
                    )))
                }
            }
        }
    }

    /// Binds arguments into `env`: fixed parameters in order, then the rest
    /// name (if any) to the remaining arguments as a proper list.
    pub fn bind(&self, mut args: Vec<Value>, env: &Env) -> Result<(), EvalError> {
        let too_many = self.rest.is_none() && args.len() > self.fixed.len();
        if args.len() < self.fixed.len() || too_many {
            let prefix = if self.rest.is_some() { "at least " } else { "" };
            return Err(EvalError::evaluation(format!(
                "This function takes {}{} arguments",
                prefix,
                self.fixed.len()
            )));
        }

        let rest_args = args.split_off(self.fixed.len());
        for (param, arg) in self.fixed.iter().zip(args) {
            env.def(param, arg);
        }
        if let Some(rest) = &self.rest {
            env.def(rest, Value::list(rest_args));
        }
        Ok(())
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut surface = match &self.rest {
            Some(name) => Value::sym(name),
            None => Value::Nil,
        };
        for name in self.fixed.iter().rev() {
            surface = Value::cons(Value::sym(name), surface);
        }
        write!(f, "{}", surface)
    }
}
