//! Arithmetic operators folding left over numbers.
//!
//! - `+`: sum, `(+)` is 0
//! - `-`: difference, unary negates
//! - `*`: product, `(*)` is 1
//! - `/`: quotient, unary reciprocates
//! - `%`: remainder

use crate::context::Context;
use crate::error::EvalError;
use crate::value::Value;
use crate::vm::{BuiltinImpl, State};
use std::rc::Rc;

struct Arithmetic {
    name: &'static str,
    /// Result of the zero-argument call, where one exists.
    zero: Option<f64>,
    one: fn(f64) -> f64,
    fold: fn(f64, f64) -> f64,
}

impl BuiltinImpl for Arithmetic {
    fn run(&self, state: &mut State<'_>, args: Vec<Value>) -> Result<(), EvalError> {
        let nums = extract_numbers(self.name, &args)?;
        let result = match nums.split_first() {
            None => self.zero.ok_or_else(|| {
                EvalError::evaluation(format!(
                    "Operator {} takes at least one argument",
                    self.name
                ))
            })?,
            Some((&first, [])) => (self.one)(first),
            Some((&first, rest)) => rest.iter().fold(first, |l, &r| (self.fold)(l, r)),
        };
        state.push(Value::Num(result));
        Ok(())
    }
}

pub(crate) fn extract_numbers(op: &str, args: &[Value]) -> Result<Vec<f64>, EvalError> {
    args.iter()
        .map(|arg| match arg {
            Value::Num(n) => Ok(*n),
            other => Err(EvalError::type_error(
                &format!("Operator {} takes number arguments", op),
                other,
            )),
        })
        .collect()
}

pub fn register(context: &mut Context) {
    context.builtins.insert(
        "+".to_string(),
        Rc::new(Arithmetic {
            name: "+",
            zero: Some(0.0),
            one: |n| n,
            fold: |l, r| l + r,
        }),
    );
    context.builtins.insert(
        "-".to_string(),
        Rc::new(Arithmetic {
            name: "-",
            zero: None,
            one: |n| -n,
            fold: |l, r| l - r,
        }),
    );
    context.builtins.insert(
        "*".to_string(),
        Rc::new(Arithmetic {
            name: "*",
            zero: Some(1.0),
            one: |n| n,
            fold: |l, r| l * r,
        }),
    );
    context.builtins.insert(
        "/".to_string(),
        Rc::new(Arithmetic {
            name: "/",
            zero: None,
            one: |n| 1.0 / n,
            fold: |l, r| l / r,
        }),
    );
    context.builtins.insert(
        "%".to_string(),
        Rc::new(Arithmetic {
            name: "%",
            zero: None,
            one: |n| n,
            fold: |l, r| l % r,
        }),
    );
}

#[cfg(test)]
mod tests {
    use crate::builtins::register_builtins;
    use crate::context::Context;
    use crate::parser::parse;

    fn eval(source: &str) -> Result<String, String> {
        let mut context = Context::new();
        register_builtins(&mut context, &[]);
        context
            .eval(parse(&format!("(begin (def + (builtin +)) (def - (builtin -)) (def * (builtin *)) (def / (builtin /)) (def % (builtin %)) {})", source)).unwrap())
            .map(|v| v.to_string())
            .map_err(|e| e.to_string())
    }

    #[test]
    fn test_addition_and_identity() {
        assert_eq!(eval("(+ 1 2 3)").unwrap(), "6");
        assert_eq!(eval("(+ 10)").unwrap(), "10");
        assert_eq!(eval("(+)").unwrap(), "0");
    }

    #[test]
    fn test_subtraction_and_negation() {
        assert_eq!(eval("(- 10 3 2)").unwrap(), "5");
        assert_eq!(eval("(- 5)").unwrap(), "-5");
        assert_eq!(
            eval("(-)").unwrap_err(),
            "Evaluation error: Operator - takes at least one argument"
        );
    }

    #[test]
    fn test_multiplication_division_modulo() {
        assert_eq!(eval("(* 2 3 4)").unwrap(), "24");
        assert_eq!(eval("(*)").unwrap(), "1");
        assert_eq!(eval("(/ 20 4)").unwrap(), "5");
        assert_eq!(eval("(/ 2)").unwrap(), "0.5");
        assert_eq!(eval("(% 17 5)").unwrap(), "2");
    }

    #[test]
    fn test_division_by_zero_is_infinite() {
        assert_eq!(eval("(/ 1 0)").unwrap(), "+Inf");
    }

    #[test]
    fn test_non_number_argument_fails() {
        assert_eq!(
            eval("(+ 1 'x)").unwrap_err(),
            "Evaluation error: Operator + takes number arguments: x"
        );
    }
}
