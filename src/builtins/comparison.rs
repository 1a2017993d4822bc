//! Equality and ordering operators.
//!
//! `=` compares structurally over numbers, symbols, strings, cons chains,
//! nil and booleans; vectors, procedures and meta values compare by
//! identity. The ordering operators chain over all-number or all-string
//! arguments.

use crate::context::Context;
use crate::error::EvalError;
use crate::value::Value;
use crate::vm::{BuiltinImpl, State};
use std::cmp::Ordering;
use std::rc::Rc;

struct Eq;

impl BuiltinImpl for Eq {
    fn run(&self, state: &mut State<'_>, args: Vec<Value>) -> Result<(), EvalError> {
        if let Some((first, rest)) = args.split_first() {
            for arg in rest {
                if !values_equal(first, arg) {
                    state.push(Value::Bool(false));
                    return Ok(());
                }
            }
        }
        state.push(Value::Bool(true));
        Ok(())
    }
}

pub(crate) fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        // Bit-value float equality, so NaN is not equal to itself.
        (Value::Num(x), Value::Num(y)) => x == y,
        (Value::Sym(x), Value::Sym(y)) => x == y,
        (Value::Str(x), Value::Str(y)) => x == y,
        (Value::Cons(x), Value::Cons(y)) => {
            values_equal(&x.car, &y.car) && values_equal(&x.cdr, &y.cdr)
        }
        (Value::Nil, Value::Nil) => true,
        (Value::Bool(x), Value::Bool(y)) => x == y,
        (Value::Vec(x), Value::Vec(y)) => Rc::ptr_eq(x, y),
        (Value::Fun(x), Value::Fun(y)) => Rc::ptr_eq(x, y),
        (Value::Builtin(x), Value::Builtin(y)) => Rc::ptr_eq(x, y),
        (Value::Macro(x), Value::Macro(y)) => Rc::ptr_eq(x, y),
        (Value::Syntax(x), Value::Syntax(y)) => Rc::ptr_eq(x, y),
        _ => false,
    }
}

struct Compare {
    name: &'static str,
    test: fn(Ordering) -> bool,
}

impl BuiltinImpl for Compare {
    fn run(&self, state: &mut State<'_>, args: Vec<Value>) -> Result<(), EvalError> {
        if let Some((first, rest)) = args.split_first() {
            match first {
                Value::Num(first) => {
                    let mut l = *first;
                    for r in crate::builtins::arithmetic::extract_numbers(self.name, rest)? {
                        // NaN falls through both < and >, like the Equal case.
                        if !(self.test)(l.partial_cmp(&r).unwrap_or(Ordering::Equal)) {
                            state.push(Value::Bool(false));
                            return Ok(());
                        }
                        l = r;
                    }
                }
                Value::Str(first) => {
                    let mut l = Rc::clone(first);
                    for r in crate::builtins::strings::extract_strings(self.name, rest)? {
                        if !(self.test)(l.as_ref().cmp(r.as_ref())) {
                            state.push(Value::Bool(false));
                            return Ok(());
                        }
                        l = r;
                    }
                }
                other => {
                    return Err(EvalError::type_error(
                        &format!(
                            "Operator {} is only defined for strings and numbers",
                            self.name
                        ),
                        other,
                    ))
                }
            }
        }
        state.push(Value::Bool(true));
        Ok(())
    }
}

pub fn register(context: &mut Context) {
    context.builtins.insert("=".to_string(), Rc::new(Eq));
    context.builtins.insert(
        "<".to_string(),
        Rc::new(Compare {
            name: "<",
            test: |o| o == Ordering::Less,
        }),
    );
    context.builtins.insert(
        ">".to_string(),
        Rc::new(Compare {
            name: ">",
            test: |o| o == Ordering::Greater,
        }),
    );
    context.builtins.insert(
        "<=".to_string(),
        Rc::new(Compare {
            name: "<=",
            test: |o| o != Ordering::Greater,
        }),
    );
    context.builtins.insert(
        ">=".to_string(),
        Rc::new(Compare {
            name: ">=",
            test: |o| o != Ordering::Less,
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
            .eval(parse(&format!("(begin (def = (builtin =)) (def < (builtin <)) (def <= (builtin <=)) (def > (builtin >)) (def / (builtin /)) {})", source)).unwrap())
            .map(|v| v.to_string())
            .map_err(|e| e.to_string())
    }

    #[test]
    fn test_structural_equality() {
        assert_eq!(eval("(= 1 1 1)").unwrap(), "#t");
        assert_eq!(eval("(= 1 2)").unwrap(), "#f");
        assert_eq!(eval("(= 'a 'a)").unwrap(), "#t");
        assert_eq!(eval("(= \"x\" \"x\")").unwrap(), "#t");
        assert_eq!(eval("(= '(1 (2 . 3)) '(1 (2 . 3)))").unwrap(), "#t");
        assert_eq!(eval("(= '(1 2) '(1 3))").unwrap(), "#f");
        assert_eq!(eval("(= '() '())").unwrap(), "#t");
        assert_eq!(eval("(= 1 'a)").unwrap(), "#f");
        assert_eq!(eval("(=)").unwrap(), "#t");
        assert_eq!(eval("(= 5)").unwrap(), "#t");
    }

    #[test]
    fn test_nan_is_not_equal_to_itself() {
        assert_eq!(eval("(= (/ 0 0) (/ 0 0))").unwrap(), "#f");
    }

    #[test]
    fn test_number_ordering_chains() {
        assert_eq!(eval("(< 1 2 3)").unwrap(), "#t");
        assert_eq!(eval("(< 1 2 2)").unwrap(), "#f");
        assert_eq!(eval("(<= 1 2 2)").unwrap(), "#t");
        assert_eq!(eval("(> 3 2 1)").unwrap(), "#t");
        assert_eq!(eval("(< 5)").unwrap(), "#t");
        assert_eq!(eval("(<)").unwrap(), "#t");
    }

    #[test]
    fn test_string_ordering() {
        assert_eq!(eval("(< \"a\" \"b\")").unwrap(), "#t");
        assert_eq!(eval("(< \"b\" \"a\")").unwrap(), "#f");
        assert_eq!(eval("(<= \"ab\" \"ab\" \"b\")").unwrap(), "#t");
    }

    #[test]
    fn test_ordering_rejects_other_types() {
        assert_eq!(
            eval("(< 'a 'b)").unwrap_err(),
            "Evaluation error: Operator < is only defined for strings and numbers: a"
        );
    }
}
