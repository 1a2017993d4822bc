//! Console output, value inspection and script arguments.

use crate::context::Context;
use crate::error::EvalError;
use crate::value::Value;
use crate::vm::{BuiltinImpl, State};
use std::io::Write;
use std::rc::Rc;

struct Print;

impl BuiltinImpl for Print {
    fn run(&self, state: &mut State<'_>, args: Vec<Value>) -> Result<(), EvalError> {
        let mut stdout = std::io::stdout();
        for arg in &args {
            match arg {
                Value::Str(bytes) => {
                    let _ = stdout.write_all(bytes);
                }
                other => return Err(EvalError::type_error("Cannot print non-string argument", other)),
            }
        }
        let _ = stdout.flush();
        state.push(Value::Nil);
        Ok(())
    }
}

struct Newline;

impl BuiltinImpl for Newline {
    fn run(&self, state: &mut State<'_>, args: Vec<Value>) -> Result<(), EvalError> {
        if !args.is_empty() {
            return Err(EvalError::evaluation(
                "Builtin function newline takes no arguments",
            ));
        }
        println!();
        state.push(Value::Nil);
        Ok(())
    }
}

/// `(inspect v)` is the textual dump of any value, as a string.
struct Inspect;

impl BuiltinImpl for Inspect {
    fn run(&self, state: &mut State<'_>, args: Vec<Value>) -> Result<(), EvalError> {
        let [value]: [Value; 1] = args
            .try_into()
            .map_err(|_| EvalError::evaluation("Builtin function inspect takes one argument"))?;
        state.push(Value::string(&value.to_string()));
        Ok(())
    }
}

/// The argument tail the driver collected after `--`, as a list of strings.
struct Args {
    script_args: Vec<String>,
}

impl BuiltinImpl for Args {
    fn run(&self, state: &mut State<'_>, args: Vec<Value>) -> Result<(), EvalError> {
        if !args.is_empty() {
            return Err(EvalError::evaluation(
                "Builtin function args takes no arguments",
            ));
        }
        let list = Value::list(self.script_args.iter().map(|s| Value::string(s)).collect());
        state.push(list);
        Ok(())
    }
}

pub fn register(context: &mut Context, script_args: &[String]) {
    context.builtins.insert("print".to_string(), Rc::new(Print));
    context.builtins.insert("newline".to_string(), Rc::new(Newline));
    context.builtins.insert("inspect".to_string(), Rc::new(Inspect));
    context.builtins.insert(
        "args".to_string(),
        Rc::new(Args {
            script_args: script_args.to_vec(),
        }),
    );
}

#[cfg(test)]
mod tests {
    use crate::builtins::register_builtins;
    use crate::context::Context;
    use crate::parser::parse;

    fn context_with_args(script_args: &[String]) -> Context {
        let mut context = Context::new();
        register_builtins(&mut context, script_args);
        context
    }

    fn eval(context: &Context, source: &str) -> Result<String, String> {
        context
            .eval(parse(source).unwrap())
            .map(|v| v.to_string())
            .map_err(|e| e.to_string())
    }

    #[test]
    fn test_inspect_round_trips_the_printer() {
        let context = context_with_args(&[]);
        assert_eq!(eval(&context, "((builtin inspect) '(1 2 . 3))").unwrap(), "\"(1 2 . 3)\"");
        assert_eq!(eval(&context, "((builtin inspect) \"s\")").unwrap(), "\"\\\"s\\\"\"");
        assert_eq!(eval(&context, "((builtin inspect) (fun () 1))").unwrap(), "\"<fun>\"");
    }

    #[test]
    fn test_print_rejects_non_strings() {
        let context = context_with_args(&[]);
        assert_eq!(
            eval(&context, "((builtin print) 42)").unwrap_err(),
            "Evaluation error: Cannot print non-string argument: 42"
        );
    }

    #[test]
    fn test_args_reflect_driver_tail() {
        let context = context_with_args(&["a".to_string(), "b c".to_string()]);
        assert_eq!(eval(&context, "((builtin args))").unwrap(), "(\"a\" \"b c\")");

        let context = context_with_args(&[]);
        assert_eq!(eval(&context, "((builtin args))").unwrap(), "()");
    }
}
