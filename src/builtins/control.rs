//! Control operators: apply, call/cc, never, error, exit.

use crate::context::Context;
use crate::error::EvalError;
use crate::value::Value;
use crate::vm::{BuiltinImpl, State};
use std::rc::Rc;

struct Apply;

impl BuiltinImpl for Apply {
    fn run(&self, state: &mut State<'_>, args: Vec<Value>) -> Result<(), EvalError> {
        let [f, arg_list]: [Value; 2] = args
            .try_into()
            .map_err(|_| EvalError::evaluation("Builtin function apply takes 2 arguments"))?;
        let call_args = arg_list.to_vec().ok_or_else(|| {
            EvalError::type_error("Improper list passed as apply arguments", &arg_list)
        })?;
        state.apply(f, call_args)
    }
}

/// Captures the current continuation and passes it, as a callable value, to
/// the argument procedure.
struct CallCC;

impl BuiltinImpl for CallCC {
    fn run(&self, state: &mut State<'_>, args: Vec<Value>) -> Result<(), EvalError> {
        let [f]: [Value; 1] = args
            .try_into()
            .map_err(|_| EvalError::evaluation("Builtin function call/cc takes one argument"))?;
        let cont = state.capture_cont();
        state.apply(f, vec![cont])
    }
}

/// Applies a procedure without saving a return frame; the call never
/// returns here.
struct Never;

impl BuiltinImpl for Never {
    fn run(&self, state: &mut State<'_>, mut args: Vec<Value>) -> Result<(), EvalError> {
        if args.is_empty() {
            return Err(EvalError::evaluation(
                "Builtin function never takes at least one argument",
            ));
        }
        let f = args.remove(0);
        state.apply_never(f, args)
    }
}

struct Raise;

impl BuiltinImpl for Raise {
    fn run(&self, _state: &mut State<'_>, args: Vec<Value>) -> Result<(), EvalError> {
        match args.as_slice() {
            [] => Err(EvalError::evaluation("error called")),
            [Value::Str(bytes)] => Err(EvalError::evaluation(
                String::from_utf8_lossy(bytes).into_owned(),
            )),
            _ => Err(EvalError::evaluation(
                "Builtin function error takes a string argument",
            )),
        }
    }
}

struct Exit;

impl BuiltinImpl for Exit {
    fn run(&self, _state: &mut State<'_>, args: Vec<Value>) -> Result<(), EvalError> {
        match args.as_slice() {
            [] => std::process::exit(0),
            [Value::Num(status)] => std::process::exit(*status as i32),
            _ => Err(EvalError::evaluation(
                "Builtin function exit takes a number argument",
            )),
        }
    }
}

pub fn register(context: &mut Context) {
    context.builtins.insert("apply".to_string(), Rc::new(Apply));
    context.builtins.insert("call/cc".to_string(), Rc::new(CallCC));
    context.builtins.insert("never".to_string(), Rc::new(Never));
    context.builtins.insert("error".to_string(), Rc::new(Raise));
    context.builtins.insert("exit".to_string(), Rc::new(Exit));
}
