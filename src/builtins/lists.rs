//! List primitives: cons, car, cdr.

use crate::context::Context;
use crate::error::EvalError;
use crate::value::Value;
use crate::vm::{BuiltinImpl, State};
use std::rc::Rc;

struct ConsCells;

impl BuiltinImpl for ConsCells {
    fn run(&self, state: &mut State<'_>, args: Vec<Value>) -> Result<(), EvalError> {
        let [car, cdr]: [Value; 2] = args
            .try_into()
            .map_err(|_| EvalError::evaluation("Builtin function cons takes 2 arguments"))?;
        state.push(Value::cons(car, cdr));
        Ok(())
    }
}

struct Car;

impl BuiltinImpl for Car {
    fn run(&self, state: &mut State<'_>, args: Vec<Value>) -> Result<(), EvalError> {
        let [value]: [Value; 1] = args
            .try_into()
            .map_err(|_| EvalError::evaluation("Builtin function car takes one argument"))?;
        match value {
            Value::Cons(cell) => {
                state.push(cell.car.clone());
                Ok(())
            }
            other => Err(EvalError::type_error("Not a cons", &other)),
        }
    }
}

struct Cdr;

impl BuiltinImpl for Cdr {
    fn run(&self, state: &mut State<'_>, args: Vec<Value>) -> Result<(), EvalError> {
        let [value]: [Value; 1] = args
            .try_into()
            .map_err(|_| EvalError::evaluation("Builtin function cdr takes one argument"))?;
        match value {
            Value::Cons(cell) => {
                state.push(cell.cdr.clone());
                Ok(())
            }
            other => Err(EvalError::type_error("Not a cons", &other)),
        }
    }
}

pub fn register(context: &mut Context) {
    context.builtins.insert("cons".to_string(), Rc::new(ConsCells));
    context.builtins.insert("car".to_string(), Rc::new(Car));
    context.builtins.insert("cdr".to_string(), Rc::new(Cdr));
}
