//! Reflection into the evaluator: eval, macroexpand, gensym.
//!
//! The evaluating builtins model failure as data: they push a
//! `(success-flag . payload)` pair instead of raising, so programs can
//! probe expressions without unwinding.

use crate::context::Context;
use crate::error::EvalError;
use crate::value::Value;
use crate::vm::{BuiltinImpl, State};
use std::cell::Cell;
use std::rc::Rc;

struct Eval;

impl BuiltinImpl for Eval {
    fn run(&self, state: &mut State<'_>, args: Vec<Value>) -> Result<(), EvalError> {
        let [expr]: [Value; 1] = args
            .try_into()
            .map_err(|_| EvalError::evaluation("Builtin function eval takes one argument"))?;
        let result = match state.context.eval(expr) {
            Ok(value) => Value::cons(Value::Bool(true), value),
            Err(err) => Value::cons(Value::Bool(false), Value::string(&err.to_string())),
        };
        state.push(result);
        Ok(())
    }
}

struct MacroExpand {
    name: &'static str,
    recurse: bool,
}

impl BuiltinImpl for MacroExpand {
    fn run(&self, state: &mut State<'_>, args: Vec<Value>) -> Result<(), EvalError> {
        let [expr]: [Value; 1] = args.try_into().map_err(|_| {
            EvalError::evaluation(format!("Builtin function {} takes one argument", self.name))
        })?;
        let result = match state.context.macro_expand(self.recurse, expr) {
            Ok(value) => Value::cons(Value::Bool(true), value),
            Err(err) => Value::cons(Value::Bool(false), Value::string(&err.to_string())),
        };
        state.push(result);
        Ok(())
    }
}

/// Fresh symbols for macro writers; the counter lives with the registry
/// entry, so every context counts independently.
struct Gensym {
    counter: Cell<u64>,
}

impl BuiltinImpl for Gensym {
    fn run(&self, state: &mut State<'_>, args: Vec<Value>) -> Result<(), EvalError> {
        if !args.is_empty() {
            return Err(EvalError::evaluation(
                "Builtin function gensym takes no arguments",
            ));
        }
        let id = self.counter.get() + 1;
        self.counter.set(id);
        state.push(Value::sym(&format!("#sym.{}", id)));
        Ok(())
    }
}

pub fn register(context: &mut Context) {
    context.builtins.insert("eval".to_string(), Rc::new(Eval));
    context.builtins.insert(
        "macroexpand".to_string(),
        Rc::new(MacroExpand {
            name: "macroexpand",
            recurse: true,
        }),
    );
    context.builtins.insert(
        "macroexpand-1".to_string(),
        Rc::new(MacroExpand {
            name: "macroexpand-1",
            recurse: false,
        }),
    );
    context.builtins.insert(
        "gensym".to_string(),
        Rc::new(Gensym {
            counter: Cell::new(0),
        }),
    );
}
