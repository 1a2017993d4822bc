//! Vector primitives over shared mutable vectors.

use crate::context::Context;
use crate::error::EvalError;
use crate::value::Value;
use crate::vm::{BuiltinImpl, State};
use std::cell::RefCell;
use std::rc::Rc;

fn extract_vec(name: &str, value: &Value) -> Result<Rc<RefCell<Vec<Value>>>, EvalError> {
    match value {
        Value::Vec(items) => Ok(Rc::clone(items)),
        other => Err(EvalError::type_error(
            &format!("Builtin function {} takes a vec argument", name),
            other,
        )),
    }
}

fn extract_index(name: &str, value: &Value) -> Result<usize, EvalError> {
    match value {
        Value::Num(n) if *n >= 0.0 && n.fract() == 0.0 => Ok(*n as usize),
        other => Err(EvalError::type_error(
            &format!("Builtin function {} takes index arguments", name),
            other,
        )),
    }
}

/// `(vec e...)` builds a fresh vector.
struct VecNew;

impl BuiltinImpl for VecNew {
    fn run(&self, state: &mut State<'_>, args: Vec<Value>) -> Result<(), EvalError> {
        state.push(Value::Vec(Rc::new(RefCell::new(args))));
        Ok(())
    }
}

/// `(vec-make n fill)` builds a vector of `n` copies of `fill`.
struct VecMake;

impl BuiltinImpl for VecMake {
    fn run(&self, state: &mut State<'_>, args: Vec<Value>) -> Result<(), EvalError> {
        let [len, fill]: [Value; 2] = args.try_into().map_err(|_| {
            EvalError::evaluation("Builtin function vec-make takes 2 arguments")
        })?;
        let len = extract_index("vec-make", &len)?;
        state.push(Value::Vec(Rc::new(RefCell::new(vec![fill; len]))));
        Ok(())
    }
}

struct VecRef;

impl BuiltinImpl for VecRef {
    fn run(&self, state: &mut State<'_>, args: Vec<Value>) -> Result<(), EvalError> {
        let [vec, index]: [Value; 2] = args.try_into().map_err(|_| {
            EvalError::evaluation("Builtin function vec-ref takes 2 arguments")
        })?;
        let items = extract_vec("vec-ref", &vec)?;
        let index = extract_index("vec-ref", &index)?;
        let value = items
            .borrow()
            .get(index)
            .cloned()
            .ok_or_else(|| EvalError::evaluation(format!("Index out of range: {}", index)))?;
        state.push(value);
        Ok(())
    }
}

struct VecLength;

impl BuiltinImpl for VecLength {
    fn run(&self, state: &mut State<'_>, args: Vec<Value>) -> Result<(), EvalError> {
        let [vec]: [Value; 1] = args.try_into().map_err(|_| {
            EvalError::evaluation("Builtin function vec-length takes one argument")
        })?;
        let items = extract_vec("vec-length", &vec)?;
        let len = items.borrow().len();
        state.push(Value::Num(len as f64));
        Ok(())
    }
}

struct VecSet;

impl BuiltinImpl for VecSet {
    fn run(&self, state: &mut State<'_>, args: Vec<Value>) -> Result<(), EvalError> {
        let [vec, index, value]: [Value; 3] = args.try_into().map_err(|_| {
            EvalError::evaluation("Builtin function vec-set! takes 3 arguments")
        })?;
        let items = extract_vec("vec-set!", &vec)?;
        let index = extract_index("vec-set!", &index)?;
        let mut items = items.borrow_mut();
        match items.get_mut(index) {
            Some(slot) => {
                *slot = value;
                state.push(Value::Nil);
                Ok(())
            }
            None => Err(EvalError::evaluation(format!("Index out of range: {}", index))),
        }
    }
}

struct VecToList;

impl BuiltinImpl for VecToList {
    fn run(&self, state: &mut State<'_>, args: Vec<Value>) -> Result<(), EvalError> {
        let [vec]: [Value; 1] = args.try_into().map_err(|_| {
            EvalError::evaluation("Builtin function vec->list takes one argument")
        })?;
        let items = extract_vec("vec->list", &vec)?;
        let list = Value::list(items.borrow().clone());
        state.push(list);
        Ok(())
    }
}

struct ListToVec;

impl BuiltinImpl for ListToVec {
    fn run(&self, state: &mut State<'_>, args: Vec<Value>) -> Result<(), EvalError> {
        let [list]: [Value; 1] = args.try_into().map_err(|_| {
            EvalError::evaluation("Builtin function list->vec takes one argument")
        })?;
        let items = list
            .to_vec()
            .ok_or_else(|| EvalError::type_error("Not a proper list", &list))?;
        state.push(Value::Vec(Rc::new(RefCell::new(items))));
        Ok(())
    }
}

pub fn register(context: &mut Context) {
    context.builtins.insert("vec".to_string(), Rc::new(VecNew));
    context.builtins.insert("vec-make".to_string(), Rc::new(VecMake));
    context.builtins.insert("vec-ref".to_string(), Rc::new(VecRef));
    context.builtins.insert("vec-length".to_string(), Rc::new(VecLength));
    context.builtins.insert("vec-set!".to_string(), Rc::new(VecSet));
    context.builtins.insert("vec->list".to_string(), Rc::new(VecToList));
    context.builtins.insert("list->vec".to_string(), Rc::new(ListToVec));
}
