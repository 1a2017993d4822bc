//! Type predicates over the value variants.

use crate::context::Context;
use crate::error::EvalError;
use crate::value::Value;
use crate::vm::{BuiltinImpl, State};
use std::rc::Rc;

struct TypeTest {
    name: &'static str,
    test: fn(&Value) -> bool,
}

impl BuiltinImpl for TypeTest {
    fn run(&self, state: &mut State<'_>, args: Vec<Value>) -> Result<(), EvalError> {
        let [value]: [Value; 1] = args.try_into().map_err(|_| {
            EvalError::evaluation(format!("Builtin function {} takes one argument", self.name))
        })?;
        state.push(Value::Bool((self.test)(&value)));
        Ok(())
    }
}

pub fn register(context: &mut Context) {
    let tests: [(&'static str, fn(&Value) -> bool); 9] = [
        ("num?", |v| matches!(v, Value::Num(_))),
        ("sym?", |v| matches!(v, Value::Sym(_))),
        ("str?", |v| matches!(v, Value::Str(_))),
        ("cons?", |v| matches!(v, Value::Cons(_))),
        ("nil?", |v| matches!(v, Value::Nil)),
        ("bool?", |v| matches!(v, Value::Bool(_))),
        ("vec?", |v| matches!(v, Value::Vec(_))),
        ("proc?", Value::is_proc),
        ("meta?", Value::is_meta),
    ];
    for (name, test) in tests {
        context
            .builtins
            .insert(name.to_string(), Rc::new(TypeTest { name, test }));
    }
}

#[cfg(test)]
mod tests {
    use crate::builtins::register_builtins;
    use crate::context::Context;
    use crate::parser::parse;

    fn eval(source: &str) -> String {
        let mut context = Context::new();
        register_builtins(&mut context, &[]);
        context.eval(parse(source).unwrap()).unwrap().to_string()
    }

    #[test]
    fn test_data_predicates() {
        assert_eq!(eval("((builtin num?) 1)"), "#t");
        assert_eq!(eval("((builtin num?) 'a)"), "#f");
        assert_eq!(eval("((builtin sym?) 'a)"), "#t");
        assert_eq!(eval("((builtin str?) \"s\")"), "#t");
        assert_eq!(eval("((builtin cons?) '(1))"), "#t");
        assert_eq!(eval("((builtin cons?) '())"), "#f");
        assert_eq!(eval("((builtin nil?) '())"), "#t");
        assert_eq!(eval("((builtin bool?) #f)"), "#t");
        assert_eq!(eval("((builtin vec?) ((builtin vec) 1))"), "#t");
    }

    #[test]
    fn test_proc_and_meta_predicates() {
        assert_eq!(eval("((builtin proc?) (fun (x) x))"), "#t");
        assert_eq!(eval("((builtin proc?) (builtin car))"), "#t");
        assert_eq!(eval("((builtin proc?) 1)"), "#f");
        assert_eq!(eval("((builtin meta?) (macro (x) x))"), "#t");
        assert_eq!(eval("((builtin meta?) (fun (x) x))"), "#f");
    }
}
