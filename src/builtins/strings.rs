//! String primitives. Strings are byte sequences, so indexing, length and
//! substrings all count bytes.

use crate::context::Context;
use crate::error::EvalError;
use crate::value::Value;
use crate::vm::{BuiltinImpl, State};
use std::rc::Rc;

pub(crate) fn extract_strings(op: &str, args: &[Value]) -> Result<Vec<Rc<[u8]>>, EvalError> {
    args.iter()
        .map(|arg| match arg {
            Value::Str(bytes) => Ok(Rc::clone(bytes)),
            other => Err(EvalError::type_error(
                &format!("Operator {} takes string arguments", op),
                other,
            )),
        })
        .collect()
}

fn byte_index(name: &str, args: &[Value], at: usize) -> Result<usize, EvalError> {
    match &args[at] {
        Value::Num(n) if *n >= 0.0 && n.fract() == 0.0 => Ok(*n as usize),
        other => Err(EvalError::type_error(
            &format!("Builtin function {} takes index arguments", name),
            other,
        )),
    }
}

/// `(str b...)` builds a string from byte values.
struct Str;

impl BuiltinImpl for Str {
    fn run(&self, state: &mut State<'_>, args: Vec<Value>) -> Result<(), EvalError> {
        let mut bytes = Vec::with_capacity(args.len());
        for arg in &args {
            match arg {
                Value::Num(n) if (0.0..=255.0).contains(n) && n.fract() == 0.0 => {
                    bytes.push(*n as u8)
                }
                other => return Err(EvalError::type_error("Not a byte", other)),
            }
        }
        state.push(Value::Str(Rc::from(bytes)));
        Ok(())
    }
}

/// `(str-ref s i)` is the byte at index `i`.
struct StrRef;

impl BuiltinImpl for StrRef {
    fn run(&self, state: &mut State<'_>, args: Vec<Value>) -> Result<(), EvalError> {
        if args.len() != 2 {
            return Err(EvalError::evaluation(
                "Builtin function str-ref takes 2 arguments",
            ));
        }
        let bytes = extract_strings("str-ref", &args[..1])?.remove(0);
        let index = byte_index("str-ref", &args, 1)?;
        match bytes.get(index) {
            Some(&b) => {
                state.push(Value::Num(f64::from(b)));
                Ok(())
            }
            None => Err(EvalError::evaluation(format!("Index out of range: {}", index))),
        }
    }
}

/// `(length s)` is the byte length.
struct Length;

impl BuiltinImpl for Length {
    fn run(&self, state: &mut State<'_>, args: Vec<Value>) -> Result<(), EvalError> {
        if args.len() != 1 {
            return Err(EvalError::evaluation(
                "Builtin function length takes a string argument",
            ));
        }
        let bytes = extract_strings("length", &args)?.remove(0);
        state.push(Value::Num(bytes.len() as f64));
        Ok(())
    }
}

struct Concat;

impl BuiltinImpl for Concat {
    fn run(&self, state: &mut State<'_>, args: Vec<Value>) -> Result<(), EvalError> {
        let mut bytes = Vec::new();
        for part in extract_strings("concat", &args)? {
            bytes.extend_from_slice(&part);
        }
        state.push(Value::Str(Rc::from(bytes)));
        Ok(())
    }
}

/// `(substr s start len)`.
struct Substr;

impl BuiltinImpl for Substr {
    fn run(&self, state: &mut State<'_>, args: Vec<Value>) -> Result<(), EvalError> {
        if args.len() != 3 {
            return Err(EvalError::evaluation(
                "Builtin function substr takes 3 arguments",
            ));
        }
        let bytes = extract_strings("substr", &args[..1])?.remove(0);
        let start = byte_index("substr", &args, 1)?;
        let len = byte_index("substr", &args, 2)?;
        match start.checked_add(len) {
            Some(end) if end <= bytes.len() => {
                state.push(Value::Str(Rc::from(&bytes[start..end])));
                Ok(())
            }
            _ => Err(EvalError::evaluation(format!(
                "Index out of range: {}",
                start.saturating_add(len)
            ))),
        }
    }
}

struct SymToStr;

impl BuiltinImpl for SymToStr {
    fn run(&self, state: &mut State<'_>, args: Vec<Value>) -> Result<(), EvalError> {
        let [value]: [Value; 1] = args.try_into().map_err(|_| {
            EvalError::evaluation("Builtin function sym->str takes one argument")
        })?;
        match value {
            Value::Sym(name) => {
                state.push(Value::string(&name));
                Ok(())
            }
            other => Err(EvalError::type_error("Not a sym", &other)),
        }
    }
}

struct NumToStr;

impl BuiltinImpl for NumToStr {
    fn run(&self, state: &mut State<'_>, args: Vec<Value>) -> Result<(), EvalError> {
        let [value]: [Value; 1] = args.try_into().map_err(|_| {
            EvalError::evaluation("Builtin function num->str takes one argument")
        })?;
        match value {
            Value::Num(_) => {
                state.push(Value::string(&value.to_string()));
                Ok(())
            }
            other => Err(EvalError::type_error("Not a num", &other)),
        }
    }
}

/// Fallible conversion: pushes `(#t . num)` on success and
/// `(#f . message)` on failure instead of raising.
struct StrToNum;

impl BuiltinImpl for StrToNum {
    fn run(&self, state: &mut State<'_>, args: Vec<Value>) -> Result<(), EvalError> {
        let [value]: [Value; 1] = args.try_into().map_err(|_| {
            EvalError::evaluation("Builtin function str->num takes one argument")
        })?;
        let bytes = match value {
            Value::Str(bytes) => bytes,
            other => return Err(EvalError::type_error("Not a str", &other)),
        };
        let text = String::from_utf8_lossy(&bytes);
        let result = match text.parse::<f64>() {
            Ok(num) => Value::cons(Value::Bool(true), Value::Num(num)),
            Err(_) => Value::cons(
                Value::Bool(false),
                Value::string(&format!("Not a number: {}", text)),
            ),
        };
        state.push(result);
        Ok(())
    }
}

pub fn register(context: &mut Context) {
    context.builtins.insert("str".to_string(), Rc::new(Str));
    context.builtins.insert("str-ref".to_string(), Rc::new(StrRef));
    context.builtins.insert("length".to_string(), Rc::new(Length));
    context.builtins.insert("concat".to_string(), Rc::new(Concat));
    context.builtins.insert("substr".to_string(), Rc::new(Substr));
    context.builtins.insert("sym->str".to_string(), Rc::new(SymToStr));
    context.builtins.insert("num->str".to_string(), Rc::new(NumToStr));
    context.builtins.insert("str->num".to_string(), Rc::new(StrToNum));
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
            .eval(parse(source).unwrap())
            .map(|v| v.to_string())
            .map_err(|e| e.to_string())
    }

    #[test]
    fn test_str_builds_from_bytes() {
        assert_eq!(eval("((builtin str) 104 105)").unwrap(), "\"hi\"");
        assert_eq!(eval("((builtin str))").unwrap(), "\"\"");
        assert_eq!(
            eval("((builtin str) 300)").unwrap_err(),
            "Evaluation error: Not a byte: 300"
        );
    }

    #[test]
    fn test_str_ref_and_length_count_bytes() {
        assert_eq!(eval("((builtin str-ref) \"abc\" 1)").unwrap(), "98");
        assert_eq!(eval("((builtin length) \"abc\")").unwrap(), "3");
        assert_eq!(eval("((builtin length) \"\")").unwrap(), "0");
        assert_eq!(
            eval("((builtin str-ref) \"abc\" 3)").unwrap_err(),
            "Evaluation error: Index out of range: 3"
        );
    }

    #[test]
    fn test_concat_and_substr() {
        assert_eq!(eval("((builtin concat) \"foo\" \"bar\")").unwrap(), "\"foobar\"");
        assert_eq!(eval("((builtin concat))").unwrap(), "\"\"");
        assert_eq!(eval("((builtin substr) \"hello\" 1 3)").unwrap(), "\"ell\"");
        assert_eq!(
            eval("((builtin substr) \"hello\" 3 4)").unwrap_err(),
            "Evaluation error: Index out of range: 7"
        );
    }

    #[test]
    fn test_conversions() {
        assert_eq!(eval("((builtin sym->str) 'foo)").unwrap(), "\"foo\"");
        assert_eq!(eval("((builtin num->str) 2.5)").unwrap(), "\"2.5\"");
        assert_eq!(eval("((builtin str->num) \"42\")").unwrap(), "(#t . 42)");
        assert_eq!(
            eval("((builtin str->num) \"nope\")").unwrap(),
            "(#f . \"Not a number: nope\")"
        );
    }
}
