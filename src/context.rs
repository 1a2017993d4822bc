// ABOUTME: Interpreter context: toplevel environment, builtin registry, macro expansion

use crate::compiler::compile;
use crate::env::Env;
use crate::error::EvalError;
use crate::inst::Code;
use crate::syntax::syntax_env;
use crate::value::Value;
use crate::vm::{BuiltinImpl, State};
use std::collections::HashMap;
use std::rc::Rc;

/// One interpreter instance: a toplevel environment whose parent is the
/// read-only syntax environment, plus the registry `ldb` resolves against.
pub struct Context {
    toplevel: Rc<Env>,
    pub builtins: HashMap<String, Rc<dyn BuiltinImpl>>,
}

impl Context {
    pub fn new() -> Context {
        Context {
            toplevel: Env::child(syntax_env()),
            builtins: HashMap::new(),
        }
    }

    pub fn toplevel(&self) -> &Rc<Env> {
        &self.toplevel
    }

    /// Compiles one (already expanded) expression against the toplevel.
    pub fn compile(&self, expr: &Value) -> Result<Code, EvalError> {
        Ok(Rc::from(compile(&self.toplevel, expr)?))
    }

    /// Expands, compiles and runs one expression on the toplevel.
    pub fn eval(&self, expr: Value) -> Result<Value, EvalError> {
        let expr = self.macro_expand(true, expr)?;
        let code = self.compile(&expr)?;
        self.exec(Rc::clone(&self.toplevel), code)
    }

    /// Runs code to completion on a fresh machine state and takes the stack
    /// top. Macro bodies go through here rather than being entered as called
    /// functions, which is why they compile without a trailing `leave`.
    pub(crate) fn exec(&self, env: Rc<Env>, code: Code) -> Result<Value, EvalError> {
        State::new(self, env, code).run()
    }

    /// Rewrites an expression until no macro applies at its head. Macro
    /// names resolve in the toplevel environment only. With `recurse` false,
    /// a single head rewrite is performed and subexpressions are left alone.
    pub fn macro_expand(&self, recurse: bool, expr: Value) -> Result<Value, EvalError> {
        if let Some(items) = expr.to_vec() {
            if !items.is_empty() {
                match self.toplevel.refer(&items[0]) {
                    Some(Value::Macro(m)) => {
                        let env = Env::child(Rc::clone(&m.env));
                        m.pattern.bind(items[1..].to_vec(), &env)?;
                        let rewritten = self.exec(env, Rc::clone(&m.code))?;
                        if !recurse {
                            return Ok(rewritten);
                        }
                        return self.macro_expand(true, rewritten);
                    }
                    Some(Value::Syntax(syntax)) => {
                        if !recurse {
                            return Ok(expr);
                        }
                        let mut args = items[1..].to_vec();
                        syntax.expand(self, &mut args)?;
                        let mut list = Vec::with_capacity(args.len() + 1);
                        list.push(items[0].clone());
                        list.extend(args);
                        return Ok(Value::list(list));
                    }
                    _ => {}
                }
            }
        }

        if !recurse {
            return Ok(expr);
        }
        self.expand_children(expr)
    }

    /// Expands the car of every cell along a cons chain; atoms (including
    /// improper tails) pass through unchanged.
    fn expand_children(&self, expr: Value) -> Result<Value, EvalError> {
        match expr {
            Value::Cons(cell) => Ok(Value::cons(
                self.macro_expand(true, cell.car.clone())?,
                self.expand_children(cell.cdr.clone())?,
            )),
            other => Ok(other),
        }
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    fn expand(context: &Context, recurse: bool, source: &str) -> String {
        context
            .macro_expand(recurse, parse(source).unwrap())
            .unwrap()
            .to_string()
    }

    fn context_with_macros() -> Context {
        let mut context = Context::new();
        crate::builtins::register_builtins(&mut context, &[]);
        context
            .eval(parse("(def cons (builtin cons))").unwrap())
            .unwrap();
        // (swap a b) rewrites to (b a).
        context
            .eval(parse("(def swap (macro (a b) (cons b (cons a '()))))").unwrap())
            .unwrap();
        // (ident x) rewrites to x.
        context
            .eval(parse("(def ident (macro (x) x))").unwrap())
            .unwrap();
        context
    }

    #[test]
    fn test_macro_rewrites_head_form() {
        let context = context_with_macros();
        assert_eq!(expand(&context, true, "(swap 1 f)"), "(f 1)");
    }

    #[test]
    fn test_expansion_recurses_until_stable() {
        let context = context_with_macros();
        assert_eq!(expand(&context, true, "(ident (ident (f 1)))"), "(f 1)");
        assert_eq!(expand(&context, false, "(ident (ident (f 1)))"), "(ident (f 1))");
    }

    #[test]
    fn test_subexpressions_expand() {
        let context = context_with_macros();
        assert_eq!(expand(&context, true, "(f (swap 1 g) 2)"), "(f (g 1) 2)");
    }

    #[test]
    fn test_quote_shields_arguments() {
        let context = context_with_macros();
        assert_eq!(expand(&context, true, "(quote (swap 1 f))"), "'(swap 1 f)");
    }

    #[test]
    fn test_def_shields_only_the_name() {
        let context = context_with_macros();
        assert_eq!(
            expand(&context, true, "(def swap (swap 1 f))"),
            "(def swap (f 1))"
        );
    }

    #[test]
    fn test_begin_and_if_expand_everything() {
        let context = context_with_macros();
        assert_eq!(
            expand(&context, true, "(begin (swap 1 f) (swap 2 g))"),
            "(begin (f 1) (g 2))"
        );
        assert_eq!(
            expand(&context, true, "(if (swap 1 f) (swap 2 g) 3)"),
            "(if (f 1) (g 2) 3)"
        );
    }

    #[test]
    fn test_atoms_and_non_macro_heads_unchanged() {
        let context = context_with_macros();
        assert_eq!(expand(&context, true, "x"), "x");
        assert_eq!(expand(&context, true, "(f 1 2)"), "(f 1 2)");
    }

    #[test]
    fn test_macro_arity_is_checked() {
        let context = context_with_macros();
        let err = context
            .macro_expand(true, parse("(swap 1)").unwrap())
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Evaluation error: This function takes 2 arguments"
        );
    }
}
