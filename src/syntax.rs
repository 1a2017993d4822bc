// ABOUTME: Primitive syntactic forms and the read-only syntax environment

use crate::compiler::compile;
use crate::context::Context;
use crate::env::Env;
use crate::error::EvalError;
use crate::inst::Inst;
use crate::pattern::Pattern;
use crate::value::Value;
use std::rc::Rc;

/// A compile-time form implemented by the host. `expand` gives the form a
/// chance to selectively macro-expand its arguments in place; `compile`
/// lowers the argument tail to instructions.
pub trait SyntaxImpl {
    fn expand(&self, context: &Context, args: &mut [Value]) -> Result<(), EvalError>;
    fn compile(&self, compile_env: &Rc<Env>, args: &[Value]) -> Result<Vec<Inst>, EvalError>;
}

/// The single read-only frame holding the eight primitive forms; the
/// toplevel environment is created as its child.
pub fn syntax_env() -> Rc<Env> {
    let env = Env::new();
    env.def("def", Value::Syntax(Rc::new(SyntaxDef)));
    env.def("set!", Value::Syntax(Rc::new(SyntaxSet)));
    env.def("begin", Value::Syntax(Rc::new(SyntaxBegin)));
    env.def("if", Value::Syntax(Rc::new(SyntaxIf)));
    env.def("fun", Value::Syntax(Rc::new(SyntaxFun)));
    env.def("macro", Value::Syntax(Rc::new(SyntaxMacro)));
    env.def("builtin", Value::Syntax(Rc::new(SyntaxBuiltin)));
    env.def("quote", Value::Syntax(Rc::new(SyntaxQuote)));
    env
}

/// Expansion policy for forms whose arguments are all ordinary expressions.
fn expand_all(context: &Context, args: &mut [Value]) -> Result<(), EvalError> {
    for arg in args.iter_mut() {
        *arg = context.macro_expand(true, arg.clone())?;
    }
    Ok(())
}

/// Expansion policy shielding the first argument (a name, pattern or
/// literal) from macro expansion.
fn expand_tail(context: &Context, args: &mut [Value]) -> Result<(), EvalError> {
    for arg in args.iter_mut().skip(1) {
        *arg = context.macro_expand(true, arg.clone())?;
    }
    Ok(())
}

struct SyntaxDef;

impl SyntaxImpl for SyntaxDef {
    fn expand(&self, context: &Context, args: &mut [Value]) -> Result<(), EvalError> {
        expand_tail(context, args)
    }

    fn compile(&self, compile_env: &Rc<Env>, args: &[Value]) -> Result<Vec<Inst>, EvalError> {
        if let [Value::Sym(name), init] = args {
            let mut code = compile(compile_env, init)?;
            code.push(Inst::Def(name.to_string()));
            code.push(Inst::Ldc(Value::Nil));
            return Ok(code);
        }
        Err(EvalError::evaluation("Syntax error: expected (def sym x)"))
    }
}

struct SyntaxSet;

impl SyntaxImpl for SyntaxSet {
    fn expand(&self, context: &Context, args: &mut [Value]) -> Result<(), EvalError> {
        expand_tail(context, args)
    }

    fn compile(&self, compile_env: &Rc<Env>, args: &[Value]) -> Result<Vec<Inst>, EvalError> {
        if let [Value::Sym(name), init] = args {
            let mut code = compile(compile_env, init)?;
            code.push(Inst::Set(name.to_string()));
            code.push(Inst::Ldc(Value::Nil));
            return Ok(code);
        }
        Err(EvalError::evaluation("Syntax error: expected (set! sym x)"))
    }
}

struct SyntaxBegin;

impl SyntaxImpl for SyntaxBegin {
    fn expand(&self, context: &Context, args: &mut [Value]) -> Result<(), EvalError> {
        expand_all(context, args)
    }

    fn compile(&self, compile_env: &Rc<Env>, args: &[Value]) -> Result<Vec<Inst>, EvalError> {
        compile_begin(compile_env, args)
    }
}

/// Sequences expressions, dropping every value but the last; the empty
/// sequence loads `Nil`. Shared with `fun` and `macro` bodies.
pub(crate) fn compile_begin(
    compile_env: &Rc<Env>,
    args: &[Value],
) -> Result<Vec<Inst>, EvalError> {
    let (first, rest) = match args.split_first() {
        Some(parts) => parts,
        None => return Ok(vec![Inst::Ldc(Value::Nil)]),
    };

    let mut code = compile(compile_env, first)?;
    for arg in rest {
        code.push(Inst::Pop);
        code.extend(compile(compile_env, arg)?);
    }
    Ok(code)
}

struct SyntaxIf;

impl SyntaxImpl for SyntaxIf {
    fn expand(&self, context: &Context, args: &mut [Value]) -> Result<(), EvalError> {
        expand_all(context, args)
    }

    fn compile(&self, compile_env: &Rc<Env>, args: &[Value]) -> Result<Vec<Inst>, EvalError> {
        if let [cond, then, els] = args {
            let mut code = compile(compile_env, cond)?;
            let mut then_code = compile(compile_env, then)?;
            then_code.push(Inst::Leave);
            let mut else_code = compile(compile_env, els)?;
            else_code.push(Inst::Leave);
            code.push(Inst::Sel(Rc::from(then_code), Rc::from(else_code)));
            return Ok(code);
        }
        Err(EvalError::evaluation(
            "Syntax error: expected (if cond then else)",
        ))
    }
}

struct SyntaxFun;

impl SyntaxImpl for SyntaxFun {
    fn expand(&self, context: &Context, args: &mut [Value]) -> Result<(), EvalError> {
        expand_tail(context, args)
    }

    fn compile(&self, compile_env: &Rc<Env>, args: &[Value]) -> Result<Vec<Inst>, EvalError> {
        if let Some((pattern, body)) = args.split_first() {
            let pattern = Pattern::build(pattern)?;
            let mut code = compile_begin(compile_env, body)?;
            code.push(Inst::Leave);
            return Ok(vec![Inst::Ldf(pattern, Rc::from(code))]);
        }
        Err(EvalError::evaluation(
            "Syntax error: expected (fun pattern body...)",
        ))
    }
}

struct SyntaxMacro;

impl SyntaxImpl for SyntaxMacro {
    fn expand(&self, context: &Context, args: &mut [Value]) -> Result<(), EvalError> {
        expand_tail(context, args)
    }

    fn compile(&self, compile_env: &Rc<Env>, args: &[Value]) -> Result<Vec<Inst>, EvalError> {
        if let Some((pattern, body)) = args.split_first() {
            let pattern = Pattern::build(pattern)?;
            // No trailing leave: macro bodies run to completion on their own
            // machine state rather than returning into a caller frame.
            let code = compile_begin(compile_env, body)?;
            return Ok(vec![Inst::Ldm(pattern, Rc::from(code))]);
        }
        Err(EvalError::evaluation(
            "Syntax error: expected (macro pattern body...)",
        ))
    }
}

struct SyntaxBuiltin;

impl SyntaxImpl for SyntaxBuiltin {
    fn expand(&self, context: &Context, args: &mut [Value]) -> Result<(), EvalError> {
        expand_tail(context, args)
    }

    fn compile(&self, _compile_env: &Rc<Env>, args: &[Value]) -> Result<Vec<Inst>, EvalError> {
        if let [Value::Sym(name)] = args {
            return Ok(vec![Inst::Ldb(name.to_string())]);
        }
        Err(EvalError::evaluation("Syntax error: expected (builtin sym)"))
    }
}

struct SyntaxQuote;

impl SyntaxImpl for SyntaxQuote {
    fn expand(&self, context: &Context, args: &mut [Value]) -> Result<(), EvalError> {
        expand_tail(context, args)
    }

    fn compile(&self, _compile_env: &Rc<Env>, args: &[Value]) -> Result<Vec<Inst>, EvalError> {
        if let [literal] = args {
            return Ok(vec![Inst::Ldc(literal.clone())]);
        }
        Err(EvalError::evaluation("Syntax error: expected (quote expr)"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_syntax_env_holds_the_eight_forms() {
        let env = syntax_env();
        for name in ["def", "set!", "begin", "if", "fun", "macro", "builtin", "quote"] {
            assert!(
                matches!(env.find(name), Some(Value::Syntax(_))),
                "missing syntax {}",
                name
            );
        }
    }
}
