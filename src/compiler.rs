// ABOUTME: Lowers expanded expressions to linear instruction sequences

use crate::env::Env;
use crate::error::EvalError;
use crate::inst::Inst;
use crate::value::Value;
use std::rc::Rc;

/// Compiles one expression against `compile_env`. Symbols become variable
/// loads, proper lists become syntax expansions or applications, and every
/// other atom loads itself as a constant. Improper lists cannot reach the
/// compiler from the expander, so they are an internal error.
pub fn compile(compile_env: &Rc<Env>, expr: &Value) -> Result<Vec<Inst>, EvalError> {
    match expr {
        Value::Sym(name) => Ok(vec![Inst::Ldv(name.to_string())]),

        Value::Cons(_) => {
            let items = expr
                .to_vec()
                .ok_or_else(|| EvalError::internal(format!("Improper list: {}", expr)))?;

            if let Some(Value::Syntax(syntax)) = compile_env.refer(&items[0]) {
                return syntax.compile(compile_env, &items[1..]);
            }

            let mut code = Vec::new();
            for item in &items {
                code.extend(compile(compile_env, item)?);
            }
            code.push(Inst::App(items.len() - 1));
            Ok(code)
        }

        _ => Ok(vec![Inst::Ldc(expr.clone())]),
    }
}
