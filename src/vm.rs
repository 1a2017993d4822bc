// ABOUTME: The stack machine: run loop, frame dump, apply, continuations

use crate::context::Context;
use crate::env::Env;
use crate::error::EvalError;
use crate::inst::{Code, Inst};
use crate::value::{Closure, Value};
use std::rc::Rc;

/// Host-provided callable. A builtin manipulates the machine state directly:
/// it must push exactly one result onto the value stack, or transfer control
/// via `State::apply` or a continuation restore.
pub trait BuiltinImpl {
    fn run(&self, state: &mut State<'_>, args: Vec<Value>) -> Result<(), EvalError>;
}

/// The continuation: everything needed to resume a computation. Cloning one
/// copies the stack and dump vectors while aliasing the environments and
/// code they point at.
#[derive(Clone)]
pub struct Cont {
    stack: Vec<Value>,
    env: Rc<Env>,
    code: Code,
    pc: usize,
    dump: Vec<Frame>,
}

/// A saved return: where to pick up when the entered code leaves.
#[derive(Clone)]
struct Frame {
    env: Rc<Env>,
    code: Code,
    pc: usize,
}

/// Machine state for one execution: the continuation plus the context that
/// supplies builtins and the toplevel.
pub struct State<'a> {
    pub context: &'a Context,
    cont: Cont,
}

impl<'a> State<'a> {
    pub fn new(context: &'a Context, env: Rc<Env>, code: Code) -> State<'a> {
        State {
            context,
            cont: Cont {
                stack: Vec::new(),
                env,
                code,
                pc: 0,
                dump: Vec::new(),
            },
        }
    }

    pub fn push(&mut self, value: Value) {
        self.cont.stack.push(value);
    }

    fn pop(&mut self) -> Result<Value, EvalError> {
        self.cont
            .stack
            .pop()
            .ok_or_else(|| EvalError::internal("Inconsistent stack"))
    }

    /// Switches to `code` in `env`, saving the current frame on the dump.
    /// When the only instruction left here is a `leave`, the save is skipped
    /// and the entered code reuses this frame's saved return, so
    /// tail-position calls do not grow the dump.
    fn enter(&mut self, env: Rc<Env>, code: Code) {
        let remaining = self.cont.code.len() - self.cont.pc;
        let tail = remaining == 1 && matches!(self.cont.code[self.cont.pc], Inst::Leave);
        if !tail {
            self.cont.dump.push(Frame {
                env: Rc::clone(&self.cont.env),
                code: Rc::clone(&self.cont.code),
                pc: self.cont.pc,
            });
        }
        self.cont.env = env;
        self.cont.code = code;
        self.cont.pc = 0;
    }

    fn leave(&mut self) -> Result<(), EvalError> {
        let frame = self
            .cont
            .dump
            .pop()
            .ok_or_else(|| EvalError::internal("Inconsistent dump"))?;
        self.cont.env = frame.env;
        self.cont.code = frame.code;
        self.cont.pc = frame.pc;
        Ok(())
    }

    /// Applies a procedure to already-evaluated arguments.
    pub fn apply(&mut self, f: Value, args: Vec<Value>) -> Result<(), EvalError> {
        match f {
            Value::Fun(closure) => {
                let env = Env::child(Rc::clone(&closure.env));
                closure.pattern.bind(args, &env)?;
                self.enter(env, Rc::clone(&closure.code));
                Ok(())
            }
            Value::Builtin(builtin) => builtin.run(self, args),
            other => Err(EvalError::type_error("Cannot call", &other)),
        }
    }

    /// Applies without saving a dump entry: the current frame is abandoned
    /// and the callee's `leave` returns to this frame's caller.
    pub fn apply_never(&mut self, f: Value, args: Vec<Value>) -> Result<(), EvalError> {
        match f {
            Value::Fun(closure) => {
                let env = Env::child(Rc::clone(&closure.env));
                closure.pattern.bind(args, &env)?;
                self.cont.env = env;
                self.cont.code = Rc::clone(&closure.code);
                self.cont.pc = 0;
                Ok(())
            }
            Value::Builtin(builtin) => builtin.run(self, args),
            other => Err(EvalError::type_error("Cannot call", &other)),
        }
    }

    /// Reifies the current continuation as a callable value. The snapshot
    /// copies the stack and dump; environments and code are shared, so later
    /// mutations of captured environments stay observable.
    pub fn capture_cont(&self) -> Value {
        Value::Builtin(Rc::new(self.cont.clone()))
    }

    fn run_inst(&mut self, inst: Inst) -> Result<(), EvalError> {
        match inst {
            Inst::Ldc(value) => {
                self.push(value);
                Ok(())
            }

            Inst::Ldv(name) => {
                let value = self.cont.env.get(&name)?;
                self.push(value);
                Ok(())
            }

            Inst::Ldf(pattern, code) => {
                self.push(Value::Fun(Rc::new(Closure {
                    env: Rc::clone(&self.cont.env),
                    pattern,
                    code,
                })));
                Ok(())
            }

            Inst::Ldm(pattern, code) => {
                self.push(Value::Macro(Rc::new(Closure {
                    env: Rc::clone(&self.cont.env),
                    pattern,
                    code,
                })));
                Ok(())
            }

            Inst::Ldb(name) => {
                let builtin = self
                    .context
                    .builtins
                    .get(&name)
                    .ok_or_else(|| EvalError::evaluation(format!("Unsupported builtin: {}", name)))?;
                self.push(Value::Builtin(Rc::clone(builtin)));
                Ok(())
            }

            Inst::Sel(then_code, else_code) => {
                let branch = if self.pop()?.is_truthy() {
                    then_code
                } else {
                    else_code
                };
                self.enter(Env::child(Rc::clone(&self.cont.env)), branch);
                Ok(())
            }

            Inst::App(argc) => {
                let mut args = vec![Value::Nil; argc];
                for slot in args.iter_mut().rev() {
                    *slot = self.pop()?;
                }
                let f = self.pop()?;
                self.apply(f, args)
            }

            Inst::Leave => self.leave(),

            Inst::Pop => self.pop().map(|_| ()),

            Inst::Def(name) => {
                let value = self.pop()?;
                self.cont.env.def(&name, value);
                Ok(())
            }

            Inst::Set(name) => {
                let value = self.pop()?;
                self.cont.env.set(&name, value)
            }
        }
    }

    /// Drains the code cursor; the top of the value stack is the result.
    pub fn run(&mut self) -> Result<Value, EvalError> {
        while self.cont.pc < self.cont.code.len() {
            let inst = self.cont.code[self.cont.pc].clone();
            self.cont.pc += 1;
            self.run_inst(inst)?;
        }
        self.pop()
    }
}

impl BuiltinImpl for Cont {
    /// Invoking a reified continuation discards the current state in favor
    /// of a copy of the snapshot, then pushes the passed value (`Nil` when
    /// called with no argument). The snapshot itself stays reusable.
    fn run(&self, state: &mut State<'_>, args: Vec<Value>) -> Result<(), EvalError> {
        if args.len() > 1 {
            return Err(EvalError::evaluation("Multiple values are not implemented"));
        }
        state.cont = self.clone();
        let value = args.into_iter().next().unwrap_or(Value::Nil);
        state.push(value);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Context;
    use crate::parser::parse;

    fn eval(context: &Context, source: &str) -> Result<Value, EvalError> {
        context.eval(parse(source).unwrap())
    }

    fn eval_ok(context: &Context, source: &str) -> String {
        eval(context, source).unwrap().to_string()
    }

    #[test]
    fn test_constants_and_defines() {
        let context = Context::new();
        assert_eq!(eval_ok(&context, "42"), "42");
        assert_eq!(eval_ok(&context, "(def x 42)"), "()");
        assert_eq!(eval_ok(&context, "x"), "42");
        assert_eq!(eval_ok(&context, "(set! x 7)"), "()");
        assert_eq!(eval_ok(&context, "x"), "7");
    }

    #[test]
    fn test_set_unbound_fails() {
        let context = Context::new();
        let err = eval(&context, "(set! nowhere 1)").unwrap_err();
        assert_eq!(err.to_string(), "Evaluation error: Undefined variable: nowhere");
    }

    #[test]
    fn test_if_selects_on_truthiness() {
        let context = Context::new();
        assert_eq!(eval_ok(&context, "(if #t 'a 'b)"), "a");
        assert_eq!(eval_ok(&context, "(if #f 'a 'b)"), "b");
        assert_eq!(eval_ok(&context, "(if 0 'a 'b)"), "a");
        assert_eq!(eval_ok(&context, "(if '() 'a 'b)"), "a");
        assert_eq!(eval_ok(&context, "(if \"\" 'a 'b)"), "a");
    }

    #[test]
    fn test_function_call_and_lexical_capture() {
        let context = Context::new();
        assert_eq!(eval_ok(&context, "((fun (x) x) 5)"), "5");

        eval(&context, "(def make (fun (n) (fun () n)))").unwrap();
        eval(&context, "(def keep (make 10))").unwrap();
        eval(&context, "(def n 99)").unwrap();
        assert_eq!(eval_ok(&context, "(keep)"), "10");
    }

    #[test]
    fn test_variadic_binding() {
        let context = Context::new();
        assert_eq!(eval_ok(&context, "((fun xs xs) 1 2 3)"), "(1 2 3)");
        assert_eq!(eval_ok(&context, "((fun (a . rest) rest) 1 2 3)"), "(2 3)");
    }

    #[test]
    fn test_call_non_procedure_fails() {
        let context = Context::new();
        let err = eval(&context, "(1 2)").unwrap_err();
        assert_eq!(err.to_string(), "Evaluation error: Cannot call: 1");
    }

    #[test]
    fn test_unknown_builtin_fails() {
        let context = Context::new();
        let err = eval(&context, "(builtin no-such)").unwrap_err();
        assert_eq!(err.to_string(), "Evaluation error: Unsupported builtin: no-such");
    }

    #[test]
    fn test_branch_frames_do_not_leak_defines() {
        let context = Context::new();
        eval(&context, "(if #t (def hidden 1) 2)").unwrap();
        assert!(eval(&context, "hidden").is_err());
    }
}
