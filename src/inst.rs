// ABOUTME: Bytecode instruction set executed by the virtual machine

use crate::pattern::Pattern;
use crate::value::Value;
use std::rc::Rc;

/// A compiled instruction sequence. Shared so that closures, continuations
/// and dump frames can alias the same code without copying.
pub type Code = Rc<[Inst]>;

#[derive(Debug, Clone)]
pub enum Inst {
    /// Push a constant.
    Ldc(Value),
    /// Push the value bound to a name; unbound is an error.
    Ldv(String),
    /// Push a closure capturing the current environment.
    Ldf(Pattern, Code),
    /// Push a macro capturing the current environment.
    Ldm(Pattern, Code),
    /// Push the builtin registered under a name; unknown is an error.
    Ldb(String),
    /// Pop a value and enter the first code if it is truthy, else the second.
    Sel(Code, Code),
    /// Pop `argc` arguments (rightmost first), pop the callee, apply.
    App(usize),
    /// Pop a dump entry and restore its environment and code.
    Leave,
    /// Discard the top of the value stack.
    Pop,
    /// Pop a value and bind it in the current frame.
    Def(String),
    /// Pop a value and assign the nearest existing binding.
    Set(String),
}
