// SPDX: CC0-1.0

use crate::{lex::SubStr, stdlib, vars::VarEnv, Number};
use core::fmt;
use thiserror::Error;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OperatorTyp {
    Neg,
    Pos,
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Pow,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Associativity {
    Left,
    Right,
}

impl OperatorTyp {
    pub const fn precedence(&self) -> i8 {
        match self {
            Self::Add => 2,
            Self::Sub => 2,
            Self::Mul => 3,
            Self::Div => 3,
            Self::Rem => 3,
            Self::Neg => 4,
            Self::Pos => 4,
            Self::Pow => 5,
        }
    }

    pub const fn associativity(&self) -> Associativity {
        use Associativity::{Left, Right};
        match self {
            Self::Neg => Right,
            Self::Pos => Right,
            Self::Add => Left,
            Self::Sub => Left,
            Self::Mul => Left,
            Self::Div => Left,
            Self::Rem => Left,
            Self::Pow => Right,
        }
    }

    pub const fn is_prefix(&self) -> bool {
        matches!(self, Self::Neg | Self::Pos)
    }

    pub const fn fun(&self) -> (&'static str, Fun) {
        match self {
            Self::Neg => ("neg", Fun::new(1, stdlib::neg)),
            Self::Pos => ("pos", Fun::new(1, stdlib::pos)),
            Self::Add => ("add", Fun::new(2, stdlib::add)),
            Self::Sub => ("sub", Fun::new(2, stdlib::sub)),
            Self::Mul => ("mul", Fun::new(2, stdlib::mul)),
            Self::Div => ("div", Fun::new(2, stdlib::div)),
            Self::Rem => ("rem", Fun::new(2, stdlib::rem)),
            Self::Pow => ("pow", Fun::new(2, stdlib::pow)),
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub enum OperationTyp {
    Operator(OperatorTyp),
    Val(Number),
    /// Looked up by name in the variable environment on every evaluation.
    Var,
    Fun(Fun),
}

#[derive(Clone, Debug)]
pub struct Operation {
    pub typ: OperationTyp,
    pub loc: SubStr,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.typ {
            OperationTyp::Val(val) => write!(f, "push {val}"),
            OperationTyp::Var => write!(f, "load '{}'", self.loc.get()),
            OperationTyp::Operator(typ) => write!(f, "call '{}'", typ.fun().0),
            OperationTyp::Fun(_) => write!(f, "call '{}'", self.loc.get()),
        }
    }
}

#[derive(Clone, Debug, Error)]
pub enum EvalErrTyp {
    #[error("cannot evaluate empty program")]
    Empty,

    #[error(
        "function '{name}' requires {arity} argument{s}, but found {found}",
        s = plural(.arity)
    )]
    MissingArgs {
        name: String,
        arity: usize,
        found: usize,
    },

    #[error(
        "expected {expected} value{s} after evaluation but found {found}",
        s = plural(.expected)
    )]
    StackMismatch { expected: usize, found: usize },

    #[error("variable '{name}' is not declared")]
    Unresolved { name: String },
}

fn plural(n: &usize) -> &'static str {
    if *n == 1 {
        ""
    } else {
        "s"
    }
}

#[derive(Clone, Debug, Error)]
#[error("{typ}")]
pub struct EvalErr {
    pub typ: EvalErrTyp,
    pub op: Option<Operation>, // if none, associated with end-of-program checking
}

#[derive(Clone, Copy, Debug)]
pub struct Fun {
    pub arity: usize,
    pub fun: fn(&[Number]) -> Number,
}

impl Fun {
    pub const fn new(arity: usize, fun: fn(&[Number]) -> Number) -> Self {
        Self { arity, fun }
    }
}

#[derive(Clone, Copy, Debug)]
pub enum Ident {
    Const(Number),
    Fun(Fun),
}

#[derive(Clone, Debug)]
pub struct Program {
    pub(crate) ops: Vec<Operation>,
}

impl Program {
    #[inline]
    pub const fn new(ops: Vec<Operation>) -> Self {
        Self { ops }
    }

    #[inline]
    pub fn ops(&self) -> core::slice::Iter<'_, Operation> {
        self.ops.iter()
    }

    /// Names of every variable the program loads, in order of first use.
    pub fn var_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for op in self.ops() {
            if let OperationTyp::Var = op.typ {
                let name = op.loc.get();
                if !names.contains(&name) {
                    names.push(name);
                }
            }
        }
        names
    }
}

fn op_fun(op: &Operation) -> Option<(&str, Fun)> {
    match op.typ {
        OperationTyp::Operator(typ) => Some(typ.fun()),
        OperationTyp::Fun(fun) => Some((op.loc.get(), fun)),
        OperationTyp::Val(_) | OperationTyp::Var => None,
    }
}

fn expect_fun_args(len: usize, op: &Operation, name: &str, fun: &Fun) -> Result<(), EvalErr> {
    if len < fun.arity {
        Err(EvalErr {
            typ: EvalErrTyp::MissingArgs {
                arity: fun.arity,
                found: len,
                name: name.to_string(),
            },
            op: Some(op.clone()),
        })
    } else {
        Ok(())
    }
}

fn expect_exactly_n(len: usize, n: usize) -> Result<(), EvalErr> {
    if len == n {
        Ok(())
    } else {
        Err(EvalErr {
            typ: EvalErrTyp::StackMismatch {
                expected: n,
                found: len,
            },
            op: None,
        })
    }
}

fn expect_nonempty(prog: &Program) -> Result<(), EvalErr> {
    if prog.ops.is_empty() {
        Err(EvalErr {
            typ: EvalErrTyp::Empty,
            op: None,
        })
    } else {
        Ok(())
    }
}

/// Runs the program against stack depths only, catching every arity and
/// operand-count error [`eval`] could raise apart from unresolved variables.
pub fn check(prog: &Program) -> Result<(), EvalErr> {
    expect_nonempty(prog)?;

    let mut depth = 0usize;
    for op in prog.ops() {
        if let Some((name, fun)) = op_fun(op) {
            expect_fun_args(depth, op, name, &fun)?;
            depth -= fun.arity;
        }
        depth += 1;
    }

    expect_exactly_n(depth, 1)
}

fn eval_fun(
    stack: &mut Vec<Number>,
    op: &Operation,
    name: &str,
    fun: &Fun,
) -> Result<Number, EvalErr> {
    expect_fun_args(stack.len(), op, name, fun)?;
    // stack: ...a, b, c, d
    //                 ^^^^ args if arity is 2
    let args = stack.split_off(stack.len() - fun.arity);
    Ok((fun.fun)(&args))
}

pub fn eval(prog: &Program, env: &VarEnv, stack: &mut Vec<Number>) -> Result<Number, EvalErr> {
    expect_nonempty(prog)?;

    stack.clear();

    for op in prog.ops() {
        let val = match op.typ {
            OperationTyp::Val(num) => num,

            OperationTyp::Var => {
                let name = op.loc.get();
                match env.get(name) {
                    Some(val) => val,
                    None => {
                        return Err(EvalErr {
                            typ: EvalErrTyp::Unresolved {
                                name: name.to_string(),
                            },
                            op: Some(op.clone()),
                        })
                    }
                }
            }

            OperationTyp::Operator(typ) => {
                let (name, fun) = typ.fun();
                eval_fun(stack, op, name, &fun)?
            }

            OperationTyp::Fun(fun) => eval_fun(stack, op, op.loc.get(), &fun)?,
        };
        stack.push(val);
    }

    expect_exactly_n(stack.len(), 1)?;
    stack.pop().ok_or(EvalErr {
        typ: EvalErrTyp::Empty,
        op: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn op(typ: OperationTyp, text: &str) -> Operation {
        Operation {
            typ,
            loc: SubStr::all(Arc::new(text.to_string())),
        }
    }

    #[test]
    fn postfix_evaluation_reads_current_values() {
        // k 2 mul
        let prog = Program::new(vec![
            op(OperationTyp::Var, "k"),
            op(OperationTyp::Val(2.0), "2"),
            op(OperationTyp::Operator(OperatorTyp::Mul), "*"),
        ]);
        let mut env = VarEnv::empty();
        let mut stack = Vec::new();

        env.set("k", 3.0);
        assert_eq!(eval(&prog, &env, &mut stack).unwrap(), 6.0);
        env.set("k", -1.5);
        assert_eq!(eval(&prog, &env, &mut stack).unwrap(), -3.0);

        env.remove("k");
        let err = eval(&prog, &env, &mut stack).unwrap_err();
        assert!(matches!(err.typ, EvalErrTyp::Unresolved { ref name } if name == "k"));
    }

    #[test]
    fn check_rejects_bad_stack_shapes() {
        let add = || op(OperationTyp::Operator(OperatorTyp::Add), "+");
        let one = || op(OperationTyp::Val(1.0), "1");

        assert!(matches!(
            check(&Program::new(vec![])).unwrap_err().typ,
            EvalErrTyp::Empty
        ));
        assert!(matches!(
            check(&Program::new(vec![one(), add()])).unwrap_err().typ,
            EvalErrTyp::MissingArgs {
                arity: 2,
                found: 1,
                ..
            }
        ));
        assert!(matches!(
            check(&Program::new(vec![one(), one()])).unwrap_err().typ,
            EvalErrTyp::StackMismatch {
                expected: 1,
                found: 2
            }
        ));
        assert!(check(&Program::new(vec![one(), one(), add()])).is_ok());
    }

    #[test]
    fn var_names_are_deduplicated() {
        let prog = Program::new(vec![
            op(OperationTyp::Var, "x"),
            op(OperationTyp::Var, "x"),
            op(OperationTyp::Operator(OperatorTyp::Mul), "*"),
        ]);
        assert_eq!(prog.var_names(), ["x"]);
    }
}
