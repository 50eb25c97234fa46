// SPDX: CC0-1.0

// implementation of shunting yard algorithm by dijkstra (see https://en.wikipedia.org/wiki/Shunting_yard_algorithm)

use crate::{
    eval::{Associativity, Fun, Ident, Operation, OperationTyp, OperatorTyp, Program},
    lex::{LexErr, LexErrTyp, Lexer, SubStr, TokTyp},
    stdlib, Number,
};
use core::num::ParseFloatError;
use std::collections::HashSet;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParseErrTyp {
    #[error("{0}")]
    LexErr(LexErrTyp),
    #[error("invalid number: {0}")]
    ParseNum(ParseFloatError),
    #[error("mismatched parentheses")]
    ParenMismatch,
    #[error("unknown identifier")]
    UnknownIdent,
}

#[derive(Debug)]
pub struct ParseErr {
    pub typ: ParseErrTyp,
    pub loc: SubStr,
}

impl From<LexErr> for ParseErr {
    fn from(err: LexErr) -> Self {
        Self {
            typ: ParseErrTyp::LexErr(err.typ),
            loc: err.loc,
        }
    }
}

#[derive(Clone, Copy, Debug)]
enum ShuntOpTyp {
    Operator(OperatorTyp),
    Fun(Fun),
    OpenParen,
}

#[derive(Clone, Debug)]
struct ShuntOp {
    typ: ShuntOpTyp,
    loc: SubStr,
}

impl ShuntOp {
    /// Whether this operator, sitting on the stack, must be output before
    /// `incoming` is pushed.
    fn yields_to(&self, incoming: OperatorTyp) -> bool {
        match self.typ {
            ShuntOpTyp::OpenParen => false,
            // function application binds tighter than any operator
            ShuntOpTyp::Fun(_) => true,
            ShuntOpTyp::Operator(op) => {
                (op.precedence() > incoming.precedence())
                    || ((op.precedence() == incoming.precedence())
                        && (incoming.associativity() == Associativity::Left))
            }
        }
    }

    fn into_output(self) -> Operation {
        let typ = match self.typ {
            ShuntOpTyp::Operator(typ) => OperationTyp::Operator(typ),
            ShuntOpTyp::Fun(fun) => OperationTyp::Fun(fun),
            ShuntOpTyp::OpenParen => unreachable!("no parentheses in the output stack"),
        };
        Operation { typ, loc: self.loc }
    }
}

/// What an identifier refers to once parsed.
#[derive(Clone, Copy, Debug)]
enum Resolved {
    Fun(Fun),
    Var,
    Const(Number),
}

/// Builtin functions win over variables, and variables shadow builtin
/// constants.
fn resolve(name: &str, known: &HashSet<String>) -> Option<Resolved> {
    let builtin = stdlib::builtins().get(name).copied();
    match builtin {
        Some(Ident::Fun(fun)) => Some(Resolved::Fun(fun)),
        _ if known.contains(name) => Some(Resolved::Var),
        Some(Ident::Const(val)) => Some(Resolved::Const(val)),
        None => None,
    }
}

/// The kind of the last token seen, for deciding where an implicit
/// multiplication goes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Last {
    Nothing,
    Number,
    Operand,
    Other,
}

#[derive(Debug, Default)]
struct Shunt {
    out: Vec<Operation>, // output
    ops: Vec<ShuntOp>,   // operator stack
}

impl Shunt {
    fn push_operator(&mut self, o1: OperatorTyp, loc: SubStr) {
        // prefix operators have no left operand to steal
        if !o1.is_prefix() {
            while let Some(o2) = self.ops.last() {
                if !o2.yields_to(o1) {
                    break;
                }
                if let Some(o2) = self.ops.pop() {
                    self.out.push(o2.into_output());
                }
            }
        }
        self.ops.push(ShuntOp {
            typ: ShuntOpTyp::Operator(o1),
            loc,
        });
    }

    /// Outputs operators until the innermost open parenthesis, leaving it on
    /// the stack.
    fn unwind_to_paren(&mut self) {
        while let Some(op) = self.ops.last() {
            if let ShuntOpTyp::OpenParen = op.typ {
                break;
            }
            if let Some(op) = self.ops.pop() {
                self.out.push(op.into_output());
            }
        }
    }
}

pub fn parse(lex: Lexer<'_>, known: &HashSet<String>) -> Result<Program, ParseErr> {
    let mut shunt = Shunt::default();
    let mut last = Last::Nothing;

    for tok in lex {
        let tok = tok?;

        // implicit multiplication, as in "2x" or "(x+1)(x-1)"
        let starts_operand = matches!(
            tok.typ,
            TokTyp::Number | TokTyp::Ident | TokTyp::OpenParen
        );
        let ends_operand = matches!(last, Last::Number | Last::Operand);
        let both_numbers = last == Last::Number && tok.typ == TokTyp::Number;
        if starts_operand && ends_operand && !both_numbers {
            let loc = SubStr::new(tok.loc.src(), tok.loc.start(), 0);
            shunt.push_operator(OperatorTyp::Mul, loc);
        }

        last = match tok.typ {
            TokTyp::Number => {
                let num: Number = match tok.loc.get().parse() {
                    Ok(val) => val,
                    Err(err) => {
                        return Err(ParseErr {
                            typ: ParseErrTyp::ParseNum(err),
                            loc: tok.loc,
                        })
                    }
                };
                shunt.out.push(Operation {
                    typ: OperationTyp::Val(num),
                    loc: tok.loc,
                });
                Last::Number
            }

            TokTyp::Ident => match resolve(tok.loc.get(), known) {
                Some(Resolved::Fun(fun)) => {
                    shunt.ops.push(ShuntOp {
                        typ: ShuntOpTyp::Fun(fun),
                        loc: tok.loc,
                    });
                    Last::Other
                }
                Some(Resolved::Var) => {
                    shunt.out.push(Operation {
                        typ: OperationTyp::Var,
                        loc: tok.loc,
                    });
                    Last::Operand
                }
                Some(Resolved::Const(val)) => {
                    shunt.out.push(Operation {
                        typ: OperationTyp::Val(val),
                        loc: tok.loc,
                    });
                    Last::Operand
                }
                None => {
                    return Err(ParseErr {
                        typ: ParseErrTyp::UnknownIdent,
                        loc: tok.loc,
                    })
                }
            },

            TokTyp::Op(o1) => {
                shunt.push_operator(o1, tok.loc);
                Last::Other
            }

            TokTyp::Comma => {
                shunt.unwind_to_paren();
                Last::Other
            }

            TokTyp::OpenParen => {
                shunt.ops.push(ShuntOp {
                    typ: ShuntOpTyp::OpenParen,
                    loc: tok.loc,
                });
                Last::Other
            }

            TokTyp::CloseParen => {
                shunt.unwind_to_paren();

                if shunt.ops.pop().is_none() {
                    return Err(ParseErr {
                        typ: ParseErrTyp::ParenMismatch,
                        loc: tok.loc,
                    });
                }

                // handle functions
                if let Some(ShuntOpTyp::Fun(_)) = shunt.ops.last().map(|op| op.typ) {
                    if let Some(op) = shunt.ops.pop() {
                        shunt.out.push(op.into_output());
                    }
                }
                Last::Operand
            }

            TokTyp::XGreater
            | TokTyp::XLess
            | TokTyp::XEqual
            | TokTyp::XPipe
            | TokTyp::XOpenSquareBracket
            | TokTyp::XCloseSquareBracket
            | TokTyp::XOpenCurly
            | TokTyp::XCloseCurly => {
                return Err(ParseErr {
                    typ: ParseErrTyp::LexErr(LexErrTyp::Unsupported(tok.typ)),
                    loc: tok.loc,
                })
            }
        };
    }

    while let Some(op) = shunt.ops.pop() {
        if let ShuntOpTyp::OpenParen = op.typ {
            return Err(ParseErr {
                typ: ParseErrTyp::ParenMismatch,
                loc: op.loc,
            });
        }
        shunt.out.push(op.into_output());
    }

    Ok(Program::new(shunt.out))
}
