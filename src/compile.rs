// SPDX: CC0-1.0

use crate::{
    eval::{self, EvalErr, EvalErrTyp, Ident, Operation, OperationTyp, Program},
    lex::{LexErrTyp, Lexer, SubStr, TokTyp},
    parse::{self, ParseErr, ParseErrTyp},
    stdlib,
    vars::VarEnv,
    Number,
};
use core::fmt;
use std::{collections::HashSet, panic, sync::Arc};
use thiserror::Error;
use tracing::{trace, warn};

/// A successfully compiled expression.
///
/// The program only remembers which names it loads; their values are read
/// from whichever [`VarEnv`] it is evaluated against.
#[derive(Clone, Debug)]
pub struct Expr {
    src: Arc<String>,
    prog: Program,
}

impl Expr {
    /// An expression that always evaluates to `value`, written as its
    /// shortest decimal form.
    pub fn literal(value: Number) -> Self {
        let src = Arc::new(value.to_string());
        let prog = Program::new(vec![Operation {
            typ: OperationTyp::Val(value),
            loc: SubStr::all(Arc::clone(&src)),
        }]);
        Self { src, prog }
    }

    pub fn src(&self) -> &str {
        &self.src
    }

    pub fn program(&self) -> &Program {
        &self.prog
    }

    pub fn var_names(&self) -> Vec<&str> {
        self.prog.var_names()
    }

    /// First variable this expression needs that `env` does not declare.
    pub fn first_unresolved<'a>(&'a self, env: &VarEnv) -> Option<&'a str> {
        self.var_names().into_iter().find(|name| !env.contains(name))
    }

    pub fn eval(&self, env: &VarEnv, stack: &mut Vec<Number>) -> Result<Number, EvalErr> {
        eval::eval(&self.prog, env, stack)
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.src)
    }
}

#[derive(Debug, Error)]
pub enum CompileErrTyp {
    #[error("parse error: {0}")]
    Parse(ParseErrTyp),
    #[error("invalid expression: {0}")]
    Eval(EvalErrTyp),
    #[error("unexpected internal error: {0}")]
    Internal(String),
}

#[derive(Debug, Error)]
#[error("{typ}")]
pub struct CompileErr {
    pub typ: CompileErrTyp,
    pub src: Arc<String>,
    pub loc: Option<SubStr>,
    known: HashSet<String>,
}

impl CompileErr {
    /// Human readable diagnostics: the error itself, the offending source
    /// underlined when a location is known, then any hints.
    pub fn messages(&self) -> Vec<String> {
        let mut ret = vec![self.to_string()];

        let src = self.src.as_str();
        match self.loc {
            Some(ref loc) => {
                ret.push(src.to_string());
                ret.push(loc.underline());
            }
            None if !src.trim().is_empty() => {
                ret.push(src.to_string());
                ret.push(SubStr::new(Arc::clone(&self.src), src.len(), 0).underline());
            }
            None => {}
        }

        ret.extend(self.notes());
        ret
    }

    fn notes(&self) -> Vec<String> {
        let note = |s: &str| vec![format!("note: {s}")];
        match &self.typ {
            CompileErrTyp::Parse(ParseErrTyp::LexErr(LexErrTyp::InvalidChar)) => note(
                "available tokens are numbers, identifiers, and symbols +-*/%^,()",
            ),

            CompileErrTyp::Parse(ParseErrTyp::LexErr(LexErrTyp::Unsupported(typ))) => {
                match typ {
                    TokTyp::XGreater | TokTyp::XLess => {
                        note("expected an expression but found an inequality")
                    }
                    TokTyp::XEqual => note("expected an expression but found an equation"),
                    TokTyp::XPipe => note("use the 'abs' function to compute absolute value"),
                    _ => vec![],
                }
            }

            CompileErrTyp::Parse(ParseErrTyp::ParseNum(_)) => {
                note("parsing as floating point number")
            }

            CompileErrTyp::Parse(ParseErrTyp::UnknownIdent) => match self.loc {
                Some(ref loc) => self.similar_name(loc.get()).into_iter().collect(),
                None => vec![],
            },

            CompileErrTyp::Eval(EvalErrTyp::StackMismatch { .. }) => {
                note("exactly 1 final value is expected, is an operator or comma misplaced?")
            }

            CompileErrTyp::Parse(ParseErrTyp::ParenMismatch)
            | CompileErrTyp::Eval(_)
            | CompileErrTyp::Internal(_) => vec![],
        }
    }

    fn similar_name(&self, text: &str) -> Option<String> {
        let text = text.to_ascii_lowercase();
        let builtins = stdlib::builtins().iter().map(|(name, ident)| {
            let typ = match ident {
                Ident::Const(_) => "constant",
                Ident::Fun(_) => "function",
            };
            (*name, typ)
        });
        let vars = self.known.iter().map(|name| (name.as_str(), "variable"));
        let (sim, (name, typ)) = builtins
            .chain(vars)
            .map(|(name, typ)| {
                (
                    strsim::normalized_damerau_levenshtein(&text, &name.to_ascii_lowercase()),
                    (name, typ),
                )
            })
            .reduce(|(acc_sim, acc), (elem_sim, elem)| {
                if elem_sim > acc_sim {
                    (elem_sim, elem)
                } else {
                    (acc_sim, acc)
                }
            })?;
        (sim > 0.3).then(|| format!("note: {typ} '{name}' has a similar name"))
    }
}

type Staged = Result<Program, (CompileErrTyp, Option<SubStr>)>;

/// Runs a compile stage, turning a panic inside it into
/// [`CompileErrTyp::Internal`]. The panic hook still runs first, so the
/// panic message is also printed to stderr.
fn guarded<F>(src: &Arc<String>, known: &HashSet<String>, stage: F) -> Result<Program, CompileErr>
where
    F: FnOnce() -> Staged + panic::UnwindSafe,
{
    let fail = |typ, loc| CompileErr {
        typ,
        src: Arc::clone(src),
        loc,
        known: known.clone(),
    };

    match panic::catch_unwind(stage) {
        Ok(Ok(prog)) => Ok(prog),
        Ok(Err((typ, loc))) => Err(fail(typ, loc)),
        Err(payload) => {
            let msg = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| String::from("unknown panic"));
            warn!(src = %src, %msg, "expression compiler panicked");
            Err(fail(CompileErrTyp::Internal(msg), None))
        }
    }
}

/// Compiles `src`, accepting only identifiers that are builtins or members of
/// `known`.
pub fn compile(src: &str, known: &HashSet<String>) -> Result<Expr, CompileErr> {
    let src = Arc::new(src.to_string());

    let prog = guarded(&src, known, || -> Staged {
        let prog = parse::parse(Lexer::new(&src), known).map_err(
            |ParseErr { typ, loc }| (CompileErrTyp::Parse(typ), Some(loc)),
        )?;
        eval::check(&prog).map_err(|EvalErr { typ, op }| {
            (CompileErrTyp::Eval(typ), op.map(|op| op.loc))
        })?;
        Ok(prog)
    })?;

    trace!(src = %src, ops = prog.ops().len(), "compiled expression");
    Ok(Expr { src, prog })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn known() -> HashSet<String> {
        VarEnv::default().names()
    }

    #[test]
    fn compiled_expression_reads_values_at_eval_time() {
        let mut env = VarEnv::default();
        let expr = compile("2x + a", &env.names()).unwrap();
        assert_eq!(expr.src(), "2x + a");
        assert_eq!(expr.var_names(), ["x", "a"]);

        let mut stack = Vec::new();
        env.set("x", 2.0);
        env.set("a", 1.0);
        assert_eq!(expr.eval(&env, &mut stack).unwrap(), 5.0);
        env.set("a", -4.0);
        assert_eq!(expr.eval(&env, &mut stack).unwrap(), 0.0);

        env.remove("a");
        assert_eq!(expr.first_unresolved(&env), Some("a"));
    }

    #[test]
    fn literal_round_trips_through_its_source() {
        let expr = Expr::literal(1.0);
        assert_eq!(expr.src(), "1");
        assert_eq!(expr.eval(&VarEnv::empty(), &mut Vec::new()).unwrap(), 1.0);
        assert!(expr.var_names().is_empty());
    }

    #[test]
    fn empty_and_blank_sources_fail() {
        for src in ["", "   ", "()"] {
            let err = compile(src, &known()).unwrap_err();
            assert!(matches!(err.typ, CompileErrTyp::Eval(EvalErrTyp::Empty)), "{src:?}");
            assert!(!err.messages().is_empty());
        }
    }

    #[test]
    fn arity_is_checked_before_install() {
        let err = compile("log(2)", &known()).unwrap_err();
        assert!(matches!(
            err.typ,
            CompileErrTyp::Eval(EvalErrTyp::MissingArgs { arity: 2, found: 1, .. })
        ));

        let err = compile("sin(1, 2)", &known()).unwrap_err();
        assert!(matches!(
            err.typ,
            CompileErrTyp::Eval(EvalErrTyp::StackMismatch { .. })
        ));
        assert!(err.messages().iter().any(|msg| msg.starts_with("note:")));

        assert!(compile("1 +", &known()).is_err());
        assert!(compile("1 2", &known()).is_err());
    }

    #[test]
    fn unknown_identifier_suggests_similar_name() {
        let err = compile("sni(x)", &known()).unwrap_err();
        let messages = err.messages();
        assert_eq!(messages[0], "parse error: unknown identifier");
        assert_eq!(messages[1], "sni(x)");
        assert_eq!(messages[2], "^^^");
        assert!(
            messages.iter().any(|msg| msg == "note: function 'sin' has a similar name"),
            "{messages:?}"
        );
    }

    #[test]
    fn unsupported_tokens_get_hints() {
        let err = compile("y = 2x", &known()).unwrap_err();
        assert!(err
            .messages()
            .contains(&String::from("note: expected an expression but found an equation")));

        let err = compile("|x|", &known()).unwrap_err();
        assert!(err
            .messages()
            .contains(&String::from("note: use the 'abs' function to compute absolute value")));
    }

    #[test]
    fn internal_faults_become_errors() {
        let src = Arc::new(String::from("x"));
        let err = guarded(&src, &known(), || -> Staged { panic!("stack underflow") })
            .unwrap_err();
        assert!(
            matches!(&err.typ, CompileErrTyp::Internal(msg) if msg == "stack underflow"),
            "{err:?}"
        );
        assert!(err.loc.is_none());
        let messages = err.messages();
        assert_eq!(messages[0], "unexpected internal error: stack underflow");
        assert_eq!(messages[1], "x");

        let err = guarded(&src, &known(), || -> Staged {
            panic!("{} operands", 3)
        })
        .unwrap_err();
        assert!(matches!(&err.typ, CompileErrTyp::Internal(msg) if msg == "3 operands"));
    }

    #[test]
    fn only_known_variables_compile() {
        let mut names = known();
        assert!(compile("k + x", &names).is_err());
        names.insert(String::from("k"));
        assert!(compile("k + x", &names).is_ok());
    }
}
