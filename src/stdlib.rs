// SPDX: CC0-1.0

use crate::{eval::*, Number};
use core::f64::consts;
use std::{collections::HashMap, sync::OnceLock}; // assumes Number = f64

pub type Builtins = HashMap<&'static str, Ident>;

/// Functions and constants every expression can use without declaring them.
pub fn builtins() -> &'static Builtins {
    static BUILTINS: OnceLock<Builtins> = OnceLock::new();
    BUILTINS.get_or_init(standard_idents)
}

fn standard_idents() -> Builtins {
    let mut ret = HashMap::new();

    // operators
    for op in [
        OperatorTyp::Neg,
        OperatorTyp::Pos,
        OperatorTyp::Add,
        OperatorTyp::Sub,
        OperatorTyp::Mul,
        OperatorTyp::Div,
        OperatorTyp::Rem,
        OperatorTyp::Pow,
    ] {
        let (name, fun) = op.fun();
        ret.insert(name, Ident::Fun(fun));
    }

    ret.insert("abs", Ident::Fun(Fun::new(1, abs)));
    ret.insert("sqrt", Ident::Fun(Fun::new(1, sqrt)));
    ret.insert("cbrt", Ident::Fun(Fun::new(1, cbrt)));
    ret.insert("exp", Ident::Fun(Fun::new(1, exp)));
    ret.insert("ln", Ident::Fun(Fun::new(1, ln)));
    ret.insert("log", Ident::Fun(Fun::new(2, log)));
    ret.insert("log10", Ident::Fun(Fun::new(1, log10)));
    ret.insert("log2", Ident::Fun(Fun::new(1, log2)));
    ret.insert("floor", Ident::Fun(Fun::new(1, floor)));
    ret.insert("ceil", Ident::Fun(Fun::new(1, ceil)));
    ret.insert("signum", Ident::Fun(Fun::new(1, signum)));
    ret.insert("min", Ident::Fun(Fun::new(2, min)));
    ret.insert("max", Ident::Fun(Fun::new(2, max)));

    // trig
    ret.insert("sin", Ident::Fun(Fun::new(1, sin)));
    ret.insert("cos", Ident::Fun(Fun::new(1, cos)));
    ret.insert("tan", Ident::Fun(Fun::new(1, tan)));
    ret.insert("sec", Ident::Fun(Fun::new(1, sec)));
    ret.insert("csc", Ident::Fun(Fun::new(1, csc)));
    ret.insert("cot", Ident::Fun(Fun::new(1, cot)));
    ret.insert("asin", Ident::Fun(Fun::new(1, arcsin)));
    ret.insert("acos", Ident::Fun(Fun::new(1, arccos)));
    ret.insert("atan", Ident::Fun(Fun::new(1, arctan)));
    ret.insert("arcsin", Ident::Fun(Fun::new(1, arcsin)));
    ret.insert("arccos", Ident::Fun(Fun::new(1, arccos)));
    ret.insert("arctan", Ident::Fun(Fun::new(1, arctan)));
    ret.insert("sinh", Ident::Fun(Fun::new(1, sinh)));
    ret.insert("cosh", Ident::Fun(Fun::new(1, cosh)));
    ret.insert("tanh", Ident::Fun(Fun::new(1, tanh)));
    ret.insert("toDegrees", Ident::Fun(Fun::new(1, to_degrees)));
    ret.insert("toRadians", Ident::Fun(Fun::new(1, to_radians)));

    ret.insert("pi", Ident::Const(consts::PI));
    ret.insert("tau", Ident::Const(consts::TAU));
    ret.insert("e", Ident::Const(consts::E));
    ret
}

#[track_caller]
fn expect_n<const N: usize>(args: &[Number]) -> [Number; N] {
    assert_eq!(args.len(), N);
    let mut ret = [0.0; N];
    ret.copy_from_slice(args);
    ret
}

pub fn neg(args: &[Number]) -> Number {
    let [x] = expect_n::<1>(args);
    -x
}

pub fn pos(args: &[Number]) -> Number {
    let [x] = expect_n::<1>(args);
    x
}

pub fn add(args: &[Number]) -> Number {
    let [x, y] = expect_n::<2>(args);
    x + y
}

pub fn sub(args: &[Number]) -> Number {
    let [x, y] = expect_n::<2>(args);
    x - y
}

pub fn mul(args: &[Number]) -> Number {
    let [x, y] = expect_n::<2>(args);
    x * y
}

pub fn div(args: &[Number]) -> Number {
    let [x, y] = expect_n::<2>(args);
    x / y
}

pub fn rem(args: &[Number]) -> Number {
    let [x, y] = expect_n::<2>(args);
    x % y
}

pub fn pow(args: &[Number]) -> Number {
    let [x, exp] = expect_n::<2>(args);
    x.powf(exp)
}

pub fn abs(args: &[Number]) -> Number {
    let [x] = expect_n::<1>(args);
    x.abs()
}

pub fn sqrt(args: &[Number]) -> Number {
    let [x] = expect_n::<1>(args);
    x.sqrt()
}

pub fn cbrt(args: &[Number]) -> Number {
    let [x] = expect_n::<1>(args);
    x.cbrt()
}

pub fn exp(args: &[Number]) -> Number {
    let [x] = expect_n::<1>(args);
    x.exp()
}

pub fn ln(args: &[Number]) -> Number {
    let [x] = expect_n::<1>(args);
    x.ln()
}

pub fn log(args: &[Number]) -> Number {
    let [x, base] = expect_n::<2>(args);
    x.log(base)
}

pub fn log10(args: &[Number]) -> Number {
    let [x] = expect_n::<1>(args);
    x.log10()
}

pub fn log2(args: &[Number]) -> Number {
    let [x] = expect_n::<1>(args);
    x.log2()
}

pub fn floor(args: &[Number]) -> Number {
    let [x] = expect_n::<1>(args);
    x.floor()
}

pub fn ceil(args: &[Number]) -> Number {
    let [x] = expect_n::<1>(args);
    x.ceil()
}

pub fn signum(args: &[Number]) -> Number {
    let [x] = expect_n::<1>(args);
    if x == 0.0 {
        0.0
    } else {
        x.signum()
    }
}

pub fn min(args: &[Number]) -> Number {
    let [x, y] = expect_n::<2>(args);
    x.min(y)
}

pub fn max(args: &[Number]) -> Number {
    let [x, y] = expect_n::<2>(args);
    x.max(y)
}

pub fn sin(args: &[Number]) -> Number {
    let [x] = expect_n::<1>(args);
    x.sin()
}

pub fn cos(args: &[Number]) -> Number {
    let [x] = expect_n::<1>(args);
    x.cos()
}

pub fn tan(args: &[Number]) -> Number {
    let [x] = expect_n::<1>(args);
    x.tan()
}

pub fn sec(args: &[Number]) -> Number {
    let [x] = expect_n::<1>(args);
    x.cos().recip()
}

pub fn csc(args: &[Number]) -> Number {
    let [x] = expect_n::<1>(args);
    x.sin().recip()
}

pub fn cot(args: &[Number]) -> Number {
    let [x] = expect_n::<1>(args);
    x.tan().recip()
}

pub fn arcsin(args: &[Number]) -> Number {
    let [x] = expect_n::<1>(args);
    x.asin()
}

pub fn arccos(args: &[Number]) -> Number {
    let [x] = expect_n::<1>(args);
    x.acos()
}

pub fn arctan(args: &[Number]) -> Number {
    let [x] = expect_n::<1>(args);
    x.atan()
}

pub fn sinh(args: &[Number]) -> Number {
    let [x] = expect_n::<1>(args);
    x.sinh()
}

pub fn cosh(args: &[Number]) -> Number {
    let [x] = expect_n::<1>(args);
    x.cosh()
}

pub fn tanh(args: &[Number]) -> Number {
    let [x] = expect_n::<1>(args);
    x.tanh()
}

pub fn to_degrees(args: &[Number]) -> Number {
    let [x] = expect_n::<1>(args);
    x.to_degrees()
}

pub fn to_radians(args: &[Number]) -> Number {
    let [x] = expect_n::<1>(args);
    x.to_radians()
}
