// SPDX: CC0-1.0

//! Equation engine for plotting on the Cartesian plane.
//!
//! An [`Equation`] owns a set of user variables, four expression slots and an
//! iteration range, and lazily generates points for explicit (`y = f(x)`),
//! parametric (`(x, y) = f(t)`) and polar (`r = f(θ)`, `θ = f(r)`) plots.

pub mod compile;
pub mod equation;
pub mod eval;
pub mod lex;
pub mod parse;
pub mod plot;
pub mod polar;
pub mod shell;
pub mod stdlib;
pub mod vars;

pub use equation::{Equation, EquationSnapshot, Slot, ValidationErr};
pub use plot::{Plot, PlotErr, PlotMode};
pub use polar::Polar;
pub use vars::VarEnv;

use core::fmt;

pub type Number = f64;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Point<T> {
    pub x: T,
    pub y: T,
}

impl<T: fmt::Display> fmt::Display for Point<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(precision) = f.precision() {
            write!(f, "({:.*}, {:.*})", precision, self.x, precision, self.y)
        } else {
            write!(f, "({}, {})", self.x, self.y)
        }
    }
}
