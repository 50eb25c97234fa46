// SPDX: CC0-1.0

use crate::{
    compile::Expr,
    equation::{Equation, Slot, ValidationErr},
    polar::Polar,
    vars::VarEnv,
    Number, Point,
};
use core::{fmt, iter::FusedIterator, str::FromStr};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

/// Iteration identifier of explicit `y = f(x)` plots.
pub const X: &str = "x";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlotMode {
    /// `y = f(x)`
    #[default]
    #[serde(rename = "YPlot")]
    Y,
    /// `(x, y) = f(param)`
    #[serde(rename = "XYPlot")]
    Xy,
    /// `r = f(theta)`
    #[serde(rename = "RPlot")]
    R,
    /// `theta = f(radius)`
    #[serde(rename = "TPlot")]
    T,
}

impl PlotMode {
    pub const fn exhaustive() -> &'static [PlotMode] {
        &[Self::Y, Self::Xy, Self::R, Self::T]
    }

    pub const fn name(&self) -> &'static str {
        match self {
            Self::Y => "YPlot",
            Self::Xy => "XYPlot",
            Self::R => "RPlot",
            Self::T => "TPlot",
        }
    }
}

impl fmt::Display for PlotMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("unknown plot mode '{0}'")]
pub struct UnknownPlotMode(pub String);

impl FromStr for PlotMode {
    type Err = UnknownPlotMode;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Self::exhaustive()
            .iter()
            .find(|mode| mode.name().eq_ignore_ascii_case(s))
            .copied()
            .ok_or_else(|| UnknownPlotMode(s.to_string()))
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum PlotErr {
    #[error("{slot} expression '{expr}' uses variable '{name}', which is not declared")]
    Unresolved {
        slot: Slot,
        expr: String,
        name: String,
    },
}

impl From<PlotErr> for ValidationErr {
    fn from(err: PlotErr) -> Self {
        ValidationErr::new(err.to_string())
    }
}

#[derive(Clone, Debug)]
enum Kind {
    Y(Expr),
    Xy(Expr, Expr),
    R(Expr),
    T(Expr),
}

impl Kind {
    fn exprs(&self) -> Vec<(Slot, &Expr)> {
        match self {
            Self::Y(y) => vec![(Slot::Y, y)],
            Self::Xy(x, y) => vec![(Slot::X, x), (Slot::Y, y)],
            Self::R(r) => vec![(Slot::R, r)],
            Self::T(t) => vec![(Slot::T, t)],
        }
    }
}

/// A lazily generated sequence of points.
///
/// Owns a copy of the variables and expressions it was created from, so it
/// is unaffected by later changes to the [`Equation`].
#[derive(Clone, Debug)]
pub struct Plot {
    kind: Kind,
    env: VarEnv,
    bind: String,
    start: Number,
    end: Number,
    step: Number,
    idx: u64,
    stack: Vec<Number>,
    done: bool,
}

fn eval_or_nan(slot: Slot, expr: &Expr, env: &VarEnv, stack: &mut Vec<Number>) -> Number {
    match expr.eval(env, stack) {
        Ok(val) => val,
        Err(err) => {
            warn!(%slot, expr = %expr, %err, "evaluation failed during plot");
            Number::NAN
        }
    }
}

impl Plot {
    /// Name the current range value is bound to.
    pub fn bind(&self) -> &str {
        &self.bind
    }
}

impl Iterator for Plot {
    type Item = Point<Number>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        // multiplying rather than accumulating keeps the last value exact
        let value = self.start + self.step * (self.idx as Number);
        if value > self.end || value.is_nan() {
            self.done = true;
            return None;
        }
        self.idx += 1;

        self.env.set(&self.bind, value);
        let (env, stack) = (&self.env, &mut self.stack);
        let point = match &self.kind {
            Kind::Y(y) => Point {
                x: value,
                y: eval_or_nan(Slot::Y, y, env, stack),
            },
            Kind::Xy(x, y) => Point {
                x: eval_or_nan(Slot::X, x, env, stack),
                y: eval_or_nan(Slot::Y, y, env, stack),
            },
            Kind::R(r) => Polar::new(eval_or_nan(Slot::R, r, env, stack), value).to_point(),
            Kind::T(t) => Polar::new(value, eval_or_nan(Slot::T, t, env, stack)).to_point(),
        };
        Some(point)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.done {
            return (0, Some(0));
        }
        let total = ((self.end - self.start) / self.step).floor() + 1.0;
        let left = (total - self.idx as Number).max(0.0) as usize;
        // rounding in the bound check may admit or drop the last value
        (left.saturating_sub(1), Some(left + 1))
    }
}

impl FusedIterator for Plot {}

impl Equation {
    fn start_plot(&mut self, mode: PlotMode) -> Result<Plot, PlotErr> {
        let (kind, bind) = match mode {
            PlotMode::Y => (Kind::Y(self.y.clone()), X.to_string()),
            PlotMode::Xy => (Kind::Xy(self.x.clone(), self.y.clone()), self.param.clone()),
            PlotMode::R => (Kind::R(self.r.clone()), self.theta.clone()),
            PlotMode::T => (Kind::T(self.t.clone()), self.radius.clone()),
        };

        // every binding is known up front, so fail before producing anything
        for (slot, expr) in kind.exprs() {
            if let Some(name) = expr.first_unresolved(&self.vars) {
                return Err(PlotErr::Unresolved {
                    slot,
                    expr: expr.src().to_string(),
                    name: name.to_string(),
                });
            }
        }

        self.mode = mode;
        let range = &self.range;
        debug!(
            %mode,
            bind = %bind,
            start = range.start.value,
            end = range.end.value,
            step = range.step.value,
            "starting plot"
        );
        Ok(Plot {
            kind,
            env: self.vars.clone(),
            bind,
            start: range.start.value,
            end: range.end.value,
            step: range.step.value,
            idx: 0,
            stack: Vec::new(),
            done: false,
        })
    }

    /// `y = f(x)`: binds each range value to `x` and yields `(x, y)`.
    pub fn y_plot(&mut self) -> Result<Plot, PlotErr> {
        self.start_plot(PlotMode::Y)
    }

    /// `(x, y) = f(param)`: binds each range value to the parameter name and
    /// yields the x and y expressions.
    pub fn xy_plot(&mut self) -> Result<Plot, PlotErr> {
        self.start_plot(PlotMode::Xy)
    }

    /// `r = f(theta)`: sweeps the range as an angle.
    pub fn r_plot(&mut self) -> Result<Plot, PlotErr> {
        self.start_plot(PlotMode::R)
    }

    /// `theta = f(r)`: sweeps the range as a radius.
    pub fn t_plot(&mut self) -> Result<Plot, PlotErr> {
        self.start_plot(PlotMode::T)
    }

    /// Plots in the current [`PlotMode`].
    pub fn plot(&mut self) -> Result<Plot, PlotErr> {
        self.start_plot(self.mode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn y_plot_binds_x() {
        let mut eq = Equation::new();
        eq.set_y_expression("x^2").unwrap();
        eq.set_range_start("-2").unwrap();
        eq.set_range_end("2").unwrap();
        eq.set_range_step("1").unwrap();
        let points: Vec<_> = eq.y_plot().unwrap().collect();
        let expected: Vec<_> = [(-2.0, 4.0), (-1.0, 1.0), (0.0, 0.0), (1.0, 1.0), (2.0, 4.0)]
            .into_iter()
            .map(|(x, y)| Point { x, y })
            .collect();
        assert_eq!(points, expected);
        assert_eq!(eq.plot_mode(), PlotMode::Y);
    }

    #[test]
    fn plotting_leaves_variables_alone() {
        let mut eq = Equation::new();
        eq.set_y_expression("x").unwrap();
        eq.set_var("x", 42.0);
        assert_eq!(eq.y_plot().unwrap().count(), 41);
        assert_eq!(eq.var("x"), Some(42.0));
    }

    #[test]
    fn plot_is_a_snapshot() {
        let mut eq = Equation::new();
        eq.set_var("k", 1.0);
        eq.set_y_expression("k").unwrap();
        let plot = eq.y_plot().unwrap();
        eq.set_var("k", 5.0);
        eq.set_y_expression("0").unwrap();
        assert!(plot.map(|p| p.y).all(|y| y == 1.0));
    }

    #[test]
    fn empty_when_start_exceeds_end() {
        let mut eq = Equation::new();
        eq.set_range_start("2").unwrap();
        eq.set_range_end("1").unwrap();
        let mut plot = eq.y_plot().unwrap();
        assert_eq!(plot.next(), None);
        assert_eq!(plot.next(), None);
    }

    #[test]
    fn t_plot_sweeps_radius() {
        let mut eq = Equation::new();
        eq.set_var("r", 0.0);
        eq.set_t_expression("pi/2").unwrap();
        eq.set_range_start("0").unwrap();
        eq.set_range_end("3").unwrap();
        eq.set_range_step("1").unwrap();
        let points: Vec<_> = eq.t_plot().unwrap().collect();
        assert_eq!(points.len(), 4);
        for (i, p) in points.iter().enumerate() {
            assert!(p.x.abs() < 1e-9);
            assert!((p.y - i as Number).abs() < 1e-9);
        }
    }

    #[test]
    fn configured_names_drive_binding() {
        let mut eq = Equation::new();
        eq.set_var("theta", 0.0);
        eq.set_theta_name("theta");
        eq.set_r_expression("theta").unwrap();
        eq.set_range_start("1").unwrap();
        eq.set_range_end("1").unwrap();
        let points: Vec<_> = eq.r_plot().unwrap().collect();
        assert_eq!(points.len(), 1);
        assert!((points[0].x - 1f64.cos()).abs() < 1e-12);
        assert!((points[0].y - 1f64.sin()).abs() < 1e-12);
    }

    #[test]
    fn removed_iteration_variable_is_unresolved() {
        let mut eq = Equation::new();
        eq.set_x_expression("2t").unwrap();
        eq.remove_var("t");
        let err = eq.xy_plot().unwrap_err();
        assert_eq!(
            err,
            PlotErr::Unresolved {
                slot: Slot::X,
                expr: String::from("2t"),
                name: String::from("t"),
            }
        );
        // mode is only recorded for plots that start
        assert_eq!(eq.plot_mode(), PlotMode::Y);
    }

    #[test]
    fn plot_dispatches_on_mode() {
        let mut eq = Equation::new();
        eq.set_x_expression("0").unwrap();
        eq.set_plot_mode(PlotMode::Xy);
        assert!(eq.plot().unwrap().all(|p| p == Point { x: 0.0, y: 1.0 }));
    }

    #[test]
    fn size_hint_brackets_count() {
        let mut eq = Equation::new();
        let plot = eq.y_plot().unwrap();
        let (lo, hi) = plot.size_hint();
        let n = plot.count();
        assert!(lo <= n && Some(n) <= hi, "{lo} {n} {hi:?}");
    }

    #[test]
    fn mode_names() {
        for mode in PlotMode::exhaustive() {
            assert_eq!(mode.to_string().parse::<PlotMode>(), Ok(*mode));
        }
        assert_eq!("xyplot".parse::<PlotMode>(), Ok(PlotMode::Xy));
        assert!("zplot".parse::<PlotMode>().is_err());
    }
}
