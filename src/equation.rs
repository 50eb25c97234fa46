// SPDX: CC0-1.0

use crate::{
    compile::{self, CompileErr, Expr},
    plot::PlotMode,
    vars::{self, VarEnv},
    Number,
};
use core::{fmt, str::FromStr};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use thiserror::Error;
use tracing::debug;

pub const DEFAULT_NAME: &str = "New Equation";
pub const DEFAULT_EXPR: Number = 1.0;
pub const DEFAULT_RANGE_START: Number = -1.0;
pub const DEFAULT_RANGE_END: Number = 1.0;
pub const DEFAULT_RANGE_STEP: Number = 0.05;
pub const DEFAULT_PARAM_NAME: &str = "t";
pub const DEFAULT_RADIUS_NAME: &str = "r";
pub const DEFAULT_THETA_NAME: &str = "t";
pub const DEFAULT_PRECISION: u8 = 3;

/// Rejected input. Always carries at least one message.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("{}", .messages.join("\n"))]
pub struct ValidationErr {
    pub messages: Vec<String>,
}

impl ValidationErr {
    pub fn new(msg: impl Into<String>) -> Self {
        Self {
            messages: vec![msg.into()],
        }
    }

    /// Prefixes the headline with what was being validated.
    pub fn context(mut self, what: impl fmt::Display) -> Self {
        match self.messages.first_mut() {
            Some(first) => *first = format!("{what}: {first}"),
            None => self.messages.push(what.to_string()),
        }
        self
    }
}

impl From<CompileErr> for ValidationErr {
    fn from(err: CompileErr) -> Self {
        Self {
            messages: err.messages(),
        }
    }
}

/// One of the four expression roles of an equation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Slot {
    X,
    Y,
    R,
    T,
}

impl Slot {
    pub const fn exhaustive() -> &'static [Slot] {
        &[Self::X, Self::Y, Self::R, Self::T]
    }

    pub const fn name(&self) -> &'static str {
        match self {
            Self::X => "x",
            Self::Y => "y",
            Self::R => "r",
            Self::T => "t",
        }
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("unknown expression '{0}', expected one of x, y, r, t")]
pub struct UnknownSlot(pub String);

impl FromStr for Slot {
    type Err = UnknownSlot;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Self::exhaustive()
            .iter()
            .find(|slot| slot.name().eq_ignore_ascii_case(s))
            .copied()
            .ok_or_else(|| UnknownSlot(s.to_string()))
    }
}

/// A range endpoint or step: the value together with the text it was
/// evaluated from.
#[derive(Clone, Debug, PartialEq)]
pub struct Bound {
    pub value: Number,
    pub expr: String,
}

impl Bound {
    fn literal(value: Number) -> Self {
        Self {
            value,
            expr: value.to_string(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum BoundKind {
    Start,
    End,
    Step,
}

impl fmt::Display for BoundKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Start => write!(f, "range start"),
            Self::End => write!(f, "range end"),
            Self::Step => write!(f, "range step"),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Range {
    pub start: Bound,
    pub end: Bound,
    pub step: Bound,
}

impl Default for Range {
    fn default() -> Self {
        Self {
            start: Bound::literal(DEFAULT_RANGE_START),
            end: Bound::literal(DEFAULT_RANGE_END),
            step: Bound::literal(DEFAULT_RANGE_STEP),
        }
    }
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{start} to {end} by {step}",
            start = self.start.expr,
            end = self.end.expr,
            step = self.step.expr
        )
    }
}

#[derive(Clone, Debug)]
pub struct Equation {
    name: String,
    pub(crate) vars: VarEnv,
    pub(crate) x: Expr,
    pub(crate) y: Expr,
    pub(crate) r: Expr,
    pub(crate) t: Expr,
    pub(crate) range: Range,
    pub(crate) param: String,
    pub(crate) radius: String,
    pub(crate) theta: String,
    precision: u8,
    pub(crate) mode: PlotMode,
}

impl Default for Equation {
    fn default() -> Self {
        Self::new()
    }
}

impl Equation {
    pub fn new() -> Self {
        Self {
            name: String::from(DEFAULT_NAME),
            vars: VarEnv::default(),
            x: Expr::literal(DEFAULT_EXPR),
            y: Expr::literal(DEFAULT_EXPR),
            r: Expr::literal(DEFAULT_EXPR),
            t: Expr::literal(DEFAULT_EXPR),
            range: Range::default(),
            param: String::from(DEFAULT_PARAM_NAME),
            radius: String::from(DEFAULT_RADIUS_NAME),
            theta: String::from(DEFAULT_THETA_NAME),
            precision: DEFAULT_PRECISION,
            mode: PlotMode::default(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    // variables

    pub fn set_var(&mut self, name: &str, value: Number) {
        debug!(name, value, "set variable");
        self.vars.set(name, value);
    }

    /// Removes a variable. Expressions already compiled against it stay
    /// installed and fail when plotted.
    pub fn remove_var(&mut self, name: &str) -> Option<Number> {
        debug!(name, "remove variable");
        self.vars.remove(name)
    }

    pub fn var(&self, name: &str) -> Option<Number> {
        self.vars.get(name)
    }

    pub fn vars(&self) -> HashMap<String, Number> {
        self.vars.snapshot()
    }

    pub fn var_env(&self) -> &VarEnv {
        &self.vars
    }

    // expressions

    pub fn expr(&self, slot: Slot) -> &Expr {
        match slot {
            Slot::X => &self.x,
            Slot::Y => &self.y,
            Slot::R => &self.r,
            Slot::T => &self.t,
        }
    }

    fn expr_mut(&mut self, slot: Slot) -> &mut Expr {
        match slot {
            Slot::X => &mut self.x,
            Slot::Y => &mut self.y,
            Slot::R => &mut self.r,
            Slot::T => &mut self.t,
        }
    }

    pub fn expression(&self, slot: Slot) -> &str {
        self.expr(slot).src()
    }

    /// Compiles `src` against the declared variables and installs it in
    /// `slot`. On failure the slot keeps its previous expression.
    pub fn set_expression(&mut self, slot: Slot, src: &str) -> Result<(), ValidationErr> {
        let expr = compile::compile(src, &self.vars.names())?;
        debug!(%slot, src, "installed expression");
        *self.expr_mut(slot) = expr;
        Ok(())
    }

    pub fn set_x_expression(&mut self, src: &str) -> Result<(), ValidationErr> {
        self.set_expression(Slot::X, src)
    }

    pub fn set_y_expression(&mut self, src: &str) -> Result<(), ValidationErr> {
        self.set_expression(Slot::Y, src)
    }

    pub fn set_r_expression(&mut self, src: &str) -> Result<(), ValidationErr> {
        self.set_expression(Slot::R, src)
    }

    pub fn set_t_expression(&mut self, src: &str) -> Result<(), ValidationErr> {
        self.set_expression(Slot::T, src)
    }

    pub fn x_expression(&self) -> &str {
        self.expression(Slot::X)
    }

    pub fn y_expression(&self) -> &str {
        self.expression(Slot::Y)
    }

    pub fn r_expression(&self) -> &str {
        self.expression(Slot::R)
    }

    pub fn t_expression(&self) -> &str {
        self.expression(Slot::T)
    }

    // range

    pub fn range(&self) -> &Range {
        &self.range
    }

    fn set_bound(&mut self, kind: BoundKind, src: &str) -> Result<(), ValidationErr> {
        let src = src.trim();
        let value = self
            .try_evaluate(src)
            .map_err(|err| err.context(format_args!("invalid {kind}")))?;
        if !value.is_finite() {
            return Err(ValidationErr::new(format!(
                "invalid {kind}: \"{src}\" is not a finite number"
            )));
        }
        if kind == BoundKind::Step && value <= 0.0 {
            return Err(ValidationErr::new(format!(
                "invalid {kind}: \"{src}\" must be greater than zero"
            )));
        }

        let bound = Bound {
            value,
            expr: src.to_string(),
        };
        debug!(%kind, src, value, "set range");
        match kind {
            BoundKind::Start => self.range.start = bound,
            BoundKind::End => self.range.end = bound,
            BoundKind::Step => self.range.step = bound,
        }
        Ok(())
    }

    pub fn set_range_start(&mut self, src: &str) -> Result<(), ValidationErr> {
        self.set_bound(BoundKind::Start, src)
    }

    pub fn set_range_end(&mut self, src: &str) -> Result<(), ValidationErr> {
        self.set_bound(BoundKind::End, src)
    }

    pub fn set_range_step(&mut self, src: &str) -> Result<(), ValidationErr> {
        self.set_bound(BoundKind::Step, src)
    }

    pub fn range_start(&self) -> Number {
        self.range.start.value
    }

    pub fn range_end(&self) -> Number {
        self.range.end.value
    }

    pub fn range_step(&self) -> Number {
        self.range.step.value
    }

    pub fn range_start_expr(&self) -> &str {
        &self.range.start.expr
    }

    pub fn range_end_expr(&self) -> &str {
        &self.range.end.expr
    }

    pub fn range_step_expr(&self) -> &str {
        &self.range.step.expr
    }

    // iteration identifiers

    pub fn param_name(&self) -> &str {
        &self.param
    }

    pub fn set_param_name(&mut self, name: impl Into<String>) {
        self.param = name.into();
    }

    pub fn radius_name(&self) -> &str {
        &self.radius
    }

    pub fn set_radius_name(&mut self, name: impl Into<String>) {
        self.radius = name.into();
    }

    pub fn theta_name(&self) -> &str {
        &self.theta
    }

    pub fn set_theta_name(&mut self, name: impl Into<String>) {
        self.theta = name.into();
    }

    // presentation

    pub fn precision(&self) -> u8 {
        self.precision
    }

    pub fn set_precision(&mut self, precision: u8) {
        self.precision = precision;
    }

    pub fn plot_mode(&self) -> PlotMode {
        self.mode
    }

    pub fn set_plot_mode(&mut self, mode: PlotMode) {
        self.mode = mode;
    }

    // one-shot evaluation

    /// Like [`Equation::evaluate`], but keeps the reason for failure.
    pub fn try_evaluate(&self, src: &str) -> Result<Number, ValidationErr> {
        let expr = compile::compile(src, &self.vars.names())?;
        expr.eval(&self.vars, &mut Vec::new())
            .map_err(|err| ValidationErr::new(err.to_string()))
    }

    /// Compiles and evaluates `src` against the current variables, without
    /// keeping the compiled form.
    pub fn evaluate(&self, src: &str) -> Option<Number> {
        self.try_evaluate(src).ok()
    }

    pub fn is_valid_expression(&self, src: &str) -> bool {
        compile::compile(src, &self.vars.names()).is_ok()
    }

    pub fn is_valid_value(&self, src: &str) -> bool {
        self.evaluate(src).is_some()
    }

    pub fn is_valid_name(&self, name: &str) -> bool {
        vars::is_valid_name(name)
    }

    // persistence

    pub fn snapshot(&self) -> EquationSnapshot {
        EquationSnapshot {
            name: self.name.clone(),
            vars: self
                .vars
                .iter()
                .map(|(name, val)| (name.to_string(), val))
                .collect(),
            x_expr: self.x_expression().to_string(),
            y_expr: self.y_expression().to_string(),
            r_expr: self.r_expression().to_string(),
            t_expr: self.t_expression().to_string(),
            range_start: self.range.start.expr.clone(),
            range_end: self.range.end.expr.clone(),
            range_step: self.range.step.expr.clone(),
            param_name: self.param.clone(),
            radius_name: self.radius.clone(),
            theta_name: self.theta.clone(),
            precision: self.precision,
            plot: self.mode,
        }
    }

    /// Rebuilds an equation from a snapshot, recompiling every expression
    /// against the snapshot's variables.
    pub fn restore(snapshot: EquationSnapshot) -> Result<Self, ValidationErr> {
        let mut eq = Self {
            name: snapshot.name,
            vars: snapshot.vars.into_iter().collect(),
            param: snapshot.param_name,
            radius: snapshot.radius_name,
            theta: snapshot.theta_name,
            precision: snapshot.precision,
            mode: snapshot.plot,
            ..Self::new()
        };

        for (slot, src) in [
            (Slot::X, &snapshot.x_expr),
            (Slot::Y, &snapshot.y_expr),
            (Slot::R, &snapshot.r_expr),
            (Slot::T, &snapshot.t_expr),
        ] {
            eq.set_expression(slot, src)
                .map_err(|err| err.context(format_args!("{slot} expression")))?;
        }
        eq.set_range_start(&snapshot.range_start)?;
        eq.set_range_end(&snapshot.range_end)?;
        eq.set_range_step(&snapshot.range_step)?;
        Ok(eq)
    }
}

/// Everything needed to rebuild an [`Equation`], in source form.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EquationSnapshot {
    pub name: String,
    pub vars: BTreeMap<String, Number>,
    pub x_expr: String,
    pub y_expr: String,
    pub r_expr: String,
    pub t_expr: String,
    pub range_start: String,
    pub range_end: String,
    pub range_step: String,
    pub param_name: String,
    pub radius_name: String,
    pub theta_name: String,
    pub precision: u8,
    pub plot: PlotMode,
}
