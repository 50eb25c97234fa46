// SPDX: CC0-1.0

use crate::{
    equation::{Equation, Slot},
    eval::Program,
    lex::SubStr,
    plot::PlotMode,
};
use anyhow::Context;
use core::fmt;
use std::{
    collections::BTreeMap,
    io::{self, stdin, BufRead, Write},
    sync::Arc,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    Help,
    Quit,
    Show,
    SetExpr(Slot),
    Var,
    Unset,
    Range,
    Names,
    Mode,
    Plot,
    Export,
    Eval,
    PrintProg,
}

impl Command {
    pub const fn exhaustive() -> &'static [Command] {
        &[
            Self::Help,
            Self::Quit,
            Self::Show,
            Self::SetExpr(Slot::Y),
            Self::SetExpr(Slot::X),
            Self::SetExpr(Slot::R),
            Self::SetExpr(Slot::T),
            Self::Var,
            Self::Unset,
            Self::Range,
            Self::Names,
            Self::Mode,
            Self::Plot,
            Self::Export,
            Self::Eval,
            Self::PrintProg,
        ]
    }

    pub const fn help(&self) -> &'static str {
        match self {
            Self::Help => "display help for each command",
            Self::Quit => "quit the shell",
            Self::Show => "show the equation, its range and its variables",
            Self::SetExpr(Slot::Y) => "set the y expression (YPlot and XYPlot)",
            Self::SetExpr(Slot::X) => "set the x expression (XYPlot)",
            Self::SetExpr(Slot::R) => "set the radius expression (RPlot)",
            Self::SetExpr(Slot::T) => "set the angle expression (TPlot)",
            Self::Var => "declare a variable or change its value",
            Self::Unset => "remove a variable",
            Self::Range => "set the start, end and step of the plotted range",
            Self::Names => "set the parameter, radius and theta names",
            Self::Mode => "set the plot mode (YPlot, XYPlot, RPlot or TPlot)",
            Self::Plot => "print the points of the current plot",
            Self::Export => "write the points of the current plot to a data file",
            Self::Eval => "evaluate an expression once",
            Self::PrintProg => "print program compiled from an expression (for debugging)",
        }
    }

    pub const fn name(&self) -> &'static str {
        match self {
            Self::Help => "help",
            Self::Quit => "quit",
            Self::Show => "show",
            Self::SetExpr(slot) => slot.name(),
            Self::Var => "var",
            Self::Unset => "unset",
            Self::Range => "range",
            Self::Names => "names",
            Self::Mode => "mode",
            Self::Plot => "plot",
            Self::Export => "export",
            Self::Eval => "eval",
            Self::PrintProg => "prog",
        }
    }
}

impl core::str::FromStr for Command {
    type Err = ();
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        for c in Self::exhaustive() {
            if s == c.name() {
                return Ok(*c);
            }
        }
        Err(())
    }
}

/// Reads one line with surrounding whitespace trimmed, or `None` at end of
/// input.
pub fn read_trimmed_line<R: BufRead>(mut reader: R) -> io::Result<Option<String>> {
    let mut s = String::new();
    if reader.read_line(&mut s)? == 0 {
        return Ok(None);
    }
    Ok(Some(s.trim().to_string()))
}

/// Prompts for a line of standard input. `None` means the input has ended.
pub fn input_line<W: Write>(
    out: W,
    prompt: impl fmt::Display,
) -> anyhow::Result<Option<String>> {
    fn inner<W: Write>(mut out: W, prompt: impl fmt::Display) -> io::Result<Option<String>> {
        write!(out, "{prompt}")?;
        out.flush()?;
        read_trimmed_line(stdin().lock())
    }

    let s = inner(out, prompt).context("read from standard input failed")?;
    Ok(s)
}

/// Like [`input_line`], with end of input read as an empty answer.
pub fn input<W: Write>(out: W, prompt: impl fmt::Display) -> anyhow::Result<String> {
    Ok(input_line(out, prompt)?.unwrap_or_default())
}

pub fn read_fromstr<W: Write, T: core::str::FromStr>(
    mut out: W,
    prompt: impl fmt::Display,
    ignore_empty: bool,
) -> anyhow::Result<Result<Option<T>, <T as core::str::FromStr>::Err>>
where
    <T as core::str::FromStr>::Err: fmt::Display,
{
    let input = Arc::new(input(&mut out, prompt)?);
    if ignore_empty && input.is_empty() {
        return Ok(Ok(None));
    }
    match input.parse::<T>() {
        Ok(new) => Ok(Ok(Some(new))),
        Err(err) => {
            writeln!(out)?;
            let span = SubStr::all(input);
            writeln!(out, "{}", span.src())?;
            writeln!(out, "{}", span.underline())?;
            writeln!(out, "parse error: {err}")?;
            Ok(Err(err))
        }
    }
}

/// Prints validation messages, one per line, after a blank line.
pub fn print_messages<W: Write>(mut out: W, messages: &[String]) -> io::Result<()> {
    writeln!(out)?;
    for msg in messages {
        writeln!(out, "{msg}")?;
    }
    Ok(())
}

pub fn dump_program<W: Write>(
    mut out: W,
    prog: &Program,
    title: core::fmt::Arguments,
) -> io::Result<()> {
    writeln!(out, "{title}: ")?;
    if prog.ops().len() == 0 {
        writeln!(out, "  (empty)")?;
    }
    for op in prog.ops() {
        writeln!(out, "  {op}")?;
    }
    Ok(())
}

/// One line describing what the current plot mode draws.
pub fn summary(eq: &Equation) -> String {
    match eq.plot_mode() {
        PlotMode::Y => format!("y = {}", eq.y_expression()),
        PlotMode::Xy => format!(
            "(x, y) = ({}, {}) over {}",
            eq.x_expression(),
            eq.y_expression(),
            eq.param_name()
        ),
        PlotMode::R => format!(
            "{} = {} over {}",
            eq.radius_name(),
            eq.r_expression(),
            eq.theta_name()
        ),
        PlotMode::T => format!(
            "{} = {} over {}",
            eq.theta_name(),
            eq.t_expression(),
            eq.radius_name()
        ),
    }
}

pub fn show<W: Write>(mut out: W, eq: &Equation) -> io::Result<()> {
    writeln!(out, "name: {}", eq.name())?;
    writeln!(out, "mode: {}", eq.plot_mode())?;
    for slot in Slot::exhaustive() {
        writeln!(out, "{slot} = {}", eq.expression(*slot))?;
    }
    let range = eq.range();
    writeln!(
        out,
        "range: {range} ({start}, {end}, {step})",
        start = range.start.value,
        end = range.end.value,
        step = range.step.value
    )?;
    writeln!(
        out,
        "names: param = {}, radius = {}, theta = {}",
        eq.param_name(),
        eq.radius_name(),
        eq.theta_name()
    )?;
    writeln!(out, "precision: {}", eq.precision())?;
    writeln!(out, "variables:")?;
    let vars: BTreeMap<_, _> = eq.var_env().iter().collect();
    if vars.is_empty() {
        writeln!(out, "  (none)")?;
    }
    for (name, val) in vars {
        writeln!(out, "  {name} = {val}")?;
    }
    Ok(())
}
