// SPDX: CC0-1.0

use cartesian_plane::{Equation, EquationSnapshot, PlotErr, PlotMode, Point, Slot};
use core::f64::consts::PI;
use std::collections::HashMap;

fn ranged(start: &str, end: &str, step: &str) -> Equation {
    let mut eq = Equation::new();
    eq.set_range_start(start).unwrap();
    eq.set_range_end(end).unwrap();
    eq.set_range_step(step).unwrap();
    eq
}

#[test]
fn new_equation_environment() {
    let eq = Equation::new();
    let expected: HashMap<String, f64> = ["a", "b", "c", "x", "y", "t"]
        .into_iter()
        .map(|name| (name.to_string(), 0.0))
        .collect();
    assert_eq!(eq.vars(), expected);
    assert_eq!(eq.param_name(), "t");
}

#[test]
fn rejected_expression_rolls_back() {
    let mut eq = Equation::new();
    eq.set_y_expression("x^2 - 1").unwrap();
    let err = eq.set_y_expression("x^2 -").unwrap_err();
    assert!(!err.messages.is_empty());
    assert_eq!(eq.y_expression(), "x^2 - 1");

    for slot in Slot::exhaustive() {
        let slot = *slot;
        eq.set_expression(slot, "2x").unwrap();
        for bad in ["2x +", "", "k", "sin(", "x > 1"] {
            assert!(eq.set_expression(slot, bad).is_err(), "{slot} {bad:?}");
            assert_eq!(eq.expression(slot), "2x", "{slot} {bad:?}");
        }
    }

    // the old program is still the one that runs
    let mut eq = ranged("0", "1", "1");
    eq.set_y_expression("x^2 - 1").unwrap();
    assert!(eq.set_y_expression("x^2 -").is_err());
    let ys: Vec<_> = eq.y_plot().unwrap().map(|p| p.y).collect();
    assert_eq!(ys, [-1.0, 0.0]);

    eq.set_r_expression("2").unwrap();
    assert!(eq.set_r_expression("2 *").is_err());
    let radii: Vec<_> = eq
        .r_plot()
        .unwrap()
        .map(|p| p.x.hypot(p.y))
        .collect();
    assert_eq!(radii.len(), 2);
    assert!(radii.iter().all(|r| (r - 2.0).abs() < 1e-12));
}

#[test]
fn explicit_plot() {
    let mut eq = ranged("1", "3", "1");
    eq.set_y_expression("2x").unwrap();
    let points: Vec<_> = eq.y_plot().unwrap().collect();
    assert_eq!(
        points,
        [
            Point { x: 1.0, y: 2.0 },
            Point { x: 2.0, y: 4.0 },
            Point { x: 3.0, y: 6.0 },
        ]
    );
}

#[test]
fn parametric_plot_is_a_line() {
    let mut eq = ranged("-2", "2", "0.1");
    eq.set_x_expression("2t").unwrap();
    eq.set_y_expression("3t").unwrap();
    let mut n = 0;
    for p in eq.xy_plot().unwrap() {
        n += 1;
        if p.x.abs() > 1e-9 {
            assert!((p.y / p.x - 1.5).abs() < 1e-9, "{p}");
        }
    }
    assert!(n >= 40);
    assert_eq!(eq.plot_mode(), PlotMode::Xy);
}

#[test]
fn polar_unit_circle() {
    let mut eq = ranged("0", "3pi/2", "pi/2");
    eq.set_r_expression("1").unwrap();
    let points: Vec<_> = eq.r_plot().unwrap().collect();
    let expected = [(1.0, 0.0), (0.0, 1.0), (-1.0, 0.0), (0.0, -1.0)];
    assert_eq!(points.len(), expected.len());
    for (p, (x, y)) in points.iter().zip(expected) {
        assert!((p.x - x).abs() < 1e-6 && (p.y - y).abs() < 1e-6, "{p}");
    }
    assert!((eq.range_end() - 1.5 * PI).abs() < 1e-12);
}

#[test]
fn undeclared_variable_blocks_plot() {
    let mut eq = Equation::new();
    assert!(eq.set_y_expression("k + x").is_err());

    eq.set_var("k", 1.0);
    eq.set_y_expression("k + x").unwrap();
    eq.remove_var("k");
    match eq.y_plot() {
        Err(PlotErr::Unresolved { slot, name, .. }) => {
            assert_eq!(slot, Slot::Y);
            assert_eq!(name, "k");
        }
        Ok(_) => panic!("plot started with an undeclared variable"),
    }
}

#[test]
fn name_validity() {
    let eq = Equation::new();
    for good in ["_", "a", "_Ab9", "theta"] {
        assert!(eq.is_valid_name(good), "{good}");
    }
    for bad in ["", "0a", "$a", "a-b"] {
        assert!(!eq.is_valid_name(bad), "{bad}");
    }
}

#[test]
fn evaluate_is_idempotent() {
    let mut eq = Equation::new();
    eq.set_var("a", 3.0);
    let first = eq.evaluate("a^2 + 1");
    assert_eq!(first, Some(10.0));
    assert_eq!(eq.evaluate("a^2 + 1"), first);
    assert_eq!(eq.var("a"), Some(3.0));

    let before = eq.vars();
    for _ in 0..2 {
        let val = eq.evaluate("sin(pi/2)").unwrap();
        assert!((val - 1.0).abs() < 1e-12);
    }
    assert_eq!(eq.vars(), before);
}

#[test]
fn snapshot_survives_json() {
    let mut eq = ranged("0", "2pi", "pi/16");
    eq.set_name("rose");
    eq.set_var("k", 4.0);
    eq.set_r_expression("sin(k t)").unwrap();
    eq.set_precision(5);
    eq.set_plot_mode(PlotMode::R);

    let snapshot = eq.snapshot();
    let json = serde_json::to_string(&snapshot).unwrap();
    assert!(json.contains("\"RPlot\""));
    let back: EquationSnapshot = serde_json::from_str(&json).unwrap();
    assert_eq!(back, snapshot);

    let mut restored = Equation::restore(back).unwrap();
    assert_eq!(restored.name(), "rose");
    assert_eq!(restored.r_expression(), "sin(k t)");
    assert_eq!(restored.range_end_expr(), "2pi");
    assert_eq!(restored.range_step(), PI / 16.0);
    assert_eq!(restored.precision(), 5);
    assert_eq!(restored.var("k"), Some(4.0));

    let a: Vec<_> = eq.plot().unwrap().collect();
    let b: Vec<_> = restored.plot().unwrap().collect();
    assert_eq!(a, b);
}

#[test]
fn restore_rejects_undeclared_variables() {
    let mut eq = Equation::new();
    eq.set_var("k", 1.0);
    eq.set_y_expression("k").unwrap();
    let mut snapshot = eq.snapshot();
    snapshot.vars.remove("k");
    let err = Equation::restore(snapshot).unwrap_err();
    assert!(err.messages[0].starts_with("y expression: "), "{err}");
}
