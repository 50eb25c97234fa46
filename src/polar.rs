// SPDX: CC0-1.0

//! Conversion between polar `(radius, theta)` and Cartesian `(x, y)`
//! coordinates. Angles are in radians.
//!
//! At the origin the angle is undefined; [`theta_of_xy`] reports `0.0` there
//! regardless of the signs of the zeros.

use crate::{Number, Point};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Polar {
    pub radius: Number,
    pub theta: Number,
}

impl Polar {
    pub const fn new(radius: Number, theta: Number) -> Self {
        Self { radius, theta }
    }

    pub fn of_xy(x: Number, y: Number) -> Self {
        Self::new(radius_of_xy(x, y), theta_of_xy(x, y))
    }

    pub fn of_point(point: Point<Number>) -> Self {
        Self::of_xy(point.x, point.y)
    }

    pub fn to_point(self) -> Point<Number> {
        to_point(self.radius, self.theta)
    }
}

impl From<Point<Number>> for Polar {
    fn from(point: Point<Number>) -> Self {
        Self::of_point(point)
    }
}

impl From<Polar> for Point<Number> {
    fn from(polar: Polar) -> Self {
        polar.to_point()
    }
}

pub fn to_point(radius: Number, theta: Number) -> Point<Number> {
    let (sin, cos) = theta.sin_cos();
    Point {
        x: radius * cos,
        y: radius * sin,
    }
}

pub fn radius_of_xy(x: Number, y: Number) -> Number {
    x.hypot(y)
}

pub fn theta_of_xy(x: Number, y: Number) -> Number {
    if x == 0.0 && y == 0.0 {
        0.0
    } else {
        y.atan2(x)
    }
}
