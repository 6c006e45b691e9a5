use std::f64::consts::FRAC_PI_2;
use std::fmt;

use crate::error::OrbitError;

/// A point in the plane. Points of an orbit are meant to lie on the unit circle, but nothing
/// enforces that: rounding error accumulates from step to step.
///
/// Serializes as a two element array `[x, y]`, which is the shape the export format uses.
#[derive(Serialize, Deserialize, Copy, Clone, Debug, PartialEq)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Point {
        Point { x, y }
    }

    /// The point of the unit circle at `theta` radians.
    pub fn on_unit_circle(theta: f64) -> Point {
        let (y, x) = theta.sin_cos();
        Point { x, y }
    }

    pub fn norm(&self) -> f64 {
        self.x.hypot(self.y)
    }

    /// How far `x² + y²` is from 1.
    pub fn circle_residual(&self) -> f64 {
        self.x * self.x + self.y * self.y - 1.0
    }

    pub fn distance(&self, other: &Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl From<[f64; 2]> for Point {
    fn from(xy: [f64; 2]) -> Point {
        Point::new(xy[0], xy[1])
    }
}

impl From<Point> for [f64; 2] {
    fn from(point: Point) -> [f64; 2] {
        [point.x, point.y]
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "({:.6}, {:.6})", self.x, self.y)
    }
}

/// An ellipse centred at (p, q) with semi-axes w and h, rotated by t radians.
///
/// `w` runs along the rotated x axis and `h` along the rotated y axis; either may be the longer
/// one. Both are strictly positive, which `Ellipse::new` checks, so every `Ellipse` in hand is
/// safe to iterate against.
#[derive(Serialize, Copy, Clone, Debug, PartialEq)]
pub struct Ellipse {
    pub(crate) p: f64,
    pub(crate) q: f64,
    pub(crate) w: f64,
    pub(crate) h: f64,
    pub(crate) t: f64,
}

impl Ellipse {
    pub fn new(p: f64, q: f64, w: f64, h: f64, t: f64) -> Result<Ellipse, OrbitError> {
        for &(name, value) in &[("p", p), ("q", q), ("w", w), ("h", h), ("t", t)] {
            if !value.is_finite() {
                return Err(OrbitError::invalid(name, value, "must be a finite number"));
            }
        }
        if w <= 0.0 {
            return Err(OrbitError::invalid("w", w, "semi-axis must be positive"));
        }
        if h <= 0.0 {
            return Err(OrbitError::invalid("h", h, "semi-axis must be positive"));
        }
        Ok(Ellipse { p, q, w, h, t })
    }

    pub fn center(&self) -> Point {
        Point::new(self.p, self.q)
    }

    pub fn semi_axes(&self) -> (f64, f64) {
        (self.w, self.h)
    }

    pub fn rotation(&self) -> f64 {
        self.t
    }

    /// Coordinates of `point` in the ellipse's own frame, where the ellipse is
    /// `u²/w² + v²/h² = 1`.
    pub fn to_local(&self, point: Point) -> (f64, f64) {
        let (sin_t, cos_t) = self.t.sin_cos();
        let (dx, dy) = (point.x - self.p, point.y - self.q);
        (dx * cos_t + dy * sin_t, dy * cos_t - dx * sin_t)
    }

    /// The two foci. They coincide with the centre when `w == h`.
    pub fn foci(&self) -> (Point, Point) {
        let c = (self.w * self.w - self.h * self.h).abs().sqrt();
        let axis = if self.w >= self.h {
            self.t
        } else {
            self.t + FRAC_PI_2
        };
        let (sin_a, cos_a) = axis.sin_cos();
        (
            Point::new(self.p + c * cos_a, self.q + c * sin_a),
            Point::new(self.p - c * cos_a, self.q - c * sin_a),
        )
    }

    /// True when `point` is strictly inside the ellipse.
    pub fn contains(&self, point: Point) -> bool {
        let (u, v) = self.to_local(point);
        (u / self.w).powi(2) + (v / self.h).powi(2) < 1.0
    }
}

impl fmt::Display for Ellipse {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "Ellipse{{p: {}, q: {}, w: {}, h: {}, t: {}}}",
            self.p, self.q, self.w, self.h, self.t
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    #[test]
    fn points_on_unit_circle_have_no_residual() {
        for k in 0..16 {
            let point = Point::on_unit_circle(k as f64 * PI / 8.0);
            assert!(point.circle_residual().abs() < 1e-15);
            assert!((point.norm() - 1.0).abs() < 1e-15);
        }
    }

    #[test]
    fn point_serializes_as_pair() {
        let point = Point::new(0.5, -0.25);
        assert_eq!(serde_json::to_string(&point).unwrap(), "[0.5,-0.25]");
        let back: Point = serde_json::from_str("[0.5,-0.25]").unwrap();
        assert_eq!(back, point);
    }

    #[test]
    fn ellipse_rejects_non_positive_axes() {
        match Ellipse::new(0.0, 0.0, 0.0, 0.5, 0.0) {
            Err(OrbitError::InvalidParameter { name, .. }) => assert_eq!(name, "w"),
            other => panic!("expected invalid w, got {:?}", other),
        }
        match Ellipse::new(0.0, 0.0, 0.5, -1.0, 0.0) {
            Err(OrbitError::InvalidParameter { name, value, .. }) => {
                assert_eq!(name, "h");
                assert_eq!(value, -1.0);
            }
            other => panic!("expected invalid h, got {:?}", other),
        }
    }

    #[test]
    fn ellipse_rejects_non_finite_values() {
        assert!(Ellipse::new(std::f64::NAN, 0.0, 0.5, 0.5, 0.0).is_err());
        assert!(Ellipse::new(0.0, 0.0, 0.5, 0.5, std::f64::INFINITY).is_err());
    }

    #[test]
    fn foci_follow_the_long_axis() {
        let ellipse = Ellipse::new(0.6, 0.0, 0.5, 0.3, 0.0).unwrap();
        let (a, b) = ellipse.foci();
        assert!((a.x - 1.0).abs() < 1e-12 && a.y.abs() < 1e-12);
        assert!((b.x - 0.2).abs() < 1e-12 && b.y.abs() < 1e-12);

        let tall = Ellipse::new(0.0, 0.0, 0.3, 0.5, 0.0).unwrap();
        let (a, _) = tall.foci();
        assert!(a.x.abs() < 1e-12);
        assert!((a.y - 0.4).abs() < 1e-12);
    }

    #[test]
    fn contains_respects_rotation() {
        let ellipse = Ellipse::new(0.0, 0.0, 0.5, 0.1, PI / 2.0).unwrap();
        assert!(ellipse.contains(Point::new(0.0, 0.4)));
        assert!(!ellipse.contains(Point::new(0.4, 0.0)));
        assert!(!ellipse.contains(Point::new(0.0, 1.0)));
    }
}
