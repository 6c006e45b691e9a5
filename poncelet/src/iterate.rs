//! One step of the Poncelet map.
//!
//! From a point z on the unit circle, draw the tangent line to the ellipse and take its second
//! intersection with the circle. Solving that in closed form gives a rational expression in
//! (x, y, p, q, w, h, t) with a single square root. Both output coordinates share the square
//! root and the denominator, so they are computed once and reused.
//!
//! The raw expression carries a common factor w²h² in every numerator term, in the denominator
//! and (squared) under the square root. It is cancelled here, which leaves:
//!
//! * the discriminant `w²h² - (h²u² + w²v²)`, with (u, v) the point in the ellipse's frame.
//!   It is positive exactly when the point is inside the ellipse, where no tangent line exists.
//! * the denominator `|(z - c)² - (w² - h²)e^{2it}|²`, which vanishes only at the foci.

use tracing::trace;

use crate::error::IterateError;
use crate::geometry::{Ellipse, Point};

/// Discriminants up to this multiple of w²h² are treated as a tangency and give a zero root.
pub const DOMAIN_TOLERANCE: f64 = 1e-12;

/// Denominators below this fraction of their natural scale count as zero.
pub const DEGENERACY_TOLERANCE: f64 = 1e-12;

/// The trigonometry and squared axes of an ellipse, shared by every term of a step.
struct Frame {
    w2: f64,
    h2: f64,
    // w² - h²
    spread: f64,
    sin_t: f64,
    cos_t: f64,
    sin_2t: f64,
    cos_2t: f64,
}

impl Frame {
    fn of(ellipse: &Ellipse) -> Frame {
        let (sin_t, cos_t) = ellipse.t.sin_cos();
        let (sin_2t, cos_2t) = (2.0 * ellipse.t).sin_cos();
        let w2 = ellipse.w * ellipse.w;
        let h2 = ellipse.h * ellipse.h;
        Frame {
            w2,
            h2,
            spread: w2 - h2,
            sin_t,
            cos_t,
            sin_2t,
            cos_2t,
        }
    }

    fn discriminant(&self, dx: f64, dy: f64) -> f64 {
        let u = dx * self.cos_t + dy * self.sin_t;
        let v = dy * self.cos_t - dx * self.sin_t;
        self.w2 * self.h2 - (self.h2 * u * u + self.w2 * v * v)
    }

    /// The denominator and the scale it is compared against.
    fn denominator(&self, dx: f64, dy: f64) -> (f64, f64) {
        let r2 = dx * dx + dy * dy;
        let value = r2 * r2 + self.spread * self.spread
            - 2.0 * self.spread * (dx * dx - dy * dy) * self.cos_2t
            - 4.0 * self.spread * dx * dy * self.sin_2t;
        (value, (r2 + self.spread.abs()).powi(2))
    }
}

/// The discriminant of the step from `point`. Positive means no real next point.
pub fn discriminant(point: Point, ellipse: &Ellipse) -> f64 {
    Frame::of(ellipse).discriminant(point.x - ellipse.p, point.y - ellipse.q)
}

/// The shared denominator of the step from `point`. Zero at the foci of the ellipse.
pub fn denominator(point: Point, ellipse: &Ellipse) -> f64 {
    Frame::of(ellipse)
        .denominator(point.x - ellipse.p, point.y - ellipse.q)
        .0
}

/// Advances `point` to the next point of its Poncelet orbit around `ellipse`.
///
/// `point` is expected to lie on the unit circle; the result does too, up to rounding. The
/// denominator is checked before the discriminant, so a point on a focus reports `Degenerate`.
pub fn next_point(point: Point, ellipse: &Ellipse) -> Result<Point, IterateError> {
    let frame = Frame::of(ellipse);
    let Point { x, y } = point;
    let (p, q) = (ellipse.p, ellipse.q);
    let (dx, dy) = (x - p, y - q);

    let (denominator, scale) = frame.denominator(dx, dy);
    if denominator.is_nan() || denominator.abs() <= DEGENERACY_TOLERANCE * scale {
        return Err(IterateError::Degenerate { point, denominator });
    }

    let discriminant = frame.discriminant(dx, dy);
    if discriminant > DOMAIN_TOLERANCE * frame.w2 * frame.h2 {
        return Err(IterateError::Domain {
            point,
            discriminant,
        });
    }
    let root = (-discriminant).max(0.0).sqrt();

    let s = frame.w2 + frame.h2;
    let (p2, q2) = (p * p, q * q);

    // Numerator terms free of the square root, kept one power group per line.
    #[rustfmt::skip]
    let poly_x = -p.powi(4) * x + q.powi(4) * x + s * (p2 - q2) * x
        + 4.0 * p.powi(3) * x.powi(2) - 2.0 * p * s * x.powi(2)
        - 6.0 * p2 * x.powi(3) + s * x.powi(3)
        + 4.0 * p * x.powi(4) - x.powi(5)
        - 2.0 * p.powi(3) * q * y - 2.0 * p * q.powi(3) * y + 2.0 * p * q * s * y
        + 6.0 * p2 * q * x * y - 2.0 * q.powi(3) * x * y
        - 6.0 * p * q * x.powi(2) * y + 2.0 * q * x.powi(3) * y
        + 2.0 * p.powi(3) * y.powi(2) + 6.0 * p * q2 * y.powi(2) - 2.0 * p * s * y.powi(2)
        - 6.0 * p2 * x * y.powi(2) + s * x * y.powi(2)
        + 6.0 * p * x.powi(2) * y.powi(2) - 2.0 * x.powi(3) * y.powi(2)
        - 6.0 * p * q * y.powi(3) + 2.0 * q * x * y.powi(3)
        + 2.0 * p * y.powi(4) - x * y.powi(4);

    #[rustfmt::skip]
    let poly_y = -2.0 * p.powi(3) * q * x - 2.0 * p * q.powi(3) * x + 2.0 * p * q * s * x
        + 6.0 * p2 * q * x.powi(2) + 2.0 * q.powi(3) * x.powi(2) - 2.0 * q * s * x.powi(2)
        - 6.0 * p * q * x.powi(3) + 2.0 * q * x.powi(4)
        + p.powi(4) * y - q.powi(4) * y - s * (p2 - q2) * y
        - 2.0 * p.powi(3) * x * y + 6.0 * p * q2 * x * y
        - 6.0 * q2 * x.powi(2) * y + s * x.powi(2) * y
        + 2.0 * p * x.powi(3) * y - x.powi(4) * y
        + 4.0 * q.powi(3) * y.powi(2) - 2.0 * q * s * y.powi(2)
        - 6.0 * p * q * x * y.powi(2) + 6.0 * q * x.powi(2) * y.powi(2)
        - 6.0 * q2 * y.powi(3) + s * y.powi(3)
        + 2.0 * p * x * y.powi(3) - 2.0 * x.powi(2) * y.powi(3)
        + 4.0 * q * y.powi(4) - y.powi(5);

    // Coefficients of the square root.
    #[rustfmt::skip]
    let root_x = -4.0 * p * q * x + 4.0 * q * x.powi(2) + 2.0 * (p2 - q2) * y
        - 2.0 * x.powi(2) * y + 4.0 * q * y.powi(2) - 2.0 * y.powi(3);
    #[rustfmt::skip]
    let root_y = 2.0 * (p2 - q2) * x - 4.0 * p * x.powi(2) + 2.0 * x.powi(3)
        + 4.0 * p * q * y - 4.0 * p * y.powi(2) + 2.0 * x * y.powi(2);

    // Terms scaled by (w² - h²), which drop out for a circle.
    let m = dx * dx + dy * dy - s;
    let along_y = y * m + 2.0 * x * root;
    let along_x = x * m - 2.0 * y * root;
    let spread_sin = frame.spread * frame.sin_2t;
    let spread_cos = frame.spread * frame.cos_2t;

    let numerator_x = poly_x + root * root_x + spread_sin * along_y + spread_cos * along_x;
    let numerator_y = poly_y + root * root_y - spread_cos * along_y + spread_sin * along_x;

    let next = Point::new(numerator_x / denominator, numerator_y / denominator);
    trace!(from = %point, to = %next, "poncelet step");
    Ok(next)
}
