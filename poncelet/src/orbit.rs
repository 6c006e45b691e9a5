use std::convert::TryFrom;
use std::f64::consts::PI;
use std::io::Write;

use tracing::{debug, warn};

use crate::error::OrbitError;
use crate::geometry::{Ellipse, Point};
use crate::iterate::next_point;

/// Most points reserved up front; longer orbits grow as their steps succeed.
const RESERVE_LIMIT: usize = 1 << 16;

/// Seeds further than this from the unit circle (in `x² + y² - 1`) are logged as suspicious.
const SEED_TOLERANCE: f64 = 1e-6;

/// An orbit: element 0 is the seed, element i is the image of element i - 1.
///
/// Always built fresh by `compute_orbit`; there is no way to append to one. Serializes as a JSON
/// array of `[x, y]` pairs.
#[derive(Serialize, Debug, Clone, Default, PartialEq)]
#[serde(transparent)]
pub struct Orbit {
    points: Vec<Point>,
}

impl Orbit {
    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn into_points(self) -> Vec<Point> {
        self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// The largest `|x² + y² - 1|` over the orbit, or 0 for an empty one.
    pub fn max_circle_residual(&self) -> f64 {
        self.points
            .iter()
            .fold(0.0, |worst, p| worst.max(p.circle_residual().abs()))
    }

    /// Distance from the last point back to the seed. Close to zero when the orbit has closed
    /// into a Poncelet polygon.
    pub fn closure_gap(&self) -> Option<f64> {
        match (self.points.first(), self.points.last()) {
            (Some(first), Some(last)) => Some(last.distance(first)),
            _ => None,
        }
    }

    /// Writes the orbit as a single JSON array.
    pub fn write_json<W: Write>(&self, writer: W) -> serde_json::Result<()> {
        serde_json::to_writer(writer, self)
    }
}

/// Builds the `n` point orbit of `seed` around `ellipse`.
///
/// `n == 0` gives an empty orbit and `n == 1` just the seed, without iterating. Any failing step
/// aborts the whole computation; the error names the slot that could not be filled.
pub fn compute_orbit(seed: Point, ellipse: &Ellipse, n: usize) -> Result<Orbit, OrbitError> {
    if n == 0 {
        return Ok(Orbit::default());
    }
    if !seed.is_finite() {
        let value = if seed.x.is_finite() { seed.y } else { seed.x };
        return Err(OrbitError::invalid("seed", value, "must be a finite point"));
    }
    if seed.circle_residual().abs() > SEED_TOLERANCE {
        warn!("seed {} is not on the unit circle", seed);
    }
    debug!("computing {} points from {} around {}", n, seed, ellipse);

    let mut points = Vec::with_capacity(n.min(RESERVE_LIMIT));
    points.push(seed);
    let mut current = seed;
    for index in 1..n {
        current = match next_point(current, ellipse) {
            Ok(next) => next,
            Err(err) => {
                debug!("step {} failed: {}", index, err);
                return Err(OrbitError::at_step(index, err));
            }
        };
        points.push(current);
    }

    let orbit = Orbit { points };
    debug!(
        "orbit finished, worst circle residual {:e}",
        orbit.max_circle_residual()
    );
    Ok(orbit)
}

/// The parameter record handed over by whoever drives the computation. Field names follow the
/// external format (`p, q, w, h, t, xInitial, yInitial, n`); missing fields take the demo values.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct OrbitParams {
    pub p: f64,
    pub q: f64,
    pub w: f64,
    pub h: f64,
    pub t: f64,
    pub x_initial: f64,
    pub y_initial: f64,
    /// Signed so that a negative count from the caller can be represented and rejected.
    pub n: i64,
}

impl Default for OrbitParams {
    fn default() -> OrbitParams {
        OrbitParams {
            p: 0.4,
            q: -0.2,
            w: 0.5,
            h: 0.25,
            t: PI / 5.0,
            x_initial: 0.0,
            y_initial: 1.0,
            n: 17,
        }
    }
}

impl OrbitParams {
    pub fn ellipse(&self) -> Result<Ellipse, OrbitError> {
        Ellipse::new(self.p, self.q, self.w, self.h, self.t)
    }

    pub fn seed(&self) -> Point {
        Point::new(self.x_initial, self.y_initial)
    }

    /// Checks every field, returning the ellipse and the point count.
    pub fn validate(&self) -> Result<(Ellipse, usize), OrbitError> {
        let ellipse = self.ellipse()?;
        for &(name, value) in &[("xInitial", self.x_initial), ("yInitial", self.y_initial)] {
            if !value.is_finite() {
                return Err(OrbitError::invalid(name, value, "must be a finite number"));
            }
        }
        if self.n < 1 {
            return Err(OrbitError::invalid(
                "n",
                self.n as f64,
                "orbit needs at least one point",
            ));
        }
        match usize::try_from(self.n) {
            Ok(n) => Ok((ellipse, n)),
            Err(_) => Err(OrbitError::invalid(
                "n",
                self.n as f64,
                "too many points for this platform",
            )),
        }
    }

    pub fn compute(&self) -> Result<Orbit, OrbitError> {
        let (ellipse, n) = self.validate()?;
        compute_orbit(self.seed(), &ellipse, n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_points_is_empty() {
        let ellipse = OrbitParams::default().ellipse().unwrap();
        let orbit = compute_orbit(Point::new(0.0, 1.0), &ellipse, 0).unwrap();
        assert!(orbit.is_empty());
        assert_eq!(orbit.closure_gap(), None);
    }

    #[test]
    fn one_point_is_the_seed_untouched() {
        // Even a seed the map cannot advance is returned as is.
        let ellipse = Ellipse::new(1.0, 0.0, 0.5, 0.3, 0.0).unwrap();
        let seed = Point::new(1.0, 0.0);
        let orbit = compute_orbit(seed, &ellipse, 1).unwrap();
        assert_eq!(orbit.points(), &[seed]);
    }

    #[test]
    fn failing_first_step_reports_slot_one() {
        let ellipse = Ellipse::new(1.0, 0.0, 0.5, 0.3, 0.0).unwrap();
        let seed = Point::new(1.0, 0.0);
        match compute_orbit(seed, &ellipse, 5) {
            Err(OrbitError::Domain { index, point, .. }) => {
                assert_eq!(index, 1);
                assert_eq!(point, seed);
            }
            other => panic!("expected a domain error, got {:?}", other),
        }
    }

    #[test]
    fn huge_counts_still_fail_at_the_first_step() {
        let ellipse = Ellipse::new(1.0, 0.0, 0.5, 0.3, 0.0).unwrap();
        match compute_orbit(Point::new(1.0, 0.0), &ellipse, 1 << 60) {
            Err(OrbitError::Domain { index, .. }) => assert_eq!(index, 1),
            other => panic!("expected a domain error, got {:?}", other),
        }

        let params = OrbitParams {
            p: 1.0,
            q: 0.0,
            w: 0.5,
            h: 0.3,
            t: 0.0,
            x_initial: 1.0,
            y_initial: 0.0,
            n: 1_000_000_000_000_000,
        };
        match params.compute() {
            Err(OrbitError::Domain { index, .. }) => assert_eq!(index, 1),
            other => panic!("expected a domain error, got {:?}", other),
        }
    }

    #[test]
    fn non_finite_seed_is_rejected() {
        let ellipse = OrbitParams::default().ellipse().unwrap();
        match compute_orbit(Point::new(std::f64::NAN, 0.0), &ellipse, 3) {
            Err(OrbitError::InvalidParameter { name, .. }) => assert_eq!(name, "seed"),
            other => panic!("expected an invalid seed, got {:?}", other),
        }
        match compute_orbit(Point::new(0.0, std::f64::INFINITY), &ellipse, 3) {
            Err(OrbitError::InvalidParameter { name, value, .. }) => {
                assert_eq!(name, "seed");
                assert_eq!(value, std::f64::INFINITY);
            }
            other => panic!("expected an invalid seed, got {:?}", other),
        }
    }

    #[test]
    fn params_reject_bad_counts_and_axes() {
        let params = OrbitParams {
            n: 0,
            ..OrbitParams::default()
        };
        match params.compute() {
            Err(OrbitError::InvalidParameter { name, .. }) => assert_eq!(name, "n"),
            other => panic!("expected invalid n, got {:?}", other),
        }

        let params = OrbitParams {
            h: 0.0,
            ..OrbitParams::default()
        };
        match params.compute() {
            Err(OrbitError::InvalidParameter { name, .. }) => assert_eq!(name, "h"),
            other => panic!("expected invalid h, got {:?}", other),
        }

        let params = OrbitParams {
            x_initial: std::f64::NAN,
            ..OrbitParams::default()
        };
        assert!(params.validate().is_err());
    }

    #[test]
    fn params_parse_with_defaults_for_missing_fields() {
        let input = r#"{"w": 0.3, "xInitial": 1.0, "yInitial": 0.0, "n": 4}"#;
        let params: OrbitParams = serde_json::from_str(input).unwrap();
        assert_eq!(params.w, 0.3);
        assert_eq!(params.x_initial, 1.0);
        assert_eq!(params.y_initial, 0.0);
        assert_eq!(params.n, 4);
        assert_eq!(params.p, 0.4);
        assert_eq!(params.t, PI / 5.0);
    }

    #[test]
    fn orbit_exports_as_nested_arrays() {
        let params = OrbitParams {
            p: 0.0,
            q: 0.0,
            w: 0.5,
            h: 0.5,
            t: 0.0,
            x_initial: 1.0,
            y_initial: 0.0,
            n: 2,
        };
        let orbit = params.compute().unwrap();
        let mut out = Vec::new();
        orbit.write_json(&mut out).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        let pairs = value.as_array().unwrap();
        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs[0], serde_json::json!([1.0, 0.0]));
        assert_eq!(pairs[1].as_array().unwrap().len(), 2);
    }

    #[test]
    fn triangle_orbit_closes() {
        let circle = Ellipse::new(0.0, 0.0, 0.5, 0.5, 0.0).unwrap();
        let orbit = compute_orbit(Point::new(1.0, 0.0), &circle, 4).unwrap();
        assert!(orbit.closure_gap().unwrap() < 1e-12);
        assert!(orbit.max_circle_residual() < 1e-12);
    }
}
