//! Poncelet orbits of points on the unit circle.
//!
//! Given an ellipse and a point on the unit circle, the point is carried to the next point on the
//! circle by drawing a tangent line from it to the ellipse and taking the line's second
//! intersection with the circle. Repeating that step from a seed gives the (finite) Poncelet
//! orbit, which `orbit::compute_orbit` builds and returns as an owned value.
extern crate crossbeam_channel;
extern crate rand;
extern crate serde;
extern crate serde_json;
extern crate thiserror;
extern crate tracing;

#[macro_use]
extern crate serde_derive;

pub mod error;
pub mod geometry;
pub mod iterate;
pub mod orbit;
pub mod sweep;

pub use error::{IterateError, OrbitError};
pub use geometry::{Ellipse, Point};
pub use iterate::next_point;
pub use orbit::{compute_orbit, Orbit, OrbitParams};
