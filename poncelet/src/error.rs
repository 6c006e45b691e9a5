use thiserror::Error;

use crate::geometry::Point;

/// Failure of a single step of the iteration.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum IterateError {
    /// The point lies inside the ellipse, so no real tangent line through it exists.
    #[error("no real tangent from {point}: discriminant {discriminant:e} is positive")]
    Domain { point: Point, discriminant: f64 },

    /// The point sits on a focus of the ellipse and the mapping is undefined there.
    #[error("mapping is undefined at {point}: denominator {denominator:e} vanishes")]
    Degenerate { point: Point, denominator: f64 },
}

/// Failure of a whole orbit computation. Every variant is terminal for that orbit.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum OrbitError {
    #[error("invalid parameter {name} = {value}: {reason}")]
    InvalidParameter {
        name: &'static str,
        value: f64,
        reason: &'static str,
    },

    /// `index` is the orbit slot that could not be filled, `point` the one it was computed from.
    #[error("no real solution for step {index} from {point} (discriminant {discriminant:e})")]
    Domain {
        index: usize,
        point: Point,
        discriminant: f64,
    },

    #[error("degenerate mapping for step {index} from {point} (denominator {denominator:e})")]
    DegenerateMapping {
        index: usize,
        point: Point,
        denominator: f64,
    },

    #[error("request {index} was dropped before a worker finished it")]
    Abandoned { index: usize },
}

impl OrbitError {
    pub fn at_step(index: usize, err: IterateError) -> OrbitError {
        match err {
            IterateError::Domain {
                point,
                discriminant,
            } => OrbitError::Domain {
                index,
                point,
                discriminant,
            },
            IterateError::Degenerate { point, denominator } => OrbitError::DegenerateMapping {
                index,
                point,
                denominator,
            },
        }
    }

    pub(crate) fn invalid(name: &'static str, value: f64, reason: &'static str) -> OrbitError {
        OrbitError::InvalidParameter {
            name,
            value,
            reason,
        }
    }
}
