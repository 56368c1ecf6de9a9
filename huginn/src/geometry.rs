//! Planar geometry helpers shared by navigation and the role strategies.
use std::f32::consts::{PI, TAU};

use nalgebra::{Point2, UnitComplex, Vector2};

/// Position and heading of an agent on the field.
///
/// The heading is in radians, counter-clockwise from the positive x-axis and always in
/// `(-π, π]`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Pose {
    pub position: Point2<f32>,
    pub heading: f32,
}

impl Pose {
    #[must_use]
    pub fn new(x: f32, y: f32, heading: f32) -> Self {
        Self {
            position: Point2::new(x, y),
            heading: wrap_angle(heading),
        }
    }

    /// Unit vector pointing in the direction the agent faces.
    #[must_use]
    pub fn forward(&self) -> Vector2<f32> {
        UnitComplex::new(self.heading) * Vector2::x()
    }

    /// Expresses a field point relative to the agent, x forward and y to the left.
    #[must_use]
    pub fn to_local(&self, point: &Point2<f32>) -> Vector2<f32> {
        UnitComplex::new(-self.heading) * (point - self.position)
    }

    /// Moves the agent by a displacement given in its own frame, then turns it.
    pub fn advance(&mut self, local: Vector2<f32>, turn: f32) {
        self.position += UnitComplex::new(self.heading) * local;
        self.heading = wrap_angle(self.heading + turn);
    }

    #[must_use]
    pub fn distance_to(&self, point: &Point2<f32>) -> f32 {
        distance(&self.position, point)
    }
}

/// Scales `vector` to unit length, leaving a zero vector untouched.
#[must_use]
pub fn normalize(vector: Vector2<f32>) -> Vector2<f32> {
    vector.try_normalize(f32::EPSILON).unwrap_or(vector)
}

#[must_use]
pub fn distance(a: &Point2<f32>, b: &Point2<f32>) -> f32 {
    nalgebra::distance(a, b)
}

/// Signed angle to turn from `from` to reach `to`, in `(-π, π]`.
///
/// Positive values are counter-clockwise, i.e. a left turn.
#[must_use]
pub fn angle_difference(from: f32, to: f32) -> f32 {
    let difference = (to - from + PI).rem_euclid(TAU) - PI;

    if difference <= -PI {
        difference + TAU
    } else {
        difference
    }
}

/// Wraps an angle into `(-π, π]`.
#[must_use]
pub fn wrap_angle(angle: f32) -> f32 {
    angle_difference(0.0, angle)
}

/// Angle of `direction` measured from the positive x-axis.
#[must_use]
pub fn heading_of(direction: &Vector2<f32>) -> f32 {
    direction.y.atan2(direction.x)
}

/// Rotates `vector` counter-clockwise by `angle` radians.
#[must_use]
pub fn rotate(vector: Vector2<f32>, angle: f32) -> Vector2<f32> {
    UnitComplex::new(angle) * vector
}
