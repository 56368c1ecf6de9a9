//! Sensing capability and the filters that interpret it.
use std::time::Duration;

use nalgebra::Vector3;

use crate::geometry::Pose;

pub mod falling;

pub use falling::{FallDetector, FallState};

/// Forces measured under both feet, x and y are shear and z is vertical.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FootForces {
    pub left: Vector3<f32>,
    pub right: Vector3<f32>,
}

impl FootForces {
    /// Both feet carrying `weight` newton, evenly and without shear.
    #[must_use]
    pub fn standing(weight: f32) -> Self {
        let foot = Vector3::new(0.0, 0.0, weight / 2.0);
        Self {
            left: foot,
            right: foot,
        }
    }
}

/// Reads the state of the body of the agent.
pub trait Sensing {
    fn pose(&self) -> Pose;

    fn foot_forces(&self) -> FootForces;

    /// Time since the agent started.
    fn now(&self) -> Duration;
}
