//! Fall detection based on the force sensitive resistors under the feet.
use nalgebra::Vector3;

use super::FootForces;
use crate::config::FallConfig;

const VERTICAL_SCALE: f32 = 1.0 / 3.4;
const SHEAR_X_SCALE: f32 = 1.5;
const SHEAR_Y_SCALE: f32 = 1.15;
/// Largest force a single corner sensor can report.
const MAX_CORNER_FORCE: f32 = 25.0;

/// Whether the agent is on its feet.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum FallState {
    #[default]
    Upright,
    Fallen,
}

impl FallState {
    #[must_use]
    pub fn is_fallen(self) -> bool {
        self == FallState::Fallen
    }
}

/// Forces at the front-left, front-right, rear-right and rear-left corner of one foot.
#[must_use]
pub fn corner_forces(foot: &Vector3<f32>) -> [f32; 4] {
    let vertical = foot.z * VERTICAL_SCALE;
    let shear_x = foot.x * SHEAR_X_SCALE;
    let shear_y = foot.y * SHEAR_Y_SCALE;

    [
        vertical + shear_x + shear_y,
        vertical + shear_x - shear_y,
        vertical - shear_x - shear_y,
        vertical - shear_x + shear_y,
    ]
    .map(|force| force.clamp(0.0, MAX_CORNER_FORCE))
}

/// Sum of all eight clamped corner forces.
#[must_use]
pub fn total_force(forces: &FootForces) -> f32 {
    corner_forces(&forces.left)
        .into_iter()
        .chain(corner_forces(&forces.right))
        .sum()
}

/// Classifies the agent as fallen when too little weight rests on its feet.
///
/// The detector only classifies. Gating on running motions and the settle window is up to the
/// caller.
#[derive(Debug, Clone)]
pub struct FallDetector {
    threshold: f32,
}

impl FallDetector {
    #[must_use]
    pub fn new(config: &FallConfig) -> Self {
        Self {
            threshold: config.force_threshold,
        }
    }

    #[must_use]
    pub fn classify(&self, forces: &FootForces) -> FallState {
        let total = total_force(forces);

        if total < self.threshold {
            tracing::warn!(total, threshold = self.threshold, "agent has fallen");
            FallState::Fallen
        } else {
            FallState::Upright
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detector() -> FallDetector {
        FallDetector::new(&FallConfig::default())
    }

    #[test]
    fn test_standing_is_upright() {
        let forces = FootForces::standing(50.0);
        assert!((total_force(&forces) - 8.0 * 25.0 / 3.4).abs() < 1e-4);
        assert_eq!(detector().classify(&forces), FallState::Upright);
    }

    #[test]
    fn test_no_contact_is_fallen() {
        assert_eq!(
            detector().classify(&FootForces::default()),
            FallState::Fallen
        );
    }

    #[test]
    fn test_exact_threshold_is_not_fallen() {
        // Four corners of 1.25 newton each, on a single foot.
        let forces = FootForces {
            left: Vector3::new(0.0, 0.0, 1.25 * 3.4),
            right: Vector3::zeros(),
        };
        let total = total_force(&forces);
        let detector = FallDetector { threshold: total };

        assert_eq!(detector.classify(&forces), FallState::Upright);
    }

    #[test]
    fn test_corners_are_clamped() {
        let corners = corner_forces(&Vector3::new(40.0, 0.0, 0.0));
        assert_eq!(corners, [25.0, 25.0, 0.0, 0.0]);
    }

    #[test]
    fn test_less_force_never_raises_total() {
        let mut forces = FootForces {
            left: Vector3::new(1.0, -2.0, 60.0),
            right: Vector3::new(-0.5, 0.5, 30.0),
        };
        let mut previous = total_force(&forces);

        for _ in 0..40 {
            forces.left.z -= 2.5;
            forces.right.z -= 1.0;

            let total = total_force(&forces);
            assert!(total <= previous);
            previous = total;
        }
        assert_eq!(detector().classify(&forces), FallState::Fallen);
    }
}
