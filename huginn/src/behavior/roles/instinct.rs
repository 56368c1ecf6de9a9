use bifrost::communication::Role;

use crate::behavior::{Action, Context, Strategy, approach_and_kick};

/// What an agent without a role does: chase the ball and kick it.
pub struct Instinct;

impl Strategy for Instinct {
    const ROLE: Role = Role::Unassigned;

    fn decide(context: &Context) -> Action {
        approach_and_kick(context)
    }
}

#[cfg(test)]
mod tests {
    use bifrost::communication::TeamNumber;
    use nalgebra::Point2;

    use super::*;
    use crate::{
        behavior::roles::testing::{context, world},
        config::HuginnConfig,
        geometry::Pose,
    };

    #[test]
    fn test_chases_then_kicks() {
        let config = HuginnConfig::default();
        let world = world(TeamNumber::One, (2.0, 1.0));

        let far = context(Pose::default(), &world, &config);
        assert_eq!(Instinct::decide(&far), Action::Approach(Point2::new(2.0, 1.0)));

        let close = context(Pose::new(1.9, 1.0, 0.0), &world, &config);
        assert_eq!(Instinct::decide(&close), Action::Kick);
    }
}
