use std::f32::consts::TAU;

use bifrost::communication::Role;

use crate::{
    behavior::{Action, Context, Strategy, approach_and_kick},
    geometry::{distance, normalize, rotate},
};

/// Lines up behind the ball, as seen from the opponent goal, and kicks it.
///
/// An agent on the goal side of the ball walks around it through one of two points at ±120°
/// from the ball-to-goal direction, so it does not push the ball towards its own goal.
pub struct Striker;

impl Strategy for Striker {
    const ROLE: Role = Role::Striker;

    fn decide(context: &Context) -> Action {
        let config = &context.roles.striker;
        let ball = context.ball();
        let position = context.pose.position;

        if context.ball_distance() > config.far_distance {
            return Action::Approach(ball);
        }

        let to_goal = normalize(context.opponent_goal() - ball);
        let to_self = normalize(position - ball);
        let alignment = to_goal.dot(&to_self);

        if alignment < -config.alignment_threshold {
            return approach_and_kick(context);
        }

        if alignment > config.alignment_threshold {
            let [left, right] = [TAU / 3.0, -TAU / 3.0]
                .map(|angle| ball + rotate(to_goal, angle) * config.reposition_distance);

            let target = if distance(&position, &left) <= distance(&position, &right) {
                left
            } else {
                right
            };
            tracing::debug!(?target, alignment, "walking around the ball");
            return Action::Approach(target);
        }

        Action::Approach(ball - to_goal * config.behind_distance)
    }
}
