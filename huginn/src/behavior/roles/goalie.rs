use bifrost::communication::Role;
use nalgebra::{Point2, Vector2};

use crate::{
    behavior::{Action, Context, Strategy, approach_and_kick},
    geometry::{angle_difference, heading_of},
};

/// Guards a line just in front of the own goal.
///
/// In order of precedence the goalie:
/// - clears the ball when it comes close,
/// - backs up towards the goal when the ball got past it,
/// - walks back to its line when it drifted off,
/// - faces the opponent goal,
/// - slides along its line to stay between ball and goal.
pub struct Goalie;

impl Strategy for Goalie {
    const ROLE: Role = Role::Goalie;

    fn decide(context: &Context) -> Action {
        let config = &context.roles.goalie;
        let ball = context.ball();
        let pose = context.pose;
        let forward = context.attack_direction();
        let facing = Vector2::new(forward, 0.0);
        let faces_forward = angle_difference(pose.heading, heading_of(&facing)).abs()
            < context.navigation.turn_threshold();

        if context.ball_distance() < config.engage_distance {
            return approach_and_kick(context);
        }

        let goal_line = context.own_goal().x;
        let ball_ahead = (ball.x - pose.position.x) * forward > 0.0;
        if !ball_ahead {
            // Backing up only works while facing away from the own goal.
            if !faces_forward {
                return Action::Face(facing);
            }

            let x = ball.x - forward * config.backup_margin;
            let x = if (x - goal_line) * forward < 0.0 {
                goal_line
            } else {
                x
            };
            return Action::BackUp(Point2::new(x, pose.position.y));
        }

        let line = goal_line + forward * config.line_offset;
        if (pose.position.x - line).abs() > config.line_tolerance {
            return Action::Approach(Point2::new(line, pose.position.y));
        }

        if !faces_forward {
            return Action::Face(facing);
        }

        let y = ball.y.clamp(-config.max_lateral, config.max_lateral);
        if (pose.position.y - y).abs() > context.navigation.arrival_threshold {
            return Action::Slide(Point2::new(pose.position.x, y));
        }

        Action::Hold
    }
}
