use bifrost::communication::Role;
use nalgebra::Point2;

use crate::{
    behavior::{Action, Context, Strategy},
    world::PeerRecord,
};

/// Supports the striker from one of two lanes beside the ball.
///
/// With a second midfielder around, each claims the lane it is relatively closer to, so the
/// two spread over both lanes.
pub struct Midfielder;

impl Strategy for Midfielder {
    const ROLE: Role = Role::Midfielder;

    fn decide(context: &Context) -> Action {
        let teammates: Vec<&PeerRecord> =
            context.world.teammates().map(|(_, peer)| peer).collect();
        let strikers = teammates
            .iter()
            .filter(|peer| peer.role == Role::Striker)
            .count();
        let midfielders: Vec<_> = teammates
            .iter()
            .filter(|peer| peer.role == Role::Midfielder)
            .collect();

        if strikers != 1 {
            tracing::debug!(strikers, "waiting for a single striker");
            return Action::None;
        }

        let ball = context.ball();
        let offset = context.roles.midfielder.lane_offset;
        let lanes = [
            Point2::new(ball.x, ball.y + offset),
            Point2::new(ball.x, ball.y - offset),
        ];
        let position = context.pose.position;

        let lane = match midfielders.as_slice() {
            [] => closest(lanes, |lane| (lane.y - position.y).abs()),
            [other] => closest(lanes, |lane| {
                nalgebra::distance(&position, lane) - nalgebra::distance(&other.pose.position, lane)
            }),
            _ => {
                tracing::debug!(midfielders = midfielders.len(), "too many midfielders");
                return Action::None;
            }
        };

        Action::Approach(lane)
    }
}

fn closest(lanes: [Point2<f32>; 2], cost: impl Fn(&Point2<f32>) -> f32) -> Point2<f32> {
    let [first, second] = lanes;

    if cost(&first) <= cost(&second) {
        first
    } else {
        second
    }
}
