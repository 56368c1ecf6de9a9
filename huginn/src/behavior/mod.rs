//! Role-conditioned decision making.
//!
//! Every tick the [`Engine`] asks the strategy of the agent's current [`Role`] for an
//! [`Action`], and turns that action into a single navigation step. Strategies are pure: they
//! only look at the [`Context`].
use bifrost::communication::{Role, TeamNumber};
use nalgebra::{Point2, Vector2};

use crate::{
    config::{FieldConfig, NavigationConfig, RolesConfig},
    geometry::Pose,
    world::WorldModel,
};

pub mod engine;
pub mod grace;
pub mod roles;

pub use engine::Engine;
pub use grace::{GraceWindow, PendingDelay};

/// What a strategy wants the agent to do next.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Action {
    /// Do nothing at all this tick.
    None,
    /// Stop and stay where the agent is.
    Hold,
    /// Walk to a point, turning towards it first.
    Approach(Point2<f32>),
    /// Step sideways to a point without turning.
    Slide(Point2<f32>),
    /// Walk backwards to a point without turning.
    BackUp(Point2<f32>),
    /// Turn to face a direction.
    Face(Vector2<f32>),
    Kick,
}

/// Everything a strategy may base its decision on.
pub struct Context<'a> {
    pub pose: Pose,
    pub world: &'a WorldModel,
    pub field: &'a FieldConfig,
    pub navigation: &'a NavigationConfig,
    pub roles: &'a RolesConfig,
}

impl Context<'_> {
    /// The team of the agent, agents without a team play as team one.
    #[must_use]
    pub fn team(&self) -> TeamNumber {
        self.world.team().unwrap_or(TeamNumber::One)
    }

    /// Sign of the x direction the team attacks in.
    #[must_use]
    pub fn attack_direction(&self) -> f32 {
        match self.team() {
            TeamNumber::One => 1.0,
            TeamNumber::Two => -1.0,
        }
    }

    #[must_use]
    pub fn opponent_goal(&self) -> Point2<f32> {
        Point2::new(self.attack_direction() * self.field.goal_x, 0.0)
    }

    #[must_use]
    pub fn own_goal(&self) -> Point2<f32> {
        Point2::new(-self.attack_direction() * self.field.goal_x, 0.0)
    }

    #[must_use]
    pub fn ball(&self) -> Point2<f32> {
        self.world.ball_on_field()
    }

    #[must_use]
    pub fn ball_distance(&self) -> f32 {
        self.pose.distance_to(&self.ball())
    }
}

/// A role strategy.
pub trait Strategy {
    const ROLE: Role;

    fn decide(context: &Context) -> Action;
}

/// Runs the strategy belonging to `role`.
#[must_use]
pub fn decide(role: Role, context: &Context) -> Action {
    match role {
        Role::Goalie => roles::Goalie::decide(context),
        Role::Striker => roles::Striker::decide(context),
        Role::Midfielder => roles::Midfielder::decide(context),
        Role::Unassigned => roles::Instinct::decide(context),
    }
}

/// Walks to the ball and kicks it once close enough.
fn approach_and_kick(context: &Context) -> Action {
    if context.ball_distance() < context.roles.kick_distance {
        Action::Kick
    } else {
        Action::Approach(context.ball())
    }
}
