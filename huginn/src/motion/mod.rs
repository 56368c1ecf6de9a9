//! Locomotion capability and the navigation primitives built on top of it.
use strum::{Display, EnumIter, IntoStaticStr};

pub mod navigation;

pub use navigation::{Navigator, Turn};

/// Pre-recorded motions the agent can play.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, IntoStaticStr)]
pub enum MotionId {
    SmallForwards,
    LargeForwards,
    Backwards,
    TurnLeft,
    TurnRight,
    SideStepLeft,
    SideStepRight,
    StandUpFromFront,
    StandUpFromBack,
    Kick,
}

impl MotionId {
    #[must_use]
    pub fn is_stand_up(self) -> bool {
        matches!(self, MotionId::StandUpFromFront | MotionId::StandUpFromBack)
    }

    /// Motions that are always played to the end.
    #[must_use]
    pub fn is_uninterruptible(self) -> bool {
        self.is_stand_up() || self == MotionId::Kick
    }
}

/// Plays motions on the body of the agent.
///
/// At most one motion plays at a time. Playing a new motion replaces the current one.
pub trait Locomotion {
    fn play(&mut self, motion: MotionId);

    /// Stops the current motion, if any.
    fn stop(&mut self);

    /// Whether the last motion finished playing, `true` if nothing was played yet.
    fn is_over(&self) -> bool;

    /// The motion that was played last, until it is stopped.
    fn current(&self) -> Option<MotionId>;

    /// Whether a stand-up motion is currently playing.
    fn is_standing_up(&self) -> bool {
        self.current().is_some_and(MotionId::is_stand_up) && !self.is_over()
    }

    /// Whether a motion is playing that may not be interrupted.
    fn is_busy(&self) -> bool {
        self.current().is_some_and(MotionId::is_uninterruptible) && !self.is_over()
    }
}
