//! Turn-then-walk navigation on top of the [`Locomotion`] capability.
//!
//! Every call advances navigation by at most one motion. Reaching a target relies on the
//! navigator being stepped again on every tick.
use bifrost::communication::MotionState;
use nalgebra::{Point2, Vector2};

use super::{Locomotion, MotionId};
use crate::{
    config::NavigationConfig,
    geometry::{Pose, angle_difference, heading_of},
};

/// Outcome of [`Navigator::turn_to_heading`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Turn {
    /// Already facing the requested direction.
    NotNeeded,
    /// A turn is playing.
    InProgress,
}

/// Owns the local [`MotionState`] and the target it refers to.
#[derive(Debug, Clone)]
pub struct Navigator {
    config: NavigationConfig,
    state: MotionState,
    target: Option<Point2<f32>>,
    direction: Option<Vector2<f32>>,
}

impl Navigator {
    #[must_use]
    pub fn new(config: &NavigationConfig) -> Self {
        Self {
            config: config.clone(),
            state: MotionState::Idle,
            target: None,
            direction: None,
        }
    }

    #[must_use]
    pub fn state(&self) -> MotionState {
        self.state
    }

    #[must_use]
    pub fn target(&self) -> Option<Point2<f32>> {
        self.target
    }

    #[must_use]
    pub fn config(&self) -> &NavigationConfig {
        &self.config
    }

    /// Switches to `state`, stopping whatever the previous state was still playing.
    pub fn set_state(&mut self, locomotion: &mut impl Locomotion, state: MotionState) {
        if state == self.state {
            return;
        }

        if !locomotion.is_over() {
            locomotion.stop();
        }

        tracing::debug!(from = %self.state, to = %state, "motion state");
        self.state = state;
    }

    /// Drops the target and goes idle.
    pub fn halt(&mut self, locomotion: &mut impl Locomotion) {
        self.target = None;
        self.direction = None;
        self.set_state(locomotion, MotionState::Idle);
    }

    /// Turns towards `direction`.
    ///
    /// When the heading error is below `threshold`, the agent either starts walking
    /// (`then_move`) or goes idle. Otherwise a single turn motion is started, if the previous
    /// motion finished.
    pub fn turn_to_heading(
        &mut self,
        locomotion: &mut impl Locomotion,
        pose: &Pose,
        direction: Vector2<f32>,
        threshold: f32,
        then_move: bool,
    ) -> Turn {
        let difference = angle_difference(pose.heading, heading_of(&direction));

        if difference.abs() < threshold {
            let next = if then_move {
                MotionState::Moving
            } else {
                MotionState::Idle
            };
            self.direction = None;
            self.set_state(locomotion, next);
            return Turn::NotNeeded;
        }

        self.direction = Some(direction);
        self.set_state(locomotion, MotionState::Turning);

        if locomotion.is_over() {
            let motion = if difference > 0.0 {
                MotionId::TurnLeft
            } else {
                MotionId::TurnRight
            };
            locomotion.play(motion);
        }

        Turn::InProgress
    }

    /// Sets a new target and starts walking to it.
    ///
    /// When the target is already within the arrival threshold the agent goes idle without
    /// any motion being played. While walking, a step that is still playing is not interrupted,
    /// the new target is picked up once it finished.
    pub fn go_to(&mut self, locomotion: &mut impl Locomotion, pose: &Pose, target: Point2<f32>) {
        self.target = Some(target);

        if pose.distance_to(&target) < self.config.arrival_threshold {
            tracing::debug!(?target, "already at target");
            self.direction = None;
            self.state = MotionState::Idle;
            return;
        }

        let direction = target - pose.position;
        if !locomotion.is_over() {
            match self.state {
                MotionState::Moving => return,
                MotionState::Turning => {
                    self.direction = Some(direction);
                    return;
                }
                _ => {}
            }
        }

        let threshold = self.config.go_to_turn_threshold();
        if self.turn_to_heading(locomotion, pose, direction, threshold, true) == Turn::NotNeeded {
            locomotion.play(MotionId::SmallForwards);
        }
    }

    /// Continues walking to the target. Returns `true` once it is reached.
    pub fn move_to_position(&mut self, locomotion: &mut impl Locomotion, pose: &Pose) -> bool {
        let Some(target) = self.target else {
            self.halt(locomotion);
            return true;
        };

        let distance = pose.distance_to(&target);
        if distance < self.config.arrival_threshold {
            tracing::debug!(?target, "reached target");
            self.halt(locomotion);
            return true;
        }

        if locomotion.is_over() {
            let direction = target - pose.position;
            let threshold = self.config.turn_threshold();
            if self.turn_to_heading(locomotion, pose, direction, threshold, true) == Turn::InProgress
            {
                return false;
            }

            let step = if distance < self.config.small_step_distance() {
                MotionId::SmallForwards
            } else {
                MotionId::LargeForwards
            };
            locomotion.play(step);
        }

        false
    }

    /// Starts stepping sideways to `target`, keeping the current heading.
    pub fn slide_to(&mut self, locomotion: &mut impl Locomotion, pose: &Pose, target: Point2<f32>) {
        self.target = Some(target);
        self.direction = None;
        self.set_state(locomotion, MotionState::Sliding);
        self.side_step_to_position(locomotion, pose);
    }

    /// Continues stepping sideways. Returns `true` once the target is reached.
    pub fn side_step_to_position(&mut self, locomotion: &mut impl Locomotion, pose: &Pose) -> bool {
        let Some(target) = self.target else {
            self.halt(locomotion);
            return true;
        };

        if pose.distance_to(&target) < self.config.arrival_threshold {
            self.halt(locomotion);
            return true;
        }

        if locomotion.is_over() {
            let step = if pose.to_local(&target).y > 0.0 {
                MotionId::SideStepLeft
            } else {
                MotionId::SideStepRight
            };
            locomotion.play(step);
        }

        false
    }

    /// Starts walking backwards to `target`, keeping the current heading.
    pub fn back_up_to(&mut self, locomotion: &mut impl Locomotion, pose: &Pose, target: Point2<f32>) {
        self.target = Some(target);
        self.direction = None;
        self.set_state(locomotion, MotionState::Backing);
        self.back_up(locomotion, pose);
    }

    /// Continues walking backwards. Returns `true` once the target is reached.
    pub fn back_up(&mut self, locomotion: &mut impl Locomotion, pose: &Pose) -> bool {
        let Some(target) = self.target else {
            self.halt(locomotion);
            return true;
        };

        // Stop as well once the target is no longer behind the agent.
        if pose.distance_to(&target) < self.config.arrival_threshold
            || pose.to_local(&target).x >= 0.0
        {
            self.halt(locomotion);
            return true;
        }

        if locomotion.is_over() {
            locomotion.play(MotionId::Backwards);
        }

        false
    }

    /// Faces `direction` without walking afterwards.
    pub fn face(&mut self, locomotion: &mut impl Locomotion, pose: &Pose, direction: Vector2<f32>) {
        self.target = None;
        let threshold = self.config.turn_threshold();
        self.turn_to_heading(locomotion, pose, direction, threshold, false);
    }

    pub fn kick(&mut self, locomotion: &mut impl Locomotion) {
        self.target = None;
        self.direction = None;
        self.set_state(locomotion, MotionState::Kicking);
        locomotion.play(MotionId::Kick);
    }

    /// Starts getting back up after a fall.
    pub fn recover(&mut self, locomotion: &mut impl Locomotion) {
        self.target = None;
        self.direction = None;
        self.set_state(locomotion, MotionState::Recovering);
        locomotion.play(MotionId::StandUpFromBack);
    }

    /// Advances whatever navigation is in progress by one step.
    pub fn step(&mut self, locomotion: &mut impl Locomotion, pose: &Pose) {
        match self.state {
            MotionState::Moving => {
                self.move_to_position(locomotion, pose);
            }
            MotionState::Turning => {
                let Some(direction) = self.direction else {
                    self.halt(locomotion);
                    return;
                };
                let threshold = self.config.go_to_turn_threshold();
                let then_move = self.target.is_some();

                if self.turn_to_heading(locomotion, pose, direction, threshold, then_move)
                    == Turn::NotNeeded
                    && then_move
                {
                    self.move_to_position(locomotion, pose);
                }
            }
            MotionState::Sliding => {
                self.side_step_to_position(locomotion, pose);
            }
            MotionState::Backing => {
                self.back_up(locomotion, pose);
            }
            MotionState::Idle | MotionState::Kicking | MotionState::Recovering => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use std::f32::consts::FRAC_PI_2;

    use super::*;

    /// Records every command, motions finish whenever the test says so.
    #[derive(Default)]
    struct Recorder {
        played: Vec<MotionId>,
        stops: usize,
        current: Option<MotionId>,
        over: bool,
    }

    impl Recorder {
        fn finish(&mut self) {
            self.over = true;
        }
    }

    impl Locomotion for Recorder {
        fn play(&mut self, motion: MotionId) {
            self.played.push(motion);
            self.current = Some(motion);
            self.over = false;
        }

        fn stop(&mut self) {
            self.stops += 1;
            self.current = None;
            self.over = true;
        }

        fn is_over(&self) -> bool {
            self.current.is_none() || self.over
        }

        fn current(&self) -> Option<MotionId> {
            self.current
        }
    }

    fn navigator() -> Navigator {
        Navigator::new(&NavigationConfig::default())
    }

    #[test]
    fn test_retargeting_lets_the_current_step_finish() {
        let mut navigator = navigator();
        let mut locomotion = Recorder::default();
        let pose = Pose::default();

        navigator.go_to(&mut locomotion, &pose, Point2::new(3.0, 0.0));
        locomotion.finish();
        navigator.step(&mut locomotion, &pose);
        assert_eq!(locomotion.current, Some(MotionId::LargeForwards));

        navigator.go_to(&mut locomotion, &pose, Point2::new(4.0, 0.0));
        assert_eq!(
            locomotion.played,
            [MotionId::SmallForwards, MotionId::LargeForwards]
        );
        assert_eq!(locomotion.stops, 0);
        assert_eq!(navigator.state(), MotionState::Moving);
        assert_eq!(navigator.target(), Some(Point2::new(4.0, 0.0)));

        locomotion.finish();
        navigator.step(&mut locomotion, &pose);
        assert_eq!(locomotion.played.len(), 3);
    }

    #[test]
    fn test_go_to_when_already_there_issues_nothing() {
        let mut navigator = navigator();
        let mut locomotion = Recorder::default();

        navigator.go_to(&mut locomotion, &Pose::new(1.0, 1.0, 0.0), Point2::new(1.1, 1.0));

        assert_eq!(navigator.state(), MotionState::Idle);
        assert!(locomotion.played.is_empty());
        assert_eq!(locomotion.stops, 0);
    }

    #[test]
    fn test_go_to_straight_ahead_walks() {
        let mut navigator = navigator();
        let mut locomotion = Recorder::default();

        navigator.go_to(&mut locomotion, &Pose::default(), Point2::new(2.0, 0.0));

        assert_eq!(navigator.state(), MotionState::Moving);
        assert_eq!(locomotion.played, [MotionId::SmallForwards]);
    }

    #[test]
    fn test_go_to_behind_turns_first() {
        let mut navigator = navigator();
        let mut locomotion = Recorder::default();

        navigator.go_to(&mut locomotion, &Pose::default(), Point2::new(0.0, 2.0));
        assert_eq!(navigator.state(), MotionState::Turning);
        assert_eq!(locomotion.played, [MotionId::TurnLeft]);

        // Still turning, the running turn is not restarted.
        navigator.step(&mut locomotion, &Pose::new(0.0, 0.0, 0.5));
        assert_eq!(locomotion.played.len(), 1);

        // Aligned: the turn is cut short and walking starts.
        navigator.step(&mut locomotion, &Pose::new(0.0, 0.0, FRAC_PI_2));
        assert_eq!(locomotion.stops, 1);
        assert_eq!(navigator.state(), MotionState::Moving);
        assert_eq!(
            locomotion.played,
            [MotionId::TurnLeft, MotionId::LargeForwards]
        );
    }

    #[test]
    fn test_turn_direction_follows_sign() {
        let mut navigator = navigator();
        let mut locomotion = Recorder::default();

        let turn = navigator.turn_to_heading(
            &mut locomotion,
            &Pose::default(),
            Vector2::new(0.0, -1.0),
            0.1,
            false,
        );

        assert_eq!(turn, Turn::InProgress);
        assert_eq!(locomotion.played, [MotionId::TurnRight]);
    }

    #[test]
    fn test_aligned_without_move_goes_idle() {
        let mut navigator = navigator();
        let mut locomotion = Recorder::default();

        let turn = navigator.turn_to_heading(
            &mut locomotion,
            &Pose::default(),
            Vector2::new(1.0, 0.01),
            0.1,
            false,
        );

        assert_eq!(turn, Turn::NotNeeded);
        assert_eq!(navigator.state(), MotionState::Idle);
    }

    #[test]
    fn test_step_size_depends_on_distance() {
        let mut navigator = navigator();
        let mut locomotion = Recorder::default();
        let target = Point2::new(3.0, 0.0);

        navigator.go_to(&mut locomotion, &Pose::default(), target);
        locomotion.finish();

        navigator.step(&mut locomotion, &Pose::new(1.0, 0.0, 0.0));
        locomotion.finish();
        navigator.step(&mut locomotion, &Pose::new(2.6, 0.0, 0.0));
        locomotion.finish();
        assert!(navigator.move_to_position(&mut locomotion, &Pose::new(2.9, 0.0, 0.0)));

        assert_eq!(
            locomotion.played,
            [
                MotionId::SmallForwards,
                MotionId::LargeForwards,
                MotionId::SmallForwards
            ]
        );
        assert_eq!(navigator.state(), MotionState::Idle);
    }

    #[test]
    fn test_steps_wait_for_the_previous_motion() {
        let mut navigator = navigator();
        let mut locomotion = Recorder::default();

        navigator.go_to(&mut locomotion, &Pose::default(), Point2::new(3.0, 0.0));
        navigator.step(&mut locomotion, &Pose::new(0.05, 0.0, 0.0));
        navigator.step(&mut locomotion, &Pose::new(0.1, 0.0, 0.0));

        assert_eq!(locomotion.played, [MotionId::SmallForwards]);
    }

    #[test]
    fn test_side_step_picks_side_from_lateral_offset() {
        let mut navigator = navigator();
        let mut locomotion = Recorder::default();

        navigator.slide_to(&mut locomotion, &Pose::new(0.0, 0.0, FRAC_PI_2), Point2::new(-1.0, 0.0));
        assert_eq!(navigator.state(), MotionState::Sliding);
        assert_eq!(locomotion.played, [MotionId::SideStepLeft]);
    }

    #[test]
    fn test_back_up_until_target_is_reached() {
        let mut navigator = navigator();
        let mut locomotion = Recorder::default();

        navigator.back_up_to(&mut locomotion, &Pose::default(), Point2::new(-1.0, 0.0));
        assert_eq!(navigator.state(), MotionState::Backing);
        locomotion.finish();

        assert!(!navigator.back_up(&mut locomotion, &Pose::new(-0.5, 0.0, 0.0)));
        assert!(navigator.back_up(&mut locomotion, &Pose::new(-0.9, 0.0, 0.0)));
        assert_eq!(locomotion.played, [MotionId::Backwards, MotionId::Backwards]);
        assert_eq!(navigator.state(), MotionState::Idle);
    }

    #[test]
    fn test_switching_state_stops_running_motion() {
        let mut navigator = navigator();
        let mut locomotion = Recorder::default();

        navigator.go_to(&mut locomotion, &Pose::default(), Point2::new(3.0, 0.0));
        navigator.kick(&mut locomotion);

        assert_eq!(locomotion.stops, 1);
        assert_eq!(navigator.state(), MotionState::Kicking);
        assert_eq!(locomotion.current(), Some(MotionId::Kick));
    }
}
