//! A kinematic stand-in for the robot body.
//!
//! Motions move the pose progressively over their duration, so stopping a motion halfway keeps
//! half of its effect. There is no dynamics: the body only falls when told to.
use std::{
    cell::RefCell,
    f32::consts::PI,
    rc::Rc,
    time::{Duration, Instant},
};

use nalgebra::Vector2;

use crate::{
    geometry::Pose,
    motion::{Locomotion, MotionId},
    sensor::{FootForces, Sensing},
};

/// Weight carried by the feet while upright, in newton.
const WEIGHT: f32 = 52.0;

/// Displacement and duration of a single motion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionProfile {
    /// Local displacement, x forwards and y to the left.
    pub step: Vector2<f32>,
    pub turn: f32,
    pub duration: Duration,
}

impl MotionProfile {
    fn new(forward: f32, left: f32, turn: f32, millis: u64) -> Self {
        Self {
            step: Vector2::new(forward, left),
            turn,
            duration: Duration::from_millis(millis),
        }
    }
}

#[must_use]
pub fn profile(motion: MotionId) -> MotionProfile {
    const TURN: f32 = 40.0 * PI / 180.0;

    match motion {
        MotionId::SmallForwards => MotionProfile::new(0.1, 0.0, 0.0, 1000),
        MotionId::LargeForwards => MotionProfile::new(0.4, 0.0, 0.0, 1600),
        MotionId::Backwards => MotionProfile::new(-0.1, 0.0, 0.0, 1200),
        MotionId::TurnLeft => MotionProfile::new(0.0, 0.0, TURN, 1200),
        MotionId::TurnRight => MotionProfile::new(0.0, 0.0, -TURN, 1200),
        MotionId::SideStepLeft => MotionProfile::new(0.0, 0.1, 0.0, 1000),
        MotionId::SideStepRight => MotionProfile::new(0.0, -0.1, 0.0, 1000),
        MotionId::StandUpFromFront | MotionId::StandUpFromBack => {
            MotionProfile::new(0.0, 0.0, 0.0, 3000)
        }
        MotionId::Kick => MotionProfile::new(0.0, 0.0, 0.0, 1500),
    }
}

#[derive(Debug, Clone, Copy)]
enum Clock {
    Manual(Duration),
    Wall(Instant),
}

impl Clock {
    fn now(&self) -> Duration {
        match self {
            Clock::Manual(now) => *now,
            Clock::Wall(start) => start.elapsed(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Playing {
    motion: MotionId,
    started: Duration,
}

#[derive(Debug)]
struct Body {
    clock: Clock,
    /// Pose at the start of the current motion.
    origin: Pose,
    playing: Option<Playing>,
    fallen: bool,
    played: Vec<MotionId>,
}

impl Body {
    fn progress(&self, playing: &Playing) -> f32 {
        let elapsed = self.clock.now().saturating_sub(playing.started);
        let duration = profile(playing.motion).duration;
        (elapsed.as_secs_f32() / duration.as_secs_f32()).min(1.0)
    }

    fn is_over(&self) -> bool {
        self.playing
            .as_ref()
            .is_none_or(|playing| self.progress(playing) >= 1.0)
    }

    fn pose(&self) -> Pose {
        let Some(playing) = &self.playing else {
            return self.origin;
        };
        if self.fallen || playing.motion.is_stand_up() {
            return self.origin;
        }

        let progress = self.progress(playing);
        let profile = profile(playing.motion);
        let mut pose = self.origin;
        pose.advance(profile.step * progress, profile.turn * progress);
        pose
    }

    fn is_fallen(&self) -> bool {
        let stood_up = self
            .playing
            .as_ref()
            .is_some_and(|playing| playing.motion.is_stand_up() && self.progress(playing) >= 1.0);
        self.fallen && !stood_up
    }

    /// Folds the effect of the current motion into the origin and ends it.
    fn settle(&mut self) {
        self.origin = self.pose();
        self.fallen = self.is_fallen();
        self.playing = None;
    }
}

/// A simulated body that implements both [`Locomotion`] and [`Sensing`].
///
/// Clones share the same body, so one clone can be handed to the engine as locomotion and
/// another one as sensing.
#[derive(Debug, Clone)]
pub struct KinematicNao {
    body: Rc<RefCell<Body>>,
}

impl KinematicNao {
    /// A body at `pose` whose clock only moves through [`KinematicNao::advance`].
    #[must_use]
    pub fn new(pose: Pose) -> Self {
        Self::with_clock(pose, Clock::Manual(Duration::ZERO))
    }

    /// A body at `pose` whose clock follows wall time.
    #[must_use]
    pub fn with_wall_clock(pose: Pose) -> Self {
        Self::with_clock(pose, Clock::Wall(Instant::now()))
    }

    fn with_clock(pose: Pose, clock: Clock) -> Self {
        Self {
            body: Rc::new(RefCell::new(Body {
                clock,
                origin: pose,
                playing: None,
                fallen: false,
                played: Vec::new(),
            })),
        }
    }

    /// Moves a manual clock forwards, a wall clock ignores this.
    pub fn advance(&self, elapsed: Duration) {
        if let Clock::Manual(now) = &mut self.body.borrow_mut().clock {
            *now += elapsed;
        }
    }

    /// Makes the body fall over where it stands, ending the current motion.
    pub fn knock_over(&self) {
        let mut body = self.body.borrow_mut();
        body.settle();
        body.fallen = true;
        tracing::debug!("knocked over");
    }

    /// Teleports the body, ending the current motion.
    pub fn set_pose(&self, pose: Pose) {
        let mut body = self.body.borrow_mut();
        body.settle();
        body.origin = pose;
    }

    #[must_use]
    pub fn is_fallen(&self) -> bool {
        self.body.borrow().is_fallen()
    }

    /// Every motion played so far, in order.
    #[must_use]
    pub fn played(&self) -> Vec<MotionId> {
        self.body.borrow().played.clone()
    }
}

impl Locomotion for KinematicNao {
    fn play(&mut self, motion: MotionId) {
        let mut body = self.body.borrow_mut();
        body.settle();
        let started = body.clock.now();
        body.playing = Some(Playing { motion, started });
        body.played.push(motion);
    }

    fn stop(&mut self) {
        self.body.borrow_mut().settle();
    }

    fn is_over(&self) -> bool {
        self.body.borrow().is_over()
    }

    fn current(&self) -> Option<MotionId> {
        self.body.borrow().playing.map(|playing| playing.motion)
    }
}

impl Sensing for KinematicNao {
    fn pose(&self) -> Pose {
        self.body.borrow().pose()
    }

    fn foot_forces(&self) -> FootForces {
        if self.is_fallen() {
            FootForces::default()
        } else {
            FootForces::standing(WEIGHT)
        }
    }

    fn now(&self) -> Duration {
        self.body.borrow().clock.now()
    }
}
