//! The per-tick decision pipeline of an agent.
use std::time::Duration;

use bifrost::communication::{Message, MotionState, Role};
use nalgebra::Point2;

use super::{Action, Context, GraceWindow, decide};
use crate::{
    communication::StateReporter,
    config::HuginnConfig,
    geometry::{Pose, distance},
    motion::{Locomotion, Navigator},
    sensor::{FallDetector, Sensing},
    world::{Applied, Control, WorldModel},
};

/// Drives a single agent.
///
/// The engine is the only thing that mutates the world model, the pose and the motion state of
/// the agent. It is generic over the body it drives, so it never sees a concrete robot.
pub struct Engine<L: Locomotion, S: Sensing> {
    locomotion: L,
    sensing: S,
    config: HuginnConfig,
    world: WorldModel,
    navigator: Navigator,
    fall_detector: FallDetector,
    grace: GraceWindow,
    reporter: StateReporter,
    /// A `RESET` was received and has not been acknowledged yet.
    reset_pending: bool,
    /// Waiting for `START`.
    paused: bool,
    force_report: bool,
    /// Someone new needs to learn the role of this agent.
    role_requested: bool,
}

impl<L: Locomotion, S: Sensing> Engine<L, S> {
    pub fn new(locomotion: L, sensing: S, config: HuginnConfig) -> Self {
        let mut grace = GraceWindow::default();
        grace.extend(sensing.now(), config.timing.settle_time);

        let mut world = WorldModel::new();
        world.set_pose(sensing.pose());

        Self {
            navigator: Navigator::new(&config.navigation),
            fall_detector: FallDetector::new(&config.falling),
            reporter: StateReporter::new(&config.sync).with_keep_alive(config.keep_alive()),
            paused: config.timing.await_start,
            locomotion,
            sensing,
            config,
            world,
            grace,
            reset_pending: false,
            force_report: false,
            role_requested: false,
        }
    }

    /// Sets the role the agent plays until the relay assigns another one.
    #[must_use]
    pub fn with_role(mut self, role: Role) -> Self {
        self.world.set_role(role);
        self
    }

    #[must_use]
    pub fn world(&self) -> &WorldModel {
        &self.world
    }

    #[must_use]
    pub fn config(&self) -> &HuginnConfig {
        &self.config
    }

    #[must_use]
    pub fn motion_state(&self) -> MotionState {
        self.navigator.state()
    }

    #[must_use]
    pub fn navigator(&self) -> &Navigator {
        &self.navigator
    }

    #[must_use]
    pub fn grace(&self) -> &GraceWindow {
        &self.grace
    }

    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    #[must_use]
    pub fn locomotion(&self) -> &L {
        &self.locomotion
    }

    /// Runs one tick: applies the inbound messages, decides, and returns the frames to send.
    pub fn tick(&mut self, inbound: impl IntoIterator<Item = Message>) -> Vec<Message> {
        let now = self.sensing.now();
        let pose = self.sensing.pose();
        self.world.set_pose(pose);

        let mut outbox = Vec::new();
        for message in inbound {
            self.handle(message, now);
        }
        if std::mem::take(&mut self.role_requested) {
            self.announce_role(&mut outbox);
        }
        self.world.purge_stale(now, self.config.timing.peer_timeout);

        if self.paused {
            tracing::trace!("waiting for start");
            self.acknowledge_reset(now, &mut outbox);
        } else {
            self.decide(now, &pose, &mut outbox);
        }

        self.report(now, pose, &mut outbox);
        outbox
    }

    fn handle(&mut self, message: Message, now: Duration) {
        match self.world.apply(message, now) {
            // Newcomers only hear about roles and poses announced after they joined.
            Applied::Identity | Applied::Joined => {
                self.force_report = true;
                self.role_requested = true;
            }
            Applied::Control(Control::Revert(duration)) => {
                tracing::info!(?duration, "reverted");
                self.grace.extend(now, duration);
                self.navigator.halt(&mut self.locomotion);
            }
            Applied::Control(Control::Reset) => {
                tracing::info!("reset requested");
                self.reset_pending = true;
                self.grace.extend(now, self.config.timing.settle_time);
                self.navigator.halt(&mut self.locomotion);
            }
            Applied::Control(Control::Start(setup)) => {
                tracing::info!(?setup, "match started");
                self.paused = false;
                self.grace.extend(now, setup);
            }
            Applied::Updated | Applied::Ignored(_) => {}
        }
    }

    fn decide(&mut self, now: Duration, pose: &Pose, outbox: &mut Vec<Message>) {
        // Stand-ups and kicks always play to the end.
        if self.locomotion.is_busy() {
            tracing::trace!(motion = ?self.locomotion.current(), "motion in progress");
            return;
        }

        if self.locomotion.is_over()
            && !self.grace.is_active(now)
            && self
                .fall_detector
                .classify(&self.sensing.foot_forces())
                .is_fallen()
        {
            self.navigator.recover(&mut self.locomotion);
            return;
        }

        if matches!(
            self.navigator.state(),
            MotionState::Recovering | MotionState::Kicking
        ) {
            self.navigator.halt(&mut self.locomotion);
        }

        if self.acknowledge_reset(now, outbox) {
            return;
        }

        let context = Context {
            pose: *pose,
            world: &self.world,
            field: &self.config.field,
            navigation: &self.config.navigation,
            roles: &self.config.roles,
        };
        let action = decide(self.world.role(), &context);
        tracing::debug!(?action, role = %self.world.role(), "decided");

        self.execute(action, pose);
    }

    fn announce_role(&self, outbox: &mut Vec<Message>) {
        let role = self.world.role();
        if role == Role::Unassigned {
            return;
        }
        if let Some(agent) = self.world.agent() {
            outbox.push(Message::Role {
                agent: agent.clone(),
                role,
            });
        }
    }

    /// Sends the `ACK` for a pending reset once the grace window closed.
    ///
    /// Returns whether a reset was pending, in which case the role logic sits this tick out.
    fn acknowledge_reset(&mut self, now: Duration, outbox: &mut Vec<Message>) -> bool {
        if !self.reset_pending {
            return false;
        }
        if self.grace.is_active(now) {
            return true;
        }

        if let Some(agent) = self.world.agent() {
            outbox.push(Message::Ack {
                agent: agent.clone(),
            });
        }
        tracing::info!("settled after reset");
        self.reset_pending = false;
        true
    }

    /// Turns an action into at most one navigation step.
    fn execute(&mut self, action: Action, pose: &Pose) {
        let navigator = &mut self.navigator;
        let locomotion = &mut self.locomotion;

        match action {
            Action::None => {}
            Action::Hold => navigator.halt(locomotion),
            Action::Approach(target) => {
                if continues(navigator, &[MotionState::Moving, MotionState::Turning], target) {
                    navigator.step(locomotion, pose);
                } else {
                    navigator.go_to(locomotion, pose, target);
                }
            }
            Action::Slide(target) => {
                if continues(navigator, &[MotionState::Sliding], target) {
                    navigator.step(locomotion, pose);
                } else {
                    navigator.slide_to(locomotion, pose, target);
                }
            }
            Action::BackUp(target) => {
                if continues(navigator, &[MotionState::Backing], target) {
                    navigator.step(locomotion, pose);
                } else {
                    navigator.back_up_to(locomotion, pose, target);
                }
            }
            Action::Face(direction) => navigator.face(locomotion, pose, direction),
            Action::Kick => navigator.kick(locomotion),
        }
    }

    fn report(&mut self, now: Duration, pose: Pose, outbox: &mut Vec<Message>) {
        if self.grace.is_active(now) {
            return;
        }
        let Some(agent) = self.world.agent() else {
            return;
        };

        let force = std::mem::take(&mut self.force_report);
        if let Some(report) =
            self.reporter
                .encode_and_maybe_send(agent, pose, self.navigator.state(), now, force)
        {
            outbox.push(report);
        }
    }
}

/// Whether navigation towards `target` is already under way, in one of `states`.
fn continues(navigator: &Navigator, states: &[MotionState], target: Point2<f32>) -> bool {
    states.contains(&navigator.state())
        && navigator.target().is_some_and(|current| {
            distance(&current, &target) <= navigator.config().retarget_distance
        })
}
