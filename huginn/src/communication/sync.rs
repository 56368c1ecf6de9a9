//! Throttled reporting of the agent's own state.
use std::time::Duration;

use bifrost::communication::{AgentId, Freshness, Message, MotionState, StateReport};

use crate::{
    config::SyncConfig,
    geometry::{Pose, angle_difference},
};

/// Decides when the pose and motion state of the agent are worth a `STATE` frame.
///
/// A report goes out when forced, when the agent moved or turned far enough since the last
/// report, when its motion state changed, or when the keep-alive interval passed.
#[derive(Debug, Clone)]
pub struct StateReporter {
    distance_threshold: f32,
    heading_threshold: f32,
    keep_alive: Duration,
    tolerance: Option<Duration>,
    last: Option<LastReport>,
}

#[derive(Debug, Clone, Copy)]
struct LastReport {
    pose: Pose,
    motion_state: MotionState,
    sent_at: Duration,
}

impl StateReporter {
    #[must_use]
    pub fn new(config: &SyncConfig) -> Self {
        Self {
            distance_threshold: config.report_distance,
            heading_threshold: config.report_heading(),
            keep_alive: config.keep_alive,
            tolerance: config.stamp_reports.then_some(config.delay_tolerance),
            last: None,
        }
    }

    /// Caps the time between two reports at `keep_alive`.
    #[must_use]
    pub fn with_keep_alive(mut self, keep_alive: Duration) -> Self {
        self.keep_alive = keep_alive;
        self
    }

    #[must_use]
    pub fn needs_report(&self, pose: &Pose, motion_state: MotionState, now: Duration) -> bool {
        let Some(last) = &self.last else {
            return true;
        };

        pose.distance_to(&last.pose.position) > self.distance_threshold
            || angle_difference(last.pose.heading, pose.heading).abs() > self.heading_threshold
            || motion_state != last.motion_state
            || now.saturating_sub(last.sent_at) >= self.keep_alive
    }

    /// Returns the `STATE` frame to send, if one is due.
    pub fn encode_and_maybe_send(
        &mut self,
        agent: &AgentId,
        pose: Pose,
        motion_state: MotionState,
        now: Duration,
        force: bool,
    ) -> Option<Message> {
        if !force && !self.needs_report(&pose, motion_state, now) {
            return None;
        }

        self.last = Some(LastReport {
            pose,
            motion_state,
            sent_at: now,
        });

        Some(Message::State(StateReport {
            agent: agent.clone(),
            motion_state,
            x: pose.position.x,
            y: pose.position.y,
            heading: pose.heading,
            freshness: self.tolerance.map(|tolerance| Freshness {
                timestamp: now.as_secs_f32(),
                tolerance: tolerance.as_secs_f32(),
            }),
        }))
    }
}
