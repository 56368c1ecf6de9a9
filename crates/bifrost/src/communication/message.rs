use std::{fmt, time::Duration};

use strum::EnumString;

use super::types::{AgentId, MotionState, Role, TeamNumber};

/// Type tag of a frame, the first field on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumString)]
pub enum MessageKind {
    #[strum(to_string = "SETUP")]
    Setup,
    #[strum(to_string = "ADD")]
    Add,
    #[strum(to_string = "INFO")]
    Info,
    #[strum(to_string = "ROLE")]
    Role,
    #[strum(to_string = "STATE")]
    State,
    #[strum(to_string = "POS", serialize = "POSITION")]
    Position,
    #[strum(to_string = "BALL")]
    Ball,
    #[strum(to_string = "REVERT")]
    Revert,
    #[strum(to_string = "RESET")]
    Reset,
    #[strum(to_string = "ACK")]
    Ack,
    #[strum(to_string = "LEAVE")]
    Leave,
    #[strum(to_string = "START")]
    Start,
}

impl MessageKind {
    /// The tag written on the wire for this kind.
    #[must_use]
    pub fn tag(self) -> &'static str {
        match self {
            MessageKind::Setup => "SETUP",
            MessageKind::Add => "ADD",
            MessageKind::Info => "INFO",
            MessageKind::Role => "ROLE",
            MessageKind::State => "STATE",
            MessageKind::Position => "POS",
            MessageKind::Ball => "BALL",
            MessageKind::Revert => "REVERT",
            MessageKind::Reset => "RESET",
            MessageKind::Ack => "ACK",
            MessageKind::Leave => "LEAVE",
            MessageKind::Start => "START",
        }
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// A single decoded frame.
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    /// Identity assignment, sent by the relay to a newly connected agent.
    Setup { team: TeamNumber, agent: AgentId },
    /// A new agent joined the match.
    Add { team: TeamNumber, agent: AgentId },
    /// Identity exchange. The first one an agent receives configures itself, later ones
    /// register a peer.
    Info {
        agent: AgentId,
        team: Option<TeamNumber>,
    },
    /// Role assignment for either the receiving agent or one of its peers.
    Role { agent: AgentId, role: Role },
    /// Periodic, throttled pose and activity report.
    State(StateReport),
    /// Pose-only report, kept for older agents that do not send `STATE`.
    Position(PositionReport),
    /// Last known position of the ball.
    Ball(BallPosition),
    /// Start, or extend, the grace period of the receiving agent.
    Revert { duration: Duration },
    /// Ask the receiving agent to acknowledge once it has settled.
    Reset,
    /// The settle cycle started by a [`Message::Reset`] completed.
    Ack { agent: AgentId },
    /// An agent disconnected from the relay.
    Leave { agent: AgentId },
    /// Unpause the receiving agent after a setup period.
    Start { setup: Duration },
}

impl Message {
    #[must_use]
    pub fn kind(&self) -> MessageKind {
        match self {
            Message::Setup { .. } => MessageKind::Setup,
            Message::Add { .. } => MessageKind::Add,
            Message::Info { .. } => MessageKind::Info,
            Message::Role { .. } => MessageKind::Role,
            Message::State(_) => MessageKind::State,
            Message::Position(_) => MessageKind::Position,
            Message::Ball(_) => MessageKind::Ball,
            Message::Revert { .. } => MessageKind::Revert,
            Message::Reset => MessageKind::Reset,
            Message::Ack { .. } => MessageKind::Ack,
            Message::Leave { .. } => MessageKind::Leave,
            Message::Start { .. } => MessageKind::Start,
        }
    }

    /// The agent this message is about, if any.
    #[must_use]
    pub fn agent(&self) -> Option<&AgentId> {
        match self {
            Message::Setup { agent, .. }
            | Message::Add { agent, .. }
            | Message::Info { agent, .. }
            | Message::Role { agent, .. }
            | Message::Ack { agent }
            | Message::Leave { agent } => Some(agent),
            Message::State(report) => Some(&report.agent),
            Message::Position(report) => Some(&report.agent),
            Message::Ball(_) | Message::Revert { .. } | Message::Reset | Message::Start { .. } => {
                None
            }
        }
    }
}

/// Pose and motion state of an agent, as reported by the agent itself.
#[derive(Debug, Clone, PartialEq)]
pub struct StateReport {
    pub agent: AgentId,
    pub motion_state: MotionState,
    pub x: f32,
    pub y: f32,
    pub heading: f32,
    pub freshness: Option<Freshness>,
}

/// Timing information that lets a receiver discard reports that arrive too late.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Freshness {
    /// Sender clock when the report was made, in seconds.
    pub timestamp: f32,
    /// How long after `timestamp` the report is still worth applying, in seconds.
    pub tolerance: f32,
}

impl Freshness {
    /// Whether a report with this freshness has expired at `now` (in seconds).
    #[must_use]
    pub fn is_stale_at(&self, now: f32) -> bool {
        now > self.timestamp + self.tolerance
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PositionReport {
    pub agent: AgentId,
    pub x: f32,
    pub y: f32,
    pub heading: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BallPosition {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}
