//! The agent's view of the match: its own identity, its peers and the ball.
//!
//! Everything in here is advisory. Peers report at their own pace and the relay gives no
//! ordering guarantees, so the last message to arrive wins.
use std::{collections::HashMap, time::Duration};

use bifrost::communication::{AgentId, BallPosition, Message, MotionState, Role, TeamNumber};
use nalgebra::{Point2, Point3};

use crate::geometry::Pose;

/// What the world model knows about another agent.
#[derive(Debug, Clone, PartialEq)]
pub struct PeerRecord {
    pub team: Option<TeamNumber>,
    pub role: Role,
    /// Last motion state the peer reported, informational only.
    pub motion_state: MotionState,
    pub pose: Pose,
    /// Local time the peer was last heard from.
    pub last_seen: Duration,
}

impl PeerRecord {
    fn new(team: Option<TeamNumber>, now: Duration) -> Self {
        Self {
            team,
            role: Role::default(),
            motion_state: MotionState::default(),
            pose: Pose::default(),
            last_seen: now,
        }
    }
}

/// Signals for the engine carried by a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    /// Open or extend the grace window.
    Revert(Duration),
    /// Settle, then acknowledge.
    Reset,
    /// Unpause and open a grace window of the given length.
    Start(Duration),
}

/// Outcome of [`WorldModel::apply`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    /// The agent learned its own identity.
    Identity,
    /// The agent learned about a peer it did not know before.
    Joined,
    Updated,
    /// The message did not change anything.
    Ignored(Ignored),
    Control(Control),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ignored {
    /// The message is about this agent, which only trusts itself.
    OwnReport,
    /// The message names an agent that is not known.
    UnknownAgent,
    /// The report arrived after its delay tolerance.
    Stale,
    /// The message carries nothing for an agent.
    NotForAgents,
}

#[derive(Debug, Default)]
pub struct WorldModel {
    agent: Option<AgentId>,
    team: Option<TeamNumber>,
    role: Role,
    pose: Pose,
    peers: HashMap<AgentId, PeerRecord>,
    /// Peers purged for being silent, kept until they leave so they come back with their team
    /// and role.
    silent: HashMap<AgentId, PeerRecord>,
    ball: Point3<f32>,
}

impl WorldModel {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn agent(&self) -> Option<&AgentId> {
        self.agent.as_ref()
    }

    #[must_use]
    pub fn team(&self) -> Option<TeamNumber> {
        self.team
    }

    #[must_use]
    pub fn role(&self) -> Role {
        self.role
    }

    pub fn set_role(&mut self, role: Role) {
        self.role = role;
    }

    /// Own pose, as last sensed.
    #[must_use]
    pub fn pose(&self) -> Pose {
        self.pose
    }

    pub fn set_pose(&mut self, pose: Pose) {
        self.pose = pose;
    }

    #[must_use]
    pub fn ball(&self) -> Point3<f32> {
        self.ball
    }

    /// The ball projected onto the field.
    #[must_use]
    pub fn ball_on_field(&self) -> Point2<f32> {
        self.ball.xy()
    }

    #[must_use]
    pub fn peer(&self, agent: &AgentId) -> Option<&PeerRecord> {
        self.peers.get(agent)
    }

    pub fn peers(&self) -> impl Iterator<Item = (&AgentId, &PeerRecord)> {
        self.peers.iter()
    }

    /// Peers known to play in the same team as this agent.
    pub fn teammates(&self) -> impl Iterator<Item = (&AgentId, &PeerRecord)> {
        let team = self.team;
        self.peers
            .iter()
            .filter(move |(_, peer)| team.is_some() && peer.team == team)
    }

    /// Peers known to play in the other team.
    pub fn opponents(&self) -> impl Iterator<Item = (&AgentId, &PeerRecord)> {
        let team = self.team;
        self.peers
            .iter()
            .filter(move |(_, peer)| team.is_some() && peer.team.is_some() && peer.team != team)
    }

    fn is_self(&self, agent: &AgentId) -> bool {
        self.agent.as_ref() == Some(agent)
    }

    fn configure_self(&mut self, agent: AgentId, team: Option<TeamNumber>) -> Applied {
        tracing::info!(%agent, ?team, "assigned identity");
        self.peers.remove(&agent);
        self.silent.remove(&agent);
        self.agent = Some(agent);
        self.team = team;

        Applied::Identity
    }

    fn register_peer(&mut self, agent: AgentId, team: Option<TeamNumber>, now: Duration) -> Applied {
        if self.is_self(&agent) {
            return Applied::Ignored(Ignored::OwnReport);
        }

        match (team, self.team) {
            (Some(theirs), Some(ours)) if theirs == ours => tracing::info!(%agent, "new teammate"),
            (Some(_), Some(_)) => tracing::info!(%agent, "new opponent"),
            _ => tracing::info!(%agent, "new agent"),
        }

        let applied = self.known(&agent, team, now);
        if let Some(peer) = self.peers.get_mut(&agent) {
            peer.last_seen = now;
            if team.is_some() {
                peer.team = team;
            }
        }

        applied
    }

    /// Makes sure `agent` has a record, reviving a silent one or creating a new one.
    fn known(&mut self, agent: &AgentId, team: Option<TeamNumber>, now: Duration) -> Applied {
        if self.peers.contains_key(agent) {
            return Applied::Updated;
        }

        if let Some(peer) = self.silent.remove(agent) {
            tracing::info!(%agent, "silent agent is back");
            self.peers.insert(agent.clone(), peer);
            return Applied::Updated;
        }

        self.peers
            .insert(agent.clone(), PeerRecord::new(team, now));
        Applied::Joined
    }

    fn update_pose(
        &mut self,
        agent: &AgentId,
        pose: Pose,
        motion_state: Option<MotionState>,
        now: Duration,
    ) -> Applied {
        if self.is_self(agent) {
            return Applied::Ignored(Ignored::OwnReport);
        }

        let applied = self.known(agent, None, now);
        if let Some(peer) = self.peers.get_mut(agent) {
            peer.pose = pose;
            peer.last_seen = now;
            if let Some(motion_state) = motion_state {
                peer.motion_state = motion_state;
            }
        }

        applied
    }

    /// Applies a decoded message.
    ///
    /// Reports about this agent itself are ignored, control frames are handed back to the
    /// caller as [`Applied::Control`].
    pub fn apply(&mut self, message: Message, now: Duration) -> Applied {
        match message {
            Message::Setup { team, agent } => {
                if self.agent.is_some() && !self.is_self(&agent) {
                    tracing::warn!(%agent, "ignoring second identity assignment");
                    return Applied::Ignored(Ignored::NotForAgents);
                }
                self.configure_self(agent, Some(team))
            }
            Message::Info { agent, team } if self.agent.is_none() => {
                self.configure_self(agent, team)
            }
            Message::Info { agent, team } => self.register_peer(agent, team, now),
            Message::Add { team, agent } => self.register_peer(agent, Some(team), now),
            Message::Role { agent, role } => {
                if self.is_self(&agent) {
                    tracing::info!(%role, "assigned role");
                    self.role = role;
                    return Applied::Updated;
                }

                match self
                    .peers
                    .get_mut(&agent)
                    .or_else(|| self.silent.get_mut(&agent))
                {
                    Some(peer) => {
                        peer.role = role;
                        Applied::Updated
                    }
                    None => {
                        tracing::debug!(%agent, %role, "role for unknown agent");
                        Applied::Ignored(Ignored::UnknownAgent)
                    }
                }
            }
            Message::State(report) => {
                if report
                    .freshness
                    .is_some_and(|freshness| freshness.is_stale_at(now.as_secs_f32()))
                {
                    tracing::debug!(agent = %report.agent, "dropping stale report");
                    return Applied::Ignored(Ignored::Stale);
                }

                let pose = Pose::new(report.x, report.y, report.heading);
                self.update_pose(&report.agent, pose, Some(report.motion_state), now)
            }
            Message::Position(report) => {
                let pose = Pose::new(report.x, report.y, report.heading);
                self.update_pose(&report.agent, pose, None, now)
            }
            Message::Ball(BallPosition { x, y, z }) => {
                self.ball = Point3::new(x, y, z);
                Applied::Updated
            }
            Message::Leave { agent } => {
                let silent = self.silent.remove(&agent);
                if self.peers.remove(&agent).or(silent).is_some() {
                    tracing::info!(%agent, "agent left");
                    Applied::Updated
                } else {
                    Applied::Ignored(Ignored::UnknownAgent)
                }
            }
            Message::Revert { duration } => Applied::Control(Control::Revert(duration)),
            Message::Reset => Applied::Control(Control::Reset),
            Message::Start { setup } => Applied::Control(Control::Start(setup)),
            Message::Ack { .. } => Applied::Ignored(Ignored::NotForAgents),
        }
    }

    /// Sets aside peers that have not been heard from for longer than `timeout`.
    ///
    /// They no longer count as teammates or opponents, but keep their team and role in case
    /// they report again before leaving.
    pub fn purge_stale(&mut self, now: Duration, timeout: Duration) -> usize {
        let stale: Vec<AgentId> = self
            .peers
            .iter()
            .filter(|(_, peer)| now.saturating_sub(peer.last_seen) > timeout)
            .map(|(agent, _)| agent.clone())
            .collect();

        for agent in &stale {
            if let Some(peer) = self.peers.remove(agent) {
                tracing::info!(%agent, "forgetting silent agent");
                self.silent.insert(agent.clone(), peer);
            }
        }

        stale.len()
    }
}

#[cfg(test)]
mod tests {
    use bifrost::communication::{Freshness, PositionReport, StateReport};

    use super::*;

    fn id(id: &str) -> AgentId {
        AgentId::new(id).unwrap()
    }

    fn state(agent: &str, x: f32, y: f32, freshness: Option<Freshness>) -> Message {
        Message::State(StateReport {
            agent: id(agent),
            motion_state: MotionState::Moving,
            x,
            y,
            heading: 0.0,
            freshness,
        })
    }

    fn configured() -> WorldModel {
        let mut world = WorldModel::new();
        world.apply(
            Message::Setup {
                team: TeamNumber::One,
                agent: id("me"),
            },
            Duration::ZERO,
        );
        world
    }

    #[test]
    fn test_first_info_configures_self_then_registers_peers() {
        let mut world = WorldModel::new();
        let now = Duration::ZERO;

        let first = Message::Info {
            agent: id("me"),
            team: Some(TeamNumber::Two),
        };
        assert_eq!(world.apply(first, now), Applied::Identity);
        assert_eq!(world.team(), Some(TeamNumber::Two));

        let mate = Message::Info {
            agent: id("mate"),
            team: Some(TeamNumber::Two),
        };
        let foe = Message::Info {
            agent: id("foe"),
            team: Some(TeamNumber::One),
        };
        assert_eq!(world.apply(mate.clone(), now), Applied::Joined);
        assert_eq!(world.apply(foe, now), Applied::Joined);
        assert_eq!(world.apply(mate, now), Applied::Updated);

        let teammates: Vec<_> = world.teammates().map(|(agent, _)| agent.as_str()).collect();
        let opponents: Vec<_> = world.opponents().map(|(agent, _)| agent.as_str()).collect();
        assert_eq!(teammates, ["mate"]);
        assert_eq!(opponents, ["foe"]);
    }

    #[test]
    fn test_ball_then_state_updates_ball_and_peer() {
        let mut world = configured();
        let now = Duration::from_secs(1);

        world.apply(
            Message::Ball(BallPosition {
                x: 1.0,
                y: 2.0,
                z: 0.0,
            }),
            now,
        );
        assert_eq!(world.apply(state("42", 1.0, 2.0, None), now), Applied::Joined);

        assert_eq!(world.ball(), Point3::new(1.0, 2.0, 0.0));
        let peer = world.peer(&id("42")).unwrap();
        assert_eq!(peer.pose, Pose::new(1.0, 2.0, 0.0));
        assert_eq!(peer.motion_state, MotionState::Moving);
    }

    #[test]
    fn test_reports_about_self_are_ignored() {
        let mut world = configured();
        world.set_pose(Pose::new(-1.0, 0.0, 0.0));

        let applied = world.apply(state("me", 3.0, 3.0, None), Duration::ZERO);
        assert_eq!(applied, Applied::Ignored(Ignored::OwnReport));

        let position = Message::Position(PositionReport {
            agent: id("me"),
            x: 3.0,
            y: 3.0,
            heading: 0.0,
        });
        assert_eq!(
            world.apply(position, Duration::ZERO),
            Applied::Ignored(Ignored::OwnReport)
        );
        assert_eq!(world.pose(), Pose::new(-1.0, 0.0, 0.0));
        assert!(world.peer(&id("me")).is_none());
    }

    #[test]
    fn test_roles_for_self_peers_and_strangers() {
        let mut world = configured();
        world.apply(
            Message::Add {
                team: TeamNumber::Two,
                agent: id("other"),
            },
            Duration::ZERO,
        );

        let own = Message::Role {
            agent: id("me"),
            role: Role::Goalie,
        };
        let peer = Message::Role {
            agent: id("other"),
            role: Role::Striker,
        };
        let stranger = Message::Role {
            agent: id("ghost"),
            role: Role::Striker,
        };

        assert_eq!(world.apply(own, Duration::ZERO), Applied::Updated);
        assert_eq!(world.apply(peer, Duration::ZERO), Applied::Updated);
        assert_eq!(
            world.apply(stranger, Duration::ZERO),
            Applied::Ignored(Ignored::UnknownAgent)
        );

        assert_eq!(world.role(), Role::Goalie);
        assert_eq!(world.peer(&id("other")).unwrap().role, Role::Striker);
        assert!(world.peer(&id("ghost")).is_none());
    }

    #[test]
    fn test_stale_reports_are_dropped() {
        let mut world = configured();
        let now = Duration::from_secs_f32(12.0);

        let late = Freshness {
            timestamp: 10.0,
            tolerance: 1.0,
        };
        let fresh = Freshness {
            timestamp: 11.5,
            tolerance: 1.0,
        };

        assert_eq!(
            world.apply(state("42", 1.0, 1.0, Some(late)), now),
            Applied::Ignored(Ignored::Stale)
        );
        assert_eq!(
            world.apply(state("42", 1.0, 1.0, Some(fresh)), now),
            Applied::Joined
        );
    }

    #[test]
    fn test_leave_and_timeout_forget_peers() {
        let mut world = configured();
        world.apply(state("a", 0.0, 0.0, None), Duration::from_secs(1));
        world.apply(state("b", 0.0, 0.0, None), Duration::from_secs(5));

        assert_eq!(
            world.apply(Message::Leave { agent: id("a") }, Duration::from_secs(6)),
            Applied::Updated
        );
        assert!(world.peer(&id("a")).is_none());

        let timeout = Duration::from_secs(10);
        assert_eq!(world.purge_stale(Duration::from_secs(15), timeout), 0);
        assert_eq!(world.purge_stale(Duration::from_secs(16), timeout), 1);
        assert_eq!(world.peers().count(), 0);
    }

    #[test]
    fn test_silent_peer_comes_back_with_team_and_role() {
        let mut world = configured();
        world.apply(
            Message::Add {
                team: TeamNumber::One,
                agent: id("s"),
            },
            Duration::ZERO,
        );
        world.apply(
            Message::Role {
                agent: id("s"),
                role: Role::Striker,
            },
            Duration::ZERO,
        );

        assert_eq!(
            world.purge_stale(Duration::from_secs(11), Duration::from_secs(10)),
            1
        );
        assert_eq!(world.teammates().count(), 0);

        assert_eq!(
            world.apply(state("s", 1.0, 1.0, None), Duration::from_secs(12)),
            Applied::Updated
        );
        let peer = world.peer(&id("s")).unwrap();
        assert_eq!(peer.team, Some(TeamNumber::One));
        assert_eq!(peer.role, Role::Striker);
        assert_eq!(world.teammates().count(), 1);
    }

    #[test]
    fn test_leave_forgets_silent_peers_for_good() {
        let mut world = configured();
        world.apply(state("s", 0.0, 0.0, None), Duration::ZERO);
        world.purge_stale(Duration::from_secs(11), Duration::from_secs(10));

        assert_eq!(
            world.apply(Message::Leave { agent: id("s") }, Duration::from_secs(12)),
            Applied::Updated
        );
        assert_eq!(
            world.apply(state("s", 0.0, 0.0, None), Duration::from_secs(13)),
            Applied::Joined
        );
    }

    #[test]
    fn test_control_frames_are_passed_on() {
        let mut world = configured();

        assert_eq!(
            world.apply(
                Message::Revert {
                    duration: Duration::from_secs(2)
                },
                Duration::ZERO
            ),
            Applied::Control(Control::Revert(Duration::from_secs(2)))
        );
        assert_eq!(
            world.apply(Message::Reset, Duration::ZERO),
            Applied::Control(Control::Reset)
        );
    }
}
