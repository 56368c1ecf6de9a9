//! Book-keeping of the connected agents and the teams they play in.
use std::collections::{HashMap, HashSet};

use bifrost::communication::{AgentId, Message, TeamNumber};
use tokio::sync::mpsc::{self, error::TrySendError};

/// Outbound queue of a single connection.
pub type Outbox = mpsc::Sender<Message>;

struct Client {
    team: TeamNumber,
    outbox: Outbox,
}

/// The connection table and both team sets.
///
/// An [`AgentId`] is in at most one team, and team sizes never differ by more than one after
/// an assignment.
#[derive(Default)]
pub struct Registry {
    clients: HashMap<AgentId, Client>,
    teams: [HashSet<AgentId>; 2],
}

impl Registry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of connected agents.
    #[must_use]
    pub fn len(&self) -> usize {
        self.clients.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }

    #[must_use]
    pub fn team_size(&self, team: TeamNumber) -> usize {
        self.teams[team_index(team)].len()
    }

    /// The team a newly connected agent is placed in: the smaller one, team one on a tie.
    #[must_use]
    pub fn next_team(&self) -> TeamNumber {
        if self.team_size(TeamNumber::One) <= self.team_size(TeamNumber::Two) {
            TeamNumber::One
        } else {
            TeamNumber::Two
        }
    }

    /// Registers a new connection, issuing it a fresh [`AgentId`] and a team.
    pub fn join(&mut self, outbox: Outbox) -> (AgentId, TeamNumber) {
        let agent = loop {
            let candidate = AgentId::generate();
            if !self.clients.contains_key(&candidate) {
                break candidate;
            }
        };

        let team = self.next_team();
        self.teams[team_index(team)].insert(agent.clone());
        self.clients.insert(agent.clone(), Client { team, outbox });

        (agent, team)
    }

    /// Removes the agent from the connection table and from its team.
    pub fn leave(&mut self, agent: &AgentId) -> Option<TeamNumber> {
        let client = self.clients.remove(agent)?;
        self.teams[team_index(client.team)].remove(agent);

        Some(client.team)
    }

    /// Every connected agent and its team.
    pub fn roster(&self) -> impl Iterator<Item = (&AgentId, TeamNumber)> {
        self.clients.iter().map(|(agent, client)| (agent, client.team))
    }

    /// Queues `message` for a single agent, returns whether it was queued.
    pub fn send(&self, agent: &AgentId, message: Message) -> bool {
        self.clients
            .get(agent)
            .is_some_and(|client| enqueue(agent, &client.outbox, message))
    }

    /// Queues `message` for every connected agent except `exclude`.
    ///
    /// Returns the number of agents the message was queued for. Full queues drop the message.
    pub fn broadcast(&self, message: &Message, exclude: Option<&AgentId>) -> usize {
        self.clients
            .iter()
            .filter(|(agent, _)| Some(*agent) != exclude)
            .filter(|(agent, client)| enqueue(agent, &client.outbox, message.clone()))
            .count()
    }
}

fn team_index(team: TeamNumber) -> usize {
    usize::from(team.number() - 1)
}

fn enqueue(agent: &AgentId, outbox: &Outbox, message: Message) -> bool {
    match outbox.try_send(message) {
        Ok(()) => true,
        Err(TrySendError::Full(message)) => {
            tracing::warn!(%agent, kind = %message.kind(), "outbound queue full, dropping frame");
            false
        }
        Err(TrySendError::Closed(_)) => {
            tracing::debug!(%agent, "connection already closed");
            false
        }
    }
}
