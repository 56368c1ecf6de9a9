use std::{fmt, str::FromStr};

use strum::{Display, EnumIter, EnumString, IntoStaticStr};
use uuid::Uuid;

use crate::{Error, Result};

/// Opaque identifier of an agent, issued by the relay when the agent connects.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AgentId(String);

impl AgentId {
    /// Creates a new [`AgentId`], rejecting ids that could not be sent in a frame.
    pub fn new(id: impl Into<String>) -> Result<Self> {
        let id = id.into();

        if id.is_empty() || id.contains(['|', '\n', '\r']) || id.trim() != id {
            return Err(Error::InvalidAgentId(id));
        }

        Ok(Self(id))
    }

    /// Generates a random id, a UUID v4 in its simple (hyphen-less) form.
    #[must_use]
    pub fn generate() -> Self {
        Self::from(Uuid::new_v4())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<Uuid> for AgentId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid.simple().to_string())
    }
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for AgentId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

/// One of the two teams in a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, EnumIter)]
pub enum TeamNumber {
    One,
    Two,
}

impl TeamNumber {
    /// The number used for this team on the wire.
    #[must_use]
    pub fn number(self) -> u8 {
        match self {
            TeamNumber::One => 1,
            TeamNumber::Two => 2,
        }
    }

    /// The opposing team.
    #[must_use]
    pub fn opponent(self) -> Self {
        match self {
            TeamNumber::One => TeamNumber::Two,
            TeamNumber::Two => TeamNumber::One,
        }
    }
}

impl fmt::Display for TeamNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.number())
    }
}

impl FromStr for TeamNumber {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "1" => Ok(TeamNumber::One),
            "2" => Ok(TeamNumber::Two),
            _ => Err(Error::InvalidField {
                tag: "TEAM",
                field: "team",
                value: s.to_owned(),
            }),
        }
    }
}

/// Tactical assignment of an agent.
///
/// Every agent holds exactly one authoritative role, which its peers mirror.
#[derive(
    Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter, IntoStaticStr,
)]
pub enum Role {
    Goalie,
    Striker,
    Midfielder,
    #[default]
    Unassigned,
}

/// The locomotion activity an agent is currently performing.
///
/// Owned by the agent itself, peers only ever see it as an informational report.
#[derive(
    Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter, IntoStaticStr,
)]
pub enum MotionState {
    #[default]
    Idle,
    Moving,
    Turning,
    Sliding,
    Backing,
    Kicking,
    Recovering,
}
