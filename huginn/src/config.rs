//! Tunables of the agent, loaded from `huginn.toml`.
use std::{path::Path, time::Duration};

use odal::{Config, ConfigKind, Error, ErrorKind};
use serde::{Deserialize, Serialize};
use serde_with::{DurationMilliSeconds, DurationSecondsWithFrac, serde_as};

use crate::error::Result;

/// Sub-directory of the config directory holding the per-agent overlays.
pub const OVERLAY_DIR: &str = "overlay";

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(deny_unknown_fields)]
pub struct HuginnConfig {
    pub timing: TimingConfig,
    pub falling: FallConfig,
    pub navigation: NavigationConfig,
    pub sync: SyncConfig,
    pub field: FieldConfig,
    pub roles: RolesConfig,
}

impl Config for HuginnConfig {
    const PATH: &'static str = "huginn.toml";
}

impl HuginnConfig {
    /// Interval between unconditional reports, short enough that peers never time this agent
    /// out.
    #[must_use]
    pub fn keep_alive(&self) -> Duration {
        self.sync.keep_alive.min(self.timing.peer_timeout / 2)
    }

    /// Loads the config from `config_dir`, applying the overlay of `name` if there is one.
    ///
    /// A missing main file is not an error, the defaults are used instead.
    pub fn load_for(config_dir: impl AsRef<Path>, name: Option<&str>) -> Result<Self> {
        let main_path = config_dir.as_ref();
        let Some(name) = name else {
            return Self::load_or_default(main_path);
        };
        let overlay_path = main_path.join(OVERLAY_DIR).join(name);

        match Self::load_with_overlay(main_path, &overlay_path) {
            Ok(config) => Ok(config),
            Err(Error {
                name,
                kind:
                    ErrorKind::Load {
                        path,
                        config_kind: ConfigKind::Overlay,
                        ..
                    },
            }) => {
                tracing::debug!("`{name}`: failed to read overlay from `{path}`");
                Self::load_or_default(main_path)
            }
            Err(Error {
                name,
                kind:
                    ErrorKind::Load {
                        path,
                        config_kind: ConfigKind::Main,
                        ..
                    },
            }) => {
                tracing::info!("`{name}`: no config at `{path}`, using defaults");
                Ok(Self::default())
            }
            Err(error) => Err(error.into()),
        }
    }

    fn load_or_default(main_path: &Path) -> Result<Self> {
        match Self::load(main_path) {
            Err(Error {
                name,
                kind: ErrorKind::Load { path, .. },
            }) => {
                tracing::info!("`{name}`: no config at `{path}`, using defaults");
                Ok(Self::default())
            }
            other => other.map_err(Into::into),
        }
    }
}

#[serde_as]
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub struct TimingConfig {
    /// Period of the decision loop.
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    pub tick: Duration,
    /// Grace window opened at startup, during which fall detection and reporting are off.
    #[serde_as(as = "DurationSecondsWithFrac<f64>")]
    pub settle_time: Duration,
    /// Peers that have not been heard from for this long are forgotten.
    #[serde_as(as = "DurationSecondsWithFrac<f64>")]
    pub peer_timeout: Duration,
    /// Stay idle until the relay sends a `START` frame.
    pub await_start: bool,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            tick: Duration::from_millis(32),
            settle_time: Duration::from_secs(2),
            peer_timeout: Duration::from_secs(10),
            await_start: false,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub struct FallConfig {
    /// Total foot force, in newton, below which the agent is considered fallen.
    pub force_threshold: f32,
}

impl Default for FallConfig {
    fn default() -> Self {
        Self {
            force_threshold: 5.0,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub struct NavigationConfig {
    /// Distance at which a target counts as reached.
    pub arrival_threshold: f32,
    /// Small steps are used within this multiple of the arrival threshold.
    pub small_step_factor: f32,
    /// Heading error, in degrees, that interrupts walking to turn first.
    pub turn_threshold_degrees: f32,
    /// Heading error, in degrees, at which a turn is considered complete.
    pub go_to_turn_threshold_degrees: f32,
    /// A new target closer than this to the current one does not restart navigation.
    pub retarget_distance: f32,
}

impl NavigationConfig {
    #[must_use]
    pub fn turn_threshold(&self) -> f32 {
        self.turn_threshold_degrees.to_radians()
    }

    #[must_use]
    pub fn go_to_turn_threshold(&self) -> f32 {
        self.go_to_turn_threshold_degrees.to_radians()
    }

    #[must_use]
    pub fn small_step_distance(&self) -> f32 {
        self.arrival_threshold * self.small_step_factor
    }
}

impl Default for NavigationConfig {
    fn default() -> Self {
        Self {
            arrival_threshold: 0.2,
            small_step_factor: 2.5,
            turn_threshold_degrees: 5.0,
            go_to_turn_threshold_degrees: 2.0,
            retarget_distance: 0.5,
        }
    }
}

#[serde_as]
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub struct SyncConfig {
    /// Distance moved since the last report that triggers a new one.
    pub report_distance: f32,
    /// Heading change, in degrees, since the last report that triggers a new one.
    ///
    /// Clamped to `[5, 10]`.
    pub report_heading_degrees: f32,
    /// Attach a timestamp and [`SyncConfig::delay_tolerance`] to every report.
    ///
    /// Only useful when all agents share a clock, e.g. in a simulator.
    pub stamp_reports: bool,
    #[serde_as(as = "DurationSecondsWithFrac<f64>")]
    pub delay_tolerance: Duration,
    /// Longest time without a report, even when nothing changed.
    ///
    /// Never longer than half the peer timeout, see [`HuginnConfig::keep_alive`].
    #[serde_as(as = "DurationSecondsWithFrac<f64>")]
    pub keep_alive: Duration,
    /// Number of frames buffered in each direction between the tick loop and the socket.
    pub queue_capacity: usize,
}

impl SyncConfig {
    #[must_use]
    pub fn report_heading(&self) -> f32 {
        self.report_heading_degrees.clamp(5.0, 10.0).to_radians()
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            report_distance: 0.25,
            report_heading_degrees: 5.0,
            stamp_reports: false,
            delay_tolerance: Duration::from_secs(1),
            keep_alive: Duration::from_secs(4),
            queue_capacity: 64,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub struct FieldConfig {
    /// Distance from the center line to either goal. Team one attacks the goal at `+goal_x`.
    pub goal_x: f32,
}

impl Default for FieldConfig {
    fn default() -> Self {
        Self { goal_x: 4.5 }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub struct RolesConfig {
    /// Distance to the ball at which a kick is started.
    pub kick_distance: f32,
    pub goalie: GoalieConfig,
    pub striker: StrikerConfig,
    pub midfielder: MidfielderConfig,
}

impl Default for RolesConfig {
    fn default() -> Self {
        Self {
            kick_distance: 0.25,
            goalie: GoalieConfig::default(),
            striker: StrikerConfig::default(),
            midfielder: MidfielderConfig::default(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub struct GoalieConfig {
    /// Distance in front of the own goal where the goalie guards.
    pub line_offset: f32,
    /// How far the goalie may drift from its line before walking back.
    pub line_tolerance: f32,
    /// Ball distance at which the goalie leaves its line to clear the ball.
    pub engage_distance: f32,
    /// Largest lateral offset the goalie follows the ball to.
    pub max_lateral: f32,
    /// Distance kept behind a ball that got past the goalie.
    pub backup_margin: f32,
}

impl Default for GoalieConfig {
    fn default() -> Self {
        Self {
            line_offset: 0.5,
            line_tolerance: 0.3,
            engage_distance: 1.0,
            max_lateral: 1.1,
            backup_margin: 0.3,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub struct StrikerConfig {
    /// Beyond this distance the striker walks straight to the ball.
    pub far_distance: f32,
    /// Dot product of the ball-to-goal and ball-to-self directions that decides which side of
    /// the ball the striker is on.
    pub alignment_threshold: f32,
    /// Distance from the ball of the two points used to walk around it.
    pub reposition_distance: f32,
    /// Distance behind the ball the striker lines up at.
    pub behind_distance: f32,
}

impl Default for StrikerConfig {
    fn default() -> Self {
        Self {
            far_distance: 6.0,
            alignment_threshold: 0.5,
            reposition_distance: 1.0,
            behind_distance: 0.5,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub struct MidfielderConfig {
    /// Lateral distance between the ball and either lane.
    pub lane_offset: f32,
}

impl Default for MidfielderConfig {
    fn default() -> Self {
        Self { lane_offset: 1.5 }
    }
}
