//! Huginn is a soccer agent that plays one role in a team.
//!
//! Agents never talk to each other directly. They exchange bifrost frames through the
//! gjallarhorn relay, which assigns every agent an identifier and a team. Each tick an agent
//! folds the frames it received into its [`world::WorldModel`], lets the strategy of its role
//! pick an action, advances navigation by one motion and reports its state when it changed
//! enough.
pub mod agent;
pub mod behavior;
pub mod communication;
pub mod config;
pub mod error;
pub mod geometry;
pub mod motion;
pub mod sensor;
pub mod simulation;
pub mod world;

pub use agent::Agent;
pub use error::{Error, Result};
