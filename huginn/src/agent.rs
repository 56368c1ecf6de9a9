//! The tick loop tying an [`Engine`] to a relay connection.
use std::{future::Future, time::Duration};

use bifrost::communication::Message;
use tokio::time::{MissedTickBehavior, interval};

use crate::{
    behavior::Engine, communication::RelayConnection, motion::Locomotion, sensor::Sensing,
};

pub struct Agent<L: Locomotion, S: Sensing> {
    engine: Engine<L, S>,
    connection: Option<RelayConnection>,
    tick: Duration,
}

impl<L: Locomotion, S: Sensing> Agent<L, S> {
    /// Ticks at the period of the engine's config. Without a connection the agent plays on its
    /// own, nothing is sent or received.
    #[must_use]
    pub fn new(engine: Engine<L, S>, connection: Option<RelayConnection>) -> Self {
        let tick = engine.config().timing.tick;
        Self {
            engine,
            connection,
            tick,
        }
    }

    #[must_use]
    pub fn engine(&self) -> &Engine<L, S> {
        &self.engine
    }

    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.connection.is_some()
    }

    /// Runs a single tick: drains the inbound frames, runs the engine and queues its output.
    ///
    /// Returns the frames the engine produced.
    pub fn step(&mut self) -> Vec<Message> {
        let inbound = self
            .connection
            .as_mut()
            .map(RelayConnection::drain)
            .unwrap_or_default();

        let outbound = self.engine.tick(inbound);

        if let Some(connection) = &self.connection {
            for message in &outbound {
                connection.try_send(message.clone());
            }

            if !connection.is_connected() {
                tracing::warn!(address = %connection.address(), "lost the relay, playing alone");
                self.connection = None;
            }
        }

        outbound
    }

    /// Ticks until `shutdown` completes.
    pub async fn run(mut self, shutdown: impl Future<Output = ()>) {
        let mut ticks = interval(self.tick);
        ticks.set_missed_tick_behavior(MissedTickBehavior::Skip);
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                () = &mut shutdown => {
                    tracing::info!("shutting down agent");
                    break;
                }
                _ = ticks.tick() => {
                    self.step();
                }
            }
        }
    }
}
