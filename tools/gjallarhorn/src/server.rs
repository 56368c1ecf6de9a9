//! Accepting agents and relaying their frames.
use std::{net::SocketAddr, sync::Arc};

use bifrost::{
    communication::{AgentId, Message},
    serialization::{Encode, stream::FrameReader},
};
use tokio::{
    io::{AsyncWriteExt, BufReader},
    net::{
        TcpListener, TcpStream, ToSocketAddrs,
        tcp::{OwnedReadHalf, OwnedWriteHalf},
    },
    sync::{Mutex, mpsc},
};

use crate::{
    error::{Error, Result},
    registry::Registry,
};

/// Default number of frames that can be queued for a single agent.
pub const DEFAULT_QUEUE_CAPACITY: usize = 64;

/// The relay server.
///
/// Every connection is served by its own reader task and writer task. The registries are shared
/// between all of them behind a single async mutex.
pub struct Relay {
    listener: TcpListener,
    registry: Arc<Mutex<Registry>>,
    queue_capacity: usize,
}

impl Relay {
    pub async fn bind(address: impl ToSocketAddrs + std::fmt::Debug) -> Result<Self> {
        let listener = TcpListener::bind(&address)
            .await
            .map_err(|source| Error::Bind {
                address: format!("{address:?}"),
                source,
            })?;

        Ok(Self {
            listener,
            registry: Arc::new(Mutex::new(Registry::new())),
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
        })
    }

    /// Sets the number of frames that can be queued per agent before frames are dropped.
    #[must_use]
    pub fn with_queue_capacity(mut self, queue_capacity: usize) -> Self {
        self.queue_capacity = queue_capacity.max(1);
        self
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Shared handle to the registries, mostly useful for inspection.
    #[must_use]
    pub fn registry(&self) -> Arc<Mutex<Registry>> {
        Arc::clone(&self.registry)
    }

    /// Accepts connections until the listener fails.
    pub async fn run(self) -> Result<()> {
        tracing::info!(address = %self.local_addr()?, "relay listening");

        loop {
            let (socket, address) = self.listener.accept().await?;
            tracing::info!(%address, "connection with a new agent");

            let registry = Arc::clone(&self.registry);
            let queue_capacity = self.queue_capacity;
            tokio::spawn(async move {
                if let Err(error) = handle_connection(socket, address, registry, queue_capacity).await
                {
                    tracing::error!(%address, ?error, "connection ended with an error");
                }
            });
        }
    }
}

async fn handle_connection(
    socket: TcpStream,
    address: SocketAddr,
    registry: Arc<Mutex<Registry>>,
    queue_capacity: usize,
) -> Result<()> {
    let (read_half, write_half) = socket.into_split();
    let (tx, rx) = mpsc::channel(queue_capacity);

    // Registering, greeting and announcing happen under a single lock, so the newcomer's roster
    // and the other agents' view of the newcomer never disagree.
    let agent = {
        let mut registry = registry.lock().await;
        let (agent, team) = registry.join(tx);

        registry.send(
            &agent,
            Message::Setup {
                team,
                agent: agent.clone(),
            },
        );

        let roster: Vec<_> = registry
            .roster()
            .filter(|(other, _)| *other != &agent)
            .map(|(other, team)| Message::Add {
                team,
                agent: other.clone(),
            })
            .collect();
        for message in roster {
            registry.send(&agent, message);
        }

        registry.broadcast(
            &Message::Add {
                team,
                agent: agent.clone(),
            },
            Some(&agent),
        );

        tracing::info!(%agent, %team, agents = registry.len(), "agent joined");
        agent
    };

    let writer_task = tokio::spawn(write_frames(write_half, rx, agent.clone()));
    let result = read_frames(read_half, &agent, &registry).await;

    {
        let mut registry = registry.lock().await;
        registry.leave(&agent);
        registry.broadcast(
            &Message::Leave {
                agent: agent.clone(),
            },
            None,
        );
        tracing::info!(%agent, agents = registry.len(), "agent left");
    }

    // Leaving dropped the last sender, so the writer drains its queue and stops.
    if let Err(error) = writer_task.await {
        tracing::error!(%agent, ?error, "writer task ended");
    }

    result.map_err(|source| Error::Connection { address, source })
}

async fn read_frames(
    read_half: OwnedReadHalf,
    agent: &AgentId,
    registry: &Mutex<Registry>,
) -> std::io::Result<()> {
    let mut frames = FrameReader::new(BufReader::new(read_half));

    while let Some(frame) = frames.next_frame().await? {
        match frame {
            Ok(message) => dispatch(message, agent, registry).await,
            Err(error) => tracing::warn!(%agent, %error, "dropping malformed frame"),
        }
    }

    tracing::debug!(%agent, "connection closed by agent");
    Ok(())
}

async fn dispatch(message: Message, sender: &AgentId, registry: &Mutex<Registry>) {
    match message {
        Message::Ack { agent } => {
            tracing::info!(%sender, %agent, "agent acknowledged reset");
        }
        Message::Setup { .. } | Message::Add { .. } | Message::Leave { .. } => {
            tracing::warn!(%sender, kind = %message.kind(), "agents may not send this frame");
        }
        Message::State(_)
        | Message::Position(_)
        | Message::Ball(_)
        | Message::Role { .. }
        | Message::Info { .. }
        | Message::Revert { .. }
        | Message::Reset
        | Message::Start { .. } => {
            let delivered = registry.lock().await.broadcast(&message, Some(sender));
            tracing::trace!(%sender, kind = %message.kind(), delivered, "relayed frame");
        }
    }
}

async fn write_frames(
    mut write_half: OwnedWriteHalf,
    mut rx: mpsc::Receiver<Message>,
    agent: AgentId,
) {
    let mut frame = Vec::new();

    while let Some(message) = rx.recv().await {
        frame.clear();
        if let Err(error) = message.encode(&mut frame) {
            tracing::error!(%agent, ?error, "failed to encode frame");
            continue;
        }

        if let Err(error) = write_half.write_all(&frame).await {
            tracing::error!(%agent, ?error, "failed to send frame");
            break;
        }
    }
}
