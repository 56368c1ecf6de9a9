//! TCP connection with the relay.
//!
//! The socket is served by two tasks. The reader decodes frames into a bounded channel, the
//! writer drains a bounded channel of outgoing frames. The tick loop only ever polls both
//! channels, so it never waits on the network.
use std::net::SocketAddr;

use bifrost::{
    communication::Message,
    serialization::{Encode, stream::FrameReader},
};
use tokio::{
    io::{AsyncWriteExt, BufReader},
    net::{
        TcpStream, ToSocketAddrs,
        tcp::{OwnedReadHalf, OwnedWriteHalf},
    },
    sync::mpsc::{self, error::TryRecvError, error::TrySendError},
    task::JoinHandle,
};

use crate::error::{Error, Result};

pub struct RelayConnection {
    address: SocketAddr,
    inbound: mpsc::Receiver<Message>,
    outbound: mpsc::Sender<Message>,
    reader_task: JoinHandle<()>,
    writer_task: JoinHandle<()>,
}

impl RelayConnection {
    /// Connects to the relay and starts the reader and writer tasks.
    pub async fn connect(
        address: impl ToSocketAddrs + std::fmt::Display,
        queue_capacity: usize,
    ) -> Result<Self> {
        let stream = TcpStream::connect(&address)
            .await
            .map_err(|source| Error::Connect {
                address: address.to_string(),
                source,
            })?;
        stream.set_nodelay(true)?;
        let address = stream.peer_addr()?;

        let (read_half, write_half) = stream.into_split();
        let (inbound_tx, inbound) = mpsc::channel(queue_capacity.max(1));
        let (outbound, outbound_rx) = mpsc::channel(queue_capacity.max(1));

        let reader_task = tokio::spawn(async move {
            if let Err(source) = read_frames(read_half, inbound_tx).await {
                tracing::error!(error = %Error::Connection { address, source }, "reader stopped");
            }
        });
        let writer_task = tokio::spawn(async move {
            if let Err(source) = write_frames(write_half, outbound_rx).await {
                tracing::error!(error = %Error::Connection { address, source }, "writer stopped");
            }
        });

        tracing::info!(%address, "connected to relay");

        Ok(Self {
            address,
            inbound,
            outbound,
            reader_task,
            writer_task,
        })
    }

    #[must_use]
    pub fn address(&self) -> SocketAddr {
        self.address
    }

    /// Whether both directions of the connection are still up.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        !self.reader_task.is_finished() && !self.writer_task.is_finished()
    }

    /// Takes every frame that arrived since the last call.
    pub fn drain(&mut self) -> Vec<Message> {
        let mut messages = Vec::new();

        loop {
            match self.inbound.try_recv() {
                Ok(message) => messages.push(message),
                Err(TryRecvError::Empty | TryRecvError::Disconnected) => break,
            }
        }

        messages
    }

    /// Queues a frame for sending, dropping it if the queue is full.
    pub fn try_send(&self, message: Message) -> bool {
        match self.outbound.try_send(message) {
            Ok(()) => true,
            Err(TrySendError::Full(message)) => {
                tracing::warn!(kind = %message.kind(), "outbound queue full, dropping frame");
                false
            }
            Err(TrySendError::Closed(message)) => {
                tracing::debug!(kind = %message.kind(), "connection closed, dropping frame");
                false
            }
        }
    }
}

impl Drop for RelayConnection {
    fn drop(&mut self) {
        self.reader_task.abort();
        self.writer_task.abort();
    }
}

async fn read_frames(read_half: OwnedReadHalf, inbound: mpsc::Sender<Message>) -> std::io::Result<()> {
    let mut frames = FrameReader::new(BufReader::new(read_half));

    while let Some(frame) = frames.next_frame().await? {
        match frame {
            Ok(message) => {
                if inbound.send(message).await.is_err() {
                    // The tick loop is gone.
                    return Ok(());
                }
            }
            Err(error) if error.is_unknown_tag() => {
                tracing::warn!(%error, "ignoring frame of unknown type");
            }
            Err(error) => tracing::warn!(%error, "dropping malformed frame"),
        }
    }

    tracing::warn!("relay closed the connection");
    Ok(())
}

async fn write_frames(
    mut write_half: OwnedWriteHalf,
    mut outbound: mpsc::Receiver<Message>,
) -> std::io::Result<()> {
    let mut frame = Vec::new();

    while let Some(message) = outbound.recv().await {
        frame.clear();
        if let Err(error) = message.encode(&mut frame) {
            tracing::error!(?message, %error, "failed to encode frame");
            continue;
        }

        write_half.write_all(&frame).await?;
    }

    write_half.shutdown().await
}
