use std::{collections::HashSet, net::SocketAddr, time::Duration};

use bifrost::communication::{AgentId, BallPosition, Message, TeamNumber};
use bifrost::serialization::{Decode, Encode, stream::MAX_FRAME_LEN};
use gjallarhorn::{Relay, Result};
use tokio::{
    io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines},
    net::{
        TcpStream,
        tcp::{OwnedReadHalf, OwnedWriteHalf},
    },
    task::JoinSet,
    time::timeout,
};

const PATIENCE: Duration = Duration::from_secs(2);

struct TestAgent {
    id: AgentId,
    team: TeamNumber,
    lines: Lines<BufReader<OwnedReadHalf>>,
    write: OwnedWriteHalf,
}

impl TestAgent {
    async fn connect(address: SocketAddr) -> Self {
        let stream = TcpStream::connect(address).await.unwrap();
        let (read, write) = stream.into_split();
        let mut lines = BufReader::new(read).lines();

        let Message::Setup { team, agent } = next_message(&mut lines).await else {
            panic!("first frame should be SETUP");
        };

        Self {
            id: agent,
            team,
            lines,
            write,
        }
    }

    async fn next(&mut self) -> Message {
        next_message(&mut self.lines).await
    }

    /// Skips the roster announcements the relay sends right after SETUP.
    async fn skip(&mut self, count: usize) {
        for _ in 0..count {
            assert!(matches!(self.next().await, Message::Add { .. }));
        }
    }

    async fn send(&mut self, message: &Message) {
        let mut frame = Vec::new();
        message.encode(&mut frame).unwrap();
        self.write.write_all(&frame).await.unwrap();
    }

    async fn send_raw(&mut self, bytes: impl AsRef<[u8]>) {
        self.write.write_all(bytes.as_ref()).await.unwrap();
    }
}

async fn next_message(lines: &mut Lines<BufReader<OwnedReadHalf>>) -> Message {
    let line = timeout(PATIENCE, lines.next_line())
        .await
        .expect("relay should send a frame in time")
        .unwrap()
        .expect("relay should keep the connection open");

    Message::decode(&line).unwrap()
}

async fn start_relay() -> Result<SocketAddr> {
    let relay = Relay::bind("127.0.0.1:0").await?;
    let address = relay.local_addr()?;
    tokio::spawn(relay.run());

    Ok(address)
}

fn ball(x: f32) -> Message {
    Message::Ball(BallPosition { x, y: 2.0, z: 0.0 })
}

#[tokio::test]
async fn test_newcomer_learns_roster_and_is_announced() -> Result<()> {
    let address = start_relay().await?;

    let mut first = TestAgent::connect(address).await;
    assert_eq!(first.team, TeamNumber::One);

    let mut second = TestAgent::connect(address).await;
    assert_eq!(second.team, TeamNumber::Two);
    assert_ne!(first.id, second.id);

    assert_eq!(
        second.next().await,
        Message::Add {
            team: TeamNumber::One,
            agent: first.id.clone(),
        }
    );
    assert_eq!(
        first.next().await,
        Message::Add {
            team: TeamNumber::Two,
            agent: second.id.clone(),
        }
    );

    Ok(())
}

#[tokio::test]
async fn test_concurrent_connects_get_distinct_ids_and_balanced_teams() -> Result<()> {
    let address = start_relay().await?;

    let mut connects = JoinSet::new();
    for _ in 0..6 {
        connects.spawn(TestAgent::connect(address));
    }

    let mut agents = Vec::new();
    while let Some(agent) = connects.join_next().await {
        agents.push(agent.unwrap());
    }

    let ids: HashSet<_> = agents.iter().map(|agent| agent.id.clone()).collect();
    assert_eq!(ids.len(), 6);

    let team_one = agents
        .iter()
        .filter(|agent| agent.team == TeamNumber::One)
        .count();
    assert_eq!(team_one, 3);

    Ok(())
}

#[tokio::test]
async fn test_broadcast_reaches_everyone_but_the_sender_once() -> Result<()> {
    let address = start_relay().await?;

    let mut a = TestAgent::connect(address).await;
    let mut b = TestAgent::connect(address).await;
    b.skip(1).await;
    let mut c = TestAgent::connect(address).await;
    c.skip(2).await;
    a.skip(2).await;
    b.skip(1).await;

    a.send(&ball(1.0)).await;
    assert_eq!(b.next().await, ball(1.0));
    assert_eq!(c.next().await, ball(1.0));

    // Frames to one agent keep their order, so had `a` received its own frame it would be
    // queued before this one.
    b.send(&ball(3.0)).await;
    assert_eq!(a.next().await, ball(3.0));
    assert_eq!(c.next().await, ball(3.0));

    Ok(())
}

#[tokio::test]
async fn test_bad_frames_do_not_end_the_connection() -> Result<()> {
    let address = start_relay().await?;

    let mut a = TestAgent::connect(address).await;
    let mut b = TestAgent::connect(address).await;
    b.skip(1).await;
    a.skip(1).await;

    a.send_raw("HELLO|there\n").await;
    a.send_raw("BALL|one|2|0\n").await;
    a.send_raw("\n").await;
    a.send_raw(format!("SETUP|1|{}\n", a.id)).await;
    a.send_raw(b"BALL|1|\xff\xfe|0\n").await;
    a.send_raw(b"\xff\xfe\n").await;
    a.send_raw([b'A'; 4 * MAX_FRAME_LEN]).await;
    a.send_raw("\n").await;
    a.send(&ball(4.0)).await;

    // Had the relay dropped `a`, a LEAVE would arrive first.
    assert_eq!(b.next().await, ball(4.0));

    Ok(())
}

#[tokio::test]
async fn test_disconnect_broadcasts_leave() -> Result<()> {
    let address = start_relay().await?;

    let mut a = TestAgent::connect(address).await;
    let b = TestAgent::connect(address).await;
    a.skip(1).await;

    let gone = b.id.clone();
    drop(b);

    assert_eq!(a.next().await, Message::Leave { agent: gone });

    // The freed slot in team two goes to the next agent.
    let c = TestAgent::connect(address).await;
    assert_eq!(c.team, TeamNumber::Two);

    Ok(())
}
