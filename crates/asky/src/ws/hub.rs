//! Broadcast hub managing connections and fanning out chat frames.

use std::collections::HashMap;

use anyhow::{Context, Result};
use log::{debug, info, warn};
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, oneshot};

use super::types::Frame;

/// Size of the hub's inbound command channel.
const COMMAND_BUFFER_SIZE: usize = 256;

/// Size of the per-connection send buffer.
const CONNECTION_BUFFER_SIZE: usize = 64;

/// Opaque identifier for one registered connection.
pub type ConnectionId = u64;

/// A freshly registered connection: its identifier and the stream of frames
/// the hub will deliver to it.
pub struct NewConnection {
    pub id: ConnectionId,
    pub frames: mpsc::Receiver<Frame>,
}

enum HubCommand {
    Connect {
        reply: oneshot::Sender<NewConnection>,
    },
    Publish {
        frame: Frame,
    },
    Disconnect {
        id: ConnectionId,
    },
}

/// Handle to the broadcast hub.
///
/// The hub itself is a single spawned task owning the connection registry.
/// All operations are funneled through one command channel, so each publish
/// fans out to every registered connection before the next command is
/// handled: any two frames accepted in order A then B are delivered A before
/// B to every connection registered for both.
///
/// Fan-out includes the originating connection. Clients render messages only
/// from the round-trip receive path, never from a local echo.
#[derive(Clone)]
pub struct ChatHub {
    commands: mpsc::Sender<HubCommand>,
}

impl ChatHub {
    /// Spawn the hub task and return a handle to it.
    pub fn spawn() -> Self {
        let (commands, command_rx) = mpsc::channel(COMMAND_BUFFER_SIZE);
        tokio::spawn(run(command_rx));
        Self { commands }
    }

    /// Register a new connection.
    ///
    /// Returns the connection identifier and the receiver for frames
    /// broadcast while the connection is registered. Frames published while
    /// a connection is not registered are never replayed to it.
    pub async fn connect(&self) -> Result<NewConnection> {
        let (reply, reply_rx) = oneshot::channel();
        self.commands
            .send(HubCommand::Connect { reply })
            .await
            .ok()
            .context("hub is no longer running")?;
        reply_rx.await.context("hub dropped the registration")
    }

    /// Broadcast a frame to every registered connection, the originator
    /// included. Fire-and-forget: the hub performs no validation and cannot
    /// reject a publish.
    pub async fn publish(&self, frame: Frame) {
        if self.commands.send(HubCommand::Publish { frame }).await.is_err() {
            warn!("publish dropped: hub is no longer running");
        }
    }

    /// Deregister a connection. No message is broadcast about departure.
    pub async fn disconnect(&self, id: ConnectionId) {
        let _ = self.commands.send(HubCommand::Disconnect { id }).await;
    }
}

async fn run(mut commands: mpsc::Receiver<HubCommand>) {
    let mut connections: HashMap<ConnectionId, mpsc::Sender<Frame>> = HashMap::new();
    let mut next_id: ConnectionId = 0;

    while let Some(command) = commands.recv().await {
        match command {
            HubCommand::Connect { reply } => {
                let id = next_id;
                next_id += 1;
                let (tx, rx) = mpsc::channel(CONNECTION_BUFFER_SIZE);
                if reply.send(NewConnection { id, frames: rx }).is_ok() {
                    connections.insert(id, tx);
                    info!("client connected: {}", id);
                } else {
                    debug!("connection {} abandoned before registration", id);
                }
            }

            HubCommand::Publish { frame } => {
                let mut stale = Vec::new();
                for (id, tx) in &connections {
                    match tx.try_send(frame.clone()) {
                        Ok(()) => {}
                        Err(TrySendError::Full(_)) => {
                            // Best-effort delivery: a slow consumer misses
                            // this frame rather than stalling the fan-out.
                            warn!("client {} send buffer full, dropping frame", id);
                        }
                        Err(TrySendError::Closed(_)) => stale.push(*id),
                    }
                }
                for id in stale {
                    connections.remove(&id);
                    debug!("client {} evicted, receiver gone", id);
                }
            }

            HubCommand::Disconnect { id } => {
                if connections.remove(&id).is_some() {
                    info!("client disconnected: {}", id);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chat(payload: &str) -> Frame {
        Frame::ChatMessage {
            payload: payload.to_string(),
        }
    }

    #[tokio::test]
    async fn test_broadcast_reaches_all_including_sender() {
        let hub = ChatHub::spawn();
        let mut a = hub.connect().await.unwrap();
        let mut b = hub.connect().await.unwrap();

        hub.publish(chat("Alice: hi")).await;

        assert_eq!(a.frames.recv().await.unwrap(), chat("Alice: hi"));
        assert_eq!(b.frames.recv().await.unwrap(), chat("Alice: hi"));
    }

    #[tokio::test]
    async fn test_total_broadcast_order() {
        let hub = ChatHub::spawn();
        let mut a = hub.connect().await.unwrap();
        let mut b = hub.connect().await.unwrap();

        hub.publish(chat("m1")).await;
        hub.publish(chat("m2")).await;
        hub.publish(chat("m3")).await;

        for conn in [&mut a, &mut b] {
            assert_eq!(conn.frames.recv().await.unwrap(), chat("m1"));
            assert_eq!(conn.frames.recv().await.unwrap(), chat("m2"));
            assert_eq!(conn.frames.recv().await.unwrap(), chat("m3"));
        }
    }

    #[tokio::test]
    async fn test_no_backfill_after_reconnect() {
        let hub = ChatHub::spawn();
        let mut a = hub.connect().await.unwrap();

        let b = hub.connect().await.unwrap();
        hub.disconnect(b.id).await;

        hub.publish(chat("missed")).await;

        let mut b = hub.connect().await.unwrap();
        hub.publish(chat("seen")).await;

        assert_eq!(a.frames.recv().await.unwrap(), chat("missed"));
        assert_eq!(a.frames.recv().await.unwrap(), chat("seen"));
        // The reconnected client only observes frames published after it
        // re-registered.
        assert_eq!(b.frames.recv().await.unwrap(), chat("seen"));
    }

    #[tokio::test]
    async fn test_connection_ids_are_unique() {
        let hub = ChatHub::spawn();
        let a = hub.connect().await.unwrap();
        let b = hub.connect().await.unwrap();
        hub.disconnect(a.id).await;
        let c = hub.connect().await.unwrap();

        assert_ne!(a.id, b.id);
        assert_ne!(b.id, c.id);
        assert_ne!(a.id, c.id);
    }

    #[tokio::test]
    async fn test_dropped_receiver_is_evicted() {
        let hub = ChatHub::spawn();
        let mut a = hub.connect().await.unwrap();
        let b = hub.connect().await.unwrap();
        drop(b.frames);

        // First publish hits the closed channel and evicts it; the hub keeps
        // serving the remaining connection.
        hub.publish(chat("m1")).await;
        hub.publish(chat("m2")).await;

        assert_eq!(a.frames.recv().await.unwrap(), chat("m1"));
        assert_eq!(a.frames.recv().await.unwrap(), chat("m2"));
    }
}
