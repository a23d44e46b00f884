//! Per-connection handler: greeting, event routing, and cleanup.
//!
//! Each accepted connection gets its own Tokio task running this handler.
//! The flow is:
//!   1. Assign a `PlayerId` and send `connected`
//!   2. Spawn a writer task that drains the player's outbound channel
//!   3. Loop: receive frames → decode → route to the registry or the room
//!   4. On close, error, or idle timeout: leave the room

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use scribble_protocol::{ClientEvent, Codec, ErrorKind, PlayerId, ServerEvent};
use scribble_room::{PlayerSender, RoomError, RoomEvent, RoomHandle, RoomRegistry};
use scribble_transport::{Connection, TransportError};
use tokio::sync::mpsc;

use crate::ScribbleError;
use crate::server::ServerState;

/// Drop guard that takes the player out of their room when the handler
/// exits.
///
/// This ensures cleanup happens even if the handler panics. Since `Drop`
/// is synchronous, we spawn a fire-and-forget task for the async lock.
struct MembershipGuard<K: Codec> {
    player_id: PlayerId,
    state: Arc<ServerState<K>>,
}

impl<K: Codec> Drop for MembershipGuard<K> {
    fn drop(&mut self) {
        let player_id = self.player_id;
        let state = Arc::clone(&self.state);
        tokio::spawn(async move {
            let mut registry = state.registry.lock().await;
            match registry.leave_room(player_id).await {
                Ok(()) => tracing::debug!(%player_id, "left room on disconnect"),
                Err(RoomError::NotInRoom(_)) => {}
                Err(e) => tracing::debug!(%player_id, error = %e, "leave on disconnect failed"),
            }
        });
    }
}

/// What one connection knows about its player.
struct Session<K: Codec> {
    player_id: PlayerId,
    outbound: PlayerSender,
    /// Cached handle for in-game traffic, so chat and strokes skip the
    /// registry lock.
    room: Option<RoomHandle>,
    state: Arc<ServerState<K>>,
}

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection<C, K>(
    conn: C,
    state: Arc<ServerState<K>>,
) -> Result<(), ScribbleError>
where
    C: Connection<Error = TransportError>,
    K: Codec,
{
    let conn = Arc::new(conn);
    let conn_id = conn.id();
    let player_id = PlayerId(conn_id.into_inner());
    tracing::info!(%conn_id, %player_id, "player connected");

    let (outbound, receiver) = mpsc::unbounded_channel();
    let writer = tokio::spawn(write_loop(
        Arc::clone(&conn),
        Arc::clone(&state),
        player_id,
        receiver,
    ));

    let _ = outbound.send(ServerEvent::Connected { player_id });

    let _guard = MembershipGuard {
        player_id,
        state: Arc::clone(&state),
    };
    let mut session = Session {
        player_id,
        outbound,
        room: None,
        state: Arc::clone(&state),
    };

    let result = read_loop(conn.as_ref(), &mut session).await;

    // Room actors hold clones of the outbound sender, so the writer would
    // otherwise outlive the socket.
    writer.abort();
    let _ = conn.close().await;

    // _guard drops here → the player leaves their room.
    result
}

/// Receives frames until the peer goes away or falls silent.
async fn read_loop<C, K>(conn: &C, session: &mut Session<K>) -> Result<(), ScribbleError>
where
    C: Connection<Error = TransportError>,
    K: Codec,
{
    let player_id = session.player_id;
    let idle_timeout = session.state.config.idle_timeout;

    loop {
        let data = match tokio::time::timeout(idle_timeout, conn.recv()).await {
            Ok(Ok(Some(data))) => data,
            Ok(Ok(None)) => {
                tracing::info!(%player_id, "connection closed cleanly");
                return Ok(());
            }
            Ok(Err(e)) => {
                tracing::debug!(%player_id, error = %e, "recv error");
                return Err(e.into());
            }
            Err(_) => {
                tracing::info!(%player_id, "connection timed out");
                return Ok(());
            }
        };

        let event = match session.state.codec.decode_client(&data) {
            Ok(event) => event,
            Err(e) => {
                tracing::debug!(%player_id, error = %e, "failed to decode event");
                continue;
            }
        };

        session.dispatch(event).await;
    }
}

/// Drains the player's outbound channel onto the socket.
async fn write_loop<C, K>(
    conn: Arc<C>,
    state: Arc<ServerState<K>>,
    player_id: PlayerId,
    mut receiver: mpsc::UnboundedReceiver<ServerEvent>,
) where
    C: Connection<Error = TransportError>,
    K: Codec,
{
    while let Some(event) = receiver.recv().await {
        let bytes = match state.codec.encode_server(&event) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(%player_id, error = %e, "failed to encode event");
                continue;
            }
        };
        if let Err(e) = conn.send(&bytes).await {
            tracing::debug!(%player_id, error = %e, "send failed, stopping writer");
            break;
        }
    }
}

impl<K: Codec> Session<K> {
    async fn dispatch(&mut self, event: ClientEvent) {
        let player_id = self.player_id;

        match event {
            ClientEvent::CreateRoom { username } => {
                let result = {
                    let mut registry = self.state.registry.lock().await;
                    let result = registry
                        .create_room(player_id, &username, self.outbound.clone())
                        .await;
                    self.room = current_room(&registry, player_id);
                    result
                };
                if let Err(e) = result {
                    self.send_error(&e);
                }
            }

            ClientEvent::JoinRoom {
                username,
                room_code,
            } => {
                let result = {
                    let mut registry = self.state.registry.lock().await;
                    let result = registry
                        .join_room(player_id, &room_code, &username, self.outbound.clone())
                        .await;
                    // A rejected join may still have left the previous room.
                    self.room = current_room(&registry, player_id);
                    result
                };
                if let Err(e) = result {
                    tracing::debug!(%player_id, error = %e, "join rejected");
                    let _ = self.outbound.send(ServerEvent::JoinError {
                        kind: e.kind(),
                        message: e.to_string(),
                    });
                }
            }

            ClientEvent::KickPlayer { target_id } => {
                let result = {
                    let mut registry = self.state.registry.lock().await;
                    registry.kick(player_id, target_id).await
                };
                if let Err(e) = result {
                    self.send_error(&e);
                }
            }

            ClientEvent::StartGame => self.forward(RoomEvent::StartGame).await,
            ClientEvent::ChatMessage { text } => self.forward(RoomEvent::Chat(text)).await,
            ClientEvent::ClearCanvas => self.forward(RoomEvent::ClearCanvas).await,

            ClientEvent::Draw(raw) => match raw.validate() {
                Ok(stroke) => self.forward(RoomEvent::Draw(stroke)).await,
                Err(e) => {
                    tracing::warn!(%player_id, error = %e, "malformed draw payload");
                    let _ = self.outbound.send(ServerEvent::Error {
                        kind: ErrorKind::InvalidDrawPayload,
                        message: e.to_string(),
                    });
                }
            },

            ClientEvent::Heartbeat { client_time } => {
                let _ = self.outbound.send(ServerEvent::HeartbeatAck {
                    client_time,
                    server_time: unix_millis(),
                });
            }
        }
    }

    /// Sends an in-game action to the cached room.
    async fn forward(&mut self, event: RoomEvent) {
        let player_id = self.player_id;
        let Some(handle) = &self.room else {
            tracing::debug!(%player_id, ?event, "not in a room, dropping event");
            return;
        };
        if let Err(e) = handle.send_event(player_id, event).await {
            tracing::debug!(%player_id, error = %e, "room gone, dropping event");
            self.room = None;
        }
    }

    fn send_error(&self, err: &RoomError) {
        tracing::debug!(player_id = %self.player_id, error = %err, "request rejected");
        let _ = self.outbound.send(ServerEvent::Error {
            kind: err.kind(),
            message: err.to_string(),
        });
    }
}

/// The handle of the room the registry has the player in, if any.
fn current_room(registry: &RoomRegistry, player_id: PlayerId) -> Option<RoomHandle> {
    registry
        .player_room(player_id)
        .and_then(|code| registry.handle(&code))
}

/// Wall-clock milliseconds since the Unix epoch.
fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}
