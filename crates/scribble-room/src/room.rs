//! Room actor: an isolated Tokio task that owns one [`Room`].
//!
//! Each room runs in its own task and talks to the outside world through an
//! mpsc channel. Timer firings are a second branch of the same `select!`
//! loop, so commands and timers never interleave inside a room.

use std::collections::HashMap;

use scribble_protocol::{DrawStroke, PlayerId, PlayerView, Recipient, RoomCode, ServerEvent};
use tokio::sync::{mpsc, oneshot};

use crate::game::{Outbox, Room};
use crate::presence::Departure;
use crate::{RoomError, RoomStatus};

/// Channel for delivering server events to one player's connection.
pub type PlayerSender = mpsc::UnboundedSender<ServerEvent>;

/// In-game actions a member can send straight to its room.
#[derive(Debug, Clone)]
pub enum RoomEvent {
    StartGame,
    Chat(String),
    Draw(DrawStroke),
    ClearCanvas,
}

/// Commands sent to a room actor through its channel.
///
/// The `oneshot::Sender` in some variants is the reply channel: the caller
/// sends a command and waits for the response on it.
pub(crate) enum RoomCommand {
    /// Add a player to the room.
    Join {
        player_id: PlayerId,
        username: String,
        sender: PlayerSender,
        reply: oneshot::Sender<Result<(), RoomError>>,
    },

    /// Ask whether a join would succeed, without joining.
    CheckJoin {
        player_id: PlayerId,
        username: String,
        reply: oneshot::Sender<Result<(), RoomError>>,
    },

    /// Remove a player. Replies with the number of players left.
    Leave {
        player_id: PlayerId,
        reply: oneshot::Sender<Result<usize, RoomError>>,
    },

    /// Admin removes a player. Replies with the number of players left.
    Kick {
        requester: PlayerId,
        target: PlayerId,
        reply: oneshot::Sender<Result<usize, RoomError>>,
    },

    /// Fire-and-forget action from a member. Failures are reported to the
    /// member as an `error` event.
    Event { sender: PlayerId, event: RoomEvent },

    /// Request a snapshot of the room.
    GetInfo { reply: oneshot::Sender<RoomInfo> },

    /// Shut down the room.
    Shutdown,
}

/// A snapshot of room metadata.
#[derive(Debug, Clone)]
pub struct RoomInfo {
    pub code: RoomCode,
    pub status: RoomStatus,
    pub round: u32,
    pub total_rounds: u32,
    pub players: Vec<PlayerView>,
    pub max_players: usize,
    pub time_left: u32,
}

/// Handle to a running room actor.
///
/// Cheap to clone: it wraps an `mpsc::Sender`. The registry holds one per
/// room and each member's connection caches a copy for in-game traffic.
#[derive(Clone)]
pub struct RoomHandle {
    code: RoomCode,
    sender: mpsc::Sender<RoomCommand>,
}

impl std::fmt::Debug for RoomHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoomHandle").field("code", &self.code).finish()
    }
}

impl RoomHandle {
    /// The room's code.
    pub fn code(&self) -> &RoomCode {
        &self.code
    }

    /// Whether the actor has stopped.
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }

    fn unavailable(&self) -> RoomError {
        RoomError::Unavailable(self.code.clone())
    }

    async fn request<T>(
        &self,
        make: impl FnOnce(oneshot::Sender<T>) -> RoomCommand,
    ) -> Result<T, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(make(reply_tx))
            .await
            .map_err(|_| self.unavailable())?;
        reply_rx.await.map_err(|_| self.unavailable())
    }

    /// Sends a join request to the room.
    pub async fn join(
        &self,
        player_id: PlayerId,
        username: &str,
        sender: PlayerSender,
    ) -> Result<(), RoomError> {
        let username = username.to_string();
        self.request(|reply| RoomCommand::Join {
            player_id,
            username,
            sender,
            reply,
        })
        .await?
    }

    /// Asks the room whether it would accept this join right now.
    pub async fn check_join(&self, player_id: PlayerId, username: &str) -> Result<(), RoomError> {
        let username = username.to_string();
        self.request(|reply| RoomCommand::CheckJoin {
            player_id,
            username,
            reply,
        })
        .await?
    }

    /// Removes a player. Returns how many players remain.
    pub async fn leave(&self, player_id: PlayerId) -> Result<usize, RoomError> {
        self.request(|reply| RoomCommand::Leave { player_id, reply })
            .await?
    }

    /// Admin-only removal. Returns how many players remain.
    pub async fn kick(&self, requester: PlayerId, target: PlayerId) -> Result<usize, RoomError> {
        self.request(|reply| RoomCommand::Kick {
            requester,
            target,
            reply,
        })
        .await?
    }

    /// Sends an in-game action (fire-and-forget).
    pub async fn send_event(&self, sender: PlayerId, event: RoomEvent) -> Result<(), RoomError> {
        self.sender
            .send(RoomCommand::Event { sender, event })
            .await
            .map_err(|_| self.unavailable())
    }

    /// Requests a snapshot of the room.
    pub async fn get_info(&self) -> Result<RoomInfo, RoomError> {
        self.request(|reply| RoomCommand::GetInfo { reply }).await
    }

    /// Tells the room to shut down.
    pub async fn shutdown(&self) -> Result<(), RoomError> {
        self.sender
            .send(RoomCommand::Shutdown)
            .await
            .map_err(|_| self.unavailable())
    }
}

/// The internal room actor state. Runs inside a Tokio task.
struct RoomActor {
    room: Room,
    /// Per-player outbound channels.
    senders: HashMap<PlayerId, PlayerSender>,
    receiver: mpsc::Receiver<RoomCommand>,
}

impl RoomActor {
    /// Runs the actor loop until shutdown or until the room empties.
    async fn run(mut self) {
        tracing::info!(room = %self.room.code(), "room actor started");

        loop {
            tokio::select! {
                cmd = self.receiver.recv() => {
                    let Some(cmd) = cmd else { break };
                    if !self.handle(cmd) {
                        break;
                    }
                }
                event = self.room.next_timer() => {
                    let out = self.room.on_timer(event);
                    self.dispatch(out);
                }
            }
        }

        tracing::info!(room = %self.room.code(), "room actor stopped");
    }

    /// Handles one command. Returns `false` when the actor should stop.
    fn handle(&mut self, cmd: RoomCommand) -> bool {
        match cmd {
            RoomCommand::Join {
                player_id,
                username,
                sender,
                reply,
            } => {
                match self.room.join(player_id, &username) {
                    Ok(out) => {
                        self.senders.insert(player_id, sender);
                        self.dispatch(out);
                        let _ = reply.send(Ok(()));
                    }
                    Err(e) => {
                        tracing::debug!(room = %self.room.code(), %player_id, error = %e, "join rejected");
                        let _ = reply.send(Err(e));
                    }
                }
                true
            }
            RoomCommand::CheckJoin {
                player_id,
                username,
                reply,
            } => {
                let _ = reply.send(self.room.check_join(player_id, &username));
                true
            }
            RoomCommand::Leave { player_id, reply } => {
                let result =
                    self.depart(player_id, |room| room.remove_player(player_id, Departure::Left));
                let keep_running = !self.room.is_empty();
                let _ = reply.send(result);
                keep_running
            }
            RoomCommand::Kick {
                requester,
                target,
                reply,
            } => {
                let result = self.depart(target, |room| room.kick(requester, target));
                let keep_running = !self.room.is_empty();
                let _ = reply.send(result);
                keep_running
            }
            RoomCommand::Event { sender, event } => {
                self.handle_event(sender, event);
                true
            }
            RoomCommand::GetInfo { reply } => {
                let _ = reply.send(self.info());
                true
            }
            RoomCommand::Shutdown => {
                tracing::info!(room = %self.room.code(), "room shutting down");
                self.room.scheduler.cancel();
                false
            }
        }
    }

    /// Runs a departure and delivers its events before the departing
    /// player's channel is dropped, so a kicked player still hears why.
    fn depart(
        &mut self,
        leaving: PlayerId,
        op: impl FnOnce(&mut Room) -> Result<Outbox, RoomError>,
    ) -> Result<usize, RoomError> {
        let out = op(&mut self.room)?;
        self.dispatch(out);
        self.senders.remove(&leaving);
        Ok(self.room.players().len())
    }

    fn handle_event(&mut self, sender: PlayerId, event: RoomEvent) {
        if !self.room.contains(sender) {
            tracing::warn!(
                room = %self.room.code(),
                %sender,
                "event from non-member, ignoring"
            );
            return;
        }

        let result = match event {
            RoomEvent::StartGame => self.room.start_game(sender),
            RoomEvent::Chat(text) => Ok(self.room.chat(sender, &text)),
            RoomEvent::Draw(stroke) => Ok(self.room.draw(sender, stroke)),
            RoomEvent::ClearCanvas => Ok(self.room.clear_canvas(sender)),
        };

        match result {
            Ok(out) => self.dispatch(out),
            Err(e) => {
                tracing::debug!(room = %self.room.code(), %sender, error = %e, "request rejected");
                self.send_to(
                    sender,
                    ServerEvent::Error {
                        kind: e.kind(),
                        message: e.to_string(),
                    },
                );
            }
        }
    }

    /// Dispatches outbound events to the correct recipients.
    fn dispatch(&self, out: Outbox) {
        for (recipient, event) in out {
            match recipient {
                Recipient::All => {
                    for pid in self.senders.keys() {
                        self.send_to(*pid, event.clone());
                    }
                }
                Recipient::Player(pid) => {
                    self.send_to(pid, event);
                }
                Recipient::AllExcept(excluded) => {
                    for pid in self.senders.keys() {
                        if *pid != excluded {
                            self.send_to(*pid, event.clone());
                        }
                    }
                }
            }
        }
    }

    /// Sends an event to a single player. Silently drops it if the
    /// receiver is gone (player disconnected).
    fn send_to(&self, player_id: PlayerId, event: ServerEvent) {
        if let Some(sender) = self.senders.get(&player_id) {
            let _ = sender.send(event);
        }
    }

    fn info(&self) -> RoomInfo {
        RoomInfo {
            code: self.room.code().clone(),
            status: self.room.status(),
            round: self.room.round(),
            total_rounds: self.room.config().total_rounds,
            players: self.room.player_views(),
            max_players: self.room.config().max_players,
            time_left: self.room.time_left(),
        }
    }
}

/// Spawns the actor for a freshly created room whose creator is already
/// seated, delivers the creation events, and returns a handle.
///
/// `channel_size` bounds the command queue; when it fills, senders wait.
pub(crate) fn spawn_room(
    room: Room,
    creator: PlayerId,
    sender: PlayerSender,
    created: Outbox,
    channel_size: usize,
) -> RoomHandle {
    let (tx, rx) = mpsc::channel(channel_size);
    let code = room.code().clone();

    let actor = RoomActor {
        room,
        senders: HashMap::from([(creator, sender)]),
        receiver: rx,
    };
    actor.dispatch(created);

    tokio::spawn(actor.run());

    RoomHandle { code, sender: tx }
}
