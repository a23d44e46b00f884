//! Departures: leaving, disconnecting, and being kicked.

use scribble_protocol::{PlayerId, Recipient, ServerEvent};
use tracing::info;

use crate::game::{Outbox, Room, system_chat};
use crate::{RoomError, RoomStatus};

/// Why a player is leaving.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Departure {
    /// Left on their own or disconnected.
    Left,
    /// Removed by the admin.
    Kicked,
}

impl Room {
    /// Removes a player and rebalances the room.
    ///
    /// In order: announce the departure; promote the earliest-joined player
    /// if the admin left; end the round if the drawer left mid-round; pause
    /// the game if too few players remain; otherwise end the round early if
    /// everyone left has already guessed. An emptied room only cancels its
    /// timer; the caller destroys it.
    pub fn remove_player(
        &mut self,
        id: PlayerId,
        departure: Departure,
    ) -> Result<Outbox, RoomError> {
        let idx = self
            .players
            .iter()
            .position(|p| p.id == id)
            .ok_or(RoomError::PlayerNotFound(id))?;
        let player = self.players.remove(idx);
        self.correct_guessers.remove(&id);
        info!(
            room = %self.code,
            player_id = %id,
            ?departure,
            players = self.players.len(),
            "player removed"
        );

        if self.players.is_empty() {
            self.scheduler.cancel();
            self.admin_id = None;
            self.drawer_id = None;
            self.current_word = None;
            return Ok(Vec::new());
        }

        let line = match departure {
            Departure::Left => format!("{} left the room", player.username),
            Departure::Kicked => format!("{} was kicked by admin from the room", player.username),
        };
        let mut out: Outbox = vec![(Recipient::All, system_chat(line))];

        if self.admin_id == Some(id) {
            let heir = &self.players[0];
            self.admin_id = Some(heir.id);
            info!(room = %self.code, admin = %heir.id, "admin reassigned");
            out.push((Recipient::Player(heir.id), ServerEvent::AdminAssigned));
            out.push((
                Recipient::All,
                system_chat(format!("{} is now the room admin", heir.username)),
            ));
        }

        let was_drawer = self.drawer_id == Some(id);
        if was_drawer {
            self.drawer_id = None;
            // The next player in rotation now sits at the departed seat.
            self.resume_slot = Some(idx);
        }

        out.push((
            Recipient::All,
            ServerEvent::UpdatePlayers {
                players: self.player_views(),
            },
        ));

        if was_drawer && self.round_active() {
            out.extend(self.end_round());
        }

        if self.status == RoomStatus::Playing && self.players.len() < self.config.min_players {
            out.extend(self.pause());
        } else if self.round_active() && self.all_guessed() {
            out.extend(self.end_round());
        }

        Ok(out)
    }

    /// Admin-only removal of `target`. The target is told before it is
    /// removed.
    pub fn kick(&mut self, requester: PlayerId, target: PlayerId) -> Result<Outbox, RoomError> {
        if self.admin_id != Some(requester) {
            return Err(RoomError::NotAdmin(requester));
        }
        if !self.contains(target) {
            return Err(RoomError::PlayerNotFound(target));
        }
        let mut out: Outbox = vec![(
            Recipient::Player(target),
            ServerEvent::Kicked {
                message: "You have been kicked from the room".to_string(),
            },
        )];
        out.extend(self.remove_player(target, Departure::Kicked)?);
        Ok(out)
    }

    /// Drops back to waiting without ending the game: round counter and
    /// scores are kept.
    fn pause(&mut self) -> Outbox {
        self.scheduler.cancel();
        self.status = RoomStatus::Waiting;
        self.current_word = None;
        self.drawer_id = None;
        self.resume_slot = None;
        self.correct_guessers.clear();
        info!(room = %self.code, round = self.round, "game paused");

        vec![
            (Recipient::All, system_chat("Game paused: Not enough players")),
            (Recipient::All, ServerEvent::RoomReset),
            (
                Recipient::All,
                ServerEvent::UpdatePlayers {
                    players: self.player_views(),
                },
            ),
        ]
    }
}
