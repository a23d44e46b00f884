//! Game settings and the room status machine.

use std::time::Duration;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// GameConfig
// ---------------------------------------------------------------------------

/// Settings shared by every room a server hosts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Length of a round in countdown ticks (seconds by default).
    pub round_secs: u32,

    /// Rounds per game.
    pub total_rounds: u32,

    /// Minimum players required to start, and to keep a game running.
    pub min_players: usize,

    /// Maximum players allowed in a room.
    pub max_players: usize,

    /// Pause between the end of one round and the start of the next.
    pub intermission: Duration,

    /// Countdown resolution.
    pub tick_interval: Duration,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            round_secs: 60,
            total_rounds: 3,
            min_players: 2,
            max_players: 10,
            intermission: Duration::from_secs(5),
            tick_interval: Duration::from_secs(1),
        }
    }
}

impl GameConfig {
    /// Clamps out-of-range values so the config is safe to use.
    ///
    /// - `round_secs` and `total_rounds` are at least 1.
    /// - `min_players` is at least 2 (someone has to guess).
    /// - `max_players` is at least `min_players`.
    /// - A zero `tick_interval` becomes one second.
    pub fn validated(mut self) -> Self {
        if self.round_secs == 0 {
            tracing::warn!("round_secs of zero, using 1");
            self.round_secs = 1;
        }
        if self.total_rounds == 0 {
            tracing::warn!("total_rounds of zero, using 1");
            self.total_rounds = 1;
        }
        if self.min_players < 2 {
            tracing::warn!(min_players = self.min_players, "min_players below 2, clamping");
            self.min_players = 2;
        }
        if self.max_players < self.min_players {
            tracing::warn!(
                max_players = self.max_players,
                min_players = self.min_players,
                "max_players below min_players, clamping"
            );
            self.max_players = self.min_players;
        }
        if self.tick_interval.is_zero() {
            self.tick_interval = Duration::from_secs(1);
        }
        self
    }
}

// ---------------------------------------------------------------------------
// RoomStatus
// ---------------------------------------------------------------------------

/// The lifecycle status of a room.
///
/// ```text
/// Waiting → Playing → Finished → Waiting
/// ```
///
/// - **Waiting**: accepting players, no game running. A paused game also
///   lands here, keeping its round counter and scores.
/// - **Playing**: rounds are running (including the intermission between
///   them).
/// - **Finished**: the last round ended and results are being announced.
///   The room moves straight on to `Waiting`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoomStatus {
    Waiting,
    Playing,
    Finished,
}

impl RoomStatus {
    /// The status a room moves to from this one.
    pub fn next(self) -> Self {
        match self {
            Self::Waiting => Self::Playing,
            Self::Playing => Self::Finished,
            Self::Finished => Self::Waiting,
        }
    }
}

impl std::fmt::Display for RoomStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Waiting => write!(f, "Waiting"),
            Self::Playing => write!(f, "Playing"),
            Self::Finished => write!(f, "Finished"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_room_status_cycles() {
        assert_eq!(RoomStatus::Waiting.next(), RoomStatus::Playing);
        assert_eq!(RoomStatus::Playing.next(), RoomStatus::Finished);
        assert_eq!(RoomStatus::Finished.next(), RoomStatus::Waiting);
    }

    #[test]
    fn test_room_status_display() {
        assert_eq!(RoomStatus::Waiting.to_string(), "Waiting");
        assert_eq!(RoomStatus::Playing.to_string(), "Playing");
    }

    #[test]
    fn test_game_config_default() {
        let config = GameConfig::default();
        assert_eq!(config.round_secs, 60);
        assert_eq!(config.total_rounds, 3);
        assert_eq!(config.min_players, 2);
        assert_eq!(config.max_players, 10);
        assert_eq!(config.intermission, Duration::from_secs(5));
        assert_eq!(config.tick_interval, Duration::from_secs(1));
    }

    #[test]
    fn test_game_config_validated_clamps() {
        let config = GameConfig {
            round_secs: 0,
            total_rounds: 0,
            min_players: 1,
            max_players: 0,
            intermission: Duration::ZERO,
            tick_interval: Duration::ZERO,
        }
        .validated();
        assert_eq!(config.round_secs, 1);
        assert_eq!(config.total_rounds, 1);
        assert_eq!(config.min_players, 2);
        assert_eq!(config.max_players, 2);
        assert_eq!(config.intermission, Duration::ZERO);
        assert_eq!(config.tick_interval, Duration::from_secs(1));
    }

    #[test]
    fn test_game_config_deserializes_partial() {
        let config: GameConfig = serde_json::from_str(r#"{"total_rounds": 5}"#).unwrap();
        assert_eq!(config.total_rounds, 5);
        assert_eq!(config.round_secs, 60);
    }
}
