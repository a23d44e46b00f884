//! Error types for the room layer.

use scribble_protocol::{ErrorKind, PlayerId, RoomCode};

/// Errors that can occur during room operations.
///
/// Every variant maps to a user-facing [`ErrorKind`] through
/// [`RoomError::kind`]; the `Display` text is what the requester sees.
#[derive(Debug, thiserror::Error)]
pub enum RoomError {
    /// Username was empty or only whitespace.
    #[error("Username is required")]
    EmptyUsername,

    /// No live room has this code.
    #[error("Room {0} not found")]
    NotFound(String),

    /// The room has no free player slots.
    #[error("Room {code} is full (max {max} players)")]
    RoomFull { code: RoomCode, max: usize },

    /// Another player in the room already uses this name.
    #[error("Username {0:?} is already taken")]
    UsernameTaken(String),

    /// The requester is not the room admin.
    #[error("Only the admin can do that ({0} is not admin)")]
    NotAdmin(PlayerId),

    /// Not enough players to start a game.
    #[error("Need at least {need} players to start (have {have})")]
    InsufficientPlayers { have: usize, need: usize },

    /// A game is already running.
    #[error("A game is already in progress")]
    GameInProgress,

    /// The requester is not a member of any room.
    #[error("{0} is not in a room")]
    NotInRoom(PlayerId),

    /// The target of a kick is not in the room.
    #[error("Player {0} not found in this room")]
    PlayerNotFound(PlayerId),

    /// Every code drawn during creation collided with a live room.
    #[error("No free room code available, try again")]
    NoFreeCode,

    /// The room's actor is gone or its command channel is closed.
    #[error("Room {0} is unavailable")]
    Unavailable(RoomCode),
}

impl RoomError {
    /// The wire category reported to the requester.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::EmptyUsername => ErrorKind::EmptyUsername,
            Self::NotFound(_) => ErrorKind::RoomNotFound,
            Self::RoomFull { .. } => ErrorKind::RoomFull,
            Self::UsernameTaken(_) => ErrorKind::UsernameTaken,
            Self::NotAdmin(_) => ErrorKind::NotAdmin,
            Self::InsufficientPlayers { .. } => ErrorKind::InsufficientPlayers,
            Self::GameInProgress => ErrorKind::GameInProgress,
            Self::NotInRoom(_) => ErrorKind::RoomNotFound,
            Self::PlayerNotFound(_) => ErrorKind::PlayerNotFound,
            Self::NoFreeCode | Self::Unavailable(_) => ErrorKind::Unavailable,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_mapping() {
        assert_eq!(RoomError::EmptyUsername.kind(), ErrorKind::EmptyUsername);
        assert_eq!(
            RoomError::NotFound("QQQQ".into()).kind(),
            ErrorKind::RoomNotFound
        );
        assert_eq!(
            RoomError::InsufficientPlayers { have: 1, need: 2 }.kind(),
            ErrorKind::InsufficientPlayers
        );
        assert_eq!(RoomError::NoFreeCode.kind(), ErrorKind::Unavailable);
    }

    #[test]
    fn test_messages_are_user_readable() {
        let full = RoomError::RoomFull {
            code: RoomCode::from_letters([0, 1, 2, 3]),
            max: 10,
        };
        assert_eq!(full.to_string(), "Room ABCD is full (max 10 players)");
        assert_eq!(
            RoomError::InsufficientPlayers { have: 1, need: 2 }.to_string(),
            "Need at least 2 players to start (have 1)"
        );
    }
}
