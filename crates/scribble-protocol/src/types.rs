//! Core protocol types for Scribble's wire format.
//!
//! Every frame on the wire is one JSON object of the shape
//! `{ "event": "<kebab-case-name>", "data": { ...camelCase fields... } }`.
//! Inbound frames decode into [`ClientEvent`], outbound frames are built from
//! [`ServerEvent`]. Both are closed unions: anything that doesn't match a
//! variant is rejected at the boundary and never reaches a room.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ProtocolError;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// A unique identifier for a connected player.
///
/// Assigned by the server from the transport connection, so it is unique per
/// connection, not per person. `#[serde(transparent)]` keeps it a plain
/// number on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub u64);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P-{}", self.0)
    }
}

/// The short code players type to find a room: exactly four uppercase
/// ASCII letters.
///
/// The only way to build one is [`RoomCode::parse`] or
/// [`RoomCode::from_letters`], so every `RoomCode` in the system is valid.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RoomCode(String);

impl RoomCode {
    /// Number of letters in a code.
    pub const LEN: usize = 4;

    /// The alphabet codes are drawn from.
    pub const ALPHABET: &'static [u8; 26] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ";

    /// Parses user input into a code. Surrounding whitespace is ignored and
    /// lowercase letters are accepted.
    pub fn parse(input: &str) -> Result<Self, ProtocolError> {
        let code = input.trim().to_ascii_uppercase();
        if code.len() != Self::LEN || !code.bytes().all(|b| b.is_ascii_uppercase()) {
            return Err(ProtocolError::InvalidRoomCode(input.to_string()));
        }
        Ok(Self(code))
    }

    /// Builds a code from alphabet indices (each taken modulo 26).
    pub fn from_letters(indices: [usize; Self::LEN]) -> Self {
        let code = indices
            .iter()
            .map(|i| char::from(Self::ALPHABET[i % Self::ALPHABET.len()]))
            .collect();
        Self(code)
    }

    /// The code as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for RoomCode {
    type Error = ProtocolError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<RoomCode> for String {
    fn from(code: RoomCode) -> Self {
        code.0
    }
}

// ---------------------------------------------------------------------------
// Recipient — who should receive an event?
// ---------------------------------------------------------------------------

/// Specifies which members of a room receive a server event.
///
/// Room logic returns `(Recipient, ServerEvent)` pairs; the room actor
/// resolves them against its member list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Recipient {
    /// Every member of the room.
    All,

    /// One specific member.
    Player(PlayerId),

    /// Every member except one (usually the sender).
    AllExcept(PlayerId),
}

// ---------------------------------------------------------------------------
// Views shared by several events
// ---------------------------------------------------------------------------

/// A player as seen by clients.
///
/// `is_admin` and `is_drawing` are derived from the room's single admin and
/// drawer references when the view is built; they are not stored per player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerView {
    pub id: PlayerId,
    pub username: String,
    pub score: u32,
    pub is_drawing: bool,
    pub is_admin: bool,
}

/// One line of the round-end score table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreLine {
    pub player_id: PlayerId,
    pub username: String,
    /// Total score after the round.
    pub score: u32,
    /// Points earned in this round.
    pub gained: u32,
}

/// A player's total at the end of a game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinalScore {
    pub player_id: PlayerId,
    pub username: String,
    pub score: u32,
}

/// Flavor of a chat line, so clients can style it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatKind {
    /// Announcement from the room itself (joins, departures, pauses).
    System,
    /// Ordinary chat attributed to a player.
    Plain,
    /// A player guessed the word.
    Correct,
}

/// The user-facing error categories. Sent only to the player whose request
/// failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorKind {
    EmptyUsername,
    RoomNotFound,
    RoomFull,
    UsernameTaken,
    NotAdmin,
    InsufficientPlayers,
    InvalidDrawPayload,
    GameInProgress,
    PlayerNotFound,
    Unavailable,
}

// ---------------------------------------------------------------------------
// Drawing
// ---------------------------------------------------------------------------

/// One line segment of a stroke.
///
/// Coordinates are fractions of the drawer's canvas size, not pixels, so each
/// recipient scales them to its own canvas.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
}

impl Segment {
    fn is_finite(&self) -> bool {
        [self.x0, self.y0, self.x1, self.y1]
            .iter()
            .all(|v| v.is_finite())
    }
}

/// A validated batch of segments from the drawer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DrawStroke {
    pub stroke_id: String,
    pub segments: Vec<Segment>,
    pub color: String,
    pub width: f32,
}

impl DrawStroke {
    pub const DEFAULT_COLOR: &'static str = "#000000";
    pub const DEFAULT_WIDTH: f32 = 5.0;
}

/// A draw payload exactly as the client sent it.
///
/// Kept untyped so that a broken stroke is reported as
/// [`ProtocolError::InvalidDrawPayload`] instead of a generic decode failure.
/// Call [`RawStroke::validate`] before handing it to a room.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawStroke(pub serde_json::Value);

impl RawStroke {
    /// Checks the payload shape and fills in defaults for color and width.
    pub fn validate(self) -> Result<DrawStroke, ProtocolError> {
        let serde_json::Value::Object(mut fields) = self.0 else {
            return Err(invalid_stroke("payload must be an object"));
        };

        let segments = match fields.remove("segments") {
            None | Some(serde_json::Value::Null) => {
                return Err(invalid_stroke("missing segment list"));
            }
            Some(serde_json::Value::Array(items)) => items,
            Some(_) => return Err(invalid_stroke("segments must be a list")),
        };
        let segments = segments
            .into_iter()
            .enumerate()
            .map(|(i, item)| {
                let segment: Segment = serde_json::from_value(item)
                    .map_err(|e| invalid_stroke(&format!("segment {i}: {e}")))?;
                if !segment.is_finite() {
                    return Err(invalid_stroke(&format!(
                        "segment {i}: coordinates must be finite"
                    )));
                }
                Ok(segment)
            })
            .collect::<Result<Vec<_>, _>>()?;

        let stroke_id = match fields.remove("strokeId") {
            None | Some(serde_json::Value::Null) => String::new(),
            Some(serde_json::Value::String(s)) => s,
            Some(serde_json::Value::Number(n)) => n.to_string(),
            Some(_) => return Err(invalid_stroke("strokeId must be a string")),
        };

        let color = match fields.remove("color") {
            None | Some(serde_json::Value::Null) => DrawStroke::DEFAULT_COLOR.to_string(),
            Some(serde_json::Value::String(s)) if s.is_empty() => {
                DrawStroke::DEFAULT_COLOR.to_string()
            }
            Some(serde_json::Value::String(s)) => s,
            Some(_) => return Err(invalid_stroke("color must be a string")),
        };

        let width = match fields.remove("width") {
            None | Some(serde_json::Value::Null) => DrawStroke::DEFAULT_WIDTH,
            Some(serde_json::Value::Number(n)) => {
                let width = n.as_f64().unwrap_or(f64::NAN) as f32;
                if !width.is_finite() || width <= 0.0 {
                    return Err(invalid_stroke("width must be a positive number"));
                }
                width
            }
            Some(_) => return Err(invalid_stroke("width must be a number")),
        };

        Ok(DrawStroke {
            stroke_id,
            segments,
            color,
            width,
        })
    }
}

fn invalid_stroke(reason: &str) -> ProtocolError {
    ProtocolError::InvalidDrawPayload(reason.to_string())
}

// ---------------------------------------------------------------------------
// ClientEvent — inbound
// ---------------------------------------------------------------------------

/// Everything a client may send.
///
/// The sender is never part of the payload; the server knows it from the
/// connection. Disconnection is a transport-level event and has no variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "event",
    content = "data",
    rename_all = "kebab-case",
    rename_all_fields = "camelCase"
)]
pub enum ClientEvent {
    /// Open a new room with the sender as its admin.
    CreateRoom { username: String },

    /// Enter an existing room by code.
    JoinRoom { username: String, room_code: String },

    /// Admin only: begin a game.
    StartGame,

    /// Admin only: remove a player from the room.
    KickPlayer { target_id: PlayerId },

    /// Drawer only: a batch of stroke segments.
    Draw(RawStroke),

    /// Drawer only: wipe everyone's canvas.
    ClearCanvas,

    /// A chat line, which may turn out to be a guess.
    ChatMessage { text: String },

    /// Keep-alive. Echoed back as [`ServerEvent::HeartbeatAck`].
    Heartbeat { client_time: u64 },
}

// ---------------------------------------------------------------------------
// ServerEvent — outbound
// ---------------------------------------------------------------------------

/// Everything the server may send to a client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "event",
    content = "data",
    rename_all = "kebab-case",
    rename_all_fields = "camelCase"
)]
pub enum ServerEvent {
    /// First frame on every connection: the id the server assigned.
    Connected { player_id: PlayerId },

    /// The sender's room was created; they are its admin.
    RoomCreated {
        room_code: RoomCode,
        players: Vec<PlayerView>,
    },

    /// The sender joined a room. Carries enough state to render immediately.
    RoomJoined {
        room_code: RoomCode,
        players: Vec<PlayerView>,
        admin_id: PlayerId,
    },

    /// A create or join request failed.
    JoinError { kind: ErrorKind, message: String },

    /// Any other request failed.
    Error { kind: ErrorKind, message: String },

    /// The full, ordered player list.
    UpdatePlayers { players: Vec<PlayerView> },

    /// A chat line. `username` is absent for system lines.
    ChatMessage {
        kind: ChatKind,
        username: Option<String>,
        text: String,
    },

    /// Sent to the admin when the room has enough players to start.
    CanStartGame,

    /// A new round began.
    RoundStart { round: u32, total_rounds: u32 },

    /// Per-player view of the running round. `word` is only set for the
    /// drawer; everyone gets the masked `hint`.
    GameState {
        drawer_id: PlayerId,
        drawer_name: String,
        word: Option<String>,
        hint: String,
        time_left: u32,
    },

    /// A stroke relayed from the drawer.
    Draw(DrawStroke),

    /// The drawer cleared the canvas.
    ClearCanvas,

    /// The round is over; the word is revealed.
    RoundEnd { word: String, scores: Vec<ScoreLine> },

    /// The game is over.
    GameEnd {
        winner: Option<FinalScore>,
        scores: Vec<FinalScore>,
    },

    /// The room went back to waiting (game over or paused).
    RoomReset,

    /// The receiver was removed by the admin.
    Kicked { message: String },

    /// The receiver is now the room admin.
    AdminAssigned,

    /// Reply to [`ClientEvent::Heartbeat`].
    HeartbeatAck { client_time: u64, server_time: u64 },
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    // =====================================================================
    // Identity types
    // =====================================================================

    #[test]
    fn test_player_id_serializes_as_plain_number() {
        let json = serde_json::to_string(&PlayerId(42)).unwrap();
        assert_eq!(json, "42");
        assert_eq!(PlayerId(7).to_string(), "P-7");
    }

    #[test]
    fn test_room_code_parse_accepts_four_letters() {
        let code = RoomCode::parse(" abcd ").unwrap();
        assert_eq!(code.as_str(), "ABCD");
    }

    #[test]
    fn test_room_code_parse_rejects_bad_input() {
        for bad in ["", "ABC", "ABCDE", "AB1D", "ÄBCD", "AB D"] {
            assert!(RoomCode::parse(bad).is_err(), "{bad:?} should be rejected");
        }
    }

    #[test]
    fn test_room_code_from_letters_wraps_indices() {
        let code = RoomCode::from_letters([0, 1, 25, 26]);
        assert_eq!(code.as_str(), "ABZA");
    }

    #[test]
    fn test_room_code_serde_is_validated() {
        let json = serde_json::to_string(&RoomCode::parse("WXYZ").unwrap()).unwrap();
        assert_eq!(json, "\"WXYZ\"");
        assert!(serde_json::from_str::<RoomCode>("\"W1\"").is_err());
    }

    // =====================================================================
    // ClientEvent — wire shapes
    // =====================================================================

    #[test]
    fn test_join_room_uses_kebab_event_and_camel_fields() {
        let raw = r#"{"event":"join-room","data":{"username":"ana","roomCode":"ABCD"}}"#;
        let event: ClientEvent = serde_json::from_str(raw).unwrap();
        assert_eq!(
            event,
            ClientEvent::JoinRoom {
                username: "ana".into(),
                room_code: "ABCD".into(),
            }
        );
    }

    #[test]
    fn test_unit_events_decode_without_data() {
        let event: ClientEvent = serde_json::from_str(r#"{"event":"start-game"}"#).unwrap();
        assert_eq!(event, ClientEvent::StartGame);
        let event: ClientEvent = serde_json::from_str(r#"{"event":"clear-canvas"}"#).unwrap();
        assert_eq!(event, ClientEvent::ClearCanvas);
    }

    #[test]
    fn test_kick_player_target_id() {
        let raw = r#"{"event":"kick-player","data":{"targetId":9}}"#;
        let event: ClientEvent = serde_json::from_str(raw).unwrap();
        assert_eq!(event, ClientEvent::KickPlayer { target_id: PlayerId(9) });
    }

    #[test]
    fn test_unknown_event_is_rejected() {
        let raw = r#"{"event":"fly-to-moon","data":{}}"#;
        assert!(serde_json::from_str::<ClientEvent>(raw).is_err());
    }

    #[test]
    fn test_chat_message_requires_text() {
        let raw = r#"{"event":"chat-message","data":{}}"#;
        assert!(serde_json::from_str::<ClientEvent>(raw).is_err());
    }

    // =====================================================================
    // Draw payload validation
    // =====================================================================

    #[test]
    fn test_valid_stroke_fills_defaults() {
        let raw = RawStroke(json!({
            "strokeId": "s-1",
            "segments": [{ "x0": 0.1, "y0": 0.2, "x1": 0.3, "y1": 0.4 }]
        }));
        let stroke = raw.validate().unwrap();
        assert_eq!(stroke.stroke_id, "s-1");
        assert_eq!(stroke.segments.len(), 1);
        assert_eq!(stroke.color, "#000000");
        assert_eq!(stroke.width, 5.0);
    }

    #[test]
    fn test_stroke_keeps_color_and_width() {
        let raw = RawStroke(json!({
            "strokeId": 17,
            "segments": [],
            "color": "#ff0000",
            "width": 12
        }));
        let stroke = raw.validate().unwrap();
        assert_eq!(stroke.stroke_id, "17");
        assert_eq!(stroke.color, "#ff0000");
        assert_eq!(stroke.width, 12.0);
    }

    #[test]
    fn test_stroke_with_non_positive_width_is_invalid() {
        for width in [json!(0), json!(0.0), json!(-3)] {
            let err = RawStroke(json!({ "segments": [], "width": width }))
                .validate()
                .unwrap_err();
            assert!(
                err.to_string().contains("width must be a positive number"),
                "width {width}: {err}"
            );
        }
    }

    #[test]
    fn test_stroke_without_segments_is_invalid() {
        let err = RawStroke(json!({ "color": "#000" })).validate().unwrap_err();
        assert!(matches!(err, ProtocolError::InvalidDrawPayload(_)));
    }

    #[test]
    fn test_stroke_with_non_list_segments_is_invalid() {
        let err = RawStroke(json!({ "segments": "lots" })).validate().unwrap_err();
        assert!(matches!(err, ProtocolError::InvalidDrawPayload(_)));
    }

    #[test]
    fn test_stroke_with_malformed_segment_is_invalid() {
        let err = RawStroke(json!({ "segments": [{ "x0": 0.1 }] }))
            .validate()
            .unwrap_err();
        assert!(err.to_string().contains("segment 0"));
    }

    #[test]
    fn test_stroke_payload_must_be_object() {
        assert!(RawStroke(json!([1, 2])).validate().is_err());
    }

    #[test]
    fn test_draw_event_decodes_raw_payload() {
        let raw = r#"{"event":"draw","data":{"segments":"nope"}}"#;
        let event: ClientEvent = serde_json::from_str(raw).unwrap();
        let ClientEvent::Draw(stroke) = event else {
            panic!("expected draw");
        };
        assert!(stroke.validate().is_err());
    }

    // =====================================================================
    // ServerEvent — wire shapes
    // =====================================================================

    #[test]
    fn test_game_state_json_format() {
        let event = ServerEvent::GameState {
            drawer_id: PlayerId(1),
            drawer_name: "ana".into(),
            word: None,
            hint: "_ _ _".into(),
            time_left: 42,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "game-state");
        assert_eq!(json["data"]["drawerId"], 1);
        assert_eq!(json["data"]["timeLeft"], 42);
        assert!(json["data"]["word"].is_null());
    }

    #[test]
    fn test_chat_message_json_format() {
        let event = ServerEvent::ChatMessage {
            kind: ChatKind::System,
            username: None,
            text: "ana joined the room".into(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "chat-message");
        assert_eq!(json["data"]["kind"], "system");
    }

    #[test]
    fn test_error_kind_is_kebab_case() {
        let event = ServerEvent::JoinError {
            kind: ErrorKind::UsernameTaken,
            message: "taken".into(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "join-error");
        assert_eq!(json["data"]["kind"], "username-taken");
    }

    #[test]
    fn test_unit_server_event_has_no_data() {
        let json = serde_json::to_value(&ServerEvent::RoomReset).unwrap();
        assert_eq!(json, json!({ "event": "room-reset" }));
    }
}
