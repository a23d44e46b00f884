//! Wire protocol for Scribble.
//!
//! - **Types** ([`ClientEvent`], [`ServerEvent`], [`RoomCode`], ...) — the
//!   closed set of events that travel between browsers and the server.
//! - **Validation** ([`RawStroke::validate`]) — draw payloads are checked here,
//!   before they can reach a room.
//! - **Codec** ([`Codec`], [`JsonCodec`]) — bytes in, events out.
//!
//! ```text
//! Transport (frames) → Protocol (ClientEvent) → Room (state machine)
//! ```

mod codec;
mod error;
mod types;

pub use codec::{Codec, JsonCodec};
pub use error::ProtocolError;
pub use types::{
    ChatKind, ClientEvent, DrawStroke, ErrorKind, FinalScore, PlayerId, PlayerView,
    RawStroke, Recipient, RoomCode, ScoreLine, Segment, ServerEvent,
};
