//! # Scribble
//!
//! Server for a real-time multiplayer draw-and-guess game.
//!
//! Players connect over WebSocket, gather in rooms identified by four-letter
//! codes, and take turns drawing a secret word while the others race to
//! guess it in chat. Each room is an isolated actor task that owns its game
//! state and round timer; this crate wires the layers together:
//!
//! ```text
//! WebSocket (frames) → JsonCodec (ClientEvent) → RoomRegistry / RoomHandle → Room
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use scribble::prelude::*;
//!
//! # async fn run() -> Result<(), ScribbleError> {
//! let server = ScribbleServer::builder()
//!     .config(ServerConfig::from_env())
//!     .build()
//!     .await?;
//! server.run().await
//! # }
//! ```

mod config;
mod error;
mod handler;
mod server;

pub use config::{DEFAULT_IDLE_TIMEOUT, DEFAULT_PORT, ServerConfig};
pub use error::ScribbleError;
pub use server::{ScribbleServer, ScribbleServerBuilder};

/// Everything needed to configure and run a server.
pub mod prelude {
    pub use crate::{ScribbleError, ScribbleServer, ScribbleServerBuilder, ServerConfig};
    pub use scribble_protocol::{ClientEvent, ErrorKind, PlayerId, RoomCode, ServerEvent};
    pub use scribble_room::{GameConfig, WordList, WordProvider};
}
