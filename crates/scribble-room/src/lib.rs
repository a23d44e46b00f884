//! Room authority for Scribble.
//!
//! Each room runs as an isolated Tokio task (actor model) that owns its
//! players, rounds, timers and scores. Everything that changes a room goes
//! through that task, so a room never needs a lock.
//!
//! # Key types
//!
//! - [`Room`] — the synchronous state machine (join, start, guess, draw,
//!   depart) that returns events instead of sending them
//! - [`RoomRegistry`] — creates rooms under fresh codes, routes players
//! - [`RoomHandle`] — send commands to a running room actor
//! - [`RoomStatus`] — lifecycle state machine
//! - [`GameConfig`] — round length, round count, player limits
//! - [`WordProvider`] — where secret words come from

mod chat;
mod config;
mod draw;
mod error;
mod game;
mod presence;
mod registry;
mod room;
pub mod score;
mod words;

pub use config::{GameConfig, RoomStatus};
pub use error::RoomError;
pub use game::{Outbox, Player, Room};
pub use presence::Departure;
pub use registry::RoomRegistry;
pub use room::{PlayerSender, RoomEvent, RoomHandle, RoomInfo};
pub use words::{WordList, WordProvider, hint};
