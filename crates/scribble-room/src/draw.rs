//! Drawing relay. Strokes are never stored.

use scribble_protocol::{DrawStroke, PlayerId, Recipient, ServerEvent};
use tracing::debug;

use crate::game::{Outbox, Room};

impl Room {
    /// Relays a validated stroke from the drawer to everyone else. Strokes
    /// from anyone else, or outside a running round, are dropped.
    pub fn draw(&self, sender: PlayerId, stroke: DrawStroke) -> Outbox {
        if !self.may_draw(sender) {
            debug!(room = %self.code, %sender, "draw from non-drawer, dropping");
            return Vec::new();
        }
        vec![(Recipient::AllExcept(sender), ServerEvent::Draw(stroke))]
    }

    /// Relays a canvas wipe from the drawer to everyone else.
    pub fn clear_canvas(&self, sender: PlayerId) -> Outbox {
        if !self.may_draw(sender) {
            debug!(room = %self.code, %sender, "clear from non-drawer, dropping");
            return Vec::new();
        }
        vec![(Recipient::AllExcept(sender), ServerEvent::ClearCanvas)]
    }

    fn may_draw(&self, sender: PlayerId) -> bool {
        self.round_active() && self.drawer_id == Some(sender)
    }
}
