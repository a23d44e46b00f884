//! Chat relay and guess evaluation.

use scribble_protocol::{ChatKind, PlayerId, Recipient, ServerEvent};
use tracing::{debug, info};

use crate::game::{Outbox, Room};
use crate::score;

impl Room {
    /// Handles a chat line from `sender`.
    ///
    /// While a round runs, a line from a player who is neither the drawer nor
    /// already correct is a guess. A guess matching the word (trimmed,
    /// case-insensitive) scores and is announced without echoing the text;
    /// anything else is relayed as plain chat. Blank lines are dropped.
    pub fn chat(&mut self, sender: PlayerId, text: &str) -> Outbox {
        let Some(username) = self.player(sender).map(|p| p.username.clone()) else {
            debug!(room = %self.code, %sender, "chat from non-member, dropping");
            return Vec::new();
        };
        let text = text.trim();
        if text.is_empty() {
            return Vec::new();
        }

        if self.is_guesser(sender) && self.matches_word(text) {
            return self.accept_guess(sender, username);
        }

        vec![(
            Recipient::All,
            ServerEvent::ChatMessage {
                kind: ChatKind::Plain,
                username: Some(username),
                text: text.to_string(),
            },
        )]
    }

    fn is_guesser(&self, id: PlayerId) -> bool {
        self.round_active()
            && self.drawer_id != Some(id)
            && !self.correct_guessers.contains_key(&id)
    }

    fn matches_word(&self, text: &str) -> bool {
        self.current_word
            .as_deref()
            .is_some_and(|word| word.to_lowercase() == text.to_lowercase())
    }

    fn accept_guess(&mut self, sender: PlayerId, username: String) -> Outbox {
        let award = score::guesser_score(self.scheduler.time_left());
        self.correct_guessers.insert(sender, award);
        if let Some(player) = self.players.iter_mut().find(|p| p.id == sender) {
            player.score += award;
        }
        info!(
            room = %self.code,
            player_id = %sender,
            award,
            correct = self.correct_guessers.len(),
            "correct guess"
        );

        let word = self.current_word.clone().unwrap_or_default();
        let mut out: Outbox = self
            .players
            .iter()
            .map(|p| {
                let knows_word =
                    Some(p.id) == self.drawer_id || self.correct_guessers.contains_key(&p.id);
                let text = if knows_word {
                    format!("Guessed the word \"{word}\" correctly!")
                } else {
                    "Guessed the word correctly!".to_string()
                };
                (
                    Recipient::Player(p.id),
                    ServerEvent::ChatMessage {
                        kind: ChatKind::Correct,
                        username: Some(username.clone()),
                        text,
                    },
                )
            })
            .collect();
        out.push((
            Recipient::All,
            ServerEvent::UpdatePlayers {
                players: self.player_views(),
            },
        ));

        if self.all_guessed() {
            debug!(room = %self.code, round = self.round, "everyone guessed, ending round early");
            out.extend(self.end_round());
        }
        out
    }
}
