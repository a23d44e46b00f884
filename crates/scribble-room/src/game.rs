//! The room state machine: players, rounds, turn rotation, and scoring.
//!
//! [`Room`] is plain synchronous state. Every operation returns an
//! [`Outbox`] of `(Recipient, ServerEvent)` pairs instead of sending
//! anything itself; the room actor resolves recipients against its member
//! channels. Chat, drawing, and departures live in sibling modules as further
//! `impl Room` blocks.

use std::collections::HashMap;
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use scribble_protocol::{
    ChatKind, FinalScore, PlayerId, PlayerView, Recipient, RoomCode, ScoreLine, ServerEvent,
};
use scribble_tick::{RoundScheduler, TimerEvent};
use tracing::{debug, info};

use crate::words::{WordProvider, hint};
use crate::{GameConfig, RoomError, RoomStatus, score};

/// Events produced by a room operation, in delivery order.
pub type Outbox = Vec<(Recipient, ServerEvent)>;

/// A member of a room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Player {
    pub id: PlayerId,
    pub username: String,
    pub score: u32,
}

/// A system line in the room chat.
pub(crate) fn system_chat(text: impl Into<String>) -> ServerEvent {
    ServerEvent::ChatMessage {
        kind: ChatKind::System,
        username: None,
        text: text.into(),
    }
}

/// Authoritative state of one room.
///
/// Admin and drawer are stored once, as ids, and projected onto each player
/// only when a [`PlayerView`] is built.
pub struct Room {
    pub(crate) code: RoomCode,
    pub(crate) config: GameConfig,
    /// Join order. The earliest-joined remaining player inherits admin.
    pub(crate) players: Vec<Player>,
    pub(crate) status: RoomStatus,
    pub(crate) round: u32,
    /// Set only while a round is running.
    pub(crate) current_word: Option<String>,
    /// Points awarded to each correct guesser this round.
    pub(crate) correct_guessers: HashMap<PlayerId, u32>,
    pub(crate) admin_id: Option<PlayerId>,
    pub(crate) drawer_id: Option<PlayerId>,
    /// Seat of a drawer who left mid-game; the next round starts there.
    pub(crate) resume_slot: Option<usize>,
    pub(crate) scheduler: RoundScheduler,
    words: Arc<dyn WordProvider>,
    rng: StdRng,
}

impl Room {
    /// Creates an empty room. Call [`create`](Self::create) to seat its
    /// first player.
    pub fn new(code: RoomCode, config: GameConfig, words: Arc<dyn WordProvider>) -> Self {
        let config = config.validated();
        let scheduler = RoundScheduler::new(config.tick_interval);
        Self {
            code,
            config,
            players: Vec::new(),
            status: RoomStatus::Waiting,
            round: 0,
            current_word: None,
            correct_guessers: HashMap::new(),
            admin_id: None,
            drawer_id: None,
            resume_slot: None,
            scheduler,
            words,
            rng: StdRng::from_rng(&mut rand::rng()),
        }
    }

    /// Replaces the room's RNG, for reproducible drawer and word picks.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    // -----------------------------------------------------------------
    // Membership
    // -----------------------------------------------------------------

    /// Seats the creator as the sole player and admin.
    pub fn create(&mut self, creator: PlayerId, username: &str) -> Result<Outbox, RoomError> {
        let username = clean_username(username)?;
        self.players.push(Player {
            id: creator,
            username,
            score: 0,
        });
        self.admin_id = Some(creator);
        info!(room = %self.code, player_id = %creator, "room opened");

        Ok(vec![
            (
                Recipient::Player(creator),
                ServerEvent::RoomCreated {
                    room_code: self.code.clone(),
                    players: self.player_views(),
                },
            ),
            (
                Recipient::All,
                ServerEvent::UpdatePlayers {
                    players: self.player_views(),
                },
            ),
        ])
    }

    /// Whether `join` would accept this player, without changing anything.
    pub fn check_join(&self, player_id: PlayerId, username: &str) -> Result<(), RoomError> {
        let username = clean_username(username)?;
        if self.players.len() >= self.config.max_players {
            return Err(RoomError::RoomFull {
                code: self.code.clone(),
                max: self.config.max_players,
            });
        }
        if self
            .players
            .iter()
            .any(|p| p.username == username || p.id == player_id)
        {
            return Err(RoomError::UsernameTaken(username));
        }
        Ok(())
    }

    /// Adds a non-admin player.
    ///
    /// A player joining mid-round is brought up to date with the current
    /// round number and their hint view. Strokes already drawn are not
    /// replayed.
    pub fn join(&mut self, player_id: PlayerId, username: &str) -> Result<Outbox, RoomError> {
        self.check_join(player_id, username)?;
        let username = username.to_string();

        let joined_as = username.clone();
        self.players.push(Player {
            id: player_id,
            username,
            score: 0,
        });
        let admin_id = *self.admin_id.get_or_insert(player_id);
        info!(
            room = %self.code,
            %player_id,
            players = self.players.len(),
            "player joined"
        );

        let mut out: Outbox = vec![
            (
                Recipient::Player(player_id),
                ServerEvent::RoomJoined {
                    room_code: self.code.clone(),
                    players: self.player_views(),
                    admin_id,
                },
            ),
            (
                Recipient::All,
                ServerEvent::UpdatePlayers {
                    players: self.player_views(),
                },
            ),
            (
                Recipient::All,
                system_chat(format!("{joined_as} joined the room")),
            ),
        ];

        if self.status == RoomStatus::Waiting && self.players.len() >= self.config.min_players {
            out.push((Recipient::Player(admin_id), ServerEvent::CanStartGame));
        }

        if self.round_active() {
            out.push((
                Recipient::Player(player_id),
                ServerEvent::RoundStart {
                    round: self.round,
                    total_rounds: self.config.total_rounds,
                },
            ));
            if let Some(state) = self.game_state_for(player_id) {
                out.push((Recipient::Player(player_id), state));
            }
        }

        Ok(out)
    }

    // -----------------------------------------------------------------
    // Game lifecycle
    // -----------------------------------------------------------------

    /// Starts a game. Admin only, only while waiting, only with enough
    /// players. On error nothing changes.
    pub fn start_game(&mut self, requester: PlayerId) -> Result<Outbox, RoomError> {
        if self.admin_id != Some(requester) {
            return Err(RoomError::NotAdmin(requester));
        }
        if self.status != RoomStatus::Waiting {
            return Err(RoomError::GameInProgress);
        }
        if self.players.len() < self.config.min_players {
            return Err(RoomError::InsufficientPlayers {
                have: self.players.len(),
                need: self.config.min_players,
            });
        }

        for player in &mut self.players {
            player.score = 0;
        }
        self.scheduler.cancel();
        self.drawer_id = None;
        self.resume_slot = None;
        self.round = 0;
        self.status = self.status.next();
        info!(
            room = %self.code,
            players = self.players.len(),
            total_rounds = self.config.total_rounds,
            "game started"
        );

        let mut out: Outbox = vec![
            (
                Recipient::All,
                ServerEvent::UpdatePlayers {
                    players: self.player_views(),
                },
            ),
            (Recipient::All, system_chat("Game starting...")),
        ];
        out.extend(self.start_round());
        Ok(out)
    }

    /// Begins the next round: rotates the drawer, picks a word, and starts
    /// the countdown.
    pub(crate) fn start_round(&mut self) -> Outbox {
        if self.players.is_empty() {
            return Vec::new();
        }
        self.round += 1;
        self.correct_guessers.clear();

        let len = self.players.len();
        let previous = self
            .drawer_id
            .and_then(|id| self.players.iter().position(|p| p.id == id));
        let next = match (previous, self.resume_slot.take()) {
            (Some(idx), _) => (idx + 1) % len,
            (None, Some(slot)) => slot % len,
            (None, None) => self.rng.random_range(0..len),
        };
        let drawer = self.players[next].id;
        self.drawer_id = Some(drawer);

        let word = self.words.pick(&mut self.rng);
        self.current_word = Some(word);
        self.scheduler.start_countdown(self.config.round_secs);
        info!(
            room = %self.code,
            round = self.round,
            drawer = %drawer,
            generation = self.scheduler.generation(),
            "round started"
        );

        let mut out: Outbox = vec![
            (
                Recipient::All,
                ServerEvent::RoundStart {
                    round: self.round,
                    total_rounds: self.config.total_rounds,
                },
            ),
            (
                Recipient::All,
                ServerEvent::UpdatePlayers {
                    players: self.player_views(),
                },
            ),
        ];
        out.extend(self.game_state_views());
        out
    }

    /// Reacts to a scheduler event.
    pub fn on_timer(&mut self, event: TimerEvent) -> Outbox {
        match event {
            TimerEvent::Tick { time_left } => {
                if !self.round_active() {
                    debug!(room = %self.code, "tick without an active round, ignoring");
                    return Vec::new();
                }
                let mut out = self.game_state_views();
                if time_left == 0 {
                    debug!(room = %self.code, round = self.round, "round timed out");
                    out.extend(self.end_round());
                }
                out
            }
            TimerEvent::IntermissionElapsed => {
                if self.status != RoomStatus::Playing || self.round_active() {
                    debug!(room = %self.code, status = %self.status, "stale intermission, ignoring");
                    return Vec::new();
                }
                self.start_round()
            }
        }
    }

    /// Closes the running round: awards the drawer, reveals the word, then
    /// schedules the next round or ends the game.
    pub(crate) fn end_round(&mut self) -> Outbox {
        self.scheduler.cancel();
        let Some(word) = self.current_word.take() else {
            return Vec::new();
        };

        let non_drawing = self
            .players
            .iter()
            .filter(|p| Some(p.id) != self.drawer_id)
            .count();
        let drawer_award = score::drawer_score(self.correct_guessers.len(), non_drawing);
        let mut scores = Vec::with_capacity(self.players.len());
        for player in &mut self.players {
            let gained = if Some(player.id) == self.drawer_id {
                player.score += drawer_award;
                drawer_award
            } else {
                self.correct_guessers.get(&player.id).copied().unwrap_or(0)
            };
            scores.push(ScoreLine {
                player_id: player.id,
                username: player.username.clone(),
                score: player.score,
                gained,
            });
        }
        info!(
            room = %self.code,
            round = self.round,
            correct = self.correct_guessers.len(),
            drawer_award,
            "round ended"
        );

        let mut out: Outbox = vec![
            (Recipient::All, ServerEvent::RoundEnd { word, scores }),
            (
                Recipient::All,
                ServerEvent::UpdatePlayers {
                    players: self.player_views(),
                },
            ),
        ];

        if self.round < self.config.total_rounds {
            self.scheduler.start_intermission(self.config.intermission);
        } else {
            out.extend(self.end_game());
        }
        out
    }

    /// Announces the winner and returns the room to waiting.
    fn end_game(&mut self) -> Outbox {
        self.scheduler.cancel();
        self.status = RoomStatus::Finished;

        let scores: Vec<FinalScore> = self
            .players
            .iter()
            .map(|p| FinalScore {
                player_id: p.id,
                username: p.username.clone(),
                score: p.score,
            })
            .collect();
        let totals: Vec<u32> = scores.iter().map(|s| s.score).collect();
        let winner = score::winner(&totals).map(|i| scores[i].clone());
        info!(
            room = %self.code,
            winner = ?winner.as_ref().map(|w| w.player_id),
            "game finished"
        );

        self.status = self.status.next();
        self.current_word = None;
        self.drawer_id = None;
        self.resume_slot = None;
        self.correct_guessers.clear();

        let mut out: Outbox = vec![
            (Recipient::All, ServerEvent::GameEnd { winner, scores }),
            (Recipient::All, ServerEvent::RoomReset),
            (
                Recipient::All,
                ServerEvent::UpdatePlayers {
                    players: self.player_views(),
                },
            ),
        ];
        if let Some(admin) = self.admin_id {
            out.push((Recipient::Player(admin), ServerEvent::CanStartGame));
        }
        out.push((
            Recipient::All,
            system_chat("The game has ended. The admin can start a new game."),
        ));
        out
    }

    // -----------------------------------------------------------------
    // Views
    // -----------------------------------------------------------------

    /// The ordered player list as clients see it.
    pub fn player_views(&self) -> Vec<PlayerView> {
        self.players
            .iter()
            .map(|p| PlayerView {
                id: p.id,
                username: p.username.clone(),
                score: p.score,
                is_drawing: Some(p.id) == self.drawer_id,
                is_admin: Some(p.id) == self.admin_id,
            })
            .collect()
    }

    /// `game-state` as `viewer` should see it: the word for the drawer, the
    /// hint for everyone. `None` outside an active round.
    pub fn game_state_for(&self, viewer: PlayerId) -> Option<ServerEvent> {
        let word = self.current_word.as_ref()?;
        let drawer_id = self.drawer_id?;
        let drawer_name = self.player(drawer_id)?.username.clone();
        Some(ServerEvent::GameState {
            drawer_id,
            drawer_name,
            word: (viewer == drawer_id).then(|| word.clone()),
            hint: hint(word),
            time_left: self.scheduler.time_left(),
        })
    }

    pub(crate) fn game_state_views(&self) -> Outbox {
        self.players
            .iter()
            .filter_map(|p| {
                self.game_state_for(p.id)
                    .map(|state| (Recipient::Player(p.id), state))
            })
            .collect()
    }

    // -----------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------

    pub fn code(&self) -> &RoomCode {
        &self.code
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn status(&self) -> RoomStatus {
        self.status
    }

    pub fn round(&self) -> u32 {
        self.round
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.players.iter().find(|p| p.id == id)
    }

    pub fn contains(&self, id: PlayerId) -> bool {
        self.player(id).is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    pub fn admin_id(&self) -> Option<PlayerId> {
        self.admin_id
    }

    pub fn drawer_id(&self) -> Option<PlayerId> {
        self.drawer_id
    }

    pub fn current_word(&self) -> Option<&str> {
        self.current_word.as_deref()
    }

    /// Seconds left in the running round, `0` when none is running.
    pub fn time_left(&self) -> u32 {
        self.scheduler.time_left()
    }

    /// Players who have guessed the word this round.
    pub fn correct_count(&self) -> usize {
        self.correct_guessers.len()
    }

    /// Whether the between-round delay is running.
    pub fn in_intermission(&self) -> bool {
        self.scheduler.in_intermission()
    }

    /// Whether a round is running (word chosen, guesses accepted).
    pub fn round_active(&self) -> bool {
        self.status == RoomStatus::Playing && self.current_word.is_some()
    }

    /// Waits for the room's next timer event. Pends forever while no timer
    /// runs.
    pub async fn next_timer(&mut self) -> TimerEvent {
        self.scheduler.wait().await
    }

    /// Every remaining non-drawer has guessed (and there is at least one).
    pub(crate) fn all_guessed(&self) -> bool {
        let non_drawing = self
            .players
            .iter()
            .filter(|p| Some(p.id) != self.drawer_id)
            .count();
        non_drawing > 0 && self.correct_guessers.len() >= non_drawing
    }
}

/// Rejects blank usernames. Names are kept exactly as sent.
fn clean_username(raw: &str) -> Result<String, RoomError> {
    if raw.trim().is_empty() {
        return Err(RoomError::EmptyUsername);
    }
    Ok(raw.to_string())
}
