//! The per-room round state machine.
//!
//! [`RoundMachine`] owns everything a room knows about its game: players,
//! scores, the drawer rotation, the secret word, who already guessed. It
//! performs no I/O. Every input takes the current time as a parameter and
//! returns the [`Effect`]s the caller must carry out, in order: events to
//! send, the one timer to arm or cancel, and whether the room is finished.
//!
//! ```text
//! Lobby ──start delay──▶ AwaitingWordChoice ──choice / timeout──▶ RoundActive
//!   ▲                           ▲                                     │
//!   │ too few players           │ next round           countdown 0 or │
//!   │                           │                        all guessed  ▼
//!   └───────────────────────────┴──────────────────────────── RoundEnding
//!                                                                     │
//!                                                  round limit reached▼
//!                                                                 GameOver
//! ```

use std::sync::Arc;
use std::time::Duration;

use rand::SeedableRng;
use rand::rngs::StdRng;
use serde_json::Value;
use sketchroom_protocol::{PlayerId, PlayerInfo, Recipient, RoomCode, ServerEvent};
use sketchroom_timer::{TimerToken, TokenSource};
use tokio::time::Instant;
use tracing::{debug, info, trace};

use crate::guess::{self, Verdict};
use crate::{GameConfig, GameError, WordBank, scoring};

/// Name given to players who join without one.
pub const DEFAULT_NAME: &str = "Guest";

/// Hint broadcast while the drawer is still choosing.
pub const WAITING_HINT: &str = "Waiting...";

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// Where a room is in its game.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Not enough players yet, or waiting out the start delay.
    Lobby,
    /// A drawer was picked and offered candidate words.
    AwaitingWordChoice,
    /// The word is set, the countdown runs and guesses score.
    RoundActive,
    /// The round is over; a reveal or the next round is pending.
    RoundEnding,
    /// The leaderboard was sent. Terminal.
    GameOver,
}

/// What a pending timer will do when it fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerKind {
    StartGame,
    ChoiceTimeout,
    CountdownTick,
    RevealWord,
    NextRound,
}

/// One side effect requested by the machine.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Deliver `event` to the players selected by `to`.
    Send { to: Recipient, event: ServerEvent },
    /// Arm `token` to fire `after` from now. Always preceded by a
    /// [`Effect::Cancel`] of the previous token, if one was pending.
    Schedule { token: TimerToken, after: Duration },
    /// Disarm `token`. A no-op if it already fired.
    Cancel(TimerToken),
    /// The room is finished and must stop accepting players.
    Close,
}

/// A seated player.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub score: u32,
}

impl Player {
    fn info(&self) -> PlayerInfo {
        PlayerInfo {
            id: self.id,
            name: self.name.clone(),
            score: self.score,
        }
    }
}

// ---------------------------------------------------------------------------
// Internal state
// ---------------------------------------------------------------------------

#[derive(Debug)]
struct Round {
    drawer: PlayerId,
    choices: Vec<String>,
    word: Option<String>,
    started_at: Option<Instant>,
    remaining_secs: u32,
    guessed: Vec<PlayerId>,
    revealed: bool,
}

// ---------------------------------------------------------------------------
// RoundMachine
// ---------------------------------------------------------------------------

/// Game state of one room.
#[derive(Debug)]
pub struct RoundMachine {
    code: RoomCode,
    config: GameConfig,
    words: Arc<WordBank>,
    rng: StdRng,
    players: Vec<Player>,
    phase: Phase,
    round: u32,
    drawer_index: usize,
    current: Option<Round>,
    pending: Option<(TimerToken, TimerKind)>,
    tokens: TokenSource,
    closed: bool,
    out: Vec<Effect>,
}

impl RoundMachine {
    pub fn new(code: RoomCode, config: GameConfig, words: Arc<WordBank>) -> Self {
        Self::with_rng(code, config, words, StdRng::from_os_rng())
    }

    /// Like [`RoundMachine::new`] with a deterministic word sampler.
    pub fn with_seed(code: RoomCode, config: GameConfig, words: Arc<WordBank>, seed: u64) -> Self {
        Self::with_rng(code, config, words, StdRng::seed_from_u64(seed))
    }

    fn with_rng(code: RoomCode, config: GameConfig, words: Arc<WordBank>, rng: StdRng) -> Self {
        Self {
            code,
            config,
            words,
            rng,
            players: Vec::new(),
            phase: Phase::Lobby,
            round: 0,
            drawer_index: 0,
            current: None,
            pending: None,
            tokens: TokenSource::new(),
            closed: false,
            out: Vec::new(),
        }
    }

    // -- accessors ----------------------------------------------------------

    pub fn code(&self) -> &RoomCode {
        &self.code
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Number of the current (or last) round; 0 before the first one.
    pub fn round(&self) -> u32 {
        self.round
    }

    /// Players in join order.
    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn player_infos(&self) -> Vec<PlayerInfo> {
        self.players.iter().map(Player::info).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.players.len() >= self.config.max_players
    }

    pub fn contains(&self, id: PlayerId) -> bool {
        self.players.iter().any(|p| p.id == id)
    }

    pub fn current_drawer(&self) -> Option<PlayerId> {
        self.current.as_ref().map(|r| r.drawer)
    }

    pub fn current_word(&self) -> Option<&str> {
        self.current.as_ref().and_then(|r| r.word.as_deref())
    }

    /// Words offered to the drawer this round.
    pub fn choices(&self) -> &[String] {
        self.current.as_ref().map_or(&[], |r| r.choices.as_slice())
    }

    /// Players who guessed this round's word, in guess order.
    pub fn guessed(&self) -> &[PlayerId] {
        self.current.as_ref().map_or(&[], |r| r.guessed.as_slice())
    }

    /// The one timer the room is waiting on, if any.
    pub fn pending_timer(&self) -> Option<(TimerToken, TimerKind)> {
        self.pending
    }

    /// `true` once the room emptied or the game ended.
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    // -- inputs -------------------------------------------------------------

    /// Seats a player and tells everyone.
    ///
    /// # Errors
    /// [`GameError::AlreadyJoined`] if `id` is seated already,
    /// [`GameError::RoomFull`] at capacity.
    pub fn add_player(
        &mut self,
        id: PlayerId,
        name: &str,
        _now: Instant,
    ) -> Result<Vec<Effect>, GameError> {
        if self.contains(id) {
            return Err(GameError::AlreadyJoined(id));
        }
        if self.is_full() {
            return Err(GameError::RoomFull);
        }

        let name = display_name(name, self.config.max_name_len);
        self.players.push(Player {
            id,
            name: name.clone(),
            score: 0,
        });
        info!(room = %self.code, player_id = %id, %name, players = self.players.len(), "player joined");

        let players = self.player_infos();
        self.send(
            Recipient::Player(id),
            ServerEvent::RoomJoined {
                code: self.code.clone(),
                players: players.clone(),
            },
        );
        self.send(Recipient::All, ServerEvent::UpdatePlayers { players });
        self.send(Recipient::All, ServerEvent::system(format!("{name} joined!")));

        self.catch_up(id);

        if self.phase == Phase::Lobby
            && self.pending.is_none()
            && self.players.len() >= self.config.min_players
        {
            debug!(room = %self.code, "enough players, starting soon");
            self.schedule(TimerKind::StartGame, self.config.start_delay);
        }

        Ok(self.take())
    }

    /// Removes a player. Removing the drawer abandons the round.
    pub fn remove_player(&mut self, id: PlayerId, _now: Instant) -> Vec<Effect> {
        let Some(pos) = self.players.iter().position(|p| p.id == id) else {
            return Vec::new();
        };
        let player = self.players.remove(pos);
        info!(room = %self.code, player_id = %id, players = self.players.len(), "player left");

        self.send(
            Recipient::All,
            ServerEvent::UpdatePlayers {
                players: self.player_infos(),
            },
        );
        self.send(Recipient::All, ServerEvent::system(format!("{} left", player.name)));

        if self.players.is_empty() {
            self.close();
            return self.take();
        }

        match self.phase {
            Phase::Lobby => {
                if self.players.len() < self.config.min_players {
                    if let Some((token, TimerKind::StartGame)) = self.pending {
                        self.pending = None;
                        self.out.push(Effect::Cancel(token));
                        debug!(room = %self.code, "start cancelled, waiting for players");
                    }
                }
            }
            Phase::AwaitingWordChoice | Phase::RoundActive | Phase::RoundEnding => {
                self.after_round_member_left(id);
            }
            Phase::GameOver => {}
        }

        self.take()
    }

    /// The drawer picks one of the offered words.
    pub fn choose_word(&mut self, id: PlayerId, word: &str, now: Instant) -> Vec<Effect> {
        if self.phase != Phase::AwaitingWordChoice || self.current_drawer() != Some(id) {
            debug!(room = %self.code, player_id = %id, "word choice ignored, not the drawer's turn");
            return Vec::new();
        }
        let wanted = word.trim().to_lowercase();
        let Some(word) = self
            .choices()
            .iter()
            .find(|c| c.to_lowercase() == wanted)
            .cloned()
        else {
            debug!(room = %self.code, player_id = %id, "word choice ignored, not an offered word");
            return Vec::new();
        };

        self.activate_word(word, false, now);
        self.take()
    }

    /// A chat line, evaluated as a guess while a word is active.
    pub fn chat(&mut self, id: PlayerId, text: &str, now: Instant) -> Vec<Effect> {
        let Some(player) = self.players.iter().find(|p| p.id == id) else {
            return Vec::new();
        };
        let name = player.name.clone();
        let text = guess::clean_text(text, self.config.max_message_len);
        if text.is_empty() {
            return Vec::new();
        }

        let secret = self
            .current
            .as_ref()
            .filter(|r| !r.revealed)
            .and_then(|r| r.word.clone());
        let Some(word) = secret else {
            self.send(Recipient::All, ServerEvent::Message { user: name, text });
            return self.take();
        };

        if self.current_drawer() == Some(id) {
            if guess::mentions(&text, &word) {
                debug!(room = %self.code, player_id = %id, "drawer message withheld");
                self.send(
                    Recipient::Player(id),
                    ServerEvent::system("Don't give away the word!"),
                );
            } else {
                self.send(Recipient::All, ServerEvent::Message { user: name, text });
            }
            return self.take();
        }

        if self.guessed().contains(&id) {
            self.send(
                Recipient::Player(id),
                ServerEvent::system("You already guessed it!"),
            );
            return self.take();
        }

        match guess::evaluate(&text, &word, self.config.near_miss_min_len) {
            Verdict::Correct if self.phase == Phase::RoundActive => self.award(id, now),
            Verdict::Correct | Verdict::TooClose => {
                self.send(Recipient::Player(id), ServerEvent::system("Too close!"));
            }
            Verdict::Chat => {
                self.send(Recipient::All, ServerEvent::Message { user: name, text });
            }
        }
        self.take()
    }

    /// Relays a stroke from the drawer to everyone else.
    pub fn relay_draw(&mut self, id: PlayerId, stroke: Value) -> Vec<Effect> {
        if self.current_drawer() != Some(id) {
            debug!(room = %self.code, player_id = %id, "draw ignored, not the drawer");
            return Vec::new();
        }
        vec![Effect::Send {
            to: Recipient::AllExcept(id),
            event: ServerEvent::Draw { stroke },
        }]
    }

    /// Relays a canvas wipe from the drawer to everyone else.
    pub fn relay_clear(&mut self, id: PlayerId) -> Vec<Effect> {
        if self.current_drawer() != Some(id) {
            debug!(room = %self.code, player_id = %id, "clear ignored, not the drawer");
            return Vec::new();
        }
        vec![Effect::Send {
            to: Recipient::AllExcept(id),
            event: ServerEvent::ClearCanvas,
        }]
    }

    /// Handles a fired timer. Tokens other than the pending one are stale
    /// and ignored.
    pub fn on_timer(&mut self, token: TimerToken, now: Instant) -> Vec<Effect> {
        let kind = match self.pending {
            Some((pending, kind)) if pending == token => kind,
            _ => {
                trace!(room = %self.code, %token, "stale timer ignored");
                return Vec::new();
            }
        };
        self.pending = None;
        trace!(room = %self.code, %token, ?kind, "timer fired");

        match kind {
            TimerKind::StartGame | TimerKind::NextRound => self.start_next_round(),
            TimerKind::ChoiceTimeout => {
                if let Some(word) = self.choices().first().cloned() {
                    debug!(room = %self.code, round = self.round, "word choice timed out");
                    self.activate_word(word, true, now);
                }
            }
            TimerKind::CountdownTick => self.tick(),
            TimerKind::RevealWord => self.reveal_after_all_guessed(),
        }
        self.take()
    }

    // -- transitions --------------------------------------------------------

    fn start_next_round(&mut self) {
        self.current = None;

        if self.round >= self.config.max_rounds {
            self.game_over();
            return;
        }
        if self.players.len() < self.config.min_players {
            debug!(room = %self.code, players = self.players.len(), "too few players, back to lobby");
            self.phase = Phase::Lobby;
            self.send(Recipient::All, ServerEvent::system("Waiting for more players..."));
            return;
        }

        let drawer = &self.players[self.drawer_index % self.players.len()];
        let (drawer_id, drawer_name) = (drawer.id, drawer.name.clone());
        self.drawer_index += 1;
        self.round += 1;

        let choices = self.words.pick(self.config.word_choices, &mut self.rng);
        self.current = Some(Round {
            drawer: drawer_id,
            choices: choices.clone(),
            word: None,
            started_at: None,
            remaining_secs: 0,
            guessed: Vec::new(),
            revealed: false,
        });
        self.phase = Phase::AwaitingWordChoice;
        info!(room = %self.code, round = self.round, drawer = %drawer_id, "round started");

        self.send(
            Recipient::All,
            ServerEvent::NewRound {
                round: self.round,
                drawer_id,
                drawer_name,
            },
        );
        self.send(Recipient::All, ServerEvent::ClearCanvas);
        self.send(
            Recipient::All,
            ServerEvent::WordHint {
                hint: WAITING_HINT.to_string(),
            },
        );
        self.send(Recipient::Player(drawer_id), ServerEvent::YourTurn { choices });
        self.schedule(TimerKind::ChoiceTimeout, self.config.choice_timeout);
    }

    fn activate_word(&mut self, word: String, auto: bool, now: Instant) {
        let secs = self.config.round_secs();
        let Some(round) = self.current.as_mut() else {
            return;
        };
        round.word = Some(word.clone());
        round.started_at = Some(now);
        round.remaining_secs = secs;
        round.guessed.clear();
        let drawer = round.drawer;
        self.phase = Phase::RoundActive;
        debug!(room = %self.code, round = self.round, auto, "word chosen");

        self.send(
            Recipient::All,
            ServerEvent::WordHint {
                hint: scoring::hint_for(&word),
            },
        );
        let private = if auto {
            ServerEvent::AutoChooseWord { word }
        } else {
            ServerEvent::WordChosen { word }
        };
        self.send(Recipient::Player(drawer), private);
        self.send(
            Recipient::All,
            ServerEvent::Timer {
                seconds_remaining: secs,
            },
        );
        self.schedule(TimerKind::CountdownTick, Duration::from_secs(1));
    }

    fn tick(&mut self) {
        if self.phase != Phase::RoundActive {
            return;
        }
        let Some(round) = self.current.as_mut() else {
            return;
        };
        round.remaining_secs = round.remaining_secs.saturating_sub(1);
        let remaining = round.remaining_secs;
        self.send(
            Recipient::All,
            ServerEvent::Timer {
                seconds_remaining: remaining,
            },
        );

        if remaining > 0 {
            self.schedule(TimerKind::CountdownTick, Duration::from_secs(1));
            return;
        }

        let Some(word) = self.reveal() else {
            return;
        };
        self.send(
            Recipient::All,
            ServerEvent::system(format!("Time's up! Word was: {word}")),
        );
        self.schedule(TimerKind::NextRound, self.config.intermission_after_timeout);
    }

    fn award(&mut self, id: PlayerId, now: Instant) {
        let Some(round) = self.current.as_mut() else {
            return;
        };
        let elapsed = round
            .started_at
            .map_or(0, |t| now.saturating_duration_since(t).as_secs());
        let points = scoring::points_for(elapsed, &self.config);
        round.guessed.push(id);

        let Some(player) = self.players.iter_mut().find(|p| p.id == id) else {
            return;
        };
        player.score = player.score.saturating_add(points);
        let name = player.name.clone();
        info!(room = %self.code, player_id = %id, round = self.round, points, "correct guess");

        self.send(
            Recipient::Player(id),
            ServerEvent::system(format!("Correct! +{points} pts")),
        );
        self.send(Recipient::All, ServerEvent::CorrectGuess { name, points });
        self.send(
            Recipient::All,
            ServerEvent::UpdatePlayers {
                players: self.player_infos(),
            },
        );

        if self.everyone_guessed() {
            self.begin_early_reveal();
        }
    }

    fn begin_early_reveal(&mut self) {
        debug!(room = %self.code, round = self.round, "everyone guessed");
        self.phase = Phase::RoundEnding;
        self.schedule(TimerKind::RevealWord, self.config.early_reveal_delay);
    }

    fn reveal_after_all_guessed(&mut self) {
        if self.reveal().is_none() {
            return;
        }
        self.send(Recipient::All, ServerEvent::system("Everyone guessed!"));
        self.schedule(
            TimerKind::NextRound,
            self.config.intermission_after_all_guessed,
        );
    }

    /// Broadcasts the word and marks the round over. Returns the word.
    fn reveal(&mut self) -> Option<String> {
        let round = self.current.as_mut()?;
        let word = round.word.clone()?;
        round.revealed = true;
        self.phase = Phase::RoundEnding;
        info!(room = %self.code, round = self.round, %word, "word revealed");
        self.send(Recipient::All, ServerEvent::WordReveal { word: word.clone() });
        Some(word)
    }

    fn after_round_member_left(&mut self, id: PlayerId) {
        let Some(round) = self.current.as_mut() else {
            return;
        };
        if round.revealed {
            return;
        }
        if round.drawer == id {
            info!(room = %self.code, round = self.round, "drawer left, round abandoned");
            self.abandon_round();
            return;
        }

        round.guessed.retain(|g| *g != id);
        let drawer = round.drawer;
        if !self.players.iter().any(|p| p.id != drawer) {
            info!(room = %self.code, round = self.round, "no guessers left, round abandoned");
            self.abandon_round();
        } else if self.phase == Phase::RoundActive && self.everyone_guessed() {
            self.begin_early_reveal();
        }
    }

    fn abandon_round(&mut self) {
        self.current = None;
        self.phase = Phase::RoundEnding;
        self.schedule(TimerKind::NextRound, self.config.drawer_left_delay);
    }

    fn game_over(&mut self) {
        self.phase = Phase::GameOver;
        let leaderboard = scoring::leaderboard(&self.player_infos());
        info!(room = %self.code, rounds = self.round, "game over");
        self.send(Recipient::All, ServerEvent::GameOver { leaderboard });
        self.close();
    }

    fn close(&mut self) {
        if let Some((token, _)) = self.pending.take() {
            self.out.push(Effect::Cancel(token));
        }
        self.current = None;
        self.closed = true;
        self.out.push(Effect::Close);
    }

    /// Private state for someone joining a round already under way.
    fn catch_up(&mut self, id: PlayerId) {
        let Some(round) = self.current.as_ref() else {
            return;
        };
        if round.revealed {
            return;
        }
        let Some(drawer) = self.players.iter().find(|p| p.id == round.drawer) else {
            return;
        };
        let new_round = ServerEvent::NewRound {
            round: self.round,
            drawer_id: drawer.id,
            drawer_name: drawer.name.clone(),
        };
        let hint = round
            .word
            .as_deref()
            .map_or_else(|| WAITING_HINT.to_string(), scoring::hint_for);

        self.send(Recipient::Player(id), new_round);
        self.send(Recipient::Player(id), ServerEvent::WordHint { hint });
    }

    // -- helpers ------------------------------------------------------------

    fn everyone_guessed(&self) -> bool {
        let Some(round) = self.current.as_ref() else {
            return false;
        };
        let mut guessers = self.players.iter().filter(|p| p.id != round.drawer).peekable();
        guessers.peek().is_some() && guessers.all(|p| round.guessed.contains(&p.id))
    }

    /// Replaces the pending timer, cancelling the old token first.
    fn schedule(&mut self, kind: TimerKind, after: Duration) {
        if let Some((old, _)) = self.pending.take() {
            self.out.push(Effect::Cancel(old));
        }
        let token = self.tokens.next_token();
        self.pending = Some((token, kind));
        self.out.push(Effect::Schedule { token, after });
    }

    fn send(&mut self, to: Recipient, event: ServerEvent) {
        self.out.push(Effect::Send { to, event });
    }

    fn take(&mut self) -> Vec<Effect> {
        std::mem::take(&mut self.out)
    }
}

/// Trims and truncates a requested display name, falling back to
/// [`DEFAULT_NAME`].
pub fn display_name(raw: &str, max_len: usize) -> String {
    let name = guess::clean_text(raw, max_len);
    if name.is_empty() {
        DEFAULT_NAME.to_string()
    } else {
        name
    }
}
