//! Integration tests for the round state machine.
//!
//! The machine never touches a clock, so these tests keep their own
//! virtual `now`, honor the one timer the machine asks for, and fire it by
//! hand. The harness also checks that a new timer is never armed while
//! another one is still pending.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use sketchroom_game::{
    Effect, GameConfig, Phase, RoundMachine, TimerKind, WordBank, hint_for,
};
use sketchroom_protocol::{PlayerId, Recipient, RoomCode, ServerEvent};
use sketchroom_timer::TimerToken;
use tokio::time::Instant;

type Sent = Vec<(Recipient, ServerEvent)>;

const ADA: PlayerId = PlayerId(1);
const BOB: PlayerId = PlayerId(2);
const CY: PlayerId = PlayerId(3);
const DEE: PlayerId = PlayerId(4);

// =========================================================================
// Harness
// =========================================================================

struct Harness {
    machine: RoundMachine,
    now: Instant,
    timer: Option<(TimerToken, Instant)>,
    log: Sent,
    closed: bool,
}

impl Harness {
    fn new() -> Self {
        Self::with_config(GameConfig::default())
    }

    fn with_config(config: GameConfig) -> Self {
        let words = Arc::new(WordBank::new(["cat", "dog", "sun"]).unwrap());
        Self {
            machine: RoundMachine::with_seed(RoomCode::parse("abcd").unwrap(), config, words, 7),
            now: Instant::now(),
            timer: None,
            log: Vec::new(),
            closed: false,
        }
    }

    fn apply(&mut self, effects: Vec<Effect>) -> Sent {
        let mut sent = Vec::new();
        for effect in effects {
            match effect {
                Effect::Send { to, event } => sent.push((to, event)),
                Effect::Schedule { token, after } => {
                    assert!(
                        self.timer.is_none(),
                        "a second timer was armed while one was pending"
                    );
                    self.timer = Some((token, self.now + after));
                }
                Effect::Cancel(token) => {
                    if self.timer.map(|(t, _)| t) == Some(token) {
                        self.timer = None;
                    }
                }
                Effect::Close => {
                    assert!(!self.closed, "room closed twice");
                    self.closed = true;
                }
            }
        }
        self.log.extend(sent.iter().cloned());
        sent
    }

    fn join(&mut self, id: PlayerId, name: &str) -> Sent {
        let effects = self.machine.add_player(id, name, self.now).unwrap();
        self.apply(effects)
    }

    fn leave(&mut self, id: PlayerId) -> Sent {
        let effects = self.machine.remove_player(id, self.now);
        self.apply(effects)
    }

    fn chat(&mut self, id: PlayerId, text: &str) -> Sent {
        let effects = self.machine.chat(id, text, self.now);
        self.apply(effects)
    }

    fn choose(&mut self, id: PlayerId, word: &str) -> Sent {
        let effects = self.machine.choose_word(id, word, self.now);
        self.apply(effects)
    }

    /// Jumps to the armed deadline and fires it.
    fn fire(&mut self) -> Sent {
        let (token, deadline) = self.timer.take().expect("no timer armed");
        self.now = deadline;
        let effects = self.machine.on_timer(token, self.now);
        self.apply(effects)
    }

    /// Moves the clock forward, firing every timer that falls due.
    fn advance(&mut self, by: Duration) -> Sent {
        let target = self.now + by;
        let mut sent = Vec::new();
        while let Some((_, deadline)) = self.timer {
            if deadline > target {
                break;
            }
            sent.extend(self.fire());
        }
        self.now = target;
        sent
    }

    fn pending_kind(&self) -> Option<TimerKind> {
        self.machine.pending_timer().map(|(_, kind)| kind)
    }

    /// Two players in, first round started, Ada drawing.
    fn started_pair() -> Self {
        let mut h = Self::new();
        h.join(ADA, "Ada");
        h.join(BOB, "Bob");
        h.fire();
        assert_eq!(h.machine.current_drawer(), Some(ADA));
        h
    }

    /// Three players in, Ada drawing "cat".
    fn active_trio() -> Self {
        let mut h = Self::new();
        h.join(ADA, "Ada");
        h.join(BOB, "Bob");
        h.join(CY, "Cy");
        h.fire();
        h.choose(ADA, "cat");
        assert_eq!(h.machine.phase(), Phase::RoundActive);
        h
    }
}

fn reaches(to: &Recipient, id: PlayerId) -> bool {
    match to {
        Recipient::All => true,
        Recipient::Player(p) => *p == id,
        Recipient::AllExcept(p) => *p != id,
    }
}

fn seen_by(sent: &Sent, id: PlayerId) -> Vec<&ServerEvent> {
    sent.iter()
        .filter(|(to, _)| reaches(to, id))
        .map(|(_, e)| e)
        .collect()
}

fn system(text: &str) -> ServerEvent {
    ServerEvent::system(text)
}

// =========================================================================
// Lobby and start
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_single_player_never_starts_a_round() {
    let mut h = Harness::new();
    h.join(ADA, "Ada");

    assert_eq!(h.timer, None, "no timer with one player");
    assert_eq!(h.machine.pending_timer(), None);

    h.advance(Duration::from_secs(3600));
    assert_eq!(h.machine.phase(), Phase::Lobby);
    assert_eq!(h.machine.round(), 0);
    assert!(
        !h.log
            .iter()
            .any(|(_, e)| matches!(e, ServerEvent::NewRound { .. }))
    );
}

#[tokio::test(start_paused = true)]
async fn test_join_announces_player() {
    let mut h = Harness::new();
    let sent = h.join(ADA, "  Ada  ");

    assert!(matches!(
        &sent[0],
        (Recipient::Player(ADA), ServerEvent::RoomJoined { code, players })
            if code.as_str() == "ABCD" && players.len() == 1 && players[0].name == "Ada"
    ));
    assert!(sent.contains(&(Recipient::All, system("Ada joined!"))));
}

#[tokio::test(start_paused = true)]
async fn test_blank_name_becomes_guest() {
    let mut h = Harness::new();
    h.join(ADA, "   ");
    assert_eq!(h.machine.players()[0].name, "Guest");
}

#[tokio::test(start_paused = true)]
async fn test_second_player_starts_round_after_delay_with_three_distinct_words() {
    let mut h = Harness::new();
    h.join(ADA, "Ada");
    h.join(BOB, "Bob");
    assert_eq!(h.pending_kind(), Some(TimerKind::StartGame));

    let before = h.now;
    let sent = h.fire();
    assert_eq!(h.now - before, Duration::from_secs(3));

    let turns: Vec<_> = sent
        .iter()
        .filter_map(|(to, e)| match e {
            ServerEvent::YourTurn { choices } => Some((*to, choices.clone())),
            _ => None,
        })
        .collect();
    assert_eq!(turns.len(), 1, "exactly one yourTurn");
    let (to, mut choices) = turns[0].clone();
    assert_eq!(to, Recipient::Player(ADA));
    assert_eq!(choices.len(), 3);
    choices.sort();
    choices.dedup();
    assert_eq!(choices.len(), 3, "choices must be distinct");

    assert!(sent.contains(&(
        Recipient::All,
        ServerEvent::NewRound {
            round: 1,
            drawer_id: ADA,
            drawer_name: "Ada".into()
        }
    )));
    assert!(sent.contains(&(Recipient::All, ServerEvent::ClearCanvas)));
    assert_eq!(h.machine.phase(), Phase::AwaitingWordChoice);
}

#[tokio::test(start_paused = true)]
async fn test_room_full_rejected() {
    let mut h = Harness::with_config(GameConfig {
        max_players: 2,
        ..GameConfig::default()
    });
    h.join(ADA, "Ada");
    h.join(BOB, "Bob");
    let err = h.machine.add_player(CY, "Cy", h.now).unwrap_err();
    assert_eq!(err, sketchroom_game::GameError::RoomFull);
}

// =========================================================================
// Word choice
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_manual_choice_activates_word_privately() {
    let mut h = Harness::started_pair();
    let sent = h.choose(ADA, "  CAT ");

    assert!(sent.contains(&(
        Recipient::Player(ADA),
        ServerEvent::WordChosen { word: "cat".into() }
    )));
    assert!(sent.contains(&(
        Recipient::All,
        ServerEvent::WordHint { hint: "c _ t".into() }
    )));
    assert!(sent.contains(&(
        Recipient::All,
        ServerEvent::Timer {
            seconds_remaining: 80
        }
    )));
    assert_eq!(h.machine.current_word(), Some("cat"));
    assert_eq!(h.pending_kind(), Some(TimerKind::CountdownTick));
}

#[tokio::test(start_paused = true)]
async fn test_choice_from_non_drawer_or_unoffered_word_ignored() {
    let mut h = Harness::started_pair();

    assert!(h.choose(BOB, "cat").is_empty());
    assert!(h.choose(ADA, "zebra").is_empty());
    assert_eq!(h.machine.phase(), Phase::AwaitingWordChoice);
    assert_eq!(h.machine.current_word(), None);
}

#[tokio::test(start_paused = true)]
async fn test_choice_timeout_auto_picks_first_candidate() {
    let mut h = Harness::started_pair();
    let offered = h.machine.choices().to_vec();

    let sent = h.advance(Duration::from_secs(15));

    let auto: Vec<_> = sent
        .iter()
        .filter_map(|(to, e)| match e {
            ServerEvent::AutoChooseWord { word } => Some((*to, word.clone())),
            _ => None,
        })
        .collect();
    assert_eq!(auto, [(Recipient::Player(ADA), offered[0].clone())]);
    assert!(sent.contains(&(
        Recipient::All,
        ServerEvent::WordHint {
            hint: hint_for(&offered[0])
        }
    )));
    assert!(
        !seen_by(&sent, BOB)
            .iter()
            .any(|e| matches!(e, ServerEvent::AutoChooseWord { .. })),
        "auto-chosen word is private to the drawer"
    );
}

#[tokio::test(start_paused = true)]
async fn test_choice_just_before_timeout_wins() {
    let mut h = Harness::started_pair();
    h.advance(Duration::from_secs(14));
    h.choose(ADA, "sun");

    let sent = h.advance(Duration::from_secs(5));
    assert!(
        !sent
            .iter()
            .any(|(_, e)| matches!(e, ServerEvent::AutoChooseWord { .. }))
    );
    assert_eq!(h.machine.current_word(), Some("sun"));
}

// =========================================================================
// Guessing
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_wrong_then_correct_guess_scores_and_reveals_after_delay() {
    let mut h = Harness::started_pair();
    h.choose(ADA, "cat");

    let sent = h.chat(BOB, "dog");
    assert_eq!(
        sent,
        [(
            Recipient::All,
            ServerEvent::Message {
                user: "Bob".into(),
                text: "dog".into()
            }
        )]
    );

    h.advance(Duration::from_secs(5));
    let sent = h.chat(BOB, "cat");
    assert!(sent.contains(&(Recipient::Player(BOB), system("Correct! +95 pts"))));
    assert!(sent.contains(&(
        Recipient::All,
        ServerEvent::CorrectGuess {
            name: "Bob".into(),
            points: 95
        }
    )));
    assert!(
        !sent
            .iter()
            .any(|(_, e)| matches!(e, ServerEvent::WordReveal { .. })),
        "no reveal yet"
    );
    assert_eq!(h.machine.players()[1].score, 95);
    assert_eq!(h.pending_kind(), Some(TimerKind::RevealWord));

    let guessed_at = h.now;
    let sent = h.fire();
    assert_eq!(h.now - guessed_at, Duration::from_secs(2));
    assert!(sent.contains(&(
        Recipient::All,
        ServerEvent::WordReveal { word: "cat".into() }
    )));
    assert!(sent.contains(&(Recipient::All, system("Everyone guessed!"))));
    assert_eq!(h.pending_kind(), Some(TimerKind::NextRound));

    let revealed_at = h.now;
    let sent = h.fire();
    assert_eq!(h.now - revealed_at, Duration::from_secs(4));
    assert!(sent.iter().any(|(_, e)| matches!(
        e,
        ServerEvent::NewRound {
            round: 2,
            drawer_id: BOB,
            ..
        }
    )));
}

#[tokio::test(start_paused = true)]
async fn test_late_guess_earns_floor_points() {
    let mut h = Harness::active_trio();
    h.advance(Duration::from_secs(79));
    let sent = h.chat(BOB, "cat");
    assert!(sent.contains(&(
        Recipient::All,
        ServerEvent::CorrectGuess {
            name: "Bob".into(),
            points: 21
        }
    )));
}

#[tokio::test(start_paused = true)]
async fn test_repeat_guess_gets_private_reply_only() {
    let mut h = Harness::active_trio();
    h.chat(BOB, "cat");
    let sent = h.chat(BOB, "cat");
    assert_eq!(
        sent,
        [(Recipient::Player(BOB), system("You already guessed it!"))]
    );
    assert_eq!(h.machine.players()[1].score, 100);
}

#[tokio::test(start_paused = true)]
async fn test_near_miss_is_withheld() {
    let mut h = Harness::active_trio();
    assert_eq!(
        h.chat(BOB, "cats"),
        [(Recipient::Player(BOB), system("Too close!"))]
    );
    // Short fragments are ordinary chat.
    assert_eq!(h.chat(BOB, "ca")[0].0, Recipient::All);
}

#[tokio::test(start_paused = true)]
async fn test_drawer_chat_is_not_a_guess() {
    let mut h = Harness::active_trio();

    let sent = h.chat(ADA, "hint: it meows");
    assert_eq!(sent[0].0, Recipient::All);

    let sent = h.chat(ADA, "cat");
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].0, Recipient::Player(ADA));
    assert!(!h.machine.guessed().contains(&ADA));
    assert_eq!(h.machine.players()[0].score, 0);
}

#[tokio::test(start_paused = true)]
async fn test_chat_outside_round_is_plain() {
    let mut h = Harness::new();
    h.join(ADA, "Ada");
    let sent = h.chat(ADA, "  hello  ");
    assert_eq!(
        sent,
        [(
            Recipient::All,
            ServerEvent::Message {
                user: "Ada".into(),
                text: "hello".into()
            }
        )]
    );
    assert!(h.chat(ADA, "   ").is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_guess_during_pending_reveal_is_not_scored() {
    let mut h = Harness::started_pair();
    h.choose(ADA, "cat");
    h.chat(BOB, "cat");
    assert_eq!(h.machine.phase(), Phase::RoundEnding);

    h.join(CY, "Cy");
    let sent = h.chat(CY, "cat");
    assert_eq!(sent, [(Recipient::Player(CY), system("Too close!"))]);
    assert_eq!(h.machine.players()[2].score, 0);
}

// =========================================================================
// Countdown
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_countdown_ticks_every_second_then_reveals() {
    let mut h = Harness::started_pair();
    let activated = h.now;
    h.choose(ADA, "cat");

    let sent = h.advance(Duration::from_secs(80));
    let ticks: Vec<u32> = sent
        .iter()
        .filter_map(|(_, e)| match e {
            ServerEvent::Timer { seconds_remaining } => Some(*seconds_remaining),
            _ => None,
        })
        .collect();
    assert_eq!(ticks, (0..80).rev().collect::<Vec<_>>());
    assert_eq!(h.now - activated, Duration::from_secs(80));

    let reveal = sent
        .iter()
        .position(|(_, e)| *e == ServerEvent::WordReveal { word: "cat".into() })
        .expect("word revealed at zero");
    let times_up = sent
        .iter()
        .position(|(_, e)| *e == system("Time's up! Word was: cat"))
        .expect("time's up announced");
    assert!(reveal < times_up, "announcement follows the reveal");

    assert_eq!(h.pending_kind(), Some(TimerKind::NextRound));
    let revealed_at = h.now;
    h.fire();
    assert_eq!(h.now - revealed_at, Duration::from_secs(5));
    assert_eq!(h.machine.round(), 2);
}

// =========================================================================
// Timer ownership
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_fired_token_is_stale() {
    let mut h = Harness::new();
    h.join(ADA, "Ada");
    h.join(BOB, "Bob");
    let (start, _) = h.timer.unwrap();

    h.fire();
    assert_eq!(h.machine.round(), 1);

    assert!(h.machine.on_timer(start, h.now).is_empty());
    assert!(h.machine.on_timer(start, h.now).is_empty());
    assert_eq!(h.machine.round(), 1, "stale token must not start another round");
}

#[tokio::test(start_paused = true)]
async fn test_superseded_countdown_token_is_stale() {
    let mut h = Harness::started_pair();
    h.choose(ADA, "cat");
    let (tick, _) = h.timer.unwrap();

    h.chat(BOB, "cat");
    assert_eq!(h.pending_kind(), Some(TimerKind::RevealWord));

    assert!(h.machine.on_timer(tick, h.now).is_empty());
    let reveals = h
        .fire()
        .into_iter()
        .filter(|(_, e)| matches!(e, ServerEvent::WordReveal { .. }))
        .count();
    assert_eq!(reveals, 1);
}

// =========================================================================
// Leaving
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_drawer_leaving_abandons_round_without_reveal() {
    let mut h = Harness::active_trio();

    let sent = h.leave(ADA);
    assert!(sent.contains(&(Recipient::All, system("Ada left"))));
    assert!(
        !sent
            .iter()
            .any(|(_, e)| matches!(e, ServerEvent::WordReveal { .. }))
    );
    assert_eq!(h.machine.current_word(), None);
    assert_eq!(h.pending_kind(), Some(TimerKind::NextRound));

    let left_at = h.now;
    let sent = h.fire();
    assert_eq!(h.now - left_at, Duration::from_secs(3));
    let drawer = h.machine.current_drawer().unwrap();
    assert_ne!(drawer, ADA);
    assert!(sent.iter().any(|(_, e)| matches!(
        e,
        ServerEvent::NewRound { round: 2, .. }
    )));
}

#[tokio::test(start_paused = true)]
async fn test_last_guesser_leaving_ends_round_early() {
    let mut h = Harness::active_trio();
    h.chat(BOB, "cat");
    assert_eq!(h.pending_kind(), Some(TimerKind::CountdownTick));

    h.leave(CY);
    assert_eq!(h.pending_kind(), Some(TimerKind::RevealWord));
}

#[tokio::test(start_paused = true)]
async fn test_guesser_leaving_is_forgotten() {
    let mut h = Harness::active_trio();
    h.chat(BOB, "cat");
    h.leave(BOB);
    assert!(!h.machine.guessed().contains(&BOB));
}

#[tokio::test(start_paused = true)]
async fn test_last_player_leaving_closes_room() {
    let mut h = Harness::active_trio();
    h.leave(BOB);
    h.leave(CY);
    h.leave(ADA);

    assert!(h.closed);
    assert!(h.machine.is_closed());
    assert_eq!(h.timer, None, "every timer cancelled");
    assert!(
        !h.log
            .iter()
            .any(|(_, e)| matches!(e, ServerEvent::GameOver { .. }))
    );
}

#[tokio::test(start_paused = true)]
async fn test_too_few_players_returns_to_lobby_and_resumes() {
    let mut h = Harness::started_pair();
    h.leave(BOB);
    assert_eq!(h.pending_kind(), Some(TimerKind::NextRound));

    let sent = h.fire();
    assert!(sent.contains(&(Recipient::All, system("Waiting for more players..."))));
    assert_eq!(h.machine.phase(), Phase::Lobby);
    assert_eq!(h.timer, None);
    assert_eq!(h.machine.round(), 1);

    h.join(CY, "Cy");
    assert_eq!(h.pending_kind(), Some(TimerKind::StartGame));
    h.fire();
    assert_eq!(h.machine.round(), 2);
    assert_eq!(h.machine.phase(), Phase::AwaitingWordChoice);
}

#[tokio::test(start_paused = true)]
async fn test_leaving_during_start_delay_cancels_start() {
    let mut h = Harness::new();
    h.join(ADA, "Ada");
    h.join(BOB, "Bob");
    h.leave(BOB);

    assert_eq!(h.timer, None);
    h.advance(Duration::from_secs(60));
    assert_eq!(h.machine.round(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_late_joiner_catches_up() {
    let mut h = Harness::started_pair();
    h.choose(ADA, "cat");

    let sent = h.join(CY, "Cy");
    let private: Vec<_> = sent
        .iter()
        .filter(|(to, _)| *to == Recipient::Player(CY))
        .map(|(_, e)| e.clone())
        .collect();
    assert!(private.contains(&ServerEvent::NewRound {
        round: 1,
        drawer_id: ADA,
        drawer_name: "Ada".into()
    }));
    assert!(private.contains(&ServerEvent::WordHint {
        hint: "c _ t".into()
    }));
}

// =========================================================================
// Relays
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_only_drawer_strokes_are_relayed() {
    let mut h = Harness::started_pair();
    let stroke = json!({ "x0": 0, "y0": 0, "x1": 5, "y1": 5 });

    let effects = h.machine.relay_draw(ADA, stroke.clone());
    assert_eq!(
        effects,
        [Effect::Send {
            to: Recipient::AllExcept(ADA),
            event: ServerEvent::Draw { stroke: stroke.clone() }
        }]
    );
    assert!(h.machine.relay_draw(BOB, stroke).is_empty());

    assert_eq!(h.machine.relay_clear(ADA).len(), 1);
    assert!(h.machine.relay_clear(BOB).is_empty());
}

// =========================================================================
// Whole games
// =========================================================================

/// Lets every round run out on its own until the game ends.
fn run_to_end(h: &mut Harness) {
    let mut steps = 0;
    while !h.closed {
        h.fire();
        steps += 1;
        assert!(steps < 10_000, "game never ended");
    }
}

fn drawer_counts(log: &Sent) -> HashMap<PlayerId, usize> {
    let mut counts = HashMap::new();
    for (to, event) in log {
        if let (Recipient::All, ServerEvent::NewRound { drawer_id, .. }) = (to, event) {
            *counts.entry(*drawer_id).or_insert(0) += 1;
        }
    }
    counts
}

#[tokio::test(start_paused = true)]
async fn test_drawer_rotation_is_fair() {
    for players in [2u64, 3, 4, 5] {
        let mut h = Harness::new();
        for id in 1..=players {
            h.join(PlayerId(id), &format!("P{id}"));
        }
        run_to_end(&mut h);

        let counts = drawer_counts(&h.log);
        let rounds = 6usize;
        let floor = rounds / players as usize;
        let ceil = rounds.div_ceil(players as usize);
        assert_eq!(counts.values().sum::<usize>(), rounds);
        for id in 1..=players {
            let n = counts.get(&PlayerId(id)).copied().unwrap_or(0);
            assert!(
                (floor..=ceil).contains(&n),
                "{players} players: P{id} drew {n} times"
            );
        }
    }
}

#[tokio::test(start_paused = true)]
async fn test_exactly_one_game_over_after_max_rounds() {
    let mut h = Harness::new();
    h.join(ADA, "Ada");
    h.join(BOB, "Bob");
    h.join(CY, "Cy");
    run_to_end(&mut h);

    let game_overs: Vec<_> = h
        .log
        .iter()
        .filter_map(|(_, e)| match e {
            ServerEvent::GameOver { leaderboard } => Some(leaderboard),
            _ => None,
        })
        .collect();
    assert_eq!(game_overs.len(), 1);
    assert_eq!(game_overs[0].len(), 3);

    let max_round = h
        .log
        .iter()
        .filter_map(|(_, e)| match e {
            ServerEvent::NewRound { round, .. } => Some(*round),
            _ => None,
        })
        .max();
    assert_eq!(max_round, Some(6));
    assert_eq!(h.machine.phase(), Phase::GameOver);
    assert_eq!(h.timer, None);
}

#[tokio::test(start_paused = true)]
async fn test_leaderboard_ranks_scores() {
    let mut h = Harness::with_config(GameConfig {
        max_rounds: 1,
        ..GameConfig::default()
    });
    h.join(ADA, "Ada");
    h.join(BOB, "Bob");
    h.join(CY, "Cy");
    h.fire();
    h.choose(ADA, "dog");
    h.advance(Duration::from_secs(10));
    h.chat(CY, "dog");
    h.advance(Duration::from_secs(10));
    h.chat(BOB, "dog");
    run_to_end(&mut h);

    let board = h
        .log
        .iter()
        .find_map(|(_, e)| match e {
            ServerEvent::GameOver { leaderboard } => Some(leaderboard.clone()),
            _ => None,
        })
        .unwrap();
    let rows: Vec<_> = board
        .iter()
        .map(|e| (e.rank, e.name.as_str(), e.score))
        .collect();
    assert_eq!(rows, [(1, "Cy", 90), (2, "Bob", 80), (3, "Ada", 0)]);
}

#[tokio::test(start_paused = true)]
async fn test_word_never_leaks_before_reveal() {
    let mut h = Harness::new();
    h.join(ADA, "Ada");
    h.join(BOB, "Bob");
    h.join(CY, "Cy");
    h.join(DEE, "Dee");
    h.fire();
    h.choose(ADA, "cat");

    h.chat(ADA, "it's a cat");
    h.chat(BOB, "cats");
    h.chat(CY, "CAT!");
    h.chat(DEE, "ca");
    h.advance(Duration::from_secs(3));
    h.chat(BOB, "cat");
    h.chat(BOB, "cat cat cat");
    h.chat(CY, " Cat ");
    h.advance(Duration::from_secs(1));
    h.chat(DEE, "cat");
    h.fire();

    let reveal = h
        .log
        .iter()
        .position(|(_, e)| matches!(e, ServerEvent::WordReveal { .. }))
        .expect("revealed");
    for (to, event) in &h.log[..reveal] {
        if matches!(to, Recipient::Player(_)) {
            continue;
        }
        let text = match event {
            ServerEvent::Message { text, .. } => text.to_lowercase(),
            ServerEvent::CorrectGuess { name, .. } => name.to_lowercase(),
            ServerEvent::WordHint { hint } => hint.to_lowercase(),
            _ => continue,
        };
        assert!(!text.contains("cat"), "word leaked in {event:?}");
    }
    assert!(!h.machine.guessed().contains(&ADA));
}
