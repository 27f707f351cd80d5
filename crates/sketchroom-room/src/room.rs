//! Room actor: an isolated Tokio task that owns one room's game.
//!
//! The actor is the only code that touches its [`RoundMachine`]. Commands
//! arrive over an mpsc channel and are handled one at a time, and the
//! room's single timer is polled in the same `select!`, so a guess, a
//! disconnect and a countdown tick can never interleave.

use std::collections::HashMap;

use serde_json::Value;
use sketchroom_game::{Effect, Phase, RoundMachine};
use sketchroom_protocol::{PlayerId, Recipient, RoomCode, ServerEvent};
use sketchroom_timer::TimerSlot;
use tokio::sync::{mpsc, oneshot};
use tokio::time::Instant;
use tracing::{debug, info, trace};

use crate::RoomError;

/// Channel sender for delivering outbound events to a player's connection.
pub type PlayerSender = mpsc::UnboundedSender<ServerEvent>;

/// In-game requests a seated player can make.
#[derive(Debug, Clone, PartialEq)]
pub enum PlayerAction {
    ChooseWord(String),
    Draw(Value),
    ClearCanvas,
    Chat(String),
}

/// Commands sent to a room actor through its channel.
pub(crate) enum RoomCommand {
    Join {
        player_id: PlayerId,
        name: String,
        sender: PlayerSender,
        reply: oneshot::Sender<Result<(), RoomError>>,
    },
    Leave {
        player_id: PlayerId,
        reply: oneshot::Sender<Result<(), RoomError>>,
    },
    Action {
        player_id: PlayerId,
        action: PlayerAction,
    },
    GetInfo {
        reply: oneshot::Sender<RoomInfo>,
    },
}

/// A snapshot of room metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomInfo {
    pub code: RoomCode,
    pub phase: Phase,
    pub round: u32,
    pub player_count: usize,
    pub max_players: usize,
}

/// Handle to a running room actor. Cheap to clone.
#[derive(Debug, Clone)]
pub struct RoomHandle {
    code: RoomCode,
    sender: mpsc::Sender<RoomCommand>,
}

impl RoomHandle {
    pub fn code(&self) -> &RoomCode {
        &self.code
    }

    /// `true` once the room emptied or its game ended. A closed room
    /// accepts no further commands.
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }

    /// Seats a player. Events for them go to `sender`, starting with
    /// `roomJoined`.
    pub async fn join(
        &self,
        player_id: PlayerId,
        name: String,
        sender: PlayerSender,
    ) -> Result<(), RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(RoomCommand::Join {
                player_id,
                name,
                sender,
                reply: reply_tx,
            })
            .await
            .map_err(|_| self.unavailable())?;
        reply_rx.await.map_err(|_| self.unavailable())?
    }

    /// Unseats a player and waits until the room has processed it.
    pub async fn leave(&self, player_id: PlayerId) -> Result<(), RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(RoomCommand::Leave {
                player_id,
                reply: reply_tx,
            })
            .await
            .map_err(|_| self.unavailable())?;
        reply_rx.await.map_err(|_| self.unavailable())?
    }

    /// Delivers an in-game action (fire-and-forget).
    pub async fn act(&self, player_id: PlayerId, action: PlayerAction) -> Result<(), RoomError> {
        self.sender
            .send(RoomCommand::Action { player_id, action })
            .await
            .map_err(|_| self.unavailable())
    }

    pub async fn info(&self) -> Result<RoomInfo, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(RoomCommand::GetInfo { reply: reply_tx })
            .await
            .map_err(|_| self.unavailable())?;
        reply_rx.await.map_err(|_| self.unavailable())
    }

    fn unavailable(&self) -> RoomError {
        RoomError::Unavailable(self.code.clone())
    }
}

struct RoomActor {
    code: RoomCode,
    machine: RoundMachine,
    senders: HashMap<PlayerId, PlayerSender>,
    timer: TimerSlot,
    receiver: mpsc::Receiver<RoomCommand>,
}

impl RoomActor {
    /// Runs until the room closes and every queued command is answered.
    async fn run(mut self) {
        info!(room = %self.code, "room actor started");

        loop {
            tokio::select! {
                cmd = self.receiver.recv() => match cmd {
                    Some(cmd) => self.handle(cmd),
                    None => break,
                },
                token = self.timer.wait() => {
                    let effects = self.machine.on_timer(token, Instant::now());
                    self.apply(effects);
                }
            }
        }

        let metrics = self.timer.metrics();
        info!(
            room = %self.code,
            rounds = self.machine.round(),
            timers_armed = metrics.armed,
            timers_fired = metrics.fired,
            timers_cancelled = metrics.cancelled,
            timers_replaced = metrics.replaced,
            "room actor stopped"
        );
    }

    fn handle(&mut self, cmd: RoomCommand) {
        match cmd {
            RoomCommand::Join {
                player_id,
                name,
                sender,
                reply,
            } => {
                let result = self.handle_join(player_id, &name, sender);
                let _ = reply.send(result);
            }
            RoomCommand::Leave { player_id, reply } => {
                let result = self.handle_leave(player_id);
                let _ = reply.send(result);
            }
            RoomCommand::Action { player_id, action } => self.handle_action(player_id, action),
            RoomCommand::GetInfo { reply } => {
                let _ = reply.send(self.info());
            }
        }
    }

    fn handle_join(
        &mut self,
        player_id: PlayerId,
        name: &str,
        sender: PlayerSender,
    ) -> Result<(), RoomError> {
        if self.machine.is_closed() {
            return Err(RoomError::NoSuchRoom(self.code.clone()));
        }
        let effects = self
            .machine
            .add_player(player_id, name, Instant::now())
            .map_err(|e| RoomError::from_game(&self.code, e))?;
        self.senders.insert(player_id, sender);
        self.apply(effects);
        Ok(())
    }

    fn handle_leave(&mut self, player_id: PlayerId) -> Result<(), RoomError> {
        if !self.machine.contains(player_id) {
            return Err(RoomError::NotInRoom(player_id));
        }
        self.senders.remove(&player_id);
        let effects = self.machine.remove_player(player_id, Instant::now());
        self.apply(effects);
        Ok(())
    }

    fn handle_action(&mut self, player_id: PlayerId, action: PlayerAction) {
        if !self.machine.contains(player_id) {
            debug!(room = %self.code, %player_id, "action from non-member, ignoring");
            return;
        }
        let now = Instant::now();
        let effects = match action {
            PlayerAction::ChooseWord(word) => self.machine.choose_word(player_id, &word, now),
            PlayerAction::Draw(stroke) => self.machine.relay_draw(player_id, stroke),
            PlayerAction::ClearCanvas => self.machine.relay_clear(player_id),
            PlayerAction::Chat(text) => self.machine.chat(player_id, &text, now),
        };
        self.apply(effects);
    }

    /// Carries out the machine's effects in order.
    fn apply(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::Send { to, event } => self.dispatch(to, event),
                Effect::Schedule { token, after } => self.timer.arm(token, after),
                Effect::Cancel(token) => {
                    self.timer.cancel(token);
                }
                Effect::Close => {
                    // Queued commands are still answered; new ones are refused.
                    self.receiver.close();
                    info!(room = %self.code, "room closed");
                }
            }
        }
    }

    /// Delivers one event. Players are visited in join order.
    fn dispatch(&self, to: Recipient, event: ServerEvent) {
        match to {
            Recipient::Player(pid) => self.send_to(pid, event),
            Recipient::All | Recipient::AllExcept(_) => {
                for player in self.machine.players() {
                    if to == Recipient::AllExcept(player.id) {
                        continue;
                    }
                    self.send_to(player.id, event.clone());
                }
            }
        }
    }

    /// Silently drops if the player's connection is already gone.
    fn send_to(&self, player_id: PlayerId, event: ServerEvent) {
        if let Some(sender) = self.senders.get(&player_id) {
            if sender.send(event).is_err() {
                trace!(room = %self.code, %player_id, "receiver gone, event dropped");
            }
        }
    }

    fn info(&self) -> RoomInfo {
        RoomInfo {
            code: self.code.clone(),
            phase: self.machine.phase(),
            round: self.machine.round(),
            player_count: self.machine.players().len(),
            max_players: self.machine.config().max_players,
        }
    }
}

/// Spawns a room actor around `machine` and returns its handle.
///
/// `channel_size` bounds the command queue; senders wait when it is full.
pub fn spawn_room(machine: RoundMachine, channel_size: usize) -> RoomHandle {
    let (tx, rx) = mpsc::channel(channel_size);
    let code = machine.code().clone();

    let actor = RoomActor {
        code: code.clone(),
        machine,
        senders: HashMap::new(),
        timer: TimerSlot::new(),
        receiver: rx,
    };
    tokio::spawn(actor.run());

    RoomHandle { code, sender: tx }
}
