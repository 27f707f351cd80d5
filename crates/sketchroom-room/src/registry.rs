//! Room registry: creates rooms by code and routes players to them.

use std::collections::HashMap;
use std::sync::Arc;

use sketchroom_game::{GameConfig, RoundMachine, WordBank};
use sketchroom_protocol::{PlayerId, RoomCode};
use tracing::info;

use crate::room::spawn_room;
use crate::{PlayerSender, RoomError, RoomHandle};

/// Default command channel size for room actors.
const DEFAULT_CHANNEL_SIZE: usize = 64;

/// Every live room, plus which room each player sits in.
///
/// Rooms close themselves (last player gone, or game over); the registry
/// notices through [`RoomHandle::is_closed`] and forgets them, along with
/// any index entries that still point at them.
pub struct RoomRegistry {
    config: GameConfig,
    words: Arc<WordBank>,
    rooms: HashMap<RoomCode, RoomHandle>,

    /// A player is in at most one room at a time.
    player_rooms: HashMap<PlayerId, RoomCode>,
}

impl RoomRegistry {
    /// Creates an empty registry. Every room it creates plays by `config`
    /// and draws from `words`.
    pub fn new(config: GameConfig, words: Arc<WordBank>) -> Self {
        Self {
            config,
            words,
            rooms: HashMap::new(),
            player_rooms: HashMap::new(),
        }
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    /// Opens a room under `code` and seats its creator.
    ///
    /// # Errors
    /// [`RoomError::AlreadyInRoom`] if the player sits in a live room,
    /// [`RoomError::RoomExists`] if a live room already uses `code`.
    pub async fn create_room(
        &mut self,
        code: RoomCode,
        player_id: PlayerId,
        name: String,
        sender: PlayerSender,
    ) -> Result<RoomHandle, RoomError> {
        self.prune_closed();
        self.ensure_free(player_id)?;
        if self.rooms.contains_key(&code) {
            return Err(RoomError::RoomExists(code));
        }

        let machine = RoundMachine::new(code.clone(), self.config.clone(), Arc::clone(&self.words));
        let handle = spawn_room(machine, DEFAULT_CHANNEL_SIZE);
        self.rooms.insert(code.clone(), handle.clone());
        info!(room = %code, "room created");

        if let Err(e) = handle.join(player_id, name, sender).await {
            self.rooms.remove(&code);
            return Err(e);
        }
        self.player_rooms.insert(player_id, code);
        Ok(handle)
    }

    /// Seats a player in the live room under `code`.
    ///
    /// # Errors
    /// [`RoomError::AlreadyInRoom`] if the player sits in a live room,
    /// [`RoomError::NoSuchRoom`] if no live room uses `code`,
    /// [`RoomError::RoomFull`] at capacity.
    pub async fn join_room(
        &mut self,
        code: RoomCode,
        player_id: PlayerId,
        name: String,
        sender: PlayerSender,
    ) -> Result<RoomHandle, RoomError> {
        self.ensure_free(player_id)?;
        let handle = self
            .live_room(&code)
            .ok_or_else(|| RoomError::NoSuchRoom(code.clone()))?;

        handle
            .join(player_id, name, sender)
            .await
            .map_err(|e| match e {
                // The room closed between the lookup and the join.
                RoomError::Unavailable(code) => RoomError::NoSuchRoom(code),
                e => e,
            })?;
        self.player_rooms.insert(player_id, code);
        Ok(handle)
    }

    /// Removes a player from whatever room they are in and returns its code.
    ///
    /// Destroys the room if that was its last player.
    pub async fn leave(&mut self, player_id: PlayerId) -> Result<RoomCode, RoomError> {
        let code = self
            .player_rooms
            .remove(&player_id)
            .ok_or(RoomError::NotInRoom(player_id))?;

        if let Some(handle) = self.rooms.get(&code).cloned() {
            match handle.leave(player_id).await {
                Ok(()) | Err(RoomError::Unavailable(_)) => {}
                Err(e) => return Err(e),
            }
            if handle.is_closed() {
                self.rooms.remove(&code);
                info!(room = %code, "room destroyed");
            }
        }
        Ok(code)
    }

    /// The live room a player sits in.
    ///
    /// # Errors
    /// [`RoomError::NotInRoom`] if the player has no room, or their room
    /// has closed since they joined.
    pub fn room_of(&mut self, player_id: PlayerId) -> Result<RoomHandle, RoomError> {
        let code = self
            .player_rooms
            .get(&player_id)
            .cloned()
            .ok_or(RoomError::NotInRoom(player_id))?;
        match self.live_room(&code) {
            Some(handle) => Ok(handle),
            None => {
                self.player_rooms.remove(&player_id);
                Err(RoomError::NotInRoom(player_id))
            }
        }
    }

    /// Code of the live room a player sits in, if any.
    pub fn player_room(&self, player_id: PlayerId) -> Option<&RoomCode> {
        self.player_rooms
            .get(&player_id)
            .filter(|code| self.rooms.get(*code).is_some_and(|h| !h.is_closed()))
    }

    /// Number of live rooms.
    pub fn room_count(&self) -> usize {
        self.rooms.values().filter(|h| !h.is_closed()).count()
    }

    /// Forgets closed rooms and every index entry pointing at them.
    pub fn prune_closed(&mut self) {
        let before = self.rooms.len();
        self.rooms.retain(|code, handle| {
            let live = !handle.is_closed();
            if !live {
                info!(room = %code, "room destroyed");
            }
            live
        });
        if self.rooms.len() != before {
            let rooms = &self.rooms;
            self.player_rooms.retain(|_, code| rooms.contains_key(code));
        }
    }

    /// Handle to the room under `code` if it is still live. Forgets it if not.
    fn live_room(&mut self, code: &RoomCode) -> Option<RoomHandle> {
        match self.rooms.get(code) {
            Some(handle) if !handle.is_closed() => Some(handle.clone()),
            Some(_) => {
                self.rooms.remove(code);
                self.player_rooms.retain(|_, c| c != code);
                info!(room = %code, "room destroyed");
                None
            }
            None => None,
        }
    }

    /// Enforces one room per player, dropping stale index entries.
    fn ensure_free(&mut self, player_id: PlayerId) -> Result<(), RoomError> {
        let Some(code) = self.player_rooms.get(&player_id).cloned() else {
            return Ok(());
        };
        if self.live_room(&code).is_some() {
            return Err(RoomError::AlreadyInRoom(player_id, code));
        }
        self.player_rooms.remove(&player_id);
        Ok(())
    }
}
