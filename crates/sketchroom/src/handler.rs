//! Per-connection handler: identity, event routing, and cleanup.
//!
//! Each accepted connection gets its own Tokio task running this handler.
//! The flow is:
//!   1. Derive the `PlayerId` from the connection and send `welcome`
//!   2. Spawn a writer task that drains the player's outbound queue and
//!      pings the client on an interval
//!   3. Loop: receive events → create/join rooms or forward to the room.
//!      Any frame, pongs included, counts as activity
//!   4. On close, error, or idle timeout: leave the room

use std::sync::Arc;

use sketchroom_protocol::{ClientEvent, Codec, PlayerId, RoomCode, ServerEvent};
use sketchroom_room::{PlayerAction, PlayerSender, RoomError};
use sketchroom_transport::{Connection, Inbound, WebSocketConnection};
use tokio::sync::mpsc;
use tokio::task::AbortHandle;
use tokio::time::{Instant, MissedTickBehavior};

use crate::SketchroomError;
use crate::server::ServerState;

/// Drop guard that takes a player out of their room when the handler
/// exits, however it exits.
///
/// `Drop` is synchronous, so the registry update runs in a spawned task.
struct DisconnectGuard<C: Codec> {
    player_id: PlayerId,
    state: Arc<ServerState<C>>,
    writer: AbortHandle,
}

impl<C: Codec> Drop for DisconnectGuard<C> {
    fn drop(&mut self) {
        self.writer.abort();
        let player_id = self.player_id;
        let state = Arc::clone(&self.state);
        tokio::spawn(async move {
            let mut rooms = state.rooms.lock().await;
            match rooms.leave(player_id).await {
                Ok(code) => tracing::debug!(%player_id, room = %code, "left room on disconnect"),
                Err(RoomError::NotInRoom(_)) => {}
                Err(e) => tracing::debug!(%player_id, error = %e, "leave on disconnect failed"),
            }
        });
    }
}

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection<C: Codec>(
    conn: WebSocketConnection,
    state: Arc<ServerState<C>>,
) -> Result<(), SketchroomError> {
    let conn = Arc::new(conn);
    let conn_id = conn.id();
    let player_id = PlayerId::from(conn_id);
    tracing::info!(%conn_id, %player_id, peer = %conn.peer_addr(), "player connected");

    let (tx, rx) = mpsc::unbounded_channel();
    let writer = tokio::spawn(write_loop(Arc::clone(&conn), Arc::clone(&state), rx));
    let _guard = DisconnectGuard {
        player_id,
        state: Arc::clone(&state),
        writer: writer.abort_handle(),
    };

    reply(&tx, ServerEvent::Welcome { player_id });

    loop {
        let frame = match tokio::time::timeout(state.idle_timeout, conn.recv()).await {
            Ok(Ok(Some(Inbound::Text(frame)))) => frame,
            Ok(Ok(Some(Inbound::Control))) => continue,
            Ok(Ok(None)) => {
                tracing::info!(%player_id, "connection closed cleanly");
                break;
            }
            Ok(Err(e)) => {
                tracing::debug!(%player_id, error = %e, "recv error");
                break;
            }
            Err(_) => {
                tracing::info!(%player_id, "no frames or pongs within idle timeout, dropping");
                break;
            }
        };

        let event: ClientEvent = match state.codec.decode(&frame) {
            Ok(event) => event,
            Err(e) => {
                tracing::debug!(%player_id, error = %e, "failed to decode event");
                reply(
                    &tx,
                    ServerEvent::Error {
                        message: e.to_string(),
                    },
                );
                continue;
            }
        };

        dispatch(&state, player_id, &tx, event).await;
    }

    let _ = conn.close().await;
    // _guard drops here → leave fires.
    Ok(())
}

/// Drains the player's outbound queue onto the socket and keeps the
/// client answering pings.
async fn write_loop<C: Codec>(
    conn: Arc<WebSocketConnection>,
    state: Arc<ServerState<C>>,
    mut rx: mpsc::UnboundedReceiver<ServerEvent>,
) {
    let player_id = PlayerId::from(conn.id());
    let period = state.ping_interval;
    let mut heartbeat = tokio::time::interval_at(Instant::now() + period, period);
    heartbeat.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            event = rx.recv() => {
                let Some(event) = event else { break };
                let frame = match state.codec.encode(&event) {
                    Ok(frame) => frame,
                    Err(e) => {
                        tracing::warn!(%player_id, error = %e, "failed to encode event");
                        continue;
                    }
                };
                if let Err(e) = conn.send(&frame).await {
                    tracing::debug!(%player_id, error = %e, "send failed, writer stopping");
                    break;
                }
            }
            _ = heartbeat.tick() => {
                if let Err(e) = conn.ping().await {
                    tracing::debug!(%player_id, error = %e, "ping failed, writer stopping");
                    break;
                }
                tracing::trace!(%player_id, "ping sent");
            }
        }
    }
}

/// Routes one decoded event.
async fn dispatch<C: Codec>(
    state: &ServerState<C>,
    player_id: PlayerId,
    tx: &PlayerSender,
    event: ClientEvent,
) {
    match event {
        ClientEvent::CreateRoom { code, name } => {
            let code = match RoomCode::parse(&code) {
                Ok(code) => code,
                Err(e) => return reply(tx, ServerEvent::RoomError { message: e.to_string() }),
            };
            let result = state
                .rooms
                .lock()
                .await
                .create_room(code, player_id, name, tx.clone())
                .await;
            if let Err(e) = result {
                tracing::debug!(%player_id, error = %e, "create room rejected");
                reply(tx, room_error_event(&e));
            }
        }
        ClientEvent::JoinRoom { code, name } => {
            let code = match RoomCode::parse(&code) {
                Ok(code) => code,
                Err(e) => return reply(tx, ServerEvent::RoomError { message: e.to_string() }),
            };
            let result = state
                .rooms
                .lock()
                .await
                .join_room(code, player_id, name, tx.clone())
                .await;
            if let Err(e) = result {
                tracing::debug!(%player_id, error = %e, "join room rejected");
                reply(tx, room_error_event(&e));
            }
        }
        ClientEvent::ChooseWord { word } => {
            forward(state, player_id, PlayerAction::ChooseWord(word)).await;
        }
        ClientEvent::Draw { stroke } => {
            forward(state, player_id, PlayerAction::Draw(stroke)).await;
        }
        ClientEvent::ClearCanvas => {
            forward(state, player_id, PlayerAction::ClearCanvas).await;
        }
        ClientEvent::ChatMessage { text } => {
            forward(state, player_id, PlayerAction::Chat(text)).await;
        }
        ClientEvent::Ping => reply(tx, ServerEvent::Pong),
    }
}

/// Hands an in-game action to the player's room. Players outside a room
/// are ignored.
async fn forward<C: Codec>(state: &ServerState<C>, player_id: PlayerId, action: PlayerAction) {
    // Release the registry before talking to the room.
    let room = state.rooms.lock().await.room_of(player_id);
    let result = match room {
        Ok(room) => room.act(player_id, action).await,
        Err(e) => Err(e),
    };
    if let Err(e) = result {
        tracing::debug!(%player_id, error = %e, "action dropped");
    }
}

/// Queues a private reply. The writer only goes away with the connection,
/// so a failed send needs no handling.
fn reply(tx: &PlayerSender, event: ServerEvent) {
    let _ = tx.send(event);
}

/// The event a client sees when a room request fails.
fn room_error_event(err: &RoomError) -> ServerEvent {
    match err {
        RoomError::RoomExists(_) => ServerEvent::RoomError {
            message: "Room exists".into(),
        },
        RoomError::NoSuchRoom(code) => ServerEvent::InvalidCode {
            code: code.to_string(),
        },
        RoomError::RoomFull(code) => ServerEvent::RoomFull {
            code: code.to_string(),
        },
        other => ServerEvent::RoomError {
            message: other.to_string(),
        },
    }
}
