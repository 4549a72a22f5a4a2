//! Per-connection handler: handshake, auth, and event routing.
//!
//! Each accepted connection gets its own Tokio task running this handler.
//! The flow is:
//!   1. Receive `Hello` within the handshake window, authenticate the token
//!   2. Register the connection with the lobby (which emits `Welcome`)
//!   3. Loop: pump queued server events out, dispatch client events in
//!
//! All success notifications flow through the player's lobby channel, so
//! ordering is whatever the lobby decided under its lock. Only error
//! replies and room listings are written directly here.

use std::sync::Arc;
use std::time::{Duration, Instant};

use duelhub_protocol::{
    ClientEvent, Codec, Envelope, ErrorKind, PlayerId, ProtocolError,
    ServerEvent,
};
use duelhub_room::CardSource;

use crate::DuelhubError;
use crate::auth::Authenticator;
use crate::server::ServerState;
use crate::transport::WsConn;

/// How long a fresh connection gets to send its `Hello`.
const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(5);

/// Drop guard that funnels every handler exit through the lobby's
/// disconnect path, panics included. `Drop` is synchronous, so the async
/// lock is taken in a fire-and-forget task.
struct DisconnectGuard<S: CardSource, A, C> {
    player: PlayerId,
    state: Arc<ServerState<S, A, C>>,
}

impl<S: CardSource, A, C> Drop for DisconnectGuard<S, A, C> {
    fn drop(&mut self) {
        let player = self.player;
        let lobby = Arc::clone(&self.state.lobby);
        tokio::spawn(async move {
            lobby.lock().await.disconnect(player);
        });
    }
}

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection<S, A, C>(
    mut conn: WsConn,
    state: Arc<ServerState<S, A, C>>,
) -> Result<(), DuelhubError>
where
    S: CardSource,
    A: Authenticator,
    C: Codec,
{
    let conn_id = conn.id();
    tracing::debug!(%conn_id, "handling new connection");

    let start = Instant::now();
    let mut seq: u64 = 0;

    let player =
        perform_handshake(&mut conn, &state, &mut seq, &start).await?;
    tracing::info!(%conn_id, %player, "player authenticated");

    // Registering with the lobby queues the Welcome greeting; the pump
    // below delivers it as the first outbound event.
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    state.lobby.lock().await.connect(player, tx);
    let _guard = DisconnectGuard {
        player,
        state: Arc::clone(&state),
    };

    loop {
        tokio::select! {
            outbound = rx.recv() => {
                match outbound {
                    Some(event) => {
                        send_event(
                            &mut conn, &state.codec, &mut seq, &start,
                            event,
                        )
                        .await?;
                    }
                    // The lobby dropped our sender; we are gone.
                    None => break,
                }
            }
            inbound = conn.recv() => {
                match inbound {
                    Ok(Some(data)) => {
                        let envelope: Envelope<ClientEvent> =
                            match state.codec.decode(&data) {
                                Ok(env) => env,
                                Err(e) => {
                                    tracing::debug!(
                                        %player, error = %e,
                                        "failed to decode envelope"
                                    );
                                    continue;
                                }
                            };
                        let close = dispatch(
                            &mut conn, &state, player, envelope.event,
                            &mut seq, &start,
                        )
                        .await?;
                        if close {
                            break;
                        }
                    }
                    Ok(None) => {
                        tracing::info!(%player, "connection closed cleanly");
                        break;
                    }
                    Err(e) => {
                        tracing::debug!(%player, error = %e, "recv error");
                        break;
                    }
                }
            }
        }
    }

    let _ = conn.close().await;

    // _guard drops here; the lobby disconnect fires.
    Ok(())
}

/// Waits for `Hello`, authenticates the token, returns the identity.
///
/// Anything other than a timely, well-formed, authenticated `Hello` ends
/// the connection before the lobby ever hears about it.
async fn perform_handshake<S, A, C>(
    conn: &mut WsConn,
    state: &Arc<ServerState<S, A, C>>,
    seq: &mut u64,
    start: &Instant,
) -> Result<PlayerId, DuelhubError>
where
    S: CardSource,
    A: Authenticator,
    C: Codec,
{
    let data =
        match tokio::time::timeout(HANDSHAKE_TIMEOUT, conn.recv()).await {
            Ok(Ok(Some(data))) => data,
            Ok(Ok(None)) => {
                return Err(ProtocolError::InvalidMessage(
                    "connection closed before Hello".into(),
                )
                .into());
            }
            Ok(Err(e)) => return Err(e.into()),
            Err(_) => {
                return Err(ProtocolError::InvalidMessage(
                    "handshake timed out".into(),
                )
                .into());
            }
        };

    let envelope: Envelope<ClientEvent> = state.codec.decode(&data)?;

    let token = match envelope.event {
        ClientEvent::Hello { token } => token,
        _ => {
            send_event(
                conn,
                &state.codec,
                seq,
                start,
                ServerEvent::Error {
                    kind: ErrorKind::BadRequest,
                    message: "first event must be Hello".into(),
                },
            )
            .await?;
            return Err(ProtocolError::InvalidMessage(
                "first event must be Hello".into(),
            )
            .into());
        }
    };

    match state.auth.authenticate(&token).await {
        Ok(player) => Ok(player),
        Err(e) => {
            send_event(
                conn,
                &state.codec,
                seq,
                start,
                ServerEvent::Error {
                    kind: ErrorKind::Unauthorized,
                    message: "unauthorized".into(),
                },
            )
            .await?;
            Err(e.into())
        }
    }
}

/// Routes one client event to the lobby. Returns `true` if the connection
/// should close.
///
/// Lobby errors are reported back to this connection only, as an `Error`
/// event; they never end the connection.
async fn dispatch<S, A, C>(
    conn: &mut WsConn,
    state: &Arc<ServerState<S, A, C>>,
    player: PlayerId,
    event: ClientEvent,
    seq: &mut u64,
    start: &Instant,
) -> Result<bool, DuelhubError>
where
    S: CardSource,
    A: Authenticator,
    C: Codec,
{
    let result = match event {
        ClientEvent::Hello { .. } => {
            send_event(
                conn,
                &state.codec,
                seq,
                start,
                ServerEvent::Error {
                    kind: ErrorKind::BadRequest,
                    message: "already authenticated".into(),
                },
            )
            .await?;
            return Ok(false);
        }
        ClientEvent::CreateRoom => state
            .lobby
            .lock()
            .await
            .create_room(player)
            .map(|_| ()),
        ClientEvent::JoinRoom { code } => {
            state.lobby.lock().await.join_room(player, &code)
        }
        ClientEvent::PlayerReady { code, ready } => {
            state.lobby.lock().await.set_ready(player, &code, ready)
        }
        ClientEvent::StartGame { code } => {
            state.lobby.lock().await.start_game(player, &code)
        }
        ClientEvent::PlayCard { code, card } => {
            state.lobby.lock().await.play_card(player, &code, card)
        }
        ClientEvent::EndTurn { code } => {
            state.lobby.lock().await.end_turn(player, &code)
        }
        ClientEvent::LeaveRoom { code } => {
            state.lobby.lock().await.leave_room(player, &code)
        }
        ClientEvent::ListRooms => {
            let rooms = state.lobby.lock().await.list_rooms();
            send_event(
                conn,
                &state.codec,
                seq,
                start,
                ServerEvent::RoomList { rooms },
            )
            .await?;
            return Ok(false);
        }
        ClientEvent::Bye => {
            tracing::info!(%player, "client said goodbye");
            return Ok(true);
        }
    };

    if let Err(e) = result {
        tracing::debug!(%player, error = %e, "rejected client event");
        send_event(
            conn,
            &state.codec,
            seq,
            start,
            ServerEvent::Error {
                kind: e.kind(),
                message: e.to_string(),
            },
        )
        .await?;
    }

    Ok(false)
}

/// Wraps a server event in an envelope and writes it out.
async fn send_event(
    conn: &mut WsConn,
    codec: &impl Codec,
    seq: &mut u64,
    start: &Instant,
    event: ServerEvent,
) -> Result<(), DuelhubError> {
    let envelope = Envelope {
        seq: next_seq(seq),
        timestamp: start.elapsed().as_millis() as u64,
        event,
    };
    let bytes = codec.encode(&envelope)?;
    conn.send(&bytes).await?;
    Ok(())
}

/// Increments and returns the next sequence number.
fn next_seq(seq: &mut u64) -> u64 {
    let current = *seq;
    *seq += 1;
    current
}
