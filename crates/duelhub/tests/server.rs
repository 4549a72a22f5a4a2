//! Integration tests for the server, handler, and full connection flow,
//! exercised over real WebSockets.

use std::time::Duration;

use duelhub::prelude::*;
use futures_util::{SinkExt, StreamExt};
use tokio_tungstenite::tungstenite::Message;

// =========================================================================
// Card source and authenticator fixtures
// =========================================================================

struct StaticCards;

impl CardSource for StaticCards {
    fn starting_deck(&self, player: PlayerId) -> Vec<Card> {
        (0..8)
            .map(|i| Card {
                id: CardId(player.0 as u32 * 100 + i),
                name: format!("card-{i}"),
                category: Category::Flame,
                attack: 5,
                hp: 10,
                max_hp: 10,
                cost: 1,
                tier: 1,
            })
            .collect()
    }
}

/// Accepts any numeric token as a PlayerId.
struct TestAuth;

impl Authenticator for TestAuth {
    async fn authenticate(&self, token: &str) -> Result<PlayerId, AuthError> {
        let id: u64 = token
            .parse()
            .map_err(|_| AuthError("not a number".into()))?;
        Ok(PlayerId(id))
    }
}

// =========================================================================
// Helpers
// =========================================================================

type ClientWs = tokio_tungstenite::WebSocketStream<
    tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
>;

/// Starts a server on a random port and returns the address.
async fn start_server() -> String {
    let server = DuelhubServerBuilder::new()
        .bind("127.0.0.1:0")
        .build(StaticCards, TestAuth)
        .await
        .expect("server should build");

    let addr = server
        .local_addr()
        .expect("should have local addr")
        .to_string();

    tokio::spawn(async move {
        let _ = server.run().await;
    });

    // Give the accept loop a moment to start.
    tokio::time::sleep(Duration::from_millis(10)).await;
    addr
}

async fn connect(addr: &str) -> ClientWs {
    let (ws, _) = tokio_tungstenite::connect_async(format!("ws://{addr}"))
        .await
        .expect("should connect");
    ws
}

fn encode_event(event: &ClientEvent) -> Message {
    let envelope = Envelope { seq: 0, timestamp: 0, event: event.clone() };
    let bytes = serde_json::to_vec(&envelope).expect("encode");
    Message::Binary(bytes.into())
}

async fn send(ws: &mut ClientWs, event: &ClientEvent) {
    ws.send(encode_event(event)).await.expect("send");
}

async fn recv_event(ws: &mut ClientWs) -> ServerEvent {
    let msg = tokio::time::timeout(Duration::from_secs(2), ws.next())
        .await
        .expect("recv timed out")
        .expect("stream ended")
        .expect("recv");
    let envelope: Envelope<ServerEvent> =
        serde_json::from_slice(&msg.into_data()).expect("decode");
    envelope.event
}

/// Sends Hello and consumes the Welcome.
async fn hello(ws: &mut ClientWs, player: u64) {
    send(ws, &ClientEvent::Hello { token: player.to_string() }).await;
    match recv_event(ws).await {
        ServerEvent::Welcome { player_id } => {
            assert_eq!(player_id, PlayerId(player));
        }
        other => panic!("expected Welcome, got {other:?}"),
    }
}

/// Creates a room on `host` and joins it from `guest`, draining the join
/// chatter. Returns the room code.
async fn make_room(host: &mut ClientWs, guest: &mut ClientWs) -> RoomCode {
    send(host, &ClientEvent::CreateRoom).await;
    let code = match recv_event(host).await {
        ServerEvent::RoomCreated { code, is_host } => {
            assert!(is_host);
            code
        }
        other => panic!("expected RoomCreated, got {other:?}"),
    };

    send(guest, &ClientEvent::JoinRoom { code: code.clone() }).await;
    assert!(matches!(
        recv_event(guest).await,
        ServerEvent::RoomJoined { is_host: false, .. }
    ));
    assert!(matches!(
        recv_event(host).await,
        ServerEvent::OpponentJoined { .. }
    ));
    code
}

/// Readies both players and starts the game from `host`. Returns both
/// GameStart snapshots (host's first).
async fn start_game(
    host: &mut ClientWs,
    guest: &mut ClientWs,
    code: &RoomCode,
) -> (BattleSnapshot, BattleSnapshot) {
    send(host, &ClientEvent::PlayerReady { code: code.clone(), ready: true })
        .await;
    assert!(matches!(
        recv_event(guest).await,
        ServerEvent::OpponentReady { ready: true }
    ));
    send(
        guest,
        &ClientEvent::PlayerReady { code: code.clone(), ready: true },
    )
    .await;
    assert!(matches!(
        recv_event(host).await,
        ServerEvent::OpponentReady { ready: true }
    ));

    send(host, &ClientEvent::StartGame { code: code.clone() }).await;
    let host_snap = match recv_event(host).await {
        ServerEvent::GameStart { snapshot } => snapshot,
        other => panic!("expected GameStart, got {other:?}"),
    };
    let guest_snap = match recv_event(guest).await {
        ServerEvent::GameStart { snapshot } => snapshot,
        other => panic!("expected GameStart, got {other:?}"),
    };
    (host_snap, guest_snap)
}

// =========================================================================
// Tests
// =========================================================================

#[tokio::test]
async fn test_hello_gets_welcome() {
    let addr = start_server().await;
    let mut ws = connect(&addr).await;
    hello(&mut ws, 42).await;
}

#[tokio::test]
async fn test_bad_token_rejected() {
    let addr = start_server().await;
    let mut ws = connect(&addr).await;

    send(&mut ws, &ClientEvent::Hello { token: "not-a-number".into() })
        .await;
    match recv_event(&mut ws).await {
        ServerEvent::Error { kind, .. } => {
            assert_eq!(kind, ErrorKind::Unauthorized);
        }
        other => panic!("expected Error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_first_event_must_be_hello() {
    let addr = start_server().await;
    let mut ws = connect(&addr).await;

    send(&mut ws, &ClientEvent::CreateRoom).await;
    match recv_event(&mut ws).await {
        ServerEvent::Error { kind, .. } => {
            assert_eq!(kind, ErrorKind::BadRequest);
        }
        other => panic!("expected Error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_join_unknown_room() {
    let addr = start_server().await;
    let mut ws = connect(&addr).await;
    hello(&mut ws, 1).await;

    send(
        &mut ws,
        &ClientEvent::JoinRoom { code: RoomCode::parse("ZZZZZZ").unwrap() },
    )
    .await;
    match recv_event(&mut ws).await {
        ServerEvent::Error { kind, .. } => {
            assert_eq!(kind, ErrorKind::NotFound);
        }
        other => panic!("expected Error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_full_match_flow() {
    let addr = start_server().await;
    let mut host = connect(&addr).await;
    let mut guest = connect(&addr).await;
    hello(&mut host, 1).await;
    hello(&mut guest, 2).await;

    let code = make_room(&mut host, &mut guest).await;
    let (host_snap, guest_snap) =
        start_game(&mut host, &mut guest, &code).await;

    // The host created the room, so the host acts first; both clients see
    // the identical opening state.
    assert_eq!(host_snap, guest_snap);
    assert_eq!(host_snap.current_turn, PlayerId(1));
    assert_eq!(host_snap.turn_index, 0);
    assert_eq!(host_snap.sides.len(), 2);
    assert_eq!(host_snap.sides[0].id, PlayerId(1));
    assert_eq!(host_snap.sides[0].hp, MAX_HP);
    assert_eq!(host_snap.sides[0].cost, START_COST);
    assert_eq!(host_snap.sides[0].hand.len(), HAND_SIZE);

    // The guest tries to act out of turn and is rejected.
    let guest_card = guest_snap.sides[1].hand[0].id;
    send(
        &mut guest,
        &ClientEvent::PlayCard { code: code.clone(), card: guest_card },
    )
    .await;
    match recv_event(&mut guest).await {
        ServerEvent::Error { kind, .. } => {
            assert_eq!(kind, ErrorKind::IllegalState);
        }
        other => panic!("expected Error, got {other:?}"),
    }

    // The host ends their turn; both sides hear it.
    send(&mut host, &ClientEvent::EndTurn { code: code.clone() }).await;
    for ws in [&mut host, &mut guest] {
        match recv_event(ws).await {
            ServerEvent::TurnChanged { next_player, turn_index, cost } => {
                assert_eq!(next_player, PlayerId(2));
                assert_eq!(turn_index, 1);
                assert_eq!(cost, START_COST + 1);
            }
            other => panic!("expected TurnChanged, got {other:?}"),
        }
    }

    // Now the guest's play lands and the host is told.
    send(
        &mut guest,
        &ClientEvent::PlayCard { code: code.clone(), card: guest_card },
    )
    .await;
    match recv_event(&mut host).await {
        ServerEvent::OpponentPlayCard { card } => {
            assert_eq!(card.id, guest_card);
        }
        other => panic!("expected OpponentPlayCard, got {other:?}"),
    }
}

#[tokio::test]
async fn test_non_host_cannot_start() {
    let addr = start_server().await;
    let mut host = connect(&addr).await;
    let mut guest = connect(&addr).await;
    hello(&mut host, 1).await;
    hello(&mut guest, 2).await;
    let code = make_room(&mut host, &mut guest).await;

    send(&mut guest, &ClientEvent::StartGame { code }).await;
    match recv_event(&mut guest).await {
        ServerEvent::Error { kind, .. } => {
            assert_eq!(kind, ErrorKind::Unauthorized);
        }
        other => panic!("expected Error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_third_player_cannot_join() {
    let addr = start_server().await;
    let mut host = connect(&addr).await;
    let mut guest = connect(&addr).await;
    hello(&mut host, 1).await;
    hello(&mut guest, 2).await;
    let code = make_room(&mut host, &mut guest).await;

    let mut third = connect(&addr).await;
    hello(&mut third, 3).await;
    send(&mut third, &ClientEvent::JoinRoom { code }).await;
    match recv_event(&mut third).await {
        ServerEvent::Error { kind, .. } => {
            assert_eq!(kind, ErrorKind::Full);
        }
        other => panic!("expected Error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_disconnect_mid_game_notifies_opponent() {
    let addr = start_server().await;
    let mut host = connect(&addr).await;
    let mut guest = connect(&addr).await;
    hello(&mut host, 1).await;
    hello(&mut guest, 2).await;
    let code = make_room(&mut host, &mut guest).await;
    start_game(&mut host, &mut guest, &code).await;

    drop(guest);
    match recv_event(&mut host).await {
        ServerEvent::OpponentLeft => {}
        other => panic!("expected OpponentLeft, got {other:?}"),
    }

    // The battle was torn down with the departure.
    send(
        &mut host,
        &ClientEvent::PlayCard { code, card: CardId(100) },
    )
    .await;
    match recv_event(&mut host).await {
        ServerEvent::Error { kind, .. } => {
            assert_eq!(kind, ErrorKind::IllegalState);
        }
        other => panic!("expected Error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_list_rooms() {
    let addr = start_server().await;
    let mut ws = connect(&addr).await;
    hello(&mut ws, 1).await;

    send(&mut ws, &ClientEvent::ListRooms).await;
    match recv_event(&mut ws).await {
        ServerEvent::RoomList { rooms } => assert!(rooms.is_empty()),
        other => panic!("expected RoomList, got {other:?}"),
    }

    send(&mut ws, &ClientEvent::CreateRoom).await;
    let code = match recv_event(&mut ws).await {
        ServerEvent::RoomCreated { code, .. } => code,
        other => panic!("expected RoomCreated, got {other:?}"),
    };

    let mut other_ws = connect(&addr).await;
    hello(&mut other_ws, 2).await;
    send(&mut other_ws, &ClientEvent::ListRooms).await;
    match recv_event(&mut other_ws).await {
        ServerEvent::RoomList { rooms } => {
            assert_eq!(rooms.len(), 1);
            assert_eq!(rooms[0].code, code);
            assert_eq!(rooms[0].players, 1);
            assert!(!rooms[0].in_game);
        }
        other => panic!("expected RoomList, got {other:?}"),
    }
}

#[tokio::test]
async fn test_bye_closes_connection() {
    let addr = start_server().await;
    let mut ws = connect(&addr).await;
    hello(&mut ws, 1).await;

    send(&mut ws, &ClientEvent::Bye).await;
    let result =
        tokio::time::timeout(Duration::from_secs(2), ws.next()).await;
    match result {
        Ok(Some(Ok(Message::Close(_)))) | Ok(None) => {}
        Ok(Some(Err(_))) => {}
        other => panic!("expected close, got {other:?}"),
    }
}

#[tokio::test]
async fn test_garbage_payload_skipped() {
    let addr = start_server().await;
    let mut ws = connect(&addr).await;
    hello(&mut ws, 1).await;

    ws.send(Message::Binary(b"not json".to_vec().into()))
        .await
        .expect("send");

    // The connection survives; a valid request still gets its answer.
    send(&mut ws, &ClientEvent::ListRooms).await;
    assert!(matches!(
        recv_event(&mut ws).await,
        ServerEvent::RoomList { .. }
    ));
}

#[tokio::test]
async fn test_multiple_connections_independent() {
    let addr = start_server().await;
    let mut ws1 = connect(&addr).await;
    let mut ws2 = connect(&addr).await;
    hello(&mut ws1, 10).await;
    hello(&mut ws2, 20).await;

    // Each creates their own room; codes never collide.
    send(&mut ws1, &ClientEvent::CreateRoom).await;
    send(&mut ws2, &ClientEvent::CreateRoom).await;
    let code1 = match recv_event(&mut ws1).await {
        ServerEvent::RoomCreated { code, .. } => code,
        other => panic!("expected RoomCreated, got {other:?}"),
    };
    let code2 = match recv_event(&mut ws2).await {
        ServerEvent::RoomCreated { code, .. } => code,
        other => panic!("expected RoomCreated, got {other:?}"),
    };
    assert_ne!(code1, code2);
}
