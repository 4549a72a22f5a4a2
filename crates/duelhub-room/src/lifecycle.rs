//! The lobby: every connection-scoped lifecycle event lands here.
//!
//! One `Lobby` per server process, owned behind a single `Mutex`; that
//! mutex is the serialization point the whole design leans on. Within one
//! event the lobby mutates at most one room, emits its notifications, and
//! returns. Two simultaneous calls against the same room are resolved by
//! whichever acquires the lock first, and the loser is rejected by the
//! ordinary turn/state checks rather than queued.

use std::collections::HashMap;

use tokio::sync::mpsc;

use duelhub_battle::{BattleState, roll_field_event};
use duelhub_protocol::{
    CardId, PlayerId, RoomCode, RoomListEntry, ServerEvent,
};

use crate::room::MAX_PLAYERS;
use crate::{LobbyConfig, Room, RoomError, RoomRegistry};

/// Supplies each player's deck when a battle starts.
///
/// This is the card/inventory store collaborator: the lobby consumes card
/// value objects from it and never persists them.
pub trait CardSource: Send + Sync + 'static {
    /// The deck the player brings into a battle, top card first.
    fn starting_deck(&self, player: PlayerId) -> Vec<duelhub_protocol::Card>;
}

/// Channel sender delivering [`ServerEvent`]s to one player's connection
/// handler.
pub type EventSender = mpsc::UnboundedSender<ServerEvent>;

/// The room lifecycle manager.
///
/// Holds the registry plus the per-player outbound channels. Notifications
/// are fire-and-forget: a send to a vanished peer is dropped silently, and
/// nothing is ever re-delivered.
pub struct Lobby<S> {
    registry: RoomRegistry,
    senders: HashMap<PlayerId, EventSender>,
    cards: S,
    config: LobbyConfig,
}

impl<S: CardSource> Lobby<S> {
    pub fn new(cards: S, config: LobbyConfig) -> Self {
        Self {
            registry: RoomRegistry::new(),
            senders: HashMap::new(),
            cards,
            config,
        }
    }

    pub fn config(&self) -> &LobbyConfig {
        &self.config
    }

    /// Registers an authenticated connection and greets it.
    pub fn connect(&mut self, player: PlayerId, sender: EventSender) {
        self.senders.insert(player, sender);
        tracing::info!(%player, "player connected");
        self.send_to(player, ServerEvent::Welcome { player_id: player });
    }

    /// Tears down everything the player was part of: removes them from
    /// every room holding them, ends any battle in those rooms
    /// unconditionally, notifies the remaining member, and deletes rooms
    /// that end up empty.
    pub fn disconnect(&mut self, player: PlayerId) {
        self.senders.remove(&player);
        let codes: Vec<RoomCode> = self
            .registry
            .iter()
            .filter(|room| room.is_member(player))
            .map(|room| room.code().clone())
            .collect();
        for code in codes {
            let notes = self.vacate_room(&code, player);
            self.notify(notes);
        }
        tracing::info!(%player, "player disconnected");
    }

    /// Creates a room with the caller as host and sole player.
    pub fn create_room(
        &mut self,
        player: PlayerId,
    ) -> Result<RoomCode, RoomError> {
        let mut rng = rand::rng();
        let code = self
            .registry
            .generate_code(&mut rng, self.config.max_code_attempts)?;
        self.registry.insert(Room::new(code.clone(), player));
        tracing::info!(%code, %player, "room created");
        self.send_to(player, ServerEvent::RoomCreated {
            code: code.clone(),
            is_host: true,
        });
        Ok(code)
    }

    /// Joins an existing room.
    ///
    /// Re-joining a room the caller is already in succeeds idempotently
    /// (the `RoomJoined` is simply re-emitted) to tolerate client-side
    /// reconnect races.
    pub fn join_room(
        &mut self,
        player: PlayerId,
        code: &RoomCode,
    ) -> Result<(), RoomError> {
        let mut notes = Vec::new();
        {
            let room = self
                .registry
                .get_mut(code)
                .ok_or_else(|| RoomError::NotFound(code.clone()))?;

            if room.is_member(player) {
                notes.push((player, ServerEvent::RoomJoined {
                    code: code.clone(),
                    is_host: room.host() == player,
                }));
            } else if room.is_full() {
                return Err(RoomError::Full(code.clone()));
            } else {
                room.add_player(player);
                room.touch();
                tracing::info!(
                    %code, %player,
                    players = room.players().len(),
                    "player joined"
                );
                notes.push((player, ServerEvent::RoomJoined {
                    code: code.clone(),
                    is_host: false,
                }));
                if let Some(other) = room.opponent_of(player) {
                    notes.push((other, ServerEvent::OpponentJoined {
                        opponent: player,
                    }));
                }
            }
        }
        self.notify(notes);
        Ok(())
    }

    /// Records the caller's ready flag and tells the other member.
    ///
    /// Never triggers a start by itself — all-ready is advisory state the
    /// host acts on.
    pub fn set_ready(
        &mut self,
        player: PlayerId,
        code: &RoomCode,
        ready: bool,
    ) -> Result<(), RoomError> {
        let mut notes = Vec::new();
        {
            let room = self
                .registry
                .get_mut(code)
                .ok_or_else(|| RoomError::NotFound(code.clone()))?;
            if !room.is_member(player) {
                return Err(RoomError::IllegalState(
                    "not a member of this room".into(),
                ));
            }
            room.set_ready(player, ready);
            room.touch();
            if let Some(other) = room.opponent_of(player) {
                notes.push((other, ServerEvent::OpponentReady { ready }));
            }
        }
        self.notify(notes);
        Ok(())
    }

    /// Host-only: starts the battle.
    ///
    /// The player list at this instant, after any join/disconnect churn,
    /// is snapshotted as the authoritative turn order.
    pub fn start_game(
        &mut self,
        player: PlayerId,
        code: &RoomCode,
    ) -> Result<(), RoomError> {
        let mut notes = Vec::new();
        {
            let room = self
                .registry
                .get_mut(code)
                .ok_or_else(|| RoomError::NotFound(code.clone()))?;

            if room.host() != player {
                return Err(RoomError::Unauthorized(player));
            }
            if room.players().len() != MAX_PLAYERS {
                return Err(RoomError::IllegalState(
                    "a battle needs two players".into(),
                ));
            }
            if !room.all_ready() {
                return Err(RoomError::IllegalState(
                    "both players must be ready".into(),
                ));
            }
            if room.in_game() {
                return Err(RoomError::IllegalState(
                    "battle already running".into(),
                ));
            }

            let lineup = [room.players()[0], room.players()[1]];
            let decks = [
                self.cards.starting_deck(lineup[0]),
                self.cards.starting_deck(lineup[1]),
            ];
            let battle = BattleState::new(lineup, decks);
            let snapshot = battle.snapshot();
            room.set_battle(battle);
            room.touch();
            tracing::info!(%code, "battle started");

            for member in lineup {
                notes.push((member, ServerEvent::GameStart {
                    snapshot: snapshot.clone(),
                }));
            }
        }
        self.notify(notes);
        Ok(())
    }

    /// Plays a card in the caller's active battle and tells the opponent.
    pub fn play_card(
        &mut self,
        player: PlayerId,
        code: &RoomCode,
        card: CardId,
    ) -> Result<(), RoomError> {
        let mut notes = Vec::new();
        {
            let room = self
                .registry
                .get_mut(code)
                .ok_or_else(|| RoomError::NotFound(code.clone()))?;
            let battle = room.battle_mut().ok_or_else(|| {
                RoomError::IllegalState("no active battle".into())
            })?;

            let played = battle.play_card(player, card)?;
            room.touch();
            if let Some(other) = room.opponent_of(player) {
                notes.push((other, ServerEvent::OpponentPlayCard {
                    card: played,
                }));
            }
        }
        self.notify(notes);
        Ok(())
    }

    /// Ends the caller's turn, broadcasts the new turn-holder, and every
    /// few turns rolls and broadcasts a field event.
    pub fn end_turn(
        &mut self,
        player: PlayerId,
        code: &RoomCode,
    ) -> Result<(), RoomError> {
        let mut notes = Vec::new();
        {
            let room = self
                .registry
                .get_mut(code)
                .ok_or_else(|| RoomError::NotFound(code.clone()))?;
            let battle = room.battle_mut().ok_or_else(|| {
                RoomError::IllegalState("no active battle".into())
            })?;

            let change = battle.end_turn(player)?;
            room.touch();

            let mut rng = rand::rng();
            let surge = roll_field_event(change.turn_index, &mut rng);

            for member in room.players().iter().copied() {
                notes.push((member, ServerEvent::TurnChanged {
                    next_player: change.next_player,
                    turn_index: change.turn_index,
                    cost: change.cost,
                }));
            }
            if let Some(event) = surge {
                for member in room.players().iter().copied() {
                    notes.push((member, ServerEvent::FieldSurge { event }));
                }
            }
        }
        self.notify(notes);
        Ok(())
    }

    /// Leaves a room without dropping the connection. Same teardown as a
    /// disconnect, scoped to one room.
    pub fn leave_room(
        &mut self,
        player: PlayerId,
        code: &RoomCode,
    ) -> Result<(), RoomError> {
        let room = self
            .registry
            .get(code)
            .ok_or_else(|| RoomError::NotFound(code.clone()))?;
        if !room.is_member(player) {
            return Err(RoomError::IllegalState(
                "not a member of this room".into(),
            ));
        }
        let notes = self.vacate_room(code, player);
        self.notify(notes);
        Ok(())
    }

    /// Room summaries for lobby browsing.
    pub fn list_rooms(&self) -> Vec<RoomListEntry> {
        self.registry
            .iter()
            .map(|room| RoomListEntry {
                code: room.code().clone(),
                players: room.players().len(),
                in_game: room.in_game(),
            })
            .collect()
    }

    /// Read-only view of a room (tests, diagnostics).
    pub fn room(&self, code: &RoomCode) -> Option<&Room> {
        self.registry.get(code)
    }

    /// Mutable view of a room; exposed for the reaper tests to backdate
    /// activity timestamps.
    #[doc(hidden)]
    pub fn room_mut(&mut self, code: &RoomCode) -> Option<&mut Room> {
        self.registry.get_mut(code)
    }

    pub fn room_count(&self) -> usize {
        self.registry.len()
    }

    pub(crate) fn registry_mut(&mut self) -> &mut RoomRegistry {
        &mut self.registry
    }

    /// Sends one event to one player, dropping it silently if the peer's
    /// channel is gone.
    pub fn send_to(&self, player: PlayerId, event: ServerEvent) {
        if let Some(sender) = self.senders.get(&player) {
            let _ = sender.send(event);
        }
    }

    // -- Internals --------------------------------------------------------

    /// Removes a player from one room: clears any battle, notifies the
    /// remaining member, deletes the room if empty.
    fn vacate_room(
        &mut self,
        code: &RoomCode,
        player: PlayerId,
    ) -> Vec<(PlayerId, ServerEvent)> {
        let mut notes = Vec::new();
        let mut delete = false;
        if let Some(room) = self.registry.get_mut(code) {
            if room.remove_player(player) {
                room.clear_battle();
                room.touch();
                tracing::info!(%code, %player, "player left room");
                if room.players().is_empty() {
                    delete = true;
                } else {
                    for other in room.players().iter().copied() {
                        notes.push((other, ServerEvent::OpponentLeft));
                    }
                }
            }
        }
        if delete {
            self.registry.remove(code);
            tracing::info!(%code, "room deleted (empty)");
        }
        notes
    }

    fn notify(&self, notes: Vec<(PlayerId, ServerEvent)>) {
        for (player, event) in notes {
            self.send_to(player, event);
        }
    }
}
