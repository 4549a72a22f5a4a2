//! The `Room` entity: one matchmaking/battle session.

use std::collections::HashMap;
use std::time::Instant;

use duelhub_battle::BattleState;
use duelhub_protocol::{PlayerId, RoomCode};

/// Hard capacity of a room.
pub const MAX_PLAYERS: usize = 2;

/// A matchmaking room, keyed by its 6-character code.
///
/// Invariants maintained by the mutators here:
/// - `players.len() <= MAX_PLAYERS`, insertion order = join order = turn
///   order;
/// - `ready` holds exactly one entry per player;
/// - `battle` is `Some` iff the room is in game (there is no separate
///   flag to drift out of sync);
/// - `last_activity` moves forward on every lifecycle event.
#[derive(Debug)]
pub struct Room {
    code: RoomCode,
    host: PlayerId,
    players: Vec<PlayerId>,
    ready: HashMap<PlayerId, bool>,
    last_activity: Instant,
    battle: Option<BattleState>,
}

impl Room {
    /// Creates a room with `host` as its sole, not-ready player.
    pub(crate) fn new(code: RoomCode, host: PlayerId) -> Self {
        Self {
            code,
            host,
            players: vec![host],
            ready: HashMap::from([(host, false)]),
            last_activity: Instant::now(),
            battle: None,
        }
    }

    pub fn code(&self) -> &RoomCode {
        &self.code
    }

    /// The creator of the room, sole authority to start the battle. If the
    /// host disconnects the room keeps its now-absent host id; such a room
    /// can never start and is left for the reaper.
    pub fn host(&self) -> PlayerId {
        self.host
    }

    /// Members in join order; index 0 acts first once a battle starts.
    pub fn players(&self) -> &[PlayerId] {
        &self.players
    }

    pub fn is_member(&self, player: PlayerId) -> bool {
        self.players.contains(&player)
    }

    pub fn is_full(&self) -> bool {
        self.players.len() >= MAX_PLAYERS
    }

    pub fn all_ready(&self) -> bool {
        !self.ready.is_empty() && self.ready.values().all(|r| *r)
    }

    pub fn is_ready(&self, player: PlayerId) -> bool {
        self.ready.get(&player).copied().unwrap_or(false)
    }

    pub fn in_game(&self) -> bool {
        self.battle.is_some()
    }

    pub fn battle(&self) -> Option<&BattleState> {
        self.battle.as_ref()
    }

    pub fn battle_mut(&mut self) -> Option<&mut BattleState> {
        self.battle.as_mut()
    }

    /// The other member, if there is one.
    pub fn opponent_of(&self, player: PlayerId) -> Option<PlayerId> {
        self.players.iter().copied().find(|p| *p != player)
    }

    /// Time since the last lifecycle event touched this room.
    pub fn idle_for(&self, now: Instant) -> std::time::Duration {
        now.saturating_duration_since(self.last_activity)
    }

    /// Marks activity now.
    pub(crate) fn touch(&mut self) {
        self.last_activity = Instant::now();
    }

    /// Backdates the activity timestamp; test hook for the reaper.
    #[doc(hidden)]
    pub fn backdate_activity(&mut self, to: Instant) {
        self.last_activity = to;
    }

    /// Appends a player (not ready). Caller checks capacity first.
    pub(crate) fn add_player(&mut self, player: PlayerId) {
        debug_assert!(!self.is_full() && !self.is_member(player));
        self.players.push(player);
        self.ready.insert(player, false);
    }

    /// Removes a player and their ready entry. Returns whether the player
    /// was a member.
    pub(crate) fn remove_player(&mut self, player: PlayerId) -> bool {
        let Some(pos) = self.players.iter().position(|p| *p == player)
        else {
            return false;
        };
        self.players.remove(pos);
        self.ready.remove(&player);
        true
    }

    pub(crate) fn set_ready(&mut self, player: PlayerId, ready: bool) {
        self.ready.insert(player, ready);
    }

    pub(crate) fn set_battle(&mut self, battle: BattleState) {
        self.battle = Some(battle);
    }

    /// Tears down any in-progress battle unconditionally.
    pub(crate) fn clear_battle(&mut self) {
        self.battle = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn room() -> Room {
        Room::new(RoomCode::parse("AB12CD").unwrap(), PlayerId(1))
    }

    #[test]
    fn test_new_room_has_host_as_sole_unready_player() {
        let room = room();
        assert_eq!(room.host(), PlayerId(1));
        assert_eq!(room.players(), &[PlayerId(1)]);
        assert!(!room.is_ready(PlayerId(1)));
        assert!(!room.all_ready());
        assert!(!room.in_game());
    }

    #[test]
    fn test_capacity_and_membership() {
        let mut room = room();
        assert!(!room.is_full());
        room.add_player(PlayerId(2));
        assert!(room.is_full());
        assert!(room.is_member(PlayerId(2)));
        assert_eq!(room.opponent_of(PlayerId(1)), Some(PlayerId(2)));
        assert_eq!(room.opponent_of(PlayerId(2)), Some(PlayerId(1)));
    }

    #[test]
    fn test_ready_tracking() {
        let mut room = room();
        room.add_player(PlayerId(2));
        room.set_ready(PlayerId(1), true);
        assert!(!room.all_ready());
        room.set_ready(PlayerId(2), true);
        assert!(room.all_ready());
        room.set_ready(PlayerId(2), false);
        assert!(!room.all_ready());
    }

    #[test]
    fn test_remove_player_drops_ready_entry() {
        let mut room = room();
        room.add_player(PlayerId(2));
        room.set_ready(PlayerId(2), true);

        assert!(room.remove_player(PlayerId(2)));
        assert!(!room.is_member(PlayerId(2)));
        assert!(!room.remove_player(PlayerId(2)), "second removal is a no-op");
        // Only the host's (false) entry remains.
        assert!(!room.all_ready());
    }

    #[test]
    fn test_opponent_of_sole_player_is_none() {
        let room = room();
        assert_eq!(room.opponent_of(PlayerId(1)), None);
    }
}
