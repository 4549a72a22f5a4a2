//! Process-wide store of rooms, keyed by code.
//!
//! Deliberately not synchronized: every caller (lobby, reaper) reaches the
//! registry through one `tokio::sync::Mutex` held by the server state, so
//! "read room, mutate, write back" is serialized by arrival order at that
//! single point rather than by per-entry locks.

use std::collections::HashMap;

use rand::Rng;

use duelhub_protocol::{CODE_ALPHABET, CODE_LEN, RoomCode};

use crate::{Room, RoomError};

/// Keyed storage of all live rooms. Storage and existence checks only;
/// behavior lives in the lobby.
#[derive(Debug, Default)]
pub struct RoomRegistry {
    rooms: HashMap<RoomCode, Room>,
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self { rooms: HashMap::new() }
    }

    pub fn insert(&mut self, room: Room) {
        self.rooms.insert(room.code().clone(), room);
    }

    pub fn get(&self, code: &RoomCode) -> Option<&Room> {
        self.rooms.get(code)
    }

    pub fn get_mut(&mut self, code: &RoomCode) -> Option<&mut Room> {
        self.rooms.get_mut(code)
    }

    pub fn remove(&mut self, code: &RoomCode) -> Option<Room> {
        self.rooms.remove(code)
    }

    pub fn contains(&self, code: &RoomCode) -> bool {
        self.rooms.contains_key(code)
    }

    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Room> {
        self.rooms.values()
    }

    /// Keeps only the rooms the predicate approves of.
    pub fn retain(&mut self, f: impl FnMut(&RoomCode, &mut Room) -> bool) {
        self.rooms.retain(f);
    }

    /// Draws random codes until one is free, bounded by `max_attempts`.
    ///
    /// Collisions are expected to be vanishingly rare (36^6 codes), so the
    /// bound exists to fail loudly under pathological registry pressure
    /// instead of spinning.
    pub fn generate_code<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        max_attempts: usize,
    ) -> Result<RoomCode, RoomError> {
        for _ in 0..max_attempts {
            let raw: String = (0..CODE_LEN)
                .map(|_| {
                    let i = rng.random_range(0..CODE_ALPHABET.len());
                    CODE_ALPHABET[i] as char
                })
                .collect();
            let code = RoomCode::parse(&raw)
                .expect("drawn from the code alphabet");
            if !self.contains(&code) {
                return Ok(code);
            }
        }
        Err(RoomError::Exhausted)
    }
}
