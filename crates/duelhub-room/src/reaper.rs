//! Background eviction of stale rooms.
//!
//! The reaper never notifies anyone: by the time a room qualifies, its
//! occupants are gone or idle past the point of caring. It takes the same
//! lobby mutex as every lifecycle event, so a sweep can never interleave
//! with a join or a start.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;

use duelhub_protocol::RoomCode;

use crate::{CardSource, Lobby};

impl<S: CardSource> Lobby<S> {
    /// One eviction pass over the registry. Returns the codes of the rooms
    /// removed, in no particular order.
    ///
    /// A room is evicted when any of these hold:
    /// - it has no players left;
    /// - it holds a single player and has idled past `waiting_timeout`;
    /// - it is not in game and has idled past `finished_timeout`.
    ///
    /// A room with a live battle is never reaped, no matter how idle; the
    /// disconnect path is what tears battles down.
    pub fn sweep(&mut self, now: Instant) -> Vec<RoomCode> {
        let waiting = self.config().waiting_timeout;
        let finished = self.config().finished_timeout;
        let mut evicted = Vec::new();

        self.registry_mut().retain(|code, room| {
            let stale = room.players().is_empty()
                || (room.players().len() == 1
                    && room.idle_for(now) > waiting)
                || (!room.in_game() && room.idle_for(now) > finished);
            if stale {
                tracing::info!(
                    %code,
                    players = room.players().len(),
                    idle_secs = room.idle_for(now).as_secs(),
                    "reaping stale room"
                );
                evicted.push(code.clone());
            }
            !stale
        });
        evicted
    }
}

/// Spawns the periodic sweep task. The handle is detached by callers that
/// want the reaper to live as long as the runtime; aborting it stops
/// eviction without touching live rooms.
pub fn spawn<S: CardSource>(
    lobby: Arc<Mutex<Lobby<S>>>,
    interval: Duration,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        // The first tick fires immediately; skip it so a fresh server
        // doesn't sweep an empty registry at startup.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let evicted = lobby.lock().await.sweep(Instant::now());
            if !evicted.is_empty() {
                tracing::debug!(count = evicted.len(), "reaper pass done");
            }
        }
    })
}
