//! Lobby configuration.

use std::time::Duration;

/// Tunables for the lobby and its reaper.
#[derive(Debug, Clone)]
pub struct LobbyConfig {
    /// How many random codes `create_room` may try before giving up
    /// with `Exhausted`. Bounded so a near-full code space cannot spin
    /// the server forever.
    pub max_code_attempts: usize,

    /// A room holding a single player longer than this is considered
    /// abandoned by the reaper.
    pub waiting_timeout: Duration,

    /// A room that is not in game and has been idle longer than this is
    /// reaped, whoever is still nominally inside.
    pub finished_timeout: Duration,

    /// How often the reaper sweeps the registry.
    pub sweep_interval: Duration,
}

impl Default for LobbyConfig {
    fn default() -> Self {
        Self {
            max_code_attempts: 32,
            waiting_timeout: Duration::from_secs(120),
            finished_timeout: Duration::from_secs(300),
            sweep_interval: Duration::from_secs(30),
        }
    }
}
