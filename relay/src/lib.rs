pub mod room;
pub mod server;

use serde::Deserialize;

pub use room::{PeerId, RoomHandle};
pub use server::{bind, serve, RelayError};

pub const DEFAULT_BIND: &str = "127.0.0.1:8787";

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    pub bind: String,
    /// Send the most recent `update-state` to peers that join late.
    pub replay_last_state: bool,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            bind: DEFAULT_BIND.to_string(),
            replay_last_state: true,
        }
    }
}
