use scoreboard_common::digits::DEFAULT_DIGITS_DIR;
use serde_derive::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    pub relay_host: String,
    pub relay_port: u16,
    /// The scoreboard this display shows
    pub instance: u32,
    pub digits_dir: String,
    pub reconnect_delay_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            relay_host: "127.0.0.1".to_string(),
            relay_port: 8200,
            instance: 1,
            digits_dir: DEFAULT_DIGITS_DIR.to_string(),
            reconnect_delay_ms: 1_000,
        }
    }
}
