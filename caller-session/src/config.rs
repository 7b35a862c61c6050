use serde::Deserialize;
use std::time::Duration;

/// Call session settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CallConfig {
    /// Name announced to the callee in outgoing offers.
    pub display_name: String,
    pub ice_servers: Vec<String>,
    pub duration_tick_ms: u64,
    pub quality_interval_ms: u64,
    pub mailbox_capacity: usize,
}

impl CallConfig {
    pub fn duration_tick(&self) -> Duration {
        Duration::from_millis(self.duration_tick_ms)
    }

    pub fn quality_interval(&self) -> Duration {
        Duration::from_millis(self.quality_interval_ms)
    }
}

impl Default for CallConfig {
    fn default() -> Self {
        Self {
            display_name: "You".to_owned(),
            ice_servers: vec![
                "stun:stun.l.google.com:19302".to_owned(),
                "stun:stun1.l.google.com:19302".to_owned(),
                "stun:stun2.l.google.com:19302".to_owned(),
            ],
            duration_tick_ms: 1000,
            quality_interval_ms: 1000,
            mailbox_capacity: 256,
        }
    }
}

/// Relay connection settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SignalingConfig {
    pub url: String,
    pub reconnect_initial_delay_ms: u64,
    pub reconnect_max_delay_ms: u64,
    /// Consecutive failed attempts before the client gives up.
    pub max_reconnect_attempts: u32,
    pub inbox_capacity: usize,
}

impl SignalingConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    /// Exponential backoff: initial delay doubled per failed attempt, capped.
    pub fn reconnect_delay(&self, attempt: u32) -> Duration {
        let factor = 2u64.saturating_pow(attempt.saturating_sub(1));
        let delay = self.reconnect_initial_delay_ms.saturating_mul(factor);
        Duration::from_millis(delay.min(self.reconnect_max_delay_ms))
    }
}

impl Default for SignalingConfig {
    fn default() -> Self {
        Self {
            url: "ws://127.0.0.1:3000/ws".to_owned(),
            reconnect_initial_delay_ms: 1000,
            reconnect_max_delay_ms: 10_000,
            max_reconnect_attempts: 5,
            inbox_capacity: 256,
        }
    }
}
