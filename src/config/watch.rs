//! `[watch]` section configuration.

use super::defaults;
use educe::Educe;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// `[watch]` section in weld.toml - rebuild-on-change settings.
///
/// # Example
/// ```toml
/// [watch]
/// debounce_ms = 150   # Quiet period before a triggered rebuild starts
/// ```
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct WatchConfig {
    /// Milliseconds to wait for a burst of file events to settle.
    #[serde(default = "defaults::watch::debounce_ms")]
    #[educe(Default = defaults::watch::debounce_ms())]
    pub debounce_ms: u64,
}

impl WatchConfig {
    pub const fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}
