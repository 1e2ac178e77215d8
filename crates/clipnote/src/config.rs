//! Configuration for the share flow.

use clipnote_bridge::BridgeConfig;
use clipnote_relay::PublishConfig;
use clipnote_store::HistoryConfig;

/// Everything tunable, grouped by component.
#[derive(Debug, Clone, Default)]
pub struct ClipnoteConfig {
    /// Bridge readiness and call timeouts.
    pub bridge: BridgeConfig,
    /// Relay limits, ack timeout and fallback relays.
    pub publish: PublishConfig,
    /// History capacity.
    pub history: HistoryConfig,
}
