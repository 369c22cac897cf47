//! Session bridge lifecycle state

use std::fmt;

/// Lifecycle of one client connection
///
/// Transitions only move forward: `Init -> Connecting -> Active -> Closed`,
/// or `Connecting -> Closed` when the provider cannot be reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BridgeState {
    #[default]
    Init,
    Connecting,
    Active,
    Closed,
}

impl BridgeState {
    /// Whether client audio and provider events should still be relayed
    pub fn is_active(self) -> bool {
        self == BridgeState::Active
    }

    pub fn is_closed(self) -> bool {
        self == BridgeState::Closed
    }
}

impl fmt::Display for BridgeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BridgeState::Init => "init",
            BridgeState::Connecting => "connecting",
            BridgeState::Active => "active",
            BridgeState::Closed => "closed",
        };
        f.write_str(name)
    }
}
