//! Advisory per-variant read/write pacing.
//!
//! Some deployments slow selected packet types down for testing or
//! throttling. The hints are per-variant configuration fixed at startup,
//! not per-connection state: build the table once, freeze it behind an
//! [`std::sync::Arc`], and only read it thereafter. The transport applies the
//! pauses; this layer just carries the numbers, they are not
//! protocol-significant.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Pauses for one packet variant, in milliseconds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pacing {
    /// Pause before handing a decoded packet of this variant on.
    #[serde(default)]
    pub read_pause_ms: u64,
    /// Pause before writing a packet of this variant out.
    #[serde(default)]
    pub write_pause_ms: u64,
}

impl Pacing {
    /// Read pause as a duration.
    pub fn read_pause(&self) -> Duration {
        Duration::from_millis(self.read_pause_ms)
    }

    /// Write pause as a duration.
    pub fn write_pause(&self) -> Duration {
        Duration::from_millis(self.write_pause_ms)
    }
}

/// Pacing hints keyed by packet identifier.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PacingConfig {
    #[serde(default)]
    pauses: HashMap<u16, Pacing>,
}

impl PacingConfig {
    /// An empty table: no pauses anywhere.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the pacing for one identifier. Build-time only; once the table
    /// is shared it is never written again.
    pub fn set(&mut self, identifier: u16, pacing: Pacing) {
        self.pauses.insert(identifier, pacing);
    }

    /// The pacing for an identifier; zero pauses when unset.
    pub fn pacing_for(&self, identifier: u16) -> Pacing {
        self.pauses.get(&identifier).copied().unwrap_or_default()
    }

    /// Freeze the table for sharing across threads.
    pub fn into_shared(self) -> Arc<Self> {
        Arc::new(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::messages::id;

    #[test]
    fn test_unset_identifier_has_zero_pauses() {
        let config = PacingConfig::new();
        let pacing = config.pacing_for(id::CHAT);
        assert_eq!(pacing.read_pause(), Duration::ZERO);
        assert_eq!(pacing.write_pause(), Duration::ZERO);
    }

    #[test]
    fn test_set_and_share() {
        let mut config = PacingConfig::new();
        config.set(
            id::CHAT,
            Pacing {
                read_pause_ms: 5,
                write_pause_ms: 10,
            },
        );
        let shared = config.into_shared();
        assert_eq!(shared.pacing_for(id::CHAT).write_pause_ms, 10);
        assert_eq!(shared.pacing_for(id::PING), Pacing::default());
    }
}
