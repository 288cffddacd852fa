//! Adjacent duplicate suppression.
//!
//! Nodes may deliver the same log twice in a row (e.g. around a reconnect).
//! Only the immediately preceding transaction hash is remembered, so a hash
//! that reappears after a different one is delivered again.

/// Single-slot last-seen transaction hash guard.
#[derive(Debug, Default, Clone)]
pub struct Deduplicator {
    last_seen: Option<String>,
}

impl Deduplicator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `tx_hash` and report whether it is new.
    ///
    /// Returns `false` when it equals the previous hash.
    pub fn observe(&mut self, tx_hash: &str) -> bool {
        if self.last_seen.as_deref() == Some(tx_hash) {
            return false;
        }
        self.last_seen = Some(tx_hash.to_string());
        true
    }

    pub fn last_seen(&self) -> Option<&str> {
        self.last_seen.as_deref()
    }
}
