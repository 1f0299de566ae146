//! User mappings: sender identifiers bound to a panel username.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Binds one or more sender identifiers (phone numbers / group ids) to a
/// panel username for one reseller account.
///
/// Created on first self-registration, mutated on verification and
/// suspension, never auto-deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserMapping {
    /// Sender identifiers that resolve to this mapping.
    pub identifiers: Vec<String>,
    /// The panel username this mapping vouches for.
    pub panel_username: String,
    /// Whether the bot will act for this mapping at all.
    pub bot_enabled: bool,
    /// Whether the mapping's username was verified against panel data.
    pub verified: bool,
    /// Auto-suspension flag, set when the strike counter crosses the
    /// threshold (repeated ownership mismatches).
    pub suspended: bool,
    pub suspended_reason: Option<String>,
    /// Ownership-mismatch strikes accumulated so far.
    pub strikes: u32,
    pub last_activity: DateTime<Utc>,
}

/// Mismatch strikes before a mapping is auto-suspended.
pub const SUSPENSION_STRIKE_LIMIT: u32 = 5;

impl UserMapping {
    /// Create a fresh mapping for a single identifier.
    pub fn new(identifier: impl Into<String>, panel_username: impl Into<String>) -> Self {
        Self {
            identifiers: vec![identifier.into()],
            panel_username: panel_username.into(),
            bot_enabled: true,
            verified: false,
            suspended: false,
            suspended_reason: None,
            strikes: 0,
            last_activity: Utc::now(),
        }
    }

    /// Whether the mapping covers the given sender identifier.
    pub fn covers(&self, identifier: &str) -> bool {
        self.identifiers.iter().any(|i| i == identifier)
    }

    /// Whether the bot may act for this mapping.
    pub fn usable(&self) -> bool {
        self.bot_enabled && !self.suspended
    }

    /// Record an ownership-mismatch strike; auto-suspends at the limit.
    pub fn record_strike(&mut self) {
        self.strikes += 1;
        if self.strikes >= SUSPENSION_STRIKE_LIMIT && !self.suspended {
            self.suspended = true;
            self.suspended_reason =
                Some("repeated attempts to act on orders belonging to other accounts".into());
        }
    }

    pub fn touch(&mut self) {
        self.last_activity = Utc::now();
    }
}
