//! Expiring per-(order, command) locks that suppress repeat submissions.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::command::CommandKind;

/// An expiring lock created after a successful non-read command.
///
/// At most one active (non-expired) cooldown exists per (order, command)
/// pair; expiry is wall-clock based, with no renewal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cooldown {
    pub order_external_id: String,
    pub kind: CommandKind,
    pub expires_at: DateTime<Utc>,
}

impl Cooldown {
    /// Create a cooldown lasting `seconds` from now.
    pub fn for_seconds(
        order_external_id: impl Into<String>,
        kind: CommandKind,
        seconds: u64,
    ) -> Self {
        Self {
            order_external_id: order_external_id.into(),
            kind,
            expires_at: Utc::now() + Duration::seconds(seconds as i64),
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// Remaining time at `now`, or `None` if expired.
    pub fn remaining(&self, now: DateTime<Utc>) -> Option<Duration> {
        if self.is_expired(now) {
            None
        } else {
            Some(self.expires_at - now)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expiry_is_wall_clock() {
        let cd = Cooldown::for_seconds("12345", CommandKind::Refill, 300);
        let now = Utc::now();
        assert!(!cd.is_expired(now));
        let remaining = cd.remaining(now).unwrap();
        assert!(remaining.num_seconds() > 290 && remaining.num_seconds() <= 300);

        let later = now + Duration::seconds(301);
        assert!(cd.is_expired(later));
        assert!(cd.remaining(later).is_none());
    }
}
