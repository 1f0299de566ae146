//! CRUD traits the pipeline depends on.

use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use panelbot_types::{
    CommandKind, CommandRecord, Cooldown, Order, SecurityPolicy, UserMapping,
};

/// Storage failure. The authorization chain treats any `Err` from an
/// ownership lookup as a Deny (fail closed); the engine maps it to a
/// generic internal-error outcome.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("conflicting write: {0}")]
    Conflict(String),

    #[error("store corruption: {0}")]
    Corrupt(String),
}

/// Result of an atomic claim attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClaimResult {
    /// The claim was written (or already held by the same sender).
    Claimed,
    /// A different sender already holds the claim; nothing was written.
    HeldByOther,
    /// No such order.
    NotFound,
}

/// Orders, keyed by panel-assigned external id.
pub trait OrderStore: Send + Sync {
    fn get_order(&self, external_id: &str) -> Result<Option<Order>, StoreError>;

    fn upsert_order(&self, order: Order) -> Result<(), StoreError>;

    /// Atomically claim an order for `sender`. First claim wins; a repeat
    /// claim by the same sender is an idempotent no-op.
    fn claim_order(
        &self,
        external_id: &str,
        sender: &str,
        verified: bool,
    ) -> Result<ClaimResult, StoreError>;
}

/// Command records (the audit trail).
pub trait CommandStore: Send + Sync {
    fn insert_command(&self, record: CommandRecord) -> Result<(), StoreError>;

    /// Replace a record with its finalized version. Rejects updates to a
    /// record that is already terminal in the store.
    fn update_command(&self, record: CommandRecord) -> Result<(), StoreError>;

    fn get_command(&self, id: Uuid) -> Result<Option<CommandRecord>, StoreError>;

    fn commands_for_order(
        &self,
        external_id: &str,
        kind: Option<CommandKind>,
    ) -> Result<Vec<CommandRecord>, StoreError>;
}

/// Cooldown locks.
pub trait CooldownStore: Send + Sync {
    /// The active (non-expired at `now`) cooldown for the pair, if any.
    fn active_cooldown(
        &self,
        external_id: &str,
        kind: CommandKind,
        now: DateTime<Utc>,
    ) -> Result<Option<Cooldown>, StoreError>;

    /// Write a cooldown, replacing any expired one for the same pair.
    fn put_cooldown(&self, cooldown: Cooldown) -> Result<(), StoreError>;
}

/// User mappings (sender identifiers → panel username).
pub trait MappingStore: Send + Sync {
    /// Resolve a mapping by any of its sender identifiers.
    fn find_mapping(&self, identifier: &str) -> Result<Option<UserMapping>, StoreError>;

    fn upsert_mapping(&self, mapping: UserMapping) -> Result<(), StoreError>;
}

/// Per-reseller security policies.
pub trait PolicyStore: Send + Sync {
    /// The policy for a reseller; created with defaults on first access.
    fn policy_for(&self, user_id: &str) -> Result<SecurityPolicy, StoreError>;

    fn put_policy(&self, user_id: &str, policy: SecurityPolicy) -> Result<(), StoreError>;
}
