//! The order entity: a reseller's purchase on an SMM panel.
//!
//! Orders are created lazily the first time a chat command references them
//! (materialized from the panel's Admin API) and mutated by status refresh
//! and command execution. They are never hard-deleted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle status of an order, mirrored from the upstream panel.
///
/// The panel is the source of truth; the local copy is a cache refreshed
/// before every command. `Other` carries upstream vocabulary this code does
/// not recognize, upper-cased, so downstream logic degrades gracefully
/// instead of failing on an unanticipated status string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Processing,
    InProgress,
    Partial,
    Completed,
    Cancelled,
    Refunded,
    Other(String),
}

impl OrderStatus {
    /// Whether this status permits a refill request.
    pub fn refillable(&self) -> bool {
        matches!(self, OrderStatus::Completed)
    }

    /// Whether this status permits a cancel request.
    pub fn cancellable(&self) -> bool {
        !matches!(
            self,
            OrderStatus::Completed | OrderStatus::Cancelled | OrderStatus::Refunded
        )
    }

    /// Whether this status permits a speed-up request.
    pub fn speedable(&self) -> bool {
        matches!(
            self,
            OrderStatus::Pending | OrderStatus::InProgress | OrderStatus::Processing
        )
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderStatus::Pending => write!(f, "Pending"),
            OrderStatus::Processing => write!(f, "Processing"),
            OrderStatus::InProgress => write!(f, "In progress"),
            OrderStatus::Partial => write!(f, "Partial"),
            OrderStatus::Completed => write!(f, "Completed"),
            OrderStatus::Cancelled => write!(f, "Cancelled"),
            OrderStatus::Refunded => write!(f, "Refunded"),
            OrderStatus::Other(s) => write!(f, "{s}"),
        }
    }
}

/// Provider-layer fields, populated only when the panel's Admin API
/// exposes them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProviderInfo {
    pub name: Option<String>,
    pub order_id: Option<String>,
    pub status: Option<String>,
}

/// A reseller's purchase on a panel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    /// Internal identifier.
    pub internal_id: Uuid,
    /// Panel-assigned identifier (the one users type in chat).
    pub external_id: String,
    /// Owning reseller account.
    pub user_id: String,
    /// The panel this order lives on.
    pub panel_id: String,
    /// Mirrored lifecycle status.
    pub status: OrderStatus,
    /// Service name as reported by the panel (drives the guarantee check).
    pub service_name: Option<String>,
    pub quantity: Option<u64>,
    pub charge: Option<f64>,
    pub start_count: Option<u64>,
    pub remains: Option<u64>,
    /// Provider-layer fields, when the Admin API exposes them.
    pub provider: Option<ProviderInfo>,
    /// The panel's own record of who placed the order. Ground truth for
    /// ownership checks; not every panel exposes it.
    pub customer_username: Option<String>,
    /// Sender identifier that claimed this order.
    pub claimed_by: Option<String>,
    pub claimed_at: Option<DateTime<Utc>>,
    /// Whether the claim was verified (username match or explicit check).
    pub claim_verified: bool,
    pub created_at: DateTime<Utc>,
    /// Set exactly once, the first time status transitions to Completed.
    pub completed_at: Option<DateTime<Utc>>,
}

impl Order {
    /// Create a new order shell for the given external id.
    pub fn new(external_id: impl Into<String>, user_id: impl Into<String>, panel_id: impl Into<String>) -> Self {
        Self {
            internal_id: Uuid::new_v4(),
            external_id: external_id.into(),
            user_id: user_id.into(),
            panel_id: panel_id.into(),
            status: OrderStatus::Pending,
            service_name: None,
            quantity: None,
            charge: None,
            start_count: None,
            remains: None,
            provider: None,
            customer_username: None,
            claimed_by: None,
            claimed_at: None,
            claim_verified: false,
            created_at: Utc::now(),
            completed_at: None,
        }
    }

    /// Apply a refreshed status from the panel.
    ///
    /// Idempotent: re-applying the same status is a no-op apart from the
    /// first Completed transition, which stamps `completed_at` exactly once.
    pub fn apply_status(&mut self, status: OrderStatus) {
        if status == OrderStatus::Completed && self.completed_at.is_none() {
            self.completed_at = Some(Utc::now());
        }
        self.status = status;
    }

    /// Whether this order has been claimed by any sender.
    pub fn is_claimed(&self) -> bool {
        self.claimed_by.is_some()
    }

    /// Whether this order is claimed by the given sender.
    pub fn is_claimed_by(&self, sender: &str) -> bool {
        self.claimed_by.as_deref() == Some(sender)
    }

    /// Record a claim by `sender`. Returns `false` if already claimed by a
    /// different sender (first claim wins); claiming again by the same
    /// sender is an idempotent no-op that returns `true`.
    pub fn claim(&mut self, sender: &str, verified: bool) -> bool {
        match self.claimed_by.as_deref() {
            Some(existing) if existing != sender => false,
            Some(_) => true,
            None => {
                self.claimed_by = Some(sender.to_string());
                self.claimed_at = Some(Utc::now());
                self.claim_verified = verified;
                true
            }
        }
    }
}
