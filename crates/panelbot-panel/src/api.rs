//! The seam the execution engine consumes.

use async_trait::async_trait;
use serde_json::Value;

use panelbot_types::{Order, OrderStatus, Panel, ProviderInfo};

use crate::error::PanelError;
use crate::normalize::normalize_status;

/// A refreshed view of one order as the panel reports it.
#[derive(Debug, Clone)]
pub struct OrderSnapshot {
    pub status: OrderStatus,
    pub charge: Option<f64>,
    pub start_count: Option<u64>,
    pub remains: Option<u64>,
    pub quantity: Option<u64>,
    pub service_name: Option<String>,
    /// The panel's record of who placed the order, when exposed.
    pub customer_username: Option<String>,
    pub provider: Option<ProviderInfo>,
    /// The payload as received, for audit trails and rich rendering.
    pub raw: Value,
}

impl OrderSnapshot {
    /// Build a snapshot from a dialect-unwrapped response payload.
    ///
    /// Panels disagree on field names; each field is read from the first
    /// spelling that is present.
    pub fn from_payload(raw: Value) -> Self {
        let status = str_field(&raw, &["status", "order_status"])
            .map(|s| normalize_status(&s))
            .unwrap_or(OrderStatus::Pending);

        let provider_name = str_field(&raw, &["provider", "provider_name"]);
        let provider_order_id = str_field(&raw, &["provider_order_id", "provider_order"]);
        let provider_status = str_field(&raw, &["provider_status"]);
        let provider = if provider_name.is_some()
            || provider_order_id.is_some()
            || provider_status.is_some()
        {
            Some(ProviderInfo {
                name: provider_name,
                order_id: provider_order_id,
                status: provider_status,
            })
        } else {
            None
        };

        Self {
            status,
            charge: f64_field(&raw, &["charge", "cost", "price"]),
            start_count: u64_field(&raw, &["start_count", "startcount"]),
            remains: u64_field(&raw, &["remains", "remaining"]),
            quantity: u64_field(&raw, &["quantity", "count"]),
            service_name: str_field(&raw, &["service", "service_name"]),
            customer_username: str_field(&raw, &["username", "user", "customer", "customer_username"]),
            provider,
            raw,
        }
    }

    /// Fold this snapshot into a locally cached order.
    pub fn apply_to(&self, order: &mut Order) {
        order.apply_status(self.status.clone());
        if self.charge.is_some() {
            order.charge = self.charge;
        }
        if self.start_count.is_some() {
            order.start_count = self.start_count;
        }
        if self.remains.is_some() {
            order.remains = self.remains;
        }
        if self.quantity.is_some() {
            order.quantity = self.quantity;
        }
        if self.service_name.is_some() {
            order.service_name = self.service_name.clone();
        }
        if self.customer_username.is_some() {
            order.customer_username = self.customer_username.clone();
        }
        if self.provider.is_some() {
            order.provider = self.provider.clone();
        }
    }
}

fn str_field(value: &Value, names: &[&str]) -> Option<String> {
    names.iter().find_map(|n| {
        value.get(n).and_then(|v| match v {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Number(num) => Some(num.to_string()),
            _ => None,
        })
    })
}

fn f64_field(value: &Value, names: &[&str]) -> Option<f64> {
    names.iter().find_map(|n| {
        value.get(n).and_then(|v| match v {
            Value::Number(num) => num.as_f64(),
            Value::String(s) => s.parse().ok(),
            _ => None,
        })
    })
}

fn u64_field(value: &Value, names: &[&str]) -> Option<u64> {
    names.iter().find_map(|n| {
        value.get(n).and_then(|v| match v {
            Value::Number(num) => num.as_u64(),
            Value::String(s) => s.parse().ok(),
            _ => None,
        })
    })
}

/// Panel operations the execution engine depends on.
///
/// [`crate::client::PanelClient`] is the production implementation; tests
/// substitute mocks to count calls and script failures.
#[async_trait]
pub trait PanelApi: Send + Sync {
    /// Fetch a refreshed snapshot of one order.
    async fn order_status(
        &self,
        panel: &Panel,
        external_id: &str,
    ) -> Result<OrderSnapshot, PanelError>;

    /// Submit a refill for one order. Returns the raw upstream response.
    async fn refill(&self, panel: &Panel, external_id: &str) -> Result<Value, PanelError>;

    /// Submit a cancel for one order.
    async fn cancel(&self, panel: &Panel, external_id: &str) -> Result<Value, PanelError>;

    /// Submit a speed-up for one order.
    async fn speed_up(&self, panel: &Panel, external_id: &str) -> Result<Value, PanelError>;

    /// Read the account balance (also the canonical cheap probe).
    async fn balance(&self, panel: &Panel) -> Result<f64, PanelError>;
}
