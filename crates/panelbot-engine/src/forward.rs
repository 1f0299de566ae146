//! Hand-off to a human operator.
//!
//! The operator channel itself (an internal chat, a ticket queue) lives
//! outside this workspace; the engine only needs this seam.

use async_trait::async_trait;
use thiserror::Error;

use panelbot_types::{CommandKind, Order};

#[derive(Debug, Error)]
pub enum ForwardError {
    #[error("no operator channel configured")]
    NotConfigured,

    #[error("operator channel failed: {0}")]
    Channel(String),
}

/// What the operator needs to act on a forwarded command.
#[derive(Debug, Clone)]
pub struct ForwardRequest {
    pub order_external_id: String,
    pub panel_id: String,
    pub kind: CommandKind,
    pub requested_by: String,
    /// Status and service context at the moment of forwarding.
    pub summary: String,
}

impl ForwardRequest {
    pub fn for_order(order: &Order, kind: CommandKind, requested_by: &str) -> Self {
        let service = order.service_name.as_deref().unwrap_or("unknown service");
        Self {
            order_external_id: order.external_id.clone(),
            panel_id: order.panel_id.clone(),
            kind,
            requested_by: requested_by.to_string(),
            summary: format!(
                "{} requested for order {} ({}, status {})",
                kind, order.external_id, service, order.status
            ),
        }
    }
}

/// Collaborator that delivers a command to a human operator.
#[async_trait]
pub trait OperatorForwarder: Send + Sync {
    async fn forward(&self, request: ForwardRequest) -> Result<(), ForwardError>;
}
