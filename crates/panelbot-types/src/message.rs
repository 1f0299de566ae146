//! Chat-transport interface types.
//!
//! The transports themselves (WhatsApp/Telegram adapters) live outside this
//! workspace; the pipeline only needs "text + sender id + group flag" in
//! and "text to deliver verbatim" out.

use serde::{Deserialize, Serialize};

/// The chat platform a message arrived from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    Whatsapp,
    Telegram,
}

/// An inbound chat message handed to the pipeline entry point.
#[derive(Debug, Clone)]
pub struct InboundMessage {
    pub sender_id: String,
    pub text: String,
    pub is_group: bool,
    pub group_id: Option<String>,
    pub platform: Platform,
}

impl InboundMessage {
    /// A direct message (non-group) from `sender_id`.
    pub fn dm(sender_id: impl Into<String>, text: impl Into<String>, platform: Platform) -> Self {
        Self {
            sender_id: sender_id.into(),
            text: text.into(),
            is_group: false,
            group_id: None,
            platform,
        }
    }

    /// A message from a group chat.
    pub fn group(
        sender_id: impl Into<String>,
        group_id: impl Into<String>,
        text: impl Into<String>,
        platform: Platform,
    ) -> Self {
        Self {
            sender_id: sender_id.into(),
            text: text.into(),
            is_group: true,
            group_id: Some(group_id.into()),
            platform,
        }
    }
}

/// Why a per-order attempt needs input the pipeline cannot supply itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingInput {
    /// The sender must register a mapping first (DM flow).
    Registration,
    /// The sender must supply the panel username for this order.
    UsernameVerification { expected_username: Option<String> },
}

/// Outcome of processing one order id within a message.
#[derive(Debug, Clone)]
pub struct OrderOutcome {
    pub order_id: String,
    pub success: bool,
    /// User-facing line for the aggregated report.
    pub message: String,
    /// Raw panel snapshot or response detail for richer rendering.
    pub details: Option<serde_json::Value>,
    /// Set when processing stopped awaiting out-of-band input.
    pub pending: Option<PendingInput>,
}

impl OrderOutcome {
    pub fn ok(order_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            order_id: order_id.into(),
            success: true,
            message: message.into(),
            details: None,
            pending: None,
        }
    }

    pub fn failed(order_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            order_id: order_id.into(),
            success: false,
            message: message.into(),
            details: None,
            pending: None,
        }
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    pub fn with_pending(mut self, pending: PendingInput) -> Self {
        self.pending = Some(pending);
        self
    }
}

/// The pipeline's reply for the transport to deliver verbatim.
#[derive(Debug, Clone)]
pub struct PipelineReply {
    pub success: bool,
    pub text: String,
    pub results: Vec<OrderOutcome>,
}

impl PipelineReply {
    pub fn text_only(success: bool, text: impl Into<String>) -> Self {
        Self {
            success,
            text: text.into(),
            results: Vec::new(),
        }
    }
}
