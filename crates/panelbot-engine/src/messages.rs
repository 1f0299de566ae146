//! User-facing reply texts for execution outcomes.
//!
//! The fixed, sanitized table: upstream error bodies and store failures
//! are logged elsewhere and never quoted here.

use panelbot_panel::ErrorKind;
use panelbot_types::{CommandKind, Order, OrderStatus};

pub fn refill_submitted(order_id: &str) -> String {
    format!("✅ Refill submitted for order {order_id}.")
}

pub fn cancel_submitted(order_id: &str) -> String {
    format!("✅ Cancel submitted for order {order_id}.")
}

pub fn speed_up_submitted(order_id: &str) -> String {
    format!("✅ Speed-up submitted for order {order_id}.")
}

pub fn submitted(kind: CommandKind, order_id: &str) -> String {
    match kind {
        CommandKind::Refill => refill_submitted(order_id),
        CommandKind::Cancel => cancel_submitted(order_id),
        CommandKind::SpeedUp => speed_up_submitted(order_id),
        CommandKind::Status => format!("Order {order_id} status refreshed."),
    }
}

pub fn forwarded(kind: CommandKind, order_id: &str) -> String {
    format!("📨 Your {kind} request for order {order_id} has been forwarded to an operator.")
}

pub fn status_line(order: &Order) -> String {
    let mut line = format!("Order {}: {}", order.external_id, order.status);
    if let Some(remains) = order.remains {
        line.push_str(&format!(" · remains {remains}"));
    }
    if let Some(start) = order.start_count {
        line.push_str(&format!(" · start count {start}"));
    }
    line
}

pub fn order_not_found(order_id: &str) -> String {
    format!("Order {order_id} was not found on any of your panels.")
}

pub fn wrong_status_for_refill(order_id: &str, status: &OrderStatus) -> String {
    format!("Order {order_id} can only be refilled once completed (current status: {status}).")
}

pub fn wrong_status_for_cancel(order_id: &str, status: &OrderStatus) -> String {
    format!("Order {order_id} can no longer be cancelled (current status: {status}).")
}

pub fn wrong_status_for_speed_up(order_id: &str, status: &OrderStatus) -> String {
    format!("Order {order_id} is not in a state that can be sped up (current status: {status}).")
}

pub fn no_guarantee(order_id: &str) -> String {
    format!("Order {order_id} is for a service without a refill guarantee.")
}

pub fn guarantee_expired(order_id: &str, window_days: i64) -> String {
    format!("The {window_days}-day refill window for order {order_id} has expired.")
}

pub fn command_disabled(kind: CommandKind) -> String {
    format!("The {kind} command is disabled by your administrator.")
}

pub fn registration_prompt() -> String {
    "You're not registered yet. Reply with your panel username to link this number.".to_string()
}

pub fn username_prompt(order_id: &str) -> String {
    format!("To verify ownership of order {order_id}, reply with the panel username that placed it.")
}

pub fn operator_unavailable() -> String {
    "No operator is available to take this request right now. Try again later.".to_string()
}

pub fn internal_error() -> String {
    panelbot_auth::messages::INTERNAL_ERROR.to_string()
}

/// Canned phrase for a classified upstream failure.
pub fn upstream_error(kind: ErrorKind, order_id: &str) -> String {
    match kind {
        ErrorKind::Unauthorized => {
            "The panel rejected our credentials. Staff have been notified.".to_string()
        }
        ErrorKind::RateLimited => "The panel is busy right now. Try again in a minute.".to_string(),
        ErrorKind::NotFound => format!("The panel has no record of order {order_id}."),
        ErrorKind::Connection => "The panel is unreachable right now. Try again later.".to_string(),
        ErrorKind::Api => "The panel could not process this request.".to_string(),
    }
}
