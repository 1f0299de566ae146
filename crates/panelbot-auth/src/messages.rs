//! User-facing denial texts.
//!
//! Every string sent back to chat comes from this fixed table; internal
//! detail (store errors, upstream bodies) stays in the log.

/// Generic apology for internal failures. Deliberately content-free.
pub const INTERNAL_ERROR: &str = "Something went wrong on our side. Please try again in a moment.";

pub fn rate_limited(retry_secs: u64) -> String {
    format!("You're sending commands too quickly. Try again in {retry_secs}s.")
}

pub fn cooldown_active(order_id: &str, remaining_mins: i64) -> String {
    format!(
        "Order {order_id} was just processed. Please wait {remaining_mins} minute(s) before repeating this command."
    )
}

pub fn group_disabled() -> String {
    "Bot commands are turned off for group chats. Send me a direct message instead.".to_string()
}

pub fn group_needs_claimed(order_id: &str) -> String {
    format!("Order {order_id} must be claimed in a direct message before it can be managed from a group.")
}

pub fn bot_disabled() -> String {
    "Bot access for your account is currently disabled.".to_string()
}

pub fn account_suspended(reason: &str) -> String {
    format!("Your account is suspended: {reason}")
}

pub fn not_your_order(order_id: &str) -> String {
    format!("Order {order_id} does not belong to your account.")
}

pub fn claimed_by_other(order_id: &str) -> String {
    format!("Order {order_id} is already managed by another contact.")
}

pub fn must_dm_to_claim(order_id: &str) -> String {
    format!("Please message me directly to claim order {order_id} first.")
}

pub fn claiming_disabled() -> String {
    "Order claiming is disabled. Ask support to link your account.".to_string()
}

pub fn claim_via_email(order_id: &str) -> String {
    format!("Ownership of order {order_id} must be verified by email. Reply with the address on your panel account to start.")
}

pub fn username_must_dm(order_id: &str) -> String {
    format!("Username verification for order {order_id} has to happen in a direct message.")
}
