//! Alias tables mapping chat keywords to command kinds.
//!
//! Lookup is case-insensitive. The tables carry the shorthand and
//! Indonesian-market aliases the production deployments see in the wild.

use panelbot_types::CommandKind;

/// Aliases recognized for refill.
pub const REFILL_ALIASES: &[&str] = &["refill", "refil", "rf", "isi", "isiulang", "garansi"];

/// Aliases recognized for cancel.
pub const CANCEL_ALIASES: &[&str] = &["cancel", "cancle", "cncl", "cx", "batal", "batalkan"];

/// Aliases recognized for speed-up.
pub const SPEED_UP_ALIASES: &[&str] = &["speedup", "speed-up", "speed", "sp", "percepat", "gas"];

/// Aliases recognized for status.
pub const STATUS_ALIASES: &[&str] = &["status", "stat", "st", "cek", "check", "ceklah"];

/// Filler tokens skipped by the loose grammar ("status order 123").
pub const FILLER_TOKENS: &[&str] = &["order", "orders", "id", "no", "number", "#", "the", "my"];

/// Resolve a single token to a command kind, case-insensitively.
pub fn lookup_command(token: &str) -> Option<CommandKind> {
    let lower = token.to_lowercase();
    let lower = lower.as_str();
    if REFILL_ALIASES.contains(&lower) {
        Some(CommandKind::Refill)
    } else if CANCEL_ALIASES.contains(&lower) {
        Some(CommandKind::Cancel)
    } else if SPEED_UP_ALIASES.contains(&lower) {
        Some(CommandKind::SpeedUp)
    } else if STATUS_ALIASES.contains(&lower) {
        Some(CommandKind::Status)
    } else {
        None
    }
}

/// Whether the token is a filler word the loose grammar skips.
pub fn is_filler(token: &str) -> bool {
    FILLER_TOKENS.contains(&token.to_lowercase().as_str())
}
