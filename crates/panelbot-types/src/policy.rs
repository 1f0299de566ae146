//! Per-reseller security policy configuration.
//!
//! Created with defaults on first access, mutated by an administrator,
//! read on every authorization check. Unknown mode strings in config fail
//! closed to the most restrictive interpretation at the deserialization
//! layer (serde rejects them outright).

use serde::{Deserialize, Serialize};

use crate::command::CommandKind;

/// How order claiming works for unregistered ownership paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderClaimMode {
    /// Claiming is off; only mapping ownership can authorize.
    Disabled,
    /// First DM sender to reference an unclaimed order claims it.
    Auto,
    /// Claims go through the out-of-band email verification flow.
    Email,
}

/// Policy for commands arriving from group chats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupSecurityMode {
    /// No extra restriction on groups.
    None,
    /// Groups may only act on orders that are already claimed.
    Verified,
    /// Group commands are rejected outright.
    Disabled,
}

/// Whether senders must supply the panel username before first claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UsernameValidationMode {
    Disabled,
    /// Ask once per order; a wrong answer can be retried.
    Ask,
    /// Require a correct answer; mismatch denies.
    Strict,
}

/// Per-command execution strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionMode {
    /// Call the panel API directly.
    Auto,
    /// Hand off to a human operator only.
    Forward,
    /// Call the panel API, then forward regardless of its outcome.
    Both,
    /// The command is rejected immediately.
    Disabled,
}

/// Security policy for one reseller account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityPolicy {
    pub order_claim_mode: OrderClaimMode,
    pub group_security_mode: GroupSecurityMode,
    pub username_validation_mode: UsernameValidationMode,
    /// Whether ownership is resolved through registered mappings (on by
    /// default). Off routes everything through the claim/validation path.
    pub mapping_ownership_enabled: bool,
    /// Sliding one-minute window per sender.
    pub max_commands_per_minute: u32,
    /// Cooldown applied after each successful mutating command.
    pub command_cooldown_secs: u64,
    pub refill_mode: ActionMode,
    pub cancel_mode: ActionMode,
    pub speed_up_mode: ActionMode,
    /// Group identifiers whose members bypass all checks.
    pub staff_group_ids: Vec<String>,
}

impl SecurityPolicy {
    /// Action mode configured for a mutating command.
    ///
    /// Status has no action mode: it is read-only and always allowed.
    pub fn action_mode(&self, kind: CommandKind) -> ActionMode {
        match kind {
            CommandKind::Refill => self.refill_mode,
            CommandKind::Cancel => self.cancel_mode,
            CommandKind::SpeedUp => self.speed_up_mode,
            CommandKind::Status => ActionMode::Auto,
        }
    }
}

impl Default for SecurityPolicy {
    fn default() -> Self {
        Self {
            order_claim_mode: OrderClaimMode::Auto,
            group_security_mode: GroupSecurityMode::Verified,
            username_validation_mode: UsernameValidationMode::Disabled,
            mapping_ownership_enabled: true,
            max_commands_per_minute: 10,
            command_cooldown_secs: 300,
            refill_mode: ActionMode::Auto,
            cancel_mode: ActionMode::Auto,
            speed_up_mode: ActionMode::Forward,
            staff_group_ids: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let p = SecurityPolicy::default();
        assert_eq!(p.order_claim_mode, OrderClaimMode::Auto);
        assert_eq!(p.max_commands_per_minute, 10);
        assert_eq!(p.command_cooldown_secs, 300);
        assert_eq!(p.action_mode(CommandKind::Refill), ActionMode::Auto);
        assert_eq!(p.action_mode(CommandKind::SpeedUp), ActionMode::Forward);
        assert_eq!(p.action_mode(CommandKind::Status), ActionMode::Auto);
    }

    #[test]
    fn toml_round_trip_with_partial_fields() {
        let toml_src = r#"
            order_claim_mode = "email"
            group_security_mode = "disabled"
            max_commands_per_minute = 5
        "#;
        let p: SecurityPolicy = toml::from_str(toml_src).unwrap();
        assert_eq!(p.order_claim_mode, OrderClaimMode::Email);
        assert_eq!(p.group_security_mode, GroupSecurityMode::Disabled);
        assert_eq!(p.max_commands_per_minute, 5);
        // Unspecified fields fall back to defaults.
        assert_eq!(p.command_cooldown_secs, 300);
    }

    #[test]
    fn unknown_mode_string_is_rejected() {
        let toml_src = r#"order_claim_mode = "yolo""#;
        assert!(toml::from_str::<SecurityPolicy>(toml_src).is_err());
    }
}
