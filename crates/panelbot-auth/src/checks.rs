//! The individual authorization checks, in chain order.

use std::time::Duration;

use chrono::Utc;
use subtle::ConstantTimeEq;
use tracing::warn;

use panelbot_store::StoreError;
use panelbot_types::{GroupSecurityMode, OrderClaimMode, UsernameValidationMode};

use crate::chain::{AuthCheck, CheckResult};
use crate::context::ChainState;
use crate::messages;
use crate::outcome::AuthOutcome;

fn final_deny(message: String) -> Result<CheckResult, StoreError> {
    Ok(CheckResult::Final(AuthOutcome::Deny { message }))
}

// ---------------------------------------------------------------------------
// 1. Staff override
// ---------------------------------------------------------------------------

/// Members of a configured staff group bypass everything. Staff must be
/// able to act on any order from within an internal operations chat.
pub struct StaffOverrideCheck;

impl AuthCheck for StaffOverrideCheck {
    fn name(&self) -> &'static str {
        "staff_override"
    }

    fn evaluate(&self, state: &mut ChainState<'_>) -> Result<CheckResult, StoreError> {
        if state.req.staff_override {
            return Ok(CheckResult::Final(AuthOutcome::allow()));
        }

        if let Some(group_id) = state.req.group_id {
            if is_staff_group(group_id, &state.req.policy.staff_group_ids) {
                return Ok(CheckResult::Final(AuthOutcome::allow()));
            }
        }

        Ok(CheckResult::Continue)
    }
}

/// Constant-time membership test. All entries are compared so timing
/// reveals neither which staff group matched nor how many exist.
fn is_staff_group(group_id: &str, staff_ids: &[String]) -> bool {
    let id_bytes = group_id.as_bytes();
    let mut found = false;
    for staff_id in staff_ids {
        let staff_bytes = staff_id.as_bytes();
        if id_bytes.len() == staff_bytes.len() && bool::from(id_bytes.ct_eq(staff_bytes)) {
            found = true;
        }
    }
    found
}

// ---------------------------------------------------------------------------
// 2. Sender rate limit
// ---------------------------------------------------------------------------

/// Sliding one-minute window per sender, limit from the policy.
pub struct SenderRateLimitCheck;

impl AuthCheck for SenderRateLimitCheck {
    fn name(&self) -> &'static str {
        "sender_rate_limit"
    }

    fn evaluate(&self, state: &mut ChainState<'_>) -> Result<CheckResult, StoreError> {
        let limit = state.req.policy.max_commands_per_minute;
        match state.deps.limiter.try_acquire(
            state.req.sender_id,
            limit,
            Duration::from_secs(60),
        ) {
            Ok(()) => Ok(CheckResult::Continue),
            Err(retry_after) => final_deny(messages::rate_limited(retry_after.as_secs().max(1))),
        }
    }
}

// ---------------------------------------------------------------------------
// 3. Command cooldown
// ---------------------------------------------------------------------------

/// An unexpired cooldown for (order, command) denies regardless of sender:
/// the action was just processed and repeating it would duplicate it.
pub struct CommandCooldownCheck;

impl AuthCheck for CommandCooldownCheck {
    fn name(&self) -> &'static str {
        "command_cooldown"
    }

    fn evaluate(&self, state: &mut ChainState<'_>) -> Result<CheckResult, StoreError> {
        let now = Utc::now();
        let active = state.deps.cooldowns.active_cooldown(
            &state.req.order.external_id,
            state.req.command,
            now,
        )?;

        match active {
            None => Ok(CheckResult::Continue),
            Some(cd) => {
                let remaining_mins = cd
                    .remaining(now)
                    .map(|d| (d.num_seconds() + 59) / 60)
                    .unwrap_or(1);
                final_deny(messages::cooldown_active(
                    &state.req.order.external_id,
                    remaining_mins,
                ))
            }
        }
    }
}

// ---------------------------------------------------------------------------
// 4. Group policy
// ---------------------------------------------------------------------------

pub struct GroupPolicyCheck;

impl AuthCheck for GroupPolicyCheck {
    fn name(&self) -> &'static str {
        "group_policy"
    }

    fn evaluate(&self, state: &mut ChainState<'_>) -> Result<CheckResult, StoreError> {
        if !state.req.is_group {
            return Ok(CheckResult::Continue);
        }

        match state.req.policy.group_security_mode {
            GroupSecurityMode::Disabled => final_deny(messages::group_disabled()),
            GroupSecurityMode::Verified if !state.req.order.is_claimed() => {
                final_deny(messages::group_needs_claimed(&state.req.order.external_id))
            }
            _ => Ok(CheckResult::Continue),
        }
    }
}

// ---------------------------------------------------------------------------
// 5. Ownership via registered mapping
// ---------------------------------------------------------------------------

/// Resolve a mapping by sender identifier (group identifier as fallback)
/// and compare its username against the order's customer-username.
///
/// A store error here propagates and the runner fails closed: ownership is
/// never granted on ambiguous evidence. A *missing* customer-username on
/// the order falls through to the claim checks instead - blocking a
/// registered user on data the panel never provided is worse than letting
/// the claim path gate them.
pub struct MappingOwnershipCheck;

impl AuthCheck for MappingOwnershipCheck {
    fn name(&self) -> &'static str {
        "mapping_ownership"
    }

    fn evaluate(&self, state: &mut ChainState<'_>) -> Result<CheckResult, StoreError> {
        if !state.req.policy.mapping_ownership_enabled {
            return Ok(CheckResult::Continue);
        }

        let mapping = match state.deps.mappings.find_mapping(state.req.sender_id)? {
            Some(m) => Some(m),
            None => match state.req.group_id {
                Some(gid) => state.deps.mappings.find_mapping(gid)?,
                None => None,
            },
        };

        let mut mapping = match mapping {
            Some(m) => m,
            None => {
                // No DM-triggered registration from inside a group.
                if state.req.is_group {
                    return final_deny(messages::must_dm_to_claim(&state.req.order.external_id));
                }
                return Ok(CheckResult::Final(AuthOutcome::NeedsRegistration));
            }
        };

        if mapping.suspended {
            let reason = mapping
                .suspended_reason
                .clone()
                .unwrap_or_else(|| "policy violation".into());
            return final_deny(messages::account_suspended(&reason));
        }
        if !mapping.bot_enabled {
            return final_deny(messages::bot_disabled());
        }

        match state.req.order.customer_username.as_deref() {
            Some(owner) if owner.eq_ignore_ascii_case(&mapping.panel_username) => {
                mapping.touch();
                state.deps.mappings.upsert_mapping(mapping)?;
                Ok(CheckResult::Final(AuthOutcome::Allow {
                    should_claim: !state.req.order.is_claimed(),
                    fallback: false,
                }))
            }
            Some(_) => {
                // Strike bookkeeping feeds auto-suspension; a failure to
                // record it must not turn the deny into anything else.
                mapping.record_strike();
                if let Err(err) = state.deps.mappings.upsert_mapping(mapping) {
                    warn!(sender = %state.req.sender_id, error = %err, "failed to record ownership strike");
                }
                final_deny(messages::not_your_order(&state.req.order.external_id))
            }
            None => {
                state.mapping_fallback = true;
                Ok(CheckResult::Continue)
            }
        }
    }
}

// ---------------------------------------------------------------------------
// 6. Claim status
// ---------------------------------------------------------------------------

/// Reached only when the mapping did not resolve ownership.
pub struct ClaimStatusCheck;

impl AuthCheck for ClaimStatusCheck {
    fn name(&self) -> &'static str {
        "claim_status"
    }

    fn evaluate(&self, state: &mut ChainState<'_>) -> Result<CheckResult, StoreError> {
        let order = state.req.order;

        if let Some(owner) = order.claimed_by.as_deref() {
            return if owner == state.req.sender_id {
                Ok(CheckResult::Final(AuthOutcome::Allow {
                    should_claim: false,
                    fallback: state.mapping_fallback,
                }))
            } else {
                final_deny(messages::claimed_by_other(&order.external_id))
            };
        }

        // Unclaimed orders can only be claimed over DM.
        if state.req.is_group {
            return final_deny(messages::must_dm_to_claim(&order.external_id));
        }

        match state.req.policy.order_claim_mode {
            OrderClaimMode::Disabled => final_deny(messages::claiming_disabled()),
            OrderClaimMode::Email => final_deny(messages::claim_via_email(&order.external_id)),
            OrderClaimMode::Auto => {
                if state.req.policy.username_validation_mode == UsernameValidationMode::Disabled {
                    Ok(CheckResult::Final(AuthOutcome::Allow {
                        should_claim: true,
                        fallback: state.mapping_fallback,
                    }))
                } else {
                    // Username validation gates the first claim.
                    Ok(CheckResult::Continue)
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// 7. Username validation
// ---------------------------------------------------------------------------

/// `Ask`/`Strict` modes require the sender to supply the panel username
/// once per order before the first claim. Group context can never satisfy
/// this (the claim check already denies unclaimed group attempts).
pub struct UsernameValidationCheck;

impl AuthCheck for UsernameValidationCheck {
    fn name(&self) -> &'static str {
        "username_validation"
    }

    fn evaluate(&self, state: &mut ChainState<'_>) -> Result<CheckResult, StoreError> {
        let expected = state.req.order.customer_username.clone();

        let expected = match expected {
            // Nothing to validate against; the fail-open fallback applies.
            None => {
                state.mapping_fallback = true;
                return Ok(CheckResult::Final(AuthOutcome::Allow {
                    should_claim: true,
                    fallback: true,
                }));
            }
            Some(e) => e,
        };

        match state.req.supplied_username {
            Some(supplied) if supplied.eq_ignore_ascii_case(&expected) => {
                Ok(CheckResult::Final(AuthOutcome::Allow {
                    should_claim: true,
                    fallback: state.mapping_fallback,
                }))
            }
            Some(_) if state.req.policy.username_validation_mode == UsernameValidationMode::Strict => {
                final_deny(messages::not_your_order(&state.req.order.external_id))
            }
            // Ask mode retries; nothing supplied yet asks in both modes.
            _ => Ok(CheckResult::Final(AuthOutcome::NeedsUsernameVerification {
                expected_username: Some(expected),
            })),
        }
    }
}
