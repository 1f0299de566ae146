//! The check trait and the chain runner.

use panelbot_store::StoreError;
use tracing::warn;

use crate::checks;
use crate::context::{AuthDeps, AuthRequest, ChainState};
use crate::messages;
use crate::outcome::AuthOutcome;

/// What one check decided.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckResult {
    /// This check has no objection; evaluate the next one.
    Continue,
    /// The chain stops here with this outcome.
    Final(AuthOutcome),
}

/// One link in the authorization chain.
pub trait AuthCheck: Send + Sync {
    /// Name used in denial audit logs.
    fn name(&self) -> &'static str;

    fn evaluate(&self, state: &mut ChainState<'_>) -> Result<CheckResult, StoreError>;
}

/// Ordered, short-circuiting chain of checks.
pub struct AuthChain {
    checks: Vec<Box<dyn AuthCheck>>,
}

impl AuthChain {
    /// The standard chain, in precedence order: staff override, sender
    /// rate limit, command cooldown, group policy, mapping ownership,
    /// claim status, username validation.
    pub fn standard() -> Self {
        Self {
            checks: vec![
                Box::new(checks::StaffOverrideCheck),
                Box::new(checks::SenderRateLimitCheck),
                Box::new(checks::CommandCooldownCheck),
                Box::new(checks::GroupPolicyCheck),
                Box::new(checks::MappingOwnershipCheck),
                Box::new(checks::ClaimStatusCheck),
                Box::new(checks::UsernameValidationCheck),
            ],
        }
    }

    /// A chain with a custom check list (tests, reduced deployments).
    pub fn with_checks(checks: Vec<Box<dyn AuthCheck>>) -> Self {
        Self { checks }
    }

    /// Run the chain. The first non-Continue result wins. A store error
    /// from any check fails closed: the attempt is denied and the error
    /// is logged, never surfaced to chat.
    pub fn authorize(&self, req: AuthRequest<'_>, deps: AuthDeps<'_>) -> AuthOutcome {
        let mut state = ChainState::new(req, deps);

        for check in &self.checks {
            match check.evaluate(&mut state) {
                Ok(CheckResult::Continue) => {}
                Ok(CheckResult::Final(outcome)) => {
                    if let AuthOutcome::Deny { message } = &outcome {
                        warn!(
                            check = check.name(),
                            order = %state.req.order.external_id,
                            sender = %state.req.sender_id,
                            command = %state.req.command,
                            reason = %message,
                            "authorization denied"
                        );
                    }
                    return outcome;
                }
                Err(err) => {
                    warn!(
                        check = check.name(),
                        order = %state.req.order.external_id,
                        sender = %state.req.sender_id,
                        error = %err,
                        "store error during authorization, failing closed"
                    );
                    return AuthOutcome::deny(messages::INTERNAL_ERROR);
                }
            }
        }

        // Every path through the standard chain ends in a Final; reaching
        // here means a custom chain dropped the terminal checks.
        AuthOutcome::deny(messages::INTERNAL_ERROR)
    }
}
