//! Inputs and shared state for one chain evaluation.

use panelbot_store::{CooldownStore, MappingStore, RateLimiter};
use panelbot_types::{CommandKind, Order, SecurityPolicy};

/// Everything known about the attempt being authorized.
#[derive(Clone, Copy)]
pub struct AuthRequest<'a> {
    pub order: &'a Order,
    pub sender_id: &'a str,
    pub is_group: bool,
    pub group_id: Option<&'a str>,
    pub command: CommandKind,
    pub policy: &'a SecurityPolicy,
    /// Set by the caller when the sender was already established as staff
    /// (e.g. the message arrived through an internal operations channel).
    pub staff_override: bool,
    /// Panel username supplied by the sender for username validation,
    /// if the pending-conversation flow already collected one.
    pub supplied_username: Option<&'a str>,
}

/// Injected collaborators the checks read from.
#[derive(Clone, Copy)]
pub struct AuthDeps<'a> {
    pub mappings: &'a dyn MappingStore,
    pub cooldowns: &'a dyn CooldownStore,
    pub limiter: &'a dyn RateLimiter,
}

/// Mutable state threaded through the chain.
pub struct ChainState<'a> {
    pub req: AuthRequest<'a>,
    pub deps: AuthDeps<'a>,
    /// Set by the mapping check when a mapping exists but the order's
    /// customer-username is unavailable: later checks run, and an eventual
    /// Allow is flagged as fallback.
    pub mapping_fallback: bool,
}

impl<'a> ChainState<'a> {
    pub fn new(req: AuthRequest<'a>, deps: AuthDeps<'a>) -> Self {
        Self {
            req,
            deps,
            mapping_fallback: false,
        }
    }
}
