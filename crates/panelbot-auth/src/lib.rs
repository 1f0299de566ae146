//! The authorization chain.
//!
//! Given an order, a sender, and the reseller's security policy, decides
//! whether a command may run - and if not, which sub-flow (registration,
//! username verification) must happen first. Modeled as an ordered list of
//! checkers sharing one `evaluate` contract; the runner stops at the first
//! non-Continue result, which keeps the precedence explicit and each check
//! independently testable.
//!
//! Denials are values, not errors: they carry the user-facing reason and
//! flow back through the same channel as Allow. Internal store failures
//! during evaluation fail closed - ownership is never granted on
//! ambiguous evidence.

pub mod chain;
pub mod checks;
pub mod context;
pub mod messages;
pub mod outcome;

pub use chain::{AuthChain, AuthCheck, CheckResult};
pub use context::{AuthDeps, AuthRequest, ChainState};
pub use outcome::AuthOutcome;
