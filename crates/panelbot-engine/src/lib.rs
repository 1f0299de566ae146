//! The command execution engine.
//!
//! Orchestrates the full path from an inbound chat message to audited
//! panel actions: parse, resolve and refresh orders, authorize, enforce
//! preconditions, branch on action modes, and aggregate bulk results into
//! one report. Collaborators outside this workspace's scope (human
//! operator forwarding, refill guarantees beyond the keyword default) are
//! trait seams.

pub mod executor;
pub mod forward;
pub mod guarantee;
pub mod messages;
pub mod pipeline;
pub mod report;

pub use executor::{ExecRequest, Executor, Stores};
pub use forward::{ForwardError, ForwardRequest, OperatorForwarder};
pub use guarantee::{GuaranteeCheck, GuaranteeVerdict, KeywordGuarantee};
pub use pipeline::Pipeline;
pub use report::{format_report, MAX_FAILURE_LINES, MAX_SUCCESS_LINES};
