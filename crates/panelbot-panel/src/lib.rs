//! Dual-dialect SMM panel Admin API client.
//!
//! Panel deployments speak one of two incompatible API conventions; this
//! crate hides the difference behind [`PanelClient`] and the [`PanelApi`]
//! seam trait the execution engine consumes. The client's job is to
//! tolerate deployment variance - dialect probing, endpoint fallback
//! chains, status vocabulary normalization - not to standardize it.

pub mod api;
pub mod client;
pub mod dialect;
pub mod endpoints;
pub mod error;
pub mod normalize;
pub mod ratelimit;

pub use api::{OrderSnapshot, PanelApi};
pub use client::{ClientOptions, PanelClient};
pub use dialect::{dialect_for, ActionDialect, PanelDialect, RestDialect};
pub use endpoints::{candidates, Candidate, Operation};
pub use error::{ErrorKind, PanelError};
pub use normalize::normalize_status;
pub use ratelimit::PanelThrottle;
