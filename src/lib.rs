//! Panelbot: chat-command pipeline for managing SMM panel orders.
//!
//! Re-exports the workspace crates under one roof:
//!
//! - [`types`]: domain entities and configuration
//! - [`parser`]: free-text command parsing
//! - [`store`]: storage collaborator traits and in-memory backends
//! - [`panel`]: dual-dialect panel Admin API client
//! - [`auth`]: the ordered authorization chain
//! - [`engine`]: execution engine, bulk orchestrator, pipeline entry point

pub use panelbot_auth as auth;
pub use panelbot_engine as engine;
pub use panelbot_panel as panel;
pub use panelbot_parser as parser;
pub use panelbot_store as store;
pub use panelbot_types as types;
