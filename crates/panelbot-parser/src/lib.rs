//! Free-text command parsing.
//!
//! Pure functions: same input always yields the same output, no I/O.
//! [`parse`] extracts an order-command intent and a list of order ids;
//! [`user_command::parse_user_command`] handles stand-alone commands
//! (verify/account/ticket) that carry no order ids and are routed before
//! the order pipeline runs.

pub mod aliases;
pub mod parse;
pub mod user_command;

pub use parse::{looks_like_command, parse, ParseError, ParsedCommand};
pub use user_command::{parse_user_command, UserCommand};
