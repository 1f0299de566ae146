//! Command kinds and the per-attempt audit record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// The four order commands recognized by the parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandKind {
    Refill,
    Cancel,
    SpeedUp,
    Status,
}

impl CommandKind {
    /// Whether this command mutates the order on the upstream panel.
    /// Status is read-only: it never creates a command record or cooldown.
    pub fn is_mutating(&self) -> bool {
        !matches!(self, CommandKind::Status)
    }

    /// Lowercase label used in store keys and log fields.
    pub fn as_str(&self) -> &'static str {
        match self {
            CommandKind::Refill => "refill",
            CommandKind::Cancel => "cancel",
            CommandKind::SpeedUp => "speedup",
            CommandKind::Status => "status",
        }
    }
}

impl std::fmt::Display for CommandKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle of a command record: `Processing` then exactly one terminal
/// transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandStatus {
    Processing,
    Success,
    Failed,
}

impl CommandStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, CommandStatus::Processing)
    }
}

/// Attempting to finalize a record that is already terminal.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("command record {id} is already terminal ({status:?})")]
pub struct AlreadyTerminal {
    pub id: Uuid,
    pub status: CommandStatus,
}

/// One row per attempted mutating action. The audit trail and the basis
/// for cooldown computation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandRecord {
    pub id: Uuid,
    pub order_external_id: String,
    pub kind: CommandKind,
    pub status: CommandStatus,
    /// Sender identifier that requested the command.
    pub requested_by: String,
    /// Raw upstream response payload, attached on finalization.
    pub response: Option<serde_json::Value>,
    /// Error text, attached on failure.
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl CommandRecord {
    /// Open a new record in `Processing` state.
    pub fn open(
        order_external_id: impl Into<String>,
        kind: CommandKind,
        requested_by: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            order_external_id: order_external_id.into(),
            kind,
            status: CommandStatus::Processing,
            requested_by: requested_by.into(),
            response: None,
            error: None,
            created_at: Utc::now(),
            finished_at: None,
        }
    }

    /// Finalize as success with the raw upstream response attached.
    ///
    /// A record's terminal status is write-once; finalizing twice is an
    /// error, never a silent overwrite.
    pub fn succeed(&mut self, response: serde_json::Value) -> Result<(), AlreadyTerminal> {
        self.finalize(CommandStatus::Success, Some(response), None)
    }

    /// Finalize as failed with the error text attached.
    pub fn fail(&mut self, error: impl Into<String>) -> Result<(), AlreadyTerminal> {
        self.finalize(CommandStatus::Failed, None, Some(error.into()))
    }

    fn finalize(
        &mut self,
        status: CommandStatus,
        response: Option<serde_json::Value>,
        error: Option<String>,
    ) -> Result<(), AlreadyTerminal> {
        if self.status.is_terminal() {
            return Err(AlreadyTerminal {
                id: self.id,
                status: self.status,
            });
        }
        self.status = status;
        self.response = response;
        self.error = error;
        self.finished_at = Some(Utc::now());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn record_opens_processing() {
        let rec = CommandRecord::open("12345", CommandKind::Refill, "628111");
        assert_eq!(rec.status, CommandStatus::Processing);
        assert!(rec.finished_at.is_none());
    }

    #[test]
    fn terminal_status_is_write_once() {
        let mut rec = CommandRecord::open("12345", CommandKind::Cancel, "628111");
        rec.succeed(json!({"status": "ok"})).unwrap();
        assert_eq!(rec.status, CommandStatus::Success);
        assert!(rec.finished_at.is_some());

        let err = rec.fail("late failure").unwrap_err();
        assert_eq!(err.status, CommandStatus::Success);
        // The record is untouched by the rejected transition.
        assert_eq!(rec.status, CommandStatus::Success);
        assert!(rec.error.is_none());
    }

    #[test]
    fn failed_record_keeps_error_text() {
        let mut rec = CommandRecord::open("12345", CommandKind::SpeedUp, "628111");
        rec.fail("panel unreachable").unwrap();
        assert_eq!(rec.status, CommandStatus::Failed);
        assert_eq!(rec.error.as_deref(), Some("panel unreachable"));
        assert!(rec.succeed(json!({})).is_err());
    }

    #[test]
    fn status_command_is_read_only() {
        assert!(!CommandKind::Status.is_mutating());
        assert!(CommandKind::Refill.is_mutating());
        assert!(CommandKind::Cancel.is_mutating());
        assert!(CommandKind::SpeedUp.is_mutating());
    }
}
