//! The pipeline entry point: inbound chat message in, reply out.
//!
//! Stand-alone user commands (verify/account/ticket) are routed before the
//! order pipeline. Order messages fan out to the executor one id at a
//! time - sequential on purpose, to respect the per-panel throttle and
//! keep record writes race-free. One order's failure never aborts the
//! rest of the batch.

use tracing::debug;

use panelbot_parser::{looks_like_command, parse, parse_user_command, UserCommand};
use panelbot_types::{InboundMessage, OrderOutcome, PipelineReply};

use crate::executor::{ExecRequest, Executor};
use crate::messages;
use crate::report::format_report;

pub struct Pipeline {
    executor: Executor,
    /// The reseller account this deployment serves.
    reseller_id: String,
}

impl Pipeline {
    pub fn new(executor: Executor, reseller_id: impl Into<String>) -> Self {
        Self {
            executor,
            reseller_id: reseller_id.into(),
        }
    }

    /// Process one inbound message. Returns `None` when the text does not
    /// look like anything addressed to the bot (the transport stays
    /// silent); `Some` replies are delivered verbatim.
    pub async fn handle_message(&self, msg: &InboundMessage) -> Option<PipelineReply> {
        if let Some(cmd) = parse_user_command(&msg.text) {
            return Some(self.handle_user_command(msg, cmd));
        }

        if !looks_like_command(&msg.text) {
            return None;
        }

        let parsed = match parse(&msg.text) {
            Ok(parsed) => parsed,
            // Malformed input is a user-facing reply, not an incident.
            Err(err) => return Some(PipelineReply::text_only(false, err.to_string())),
        };

        debug!(
            sender = %msg.sender_id,
            command = %parsed.kind,
            orders = parsed.order_ids.len(),
            "processing order command"
        );

        let mut results: Vec<OrderOutcome> = Vec::with_capacity(parsed.order_ids.len());
        for order_id in &parsed.order_ids {
            let req = ExecRequest {
                order_id: order_id.clone(),
                kind: parsed.kind,
                sender_id: msg.sender_id.clone(),
                reseller_id: self.reseller_id.clone(),
                is_group: msg.is_group,
                group_id: msg.group_id.clone(),
                panel_hint: None,
                staff_override: false,
                supplied_username: None,
            };
            results.push(self.executor.execute(&req).await);

            // A pending conversation (registration, username check) stops
            // the batch: the sender has to answer before anything else
            // can be decided for them.
            if results.last().and_then(|o| o.pending.as_ref()).is_some() {
                break;
            }
        }

        let success = results.iter().all(|o| o.success);
        let text = format_report(parsed.kind, &results);
        Some(PipelineReply {
            success,
            text,
            results,
        })
    }

    fn handle_user_command(&self, msg: &InboundMessage, cmd: UserCommand) -> PipelineReply {
        match cmd {
            UserCommand::Verify { reference } => PipelineReply::text_only(
                true,
                format!(
                    "Payment reference '{reference}' received. You'll get a confirmation once it is verified."
                ),
            ),
            UserCommand::Account => self.account_summary(msg),
            UserCommand::Ticket { text } => PipelineReply::text_only(
                true,
                format!("Ticket opened: \"{text}\". An operator will reply here."),
            ),
        }
    }

    fn account_summary(&self, msg: &InboundMessage) -> PipelineReply {
        match self.executor.mapping_for(&msg.sender_id) {
            Ok(Some(mapping)) => {
                let state = if mapping.suspended {
                    "suspended"
                } else if !mapping.bot_enabled {
                    "disabled"
                } else if mapping.verified {
                    "verified"
                } else {
                    "registered"
                };
                PipelineReply::text_only(
                    true,
                    format!(
                        "Linked panel account: {} ({state}).",
                        mapping.panel_username
                    ),
                )
            }
            Ok(None) => PipelineReply::text_only(false, messages::registration_prompt()),
            Err(_) => PipelineReply::text_only(false, messages::internal_error()),
        }
    }
}
